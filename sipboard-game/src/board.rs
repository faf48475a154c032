//! Board model: tile descriptors, categories and derived layout indexes.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::constants::{GYM_BACKGROUND, OPTIONAL_STOP_BACKGROUND, ZONE_BACKGROUNDS};

/// Kanto board bundled with the crate, as a `{ "tiles": [...] }` document.
pub const BUNDLED_BOARD_JSON: &str = include_str!("../data/board.json");

/// Errors raised while building a board from tile input.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("board has no usable tiles")]
    Empty,
    #[error("failed to parse tile data: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Tile as supplied by the external tile loader, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub header: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub background_color: Option<String>,
}

impl RawTile {
    #[must_use]
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_header(mut self, header: &str) -> Self {
        self.header = Some(header.to_string());
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    #[must_use]
    pub fn with_background(mut self, background: &str) -> Self {
        self.background_color = Some(background.to_string());
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawBoard {
    #[serde(default)]
    tiles: Vec<RawTile>,
}

/// Movement-relevant category of a tile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileCategory {
    Ordinary,
    /// Mandatory combat stop.
    Gym,
    /// Players passing over may divert here.
    OptionalStop,
    /// Member of a named board region.
    Zone(String),
}

impl TileCategory {
    #[must_use]
    pub fn from_background(background: &str) -> Self {
        match background {
            GYM_BACKGROUND => Self::Gym,
            OPTIONAL_STOP_BACKGROUND => Self::OptionalStop,
            zone if ZONE_BACKGROUNDS.contains(&zone) => Self::Zone(zone.to_string()),
            _ => Self::Ordinary,
        }
    }

    #[must_use]
    pub fn zone_name(&self) -> Option<&str> {
        match self {
            Self::Zone(name) => Some(name),
            _ => None,
        }
    }
}

/// Immutable, validated description of one board position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileDescriptor {
    pub index: usize,
    pub name: String,
    pub header: String,
    pub text: String,
    pub category: TileCategory,
}

impl TileDescriptor {
    /// Human-readable label, preferring the header over the name.
    #[must_use]
    pub fn label(&self) -> &str {
        if self.header.is_empty() {
            &self.name
        } else {
            &self.header
        }
    }

    #[must_use]
    pub fn is_gym(&self) -> bool {
        self.category == TileCategory::Gym
    }
}

/// Contiguous region that sends high rollers back to its entrance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoopZone {
    pub name: String,
    pub start: usize,
    pub end: usize,
}

impl LoopZone {
    #[must_use]
    pub const fn contains(&self, position: usize) -> bool {
        self.start <= position && position <= self.end
    }
}

/// Stretch of the board between two gyms, used to group the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardSection {
    pub label: String,
    pub start: usize,
    pub end: usize,
}

/// Ordered tile sequence with derived lookup tables; read-only once built.
#[derive(Debug, Clone)]
pub struct Board {
    tiles: Vec<TileDescriptor>,
    gyms: Vec<usize>,
    optional_stops: Vec<usize>,
}

impl Board {
    /// Build a board from raw tiles, skipping tiles with neither name nor header.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Empty`] when no usable tile remains.
    pub fn from_raw(raw: Vec<RawTile>) -> Result<Self, BoardError> {
        let mut tiles = Vec::with_capacity(raw.len());
        for (position, tile) in raw.into_iter().enumerate() {
            let name = tile.name.unwrap_or_default().trim().to_string();
            let header = tile.header.unwrap_or_default().trim().to_string();
            if name.is_empty() && header.is_empty() {
                log::warn!("skipping tile #{} without name or header", position + 1);
                continue;
            }
            let category = tile
                .background_color
                .as_deref()
                .map_or(TileCategory::Ordinary, TileCategory::from_background);
            tiles.push(TileDescriptor {
                index: tiles.len(),
                name,
                header,
                text: tile.text.unwrap_or_default(),
                category,
            });
        }

        if tiles.is_empty() {
            return Err(BoardError::Empty);
        }

        let gyms = positions_where(&tiles, |t| t.category == TileCategory::Gym);
        let optional_stops = positions_where(&tiles, |t| t.category == TileCategory::OptionalStop);
        Ok(Self {
            tiles,
            gyms,
            optional_stops,
        })
    }

    /// Parse a `{ "tiles": [...] }` document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or yields no usable tile.
    pub fn from_json(json: &str) -> Result<Self, BoardError> {
        Self::from_raw(parse_raw_tiles(json)?)
    }

    /// The Kanto board bundled with the crate.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled data fails to parse.
    pub fn bundled() -> Result<Self, BoardError> {
        Self::from_json(BUNDLED_BOARD_JSON)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Index of the finish tile.
    #[must_use]
    pub fn last_index(&self) -> usize {
        self.tiles.len().saturating_sub(1)
    }

    #[must_use]
    pub fn tile(&self, index: usize) -> Option<&TileDescriptor> {
        self.tiles.get(index)
    }

    #[must_use]
    pub fn tiles(&self) -> &[TileDescriptor] {
        &self.tiles
    }

    /// Gym positions in ascending order.
    #[must_use]
    pub fn gyms(&self) -> &[usize] {
        &self.gyms
    }

    /// Optional stop positions in ascending order.
    #[must_use]
    pub fn optional_stops(&self) -> &[usize] {
        &self.optional_stops
    }

    #[must_use]
    pub fn is_gym(&self, index: usize) -> bool {
        self.tiles.get(index).is_some_and(TileDescriptor::is_gym)
    }

    /// Loop regions for the requested zone names, spanning first to last member.
    #[must_use]
    pub fn loop_zones(&self, names: &[String]) -> Vec<LoopZone> {
        names
            .iter()
            .filter_map(|name| {
                let mut members = self
                    .tiles
                    .iter()
                    .filter(|t| t.category.zone_name() == Some(name.as_str()))
                    .map(|t| t.index);
                let start = members.next()?;
                let end = members.last().unwrap_or(start);
                Some(LoopZone {
                    name: name.clone(),
                    start,
                    end,
                })
            })
            .collect()
    }

    /// Tile counts per zone, largest first, ties by name.
    #[must_use]
    pub fn zone_counts(&self) -> Vec<(String, usize)> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for zone in self.tiles.iter().filter_map(|t| t.category.zone_name()) {
            *counts.entry(zone).or_insert(0) += 1;
        }
        let mut ordered: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(zone, count)| (zone.to_string(), count))
            .collect();
        ordered.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ordered
    }

    /// Split the board at each gym; every section ends on its gym.
    #[must_use]
    pub fn sections(&self) -> Vec<BoardSection> {
        let mut sections = Vec::with_capacity(self.gyms.len() + 1);
        let mut start = 0;
        let mut previous = String::from("Start");
        for &gym in &self.gyms {
            let label = self.tiles[gym].label().to_string();
            sections.push(BoardSection {
                label: format!("{previous} -> {label}"),
                start,
                end: gym,
            });
            start = gym + 1;
            previous = label;
        }
        if start <= self.last_index() {
            sections.push(BoardSection {
                label: format!("{previous} -> End"),
                start,
                end: self.last_index(),
            });
        }
        sections
    }
}

/// Decode the raw tile list without validating it.
///
/// # Errors
///
/// Returns [`BoardError::Parse`] if the JSON is malformed.
pub fn parse_raw_tiles(json: &str) -> Result<Vec<RawTile>, BoardError> {
    let raw: RawBoard = serde_json::from_str(json)?;
    Ok(raw.tiles)
}

fn positions_where<F>(tiles: &[TileDescriptor], predicate: F) -> Vec<usize>
where
    F: Fn(&TileDescriptor) -> bool,
{
    tiles
        .iter()
        .filter(|&t| predicate(t))
        .map(|t| t.index)
        .collect()
}
