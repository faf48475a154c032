use anyhow::Result;
use chrono::Local;
use colored::Colorize;
use sha2::{Digest, Sha256};
use std::io::Write;
use std::time::Duration;

use sipboard_game::constants::TIMEOUT_WARN_SHARE;
use sipboard_game::{SimulationReport, Summary, TileDrinkAverage};

/// Short SHA-256 fingerprint of the JSON report, for comparing runs.
pub fn report_fingerprint(report: &SimulationReport) -> Result<String> {
    let json = serde_json::to_vec(report)?;
    let digest = Sha256::digest(&json);
    let hex = format!("{digest:x}");
    Ok(hex[..16].to_string())
}

pub fn generate_json_report<W: Write + ?Sized>(out: &mut W, report: &SimulationReport) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)?;
    Ok(())
}

pub fn generate_markdown_report<W: Write + ?Sized>(
    out: &mut W,
    report: &SimulationReport,
) -> Result<()> {
    let params = &report.parameters;
    let headline = &report.headline;

    writeln!(out, "# Sipboard Simulation Report\n")?;
    writeln!(
        out,
        "_{} games, {} players each, seed {}, {} combat samples per gym. Generated {}._\n",
        params.games,
        params.players,
        params.seed,
        params.combat_samples,
        Local::now().format("%Y-%m-%d %H:%M")
    )?;

    writeln!(out, "## Headline\n")?;
    writeln!(out, "| Metric | Value |")?;
    writeln!(out, "|--------|-------|")?;
    writeln!(
        out,
        "| Rounds per game | {:.1} (p10 {} – p90 {}) |",
        headline.avg_rounds, headline.rounds_p10, headline.rounds_p90
    )?;
    writeln!(out, "| Turns per player | {:.1} |", headline.avg_turns)?;
    writeln!(out, "| Tiles landed per player | {:.1} |", headline.avg_tiles_landed)?;
    writeln!(
        out,
        "| Direct drinks per player | {:.1} sips (~{:.1} beers) |",
        headline.avg_drinks, headline.avg_beers
    )?;
    writeln!(
        out,
        "| Including collateral | {:.1} sips (~{:.1} beers) |",
        headline.collateral_drinks, headline.collateral_beers
    )?;
    writeln!(
        out,
        "| Estimated play time | {:.1} – {:.1} hours |",
        headline.play_time_hours.0, headline.play_time_hours.1
    )?;
    writeln!(out)?;

    writeln!(out, "## Distributions\n")?;
    writeln!(out, "| Metric | Mean | Std dev | Min | P10 | P50 | P90 | Max |")?;
    writeln!(out, "|--------|------|---------|-----|-----|-----|-----|-----|")?;
    let stats = &report.stats;
    for (label, summary) in [
        ("Rounds", &stats.rounds),
        ("Drinks", &stats.drinks),
        ("Turns", &stats.turns),
        ("Tiles landed", &stats.tiles_landed),
    ] {
        write_summary_row(out, label, summary)?;
    }
    writeln!(out)?;

    writeln!(out, "## Gyms\n")?;
    writeln!(out, "| Tile | Gym | Avg drinks | Avg rounds |")?;
    writeln!(out, "|------|-----|------------|------------|")?;
    for gym in &report.gyms {
        writeln!(
            out,
            "| {} | {} | {:.2} | {:.2} |",
            gym.tile + 1,
            gym.label,
            gym.avg_drinks,
            gym.avg_rounds
        )?;
    }
    writeln!(out)?;

    writeln!(out, "## Heaviest Tiles\n")?;
    if report.heavy_tiles.is_empty() {
        writeln!(out, "_No tile reaches the heavy threshold._\n")?;
    } else {
        write_tile_table(out, &report.heavy_tiles)?;
    }

    writeln!(out, "## Sections\n")?;
    for section in &report.sections {
        writeln!(
            out,
            "### {} (tiles {}–{})\n",
            section.label,
            section.start + 1,
            section.end + 1
        )?;
        if section.heavy_tiles.is_empty() {
            writeln!(out, "_No heavy tiles._\n")?;
        } else {
            write_tile_table(out, &section.heavy_tiles)?;
        }
    }

    writeln!(out, "## Milestones\n")?;
    writeln!(out, "| Milestone | Players | Games with at least one |")?;
    writeln!(out, "|-----------|---------|-------------------------|")?;
    for milestone in &report.milestones {
        writeln!(
            out,
            "| {} | {:.1}% | {:.1}% |",
            milestone.label, milestone.player_pct, milestone.game_pct
        )?;
    }
    writeln!(out)?;

    writeln!(out, "## Board\n")?;
    let board = &report.board;
    writeln!(out, "- Tiles: {}", board.tiles)?;
    writeln!(out, "- Gyms: {}", board.gyms)?;
    writeln!(out, "- Optional stops: {}", board.optional_stops)?;
    for (zone, count) in &board.zones {
        writeln!(out, "- {zone}: {count} tiles")?;
    }
    writeln!(out)?;

    writeln!(
        out,
        "Timed-out games: {} ({:.2}%)",
        stats.timed_out,
        stats.timed_out_share * 100.0
    )?;
    if report.timeout_warning {
        writeln!(
            out,
            "\n> **Warning:** more than {:.1}% of games hit the {}-round cap.",
            TIMEOUT_WARN_SHARE * 100.0,
            params.max_rounds
        )?;
    }
    writeln!(out, "\nFingerprint: `{}`", report_fingerprint(report)?)?;
    Ok(())
}

fn write_summary_row<W: Write + ?Sized>(out: &mut W, label: &str, summary: &Summary) -> Result<()> {
    writeln!(
        out,
        "| {label} | {:.1} | {:.1} | {} | {} | {} | {} | {} |",
        summary.mean, summary.std_dev, summary.min, summary.p10, summary.p50, summary.p90, summary.max
    )?;
    Ok(())
}

fn write_tile_table<W: Write + ?Sized>(out: &mut W, tiles: &[TileDrinkAverage]) -> Result<()> {
    writeln!(out, "| Tile | Name | Avg drinks |")?;
    writeln!(out, "|------|------|------------|")?;
    for tile in tiles {
        writeln!(out, "| {} | {} | {:.2} |", tile.index + 1, tile.label, tile.avg_drinks)?;
    }
    writeln!(out)?;
    Ok(())
}

pub fn generate_console_report<W: Write + ?Sized>(
    out: &mut W,
    report: &SimulationReport,
    total_duration: Duration,
) -> Result<()> {
    let params = &report.parameters;
    let headline = &report.headline;
    let stats = &report.stats;

    writeln!(out)?;
    writeln!(out, "{}", "🍺 Sipboard Simulation Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "==============================".cyan())?;
    writeln!(
        out,
        "Games: {}  Players: {}  Seed: {}",
        params.games, params.players, params.seed
    )?;
    writeln!(
        out,
        "Rounds per game: {} (p10 {} – p90 {})",
        format!("{:.1}", headline.avg_rounds).bold(),
        headline.rounds_p10,
        headline.rounds_p90
    )?;
    writeln!(
        out,
        "Drinks per player: {} sips, ~{:.1} beers (p10 {} / p50 {} / p90 {})",
        format!("{:.1}", headline.avg_drinks).yellow().bold(),
        headline.avg_beers,
        headline.drinks.p10,
        headline.drinks.p50,
        headline.drinks.p90
    )?;
    writeln!(
        out,
        "With collateral: {:.1} sips (~{:.1} beers)",
        headline.collateral_drinks, headline.collateral_beers
    )?;
    writeln!(
        out,
        "Play time: {:.1} – {:.1} hours",
        headline.play_time_hours.0, headline.play_time_hours.1
    )?;
    writeln!(out)?;

    writeln!(out, "{}", "⚔️  Gyms".bright_yellow().bold())?;
    for gym in &report.gyms {
        writeln!(
            out,
            "   {:<16} {:>6.2} drinks  {:>5.2} rounds",
            gym.label, gym.avg_drinks, gym.avg_rounds
        )?;
    }
    writeln!(out)?;

    writeln!(out, "{}", "🔥 Heaviest tiles".bright_red().bold())?;
    for tile in &report.heavy_tiles {
        writeln!(
            out,
            "   #{:<3} {:<28} {:>6.2}",
            tile.index + 1,
            tile.label,
            tile.avg_drinks
        )?;
    }
    writeln!(out)?;

    for milestone in &report.milestones {
        writeln!(
            out,
            "{}: {:.1}% of players, {:.1}% of games",
            milestone.label.bold(),
            milestone.player_pct,
            milestone.game_pct
        )?;
    }

    let timeouts = format!(
        "Timed-out games: {} ({:.2}%)",
        stats.timed_out,
        stats.timed_out_share * 100.0
    );
    if report.timeout_warning {
        writeln!(out, "{}", timeouts.red())?;
    } else {
        writeln!(out, "{}", timeouts.green())?;
    }
    writeln!(out)?;
    writeln!(
        out,
        "🏁 Total time: {total_duration:?} (fingerprint {}, {})",
        report_fingerprint(report)?,
        Local::now().format("%H:%M:%S")
    )?;
    Ok(())
}
