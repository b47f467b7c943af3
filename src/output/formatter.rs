use owo_colors::OwoColorize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::competition::{display_name, Athlete, BlockState, Schedule, Sport};
use crate::pipeline::{BlockOutcome, LockReport, Scoreboard};
use crate::scoring::{ProjectionResult, SportBreakdown, Stakes, StandingsSnapshot};

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate a label to fit available width, accounting for Unicode
fn truncate_label(label: &str, max_width: usize) -> String {
    let chars: Vec<char> = label.chars().collect();
    if chars.len() <= max_width {
        label.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// "12.35 km" for land sports, "1500 m" for swims
pub fn format_distance(meters: f64, sport: Sport) -> String {
    let (unit, divisor) = sport.distance_unit();
    if divisor > 1.0 {
        format!("{:.2} {}", meters / divisor, unit)
    } else {
        format!("{:.0} {}", meters, unit)
    }
}

/// Whole kcal, `~` prefix when any figure behind it was estimated
pub fn format_calories(calories: f64, estimated: bool) -> String {
    if estimated {
        format!("~{:.0}", calories)
    } else {
        format!("{:.0}", calories)
    }
}

/// Color a gap: green when level, yellow when close, red otherwise
fn paint_gap(text: &str, gap: u32, use_colors: bool) -> String {
    if !use_colors {
        return text.to_string();
    }
    match gap {
        0 => text.green().to_string(),
        1..=2 => text.yellow().to_string(),
        _ => text.red().to_string(),
    }
}

/// Two lines of totals plus the state of the race
pub fn format_standings(
    standings: &StandingsSnapshot,
    athletes: &[Athlete],
    use_colors: bool,
) -> String {
    let name_width = athletes.iter().map(|a| a.name.chars().count()).max().unwrap_or(0);

    let mut lines: Vec<String> = athletes
        .iter()
        .map(|athlete| {
            let total = standings.total_for(&athlete.id);
            let name = format!("{:<width$}", athlete.name, width = name_width);
            if use_colors && standings.leader.as_ref() == Some(&athlete.id) {
                format!("{}  {:>3}", name.bold(), total.bold())
            } else {
                format!("{}  {:>3}", name, total)
            }
        })
        .collect();

    let status = match &standings.leader {
        Some(leader) => format!(
            "{} leads by {}",
            display_name(athletes, leader),
            standings.margin
        ),
        None => "All square".to_string(),
    };
    lines.push(paint_gap(&status, standings.margin, use_colors));
    lines.join("\n")
}

pub fn format_projection(projection: &ProjectionResult, athletes: &[Athlete]) -> String {
    let totals = athletes
        .iter()
        .map(|a| {
            let projected = projection.projected_totals.get(&a.id).copied().unwrap_or(0.0);
            format!("{} {:.1}", a.name, projected)
        })
        .collect::<Vec<_>>()
        .join(" / ");

    let mut lines = vec![format!(
        "Projection after {} of {} blocks: {}",
        projection.completed_blocks,
        projection.completed_blocks + projection.remaining_blocks,
        totals
    )];

    match &projection.projected_winner {
        Some(winner) => lines.push(format!(
            "  Projected winner: {} by {:.1}",
            display_name(athletes, winner),
            projection.projected_margin
        )),
        None => lines.push("  Projected winner: too close to call".to_string()),
    }
    lines.push(format!(
        "  Sweep bonus rate: {:.1} per block",
        projection.avg_bonus_rate
    ));
    if projection.clean_sweep_can_change_outcome {
        lines.push("  Still in reach with clean sweeps".to_string());
    }
    lines.join("\n")
}

pub fn format_stakes(stakes: &Stakes, athletes: &[Athlete], use_colors: bool) -> String {
    let venue = if use_colors {
        stakes.venue.cyan().to_string()
    } else {
        stakes.venue.clone()
    };

    let mut lines = vec![format!("Dinner: {}", venue)];
    if !stakes.message.is_empty() {
        lines.push(format!("  {}", stakes.message));
    }
    if let Some(debtor) = &stakes.debtor {
        let bill = format!(
            "  {} owes {} {}",
            display_name(athletes, debtor),
            stakes.currency,
            stakes.debt
        );
        lines.push(paint_gap(&bill, stakes.gap, use_colors));
    }
    lines.join("\n")
}

/// Full default view: standings, projection when available, stakes
pub fn format_scoreboard(scoreboard: &Scoreboard, use_colors: bool) -> String {
    let mut sections = vec![format!(
        "Standings ({} of {} blocks scored)\n{}",
        scoreboard.scored_blocks(),
        scoreboard.total_blocks,
        format_standings(&scoreboard.standings, &scoreboard.athletes, use_colors)
    )];

    if let Some(projection) = &scoreboard.projection {
        sections.push(format_projection(projection, &scoreboard.athletes));
    }

    sections.push(format_stakes(
        &scoreboard.stakes,
        &scoreboard.athletes,
        use_colors,
    ));

    let failures: Vec<String> = scoreboard
        .failed_blocks()
        .map(|o| format!("  {}: {}", o.block.label, o.error.as_deref().unwrap_or_default()))
        .collect();
    if !failures.is_empty() {
        sections.push(format!("Not scored:\n{}", failures.join("\n")));
    }

    sections.join("\n\n")
}

fn format_block_cells(outcome: &BlockOutcome, athletes: &[Athlete], use_colors: bool) -> String {
    let Some(record) = outcome.state.record() else {
        return String::new();
    };

    let per_sport = record
        .sports
        .iter()
        .map(|&sport| {
            let points = athletes
                .iter()
                .map(|a| record.points_for(&a.id, sport).to_string())
                .collect::<Vec<_>>()
                .join("-");
            format!("{} {}", sport.name(), points)
        })
        .collect::<Vec<_>>()
        .join("  ");

    let totals = athletes
        .iter()
        .map(|a| record.total_for(&a.id).to_string())
        .collect::<Vec<_>>()
        .join("-");

    let mut cells = format!("{}  = {}", per_sport, totals);
    if let Some(winner) = &record.clean_sweep_winner {
        let sweep = format!("  sweep: {}", display_name(athletes, winner));
        if use_colors {
            cells.push_str(&sweep.magenta().to_string());
        } else {
            cells.push_str(&sweep);
        }
    }
    if record.any_estimated() {
        cells.push_str("  (est.)");
    }
    cells
}

/// One line per block: ordinal, label, state, points per sport, total, sweep marker
pub fn format_block_grid(scoreboard: &Scoreboard, use_colors: bool) -> String {
    if scoreboard.blocks.is_empty() {
        return "No blocks scheduled.".to_string();
    }

    let label_width = scoreboard
        .blocks
        .iter()
        .map(|o| o.block.label.chars().count())
        .max()
        .unwrap_or(0);
    // Leave room for the state and points columns on narrow terminals
    let label_width = match get_terminal_width() {
        Some(width) if width > 60 => label_width.min(width - 50),
        Some(_) => label_width.min(20),
        None => label_width,
    };

    scoreboard
        .blocks
        .iter()
        .map(|outcome| {
            let index = format!("{:>2}.", outcome.block.ordinal);
            let label = format!(
                "{:<width$}",
                truncate_label(&outcome.block.label, label_width),
                width = label_width
            );
            let state = format!("{:<7}", outcome.state.label());
            let state = if !use_colors {
                state
            } else {
                match outcome.state {
                    BlockState::Final(_) => state.bold().to_string(),
                    BlockState::Open(_) => state,
                    BlockState::Pending => state.dimmed().to_string(),
                }
            };
            let cells = match &outcome.error {
                Some(error) => format!("error: {}", error),
                None => format_block_cells(outcome, &scoreboard.athletes, use_colors),
            };
            format!("{} {}  {}  {}", index, label, state, cells)
                .trim_end()
                .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Per athlete, per sport: points, calories and distance
pub fn format_breakdown(breakdown: &SportBreakdown, athletes: &[Athlete]) -> String {
    let show_distance = breakdown.has_distance();

    athletes
        .iter()
        .map(|athlete| {
            let rows = Sport::ALL
                .iter()
                .map(|&sport| {
                    let totals = breakdown.get(&athlete.id, sport);
                    let mut row = format!(
                        "  {:<9} {:>3} pts  {:>6} kcal",
                        sport.name(),
                        totals.points,
                        format_calories(totals.calories, false)
                    );
                    if show_distance {
                        row.push_str(&format!("  {:>10}", format_distance(totals.distance_m, sport)));
                    }
                    row
                })
                .collect::<Vec<_>>()
                .join("\n");
            format!("{}\n{}", athlete.name, rows)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Schedule listing for the `check` command
pub fn format_schedule(schedule: &Schedule) -> String {
    schedule
        .blocks()
        .iter()
        .map(|block| {
            let sports = block
                .sports
                .iter()
                .map(Sport::name)
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "{:>2}. {}  {} .. {}  [{}]  max {}{}",
                block.ordinal,
                block.label,
                block.opens.format("%Y-%m-%d %H:%M"),
                block.closes.format("%Y-%m-%d %H:%M"),
                sports,
                block.max_points(),
                if block.locked { "  (locked)" } else { "" }
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_lock_report(report: &LockReport) -> String {
    if report.locked.is_empty() && report.skipped_pending.is_empty() && report.failed.is_empty() {
        return "No closed blocks to lock.".to_string();
    }

    let mut lines = Vec::new();
    for id in &report.locked {
        lines.push(format!("Locked {}", id));
    }
    for id in &report.skipped_pending {
        lines.push(format!("Skipped {} (no activities)", id));
    }
    for (id, error) in &report.failed {
        lines.push(format!("Failed {}: {}", id, error));
    }
    lines.join("\n")
}
