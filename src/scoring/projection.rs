use serde::Serialize;
use std::collections::BTreeMap;

use super::standings::StandingsSnapshot;
use crate::competition::{AthleteId, BlockScoreRecord};
use crate::error::ScoringError;

/// Linear extrapolation of the final standings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectionResult {
    pub projected_totals: BTreeMap<AthleteId, f64>,
    pub projected_winner: Option<AthleteId>,
    pub projected_margin: f64,
    pub completed_blocks: usize,
    pub remaining_blocks: usize,
    /// Bonus points per scored block, one decimal
    pub avg_bonus_rate: f64,
    /// The trailing athlete could still catch up by sweeping every remaining block
    pub clean_sweep_can_change_outcome: bool,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Project each athlete's per-block average over the blocks still to come.
///
/// `records` are the blocks scored so far (open or final). With no scored
/// blocks there is no rate to extrapolate, so there is no projected winner.
/// The comeback flag compares the trailer's current total plus a clean sweep
/// of every remaining block against the leader's current total, taking the
/// leader's own remaining gain as 0.
pub fn compute_projection(
    standings: &StandingsSnapshot,
    records: &[BlockScoreRecord],
    total_scheduled_blocks: usize,
    max_points_per_block: u32,
) -> Result<ProjectionResult, ScoringError> {
    let completed = records.len();
    let remaining = total_scheduled_blocks.checked_sub(completed).ok_or_else(|| {
        ScoringError::InvalidSchedule(format!(
            "{} blocks scored but only {} scheduled",
            completed, total_scheduled_blocks
        ))
    })?;

    let bonus_awarded: u32 = records.iter().map(BlockScoreRecord::bonus_total).sum();
    let avg_bonus_rate = if completed > 0 {
        round1(f64::from(bonus_awarded) / completed as f64)
    } else {
        0.0
    };

    let projected_totals: BTreeMap<AthleteId, f64> = standings
        .totals
        .iter()
        .map(|(athlete, &total)| {
            let total = f64::from(total);
            let per_block_avg = if completed > 0 {
                total / completed as f64
            } else {
                0.0
            };
            (athlete.clone(), total + per_block_avg * remaining as f64)
        })
        .collect();

    let mut ranked: Vec<(&AthleteId, f64)> =
        projected_totals.iter().map(|(id, &v)| (id, v)).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    let top = ranked.first().map(|&(_, v)| v).unwrap_or(0.0);
    let runner_up = ranked.get(1).map(|&(_, v)| v).unwrap_or(0.0);

    let projected_winner = match ranked.first() {
        Some(&(id, v)) if completed > 0 && v > runner_up => Some(id.clone()),
        _ => None,
    };
    let projected_margin = (top - runner_up).abs();

    let (leader_total, trailer_total) = standings.high_low();
    let catch_up = remaining as u64 * u64::from(max_points_per_block);
    let clean_sweep_can_change_outcome =
        remaining > 0 && u64::from(trailer_total) + catch_up >= u64::from(leader_total);

    Ok(ProjectionResult {
        projected_totals,
        projected_winner,
        projected_margin,
        completed_blocks: completed,
        remaining_blocks: remaining,
        avg_bonus_rate,
        clean_sweep_can_change_outcome,
    })
}
