use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::athlete::AthleteId;
use super::block::BlockId;
use super::metrics::Metric;
use super::sport::Sport;
use crate::error::ScoringError;

/// Scored outcome of one block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockScoreRecord {
    pub block_id: BlockId,
    pub sports: Vec<Sport>,
    pub calories_by_sport: BTreeMap<Sport, BTreeMap<AthleteId, f64>>,
    pub points_by_sport: BTreeMap<Sport, BTreeMap<AthleteId, u32>>,
    /// Raw metric totals per athlete, kept for distance breakdowns
    #[serde(default)]
    pub details: BTreeMap<AthleteId, BTreeMap<Sport, Metric>>,
    pub clean_sweep_eligible: bool,
    pub clean_sweep_achieved: bool,
    pub clean_sweep_winner: Option<AthleteId>,
    pub bonus_points: BTreeMap<AthleteId, u32>,
    pub total_points: BTreeMap<AthleteId, u32>,
    pub locked: bool,
}

impl BlockScoreRecord {
    pub fn total_for(&self, athlete: &AthleteId) -> u32 {
        self.total_points.get(athlete).copied().unwrap_or(0)
    }

    pub fn points_for(&self, athlete: &AthleteId, sport: Sport) -> u32 {
        self.points_by_sport
            .get(&sport)
            .and_then(|by_athlete| by_athlete.get(athlete))
            .copied()
            .unwrap_or(0)
    }

    pub fn calories_for(&self, athlete: &AthleteId, sport: Sport) -> f64 {
        self.calories_by_sport
            .get(&sport)
            .and_then(|by_athlete| by_athlete.get(athlete))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn distance_for(&self, athlete: &AthleteId, sport: Sport) -> f64 {
        self.details
            .get(athlete)
            .and_then(|sports| sports.get(&sport))
            .map(|m| m.distance_m)
            .unwrap_or(0.0)
    }

    /// Bonus points handed out in this block, across both athletes.
    pub fn bonus_total(&self) -> u32 {
        self.bonus_points.values().sum()
    }

    /// Whether any calorie figure behind this record was derived rather than measured.
    pub fn any_estimated(&self) -> bool {
        self.details
            .values()
            .flat_map(|sports| sports.values())
            .any(|m| m.estimated)
    }
}

/// Lifecycle of a block's score.
///
/// `Open` records are derived values recomputed on every refresh. `Final`
/// records come from the ledger and cannot be recomputed: [`BlockState::refresh`]
/// hands them back untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "record", rename_all = "snake_case")]
pub enum BlockState {
    /// No data for any athlete yet
    Pending,
    Open(BlockScoreRecord),
    Final(BlockScoreRecord),
}

impl BlockState {
    pub fn record(&self) -> Option<&BlockScoreRecord> {
        match self {
            BlockState::Pending => None,
            BlockState::Open(record) | BlockState::Final(record) => Some(record),
        }
    }

    pub fn into_record(self) -> Option<BlockScoreRecord> {
        match self {
            BlockState::Pending => None,
            BlockState::Open(record) | BlockState::Final(record) => Some(record),
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, BlockState::Final(_))
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, BlockState::Pending)
    }

    pub fn label(&self) -> &'static str {
        match self {
            BlockState::Pending => "pending",
            BlockState::Open(_) => "open",
            BlockState::Final(_) => "final",
        }
    }

    /// Recompute a non-final state. `rescore` returns `None` when there is
    /// still no data for the block. Final states are returned as-is and
    /// `rescore` is never called for them.
    pub fn refresh<F>(self, rescore: F) -> Result<BlockState, ScoringError>
    where
        F: FnOnce() -> Result<Option<BlockScoreRecord>, ScoringError>,
    {
        match self {
            BlockState::Final(record) => Ok(BlockState::Final(record)),
            BlockState::Pending | BlockState::Open(_) => Ok(match rescore()? {
                Some(record) => BlockState::Open(record),
                None => BlockState::Pending,
            }),
        }
    }
}
