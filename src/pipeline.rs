use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

use crate::competition::{Athlete, Block, BlockId, BlockScoreRecord, BlockState, MetricsTable, Schedule};
use crate::config::Config;
use crate::error::ScoringError;
use crate::ingest::{ingest_activities, ActivityRecord};
use crate::ledger::{load_ledger, save_ledger, Ledger, RefreshGuard};
use crate::scoring::{
    compute_block_score, compute_breakdown, compute_projection, compute_stakes, compute_standings,
    ProjectionResult, SportBreakdown, StakesConfig, Stakes, StandingsSnapshot,
};

/// Everything the scoring pipeline needs from the competition definition.
#[derive(Debug, Clone)]
pub struct Competition {
    pub athletes: Vec<Athlete>,
    pub schedule: Schedule,
    pub max_points_per_block: u32,
    pub projection_min_blocks: usize,
    pub stakes: StakesConfig,
}

impl Competition {
    pub fn from_config(config: &Config) -> Result<Self, ScoringError> {
        let schedule = config.schedule()?;
        let max_points_per_block = config
            .max_points_per_block
            .unwrap_or_else(|| schedule.max_points_per_block());

        Ok(Self {
            athletes: config.athletes(),
            schedule,
            max_points_per_block,
            projection_min_blocks: config.projection_min_blocks(),
            stakes: config.stakes(),
        })
    }

    fn has_any_data(&self, block: &Block, metrics: &MetricsTable) -> bool {
        has_any_data(&self.athletes, block, metrics)
    }
}

fn has_any_data(athletes: &[Athlete], block: &Block, metrics: &MetricsTable) -> bool {
    athletes.iter().any(|a| metrics.has_data(&a.id, block))
}

/// A block together with its current score state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockOutcome {
    pub block: Block,
    #[serde(flatten)]
    pub state: BlockState,
    /// Scoring failure for this block only; the block is reported as pending
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Score every block in schedule order.
///
/// Frozen blocks come straight from the ledger. A block nobody has data for
/// is `Pending`. An engine failure stays on its own block.
pub fn score_blocks(
    schedule: &Schedule,
    athletes: &[Athlete],
    metrics: &MetricsTable,
    ledger: &Ledger,
) -> Vec<BlockOutcome> {
    schedule
        .blocks()
        .iter()
        .map(|block| {
            let refreshed = ledger.state_for(&block.id).refresh(|| {
                if !has_any_data(athletes, block, metrics) {
                    return Ok(None);
                }
                compute_block_score(block, athletes, metrics).map(Some)
            });

            match refreshed {
                Ok(state) => {
                    log::debug!("Block {} is {}", block.id, state.label());
                    BlockOutcome {
                        block: block.clone(),
                        state,
                        error: None,
                    }
                }
                Err(e) => {
                    log::warn!("Block {} could not be scored: {}", block.id, e);
                    BlockOutcome {
                        block: block.clone(),
                        state: BlockState::Pending,
                        error: Some(e.to_string()),
                    }
                }
            }
        })
        .collect()
}

/// Strict variant of [`score_blocks`]: the first engine error aborts.
/// Pending blocks are left out.
pub fn score_records(
    schedule: &Schedule,
    athletes: &[Athlete],
    metrics: &MetricsTable,
    ledger: &Ledger,
) -> Result<Vec<BlockScoreRecord>, ScoringError> {
    let mut records = Vec::new();
    for block in schedule.blocks() {
        let state = ledger.state_for(&block.id).refresh(|| {
            if !has_any_data(athletes, block, metrics) {
                return Ok(None);
            }
            compute_block_score(block, athletes, metrics).map(Some)
        })?;
        if let Some(record) = state.into_record() {
            records.push(record);
        }
    }
    Ok(records)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scoreboard {
    pub athletes: Vec<Athlete>,
    pub blocks: Vec<BlockOutcome>,
    pub standings: StandingsSnapshot,
    /// Only reported once enough blocks are scored
    pub projection: Option<ProjectionResult>,
    pub stakes: Stakes,
    pub breakdown: SportBreakdown,
    pub total_blocks: usize,
}

impl Scoreboard {
    pub fn scored_blocks(&self) -> usize {
        self.blocks.iter().filter(|o| o.state.record().is_some()).count()
    }

    pub fn failed_blocks(&self) -> impl Iterator<Item = &BlockOutcome> {
        self.blocks.iter().filter(|o| o.error.is_some())
    }
}

pub fn build_scoreboard(
    competition: &Competition,
    outcomes: Vec<BlockOutcome>,
) -> Result<Scoreboard, ScoringError> {
    let records: Vec<BlockScoreRecord> = outcomes
        .iter()
        .filter_map(|o| o.state.record().cloned())
        .collect();

    let standings = compute_standings(&competition.athletes, &records);

    let projection = if records.len() >= competition.projection_min_blocks {
        Some(compute_projection(
            &standings,
            &records,
            competition.schedule.len(),
            competition.max_points_per_block,
        )?)
    } else {
        log::debug!(
            "Projection hidden: {} of {} required blocks scored",
            records.len(),
            competition.projection_min_blocks
        );
        None
    };

    let stakes = compute_stakes(&standings, &competition.athletes, &competition.stakes);
    let breakdown = compute_breakdown(&competition.athletes, &records);

    Ok(Scoreboard {
        athletes: competition.athletes.clone(),
        blocks: outcomes,
        standings,
        projection,
        stakes,
        breakdown,
        total_blocks: competition.schedule.len(),
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LockReport {
    pub locked: Vec<BlockId>,
    /// Closed blocks nobody logged anything for
    pub skipped_pending: Vec<BlockId>,
    pub failed: Vec<(BlockId, String)>,
}

/// Freeze every block whose window closed before `now`.
///
/// Blocks without any data are left open with a warning so late uploads can
/// still land. The caller persists the ledger and re-applies locks.
pub fn lock_closed_blocks(
    competition: &Competition,
    metrics: &MetricsTable,
    ledger: &mut Ledger,
    now: DateTime<Utc>,
) -> LockReport {
    let mut report = LockReport::default();

    for block in competition.schedule.closed_unlocked(now) {
        if ledger.is_locked(&block.id) {
            continue;
        }
        if !competition.has_any_data(block, metrics) {
            log::warn!("Block {} closed without any activities, not locking", block.id);
            report.skipped_pending.push(block.id.clone());
            continue;
        }

        let locked = compute_block_score(block, &competition.athletes, metrics)
            .map_err(anyhow::Error::from)
            .and_then(|record| ledger.lock(record, now));

        match locked {
            Ok(()) => report.locked.push(block.id.clone()),
            Err(e) => {
                log::warn!("Block {} could not be locked: {}", block.id, e);
                report.failed.push((block.id.clone(), e.to_string()));
            }
        }
    }

    report
}

/// One serialized lock run against the ledger file at `ledger_path`.
///
/// The ledger is read, the activities are ingested against its locks, and
/// the result is saved, all while the refresh guard is held. A run that had
/// to wait for another one therefore sees that run's locks.
pub fn refresh_locks(
    competition: &Competition,
    activities: &[ActivityRecord],
    ledger_path: &Path,
    now: DateTime<Utc>,
) -> anyhow::Result<LockReport> {
    let _guard = RefreshGuard::acquire(ledger_path)?;

    let mut ledger = load_ledger(ledger_path)?;
    let mut current = competition.clone();
    current.schedule.apply_locks(&ledger);

    let (metrics, summary) = ingest_activities(activities, &current.schedule, &current.athletes);
    log::debug!(
        "Lock run: {} activities counted, {} skipped",
        summary.new,
        summary.skipped
    );

    let report = lock_closed_blocks(&current, &metrics, &mut ledger, now);
    if !report.locked.is_empty() {
        save_ledger(ledger_path, &ledger)
            .with_context(|| format!("Failed to record locks in {}", ledger_path.display()))?;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::competition::{AthleteId, Metric, Sport};
    use crate::config::sample_config;
    use chrono::TimeZone;
    use std::env;

    fn competition() -> Competition {
        Competition::from_config(&sample_config()).unwrap()
    }

    fn add(metrics: &mut MetricsTable, athlete: &str, block: &str, sport: Sport, calories: f64) {
        metrics.add(
            &AthleteId::new(athlete),
            &BlockId::new(block),
            sport,
            Metric {
                calories,
                activities: 1,
                ..Metric::default()
            },
        );
    }

    fn after_everything() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_competition_defaults() {
        let competition = competition();
        assert_eq!(competition.max_points_per_block, 7);
        assert_eq!(competition.projection_min_blocks, 2);

        let mut config = sample_config();
        config.max_points_per_block = Some(9);
        let overridden = Competition::from_config(&config).unwrap();
        assert_eq!(overridden.max_points_per_block, 9);
    }

    #[test]
    fn test_no_data_is_pending() {
        let competition = competition();
        let outcomes = score_blocks(
            &competition.schedule,
            &competition.athletes,
            &MetricsTable::new(),
            &Ledger::new(),
        );
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.state.is_pending() && o.error.is_none()));
    }

    #[test]
    fn test_error_stays_on_its_block() {
        let competition = competition();
        let mut metrics = MetricsTable::new();
        add(&mut metrics, "p1", "block_1", Sport::Swimming, 300.0);
        add(&mut metrics, "p2", "block_1", Sport::Swimming, 200.0);
        // Only p1 logged anything in block 2
        add(&mut metrics, "p1", "block_2", Sport::Running, 400.0);

        let outcomes = score_blocks(
            &competition.schedule,
            &competition.athletes,
            &metrics,
            &Ledger::new(),
        );
        assert_eq!(outcomes[0].state.label(), "open");
        assert!(outcomes[0].error.is_none());
        assert!(outcomes[1].state.is_pending());
        assert!(outcomes[1].error.as_deref().unwrap().contains("p2"));

        let strict = score_records(
            &competition.schedule,
            &competition.athletes,
            &metrics,
            &Ledger::new(),
        );
        assert!(matches!(strict, Err(ScoringError::IncompleteData { .. })));
    }

    #[test]
    fn test_locked_block_not_rescored() {
        let mut competition = competition();
        let mut metrics = MetricsTable::new();
        add(&mut metrics, "p1", "block_1", Sport::Swimming, 300.0);
        add(&mut metrics, "p2", "block_1", Sport::Swimming, 200.0);

        let mut ledger = Ledger::new();
        let report = lock_closed_blocks(&competition, &metrics, &mut ledger, after_everything());
        assert_eq!(report.locked, vec![BlockId::new("block_1")]);
        assert_eq!(report.skipped_pending, vec![BlockId::new("block_2")]);
        competition.schedule.apply_locks(&ledger);

        // Later data for the frozen block changes nothing
        add(&mut metrics, "p2", "block_1", Sport::Swimming, 500.0);
        let outcomes = score_blocks(&competition.schedule, &competition.athletes, &metrics, &ledger);
        let frozen = &outcomes[0];
        assert!(frozen.state.is_final());
        assert_eq!(frozen.state.record().unwrap().total_for(&AthleteId::new("p1")), 2);

        // Nothing left to lock
        let again = lock_closed_blocks(&competition, &metrics, &mut ledger, after_everything());
        assert!(again.locked.is_empty());
    }

    #[test]
    fn test_lock_skips_open_windows() {
        let competition = competition();
        let mut metrics = MetricsTable::new();
        add(&mut metrics, "p1", "block_2", Sport::Running, 300.0);
        add(&mut metrics, "p2", "block_2", Sport::Running, 200.0);

        let mut ledger = Ledger::new();
        let during_block_2 = Utc.with_ymd_and_hms(2026, 3, 7, 0, 0, 0).unwrap();
        let report = lock_closed_blocks(&competition, &metrics, &mut ledger, during_block_2);
        assert!(report.locked.is_empty());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_scoreboard_projection_needs_two_blocks() {
        let competition = competition();
        let mut metrics = MetricsTable::new();
        add(&mut metrics, "p1", "block_1", Sport::Swimming, 300.0);
        add(&mut metrics, "p2", "block_1", Sport::Swimming, 200.0);

        let outcomes = score_blocks(
            &competition.schedule,
            &competition.athletes,
            &metrics,
            &Ledger::new(),
        );
        let scoreboard = build_scoreboard(&competition, outcomes).unwrap();
        assert_eq!(scoreboard.scored_blocks(), 1);
        assert!(scoreboard.projection.is_none());
        assert_eq!(scoreboard.standings.margin, 2);
        assert_eq!(scoreboard.stakes.debtor, Some(AthleteId::new("p2")));
        assert_eq!(scoreboard.stakes.debt, 100);

        // Second block: Beta sweeps
        for sport in Sport::ALL {
            add(&mut metrics, "p2", "block_2", sport, 500.0);
        }
        add(&mut metrics, "p1", "block_2", Sport::Cycling, 100.0);

        let outcomes = score_blocks(
            &competition.schedule,
            &competition.athletes,
            &metrics,
            &Ledger::new(),
        );
        let scoreboard = build_scoreboard(&competition, outcomes).unwrap();
        assert_eq!(scoreboard.scored_blocks(), 2);
        assert_eq!(scoreboard.standings.total_for(&AthleteId::new("p2")), 7);
        assert_eq!(scoreboard.standings.leader, Some(AthleteId::new("p2")));

        let projection = scoreboard.projection.as_ref().unwrap();
        assert_eq!(projection.remaining_blocks, 0);
        assert!(!projection.clean_sweep_can_change_outcome);
        assert_eq!(scoreboard.failed_blocks().count(), 0);
    }

    #[test]
    fn test_scoreboard_json_shape() {
        let competition = competition();
        let outcomes = score_blocks(
            &competition.schedule,
            &competition.athletes,
            &MetricsTable::new(),
            &Ledger::new(),
        );
        let scoreboard = build_scoreboard(&competition, outcomes).unwrap();
        let json = serde_json::to_value(&scoreboard).unwrap();
        assert_eq!(json["blocks"][0]["state"], "pending");
        assert_eq!(json["standings"]["is_tied"], true);
        assert!(json["projection"].is_null());
    }

    fn swim(id: &str, athlete: &str, calories: f64) -> ActivityRecord {
        ActivityRecord {
            id: id.to_string(),
            athlete: AthleteId::new(athlete),
            sport_type: "Swim".to_string(),
            start: Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap(),
            calories,
            kilojoules: 0.0,
            distance_m: 1000.0,
            moving_time_s: 1200,
            name: None,
        }
    }

    #[test]
    fn test_refresh_locks_freezes_block_once() {
        let ledger_path = env::temp_dir().join("tri_duel_test_refresh_locks.json");
        let _ = std::fs::remove_file(&ledger_path);
        let competition = competition();

        let first_batch = vec![swim("a1", "p1", 300.0), swim("a2", "p2", 200.0)];
        let first = refresh_locks(&competition, &first_batch, &ledger_path, after_everything())
            .unwrap();
        assert_eq!(first.locked, vec![BlockId::new("block_1")]);

        // A late upload arrives before the next run; block 1 must stay frozen
        let mut late_batch = first_batch.clone();
        late_batch.push(swim("a3", "p2", 500.0));
        let second = refresh_locks(&competition, &late_batch, &ledger_path, after_everything())
            .unwrap();
        assert!(second.locked.is_empty());
        assert!(second.failed.is_empty());

        let ledger = load_ledger(&ledger_path).unwrap();
        let frozen = &ledger.blocks[&BlockId::new("block_1")].record;
        assert_eq!(frozen.total_for(&AthleteId::new("p1")), 2);
        assert_eq!(frozen.total_for(&AthleteId::new("p2")), 0);

        let _ = std::fs::remove_file(&ledger_path);
    }

    #[test]
    fn test_refresh_locks_refused_while_guard_held() {
        let ledger_path = env::temp_dir().join("tri_duel_test_refresh_locks_busy.json");
        let _ = std::fs::remove_file(&ledger_path);
        let competition = competition();

        let held = RefreshGuard::acquire(&ledger_path).unwrap();
        let err = refresh_locks(&competition, &[], &ledger_path, after_everything()).unwrap_err();
        assert!(err.to_string().contains("Another refresh is in progress"));
        drop(held);

        let report = refresh_locks(&competition, &[], &ledger_path, after_everything()).unwrap();
        assert!(report.locked.is_empty());
        assert!(!ledger_path.exists());
    }
}
