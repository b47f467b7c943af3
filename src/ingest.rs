use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use crate::competition::{Athlete, AthleteId, Metric, MetricsTable, Schedule, Sport};

/// kcal per kJ of mechanical work, used when a device reports work but no calories
pub const KILOJOULE_TO_KCAL: f64 = 0.239;

/// One already-fetched activity, as exported by the sync side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: String,
    pub athlete: AthleteId,
    /// Provider sport type, e.g. "Ride", "TrailRun", "Swim"
    pub sport_type: String,
    pub start: DateTime<Utc>,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub kilojoules: f64,
    #[serde(default)]
    pub distance_m: f64,
    #[serde(default)]
    pub moving_time_s: u64,
    #[serde(default)]
    pub name: Option<String>,
}

impl ActivityRecord {
    /// Calories for scoring and whether they were derived from kilojoules.
    pub fn effective_calories(&self) -> (f64, bool) {
        if self.calories <= 0.0 && self.kilojoules > 0.0 {
            let derived = (self.kilojoules * KILOJOULE_TO_KCAL * 100.0).round() / 100.0;
            (derived, true)
        } else {
            (self.calories.max(0.0), false)
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    /// Activities folded into the metrics table
    pub new: usize,
    /// Outside every window, locked block, unknown athlete, or duplicate id
    pub skipped: usize,
    /// Sport not scored, or not eligible in its block
    pub ignored_sport: usize,
}

/// Fold activities into per (athlete, block, sport) totals.
pub fn ingest_activities(
    activities: &[ActivityRecord],
    schedule: &Schedule,
    athletes: &[Athlete],
) -> (MetricsTable, IngestSummary) {
    let registered: HashSet<&AthleteId> = athletes.iter().map(|a| &a.id).collect();
    let mut seen = HashSet::new();
    let mut table = MetricsTable::new();
    let mut summary = IngestSummary::default();

    for activity in activities {
        if !seen.insert(activity.id.as_str()) {
            log::debug!("Duplicate activity {} counted once", activity.id);
            summary.skipped += 1;
            continue;
        }

        if !registered.contains(&activity.athlete) {
            log::debug!(
                "Activity {} belongs to unregistered athlete {}",
                activity.id,
                activity.athlete
            );
            summary.skipped += 1;
            continue;
        }

        let Some(sport) = Sport::from_activity_type(&activity.sport_type) else {
            log::debug!(
                "Activity {} has unscored sport type {}",
                activity.id,
                activity.sport_type
            );
            summary.ignored_sport += 1;
            continue;
        };

        let Some(block) = schedule.block_for_instant(activity.start) else {
            summary.skipped += 1;
            continue;
        };

        if block.locked {
            log::debug!("Activity {} falls in locked block {}", activity.id, block.id);
            summary.skipped += 1;
            continue;
        }

        if !block.is_eligible(sport) {
            summary.ignored_sport += 1;
            continue;
        }

        let (calories, estimated) = activity.effective_calories();
        table.add(
            &activity.athlete,
            &block.id,
            sport,
            Metric {
                distance_m: activity.distance_m,
                calories,
                estimated,
                moving_time_s: activity.moving_time_s,
                activities: 1,
            },
        );
        summary.new += 1;
    }

    log::info!(
        "Ingested {} activities ({} skipped, {} ignored sport)",
        summary.new,
        summary.skipped,
        summary.ignored_sport
    );

    (table, summary)
}

/// Load activities from a JSON array file.
///
/// A missing file is not an error: the competition simply has no data yet.
pub fn load_activities(path: &Path) -> Result<Vec<ActivityRecord>> {
    if !path.exists() {
        log::warn!("Activities file {} not found, scoring without data", path.display());
        return Ok(Vec::new());
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open activities file at {}", path.display()))?;

    serde_json::from_reader(file)
        .with_context(|| format!("Failed to parse activities in {}", path.display()))
}
