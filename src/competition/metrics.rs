use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::athlete::AthleteId;
use super::block::{Block, BlockId};
use super::sport::Sport;

/// Aggregated activity totals for one athlete, block and sport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub distance_m: f64,
    pub calories: f64,
    /// Calories were derived (e.g. from kilojoules) rather than measured
    #[serde(default)]
    pub estimated: bool,
    #[serde(default)]
    pub moving_time_s: u64,
    #[serde(default)]
    pub activities: u32,
}

impl Metric {
    /// Fold another metric into this one.
    pub fn absorb(&mut self, other: &Metric) {
        self.distance_m += other.distance_m;
        self.calories += other.calories;
        self.estimated |= other.estimated;
        self.moving_time_s += other.moving_time_s;
        self.activities += other.activities;
    }
}

/// `(athlete, block, sport) -> Metric` lookup, as handed over by ingestion.
#[derive(Debug, Clone, Default)]
pub struct MetricsTable {
    entries: HashMap<AthleteId, HashMap<BlockId, HashMap<Sport, Metric>>>,
}

impl MetricsTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a metric, summing with anything already recorded for the same key.
    pub fn add(&mut self, athlete: &AthleteId, block: &BlockId, sport: Sport, metric: Metric) {
        self.entries
            .entry(athlete.clone())
            .or_default()
            .entry(block.clone())
            .or_default()
            .entry(sport)
            .or_default()
            .absorb(&metric);
    }

    pub fn get(&self, athlete: &AthleteId, block: &BlockId, sport: Sport) -> Option<&Metric> {
        self.entries.get(athlete)?.get(block)?.get(&sport)
    }

    /// Whether the athlete has any entry for an eligible sport of the block.
    /// An entry with zero calories still counts as data.
    pub fn has_data(&self, athlete: &AthleteId, block: &Block) -> bool {
        block
            .sports
            .iter()
            .any(|&sport| self.get(athlete, &block.id, sport).is_some())
    }

    /// Number of (athlete, block, sport) entries.
    pub fn len(&self) -> usize {
        self.entries
            .values()
            .flat_map(|blocks| blocks.values())
            .map(|sports| sports.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::competition::block::tests::sample_block;

    fn metric(calories: f64, distance_m: f64) -> Metric {
        Metric {
            distance_m,
            calories,
            estimated: false,
            moving_time_s: 600,
            activities: 1,
        }
    }

    #[test]
    fn test_add_accumulates() {
        let mut table = MetricsTable::new();
        let athlete = AthleteId::new("p1");
        let block = BlockId::new("block_2");

        table.add(&athlete, &block, Sport::Running, metric(300.0, 5000.0));
        table.add(
            &athlete,
            &block,
            Sport::Running,
            Metric {
                estimated: true,
                ..metric(200.0, 3000.0)
            },
        );

        let total = table.get(&athlete, &block, Sport::Running).unwrap();
        assert_eq!(total.calories, 500.0);
        assert_eq!(total.distance_m, 8000.0);
        assert_eq!(total.moving_time_s, 1200);
        assert_eq!(total.activities, 2);
        assert!(total.estimated);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_has_data_only_for_eligible_sports() {
        let mut table = MetricsTable::new();
        let athlete = AthleteId::new("p1");
        let swim_only = sample_block("block_1", &[Sport::Swimming]);

        table.add(&athlete, &swim_only.id, Sport::Running, metric(300.0, 5000.0));
        assert!(!table.has_data(&athlete, &swim_only));

        table.add(&athlete, &swim_only.id, Sport::Swimming, metric(0.0, 0.0));
        assert!(table.has_data(&athlete, &swim_only));
    }

    #[test]
    fn test_get_missing() {
        let table = MetricsTable::new();
        assert!(table.is_empty());
        assert!(table
            .get(&AthleteId::new("p1"), &BlockId::new("b"), Sport::Cycling)
            .is_none());
    }
}
