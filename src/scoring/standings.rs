use serde::Serialize;
use std::collections::BTreeMap;

use crate::competition::{Athlete, AthleteId, BlockScoreRecord};

/// Cumulative totals across every supplied block record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StandingsSnapshot {
    pub totals: BTreeMap<AthleteId, u32>,
    /// Athlete with the strictly highest total; None when tied
    pub leader: Option<AthleteId>,
    /// The other registered athlete when there is a leader
    pub trailer: Option<AthleteId>,
    pub margin: u32,
    pub is_tied: bool,
}

impl StandingsSnapshot {
    pub fn total_for(&self, athlete: &AthleteId) -> u32 {
        self.totals.get(athlete).copied().unwrap_or(0)
    }

    /// Current totals as (high, low). An absent second athlete counts as 0.
    pub fn high_low(&self) -> (u32, u32) {
        let mut values: Vec<u32> = self.totals.values().copied().collect();
        values.sort_unstable_by(|a, b| b.cmp(a));
        (
            values.first().copied().unwrap_or(0),
            values.get(1).copied().unwrap_or(0),
        )
    }
}

/// Sum `total_points` per registered athlete over all records, locked or not.
/// The result does not depend on record order.
pub fn compute_standings<'a, I>(athletes: &[Athlete], records: I) -> StandingsSnapshot
where
    I: IntoIterator<Item = &'a BlockScoreRecord>,
{
    let mut totals: BTreeMap<AthleteId, u32> =
        athletes.iter().map(|a| (a.id.clone(), 0)).collect();

    for record in records {
        for (athlete, total) in totals.iter_mut() {
            *total += record.total_for(athlete);
        }
    }

    let t1 = athletes.first().map(|a| totals[&a.id]).unwrap_or(0);
    let t2 = athletes.get(1).map(|a| totals[&a.id]).unwrap_or(0);
    let margin = t1.abs_diff(t2);

    let (leader, trailer) = match (athletes.first(), athletes.get(1)) {
        (Some(first), second) if t1 > t2 => (Some(first.id.clone()), second.map(|a| a.id.clone())),
        (Some(first), Some(second)) if t2 > t1 => (Some(second.id.clone()), Some(first.id.clone())),
        _ => (None, None),
    };

    StandingsSnapshot {
        totals,
        leader,
        trailer,
        margin,
        is_tied: margin == 0,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::competition::{BlockId, Sport};

    pub(crate) fn duo() -> Vec<Athlete> {
        vec![Athlete::new("p1", "Alpha"), Athlete::new("p2", "Beta")]
    }

    /// A bare record carrying only totals and bonus points.
    pub(crate) fn record_with(
        block: &str,
        totals: (u32, u32),
        bonus: (u32, u32),
    ) -> BlockScoreRecord {
        let p1 = AthleteId::new("p1");
        let p2 = AthleteId::new("p2");
        BlockScoreRecord {
            block_id: BlockId::new(block),
            sports: Sport::ALL.to_vec(),
            calories_by_sport: BTreeMap::new(),
            points_by_sport: BTreeMap::new(),
            details: BTreeMap::new(),
            clean_sweep_eligible: true,
            clean_sweep_achieved: bonus.0 + bonus.1 > 0,
            clean_sweep_winner: None,
            bonus_points: BTreeMap::from([(p1.clone(), bonus.0), (p2.clone(), bonus.1)]),
            total_points: BTreeMap::from([(p1, totals.0), (p2, totals.1)]),
            locked: false,
        }
    }

    #[test]
    fn test_empty_records_are_tied_at_zero() {
        let standings = compute_standings(&duo(), std::iter::empty());
        assert_eq!(standings.total_for(&AthleteId::new("p1")), 0);
        assert_eq!(standings.total_for(&AthleteId::new("p2")), 0);
        assert_eq!(standings.totals.len(), 2);
        assert!(standings.is_tied);
        assert_eq!(standings.margin, 0);
        assert_eq!(standings.leader, None);
    }

    #[test]
    fn test_totals_and_leader() {
        let records = vec![
            record_with("block_1", (2, 0), (0, 0)),
            record_with("block_2", (7, 0), (1, 0)),
            record_with("block_3", (1, 5), (0, 0)),
        ];
        let standings = compute_standings(&duo(), &records);
        assert_eq!(standings.total_for(&AthleteId::new("p1")), 10);
        assert_eq!(standings.total_for(&AthleteId::new("p2")), 5);
        assert_eq!(standings.margin, 5);
        assert!(!standings.is_tied);
        assert_eq!(standings.leader, Some(AthleteId::new("p1")));
        assert_eq!(standings.trailer, Some(AthleteId::new("p2")));
        assert_eq!(standings.high_low(), (10, 5));
    }

    #[test]
    fn test_order_independent() {
        let mut records = vec![
            record_with("block_1", (2, 0), (0, 0)),
            record_with("block_2", (3, 3), (0, 0)),
            record_with("block_3", (0, 7), (0, 1)),
        ];
        let forward = compute_standings(&duo(), &records);
        records.reverse();
        let backward = compute_standings(&duo(), &records);
        assert_eq!(forward, backward);
        assert_eq!(forward.leader, Some(AthleteId::new("p2")));
        assert_eq!(forward.trailer, Some(AthleteId::new("p1")));
    }

    #[test]
    fn test_single_athlete_leads_absent_opponent() {
        let solo = vec![Athlete::new("p1", "Alpha")];
        let records = vec![record_with("block_1", (2, 0), (0, 0))];
        let standings = compute_standings(&solo, &records);
        assert_eq!(standings.totals.len(), 1);
        assert_eq!(standings.margin, 2);
        assert_eq!(standings.leader, Some(AthleteId::new("p1")));
        assert_eq!(standings.trailer, None);
    }

    #[test]
    fn test_unregistered_athletes_ignored() {
        let solo = vec![Athlete::new("p2", "Beta")];
        let records = vec![record_with("block_1", (5, 1), (0, 0))];
        let standings = compute_standings(&solo, &records);
        assert_eq!(standings.total_for(&AthleteId::new("p2")), 1);
        assert!(!standings.totals.contains_key(&AthleteId::new("p1")));
    }
}
