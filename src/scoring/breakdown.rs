use serde::Serialize;
use std::collections::BTreeMap;

use crate::competition::{Athlete, AthleteId, BlockScoreRecord, Sport};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SportTotals {
    pub calories: f64,
    pub points: u32,
    pub distance_m: f64,
}

/// Cumulative per-sport totals for each athlete.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SportBreakdown {
    pub by_athlete: BTreeMap<AthleteId, BTreeMap<Sport, SportTotals>>,
}

impl SportBreakdown {
    pub fn get(&self, athlete: &AthleteId, sport: Sport) -> SportTotals {
        self.by_athlete
            .get(athlete)
            .and_then(|sports| sports.get(&sport))
            .copied()
            .unwrap_or_default()
    }

    pub fn has_distance(&self) -> bool {
        self.by_athlete
            .values()
            .flat_map(|sports| sports.values())
            .any(|t| t.distance_m > 0.0)
    }
}

pub fn compute_breakdown<'a, I>(athletes: &[Athlete], records: I) -> SportBreakdown
where
    I: IntoIterator<Item = &'a BlockScoreRecord>,
{
    let mut by_athlete: BTreeMap<AthleteId, BTreeMap<Sport, SportTotals>> = athletes
        .iter()
        .map(|a| {
            let sports = Sport::ALL
                .iter()
                .map(|&s| (s, SportTotals::default()))
                .collect();
            (a.id.clone(), sports)
        })
        .collect();

    for record in records {
        for (athlete, sports) in by_athlete.iter_mut() {
            for &sport in &record.sports {
                let totals = sports.entry(sport).or_default();
                totals.calories += record.calories_for(athlete, sport);
                totals.points += record.points_for(athlete, sport);
                totals.distance_m += record.distance_for(athlete, sport);
            }
        }
    }

    SportBreakdown { by_athlete }
}
