use log::debug;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::competition::{Athlete, AthleteId, Block, BlockScoreRecord, MetricsTable};
use crate::error::ScoringError;

pub const WIN_POINTS: u32 = 2;
pub const TIE_POINTS: u32 = 1;
pub const CLEAN_SWEEP_BONUS: u32 = 1;

/// Points for one sport given both athletes' calories.
///
/// Equal values (including 0 vs 0) split the sport 1-1, otherwise the
/// strictly greater value takes both points. Always sums to 2.
pub fn sport_points(c1: f64, c2: f64) -> (u32, u32) {
    match c1.partial_cmp(&c2) {
        Some(Ordering::Greater) => (WIN_POINTS, 0),
        Some(Ordering::Less) => (0, WIN_POINTS),
        _ => (TIE_POINTS, TIE_POINTS),
    }
}

/// Score one block.
///
/// `athletes` holds one or two registered athletes. A single athlete takes 2
/// points for every sport they logged calories in and 0 for the rest; no
/// clean sweep can be awarded. A sport missing from `metrics` counts as 0 calories; an athlete
/// with no entry for any eligible sport fails with `IncompleteData`.
///
/// `locked` is copied from the block, the engine never locks anything.
pub fn compute_block_score(
    block: &Block,
    athletes: &[Athlete],
    metrics: &MetricsTable,
) -> Result<BlockScoreRecord, ScoringError> {
    let (first, second) = match athletes {
        [first] => (first, None),
        [first, second] => (first, Some(second)),
        _ => {
            return Err(ScoringError::InvalidSchedule(format!(
                "expected one or two athletes, got {}",
                athletes.len()
            )))
        }
    };

    for athlete in athletes {
        if !metrics.has_data(&athlete.id, block) {
            return Err(ScoringError::IncompleteData {
                block: block.id.clone(),
                athlete: athlete.id.clone(),
            });
        }
    }

    let calories = |athlete: &Athlete, sport| {
        metrics
            .get(&athlete.id, &block.id, sport)
            .map(|m| m.calories)
            .unwrap_or(0.0)
    };

    let mut calories_by_sport = BTreeMap::new();
    let mut points_by_sport = BTreeMap::new();
    let mut details: BTreeMap<AthleteId, BTreeMap<_, _>> = BTreeMap::new();

    for &sport in &block.sports {
        let c1 = calories(first, sport);
        let c2 = second.map(|a| calories(a, sport)).unwrap_or(0.0);
        let (p1, p2) = match second {
            Some(_) => sport_points(c1, c2),
            // Unopposed: a logged sport is won outright, an unlogged one is worth nothing
            None if c1 > 0.0 => (WIN_POINTS, 0),
            None => (0, 0),
        };

        let mut sport_calories = BTreeMap::from([(first.id.clone(), c1)]);
        let mut points = BTreeMap::from([(first.id.clone(), p1)]);
        if let Some(second) = second {
            sport_calories.insert(second.id.clone(), c2);
            points.insert(second.id.clone(), p2);
        }
        calories_by_sport.insert(sport, sport_calories);
        points_by_sport.insert(sport, points);

        for athlete in athletes {
            if let Some(metric) = metrics.get(&athlete.id, &block.id, sport) {
                details
                    .entry(athlete.id.clone())
                    .or_default()
                    .insert(sport, *metric);
            }
        }
    }

    // Single-sport blocks and solo rosters can never produce a bonus.
    let clean_sweep_eligible = block.is_multi_sport() && second.is_some();
    let clean_sweep_winner = if clean_sweep_eligible {
        athletes
            .iter()
            .find(|athlete| {
                block.sports.iter().all(|sport| {
                    points_by_sport
                        .get(sport)
                        .and_then(|by_athlete| by_athlete.get(&athlete.id))
                        == Some(&WIN_POINTS)
                })
            })
            .map(|athlete| athlete.id.clone())
    } else {
        None
    };

    let mut bonus_points = BTreeMap::new();
    let mut total_points = BTreeMap::new();
    for athlete in athletes {
        let bonus = if clean_sweep_winner.as_ref() == Some(&athlete.id) {
            CLEAN_SWEEP_BONUS
        } else {
            0
        };
        let base: u32 = points_by_sport
            .values()
            .filter_map(|by_athlete| by_athlete.get(&athlete.id))
            .sum();
        bonus_points.insert(athlete.id.clone(), bonus);
        total_points.insert(athlete.id.clone(), base + bonus);
    }

    if let Some(winner) = &clean_sweep_winner {
        debug!("{}: clean sweep by {}", block.id, winner);
    }

    Ok(BlockScoreRecord {
        block_id: block.id.clone(),
        sports: block.sports.clone(),
        calories_by_sport,
        points_by_sport,
        details,
        clean_sweep_eligible,
        clean_sweep_achieved: clean_sweep_winner.is_some(),
        clean_sweep_winner,
        bonus_points,
        total_points,
        locked: block.locked,
    })
}
