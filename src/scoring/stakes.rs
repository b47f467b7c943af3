use serde::Serialize;

use super::config::StakesConfig;
use super::standings::StandingsSnapshot;
use crate::competition::{display_name, Athlete, AthleteId};

const LOSER_PLACEHOLDER: &str = "{loser}";

/// Ordered `(min_gap, value)` lookup evaluated from the highest threshold down.
/// The highest tier is the capped tail: every gap at or above it lands there.
#[derive(Debug, Clone, PartialEq)]
pub struct StakesTable<T> {
    tiers: Vec<(u32, T)>,
}

impl<T> StakesTable<T> {
    pub fn new(tiers: impl IntoIterator<Item = (u32, T)>) -> Self {
        let mut tiers: Vec<(u32, T)> = tiers.into_iter().collect();
        tiers.sort_by(|a, b| b.0.cmp(&a.0));
        Self { tiers }
    }

    /// First tier whose threshold the gap reaches.
    pub fn lookup(&self, gap: u32) -> Option<&T> {
        self.tiers
            .iter()
            .find(|(min_gap, _)| gap >= *min_gap)
            .map(|(_, value)| value)
    }

    /// Thresholds, highest first.
    pub fn thresholds(&self) -> Vec<u32> {
        self.tiers.iter().map(|(min_gap, _)| *min_gap).collect()
    }
}

/// What the current margin is worth at dinner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stakes {
    pub gap: u32,
    /// Trailing athlete, who picks up the bill. None when tied or unopposed.
    pub debtor: Option<AthleteId>,
    pub venue: String,
    pub message: String,
    pub debt: u32,
    pub currency: String,
}

/// Map the score gap to a venue, a mood line and a running bill.
///
/// Stakes only accrue between two registered athletes: while the second seat
/// is empty the gap is reported but nobody owes anything.
pub fn compute_stakes(
    standings: &StandingsSnapshot,
    athletes: &[Athlete],
    config: &StakesConfig,
) -> Stakes {
    let gap = standings.margin;
    let debtor = standings.trailer.clone();
    let owed_gap = if debtor.is_some() { gap } else { 0 };

    let venue = config
        .venue_table()
        .lookup(owed_gap)
        .cloned()
        .unwrap_or_default();

    let message = config
        .mood_table()
        .lookup(owed_gap)
        .map(|template| match &debtor {
            Some(id) => template.replace(LOSER_PLACEHOLDER, display_name(athletes, id)),
            None => template.clone(),
        })
        .unwrap_or_default();

    Stakes {
        gap,
        debtor,
        venue,
        message,
        debt: owed_gap * config.per_point(),
        currency: config.currency().to_string(),
    }
}
