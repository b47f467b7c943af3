use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::competition::{Athlete, Block, BlockId, Schedule, Sport};
use crate::error::ScoringError;
use crate::scoring::StakesConfig;

pub const DEFAULT_PROJECTION_MIN_BLOCKS: usize = 2;

/// Competition definition, loaded from YAML.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub athletes: Vec<AthleteConfig>,
    pub blocks: Vec<BlockConfig>,

    /// Activities file from the ingestion side, relative to the config file
    #[serde(default)]
    pub activities: Option<String>,

    /// Lock ledger file, relative to the config file
    #[serde(default)]
    pub ledger: Option<String>,

    /// Ceiling used by the comeback check (default: largest block ceiling).
    ///
    /// A three-sport block can pay 2 points per sport plus the 1 point sweep
    /// bonus, so the default is 7. That is deliberately higher than the
    /// "2 base + 1 bonus = 3" figure sometimes quoted for a whole block.
    #[serde(default)]
    pub max_points_per_block: Option<u32>,

    /// Scored blocks needed before a projection is shown (default: 2)
    #[serde(default)]
    pub projection_min_blocks: Option<usize>,

    #[serde(default)]
    pub stakes: Option<StakesConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AthleteConfig {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BlockConfig {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    pub opens: DateTime<Utc>,
    pub closes: DateTime<Utc>,
    /// Sport names, e.g. ["Cycling", "Running", "Swimming"]
    pub sports: Vec<String>,
}

impl BlockConfig {
    fn to_block(&self) -> Result<Block, ScoringError> {
        let sports = self
            .sports
            .iter()
            .map(|name| {
                name.parse::<Sport>().map_err(|e| {
                    ScoringError::InvalidSchedule(format!("block '{}': {}", self.id, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Block {
            id: BlockId::new(&self.id),
            ordinal: 0,
            label: self.label.clone().unwrap_or_else(|| self.id.clone()),
            opens: self.opens,
            closes: self.closes,
            sports,
            locked: false,
        })
    }
}

impl Config {
    pub fn athletes(&self) -> Vec<Athlete> {
        self.athletes
            .iter()
            .map(|a| Athlete::new(&a.id, &a.name))
            .collect()
    }

    /// Build the schedule. Unknown sports and malformed blocks are rejected.
    /// Every block starts unlocked; locks come from the ledger.
    pub fn schedule(&self) -> Result<Schedule, ScoringError> {
        let blocks = self
            .blocks
            .iter()
            .map(BlockConfig::to_block)
            .collect::<Result<Vec<_>, _>>()?;
        Schedule::new(blocks)
    }

    pub fn projection_min_blocks(&self) -> usize {
        self.projection_min_blocks
            .unwrap_or(DEFAULT_PROJECTION_MIN_BLOCKS)
    }

    pub fn stakes(&self) -> StakesConfig {
        self.stakes.clone().unwrap_or_default()
    }
}
