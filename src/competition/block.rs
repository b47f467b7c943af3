use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use super::sport::Sport;
use crate::error::ScoringError;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A calendar window of the competition with its own eligible sports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    /// 1-based position in the schedule
    pub ordinal: usize,
    pub label: String,
    pub opens: DateTime<Utc>,
    pub closes: DateTime<Utc>,
    pub sports: Vec<Sport>,
    /// Set once the block's score has been frozen in the ledger
    pub locked: bool,
}

impl Block {
    pub fn is_multi_sport(&self) -> bool {
        self.sports.len() > 1
    }

    pub fn is_eligible(&self, sport: Sport) -> bool {
        self.sports.contains(&sport)
    }

    /// Most points one athlete can take from this block: 2 per sport, plus the
    /// clean-sweep bonus when more than one sport is contested.
    pub fn max_points(&self) -> u32 {
        let base = 2 * self.sports.len() as u32;
        if self.is_multi_sport() {
            base + 1
        } else {
            base
        }
    }

    /// Window bounds are inclusive on both ends.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.opens <= instant && instant <= self.closes
    }

    pub fn has_closed(&self, now: DateTime<Utc>) -> bool {
        self.closes < now
    }
}

/// Ordered list of blocks making up the competition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schedule {
    blocks: Vec<Block>,
}

impl Schedule {
    /// Build a schedule, assigning ordinals in the given order.
    pub fn new(blocks: Vec<Block>) -> Result<Self, ScoringError> {
        let mut seen = HashSet::new();
        for block in &blocks {
            if !seen.insert(block.id.clone()) {
                return Err(ScoringError::InvalidSchedule(format!(
                    "duplicate block id '{}'",
                    block.id
                )));
            }
            if block.sports.is_empty() {
                return Err(ScoringError::InvalidSchedule(format!(
                    "block '{}' has no eligible sports",
                    block.id
                )));
            }
            if block.closes < block.opens {
                return Err(ScoringError::InvalidSchedule(format!(
                    "block '{}' closes before it opens",
                    block.id
                )));
            }
        }

        let blocks = blocks
            .into_iter()
            .enumerate()
            .map(|(i, block)| Block {
                ordinal: i + 1,
                ..block
            })
            .collect();

        Ok(Self { blocks })
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn get(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| &b.id == id)
    }

    /// The block whose window contains `instant`, if any.
    pub fn block_for_instant(&self, instant: DateTime<Utc>) -> Option<&Block> {
        self.blocks.iter().find(|b| b.contains(instant))
    }

    /// Mark a block locked. Returns false for unknown ids.
    pub fn mark_locked(&mut self, id: &BlockId) -> bool {
        match self.blocks.iter_mut().find(|b| &b.id == id) {
            Some(block) => {
                block.locked = true;
                true
            }
            None => false,
        }
    }

    /// Blocks whose window has closed but that are not locked yet,
    /// most recently closed first.
    pub fn closed_unlocked(&self, now: DateTime<Utc>) -> Vec<&Block> {
        let mut candidates: Vec<&Block> = self
            .blocks
            .iter()
            .filter(|b| b.has_closed(now) && !b.locked)
            .collect();
        candidates.sort_by(|a, b| b.closes.cmp(&a.closes));
        candidates
    }

    /// Largest per-block points ceiling across the schedule.
    pub fn max_points_per_block(&self) -> u32 {
        self.blocks.iter().map(Block::max_points).max().unwrap_or(0)
    }
}
