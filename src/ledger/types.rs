use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::competition::{BlockId, BlockScoreRecord, BlockState, Schedule};

pub const LEDGER_VERSION: u32 = 1;

/// Frozen block scores. Entries are only ever added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    pub version: u32,
    #[serde(default)]
    pub blocks: BTreeMap<BlockId, LockedBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockedBlock {
    pub locked_at: DateTime<Utc>,
    pub record: BlockScoreRecord,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    /// Create a new empty ledger with version 1
    pub fn new() -> Self {
        Self {
            version: LEDGER_VERSION,
            blocks: BTreeMap::new(),
        }
    }

    pub fn is_locked(&self, block: &BlockId) -> bool {
        self.blocks.contains_key(block)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Freeze a block score. A block can only be locked once.
    pub fn lock(&mut self, mut record: BlockScoreRecord, now: DateTime<Utc>) -> anyhow::Result<()> {
        if self.is_locked(&record.block_id) {
            anyhow::bail!("Block {} is already locked", record.block_id);
        }
        record.locked = true;
        log::info!("Locking block {}", record.block_id);
        self.blocks.insert(
            record.block_id.clone(),
            LockedBlock {
                locked_at: now,
                record,
            },
        );
        Ok(())
    }

    /// Starting state for a block before rescoring: `Final` when frozen,
    /// `Pending` otherwise.
    pub fn state_for(&self, block: &BlockId) -> BlockState {
        match self.blocks.get(block) {
            Some(entry) => BlockState::Final(entry.record.clone()),
            None => BlockState::Pending,
        }
    }
}

impl Schedule {
    /// Mark every block frozen in the ledger as locked. Ledger entries for
    /// blocks no longer in the schedule are reported and left alone.
    pub fn apply_locks(&mut self, ledger: &Ledger) {
        for id in ledger.blocks.keys() {
            if !self.mark_locked(id) {
                log::warn!("Ledger has block {} which is not in the schedule", id);
            }
        }
    }
}
