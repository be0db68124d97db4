use serde::{Deserialize, Serialize};

use crate::session::battle::BattleOutcome;
use crate::session::result::BattleRecord;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProfileData {
    pub schema_version: u32,
    pub total_xp: u64,
    pub battles: u32,
    pub victories: u32,
}

impl Default for ProfileData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            total_xp: 0,
            battles: 0,
            victories: 0,
        }
    }
}

impl ProfileData {
    /// Check if loaded data has a stale schema version and needs reset.
    pub fn needs_reset(&self) -> bool {
        self.schema_version != SCHEMA_VERSION
    }

    pub fn apply(&mut self, record: &BattleRecord) {
        self.total_xp += u64::from(record.xp);
        self.battles += 1;
        if record.outcome == BattleOutcome::Victory {
            self.victories += 1;
        }
    }

    /// Totals recomputed from the full battle history.
    pub fn from_history(history: &BattleHistoryData) -> Self {
        let mut profile = Self::default();
        for record in &history.battles {
            profile.apply(record);
        }
        profile
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BattleHistoryData {
    pub schema_version: u32,
    pub battles: Vec<BattleRecord>,
}

impl Default for BattleHistoryData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            battles: Vec::new(),
        }
    }
}
