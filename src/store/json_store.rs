use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::backend::{BackendError, ResultBackend};
use crate::session::result::{BattleRecord, ResultSubmission, SubmissionReceipt};
use crate::store::schema::{BattleHistoryData, ProfileData, SCHEMA_VERSION};

const PROFILE_FILE: &str = "profile.json";
const HISTORY_FILE: &str = "history.json";

pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    fn load<T: DeserializeOwned + Default>(&self, name: &str) -> T {
        let path = self.file_path(name);
        if path.exists() {
            match fs::read_to_string(&path) {
                Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
                Err(_) => T::default(),
            }
        } else {
            T::default()
        }
    }

    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        let path = self.file_path(name);
        let tmp_path = path.with_extension("tmp");

        let json = serde_json::to_string_pretty(data)?;
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    /// Profile totals. `history.json` is the source of truth: when the stored
    /// profile is missing, stale or disagrees with the history, it is rebuilt
    /// from the history.
    pub fn load_profile(&self) -> ProfileData {
        let profile: ProfileData = self.load(PROFILE_FILE);
        let history = self.load_history();
        if profile.needs_reset() || profile.battles as usize != history.battles.len() {
            ProfileData::from_history(&history)
        } else {
            profile
        }
    }

    pub fn save_profile(&self, data: &ProfileData) -> Result<()> {
        self.save(PROFILE_FILE, data)
    }

    pub fn load_history(&self) -> BattleHistoryData {
        let history: BattleHistoryData = self.load(HISTORY_FILE);
        if history.schema_version != SCHEMA_VERSION {
            BattleHistoryData::default()
        } else {
            history
        }
    }

    pub fn save_history(&self, data: &BattleHistoryData) -> Result<()> {
        self.save(HISTORY_FILE, data)
    }

    /// Append a battle to history, then refresh the cached profile totals.
    /// A failed profile write is repaired by the next `load_profile`.
    pub fn record_battle(&self, record: BattleRecord) -> Result<ProfileData> {
        let mut history = self.load_history();
        history.battles.push(record);
        self.save_history(&history)?;
        let profile = ProfileData::from_history(&history);
        if let Err(err) = self.save_profile(&profile) {
            warn!(error = %err, "profile totals not saved, rebuilt from history on next load");
        }
        Ok(profile)
    }
}

#[async_trait]
impl ResultBackend for JsonStore {
    async fn submit(&self, submission: &ResultSubmission) -> Result<SubmissionReceipt, BackendError> {
        let record = BattleRecord::from_submission(submission);
        let xp_earned = record.xp;
        let profile = self
            .record_battle(record)
            .map_err(|e| BackendError::Store(format!("{e:#}")))?;
        debug!(total_xp = profile.total_xp, battles = profile.battles, "battle stored locally");
        Ok(SubmissionReceipt { xp_earned })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::battle::BattleOutcome;
    use tempfile::TempDir;

    fn make_test_store() -> (TempDir, JsonStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        (dir, store)
    }

    fn submission(outcome: BattleOutcome, xp: u32) -> ResultSubmission {
        ResultSubmission {
            xp,
            accuracy: 75.0,
            total_attempts: 4,
            total_correct: 3,
            turns_taken: 3,
            hero_id: "knight".to_string(),
            enemy_id: "goblin".to_string(),
            outcome,
        }
    }

    #[test]
    fn test_missing_files_load_defaults() {
        let (_dir, store) = make_test_store();
        assert_eq!(store.load_profile().battles, 0);
        assert!(store.load_history().battles.is_empty());
    }

    #[test]
    fn test_record_battle_updates_profile_and_history() {
        let (_dir, store) = make_test_store();
        store
            .record_battle(BattleRecord::from_submission(&submission(BattleOutcome::Victory, 80)))
            .unwrap();
        let profile = store
            .record_battle(BattleRecord::from_submission(&submission(BattleOutcome::Defeat, 12)))
            .unwrap();

        assert_eq!(profile.total_xp, 92);
        assert_eq!(profile.battles, 2);
        assert_eq!(profile.victories, 1);
        assert_eq!(store.load_history().battles.len(), 2);
        assert!(!store.file_path("profile.tmp").exists());
    }

    #[test]
    fn test_stale_schema_resets_profile() {
        let (_dir, store) = make_test_store();
        let mut stale = ProfileData::default();
        stale.schema_version = 99;
        stale.total_xp = 500;
        store.save_profile(&stale).unwrap();
        assert_eq!(store.load_profile().total_xp, 0);
    }

    #[test]
    fn test_profile_rebuilt_when_behind_history() {
        let (_dir, store) = make_test_store();
        store
            .record_battle(BattleRecord::from_submission(&submission(BattleOutcome::Victory, 80)))
            .unwrap();
        // history written, profile write lost
        let mut history = store.load_history();
        history
            .battles
            .push(BattleRecord::from_submission(&submission(BattleOutcome::Defeat, 12)));
        store.save_history(&history).unwrap();

        let profile = store.load_profile();
        assert_eq!(profile.battles, 2);
        assert_eq!(profile.victories, 1);
        assert_eq!(profile.total_xp, 92);
    }

    #[test]
    fn test_corrupt_history_loads_default() {
        let (_dir, store) = make_test_store();
        fs::write(store.file_path(HISTORY_FILE), "{ not json").unwrap();
        assert!(store.load_history().battles.is_empty());
    }

    #[tokio::test]
    async fn test_submit_returns_xp_and_persists() {
        let (_dir, store) = make_test_store();
        let receipt = store.submit(&submission(BattleOutcome::Victory, 64)).await.unwrap();
        assert_eq!(receipt.xp_earned, 64);
        assert_eq!(store.load_profile().total_xp, 64);
    }
}
