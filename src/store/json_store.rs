use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;

use crate::session::SessionResult;
use crate::store::SessionStore;
use crate::store::schema::{SessionHistoryData, SessionRecord};

const HISTORY_FILE: &str = "sessions.json";

/// Session history kept as one JSON document under the data directory.
pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn new() -> Result<Self> {
        let base_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("keytrain");
        Self::with_base_dir(base_dir)
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)
            .with_context(|| format!("creating data directory {}", base_dir.display()))?;
        Ok(Self { base_dir })
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    /// A missing file is an empty history. An unreadable or stale file is
    /// logged and treated as empty too, so one bad file never blocks practice.
    pub fn load_history(&self) -> SessionHistoryData {
        let path = self.file_path(HISTORY_FILE);
        if !path.exists() {
            return SessionHistoryData::default();
        }
        let parsed = fs::read_to_string(&path)
            .map_err(anyhow::Error::from)
            .and_then(|s| serde_json::from_str::<SessionHistoryData>(&s).map_err(Into::into));
        match parsed {
            Ok(data) if data.needs_reset() => {
                log::warn!(
                    "Ignoring {} with schema version {}",
                    path.display(),
                    data.schema_version
                );
                SessionHistoryData::default()
            }
            Ok(data) => data,
            Err(e) => {
                log::warn!("Ignoring unreadable {}: {e}", path.display());
                SessionHistoryData::default()
            }
        }
    }

    fn save_history(&self, data: &SessionHistoryData) -> Result<()> {
        let path = self.file_path(HISTORY_FILE);
        let tmp_path = path.with_extension("tmp");

        let json = serde_json::to_string_pretty(data)?;
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    pub fn append(&self, result: &SessionResult) -> Result<()> {
        let mut history = self.load_history();
        history.sessions.push(SessionRecord::new(result, Utc::now()));
        self.save_history(&history)
            .with_context(|| format!("writing {}", self.file_path(HISTORY_FILE).display()))
    }

    /// The last `n` sessions of one exercise, newest first.
    pub fn sessions_for(&self, exercise_id: u32, n: usize) -> Vec<SessionRecord> {
        self.load_history()
            .sessions
            .into_iter()
            .rev()
            .filter(|r| r.exercise_id == exercise_id)
            .take(n)
            .collect()
    }
}

impl SessionStore for JsonStore {
    fn save(&mut self, result: &SessionResult) -> Result<()> {
        self.append(result)
    }
}
