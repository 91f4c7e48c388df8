pub mod json_store;
pub mod schema;

use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Result;

use crate::session::SessionResult;

pub use json_store::JsonStore;

/// Receives the result of every regularly finished session.
pub trait SessionStore {
    fn save(&mut self, result: &SessionResult) -> Result<()>;
}

/// Keeps results in memory. Clones share the same list, so a caller can
/// hand one clone to a session and read the results through another.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    saved: Arc<Mutex<Vec<SessionResult>>>,
}

impl MemoryStore {
    pub fn saved(&self) -> Vec<SessionResult> {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SessionStore for MemoryStore {
    fn save(&mut self, result: &SessionResult) -> Result<()> {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(result.clone());
        Ok(())
    }
}
