pub mod controller;
pub mod event;
pub mod exercise;
pub mod limit;
pub mod monitor;
pub mod result;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::generator::SourceError;

pub use controller::SessionController;
pub use event::{SessionEvent, SessionListener};
pub use exercise::{ExerciseDescriptor, LimitType};
pub use limit::SessionSignal;
pub use result::SessionResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Init,
    Ready,
    Running,
    RegularlyStopped,
    UserStopped,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::RegularlyStopped | SessionState::UserStopped)
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("`{operation}` is not allowed while the session is {state:?}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },
    #[error(transparent)]
    Source(#[from] SourceError),
}
