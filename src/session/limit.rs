use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Input to a session's control loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionSignal {
    Key(char),
    TimeLimitReached,
    Stop,
}

/// One-shot timer that posts `TimeLimitReached` into a session's signal
/// channel. The timer never touches session state itself.
#[derive(Debug)]
pub struct LimitTimer {
    cancel: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl LimitTimer {
    pub fn start(after: Duration, signals: Sender<SessionSignal>) -> Self {
        let (cancel_tx, cancel_rx) = mpsc::channel::<()>();
        let handle = thread::spawn(move || match cancel_rx.recv_timeout(after) {
            Err(RecvTimeoutError::Timeout) => {
                log::debug!("Time limit of {after:?} reached");
                let _ = signals.send(SessionSignal::TimeLimitReached);
            }
            // Cancelled explicitly or the timer handle was dropped.
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {}
        });
        Self {
            cancel: Some(cancel_tx),
            handle: Some(handle),
        }
    }

    /// Safe to call repeatedly; only the first call does anything.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }
}

impl Drop for LimitTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    #[test]
    fn test_fires_once_after_delay() {
        let (tx, rx) = mpsc::channel();
        let start = Instant::now();
        let _timer = LimitTimer::start(Duration::from_millis(50), tx);
        let signal = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(signal, SessionSignal::TimeLimitReached);
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn test_cancel_prevents_fire_and_is_idempotent() {
        let (tx, rx) = mpsc::channel();
        let mut timer = LimitTimer::start(Duration::from_millis(50), tx);
        timer.cancel();
        timer.cancel();
        assert!(!timer.is_active());
        assert!(rx.recv_timeout(Duration::from_millis(150)).is_err());
    }
}
