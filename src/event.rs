use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use keytrain::session::SessionSignal;

/// Translate a terminal key press into a session signal.
pub fn signal_for(key: KeyEvent) -> Option<SessionSignal> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Esc => Some(SessionSignal::Stop),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(SessionSignal::Stop)
        }
        KeyCode::Char(ch) => Some(SessionSignal::Key(ch)),
        KeyCode::Enter => Some(SessionSignal::Key('\n')),
        _ => None,
    }
}

/// Reads terminal input on its own thread and posts it into a session's
/// signal channel.
pub struct InputForwarder {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl InputForwarder {
    pub fn spawn(signals: Sender<SessionSignal>, poll_rate: Duration) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);

        let handle = thread::spawn(move || {
            while flag.load(Ordering::Relaxed) {
                if !event::poll(poll_rate).unwrap_or(false) {
                    continue;
                }
                match event::read() {
                    Ok(Event::Key(key)) => {
                        if let Some(signal) = signal_for(key)
                            && signals.send(signal).is_err()
                        {
                            return;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        log::warn!("Terminal input failed: {e}");
                        return;
                    }
                }
            }
        });

        Self {
            running,
            handle: Some(handle),
        }
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for InputForwarder {
    fn drop(&mut self) {
        self.stop();
    }
}
