use crate::session::SessionState;

/// Notifications pushed to session listeners, in the order they happen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    StateChanged(SessionState),
    NewLine { line1: String, line2: String },
    Typed { ch: char, correct: bool },
}

/// Receives session events. Listeners observe only; they get no handle to
/// the session.
pub trait SessionListener {
    fn on_event(&mut self, event: &SessionEvent);
}

impl<F: FnMut(&SessionEvent)> SessionListener for F {
    fn on_event(&mut self, event: &SessionEvent) {
        self(event)
    }
}

#[derive(Default)]
pub(crate) struct Listeners {
    listeners: Vec<Box<dyn SessionListener>>,
}

impl Listeners {
    pub fn add(&mut self, listener: Box<dyn SessionListener>) {
        self.listeners.push(listener);
    }

    pub fn emit(&mut self, event: SessionEvent) {
        for listener in &mut self.listeners {
            listener.on_event(&event);
        }
    }
}
