use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::{Duration, Instant};

use crate::engine::PerformanceStats;
use crate::generator::WordSource;
use crate::generator::registry::{SourceContext, StrategyRegistry};
use crate::session::event::{Listeners, SessionEvent, SessionListener};
use crate::session::exercise::ExerciseDescriptor;
use crate::session::limit::{LimitTimer, SessionSignal};
use crate::session::monitor::{Keystroke, LineMonitor};
use crate::session::result::SessionResult;
use crate::session::{SessionError, SessionState};
use crate::store::SessionStore;

/// Runs one practice session of one exercise.
///
/// All state changes happen on the thread owning the controller. Keystrokes
/// can be fed directly through [`advance_if_correct`](Self::advance_if_correct)
/// or posted as [`SessionSignal`]s through [`signal_sender`](Self::signal_sender);
/// the time-limit timer only ever posts a signal, which the controller picks up
/// the next time it drains its channel.
pub struct SessionController {
    exercise: ExerciseDescriptor,
    state: SessionState,
    stats: PerformanceStats,
    source: Box<dyn WordSource>,
    monitor: LineMonitor,
    store: Box<dyn SessionStore>,
    listeners: Listeners,
    max_line_length: usize,
    line1: String,
    line2: String,
    is_last_line: bool,
    correct_typed: u32,
    started_at: Option<Instant>,
    required_time: Option<Duration>,
    timer: Option<LimitTimer>,
    signal_tx: Sender<SessionSignal>,
    signal_rx: Receiver<SessionSignal>,
    result: Option<SessionResult>,
    persist_error: Option<String>,
}

impl SessionController {
    pub fn new(
        exercise: ExerciseDescriptor,
        source: Box<dyn WordSource>,
        store: Box<dyn SessionStore>,
        max_line_length: usize,
    ) -> Self {
        let (signal_tx, signal_rx) = mpsc::channel();
        Self {
            exercise,
            state: SessionState::Init,
            stats: PerformanceStats::new(),
            source,
            monitor: LineMonitor::new(),
            store,
            listeners: Listeners::default(),
            max_line_length,
            line1: String::new(),
            line2: String::new(),
            is_last_line: false,
            correct_typed: 0,
            started_at: None,
            required_time: None,
            timer: None,
            signal_tx,
            signal_rx,
            result: None,
            persist_error: None,
        }
    }

    /// Build the exercise's word source through `registry`. Fails before the
    /// session exists if the strategy is unknown or cannot load its content.
    pub fn from_registry(
        exercise: ExerciseDescriptor,
        registry: &StrategyRegistry,
        ctx: &SourceContext,
        store: Box<dyn SessionStore>,
        max_line_length: usize,
    ) -> Result<Self, SessionError> {
        let source = registry.create(&exercise.strategy_key, &exercise.strategy_param, ctx)?;
        Ok(Self::new(exercise, source, store, max_line_length))
    }

    pub fn add_listener(&mut self, listener: impl SessionListener + 'static) {
        self.listeners.add(Box::new(listener));
    }

    pub fn signal_sender(&self) -> Sender<SessionSignal> {
        self.signal_tx.clone()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn exercise(&self) -> &ExerciseDescriptor {
        &self.exercise
    }

    pub fn stats(&self) -> &PerformanceStats {
        &self.stats
    }

    pub fn monitor(&self) -> &LineMonitor {
        &self.monitor
    }

    pub fn line1(&self) -> &str {
        &self.line1
    }

    pub fn line2(&self) -> &str {
        &self.line2
    }

    pub fn is_last_line(&self) -> bool {
        self.is_last_line
    }

    pub fn correct_typed(&self) -> u32 {
        self.correct_typed
    }

    pub fn result(&self) -> Option<&SessionResult> {
        self.result.as_ref()
    }

    /// Why handing the result to the store failed, if it did.
    pub fn persist_error(&self) -> Option<&str> {
        self.persist_error.as_deref()
    }

    fn expect_state(
        &self,
        operation: &'static str,
        allowed: &[SessionState],
    ) -> Result<(), SessionError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(SessionError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state != state {
            log::debug!(
                "Session '{}': {:?} -> {state:?}",
                self.exercise.name,
                self.state
            );
            self.state = state;
            self.listeners.emit(SessionEvent::StateChanged(state));
        }
    }

    /// Fetch the first two lines.
    pub fn ready(&mut self) -> Result<(), SessionError> {
        self.expect_state("ready", &[SessionState::Init])?;
        self.line2 = self.source.create(self.max_line_length, &self.stats);
        self.promote_lines();
        self.set_state(SessionState::Ready);
        Ok(())
    }

    /// Start the clock, and the limit timer for timed exercises.
    pub fn run(&mut self) -> Result<(), SessionError> {
        self.expect_state("run", &[SessionState::Ready])?;
        self.started_at = Some(Instant::now());
        if let Some(limit) = self.exercise.time_limit() {
            self.timer = Some(LimitTimer::start(limit, self.signal_tx.clone()));
        }
        self.set_state(SessionState::Running);
        Ok(())
    }

    /// Validate one keystroke typed by the user.
    ///
    /// Signals already waiting in the channel and an expired time limit are
    /// handled first. A key arriving once the session has stopped is dropped
    /// and yields `None`.
    pub fn advance_if_correct(&mut self, typed: char) -> Result<Option<Keystroke>, SessionError> {
        self.process_pending()?;
        if self.state.is_terminal() {
            log::trace!("Ignoring key {typed:?} after session end");
            return Ok(None);
        }
        self.validate(typed).map(Some)
    }

    fn validate(&mut self, typed: char) -> Result<Keystroke, SessionError> {
        self.expect_state("advance_if_correct", &[SessionState::Running])?;
        let keystroke = self.monitor.advance_if_correct(typed, &mut self.stats);
        self.listeners.emit(SessionEvent::Typed {
            ch: typed,
            correct: keystroke.correct,
        });

        if keystroke.correct {
            self.correct_typed += 1;
            self.check_char_limit();
            if keystroke.line_completed && self.state == SessionState::Running {
                self.new_line();
                self.check_char_limit();
            }
        }
        Ok(keystroke)
    }

    fn check_char_limit(&mut self) {
        if self.state != SessionState::Running {
            return;
        }
        if let Some(limit) = self.exercise.char_limit()
            && self.correct_typed >= limit
        {
            self.reg_stop();
        }
    }

    /// Stop a timed session whose limit has passed, even if the timer's
    /// signal has not been handled yet.
    fn check_deadline(&mut self) {
        if self.state != SessionState::Running {
            return;
        }
        if let (Some(limit), Some(start)) = (self.exercise.time_limit(), self.started_at)
            && start.elapsed() >= limit
        {
            self.reg_stop();
        }
    }

    /// Called when the active line has been typed through its newline.
    fn new_line(&mut self) {
        if self.is_last_line {
            self.monitor.set_line("");
            self.reg_stop();
            return;
        }
        self.promote_lines();
    }

    fn promote_lines(&mut self) {
        self.line1 = std::mem::take(&mut self.line2);
        if self.source.has_next() {
            self.line2 = self.source.create(self.max_line_length, &self.stats);
        } else {
            self.is_last_line = true;
        }
        self.monitor.set_line(&self.line1);
        log::trace!("New line {:?}, next {:?}", self.line1, self.line2);
        self.listeners.emit(SessionEvent::NewLine {
            line1: self.line1.clone(),
            line2: self.line2.clone(),
        });
    }

    fn freeze(&mut self) {
        let mut elapsed = self.started_at.map(|s| s.elapsed()).unwrap_or_default();
        if let Some(limit) = self.exercise.time_limit() {
            elapsed = elapsed.min(limit);
        }
        self.required_time = Some(elapsed);
        if let Some(mut timer) = self.timer.take() {
            timer.cancel();
        }
        self.source.stop();
    }

    /// Limit reached: persist the result once and stop.
    fn reg_stop(&mut self) {
        if self.state != SessionState::Running {
            return;
        }
        self.freeze();
        let result = SessionResult {
            exercise_id: self.exercise.id,
            totals: self.stats.total(),
            required_time_ms: self.required_time_ms(),
        };
        if let Err(e) = self.store.save(&result) {
            log::error!(
                "Failed to save session of exercise {}: {e:#}",
                self.exercise.id
            );
            self.persist_error = Some(format!("{e:#}"));
        }
        self.result = Some(result);
        self.set_state(SessionState::RegularlyStopped);
    }

    /// Cancel the session without recording a result. Stopping an already
    /// stopped session does nothing.
    pub fn user_stop(&mut self) -> Result<(), SessionError> {
        if self.state.is_terminal() {
            return Ok(());
        }
        self.expect_state("user_stop", &[SessionState::Ready, SessionState::Running])?;
        self.freeze();
        self.set_state(SessionState::UserStopped);
        Ok(())
    }

    pub fn required_time_ms(&self) -> u64 {
        self.required_time
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default()
    }

    fn elapsed(&self) -> Duration {
        let elapsed = match (self.started_at, self.required_time) {
            (_, Some(frozen)) => frozen,
            (Some(start), None) => start.elapsed(),
            (None, None) => Duration::ZERO,
        };
        match self.exercise.time_limit() {
            Some(limit) => elapsed.min(limit),
            None => elapsed,
        }
    }

    /// Remaining milliseconds for timed exercises, elapsed milliseconds
    /// otherwise. Never below zero.
    pub fn current_time_ms(&self) -> i64 {
        let elapsed = self.elapsed().as_millis() as i64;
        match self.exercise.time_limit() {
            Some(limit) => limit.as_millis() as i64 - elapsed,
            None => elapsed,
        }
    }

    /// Apply one signal. A key arriving while ready starts the session.
    /// Signals arriving after the session stopped are dropped.
    pub fn handle_signal(&mut self, signal: SessionSignal) -> Result<Option<Keystroke>, SessionError> {
        self.check_deadline();
        if self.state.is_terminal() {
            log::trace!("Ignoring {signal:?} after session end");
            return Ok(None);
        }
        match signal {
            SessionSignal::Key(ch) => {
                if self.state == SessionState::Ready {
                    self.run()?;
                }
                self.validate(ch).map(Some)
            }
            SessionSignal::TimeLimitReached => {
                if self.exercise.time_limit().is_some() {
                    self.reg_stop();
                }
                Ok(None)
            }
            SessionSignal::Stop => self.user_stop().map(|_| None),
        }
    }

    /// Handle every signal already queued, without blocking. A failing
    /// signal does not stop the drain; the first failure is returned once the
    /// queue is empty.
    pub fn process_pending(&mut self) -> Result<(), SessionError> {
        let mut first_error = None;
        loop {
            match self.signal_rx.try_recv() {
                Ok(signal) => {
                    if let Err(e) = self.handle_signal(signal) {
                        log::warn!("Dropped {signal:?}: {e}");
                        first_error.get_or_insert(e);
                    }
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        self.check_deadline();
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Wait up to `timeout` for one signal and handle it. Returns whether a
    /// signal arrived.
    pub fn wait_signal(&mut self, timeout: Duration) -> Result<bool, SessionError> {
        match self.signal_rx.recv_timeout(timeout) {
            Ok(signal) => {
                self.handle_signal(signal)?;
                Ok(true)
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => {
                self.check_deadline();
                Ok(false)
            }
        }
    }

    /// Block on the signal channel until the session stops or `timeout`
    /// passes. Returns whether the session stopped.
    pub fn run_until_stopped(&mut self, timeout: Duration) -> Result<bool, SessionError> {
        let deadline = Instant::now() + timeout;
        while !self.state.is_terminal() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() || !self.wait_signal(remaining)? {
                break;
            }
        }
        Ok(self.state.is_terminal())
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if let Some(mut timer) = self.timer.take() {
            timer.cancel();
        }
        self.source.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::generator::text::TextLines;
    use crate::session::exercise::LimitType;
    use crate::store::MemoryStore;

    const TEXT: &str = "the quick brown fox jumps over the lazy dog again and again";

    fn controller(limit: LimitType, units: u32) -> (SessionController, MemoryStore) {
        let store = MemoryStore::default();
        let exercise = ExerciseDescriptor::new(3, "fox", "text").with_limit(limit, units);
        let source = TextLines::from_text(TEXT).unwrap();
        let pc = SessionController::new(exercise, Box::new(source), Box::new(store.clone()), 20);
        (pc, store)
    }

    fn type_line(pc: &mut SessionController) {
        let line: Vec<char> = pc.line1().chars().collect();
        for ch in line {
            if pc.state() != SessionState::Running {
                return;
            }
            pc.advance_if_correct(ch).unwrap();
        }
    }

    #[test]
    fn test_ready_prefetches_two_lines() {
        let (mut pc, _) = controller(LimitType::None, 0);
        pc.ready().unwrap();
        assert_eq!(pc.state(), SessionState::Ready);
        assert_eq!(pc.line1(), "the quick brown fox\n");
        assert_eq!(pc.line2(), "jumps over the lazy\n");
        assert_eq!(pc.monitor().current_char(), Some('t'));
    }

    #[test]
    fn test_guards() {
        let (mut pc, _) = controller(LimitType::None, 0);
        assert!(matches!(
            pc.run(),
            Err(SessionError::InvalidState { state: SessionState::Init, .. })
        ));
        assert!(pc.user_stop().is_err());
        assert!(pc.advance_if_correct('t').is_err());
        pc.ready().unwrap();
        assert!(pc.ready().is_err());
        assert!(pc.advance_if_correct('t').is_err());
    }

    #[test]
    fn test_keystroke_outcome_matches_event() {
        let (mut pc, _) = controller(LimitType::None, 0);
        let typed = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&typed);
        pc.add_listener(move |e: &SessionEvent| {
            if let SessionEvent::Typed { ch, correct } = e {
                sink.borrow_mut().push((*ch, *correct));
            }
        });
        pc.ready().unwrap();
        pc.run().unwrap();
        let a = pc.advance_if_correct('x').unwrap().unwrap();
        let b = pc.advance_if_correct('t').unwrap().unwrap();
        assert_eq!(*typed.borrow(), vec![('x', a.correct), ('t', b.correct)]);
        assert!(!a.correct);
        assert!(b.correct);
    }

    #[test]
    fn test_last_line_then_regular_stop() {
        let (mut pc, store) = controller(LimitType::None, 0);
        pc.ready().unwrap();
        pc.run().unwrap();
        let mut lines = 0;
        while pc.state() == SessionState::Running {
            type_line(&mut pc);
            lines += 1;
            assert!(lines < 10);
        }
        assert_eq!(lines, 3);
        assert_eq!(pc.state(), SessionState::RegularlyStopped);
        assert_eq!(store.saved().len(), 1);
        assert_eq!(store.saved()[0].totals.hits as usize, TEXT.chars().count() + 1);
    }

    #[test]
    fn test_last_line_flag_and_empty_lookahead() {
        let (mut pc, _) = controller(LimitType::None, 0);
        pc.ready().unwrap();
        pc.run().unwrap();
        type_line(&mut pc);
        assert!(!pc.is_last_line());
        type_line(&mut pc);
        assert!(pc.is_last_line());
        assert_eq!(pc.line2(), "");
        assert_eq!(pc.line1(), "dog again and again\n");
    }

    #[test]
    fn test_user_stop_from_ready_never_starts_clock() {
        let (mut pc, store) = controller(LimitType::None, 0);
        pc.ready().unwrap();
        pc.user_stop().unwrap();
        assert_eq!(pc.state(), SessionState::UserStopped);
        assert_eq!(pc.required_time_ms(), 0);
        assert!(pc.result().is_none());
        assert!(store.saved().is_empty());
        // Idempotent
        pc.user_stop().unwrap();
        assert_eq!(pc.state(), SessionState::UserStopped);
    }

    #[test]
    fn test_current_time_counts_down_for_time_limit() {
        let (mut pc, _) = controller(LimitType::Time, 5);
        assert_eq!(pc.current_time_ms(), 5000);
        pc.ready().unwrap();
        pc.run().unwrap();
        let t = pc.current_time_ms();
        assert!(t <= 5000 && t > 4000, "{t}");
        pc.user_stop().unwrap();
    }

    #[test]
    fn test_key_signal_starts_session() {
        let (mut pc, _) = controller(LimitType::None, 0);
        pc.ready().unwrap();
        let tx = pc.signal_sender();
        tx.send(SessionSignal::Key('t')).unwrap();
        tx.send(SessionSignal::Key('h')).unwrap();
        pc.process_pending().unwrap();
        assert_eq!(pc.state(), SessionState::Running);
        assert_eq!(pc.monitor().cursor(), 2);
        tx.send(SessionSignal::Stop).unwrap();
        tx.send(SessionSignal::Key('e')).unwrap();
        pc.process_pending().unwrap();
        assert_eq!(pc.state(), SessionState::UserStopped);
        assert_eq!(pc.monitor().cursor(), 2);
    }

    #[test]
    fn test_stale_time_signal_ignored_without_time_limit() {
        let (mut pc, store) = controller(LimitType::None, 0);
        pc.ready().unwrap();
        pc.run().unwrap();
        pc.handle_signal(SessionSignal::TimeLimitReached).unwrap();
        assert_eq!(pc.state(), SessionState::Running);
        assert!(store.saved().is_empty());
    }

    #[test]
    fn test_failed_signal_does_not_block_queue() {
        let (mut pc, _) = controller(LimitType::None, 0);
        let tx = pc.signal_sender();
        tx.send(SessionSignal::Stop).unwrap();
        tx.send(SessionSignal::Key('t')).unwrap();
        let err = pc.process_pending().err().unwrap();
        assert!(matches!(
            err,
            SessionError::InvalidState { operation: "user_stop", state: SessionState::Init }
        ));
        // Both signals were consumed by the first drain.
        pc.process_pending().unwrap();
        assert_eq!(pc.state(), SessionState::Init);
    }

    #[test]
    fn test_key_after_user_stop_is_dropped() {
        let (mut pc, _) = controller(LimitType::None, 0);
        pc.ready().unwrap();
        pc.run().unwrap();
        pc.user_stop().unwrap();
        assert_eq!(pc.advance_if_correct('t').unwrap(), None);
        assert_eq!(pc.monitor().cursor(), 0);
    }
}
