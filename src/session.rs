//! Report session state and the controller driving its transitions.
//!
//! A session starts idle. Submitting a non-empty label moves it to
//! `Generating` immediately and a scheduled task flips it to `Ready` once the
//! generation delay has elapsed. Resetting cancels any pending task, so a
//! stale timer can never mark a reset session as ready.

use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Delay before a submitted report becomes ready.
pub const DEFAULT_GENERATION_DELAY: Duration = Duration::from_millis(2000);

/// Overrides the generation delay, in milliseconds.
pub const GENERATION_DELAY_ENV: &str = "DASHBOARD_REPORT_DELAY_MS";

/// Labels offered as one-click input.
pub const SUGGESTIONS: [&str; 5] = [
    "Reliance Industries",
    "Apple Inc",
    "Tesla",
    "Microsoft",
    "Google",
];

/// Returns the suggestion at `index`, if any.
pub fn suggestion(index: usize) -> Option<&'static str> {
    SUGGESTIONS.get(index).copied()
}

/// Lifecycle of a report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionStatus {
    #[default]
    Idle,
    Generating,
    Ready,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Generating => "generating",
            SessionStatus::Ready => "ready",
        };
        f.write_str(name)
    }
}

/// Snapshot of the session: the submitted label and where it is in its lifecycle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReportSession {
    label: String,
    status: SessionStatus,
    ticket: u64,
}

impl ReportSession {
    /// The trimmed label; empty while idle.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_ready(&self) -> bool {
        self.status == SessionStatus::Ready
    }
}

/// Reasons a session operation did not take effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The submitted text was empty after trimming.
    EmptyInput,
    /// A report is already generating or ready; reset first.
    NotIdle { status: SessionStatus },
    /// The session went back to idle before the report became ready.
    Cancelled,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "Enter a company or topic to generate a report"),
            Self::NotIdle { status } => {
                write!(f, "A report is already {status}; reset the session first")
            }
            Self::Cancelled => write!(f, "Report generation was cancelled"),
        }
    }
}

impl std::error::Error for SessionError {}

/// Tunables for [`SessionController`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    pub generation_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            generation_delay: DEFAULT_GENERATION_DELAY,
        }
    }
}

impl SessionConfig {
    /// Default configuration with the delay overridden by
    /// `DASHBOARD_REPORT_DELAY_MS` when it holds a valid number.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = env::var(GENERATION_DELAY_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(millis) => config.generation_delay = Duration::from_millis(millis),
                Err(err) => warn!("Ignoring {GENERATION_DELAY_ENV}={raw:?}: {err}"),
            }
        }
        config
    }

    /// Sets the generation delay and returns the updated configuration.
    pub fn with_generation_delay(mut self, delay: Duration) -> Self {
        self.generation_delay = delay;
        self
    }
}

/// Receives a fresh [`ReportSession`] snapshot on every transition.
pub type SessionWatcher = watch::Receiver<ReportSession>;

/// Owns the session state and applies transitions.
///
/// `submit` spawns the generation timer on the current Tokio runtime, so it
/// must be called from within one.
pub struct SessionController {
    state: Arc<watch::Sender<ReportSession>>,
    config: SessionConfig,
    pending: Option<JoinHandle<()>>,
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl SessionController {
    pub fn new(config: SessionConfig) -> Self {
        let (state, _) = watch::channel(ReportSession::default());
        Self {
            state: Arc::new(state),
            config,
            pending: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Returns a copy of the current state.
    pub fn snapshot(&self) -> ReportSession {
        self.state.borrow().clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.state.borrow().status
    }

    pub fn label(&self) -> String {
        self.state.borrow().label.clone()
    }

    /// Subscribes to state changes. The current state counts as already seen.
    pub fn subscribe(&self) -> SessionWatcher {
        self.state.subscribe()
    }

    /// Starts generating a report for `text`.
    ///
    /// Blank input is rejected with [`SessionError::EmptyInput`] and leaves the
    /// session idle. On success the session is `Generating` when this returns
    /// and becomes `Ready` after the configured delay.
    pub fn submit(&mut self, text: &str) -> Result<(), SessionError> {
        let label = text.trim();
        if label.is_empty() {
            debug!("Ignoring blank report submission");
            return Err(SessionError::EmptyInput);
        }

        let current = self.status();
        if current != SessionStatus::Idle {
            return Err(SessionError::NotIdle { status: current });
        }

        let mut ticket = 0;
        self.state.send_modify(|session| {
            session.ticket += 1;
            session.label = label.to_string();
            session.status = SessionStatus::Generating;
            ticket = session.ticket;
        });
        info!("Generating report for '{label}'");

        let state = Arc::clone(&self.state);
        let delay = self.config.generation_delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let completed = state.send_if_modified(|session| {
                if session.ticket == ticket && session.status == SessionStatus::Generating {
                    session.status = SessionStatus::Ready;
                    true
                } else {
                    false
                }
            });
            if completed {
                debug!("Report ticket {ticket} is ready");
            } else {
                debug!("Discarding stale completion for ticket {ticket}");
            }
        }));

        Ok(())
    }

    /// Returns the session to idle from any state, clearing the label and
    /// cancelling a pending generation.
    pub fn reset(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        self.state.send_modify(|session| {
            session.ticket += 1;
            session.label.clear();
            session.status = SessionStatus::Idle;
        });
        debug!("Session reset");
    }

    /// Waits until the session is ready.
    ///
    /// Fails with [`SessionError::Cancelled`] if the session is (or becomes)
    /// idle first.
    pub async fn wait_until_ready(&self) -> Result<ReportSession, SessionError> {
        let mut watcher = self.subscribe();
        loop {
            let session = watcher.borrow_and_update().clone();
            match session.status {
                SessionStatus::Ready => return Ok(session),
                SessionStatus::Idle => return Err(SessionError::Cancelled),
                SessionStatus::Generating => {}
            }
            if watcher.changed().await.is_err() {
                return Err(SessionError::Cancelled);
            }
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::Instant;

    use super::*;

    fn controller() -> SessionController {
        SessionController::new(SessionConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn submit_moves_through_generating_to_ready_after_delay() {
        let mut session = controller();
        assert_eq!(session.status(), SessionStatus::Idle);

        let started = Instant::now();
        session.submit("  Tesla  ").expect("submit");
        assert_eq!(session.status(), SessionStatus::Generating);
        assert_eq!(session.label(), "Tesla");

        let mut watcher = session.subscribe();
        watcher.changed().await.expect("transition");
        assert_eq!(watcher.borrow().status(), SessionStatus::Ready);
        let elapsed = started.elapsed();
        assert!(elapsed >= DEFAULT_GENERATION_DELAY, "ready after {elapsed:?}");
        assert!(elapsed < DEFAULT_GENERATION_DELAY + Duration::from_millis(5));
        assert_eq!(session.label(), "Tesla");
    }

    #[tokio::test(start_paused = true)]
    async fn not_ready_one_millisecond_early() {
        let mut session = controller();
        session.submit("Apple Inc").expect("submit");

        tokio::time::sleep(DEFAULT_GENERATION_DELAY - Duration::from_millis(1)).await;
        assert_eq!(session.status(), SessionStatus::Generating);

        let ready = session.wait_until_ready().await.expect("ready");
        assert_eq!(ready.label(), "Apple Inc");
    }

    #[tokio::test(start_paused = true)]
    async fn blank_input_is_a_no_op() {
        let mut session = controller();
        for text in ["", "   ", "\n\t "] {
            assert_eq!(session.submit(text), Err(SessionError::EmptyInput));
            assert_eq!(session.snapshot(), ReportSession::default());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn reset_from_ready_clears_label() {
        let mut session = controller();
        session.submit("Microsoft").expect("submit");
        session.wait_until_ready().await.expect("ready");

        session.reset();
        assert_eq!(session.status(), SessionStatus::Idle);
        assert_eq!(session.label(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn reset_while_generating_cancels_the_timer() {
        let mut session = controller();
        session.submit("Google").expect("submit");
        tokio::time::sleep(Duration::from_millis(500)).await;

        session.reset();
        tokio::time::sleep(DEFAULT_GENERATION_DELAY * 2).await;
        assert_eq!(session.status(), SessionStatus::Idle);
        assert_eq!(session.label(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn resubmission_after_reset_is_not_completed_by_old_timer() {
        let mut session = controller();
        session.submit("Tesla").expect("submit");
        tokio::time::sleep(Duration::from_millis(1500)).await;
        session.reset();
        let resubmitted = Instant::now();
        session.submit("Apple Inc").expect("resubmit");

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(session.status(), SessionStatus::Generating);

        let ready = session.wait_until_ready().await.expect("ready");
        assert_eq!(ready.label(), "Apple Inc");
        assert!(resubmitted.elapsed() >= DEFAULT_GENERATION_DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn submit_while_busy_is_rejected() {
        let mut session = controller();
        session.submit("Tesla").expect("submit");
        assert_eq!(
            session.submit("Google"),
            Err(SessionError::NotIdle {
                status: SessionStatus::Generating
            })
        );
        assert_eq!(session.label(), "Tesla");
    }

    #[tokio::test(start_paused = true)]
    async fn waiting_on_an_idle_session_is_cancelled() {
        let session = controller();
        assert_eq!(
            session.wait_until_ready().await,
            Err(SessionError::Cancelled)
        );
    }

    #[test]
    fn suggestions_are_fixed() {
        assert_eq!(SUGGESTIONS.len(), 5);
        assert_eq!(suggestion(2), Some("Tesla"));
        assert_eq!(suggestion(5), None);
    }
}
