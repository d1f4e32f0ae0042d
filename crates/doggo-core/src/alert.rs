//! Transient alert banner
//!
//! One alert slot with a single dismissal deadline. `present` re-arms the
//! deadline, so repeated alerts restart the fade instead of stacking timers.
//! The caller drives time by calling `poll` (the TUI does it on every tick).

use std::time::{Duration, Instant};

pub const DEFAULT_FADE_AFTER: Duration = Duration::from_millis(3000);
pub const DEFAULT_RESET_AFTER: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertPhase {
    Hidden,
    Visible,
    FadingOut,
}

#[derive(Debug, Clone)]
pub struct Alert {
    text: String,
    severity: Severity,
    phase: AlertPhase,
    deadline: Option<Instant>,
    fade_after: Duration,
    reset_after: Duration,
}

impl Default for Alert {
    fn default() -> Self {
        Self::new(DEFAULT_FADE_AFTER, DEFAULT_RESET_AFTER)
    }
}

impl Alert {
    pub fn new(fade_after: Duration, reset_after: Duration) -> Self {
        Self {
            text: String::new(),
            severity: Severity::Error,
            phase: AlertPhase::Hidden,
            deadline: None,
            fade_after,
            reset_after,
        }
    }

    /// Show `text` now, replacing whatever is displayed, and restart the
    /// dismissal sequence
    pub fn present(&mut self, text: impl Into<String>, severity: Severity, now: Instant) {
        self.text = text.into();
        self.severity = severity;
        self.phase = AlertPhase::Visible;
        self.deadline = Some(now + self.fade_after);
    }

    /// Advance through every transition whose deadline has passed.
    /// Returns true if the phase changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        let before = self.phase;

        while let Some(deadline) = self.deadline {
            if now < deadline {
                break;
            }
            match self.phase {
                AlertPhase::Visible => {
                    self.phase = AlertPhase::FadingOut;
                    self.deadline = Some(deadline + self.reset_after);
                }
                AlertPhase::FadingOut | AlertPhase::Hidden => {
                    self.phase = AlertPhase::Hidden;
                    self.deadline = None;
                }
            }
        }

        self.phase != before
    }

    pub fn phase(&self) -> AlertPhase {
        self.phase
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Visible or still fading
    pub fn is_shown(&self) -> bool {
        self.phase != AlertPhase::Hidden
    }

    #[cfg(test)]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_starts_hidden() {
        let alert = Alert::default();
        assert_eq!(alert.phase(), AlertPhase::Hidden);
        assert!(!alert.is_shown());
        assert_eq!(alert.deadline(), None);
    }

    #[test]
    fn test_dismissal_sequence() {
        let t0 = Instant::now();
        let mut alert = Alert::default();
        alert.present("x", Severity::Error, t0);
        assert_eq!(alert.phase(), AlertPhase::Visible);

        assert!(!alert.poll(t0 + ms(2999)));
        assert_eq!(alert.phase(), AlertPhase::Visible);

        assert!(alert.poll(t0 + ms(3000)));
        assert_eq!(alert.phase(), AlertPhase::FadingOut);

        assert!(!alert.poll(t0 + ms(3499)));
        assert!(alert.poll(t0 + ms(3500)));
        assert_eq!(alert.phase(), AlertPhase::Hidden);
        assert_eq!(alert.deadline(), None);
    }

    #[test]
    fn test_second_present_restarts_sequence() {
        let t0 = Instant::now();
        let mut alert = Alert::default();
        alert.present("first", Severity::Error, t0);
        alert.present("second", Severity::Info, t0 + ms(2000));

        assert_eq!(alert.text(), "second");
        assert_eq!(alert.severity(), Severity::Info);

        // The first sequence would have faded here
        assert!(!alert.poll(t0 + ms(3000)));
        assert_eq!(alert.phase(), AlertPhase::Visible);

        assert!(alert.poll(t0 + ms(5000)));
        assert_eq!(alert.phase(), AlertPhase::FadingOut);
        assert!(alert.poll(t0 + ms(5500)));
        assert_eq!(alert.phase(), AlertPhase::Hidden);

        // Nothing left pending
        assert!(!alert.poll(t0 + ms(60_000)));
    }

    #[test]
    fn test_present_while_fading_shows_again() {
        let t0 = Instant::now();
        let mut alert = Alert::default();
        alert.present("x", Severity::Error, t0);
        alert.poll(t0 + ms(3100));
        assert_eq!(alert.phase(), AlertPhase::FadingOut);

        alert.present("y", Severity::Error, t0 + ms(3200));
        assert_eq!(alert.phase(), AlertPhase::Visible);
        assert!(!alert.poll(t0 + ms(3600)));
        assert_eq!(alert.phase(), AlertPhase::Visible);
    }

    #[test]
    fn test_late_poll_runs_both_transitions() {
        let t0 = Instant::now();
        let mut alert = Alert::new(ms(100), ms(50));
        alert.present("x", Severity::Error, t0);
        assert!(alert.poll(t0 + ms(1000)));
        assert_eq!(alert.phase(), AlertPhase::Hidden);
    }
}
