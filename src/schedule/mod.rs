//! Poll timing: a small state machine deciding when the next fetch runs,
//! and the tokio driver that executes it.

use std::time::Duration;

use crate::logging::log_schedule;

pub mod backoff;
pub mod poller;

pub use poller::{spawn_poller, Control, PollHandle, PollTarget};

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleConfig {
    /// Success cadence.
    pub period: Duration,
    /// Offset after each cadence boundary.
    pub phase: Duration,
    /// Upper bound of the random delay added after a success.
    pub jitter: Duration,
    pub base_error_delay: Duration,
    pub max_error_delay: Duration,
    pub backoff_factor: f64,
    /// Quiet period after the last resize before refetching.
    pub resize_debounce: Duration,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(60),
            phase: Duration::from_secs(6),
            jitter: Duration::from_secs(30),
            base_error_delay: Duration::from_secs(1),
            max_error_delay: Duration::from_secs(300),
            backoff_factor: 1.5,
            resize_debounce: Duration::from_millis(3000),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Scheduled(Duration),
    InFlight,
    Backoff(Duration),
}

impl PollState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PollState::Idle => "idle",
            PollState::Scheduled(_) => "scheduled",
            PollState::InFlight => "in_flight",
            PollState::Backoff(_) => "backoff",
        }
    }

    /// Delay of the single outstanding call, if any.
    pub fn pending(&self) -> Option<Duration> {
        match self {
            PollState::Scheduled(d) | PollState::Backoff(d) => Some(*d),
            PollState::Idle | PollState::InFlight => None,
        }
    }
}

/// Pure transition logic. The driver owns the timer; this only decides
/// what the next delay is.
#[derive(Debug, Clone)]
pub struct PollSchedule {
    cfg: ScheduleConfig,
    state: PollState,
    failures: u32,
}

impl PollSchedule {
    pub fn new(cfg: ScheduleConfig) -> Self {
        Self {
            cfg,
            state: PollState::Idle,
            failures: 0,
        }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    /// Consecutive failures since the last success.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn begin_fetch(&mut self) {
        self.transition(PollState::InFlight);
    }

    pub fn on_success(&mut self, now_ms: i64, jitter_unit: f64) -> Duration {
        self.failures = 0;
        let delay = self.cfg.cadence_delay(now_ms, jitter_unit);
        self.transition(PollState::Scheduled(delay));
        delay
    }

    pub fn on_failure(&mut self) -> Duration {
        self.failures = self.failures.saturating_add(1);
        let delay = self.cfg.error_delay(self.failures);
        self.transition(PollState::Backoff(delay));
        delay
    }

    /// Replace whatever is pending with a call after `delay`.
    /// Failure count survives so a resize does not reset backoff.
    pub fn reschedule(&mut self, delay: Duration) {
        self.transition(PollState::Scheduled(delay));
    }

    pub fn stop(&mut self) {
        self.transition(PollState::Idle);
    }

    fn transition(&mut self, next: PollState) {
        self.state = next;
        log_schedule(next.as_str(), next.pending(), self.failures);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_failures_then_success() {
        let mut s = PollSchedule::new(ScheduleConfig::default());
        assert_eq!(s.state(), PollState::Idle);

        let mut delays = Vec::new();
        for _ in 0..3 {
            s.begin_fetch();
            assert_eq!(s.state(), PollState::InFlight);
            delays.push(s.on_failure());
        }
        assert_eq!(
            delays,
            vec![
                Duration::from_secs(1),
                Duration::from_millis(1500),
                Duration::from_millis(2250)
            ]
        );
        assert_eq!(s.state(), PollState::Backoff(Duration::from_millis(2250)));

        s.begin_fetch();
        let d = s.on_success(1_700_000_040_000, 0.0);
        assert_eq!(d, Duration::from_secs(6));
        assert_eq!(s.failures(), 0);

        s.begin_fetch();
        assert_eq!(s.on_failure(), Duration::from_secs(1));
    }

    #[test]
    fn test_reschedule_keeps_failure_count() {
        let mut s = PollSchedule::new(ScheduleConfig::default());
        s.begin_fetch();
        s.on_failure();
        s.reschedule(Duration::from_secs(3));
        assert_eq!(s.state(), PollState::Scheduled(Duration::from_secs(3)));
        assert_eq!(s.failures(), 1);
        s.begin_fetch();
        assert_eq!(s.on_failure(), Duration::from_millis(1500));
    }

    #[test]
    fn test_pending_only_for_timed_states() {
        assert_eq!(PollState::Idle.pending(), None);
        assert_eq!(PollState::InFlight.pending(), None);
        assert_eq!(
            PollState::Backoff(Duration::from_secs(2)).pending(),
            Some(Duration::from_secs(2))
        );
    }
}
