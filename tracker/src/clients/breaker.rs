// tracker/src/clients/breaker.rs
// Circuit breaker shared across all calls of a single provider client
// (spec.md §4.1, §9: "one breaker per provider client, shared across all
// calls"). Hand-rolled: no crate in the corpus supplies one, and the
// W/F/Timeout semantics here are bespoke enough that a generic breaker
// crate wouldn't map onto them cleanly. Guarded with `parking_lot::Mutex`,
// the same primitive the teacher uses for shared mutable state
// (backend/src/utils/rate_limiter.rs's `Arc<...>` sharing pattern).

use std::time::{Duration, Instant};

use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Closed,
    Open,
    HalfOpen,
}

struct Window {
    requests: u32,
    failures: u32,
    opened_at: Option<Instant>,
}

/// A sliding-window circuit breaker.
///
/// Opens when `requests >= window` and `failures >= failure_threshold`
/// within the current window. While open, calls fail fast until `timeout`
/// elapses, at which point a single probe call is admitted (half-open).
pub struct CircuitBreaker {
    window_size: u32,
    failure_threshold: u32,
    open_timeout: Duration,
    state: Mutex<(State, Window)>,
}

impl CircuitBreaker {
    pub fn new(window_size: u32, failure_threshold: u32, open_timeout: Duration) -> Self {
        Self {
            window_size,
            failure_threshold,
            open_timeout,
            state: Mutex::new((
                State::Closed,
                Window {
                    requests: 0,
                    failures: 0,
                    opened_at: None,
                },
            )),
        }
    }

    /// Returns `true` if a call may proceed right now. When the breaker is
    /// open but `open_timeout` has elapsed, admits exactly one probe call
    /// (transitioning to half-open) and returns `true`.
    pub fn allow(&self) -> bool {
        let mut guard = self.state.lock();
        let (state, window) = &mut *guard;

        match state {
            State::Closed | State::HalfOpen => true,
            State::Open => {
                let Some(opened_at) = window.opened_at else {
                    return true;
                };
                if opened_at.elapsed() >= self.open_timeout {
                    *state = State::HalfOpen;
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn record_success(&self) {
        let mut guard = self.state.lock();
        let (state, window) = &mut *guard;

        match state {
            State::HalfOpen => {
                *state = State::Closed;
                window.requests = 0;
                window.failures = 0;
                window.opened_at = None;
            }
            State::Closed => {
                window.requests += 1;
                if window.requests >= self.window_size {
                    window.requests = 0;
                    window.failures = 0;
                }
            }
            State::Open => {}
        }
    }

    pub fn record_failure(&self) {
        let mut guard = self.state.lock();
        let (state, window) = &mut *guard;

        match state {
            State::HalfOpen => {
                *state = State::Open;
                window.opened_at = Some(Instant::now());
            }
            State::Closed => {
                window.requests += 1;
                window.failures += 1;
                if window.requests >= self.window_size && window.failures >= self.failure_threshold
                {
                    *state = State::Open;
                    window.opened_at = Some(Instant::now());
                }
            }
            State::Open => {}
        }
    }

    #[cfg(test)]
    fn is_open(&self) -> bool {
        matches!(self.state.lock().0, State::Open)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_closed_under_threshold() {
        let breaker = CircuitBreaker::new(10, 5, Duration::from_secs(30));
        for _ in 0..4 {
            breaker.record_failure();
        }
        assert!(breaker.allow());
        assert!(!breaker.is_open());
    }

    #[test]
    fn opens_when_window_and_failures_exceeded() {
        let breaker = CircuitBreaker::new(5, 3, Duration::from_secs(30));
        for _ in 0..5 {
            breaker.record_failure();
        }
        assert!(breaker.is_open());
        assert!(!breaker.allow());
    }

    #[test]
    fn admits_probe_after_timeout() {
        let breaker = CircuitBreaker::new(2, 2, Duration::from_millis(10));
        breaker.record_failure();
        breaker.record_failure();
        assert!(breaker.is_open());

        std::thread::sleep(Duration::from_millis(20));
        assert!(breaker.allow(), "breaker should admit a probe after timeout elapses");
    }

    #[test]
    fn probe_failure_reopens_breaker() {
        let breaker = CircuitBreaker::new(2, 2, Duration::from_millis(10));
        breaker.record_failure();
        breaker.record_failure();
        std::thread::sleep(Duration::from_millis(20));
        assert!(breaker.allow());
        breaker.record_failure();
        assert!(breaker.is_open());
    }

    #[test]
    fn probe_success_closes_breaker() {
        let breaker = CircuitBreaker::new(2, 2, Duration::from_millis(10));
        breaker.record_failure();
        breaker.record_failure();
        std::thread::sleep(Duration::from_millis(20));
        assert!(breaker.allow());
        breaker.record_success();
        assert!(!breaker.is_open());
    }
}
