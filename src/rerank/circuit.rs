//! Per-provider, per-process circuit breaker (§4.4).

use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Closed,
    Open,
    HalfOpen,
}

struct Inner {
    state: State,
    failure_count: u32,
    opened_at: Option<Instant>,
}

/// CLOSED → OPEN after `failure_threshold` consecutive failures; OPEN → HALF_OPEN
/// after `cooldown` has elapsed; HALF_OPEN's single probe call decides CLOSED or OPEN.
pub struct CircuitBreaker {
    failure_threshold: u32,
    cooldown: Duration,
    inner: Mutex<Inner>,
}

/// Whether the breaker currently permits a call, and whether that call is the
/// single half-open probe (the caller must report its outcome precisely once).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Denied,
    Allowed,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            failure_threshold,
            cooldown,
            inner: Mutex::new(Inner { state: State::Closed, failure_count: 0, opened_at: None }),
        }
    }

    /// Checks whether a call may proceed, transitioning OPEN → HALF_OPEN if the
    /// cooldown has elapsed.
    pub fn admit(&self) -> Admission {
        let mut inner = self.inner.lock().unwrap();
        match inner.state {
            State::Closed | State::HalfOpen => Admission::Allowed,
            State::Open => {
                let elapsed = inner.opened_at.map(|t| t.elapsed()).unwrap_or(Duration::MAX);
                if elapsed > self.cooldown {
                    inner.state = State::HalfOpen;
                    Admission::Allowed
                } else {
                    Admission::Denied
                }
            }
        }
    }

    pub fn on_success(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.state = State::Closed;
        inner.failure_count = 0;
        inner.opened_at = None;
    }

    pub fn on_failure(&self) {
        let mut inner = self.inner.lock().unwrap();
        match inner.state {
            State::HalfOpen => {
                inner.state = State::Open;
                inner.opened_at = Some(Instant::now());
            }
            State::Closed => {
                inner.failure_count += 1;
                if inner.failure_count >= self.failure_threshold {
                    inner.state = State::Open;
                    inner.opened_at = Some(Instant::now());
                }
            }
            State::Open => {}
        }
    }

    /// Read-only peek at whether the breaker is currently tripped, for
    /// health/status reporting. Does not perform the OPEN→HALF_OPEN cooldown
    /// transition that [`Self::admit`] does.
    pub(crate) fn is_open(&self) -> bool {
        matches!(self.inner.lock().unwrap().state, State::Open)
    }
}
