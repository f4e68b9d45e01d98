//! Circuit breaker for the outbound LLM.
//!
//! After `failure_threshold` consecutive provider failures the circuit
//! opens and calls are refused locally for `open_duration`; then a single
//! probe is let through (half-open) and its outcome closes or re-opens it.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use curio_types::llm::LlmError;

/// Circuit breaker state.
#[derive(Debug, Clone, PartialEq)]
pub enum CircuitState {
    /// Normal operation. Tracks consecutive failures toward threshold.
    Closed { consecutive_failures: u32 },
    /// Calls are refused until `wait_duration` has elapsed.
    Open {
        opened_at: Instant,
        wait_duration: Duration,
    },
    /// One probe is in flight; further calls are refused until it resolves.
    HalfOpen { probe_in_flight: bool },
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    last_error: Option<String>,
    total_calls: u64,
    total_failures: u64,
}

/// Thread-safe circuit breaker shared by every request.
#[derive(Debug)]
pub struct CircuitBreaker {
    inner: Mutex<BreakerInner>,
    failure_threshold: u32,
    open_duration: Duration,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, open_duration: Duration) -> Self {
        Self {
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed {
                    consecutive_failures: 0,
                },
                last_error: None,
                total_calls: 0,
                total_failures: 0,
            }),
            failure_threshold: failure_threshold.max(1),
            open_duration,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BreakerInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Whether a call may go out now.
    ///
    /// Handles the Open -> HalfOpen transition when the wait has elapsed and
    /// admits exactly one probe while half-open.
    pub fn allow_request(&self) -> bool {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed { .. } => true,
            CircuitState::Open {
                opened_at,
                wait_duration,
            } => {
                if opened_at.elapsed() >= wait_duration {
                    inner.state = CircuitState::HalfOpen {
                        probe_in_flight: true,
                    };
                    true
                } else {
                    false
                }
            }
            CircuitState::HalfOpen { probe_in_flight } => {
                if probe_in_flight {
                    false
                } else {
                    inner.state = CircuitState::HalfOpen {
                        probe_in_flight: true,
                    };
                    true
                }
            }
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.lock();
        inner.total_calls += 1;
        inner.state = CircuitState::Closed {
            consecutive_failures: 0,
        };
    }

    /// Record a failed call. Errors that say nothing about provider health
    /// (see [`LlmError::is_provider_failure`]) only release a pending probe.
    pub fn record_failure(&self, error: &LlmError) {
        let mut inner = self.lock();
        inner.total_calls += 1;

        if !error.is_provider_failure() {
            if let CircuitState::HalfOpen { .. } = inner.state {
                inner.state = CircuitState::HalfOpen {
                    probe_in_flight: false,
                };
            }
            return;
        }

        inner.total_failures += 1;
        inner.last_error = Some(error.to_string());

        let next = match inner.state {
            CircuitState::Closed {
                consecutive_failures,
            } => {
                let count = consecutive_failures + 1;
                if count >= self.failure_threshold {
                    tracing::warn!(
                        failures = count,
                        open_secs = self.open_duration.as_secs(),
                        "LLM circuit opened"
                    );
                    self.opened()
                } else {
                    CircuitState::Closed {
                        consecutive_failures: count,
                    }
                }
            }
            // Probe failed, reopen the circuit
            CircuitState::HalfOpen { .. } => self.opened(),
            CircuitState::Open { .. } => return,
        };
        inner.state = next;
    }

    fn opened(&self) -> CircuitState {
        CircuitState::Open {
            opened_at: Instant::now(),
            wait_duration: self.open_duration,
        }
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state.clone()
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state(), CircuitState::Open { .. })
    }

    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error.clone()
    }

    /// (total calls, total provider failures).
    pub fn totals(&self) -> (u64, u64) {
        let inner = self.lock();
        (inner.total_calls, inner.total_failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider_error() -> LlmError {
        LlmError::Provider {
            message: "500".to_string(),
        }
    }

    #[test]
    fn test_opens_after_threshold() {
        let breaker = CircuitBreaker::new(3, Duration::from_secs(60));
        for _ in 0..2 {
            assert!(breaker.allow_request());
            breaker.record_failure(&provider_error());
        }
        assert!(!breaker.is_open());
        breaker.record_failure(&provider_error());
        assert!(breaker.is_open());
        assert!(!breaker.allow_request());
        assert_eq!(breaker.totals(), (3, 3));
        assert!(breaker.last_error().unwrap().contains("500"));
    }

    #[test]
    fn test_success_resets_consecutive_failures() {
        let breaker = CircuitBreaker::new(3, Duration::from_secs(60));
        breaker.record_failure(&provider_error());
        breaker.record_failure(&provider_error());
        breaker.record_success();
        breaker.record_failure(&provider_error());
        assert_eq!(
            breaker.state(),
            CircuitState::Closed {
                consecutive_failures: 1
            }
        );
    }

    #[test]
    fn test_local_refusals_do_not_count() {
        let breaker = CircuitBreaker::new(1, Duration::from_secs(60));
        breaker.record_failure(&LlmError::QuotaExceeded {
            retry_after_seconds: 5,
        });
        breaker.record_failure(&LlmError::NoApiKey);
        assert!(!breaker.is_open());
    }

    #[test]
    fn test_half_open_admits_single_probe() {
        let breaker = CircuitBreaker::new(1, Duration::ZERO);
        breaker.record_failure(&LlmError::Timeout { timeout_ms: 5000 });
        assert!(breaker.is_open());

        assert!(breaker.allow_request());
        assert!(!breaker.allow_request());

        breaker.record_success();
        assert!(breaker.allow_request());
    }

    #[test]
    fn test_failed_probe_reopens() {
        let breaker = CircuitBreaker::new(1, Duration::ZERO);
        breaker.record_failure(&provider_error());
        assert!(breaker.allow_request());
        breaker.record_failure(&provider_error());
        assert!(breaker.is_open());
    }
}
