//! Retry loop: run a closure until it succeeds or the policy gives up.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use super::policy::{BackoffPolicy, RetryDecision};
use super::sleep::Sleeper;

/// The policy gave up, or the abort token was set; carries the attempt count
/// and the last error.
#[derive(Debug)]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub last: E,
    /// Stopped by the abort token rather than by the policy.
    pub aborted: bool,
}

impl<E: fmt::Display> fmt::Display for RetryExhausted<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.aborted { "aborted" } else { "gave up" };
        write!(f, "{} after {} attempts: {}", verb, self.attempts, self.last)
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for RetryExhausted<E> {}

/// Runs `f` until it returns `Ok`. After each failure asks `policy` whether to
/// retry and sleeps through `sleeper` for the returned delay.
///
/// When `abort` is set, the loop stops after the current attempt instead of
/// sleeping again.
pub fn run_with_backoff<T, E, F>(
    policy: &BackoffPolicy,
    sleeper: &dyn Sleeper,
    abort: Option<&AtomicBool>,
    mut f: F,
) -> Result<T, RetryExhausted<E>>
where
    F: FnMut() -> Result<T, E>,
{
    let mut attempt = 1u32;
    loop {
        match f() {
            Ok(v) => return Ok(v),
            Err(e) if abort.is_some_and(|a| a.load(Ordering::Relaxed)) => {
                return Err(RetryExhausted {
                    attempts: attempt,
                    last: e,
                    aborted: true,
                })
            }
            Err(e) => match policy.decide(attempt) {
                RetryDecision::GiveUp => {
                    return Err(RetryExhausted {
                        attempts: attempt,
                        last: e,
                        aborted: false,
                    })
                }
                RetryDecision::RetryAfter(d) => {
                    sleeper.sleep(d);
                    attempt = attempt.saturating_add(1);
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingSleeper(Mutex<Vec<Duration>>);

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, duration: Duration) {
            self.0.lock().unwrap().push(duration);
        }
    }

    #[test]
    fn succeeds_after_failures() {
        let policy = BackoffPolicy {
            interval: Duration::from_millis(10),
            max_attempts: None,
        };
        let sleeper = RecordingSleeper::default();
        let mut calls = 0;
        let out: Result<u32, RetryExhausted<&str>> = run_with_backoff(&policy, &sleeper, None, || {
            calls += 1;
            if calls < 4 {
                Err("busy")
            } else {
                Ok(calls)
            }
        });
        assert_eq!(out.unwrap(), 4);
        assert_eq!(
            *sleeper.0.lock().unwrap(),
            vec![Duration::from_millis(10); 3]
        );
    }

    #[test]
    fn gives_up_at_max_attempts() {
        let policy = BackoffPolicy {
            interval: Duration::from_millis(10),
            max_attempts: Some(2),
        };
        let sleeper = RecordingSleeper::default();
        let out: Result<(), _> = run_with_backoff(&policy, &sleeper, None, || Err("busy"));
        let err = out.unwrap_err();
        assert_eq!(err.attempts, 2);
        assert_eq!(err.last, "busy");
        assert!(!err.aborted);
        assert_eq!(err.to_string(), "gave up after 2 attempts: busy");
        assert_eq!(sleeper.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn no_sleep_on_first_success() {
        let sleeper = RecordingSleeper::default();
        let out: Result<_, RetryExhausted<&str>> =
            run_with_backoff(&BackoffPolicy::default(), &sleeper, None, || Ok(7));
        assert_eq!(out.unwrap(), 7);
        assert!(sleeper.0.lock().unwrap().is_empty());
    }

    #[test]
    fn abort_stops_waiting() {
        let abort = AtomicBool::new(false);
        let sleeper = RecordingSleeper::default();
        let mut calls = 0;
        let out: Result<(), _> =
            run_with_backoff(&BackoffPolicy::default(), &sleeper, Some(&abort), || {
                calls += 1;
                if calls == 3 {
                    abort.store(true, Ordering::Relaxed);
                }
                Err("busy")
            });
        let err = out.unwrap_err();
        assert!(err.aborted);
        assert_eq!(err.attempts, 3);
        assert_eq!(err.to_string(), "aborted after 3 attempts: busy");
        assert_eq!(sleeper.0.lock().unwrap().len(), 2);
    }
}
