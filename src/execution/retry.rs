use std::time::Duration;

/// Delay between failed attempts.
#[derive(Debug, Clone, PartialEq)]
pub enum Backoff {
    /// Same delay after every failure.
    Fixed(Duration),
    /// `initial * factor^(attempt - 1)`, capped at `max`.
    Exponential {
        initial: Duration,
        factor: f64,
        max: Duration,
    },
}

impl Backoff {
    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            Backoff::Fixed(d) => *d,
            Backoff::Exponential {
                initial,
                factor,
                max,
            } => {
                let exp = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
                let secs = initial.as_secs_f64() * factor.powi(exp);
                if !secs.is_finite() || secs >= max.as_secs_f64() {
                    *max
                } else {
                    Duration::from_secs_f64(secs.max(0.0))
                }
            }
        }
    }
}

/// Result of [`RetryPolicy::run`] together with the number of attempts made.
#[derive(Debug, Clone, PartialEq)]
pub struct Attempts<T> {
    pub value: T,
    pub attempts: u32,
}

/// Bounded retry with a pluggable [`Backoff`].
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Values below 1 are treated as 1.
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(30, Duration::from_secs(1))
    }
}

impl RetryPolicy {
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Fixed(delay),
        }
    }

    pub fn exponential(max_attempts: u32, initial: Duration, factor: f64, max: Duration) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Exponential {
                initial,
                factor,
                max,
            },
        }
    }

    /// Run `op` until it succeeds or attempts run out, sleeping between attempts.
    ///
    /// `op` receives the 1-based attempt number. `on_failure` is called after every failed
    /// attempt with the delay before the next one, or `None` when this was the last attempt.
    pub fn run<T, E, F, L>(&self, mut op: F, mut on_failure: L) -> Result<Attempts<T>, Attempts<E>>
    where
        F: FnMut(u32) -> Result<T, E>,
        L: FnMut(u32, &E, Option<Duration>),
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt) {
                Ok(value) => return Ok(Attempts { value, attempts: attempt }),
                Err(err) => {
                    let next_delay = (attempt < max_attempts).then(|| self.backoff.delay(attempt));
                    on_failure(attempt, &err, next_delay);
                    match next_delay {
                        None => return Err(Attempts { value: err, attempts: attempt }),
                        Some(delay) if !delay.is_zero() => std::thread::sleep(delay),
                        Some(_) => {}
                    }
                    attempt += 1;
                }
            }
        }
    }
}
