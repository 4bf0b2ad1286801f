use std::time::Duration;

use rand_08::Rng as _;

/// Bounded backoff used to repeat an operation while it fails with a
/// retriable error.
///
/// `steps` is the maximum number of attempts. Between attempts the operation
/// sleeps for `duration`, stretched by up to `jitter` of itself, and the next
/// delay is `duration * factor`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub steps: u32,
    pub duration: Duration,
    pub factor: f64,
    pub jitter: f64,
}

impl Default for RetryPolicy {
    /// Policy for resolving optimistic concurrency conflicts: five attempts,
    /// ten milliseconds apart, with ten percent jitter.
    fn default() -> Self {
        Self {
            steps: 5,
            duration: Duration::from_millis(10),
            factor: 1.0,
            jitter: 0.1,
        }
    }
}

impl RetryPolicy {
    /// Runs `operation` until it succeeds, fails with an error `retriable`
    /// rejects, or the attempts run out. The last result is returned as is.
    pub async fn retry<T, E, F, Fut, P>(&self, retriable: P, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
    {
        let mut delay = self.duration;
        let mut attempt = 1;

        loop {
            match operation().await {
                Err(error) if attempt < self.steps && retriable(&error) => {
                    tokio::time::sleep(self.jittered(delay)).await;
                    delay = delay.mul_f64(self.factor);
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    fn jittered(&self, delay: Duration) -> Duration {
        if self.jitter > 0.0 {
            delay + delay.mul_f64(self.jitter * rand_08::thread_rng().r#gen::<f64>())
        } else {
            delay
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::RetryPolicy;

    fn policy(steps: u32) -> RetryPolicy {
        RetryPolicy {
            steps,
            duration: Duration::from_millis(1),
            factor: 1.0,
            jitter: 0.1,
        }
    }

    #[tokio::test]
    async fn retry_until_success() {
        // arrange
        let mut attempts = 0;

        // act
        let result: Result<u32, &str> = policy(5)
            .retry(
                |_| true,
                || {
                    attempts += 1;
                    let attempt = attempts;
                    async move { if attempt < 3 { Err("conflict") } else { Ok(attempt) } }
                },
            )
            .await;

        // assert
        assert_eq!(Ok(3), result);
        assert_eq!(3, attempts);
    }

    #[tokio::test]
    async fn retry_stops_at_step_limit() {
        // arrange
        let mut attempts = 0;

        // act
        let result: Result<(), &str> = policy(5)
            .retry(
                |_| true,
                || {
                    attempts += 1;
                    async { Err("conflict") }
                },
            )
            .await;

        // assert
        assert_eq!(Err("conflict"), result);
        assert_eq!(5, attempts);
    }

    #[tokio::test]
    async fn retry_returns_non_retriable_error_immediately() {
        // arrange
        let mut attempts = 0;

        // act
        let result: Result<(), &str> = policy(5)
            .retry(
                |error| *error == "conflict",
                || {
                    attempts += 1;
                    async { Err("forbidden") }
                },
            )
            .await;

        // assert
        assert_eq!(Err("forbidden"), result);
        assert_eq!(1, attempts);
    }

    #[test]
    fn jitter_stays_within_bounds() {
        // arrange
        let policy = RetryPolicy::default();

        for _ in 0..100 {
            // act
            let delay = policy.jittered(policy.duration);

            // assert
            assert!(delay >= Duration::from_millis(10));
            assert!(delay <= Duration::from_millis(11));
        }
    }
}
