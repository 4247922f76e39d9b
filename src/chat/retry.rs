//! Fixed-delay retry for chat calls that hit provider quota limits

use std::time::Duration;

use super::ChatClient;
use crate::Result;

/// Retry policy for chat calls
///
/// Only quota exhaustion is retried. The delay between attempts is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first
    pub max_attempts: u32,
    /// Delay between attempts
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Create a policy; `max_attempts` below 1 is raised to 1
    #[must_use]
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }
}

/// Send `text` through `client`, retrying on quota exhaustion
///
/// Sleeps `policy.backoff` between attempts, never after the final one.
///
/// # Errors
///
/// Returns the first non-quota error immediately, or the last quota error
/// once all attempts are spent
pub async fn send_with_retry<C>(client: &mut C, text: &str, policy: &RetryPolicy) -> Result<String>
where
    C: ChatClient + ?Sized,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match client.send(text).await {
            Ok(reply) => return Ok(reply),
            Err(e) if e.is_quota_exhausted() && attempt < attempts => {
                tracing::warn!(
                    error = %e,
                    attempt,
                    max_attempts = attempts,
                    retry_in_secs = policy.backoff.as_secs_f64(),
                    "chat quota exhausted, retrying"
                );
                tokio::time::sleep(policy.backoff).await;
                attempt += 1;
            }
            Err(e) => {
                if e.is_quota_exhausted() {
                    tracing::error!(error = %e, attempts, "chat quota exhausted, giving up");
                }
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use async_trait::async_trait;
    use tokio::time::Instant;

    use super::*;
    use crate::Error;
    use crate::chat::ConversationSession;

    /// Replays a fixed sequence of outcomes
    struct Scripted {
        outcomes: VecDeque<Result<String>>,
        calls: u32,
        session: ConversationSession,
    }

    impl Scripted {
        fn new(outcomes: Vec<Result<String>>) -> Self {
            Self {
                outcomes: outcomes.into(),
                calls: 0,
                session: ConversationSession::new(),
            }
        }
    }

    #[async_trait]
    impl ChatClient for Scripted {
        async fn send(&mut self, _text: &str) -> Result<String> {
            self.calls += 1;
            self.outcomes
                .pop_front()
                .unwrap_or_else(|| Err(Error::Chat("script exhausted".to_string())))
        }

        fn session(&self) -> &ConversationSession {
            &self.session
        }
    }

    fn quota() -> Result<String> {
        Err(Error::QuotaExhausted("429".to_string()))
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_third_attempt_after_two_sleeps() {
        let mut client = Scripted::new(vec![quota(), quota(), Ok("done".to_string())]);
        let start = Instant::now();

        let reply = send_with_retry(&mut client, "hi", &RetryPolicy::default())
            .await
            .unwrap();

        assert_eq!(reply, "done");
        assert_eq!(client.calls, 3);
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_propagates_last_error_after_two_sleeps() {
        let mut client = Scripted::new(vec![quota(), quota(), quota()]);
        let start = Instant::now();

        let err = send_with_retry(&mut client, "hi", &RetryPolicy::default())
            .await
            .unwrap_err();

        assert!(err.is_quota_exhausted());
        assert_eq!(client.calls, 3);
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn other_errors_are_not_retried() {
        let mut client = Scripted::new(vec![
            Err(Error::Chat("401 unauthorized".to_string())),
            Ok("unreachable".to_string()),
        ]);
        let start = Instant::now();

        let err = send_with_retry(&mut client, "hi", &RetryPolicy::default())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Chat(_)));
        assert_eq!(client.calls, 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn non_quota_error_after_quota_stops_immediately() {
        let mut client = Scripted::new(vec![quota(), Err(Error::Audio("boom".to_string()))]);
        let start = Instant::now();

        let err = send_with_retry(&mut client, "hi", &RetryPolicy::default())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Audio(_)));
        assert_eq!(client.calls, 2);
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn single_attempt_policy_never_sleeps() {
        let mut client = Scripted::new(vec![quota(), Ok("late".to_string())]);
        let policy = RetryPolicy::new(0, Duration::from_secs(5));
        let start = Instant::now();

        assert_eq!(policy.max_attempts, 1);
        assert!(send_with_retry(&mut client, "hi", &policy).await.is_err());
        assert_eq!(client.calls, 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[test]
    fn default_policy_values() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.backoff, Duration::from_secs(5));
    }
}
