use std::sync::Arc;
use std::time::Duration;

use redis::aio::ConnectionManager;
use redis::{Client, RedisError, Script};
use tokio::sync::RwLock;

const KEY_PREFIX: &str = "trainee:throttle";

/// Counts one attempt and returns `{attempts, ttl}`. The window starts with
/// the first attempt and is not extended by later ones.
const COUNT_ATTEMPT: &str = r#"
local attempts = redis.call("INCR", KEYS[1])
if attempts == 1 then
    redis.call("EXPIRE", KEYS[1], ARGV[1])
end
return {attempts, redis.call("TTL", KEYS[1])}
"#;

/// Fixed-window attempt budget for one kind of request.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Throttle {
    pub(crate) action: &'static str,
    pub(crate) max_attempts: u64,
    pub(crate) window: Duration,
}

impl Throttle {
    pub(crate) const fn new(action: &'static str, max_attempts: u64, window: Duration) -> Self {
        Self { action, max_attempts, window }
    }

    /// Subjects are compared case-insensitively so `Alice` and `alice`
    /// share one budget.
    fn key(&self, subject: &str) -> String {
        format!("{KEY_PREFIX}:{}:{}", self.action, subject.trim().to_lowercase())
    }

    fn judge(&self, attempts: i64, ttl: i64) -> Admission {
        if attempts <= self.max_attempts as i64 {
            return Admission::Allowed;
        }
        let retry_after = if ttl > 0 { ttl as u64 } else { self.window.as_secs() };
        Admission::Throttled { retry_after: Duration::from_secs(retry_after) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Admission {
    Allowed,
    Throttled { retry_after: Duration },
}

/// Lazily connected Redis used for request throttling. Every operation
/// degrades to "allowed" while disconnected.
#[derive(Clone)]
pub(crate) struct RedisHandle {
    url: String,
    manager: Arc<RwLock<Option<ConnectionManager>>>,
}

impl RedisHandle {
    pub(crate) fn new(url: String) -> Self {
        Self { url, manager: Arc::new(RwLock::new(None)) }
    }

    pub(crate) async fn connect(&self) -> Result<(), RedisError> {
        let manager = ConnectionManager::new(Client::open(self.url.as_str())?).await?;
        self.manager.write().await.replace(manager);
        Ok(())
    }

    pub(crate) async fn disconnect(&self) {
        self.manager.write().await.take();
    }

    async fn connection(&self) -> Option<ConnectionManager> {
        self.manager.read().await.clone()
    }

    /// `None` while disconnected, otherwise the result of a PING.
    pub(crate) async fn ping(&self) -> Option<Result<(), RedisError>> {
        let mut manager = self.connection().await?;
        Some(redis::cmd("PING").query_async::<_, String>(&mut manager).await.map(|_| ()))
    }

    pub(crate) async fn admit(
        &self,
        throttle: &Throttle,
        subject: &str,
    ) -> Result<Admission, RedisError> {
        let Some(mut manager) = self.connection().await else {
            return Ok(Admission::Allowed);
        };

        let (attempts, ttl): (i64, i64) = Script::new(COUNT_ATTEMPT)
            .key(throttle.key(subject))
            .arg(throttle.window.as_secs().max(1) as i64)
            .invoke_async(&mut manager)
            .await?;

        Ok(throttle.judge(attempts, ttl))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{Admission, RedisHandle, Throttle};

    const LOGIN: Throttle = Throttle::new("login", 3, Duration::from_secs(60));

    #[tokio::test]
    async fn disconnected_handle_admits_everything() {
        let redis = RedisHandle::new("redis://127.0.0.1:1/0".to_string());
        let strict = Throttle::new("login", 0, Duration::from_secs(5));

        assert!(redis.ping().await.is_none());
        assert_eq!(redis.admit(&strict, "alice").await.expect("admit"), Admission::Allowed);
    }

    #[test]
    fn subjects_share_a_budget_regardless_of_case() {
        assert_eq!(LOGIN.key(" Alice "), "trainee:throttle:login:alice");
        assert_eq!(LOGIN.key("alice"), LOGIN.key("ALICE"));
    }

    #[test]
    fn attempts_past_the_budget_are_throttled_until_the_window_ends() {
        assert_eq!(LOGIN.judge(3, 40), Admission::Allowed);
        assert_eq!(
            LOGIN.judge(4, 40),
            Admission::Throttled { retry_after: Duration::from_secs(40) }
        );
        // a key without expiry falls back to the full window
        assert_eq!(
            LOGIN.judge(9, -1),
            Admission::Throttled { retry_after: Duration::from_secs(60) }
        );
    }
}
