/*!
 * # OTP Send Rate Limiting
 *
 * In-process limiter for OTP issuance. Login lockout is persisted on
 * the user row; OTP sends are throttled here because a resend burst
 * is transient and does not need to survive a restart.
 */

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::errors::ServiceError;

/// Limiter configuration
#[derive(Clone, Debug)]
pub struct OtpRateLimitConfig {
    /// Maximum sends per key within the window
    pub max_sends: u32,
    /// Sliding window length
    pub window: Duration,
}

impl Default for OtpRateLimitConfig {
    fn default() -> Self {
        Self {
            max_sends: 3,
            window: Duration::from_secs(60 * 10),
        }
    }
}

#[derive(Debug, Clone)]
struct SendEntry {
    sends: u32,
    first_send: Instant,
}

impl SendEntry {
    fn new() -> Self {
        Self {
            sends: 1,
            first_send: Instant::now(),
        }
    }

    fn time_since_first(&self) -> Duration {
        Instant::now().duration_since(self.first_send)
    }

    fn should_reset(&self, window: Duration) -> bool {
        self.time_since_first() > window
    }
}

/// Per-key OTP send limiter.
///
/// Keys are caller-chosen; the verification service keys by user ID so
/// changing the target phone does not reset the budget.
#[derive(Clone)]
pub struct OtpRateLimiter {
    config: OtpRateLimitConfig,
    sends: Arc<Mutex<HashMap<String, SendEntry>>>,
}

impl OtpRateLimiter {
    pub fn new(config: OtpRateLimitConfig) -> Self {
        Self {
            config,
            sends: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Record a send for the key, or reject it if the key is over
    /// budget for the current window.
    pub async fn check(&self, key: &str) -> Result<(), ServiceError> {
        let mut sends = self.sends.lock().await;

        // A fresh or expired entry counts this send and passes.
        let entry = match sends.get_mut(key) {
            Some(entry) if !entry.should_reset(self.config.window) => entry,
            _ => {
                sends.insert(key.to_string(), SendEntry::new());
                return Ok(());
            }
        };

        if entry.sends >= self.config.max_sends {
            let retry_after = self
                .config
                .window
                .saturating_sub(entry.time_since_first())
                .as_secs();
            return Err(ServiceError::OtpRateLimited {
                retry_after_secs: retry_after as i64,
            });
        }

        entry.sends += 1;
        Ok(())
    }

    /// Clear the key's budget, for example after a successful
    /// verification.
    pub async fn reset(&self, key: &str) {
        let mut sends = self.sends.lock().await;
        sends.remove(key);
    }

    /// Drop entries old enough that they can no longer affect a
    /// check.
    pub async fn cleanup(&self) {
        let mut sends = self.sends.lock().await;
        let window = self.config.window;
        sends.retain(|_, entry| !entry.should_reset(window * 2));
    }
}

impl Default for OtpRateLimiter {
    fn default() -> Self {
        Self::new(OtpRateLimitConfig::default())
    }
}

/// Background task that periodically evicts stale entries.
pub async fn cleanup_otp_limits(limiter: Arc<OtpRateLimiter>) {
    loop {
        sleep(Duration::from_secs(60 * 60)).await;
        limiter.cleanup().await;
    }
}
