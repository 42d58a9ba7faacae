use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

const WINDOW_SECS: i64 = 60;

/// Fixed one-minute window of login attempts per client key (normally the IP).
#[derive(Debug)]
pub struct LoginRateLimiter {
    max_attempts: u32,
    windows: RwLock<HashMap<String, (i64, u32)>>,
}

impl LoginRateLimiter {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            windows: RwLock::new(HashMap::new()),
        }
    }

    /// Records an attempt and reports whether it is allowed.
    pub async fn check(&self, key: &str) -> bool {
        self.check_at(key, Utc::now().timestamp()).await
    }

    async fn check_at(&self, key: &str, now: i64) -> bool {
        let mut windows = self.windows.write().await;

        // Evict expired windows so the map tracks only active clients.
        windows.retain(|_, (started, _)| now - *started < WINDOW_SECS);

        let (_, count) = windows.entry(key.to_string()).or_insert((now, 0));
        if *count >= self.max_attempts {
            return false;
        }
        *count += 1;
        true
    }

    pub async fn tracked(&self) -> usize {
        self.windows.read().await.len()
    }
}
