use std::num::NonZeroU32;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Enforces a minimum spacing between the *starts* of completion calls.
///
/// The check-and-update runs under one lock, so concurrent callers queue
/// behind each other instead of racing past the throttle.
#[derive(Debug, Default)]
pub struct RateLimiter {
    last_call: Mutex<Option<Instant>>,
}

static GLOBAL: OnceLock<Arc<RateLimiter>> = OnceLock::new();

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide limiter shared by every client that does not bring its own.
    pub fn global() -> Arc<Self> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Self::new())))
    }

    /// Minimum gap between call starts for a given rate.
    pub fn min_interval(calls_per_minute: NonZeroU32) -> Duration {
        Duration::from_secs(60) / calls_per_minute.get()
    }

    /// Wait until another call may start, then record the start time.
    pub async fn acquire(&self, calls_per_minute: NonZeroU32) {
        let min_interval = Self::min_interval(calls_per_minute);
        let mut last_call = self.last_call.lock().await;

        if let Some(last) = *last_call {
            let elapsed = last.elapsed();
            if elapsed < min_interval {
                let wait = min_interval - elapsed;
                tracing::trace!("Rate limiter waiting {:?}", wait);
                tokio::time::sleep(wait).await;
            }
        }

        *last_call = Some(Instant::now());
    }
}
