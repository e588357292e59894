//! crates/lifeguard_core/src/loader.rs
//!
//! Chart data loading with a bounded retry policy. A load always ends in
//! `Loaded` or `Failed`; it never stays `Loading` once the attempts run out.

use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::ports::PortResult;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum ChartLoad<T> {
    Loading,
    Loaded(T),
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based): doubles each time, capped.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Runs `fetch` until it succeeds or the policy gives up.
///
/// Returns `None` if `token` is cancelled first; the owning view is gone and
/// nobody is waiting for the result.
pub async fn load_with_retry<T, F, Fut>(
    what: &str,
    policy: RetryPolicy,
    token: &CancellationToken,
    mut fetch: F,
) -> Option<ChartLoad<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = PortResult<T>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        let result = tokio::select! {
            biased;
            _ = token.cancelled() => {
                info!("Loading {} cancelled", what);
                return None;
            }
            result = fetch() => result,
        };

        match result {
            Ok(data) => return Some(ChartLoad::Loaded(data)),
            Err(e) => {
                warn!("Failed to load {} (attempt {}/{}): {}", what, attempt, attempts, e);
                last_error = e.to_string();
            }
        }

        if attempt < attempts {
            let delay = policy.backoff_for(attempt);
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    info!("Loading {} cancelled during backoff", what);
                    return None;
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    Some(ChartLoad::Failed(format!(
        "Failed to load {}: {}",
        what, last_error
    )))
}
