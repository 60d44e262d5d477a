//! Bounded retry with exponential backoff at the provider boundary.
//!
//! Only transient failures (`ProviderTimeout`, `ProviderUnavailable`) are
//! retried. Everything else, including `NoCloudFreeImagery`, is returned on
//! the first attempt.

use std::time::Duration;

use async_trait::async_trait;
use audit_common::{AuditError, AuditYear, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::provider::CompositeProvider;
use crate::region::Region;
use crate::types::Composite;

/// Retry schedule for transient provider failures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubles each time.
    pub initial_delay_ms: u64,
    /// Cap on any single delay.
    pub max_delay_ms: u64,
    /// Per-attempt deadline; elapsed attempts count as `ProviderTimeout`.
    pub attempt_timeout_ms: Option<u64>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 500,
            max_delay_ms: 10_000,
            attempt_timeout_ms: None,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(32);
        let ms = self.initial_delay_ms.saturating_mul(factor).min(self.max_delay_ms);
        Duration::from_millis(ms)
    }
}

/// Wraps a provider and retries transient failures.
pub struct RetryingProvider<P> {
    inner: P,
    policy: RetryPolicy,
}

impl<P> RetryingProvider<P> {
    pub fn new(inner: P, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

#[async_trait]
impl<P: CompositeProvider> CompositeProvider for RetryingProvider<P> {
    async fn get_composite(
        &self,
        region: &Region,
        year: AuditYear,
        cloud_threshold_pct: f64,
    ) -> Result<Composite> {
        let mut attempt = 0;
        loop {
            let call = self.inner.get_composite(region, year, cloud_threshold_pct);
            let outcome = match self.policy.attempt_timeout_ms {
                Some(ms) => tokio::time::timeout(Duration::from_millis(ms), call)
                    .await
                    .unwrap_or_else(|_| {
                        Err(AuditError::ProviderTimeout("composite provider".to_string()))
                    }),
                None => call.await,
            };

            match outcome {
                Ok(composite) => return Ok(composite),
                Err(e) if e.is_retryable() && attempt < self.policy.max_retries => {
                    attempt += 1;
                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        year = year.0,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Composite request failed, retrying"
                    );
                    metrics::counter!("provider_retries_total").increment(1);
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
