//! Rate-limited page fetching.
//!
//! The news site is polite-crawled: consecutive requests are spaced at least
//! `rate_limit` apart, plus a random jitter so the access pattern does not
//! look mechanical. The limiter state lives in the [`Fetcher`], not in a
//! process-wide global.

use crate::config::ScrapeConfig;
use crate::error::PatchNotesError;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Spacing policy between two requests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimit {
    pub interval: Duration,
    /// Upper bound of the random extra delay.
    pub jitter: Duration,
}

impl RateLimit {
    pub fn from_secs(interval: f64, jitter: f64) -> Self {
        Self {
            interval: Duration::from_secs_f64(interval.max(0.0)),
            jitter: Duration::from_secs_f64(jitter.max(0.0)),
        }
    }

    /// Delay before the next request.
    ///
    /// `elapsed` is the time since the previous request (`None` for the
    /// first one) and `roll` a uniform sample in `[0, 1)`. Jitter is only
    /// added when the request would otherwise come too early.
    pub fn delay(&self, elapsed: Option<Duration>, roll: f64) -> Duration {
        match elapsed {
            Some(elapsed) if elapsed < self.interval => {
                (self.interval - elapsed) + self.jitter.mul_f64(roll.clamp(0.0, 1.0))
            }
            _ => Duration::ZERO,
        }
    }
}

/// HTTP client plus rate-limiter state.
pub struct Fetcher {
    client: reqwest::Client,
    rate_limit: RateLimit,
    last_request: Mutex<Option<Instant>>,
}

impl Fetcher {
    pub fn new(config: &ScrapeConfig) -> Result<Self, PatchNotesError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| PatchNotesError::Internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            rate_limit: RateLimit::from_secs(config.rate_limit_secs, config.rate_limit_jitter),
            last_request: Mutex::new(None),
        })
    }

    pub fn rate_limit(&self) -> RateLimit {
        self.rate_limit
    }

    /// Fetch `url` as text after waiting for the rate limiter.
    ///
    /// # Errors
    /// [`PatchNotesError::RequestFailed`] if the request cannot be sent or
    /// the body read, [`PatchNotesError::HttpStatus`] on a non-success status.
    pub async fn fetch_page(&self, url: &str) -> Result<String, PatchNotesError> {
        self.throttle().await;
        info!("Fetching page {}", url);

        let response = self.client.get(url).send().await.map_err(|e| {
            PatchNotesError::RequestFailed {
                url: url.to_string(),
                reason: if e.is_timeout() {
                    "request timed out".to_string()
                } else {
                    e.to_string()
                },
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PatchNotesError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| PatchNotesError::RequestFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(body)
    }

    /// Sleep until the next request is allowed, then record it. The lock is
    /// held across the sleep so concurrent callers queue up.
    async fn throttle(&self) {
        let mut last = self.last_request.lock().await;
        let elapsed = last.map(|t| t.elapsed());
        let delay = self.rate_limit.delay(elapsed, rand::random::<f64>());
        if !delay.is_zero() {
            debug!("Rate limit: sleeping {:.2}s", delay.as_secs_f64());
            tokio::time::sleep(delay).await;
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limit() -> RateLimit {
        RateLimit::from_secs(1.0, 2.0)
    }

    #[test]
    fn first_request_is_immediate() {
        assert_eq!(limit().delay(None, 0.9), Duration::ZERO);
    }

    #[test]
    fn late_request_is_immediate() {
        assert_eq!(limit().delay(Some(Duration::from_secs(3)), 0.9), Duration::ZERO);
    }

    #[test]
    fn early_request_waits_remainder_plus_jitter() {
        let d = limit().delay(Some(Duration::from_millis(250)), 0.5);
        assert_eq!(d, Duration::from_millis(750) + Duration::from_secs(1));
    }

    #[test]
    fn jitter_roll_is_clamped() {
        let d = limit().delay(Some(Duration::ZERO), 7.0);
        assert_eq!(d, Duration::from_secs(3));
    }

    #[test]
    fn negative_config_is_treated_as_zero() {
        let r = RateLimit::from_secs(-1.0, -1.0);
        assert_eq!(r.delay(Some(Duration::ZERO), 0.5), Duration::ZERO);
    }

    #[tokio::test]
    async fn fetcher_builds_from_default_config() {
        let f = Fetcher::new(&ScrapeConfig::default()).unwrap();
        assert_eq!(f.rate_limit(), limit());
    }
}
