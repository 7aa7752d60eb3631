//! Configuration for the answer pipeline.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Configuration parameters for the answer pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Number of passages retrieved per question.
    pub top_k: usize,
    /// Minimum similarity score for retrieved passages. `None` keeps every hit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_threshold: Option<f32>,
    /// Maximum time a single generation attempt may take. `None` waits indefinitely.
    #[serde(default, with = "duration_secs", skip_serializing_if = "Option::is_none")]
    pub generation_timeout: Option<Duration>,
    /// Retry behaviour for the generation call.
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            top_k: Self::DEFAULT_TOP_K,
            similarity_threshold: None,
            generation_timeout: None,
            retry: RetryPolicy::default(),
        }
    }
}

impl RagConfig {
    /// Passages retrieved per question unless configured otherwise.
    pub const DEFAULT_TOP_K: usize = 3;

    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }
}

/// How often a failed generation call is attempted again.
///
/// The default makes exactly one attempt. Retrying is an opt-in extension:
/// set `max_attempts` above one and failed attempts are repeated after an
/// exponentially growing delay, capped at `max_backoff`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    #[serde(with = "duration_millis")]
    pub initial_backoff: Duration,
    /// Upper bound for any single delay.
    #[serde(with = "duration_millis")]
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

impl RetryPolicy {
    /// A single attempt, no retries.
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
        }
    }

    /// Up to `max_attempts` attempts with exponential backoff starting at `initial_backoff`.
    pub fn exponential(max_attempts: u32, initial_backoff: Duration) -> Self {
        Self { max_attempts, initial_backoff, ..Self::none() }
    }

    /// Set the upper bound for any single delay.
    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.initial_backoff.saturating_mul(1 << exponent).min(self.max_backoff)
    }

    /// Whether any retry happens at all.
    pub fn retries_enabled(&self) -> bool {
        self.max_attempts > 1
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the number of passages retrieved per question.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the minimum similarity threshold for retrieved passages.
    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.similarity_threshold = Some(threshold);
        self
    }

    /// Set the timeout for a single generation attempt.
    pub fn generation_timeout(mut self, timeout: Duration) -> Self {
        self.config.generation_timeout = Some(timeout);
        self
    }

    /// Set the retry policy for the generation call.
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// See [`RagConfig::validate`].
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl RagConfig {
    /// Check that the parameters are usable.
    ///
    /// Configs built through [`RagConfig::builder`] are already valid; this is
    /// for struct literals and deserialized values.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidKError`] if `top_k == 0`.
    /// - [`RagError::ConfigError`] if `similarity_threshold` is not a finite
    ///   number in `[-1.0, 1.0]`, `generation_timeout` is zero,
    ///   `retry.max_attempts == 0`, or `retry.initial_backoff > retry.max_backoff`.
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(RagError::InvalidKError { k: self.top_k });
        }
        if let Some(threshold) = self.similarity_threshold {
            if !threshold.is_finite() || !(-1.0..=1.0).contains(&threshold) {
                return Err(RagError::ConfigError(format!(
                    "similarity_threshold ({threshold}) must be within [-1.0, 1.0]"
                )));
            }
        }
        if self.generation_timeout.is_some_and(|t| t.is_zero()) {
            return Err(RagError::ConfigError(
                "generation_timeout must be greater than zero".to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(RagError::ConfigError(
                "retry.max_attempts must be at least one".to_string(),
            ));
        }
        if self.retry.initial_backoff > self.retry.max_backoff {
            return Err(RagError::ConfigError(format!(
                "retry.initial_backoff ({:?}) must not exceed retry.max_backoff ({:?})",
                self.retry.initial_backoff, self.retry.max_backoff
            )));
        }
        Ok(())
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&d.as_secs_f64()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        let secs = Option::<f64>::deserialize(d)?;
        secs.map(|s| Duration::try_from_secs_f64(s).map_err(serde::de::Error::custom)).transpose()
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_single_call_top_three() {
        let config = RagConfig::default();
        assert_eq!(config.top_k, 3);
        assert_eq!(config.similarity_threshold, None);
        assert_eq!(config.generation_timeout, None);
        assert_eq!(config.retry.max_attempts, 1);
        assert!(!config.retry.retries_enabled());
    }

    #[test]
    fn builder_rejects_invalid_values() {
        assert!(matches!(
            RagConfig::builder().top_k(0).build(),
            Err(RagError::InvalidKError { k: 0 })
        ));
        assert!(RagConfig::builder().similarity_threshold(1.5).build().is_err());
        assert!(RagConfig::builder().similarity_threshold(f32::NAN).build().is_err());
        assert!(RagConfig::builder().generation_timeout(Duration::ZERO).build().is_err());
        assert!(
            RagConfig::builder()
                .retry(RetryPolicy { max_attempts: 0, ..RetryPolicy::none() })
                .build()
                .is_err()
        );
        assert!(
            RagConfig::builder()
                .retry(RetryPolicy::exponential(3, Duration::from_secs(10)))
                .build()
                .is_err()
        );
    }

    #[test]
    fn deserialized_config_is_validated() {
        let config: RagConfig = serde_json::from_str(r#"{"top_k":0}"#).unwrap();
        assert!(matches!(config.validate(), Err(RagError::InvalidKError { k: 0 })));
        assert!(RagConfig::default().validate().is_ok());
    }

    #[test]
    fn builder_accepts_custom_values() {
        let config = RagConfig::builder()
            .top_k(5)
            .similarity_threshold(0.25)
            .generation_timeout(Duration::from_secs(30))
            .retry(RetryPolicy::exponential(3, Duration::from_millis(100)))
            .build()
            .unwrap();
        assert_eq!(config.top_k, 5);
        assert_eq!(config.similarity_threshold, Some(0.25));
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy::exponential(5, Duration::from_millis(100))
            .with_max_backoff(Duration::from_millis(300));
        assert_eq!(policy.backoff_for(1), Duration::from_millis(100));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(200));
        assert_eq!(policy.backoff_for(3), Duration::from_millis(300));
        assert_eq!(policy.backoff_for(10), Duration::from_millis(300));
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = RagConfig::builder()
            .generation_timeout(Duration::from_millis(1500))
            .build()
            .unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: RagConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
