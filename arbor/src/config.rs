//! Check loop configuration.

use std::fmt;

use crate::gen::Size;

/// Configuration for one property check run.
///
/// Plain data: the engine reads it, nothing here touches the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Number of passing trials required to report success.
    pub max_success: usize,
    /// Largest size hint scheduled across the run.
    pub max_size: Size,
    /// Give up once discards exceed `max_success * max_discard_ratio`.
    pub max_discard_ratio: usize,
    /// Base seed; `None` draws one from process entropy at run start.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_success: 100,
            max_size: 100,
            max_discard_ratio: 10,
            seed: None,
        }
    }
}

impl Config {
    /// Set the number of passing trials required.
    pub fn with_max_success(mut self, max_success: usize) -> Self {
        self.max_success = max_success;
        self
    }

    /// Set the largest scheduled size hint.
    pub fn with_max_size(mut self, max_size: Size) -> Self {
        self.max_size = max_size;
        self
    }

    /// Set the discard budget multiplier.
    pub fn with_max_discard_ratio(mut self, ratio: usize) -> Self {
        self.max_discard_ratio = ratio;
        self
    }

    /// Fix the base seed for a fully reproducible run.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check the configuration for values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_success == 0 {
            return Err(ConfigError {
                field: "max_success",
                message: "at least one trial is required".to_string(),
            });
        }
        if self.max_discard_ratio == 0 {
            return Err(ConfigError {
                field: "max_discard_ratio",
                message: "a zero discard budget would give up on the first discard".to_string(),
            });
        }
        Ok(())
    }
}

/// A configuration field holds an unusable value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid config field {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.max_success, 100);
        assert_eq!(config.max_size, 100);
        assert_eq!(config.max_discard_ratio, 10);
        assert!(config.seed.is_none());
    }

    #[test]
    fn builders_compose() {
        let config = Config::default()
            .with_max_success(500)
            .with_max_size(20)
            .with_max_discard_ratio(3)
            .with_seed(42);
        assert_eq!(config.max_success, 500);
        assert_eq!(config.max_size, 20);
        assert_eq!(config.max_discard_ratio, 3);
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn validation_rejects_zero_budgets() {
        assert!(Config::default().validate().is_ok());
        let err = Config::default().with_max_success(0).validate().unwrap_err();
        assert_eq!(err.field, "max_success");
        let err = Config::default()
            .with_max_discard_ratio(0)
            .validate()
            .unwrap_err();
        assert_eq!(err.field, "max_discard_ratio");
    }
}
