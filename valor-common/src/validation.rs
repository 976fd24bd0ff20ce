//! Configuration validation for valor.
//!
//! Provides validation logic for configuration fields to ensure
//! all values are present and within valid ranges.

use std::path::Path;

use thiserror::Error;

use crate::config::{Config, FilterConfig, HistoryConfig, ObservabilityConfig, ScreenerConfig};

/// Configuration validation error.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Multiple validation errors: {0:?}")]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trait for validatable configuration sections.
pub trait Validate {
    /// Validate this configuration section.
    fn validate(&self) -> ValidationResult<()>;
}

impl Validate for Config {
    fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Err(e) = self.observability.validate() {
            errors.push(e);
        }

        if let Err(e) = self.screener.validate() {
            errors.push(e);
        }

        if let Err(e) = self.history.validate() {
            errors.push(e);
        }

        if errors.is_empty() {
            Ok(())
        } else if errors.len() == 1 {
            Err(errors.remove(0))
        } else {
            Err(ValidationError::Multiple(errors))
        }
    }
}

impl Config {
    /// Load and validate configuration.
    ///
    /// Validation failures surface as [`crate::Error::Config`].
    pub fn load_and_validate(path: Option<&Path>) -> anyhow::Result<Self> {
        let config = Self::load_with_env(path)?;
        config
            .validate()
            .map_err(|e| crate::Error::Config(e.to_string()))?;
        Ok(config)
    }
}

impl Validate for ObservabilityConfig {
    fn validate(&self) -> ValidationResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "observability.log_level".into(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            });
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.log_format.to_lowercase().as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "observability.log_format".into(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            });
        }

        Ok(())
    }
}

impl Validate for ScreenerConfig {
    fn validate(&self) -> ValidationResult<()> {
        self.filters.validate()?;

        let valid_formats = ["markdown", "md", "json", "csv"];
        if !valid_formats.contains(&self.report_format.to_lowercase().as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "screener.report_format".into(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            });
        }

        if self.top == Some(0) {
            return Err(ValidationError::InvalidValue {
                field: "screener.top".into(),
                reason: "must be at least 1 when set".into(),
            });
        }

        Ok(())
    }
}

impl Validate for FilterConfig {
    fn validate(&self) -> ValidationResult<()> {
        let fields = [
            ("screener.filters.min_liquidity", self.min_liquidity),
            ("screener.filters.min_ebit_margin", self.min_ebit_margin),
            ("screener.filters.min_roic", self.min_roic),
        ];

        for (field, value) in fields {
            if !value.is_finite() {
                return Err(ValidationError::InvalidValue {
                    field: field.into(),
                    reason: format!("must be a finite number, got {}", value),
                });
            }
        }

        if self.min_liquidity < 0.0 {
            return Err(ValidationError::InvalidValue {
                field: "screener.filters.min_liquidity".into(),
                reason: "must not be negative".into(),
            });
        }

        Ok(())
    }
}

impl Validate for HistoryConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.endpoints.is_empty() {
            return Err(ValidationError::MissingField {
                field: "history.endpoints".into(),
            });
        }

        if self.proxies.is_empty() {
            return Err(ValidationError::MissingField {
                field: "history.proxies".into(),
            });
        }

        if let Some(bad) = self.proxies.iter().find(|p| !p.contains("{url}")) {
            return Err(ValidationError::InvalidValue {
                field: "history.proxies".into(),
                reason: format!("template '{}' has no {{url}} placeholder", bad),
            });
        }

        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidValue {
                field: "history.timeout_secs".into(),
                reason: "must be greater than 0".into(),
            });
        }

        Ok(())
    }
}
