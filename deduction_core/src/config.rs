//! Session configuration.
//!
//! All tunables are loaded from a TOML document; every field has a default.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use deduction_rules::DEFAULT_SECRET_THRESHOLD;

use crate::error::{CoreError, CoreResult};
use crate::pressure::PressureTable;
use crate::scheduler::SchedulerWeights;

/// Complete session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Hard ceiling on rounds, independent of the moderator's judgment.
    pub max_rounds: u32,
    /// Threshold given to secrets that do not declare their own.
    pub secret_threshold: u32,
    /// Pressure is clamped to `threshold * pressure_cap_factor`.
    pub pressure_cap_factor: u32,
    /// How long one decision call may take.
    pub decision_timeout_ms: u64,
    /// Attempts per turn before the turn is skipped (first try plus retries).
    pub max_decision_attempts: u32,
    /// Turn ordering weights.
    pub scheduler: SchedulerWeights,
    /// Narrative event to pressure delta table.
    pub pressure: PressureTable,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_rounds: 20,
            secret_threshold: DEFAULT_SECRET_THRESHOLD,
            pressure_cap_factor: 2,
            decision_timeout_ms: 60_000,
            max_decision_attempts: 2,
            scheduler: SchedulerWeights::default(),
            pressure: PressureTable::default(),
        }
    }
}

impl SessionConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CoreError::Configuration(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> CoreResult<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| CoreError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Returns the configuration as a TOML string.
    pub fn to_toml(&self) -> CoreResult<String> {
        toml::to_string_pretty(self).map_err(|e| CoreError::Configuration(e.to_string()))
    }

    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn with_decision_timeout(mut self, timeout: Duration) -> Self {
        self.decision_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn decision_timeout(&self) -> Duration {
        Duration::from_millis(self.decision_timeout_ms)
    }

    /// Upper bound for a secret's pressure.
    pub fn pressure_cap(&self, threshold: u32) -> u32 {
        threshold.saturating_mul(self.pressure_cap_factor)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.max_rounds == 0 {
            return Err(CoreError::Configuration("max_rounds must be at least 1".into()));
        }
        if self.secret_threshold == 0 {
            return Err(CoreError::Configuration("secret_threshold must be positive".into()));
        }
        if self.pressure_cap_factor == 0 {
            return Err(CoreError::Configuration(
                "pressure_cap_factor must be at least 1".into(),
            ));
        }
        if self.max_decision_attempts == 0 {
            return Err(CoreError::Configuration(
                "max_decision_attempts must be at least 1".into(),
            ));
        }
        if self.decision_timeout_ms == 0 {
            return Err(CoreError::Configuration("decision_timeout_ms must be positive".into()));
        }
        Ok(())
    }
}
