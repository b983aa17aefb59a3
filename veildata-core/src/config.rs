//! Per-column privacy configuration. Records default to disabled when a
//! dataset is loaded and are only changed by explicit caller configuration;
//! the transformer reads them, never mutates them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::dp::{self, DpError};

pub const DEFAULT_EPSILON: f64 = 0.5;
pub const DEFAULT_SENSITIVITY: f64 = 1.0;
pub const DEFAULT_DELTA: f64 = 1e-5;

/// Bounds mirroring the slider limits of the configuring front end; the core
/// enforces them rather than trusting the caller.
pub const MAX_EPSILON: f64 = 10.0;
pub const MIN_SENSITIVITY: f64 = 0.1;
pub const MAX_SENSITIVITY: f64 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mechanism {
    Laplace,
    Gaussian,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrivacyConfig {
    pub enabled: bool,
    pub mechanism: Mechanism,
    pub epsilon: f64,
    pub sensitivity: f64,
    /// Only consulted by the Gaussian mechanism.
    pub delta: f64,
}

impl Default for PrivacyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            mechanism: Mechanism::Laplace,
            epsilon: DEFAULT_EPSILON,
            sensitivity: DEFAULT_SENSITIVITY,
            delta: DEFAULT_DELTA,
        }
    }
}

impl PrivacyConfig {
    pub fn laplace(epsilon: f64, sensitivity: f64) -> Self {
        Self {
            enabled: true,
            mechanism: Mechanism::Laplace,
            epsilon,
            sensitivity,
            ..Default::default()
        }
    }

    pub fn gaussian(epsilon: f64, sensitivity: f64, delta: f64) -> Self {
        Self {
            enabled: true,
            mechanism: Mechanism::Gaussian,
            epsilon,
            sensitivity,
            delta,
        }
    }

    /// Checks both the mathematical domain and the configurable bounds.
    pub fn validate(&self) -> Result<(), DpError> {
        dp::validate_epsilon(self.epsilon)?;
        if self.epsilon > MAX_EPSILON {
            return Err(DpError::EpsilonOutOfRange(self.epsilon));
        }
        dp::validate_sensitivity(self.sensitivity)?;
        if !(MIN_SENSITIVITY..=MAX_SENSITIVITY).contains(&self.sensitivity) {
            return Err(DpError::SensitivityOutOfRange(self.sensitivity));
        }
        if self.mechanism == Mechanism::Gaussian {
            dp::validate_delta(self.delta)?;
        }
        Ok(())
    }
}

/// Mapping column name → config, one record per column of the loaded
/// dataset.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PrivacySettings {
    columns: BTreeMap<String, PrivacyConfig>,
}

impl PrivacySettings {
    /// One default (disabled) record per dataset column.
    pub fn for_dataset(dataset: &Dataset) -> Self {
        let columns = dataset
            .column_names()
            .map(|name| (name.to_string(), PrivacyConfig::default()))
            .collect();
        Self { columns }
    }

    pub fn set(&mut self, column: impl Into<String>, config: PrivacyConfig) {
        self.columns.insert(column.into(), config);
    }

    pub fn get(&self, column: &str) -> Option<&PrivacyConfig> {
        self.columns.get(column)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PrivacyConfig)> {
        self.columns.iter().map(|(name, cfg)| (name.as_str(), cfg))
    }

    pub fn enabled_columns(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .filter(|(_, cfg)| cfg.enabled)
            .map(|(name, _)| name.as_str())
    }
}
