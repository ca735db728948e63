// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Cutting configuration

use crate::error::{CutError, CutResult};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tolerances and thresholds for the cutting pipeline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CutConfig {
    /// Distance under which two points are the same vertex
    pub snap_tolerance: f64,
    /// Winding number above which a centroid counts as inside
    pub containment_iso_value: f64,
    /// Search radius when aligning the boundaries of the two trimmed shells
    pub reconcile_tolerance: f64,
    /// Radius used to weld coincident vertices when importing a [`Mesh`](crate::geometry::Mesh)
    pub weld_tolerance: f64,
}

impl Default for CutConfig {
    fn default() -> Self {
        Self {
            snap_tolerance: 1e-6,
            containment_iso_value: 0.9,
            reconcile_tolerance: 1e-5,
            weld_tolerance: 1e-9,
        }
    }
}

impl CutConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))
    }

    /// Parse configuration from TOML text; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: CutConfig = toml::from_str(content).context("Invalid cut configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Load `meshcut.toml` when present, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = if Path::new("meshcut.toml").exists() {
            Self::from_file("meshcut.toml")?
        } else {
            Self::default()
        };

        if let Ok(value) = std::env::var("MESHCUT_SNAP_TOLERANCE") {
            config.snap_tolerance = value
                .parse()
                .with_context(|| format!("MESHCUT_SNAP_TOLERANCE is not a number: {value}"))?;
        }

        if let Ok(value) = std::env::var("MESHCUT_ISO_VALUE") {
            config.containment_iso_value = value
                .parse()
                .with_context(|| format!("MESHCUT_ISO_VALUE is not a number: {value}"))?;
        }

        if let Ok(value) = std::env::var("MESHCUT_RECONCILE_TOLERANCE") {
            config.reconcile_tolerance = value
                .parse()
                .with_context(|| format!("MESHCUT_RECONCILE_TOLERANCE is not a number: {value}"))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Reject tolerances the pipeline cannot work with
    pub fn validate(&self) -> CutResult<()> {
        let positive = |name: &str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(CutError::InvalidConfig(format!(
                    "{name} must be a positive finite number, got {value}"
                )))
            }
        };
        positive("snap_tolerance", self.snap_tolerance)?;
        positive("reconcile_tolerance", self.reconcile_tolerance)?;
        positive("weld_tolerance", self.weld_tolerance)?;

        let iso = self.containment_iso_value;
        if !(iso > 0.0 && iso < 1.0) {
            return Err(CutError::InvalidConfig(format!(
                "containment_iso_value must lie strictly between 0 and 1, got {iso}"
            )));
        }
        Ok(())
    }
}
