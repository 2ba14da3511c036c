// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Restyling configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StilwerkError};
use crate::font::FontFamily;

/// Tunable settings for a restyling run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestyleConfig {
    /// Gaussian blur radius (sigma) applied to the resized cover image.
    pub blur_radius: f32,
    /// Weight of the grain layer when blending (0 = none, 1 = grain only).
    pub grain_strength: f32,
    /// Mean of the per-channel grain distribution.
    pub grain_mean: f32,
    /// Standard deviation of the per-channel grain distribution.
    pub grain_std_dev: f32,
    /// Built-in font family every span is collapsed onto.
    pub font_family: FontFamily,
    /// Reconstruct pages on a worker pool instead of one at a time.
    pub parallel: bool,
    /// Fixed grain seed. Page `i` uses `seed + i`; `None` draws fresh entropy.
    pub seed: Option<u64>,
    /// Title written into the output document metadata.
    pub title: String,
}

impl Default for RestyleConfig {
    fn default() -> Self {
        Self {
            blur_radius: 10.0,
            grain_strength: 0.20,
            grain_mean: 128.0,
            grain_std_dev: 30.0,
            font_family: FontFamily::Times,
            parallel: false,
            seed: None,
            title: "Stilwerk Document".to_string(),
        }
    }
}

impl RestyleConfig {
    /// Load a configuration from a JSON file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the background synthesizer cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !self.blur_radius.is_finite() || self.blur_radius < 0.0 {
            return Err(StilwerkError::Config(format!(
                "blur_radius must be a non-negative number, got {}",
                self.blur_radius
            )));
        }
        if !(0.0..=1.0).contains(&self.grain_strength) {
            return Err(StilwerkError::Config(format!(
                "grain_strength must lie in [0, 1], got {}",
                self.grain_strength
            )));
        }
        if !self.grain_std_dev.is_finite() || self.grain_std_dev < 0.0 {
            return Err(StilwerkError::Config(format!(
                "grain_std_dev must be a non-negative number, got {}",
                self.grain_std_dev
            )));
        }
        if !self.grain_mean.is_finite() {
            return Err(StilwerkError::Config("grain_mean must be finite".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_stylise_settings() {
        let config = RestyleConfig::default();
        assert_eq!(config.blur_radius, 10.0);
        assert_eq!(config.grain_strength, 0.20);
        assert_eq!(config.font_family, FontFamily::Times);
        assert!(!config.parallel);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: RestyleConfig =
            serde_json::from_str(r#"{ "grain_strength": 0.5, "font_family": "Helvetica" }"#)
                .expect("valid json");
        assert_eq!(config.grain_strength, 0.5);
        assert_eq!(config.font_family, FontFamily::Helvetica);
        assert_eq!(config.blur_radius, 10.0);
    }

    #[test]
    fn out_of_range_grain_is_rejected() {
        let config = RestyleConfig {
            grain_strength: 1.5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(StilwerkError::Config(_))));
    }
}
