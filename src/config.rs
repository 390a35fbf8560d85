//! Analysis configuration.
//!
//! Every field has a default, so a TOML file only lists what it overrides:
//!
//! ```toml
//! threshold_fraction = 0.15
//! alpha = 0.01
//! bands = ["alpha", "beta"]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::decode::{RowDecoder, DEFAULT_SENTINEL, DEFAULT_SKIP_COLUMNS};
use crate::model::{Band, State};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Fraction of strongest edges kept per graph, in `(0, 1]`.
    pub threshold_fraction: f64,
    /// Significance level, in `(0, 1)`.
    pub alpha: f64,
    /// Identifying columns at the start of each row.
    pub skip_columns: usize,
    /// Block terminator in the row encoding.
    pub sentinel: f64,
    pub baseline_state: State,
    pub contrast_state: State,
    /// Bands included in a comparison run.
    pub bands: Vec<Band>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            threshold_fraction: 0.1,
            alpha: 0.05,
            skip_columns: DEFAULT_SKIP_COLUMNS,
            sentinel: DEFAULT_SENTINEL,
            baseline_state: State::Rest,
            contrast_state: State::Film,
            bands: Band::ALL.to_vec(),
        }
    }
}

impl AnalysisConfig {
    /// Parse and validate TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: AnalysisConfig =
            toml::from_str(text).map_err(|e| Error::Config(format!("invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.threshold_fraction > 0.0 && self.threshold_fraction <= 1.0) {
            return Err(Error::Config(format!(
                "threshold_fraction must be in (0, 1], got {}",
                self.threshold_fraction
            )));
        }
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(Error::Config(format!("alpha must be in (0, 1), got {}", self.alpha)));
        }
        if !self.sentinel.is_finite() {
            return Err(Error::Config(format!("sentinel must be finite, got {}", self.sentinel)));
        }
        if self.baseline_state == self.contrast_state {
            return Err(Error::Config(format!(
                "baseline and contrast state are both '{}'",
                self.baseline_state
            )));
        }
        if self.bands.is_empty() {
            return Err(Error::Config("no bands declared".into()));
        }
        Ok(())
    }

    pub fn decoder(&self) -> RowDecoder {
        RowDecoder::new(self.skip_columns, self.sentinel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let c = AnalysisConfig::default();
        c.validate().unwrap();
        assert_eq!(c.bands.len(), 6);
        assert_eq!(c.decoder(), RowDecoder::default());
    }

    #[test]
    fn test_partial_toml_overrides() {
        let c = AnalysisConfig::from_toml_str(
            r#"
            threshold_fraction = 0.25
            bands = ["alpha", "high_gamma"]
            "#,
        )
        .unwrap();
        assert_eq!(c.threshold_fraction, 0.25);
        assert_eq!(c.bands, vec![Band::Alpha, Band::HighGamma]);
        assert_eq!(c.alpha, 0.05);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            AnalysisConfig::from_toml_str("threshold_fraction = 0.0"),
            Err(Error::Config(_))
        ));
        assert!(AnalysisConfig::from_toml_str("alpha = 1.0").is_err());
        assert!(AnalysisConfig::from_toml_str(r#"contrast_state = "rest""#).is_err());
        assert!(AnalysisConfig::from_toml_str("bands = []").is_err());
        assert!(AnalysisConfig::from_toml_str("bands = [\"kappa\"]").is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let c = AnalysisConfig { alpha: 0.01, ..Default::default() };
        let text = c.to_toml_string().unwrap();
        assert_eq!(AnalysisConfig::from_toml_str(&text).unwrap(), c);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analysis.toml");
        std::fs::write(&path, "alpha = 0.001\n").unwrap();
        assert_eq!(AnalysisConfig::load(&path).unwrap().alpha, 0.001);
    }
}
