use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid options JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("option `{name}` must be {requirement}, got {value}")]
    OutOfRange {
        name: &'static str,
        requirement: &'static str,
        value: f64,
    },
}

/// Layout and loading parameters, all in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimelineOptions {
    /// Height rows are scaled to before justification.
    pub target_row_height: f64,
    /// Initial guess for the height of title items, until the renderer
    /// reports a measurement.
    pub header_height: f64,
    /// Horizontal gap between segments sharing a row.
    pub segment_margin: f64,
    /// Gap between boxes in a row and between rows of one segment.
    pub box_spacing: f64,
    /// Sections within this distance of the viewport are loaded too.
    pub load_within_margin: f64,
}

impl Default for TimelineOptions {
    fn default() -> Self {
        Self {
            target_row_height: 200.0,
            header_height: 50.0,
            segment_margin: 20.0,
            box_spacing: 4.0,
            load_within_margin: 1000.0,
        }
    }
}

impl TimelineOptions {
    /// Parse options from JSON; missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let options: TimelineOptions = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("targetRowHeight", self.target_row_height),
            ("headerHeight", self.header_height),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::OutOfRange {
                    name,
                    requirement: "a positive number",
                    value,
                });
            }
        }
        let non_negative = [
            ("segmentMargin", self.segment_margin),
            ("boxSpacing", self.box_spacing),
            ("loadWithinMargin", self.load_within_margin),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::OutOfRange {
                    name,
                    requirement: "zero or more",
                    value,
                });
            }
        }
        Ok(())
    }
}
