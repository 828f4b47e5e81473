use serde::{Deserialize, Serialize};

/// Shared configuration passed to every stage of the per-pixel pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Bands requested from the imagery source, in column order.
    pub bands: Vec<String>,
    /// Bands feeding the index as `(b1, b2)`; the index is `(b2 - b1) / (b2 + b1)`.
    pub index_bands: (String, String),
    /// Drop any observation with a missing value in a surviving band.
    pub drop_incomplete_rows: bool,
    /// Bands mapped to the red, green and blue channels of each point.
    pub colour_bands: Option<[String; 3]>,
    pub trend: Option<TrendConfig>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            bands: vec!["red".into(), "nir".into()],
            index_bands: ("red".into(), "nir".into()),
            drop_incomplete_rows: false,
            colour_bands: None,
            trend: Some(TrendConfig::default()),
        }
    }
}

/// Seasonal-trend overlay settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    pub period_days: f64,
    pub grid_points: usize,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            period_days: 365.0,
            grid_points: 500,
        }
    }
}

/// Errors raised while deriving a pixel's series.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("only {remaining} band(s) carry data for this pixel")]
    InsufficientBands { remaining: usize },
    #[error("index band '{0}' carries no data for this pixel")]
    MissingIndexBand(String),
    #[error("band '{0}' has a degenerate value range")]
    DegenerateRange(String),
    #[error("trend fit failed: {0}")]
    TrendFit(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl PipelineError {
    /// Whether the caller should skip this pixel and carry on with the batch.
    pub fn is_skip(&self) -> bool {
        !matches!(self, PipelineError::InvalidInput(_))
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Optional presentation step layered on top of a finished series.
pub trait Enrichment {
    type Output;

    fn name(&self) -> &'static str;
    fn apply(&self, series: &crate::processing::Series) -> PipelineResult<Self::Output>;
}

/// Outcome of an enrichment that is allowed to fail on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Enriched<T> {
    Present(T),
    Absent(String),
}

impl<T> Enriched<T> {
    /// Runs `enrichment`, logging and recording the reason on failure.
    pub fn from_stage<E>(enrichment: &E, series: &crate::processing::Series) -> Self
    where
        E: Enrichment<Output = T>,
    {
        match enrichment.apply(series) {
            Ok(value) => Enriched::Present(value),
            Err(err) => {
                log::warn!("{} omitted: {}", enrichment.name(), err);
                Enriched::Absent(err.to_string())
            }
        }
    }

    pub fn as_present(&self) -> Option<&T> {
        match self {
            Enriched::Present(value) => Some(value),
            Enriched::Absent(_) => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Enriched::Present(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_conditions_are_non_fatal() {
        assert!(PipelineError::InsufficientBands { remaining: 1 }.is_skip());
        assert!(PipelineError::DegenerateRange("red".into()).is_skip());
        assert!(PipelineError::TrendFit("singular".into()).is_skip());
        assert!(!PipelineError::InvalidInput("bad".into()).is_skip());
    }

    #[test]
    fn default_config_indexes_red_against_nir() {
        let config = PipelineConfig::default();
        assert_eq!(config.index_bands, ("red".to_string(), "nir".to_string()));
        assert_eq!(config.trend.unwrap().period_days, 365.0);
    }
}
