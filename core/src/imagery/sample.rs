use crate::prelude::{PipelineError, PipelineResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One acquisition for one pixel as delivered by the imagery source.
///
/// Values already masked as no-data upstream arrive as `None`; a band absent
/// from the map is treated the same way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandSample {
    pub date: NaiveDate,
    #[serde(default)]
    pub bands: BTreeMap<String, Option<f64>>,
}

impl BandSample {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            bands: BTreeMap::new(),
        }
    }

    pub fn with_band(mut self, name: &str, value: Option<f64>) -> Self {
        self.bands.insert(name.to_string(), value);
        self
    }

    /// Value of `band`, or `None` when it is missing or not finite.
    pub fn value(&self, band: &str) -> Option<f64> {
        self.bands
            .get(band)
            .copied()
            .flatten()
            .filter(|value| value.is_finite())
    }
}

/// Spatial identity of a pixel in projected coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelId {
    pub x: f64,
    pub y: f64,
}

impl PixelId {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Stable `"<x>_<y>"` key, also the stem of the output artifact.
    pub fn key(&self) -> String {
        format!("{:?}_{:?}", self.x, self.y)
    }
}

/// Time series of multi-band samples for a single pixel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PixelSeries {
    pub pixel: PixelId,
    pub samples: Vec<BandSample>,
}

impl PixelSeries {
    pub fn new(pixel: PixelId, samples: Vec<BandSample>) -> Self {
        Self { pixel, samples }
    }
}

/// Ordered collection of pixels, processed one after another.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PixelStack {
    pub pixels: Vec<PixelSeries>,
}

impl PixelStack {
    pub fn from_json(contents: &str) -> PipelineResult<Self> {
        serde_json::from_str(contents)
            .map_err(|err| PipelineError::InvalidInput(format!("pixel stack: {err}")))
    }

    pub fn to_json(&self) -> PipelineResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|err| PipelineError::InvalidInput(format!("pixel stack: {err}")))
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}
