use crate::math::stats::StatsHelper;
use crate::prelude::{Enrichment, PipelineError, PipelineResult};
use crate::processing::series::Series;

/// Per-observation RGB triple in `[0, 1]`, `None` where a band is missing.
pub type PointColours = Vec<Option<[f64; 3]>>;

/// Min-max normalizes three bands over the pixel's own range for colour-coding.
pub struct ColourEnrichment {
    bands: [String; 3],
}

impl ColourEnrichment {
    pub fn new(bands: [String; 3]) -> Self {
        Self { bands }
    }
}

impl Enrichment for ColourEnrichment {
    type Output = PointColours;

    fn name(&self) -> &'static str {
        "colour"
    }

    fn apply(&self, series: &Series) -> PipelineResult<PointColours> {
        let mut ranges = [(0.0, 0.0); 3];
        for (slot, band) in ranges.iter_mut().zip(&self.bands) {
            if !series.has_band(band) {
                return Err(PipelineError::DegenerateRange(band.clone()));
            }
            let (min, max) = StatsHelper::finite_range(series.column(band))
                .ok_or_else(|| PipelineError::DegenerateRange(band.clone()))?;
            if max == min {
                return Err(PipelineError::DegenerateRange(band.clone()));
            }
            *slot = (min, max);
        }

        let colours = series
            .observations()
            .iter()
            .map(|obs| {
                let mut rgb = [0.0; 3];
                for ((channel, band), (min, max)) in rgb.iter_mut().zip(&self.bands).zip(ranges) {
                    *channel = (obs.band(band)? - min) / (max - min);
                }
                Some(rgb)
            })
            .collect();

        Ok(colours)
    }
}
