use crate::imagery::calendar;
use crate::imagery::{PixelId, PixelSeries};
use crate::prelude::{PipelineConfig, PipelineError, PipelineResult};
use crate::telemetry::log::LogManager;
use std::collections::BTreeMap;

/// One timestamp of one pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Ordinal day number (0001-01-01 is day 1).
    pub timestamp: i64,
    pub band_values: BTreeMap<String, Option<f64>>,
    pub derived_index: Option<f64>,
}

impl Observation {
    pub fn band(&self, name: &str) -> Option<f64> {
        self.band_values.get(name).copied().flatten()
    }

    fn is_complete(&self) -> bool {
        self.band_values.values().all(Option::is_some)
    }
}

/// Observations of a single pixel, unique by timestamp and sorted ascending.
///
/// Every observation carries the same band keys.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pixel: PixelId,
    bands: Vec<String>,
    observations: Vec<Observation>,
}

impl Series {
    pub fn pixel(&self) -> PixelId {
        self.pixel
    }

    /// Surviving band columns, in requested order.
    pub fn bands(&self) -> &[String] {
        &self.bands
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn has_band(&self, name: &str) -> bool {
        self.bands.iter().any(|band| band == name)
    }

    pub fn column(&self, name: &str) -> impl Iterator<Item = Option<f64>> + '_ {
        let name = name.to_string();
        self.observations.iter().map(move |obs| obs.band(&name))
    }

    pub fn timestamps(&self) -> impl Iterator<Item = i64> + '_ {
        self.observations.iter().map(|obs| obs.timestamp)
    }

    /// `(timestamp, index)` pairs for observations whose index is defined.
    pub fn plot_points(&self) -> Vec<(f64, f64)> {
        self.observations
            .iter()
            .filter_map(|obs| obs.derived_index.map(|value| (obs.timestamp as f64, value)))
            .collect()
    }

    pub(crate) fn with_index(mut self, values: Vec<Option<f64>>) -> Self {
        for (obs, value) in self.observations.iter_mut().zip(values) {
            obs.derived_index = value;
        }
        self
    }

    /// Removes observations whose index is undefined; returns how many were removed.
    pub(crate) fn drop_unindexed(&mut self) -> usize {
        let before = self.observations.len();
        self.observations.retain(|obs| obs.derived_index.is_some());
        before - self.observations.len()
    }
}

/// Reshapes a per-pixel multi-band time series into an observation table.
pub struct SeriesBuilder {
    bands: Vec<String>,
    drop_incomplete_rows: bool,
    logger: LogManager,
}

impl SeriesBuilder {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            bands: config.bands.clone(),
            drop_incomplete_rows: config.drop_incomplete_rows,
            logger: LogManager::new(),
        }
    }

    pub fn build(&self, input: &PixelSeries) -> PipelineResult<Series> {
        if self.bands.is_empty() {
            return Err(PipelineError::InvalidInput("no bands requested".into()));
        }

        // Repeated dates come from overlapping sensors; first defined value per band wins.
        let mut rows: BTreeMap<i64, BTreeMap<String, Option<f64>>> = BTreeMap::new();
        for sample in &input.samples {
            let row = rows
                .entry(calendar::to_ordinal(sample.date))
                .or_insert_with(|| self.bands.iter().map(|band| (band.clone(), None)).collect());
            for band in &self.bands {
                if let Some(slot) = row.get_mut(band) {
                    if slot.is_none() {
                        *slot = sample.value(band);
                    }
                }
            }
        }

        let bands: Vec<String> = self
            .bands
            .iter()
            .filter(|band| rows.values().any(|row| row.get(*band).copied().flatten().is_some()))
            .cloned()
            .collect();

        let dropped = self.bands.len() - bands.len();
        if dropped > 0 {
            self.logger.record(&format!(
                "SeriesBuilder {} dropped {} empty band(s)",
                input.pixel.key(),
                dropped
            ));
        }

        let mut observations: Vec<Observation> = rows
            .into_iter()
            .map(|(timestamp, mut values)| {
                values.retain(|band, _| bands.contains(band));
                Observation {
                    timestamp,
                    band_values: values,
                    derived_index: None,
                }
            })
            .collect();

        if self.drop_incomplete_rows {
            let before = observations.len();
            observations.retain(Observation::is_complete);
            self.logger.record(&format!(
                "SeriesBuilder {} dropped {} incomplete row(s)",
                input.pixel.key(),
                before - observations.len()
            ));
        }

        Ok(Series {
            pixel: input.pixel,
            bands,
            observations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imagery::BandSample;
    use chrono::NaiveDate;

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2005, 1, 1).unwrap() + chrono::Duration::days(offset)
    }

    fn config(bands: &[&str]) -> PipelineConfig {
        PipelineConfig {
            bands: bands.iter().map(|b| b.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn all_missing_band_is_dropped_everywhere() {
        let samples = (0..5)
            .map(|i| {
                BandSample::new(day(i))
                    .with_band("a", None)
                    .with_band("b", Some(i as f64 + 1.0))
                    .with_band("c", Some(0.5))
            })
            .collect();
        let input = PixelSeries::new(PixelId::new(0.0, 0.0), samples);
        let series = SeriesBuilder::new(&config(&["a", "b", "c"]))
            .build(&input)
            .unwrap();

        assert_eq!(series.bands(), &["b".to_string(), "c".to_string()]);
        assert_eq!(series.len(), 5);
        assert!(series
            .observations()
            .iter()
            .all(|obs| !obs.band_values.contains_key("a")));
    }

    #[test]
    fn only_populated_band_survives() {
        let n = 6;
        let samples = (0..n)
            .map(|i| {
                BandSample::new(day(i))
                    .with_band("a", None)
                    .with_band("b", Some(i as f64 + 1.0))
            })
            .collect();
        let input = PixelSeries::new(PixelId::new(0.0, 0.0), samples);
        let series = SeriesBuilder::new(&config(&["a", "b"]))
            .build(&input)
            .unwrap();
        assert_eq!(series.bands(), &["b".to_string()]);
        let column: Vec<Option<f64>> = series.column("b").collect();
        assert_eq!(column, (1..=n).map(|v| Some(v as f64)).collect::<Vec<_>>());
    }

    #[test]
    fn rows_are_sorted_and_unique() {
        let samples = vec![
            BandSample::new(day(10)).with_band("red", Some(0.1)),
            BandSample::new(day(0))
                .with_band("red", Some(0.2))
                .with_band("nir", Some(0.5)),
            BandSample::new(day(10))
                .with_band("red", Some(0.9))
                .with_band("nir", Some(0.6)),
        ];
        let input = PixelSeries::new(PixelId::new(0.0, 0.0), samples);
        let series = SeriesBuilder::new(&config(&["red", "nir"]))
            .build(&input)
            .unwrap();

        let stamps: Vec<i64> = series.timestamps().collect();
        assert_eq!(stamps.len(), 2);
        assert!(stamps[0] < stamps[1]);
        let merged = &series.observations()[1];
        assert_eq!(merged.band("red"), Some(0.1));
        assert_eq!(merged.band("nir"), Some(0.6));
    }

    #[test]
    fn incomplete_rows_dropped_on_request() {
        let samples = vec![
            BandSample::new(day(0))
                .with_band("red", Some(0.2))
                .with_band("nir", Some(0.5)),
            BandSample::new(day(1)).with_band("red", Some(0.2)),
            BandSample::new(day(2))
                .with_band("red", Some(0.3))
                .with_band("nir", Some(0.4)),
        ];
        let input = PixelSeries::new(PixelId::new(0.0, 0.0), samples);

        let kept = SeriesBuilder::new(&config(&["red", "nir"]))
            .build(&input)
            .unwrap();
        assert_eq!(kept.len(), 3);

        let mut strict = config(&["red", "nir"]);
        strict.drop_incomplete_rows = true;
        let dropped = SeriesBuilder::new(&strict).build(&input).unwrap();
        assert_eq!(dropped.len(), 2);
    }
}
