use crate::math::stats::StatsHelper;
use crate::prelude::{PipelineConfig, PipelineError, PipelineResult};
use crate::processing::series::Series;
use crate::telemetry::log::LogManager;

/// Normalized difference `(b2 - b1) / (b2 + b1)`.
///
/// Undefined when either input is missing or the denominator is zero.
pub fn normalized_difference(b1: Option<f64>, b2: Option<f64>) -> Option<f64> {
    let (b1, b2) = (b1?, b2?);
    let sum = b2 + b1;
    if sum == 0.0 {
        return None;
    }
    let value = (b2 - b1) / sum;
    value.is_finite().then_some(value)
}

/// Derives the vegetation index for every observation of a series.
pub struct IndexCalculator {
    b1: String,
    b2: String,
    drop_incomplete_rows: bool,
    logger: LogManager,
}

impl IndexCalculator {
    pub fn new(b1: &str, b2: &str) -> Self {
        Self {
            b1: b1.to_string(),
            b2: b2.to_string(),
            drop_incomplete_rows: false,
            logger: LogManager::new(),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            drop_incomplete_rows: config.drop_incomplete_rows,
            ..Self::new(&config.index_bands.0, &config.index_bands.1)
        }
    }

    pub fn compute(&self, series: Series) -> PipelineResult<Series> {
        if series.bands().len() < 2 {
            return Err(PipelineError::InsufficientBands {
                remaining: series.bands().len(),
            });
        }
        for band in [&self.b1, &self.b2] {
            if !series.has_band(band) {
                return Err(PipelineError::MissingIndexBand(band.clone()));
            }
        }

        let values: Vec<Option<f64>> = series
            .observations()
            .iter()
            .map(|obs| normalized_difference(obs.band(&self.b1), obs.band(&self.b2)))
            .collect();

        let defined = StatsHelper::count_defined(values.iter().copied());
        self.logger.record(&format!(
            "IndexCalculator {} defined {}/{}",
            series.pixel().key(),
            defined,
            values.len()
        ));

        let mut series = series.with_index(values);
        // An undefined index makes the row incomplete too.
        if self.drop_incomplete_rows {
            let dropped = series.drop_unindexed();
            self.logger.record(&format!(
                "IndexCalculator {} dropped {} unindexed row(s)",
                series.pixel().key(),
                dropped
            ));
        }
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imagery::{BandSample, PixelId, PixelSeries};
    use crate::processing::series::SeriesBuilder;
    use chrono::NaiveDate;

    fn build(rows: &[(Option<f64>, Option<f64>)]) -> Series {
        let start = NaiveDate::from_ymd_opt(2010, 3, 1).unwrap();
        let samples = rows
            .iter()
            .enumerate()
            .map(|(i, (red, nir))| {
                BandSample::new(start + chrono::Duration::days(i as i64 * 16))
                    .with_band("red", *red)
                    .with_band("nir", *nir)
            })
            .collect();
        SeriesBuilder::new(&PipelineConfig::default())
            .build(&PixelSeries::new(PixelId::new(10.0, 20.0), samples))
            .unwrap()
    }

    #[test]
    fn computes_normalized_difference() {
        let series = build(&[(Some(0.1), Some(0.5)), (Some(0.3), Some(0.1))]);
        let series = IndexCalculator::new("red", "nir").compute(series).unwrap();
        let index: Vec<Option<f64>> = series
            .observations()
            .iter()
            .map(|obs| obs.derived_index)
            .collect();
        assert!((index[0].unwrap() - 0.4 / 0.6).abs() < 1e-12);
        assert!((index[1].unwrap() + 0.5).abs() < 1e-12);
    }

    #[test]
    fn zero_denominator_is_missing_not_an_error() {
        let series = build(&[
            (Some(0.0), Some(0.0)),
            (Some(0.2), Some(0.6)),
            (None, Some(0.4)),
        ]);
        let series = IndexCalculator::new("red", "nir").compute(series).unwrap();
        let obs = series.observations();
        assert_eq!(obs[0].derived_index, None);
        assert!(obs[1].derived_index.is_some());
        assert_eq!(obs[2].derived_index, None);
        assert_eq!(series.plot_points().len(), 1);
    }

    #[test]
    fn undefined_index_rows_follow_the_completeness_flag() {
        let rows = [
            (Some(0.0), Some(0.0)),
            (Some(0.2), Some(0.6)),
            (Some(0.1), Some(0.3)),
        ];

        let kept = IndexCalculator::new("red", "nir")
            .compute(build(&rows))
            .unwrap();
        assert_eq!(kept.len(), 3);

        let strict = PipelineConfig {
            drop_incomplete_rows: true,
            ..Default::default()
        };
        let dropped = IndexCalculator::from_config(&strict)
            .compute(build(&rows))
            .unwrap();
        assert_eq!(dropped.len(), 2);
        assert!(dropped
            .observations()
            .iter()
            .all(|obs| obs.derived_index.is_some()));
    }

    #[test]
    fn opposite_signs_summing_to_zero_are_missing() {
        assert_eq!(normalized_difference(Some(-0.2), Some(0.2)), None);
    }

    #[test]
    fn single_band_series_is_a_skip() {
        let series = build(&[(None, Some(0.4)), (None, Some(0.5))]);
        let err = IndexCalculator::new("red", "nir")
            .compute(series)
            .unwrap_err();
        assert_eq!(err, PipelineError::InsufficientBands { remaining: 1 });
        assert!(err.is_skip());
    }
}
