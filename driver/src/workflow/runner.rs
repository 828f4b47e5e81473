use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use disturbcore::annotation::Interval;
use disturbcore::imagery::{PixelId, PixelSeries, PixelStack};
use disturbcore::output::IntervalWriter;
use disturbcore::prelude::{Enriched, PipelineResult};
use disturbcore::processing::{
    ColourEnrichment, IndexCalculator, PointColours, Series, SeriesBuilder, TrendEnrichment,
};
use disturbcore::telemetry::{LogManager, Metrics, MetricsRecorder};
use std::path::PathBuf;
use std::sync::Arc;

/// A pixel ready for annotation: indexed series plus optional overlays.
#[derive(Debug, Clone)]
pub struct PreparedPixel {
    pub series: Series,
    pub colours: Enriched<PointColours>,
    pub trend: Enriched<Vec<(f64, f64)>>,
}

impl PreparedPixel {
    pub fn pixel(&self) -> PixelId {
        self.series.pixel()
    }
}

/// Outcome of one pixel in a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelOutcome {
    Written { path: PathBuf, intervals: usize },
    Skipped(String),
    WriteFailed(String),
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
    metrics: Arc<MetricsRecorder>,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self {
            config,
            metrics: Arc::new(MetricsRecorder::new()),
        }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn metrics(&self) -> Metrics {
        self.metrics.snapshot()
    }

    /// Series build, index and enrichments for one pixel.
    pub fn prepare(&self, input: &PixelSeries) -> PipelineResult<PreparedPixel> {
        let pipeline = self.config.pipeline_config();

        let series = SeriesBuilder::new(pipeline).build(input)?;
        let series = IndexCalculator::from_config(pipeline).compute(series)?;

        let colours = match &pipeline.colour_bands {
            Some(bands) => Enriched::from_stage(&ColourEnrichment::new(bands.clone()), &series),
            None => Enriched::Absent("colour bands not configured".into()),
        };
        let trend = match &pipeline.trend {
            Some(trend) => Enriched::from_stage(&TrendEnrichment::new(trend.clone()), &series),
            None => Enriched::Absent("trend overlay disabled".into()),
        };

        Ok(PreparedPixel {
            series,
            colours,
            trend,
        })
    }

    /// Persists the analyst's intervals for `pixel`.
    pub fn write(&self, pixel: PixelId, intervals: &[Interval]) -> anyhow::Result<PathBuf> {
        let writer = IntervalWriter::new(&self.config.output_dir);
        match writer.write(pixel, intervals) {
            Ok(path) => {
                log::info!(
                    "wrote {} interval(s) for {} to {}",
                    intervals.len(),
                    pixel.key(),
                    path.display()
                );
                self.metrics.record_annotated(intervals.len());
                Ok(path)
            }
            Err(err) => {
                self.metrics.record_write_failure();
                Err(err).with_context(|| format!("saving intervals for pixel {}", pixel.key()))
            }
        }
    }

    pub fn record_skip(&self, pixel: PixelId, reason: &str) {
        LogManager::new().skip(&pixel.key(), reason);
        self.metrics.record_skipped();
    }

    /// Runs every pixel in order, suspending in `annotate` for each one.
    ///
    /// Skip conditions and write failures are logged and do not stop the batch.
    pub fn run_batch<F>(&self, stack: &PixelStack, mut annotate: F) -> anyhow::Result<Vec<PixelOutcome>>
    where
        F: FnMut(&PreparedPixel) -> anyhow::Result<Vec<Interval>>,
    {
        let mut outcomes = Vec::with_capacity(stack.len());
        for input in &stack.pixels {
            let prepared = match self.prepare(input) {
                Ok(prepared) => prepared,
                Err(err) if err.is_skip() => {
                    self.record_skip(input.pixel, &err.to_string());
                    outcomes.push(PixelOutcome::Skipped(err.to_string()));
                    continue;
                }
                Err(err) => {
                    return Err(err).with_context(|| format!("preparing pixel {}", input.pixel.key()))
                }
            };

            let intervals = annotate(&prepared)
                .with_context(|| format!("annotating pixel {}", input.pixel.key()))?;

            match self.write(input.pixel, &intervals) {
                Ok(path) => outcomes.push(PixelOutcome::Written {
                    path,
                    intervals: intervals.len(),
                }),
                Err(err) => {
                    log::error!("{:#}", err);
                    outcomes.push(PixelOutcome::WriteFailed(format!("{:#}", err)));
                }
            }
        }
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::profile::{build_stack_from_config, GeneratorConfig};
    use disturbcore::imagery::BandSample;
    use disturbcore::output::read_intervals;
    use tempfile::tempdir;

    fn generator() -> GeneratorConfig {
        GeneratorConfig {
            columns: 2,
            rows: 1,
            edge_column: true,
            seed: 11,
            ..Default::default()
        }
    }

    #[test]
    fn runner_prepares_indexed_series_with_trend() {
        let stack = build_stack_from_config(&generator()).unwrap();
        let runner = Runner::new(WorkflowConfig::default());
        let prepared = runner.prepare(&stack.pixels[0]).unwrap();
        assert!(!prepared.series.plot_points().is_empty());
        assert!(prepared.trend.is_present());
        assert!(!prepared.colours.is_present());
    }

    fn sparse_pixel(rows: &[(f64, f64, f64)]) -> PixelSeries {
        let start = chrono::NaiveDate::from_ymd_opt(2008, 4, 1).unwrap();
        let samples = rows
            .iter()
            .enumerate()
            .map(|(i, &(red, nir, swir1))| {
                BandSample::new(start + chrono::Duration::days(i as i64 * 16))
                    .with_band("red", Some(red))
                    .with_band("nir", Some(nir))
                    .with_band("swir1", Some(swir1))
            })
            .collect();
        PixelSeries::new(PixelId::new(1_500_000.0, -3_950_000.0), samples)
    }

    #[test]
    fn failed_trend_fit_still_prepares_the_pixel() {
        let runner = Runner::new(WorkflowConfig::default());
        let input = sparse_pixel(&[(0.05, 0.4, 0.2), (0.06, 0.35, 0.2), (0.04, 0.45, 0.2)]);

        let prepared = runner.prepare(&input).unwrap();
        assert_eq!(prepared.series.plot_points().len(), 3);
        assert!(matches!(prepared.trend, Enriched::Absent(_)));
    }

    #[test]
    fn degenerate_colour_band_still_prepares_the_pixel() {
        let mut config = WorkflowConfig::default();
        config.pipeline.bands = vec!["red".into(), "nir".into(), "swir1".into()];
        config.pipeline.colour_bands = Some(["swir1".into(), "nir".into(), "red".into()]);
        let runner = Runner::new(config);
        let input = sparse_pixel(&[
            (0.05, 0.4, 0.2),
            (0.06, 0.35, 0.2),
            (0.04, 0.45, 0.2),
            (0.07, 0.30, 0.2),
            (0.05, 0.42, 0.2),
        ]);

        let prepared = runner.prepare(&input).unwrap();
        assert_eq!(prepared.series.plot_points().len(), 5);
        assert!(matches!(prepared.colours, Enriched::Absent(_)));
    }

    #[test]
    fn batch_skips_edge_pixel_and_writes_the_rest() {
        let dir = tempdir().unwrap();
        let stack = build_stack_from_config(&generator()).unwrap();
        let config = WorkflowConfig::from_args(Some(dir.path().to_path_buf()), None);
        let runner = Runner::new(config);

        let outcomes = runner
            .run_batch(&stack, |prepared| {
                let first = prepared.series.plot_points()[0].0;
                Ok(vec![Interval::new(first, first + 100.0)])
            })
            .unwrap();

        assert_eq!(outcomes.len(), 2);
        let PixelOutcome::Written { path, intervals } = &outcomes[0] else {
            panic!("first pixel should be written: {:?}", outcomes[0]);
        };
        assert_eq!(*intervals, 1);
        assert_eq!(read_intervals(path).unwrap().len(), 1);
        assert!(matches!(outcomes[1], PixelOutcome::Skipped(_)));

        let metrics = runner.metrics();
        assert_eq!(metrics.annotated, 1);
        assert_eq!(metrics.skipped, 1);
    }

    #[test]
    fn write_failure_does_not_stop_batch() {
        let dir = tempdir().unwrap();
        let mut gen = generator();
        gen.edge_column = false;
        let stack = build_stack_from_config(&gen).unwrap();
        let config = WorkflowConfig::from_args(Some(dir.path().join("absent")), None);
        let runner = Runner::new(config);

        let outcomes = runner.run_batch(&stack, |_| Ok(Vec::new())).unwrap();
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes
            .iter()
            .all(|outcome| matches!(outcome, PixelOutcome::WriteFailed(_))));
        assert_eq!(runner.metrics().write_failures, 2);
    }
}
