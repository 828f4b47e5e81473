use crate::math::{MatrixHelper, StatsHelper};
use crate::prelude::{Enrichment, PipelineError, PipelineResult, TrendConfig};
use crate::processing::series::Series;
use ndarray::{Array1, Array2};
use std::f64::consts::PI;

const COEFFICIENTS: usize = 4;

/// Fitted `c0 + c1·cos(2πt/P) + c2·sin(2πt/P) + c3·t` curve.
///
/// `t` is measured in days from `origin` so the linear term stays well scaled.
#[derive(Debug, Clone, PartialEq)]
pub struct HarmonicModel {
    pub coefficients: [f64; COEFFICIENTS],
    pub period_days: f64,
    pub origin: f64,
}

impl HarmonicModel {
    fn design_row(period_days: f64, origin: f64, timestamp: f64) -> [f64; COEFFICIENTS] {
        let angle = 2.0 * PI * timestamp / period_days;
        [1.0, angle.cos(), angle.sin(), timestamp - origin]
    }

    /// Least-squares fit over the observations with a defined index.
    pub fn fit(series: &Series, period_days: f64) -> PipelineResult<Self> {
        if !(period_days.is_finite() && period_days > 0.0) {
            return Err(PipelineError::InvalidInput(format!(
                "trend period must be positive, got {period_days}"
            )));
        }

        let points = series.plot_points();
        if points.len() < COEFFICIENTS {
            return Err(PipelineError::TrendFit(format!(
                "{} defined observation(s), need at least {}",
                points.len(),
                COEFFICIENTS
            )));
        }

        let origin = points[0].0;
        let mut design = Array2::<f64>::zeros((points.len(), COEFFICIENTS));
        for (mut row, &(t, _)) in design.rows_mut().into_iter().zip(&points) {
            for (cell, value) in row.iter_mut().zip(Self::design_row(period_days, origin, t)) {
                *cell = value;
            }
        }
        let target: Array1<f64> = points.iter().map(|&(_, value)| value).collect();

        let beta = MatrixHelper::least_squares(design.view(), target.view())
            .ok_or_else(|| PipelineError::TrendFit("singular design matrix".into()))?;

        let mut coefficients = [0.0; COEFFICIENTS];
        for (slot, value) in coefficients.iter_mut().zip(beta.iter()) {
            *slot = *value;
        }

        Ok(Self {
            coefficients,
            period_days,
            origin,
        })
    }

    pub fn evaluate(&self, timestamp: f64) -> f64 {
        Self::design_row(self.period_days, self.origin, timestamp)
            .iter()
            .zip(self.coefficients.iter())
            .map(|(x, c)| x * c)
            .sum()
    }

    /// Samples the curve at `points` evenly spaced positions over `[start, end]`.
    pub fn resample(&self, start: f64, end: f64, points: usize) -> Vec<(f64, f64)> {
        StatsHelper::linspace(start, end, points)
            .into_iter()
            .map(|t| (t, self.evaluate(t)))
            .collect()
    }
}

/// Seasonal-trend overlay drawn behind the index points.
pub struct TrendEnrichment {
    config: TrendConfig,
}

impl TrendEnrichment {
    pub fn new(config: TrendConfig) -> Self {
        Self { config }
    }
}

impl Enrichment for TrendEnrichment {
    type Output = Vec<(f64, f64)>;

    fn name(&self) -> &'static str {
        "trend"
    }

    fn apply(&self, series: &Series) -> PipelineResult<Vec<(f64, f64)>> {
        let model = HarmonicModel::fit(series, self.config.period_days)?;
        let (start, end) = match (series.timestamps().next(), series.timestamps().last()) {
            (Some(start), Some(end)) => (start as f64, end as f64),
            _ => return Err(PipelineError::TrendFit("empty series".into())),
        };
        Ok(model.resample(start, end, self.config.grid_points))
    }
}
