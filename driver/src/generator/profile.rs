use crate::generator::template::{reflectance_pair, seasonal_index};
use anyhow::{ensure, Context};
use chrono::NaiveDate;
use disturbcore::imagery::calendar;
use disturbcore::imagery::{BandSample, PixelId, PixelSeries, PixelStack};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Configuration for generating synthetic red/NIR pixel stacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub columns: usize,
    pub rows: usize,
    pub origin_x: f64,
    pub origin_y: f64,
    pub pixel_size: f64,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub revisit_days: i64,
    pub noise: f64,
    /// Share of acquisitions masked out (cloud, no-data).
    pub gap_fraction: f64,
    /// Share of acquisitions also seen by a second sensor on the same day.
    pub duplicate_fraction: f64,
    /// Inject a disturbance drop with gradual recovery into every other pixel.
    pub disturbance: bool,
    /// Make the last column behave like an image edge with no NIR data.
    pub edge_column: bool,
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            columns: 2,
            rows: 2,
            origin_x: 1_523_400.0,
            origin_y: -3_842_970.0,
            pixel_size: 25.0,
            start: NaiveDate::from_ymd_opt(1995, 1, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2016, 12, 31).unwrap_or_default(),
            revisit_days: 16,
            noise: 0.02,
            gap_fraction: 0.2,
            duplicate_fraction: 0.05,
            disturbance: true,
            edge_column: false,
            seed: 0,
        }
    }
}

impl GeneratorConfig {
    fn acquisition_dates(&self) -> anyhow::Result<Vec<NaiveDate>> {
        ensure!(self.revisit_days > 0, "revisit_days must be positive");
        ensure!(self.start <= self.end, "generator start must not follow end");
        let step = chrono::Duration::days(self.revisit_days);
        let mut dates = Vec::new();
        let mut date = self.start;
        while date <= self.end {
            dates.push(date);
            date = date
                .checked_add_signed(step)
                .context("date overflow while stepping acquisitions")?;
        }
        Ok(dates)
    }
}

/// Disturbance window as ordinal days: drop at `start`, fully recovered at `recovered`.
struct Disturbance {
    start: f64,
    recovered: f64,
    depth: f64,
}

impl Disturbance {
    fn effect(&self, ordinal: f64) -> f64 {
        if ordinal < self.start || ordinal >= self.recovered {
            return 0.0;
        }
        let progress = (ordinal - self.start) / (self.recovered - self.start);
        -self.depth * (1.0 - progress)
    }
}

fn build_pixel(
    config: &GeneratorConfig,
    dates: &[NaiveDate],
    pixel: PixelId,
    disturbance: Option<&Disturbance>,
    edge: bool,
    rng: &mut StdRng,
) -> PixelSeries {
    let mean = rng.gen_range(0.45..0.6);
    let amplitude = rng.gen_range(0.1..0.2);
    let mut samples = Vec::with_capacity(dates.len());

    for &date in dates {
        if rng.gen_bool(config.gap_fraction.clamp(0.0, 1.0)) {
            samples.push(
                BandSample::new(date)
                    .with_band("red", None)
                    .with_band("nir", None),
            );
            continue;
        }

        let ordinal = calendar::to_ordinal(date) as f64;
        let mut index = seasonal_index(ordinal, mean, amplitude);
        if let Some(disturbance) = disturbance {
            index += disturbance.effect(ordinal);
        }
        let jitter = if config.noise > 0.0 {
            rng.gen_range(-config.noise..config.noise)
        } else {
            0.0
        };
        let (red, nir) = reflectance_pair(index + jitter, rng.gen_range(0.03..0.08));
        samples.push(
            BandSample::new(date)
                .with_band("red", Some(red))
                .with_band("nir", if edge { None } else { Some(nir) }),
        );

        if rng.gen_bool(config.duplicate_fraction.clamp(0.0, 1.0)) {
            let (red, nir) = reflectance_pair(index, rng.gen_range(0.03..0.08));
            samples.push(
                BandSample::new(date)
                    .with_band("red", Some(red))
                    .with_band("nir", if edge { None } else { Some(nir) }),
            );
        }
    }

    PixelSeries::new(pixel, samples)
}

pub fn build_stack_from_config(config: &GeneratorConfig) -> anyhow::Result<PixelStack> {
    let dates = config.acquisition_dates()?;
    let first = dates.first().copied().context("generator produced no dates")?;
    let last = dates.last().copied().context("generator produced no dates")?;
    let (first, last) = (
        calendar::to_ordinal(first) as f64,
        calendar::to_ordinal(last) as f64,
    );

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut pixels = Vec::with_capacity(config.columns * config.rows);

    for row in 0..config.rows {
        for col in 0..config.columns {
            let pixel = PixelId::new(
                config.origin_x + col as f64 * config.pixel_size,
                config.origin_y - row as f64 * config.pixel_size,
            );
            let disturbance = (config.disturbance && (row * config.columns + col) % 2 == 0)
                .then(|| {
                    let start = rng.gen_range(first..(first + (last - first) * 0.7).max(first + 1.0));
                    Disturbance {
                        start,
                        recovered: start + rng.gen_range(365.0..1460.0),
                        depth: rng.gen_range(0.2..0.4),
                    }
                });
            let edge = config.edge_column && col + 1 == config.columns;
            pixels.push(build_pixel(
                config,
                &dates,
                pixel,
                disturbance.as_ref(),
                edge,
                &mut rng,
            ));
        }
    }

    Ok(PixelStack { pixels })
}
