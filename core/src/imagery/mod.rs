pub mod calendar;
pub mod sample;

pub use sample::{BandSample, PixelId, PixelSeries, PixelStack};
