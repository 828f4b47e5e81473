pub mod colour;
pub mod index;
pub mod series;
pub mod trend;

pub use colour::{ColourEnrichment, PointColours};
pub use index::{normalized_difference, IndexCalculator};
pub use series::{Observation, Series, SeriesBuilder};
pub use trend::{HarmonicModel, TrendEnrichment};
