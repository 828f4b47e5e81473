//! Time-series derivation and interval annotation for manual disturbance mapping.
//!
//! A pixel's multi-band series is reshaped into observations, reduced to a
//! normalized-difference index, optionally enriched with colours and a
//! seasonal-trend overlay, then annotated interactively into start/end
//! intervals that are written to a per-pixel artifact.

pub mod annotation;
pub mod imagery;
pub mod math;
pub mod output;
pub mod prelude;
pub mod processing;
pub mod telemetry;

pub use annotation::{AnnotationSession, Interval, PlotSurface};
pub use prelude::{Enriched, Enrichment, PipelineConfig, PipelineError, PipelineResult};
