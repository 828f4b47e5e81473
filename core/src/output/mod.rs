pub mod writer;

pub use writer::{read_intervals, IntervalWriter, WriteError};
