use crate::annotation::Interval;
use crate::imagery::PixelId;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum WriteError {
    #[error("writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("writing {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("{path} line {line}: {reason}")]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

/// Writes one space-delimited `start end` line per interval, no header.
pub struct IntervalWriter {
    output_dir: PathBuf,
}

impl IntervalWriter {
    pub fn new<P: Into<PathBuf>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `<x>_<y>.csv` inside the output directory.
    pub fn path_for(&self, pixel: PixelId) -> PathBuf {
        self.output_dir.join(format!("{}.csv", pixel.key()))
    }

    /// Writes the artifact for `pixel`; an empty list still yields an empty file.
    pub fn write(&self, pixel: PixelId, intervals: &[Interval]) -> Result<PathBuf, WriteError> {
        let path = self.path_for(pixel);
        let csv_err = |source: csv::Error| WriteError::Csv {
            path: path.clone(),
            source,
        };

        let mut writer = csv::WriterBuilder::new()
            .delimiter(b' ')
            .has_headers(false)
            .from_path(&path)
            .map_err(csv_err)?;
        for interval in intervals {
            writer
                .write_record([format!("{:?}", interval.start), format!("{:?}", interval.end)])
                .map_err(csv_err)?;
        }
        writer.flush().map_err(|source| WriteError::Io {
            path: path.clone(),
            source,
        })?;

        Ok(path)
    }
}

/// Parses an artifact back into intervals, splitting each line on whitespace.
pub fn read_intervals(path: &Path) -> Result<Vec<Interval>, WriteError> {
    let contents = fs::read_to_string(path).map_err(|source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            let parse_err = |reason: String| WriteError::Parse {
                path: path.to_path_buf(),
                line: idx + 1,
                reason,
            };
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() != 2 {
                return Err(parse_err(format!("expected 2 fields, found {}", fields.len())));
            }
            let start = fields[0]
                .parse::<f64>()
                .map_err(|err| parse_err(err.to_string()))?;
            let end = fields[1]
                .parse::<f64>()
                .map_err(|err| parse_err(err.to_string()))?;
            Ok(Interval::new(start, end))
        })
        .collect()
}
