use crate::workflow::runner::PreparedPixel;
use disturbcore::annotation::Interval;
use disturbcore::imagery::PixelId;
use serde::{Deserialize, Serialize};

/// Index sample as drawn on the plot; `colour` is RGB in `[0, 1]` when colour-coding is on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotPoint {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colour: Option<[f64; 3]>,
}

/// Everything the annotator needs to render one pixel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotModel {
    pub pixel: PixelId,
    pub position: usize,
    pub total: usize,
    pub index_label: String,
    pub points: Vec<PlotPoint>,
    #[serde(default)]
    pub trend: Option<Vec<(f64, f64)>>,
    #[serde(default)]
    pub notes: Vec<String>,
}

impl PlotModel {
    pub fn from_prepared(
        prepared: &PreparedPixel,
        index_label: &str,
        position: usize,
        total: usize,
    ) -> Self {
        let colours = prepared.colours.as_present();
        let points = prepared
            .series
            .observations()
            .iter()
            .enumerate()
            .filter_map(|(idx, obs)| {
                obs.derived_index.map(|y| PlotPoint {
                    x: obs.timestamp as f64,
                    y,
                    colour: colours.and_then(|c| c.get(idx).copied().flatten()),
                })
            })
            .collect();

        let mut notes = Vec::new();
        for (name, reason) in [
            ("colour", absent_reason(&prepared.colours)),
            ("trend", absent_reason(&prepared.trend)),
        ] {
            if let Some(reason) = reason {
                notes.push(format!("{name} omitted: {reason}"));
            }
        }

        Self {
            pixel: prepared.pixel(),
            position,
            total,
            index_label: index_label.to_string(),
            points,
            trend: prepared.trend.as_present().cloned(),
            notes,
        }
    }
}

fn absent_reason<T>(enriched: &disturbcore::Enriched<T>) -> Option<&str> {
    match enriched {
        disturbcore::Enriched::Present(_) => None,
        disturbcore::Enriched::Absent(reason) => Some(reason.as_str()),
    }
}

/// Reply to `GET /pixel`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PixelReply {
    Ready { model: PlotModel },
    Complete { annotated: usize, skipped: usize },
}

/// Body of `POST /intervals`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalSubmission {
    pub pixel: PixelId,
    pub intervals: Vec<Interval>,
}
