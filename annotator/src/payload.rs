use disturbcore::annotation::Interval;
use disturbcore::imagery::PixelId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PixelReply {
    Ready { model: PixelPayload },
    Complete { annotated: usize, skipped: usize },
}

#[derive(Debug, Clone, Deserialize)]
pub struct PixelPayload {
    pub pixel: PixelId,
    #[serde(default)]
    pub position: usize,
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub index_label: String,
    #[serde(default)]
    pub points: Vec<PlotPoint>,
    #[serde(default)]
    pub trend: Option<Vec<(f64, f64)>>,
    #[serde(default)]
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PlotPoint {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub colour: Option<[f64; 3]>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IntervalSubmission {
    pub pixel: PixelId,
    pub intervals: Vec<Interval>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_reply_parses_without_optional_fields() {
        let json = r#"{"status":"ready","model":{"pixel":{"x":1.0,"y":2.0},
            "points":[{"x":730120.0,"y":0.5}]}}"#;
        let reply: PixelReply = serde_json::from_str(json).unwrap();
        let PixelReply::Ready { model } = reply else {
            panic!("expected ready reply");
        };
        assert_eq!(model.points.len(), 1);
        assert!(model.trend.is_none());
        assert!(model.points[0].colour.is_none());
    }

    #[test]
    fn complete_reply_parses() {
        let reply: PixelReply =
            serde_json::from_str(r#"{"status":"complete","annotated":3,"skipped":1}"#).unwrap();
        assert!(matches!(
            reply,
            PixelReply::Complete {
                annotated: 3,
                skipped: 1
            }
        ));
    }
}
