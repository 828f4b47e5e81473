use anyhow::Context;
use disturbcore::annotation::{AnnotationSession, Interval, MarkerLayer};
use disturbcore::imagery::PixelId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

fn inside_default() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScriptedClick {
    pub x: f64,
    #[serde(default = "inside_default")]
    pub inside: bool,
}

/// Recorded clicks per pixel, keyed by `"<x>_<y>"`, for non-interactive runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClickScript {
    #[serde(default)]
    pub pixels: BTreeMap<String, Vec<ScriptedClick>>,
}

impl ClickScript {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading click script {}", path_ref.display()))?;
        serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing click script {}", path_ref.display()))
    }

    /// Feeds the pixel's clicks through a session, as if the analyst then closed the plot.
    pub fn annotate(&self, pixel: PixelId) -> Vec<Interval> {
        let mut session = AnnotationSession::new(MarkerLayer::new());
        for click in self.pixels.get(&pixel.key()).into_iter().flatten() {
            session.record_click(click.x, click.inside);
        }
        session.finish()
    }
}
