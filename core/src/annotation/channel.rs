use crate::annotation::session::{AnnotationSession, Interval, PlotSurface};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Event delivered by a plot surface running off the session's thread.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClickEvent {
    Click { x: f64, inside: bool },
    Close,
}

/// Owns a session and applies clicks in arrival order until the plot closes.
///
/// The plot counts as closed on `ClickEvent::Close` or once every sender is dropped.
pub async fn run_session<S: PlotSurface>(
    mut events: mpsc::UnboundedReceiver<ClickEvent>,
    surface: S,
) -> Vec<Interval> {
    let mut session = AnnotationSession::new(surface);
    while let Some(event) = events.recv().await {
        match event {
            ClickEvent::Click { x, inside } => session.record_click(x, inside),
            ClickEvent::Close => break,
        }
    }
    session.finish()
}
