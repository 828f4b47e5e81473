use crate::gui_bridge::model::{IntervalSubmission, PixelReply, PlotModel};
use crate::workflow::runner::Runner;
use disturbcore::imagery::{PixelId, PixelSeries, PixelStack};
use serde_json::json;
use std::{
    net::SocketAddr,
    path::PathBuf,
    sync::{Arc, PoisonError, RwLock},
    thread,
};
use tokio::runtime::Builder;
use warp::{http::StatusCode, Filter};

#[derive(Debug)]
pub enum SubmitError {
    /// The submission names a pixel other than the one being annotated.
    Stale { expected: Option<PixelId> },
    Write(anyhow::Error),
}

/// Serial queue of pixels handed to the annotator one at a time.
pub struct BridgeState {
    pixels: Vec<PixelSeries>,
    cursor: usize,
    current: Option<PlotModel>,
}

impl BridgeState {
    pub fn new(stack: PixelStack, runner: &Runner) -> Self {
        let mut state = Self {
            pixels: stack.pixels,
            cursor: 0,
            current: None,
        };
        state.settle(runner);
        state
    }

    /// Moves the cursor to the next pixel that survives preparation.
    fn settle(&mut self, runner: &Runner) {
        self.current = None;
        let (b1, b2) = &runner.config().pipeline.index_bands;
        let label = format!("({b2} - {b1}) / ({b2} + {b1})");

        while let Some(input) = self.pixels.get(self.cursor) {
            match runner.prepare(input) {
                Ok(prepared) => {
                    self.current = Some(PlotModel::from_prepared(
                        &prepared,
                        &label,
                        self.cursor + 1,
                        self.pixels.len(),
                    ));
                    return;
                }
                Err(err) => {
                    if err.is_skip() {
                        runner.record_skip(input.pixel, &err.to_string());
                    } else {
                        log::error!("pixel {} rejected: {}", input.pixel.key(), err);
                    }
                    self.cursor += 1;
                }
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        self.current.is_none()
    }

    pub fn reply(&self, runner: &Runner) -> PixelReply {
        match &self.current {
            Some(model) => PixelReply::Ready {
                model: model.clone(),
            },
            None => {
                let metrics = runner.metrics();
                PixelReply::Complete {
                    annotated: metrics.annotated,
                    skipped: metrics.skipped,
                }
            }
        }
    }

    /// Writes the submitted intervals and advances; a failed write leaves the pixel current.
    pub fn submit(
        &mut self,
        runner: &Runner,
        submission: &IntervalSubmission,
    ) -> Result<PathBuf, SubmitError> {
        let expected = self.current.as_ref().map(|model| model.pixel);
        if expected != Some(submission.pixel) {
            return Err(SubmitError::Stale { expected });
        }

        let path = runner
            .write(submission.pixel, &submission.intervals)
            .map_err(SubmitError::Write)?;
        self.cursor += 1;
        self.settle(runner);
        Ok(path)
    }
}

/// Hosts the annotator HTTP endpoint over a pixel queue.
pub struct GuiBridge {
    state: Arc<RwLock<BridgeState>>,
    runner: Arc<Runner>,
}

impl GuiBridge {
    pub fn new(runner: Arc<Runner>, stack: PixelStack) -> Self {
        let state = Arc::new(RwLock::new(BridgeState::new(stack, &runner)));
        Self { state, runner }
    }

    /// Starts serving `GET /pixel` and `POST /intervals` on a background thread.
    pub fn serve(&self, addr: SocketAddr) {
        let state_for_filter = self.state.clone();
        let state_filter = warp::any().map(move || state_for_filter.clone());
        let runner = self.runner.clone();
        let runner_filter = warp::any().map(move || runner.clone());

        let get_route = warp::path("pixel")
            .and(warp::get())
            .and(state_filter.clone())
            .and(runner_filter.clone())
            .map(|state: Arc<RwLock<BridgeState>>, runner: Arc<Runner>| {
                let guard = state.read().unwrap_or_else(PoisonError::into_inner);
                warp::reply::json(&guard.reply(&runner))
            });

        let post_route = warp::path("intervals")
            .and(warp::post())
            .and(warp::body::json())
            .and(state_filter)
            .and(runner_filter)
            .map(
                |submission: IntervalSubmission,
                 state: Arc<RwLock<BridgeState>>,
                 runner: Arc<Runner>| {
                    let mut guard = state.write().unwrap_or_else(PoisonError::into_inner);
                    match guard.submit(&runner, &submission) {
                        Ok(path) => warp::reply::with_status(
                            warp::reply::json(&json!({
                                "status": "ok",
                                "path": path.display().to_string(),
                            })),
                            StatusCode::OK,
                        ),
                        Err(SubmitError::Stale { expected }) => warp::reply::with_status(
                            warp::reply::json(&json!({
                                "status": "stale",
                                "expected": expected.map(|pixel| pixel.key()),
                            })),
                            StatusCode::CONFLICT,
                        ),
                        Err(SubmitError::Write(err)) => {
                            log::error!("{:#}", err);
                            warp::reply::with_status(
                                warp::reply::json(&json!({
                                    "status": "error",
                                    "message": format!("{:#}", err),
                                })),
                                StatusCode::INTERNAL_SERVER_ERROR,
                            )
                        }
                    }
                },
            );

        thread::spawn(move || {
            let routes = get_route.or(post_route);
            let runtime = match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(err) => {
                    log::error!("failed to build bridge runtime: {}", err);
                    return;
                }
            };
            runtime.block_on(async move {
                warp::serve(routes).run(addr).await;
            });
        });
    }

    pub fn is_complete(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_complete()
    }

    pub fn publish_status(&self, message: &str) {
        println!("[GUI] {}", message);
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> PixelReply {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .reply(&self.runner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::profile::{build_stack_from_config, GeneratorConfig};
    use crate::workflow::config::WorkflowConfig;
    use disturbcore::annotation::Interval;
    use disturbcore::output::read_intervals;
    use tempfile::tempdir;

    fn stack() -> PixelStack {
        build_stack_from_config(&GeneratorConfig {
            columns: 3,
            rows: 1,
            edge_column: true,
            seed: 5,
            ..Default::default()
        })
        .unwrap()
    }

    fn ready_pixel(reply: PixelReply) -> PixelId {
        match reply {
            PixelReply::Ready { model } => model.pixel,
            other => panic!("expected a ready pixel, got {:?}", other),
        }
    }

    #[test]
    fn bridge_walks_pixels_and_skips_edges() {
        let dir = tempdir().unwrap();
        let runner = Arc::new(Runner::new(WorkflowConfig::from_args(
            Some(dir.path().to_path_buf()),
            None,
        )));
        let stack = stack();
        let gui = GuiBridge::new(runner.clone(), stack.clone());

        let first = ready_pixel(gui.snapshot());
        assert_eq!(first, stack.pixels[0].pixel);

        let submission = IntervalSubmission {
            pixel: first,
            intervals: vec![Interval::new(730_000.0, 730_200.0)],
        };
        let path = gui.state.write().unwrap().submit(&runner, &submission).unwrap();
        assert_eq!(read_intervals(&path).unwrap(), submission.intervals);

        let second = ready_pixel(gui.snapshot());
        assert_eq!(second, stack.pixels[1].pixel);
        let submission = IntervalSubmission {
            pixel: second,
            intervals: Vec::new(),
        };
        gui.state.write().unwrap().submit(&runner, &submission).unwrap();

        // The third column is an image edge and gets skipped.
        assert!(gui.is_complete());
        assert_eq!(
            gui.snapshot(),
            PixelReply::Complete {
                annotated: 2,
                skipped: 1
            }
        );
    }

    #[test]
    fn pixel_survives_the_wire_round_trip() {
        let dir = tempdir().unwrap();
        let runner = Arc::new(Runner::new(WorkflowConfig::from_args(
            Some(dir.path().to_path_buf()),
            None,
        )));
        let stack = build_stack_from_config(&GeneratorConfig {
            columns: 1,
            rows: 1,
            origin_x: 3_700_822.236_981_055_7,
            origin_y: -1_963_585.908_020_904_8,
            seed: 5,
            ..Default::default()
        })
        .unwrap();
        let gui = GuiBridge::new(runner.clone(), stack);

        let served = serde_json::to_string(&gui.snapshot()).unwrap();
        let pixel = ready_pixel(serde_json::from_str(&served).unwrap());
        let posted = serde_json::to_string(&IntervalSubmission {
            pixel,
            intervals: vec![Interval::new(731_234.567_890_123, 731_600.25)],
        })
        .unwrap();
        let submission: IntervalSubmission = serde_json::from_str(&posted).unwrap();

        let path = gui.state.write().unwrap().submit(&runner, &submission).unwrap();
        assert_eq!(read_intervals(&path).unwrap(), submission.intervals);
        assert!(gui.is_complete());
    }

    #[test]
    fn stale_and_failed_submissions_keep_the_pixel() {
        let dir = tempdir().unwrap();
        let runner = Arc::new(Runner::new(WorkflowConfig::from_args(
            Some(dir.path().join("missing")),
            None,
        )));
        let gui = GuiBridge::new(runner.clone(), stack());
        let current = ready_pixel(gui.snapshot());

        let stale = IntervalSubmission {
            pixel: PixelId::new(-1.0, -1.0),
            intervals: Vec::new(),
        };
        assert!(matches!(
            gui.state.write().unwrap().submit(&runner, &stale),
            Err(SubmitError::Stale { .. })
        ));

        let unwritable = IntervalSubmission {
            pixel: current,
            intervals: vec![Interval::new(1.0, 2.0)],
        };
        assert!(matches!(
            gui.state.write().unwrap().submit(&runner, &unwritable),
            Err(SubmitError::Write(_))
        ));
        assert_eq!(ready_pixel(gui.snapshot()), current);
        assert_eq!(runner.metrics().write_failures, 1);
    }
}
