use disturbcore::annotation::{AnnotationSession, MarkerLayer, SessionState};
use iced::{
    time,
    widget::{button, column, row, scrollable, text, Canvas, Column, Container},
    Alignment, Element, Length, Subscription, Task, Theme,
};
use payload::{IntervalSubmission, PixelPayload, PixelReply};
use plot::PlotCanvas;
use std::time::Duration;

mod payload;
mod plot;

const DEFAULT_BRIDGE: &str = "http://127.0.0.1:9000";

fn main() -> iced::Result {
    iced::application(Annotator::boot, Annotator::update, Annotator::view)
        .title(application_title)
        .subscription(application_subscription)
        .theme(application_theme)
        .run()
}

fn application_title(state: &Annotator) -> String {
    match &state.payload {
        Some(payload) => format!("Disturbance annotator - {}", payload.pixel.key()),
        None => "Disturbance annotator".into(),
    }
}

fn application_subscription(_: &Annotator) -> Subscription<Message> {
    time::every(Duration::from_secs(2)).map(|_| Message::Tick)
}

fn application_theme(_: &Annotator) -> Theme {
    Theme::Dark
}

fn bridge_url() -> String {
    std::env::var("ANNOTATOR_BRIDGE").unwrap_or_else(|_| DEFAULT_BRIDGE.into())
}

struct Annotator {
    bridge: String,
    payload: Option<PixelPayload>,
    session: Option<AnnotationSession<MarkerLayer>>,
    status: String,
    history: Vec<String>,
    complete: bool,
    in_flight: bool,
}

#[derive(Debug, Clone)]
pub enum Message {
    Tick,
    PixelFetched(Result<PixelReply, String>),
    PlotClicked { x: f64, inside: bool },
    Done,
    Reset,
    Submitted(Result<String, String>),
}

impl Annotator {
    fn boot() -> (Self, Task<Message>) {
        let bridge = bridge_url();
        (
            Annotator {
                bridge: bridge.clone(),
                payload: None,
                session: None,
                status: "Waiting for the driver...".into(),
                history: Vec::new(),
                complete: false,
                in_flight: true,
            },
            Task::perform(fetch_pixel(bridge), Message::PixelFetched),
        )
    }

    fn update(state: &mut Self, message: Message) -> Task<Message> {
        match message {
            Message::Tick => {
                if state.payload.is_none() && !state.complete && !state.in_flight {
                    state.in_flight = true;
                    Task::perform(fetch_pixel(state.bridge.clone()), Message::PixelFetched)
                } else {
                    Task::none()
                }
            }
            Message::PixelFetched(Ok(PixelReply::Ready { model })) => {
                state.in_flight = false;
                state.status = format!(
                    "Pixel {} of {}: {} points",
                    model.position,
                    model.total,
                    model.points.len()
                );
                state.session = Some(AnnotationSession::new(MarkerLayer::new()));
                state.payload = Some(model);
                Task::none()
            }
            Message::PixelFetched(Ok(PixelReply::Complete { annotated, skipped })) => {
                state.in_flight = false;
                state.complete = true;
                state.status =
                    format!("Batch complete: {annotated} annotated, {skipped} skipped");
                state.push_history(state.status.clone());
                Task::none()
            }
            Message::PixelFetched(Err(err)) => {
                state.in_flight = false;
                state.status = format!("Bridge unavailable: {err}");
                Task::none()
            }
            Message::PlotClicked { x, inside } => {
                if !state.in_flight {
                    if let Some(session) = state.session.as_mut() {
                        session.record_click(x, inside);
                    }
                }
                Task::none()
            }
            Message::Reset => {
                if state.payload.is_some() && !state.in_flight {
                    state.session = Some(AnnotationSession::new(MarkerLayer::new()));
                    state.push_history("Markers cleared".into());
                }
                Task::none()
            }
            Message::Done => {
                let (Some(payload), Some(session)) = (&state.payload, &state.session) else {
                    return Task::none();
                };
                if state.in_flight {
                    return Task::none();
                }
                state.in_flight = true;
                let submission = IntervalSubmission {
                    pixel: payload.pixel,
                    intervals: session.get_intervals().to_vec(),
                };
                Task::perform(
                    post_intervals(state.bridge.clone(), submission),
                    Message::Submitted,
                )
            }
            Message::Submitted(Ok(path)) => {
                let intervals = state
                    .session
                    .take()
                    .map(AnnotationSession::finish)
                    .unwrap_or_default();
                state.payload = None;
                state.push_history(format!("Saved {} interval(s) to {}", intervals.len(), path));
                state.status = "Fetching next pixel...".into();
                Task::perform(fetch_pixel(state.bridge.clone()), Message::PixelFetched)
            }
            Message::Submitted(Err(err)) => {
                state.in_flight = false;
                state.status = format!("NOT SAVED ({err}); press Done to retry");
                state.push_history(state.status.clone());
                Task::none()
            }
        }
    }

    fn view(state: &Self) -> Element<'_, Message> {
        let header = match &state.payload {
            Some(payload) => text(format!(
                "{}  |  x={:?} y={:?}",
                payload.index_label, payload.pixel.x, payload.pixel.y
            ))
            .size(18),
            None => text("No pixel loaded").size(18),
        };

        let pending = match state.session.as_ref().map(AnnotationSession::state) {
            Some(SessionState::AwaitingEnd { pending_start }) => format!(
                "Start marked at {}; click the end of the disturbance",
                disturbcore::imagery::calendar::format_month_year(pending_start)
            ),
            Some(SessionState::Idle) => "Click the start of a disturbance".into(),
            None => String::new(),
        };

        let plot: Element<'_, Message> = match &state.payload {
            Some(payload) => Canvas::new(PlotCanvas {
                payload: payload.clone(),
                markers: state
                    .session
                    .as_ref()
                    .map(|session| session.surface().markers().to_vec())
                    .unwrap_or_default(),
            })
            .width(Length::Fill)
            .height(Length::Fixed(320.0))
            .into(),
            None => Container::new(text(&state.status).size(14))
                .height(Length::Fixed(320.0))
                .into(),
        };

        let intervals = state
            .session
            .as_ref()
            .map(|session| session.get_intervals().to_vec())
            .unwrap_or_default();
        let interval_list = if intervals.is_empty() {
            Column::new().push(text("No intervals yet").size(12))
        } else {
            intervals.iter().enumerate().fold(
                Column::new().spacing(4),
                |col, (idx, interval)| {
                    col.push(
                        text(format!(
                            "#{}: {} -> {}",
                            idx + 1,
                            disturbcore::imagery::calendar::format_month_year(interval.start),
                            disturbcore::imagery::calendar::format_month_year(interval.end)
                        ))
                        .size(12),
                    )
                },
            )
        };

        let notes = state
            .payload
            .as_ref()
            .map(|payload| payload.notes.clone())
            .unwrap_or_default()
            .into_iter()
            .fold(Column::new().spacing(4), |col, note| {
                col.push(text(note).size(12))
            });

        let history_list = state
            .history
            .iter()
            .rev()
            .fold(Column::new().spacing(4), |col, entry| {
                col.push(text(entry.clone()).size(12))
            });

        let controls = row![
            button("Done").on_press(Message::Done).padding(10),
            button("Clear markers").on_press(Message::Reset).padding(10),
            text(&state.status).size(14),
        ]
        .spacing(12)
        .align_y(Alignment::Center);

        let layout = column![
            header,
            text(pending).size(14),
            plot,
            controls,
            text("Intervals").size(16),
            Container::new(scrollable(interval_list).height(Length::Fixed(100.0))).padding(6),
            notes,
            text("Activity log").size(16),
            Container::new(scrollable(history_list).height(Length::Fixed(90.0))).padding(6),
        ]
        .spacing(10)
        .padding(20);

        Container::new(layout)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn push_history(&mut self, entry: String) {
        self.history.push(entry);
        if self.history.len() > 20 {
            self.history.remove(0);
        }
    }
}

async fn fetch_pixel(bridge: String) -> Result<PixelReply, String> {
    let response = reqwest::get(format!("{bridge}/pixel"))
        .await
        .map_err(|e| e.to_string())?;
    response
        .json::<PixelReply>()
        .await
        .map_err(|e| e.to_string())
}

async fn post_intervals(bridge: String, submission: IntervalSubmission) -> Result<String, String> {
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{bridge}/intervals"))
        .json(&submission)
        .send()
        .await
        .map_err(|e| e.to_string())?;
    let status = response.status();
    let body = response
        .json::<serde_json::Value>()
        .await
        .unwrap_or(serde_json::Value::Null);
    if status.is_success() {
        Ok(body["path"].as_str().unwrap_or_default().to_string())
    } else {
        let detail = body["message"]
            .as_str()
            .or_else(|| body["status"].as_str())
            .unwrap_or_default();
        Err(format!("{}: {}", status, detail))
    }
}
