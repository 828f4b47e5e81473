use serde::{Deserialize, Serialize};

/// Closed disturbance period in timestamp-axis units.
///
/// `start` is not guaranteed to precede `end`; clicks are kept as placed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub start: f64,
    pub end: f64,
}

impl Interval {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn is_chronological(&self) -> bool {
        self.start <= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerRole {
    Start,
    End,
}

impl MarkerRole {
    pub fn colour(self) -> MarkerColour {
        match self {
            MarkerRole::Start => MarkerColour::Red,
            MarkerRole::End => MarkerColour::Green,
        }
    }
}

/// Line colour for a marker: red opens a disturbance, green closes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerColour {
    Red,
    Green,
}

/// Accepted click reduced to its axis position and assigned role.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub x_position: f64,
    pub role: MarkerRole,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionState {
    Idle,
    AwaitingEnd { pending_start: f64 },
}

/// Drawing surface the session reports accepted markers to.
///
/// The surface must render the marker before the next click is delivered.
pub trait PlotSurface {
    fn draw_marker(&mut self, marker: Marker, colour: MarkerColour);
}

impl<S: PlotSurface + ?Sized> PlotSurface for &mut S {
    fn draw_marker(&mut self, marker: Marker, colour: MarkerColour) {
        (**self).draw_marker(marker, colour);
    }
}

/// Surface that keeps every marker it was asked to draw.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerLayer {
    markers: Vec<(Marker, MarkerColour)>,
}

impl MarkerLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn markers(&self) -> &[(Marker, MarkerColour)] {
        &self.markers
    }

    pub fn clear(&mut self) {
        self.markers.clear();
    }
}

impl PlotSurface for MarkerLayer {
    fn draw_marker(&mut self, marker: Marker, colour: MarkerColour) {
        self.markers.push((marker, colour));
    }
}

/// Pairs a stream of plot clicks into start/end intervals for one pixel.
///
/// Clicks must be fed in arrival order from a single thread.
pub struct AnnotationSession<S: PlotSurface> {
    surface: S,
    state: SessionState,
    intervals: Vec<Interval>,
}

impl<S: PlotSurface> AnnotationSession<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            state: SessionState::Idle,
            intervals: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn pending_start(&self) -> Option<f64> {
        match self.state {
            SessionState::Idle => None,
            SessionState::AwaitingEnd { pending_start } => Some(pending_start),
        }
    }

    /// Applies one click; clicks outside the data area are ignored.
    pub fn record_click(&mut self, x_position: f64, is_inside_plot: bool) {
        if !is_inside_plot {
            return;
        }

        let role = match self.state {
            SessionState::Idle => {
                self.state = SessionState::AwaitingEnd {
                    pending_start: x_position,
                };
                MarkerRole::Start
            }
            SessionState::AwaitingEnd { pending_start } => {
                self.intervals.push(Interval::new(pending_start, x_position));
                self.state = SessionState::Idle;
                MarkerRole::End
            }
        };

        self.surface.draw_marker(Marker { x_position, role }, role.colour());
    }

    /// Completed intervals in the order they were closed.
    pub fn get_intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Ends the session, discarding any unmatched start click.
    pub fn finish(self) -> Vec<Interval> {
        if let SessionState::AwaitingEnd { pending_start } = self.state {
            log::debug!("discarding unmatched start at {}", pending_start);
        }
        self.intervals
    }
}
