pub mod channel;
pub mod session;

pub use channel::{run_session, ClickEvent};
pub use session::{
    AnnotationSession, Interval, Marker, MarkerColour, MarkerLayer, MarkerRole, PlotSurface,
    SessionState,
};
