use crate::payload::PixelPayload;
use crate::Message;
use disturbcore::annotation::{Marker, MarkerColour};
use disturbcore::imagery::calendar::format_month_year;
use iced::{
    mouse,
    widget::canvas::{self, Frame, Geometry, Path, Stroke, Text},
    Color, Pixels, Point, Rectangle, Renderer, Size, Theme,
};

const MARGIN_LEFT: f32 = 52.0;
const MARGIN_RIGHT: f32 = 16.0;
const MARGIN_TOP: f32 = 12.0;
const MARGIN_BOTTOM: f32 = 30.0;
const X_TICKS: usize = 6;
const Y_TICKS: usize = 5;

/// Maps between data coordinates and the canvas' local pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotGeometry {
    pub data_area: Rectangle,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
}

fn padded(range: Option<(f64, f64)>, fallback: (f64, f64), pad: f64) -> (f64, f64) {
    match range {
        Some((min, max)) if max > min => {
            let margin = (max - min) * pad;
            (min - margin, max + margin)
        }
        Some((value, _)) => (value - 1.0, value + 1.0),
        None => fallback,
    }
}

fn extent<I: Iterator<Item = f64>>(values: I) -> Option<(f64, f64)> {
    values
        .filter(|value| value.is_finite())
        .fold(None, |range, value| match range {
            None => Some((value, value)),
            Some((min, max)) => Some((min.min(value), max.max(value))),
        })
}

impl PlotGeometry {
    pub fn new(size: Size, payload: &PixelPayload) -> Self {
        let trend = payload.trend.as_deref().unwrap_or_default();
        let xs = payload
            .points
            .iter()
            .map(|p| p.x)
            .chain(trend.iter().map(|&(x, _)| x));
        let ys = payload
            .points
            .iter()
            .map(|p| p.y)
            .chain(trend.iter().map(|&(_, y)| y));

        Self {
            data_area: Rectangle::new(
                Point::new(MARGIN_LEFT, MARGIN_TOP),
                Size::new(
                    (size.width - MARGIN_LEFT - MARGIN_RIGHT).max(1.0),
                    (size.height - MARGIN_TOP - MARGIN_BOTTOM).max(1.0),
                ),
            ),
            x_range: padded(extent(xs), (0.0, 1.0), 0.02),
            y_range: padded(extent(ys), (-1.0, 1.0), 0.05),
        }
    }

    pub fn to_screen(&self, x: f64, y: f64) -> Point {
        let (x0, x1) = self.x_range;
        let (y0, y1) = self.y_range;
        let fx = ((x - x0) / (x1 - x0)) as f32;
        let fy = ((y - y0) / (y1 - y0)) as f32;
        Point::new(
            self.data_area.x + fx * self.data_area.width,
            self.data_area.y + (1.0 - fy) * self.data_area.height,
        )
    }

    /// Timestamp-axis value under a horizontal pixel position.
    pub fn x_value(&self, px: f32) -> f64 {
        let (x0, x1) = self.x_range;
        let fraction = f64::from((px - self.data_area.x) / self.data_area.width);
        x0 + fraction * (x1 - x0)
    }

    pub fn contains(&self, position: Point) -> bool {
        self.data_area.contains(position)
    }
}

fn marker_colour(colour: MarkerColour) -> Color {
    match colour {
        MarkerColour::Red => Color::from_rgba(0.9, 0.15, 0.15, 0.5),
        MarkerColour::Green => Color::from_rgba(0.15, 0.8, 0.25, 0.5),
    }
}

/// Index points, trend overlay and the session's marker lines.
pub struct PlotCanvas {
    pub payload: PixelPayload,
    pub markers: Vec<(Marker, MarkerColour)>,
}

impl canvas::Program<Message> for PlotCanvas {
    type State = ();

    fn update(
        &self,
        _state: &mut Self::State,
        event: &canvas::Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Option<canvas::Action<Message>> {
        let canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) = event else {
            return None;
        };
        let position = cursor.position_in(bounds)?;
        let geometry = PlotGeometry::new(bounds.size(), &self.payload);
        let message = Message::PlotClicked {
            x: geometry.x_value(position.x),
            inside: geometry.contains(position),
        };
        Some(canvas::Action::publish(message).and_capture())
    }

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        frame.fill_rectangle(
            Point::ORIGIN,
            bounds.size(),
            Color::from_rgb(0.05, 0.05, 0.05),
        );

        let geometry = PlotGeometry::new(bounds.size(), &self.payload);
        let area = geometry.data_area;
        frame.stroke(
            &Path::rectangle(area.position(), area.size()),
            Stroke::default()
                .with_width(1.0)
                .with_color(Color::from_rgb(0.35, 0.35, 0.45)),
        );

        let label_colour = Color::from_rgb(0.7, 0.7, 0.75);
        for i in 0..X_TICKS {
            let fraction = i as f64 / (X_TICKS - 1) as f64;
            let x = geometry.x_range.0 + fraction * (geometry.x_range.1 - geometry.x_range.0);
            let anchor = geometry.to_screen(x, geometry.y_range.0);
            frame.fill_text(Text {
                content: format_month_year(x),
                position: Point::new(anchor.x - 22.0, anchor.y + 8.0),
                color: label_colour,
                size: Pixels(12.0),
                ..Text::default()
            });
        }
        for i in 0..Y_TICKS {
            let fraction = i as f64 / (Y_TICKS - 1) as f64;
            let y = geometry.y_range.0 + fraction * (geometry.y_range.1 - geometry.y_range.0);
            let anchor = geometry.to_screen(geometry.x_range.0, y);
            frame.fill_text(Text {
                content: format!("{:.2}", y),
                position: Point::new(4.0, anchor.y - 6.0),
                color: label_colour,
                size: Pixels(12.0),
                ..Text::default()
            });
        }

        if let Some(trend) = self.payload.trend.as_deref().filter(|t| t.len() > 1) {
            let path = Path::new(|builder| {
                for (i, &(x, y)) in trend.iter().enumerate() {
                    let point = geometry.to_screen(x, y);
                    if i == 0 {
                        builder.move_to(point);
                    } else {
                        builder.line_to(point);
                    }
                }
            });
            frame.stroke(
                &path,
                Stroke::default()
                    .with_width(1.5)
                    .with_color(Color::from_rgba(0.95, 0.75, 0.2, 0.8)),
            );
        }

        for point in &self.payload.points {
            let colour = match point.colour {
                Some([r, g, b]) => Color::from_rgb(r as f32, g as f32, b as f32),
                None => Color::from_rgb(0.18, 0.72, 0.89),
            };
            let dot = Path::circle(geometry.to_screen(point.x, point.y), 2.0);
            frame.fill(&dot, colour);
        }

        for (marker, colour) in &self.markers {
            let top = geometry.to_screen(marker.x_position, geometry.y_range.1);
            let bottom = geometry.to_screen(marker.x_position, geometry.y_range.0);
            frame.stroke(
                &Path::line(top, bottom),
                Stroke::default()
                    .with_width(2.0)
                    .with_color(marker_colour(*colour)),
            );
        }

        vec![frame.into_geometry()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::PlotPoint;
    use disturbcore::imagery::PixelId;

    fn payload(points: &[(f64, f64)]) -> PixelPayload {
        PixelPayload {
            pixel: PixelId::new(0.0, 0.0),
            position: 1,
            total: 1,
            index_label: String::new(),
            points: points
                .iter()
                .map(|&(x, y)| PlotPoint { x, y, colour: None })
                .collect(),
            trend: None,
            notes: Vec::new(),
        }
    }

    #[test]
    fn screen_and_axis_positions_agree() {
        let geometry = PlotGeometry::new(
            Size::new(800.0, 300.0),
            &payload(&[(730_000.0, 0.1), (732_000.0, 0.8)]),
        );
        let point = geometry.to_screen(731_000.0, 0.5);
        assert!(geometry.contains(point));
        assert!((geometry.x_value(point.x) - 731_000.0).abs() < 1.0);
    }

    #[test]
    fn margins_fall_outside_the_data_area() {
        let geometry = PlotGeometry::new(Size::new(800.0, 300.0), &payload(&[(1.0, 0.0), (2.0, 1.0)]));
        assert!(!geometry.contains(Point::new(10.0, 150.0)));
        assert!(!geometry.contains(Point::new(400.0, 295.0)));
        assert!(geometry.contains(Point::new(400.0, 150.0)));
    }

    #[test]
    fn empty_payload_uses_fallback_ranges() {
        let geometry = PlotGeometry::new(Size::new(400.0, 200.0), &payload(&[]));
        assert_eq!(geometry.x_range, (0.0, 1.0));
        assert_eq!(geometry.y_range, (-1.0, 1.0));
    }
}
