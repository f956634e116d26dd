use crate::geometry::{Color, Point};
use crate::scene::{LineCap, Shape, VisualObject};

/// Alpha applied to the current colour by the highlighter.
pub const HIGHLIGHTER_ALPHA: u8 = 0x50;
/// Fixed marker colour of mask strokes; also how they are recognised later.
pub const MASK_COLOR: Color = Color::rgba(255, 50, 50, 128);
pub const MASK_BRUSH_WIDTH: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Brush {
    pub color: Color,
    pub width: f32,
    pub line_cap: LineCap,
}

impl Brush {
    pub const fn pen(color: Color, width: f32) -> Self {
        Self {
            color,
            width,
            line_cap: LineCap::Round,
        }
    }

    pub const fn highlighter(color: Color, width: f32) -> Self {
        Self {
            color: color.with_alpha(HIGHLIGHTER_ALPHA),
            width,
            line_cap: LineCap::Square,
        }
    }

    pub const fn mask() -> Self {
        Self {
            color: MASK_COLOR,
            width: MASK_BRUSH_WIDTH,
            line_cap: LineCap::Round,
        }
    }
}

/// Points collected between pointer-down and pointer-up.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeBuffer {
    brush: Brush,
    points: Vec<Point>,
}

impl StrokeBuffer {
    pub fn new(brush: Brush, start: Point) -> Self {
        Self {
            brush,
            points: vec![start],
        }
    }

    pub fn append_point(&mut self, point: Point) {
        if self.points.last() != Some(&point) {
            self.points.push(point);
        }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Path object anchored at the stroke's minimum corner, with points stored
    /// relative to that anchor.
    pub fn into_object(self) -> VisualObject {
        let origin = self.points.iter().fold(
            Point::new(f32::INFINITY, f32::INFINITY),
            |min, point| Point::new(min.x.min(point.x), min.y.min(point.y)),
        );
        let points = self
            .points
            .iter()
            .map(|point| Point::new(point.x - origin.x, point.y - origin.y))
            .collect();
        VisualObject::new(
            origin,
            Shape::Path {
                points,
                stroke_width: self.brush.width,
                line_cap: self.brush.line_cap,
            },
        )
        .with_stroke(self.brush.color)
    }
}

pub fn is_mask_stroke(object: &VisualObject) -> bool {
    matches!(object.shape, Shape::Path { .. }) && object.stroke == Some(MASK_COLOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    #[test]
    fn stroke_is_anchored_at_minimum_point() {
        let mut buffer = StrokeBuffer::new(Brush::pen(Color::BLACK, 4.0), Point::new(30.0, 40.0));
        buffer.append_point(Point::new(10.0, 50.0));
        buffer.append_point(Point::new(10.0, 50.0));
        buffer.append_point(Point::new(20.0, 20.0));
        assert_eq!(buffer.points().len(), 3);

        let object = buffer.into_object();
        assert_eq!(object.position(), Point::new(10.0, 20.0));
        assert_eq!(object.bounding_rect(), Rect::new(8.0, 18.0, 24.0, 34.0));
        assert_eq!(object.stroke, Some(Color::BLACK));
        assert_eq!(object.fill, None);
    }

    #[test]
    fn highlighter_is_translucent_and_square_capped() {
        let brush = Brush::highlighter(Color::new(250, 204, 21), 20.0);
        assert_eq!(brush.color.a, HIGHLIGHTER_ALPHA);
        assert_eq!(brush.line_cap, LineCap::Square);
    }

    #[test]
    fn mask_strokes_are_recognised_by_colour() {
        let mask = StrokeBuffer::new(Brush::mask(), Point::new(1.0, 1.0)).into_object();
        let pen = StrokeBuffer::new(Brush::pen(Color::new(255, 50, 50), 20.0), Point::new(1.0, 1.0))
            .into_object();
        assert!(is_mask_stroke(&mask));
        assert!(!is_mask_stroke(&pen));
    }
}
