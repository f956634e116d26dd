use std::fmt;

use serde::{Deserialize, Serialize};

use super::bitmap::BitmapId;
use crate::error::{EngineError, EngineResult};
use crate::filter::FilterStack;
use crate::geometry::{Color, Point, Rect};

/// Average glyph advance relative to the font size, used for text bounds.
pub const TEXT_ADVANCE_RATIO: f32 = 0.6;
/// Line height relative to the font size.
pub const TEXT_LINE_HEIGHT_RATIO: f32 = 1.16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineCap {
    Round,
    Square,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// Points are relative to the object's position.
    Path {
        points: Vec<Point>,
        stroke_width: f32,
        line_cap: LineCap,
    },
    Rectangle {
        width: f32,
        height: f32,
        stroke_width: f32,
    },
    Ellipse {
        radius_x: f32,
        radius_y: f32,
    },
    Text {
        content: String,
        font_size: f32,
    },
    Image {
        bitmap: BitmapId,
        width: f32,
        height: f32,
        filters: FilterStack,
    },
}

impl Shape {
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Path { .. } => "path",
            Self::Rectangle { .. } => "rectangle",
            Self::Ellipse { .. } => "ellipse",
            Self::Text { .. } => "text",
            Self::Image { .. } => "image",
        }
    }

    /// Untransformed bounds in object-local coordinates.
    pub fn local_bounds(&self) -> Rect {
        match self {
            Self::Path {
                points,
                stroke_width,
                ..
            } => Rect::from_points(points.iter().copied())
                .unwrap_or_default()
                .inflate(stroke_width / 2.0),
            Self::Rectangle { width, height, .. } | Self::Image { width, height, .. } => {
                Rect::new(0.0, 0.0, *width, *height)
            }
            Self::Ellipse { radius_x, radius_y } => {
                Rect::new(0.0, 0.0, radius_x * 2.0, radius_y * 2.0)
            }
            Self::Text { content, font_size } => {
                let columns = content
                    .lines()
                    .map(|line| line.chars().count())
                    .max()
                    .unwrap_or(0)
                    .max(1);
                let rows = content.lines().count().max(1);
                Rect::new(
                    0.0,
                    0.0,
                    columns as f32 * font_size * TEXT_ADVANCE_RATIO,
                    rows as f32 * font_size * TEXT_LINE_HEIGHT_RATIO,
                )
            }
        }
    }

    fn validate(&self) -> EngineResult<()> {
        let positive = |value: f32| value.is_finite() && value > 0.0;
        let ok = match self {
            Self::Path {
                points,
                stroke_width,
                ..
            } => !points.is_empty() && positive(*stroke_width),
            Self::Rectangle { width, height, .. } | Self::Image { width, height, .. } => {
                positive(*width) && positive(*height)
            }
            Self::Ellipse { radius_x, radius_y } => positive(*radius_x) && positive(*radius_y),
            Self::Text { font_size, .. } => positive(*font_size),
        };
        if ok {
            Ok(())
        } else {
            Err(EngineError::invalid_geometry(format!(
                "{} dimensions must be positive",
                self.kind_name()
            )))
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualObject {
    pub id: ObjectId,
    pub x: f32,
    pub y: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub angle: f32,
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub opacity: f32,
    pub z_index: usize,
    /// Persistent interactivity; cleared for generated patches.
    pub interactive: bool,
    #[serde(skip, default = "default_true")]
    pub selectable: bool,
    #[serde(skip, default = "default_true")]
    pub eventable: bool,
    #[serde(skip)]
    pub transient: bool,
    pub shape: Shape,
}

impl VisualObject {
    /// Builds an object with neutral transform; the id and z-index are
    /// assigned by the scene on insertion.
    pub fn new(position: Point, shape: Shape) -> Self {
        Self {
            id: ObjectId(0),
            x: position.x,
            y: position.y,
            scale_x: 1.0,
            scale_y: 1.0,
            angle: 0.0,
            fill: None,
            stroke: None,
            opacity: 1.0,
            z_index: 0,
            interactive: true,
            selectable: true,
            eventable: true,
            transient: false,
            shape,
        }
    }

    pub fn with_fill(mut self, fill: Color) -> Self {
        self.fill = Some(fill);
        self
    }

    pub fn with_stroke(mut self, stroke: Color) -> Self {
        self.stroke = Some(stroke);
        self
    }

    pub fn non_interactive(mut self) -> Self {
        self.interactive = false;
        self.selectable = false;
        self.eventable = false;
        self
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn validate(&self) -> EngineResult<()> {
        let positive = |value: f32| value.is_finite() && value > 0.0;
        if !positive(self.scale_x) || !positive(self.scale_y) {
            return Err(EngineError::invalid_geometry("scale must be positive"));
        }
        self.shape.validate()
    }

    /// Maps an object-local point into canvas coordinates.
    pub fn to_canvas(&self, local: Point) -> Point {
        Point::new(self.x + local.x * self.scale_x, self.y + local.y * self.scale_y)
            .rotate_around(self.position(), self.angle)
    }

    /// Maps a canvas point into object-local coordinates.
    pub fn to_local(&self, canvas: Point) -> Point {
        let unrotated = canvas.rotate_around(self.position(), -self.angle);
        Point::new(
            (unrotated.x - self.x) / self.scale_x,
            (unrotated.y - self.y) / self.scale_y,
        )
    }

    /// Axis-aligned bounds in canvas coordinates, including stroke width.
    pub fn bounding_rect(&self) -> Rect {
        let local = self.shape.local_bounds();
        let corners = [
            Point::new(local.x, local.y),
            Point::new(local.right(), local.y),
            Point::new(local.x, local.bottom()),
            Point::new(local.right(), local.bottom()),
        ];
        Rect::from_points(corners.map(|corner| self.to_canvas(corner))).unwrap_or_default()
    }

    pub fn contains(&self, point: Point) -> bool {
        self.shape.local_bounds().contains(self.to_local(point))
    }

    pub fn apply(&mut self, property: ObjectProperty) {
        match property {
            ObjectProperty::Position(point) => {
                self.x = point.x;
                self.y = point.y;
            }
            ObjectProperty::Scale { x, y } => {
                self.scale_x = x;
                self.scale_y = y;
            }
            ObjectProperty::Angle(angle) => self.angle = angle.rem_euclid(360.0),
            ObjectProperty::Fill(fill) => self.fill = fill,
            ObjectProperty::Stroke(stroke) => self.stroke = stroke,
            ObjectProperty::Opacity(opacity) => self.opacity = opacity.clamp(0.0, 1.0),
            ObjectProperty::Text(text) => {
                if let Shape::Text { content, .. } = &mut self.shape {
                    *content = text;
                }
            }
            ObjectProperty::FontSize(size) => {
                if let Shape::Text { font_size, .. } = &mut self.shape {
                    *font_size = size;
                }
            }
            ObjectProperty::Size { width, height } => match &mut self.shape {
                Shape::Rectangle {
                    width: w,
                    height: h,
                    ..
                }
                | Shape::Image {
                    width: w,
                    height: h,
                    ..
                } => {
                    *w = width;
                    *h = height;
                }
                Shape::Ellipse { radius_x, radius_y } => {
                    *radius_x = width / 2.0;
                    *radius_y = height / 2.0;
                }
                Shape::Path { .. } | Shape::Text { .. } => {}
            },
            ObjectProperty::StrokeWidth(width) => match &mut self.shape {
                Shape::Path { stroke_width, .. } | Shape::Rectangle { stroke_width, .. } => {
                    *stroke_width = width;
                }
                _ => {}
            },
        }
    }
}

/// A single settable attribute of a [`VisualObject`].
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectProperty {
    Position(Point),
    Scale { x: f32, y: f32 },
    Angle(f32),
    Fill(Option<Color>),
    Stroke(Option<Color>),
    Opacity(f32),
    Text(String),
    FontSize(f32),
    Size { width: f32, height: f32 },
    StrokeWidth(f32),
}

impl ObjectProperty {
    /// Rejects values that would leave the object with non-positive geometry.
    pub fn validate(&self) -> EngineResult<()> {
        let positive = |value: f32| value.is_finite() && value > 0.0;
        let ok = match self {
            Self::Position(point) => point.x.is_finite() && point.y.is_finite(),
            Self::Scale { x, y } => positive(*x) && positive(*y),
            Self::Angle(angle) => angle.is_finite(),
            Self::Opacity(opacity) => opacity.is_finite(),
            Self::FontSize(size) | Self::StrokeWidth(size) => positive(*size),
            Self::Size { width, height } => positive(*width) && positive(*height),
            Self::Fill(_) | Self::Stroke(_) | Self::Text(_) => true,
        };
        if ok {
            Ok(())
        } else {
            Err(EngineError::invalid_geometry(format!(
                "invalid value for {self:?}"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rectangle(width: f32, height: f32) -> VisualObject {
        VisualObject::new(
            Point::new(10.0, 20.0),
            Shape::Rectangle {
                width,
                height,
                stroke_width: 0.0,
            },
        )
    }

    #[test]
    fn validate_rejects_non_positive_dimensions() {
        assert!(rectangle(100.0, 100.0).validate().is_ok());
        assert!(matches!(
            rectangle(0.0, 100.0).validate(),
            Err(EngineError::InvalidGeometry { .. })
        ));

        let empty_path = VisualObject::new(
            Point::default(),
            Shape::Path {
                points: Vec::new(),
                stroke_width: 5.0,
                line_cap: LineCap::Round,
            },
        );
        assert!(empty_path.validate().is_err());
    }

    #[test]
    fn bounding_rect_includes_scale() {
        let mut object = rectangle(100.0, 50.0);
        object.apply(ObjectProperty::Scale { x: 2.0, y: 0.5 });
        assert_eq!(object.bounding_rect(), Rect::new(10.0, 20.0, 200.0, 25.0));
    }

    #[test]
    fn path_bounds_include_half_stroke() {
        let path = VisualObject::new(
            Point::new(5.0, 5.0),
            Shape::Path {
                points: vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)],
                stroke_width: 4.0,
                line_cap: LineCap::Round,
            },
        );
        assert_eq!(path.bounding_rect(), Rect::new(3.0, 3.0, 14.0, 4.0));
    }

    #[test]
    fn contains_respects_rotation() {
        let mut object = rectangle(100.0, 10.0);
        assert!(object.contains(Point::new(90.0, 25.0)));
        object.apply(ObjectProperty::Angle(90.0));
        assert!(!object.contains(Point::new(90.0, 25.0)));
        assert!(object.contains(Point::new(5.0, 90.0)));
    }

    #[test]
    fn mode_flags_are_not_serialized() {
        let mut object = rectangle(10.0, 10.0);
        object.selectable = false;
        let json = serde_json::to_string(&object).expect("object should serialize");
        let restored: VisualObject = serde_json::from_str(&json).expect("object should parse");
        assert!(restored.selectable);
        assert!(restored.eventable);
        assert!(!json.contains("selectable"));
    }
}
