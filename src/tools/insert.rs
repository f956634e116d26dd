use crate::geometry::{CanvasSize, Color, Point};
use crate::scene::{Shape, VisualObject};

pub const DEFAULT_TEXT: &str = "Double click to edit";
pub const DEFAULT_FONT_SIZE: f32 = 24.0;
pub const DEFAULT_RECT_SIZE: f32 = 100.0;
pub const DEFAULT_ELLIPSE_RADIUS: f32 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertKind {
    Text,
    Rectangle,
    Ellipse,
}

impl InsertKind {
    pub const ALL: [InsertKind; 3] = [Self::Text, Self::Rectangle, Self::Ellipse];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Rectangle => "rectangle",
            Self::Ellipse => "ellipse",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "rect" | "rectangle" => Some(Self::Rectangle),
            "circle" | "ellipse" => Some(Self::Ellipse),
            _ => None,
        }
    }

    fn default_shape(self) -> Shape {
        match self {
            Self::Text => Shape::Text {
                content: DEFAULT_TEXT.to_string(),
                font_size: DEFAULT_FONT_SIZE,
            },
            Self::Rectangle => Shape::Rectangle {
                width: DEFAULT_RECT_SIZE,
                height: DEFAULT_RECT_SIZE,
                stroke_width: 0.0,
            },
            Self::Ellipse => Shape::Ellipse {
                radius_x: DEFAULT_ELLIPSE_RADIUS,
                radius_y: DEFAULT_ELLIPSE_RADIUS,
            },
        }
    }

    /// Default-configured object centred in the canvas and filled with `color`.
    pub fn default_object(self, canvas: CanvasSize, color: Color) -> VisualObject {
        let shape = self.default_shape();
        let bounds = shape.local_bounds();
        let center = canvas.bounds().center();
        VisualObject::new(
            Point::new(center.x - bounds.width / 2.0, center.y - bounds.height / 2.0),
            shape,
        )
        .with_fill(color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    #[test]
    fn rectangle_is_centred_with_default_size() {
        let object =
            InsertKind::Rectangle.default_object(CanvasSize::new(800, 600), Color::new(1, 2, 3));
        assert_eq!(object.bounding_rect(), Rect::new(350.0, 250.0, 100.0, 100.0));
        assert_eq!(object.fill, Some(Color::new(1, 2, 3)));
    }

    #[test]
    fn ellipse_uses_default_radius() {
        let object = InsertKind::Ellipse.default_object(CanvasSize::new(200, 200), Color::BLACK);
        assert_eq!(object.bounding_rect(), Rect::new(50.0, 50.0, 100.0, 100.0));
    }

    #[test]
    fn text_has_placeholder_content() {
        let object = InsertKind::Text.default_object(CanvasSize::new(800, 600), Color::BLACK);
        assert!(matches!(
            &object.shape,
            Shape::Text { content, font_size } if content == DEFAULT_TEXT && *font_size == 24.0
        ));
        let center = object.bounding_rect().center();
        assert!((center.x - 400.0).abs() < 1e-3 && (center.y - 300.0).abs() < 1e-3);
    }

    #[test]
    fn parse_accepts_aliases() {
        assert_eq!(InsertKind::parse("circle"), Some(InsertKind::Ellipse));
        assert_eq!(InsertKind::parse(" Rect "), Some(InsertKind::Rectangle));
        assert_eq!(InsertKind::parse("arrow"), None);
    }
}
