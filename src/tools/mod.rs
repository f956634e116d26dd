mod brush;
mod crop;
mod insert;
mod removal;

pub use brush::{
    is_mask_stroke, Brush, StrokeBuffer, HIGHLIGHTER_ALPHA, MASK_BRUSH_WIDTH, MASK_COLOR,
};
pub use crop::{crop_background, crop_region, proposal_object, CropPreset};
pub use insert::{
    InsertKind, DEFAULT_ELLIPSE_RADIUS, DEFAULT_FONT_SIZE, DEFAULT_RECT_SIZE, DEFAULT_TEXT,
};
pub use removal::{patch_object, plan_removal, sample_patch, RemovalPlan, PATCH_BLUR};

use crate::config::EngineConfig;
use crate::geometry::{Color, Point};
use crate::scene::{ObjectId, SceneGraph};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawVariant {
    #[default]
    Pen,
    Highlighter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolMode {
    #[default]
    Select,
    Draw(DrawVariant),
    Erase,
    Crop,
    MaskCapture,
    /// Momentary: the object is placed and the mode falls back to Select.
    InsertPending(InsertKind),
}

impl ToolMode {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Draw(DrawVariant::Pen) => "draw",
            Self::Draw(DrawVariant::Highlighter) => "highlight",
            Self::Erase => "erase",
            Self::Crop => "crop",
            Self::MaskCapture => "mask",
            Self::InsertPending(_) => "insert",
        }
    }

    pub const fn is_drawing(self) -> bool {
        matches!(self, Self::Draw(_) | Self::MaskCapture)
    }

    /// Per-object `(selectable, eventable)` override, or `None` when each
    /// object follows its own persistent interactivity.
    pub const fn interaction_flags(self) -> Option<(bool, bool)> {
        match self {
            Self::Select | Self::InsertPending(_) => None,
            Self::Erase => Some((false, true)),
            Self::Draw(_) | Self::Crop | Self::MaskCapture => Some((false, false)),
        }
    }
}

/// In-flight Select-mode move of one object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragState {
    pub id: ObjectId,
    pub origin: Point,
    pub last: Point,
}

impl DragState {
    pub const fn new(id: ObjectId, origin: Point) -> Self {
        Self {
            id,
            origin,
            last: origin,
        }
    }
}

/// Single store of tool settings and mode sub-state, read at dispatch time.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolState {
    mode: ToolMode,
    color: Color,
    brush_width: f32,
    highlighter_width: f32,
    crop_preset: CropPreset,
    crop_proposal: Option<ObjectId>,
    stroke: Option<StrokeBuffer>,
    drag: Option<DragState>,
}

impl ToolState {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            mode: ToolMode::Select,
            color: config.default_color(),
            brush_width: config.brush_width,
            highlighter_width: config.highlighter_width,
            crop_preset: CropPreset::Free,
            crop_proposal: None,
            stroke: None,
            drag: None,
        }
    }

    pub fn mode(&self) -> ToolMode {
        self.mode
    }

    /// Switches mode and discards sub-state that belongs to the old one.
    pub fn set_mode(&mut self, mode: ToolMode) -> ToolMode {
        let previous = self.mode;
        self.mode = mode;
        self.stroke = None;
        self.drag = None;
        if mode != ToolMode::Crop {
            self.crop_proposal = None;
        }
        tracing::debug!(from = previous.label(), to = mode.label(), "tool mode changed");
        previous
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn brush_width(&self) -> f32 {
        self.brush_width
    }

    pub fn set_brush_width(&mut self, width: f32) {
        if width.is_finite() && width > 0.0 {
            self.brush_width = width;
        }
    }

    pub fn crop_preset(&self) -> CropPreset {
        self.crop_preset
    }

    pub fn set_crop_preset(&mut self, preset: CropPreset) {
        self.crop_preset = preset;
    }

    pub fn crop_proposal(&self) -> Option<ObjectId> {
        self.crop_proposal
    }

    pub fn set_crop_proposal(&mut self, id: Option<ObjectId>) {
        self.crop_proposal = id;
    }

    /// Brush for the active drawing mode, built from the current settings.
    pub fn active_brush(&self) -> Option<Brush> {
        match self.mode {
            ToolMode::Draw(DrawVariant::Pen) => Some(Brush::pen(self.color, self.brush_width)),
            ToolMode::Draw(DrawVariant::Highlighter) => {
                Some(Brush::highlighter(self.color, self.highlighter_width))
            }
            ToolMode::MaskCapture => Some(Brush::mask()),
            _ => None,
        }
    }

    pub fn begin_stroke(&mut self, point: Point) -> bool {
        let Some(brush) = self.active_brush() else {
            return false;
        };
        self.stroke = Some(StrokeBuffer::new(brush, point));
        true
    }

    pub fn extend_stroke(&mut self, point: Point) -> bool {
        match self.stroke.as_mut() {
            Some(stroke) => {
                stroke.append_point(point);
                true
            }
            None => false,
        }
    }

    pub fn finish_stroke(&mut self) -> Option<StrokeBuffer> {
        self.stroke.take()
    }

    pub fn stroke(&self) -> Option<&StrokeBuffer> {
        self.stroke.as_ref()
    }

    pub fn begin_drag(&mut self, id: ObjectId, point: Point) {
        self.drag = Some(DragState::new(id, point));
    }

    pub fn drag(&self) -> Option<&DragState> {
        self.drag.as_ref()
    }

    pub fn drag_mut(&mut self) -> Option<&mut DragState> {
        self.drag.as_mut()
    }

    pub fn finish_drag(&mut self) -> Option<DragState> {
        self.drag.take()
    }

    /// Applies this mode's interaction flags to every object in `scene`.
    pub fn apply_interaction_flags(&self, scene: &mut SceneGraph) {
        match self.mode.interaction_flags() {
            Some((selectable, eventable)) => scene.set_interaction_flags(selectable, eventable),
            None => scene.reset_interaction_flags(),
        }
        if let Some(id) = self.crop_proposal {
            scene.set_object_interaction(id, true, true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::CanvasSize;
    use crate::scene::{Shape, VisualObject};

    fn state() -> ToolState {
        ToolState::new(&EngineConfig::default())
    }

    #[test]
    fn erase_then_select_restores_flags() {
        let mut scene = SceneGraph::new(CanvasSize::new(100, 100));
        let id = scene
            .add_object(VisualObject::new(
                Point::new(0.0, 0.0),
                Shape::Ellipse {
                    radius_x: 5.0,
                    radius_y: 5.0,
                },
            ))
            .expect("valid ellipse");
        let mut tools = state();

        tools.set_mode(ToolMode::Erase);
        tools.apply_interaction_flags(&mut scene);
        let object = scene.object(id).expect("object present");
        assert!(!object.selectable && object.eventable);

        tools.set_mode(ToolMode::Select);
        tools.apply_interaction_flags(&mut scene);
        let object = scene.object(id).expect("object present");
        assert!(object.selectable && object.eventable);
    }

    #[test]
    fn brush_follows_current_colour_at_dispatch_time() {
        let mut tools = state();
        tools.set_mode(ToolMode::Draw(DrawVariant::Pen));
        tools.set_color(Color::new(1, 2, 3));
        assert_eq!(
            tools.active_brush().map(|brush| brush.color),
            Some(Color::new(1, 2, 3))
        );

        tools.set_mode(ToolMode::MaskCapture);
        assert_eq!(tools.active_brush().map(|brush| brush.color), Some(MASK_COLOR));

        tools.set_mode(ToolMode::Select);
        assert_eq!(tools.active_brush(), None);
        assert!(!tools.begin_stroke(Point::new(0.0, 0.0)));
    }

    #[test]
    fn leaving_mode_discards_stroke_and_drag() {
        let mut tools = state();
        tools.set_mode(ToolMode::Draw(DrawVariant::Highlighter));
        assert!(tools.begin_stroke(Point::new(1.0, 1.0)));
        tools.set_mode(ToolMode::Select);
        assert!(tools.stroke().is_none());
        assert!(!tools.extend_stroke(Point::new(2.0, 2.0)));
    }

    #[test]
    fn non_positive_brush_width_is_ignored() {
        let mut tools = state();
        tools.set_brush_width(0.0);
        assert_eq!(tools.brush_width(), EngineConfig::default().brush_width);
    }
}
