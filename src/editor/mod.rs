//! Editing session: owns the live scene and routes every input through the
//! tool state, history and output synchroniser.

mod assist;
mod modes;
mod pages;
mod pointer;
mod shortcuts;
mod viewport;

use std::sync::Arc;

use image::{imageops, RgbaImage};

pub use assist::{spawn_assist, AssistReply, AssistRequest, AssistTicket};
pub use pages::{spawn_page_render, PageReply};
pub use shortcuts::ShortcutOutcome;
pub use viewport::Viewport;

use crate::collab::Suggestion;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::filter::FilterKind;
use crate::geometry::{CanvasSize, Color};
use crate::history::{HistoryLog, HistoryStep};
use crate::output::{OutputArtifact, OutputSynchronizer};
use crate::render::{composite, CompositeOptions};
use crate::scene::{
    FilterTarget, ObjectId, ObjectProperty, SceneEvent, SceneGraph, ZDirection,
};
use crate::session::PageContext;
use crate::state::{SessionEvent, SessionState, StateError, StateMachine};
use crate::tools::{ToolMode, ToolState};

pub struct Editor {
    config: EngineConfig,
    lifecycle: StateMachine,
    scene: Option<SceneGraph>,
    history: HistoryLog,
    tools: ToolState,
    output: OutputSynchronizer,
    viewport: Viewport,
    pages: Option<PageContext>,
    source_name: String,
    assist_generation: u64,
    pending_assist: Option<AssistTicket>,
    suggestions: Vec<Suggestion>,
    recognized_text: Option<String>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Editor {
    pub fn new(config: EngineConfig) -> Self {
        let history = match config.history_limit {
            Some(limit) => HistoryLog::with_limit(limit),
            None => HistoryLog::new(),
        };
        Self {
            tools: ToolState::new(&config),
            config,
            lifecycle: StateMachine::new(),
            scene: None,
            history,
            output: OutputSynchronizer::new(),
            viewport: Viewport::new(),
            pages: None,
            source_name: String::new(),
            assist_generation: 0,
            pending_assist: None,
            suggestions: Vec::new(),
            recognized_text: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.lifecycle.state()
    }

    pub fn scene(&self) -> Option<&SceneGraph> {
        self.scene.as_ref()
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn tools(&self) -> &ToolState {
        &self.tools
    }

    pub fn mode(&self) -> ToolMode {
        self.tools.mode()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn pages(&self) -> Option<&PageContext> {
        self.pages.as_ref()
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Latest exportable composite, refreshed after every settled edit.
    pub fn composite(&self) -> Option<&Arc<RgbaImage>> {
        self.scene.as_ref().and(self.output.latest())
    }

    /// What the interactive canvas shows, transient objects included.
    pub fn preview(&self) -> Option<RgbaImage> {
        self.scene
            .as_ref()
            .map(|scene| composite(scene, CompositeOptions::PREVIEW))
    }

    fn ensure_ready(&self) -> EngineResult<()> {
        let state = self.lifecycle.state();
        if self.scene.is_none() {
            return Err(EngineError::NoDocument);
        }
        if !state.accepts_edits() {
            return Err(StateError::NotReady { state }.into());
        }
        Ok(())
    }

    /// Drains scene events: committed ones record one snapshot and refresh
    /// the output; reloads only refresh the output.
    fn settle(&mut self) -> EngineResult<()> {
        let Some(events) = self.scene.as_mut().map(SceneGraph::drain_events) else {
            return Ok(());
        };
        if events.is_empty() {
            return Ok(());
        }
        let committed = events.iter().any(SceneEvent::is_committed);
        let reloaded = events.iter().any(|event| matches!(event, SceneEvent::Reloaded));
        let dragging = self
            .tools
            .drag()
            .is_some_and(|drag| drag.origin != drag.last);
        if committed && dragging {
            self.revert_drag();
        }
        let Some(scene) = self.scene.as_mut() else {
            return Ok(());
        };
        if committed {
            tracing::debug!(?events, "scene settled");
            self.history.snapshot(scene.capture()?);
        }
        if committed || reloaded {
            self.output.mark_dirty();
            self.output.sync(scene);
        }
        Ok(())
    }

    fn install_scene(&mut self, mut scene: SceneGraph) -> EngineResult<()> {
        self.history.clear();
        self.tools.set_mode(ToolMode::Select);
        self.tools.apply_interaction_flags(&mut scene);
        scene.drain_events();
        self.history.snapshot(scene.capture()?);
        self.output.reset();
        self.output.sync(&scene);
        tracing::info!(
            width = scene.size().width,
            height = scene.size().height,
            objects = scene.object_count(),
            "scene installed"
        );
        self.scene = Some(scene);
        self.assist_generation = self.assist_generation.saturating_add(1);
        self.pending_assist = None;
        Ok(())
    }

    fn reset_document(&mut self) {
        self.scene = None;
        self.history.clear();
        self.pages = None;
        self.output.reset();
        self.tools.set_mode(ToolMode::Select);
        self.assist_generation = self.assist_generation.saturating_add(1);
        self.pending_assist = None;
        self.suggestions.clear();
        self.recognized_text = None;
    }

    /// Drops the document and returns to the empty state.
    pub fn unload(&mut self) -> EngineResult<()> {
        self.reset_document();
        self.source_name.clear();
        self.lifecycle.transition(SessionEvent::Unload)?;
        Ok(())
    }

    /// Decodes `bytes` as a single image. A decode failure resets the
    /// session to the empty state.
    pub fn load_image(&mut self, bytes: &[u8], source_name: &str) -> EngineResult<()> {
        self.unload()?;
        self.lifecycle.transition(SessionEvent::BeginLoad)?;
        let decoded = match image::load_from_memory(bytes) {
            Ok(image) => image.to_rgba8(),
            Err(err) => {
                tracing::warn!(source = source_name, %err, "image decode failed");
                self.lifecycle.transition(SessionEvent::LoadFailed)?;
                return Err(EngineError::DecodeFailure {
                    message: err.to_string(),
                });
            }
        };
        self.finish_image_load(decoded, source_name)
    }

    /// Loads already-decoded pixels as a single image.
    pub fn load_bitmap(&mut self, image: RgbaImage, source_name: &str) -> EngineResult<()> {
        self.unload()?;
        self.lifecycle.transition(SessionEvent::BeginLoad)?;
        self.finish_image_load(image, source_name)
    }

    fn finish_image_load(&mut self, image: RgbaImage, source_name: &str) -> EngineResult<()> {
        if image.width() == 0 || image.height() == 0 {
            self.lifecycle.transition(SessionEvent::LoadFailed)?;
            return Err(EngineError::DecodeFailure {
                message: "image has no pixels".to_string(),
            });
        }
        let limits = CanvasSize::new(self.config.max_canvas_width, self.config.max_canvas_height);
        let image = fit_within(image, limits);
        self.install_scene(SceneGraph::with_background(image))?;
        self.source_name = source_name.to_string();
        self.lifecycle.transition(SessionEvent::Loaded)?;
        tracing::info!(source = source_name, "image loaded");
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo(&mut self) -> EngineResult<bool> {
        self.step_history(HistoryStep::Undo)
    }

    pub fn redo(&mut self) -> EngineResult<bool> {
        self.step_history(HistoryStep::Redo)
    }

    fn step_history(&mut self, step: HistoryStep) -> EngineResult<bool> {
        self.ensure_ready()?;
        let Some(scene) = self.scene.as_mut() else {
            return Ok(false);
        };
        let proposal = self
            .tools
            .crop_proposal()
            .and_then(|id| scene.bounding_rect(id).ok());
        let Some(snapshot) = self.history.begin_step(step) else {
            return Ok(false);
        };
        if let Err(err) = scene.restore(&snapshot) {
            self.history.abort_restore();
            return Err(err);
        }
        self.tools.finish_drag();
        self.tools.finish_stroke();
        self.tools.set_crop_proposal(None);
        let reapplied = self.reapply_mode_effects(proposal);
        let settled = self.settle();
        self.history.finish_restore();
        reapplied.and(settled)?;
        tracing::debug!(step = step.label(), cursor = ?self.history.cursor(), "history restored");
        Ok(true)
    }

    pub fn select(&mut self, id: Option<ObjectId>) -> EngineResult<()> {
        self.ensure_ready()?;
        if let Some(scene) = self.scene.as_mut() {
            scene.set_selection(id);
        }
        self.settle()
    }

    pub fn selected(&self) -> Option<ObjectId> {
        self.scene.as_ref().and_then(SceneGraph::selected)
    }

    pub fn delete_selected(&mut self) -> EngineResult<bool> {
        self.ensure_ready()?;
        let Some(scene) = self.scene.as_mut() else {
            return Ok(false);
        };
        let Some(id) = scene.selected() else {
            return Ok(false);
        };
        let removed = scene.remove_object(id);
        self.settle()?;
        Ok(removed)
    }

    pub fn remove_object(&mut self, id: ObjectId) -> EngineResult<bool> {
        self.ensure_ready()?;
        let removed = self
            .scene
            .as_mut()
            .is_some_and(|scene| scene.remove_object(id));
        self.settle()?;
        Ok(removed)
    }

    pub fn set_property(&mut self, id: ObjectId, property: ObjectProperty) -> EngineResult<()> {
        self.ensure_ready()?;
        if let Some(scene) = self.scene.as_mut() {
            scene.set_object_property(id, property)?;
        }
        self.settle()
    }

    pub fn reorder(&mut self, id: ObjectId, direction: ZDirection) -> EngineResult<bool> {
        self.ensure_ready()?;
        let moved = self
            .scene
            .as_mut()
            .is_some_and(|scene| scene.reorder(id, direction));
        self.settle()?;
        Ok(moved)
    }

    /// Clamps, applies and recomposes one filter parameter; returns the
    /// value actually applied.
    pub fn set_filter(
        &mut self,
        target: FilterTarget,
        kind: FilterKind,
        value: f32,
    ) -> EngineResult<f32> {
        self.ensure_ready()?;
        let applied = match self.scene.as_mut() {
            Some(scene) => scene.set_filter_parameter(target, kind, value)?,
            None => return Err(EngineError::NoDocument),
        };
        self.settle()?;
        Ok(applied)
    }

    pub fn rotate_background(&mut self) -> EngineResult<bool> {
        self.ensure_ready()?;
        let rotated = self
            .scene
            .as_mut()
            .is_some_and(SceneGraph::rotate_background);
        self.settle()?;
        Ok(rotated)
    }

    pub fn flip_background(&mut self) -> EngineResult<bool> {
        self.ensure_ready()?;
        let flipped = self
            .scene
            .as_mut()
            .is_some_and(SceneGraph::flip_background);
        self.settle()?;
        Ok(flipped)
    }

    /// Sets the tool colour and, when an object is selected, its fill.
    pub fn set_color(&mut self, color: Color) -> EngineResult<()> {
        self.tools.set_color(color);
        let Some(id) = self.selected() else {
            return Ok(());
        };
        self.set_property(id, ObjectProperty::Fill(Some(color)))
    }

    pub fn set_brush_width(&mut self, width: f32) {
        self.tools.set_brush_width(width);
    }

    /// PNG of the current composite, named after the source file.
    pub fn export(&mut self) -> EngineResult<OutputArtifact> {
        let scene = self.scene.as_ref().ok_or(EngineError::NoDocument)?;
        self.output.export(scene, &self.source_name)
    }

    /// Objects of the live scene only, on transparency.
    pub fn overlay(&self) -> Option<RgbaImage> {
        self.scene.as_ref().map(OutputSynchronizer::overlay)
    }
}

/// Scales `image` down to fit within `limits`, keeping its aspect ratio.
fn fit_within(image: RgbaImage, limits: CanvasSize) -> RgbaImage {
    let (width, height) = image.dimensions();
    if limits.width == 0 || limits.height == 0 || (width <= limits.width && height <= limits.height)
    {
        return image;
    }
    let scale = (limits.width as f32 / width as f32).min(limits.height as f32 / height as f32);
    let target_width = ((width as f32 * scale).round() as u32).max(1);
    let target_height = ((height as f32 * scale).round() as u32).max(1);
    tracing::debug!(width, height, target_width, target_height, "scaling image to canvas limits");
    imageops::resize(&image, target_width, target_height, imageops::FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Shape;
    use crate::tools::InsertKind;
    use image::Rgba;

    fn loaded(width: u32, height: u32) -> Editor {
        let mut editor = Editor::default();
        editor
            .load_bitmap(
                RgbaImage::from_pixel(width, height, Rgba([200, 200, 200, 255])),
                "photo.jpg",
            )
            .expect("bitmap loads");
        editor
    }

    #[test]
    fn load_seeds_single_history_entry() {
        let editor = loaded(80, 60);
        assert_eq!(editor.state(), SessionState::Ready);
        assert_eq!(editor.history().len(), 1);
        assert_eq!(editor.history().cursor(), Some(0));
        assert!(!editor.can_undo());
    }

    #[test]
    fn undo_on_fresh_document_is_a_no_op() {
        let mut editor = loaded(80, 60);
        assert!(!editor.undo().expect("undo is not an error"));
        assert_eq!(editor.history().cursor(), Some(0));
    }

    #[test]
    fn oversized_images_are_fitted_to_canvas_limits() {
        let editor = loaded(1600, 600);
        assert_eq!(
            editor.scene().map(SceneGraph::size),
            Some(CanvasSize::new(800, 300))
        );
    }

    #[test]
    fn decode_failure_resets_to_empty() {
        let mut editor = loaded(10, 10);
        let err = editor
            .load_image(b"not an image", "broken.png")
            .expect_err("garbage should not decode");
        assert!(matches!(err, EngineError::DecodeFailure { .. }));
        assert_eq!(editor.state(), SessionState::Empty);
        assert!(editor.scene().is_none());
        assert!(editor.history().is_empty());
    }

    #[test]
    fn edits_without_document_report_no_document() {
        let mut editor = Editor::default();
        assert!(matches!(editor.undo(), Err(EngineError::NoDocument)));
        assert!(matches!(editor.export(), Err(EngineError::NoDocument)));
    }

    #[test]
    fn selection_changes_do_not_touch_history() {
        let mut editor = loaded(200, 200);
        let id = editor.insert(InsertKind::Rectangle).expect("insert");
        let len = editor.history().len();
        editor.select(None).expect("deselect");
        editor.select(Some(id)).expect("select");
        assert_eq!(editor.history().len(), len);
    }

    #[test]
    fn set_property_failure_leaves_history_alone() {
        let mut editor = loaded(200, 200);
        let id = editor.insert(InsertKind::Rectangle).expect("insert");
        let len = editor.history().len();
        let err = editor
            .set_property(id, ObjectProperty::Scale { x: 0.0, y: 1.0 })
            .expect_err("zero scale is invalid");
        assert!(matches!(err, EngineError::InvalidGeometry { .. }));
        assert_eq!(editor.history().len(), len);

        let err = editor
            .set_property(ObjectId(999), ObjectProperty::Opacity(0.3))
            .expect_err("unknown id");
        assert!(matches!(err, EngineError::ObjectNotFound { .. }));
        assert_eq!(editor.history().len(), len);
    }

    #[test]
    fn set_color_fills_selected_object() {
        let mut editor = loaded(200, 200);
        let id = editor.insert(InsertKind::Ellipse).expect("insert");
        editor.set_color(Color::new(9, 9, 9)).expect("colour applies");
        let scene = editor.scene().expect("scene");
        assert_eq!(scene.object(id).and_then(|o| o.fill), Some(Color::new(9, 9, 9)));
        assert_eq!(editor.tools().color(), Color::new(9, 9, 9));
    }

    #[test]
    fn filter_change_records_snapshot_and_undoes() {
        let mut editor = loaded(20, 20);
        let before = editor.composite().map(|image| *image.get_pixel(0, 0));
        editor
            .set_filter(FilterTarget::Background, FilterKind::Brightness, 0.2)
            .expect("filter applies");
        assert_eq!(editor.history().len(), 2);
        assert_ne!(editor.composite().map(|image| *image.get_pixel(0, 0)), before);

        assert!(editor.undo().expect("undo"));
        assert_eq!(editor.composite().map(|image| *image.get_pixel(0, 0)), before);
    }

    #[test]
    fn export_matches_canvas_not_zoom() {
        let mut editor = loaded(40, 30);
        editor.viewport_mut().set_zoom_percent(400);
        let artifact = editor.export().expect("export");
        let decoded = image::load_from_memory(&artifact.pixel_data)
            .expect("png decodes")
            .to_rgba8();
        assert_eq!(decoded.dimensions(), (40, 30));
        assert_eq!(artifact.filename, "edited_photo.png");
    }

    #[test]
    fn delete_selected_removes_inserted_object() {
        let mut editor = loaded(200, 200);
        let id = editor.insert(InsertKind::Text).expect("insert");
        assert!(matches!(
            editor.scene().and_then(|scene| scene.object(id)).map(|o| &o.shape),
            Some(Shape::Text { .. })
        ));
        assert!(editor.delete_selected().expect("delete"));
        assert_eq!(editor.scene().map(SceneGraph::object_count), Some(0));
        assert!(!editor.delete_selected().expect("nothing selected"));
    }
}
