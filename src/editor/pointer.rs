use crate::error::EngineResult;
use crate::geometry::Point;
use crate::scene::ObjectProperty;
use crate::tools::ToolMode;

use super::Editor;

impl Editor {
    fn accepts_pointer(&self, point: Point) -> bool {
        let ready = self.scene.is_some() && self.lifecycle.state().accepts_edits();
        if !ready {
            tracing::trace!(x = point.x, y = point.y, state = ?self.lifecycle.state(), "pointer input dropped");
        }
        ready
    }

    /// Pointer press in canvas coordinates, dispatched on the current mode.
    pub fn pointer_down(&mut self, point: Point) -> EngineResult<()> {
        if !self.accepts_pointer(point) {
            return Ok(());
        }
        let mode = self.tools.mode();
        let Some(scene) = self.scene.as_mut() else {
            return Ok(());
        };
        match mode {
            ToolMode::Select | ToolMode::Crop => {
                let hit = scene
                    .hit_test(point)
                    .filter(|id| scene.object(*id).is_some_and(|object| object.selectable));
                match hit {
                    Some(id) => {
                        scene.set_selection(Some(id));
                        self.tools.begin_drag(id, point);
                    }
                    None if mode == ToolMode::Select => scene.set_selection(None),
                    None => {}
                }
            }
            ToolMode::Draw(_) | ToolMode::MaskCapture => {
                self.tools.begin_stroke(point);
            }
            ToolMode::Erase => {
                if let Some(id) = scene.hit_test(point) {
                    scene.remove_object(id);
                    tracing::debug!(%id, "object erased");
                }
            }
            ToolMode::InsertPending(_) => {}
        }
        self.settle()
    }

    /// Drags the grabbed object or extends the live stroke. Neither is
    /// recorded until the pointer is released.
    pub fn pointer_move(&mut self, point: Point) -> EngineResult<()> {
        if !self.accepts_pointer(point) {
            return Ok(());
        }
        if let Some(drag) = self.tools.drag_mut() {
            let (dx, dy) = (point.x - drag.last.x, point.y - drag.last.y);
            drag.last = point;
            let id = drag.id;
            if let Some(scene) = self.scene.as_mut() {
                scene.translate_preview(id, dx, dy)?;
            }
            return Ok(());
        }
        self.tools.extend_stroke(point);
        Ok(())
    }

    /// Commits the drag as one position change, or the stroke as one path.
    pub fn pointer_up(&mut self, point: Point) -> EngineResult<()> {
        if !self.accepts_pointer(point) {
            return Ok(());
        }
        if let Some(drag) = self.tools.finish_drag() {
            if drag.origin != drag.last || drag.last != point {
                let Some(scene) = self.scene.as_mut() else {
                    return Ok(());
                };
                let (dx, dy) = (point.x - drag.last.x, point.y - drag.last.y);
                if let Some(object) = scene.object(drag.id) {
                    let position = object.position().offset(dx, dy);
                    scene.set_object_property(drag.id, ObjectProperty::Position(position))?;
                }
            }
            return self.settle();
        }
        if let Some(mut stroke) = self.tools.finish_stroke() {
            stroke.append_point(point);
            if let Some(scene) = self.scene.as_mut() {
                let id = scene.add_object(stroke.into_object())?;
                tracing::debug!(%id, "stroke committed");
            }
            return self.settle();
        }
        Ok(())
    }

    /// Ends an in-flight drag without committing it, putting the object back
    /// where the drag started.
    pub(super) fn revert_drag(&mut self) {
        let Some(drag) = self.tools.finish_drag() else {
            return;
        };
        let (dx, dy) = (drag.origin.x - drag.last.x, drag.origin.y - drag.last.y);
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        let Some(scene) = self.scene.as_mut() else {
            return;
        };
        match scene.translate_preview(drag.id, dx, dy) {
            Ok(()) => tracing::debug!(id = %drag.id, "uncommitted drag reverted"),
            Err(err) => tracing::trace!(id = %drag.id, %err, "dragged object already gone"),
        }
    }
}
