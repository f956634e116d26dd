use crate::error::EngineResult;
use crate::input::{resolve_shortcut, InputContext, ShortcutAction, ShortcutKey, ShortcutModifiers};
use crate::output::OutputArtifact;
use crate::scene::ZDirection;
use crate::session::PageTicket;
use crate::tools::{DrawVariant, InsertKind, ToolMode};

use super::Editor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShortcutOutcome {
    Applied,
    Ignored,
    Exported(OutputArtifact),
    /// The host should rasterise this page and call `complete_page`.
    PageRequested(PageTicket),
}

impl Editor {
    pub fn input_context(&self) -> InputContext {
        let mode = self.tools.mode();
        InputContext {
            document_loaded: self.scene.is_some() && self.lifecycle.state().accepts_edits(),
            crop_active: mode == ToolMode::Crop,
            mask_active: mode == ToolMode::MaskCapture,
            select_mode: mode == ToolMode::Select,
            multi_page: self.pages.as_ref().is_some_and(|pages| pages.page_count() > 1),
        }
    }

    pub fn handle_key(
        &mut self,
        key: ShortcutKey,
        modifiers: ShortcutModifiers,
    ) -> EngineResult<ShortcutOutcome> {
        match resolve_shortcut(key, modifiers, self.input_context()) {
            Some(action) => self.handle_shortcut(action),
            None => Ok(ShortcutOutcome::Ignored),
        }
    }

    pub fn handle_shortcut(&mut self, action: ShortcutAction) -> EngineResult<ShortcutOutcome> {
        tracing::debug!(?action, "shortcut");
        let applied = match action {
            ShortcutAction::CropApply => self.confirm_crop()?,
            ShortcutAction::RemovalApply => self.confirm_removal()?,
            ShortcutAction::CropCancel => {
                self.cancel_crop()?;
                true
            }
            ShortcutAction::RemovalCancel => {
                self.cancel_removal()?;
                true
            }
            ShortcutAction::Undo => self.undo()?,
            ShortcutAction::Redo => self.redo()?,
            ShortcutAction::DeleteSelection => self.delete_selected()?,
            ShortcutAction::Export => return self.export().map(ShortcutOutcome::Exported),
            ShortcutAction::EnterSelect => self.enter(ToolMode::Select)?,
            ShortcutAction::EnterDraw => self.enter(ToolMode::Draw(DrawVariant::Pen))?,
            ShortcutAction::EnterHighlighter => {
                self.enter(ToolMode::Draw(DrawVariant::Highlighter))?
            }
            ShortcutAction::EnterErase => self.enter(ToolMode::Erase)?,
            ShortcutAction::EnterCrop => self.enter(ToolMode::Crop)?,
            ShortcutAction::EnterMask => self.enter(ToolMode::MaskCapture)?,
            ShortcutAction::InsertText => self.insert(InsertKind::Text).map(|_| true)?,
            ShortcutAction::InsertRectangle => self.insert(InsertKind::Rectangle).map(|_| true)?,
            ShortcutAction::InsertEllipse => self.insert(InsertKind::Ellipse).map(|_| true)?,
            ShortcutAction::BringForward => self.reorder_selected(ZDirection::Forward)?,
            ShortcutAction::SendBackward => self.reorder_selected(ZDirection::Backward)?,
            ShortcutAction::RotateBackground => self.rotate_background()?,
            ShortcutAction::FlipBackground => self.flip_background()?,
            ShortcutAction::ZoomIn => {
                self.viewport.zoom_in();
                true
            }
            ShortcutAction::ZoomOut => {
                self.viewport.zoom_out();
                true
            }
            ShortcutAction::ZoomReset => {
                self.viewport.set_actual_size();
                true
            }
            ShortcutAction::NextPage | ShortcutAction::PreviousPage => {
                return self.request_adjacent_page(action == ShortcutAction::NextPage);
            }
        };
        Ok(if applied {
            ShortcutOutcome::Applied
        } else {
            ShortcutOutcome::Ignored
        })
    }

    fn enter(&mut self, mode: ToolMode) -> EngineResult<bool> {
        self.set_mode(mode)?;
        Ok(true)
    }

    fn reorder_selected(&mut self, direction: ZDirection) -> EngineResult<bool> {
        match self.selected() {
            Some(id) => self.reorder(id, direction),
            None => Ok(false),
        }
    }

    fn request_adjacent_page(&mut self, forward: bool) -> EngineResult<ShortcutOutcome> {
        let Some(active) = self.pages.as_ref().and_then(|pages| pages.active_page()) else {
            return Ok(ShortcutOutcome::Ignored);
        };
        let target = if forward {
            active.saturating_add(1)
        } else {
            active.saturating_sub(1)
        };
        Ok(match self.begin_page(target)? {
            Some(ticket) => ShortcutOutcome::PageRequested(ticket),
            None => ShortcutOutcome::Ignored,
        })
    }
}
