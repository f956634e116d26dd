use crate::error::{EngineError, EngineResult};
use crate::geometry::Rect;
use crate::render::render_background;
use crate::scene::ObjectId;
use crate::tools::{
    crop_background, is_mask_stroke, patch_object, plan_removal, proposal_object, sample_patch,
    CropPreset, InsertKind, ToolMode,
};

use super::Editor;

impl Editor {
    /// Switches tool mode. Leaving Crop discards the proposal and leaving
    /// MaskCapture without confirming discards the mask strokes.
    pub fn set_mode(&mut self, mode: ToolMode) -> EngineResult<()> {
        if let ToolMode::InsertPending(kind) = mode {
            return self.insert(kind).map(|_| ());
        }
        if self.scene.is_none() {
            self.tools.set_mode(mode);
            return Ok(());
        }
        self.ensure_ready()?;
        self.switch_mode(mode)?;
        self.settle()
    }

    pub(super) fn switch_mode(&mut self, mode: ToolMode) -> EngineResult<()> {
        self.revert_drag();
        let previous = self.tools.mode();
        if previous == ToolMode::Crop && mode != ToolMode::Crop {
            self.discard_crop_proposal();
        }
        if previous == ToolMode::MaskCapture && mode != ToolMode::MaskCapture {
            self.discard_mask_strokes();
        }
        self.tools.set_mode(mode);
        self.enter_mode(mode)
    }

    pub(super) fn enter_mode(&mut self, mode: ToolMode) -> EngineResult<()> {
        let Some(scene) = self.scene.as_mut() else {
            return Ok(());
        };
        match mode {
            ToolMode::Crop if self.tools.crop_proposal().is_none() => {
                let bounds = self.tools.crop_preset().proposal(scene.size());
                let id = scene.add_transient_object(proposal_object(bounds))?;
                self.tools.set_crop_proposal(Some(id));
                scene.set_selection(Some(id));
            }
            ToolMode::Crop | ToolMode::Select | ToolMode::InsertPending(_) => {}
            ToolMode::Draw(_) | ToolMode::Erase | ToolMode::MaskCapture => {
                scene.set_selection(None);
            }
        }
        self.tools.apply_interaction_flags(scene);
        Ok(())
    }

    /// Re-establishes mode sub-state lost when a snapshot replaced the scene.
    pub(super) fn reapply_mode_effects(&mut self, proposal: Option<Rect>) -> EngineResult<()> {
        let Some(scene) = self.scene.as_mut() else {
            return Ok(());
        };
        if let (ToolMode::Crop, Some(bounds)) = (self.tools.mode(), proposal) {
            let id = scene.add_transient_object(proposal_object(bounds))?;
            self.tools.set_crop_proposal(Some(id));
            scene.set_selection(Some(id));
        }
        self.tools.apply_interaction_flags(scene);
        Ok(())
    }

    pub(super) fn discard_crop_proposal(&mut self) {
        if let (Some(scene), Some(id)) = (self.scene.as_mut(), self.tools.crop_proposal()) {
            scene.remove_object(id);
        }
        self.tools.set_crop_proposal(None);
    }

    /// Removes every mask stroke as one history step.
    fn discard_mask_strokes(&mut self) -> usize {
        let Some(scene) = self.scene.as_mut() else {
            return 0;
        };
        let masks: Vec<ObjectId> = scene
            .objects()
            .iter()
            .filter(|object| is_mask_stroke(object))
            .map(|object| object.id)
            .collect();
        if masks.is_empty() {
            return 0;
        }
        scene.begin_batch();
        for id in &masks {
            scene.remove_object(*id);
        }
        scene.end_batch("discard-mask");
        tracing::debug!(count = masks.len(), "mask strokes discarded");
        masks.len()
    }

    /// Places a default object of `kind` at the canvas centre and selects it.
    pub fn insert(&mut self, kind: InsertKind) -> EngineResult<ObjectId> {
        self.ensure_ready()?;
        self.switch_mode(ToolMode::Select)?;
        let color = self.tools.color();
        let scene = self.scene.as_mut().ok_or(EngineError::NoDocument)?;
        let id = scene.add_object(kind.default_object(scene.size(), color))?;
        scene.set_selection(Some(id));
        self.settle()?;
        tracing::debug!(kind = kind.label(), %id, "object inserted");
        Ok(id)
    }

    /// Changes the crop preset; an open proposal is replaced to match.
    pub fn set_crop_preset(&mut self, preset: CropPreset) -> EngineResult<()> {
        self.tools.set_crop_preset(preset);
        if self.tools.mode() != ToolMode::Crop || self.scene.is_none() {
            return Ok(());
        }
        self.discard_crop_proposal();
        self.enter_mode(ToolMode::Crop)?;
        self.settle()
    }

    /// Crops the background to the proposal and shifts every object by the
    /// crop origin, as one history step. Returns `false` outside Crop mode.
    pub fn confirm_crop(&mut self) -> EngineResult<bool> {
        self.ensure_ready()?;
        let Some(id) = self.tools.crop_proposal() else {
            return Ok(false);
        };
        let scene = self.scene.as_mut().ok_or(EngineError::NoDocument)?;
        let bounds = scene.bounding_rect(id)?;
        let rendered = render_background(scene);
        let (cropped, origin) = crop_background(&rendered, bounds, scene.size())?;

        scene.remove_object(id);
        self.tools.set_crop_proposal(None);
        scene.begin_batch();
        scene.replace_background(cropped);
        scene.translate_all(-origin.x, -origin.y);
        scene.end_batch("crop");
        self.switch_mode(ToolMode::Select)?;
        self.settle()?;
        tracing::info!(x = origin.x, y = origin.y, "crop applied");
        Ok(true)
    }

    pub fn cancel_crop(&mut self) -> EngineResult<()> {
        if self.tools.mode() != ToolMode::Crop {
            return Ok(());
        }
        self.set_mode(ToolMode::Select)
    }

    /// Covers the masked area with a patch of neighbouring background and
    /// removes the mask strokes, as one history step. With no strokes the
    /// mode simply returns to Select.
    pub fn confirm_removal(&mut self) -> EngineResult<bool> {
        self.ensure_ready()?;
        if self.tools.mode() != ToolMode::MaskCapture {
            return Ok(false);
        }
        let scene = self.scene.as_mut().ok_or(EngineError::NoDocument)?;
        let Some(plan) = plan_removal(scene.objects(), scene.size()) else {
            self.switch_mode(ToolMode::Select)?;
            self.settle()?;
            return Ok(false);
        };
        let patch = sample_patch(&render_background(scene), plan.source);

        scene.begin_batch();
        for id in &plan.mask_ids {
            scene.remove_object(*id);
        }
        let bitmap = scene.insert_bitmap(patch);
        let added = scene.add_object(patch_object(bitmap, plan.bounds));
        scene.end_batch("remove-object");
        added?;

        self.switch_mode(ToolMode::Select)?;
        self.settle()?;
        tracing::info!(masks = plan.mask_ids.len(), "object removal applied");
        Ok(true)
    }

    pub fn cancel_removal(&mut self) -> EngineResult<()> {
        if self.tools.mode() != ToolMode::MaskCapture {
            return Ok(());
        }
        self.set_mode(ToolMode::Select)
    }
}
