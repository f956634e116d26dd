use std::sync::Arc;

use image::RgbaImage;

use crate::collab::{CollaboratorError, CollaboratorResult, DocumentAssembler, Rasterizer};
use crate::error::{EngineError, EngineResult};
use crate::output::OutputSynchronizer;
use crate::scene::{QuarterTurns, SceneGraph};
use crate::session::{parse_page_range, PageContext, PageEdits, PageTicket};
use crate::state::{SessionEvent, SessionState};
use crate::tools::ToolMode;
use crate::worker::{spawn_worker, PendingResult, WorkerPoll};

use super::Editor;

pub type PageReply = (PageTicket, CollaboratorResult<RgbaImage>);

/// Rasterises the ticket's page on a worker thread.
pub fn spawn_page_render<R>(
    rasterizer: Arc<R>,
    ticket: PageTicket,
    scale: f32,
) -> PendingResult<PageReply>
where
    R: Rasterizer + Send + Sync + ?Sized + 'static,
{
    spawn_worker(move || {
        let result = rasterizer.render_page(ticket.page - 1, scale);
        (ticket, result)
    })
}

impl Editor {
    /// Starts loading a paged document; page 1 is requested immediately.
    /// Complete the returned ticket with [`Editor::complete_page`].
    pub fn begin_document(
        &mut self,
        page_count: usize,
        source_name: &str,
    ) -> EngineResult<PageTicket> {
        self.unload()?;
        self.lifecycle.transition(SessionEvent::BeginLoad)?;
        if page_count == 0 {
            self.lifecycle.transition(SessionEvent::LoadFailed)?;
            return Err(EngineError::DecodeFailure {
                message: "document has no pages".to_string(),
            });
        }
        let mut pages = PageContext::new(page_count, self.config.working_scale());
        let ticket = pages.begin_page(1).ok_or_else(|| EngineError::DecodeFailure {
            message: "document has no pages".to_string(),
        })?;
        self.pages = Some(pages);
        self.source_name = source_name.to_string();
        tracing::info!(source = source_name, page_count, "document opened");
        Ok(ticket)
    }

    /// Opens a paged document and rasterises its first page synchronously.
    pub fn open_document(
        &mut self,
        rasterizer: &dyn Rasterizer,
        source_name: &str,
    ) -> EngineResult<()> {
        let ticket = self.begin_document(rasterizer.page_count(), source_name)?;
        let scale = self.config.working_scale();
        let result = rasterizer.render_page(ticket.page - 1, scale);
        self.complete_page(ticket, result).map(|_| ())
    }

    /// Requests page `page` (1-based). The outgoing page stays live until the
    /// load completes. `None` for the current page or one out of range.
    pub fn begin_page(&mut self, page: usize) -> EngineResult<Option<PageTicket>> {
        let state = self.lifecycle.state();
        let Some(pages) = self.pages.as_ref() else {
            return Ok(None);
        };
        if !pages.contains_page(page)
            || (state == SessionState::Ready && pages.active_page() == Some(page))
        {
            return Ok(None);
        }
        match state {
            SessionState::Ready => {
                self.switch_mode(ToolMode::Select)?;
                self.settle()?;
                self.lifecycle.transition(SessionEvent::BeginPageSwitch)?;
            }
            SessionState::SwitchingPage | SessionState::Loading => {}
            SessionState::Empty => return Ok(None),
        }
        let ticket = self.pages.as_mut().and_then(|pages| pages.begin_page(page));
        tracing::debug!(page, "page requested");
        Ok(ticket)
    }

    /// Installs a rasterised page. Stale tickets are ignored and yield
    /// `Ok(false)`. On failure the previous page remains editable.
    pub fn complete_page(
        &mut self,
        ticket: PageTicket,
        result: CollaboratorResult<RgbaImage>,
    ) -> EngineResult<bool> {
        let accepted = self
            .pages
            .as_mut()
            .is_some_and(|pages| pages.accept(ticket));
        if !accepted {
            return Ok(false);
        }
        let initial = self.lifecycle.state() == SessionState::Loading;

        let scene = result
            .map_err(|source| EngineError::from_collaborator("rasterizer", source))
            .and_then(|image| self.page_scene(ticket.page, image));
        let scene = match scene {
            Ok(scene) => scene,
            Err(err) => {
                tracing::warn!(page = ticket.page, %err, "page load failed");
                if initial {
                    self.reset_document();
                    self.lifecycle.transition(SessionEvent::LoadFailed)?;
                } else {
                    self.lifecycle.transition(SessionEvent::PageSwitchFailed)?;
                }
                return Err(err);
            }
        };

        self.flush_active_page()?;
        self.install_scene(scene)?;
        if let Some(pages) = self.pages.as_mut() {
            pages.set_active_page(ticket.page);
        }
        let event = if initial {
            SessionEvent::Loaded
        } else {
            SessionEvent::PageSwitched
        };
        self.lifecycle.transition(event)?;
        tracing::info!(page = ticket.page, "page active");
        Ok(true)
    }

    /// Applies a worker-rendered page if it has arrived. Returns `Ok(true)`
    /// once the reply has been consumed.
    pub fn poll_page(&mut self, pending: &PendingResult<PageReply>) -> EngineResult<bool> {
        match pending.try_take() {
            WorkerPoll::Pending => Ok(false),
            WorkerPoll::Ready((ticket, result)) => {
                self.complete_page(ticket, result).map(|_| true)
            }
            WorkerPoll::Disconnected => {
                let pending_ticket = self.pages.as_ref().and_then(PageContext::pending);
                match pending_ticket {
                    Some(ticket) => self
                        .complete_page(ticket, Err(CollaboratorError::Disconnected))
                        .map(|_| true),
                    None => Ok(true),
                }
            }
        }
    }

    /// Working scale pages of the open document are rasterised at.
    pub fn page_scale(&self) -> f32 {
        self.pages
            .as_ref()
            .map_or(self.config.working_scale(), PageContext::working_scale)
    }

    /// Navigates to `page`, rasterising it synchronously.
    pub fn activate_page(
        &mut self,
        page: usize,
        rasterizer: &dyn Rasterizer,
    ) -> EngineResult<bool> {
        let Some(ticket) = self.begin_page(page)? else {
            return Ok(false);
        };
        let result = rasterizer.render_page(page - 1, self.page_scale());
        self.complete_page(ticket, result)
    }

    /// Scene for `page`: its stored edits if it was visited before,
    /// otherwise the freshly rasterised bitmap.
    fn page_scene(&self, page: usize, image: RgbaImage) -> EngineResult<SceneGraph> {
        match self.pages.as_ref().and_then(|pages| pages.edits(page)) {
            Some(edits) => SceneGraph::from_snapshot(&edits.snapshot, edits.bitmaps.clone()),
            None => Ok(SceneGraph::with_background(image)),
        }
    }

    /// Stores the live page's state in the page context.
    fn flush_active_page(&mut self) -> EngineResult<()> {
        let (Some(pages), Some(scene)) = (self.pages.as_mut(), self.scene.as_ref()) else {
            return Ok(());
        };
        let Some(page) = pages.active_page() else {
            return Ok(());
        };
        let edits = PageEdits {
            snapshot: scene.capture()?,
            bitmaps: scene.bitmaps().clone(),
            overlay: OutputSynchronizer::overlay(scene),
            object_count: scene.object_count(),
        };
        pages.store_edits(page, edits);
        Ok(())
    }

    pub fn rotate_page(&mut self, page: usize) -> EngineResult<QuarterTurns> {
        let pages = self.pages.as_mut().ok_or(EngineError::NoDocument)?;
        pages.rotate_page(page)
    }

    /// Parses a page selection such as `"1-3, 5"` against the open document.
    pub fn page_range(&self, input: &str) -> EngineResult<Vec<usize>> {
        let pages = self.pages.as_ref().ok_or(EngineError::NoDocument)?;
        parse_page_range(input, pages.page_count())
    }

    /// Hands every page, in order, to `assembler`. The live page is flushed
    /// first so its latest edits are included.
    pub fn assemble(&mut self, assembler: &dyn DocumentAssembler) -> EngineResult<Vec<u8>> {
        if self.pages.is_none() {
            return Err(EngineError::NoDocument);
        }
        self.flush_active_page()?;
        let pages = self
            .pages
            .as_ref()
            .map(PageContext::assembly_pages)
            .unwrap_or_default();
        let bytes = assembler
            .assemble(&pages)
            .map_err(|source| EngineError::from_collaborator("assembler", source))?;
        tracing::info!(pages = pages.len(), bytes = bytes.len(), "document assembled");
        Ok(bytes)
    }
}
