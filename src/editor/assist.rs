use std::sync::Arc;

use crate::collab::{
    rank_suggestions, resolve_ocr_language, AssistOptions, AssistOutput, AssistService,
    CollaboratorError, CollaboratorResult, Suggestion,
};
use crate::error::{EngineError, EngineResult};
use crate::output::{encode_png, OutputArtifact};
use crate::scene::SceneGraph;
use crate::tools::ToolMode;
use crate::worker::{spawn_worker, PendingResult, WorkerPoll};

use super::Editor;

/// Identifies one outstanding assist request. Only the most recent ticket
/// for the current document is honoured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssistTicket {
    generation: u64,
}

/// Everything a host needs to call an [`AssistService`] off the editor thread.
#[derive(Debug, Clone)]
pub struct AssistRequest {
    pub ticket: AssistTicket,
    /// Current composite, PNG encoded.
    pub input: Vec<u8>,
    pub options: AssistOptions,
}

pub type AssistReply = (AssistTicket, CollaboratorResult<AssistOutput>);

/// Runs `request` against `service` on a worker thread. Feed the reply back
/// through [`Editor::complete_assist`] on the editor's thread.
pub fn spawn_assist(
    service: Arc<dyn AssistService>,
    request: AssistRequest,
) -> PendingResult<AssistReply> {
    spawn_worker(move || {
        let result = service.request(&request.input, &request.options);
        (request.ticket, result)
    })
}

impl Editor {
    /// Applies a worker reply if one has arrived. Returns `Ok(true)` once the
    /// reply has been consumed, whether or not it was still current.
    pub fn poll_assist(&mut self, pending: &PendingResult<AssistReply>) -> EngineResult<bool> {
        match pending.try_take() {
            WorkerPoll::Pending => Ok(false),
            WorkerPoll::Ready((ticket, result)) => {
                self.complete_assist(ticket, result).map(|_| true)
            }
            WorkerPoll::Disconnected => match self.pending_assist {
                Some(ticket) => self
                    .complete_assist(ticket, Err(CollaboratorError::Disconnected))
                    .map(|_| true),
                None => Ok(true),
            },
        }
    }

    /// OCR options for the configured (or locale-detected) language.
    pub fn ocr_options(&self) -> AssistOptions {
        AssistOptions::ocr(resolve_ocr_language(self.config.ocr_language.as_deref()))
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    pub fn recognized_text(&self) -> Option<&str> {
        self.recognized_text.as_deref()
    }

    /// Plain-text artifact of the last OCR result.
    pub fn export_text(&self) -> Option<OutputArtifact> {
        self.recognized_text
            .as_deref()
            .map(|text| OutputArtifact::text(text, &self.source_name))
    }

    /// Snapshots the composite for an assist call and supersedes any
    /// request still in flight.
    pub fn begin_assist(&mut self, options: AssistOptions) -> EngineResult<AssistRequest> {
        self.ensure_ready()?;
        let scene = self.scene.as_ref().ok_or(EngineError::NoDocument)?;
        let input = encode_png(&self.output.sync(scene))?;
        self.assist_generation = self.assist_generation.saturating_add(1);
        let ticket = AssistTicket {
            generation: self.assist_generation,
        };
        self.pending_assist = Some(ticket);
        tracing::debug!(task = ?options.task, bytes = input.len(), "assist requested");
        Ok(AssistRequest {
            ticket,
            input,
            options,
        })
    }

    /// Applies an assist result. Superseded tickets yield `Ok(false)`; an
    /// image result replaces the background as one history step.
    pub fn complete_assist(
        &mut self,
        ticket: AssistTicket,
        result: CollaboratorResult<AssistOutput>,
    ) -> EngineResult<bool> {
        if self.pending_assist != Some(ticket) {
            tracing::debug!(generation = ticket.generation, "stale assist result discarded");
            return Ok(false);
        }
        self.pending_assist = None;
        let output = result.map_err(|source| EngineError::from_collaborator("assist", source))?;
        match output {
            AssistOutput::Suggestions(suggestions) => {
                self.suggestions = rank_suggestions(suggestions);
                tracing::debug!(count = self.suggestions.len(), "suggestions received");
            }
            AssistOutput::Text(text) => {
                tracing::debug!(chars = text.chars().count(), "text recognised");
                self.recognized_text = Some(text);
            }
            AssistOutput::Image(bytes) => {
                self.ensure_ready()?;
                let image = image::load_from_memory(&bytes)
                    .map_err(|err| EngineError::DecodeFailure {
                        message: err.to_string(),
                    })?
                    .to_rgba8();
                let before = self.scene.as_ref().map(SceneGraph::size);
                if let Some(scene) = self.scene.as_mut() {
                    scene.replace_background(image);
                }
                let resized = self.scene.as_ref().map(SceneGraph::size) != before;
                if resized && self.tools.mode() == ToolMode::Crop {
                    self.discard_crop_proposal();
                    self.enter_mode(ToolMode::Crop)?;
                }
                self.settle()?;
                tracing::info!("assist edit applied");
            }
        }
        Ok(true)
    }

    /// Runs one assist request synchronously against `service`.
    pub fn request_assist(
        &mut self,
        service: &dyn AssistService,
        options: AssistOptions,
    ) -> EngineResult<bool> {
        let request = self.begin_assist(options)?;
        let result = service.request(&request.input, &request.options);
        self.complete_assist(request.ticket, result)
    }
}
