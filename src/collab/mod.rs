mod ocr;

pub use ocr::{detect_ocr_language, parse_ocr_language, resolve_ocr_language, OcrLanguage};

use image::RgbaImage;
use thiserror::Error;

use crate::scene::QuarterTurns;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    #[error("document is password protected")]
    PasswordRequired,
    #[error("incorrect document password")]
    IncorrectPassword,
    #[error("could not decode input: {message}")]
    Decode { message: String },
    #[error("page {page} is out of range")]
    PageOutOfRange { page: usize },
    #[error("request rejected: {message}")]
    Rejected { message: String },
    #[error("request timed out")]
    TimedOut,
    #[error("worker disconnected before replying")]
    Disconnected,
}

pub type CollaboratorResult<T> = std::result::Result<T, CollaboratorError>;

/// Renders document pages to bitmaps. Must be deterministic for identical inputs.
pub trait Rasterizer {
    fn page_count(&self) -> usize;

    /// `page_index` is zero-based; `scale` multiplies the native page size.
    fn render_page(&self, page_index: usize, scale: f32) -> CollaboratorResult<RgbaImage>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageContent {
    /// Overlay-only composite; the assembler supplies the original page beneath.
    Overlay(RgbaImage),
    /// Untouched page carried through from the source document.
    Original { page_index: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyPage {
    pub content: PageContent,
    pub rotation: QuarterTurns,
}

/// Packages pages into an output document, preserving order and applying rotation.
pub trait DocumentAssembler {
    fn assemble(&self, pages: &[AssemblyPage]) -> CollaboratorResult<Vec<u8>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistTask {
    /// Text recognition.
    Ocr,
    /// Ranked suggestions for what to do with the input.
    Suggest,
    /// Prompt-driven image edit returning new pixels.
    Edit { prompt: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistOptions {
    pub task: AssistTask,
    pub language: Option<OcrLanguage>,
}

impl AssistOptions {
    pub fn ocr(language: OcrLanguage) -> Self {
        Self {
            task: AssistTask::Ocr,
            language: Some(language),
        }
    }

    pub fn suggest() -> Self {
        Self {
            task: AssistTask::Suggest,
            language: None,
        }
    }

    pub fn edit(prompt: impl Into<String>) -> Self {
        Self {
            task: AssistTask::Edit {
                prompt: prompt.into(),
            },
            language: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub message: String,
    pub tool_id: String,
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AssistOutput {
    Suggestions(Vec<Suggestion>),
    Text(String),
    /// Encoded image bytes.
    Image(Vec<u8>),
}

/// Single-shot AI/OCR service. Failures are surfaced to the caller, never retried.
pub trait AssistService: Send + Sync {
    fn request(&self, input: &[u8], options: &AssistOptions) -> CollaboratorResult<AssistOutput>;
}

/// Orders suggestions by descending confidence.
pub fn rank_suggestions(mut suggestions: Vec<Suggestion>) -> Vec<Suggestion> {
    suggestions.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suggestion(tool_id: &str, confidence: f32) -> Suggestion {
        Suggestion {
            message: format!("try {tool_id}"),
            tool_id: tool_id.to_string(),
            confidence,
        }
    }

    #[test]
    fn rank_suggestions_orders_by_confidence() {
        let ranked = rank_suggestions(vec![
            suggestion("ocr", 0.6),
            suggestion("merge-pdf", 0.95),
            suggestion("compress-image", 0.9),
        ]);
        let order = ranked
            .iter()
            .map(|item| item.tool_id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(order, vec!["merge-pdf", "compress-image", "ocr"]);
    }

    #[test]
    fn rejection_message_is_displayed() {
        let err = CollaboratorError::Rejected {
            message: "quota".to_string(),
        };
        assert_eq!(err.to_string(), "request rejected: quota");
    }
}
