use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use image::{ImageFormat, RgbaImage};

use crate::error::{EngineError, EngineResult};
use crate::render::{composite, CompositeOptions};
use crate::scene::SceneGraph;

pub const PNG_MIME_TYPE: &str = "image/png";
pub const TEXT_MIME_TYPE: &str = "text/plain";

/// Bytes handed to the packaging layer. `mime_type` always matches the
/// encoding of `pixel_data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArtifact {
    pub pixel_data: Vec<u8>,
    pub filename: String,
    pub mime_type: &'static str,
}

impl OutputArtifact {
    pub fn png(image: &RgbaImage, source_name: &str) -> EngineResult<Self> {
        Ok(Self {
            pixel_data: encode_png(image)?,
            filename: edited_filename(source_name),
            mime_type: PNG_MIME_TYPE,
        })
    }

    pub fn text(text: &str, source_name: &str) -> Self {
        Self {
            pixel_data: text.as_bytes().to_vec(),
            filename: format!("{source_name}_ocr.txt"),
            mime_type: TEXT_MIME_TYPE,
        }
    }
}

/// `photo.jpg` becomes `edited_photo.png`.
pub fn edited_filename(source_name: &str) -> String {
    let stem = Path::new(source_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .unwrap_or("image");
    format!("edited_{stem}.png")
}

pub fn encode_png(image: &RgbaImage) -> EngineResult<Vec<u8>> {
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, ImageFormat::Png)
        .map_err(|err| EngineError::Encode {
            message: err.to_string(),
        })?;
    Ok(bytes.into_inner())
}

/// Cached native-resolution composite, refreshed once per settled edit.
#[derive(Debug, Default)]
pub struct OutputSynchronizer {
    composite: Option<Arc<RgbaImage>>,
    dirty: bool,
    revision: u64,
}

impl OutputSynchronizer {
    pub fn new() -> Self {
        Self {
            composite: None,
            dirty: true,
            revision: 0,
        }
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Number of recompositions performed so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Recomposites if anything changed since the last sync.
    pub fn sync(&mut self, scene: &SceneGraph) -> Arc<RgbaImage> {
        match &self.composite {
            Some(current) if !self.dirty => Arc::clone(current),
            _ => {
                let image = Arc::new(composite(scene, CompositeOptions::EXPORT));
                self.revision = self.revision.saturating_add(1);
                self.dirty = false;
                tracing::trace!(
                    revision = self.revision,
                    width = image.width(),
                    height = image.height(),
                    "output recomposited"
                );
                self.composite = Some(Arc::clone(&image));
                image
            }
        }
    }

    pub fn latest(&self) -> Option<&Arc<RgbaImage>> {
        self.composite.as_ref()
    }

    pub fn export(&mut self, scene: &SceneGraph, source_name: &str) -> EngineResult<OutputArtifact> {
        let image = self.sync(scene);
        let artifact = OutputArtifact::png(&image, source_name)?;
        tracing::info!(
            filename = %artifact.filename,
            bytes = artifact.pixel_data.len(),
            "output exported"
        );
        Ok(artifact)
    }

    /// Objects drawn by this scene alone, on transparency.
    pub fn overlay(scene: &SceneGraph) -> RgbaImage {
        composite(scene, CompositeOptions::OVERLAY)
    }

    pub fn reset(&mut self) {
        self.composite = None;
        self.dirty = true;
    }
}
