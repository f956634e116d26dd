use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BitmapId(pub u64);

impl fmt::Display for BitmapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bitmap-{}", self.0)
    }
}

/// Append-only pool of decoded pixel data referenced by snapshots.
///
/// Bitmaps are never mutated or evicted within a session, so every snapshot
/// in the history keeps resolving to the pixels it was taken with.
#[derive(Debug, Clone, Default)]
pub struct BitmapStore {
    bitmaps: HashMap<BitmapId, Arc<RgbaImage>>,
    next_id: u64,
}

impl BitmapStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, image: RgbaImage) -> BitmapId {
        let id = BitmapId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.bitmaps.insert(id, Arc::new(image));
        id
    }

    pub fn get(&self, id: BitmapId) -> Option<&Arc<RgbaImage>> {
        self.bitmaps.get(&id)
    }

    pub fn len(&self) -> usize {
        self.bitmaps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bitmaps.is_empty()
    }
}
