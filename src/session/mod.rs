use std::collections::{BTreeMap, BTreeSet};

use image::RgbaImage;

use crate::collab::{AssemblyPage, PageContent};
use crate::error::{EngineError, EngineResult};
use crate::history::Snapshot;
use crate::scene::{BitmapStore, QuarterTurns};

/// Handle for one requested page load. Completions carrying a superseded
/// generation are stale and must be discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTicket {
    /// 1-based page number.
    pub page: usize,
    pub generation: u64,
}

/// State of a page captured when the editor navigates away from it.
#[derive(Debug, Clone)]
pub struct PageEdits {
    pub snapshot: Snapshot,
    pub bitmaps: BitmapStore,
    /// Objects only, on transparency, at working scale.
    pub overlay: RgbaImage,
    pub object_count: usize,
}

#[derive(Debug)]
pub struct PageContext {
    page_count: usize,
    working_scale: f32,
    active_page: Option<usize>,
    pending: Option<PageTicket>,
    generation: u64,
    edits: BTreeMap<usize, PageEdits>,
    rotations: BTreeMap<usize, QuarterTurns>,
}

impl PageContext {
    pub fn new(page_count: usize, working_scale: f32) -> Self {
        Self {
            page_count,
            working_scale,
            active_page: None,
            pending: None,
            generation: 0,
            edits: BTreeMap::new(),
            rotations: BTreeMap::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn working_scale(&self) -> f32 {
        self.working_scale
    }

    pub fn active_page(&self) -> Option<usize> {
        self.active_page
    }

    pub fn pending(&self) -> Option<PageTicket> {
        self.pending
    }

    pub fn contains_page(&self, page: usize) -> bool {
        (1..=self.page_count).contains(&page)
    }

    /// Issues a ticket for loading `page`, superseding any earlier request.
    /// Out-of-range pages yield `None` and leave the context untouched.
    pub fn begin_page(&mut self, page: usize) -> Option<PageTicket> {
        if !self.contains_page(page) {
            tracing::debug!(page, page_count = self.page_count, "page out of range; ignored");
            return None;
        }
        self.generation = self.generation.saturating_add(1);
        let ticket = PageTicket {
            page,
            generation: self.generation,
        };
        if let Some(stale) = self.pending.replace(ticket) {
            tracing::debug!(page = stale.page, generation = stale.generation, "page load superseded");
        }
        Some(ticket)
    }

    pub fn is_current(&self, ticket: PageTicket) -> bool {
        self.pending == Some(ticket)
    }

    /// Consumes `ticket` if it is still the live request.
    pub fn accept(&mut self, ticket: PageTicket) -> bool {
        if !self.is_current(ticket) {
            tracing::debug!(
                page = ticket.page,
                generation = ticket.generation,
                "stale page completion discarded"
            );
            return false;
        }
        self.pending = None;
        true
    }

    /// Drops interest in any in-flight load.
    pub fn cancel_pending(&mut self) {
        if self.pending.take().is_some() {
            self.generation = self.generation.saturating_add(1);
        }
    }

    pub fn set_active_page(&mut self, page: usize) {
        self.active_page = Some(page);
    }

    pub fn store_edits(&mut self, page: usize, edits: PageEdits) {
        tracing::debug!(page, objects = edits.object_count, "page edits stored");
        self.edits.insert(page, edits);
    }

    pub fn edits(&self, page: usize) -> Option<&PageEdits> {
        self.edits.get(&page)
    }

    pub fn page_rotation(&self, page: usize) -> QuarterTurns {
        self.rotations.get(&page).copied().unwrap_or_default()
    }

    /// Rotates `page` a further 90° clockwise for assembly.
    pub fn rotate_page(&mut self, page: usize) -> EngineResult<QuarterTurns> {
        if !self.contains_page(page) {
            return Err(EngineError::invalid_range(format!(
                "page {page} is outside 1..={}",
                self.page_count
            )));
        }
        let rotation = self.page_rotation(page).next();
        self.rotations.insert(page, rotation);
        Ok(rotation)
    }

    /// Ordered page sequence for the document assembler. Pages with objects
    /// carry their overlay; the rest pass through untouched.
    pub fn assembly_pages(&self) -> Vec<AssemblyPage> {
        (1..=self.page_count)
            .map(|page| {
                let content = match self.edits.get(&page) {
                    Some(edits) if edits.object_count > 0 => {
                        PageContent::Overlay(edits.overlay.clone())
                    }
                    _ => PageContent::Original {
                        page_index: page - 1,
                    },
                };
                AssemblyPage {
                    content,
                    rotation: self.page_rotation(page),
                }
            })
            .collect()
    }
}

/// Parses `"1-3, 5"` into sorted, de-duplicated 1-based page numbers.
/// Pages outside `1..=page_count` and unreadable parts are skipped.
pub fn parse_page_range(input: &str, page_count: usize) -> EngineResult<Vec<usize>> {
    let mut pages = BTreeSet::new();
    let in_range = |page: usize| (1..=page_count).contains(&page);
    for part in input.split(',').map(str::trim).filter(|part| !part.is_empty()) {
        match part.split_once('-') {
            Some((start, end)) => {
                let (Ok(start), Ok(end)) =
                    (start.trim().parse::<usize>(), end.trim().parse::<usize>())
                else {
                    continue;
                };
                let (start, end) = (start.max(1), end.min(page_count));
                if start <= end {
                    pages.extend(start..=end);
                }
            }
            None => {
                if let Ok(page) = part.parse::<usize>() {
                    if in_range(page) {
                        pages.insert(page);
                    }
                }
            }
        }
    }
    if pages.is_empty() {
        return Err(EngineError::invalid_range(format!(
            "no valid pages in {input:?}; expected a format like '1-3, 5'"
        )));
    }
    Ok(pages.into_iter().collect())
}
