// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page content sources — the document introspection side of the pipeline.

use std::collections::HashMap;

use stilwerk_core::error::Result;
use stilwerk_core::types::{ImageHandle, PageContent, TextBlock};
use tracing::debug;

/// Supplies structured content for each page of a source document.
///
/// Implementations hide the concrete document library; the reconstructor
/// only sees [`PageContent`] and fetches raster bytes lazily by handle.
pub trait PageSource {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Extracted content of the page at `index` (0-indexed).
    fn page(&self, index: usize) -> Result<PageContent>;

    /// Encoded raster bytes for `handle`, or `None` if it cannot be resolved.
    fn image_bytes(&self, handle: ImageHandle) -> Option<Vec<u8>>;
}

/// Fully materialised source held in memory.
///
/// Used to snapshot a document before fanning pages out to worker threads,
/// and as a lightweight source for building pages by hand.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    pages: Vec<PageContent>,
    images: HashMap<ImageHandle, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, page: PageContent) -> Self {
        self.pages.push(page);
        self
    }

    pub fn with_image(mut self, handle: ImageHandle, bytes: Vec<u8>) -> Self {
        self.images.insert(handle, bytes);
        self
    }

    /// Extract every page of `source` and prefetch the image bytes referenced
    /// by its image blocks.
    pub fn capture<S: PageSource + ?Sized>(source: &S) -> Result<Self> {
        let mut snapshot = Self::new();
        for index in 0..source.page_count() {
            let page = source.page(index)?;
            for block in &page.blocks {
                if let TextBlock::Image {
                    handle: Some(handle),
                    ..
                } = block
                    && !snapshot.images.contains_key(handle)
                    && let Some(bytes) = source.image_bytes(*handle)
                {
                    snapshot.images.insert(*handle, bytes);
                }
            }
            snapshot.pages.push(page);
        }
        debug!(
            pages = snapshot.pages.len(),
            images = snapshot.images.len(),
            "Source captured in memory"
        );
        Ok(snapshot)
    }
}

impl PageSource for MemorySource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page(&self, index: usize) -> Result<PageContent> {
        self.pages.get(index).cloned().ok_or_else(|| {
            stilwerk_core::StilwerkError::PdfError(format!(
                "page {} out of range (document has {} pages)",
                index + 1,
                self.pages.len()
            ))
        })
    }

    fn image_bytes(&self, handle: ImageHandle) -> Option<Vec<u8>> {
        self.images.get(&handle).cloned()
    }
}
