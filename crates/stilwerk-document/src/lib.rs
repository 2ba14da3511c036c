// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// stilwerk-document — Document processing for the Stilwerk restyler.
//
// Reads source PDFs (lopdf), synthesises blurred and grained page backgrounds
// from a cover image (image/imageproc), reconstructs every page on top of its
// background in a fixed layer order, and writes the result (printpdf).

pub mod image;
pub mod pdf;
pub mod render;

// Re-export the primary structs so callers can use `stilwerk_document::Restyler` etc.
pub use crate::image::background::{BackgroundStyle, BackgroundSynthesizer};
pub use crate::pdf::reader::PdfReader;
pub use crate::pdf::writer::PdfWriter;
pub use crate::render::orchestrator::{RenderedPage, RestyleSummary, Restyler};
pub use crate::render::reconstruct::{PageReconstructor, PageReport};
pub use crate::render::source::{MemorySource, PageSource};
