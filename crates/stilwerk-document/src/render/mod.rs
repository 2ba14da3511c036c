// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Render module — page sources, canvases, page reconstruction and the
// document-level orchestrator.

pub mod canvas;
pub mod orchestrator;
pub mod reconstruct;
pub mod skip;
pub mod source;

pub use canvas::{DisplayList, DrawCommand, DrawKind, Layer, PageCanvas, RasterData, Stroke};
pub use orchestrator::{RenderedPage, RestyleSummary, Restyler};
pub use reconstruct::{PageReconstructor, PageReport};
pub use skip::{ElementId, SkipEvent, SkipReason};
pub use source::{MemorySource, PageSource};
