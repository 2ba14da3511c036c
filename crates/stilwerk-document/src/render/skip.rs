// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Element-level failures. These are recorded and logged, never propagated.

use stilwerk_core::types::{ImageHandle, PathCommand};
use thiserror::Error;

/// Why a single page element was dropped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkipReason {
    #[error("{command:?} segment needs {expected}, got {found} point(s)")]
    TooFewPoints {
        command: PathCommand,
        expected: &'static str,
        found: usize,
    },

    #[error("non-finite coordinate in {0:?} segment")]
    NonFiniteCoordinate(PathCommand),

    #[error("image block carries no object handle")]
    MissingImageHandle,

    #[error("image {0} could not be resolved")]
    UnresolvableImage(ImageHandle),

    #[error("image data could not be decoded: {0}")]
    UndecodableImage(String),

    #[error("span is not drawable: {0}")]
    InvalidSpan(String),
}

/// Position of an element within its page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementId {
    /// The synthesised page background.
    Background,
    Block(usize),
    Segment { group: usize, segment: usize },
    Span { block: usize, line: usize, span: usize },
    /// Index into the page's recorded draw sequence.
    Command(usize),
}

/// A dropped element together with the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct SkipEvent {
    pub element: ElementId,
    pub reason: SkipReason,
}
