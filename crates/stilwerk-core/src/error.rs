// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Stilwerk.

use thiserror::Error;

/// Top-level error type for all Stilwerk operations.
///
/// Only document-level failures live here: opening the source or cover,
/// synthesising a background for an impossible page size, and saving the
/// output. Per-element problems are reported as `SkipReason` instead and never
/// escalate.
#[derive(Debug, Error)]
pub enum StilwerkError {
    // -- Document errors --
    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("invalid target dimensions {width}x{height}")]
    InvalidDimensions { width: f32, height: f32 },

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    Config(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, StilwerkError>;
