// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — reading source documents, interpreting their content streams,
// and writing the restyled output.

pub mod interpreter;
pub mod reader;
pub mod writer;

pub use reader::PdfReader;
pub use writer::{PdfPageCanvas, PdfWriter};
