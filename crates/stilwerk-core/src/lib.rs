// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stilwerk — Core types, colour/font heuristics and error definitions shared
// across all crates.

pub mod color;
pub mod config;
pub mod error;
pub mod font;
pub mod types;

pub use color::Rgb;
pub use config::RestyleConfig;
pub use error::StilwerkError;
pub use font::{FontFamily, FontStyle};
pub use types::*;
