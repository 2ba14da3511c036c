// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — stylised page background synthesis.

pub mod background;

pub use background::{BackgroundStyle, BackgroundSynthesizer};
