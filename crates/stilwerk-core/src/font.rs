// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Font classifier — collapses arbitrary embedded font names onto four style
// buckets of a built-in (base-14) family.

use serde::{Deserialize, Serialize};

/// Canonical style bucket of a font.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontStyle {
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

impl FontStyle {
    /// Classify a free-form font name by case-insensitive substring match.
    ///
    /// Unknown names fall through to `Regular`.
    pub fn classify(name: &str) -> Self {
        let lower = name.to_lowercase();
        let bold = lower.contains("bold");
        let italic = lower.contains("italic") || lower.contains("oblique");
        match (bold, italic) {
            (true, true) => Self::BoldItalic,
            (true, false) => Self::Bold,
            (false, true) => Self::Italic,
            (false, false) => Self::Regular,
        }
    }
}

/// Built-in font family the styles are rendered with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontFamily {
    #[default]
    Times,
    Helvetica,
    Courier,
}

impl FontFamily {
    /// PostScript name of the base-14 face for `style`.
    pub fn face(&self, style: FontStyle) -> &'static str {
        match (self, style) {
            (Self::Times, FontStyle::Regular) => "Times-Roman",
            (Self::Times, FontStyle::Bold) => "Times-Bold",
            (Self::Times, FontStyle::Italic) => "Times-Italic",
            (Self::Times, FontStyle::BoldItalic) => "Times-BoldItalic",
            (Self::Helvetica, FontStyle::Regular) => "Helvetica",
            (Self::Helvetica, FontStyle::Bold) => "Helvetica-Bold",
            (Self::Helvetica, FontStyle::Italic) => "Helvetica-Oblique",
            (Self::Helvetica, FontStyle::BoldItalic) => "Helvetica-BoldOblique",
            (Self::Courier, FontStyle::Regular) => "Courier",
            (Self::Courier, FontStyle::Bold) => "Courier-Bold",
            (Self::Courier, FontStyle::Italic) => "Courier-Oblique",
            (Self::Courier, FontStyle::BoldItalic) => "Courier-BoldOblique",
        }
    }
}
