// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Colour codec — packed 0x00RRGGBB integers to float RGB, and the near-black
// test that drives text colour inversion.

use serde::{Deserialize, Serialize};

use crate::types::StrokeColor;

/// Channels at or below this value count as black (5/255).
pub const NEAR_BLACK_TOLERANCE: f32 = 5.0 / 255.0;

/// Normalised RGB colour, each channel in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Clamp every channel into `[0, 1]`.
    pub fn clamped(self) -> Self {
        Self::new(
            self.r.clamp(0.0, 1.0),
            self.g.clamp(0.0, 1.0),
            self.b.clamp(0.0, 1.0),
        )
    }
}

/// Decode a packed `0x00RRGGBB` colour. `None` decodes to white.
pub fn decode(color: Option<u32>) -> Rgb {
    let Some(packed) = color else {
        return Rgb::WHITE;
    };
    let blue = (packed & 0xFF) as f32 / 255.0;
    let green = ((packed >> 8) & 0xFF) as f32 / 255.0;
    let red = ((packed >> 16) & 0xFF) as f32 / 255.0;
    Rgb::new(red, green, blue)
}

/// Pack a float colour back into `0x00RRGGBB`, rounding each channel.
pub fn pack(color: Rgb) -> u32 {
    let channel = |value: f32| (value.clamp(0.0, 1.0) * 255.0).round() as u32;
    (channel(color.r) << 16) | (channel(color.g) << 8) | channel(color.b)
}

/// True iff every channel is within [`NEAR_BLACK_TOLERANCE`] of zero.
pub fn is_near_black(color: Rgb) -> bool {
    color.r <= NEAR_BLACK_TOLERANCE
        && color.g <= NEAR_BLACK_TOLERANCE
        && color.b <= NEAR_BLACK_TOLERANCE
}

/// Resolve a drawing group's stroke colour. Anything that is not a usable
/// colour becomes white.
pub fn resolve_stroke(color: &StrokeColor) -> Rgb {
    match color {
        StrokeColor::Absent => Rgb::WHITE,
        StrokeColor::Triplet(rgb) => *rgb,
        StrokeColor::Packed(packed) => decode(Some(*packed)),
        StrokeColor::Unsupported(_) => Rgb::WHITE,
    }
}

/// Colour a text span is drawn with on the stylised background.
///
/// Black (or absent) text would vanish against the dark blurred cover, so it
/// is forced to white; any authored colour is kept as-is.
pub fn text_render_color(color: Option<u32>) -> Rgb {
    let decoded = decode(Some(color.unwrap_or(0)));
    if is_near_black(decoded) {
        Rgb::WHITE
    } else {
        decoded
    }
}
