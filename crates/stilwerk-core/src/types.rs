// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Geometry and the per-page content model handed from extraction to
// reconstruction. All coordinates are in the user space of the source page
// (origin bottom-left, y growing upwards).

use serde::{Deserialize, Serialize};

use crate::color::Rgb;

/// A point in page space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Axis-aligned rectangle with `x0 <= x1` and `y0 <= y1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    /// Build a rectangle from two opposite corners in any order.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    pub fn from_points(a: Point, b: Point) -> Self {
        Self::new(a.x, a.y, b.x, b.y)
    }

    /// Page rectangle anchored at the origin.
    pub fn page(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Smallest rectangle containing every point, `None` for an empty slice.
    pub fn bounding(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut rect = Self::from_points(*first, *first);
        for point in &points[1..] {
            rect.x0 = rect.x0.min(point.x);
            rect.y0 = rect.y0.min(point.y);
            rect.x1 = rect.x1.max(point.x);
            rect.y1 = rect.y1.max(point.y);
        }
        Some(rect)
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn is_finite(&self) -> bool {
        self.x0.is_finite() && self.y0.is_finite() && self.x1.is_finite() && self.y1.is_finite()
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }
}

/// 2D affine matrix `[a b c d e f]`, mapping `(x, y)` to
/// `(a*x + c*y + e, b*x + d*y + f)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix(pub [f32; 6]);

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    pub fn translate(tx: f32, ty: f32) -> Self {
        Self([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    /// `self` applied first, then `other`.
    pub fn then(&self, other: &Matrix) -> Matrix {
        let [a, b, c, d, e, f] = self.0;
        let [a2, b2, c2, d2, e2, f2] = other.0;
        Matrix([
            a * a2 + b * c2,
            a * b2 + b * d2,
            c * a2 + d * c2,
            c * b2 + d * d2,
            e * a2 + f * c2 + e2,
            e * b2 + f * d2 + f2,
        ])
    }

    pub fn apply(&self, point: Point) -> Point {
        let [a, b, c, d, e, f] = self.0;
        Point::new(a * point.x + c * point.y + e, b * point.x + d * point.y + f)
    }

    /// Length of the transformed x unit vector.
    pub fn x_scale(&self) -> f32 {
        self.0[0].hypot(self.0[1])
    }

    /// Length of the transformed y unit vector.
    pub fn y_scale(&self) -> f32 {
        self.0[2].hypot(self.0[3])
    }

    /// Geometric mean scale, used for line widths.
    pub fn mean_scale(&self) -> f32 {
        let [a, b, c, d, _, _] = self.0;
        (a * d - b * c).abs().sqrt()
    }

    /// Shear/rotation component (`b`), the only rotation hint spans carry.
    pub fn shear(&self) -> f32 {
        self.0[1]
    }

    /// Bounding box of `rect` after transformation.
    pub fn transform_rect(&self, rect: &Rect) -> Rect {
        let corners = [
            self.apply(Point::new(rect.x0, rect.y0)),
            self.apply(Point::new(rect.x1, rect.y0)),
            self.apply(Point::new(rect.x1, rect.y1)),
            self.apply(Point::new(rect.x0, rect.y1)),
        ];
        // Four corners are always present.
        Rect::bounding(&corners).unwrap_or(*rect)
    }
}

/// xref of an embedded raster image in the source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageHandle {
    pub object: u32,
    pub generation: u16,
}

impl ImageHandle {
    pub const fn new(object: u32, generation: u16) -> Self {
        Self { object, generation }
    }
}

impl std::fmt::Display for ImageHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} R", self.object, self.generation)
    }
}

/// Smallest styled text run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    pub text: String,
    /// Free-form font family name as found in the source.
    pub font: String,
    /// Font size in points.
    pub size: f32,
    /// Baseline start of the run.
    pub origin: Point,
    pub bbox: Rect,
    /// Normalised text direction matrix; `matrix.shear()` is the rotation hint.
    pub matrix: Matrix,
    /// Packed `0x00RRGGBB` fill colour; `None` means black.
    pub color: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    pub spans: Vec<TextSpan>,
}

/// A block of the page's text layout: either text or a placed image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TextBlock {
    Text {
        bbox: Rect,
        lines: Vec<TextLine>,
    },
    Image {
        bbox: Rect,
        /// Absent when the image cannot be traced back to an object
        /// (inline images).
        handle: Option<ImageHandle>,
    },
}

impl TextBlock {
    pub fn lines(&self) -> &[TextLine] {
        match self {
            Self::Text { lines, .. } => lines,
            Self::Image { .. } => &[],
        }
    }

    pub fn bbox(&self) -> Rect {
        match self {
            Self::Text { bbox, .. } | Self::Image { bbox, .. } => *bbox,
        }
    }
}

/// The forms a drawing's stroke colour arrives in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StrokeColor {
    /// Not stroked (fill-only paths).
    Absent,
    Triplet(Rgb),
    Packed(u32),
    /// Colour spaces that do not reduce to RGB (patterns, separations).
    Unsupported(String),
}

/// Drawing command of a path segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathCommand {
    Line,
    Rect,
    Polyline,
    Curve,
    Other(String),
}

impl PathCommand {
    /// Map a drawing operator tag (`l`, `re`, `qu`, `c`, ...) to a command.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "l" | "L" => Self::Line,
            "re" => Self::Rect,
            "qu" | "p" => Self::Polyline,
            "c" | "be" | "b" => Self::Curve,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            Self::Line => "l",
            Self::Rect => "re",
            Self::Polyline => "qu",
            Self::Curve => "c",
            Self::Other(tag) => tag,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSegment {
    pub command: PathCommand,
    pub points: Vec<Point>,
}

impl PathSegment {
    pub fn new(command: PathCommand, points: Vec<Point>) -> Self {
        Self { command, points }
    }
}

/// Path segments sharing one stroke style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawingGroup {
    pub color: StrokeColor,
    pub width: Option<f32>,
    /// Secondary width field consulted when `width` is missing.
    pub fallback_width: Option<f32>,
    pub segments: Vec<PathSegment>,
}

/// An embedded image and where it is drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageDescriptor {
    pub handle: ImageHandle,
    pub bbox: Rect,
}

/// Everything extracted from one source page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageContent {
    /// 1-indexed page number.
    pub number: u32,
    pub width: f32,
    pub height: f32,
    pub blocks: Vec<TextBlock>,
    pub drawings: Vec<DrawingGroup>,
    pub images: Vec<ImageDescriptor>,
    /// Hyperlink annotation rectangles.
    pub links: Vec<Rect>,
}

impl PageContent {
    /// Empty page of the given size.
    pub fn blank(number: u32, width: f32, height: f32) -> Self {
        Self {
            number,
            width,
            height,
            ..Default::default()
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::page(self.width, self.height)
    }
}
