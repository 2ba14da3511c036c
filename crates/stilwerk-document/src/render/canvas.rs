// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page canvas — the drawing side of the pipeline, plus a recording canvas
// that keeps the draw sequence for inspection and later replay.

use image::RgbImage;
use stilwerk_core::color::Rgb;
use stilwerk_core::font::{FontFamily, FontStyle};
use stilwerk_core::types::{Point, Rect};

use super::skip::{ElementId, SkipEvent, SkipReason};

/// Stacking hint for raster placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    /// Beneath everything else drawn on the page.
    Underlay,
    /// In drawing order, above what was drawn before.
    Overlay,
}

/// Raster data handed to a canvas.
#[derive(Debug, Clone, PartialEq)]
pub enum RasterData {
    /// Encoded image file bytes (JPEG, PNG, ...).
    Encoded(Vec<u8>),
    /// Already decoded pixels.
    Pixels(RgbImage),
}

impl RasterData {
    /// Decode into RGB pixels.
    pub fn into_rgb(self) -> Result<RgbImage, SkipReason> {
        match self {
            Self::Pixels(pixels) => Ok(pixels),
            Self::Encoded(bytes) => image::load_from_memory(&bytes)
                .map(|img| img.to_rgb8())
                .map_err(|err| SkipReason::UndecodableImage(err.to_string())),
        }
    }
}

/// Stroke style of a vector primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Rgb,
    pub width: f32,
}

/// Where a text run is placed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TextAnchor {
    /// Horizontal text starting at a baseline point.
    Point(Point),
    /// Left-aligned text fitted into a box and rotated by `rotation` degrees
    /// (counter-clockwise).
    Box { rect: Rect, rotation: i32 },
}

/// A text run ready to be drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct TextInsertion {
    pub text: String,
    pub family: FontFamily,
    pub style: FontStyle,
    pub size: f32,
    pub color: Rgb,
    pub anchor: TextAnchor,
}

/// Primitive placement operations of an output page.
pub trait PageCanvas {
    fn place_image(&mut self, rect: Rect, data: RasterData, layer: Layer)
    -> Result<(), SkipReason>;

    fn draw_line(&mut self, from: Point, to: Point, stroke: &Stroke);

    /// Unfilled rectangle outline.
    fn draw_rect(&mut self, rect: Rect, stroke: &Stroke);

    /// Open polyline through `points` in order.
    fn draw_polyline(&mut self, points: &[Point], stroke: &Stroke);

    /// Cubic bezier chain: start point followed by groups of
    /// (control, control, end).
    fn draw_bezier(&mut self, points: &[Point], stroke: &Stroke);

    fn insert_text(&mut self, text: &TextInsertion);
}

/// One recorded canvas call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Image {
        rect: Rect,
        data: RasterData,
        layer: Layer,
    },
    Line {
        from: Point,
        to: Point,
        stroke: Stroke,
    },
    Rect {
        rect: Rect,
        stroke: Stroke,
    },
    Polyline {
        points: Vec<Point>,
        stroke: Stroke,
    },
    Bezier {
        points: Vec<Point>,
        stroke: Stroke,
    },
    Text(TextInsertion),
}

/// Coarse category of a draw command, used to reason about stacking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DrawKind {
    Background,
    Image,
    Vector,
    Text,
}

impl DrawCommand {
    pub fn kind(&self) -> DrawKind {
        match self {
            Self::Image {
                layer: Layer::Underlay,
                ..
            } => DrawKind::Background,
            Self::Image { .. } => DrawKind::Image,
            Self::Line { .. } | Self::Rect { .. } | Self::Polyline { .. } | Self::Bezier { .. } => {
                DrawKind::Vector
            }
            Self::Text(_) => DrawKind::Text,
        }
    }

    /// Issue this command against another canvas.
    fn apply(self, canvas: &mut dyn PageCanvas) -> Result<(), SkipReason> {
        match self {
            Self::Image { rect, data, layer } => canvas.place_image(rect, data, layer)?,
            Self::Line { from, to, stroke } => canvas.draw_line(from, to, &stroke),
            Self::Rect { rect, stroke } => canvas.draw_rect(rect, &stroke),
            Self::Polyline { points, stroke } => canvas.draw_polyline(&points, &stroke),
            Self::Bezier { points, stroke } => canvas.draw_bezier(&points, &stroke),
            Self::Text(text) => canvas.insert_text(&text),
        }
        Ok(())
    }
}

/// Canvas that records commands instead of rendering them.
///
/// Underlay images are kept ahead of everything else, so [`DisplayList::commands`]
/// is the final bottom-to-top draw sequence of the page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayList {
    underlay: Vec<DrawCommand>,
    overlay: Vec<DrawCommand>,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bottom-to-top draw sequence.
    pub fn commands(&self) -> impl Iterator<Item = &DrawCommand> {
        self.underlay.iter().chain(self.overlay.iter())
    }

    /// Draw kinds in stacking order.
    pub fn kinds(&self) -> Vec<DrawKind> {
        self.commands().map(DrawCommand::kind).collect()
    }

    pub fn len(&self) -> usize {
        self.underlay.len() + self.overlay.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replay every command, in stacking order, onto `canvas`.
    ///
    /// Commands the target canvas refuses are returned as skip events.
    pub fn replay(self, canvas: &mut dyn PageCanvas) -> Vec<SkipEvent> {
        let mut skipped = Vec::new();
        for (index, command) in self.underlay.into_iter().chain(self.overlay).enumerate() {
            if let Err(reason) = command.apply(canvas) {
                skipped.push(SkipEvent {
                    element: ElementId::Command(index),
                    reason,
                });
            }
        }
        skipped
    }

    fn push(&mut self, command: DrawCommand) {
        self.overlay.push(command);
    }
}

impl PageCanvas for DisplayList {
    fn place_image(
        &mut self,
        rect: Rect,
        data: RasterData,
        layer: Layer,
    ) -> Result<(), SkipReason> {
        let command = DrawCommand::Image { rect, data, layer };
        match layer {
            Layer::Underlay => self.underlay.push(command),
            Layer::Overlay => self.overlay.push(command),
        }
        Ok(())
    }

    fn draw_line(&mut self, from: Point, to: Point, stroke: &Stroke) {
        self.push(DrawCommand::Line {
            from,
            to,
            stroke: *stroke,
        });
    }

    fn draw_rect(&mut self, rect: Rect, stroke: &Stroke) {
        self.push(DrawCommand::Rect {
            rect,
            stroke: *stroke,
        });
    }

    fn draw_polyline(&mut self, points: &[Point], stroke: &Stroke) {
        self.push(DrawCommand::Polyline {
            points: points.to_vec(),
            stroke: *stroke,
        });
    }

    fn draw_bezier(&mut self, points: &[Point], stroke: &Stroke) {
        self.push(DrawCommand::Bezier {
            points: points.to_vec(),
            stroke: *stroke,
        });
    }

    fn insert_text(&mut self, text: &TextInsertion) {
        self.push(DrawCommand::Text(text.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE_HAIRLINE: Stroke = Stroke {
        color: Rgb::WHITE,
        width: 1.0,
    };

    fn pixels() -> RasterData {
        RasterData::Pixels(RgbImage::new(2, 2))
    }

    #[test]
    fn underlay_sorts_before_earlier_overlay() {
        let mut list = DisplayList::new();
        list.draw_line(Point::new(0.0, 0.0), Point::new(1.0, 1.0), &WHITE_HAIRLINE);
        list.place_image(Rect::page(10.0, 10.0), pixels(), Layer::Underlay)
            .unwrap();
        assert_eq!(list.kinds(), vec![DrawKind::Background, DrawKind::Vector]);
    }

    #[test]
    fn undecodable_bytes_are_reported() {
        let data = RasterData::Encoded(b"not an image".to_vec());
        assert!(matches!(
            data.into_rgb(),
            Err(SkipReason::UndecodableImage(_))
        ));
    }

    struct Refusing(usize);

    impl PageCanvas for Refusing {
        fn place_image(&mut self, _: Rect, _: RasterData, _: Layer) -> Result<(), SkipReason> {
            Err(SkipReason::UndecodableImage("refused".into()))
        }
        fn draw_line(&mut self, _: Point, _: Point, _: &Stroke) {
            self.0 += 1;
        }
        fn draw_rect(&mut self, _: Rect, _: &Stroke) {
            self.0 += 1;
        }
        fn draw_polyline(&mut self, _: &[Point], _: &Stroke) {
            self.0 += 1;
        }
        fn draw_bezier(&mut self, _: &[Point], _: &Stroke) {
            self.0 += 1;
        }
        fn insert_text(&mut self, _: &TextInsertion) {
            self.0 += 1;
        }
    }

    #[test]
    fn replay_keeps_going_after_refusal() {
        let mut list = DisplayList::new();
        list.place_image(Rect::page(5.0, 5.0), pixels(), Layer::Overlay)
            .unwrap();
        list.draw_rect(Rect::new(0.0, 0.0, 2.0, 2.0), &WHITE_HAIRLINE);
        list.draw_polyline(&[Point::new(0.0, 0.0)], &WHITE_HAIRLINE);

        let mut target = Refusing(0);
        let skipped = list.replay(&mut target);
        assert_eq!(target.0, 2);
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].element, ElementId::Command(0));
    }
}
