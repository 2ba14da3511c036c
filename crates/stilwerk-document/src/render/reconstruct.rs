// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page reconstructor — redraws one source page onto a fresh canvas in four
// fixed layers: background, raster images, vector drawings, text.

use image::RgbImage;
use stilwerk_core::color;
use stilwerk_core::font::{FontFamily, FontStyle};
use stilwerk_core::types::{
    DrawingGroup, Matrix, PageContent, PathCommand, PathSegment, Point, Rect, TextBlock, TextSpan,
};
use tracing::{debug, instrument, trace, warn};

use super::canvas::{Layer, PageCanvas, RasterData, Stroke, TextAnchor, TextInsertion};
use super::skip::{ElementId, SkipEvent, SkipReason};
use super::source::PageSource;

/// Shear magnitude above which a span counts as rotated.
pub const ROTATION_TOLERANCE: f32 = 1e-3;

/// Stroke width used when a drawing declares none.
pub const DEFAULT_STROKE_WIDTH: f32 = 1.0;

/// Rectangle outlines are never thinner than this.
pub const MIN_RECT_STROKE_WIDTH: f32 = 0.5;

/// What happened to one page during reconstruction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageReport {
    /// 1-indexed page number.
    pub number: u32,
    pub images_placed: usize,
    pub images_skipped: Vec<SkipEvent>,
    pub segments_drawn: usize,
    /// Segments with commands this renderer does not model.
    pub segments_ignored: usize,
    pub segments_skipped: Vec<SkipEvent>,
    pub spans_drawn: usize,
    pub spans_skipped: Vec<SkipEvent>,
    /// Hyperlink rectangles found on the source page.
    pub links: Vec<Rect>,
}

impl PageReport {
    fn new(number: u32) -> Self {
        Self {
            number,
            ..Default::default()
        }
    }

    /// Total number of dropped elements.
    pub fn skipped(&self) -> usize {
        self.images_skipped.len() + self.segments_skipped.len() + self.spans_skipped.len()
    }
}

/// Outcome of a segment that was not skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Drawn {
    Yes,
    Ignored,
}

/// Redraws pages in the stylised form.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageReconstructor {
    family: FontFamily,
}

impl PageReconstructor {
    pub fn new(family: FontFamily) -> Self {
        Self { family }
    }

    /// Draw `page` onto `canvas` over the given background.
    ///
    /// Phases run strictly in order so the stacking is always background,
    /// images, vectors, text, whatever order the source lists them in.
    /// Element failures are recorded in the report; the page always completes.
    #[instrument(skip_all, fields(page = page.number))]
    pub fn reconstruct<S: PageSource + ?Sized>(
        &self,
        page: &PageContent,
        background: RgbImage,
        source: &S,
        canvas: &mut dyn PageCanvas,
    ) -> PageReport {
        let mut report = PageReport::new(page.number);

        self.place_background(page, background, canvas, &mut report);
        self.place_images(page, source, canvas, &mut report);
        self.draw_vectors(page, canvas, &mut report);
        report.links = page.links.clone();
        self.draw_text(page, canvas, &mut report);

        debug!(
            images = report.images_placed,
            segments = report.segments_drawn,
            spans = report.spans_drawn,
            links = report.links.len(),
            skipped = report.skipped(),
            "Page reconstructed"
        );
        report
    }

    // -- Phase 1: background --------------------------------------------------

    fn place_background(
        &self,
        page: &PageContent,
        background: RgbImage,
        canvas: &mut dyn PageCanvas,
        report: &mut PageReport,
    ) {
        if let Err(reason) =
            canvas.place_image(page.rect(), RasterData::Pixels(background), Layer::Underlay)
        {
            warn!(page = page.number, %reason, "Background could not be placed");
            report.images_skipped.push(SkipEvent {
                element: ElementId::Background,
                reason,
            });
        }
    }

    // -- Phase 2: raster images -----------------------------------------------

    fn place_images<S: PageSource + ?Sized>(
        &self,
        page: &PageContent,
        source: &S,
        canvas: &mut dyn PageCanvas,
        report: &mut PageReport,
    ) {
        for (index, block) in page.blocks.iter().enumerate() {
            let TextBlock::Image { bbox, handle } = block else {
                continue;
            };
            let placed = handle
                .ok_or(SkipReason::MissingImageHandle)
                .and_then(|handle| {
                    source
                        .image_bytes(handle)
                        .ok_or(SkipReason::UnresolvableImage(handle))
                })
                .and_then(|bytes| canvas.place_image(*bbox, RasterData::Encoded(bytes), Layer::Overlay));

            match placed {
                Ok(()) => report.images_placed += 1,
                Err(reason) => {
                    debug!(page = page.number, block = index, %reason, "Image block skipped");
                    report.images_skipped.push(SkipEvent {
                        element: ElementId::Block(index),
                        reason,
                    });
                }
            }
        }
    }

    // -- Phase 3: vector drawings ---------------------------------------------

    fn draw_vectors(&self, page: &PageContent, canvas: &mut dyn PageCanvas, report: &mut PageReport) {
        for (group_index, group) in page.drawings.iter().enumerate() {
            let stroke = resolve_group_stroke(group);
            for (segment_index, segment) in group.segments.iter().enumerate() {
                match draw_segment(canvas, segment, &stroke) {
                    Ok(Drawn::Yes) => report.segments_drawn += 1,
                    Ok(Drawn::Ignored) => {
                        trace!(tag = segment.command.tag(), "Unmodelled drawing command ignored");
                        report.segments_ignored += 1;
                    }
                    Err(reason) => {
                        warn!(
                            page = page.number,
                            group = group_index,
                            segment = segment_index,
                            %reason,
                            "Path segment skipped"
                        );
                        report.segments_skipped.push(SkipEvent {
                            element: ElementId::Segment {
                                group: group_index,
                                segment: segment_index,
                            },
                            reason,
                        });
                    }
                }
            }
        }
    }

    // -- Phase 5: text --------------------------------------------------------

    fn draw_text(&self, page: &PageContent, canvas: &mut dyn PageCanvas, report: &mut PageReport) {
        for (block_index, block) in page.blocks.iter().enumerate() {
            for (line_index, line) in block.lines().iter().enumerate() {
                for (span_index, span) in line.spans.iter().enumerate() {
                    if span.text.is_empty() {
                        continue;
                    }
                    match self.text_insertion(span) {
                        Ok(insertion) => {
                            trace!(
                                font = self.family.face(insertion.style),
                                size = insertion.size,
                                "Span placed"
                            );
                            canvas.insert_text(&insertion);
                            report.spans_drawn += 1;
                        }
                        Err(reason) => {
                            warn!(
                                page = page.number,
                                block = block_index,
                                line = line_index,
                                span = span_index,
                                %reason,
                                "Span skipped"
                            );
                            report.spans_skipped.push(SkipEvent {
                                element: ElementId::Span {
                                    block: block_index,
                                    line: line_index,
                                    span: span_index,
                                },
                                reason,
                            });
                        }
                    }
                }
            }
        }
    }

    /// Decide font, colour and placement of one span.
    pub fn text_insertion(&self, span: &TextSpan) -> Result<TextInsertion, SkipReason> {
        if !span.size.is_finite() || span.size <= 0.0 {
            return Err(SkipReason::InvalidSpan(format!("font size {}", span.size)));
        }

        let anchor = match text_rotation(&span.matrix) {
            Some(rotation) => {
                if !span.bbox.is_finite() {
                    return Err(SkipReason::InvalidSpan("non-finite bounding box".into()));
                }
                TextAnchor::Box {
                    rect: span.bbox,
                    rotation,
                }
            }
            None => {
                if !span.origin.is_finite() {
                    return Err(SkipReason::InvalidSpan("non-finite origin".into()));
                }
                TextAnchor::Point(span.origin)
            }
        };

        Ok(TextInsertion {
            text: span.text.clone(),
            family: self.family,
            style: FontStyle::classify(&span.font),
            size: span.size,
            color: color::text_render_color(span.color),
            anchor,
        })
    }
}

/// Rotation implied by a span's matrix: `Some(±90)` when the shear component
/// exceeds [`ROTATION_TOLERANCE`], `None` for horizontal text. Other angles are
/// not detected.
pub fn text_rotation(matrix: &Matrix) -> Option<i32> {
    let shear = matrix.shear();
    if shear.abs() > ROTATION_TOLERANCE {
        Some(if shear > 0.0 { 90 } else { -90 })
    } else {
        None
    }
}

/// Stroke colour and width of a drawing group after defaults.
pub fn resolve_group_stroke(group: &DrawingGroup) -> Stroke {
    Stroke {
        color: color::resolve_stroke(&group.color),
        width: group
            .width
            .or(group.fallback_width)
            .unwrap_or(DEFAULT_STROKE_WIDTH),
    }
}

fn require(segment: &PathSegment, min: usize, expected: &'static str) -> Result<(), SkipReason> {
    if segment.points.len() < min {
        return Err(SkipReason::TooFewPoints {
            command: segment.command.clone(),
            expected,
            found: segment.points.len(),
        });
    }
    if !segment.points.iter().all(Point::is_finite) {
        return Err(SkipReason::NonFiniteCoordinate(segment.command.clone()));
    }
    Ok(())
}

fn draw_segment(
    canvas: &mut dyn PageCanvas,
    segment: &PathSegment,
    stroke: &Stroke,
) -> Result<Drawn, SkipReason> {
    let points = &segment.points;
    match segment.command {
        PathCommand::Line => {
            require(segment, 2, "2")?;
            canvas.draw_line(points[0], points[1], stroke);
        }
        PathCommand::Rect => {
            require(segment, 2, "2 corners")?;
            let outline = Stroke {
                width: stroke.width.max(MIN_RECT_STROKE_WIDTH),
                ..*stroke
            };
            canvas.draw_rect(Rect::from_points(points[0], points[1]), &outline);
        }
        PathCommand::Polyline => {
            require(segment, 1, "at least 1")?;
            canvas.draw_polyline(points, stroke);
        }
        PathCommand::Curve => {
            require(segment, 4, "1 + 3n (n >= 1)")?;
            if (points.len() - 1) % 3 != 0 {
                return Err(SkipReason::TooFewPoints {
                    command: segment.command.clone(),
                    expected: "1 + 3n (n >= 1)",
                    found: points.len(),
                });
            }
            canvas.draw_bezier(points, stroke);
        }
        PathCommand::Other(_) => return Ok(Drawn::Ignored),
    }
    Ok(Drawn::Yes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::canvas::{DisplayList, DrawCommand, DrawKind};
    use crate::render::source::MemorySource;
    use stilwerk_core::color::Rgb;
    use stilwerk_core::types::{ImageHandle, StrokeColor, TextLine};

    fn span(text: &str, shear: f32, color: Option<u32>) -> TextSpan {
        TextSpan {
            text: text.to_string(),
            font: "Helvetica".to_string(),
            size: 12.0,
            origin: Point::new(72.0, 700.0),
            bbox: Rect::new(72.0, 697.0, 110.0, 712.0),
            matrix: Matrix([1.0, shear, -shear, 1.0, 0.0, 0.0]),
            color,
        }
    }

    fn text_block(spans: Vec<TextSpan>) -> TextBlock {
        TextBlock::Text {
            bbox: Rect::new(0.0, 0.0, 100.0, 100.0),
            lines: vec![TextLine { spans }],
        }
    }

    fn png_bytes() -> Vec<u8> {
        let mut buffer = Vec::new();
        image::DynamicImage::ImageRgb8(RgbImage::new(3, 3))
            .write_to(&mut std::io::Cursor::new(&mut buffer), image::ImageFormat::Png)
            .unwrap();
        buffer
    }

    fn group(color: StrokeColor, segments: Vec<PathSegment>) -> DrawingGroup {
        DrawingGroup {
            color,
            width: None,
            fallback_width: None,
            segments,
        }
    }

    fn reconstruct(page: &PageContent, source: &MemorySource) -> (DisplayList, PageReport) {
        let mut list = DisplayList::new();
        let report = PageReconstructor::default().reconstruct(
            page,
            RgbImage::new(4, 4),
            source,
            &mut list,
        );
        (list, report)
    }

    #[test]
    fn layers_follow_fixed_order_whatever_the_input_order() {
        let handle = ImageHandle::new(12, 0);
        let mut page = PageContent::blank(1, 200.0, 300.0);
        // Text block listed before the image block on purpose.
        page.blocks = vec![
            text_block(vec![span("Hello", 0.0, None)]),
            TextBlock::Image {
                bbox: Rect::new(10.0, 10.0, 50.0, 50.0),
                handle: Some(handle),
            },
        ];
        page.drawings = vec![group(
            StrokeColor::Packed(0xFF0000),
            vec![PathSegment::new(
                PathCommand::Line,
                vec![Point::new(0.0, 0.0), Point::new(5.0, 5.0)],
            )],
        )];
        let source = MemorySource::new().with_image(handle, png_bytes());

        let (list, report) = reconstruct(&page, &source);
        assert_eq!(
            list.kinds(),
            vec![DrawKind::Background, DrawKind::Image, DrawKind::Vector, DrawKind::Text]
        );
        assert_eq!(report.images_placed, 1);
        assert_eq!(report.spans_drawn, 1);

        let kinds = list.kinds();
        assert!(kinds.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn background_covers_full_page() {
        let page = PageContent::blank(1, 612.0, 792.0);
        let (list, _) = reconstruct(&page, &MemorySource::new());
        match list.commands().next() {
            Some(DrawCommand::Image { rect, layer, .. }) => {
                assert_eq!(*rect, Rect::page(612.0, 792.0));
                assert_eq!(*layer, Layer::Underlay);
            }
            other => panic!("expected background image, got {other:?}"),
        }
    }

    #[test]
    fn image_blocks_without_handle_or_bytes_are_skipped() {
        let mut page = PageContent::blank(1, 100.0, 100.0);
        page.blocks = vec![
            TextBlock::Image {
                bbox: Rect::new(0.0, 0.0, 10.0, 10.0),
                handle: None,
            },
            TextBlock::Image {
                bbox: Rect::new(0.0, 0.0, 10.0, 10.0),
                handle: Some(ImageHandle::new(99, 0)),
            },
        ];
        let (list, report) = reconstruct(&page, &MemorySource::new());
        assert_eq!(list.len(), 1);
        assert_eq!(report.images_placed, 0);
        assert_eq!(report.images_skipped.len(), 2);
        assert_eq!(report.images_skipped[0].reason, SkipReason::MissingImageHandle);
        assert_eq!(
            report.images_skipped[1].reason,
            SkipReason::UnresolvableImage(ImageHandle::new(99, 0))
        );
    }

    #[test]
    fn black_text_turns_white_and_colour_is_kept() {
        let red = color::pack(Rgb::new(0.8, 0.1, 0.1));
        let reconstructor = PageReconstructor::default();

        let black = reconstructor.text_insertion(&span("a", 0.0, Some(0))).unwrap();
        assert_eq!(black.color, Rgb::WHITE);

        let missing = reconstructor.text_insertion(&span("a", 0.0, None)).unwrap();
        assert_eq!(missing.color, Rgb::WHITE);

        let coloured = reconstructor.text_insertion(&span("a", 0.0, Some(red))).unwrap();
        assert_eq!(coloured.color, color::decode(Some(red)));
        assert_ne!(coloured.color, Rgb::WHITE);
    }

    #[test]
    fn rotation_follows_shear_sign() {
        let reconstructor = PageReconstructor::default();
        let up = reconstructor.text_insertion(&span("up", 0.5, None)).unwrap();
        assert!(matches!(up.anchor, TextAnchor::Box { rotation: 90, .. }));

        let down = reconstructor.text_insertion(&span("down", -0.5, None)).unwrap();
        assert!(matches!(down.anchor, TextAnchor::Box { rotation: -90, .. }));

        let flat = reconstructor.text_insertion(&span("flat", 0.0005, None)).unwrap();
        assert_eq!(flat.anchor, TextAnchor::Point(Point::new(72.0, 700.0)));
    }

    #[test]
    fn rotated_text_uses_span_bbox() {
        let s = span("side", 1.0, None);
        let insertion = PageReconstructor::default().text_insertion(&s).unwrap();
        assert_eq!(
            insertion.anchor,
            TextAnchor::Box {
                rect: s.bbox,
                rotation: 90
            }
        );
    }

    #[test]
    fn font_is_collapsed_to_configured_family() {
        let mut s = span("b", 0.0, None);
        s.font = "ABCDEF+Garamond-BoldItalic".into();
        let insertion = PageReconstructor::new(FontFamily::Courier)
            .text_insertion(&s)
            .unwrap();
        assert_eq!(insertion.family, FontFamily::Courier);
        assert_eq!(insertion.style, FontStyle::BoldItalic);
        assert_eq!(insertion.text, "b");
        assert_eq!(insertion.size, 12.0);
    }

    #[test]
    fn malformed_segment_does_not_abort_group() {
        let mut page = PageContent::blank(1, 100.0, 100.0);
        page.drawings = vec![group(
            StrokeColor::Absent,
            vec![
                PathSegment::new(PathCommand::Rect, vec![Point::new(1.0, 1.0)]),
                PathSegment::new(
                    PathCommand::Line,
                    vec![Point::new(0.0, 0.0), Point::new(9.0, 9.0)],
                ),
                PathSegment::new(
                    PathCommand::Curve,
                    vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0), Point::new(2.0, 0.0)],
                ),
                PathSegment::new(
                    PathCommand::Polyline,
                    vec![Point::new(0.0, f32::NAN), Point::new(1.0, 1.0)],
                ),
                PathSegment::new(PathCommand::Other("sh".into()), vec![]),
            ],
        )];

        let (list, report) = reconstruct(&page, &MemorySource::new());
        assert_eq!(report.segments_drawn, 1);
        assert_eq!(report.segments_ignored, 1);
        assert_eq!(report.segments_skipped.len(), 3);
        assert_eq!(
            report.segments_skipped[0].element,
            ElementId::Segment { group: 0, segment: 0 }
        );
        assert!(matches!(
            report.segments_skipped[2].reason,
            SkipReason::NonFiniteCoordinate(PathCommand::Polyline)
        ));
        assert_eq!(list.kinds(), vec![DrawKind::Background, DrawKind::Vector]);
    }

    #[test]
    fn stroke_defaults_and_rect_floor() {
        let mut g = group(
            StrokeColor::Absent,
            vec![PathSegment::new(
                PathCommand::Rect,
                vec![Point::new(10.0, 10.0), Point::new(0.0, 0.0)],
            )],
        );
        assert_eq!(
            resolve_group_stroke(&g),
            Stroke {
                color: Rgb::WHITE,
                width: 1.0
            }
        );
        g.fallback_width = Some(0.25);
        assert_eq!(resolve_group_stroke(&g).width, 0.25);
        g.width = Some(0.1);
        assert_eq!(resolve_group_stroke(&g).width, 0.1);

        let mut page = PageContent::blank(1, 50.0, 50.0);
        page.drawings = vec![g];
        let (list, _) = reconstruct(&page, &MemorySource::new());
        match list.commands().nth(1) {
            Some(DrawCommand::Rect { rect, stroke }) => {
                assert_eq!(*rect, Rect::new(0.0, 0.0, 10.0, 10.0));
                assert_eq!(stroke.width, MIN_RECT_STROKE_WIDTH);
                assert_eq!(stroke.color, Rgb::WHITE);
            }
            other => panic!("expected rectangle, got {other:?}"),
        }
    }

    #[test]
    fn bezier_chain_and_single_point_polyline_are_drawn() {
        let mut page = PageContent::blank(1, 50.0, 50.0);
        page.drawings = vec![group(
            StrokeColor::Triplet(Rgb::new(0.0, 0.0, 1.0)),
            vec![
                PathSegment::new(
                    PathCommand::Curve,
                    (0..7).map(|i| Point::new(i as f32, 0.0)).collect(),
                ),
                PathSegment::new(PathCommand::Polyline, vec![Point::new(3.0, 3.0)]),
            ],
        )];
        let (_, report) = reconstruct(&page, &MemorySource::new());
        assert_eq!(report.segments_drawn, 2);
        assert!(report.segments_skipped.is_empty());
    }

    #[test]
    fn invalid_span_is_dropped_and_others_drawn() {
        let mut bad = span("bad", 0.0, None);
        bad.size = 0.0;
        let mut page = PageContent::blank(1, 100.0, 100.0);
        page.blocks = vec![text_block(vec![bad, span("", 0.0, None), span("ok", 0.0, None)])];
        let (list, report) = reconstruct(&page, &MemorySource::new());
        assert_eq!(report.spans_drawn, 1);
        assert_eq!(report.spans_skipped.len(), 1);
        assert_eq!(
            report.spans_skipped[0].element,
            ElementId::Span { block: 0, line: 0, span: 0 }
        );
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn links_are_reported() {
        let mut page = PageContent::blank(3, 100.0, 100.0);
        page.links = vec![Rect::new(1.0, 1.0, 20.0, 8.0)];
        let (list, report) = reconstruct(&page, &MemorySource::new());
        assert_eq!(report.number, 3);
        assert_eq!(report.links, page.links);
        assert_eq!(list.len(), 1);
    }

    struct NoImages {
        texts: usize,
    }

    impl PageCanvas for NoImages {
        fn place_image(&mut self, _: Rect, _: RasterData, _: Layer) -> Result<(), SkipReason> {
            Err(SkipReason::UndecodableImage("no image support".into()))
        }
        fn draw_line(&mut self, _: Point, _: Point, _: &Stroke) {}
        fn draw_rect(&mut self, _: Rect, _: &Stroke) {}
        fn draw_polyline(&mut self, _: &[Point], _: &Stroke) {}
        fn draw_bezier(&mut self, _: &[Point], _: &Stroke) {}
        fn insert_text(&mut self, _: &TextInsertion) {
            self.texts += 1;
        }
    }

    #[test]
    fn refused_background_is_reported_and_page_completes() {
        let mut page = PageContent::blank(1, 100.0, 100.0);
        page.blocks = vec![text_block(vec![span("still here", 0.0, Some(0))])];
        let mut canvas = NoImages { texts: 0 };
        let report = PageReconstructor::default().reconstruct(
            &page,
            RgbImage::new(4, 4),
            &MemorySource::new(),
            &mut canvas,
        );
        assert_eq!(report.images_skipped.len(), 1);
        assert_eq!(report.images_skipped[0].element, ElementId::Background);
        assert_eq!(report.spans_drawn, 1);
        assert_eq!(canvas.texts, 1);
    }
}
