// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — build the restyled document with `printpdf` 0.8, then tidy and
// compress it with `lopdf` before a single atomic save.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use std::path::Path;

use lopdf::{Document, Object};
use printpdf::{
    BuiltinFont, Color, Line, LinePoint, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg,
    Pt, RawImage, RawImageData, RawImageFormat, TextItem, TextMatrix, XObjectTransform,
};
use stilwerk_core::color::Rgb;
use stilwerk_core::error::{Result, StilwerkError};
use stilwerk_core::font::{FontFamily, FontStyle};
use stilwerk_core::types::{Point, Rect};
use tracing::{debug, info, instrument};

use crate::render::canvas::{Layer, PageCanvas, RasterData, Stroke, TextAnchor, TextInsertion};
use crate::render::skip::SkipReason;

/// Baseline offset from the edge of a rotated text box, as a fraction of the
/// font size (descender allowance).
const ROTATED_BASELINE_INSET: f32 = 0.22;

/// Points to millimetres.
fn mm(pt: f32) -> Mm {
    Mm(pt * 25.4 / 72.0)
}

fn pdf_point(p: Point) -> printpdf::Point {
    printpdf::Point {
        x: Pt(p.x),
        y: Pt(p.y),
    }
}

fn pdf_color(color: Rgb) -> Color {
    let color = color.clamped();
    Color::Rgb(printpdf::Rgb {
        r: color.r,
        g: color.g,
        b: color.b,
        icc_profile: None,
    })
}

/// Base-14 font for a family and style bucket.
pub fn builtin_font(family: FontFamily, style: FontStyle) -> BuiltinFont {
    match (family, style) {
        (FontFamily::Times, FontStyle::Regular) => BuiltinFont::TimesRoman,
        (FontFamily::Times, FontStyle::Bold) => BuiltinFont::TimesBold,
        (FontFamily::Times, FontStyle::Italic) => BuiltinFont::TimesItalic,
        (FontFamily::Times, FontStyle::BoldItalic) => BuiltinFont::TimesBoldItalic,
        (FontFamily::Helvetica, FontStyle::Regular) => BuiltinFont::Helvetica,
        (FontFamily::Helvetica, FontStyle::Bold) => BuiltinFont::HelveticaBold,
        (FontFamily::Helvetica, FontStyle::Italic) => BuiltinFont::HelveticaOblique,
        (FontFamily::Helvetica, FontStyle::BoldItalic) => BuiltinFont::HelveticaBoldOblique,
        (FontFamily::Courier, FontStyle::Regular) => BuiltinFont::Courier,
        (FontFamily::Courier, FontStyle::Bold) => BuiltinFont::CourierBold,
        (FontFamily::Courier, FontStyle::Italic) => BuiltinFont::CourierOblique,
        (FontFamily::Courier, FontStyle::BoldItalic) => BuiltinFont::CourierBoldOblique,
    }
}

/// Text matrix placing a run left-aligned in `rect`, rotated by `rotation`
/// degrees counter-clockwise.
fn box_text_matrix(rect: &Rect, rotation: i32, size: f32) -> [f32; 6] {
    let inset = ROTATED_BASELINE_INSET * size;
    match rotation.rem_euclid(360) {
        90 => [0.0, 1.0, -1.0, 0.0, rect.x1 - inset, rect.y0],
        270 => [0.0, -1.0, 1.0, 0.0, rect.x0 + inset, rect.y1],
        180 => [-1.0, 0.0, 0.0, -1.0, rect.x1, rect.y1 - inset],
        _ => [1.0, 0.0, 0.0, 1.0, rect.x0, rect.y0 + inset],
    }
}

/// Page canvas emitting printpdf operations.
///
/// Underlay images are emitted ahead of every other operation of the page.
pub struct PdfPageCanvas<'a> {
    doc: &'a mut PdfDocument,
    underlay: Vec<Op>,
    overlay: Vec<Op>,
}

impl<'a> PdfPageCanvas<'a> {
    fn new(doc: &'a mut PdfDocument) -> Self {
        Self {
            doc,
            underlay: Vec::new(),
            overlay: Vec::new(),
        }
    }

    fn into_ops(self) -> Vec<Op> {
        let mut ops = self.underlay;
        ops.extend(self.overlay);
        ops
    }

    fn stroke(&mut self, points: Vec<LinePoint>, is_closed: bool, stroke: &Stroke) {
        self.overlay.push(Op::SetOutlineColor {
            col: pdf_color(stroke.color),
        });
        self.overlay.push(Op::SetOutlineThickness {
            pt: Pt(stroke.width),
        });
        self.overlay.push(Op::DrawLine {
            line: Line { points, is_closed },
        });
    }
}

fn corner(p: Point) -> LinePoint {
    LinePoint {
        p: pdf_point(p),
        bezier: false,
    }
}

impl PageCanvas for PdfPageCanvas<'_> {
    fn place_image(
        &mut self,
        rect: Rect,
        data: RasterData,
        layer: Layer,
    ) -> std::result::Result<(), SkipReason> {
        let pixels = data.into_rgb()?;
        let (width, height) = pixels.dimensions();
        if width == 0 || height == 0 {
            return Err(SkipReason::UndecodableImage("image has no pixels".to_string()));
        }

        let raw = RawImage {
            pixels: RawImageData::U8(pixels.into_raw()),
            width: width as usize,
            height: height as usize,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };
        let id = self.doc.add_image(&raw);

        // At 72 dpi one pixel is one point before scaling.
        let op = Op::UseXobject {
            id,
            transform: XObjectTransform {
                translate_x: Some(Pt(rect.x0)),
                translate_y: Some(Pt(rect.y0)),
                scale_x: Some(rect.width() / width as f32),
                scale_y: Some(rect.height() / height as f32),
                dpi: Some(72.0),
                rotate: None,
            },
        };
        match layer {
            Layer::Underlay => self.underlay.push(op),
            Layer::Overlay => self.overlay.push(op),
        }
        Ok(())
    }

    fn draw_line(&mut self, from: Point, to: Point, stroke: &Stroke) {
        self.stroke(vec![corner(from), corner(to)], false, stroke);
    }

    fn draw_rect(&mut self, rect: Rect, stroke: &Stroke) {
        let points = vec![
            corner(Point::new(rect.x0, rect.y0)),
            corner(Point::new(rect.x1, rect.y0)),
            corner(Point::new(rect.x1, rect.y1)),
            corner(Point::new(rect.x0, rect.y1)),
        ];
        self.stroke(points, true, stroke);
    }

    fn draw_polyline(&mut self, points: &[Point], stroke: &Stroke) {
        self.stroke(points.iter().copied().map(corner).collect(), false, stroke);
    }

    fn draw_bezier(&mut self, points: &[Point], stroke: &Stroke) {
        let Some((&start, rest)) = points.split_first() else {
            return;
        };
        let mut line = vec![corner(start)];
        for chunk in rest.chunks_exact(3) {
            line.push(LinePoint {
                p: pdf_point(chunk[0]),
                bezier: true,
            });
            line.push(LinePoint {
                p: pdf_point(chunk[1]),
                bezier: true,
            });
            line.push(corner(chunk[2]));
        }
        self.stroke(line, false, stroke);
    }

    fn insert_text(&mut self, text: &TextInsertion) {
        let font = builtin_font(text.family, text.style);
        let placement = match text.anchor {
            TextAnchor::Point(origin) => Op::SetTextCursor {
                pos: pdf_point(origin),
            },
            TextAnchor::Box { rect, rotation } => Op::SetTextMatrix {
                matrix: TextMatrix::Raw(box_text_matrix(&rect, rotation, text.size)),
            },
        };

        self.overlay.extend([
            Op::SetFillColor {
                col: pdf_color(text.color),
            },
            Op::StartTextSection,
            placement,
            Op::SetFontSizeBuiltinFont {
                size: Pt(text.size),
                font,
            },
            Op::WriteTextBuiltinFont {
                items: vec![TextItem::Text(text.text.clone())],
                font,
            },
            Op::EndTextSection,
        ]);
    }
}

/// Collects restyled pages and writes the output document.
///
/// ```ignore
/// let mut writer = PdfWriter::new("Stilwerk Document");
/// writer.add_page(595.0, 842.0, |canvas| display_list.replay(canvas));
/// writer.save("restyled.pdf")?;
/// ```
pub struct PdfWriter {
    doc: PdfDocument,
    pages: Vec<PdfPage>,
    /// Page sizes in points, in page order.
    sizes: Vec<(f32, f32)>,
}

impl PdfWriter {
    /// Create an empty document with `title` in its metadata.
    pub fn new(title: &str) -> Self {
        Self {
            doc: PdfDocument::new(title),
            pages: Vec::new(),
            sizes: Vec::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Append a `width` x `height` point page and draw it through `draw`.
    pub fn add_page<T>(
        &mut self,
        width: f32,
        height: f32,
        draw: impl FnOnce(&mut PdfPageCanvas<'_>) -> T,
    ) -> T {
        let mut canvas = PdfPageCanvas::new(&mut self.doc);
        let result = draw(&mut canvas);
        let ops = canvas.into_ops();
        debug!(page = self.pages.len() + 1, ops = ops.len(), "Page composed");
        self.pages.push(PdfPage::new(mm(width), mm(height), ops));
        self.sizes.push((width, height));
        result
    }

    /// Serialise the document, drop unused objects and compress it.
    #[instrument(skip(self), fields(pages = self.pages.len()))]
    pub fn finish(self) -> Result<Vec<u8>> {
        let mut doc = self.doc;
        doc.with_pages(self.pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let raw = doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            debug!(count = warnings.len(), "printpdf reported warnings");
        }

        let mut tidy = Document::load_mem(&raw).map_err(|err| {
            StilwerkError::PdfError(format!("failed to reload generated PDF: {}", err))
        })?;
        set_page_boxes(&mut tidy, &self.sizes);
        let pruned = tidy.prune_objects().len();
        let emptied = tidy.delete_zero_length_streams().len();
        tidy.renumber_objects();
        tidy.compress();

        let mut output = Vec::new();
        tidy.save_to(&mut output).map_err(|err| {
            StilwerkError::PdfError(format!("failed to serialise output PDF: {}", err))
        })?;

        debug!(
            raw_bytes = raw.len(),
            output_bytes = output.len(),
            pruned,
            emptied,
            "Output finalised"
        );
        Ok(output)
    }

    /// Finish the document and write it to `path` in one step.
    ///
    /// Bytes go to a sibling temporary file first, which is then renamed over
    /// `path`, so a failed run never leaves a truncated output behind.
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn save(self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.finish()?;

        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp = std::path::PathBuf::from(tmp_name);

        std::fs::write(&tmp, &bytes)?;
        if let Err(err) = std::fs::rename(&tmp, path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(err.into());
        }

        info!("Wrote restyled PDF to {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }
}

/// Overwrite the page boxes with the exact point sizes; printpdf only takes
/// millimetres and its round trip is not exact.
fn set_page_boxes(doc: &mut Document, sizes: &[(f32, f32)]) {
    let page_ids: Vec<_> = doc.get_pages().into_values().collect();
    for (page_id, &(width, height)) in page_ids.into_iter().zip(sizes) {
        let Ok(Object::Dictionary(page)) = doc.get_object_mut(page_id) else {
            continue;
        };
        let page_box = || {
            Object::Array(vec![
                Object::Real(0.0),
                Object::Real(0.0),
                Object::Real(width),
                Object::Real(height),
            ])
        };
        page.set("MediaBox", page_box());
        for key in [&b"CropBox"[..], &b"TrimBox"[..], &b"BleedBox"[..], &b"ArtBox"[..]] {
            if page.has(key) {
                page.set(key, page_box());
            }
        }
    }
}
