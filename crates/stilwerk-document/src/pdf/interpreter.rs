// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content stream interpreter — walks decoded `lopdf` operations with a
// graphics state stack and collects text spans, stroked paths and image
// placements in page space.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream};
use stilwerk_core::color::{self, Rgb};
use stilwerk_core::types::{
    DrawingGroup, ImageDescriptor, ImageHandle, Matrix, PathCommand, PathSegment, Point, Rect,
    StrokeColor, TextBlock, TextLine, TextSpan,
};
use tracing::{debug, trace, warn};

/// Form XObjects nested deeper than this are not entered.
pub const MAX_FORM_DEPTH: usize = 8;

/// Approximate glyph advance in em, used in place of font metrics.
pub const GLYPH_ADVANCE_EM: f32 = 0.5;

/// TJ adjustments (thousandths of an em) beyond which a word gap is assumed.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// What the interpreter collected from one content stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageElements {
    pub blocks: Vec<TextBlock>,
    pub drawings: Vec<DrawingGroup>,
    pub images: Vec<ImageDescriptor>,
}

/// Interpret `operations` against `resources`, starting from `initial` as the
/// current transformation matrix.
pub fn interpret(
    doc: &Document,
    operations: &[Operation],
    resources: Option<&Dictionary>,
    initial: Matrix,
) -> PageElements {
    let mut interpreter = Interpreter::new(doc, initial);
    interpreter.run(operations, resources, 0);
    interpreter.finish()
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    stroke: StrokeColor,
    fill: Rgb,
    line_width: f32,
    /// Resource name of the current font.
    font: Vec<u8>,
    font_size: f32,
    leading: f32,
}

impl GraphicsState {
    fn new(ctm: Matrix) -> Self {
        Self {
            ctm,
            stroke: StrokeColor::Triplet(Rgb::BLACK),
            fill: Rgb::BLACK,
            line_width: 1.0,
            font: Vec::new(),
            font_size: 12.0,
            leading: 0.0,
        }
    }
}

/// Path under construction, already in page space.
#[derive(Debug, Default)]
struct PathBuilder {
    segments: Vec<PathSegment>,
    current: Option<Point>,
    start: Option<Point>,
    /// Run of consecutive `l` points, current point first.
    run: Vec<Point>,
}

impl PathBuilder {
    fn move_to(&mut self, p: Point) {
        self.flush_run();
        self.current = Some(p);
        self.start = Some(p);
    }

    fn line_to(&mut self, p: Point) {
        if self.run.is_empty() {
            match self.current {
                Some(current) => self.run.push(current),
                None => self.start = Some(p),
            }
        }
        self.run.push(p);
        self.current = Some(p);
    }

    fn curve_to(&mut self, c1: Point, c2: Point, end: Point) {
        self.flush_run();
        let from = self.current.unwrap_or(c1);
        self.segments
            .push(PathSegment::new(PathCommand::Curve, vec![from, c1, c2, end]));
        self.current = Some(end);
    }

    fn close(&mut self) {
        if let (Some(current), Some(start)) = (self.current, self.start)
            && current != start
        {
            self.line_to(start);
        }
        self.flush_run();
        self.current = self.start;
    }

    fn rect(&mut self, ctm: &Matrix, x: f32, y: f32, w: f32, h: f32) {
        self.flush_run();
        let [_, b, c, _, _, _] = ctm.0;
        let corner = ctm.apply(Point::new(x, y));
        if b == 0.0 && c == 0.0 {
            let opposite = ctm.apply(Point::new(x + w, y + h));
            self.segments
                .push(PathSegment::new(PathCommand::Rect, vec![corner, opposite]));
        } else {
            let outline = vec![
                corner,
                ctm.apply(Point::new(x + w, y)),
                ctm.apply(Point::new(x + w, y + h)),
                ctm.apply(Point::new(x, y + h)),
                corner,
            ];
            self.segments
                .push(PathSegment::new(PathCommand::Polyline, outline));
        }
        self.current = Some(corner);
        self.start = Some(corner);
    }

    fn flush_run(&mut self) {
        let run = std::mem::take(&mut self.run);
        match run.len() {
            0 | 1 => {}
            2 => self.segments.push(PathSegment::new(PathCommand::Line, run)),
            _ => self.segments.push(PathSegment::new(PathCommand::Polyline, run)),
        }
    }

    fn take(&mut self) -> Vec<PathSegment> {
        self.flush_run();
        self.current = None;
        self.start = None;
        std::mem::take(&mut self.segments)
    }
}

/// Text object between `BT` and `ET`.
#[derive(Debug, Default)]
struct TextObject {
    matrix: Matrix,
    line_matrix: Matrix,
    lines: Vec<TextLine>,
    current: Vec<TextSpan>,
}

impl TextObject {
    fn new_line(&mut self) {
        if !self.current.is_empty() {
            self.lines.push(TextLine {
                spans: std::mem::take(&mut self.current),
            });
        }
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = Matrix::translate(tx, ty).then(&self.line_matrix);
        self.matrix = self.line_matrix;
        self.new_line();
    }

    fn into_block(mut self) -> Option<TextBlock> {
        self.new_line();
        let corners: Vec<Point> = self
            .lines
            .iter()
            .flat_map(|line| &line.spans)
            .flat_map(|span| {
                [
                    Point::new(span.bbox.x0, span.bbox.y0),
                    Point::new(span.bbox.x1, span.bbox.y1),
                ]
            })
            .collect();
        let bbox = Rect::bounding(&corners)?;
        Some(TextBlock::Text {
            bbox,
            lines: self.lines,
        })
    }
}

struct Interpreter<'a> {
    doc: &'a Document,
    state: GraphicsState,
    stack: Vec<GraphicsState>,
    path: PathBuilder,
    text: Option<TextObject>,
    out: PageElements,
}

impl<'a> Interpreter<'a> {
    fn new(doc: &'a Document, ctm: Matrix) -> Self {
        Self {
            doc,
            state: GraphicsState::new(ctm),
            stack: Vec::new(),
            path: PathBuilder::default(),
            text: None,
            out: PageElements::default(),
        }
    }

    fn finish(mut self) -> PageElements {
        if let Some(block) = self.text.take().and_then(TextObject::into_block) {
            self.out.blocks.push(block);
        }
        self.out
    }

    fn run(&mut self, operations: &[Operation], resources: Option<&'a Dictionary>, depth: usize) {
        for op in operations {
            self.step(op, resources, depth);
        }
    }

    fn step(&mut self, op: &Operation, resources: Option<&'a Dictionary>, depth: usize) {
        let operands = &op.operands;
        match op.operator.as_str() {
            // -- Graphics state --
            "q" => self.stack.push(self.state.clone()),
            "Q" => {
                if let Some(saved) = self.stack.pop() {
                    self.state = saved;
                }
            }
            "cm" => {
                if let Some(m) = matrix_operand(operands) {
                    self.state.ctm = m.then(&self.state.ctm);
                }
            }
            "w" => {
                if let Some(width) = operands.first().and_then(number) {
                    self.state.line_width = width;
                }
            }

            // -- Colour --
            "G" | "RG" | "K" | "SC" | "SCN" => self.state.stroke = stroke_color(operands),
            "g" | "rg" | "k" | "sc" | "scn" => {
                self.state.fill = match stroke_color(operands) {
                    StrokeColor::Triplet(rgb) => rgb,
                    _ => Rgb::BLACK,
                }
            }
            "CS" => self.state.stroke = color_space_default(operands),
            "cs" => self.state.fill = Rgb::BLACK,

            // -- Path construction --
            "m" => {
                if let Some(p) = self.point_operand(operands, 0) {
                    self.path.move_to(p);
                }
            }
            "l" => {
                if let Some(p) = self.point_operand(operands, 0) {
                    self.path.line_to(p);
                }
            }
            "c" => {
                if let (Some(c1), Some(c2), Some(end)) = (
                    self.point_operand(operands, 0),
                    self.point_operand(operands, 2),
                    self.point_operand(operands, 4),
                ) {
                    self.path.curve_to(c1, c2, end);
                }
            }
            "v" => {
                if let (Some(c2), Some(end)) =
                    (self.point_operand(operands, 0), self.point_operand(operands, 2))
                {
                    let c1 = self.path.current.unwrap_or(c2);
                    self.path.curve_to(c1, c2, end);
                }
            }
            "y" => {
                if let (Some(c1), Some(end)) =
                    (self.point_operand(operands, 0), self.point_operand(operands, 2))
                {
                    self.path.curve_to(c1, end, end);
                }
            }
            "re" => {
                if let Some([x, y, w, h]) = numbers::<4>(operands) {
                    self.path.rect(&self.state.ctm, x, y, w, h);
                }
            }
            "h" => self.path.close(),

            // -- Path painting --
            "S" => self.paint(true),
            "s" => {
                self.path.close();
                self.paint(true);
            }
            "B" | "B*" => self.paint(true),
            "b" | "b*" => {
                self.path.close();
                self.paint(true);
            }
            "f" | "F" | "f*" => self.paint(false),
            "n" => {
                self.path.take();
            }

            // -- Text --
            "BT" => {
                self.end_text();
                self.text = Some(TextObject::default());
            }
            "ET" => self.end_text(),
            "Tf" => {
                if let Some(Object::Name(name)) = operands.first() {
                    self.state.font = name.clone();
                }
                if let Some(size) = operands.get(1).and_then(number) {
                    self.state.font_size = size;
                }
            }
            "TL" => {
                if let Some(leading) = operands.first().and_then(number) {
                    self.state.leading = leading;
                }
            }
            "Td" => {
                if let Some([tx, ty]) = numbers::<2>(operands) {
                    self.text_object().move_line(tx, ty);
                }
            }
            "TD" => {
                if let Some([tx, ty]) = numbers::<2>(operands) {
                    self.state.leading = -ty;
                    self.text_object().move_line(tx, ty);
                }
            }
            "T*" => self.next_line(),
            "Tm" => {
                if let Some(m) = matrix_operand(operands) {
                    let text = self.text_object();
                    text.line_matrix = m;
                    text.matrix = m;
                    text.new_line();
                }
            }
            "Tj" | "TJ" => {
                if let Some(operand) = operands.first() {
                    self.show(operand, resources);
                }
            }
            "'" => {
                self.next_line();
                if let Some(operand) = operands.first() {
                    self.show(operand, resources);
                }
            }
            "\"" => {
                self.next_line();
                if let Some(operand) = operands.get(2) {
                    self.show(operand, resources);
                }
            }

            // -- XObjects --
            "Do" => {
                if let Some(Object::Name(name)) = operands.first() {
                    self.do_xobject(name, resources, depth);
                }
            }
            "BI" => self.place_image(None),

            other => trace!(operator = other, "Operator not interpreted"),
        }
    }

    fn point_operand(&self, operands: &[Object], offset: usize) -> Option<Point> {
        let x = operands.get(offset).and_then(number)?;
        let y = operands.get(offset + 1).and_then(number)?;
        Some(self.state.ctm.apply(Point::new(x, y)))
    }

    fn paint(&mut self, stroked: bool) {
        let segments = self.path.take();
        if segments.is_empty() {
            return;
        }
        let width = self.state.line_width * self.state.ctm.mean_scale();
        let group = if stroked {
            DrawingGroup {
                color: self.state.stroke.clone(),
                width: Some(width),
                fallback_width: None,
                segments,
            }
        } else {
            DrawingGroup {
                color: StrokeColor::Absent,
                width: None,
                fallback_width: Some(width),
                segments,
            }
        };
        self.out.drawings.push(group);
    }

    // -- Text -----------------------------------------------------------------

    fn text_object(&mut self) -> &mut TextObject {
        self.text.get_or_insert_with(TextObject::default)
    }

    fn next_line(&mut self) {
        let leading = self.state.leading;
        self.text_object().move_line(0.0, -leading);
    }

    fn end_text(&mut self) {
        if let Some(block) = self.text.take().and_then(TextObject::into_block) {
            self.out.blocks.push(block);
        }
    }

    fn show(&mut self, operand: &Object, resources: Option<&'a Dictionary>) {
        let font = resources.and_then(|res| self.font_dictionary(res, &self.state.font));
        let text = match operand {
            Object::String(bytes, _) => self.decode(font, bytes),
            Object::Array(items) => {
                let mut combined = String::new();
                for item in items {
                    match item {
                        Object::String(bytes, _) => combined.push_str(&self.decode(font, bytes)),
                        other => {
                            if let Some(adjustment) = number(other)
                                && -adjustment > TJ_SPACE_THRESHOLD
                                && !combined.is_empty()
                                && !combined.ends_with(' ')
                            {
                                combined.push(' ');
                            }
                        }
                    }
                }
                combined
            }
            _ => return,
        };

        let font_name = font
            .and_then(|dict| dict.get(b"BaseFont").ok())
            .and_then(|name| name.as_name().ok())
            .map(|name| strip_subset_prefix(&String::from_utf8_lossy(name)).to_string())
            .unwrap_or_else(|| String::from_utf8_lossy(&self.state.font).into_owned());

        let font_size = self.state.font_size;
        let ctm = self.state.ctm;
        let fill = self.state.fill;
        let text_obj = self.text_object();

        let advance = text.chars().count() as f32 * GLYPH_ADVANCE_EM * font_size;
        let trm = text_obj.matrix.then(&ctm);
        let (sx, sy) = (trm.x_scale(), trm.y_scale());
        let origin = trm.apply(Point::new(0.0, 0.0));
        let [a, b, c, d, _, _] = trm.0;

        if !text.is_empty() && sx > 0.0 && sy > 0.0 {
            text_obj.current.push(TextSpan {
                text,
                font: font_name,
                size: font_size * sy,
                origin,
                bbox: trm.transform_rect(&Rect::new(
                    0.0,
                    -0.2 * font_size,
                    advance,
                    0.8 * font_size,
                )),
                matrix: Matrix([a / sx, b / sx, c / sy, d / sy, origin.x, origin.y]),
                color: Some(color::pack(fill)),
            });
        }
        text_obj.matrix = Matrix::translate(advance, 0.0).then(&text_obj.matrix);
    }

    fn font_dictionary(&self, resources: &'a Dictionary, name: &[u8]) -> Option<&'a Dictionary> {
        let fonts = resolve_dict(self.doc, resources.get(b"Font").ok()?)?;
        resolve_dict(self.doc, fonts.get(name).ok()?)
    }

    fn decode(&self, font: Option<&Dictionary>, bytes: &[u8]) -> String {
        font.and_then(|dict| dict.get_font_encoding(self.doc).ok())
            .and_then(|encoding| Document::decode_text(&encoding, bytes).ok())
            .unwrap_or_else(|| decode_fallback(bytes))
    }

    // -- XObjects -------------------------------------------------------------

    fn do_xobject(&mut self, name: &[u8], resources: Option<&'a Dictionary>, depth: usize) {
        let Some(entry) = resources
            .and_then(|res| res.get(b"XObject").ok())
            .and_then(|xobjects| resolve_dict(self.doc, xobjects))
            .and_then(|xobjects| xobjects.get(name).ok())
        else {
            debug!(name = %String::from_utf8_lossy(name), "XObject not found in resources");
            return;
        };

        let (handle, stream) = match entry {
            Object::Reference(id) => match self.doc.get_object(*id).and_then(Object::as_stream) {
                Ok(stream) => (Some(ImageHandle::new(id.0, id.1)), stream),
                Err(_) => return,
            },
            Object::Stream(stream) => (None, stream),
            _ => return,
        };

        match stream.dict.get(b"Subtype").and_then(Object::as_name) {
            Ok(b"Image") => self.place_image(handle),
            Ok(b"Form") => self.run_form(stream, resources, depth),
            _ => {}
        }
    }

    fn place_image(&mut self, handle: Option<ImageHandle>) {
        let bbox = self
            .state
            .ctm
            .transform_rect(&Rect::new(0.0, 0.0, 1.0, 1.0));
        self.out.blocks.push(TextBlock::Image { bbox, handle });
        if let Some(handle) = handle {
            self.out.images.push(ImageDescriptor { handle, bbox });
        }
    }

    fn run_form(&mut self, form: &'a Stream, parent: Option<&'a Dictionary>, depth: usize) {
        if depth >= MAX_FORM_DEPTH {
            warn!(depth, "Form XObject nesting too deep, skipped");
            return;
        }
        let Some(data) = stream_data(form) else {
            warn!("Form XObject content could not be decompressed");
            return;
        };
        let content = match Content::decode(&data) {
            Ok(content) => content,
            Err(err) => {
                warn!(%err, "Form XObject content could not be parsed");
                return;
            }
        };

        let form_matrix = form
            .dict
            .get(b"Matrix")
            .ok()
            .and_then(|m| m.as_array().ok())
            .and_then(|m| matrix_operand(m))
            .unwrap_or_default();
        let resources = form
            .dict
            .get(b"Resources")
            .ok()
            .and_then(|res| resolve_dict(self.doc, res))
            .or(parent);

        self.stack.push(self.state.clone());
        self.state.ctm = form_matrix.then(&self.state.ctm);
        self.run(&content.operations, resources, depth + 1);
        if let Some(saved) = self.stack.pop() {
            self.state = saved;
        }
    }
}

// -- Operand helpers ----------------------------------------------------------

fn number(obj: &Object) -> Option<f32> {
    obj.as_float().ok()
}

fn numbers<const N: usize>(operands: &[Object]) -> Option<[f32; N]> {
    if operands.len() < N {
        return None;
    }
    let mut values = [0.0; N];
    for (slot, operand) in values.iter_mut().zip(operands) {
        *slot = number(operand)?;
    }
    Some(values)
}

fn matrix_operand(operands: &[Object]) -> Option<Matrix> {
    numbers::<6>(operands).map(Matrix)
}

/// Colour from the numeric operands of a colour operator: one component is
/// grey, three RGB, four CMYK. Pattern names do not reduce to RGB.
fn stroke_color(operands: &[Object]) -> StrokeColor {
    if operands.iter().any(|op| matches!(op, Object::Name(_))) {
        return StrokeColor::Unsupported("pattern".to_string());
    }
    let values: Vec<f32> = operands.iter().filter_map(number).collect();
    match values.as_slice() {
        [gray] => StrokeColor::Triplet(Rgb::new(*gray, *gray, *gray).clamped()),
        [r, g, b] => StrokeColor::Triplet(Rgb::new(*r, *g, *b).clamped()),
        [c, m, y, k] => StrokeColor::Triplet(
            Rgb::new((1.0 - c) * (1.0 - k), (1.0 - m) * (1.0 - k), (1.0 - y) * (1.0 - k))
                .clamped(),
        ),
        _ => StrokeColor::Unsupported(format!("{} components", values.len())),
    }
}

/// Initial stroke colour after `CS` selects a colour space.
fn color_space_default(operands: &[Object]) -> StrokeColor {
    match operands.first().and_then(|op| op.as_name().ok()) {
        Some(b"Pattern") => StrokeColor::Unsupported("pattern".to_string()),
        _ => StrokeColor::Triplet(Rgb::BLACK),
    }
}

pub(crate) fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match obj {
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

/// Stream bytes with filters removed. Unfiltered streams are returned as-is.
pub(crate) fn stream_data(stream: &Stream) -> Option<Vec<u8>> {
    if stream.dict.has(b"Filter") {
        stream.decompressed_content().ok()
    } else {
        Some(stream.content.clone())
    }
}

/// Drop the six-letter subset tag (`ABCDEF+`) embedded fonts carry.
fn strip_subset_prefix(name: &str) -> &str {
    match name.split_once('+') {
        Some((tag, rest)) if tag.len() == 6 && tag.chars().all(|c| c.is_ascii_uppercase()) => rest,
        _ => name,
    }
}

/// Decode string bytes without a font encoding: UTF-16BE with BOM, then
/// UTF-8, then Latin-1.
fn decode_fallback(bytes: &[u8]) -> String {
    if let Some(body) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = body
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}
