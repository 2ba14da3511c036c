// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — open existing PDF documents with `lopdf` and extract the
// structured content of each page: text spans, drawings, image placements
// and link rectangles.

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use stilwerk_core::error::{Result, StilwerkError};
use stilwerk_core::types::{ImageHandle, Matrix, PageContent, Rect};
use tracing::{debug, info, instrument, warn};

use super::interpreter::{self, resolve_dict, stream_data};
use crate::render::source::PageSource;

/// US Letter, used when a page declares no usable `/MediaBox`.
pub const DEFAULT_MEDIA_BOX: Rect = Rect {
    x0: 0.0,
    y0: 0.0,
    x1: 612.0,
    y1: 792.0,
};

/// Page tree levels walked when resolving inherited attributes.
const MAX_INHERIT_DEPTH: usize = 32;

/// Reads existing PDF files.
///
/// Wraps `lopdf::Document` and exposes each page as a [`PageContent`] in the
/// page's visible space: the crop box shifted to the origin, with `/Rotate`
/// applied so the page comes out upright.
pub struct PdfReader {
    /// The underlying lopdf document.
    document: Document,
    /// Source path, if opened from a file (useful for diagnostics).
    source_path: Option<String>,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());

        let document = Document::load(path_ref).map_err(|err| {
            StilwerkError::PdfError(format!("failed to open {}: {}", path_ref.display(), err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded");

        Ok(Self {
            document,
            source_path: Some(path_ref.display().to_string()),
        })
    }

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data).map_err(|err| {
            StilwerkError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self {
            document,
            source_path: None,
        })
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Return the source path if the reader was created via [`PdfReader::open`].
    pub fn source_path(&self) -> Option<&str> {
        self.source_path.as_deref()
    }

    // -- Extraction -----------------------------------------------------------

    /// Extract the content of the page at `index` (0-indexed).
    ///
    /// A page whose content stream cannot be parsed comes back empty but with
    /// its real size, so the output keeps one page per source page.
    #[instrument(skip(self), fields(page = index + 1))]
    pub fn extract_page(&self, index: usize) -> Result<PageContent> {
        let number = index as u32 + 1;
        let pages = self.document.get_pages();
        let page_id = *pages.get(&number).ok_or_else(|| {
            StilwerkError::PdfError(format!(
                "page {} out of range (document has {} pages)",
                number,
                pages.len()
            ))
        })?;

        let visible = self.crop_box(page_id);
        let rotation = self.rotation(page_id);
        let (width, height) = match rotation {
            90 | 270 => (visible.height(), visible.width()),
            _ => (visible.width(), visible.height()),
        };
        let shift = Matrix::translate(-visible.x0, -visible.y0)
            .then(&page_rotation(rotation, visible.width(), visible.height()));
        let mut page = PageContent::blank(number, width, height);
        page.links = self
            .links(page_id)
            .iter()
            .map(|rect| shift.transform_rect(rect))
            .collect();

        let data = self.page_content(page_id);
        let content = match Content::decode(&data) {
            Ok(content) => content,
            Err(err) => {
                warn!(page = number, %err, "Content stream could not be parsed, page left empty");
                return Ok(page);
            }
        };

        let resources = self
            .inherited(page_id, b"Resources")
            .and_then(|res| resolve_dict(&self.document, res));
        let elements = interpreter::interpret(&self.document, &content.operations, resources, shift);

        debug!(
            blocks = elements.blocks.len(),
            drawings = elements.drawings.len(),
            images = elements.images.len(),
            links = page.links.len(),
            "Page extracted"
        );

        page.blocks = elements.blocks;
        page.drawings = elements.drawings;
        page.images = elements.images;
        Ok(page)
    }

    /// Encoded bytes of the image XObject behind `handle`.
    ///
    /// JPEG streams are passed through; raw or Flate-compressed 8-bit RGB and
    /// grey samples are re-encoded as PNG. Anything else, JPEG 2000 included,
    /// yields `None` since it could not be decoded for placement.
    pub fn image_bytes(&self, handle: ImageHandle) -> Option<Vec<u8>> {
        let stream = self
            .document
            .get_object((handle.object, handle.generation))
            .and_then(Object::as_stream)
            .ok()?;

        let filters = filter_names(&self.document, stream);
        match filters.as_slice() {
            [single] if single == b"DCTDecode" => Some(stream.content.clone()),
            [] => self.encode_samples(handle, stream),
            [single] if single == b"FlateDecode" => self.encode_samples(handle, stream),
            other => {
                debug!(
                    %handle,
                    filters = ?other.iter().map(|f| String::from_utf8_lossy(f).into_owned()).collect::<Vec<_>>(),
                    "Image filter chain not supported"
                );
                None
            }
        }
    }

    // -- Helpers --------------------------------------------------------------

    /// Look up a page attribute, walking up the page tree for inherited ones.
    fn inherited(&self, page_id: ObjectId, key: &[u8]) -> Option<&Object> {
        let mut node = self.document.get_dictionary(page_id).ok()?;
        for _ in 0..MAX_INHERIT_DEPTH {
            if let Ok(value) = node.get(key) {
                return Some(value);
            }
            let parent = node.get(b"Parent").and_then(Object::as_reference).ok()?;
            node = self.document.get_dictionary(parent).ok()?;
        }
        None
    }

    fn media_box(&self, page_id: ObjectId) -> Rect {
        self.inherited(page_id, b"MediaBox")
            .and_then(|obj| self.rect_of(obj))
            .filter(|rect| !rect.is_empty())
            .unwrap_or(DEFAULT_MEDIA_BOX)
    }

    /// Inherited `/CropBox` clipped to the media box, or the media box itself.
    fn crop_box(&self, page_id: ObjectId) -> Rect {
        let media_box = self.media_box(page_id);
        self.inherited(page_id, b"CropBox")
            .and_then(|obj| self.rect_of(obj))
            .and_then(|crop| clip(&crop, &media_box))
            .unwrap_or(media_box)
    }

    /// Inherited `/Rotate`, normalised to 0, 90, 180 or 270.
    fn rotation(&self, page_id: ObjectId) -> i32 {
        let degrees = self
            .inherited(page_id, b"Rotate")
            .and_then(|obj| obj.as_i64().ok())
            .unwrap_or(0)
            .rem_euclid(360);
        match degrees {
            0 | 90 | 180 | 270 => degrees as i32,
            other => {
                warn!(?page_id, rotate = other, "/Rotate is not a multiple of 90, ignored");
                0
            }
        }
    }

    fn rect_of(&self, obj: &Object) -> Option<Rect> {
        let array = match obj {
            Object::Reference(id) => self.document.get_object(*id).ok()?.as_array().ok()?,
            other => other.as_array().ok()?,
        };
        let values: Vec<f32> = array.iter().filter_map(|v| v.as_float().ok()).collect();
        match values.as_slice() {
            [x0, y0, x1, y1] => Some(Rect::new(*x0, *y0, *x1, *y1)),
            _ => None,
        }
    }

    /// Concatenated, decompressed content streams of a page.
    fn page_content(&self, page_id: ObjectId) -> Vec<u8> {
        let Some(contents) = self
            .document
            .get_dictionary(page_id)
            .ok()
            .and_then(|page| page.get(b"Contents").ok())
        else {
            return Vec::new();
        };

        let refs: Vec<&Object> = match contents {
            Object::Array(items) => items.iter().collect(),
            Object::Reference(id) => match self.document.get_object(*id) {
                Ok(Object::Array(items)) => items.iter().collect(),
                _ => vec![contents],
            },
            other => vec![other],
        };

        let mut data = Vec::new();
        for obj in refs {
            let stream = match obj {
                Object::Reference(id) => self.document.get_object(*id).and_then(Object::as_stream).ok(),
                Object::Stream(stream) => Some(stream),
                _ => None,
            };
            match stream.and_then(stream_data) {
                Some(bytes) => {
                    data.extend_from_slice(&bytes);
                    data.push(b'\n');
                }
                None => warn!(?page_id, "Content stream could not be decompressed"),
            }
        }
        data
    }

    /// Rectangles of `/Link` annotations on a page.
    fn links(&self, page_id: ObjectId) -> Vec<Rect> {
        let annots = match self
            .document
            .get_dictionary(page_id)
            .ok()
            .and_then(|page| page.get(b"Annots").ok())
        {
            Some(Object::Array(items)) => items.as_slice(),
            Some(Object::Reference(id)) => match self.document.get_object(*id) {
                Ok(Object::Array(items)) => items.as_slice(),
                _ => return Vec::new(),
            },
            _ => return Vec::new(),
        };

        annots
            .iter()
            .filter_map(|annot| resolve_dict(&self.document, annot))
            .filter(|annot| {
                matches!(annot.get(b"Subtype").and_then(Object::as_name), Ok(b"Link"))
            })
            .filter_map(|annot| annot.get(b"Rect").ok().and_then(|rect| self.rect_of(rect)))
            .collect()
    }

    fn encode_samples(&self, handle: ImageHandle, stream: &Stream) -> Option<Vec<u8>> {
        let dict = &stream.dict;
        let int = |key: &[u8]| dict.get(key).and_then(Object::as_i64).ok();
        let width = u32::try_from(int(b"Width")?).ok()?;
        let height = u32::try_from(int(b"Height")?).ok()?;
        if int(b"BitsPerComponent") != Some(8) {
            debug!(%handle, "Only 8-bit image samples are re-encoded");
            return None;
        }
        let components = self.color_components(dict.get(b"ColorSpace").ok()?)?;
        let samples = stream_data(stream)?;

        let image = match components {
            1 => DynamicImage::ImageLuma8(GrayImage::from_raw(width, height, samples)?),
            3 => DynamicImage::ImageRgb8(RgbImage::from_raw(width, height, samples)?),
            _ => return None,
        };

        let mut encoded = Vec::new();
        if let Err(err) = image.write_to(&mut Cursor::new(&mut encoded), ImageFormat::Png) {
            debug!(%handle, %err, "Image re-encoding failed");
            return None;
        }
        Some(encoded)
    }

    /// Number of colour components of a DeviceGray/DeviceRGB/ICCBased space.
    fn color_components(&self, space: &Object) -> Option<u8> {
        let space = match space {
            Object::Reference(id) => self.document.get_object(*id).ok()?,
            other => other,
        };
        match space {
            Object::Name(name) => match name.as_slice() {
                b"DeviceGray" | b"CalGray" => Some(1),
                b"DeviceRGB" | b"CalRGB" => Some(3),
                _ => None,
            },
            Object::Array(items) => match items.first().and_then(|n| n.as_name().ok()) {
                Some(b"ICCBased") => {
                    let profile = match items.get(1)? {
                        Object::Reference(id) => self.document.get_object(*id).ok()?,
                        other => other,
                    };
                    let n = profile.as_stream().ok()?.dict.get(b"N").and_then(Object::as_i64).ok()?;
                    u8::try_from(n).ok()
                }
                Some(b"CalGray") => Some(1),
                Some(b"CalRGB") => Some(3),
                _ => None,
            },
            _ => None,
        }
    }
}

impl PageSource for PdfReader {
    fn page_count(&self) -> usize {
        PdfReader::page_count(self)
    }

    fn page(&self, index: usize) -> Result<PageContent> {
        self.extract_page(index)
    }

    fn image_bytes(&self, handle: ImageHandle) -> Option<Vec<u8>> {
        PdfReader::image_bytes(self, handle)
    }
}

/// Clockwise page rotation of a `width` x `height` box at the origin, mapped
/// back into the positive quadrant.
fn page_rotation(rotation: i32, width: f32, height: f32) -> Matrix {
    match rotation {
        90 => Matrix([0.0, -1.0, 1.0, 0.0, 0.0, width]),
        180 => Matrix([-1.0, 0.0, 0.0, -1.0, width, height]),
        270 => Matrix([0.0, 1.0, -1.0, 0.0, height, 0.0]),
        _ => Matrix::IDENTITY,
    }
}

/// Overlap of two rectangles, if it has an area.
fn clip(a: &Rect, b: &Rect) -> Option<Rect> {
    let (x0, y0) = (a.x0.max(b.x0), a.y0.max(b.y0));
    let (x1, y1) = (a.x1.min(b.x1), a.y1.min(b.y1));
    (x0 < x1 && y0 < y1).then(|| Rect::new(x0, y0, x1, y1))
}

/// Filter names of a stream in application order.
fn filter_names(doc: &Document, stream: &Stream) -> Vec<Vec<u8>> {
    let filter = match stream.dict.get(b"Filter") {
        Ok(Object::Reference(id)) => doc.get_object(*id).ok(),
        Ok(other) => Some(other),
        Err(_) => None,
    };
    match filter {
        Some(Object::Name(name)) => vec![name.clone()],
        Some(Object::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_name().ok().map(<[u8]>::to_vec))
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::Operation;
    use lopdf::dictionary;
    use stilwerk_core::types::TextBlock;

    struct Fixture {
        bytes: Vec<u8>,
        rgb: ImageHandle,
        jpeg: ImageHandle,
        jpeg_bytes: Vec<u8>,
    }

    fn jpeg() -> Vec<u8> {
        let mut buffer = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, image::Rgb([200, 30, 30])))
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Jpeg)
            .unwrap();
        buffer
    }

    /// Two pages under one page tree node that carries the media box; the
    /// first page is offset and has a link annotation.
    fn fixture() -> Fixture {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let rgb_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 2,
                "Height" => 1,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            vec![255, 0, 0, 0, 0, 255],
        ));
        let jpeg_bytes = jpeg();
        let jpeg_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 4,
                "Height" => 4,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            jpeg_bytes.clone(),
        ));

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![20.into(), 0.into(), 0.into(), 10.into(), 30.into(), 40.into()],
                ),
                Operation::new("Do", vec![Object::Name(b"Im1".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let link = dictionary! {
            "Type" => "Annot",
            "Subtype" => "Link",
            "Rect" => vec![20.into(), 30.into(), 60.into(), 40.into()],
        };
        let note = dictionary! {
            "Type" => "Annot",
            "Subtype" => "Text",
            "Rect" => vec![0.into(), 0.into(), 5.into(), 5.into()],
        };
        let first = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![10.into(), 20.into(), 210.into(), 320.into()],
            "Contents" => content_id,
            "Annots" => vec![link.into(), note.into()],
        });
        let garbage_id = doc.add_object(Stream::new(dictionary! {}, b"BT (unterminated".to_vec()));
        let second = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => garbage_id,
        });

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![first.into(), second.into()],
                "Count" => 2,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
                "Resources" => dictionary! {
                    "XObject" => dictionary! { "Im1" => rgb_id },
                },
            }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        Fixture {
            bytes,
            rgb: ImageHandle::new(rgb_id.0, rgb_id.1),
            jpeg: ImageHandle::new(jpeg_id.0, jpeg_id.1),
            jpeg_bytes,
        }
    }

    #[test]
    fn page_size_and_origin_shift() {
        let fixture = fixture();
        let reader = PdfReader::from_bytes(&fixture.bytes).unwrap();
        assert_eq!(reader.page_count(), 2);
        assert!(reader.source_path().is_none());

        let page = reader.extract_page(0).unwrap();
        assert_eq!(page.number, 1);
        assert_eq!((page.width, page.height), (200.0, 300.0));
        assert_eq!(page.links, vec![Rect::new(10.0, 10.0, 50.0, 20.0)]);
        assert_eq!(
            page.blocks,
            vec![TextBlock::Image {
                bbox: Rect::new(20.0, 20.0, 40.0, 30.0),
                handle: Some(fixture.rgb),
            }]
        );
        assert_eq!(page.images.len(), 1);
    }

    #[test]
    fn inherited_media_box_and_unparseable_content() {
        let reader = PdfReader::from_bytes(&fixture().bytes).unwrap();
        let page = reader.extract_page(1).unwrap();
        assert_eq!((page.width, page.height), (595.0, 842.0));
        assert!(page.blocks.is_empty());
        assert!(page.drawings.is_empty());
    }

    #[test]
    fn out_of_range_page_is_an_error() {
        let reader = PdfReader::from_bytes(&fixture().bytes).unwrap();
        assert!(matches!(
            reader.extract_page(2),
            Err(StilwerkError::PdfError(_))
        ));
    }

    #[test]
    fn image_bytes_by_filter() {
        let fixture = fixture();
        let reader = PdfReader::from_bytes(&fixture.bytes).unwrap();

        let png = reader.image_bytes(fixture.rgb).expect("raw samples re-encoded");
        let decoded = image::load_from_memory(&png).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (2, 1));
        assert_eq!(decoded.get_pixel(1, 0).0, [0, 0, 255]);

        assert_eq!(reader.image_bytes(fixture.jpeg), Some(fixture.jpeg_bytes));
        assert_eq!(reader.image_bytes(ImageHandle::new(9999, 0)), None);
    }

    #[test]
    fn jpeg_2000_is_unresolvable() {
        let mut document = Document::with_version("1.5");
        let jpx = document.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 4,
                "Height" => 4,
                "Filter" => "JPXDecode",
            },
            b"\x00\x00\x00\x0cjP  ".to_vec(),
        ));
        let reader = PdfReader {
            document,
            source_path: None,
        };
        assert_eq!(reader.image_bytes(ImageHandle::new(jpx.0, jpx.1)), None);
    }

    /// One page drawing a 20x10 image and carrying a link at (36, 36), under
    /// a page tree node with `pages_extra` and a page with `page_extra`.
    fn boxed_page(page_extra: Dictionary, pages_extra: Dictionary) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 1,
                "Height" => 1,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            vec![128],
        ));
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![20.into(), 0.into(), 0.into(), 10.into(), 36.into(), 36.into()],
                ),
                Operation::new("Do", vec![Object::Name(b"Im1".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let link = dictionary! {
            "Type" => "Annot",
            "Subtype" => "Link",
            "Rect" => vec![36.into(), 36.into(), 46.into(), 56.into()],
        };

        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Annots" => vec![link.into()],
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im1" => image_id },
            },
        };
        for (key, value) in page_extra.iter() {
            page.set(key.clone(), value.clone());
        }
        let page_id = doc.add_object(page);

        let mut pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        };
        for (key, value) in pages_extra.iter() {
            pages.set(key.clone(), value.clone());
        }
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    fn image_bbox(page: &PageContent) -> Rect {
        match page.blocks.as_slice() {
            [TextBlock::Image { bbox, .. }] => *bbox,
            other => panic!("expected one image block, got {other:?}"),
        }
    }

    fn crop() -> Dictionary {
        dictionary! { "CropBox" => vec![36.into(), 36.into(), 576.into(), 756.into()] }
    }

    #[test]
    fn crop_box_sets_size_and_origin() {
        let reader = PdfReader::from_bytes(&boxed_page(crop(), dictionary! {})).unwrap();
        let page = reader.extract_page(0).unwrap();
        assert_eq!((page.width, page.height), (540.0, 720.0));
        assert_eq!(image_bbox(&page), Rect::new(0.0, 0.0, 20.0, 10.0));
        assert_eq!(page.links, vec![Rect::new(0.0, 0.0, 10.0, 20.0)]);
    }

    #[test]
    fn rotate_90_turns_the_cropped_page_landscape() {
        let mut page_extra = crop();
        page_extra.set("Rotate", Object::Integer(90));
        let reader = PdfReader::from_bytes(&boxed_page(page_extra, dictionary! {})).unwrap();
        let page = reader.extract_page(0).unwrap();
        assert_eq!((page.width, page.height), (720.0, 540.0));
        // The bottom-left corner of the crop box ends up top-left.
        assert_eq!(image_bbox(&page), Rect::new(0.0, 520.0, 10.0, 540.0));
        assert_eq!(page.links, vec![Rect::new(0.0, 530.0, 20.0, 540.0)]);
    }

    #[test]
    fn inherited_rotate_270_without_crop_box() {
        let reader =
            PdfReader::from_bytes(&boxed_page(dictionary! {}, dictionary! { "Rotate" => Object::Integer(-90) }))
                .unwrap();
        let page = reader.extract_page(0).unwrap();
        assert_eq!((page.width, page.height), (792.0, 612.0));
        assert_eq!(image_bbox(&page), Rect::new(746.0, 36.0, 756.0, 56.0));
    }

    #[test]
    fn crop_box_outside_media_box_is_ignored() {
        let outside = dictionary! {
            "CropBox" => vec![700.into(), 800.into(), 900.into(), 1000.into()],
        };
        let reader = PdfReader::from_bytes(&boxed_page(outside, dictionary! {})).unwrap();
        let page = reader.extract_page(0).unwrap();
        assert_eq!((page.width, page.height), (612.0, 792.0));
    }

    #[test]
    fn garbage_input_is_rejected() {
        assert!(matches!(
            PdfReader::from_bytes(b"not a pdf"),
            Err(StilwerkError::PdfError(_))
        ));
    }
}
