#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Cursor;

use fieldreport_pdf::report::{FieldSpec, SectionBody, SectionSpec, ValueFormat};
use fieldreport_pdf::{
    DocumentTemplate, Error, FetchedImage, ImageSource, Placement, PlacementKind, Record, Scalar, Span,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn png_bytes(w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(w, h, |x, y| image::Rgb([(x * 40) as u8, (y * 40) as u8, 120]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

pub fn jpeg_bytes(w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(w, h, image::Rgb([30, 90, 160]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Jpeg).unwrap();
    out.into_inner()
}

/// Serves images from memory and remembers every URL it was asked for.
#[derive(Default)]
pub struct MemoryImages {
    images: HashMap<String, FetchedImage>,
    requests: RefCell<Vec<String>>,
}

impl MemoryImages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, bytes: Vec<u8>, content_type: Option<&str>) -> Self {
        self.images.insert(
            url.to_string(),
            FetchedImage {
                bytes,
                content_type: content_type.map(str::to_string),
            },
        );
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl ImageSource for MemoryImages {
    fn fetch(&self, url: &str) -> Result<FetchedImage, Error> {
        self.requests.borrow_mut().push(url.to_string());
        self.images
            .get(url)
            .cloned()
            .ok_or_else(|| Error::Fetch(format!("{url}: 404 Not Found")))
    }
}

pub fn record(id: &str, job_order: Option<&str>, fields: &[(&str, Scalar)]) -> Record {
    Record {
        id: id.to_string(),
        job_order: job_order.map(str::to_string),
        fields: fields
            .iter()
            .map(|(k, v)| (k.to_string(), Some(v.clone())))
            .collect(),
        ..Default::default()
    }
}

pub fn text(s: &str) -> Scalar {
    Scalar::Text(s.to_string())
}

/// A one-section template holding a single field grid.
pub fn field_grid_template(spans: &[Span], columns: usize) -> DocumentTemplate {
    let fields = spans
        .iter()
        .enumerate()
        .map(|(i, span)| FieldSpec {
            key: format!("f{i}"),
            label: format!("Field {i:03}"),
            span: *span,
            format: ValueFormat::Text,
            required: false,
        })
        .collect();
    DocumentTemplate {
        slug: "grid-test".into(),
        title: "Grid Test".into(),
        file_prefix: None,
        sections: vec![SectionSpec {
            title: "Readings".into(),
            body: SectionBody::Fields { columns, fields },
        }],
    }
}

pub fn placements(layout: &[Placement], pred: impl Fn(&PlacementKind) -> bool) -> Vec<&Placement> {
    layout.iter().filter(|p| pred(&p.kind)).collect()
}

/// Count `/Type /Page` objects, excluding the `/Pages` tree node.
pub fn pdf_page_objects(bytes: &[u8]) -> usize {
    let needle = b"/Type /Page";
    bytes
        .windows(needle.len() + 1)
        .filter(|w| &w[..needle.len()] == needle && w[needle.len()] != b's')
        .count()
}
