mod attachments;
mod grid;
mod layout;
mod section;
mod signatures;
mod text_block;

use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, TextStr};

use crate::fonts::{FontSet, FontStyle};
use crate::model::{ColorSpace, EmbeddedImage, ImageFormat};
use crate::style::LayoutStyle;

pub(crate) use attachments::{ResolvedAttachment, render_attachment_grid};
pub(crate) use grid::{render_checkbox_grid, render_field_grid};
pub(crate) use layout::Align;
pub(crate) use section::{SectionLead, render_section_header, render_title_block};
pub(crate) use signatures::{ResolvedSignatory, render_signatory_band};
pub(crate) use text_block::render_text_block;

/// What a [`Placement`] in the layout trace refers to.
#[derive(Clone, Debug, PartialEq)]
pub enum PlacementKind {
    TitleBlock,
    SectionHeader,
    /// One bordered box of a field grid (a whole grid, or one page's share of it).
    FieldGrid,
    /// A field inside the preceding `FieldGrid` box.
    Field { row: usize, column: usize },
    CheckboxGrid,
    Checkbox { row: usize, column: usize, checked: bool },
    TextBlock,
    AttachmentRow,
    Attachment { column: usize },
    SignatureBand,
    Signatory { slot: usize, has_image: bool },
}

/// One drawn block in the layout trace. `page` is zero-based, `top` is
/// measured from the top edge of the page.
#[derive(Clone, Debug, PartialEq)]
pub struct Placement {
    pub page: usize,
    pub top: f32,
    pub height: f32,
    pub kind: PlacementKind,
    pub label: String,
}

/// The vertical write position on the current page, measured from the top.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Cursor {
    y: f32,
    top: f32,
    limit: f32,
}

impl Cursor {
    fn new(style: &LayoutStyle) -> Self {
        Self {
            y: style.margin_top,
            top: style.margin_top,
            limit: style.bottom_limit(),
        }
    }

    pub(crate) fn y(&self) -> f32 {
        self.y
    }

    pub(crate) fn fits(&self, needed: f32) -> bool {
        self.y + needed <= self.limit
    }

    pub(crate) fn remaining(&self) -> f32 {
        self.limit - self.y
    }

    pub(crate) fn at_page_top(&self) -> bool {
        (self.y - self.top).abs() < 0.01
    }

    /// Trailing gaps may run past the bottom limit; the cursor stops there.
    fn advance(&mut self, dy: f32) {
        self.y = (self.y + dy).min(self.limit);
    }

    fn reset(&mut self) {
        self.y = self.top;
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct TextStyle {
    pub(crate) font: FontStyle,
    pub(crate) size: f32,
    pub(crate) line_height: f32,
    pub(crate) color: [u8; 3],
    pub(crate) align: Align,
}

impl TextStyle {
    pub(crate) fn new(font: FontStyle, size: f32) -> Self {
        Self {
            font,
            size,
            line_height: size * 1.2,
            color: [0, 0, 0],
            align: Align::Left,
        }
    }

    pub(crate) fn line_height(mut self, line_height: f32) -> Self {
        self.line_height = line_height;
        self
    }

    pub(crate) fn color(mut self, color: [u8; 3]) -> Self {
        self.color = color;
        self
    }

    pub(crate) fn centered(mut self) -> Self {
        self.align = Align::Center;
        self
    }
}

fn rgb(color: [u8; 3]) -> (f32, f32, f32) {
    (
        color[0] as f32 / 255.0,
        color[1] as f32 / 255.0,
        color[2] as f32 / 255.0,
    )
}

/// Page geometry, the cursor and the drawing primitives for one document.
///
/// All positions handed to the drawing methods are measured from the top-left
/// corner of the page; conversion to PDF's bottom-up space happens here only.
/// Page breaks happen exclusively through [`Surface::new_page`].
pub(crate) struct Surface {
    pdf: Pdf,
    next_id: i32,
    catalog_id: Ref,
    pages_id: Ref,
    fonts: FontSet,
    style: LayoutStyle,
    cursor: Cursor,
    finished_pages: Vec<Content>,
    current: Content,
    image_xobjects: Vec<(String, Ref)>,
    trace: Vec<Placement>,
}

impl Surface {
    pub(crate) fn new(style: LayoutStyle) -> Self {
        let mut pdf = Pdf::new();
        let mut next_id = 1i32;
        let mut alloc = || {
            let r = Ref::new(next_id);
            next_id += 1;
            r
        };
        let catalog_id = alloc();
        let pages_id = alloc();
        let fonts = FontSet::register(&mut pdf, &mut alloc);

        Self {
            pdf,
            next_id,
            catalog_id,
            pages_id,
            fonts,
            cursor: Cursor::new(&style),
            style,
            finished_pages: Vec::new(),
            current: Content::new(),
            image_xobjects: Vec::new(),
            trace: Vec::new(),
        }
    }

    fn alloc(&mut self) -> Ref {
        let r = Ref::new(self.next_id);
        self.next_id += 1;
        r
    }

    pub(crate) fn style(&self) -> &LayoutStyle {
        &self.style
    }

    pub(crate) fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub(crate) fn page_index(&self) -> usize {
        self.finished_pages.len()
    }

    pub(crate) fn left(&self) -> f32 {
        self.style.margin_left
    }

    pub(crate) fn content_width(&self) -> f32 {
        self.style.content_width()
    }

    /// The single fit predicate every renderer consults.
    pub(crate) fn fits(&self, needed: f32) -> bool {
        self.cursor.fits(needed)
    }

    pub(crate) fn new_page(&mut self) {
        log::debug!(
            "page break after page {} at y={:.1}",
            self.page_index(),
            self.cursor.y()
        );
        self.finished_pages
            .push(std::mem::replace(&mut self.current, Content::new()));
        self.cursor.reset();
    }

    /// Break to a new page unless `needed` fits. A block taller than an empty
    /// page is drawn at the top of the page it lands on.
    pub(crate) fn ensure_space(&mut self, needed: f32) {
        if self.fits(needed) {
            return;
        }
        if self.cursor.at_page_top() {
            log::warn!(
                "block of {needed:.1}pt exceeds the page content area ({:.1}pt), drawing anyway",
                self.cursor.remaining()
            );
            return;
        }
        self.new_page();
    }

    pub(crate) fn advance(&mut self, dy: f32) {
        self.cursor.advance(dy);
    }

    pub(crate) fn record(&mut self, kind: PlacementKind, label: &str, top: f32, height: f32) {
        self.trace.push(Placement {
            page: self.page_index(),
            top,
            height,
            kind,
            label: label.to_string(),
        });
    }

    fn pdf_y(&self, top: f32, height: f32) -> f32 {
        self.style.page_height - top - height
    }

    pub(crate) fn fill_rect(&mut self, x: f32, top: f32, w: f32, h: f32, color: [u8; 3]) {
        let y = self.pdf_y(top, h);
        let (r, g, b) = rgb(color);
        self.current.save_state();
        self.current.set_fill_rgb(r, g, b);
        self.current.rect(x, y, w, h);
        self.current.fill_nonzero();
        self.current.restore_state();
    }

    pub(crate) fn stroke_rect(&mut self, x: f32, top: f32, w: f32, h: f32) {
        let y = self.pdf_y(top, h);
        self.current.save_state();
        self.current.set_line_width(self.style.border_width);
        self.current.rect(x, y, w, h);
        self.current.stroke();
        self.current.restore_state();
    }

    pub(crate) fn line(&mut self, x1: f32, top1: f32, x2: f32, top2: f32, width: f32, color: [u8; 3]) {
        let (r, g, b) = rgb(color);
        let h = self.style.page_height;
        self.current.save_state();
        self.current.set_line_width(width);
        self.current.set_stroke_rgb(r, g, b);
        self.current.move_to(x1, h - top1);
        self.current.line_to(x2, h - top2);
        self.current.stroke();
        self.current.restore_state();
    }

    pub(crate) fn measure_lines(&self, text: &str, max_width: f32, style: TextStyle) -> usize {
        layout::wrap_text(text, self.fonts.get(style.font), style.size, max_width).len()
    }

    /// Word-wrap `text` to `max_width` and draw it with its first line's top at
    /// `top`. Returns the number of lines produced.
    pub(crate) fn draw_text(&mut self, text: &str, x: f32, top: f32, max_width: f32, style: TextStyle) -> usize {
        let entry = self.fonts.get(style.font);
        let lines = layout::wrap_text(text, entry, style.size, max_width);
        // Helvetica ascent is ~0.72em; 0.8em keeps descenders of the
        // previous line clear.
        let baseline = self.style.page_height - top - style.size * 0.8;
        layout::render_lines(
            &mut self.current,
            &lines,
            entry,
            style.size,
            style.color,
            style.align,
            x,
            max_width,
            baseline,
            style.line_height,
        );
        lines.len()
    }

    /// Embed `img` and draw it stretched into the given box.
    pub(crate) fn draw_image(&mut self, img: &EmbeddedImage, x: f32, top: f32, w: f32, h: f32) {
        let name = self.embed_image(img);
        let y = self.pdf_y(top, h);
        self.current.save_state();
        self.current.transform([w, 0.0, 0.0, h, x, y]);
        self.current.x_object(Name(name.as_bytes()));
        self.current.restore_state();
    }

    fn embed_image(&mut self, img: &EmbeddedImage) -> String {
        let xobj_ref = self.alloc();
        let pdf_name = format!("Im{}", self.image_xobjects.len() + 1);

        let smask_ref = match (&img.format, &img.alpha) {
            (ImageFormat::Png, Some(alpha)) => {
                let mask_ref = self.alloc();
                let mut mask = self.pdf.image_xobject(mask_ref, alpha);
                mask.filter(Filter::FlateDecode);
                mask.width(img.pixel_width as i32);
                mask.height(img.pixel_height as i32);
                mask.color_space().device_gray();
                mask.bits_per_component(8);
                Some(mask_ref)
            }
            _ => None,
        };

        let mut xobj = self.pdf.image_xobject(xobj_ref, &img.data);
        xobj.filter(match img.format {
            ImageFormat::Jpeg => Filter::DctDecode,
            ImageFormat::Png => Filter::FlateDecode,
        });
        xobj.width(img.pixel_width as i32);
        xobj.height(img.pixel_height as i32);
        match img.color_space {
            ColorSpace::Gray => xobj.color_space().device_gray(),
            ColorSpace::Rgb => xobj.color_space().device_rgb(),
            ColorSpace::Cmyk => {
                xobj.color_space().device_cmyk();
                xobj.decode([1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0]);
            }
        }
        xobj.bits_per_component(8);
        if let Some(mask_ref) = smask_ref {
            xobj.s_mask(mask_ref);
        }
        drop(xobj);

        self.image_xobjects.push((pdf_name.clone(), xobj_ref));
        pdf_name
    }

    fn draw_footers(&mut self, title: &str) {
        let total = self.finished_pages.len();
        let style = TextStyle::new(FontStyle::Regular, self.style.footer_font_size).color([90, 90, 90]);
        let entry = self.fonts.get(style.font);
        let left = self.style.margin_left;
        let right = self.style.page_width - self.style.margin_right;
        let baseline = self.style.margin_bottom / 2.0;
        let rule_y = self.style.margin_bottom - 8.0;
        let (r, g, b) = rgb(self.style.rule_color);

        for (i, content) in self.finished_pages.iter_mut().enumerate() {
            content.save_state();
            content.set_line_width(0.5);
            content.set_stroke_rgb(r, g, b);
            content.move_to(left, rule_y);
            content.line_to(right, rule_y);
            content.stroke();
            content.restore_state();

            let page_label = format!("Page {} of {}", i + 1, total);
            let label_w = entry.word_width(&page_label, style.size);
            for (text, x) in [(title, left), (page_label.as_str(), right - label_w)] {
                let line = layout::TextLine {
                    text: text.to_string(),
                    width: 0.0,
                };
                layout::render_lines(
                    content,
                    std::slice::from_ref(&line),
                    entry,
                    style.size,
                    style.color,
                    Align::Left,
                    x,
                    right - x,
                    baseline,
                    style.line_height,
                );
            }
        }
    }

    /// Close the last page, stamp footers and serialise the document.
    pub(crate) fn finish(mut self, title: &str) -> Rendered {
        self.finished_pages
            .push(std::mem::replace(&mut self.current, Content::new()));
        self.draw_footers(title);

        let n = self.finished_pages.len();
        let page_ids: Vec<Ref> = (0..n).map(|_| self.alloc()).collect();
        let content_ids: Vec<Ref> = (0..n).map(|_| self.alloc()).collect();
        let info_id = self.alloc();

        let pages = std::mem::take(&mut self.finished_pages);
        for (i, c) in pages.into_iter().enumerate() {
            let raw = c.finish();
            let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
            self.pdf
                .stream(content_ids[i], &compressed)
                .filter(Filter::FlateDecode);
        }

        self.pdf.catalog(self.catalog_id).pages(self.pages_id);
        self.pdf
            .pages(self.pages_id)
            .kids(page_ids.iter().copied())
            .count(n as i32);
        self.pdf
            .document_info(info_id)
            .title(TextStr(title))
            .producer(TextStr(concat!("fieldreport-pdf ", env!("CARGO_PKG_VERSION"))));

        let font_pairs: Vec<(String, Ref)> = self
            .fonts
            .iter()
            .map(|e| (e.pdf_name.clone(), e.font_ref))
            .collect();

        for i in 0..n {
            let mut page = self.pdf.page(page_ids[i]);
            page.media_box(Rect::new(0.0, 0.0, self.style.page_width, self.style.page_height))
                .parent(self.pages_id)
                .contents(content_ids[i]);
            let mut resources = page.resources();
            {
                let mut fonts = resources.fonts();
                for (name, font_ref) in &font_pairs {
                    fonts.pair(Name(name.as_bytes()), *font_ref);
                }
            }
            if !self.image_xobjects.is_empty() {
                let mut xobjects = resources.x_objects();
                for (name, xobj_ref) in &self.image_xobjects {
                    xobjects.pair(Name(name.as_bytes()), *xobj_ref);
                }
            }
        }

        Rendered {
            bytes: self.pdf.finish(),
            page_count: n,
            trace: self.trace,
        }
    }
}

pub(crate) struct Rendered {
    pub(crate) bytes: Vec<u8>,
    pub(crate) page_count: usize,
    pub(crate) trace: Vec<Placement>,
}
