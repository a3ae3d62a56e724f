use crate::fonts::FontStyle;
use crate::model::EmbeddedImage;

use super::{PlacementKind, Surface, TextStyle};

const PER_ROW: usize = 2;

/// An attachment whose image was fetched and decoded successfully.
#[derive(Debug)]
pub(crate) struct ResolvedAttachment {
    pub(crate) url: String,
    pub(crate) title: Option<String>,
    pub(crate) image: EmbeddedImage,
}

/// Photos two per row, each stretched into a fixed box with an optional
/// caption band below. A short last row leaves its second slot empty.
pub(crate) fn render_attachment_grid(surface: &mut Surface, attachments: &[ResolvedAttachment]) {
    let style = surface.style();
    let image_h = style.attachment_image_height;
    let caption_h = style.attachment_caption_height;
    let gutter = style.attachment_gutter;
    let row_gap = style.attachment_row_gap;
    let caption_fill = [235, 235, 235];
    let caption_style = TextStyle::new(FontStyle::Regular, style.checkbox_font_size).centered();
    let row_h = image_h + caption_h;

    let left = surface.left();
    let slot_w = (surface.content_width() - gutter * (PER_ROW - 1) as f32) / PER_ROW as f32;

    for (ri, row) in attachments.chunks(PER_ROW).enumerate() {
        surface.ensure_space(row_h);
        let top = surface.cursor().y();
        surface.record(PlacementKind::AttachmentRow, &format!("row {}", ri + 1), top, row_h);

        for (column, attachment) in row.iter().enumerate() {
            let x = left + column as f32 * (slot_w + gutter);
            // Stretched to the box; aspect ratio is not preserved.
            surface.draw_image(&attachment.image, x, top, slot_w, image_h);
            surface.stroke_rect(x, top, slot_w, image_h);

            if let Some(title) = attachment.title.as_deref().filter(|t| !t.trim().is_empty()) {
                surface.fill_rect(x, top + image_h, slot_w, caption_h, caption_fill);
                let text_top = top + image_h + (caption_h - caption_style.size) / 2.0;
                surface.draw_text(title, x + 3.0, text_top, slot_w - 6.0, caption_style);
            }
            let label = attachment.title.as_deref().unwrap_or(&attachment.url);
            surface.record(PlacementKind::Attachment { column }, label, top, row_h);
        }

        surface.advance(row_h + row_gap);
    }
}
