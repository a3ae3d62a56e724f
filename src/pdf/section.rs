use crate::fonts::FontStyle;
use crate::model::TextBlock;

use super::text_block::text_block_height;
use super::{PlacementKind, Surface, TextStyle};

/// The first unit a section body draws. Its header is kept on the same page
/// as that unit.
#[derive(Clone, Copy, Debug)]
pub(crate) enum SectionLead<'a> {
    FieldRow,
    CheckboxRow,
    Text(&'a TextBlock),
    AttachmentRow,
    SignatureBand,
}

impl SectionLead<'_> {
    fn height(self, surface: &Surface) -> f32 {
        let style = surface.style();
        match self {
            SectionLead::FieldRow => style.field_row_height + style.field_padding,
            SectionLead::CheckboxRow => style.checkbox_row_height + style.checkbox_padding,
            SectionLead::Text(block) => text_block_height(surface, block),
            SectionLead::AttachmentRow => style.attachment_image_height + style.attachment_caption_height,
            SectionLead::SignatureBand => style.signature_band_height,
        }
    }
}

/// Title band separating record groups, never left at the foot of a page
/// without the first unit of `lead` below it.
pub(crate) fn render_section_header(surface: &mut Surface, title: &str, lead: SectionLead<'_>) {
    let keep_with_next = lead.height(surface);
    let style = surface.style();
    let band = style.header_band_height;
    let gap = style.header_gap;
    let fill = style.header_fill;
    let text_style = TextStyle::new(FontStyle::Bold, style.header_font_size).color(style.header_text);
    let pad_x = style.cell_padding_x;

    surface.ensure_space(band + gap + keep_with_next);
    let top = surface.cursor().y();
    let left = surface.left();
    let width = surface.content_width();

    surface.fill_rect(left, top, width, band, fill);
    let text_top = top + (band - text_style.size) / 2.0;
    surface.draw_text(&title.to_uppercase(), left + pad_x, text_top, width - 2.0 * pad_x, text_style);
    surface.record(PlacementKind::SectionHeader, title, top, band);

    surface.advance(band + gap);
}

/// Document title and identifier line at the top of the first page.
pub(crate) fn render_title_block(surface: &mut Surface, title: &str, subtitle: &str) {
    let style = surface.style();
    let height = style.title_block_height;
    let title_style = TextStyle::new(FontStyle::Bold, style.title_font_size).color(style.header_fill);
    let subtitle_style = TextStyle::new(FontStyle::Regular, style.subtitle_font_size).color([70, 70, 70]);
    let rule = style.header_fill;
    let gap = style.section_gap;

    surface.ensure_space(height);
    let top = surface.cursor().y();
    let left = surface.left();
    let width = surface.content_width();

    surface.draw_text(title, left, top, width, title_style);
    surface.draw_text(subtitle, left, top + title_style.size + 6.0, width, subtitle_style);
    surface.line(left, top + height - 2.0, left + width, top + height - 2.0, 1.5, rule);
    surface.record(PlacementKind::TitleBlock, title, top, height);

    surface.advance(height + gap);
}
