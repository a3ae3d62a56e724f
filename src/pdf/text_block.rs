use crate::fonts::FontStyle;
use crate::model::TextBlock;

use super::{PlacementKind, Surface, TextStyle};

fn text_value_style(surface: &Surface) -> TextStyle {
    let style = surface.style();
    TextStyle::new(FontStyle::Regular, style.text_font_size).line_height(style.text_line_height)
}

/// Box height for `block`: wrapped lines plus padding, never below the
/// minimum height.
pub(crate) fn text_block_height(surface: &Surface, block: &TextBlock) -> f32 {
    let style = surface.style();
    let text_w = (surface.content_width() - 2.0 * style.cell_padding_x).max(1.0);
    let lines = surface.measure_lines(&block.value, text_w, text_value_style(surface));
    (lines as f32 * style.text_line_height + style.text_padding).max(style.text_min_height)
}

/// A labelled, bordered block of wrapped free text. Never split: a block that
/// does not fit moves whole to the next page.
pub(crate) fn render_text_block(surface: &mut Surface, block: &TextBlock) {
    let style = surface.style();
    let pad_x = style.cell_padding_x;
    let label_size = style.field_label_size;
    let value_style = text_value_style(surface);
    let gap = style.section_gap;

    let left = surface.left();
    let width = surface.content_width();
    let text_w = (width - 2.0 * pad_x).max(1.0);

    let height = text_block_height(surface, block);

    surface.ensure_space(height);
    let top = surface.cursor().y();

    surface.stroke_rect(left, top, width, height);
    let label_style = TextStyle::new(FontStyle::Bold, label_size).color([80, 80, 80]);
    surface.draw_text(&block.label, left + pad_x, top + 4.0, text_w, label_style);
    surface.draw_text(&block.value, left + pad_x, top + 6.0 + label_size + 2.0, text_w, value_style);
    surface.record(PlacementKind::TextBlock, &block.label, top, height);

    surface.advance(height + gap);
}
