use crate::fonts::FontStyle;
use crate::model::{EmbeddedImage, Signatory};

use super::{PlacementKind, Surface, TextStyle};

/// A signatory with its signature image, if one could be resolved and fetched.
#[derive(Debug)]
pub(crate) struct ResolvedSignatory {
    pub(crate) signatory: Signatory,
    pub(crate) image: Option<EmbeddedImage>,
}

const BLANK_NAME: &str = "______________________";

/// Four signature boxes side by side inside one fixed-height band.
pub(crate) fn render_signatory_band(surface: &mut Surface, signatories: &[ResolvedSignatory; 4]) {
    let style = surface.style();
    let band_h = style.signature_band_height;
    let image_h = style.signature_image_height;
    let pad_x = style.cell_padding_x;
    let gap = style.section_gap;
    let rule = style.rule_color;
    let label_style = TextStyle::new(FontStyle::Italic, style.field_label_size).color([90, 90, 90]);
    let name_style = TextStyle::new(FontStyle::Bold, style.checkbox_font_size).centered();
    let title_style = TextStyle::new(FontStyle::Regular, style.field_label_size + 0.5).centered();

    surface.ensure_space(band_h);
    let top = surface.cursor().y();
    let left = surface.left();
    let width = surface.content_width();
    let box_w = width / signatories.len() as f32;

    surface.stroke_rect(left, top, width, band_h);
    surface.record(PlacementKind::SignatureBand, "signatures", top, band_h);

    for (slot, resolved) in signatories.iter().enumerate() {
        let x = left + slot as f32 * box_w;
        if slot > 0 {
            surface.line(x, top, x, top + band_h, 0.5, rule);
        }
        let inner_w = box_w - 2.0 * pad_x;
        let sig = &resolved.signatory;

        surface.draw_text(&sig.label, x + pad_x, top + 4.0, inner_w, label_style);

        let image_top = top + 6.0 + label_style.size + 2.0;
        if let Some(img) = &resolved.image {
            // Stretched to the box; aspect ratio is not preserved.
            surface.draw_image(img, x + pad_x, image_top, inner_w, image_h);
        }

        let name_top = image_top + image_h + 4.0;
        let name = sig.name.as_deref().map(str::trim).filter(|n| !n.is_empty());
        match name {
            Some(name) => {
                surface.draw_text(name, x + pad_x, name_top, inner_w, name_style);
                surface.line(x + pad_x, name_top + name_style.size + 2.0, x + box_w - pad_x, name_top + name_style.size + 2.0, 0.5, [0, 0, 0]);
            }
            None => {
                surface.draw_text(BLANK_NAME, x + pad_x, name_top, inner_w, name_style);
            }
        }

        let title_top = name_top + name_style.size + 5.0;
        surface.draw_text(&sig.title, x + pad_x, title_top, inner_w, title_style);

        surface.record(
            PlacementKind::Signatory {
                slot,
                has_image: resolved.image.is_some(),
            },
            name.unwrap_or(&sig.label),
            top,
            band_h,
        );
    }

    surface.advance(band_h + gap);
}
