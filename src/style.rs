use serde::{Deserialize, Serialize};

/// Every constant the renderers lay out with. All lengths are in points.
///
/// Page geometry is fixed for the lifetime of a document. Any key missing
/// from a JSON style file keeps its default value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutStyle {
    pub page_width: f32,
    pub page_height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,

    /// Vertical space after every grid, text block and band.
    pub section_gap: f32,

    pub title_font_size: f32,
    pub subtitle_font_size: f32,
    pub title_block_height: f32,

    pub header_band_height: f32,
    pub header_font_size: f32,
    pub header_gap: f32,
    pub header_fill: [u8; 3],
    pub header_text: [u8; 3],

    pub field_row_height: f32,
    pub field_padding: f32,
    pub field_label_size: f32,
    pub field_value_size: f32,
    pub cell_padding_x: f32,

    pub checkbox_row_height: f32,
    pub checkbox_padding: f32,
    pub checkbox_glyph_size: f32,
    pub checkbox_font_size: f32,

    pub text_font_size: f32,
    pub text_line_height: f32,
    /// Caption plus inner top/bottom padding of a free-text block.
    pub text_padding: f32,
    pub text_min_height: f32,

    pub attachment_image_height: f32,
    pub attachment_caption_height: f32,
    pub attachment_gutter: f32,
    pub attachment_row_gap: f32,

    pub signature_band_height: f32,
    pub signature_image_height: f32,

    pub footer_font_size: f32,
    pub border_width: f32,
    pub rule_color: [u8; 3],
}

impl Default for LayoutStyle {
    fn default() -> Self {
        Self {
            // A4 portrait
            page_width: 595.28,
            page_height: 841.89,
            margin_top: 40.0,
            margin_bottom: 40.0,
            margin_left: 40.0,
            margin_right: 40.0,

            section_gap: 10.0,

            title_font_size: 16.0,
            subtitle_font_size: 9.0,
            title_block_height: 42.0,

            header_band_height: 18.0,
            header_font_size: 10.0,
            header_gap: 6.0,
            header_fill: [31, 56, 100],
            header_text: [255, 255, 255],

            field_row_height: 26.0,
            field_padding: 8.0,
            field_label_size: 6.5,
            field_value_size: 9.0,
            cell_padding_x: 5.0,

            checkbox_row_height: 15.0,
            checkbox_padding: 8.0,
            checkbox_glyph_size: 8.0,
            checkbox_font_size: 8.0,

            text_font_size: 9.0,
            text_line_height: 11.0,
            text_padding: 22.0,
            text_min_height: 44.0,

            attachment_image_height: 170.0,
            attachment_caption_height: 16.0,
            attachment_gutter: 12.0,
            attachment_row_gap: 10.0,

            signature_band_height: 104.0,
            signature_image_height: 40.0,

            footer_font_size: 7.0,
            border_width: 0.75,
            rule_color: [190, 190, 190],
        }
    }
}

impl LayoutStyle {
    pub fn from_json(text: &str) -> Result<Self, crate::Error> {
        let style: LayoutStyle = serde_json::from_str(text)?;
        style.validate()?;
        Ok(style)
    }

    pub fn content_width(&self) -> f32 {
        self.page_width - self.margin_left - self.margin_right
    }

    /// Lowest y (from the page top) any block may reach.
    pub fn bottom_limit(&self) -> f32 {
        self.page_height - self.margin_bottom
    }

    pub(crate) fn validate(&self) -> Result<(), crate::Error> {
        let positive = [
            ("page_width", self.page_width),
            ("page_height", self.page_height),
            ("field_row_height", self.field_row_height),
            ("checkbox_row_height", self.checkbox_row_height),
            ("text_line_height", self.text_line_height),
            ("attachment_image_height", self.attachment_image_height),
            ("signature_band_height", self.signature_band_height),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, v)| !(*v > 0.0)) {
            return Err(crate::Error::InvalidTemplate(format!(
                "style value {name} must be positive"
            )));
        }
        if self.content_width() <= 0.0 || self.bottom_limit() <= self.margin_top {
            return Err(crate::Error::InvalidTemplate(
                "margins leave no content area".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_style_json_keeps_defaults() {
        let style = LayoutStyle::from_json(r#"{"field_row_height": 30}"#).unwrap();
        assert_eq!(style.field_row_height, 30.0);
        assert_eq!(style.page_width, LayoutStyle::default().page_width);
    }

    #[test]
    fn margins_swallowing_the_page_are_rejected() {
        let err = LayoutStyle::from_json(r#"{"margin_left": 300, "margin_right": 300}"#);
        assert!(err.is_err());
    }
}
