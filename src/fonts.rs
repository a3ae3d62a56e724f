use pdf_writer::{Name, Pdf, Ref};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum FontStyle {
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

impl FontStyle {
    pub(crate) const ALL: [FontStyle; 4] = [
        FontStyle::Regular,
        FontStyle::Bold,
        FontStyle::Italic,
        FontStyle::BoldItalic,
    ];

    fn base_font(self) -> &'static [u8] {
        match self {
            FontStyle::Regular => b"Helvetica",
            FontStyle::Bold => b"Helvetica-Bold",
            FontStyle::Italic => b"Helvetica-Oblique",
            FontStyle::BoldItalic => b"Helvetica-BoldOblique",
        }
    }

    fn is_bold(self) -> bool {
        matches!(self, FontStyle::Bold | FontStyle::BoldItalic)
    }
}

pub(crate) struct FontEntry {
    pub(crate) pdf_name: String,
    pub(crate) font_ref: Ref,
    pub(crate) widths_1000: Vec<f32>,
}

impl FontEntry {
    pub(crate) fn char_width_1000(&self, ch: char) -> f32 {
        let byte = match char_to_winansi(ch) {
            0 if !ch.is_control() => b'?',
            b => b,
        };
        if byte >= 32 {
            self.widths_1000[(byte - 32) as usize]
        } else {
            0.0
        }
    }

    pub(crate) fn word_width(&self, word: &str, font_size: f32) -> f32 {
        word.chars()
            .map(|ch| self.char_width_1000(ch) * font_size / 1000.0)
            .sum()
    }

    pub(crate) fn space_width(&self, font_size: f32) -> f32 {
        self.char_width_1000(' ') * font_size / 1000.0
    }
}

/// The four Helvetica variants, registered once per document.
pub(crate) struct FontSet {
    entries: [FontEntry; 4],
}

impl FontSet {
    pub(crate) fn register(pdf: &mut Pdf, alloc: &mut impl FnMut() -> Ref) -> Self {
        let entries = std::array::from_fn(|i| {
            let style = FontStyle::ALL[i];
            let font_ref = alloc();
            pdf.type1_font(font_ref)
                .base_font(Name(style.base_font()))
                .encoding_predefined(Name(b"WinAnsiEncoding"));
            FontEntry {
                pdf_name: format!("F{}", i + 1),
                font_ref,
                widths_1000: helvetica_widths(style.is_bold()),
            }
        });
        Self { entries }
    }

    /// Metrics only, for measuring text outside a document.
    #[cfg(test)]
    pub(crate) fn metrics_only() -> Self {
        let entries = std::array::from_fn(|i| FontEntry {
            pdf_name: format!("F{}", i + 1),
            font_ref: Ref::new(1),
            widths_1000: helvetica_widths(FontStyle::ALL[i].is_bold()),
        });
        Self { entries }
    }

    pub(crate) fn get(&self, style: FontStyle) -> &FontEntry {
        &self.entries[style as usize]
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &FontEntry> {
        self.entries.iter()
    }
}

/// Map a single Unicode char to its WinAnsi byte, or 0 if unmappable.
fn char_to_winansi(c: char) -> u8 {
    match c as u32 {
        0x0020..=0x007F => c as u8,
        0x00A0..=0x00FF => c as u8,
        0x20AC => 0x80,
        0x201A => 0x82,
        0x0192 => 0x83,
        0x201E => 0x84,
        0x2026 => 0x85,
        0x2020 => 0x86,
        0x2021 => 0x87,
        0x02C6 => 0x88,
        0x2030 => 0x89,
        0x0160 => 0x8A,
        0x2039 => 0x8B,
        0x0152 => 0x8C,
        0x017D => 0x8E,
        0x2018 => 0x91,
        0x2019 => 0x92,
        0x201C => 0x93,
        0x201D => 0x94,
        0x2022 => 0x95,
        0x2013 => 0x96,
        0x2014 => 0x97,
        0x02DC => 0x98,
        0x2122 => 0x99,
        0x0161 => 0x9A,
        0x203A => 0x9B,
        0x0153 => 0x9C,
        0x017E => 0x9E,
        0x0178 => 0x9F,
        _ => 0,
    }
}

/// Convert a UTF-8 string to WinAnsi (Windows-1252) bytes for PDF Str encoding.
/// Unmappable characters become `?`.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars()
        .filter(|c| !c.is_control())
        .map(|c| match char_to_winansi(c) {
            0 => b'?',
            b => b,
        })
        .collect()
}

/// Approximate Helvetica widths at 1000 units/em for WinAnsi chars 32..=255.
fn helvetica_widths(bold: bool) -> Vec<f32> {
    (32u8..=255u8)
        .map(|b| {
            let w = match b {
                32 => 278.0,                          // space
                33..=47 => 333.0,                     // punctuation
                48..=57 => 556.0,                     // digits
                58..=64 => 333.0,                     // more punctuation
                73 | 74 => 278.0,                     // I J (narrow uppercase)
                77 => 833.0,                          // M (wide)
                65..=90 => 667.0,                     // uppercase A-Z (average)
                91..=96 => 333.0,                     // brackets etc.
                102 | 105 | 106 | 108 | 116 => 278.0, // narrow lowercase: f i j l t
                109 | 119 => 833.0,                   // m w (wide)
                97..=122 => 556.0,                    // lowercase a-z (average)
                _ => 556.0,
            };
            if bold && b != 32 { w * 1.06 } else { w }
        })
        .collect()
}
