use pdf_writer::{Content, Name, Str};

use crate::fonts::{FontEntry, to_winansi_bytes};

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Align {
    Left,
    Center,
}

#[derive(Debug)]
pub(crate) struct TextLine {
    pub(crate) text: String,
    pub(crate) width: f32,
}

/// Split a word wider than `max_width` into pieces that each fit.
fn break_long_word(word: &str, entry: &FontEntry, font_size: f32, max_width: f32) -> Vec<(String, f32)> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    let mut piece_w = 0.0f32;
    for ch in word.chars() {
        let cw = entry.char_width_1000(ch) * font_size / 1000.0;
        if !piece.is_empty() && piece_w + cw > max_width {
            pieces.push((std::mem::take(&mut piece), piece_w));
            piece_w = 0.0;
        }
        piece.push(ch);
        piece_w += cw;
    }
    if !piece.is_empty() {
        pieces.push((piece, piece_w));
    }
    pieces
}

/// Greedy word wrap. Explicit newlines start a new line; a blank input line
/// yields an empty line. Empty or whitespace-only text yields no lines.
pub(crate) fn wrap_text(text: &str, entry: &FontEntry, font_size: f32, max_width: f32) -> Vec<TextLine> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    let space_w = entry.space_width(font_size);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        let mut current_w = 0.0f32;

        for word in paragraph.split_whitespace() {
            let ww = entry.word_width(word, font_size);
            let pieces = if ww > max_width && max_width > 0.0 {
                break_long_word(word, entry, font_size, max_width)
            } else {
                vec![(word.to_string(), ww)]
            };

            for (piece, pw) in pieces {
                let proposed = if current.is_empty() {
                    pw
                } else {
                    current_w + space_w + pw
                };
                if !current.is_empty() && proposed > max_width {
                    lines.push(TextLine {
                        text: std::mem::take(&mut current),
                        width: current_w,
                    });
                    current = piece;
                    current_w = pw;
                } else {
                    if !current.is_empty() {
                        current.push(' ');
                    }
                    current.push_str(&piece);
                    current_w = proposed;
                }
            }
        }

        lines.push(TextLine {
            text: current,
            width: current_w,
        });
    }

    // Trailing blank lines carry no content.
    while lines.last().is_some_and(|l| l.text.is_empty()) {
        lines.pop();
    }
    lines
}

/// Draw pre-wrapped lines. `first_baseline_y` and `line_pitch` are in PDF
/// coordinates (y grows upwards).
pub(crate) fn render_lines(
    content: &mut Content,
    lines: &[TextLine],
    entry: &FontEntry,
    font_size: f32,
    color: [u8; 3],
    align: Align,
    x: f32,
    width: f32,
    first_baseline_y: f32,
    line_pitch: f32,
) {
    if lines.iter().all(|l| l.text.is_empty()) {
        return;
    }
    let [r, g, b] = color;
    content.save_state();
    content.set_fill_rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
    content.begin_text();
    content.set_font(Name(entry.pdf_name.as_bytes()), font_size);

    let mut td_x = 0.0f32;
    let mut td_y = 0.0f32;
    for (i, line) in lines.iter().enumerate() {
        if line.text.is_empty() {
            continue;
        }
        let lx = match align {
            Align::Left => x,
            Align::Center => x + ((width - line.width) / 2.0).max(0.0),
        };
        let ly = first_baseline_y - i as f32 * line_pitch;
        content.next_line(lx - td_x, ly - td_y);
        td_x = lx;
        td_y = ly;
        content.show(Str(&to_winansi_bytes(&line.text)));
    }
    content.end_text();
    content.restore_state();
}
