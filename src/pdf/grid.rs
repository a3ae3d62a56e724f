use crate::fonts::FontStyle;
use crate::model::{CheckboxItem, Field, Span};

use super::{PlacementKind, Surface, TextStyle};

/// Where a grid item landed: its row within the box, its column, and whether
/// it spans the full box width.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct GridSlot {
    pub(crate) row: usize,
    pub(crate) column: usize,
    pub(crate) full: bool,
}

/// Pack items left to right into `columns` columns. A full-width item closes
/// any partially filled row and then occupies a row of its own.
///
/// Returns one slot per item and the total row count.
pub(crate) fn assign_rows(spans: impl IntoIterator<Item = Span>, columns: usize) -> (Vec<GridSlot>, usize) {
    let columns = columns.max(1);
    let mut slots = Vec::new();
    let mut rows = 0usize;
    let mut col = 0usize;

    for span in spans {
        match span {
            Span::Full => {
                if col > 0 {
                    rows += 1;
                    col = 0;
                }
                slots.push(GridSlot {
                    row: rows,
                    column: 0,
                    full: true,
                });
                rows += 1;
            }
            Span::One => {
                slots.push(GridSlot {
                    row: rows,
                    column: col,
                    full: false,
                });
                col += 1;
                if col == columns {
                    rows += 1;
                    col = 0;
                }
            }
        }
    }
    if col > 0 {
        rows += 1;
    }
    (slots, rows)
}

/// Index of the first item whose row does not fit in `max_fit_rows`, or the
/// item count when every row fits. Always lands on a row boundary.
pub(crate) fn split_index(slots: &[GridSlot], max_fit_rows: i64) -> usize {
    slots
        .iter()
        .position(|s| s.row as i64 >= max_fit_rows)
        .unwrap_or(slots.len())
}

#[derive(Clone, Debug)]
struct GridMetrics {
    row_height: f32,
    padding: f32,
    gap: f32,
    kind: PlacementKind,
}

impl GridMetrics {
    fn box_height(&self, rows: usize) -> f32 {
        rows as f32 * self.row_height + self.padding
    }
}

trait GridCell {
    fn span(&self) -> Span;
    fn label(&self) -> &str;
    fn placement(&self, slot: GridSlot) -> PlacementKind;
    /// Draw the cell's contents into the box `(x, top, width)`.
    fn draw(&self, surface: &mut Surface, x: f32, top: f32, width: f32);
}

impl GridCell for Field {
    fn span(&self) -> Span {
        self.span
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn placement(&self, slot: GridSlot) -> PlacementKind {
        PlacementKind::Field {
            row: slot.row,
            column: slot.column,
        }
    }

    fn draw(&self, surface: &mut Surface, x: f32, top: f32, width: f32) {
        let label_size = surface.style().field_label_size;
        let value_size = surface.style().field_value_size;
        let label_style = TextStyle::new(FontStyle::Bold, label_size).color([80, 80, 80]);
        let value_style = TextStyle::new(FontStyle::Regular, value_size).line_height(value_size * 1.15);

        surface.draw_text(&self.label, x, top, width, label_style);
        // Long values may overflow their row; box height never depends on them.
        surface.draw_text(&self.value_text(), x, top + label_size + 2.0, width, value_style);
    }
}

impl GridCell for CheckboxItem {
    fn span(&self) -> Span {
        Span::One
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn placement(&self, slot: GridSlot) -> PlacementKind {
        PlacementKind::Checkbox {
            row: slot.row,
            column: slot.column,
            checked: self.checked,
        }
    }

    fn draw(&self, surface: &mut Surface, x: f32, top: f32, width: f32) {
        let glyph = surface.style().checkbox_glyph_size;
        let font_size = surface.style().checkbox_font_size;
        surface.stroke_rect(x, top, glyph, glyph);
        if self.checked {
            // Tick drawn as two strokes inside the box.
            surface.line(x + glyph * 0.2, top + glyph * 0.55, x + glyph * 0.42, top + glyph * 0.8, 1.2, [0, 0, 0]);
            surface.line(x + glyph * 0.42, top + glyph * 0.8, x + glyph * 0.85, top + glyph * 0.2, 1.2, [0, 0, 0]);
        }
        let text_x = x + glyph + 4.0;
        let style = TextStyle::new(FontStyle::Regular, font_size);
        surface.draw_text(&self.label, text_x, top, (width - glyph - 4.0).max(1.0), style);
    }
}

/// Draw one bordered box holding `items` at the cursor and advance past it.
fn draw_grid_box<T: GridCell>(
    surface: &mut Surface,
    items: &[T],
    slots: &[GridSlot],
    rows: usize,
    columns: usize,
    metrics: &GridMetrics,
) {
    let top = surface.cursor().y();
    let height = metrics.box_height(rows);
    let left = surface.left();
    let width = surface.content_width();
    let pad_x = surface.style().cell_padding_x;
    let rule = surface.style().rule_color;
    let col_w = width / columns as f32;

    surface.stroke_rect(left, top, width, height);
    let first_row_top = top + metrics.padding / 2.0;
    for r in 1..rows {
        let y = first_row_top + r as f32 * metrics.row_height - 2.0;
        surface.line(left + pad_x, y, left + width - pad_x, y, 0.4, rule);
    }
    surface.record(metrics.kind.clone(), items.first().map_or("", |i| i.label()), top, height);

    for (item, slot) in items.iter().zip(slots) {
        let cell_x = left + slot.column as f32 * col_w;
        let cell_w = if slot.full { width } else { col_w };
        let cell_top = first_row_top + slot.row as f32 * metrics.row_height;
        item.draw(surface, cell_x + pad_x, cell_top, (cell_w - 2.0 * pad_x).max(1.0));
        surface.record(item.placement(*slot), item.label(), cell_top, metrics.row_height);
    }

    surface.advance(height);
}

/// Lay out `items` as one box, splitting on row boundaries across as many
/// pages as needed. Every item is drawn exactly once and in order.
fn render_grid<T: GridCell>(surface: &mut Surface, items: &[T], columns: usize, metrics: GridMetrics) {
    if items.is_empty() {
        return;
    }
    let columns = columns.max(1);
    let mut start = 0usize;

    while start < items.len() {
        let rest = &items[start..];
        let (slots, rows) = assign_rows(rest.iter().map(T::span), columns);
        let height = metrics.box_height(rows);

        if surface.fits(height) {
            draw_grid_box(surface, rest, &slots, rows, columns, &metrics);
            break;
        }

        let available = surface.cursor().remaining();
        let max_fit_rows = ((available - metrics.padding) / metrics.row_height).floor() as i64;
        let mut split = split_index(&slots, max_fit_rows);

        if split == 0 {
            if !surface.cursor().at_page_top() {
                surface.new_page();
                continue;
            }
            // Not even one row fits on an empty page: draw the first row anyway.
            split = split_index(&slots, 1);
            log::warn!("grid row taller than the page content area; drawing it overflowing");
        }

        let head = &rest[..split];
        let head_rows = slots[split - 1].row + 1;
        log::debug!(
            "grid split: {} of {} items ({} rows) on page {}, max_fit_rows={}",
            split,
            rest.len(),
            head_rows,
            surface.page_index(),
            max_fit_rows
        );
        draw_grid_box(surface, head, &slots[..split], head_rows, columns, &metrics);
        start += split;
        if start < items.len() {
            surface.new_page();
        }
    }
    surface.advance(metrics.gap);
}

pub(crate) fn render_field_grid(surface: &mut Surface, fields: &[Field], columns: usize) {
    let style = surface.style();
    let metrics = GridMetrics {
        row_height: style.field_row_height,
        padding: style.field_padding,
        gap: style.section_gap,
        kind: PlacementKind::FieldGrid,
    };
    render_grid(surface, fields, columns, metrics);
}

pub(crate) fn render_checkbox_grid(surface: &mut Surface, items: &[CheckboxItem], columns: usize) {
    let style = surface.style();
    let metrics = GridMetrics {
        row_height: style.checkbox_row_height,
        padding: style.checkbox_padding,
        gap: style.section_gap,
        kind: PlacementKind::CheckboxGrid,
    };
    render_grid(surface, items, columns, metrics);
}
