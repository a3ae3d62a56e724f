mod common;

use fieldreport_pdf::report::{ChecklistSpec, SectionBody, SectionSpec};
use fieldreport_pdf::{DocumentTemplate, LayoutStyle, Placement, PlacementKind, ReportGenerator, Scalar, Span};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use common::{MemoryImages, field_grid_template, placements, record};

/// Row of every item under plain left-to-right packing.
fn reference_rows(spans: &[Span], columns: usize) -> Vec<usize> {
    let mut rows = Vec::new();
    let (mut row, mut col) = (0, 0);
    for span in spans {
        if *span == Span::Full {
            if col > 0 {
                row += 1;
                col = 0;
            }
            rows.push(row);
            row += 1;
        } else {
            rows.push(row);
            col += 1;
            if col == columns {
                row += 1;
                col = 0;
            }
        }
    }
    rows
}

fn field_pos(p: &Placement) -> (usize, usize) {
    match p.kind {
        PlacementKind::Field { row, column } => (row, column),
        _ => unreachable!(),
    }
}

/// Split the trace into (grid box, fields drawn in it) pairs.
fn chunks(layout: &[Placement]) -> Vec<(&Placement, Vec<&Placement>)> {
    let mut out: Vec<(&Placement, Vec<&Placement>)> = Vec::new();
    for p in layout {
        match p.kind {
            PlacementKind::FieldGrid => out.push((p, Vec::new())),
            PlacementKind::Field { .. } => out.last_mut().expect("field outside a grid").1.push(p),
            _ => {}
        }
    }
    out
}

fn render(spans: &[Span], columns: usize, style: LayoutStyle) -> fieldreport_pdf::Report {
    let images = MemoryImages::new();
    ReportGenerator::new(&images)
        .with_style(style)
        .generate(&field_grid_template(spans, columns), &record("rec-1", None, &[]))
        .unwrap()
}

#[test]
fn canonical_nine_field_grid() {
    let mut spans = vec![Span::One; 9];
    spans[4] = Span::Full;
    let report = render(&spans, 2, LayoutStyle::default());

    let grids = chunks(&report.layout);
    assert_eq!(grids.len(), 1);
    let (grid, fields) = &grids[0];
    let positions: Vec<(usize, usize)> = fields.iter().map(|p| field_pos(p)).collect();
    assert_eq!(
        positions,
        [(0, 0), (0, 1), (1, 0), (1, 1), (2, 0), (3, 0), (3, 1), (4, 0), (4, 1)]
    );
    let style = LayoutStyle::default();
    let expected_height = 5.0 * style.field_row_height + style.field_padding;
    assert!((grid.height - expected_height).abs() < 1e-3);
    assert_eq!(report.page_count, 1);
}

#[test]
fn box_height_ignores_value_length() {
    let style = LayoutStyle::default();
    let template = field_grid_template(&[Span::One, Span::One, Span::Full], 2);
    let short = record("r", None, &[("f0", common::text("a")), ("f2", common::text("b"))]);
    let long_text = "overflowing ".repeat(80);
    let long = record("r", None, &[("f0", common::text(&long_text)), ("f2", common::text(&long_text))]);

    let images = MemoryImages::new();
    let generator = ReportGenerator::new(&images).with_style(style.clone());
    let a = generator.generate(&template, &short).unwrap();
    let b = generator.generate(&template, &long).unwrap();
    let height = |r: &fieldreport_pdf::Report| chunks(&r.layout)[0].0.height;
    assert_eq!(height(&a), height(&b));
    assert!((height(&a) - (2.0 * style.field_row_height + style.field_padding)).abs() < 1e-3);
}

#[test]
fn long_grid_splits_into_page_filling_prefix() {
    let style = LayoutStyle::default();
    let report = render(&vec![Span::One; 80], 2, style.clone());

    let grids = chunks(&report.layout);
    assert_eq!(grids.len(), 2);
    let (first, first_fields) = &grids[0];
    let (second, second_fields) = &grids[1];

    // Title block and header leave room for exactly 26 rows on page one.
    let header = placements(&report.layout, |k| *k == PlacementKind::SectionHeader)[0];
    let grid_top = header.top + style.header_band_height + style.header_gap;
    let max_rows = ((style.bottom_limit() - grid_top - style.field_padding) / style.field_row_height).floor() as usize;
    assert_eq!(max_rows, 26);

    assert_eq!((first.page, second.page), (0, 1));
    assert_eq!(first_fields.len(), 52);
    assert_eq!(second_fields.len(), 28);
    assert!((second.top - style.margin_top).abs() < 1e-3);
    assert_eq!(field_pos(second_fields[0]), (0, 0));
    assert_eq!(report.page_count, 2);
}

#[test]
fn random_grids_keep_order_and_split_on_row_boundaries() {
    common::init_logging();
    let mut rng = StdRng::seed_from_u64(0x5eed_f1e1d);

    for case in 0..150 {
        let n = rng.gen_range(1..=120);
        let columns = rng.gen_range(1..=4);
        let spans: Vec<Span> = (0..n)
            .map(|_| if rng.gen_bool(0.15) { Span::Full } else { Span::One })
            .collect();
        let style = LayoutStyle {
            field_row_height: rng.gen_range(12.0..90.0),
            field_padding: rng.gen_range(0.0..20.0),
            ..LayoutStyle::default()
        };
        let limit = style.bottom_limit();
        let report = render(&spans, columns, style.clone());
        let ctx = format!("case {case}: n={n} columns={columns} style={style:?}");

        // Every field drawn exactly once, in input order.
        let labels: Vec<&str> = placements(&report.layout, |k| matches!(k, PlacementKind::Field { .. }))
            .iter()
            .map(|p| p.label.as_str())
            .collect();
        let expected: Vec<String> = (0..n).map(|i| format!("Field {i:03}")).collect();
        assert_eq!(labels, expected, "{ctx}");

        let global = reference_rows(&spans, columns);
        let grids = chunks(&report.layout);
        let header = placements(&report.layout, |k| *k == PlacementKind::SectionHeader)[0];
        assert_eq!(header.page, grids[0].0.page, "header orphaned: {ctx}");

        let mut start = 0;
        for (k, (grid, fields)) in grids.iter().enumerate() {
            assert_eq!(grid.page, grids[0].0.page + k, "{ctx}");
            assert!(grid.top + grid.height <= limit + 1e-3, "chunk {k} overflows: {ctx}");

            let offset = global[start];
            for (i, field) in fields.iter().enumerate() {
                let (row, _) = field_pos(field);
                assert_eq!(row, global[start + i] - offset, "chunk {k} item {i}: {ctx}");
            }
            let rows = fields.iter().map(|f| field_pos(f).0).max().unwrap() + 1;
            let expected_height = rows as f32 * style.field_row_height + style.field_padding;
            assert!((grid.height - expected_height).abs() < 1e-2, "{ctx}");

            if k + 1 < grids.len() {
                // One more row would not have fit.
                assert!(grid.top + grid.height + style.field_row_height > limit, "chunk {k} not maximal: {ctx}");
            }
            start += fields.len();
        }
        assert_eq!(start, n, "{ctx}");
    }
}

#[test]
fn checklist_packs_three_per_row_and_reads_truthiness() {
    let template = DocumentTemplate::from_json(
        r#"{
            "slug": "checks",
            "title": "Checks",
            "sections": [{"title": "Pre-Start", "kind": "checklist", "items": [
                {"key": "a", "label": "Oil"},
                {"key": "b", "label": "Coolant"},
                {"key": "c", "label": "Fuel"},
                {"key": "d", "label": "Battery"},
                {"key": "e", "label": "Belts"}
            ]}]
        }"#,
    )
    .unwrap();
    let rec = record(
        "r",
        None,
        &[
            ("a", Scalar::Bool(true)),
            ("b", common::text("no")),
            ("c", common::text("Yes")),
            ("d", Scalar::Number(1.0)),
        ],
    );
    let images = MemoryImages::new();
    let report = ReportGenerator::new(&images).generate(&template, &rec).unwrap();

    let items: Vec<(usize, usize, bool)> = placements(&report.layout, |k| matches!(k, PlacementKind::Checkbox { .. }))
        .iter()
        .map(|p| match p.kind {
            PlacementKind::Checkbox { row, column, checked } => (row, column, checked),
            _ => unreachable!(),
        })
        .collect();
    assert_eq!(
        items,
        [(0, 0, true), (0, 1, false), (0, 2, true), (1, 0, true), (1, 1, false)]
    );
    let grid = placements(&report.layout, |k| *k == PlacementKind::CheckboxGrid)[0];
    let style = LayoutStyle::default();
    assert!((grid.height - (2.0 * style.checkbox_row_height + style.checkbox_padding)).abs() < 1e-3);
}

fn checklist_template(n: usize, columns: usize) -> DocumentTemplate {
    DocumentTemplate {
        slug: "checklist-test".into(),
        title: "Checklist Test".into(),
        file_prefix: None,
        sections: vec![SectionSpec {
            title: "Pre-Start Checks".into(),
            body: SectionBody::Checklist {
                columns,
                items: (0..n)
                    .map(|i| ChecklistSpec {
                        key: format!("c{i}"),
                        label: format!("Check {i:03}"),
                    })
                    .collect(),
            },
        }],
    }
}

#[test]
fn long_checklists_split_in_order_within_the_margin() {
    common::init_logging();
    let mut rng = StdRng::seed_from_u64(0xc4ec_c1157);

    for case in 0..60 {
        let columns = rng.gen_range(1..=4);
        let style = LayoutStyle {
            checkbox_row_height: rng.gen_range(10.0..40.0),
            checkbox_padding: rng.gen_range(0.0..16.0),
            ..LayoutStyle::default()
        };
        let limit = style.bottom_limit();
        // Always more rows than one empty page holds.
        let page_rows = ((limit - style.margin_top) / style.checkbox_row_height).ceil() as usize;
        let n = columns * rng.gen_range(page_rows + 1..=3 * page_rows) + rng.gen_range(0..columns);
        let checked: Vec<bool> = (0..n).map(|_| rng.gen_bool(0.5)).collect();
        let values: Vec<(String, Scalar)> = checked
            .iter()
            .enumerate()
            .map(|(i, c)| (format!("c{i}"), Scalar::Bool(*c)))
            .collect();
        let fields: Vec<(&str, Scalar)> = values.iter().map(|(k, v)| (k.as_str(), v.clone())).collect();
        let images = MemoryImages::new();
        let report = ReportGenerator::new(&images)
            .with_style(style.clone())
            .generate(&checklist_template(n, columns), &record("chk-1", None, &fields))
            .unwrap();
        let ctx = format!("case {case}: n={n} columns={columns} style={style:?}");

        // (box, items drawn in it) per page share of the checklist.
        let mut grids: Vec<(&Placement, Vec<&Placement>)> = Vec::new();
        for p in &report.layout {
            match p.kind {
                PlacementKind::CheckboxGrid => grids.push((p, Vec::new())),
                PlacementKind::Checkbox { .. } => grids.last_mut().expect("checkbox outside a grid").1.push(p),
                _ => {}
            }
        }
        assert!(grids.len() >= 2, "checklist never split: {ctx}");

        let labels: Vec<&str> = grids.iter().flat_map(|(_, items)| items.iter().map(|p| p.label.as_str())).collect();
        let expected: Vec<String> = (0..n).map(|i| format!("Check {i:03}")).collect();
        assert_eq!(labels, expected, "{ctx}");

        let mut start = 0;
        for (k, (grid, items)) in grids.iter().enumerate() {
            assert_eq!(grid.page, grids[0].0.page + k, "{ctx}");
            assert!(grid.top + grid.height <= limit + 1e-3, "chunk {k} overflows: {ctx}");
            assert_eq!(grid.label, items[0].label, "{ctx}");
            // Chunks break on whole rows only.
            if k + 1 < grids.len() {
                assert_eq!(items.len() % columns, 0, "chunk {k} ends mid-row: {ctx}");
            }
            for (i, item) in items.iter().enumerate() {
                let PlacementKind::Checkbox { row, column, checked: is_checked } = item.kind else {
                    unreachable!()
                };
                assert_eq!((row, column), (i / columns, i % columns), "chunk {k} item {i}: {ctx}");
                assert_eq!(is_checked, checked[start + i], "{ctx}");
                assert!(item.top + item.height <= limit + 1e-3, "{ctx}");
            }
            start += items.len();
        }
        assert_eq!(start, n, "{ctx}");
    }
}
