//! Integration test: filter synthetic masks, inspect the accepted ones and
//! export the overlay and tables.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use pebble_pipeline::{
    Calibration, Dimensions, FilterConfig, ImageStats, Mask, MaskId, RawMask, build_records,
    summarize_survey,
};

const DIMS: Dimensions = Dimensions {
    width: 300,
    height: 200,
};

fn disc(id: usize, cx: f64, cy: f64, r: f64) -> RawMask {
    RawMask::from_mask(
        MaskId(id),
        Mask::from_fn(DIMS, |x, y| {
            let dx = f64::from(x) - cx;
            let dy = f64::from(y) - cy;
            dx.mul_add(dx, dy * dy) <= r * r
        }),
    )
}

#[test]
fn accepted_pebbles_to_svg_and_tsv() {
    let masks = vec![
        disc(0, 30.0, 100.0, 40.0),
        disc(1, 150.0, 100.0, 40.0),
        disc(2, 152.0, 100.0, 42.0),
        disc(3, 250.0, 60.0, 30.0),
    ];
    let config = FilterConfig::default();
    let outcome = pebble_pipeline::process(DIMS, masks, &config).expect("filter should succeed");
    eprintln!("{}", outcome.diagnostics.report());
    assert_eq!(outcome.accepted_ids(), vec![MaskId(1)]);

    let records = build_records(DIMS, outcome.accepted.iter().map(|p| &p.mask)).unwrap();
    assert_eq!(records.len(), 1);

    let record = records.pick(150, 100).expect("pebble under the centre");
    let lines = record.annotations(&config);
    let config_json = serde_json::to_string(&config).unwrap();
    let svg = pebble_export::to_outline_svg(
        &records,
        DIMS,
        &pebble_export::SvgMetadata {
            title: Some("synthetic"),
            description: None,
            config_json: Some(&config_json),
        },
        Some(pebble_export::Highlight {
            record,
            lines: &lines,
        }),
    );
    assert!(svg.contains("<svg"));
    assert!(svg.contains("<path"));
    assert!(svg.contains("</svg>"));
    assert!(svg.contains("Mask #1 (#1)"));

    let decisions = pebble_export::decisions_to_tsv(&outcome.decisions);
    assert_eq!(decisions.lines().count(), 5);
    assert!(decisions.contains("rejected: touching edges"));
    assert!(decisions.contains("rejected: occluded"));

    let survey = summarize_survey([ImageStats::from_summaries(
        1,
        "synthetic",
        &outcome.summaries,
        Calibration::default(),
    )]);
    let table = pebble_export::survey_to_tsv(&survey);
    assert!(table.lines().nth(1).unwrap().starts_with("1\tsynthetic\t1\t5025.00\t"));
}
