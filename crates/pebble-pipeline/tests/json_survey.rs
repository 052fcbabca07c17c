//! Integration test: segmentation JSON in, survey statistics out.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashMap;

use pebble_pipeline::segment::{encode_masks, parse_masks};
use pebble_pipeline::{
    Calibration, Dimensions, FilterConfig, FilterPipeline, Mask, MaskGenerator, MaskId,
    PipelineError, RawMask, RejectReason, Stage, SurveyImage, Verdict, run_survey,
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

/// Decodes JSON dumps held in memory, keyed by image name.
struct JsonDumps(HashMap<String, String>);

impl MaskGenerator for JsonDumps {
    fn generate(&mut self, image: &SurveyImage) -> Result<Vec<RawMask>, PipelineError> {
        let json = self.0.get(&image.name).ok_or_else(|| PipelineError::ImageLoad {
            name: image.name.clone(),
            reason: "no segmentation dump".to_string(),
        })?;
        parse_masks(json)
    }
}

fn image(sequence: usize, name: &str) -> SurveyImage {
    SurveyImage {
        sequence,
        name: name.to_string(),
        dimensions: DIMS,
    }
}

#[test]
fn decoded_masks_filter_like_the_originals() {
    let masks = vec![
        disc(0, 30.0, 100.0, 40.0),
        disc(1, 150.0, 100.0, 40.0),
        disc(2, 152.0, 100.0, 42.0),
    ];
    let json = encode_masks(&masks).unwrap();
    let decoded = parse_masks(&json).unwrap();
    assert_eq!(decoded, masks);

    let pipeline = FilterPipeline::with_all_stages(FilterConfig::default()).unwrap();
    let outcome = pipeline.apply(DIMS, decoded).unwrap();

    assert_eq!(outcome.accepted_ids(), vec![MaskId(1)]);
    let verdicts: Vec<Verdict> = outcome.decisions.iter().map(|d| d.verdict).collect();
    assert_eq!(
        verdicts,
        vec![
            Verdict::Rejected(RejectReason::Stage(Stage::TouchingEdges)),
            Verdict::Accepted,
            Verdict::Rejected(RejectReason::Stage(Stage::Occluded)),
        ]
    );
    eprintln!("{}", outcome.diagnostics.report());
}

#[test]
fn survey_over_json_dumps() {
    let pebbles = vec![disc(0, 80.0, 100.0, 40.0), disc(1, 200.0, 100.0, 40.0)];
    let generator = JsonDumps(HashMap::from([
        ("img_1.png".to_string(), encode_masks(&pebbles).unwrap()),
        ("img_2.png".to_string(), "[]".to_string()),
        ("img_3.png".to_string(), "not json".to_string()),
    ]));
    let images = vec![
        Ok(image(1, "img_1.png")),
        Ok(image(2, "img_2.png")),
        Ok(image(3, "img_3.png")),
        Ok(image(4, "img_4.png")),
    ];

    let calibration = Calibration::new(50.0).unwrap();
    let pipeline = FilterPipeline::with_all_stages(FilterConfig::default()).unwrap();
    let survey = run_survey(generator, images, &pipeline, calibration).unwrap();

    assert_eq!(survey.len(), 2);
    let first = &survey.as_slice()[0];
    assert_eq!(first.sequence, 1);
    assert_eq!(first.pebble_count, 2);
    assert!((first.average_pixel_area - 5025.0).abs() < 1e-9);
    assert!((first.average_physical_area - 5025.0 / 2500.0).abs() < 1e-9);
    assert!(first.average_solidity > 0.95 && first.average_solidity <= 1.0);

    let second = &survey.as_slice()[1];
    assert_eq!(second.sequence, 2);
    assert_eq!(second.pebble_count, 0);

    let json = serde_json::to_string(&survey).unwrap();
    assert!(json.contains("\"average_physical_area\""));
}
