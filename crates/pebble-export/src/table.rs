//! Tab-separated tables of survey statistics and filter decisions.
//!
//! One header row, then one row per record. Tabs and line breaks inside
//! names are replaced by spaces so every record stays on one line.

use std::fmt::Write;

use pebble_pipeline::{FilterDecision, SurveyStats, Verdict};

/// Header of [`survey_to_tsv`].
pub const SURVEY_HEADER: &str =
    "sequence\tname\tpebbles\taverage_pixel_area\taverage_area\taverage_solidity";

/// Header of [`decisions_to_tsv`].
pub const DECISIONS_HEADER: &str = "mask\tarea\tverdict";

fn clean(field: &str) -> String {
    field.replace(['\t', '\n', '\r'], " ")
}

/// One row per image, in survey order.
#[must_use]
pub fn survey_to_tsv(survey: &SurveyStats) -> String {
    let mut out = String::from(SURVEY_HEADER);
    out.push('\n');
    for s in survey {
        // Writing to a String cannot fail.
        writeln!(
            out,
            "{}\t{}\t{}\t{:.2}\t{:.4}\t{:.3}",
            s.sequence,
            clean(&s.name),
            s.pebble_count,
            s.average_pixel_area,
            s.average_physical_area,
            s.average_solidity,
        )
        .ok();
    }
    out
}

/// One row per candidate, in scan order.
#[must_use]
pub fn decisions_to_tsv(decisions: &[FilterDecision]) -> String {
    let mut out = String::from(DECISIONS_HEADER);
    out.push('\n');
    for d in decisions {
        let verdict = match d.verdict {
            Verdict::Accepted => "accepted".to_string(),
            Verdict::Rejected(reason) => format!("rejected: {reason}"),
        };
        writeln!(out, "{}\t{}\t{verdict}", d.id.0, d.area).ok();
    }
    out
}

#[cfg(test)]
mod tests {
    use pebble_pipeline::{
        Calibration, ImageStats, MaskId, PebbleSummary, RejectReason, Stage, summarize_survey,
    };

    use super::*;

    #[test]
    fn empty_survey_is_header_only() {
        assert_eq!(
            survey_to_tsv(&SurveyStats::new()),
            format!("{SURVEY_HEADER}\n")
        );
    }

    #[test]
    fn survey_rows_follow_order() {
        let summaries = [
            PebbleSummary {
                area: 4000,
                solidity: 0.8,
            },
            PebbleSummary {
                area: 6000,
                solidity: 0.9,
            },
        ];
        let survey = summarize_survey([
            ImageStats::from_summaries(2, "img\t2.png", &summaries, Calibration::default()),
            ImageStats::from_summaries(1, "img_1.png", &[], Calibration::default()),
        ]);
        let tsv = survey_to_tsv(&survey);
        let lines: Vec<&str> = tsv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "2\timg 2.png\t2\t5000.00\t0.8889\t0.850");
        assert_eq!(lines[2], "1\timg_1.png\t0\t0.00\t0.0000\t0.000");
    }

    #[test]
    fn decision_rows_name_the_reason() {
        let decisions = [
            FilterDecision {
                id: MaskId(4),
                area: 5025,
                verdict: Verdict::Accepted,
            },
            FilterDecision {
                id: MaskId(2),
                area: 5525,
                verdict: Verdict::Rejected(RejectReason::Stage(Stage::Occluded)),
            },
            FilterDecision {
                id: MaskId(0),
                area: 300,
                verdict: Verdict::Rejected(RejectReason::NoContour),
            },
        ];
        let tsv = decisions_to_tsv(&decisions);
        assert_eq!(
            tsv,
            "mask\tarea\tverdict\n4\t5025\taccepted\n2\t5525\trejected: occluded\n0\t300\trejected: no contour\n"
        );
    }
}
