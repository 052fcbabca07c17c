//! Filter diagnostics: candidate counts, rejection tallies and timing.
//!
//! Every call to [`FilterPipeline::apply`](crate::FilterPipeline::apply)
//! collects diagnostics alongside the accepted pebbles. They are intended
//! for threshold tuning: the report shows where candidates drop out.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::Stage;
use crate::filter::RejectReason;
use crate::types::Dimensions;

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from filtering one image's masks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterDiagnostics {
    /// Image the masks belong to.
    pub dimensions: Dimensions,
    /// Stages that were enabled, in evaluation order.
    pub stages: Vec<Stage>,
    /// Number of raw masks offered.
    pub candidates: usize,
    /// Number of masks accepted.
    pub accepted: usize,
    /// Rejections per reason.
    pub rejections: RejectionCounts,
    /// Wall-clock duration of the filter run (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
}

/// Number of candidates rejected for each reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionCounts {
    /// No representative contour.
    pub no_contour: usize,
    /// [`Stage::MinimumSize`].
    pub minimum_size: usize,
    /// [`Stage::TouchingEdges`].
    pub touching_edges: usize,
    /// [`Stage::Occluded`].
    pub occluded: usize,
    /// [`Stage::Wholeness`].
    pub wholeness: usize,
    /// [`Stage::ConvexHull`].
    pub convex_hull: usize,
    /// [`Stage::Complexity`].
    pub complexity: usize,
    /// [`Stage::Roundish`].
    pub roundish: usize,
}

impl RejectionCounts {
    /// Count one rejection.
    pub const fn record(&mut self, reason: RejectReason) {
        *self.slot(reason) += 1;
    }

    /// Number of rejections for `reason`.
    #[must_use]
    pub const fn count(&self, reason: RejectReason) -> usize {
        match reason {
            RejectReason::NoContour => self.no_contour,
            RejectReason::Stage(stage) => match stage {
                Stage::MinimumSize => self.minimum_size,
                Stage::TouchingEdges => self.touching_edges,
                Stage::Occluded => self.occluded,
                Stage::Wholeness => self.wholeness,
                Stage::ConvexHull => self.convex_hull,
                Stage::Complexity => self.complexity,
                Stage::Roundish => self.roundish,
            },
        }
    }

    /// Total number of rejections.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.no_contour
            + self.minimum_size
            + self.touching_edges
            + self.occluded
            + self.wholeness
            + self.convex_hull
            + self.complexity
            + self.roundish
    }

    const fn slot(&mut self, reason: RejectReason) -> &mut usize {
        match reason {
            RejectReason::NoContour => &mut self.no_contour,
            RejectReason::Stage(stage) => match stage {
                Stage::MinimumSize => &mut self.minimum_size,
                Stage::TouchingEdges => &mut self.touching_edges,
                Stage::Occluded => &mut self.occluded,
                Stage::Wholeness => &mut self.wholeness,
                Stage::ConvexHull => &mut self.convex_hull,
                Stage::Complexity => &mut self.complexity,
                Stage::Roundish => &mut self.roundish,
            },
        }
    }
}

impl FilterDiagnostics {
    /// Number of candidates rejected for any reason.
    #[must_use]
    pub const fn rejected(&self) -> usize {
        self.rejections.total()
    }

    /// Format the diagnostics as a human-readable report.
    ///
    /// Lists every rejection reason that can occur with the enabled
    /// stages, with its share of all candidates.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Filter Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!("Image: {}", self.dimensions));
        lines.push(format!(
            "Candidates: {}  |  Accepted: {}  |  Rejected: {}",
            self.candidates,
            self.accepted,
            self.rejected(),
        ));
        lines.push(format!(
            "Duration: {:.3}ms",
            self.duration.as_secs_f64() * 1000.0
        ));
        lines.push(String::new());

        lines.push(format!("{:<24} {:>10} {:>12}", "Reason", "Rejected", "% Candidates"));
        lines.push("-".repeat(48));

        let reasons = std::iter::once(RejectReason::NoContour)
            .chain(self.stages.iter().copied().map(RejectReason::Stage));
        for reason in reasons {
            let n = self.rejections.count(reason);
            #[allow(clippy::cast_precision_loss)]
            let pct = if self.candidates > 0 {
                n as f64 / self.candidates as f64 * 100.0
            } else {
                0.0
            };
            lines.push(format!("{:<24} {n:>10} {pct:>11.1}%", reason.to_string()));
        }

        lines.join("\n")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> FilterDiagnostics {
        let mut rejections = RejectionCounts::default();
        rejections.record(RejectReason::NoContour);
        rejections.record(RejectReason::Stage(Stage::Occluded));
        rejections.record(RejectReason::Stage(Stage::Occluded));
        FilterDiagnostics {
            dimensions: Dimensions {
                width: 300,
                height: 200,
            },
            stages: Stage::ALL.to_vec(),
            candidates: 4,
            accepted: 1,
            rejections,
            duration: Duration::from_millis(500),
        }
    }

    #[test]
    fn record_and_count_agree() {
        let d = sample();
        assert_eq!(d.rejections.count(RejectReason::NoContour), 1);
        assert_eq!(d.rejections.count(RejectReason::Stage(Stage::Occluded)), 2);
        assert_eq!(d.rejections.count(RejectReason::Stage(Stage::Roundish)), 0);
        assert_eq!(d.rejected(), 3);
    }

    #[test]
    fn report_lists_reasons_and_counts() {
        let report = sample().report();
        assert!(report.starts_with("Filter Diagnostics Report"));
        assert!(report.contains("Image: 300x200"));
        assert!(report.contains("Candidates: 4  |  Accepted: 1  |  Rejected: 3"));
        assert!(report.contains("no contour"));
        let occluded = report.lines().find(|l| l.starts_with("occluded")).unwrap();
        assert!(occluded.contains("50.0%"));
    }

    #[test]
    fn report_omits_disabled_stages() {
        let mut d = sample();
        d.stages = vec![Stage::Occluded];
        let report = d.report();
        assert!(!report.contains("roundish"));
        assert!(report.contains("occluded"));
    }

    #[test]
    fn report_with_no_candidates() {
        let mut d = sample();
        d.candidates = 0;
        d.rejections = RejectionCounts::default();
        assert!(d.report().contains("0.0%"));
    }

    #[test]
    fn duration_serializes_as_seconds() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!((json["duration"].as_f64().unwrap() - 0.5).abs() < 1e-9);
        let back: FilterDiagnostics = serde_json::from_value(json).unwrap();
        assert_eq!(back, sample());
    }
}
