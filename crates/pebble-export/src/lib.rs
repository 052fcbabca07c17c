//! pebble-export: Pure format serializers (sans-IO)
//!
//! Converts pipeline results into output formats: an SVG outline overlay
//! of inspection records and tab-separated tables of survey statistics
//! and filter decisions.

pub mod svg;
pub mod table;

pub use svg::{Highlight, SvgMetadata, build_outline_data, hex_color, to_outline_svg};
pub use table::{decisions_to_tsv, survey_to_tsv};
