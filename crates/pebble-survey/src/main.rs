//! pebble-survey: measure pebble sizes across a survey of photographs.
//!
//! Reads each photo's segmentation masks from a `<stem>.masks.json`
//! sidecar, filters them down to countable pebbles and reports per-image
//! averages. Also useful for tuning the filter:
//!
//! - `filter` shows every mask's verdict for one photo
//! - `sweep` re-runs one photo over a range of threshold values
//! - `inspect` draws an SVG overlay and annotates the mask under a pixel
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin pebble-survey -- survey <IMAGE_DIR> [OPTIONS]
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`); logs go to stderr.

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod source;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use pebble_pipeline::{
    Calibration, ContourTracerKind, FilterConfig, FilterPipeline, OcclusionThresholds,
    ParamOverride, PipelineError, RawMask, Stage, SurveyImage,
};
use tracing_subscriber::EnvFilter;

use crate::source::SidecarMasks;

/// Pebble size survey over segmented photographs.
#[derive(Parser)]
#[command(name = "pebble-survey", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Measure every photo in a directory and print per-image averages.
    Survey {
        /// Directory of cropped survey photos (PNG, JPEG, BMP).
        image_dir: PathBuf,

        /// Directory of `<stem>.masks.json` files [default: IMAGE_DIR].
        #[arg(long)]
        masks_dir: Option<PathBuf>,

        /// Calibration: pixels per centimetre.
        #[arg(long, default_value_t = Calibration::DEFAULT_PIXELS_PER_UNIT)]
        pixels_per_cm: f64,

        /// Output statistics as JSON instead of a tab-separated table.
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Filter one photo and print every mask's verdict.
    Filter {
        #[command(flatten)]
        input: ImageArgs,

        /// Output diagnostics as JSON instead of a report.
        #[arg(long)]
        json: bool,

        /// Write the accepted masks to this file, in sidecar format.
        #[arg(long)]
        accepted_out: Option<PathBuf>,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Re-run one photo over several values of one threshold.
    Sweep {
        #[command(flatten)]
        input: ImageArgs,

        /// Threshold to vary.
        #[arg(long, value_enum)]
        param: SweepParam,

        /// Comma-separated values to try.
        #[arg(long, value_delimiter = ',', required = true, num_args = 1..)]
        values: Vec<f64>,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Draw the accepted masks of one photo as an SVG overlay.
    Inspect {
        #[command(flatten)]
        input: ImageArgs,

        /// Write the SVG overlay to this file.
        #[arg(long)]
        svg: PathBuf,

        /// Highlight and annotate the topmost mask under pixel `X,Y`.
        #[arg(long, value_parser = parse_pixel)]
        at: Option<(u32, u32)>,

        /// Draw every raw mask instead of only the accepted ones.
        #[arg(long)]
        unfiltered: bool,

        #[command(flatten)]
        filter: FilterArgs,
    },
}

/// One photo and its masks.
#[derive(Args)]
struct ImageArgs {
    /// Path to the cropped survey photo.
    image_path: PathBuf,

    /// Masks file [default: `<stem>.masks.json` next to the photo].
    #[arg(long)]
    masks: Option<PathBuf>,
}

/// Filter thresholds and stage selection.
#[derive(Args)]
struct FilterArgs {
    /// Stages to enable, comma-separated [default: all].
    #[arg(long, value_enum, value_delimiter = ',')]
    stages: Vec<StageArg>,

    /// Contour tracing strategy.
    #[arg(long, value_enum, default_value_t = CLI_DEFAULT_TRACER)]
    tracer: Tracer,

    /// Minimum number of points in a mask's representative contour.
    #[arg(long, default_value_t = FilterConfig::DEFAULT_MIN_CONTOUR_POINTS)]
    min_contour_points: usize,

    /// Minimum reported mask area in pixels.
    #[arg(long, default_value_t = FilterConfig::DEFAULT_MIN_AREA)]
    min_area: u64,

    /// Border margin in pixels for the touching-edges stage.
    #[arg(long, default_value_t = FilterConfig::DEFAULT_BORDER_BUFFER)]
    border_buffer: u32,

    /// Maximum intersection-over-union with already claimed pixels.
    #[arg(long, default_value_t = OcclusionThresholds::DEFAULT_IOU)]
    iou: f64,

    /// Maximum fraction of a mask already claimed.
    #[arg(long, default_value_t = OcclusionThresholds::DEFAULT_OVERLAP_SELF)]
    overlap_self: f64,

    /// Minimum solidity.
    #[arg(long, default_value_t = FilterConfig::DEFAULT_MIN_SOLIDITY)]
    min_solidity: f64,

    /// Maximum hull defect ratio.
    #[arg(long, default_value_t = FilterConfig::DEFAULT_MAX_HULL_DIFF_RATIO)]
    max_hull_diff_ratio: f64,

    /// Maximum hull perimeter difference (shown by `inspect`).
    #[arg(long, default_value_t = FilterConfig::DEFAULT_MAX_PERIMETER_DIFFERENCE)]
    max_perimeter_difference: f64,

    /// Polygon approximation tolerance as a fraction of the perimeter.
    #[arg(long, default_value_t = FilterConfig::DEFAULT_EPSILON_FACTOR)]
    epsilon_factor: f64,

    /// Approximated vertex count must exceed this.
    #[arg(long, default_value_t = FilterConfig::DEFAULT_MIN_VERTICES)]
    min_vertices: usize,

    /// Roundness must exceed this.
    #[arg(long, default_value_t = FilterConfig::DEFAULT_MIN_ROUNDNESS)]
    min_roundness: f64,

    /// Full filter config as a JSON string.
    ///
    /// When provided, all other threshold flags are ignored. The JSON
    /// must be a valid `FilterConfig` serialization; missing fields take
    /// their defaults.
    #[arg(long)]
    config_json: Option<String>,
}

/// Filter stage selection.
#[derive(Clone, Copy, ValueEnum)]
enum StageArg {
    MinimumSize,
    TouchingEdges,
    Occluded,
    Wholeness,
    ConvexHull,
    Complexity,
    Roundish,
}

impl From<StageArg> for Stage {
    fn from(stage: StageArg) -> Self {
        match stage {
            StageArg::MinimumSize => Self::MinimumSize,
            StageArg::TouchingEdges => Self::TouchingEdges,
            StageArg::Occluded => Self::Occluded,
            StageArg::Wholeness => Self::Wholeness,
            StageArg::ConvexHull => Self::ConvexHull,
            StageArg::Complexity => Self::Complexity,
            StageArg::Roundish => Self::Roundish,
        }
    }
}

/// Contour tracing strategy selection.
#[derive(Clone, Copy, ValueEnum)]
enum Tracer {
    /// Straight runs compressed to their end points.
    Simple,
    /// Every boundary pixel.
    Full,
}

/// Maps a [`ContourTracerKind`] to the local CLI [`Tracer`] enum.
const fn tracer_from_pipeline(kind: ContourTracerKind) -> Tracer {
    match kind {
        ContourTracerKind::SimpleChain => Tracer::Simple,
        ContourTracerKind::FullChain => Tracer::Full,
    }
}

/// The CLI default tracer; a test keeps it equal to
/// [`ContourTracerKind::default`].
const CLI_DEFAULT_TRACER: Tracer = tracer_from_pipeline(ContourTracerKind::SimpleChain);

/// Threshold varied by `sweep`.
#[derive(Clone, Copy, ValueEnum)]
enum SweepParam {
    MinContourPoints,
    MinArea,
    BorderBuffer,
    Iou,
    OverlapSelf,
    MinSolidity,
    MaxHullDiffRatio,
    EpsilonFactor,
    MinVertices,
    MinRoundness,
}

/// Convert a swept value to a whole count, rejecting fractions and negatives.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::float_cmp
)]
fn whole(value: f64) -> Result<u64, String> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= f64::from(u32::MAX) {
        Ok(value as u64)
    } else {
        Err(format!("{value} is not a whole number"))
    }
}

impl SweepParam {
    fn to_override(self, value: f64) -> Result<ParamOverride, String> {
        let count = || whole(value).and_then(|v| usize::try_from(v).map_err(|e| e.to_string()));
        Ok(match self {
            Self::MinContourPoints => ParamOverride::MinimumContour {
                min_points: Some(count()?),
            },
            Self::MinArea => ParamOverride::MinimumSize {
                min_area: Some(whole(value)?),
            },
            Self::BorderBuffer => ParamOverride::TouchingEdges {
                buffer: Some(u32::try_from(whole(value)?).map_err(|e| e.to_string())?),
            },
            Self::Iou => ParamOverride::Occluded {
                iou: Some(value),
                overlap_self: None,
            },
            Self::OverlapSelf => ParamOverride::Occluded {
                iou: None,
                overlap_self: Some(value),
            },
            Self::MinSolidity => ParamOverride::Wholeness {
                min_solidity: Some(value),
            },
            Self::MaxHullDiffRatio => ParamOverride::ConvexHull {
                max_hull_diff_ratio: Some(value),
                max_perimeter_difference: None,
            },
            Self::EpsilonFactor => ParamOverride::Complexity {
                epsilon_factor: Some(value),
                min_vertices: None,
            },
            Self::MinVertices => ParamOverride::Complexity {
                epsilon_factor: None,
                min_vertices: Some(count()?),
            },
            Self::MinRoundness => ParamOverride::Roundish {
                min_roundness: Some(value),
            },
        })
    }
}

fn parse_pixel(s: &str) -> Result<(u32, u32), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got {s:?}"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<u32>()
            .map_err(|e| format!("invalid coordinate {v:?}: {e}"))
    };
    Ok((parse(x)?, parse(y)?))
}

/// Build a [`FilterConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual threshold flags are ignored. Otherwise, a config is
/// assembled from the individual flags.
fn config_from_args(args: &FilterArgs) -> Result<FilterConfig, String> {
    if let Some(ref json) = args.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(FilterConfig {
        min_contour_points: args.min_contour_points,
        contour_tracer: match args.tracer {
            Tracer::Simple => ContourTracerKind::SimpleChain,
            Tracer::Full => ContourTracerKind::FullChain,
        },
        min_area: args.min_area,
        border_buffer: args.border_buffer,
        occlusion: OcclusionThresholds {
            iou: args.iou,
            overlap_self: args.overlap_self,
        },
        min_solidity: args.min_solidity,
        max_hull_diff_ratio: args.max_hull_diff_ratio,
        max_perimeter_difference: args.max_perimeter_difference,
        epsilon_factor: args.epsilon_factor,
        min_vertices: args.min_vertices,
        min_roundness: args.min_roundness,
    })
}

fn pipeline_from_args(args: &FilterArgs) -> Result<FilterPipeline, String> {
    let config = config_from_args(args)?;
    let result = if args.stages.is_empty() {
        FilterPipeline::with_all_stages(config)
    } else {
        FilterPipeline::new(config, args.stages.iter().copied().map(Stage::from))
    };
    result.map_err(|e| e.to_string())
}

/// Load one photo's dimensions and masks.
fn load_input(input: &ImageArgs) -> Result<(SurveyImage, Vec<RawMask>), PipelineError> {
    let image = source::load_image(1, &input.image_path)?;
    let masks_path = input.masks.clone().unwrap_or_else(|| {
        let dir = input.image_path.parent().unwrap_or_else(|| Path::new("."));
        source::sidecar_path(dir, &image.name)
    });
    let masks = source::read_masks(&masks_path)?;
    tracing::info!(image = %image.name, masks = masks.len(), "loaded");
    Ok((image, masks))
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
    {
        eprintln!("Warning: logging disabled: {e}");
    }
}

fn write_file(path: &Path, contents: &str, what: &str) -> Result<(), String> {
    std::fs::write(path, contents)
        .map_err(|e| format!("Error writing {what} to {}: {e}", path.display()))?;
    eprintln!(
        "{what} written to {} ({} bytes)",
        path.display(),
        contents.len()
    );
    Ok(())
}

fn run_survey(
    image_dir: &Path,
    masks_dir: Option<&Path>,
    pixels_per_cm: f64,
    json: bool,
    filter: &FilterArgs,
) -> Result<(), String> {
    let pipeline = pipeline_from_args(filter)?;
    let calibration = Calibration::new(pixels_per_cm).map_err(|e| e.to_string())?;
    let generator =
        SidecarMasks::new(masks_dir.unwrap_or(image_dir)).map_err(|e| e.to_string())?;
    let paths = source::list_images(image_dir)
        .map_err(|e| format!("Error reading {}: {e}", image_dir.display()))?;
    tracing::info!(images = paths.len(), dir = %image_dir.display(), "starting survey");

    let survey = pebble_pipeline::run_survey(
        generator,
        source::survey_images(&paths),
        &pipeline,
        calibration,
    )
    .map_err(|e| e.to_string())?;

    if json {
        let out = serde_json::to_string_pretty(&survey)
            .map_err(|e| format!("Error serializing statistics: {e}"))?;
        println!("{out}");
    } else {
        print!("{}", pebble_export::survey_to_tsv(&survey));
    }
    Ok(())
}

fn run_filter(
    input: &ImageArgs,
    json: bool,
    accepted_out: Option<&Path>,
    filter: &FilterArgs,
) -> Result<(), String> {
    let pipeline = pipeline_from_args(filter)?;
    let (image, masks) = load_input(input).map_err(|e| e.to_string())?;
    let outcome = pipeline
        .apply(image.dimensions, masks)
        .map_err(|e| e.to_string())?;

    if json {
        let out = serde_json::to_string_pretty(&outcome.diagnostics)
            .map_err(|e| format!("Error serializing diagnostics: {e}"))?;
        println!("{out}");
    } else {
        print!("{}", pebble_export::decisions_to_tsv(&outcome.decisions));
        println!();
        println!("{}", outcome.diagnostics.report());
    }

    if let Some(path) = accepted_out {
        let encoded = pebble_pipeline::segment::encode_masks(
            outcome.accepted.iter().map(|pebble| &pebble.mask),
        )
        .map_err(|e| e.to_string())?;
        write_file(path, &encoded, "Accepted masks")?;
    }
    Ok(())
}

fn run_sweep(
    input: &ImageArgs,
    param: SweepParam,
    values: &[f64],
    filter: &FilterArgs,
) -> Result<(), String> {
    let pipeline = pipeline_from_args(filter)?;
    let overrides = values
        .iter()
        .map(|&v| param.to_override(v))
        .collect::<Result<Vec<_>, _>>()?;
    let (image, masks) = load_input(input).map_err(|e| e.to_string())?;

    let rows = pebble_pipeline::sweep(
        &pipeline,
        image.dimensions,
        &masks,
        0..overrides.len(),
        |i| overrides[i],
    )
    .map_err(|e| e.to_string())?;

    println!("value\taccepted\trejected");
    for row in &rows {
        println!(
            "{}\t{}\t{}",
            values[row.value],
            row.accepted,
            row.outcome.diagnostics.rejected()
        );
    }
    Ok(())
}

fn run_inspect(
    input: &ImageArgs,
    svg_path: &Path,
    at: Option<(u32, u32)>,
    unfiltered: bool,
    filter: &FilterArgs,
) -> Result<(), String> {
    let pipeline = pipeline_from_args(filter)?;
    let config = pipeline.config();
    let (image, masks) = load_input(input).map_err(|e| e.to_string())?;
    let candidates = masks.len();
    let shown: Vec<RawMask> = if unfiltered {
        masks
    } else {
        pipeline
            .apply(image.dimensions, masks)
            .map_err(|e| e.to_string())?
            .accepted
            .into_iter()
            .map(|pebble| pebble.mask)
            .collect()
    };
    let records =
        pebble_pipeline::build_records(image.dimensions, &shown).map_err(|e| e.to_string())?;
    eprintln!("Inspectable masks: {} of {candidates}", records.len());

    let picked = at.and_then(|(x, y)| records.pick(x, y));
    if let (Some((x, y)), None) = (at, picked) {
        eprintln!("No mask under pixel ({x}, {y})");
    }
    let lines = picked.map(|r| r.annotations(config)).unwrap_or_default();
    for line in &lines {
        println!("{line}");
    }

    let config_json = serde_json::to_string(config)
        .map_err(|e| format!("Error serializing config: {e}"))?;
    let metadata = pebble_export::SvgMetadata {
        title: Some(image.name.as_str()),
        description: None,
        config_json: Some(&config_json),
    };
    let highlight = picked.map(|record| pebble_export::Highlight {
        record,
        lines: &lines,
    });
    let svg = pebble_export::to_outline_svg(&records, image.dimensions, &metadata, highlight);
    write_file(svg_path, &svg, "SVG")
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let result = match &cli.command {
        Command::Survey {
            image_dir,
            masks_dir,
            pixels_per_cm,
            json,
            filter,
        } => run_survey(
            image_dir,
            masks_dir.as_deref(),
            *pixels_per_cm,
            *json,
            filter,
        ),
        Command::Filter {
            input,
            json,
            accepted_out,
            filter,
        } => run_filter(input, *json, accepted_out.as_deref(), filter),
        Command::Sweep {
            input,
            param,
            values,
            filter,
        } => run_sweep(input, *param, values, filter),
        Command::Inspect {
            input,
            svg,
            at,
            unfiltered,
            filter,
        } => run_inspect(input, svg, *at, *unfiltered, filter),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("{msg}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("pebble-survey").chain(args.iter().copied())).unwrap()
    }

    fn filter_args(cli: &Cli) -> &FilterArgs {
        match &cli.command {
            Command::Survey { filter, .. }
            | Command::Filter { filter, .. }
            | Command::Sweep { filter, .. }
            | Command::Inspect { filter, .. } => filter,
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn default_flags_match_default_config() {
        let cli = parse(&["survey", "photos"]);
        let config = config_from_args(filter_args(&cli)).unwrap();
        assert_eq!(config, FilterConfig::default());
        let pipeline = pipeline_from_args(filter_args(&cli)).unwrap();
        assert_eq!(pipeline.stages(), &Stage::ALL);
    }

    #[test]
    fn stages_flag_selects_subset() {
        let cli = parse(&["survey", "photos", "--stages", "roundish,minimum-size"]);
        let pipeline = pipeline_from_args(filter_args(&cli)).unwrap();
        assert_eq!(pipeline.stages(), &[Stage::MinimumSize, Stage::Roundish]);
    }

    #[test]
    fn config_json_overrides_flags() {
        let cli = parse(&[
            "filter",
            "img_1.png",
            "--min-area",
            "10",
            "--config-json",
            r#"{"min_area": 4000}"#,
        ]);
        let config = config_from_args(filter_args(&cli)).unwrap();
        assert_eq!(config.min_area, 4000);
        assert_eq!(config.min_vertices, FilterConfig::DEFAULT_MIN_VERTICES);
    }

    #[test]
    fn bad_config_json_is_an_error() {
        let cli = parse(&["filter", "img_1.png", "--config-json", "{"]);
        assert!(config_from_args(filter_args(&cli)).is_err());
    }

    #[test]
    fn invalid_threshold_is_rejected_by_pipeline() {
        let cli = parse(&["filter", "img_1.png", "--min-roundness=-1"]);
        assert!(pipeline_from_args(filter_args(&cli)).is_err());
    }

    #[test]
    fn sweep_values_become_overrides() {
        assert_eq!(
            SweepParam::MinArea.to_override(2500.0).unwrap(),
            ParamOverride::MinimumSize {
                min_area: Some(2500)
            }
        );
        assert_eq!(
            SweepParam::OverlapSelf.to_override(0.3).unwrap(),
            ParamOverride::Occluded {
                iou: None,
                overlap_self: Some(0.3)
            }
        );
        assert!(SweepParam::MinVertices.to_override(6.5).is_err());
        assert!(SweepParam::BorderBuffer.to_override(-1.0).is_err());
    }

    #[test]
    fn sweep_parses_value_list() {
        let cli = parse(&[
            "sweep",
            "img_1.png",
            "--param",
            "min-roundness",
            "--values",
            "0.2,0.35,0.5",
        ]);
        let Command::Sweep { values, .. } = &cli.command else {
            unreachable!("parsed as sweep");
        };
        assert_eq!(values, &[0.2, 0.35, 0.5]);
    }

    #[test]
    fn pixel_argument_parses() {
        assert_eq!(parse_pixel("12, 40").unwrap(), (12, 40));
        assert!(parse_pixel("12").is_err());
        assert!(parse_pixel("a,1").is_err());
    }

    #[test]
    fn default_tracer_matches_pipeline() {
        assert!(matches!(
            tracer_from_pipeline(ContourTracerKind::default()),
            Tracer::Simple
        ));
    }
}
