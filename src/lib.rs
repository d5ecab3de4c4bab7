//! Rotolabel: rotation-consistent YOLO annotation pipeline.
//!
//! Rotolabel expands a small hand-labeled detection dataset through
//! geometric augmentation while keeping bounding-box annotations
//! mathematically consistent with the transformed images. An external
//! renderer produces rotated and background-substituted derivatives;
//! rotolabel re-derives the labels, merges the annotation sources, verifies
//! image/label consistency, and partitions the result for training.
//!
//! # Modules
//!
//! - [`geometry`]: pure box transformation under rotation and canvas growth
//! - [`label`]: YOLO label file parsing and atomic writing
//! - [`stages`]: the rotate, propagate, and merge batch stages
//! - [`verify`]: the read-only consistency gate before partitioning
//! - [`split`]: deterministic train/val/test partitioning
//! - [`manifest`]: write-only dataset summary for downstream tooling

pub mod config;
pub mod dirscan;
pub mod error;
pub mod geometry;
pub mod label;
pub mod manifest;
pub mod report;
pub mod split;
pub mod stages;
pub mod verify;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::PipelineConfig;
use crate::report::StageReport;
use crate::split::{SplitOptions, SplitRatios};
use crate::stages::{MergeOptions, PropagateOptions, RotateOptions};

pub use error::RotolabelError;

/// The rotolabel CLI application.
#[derive(Parser)]
#[command(name = "rotolabel")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Derive labels for rotated images from the original annotations.
    Rotate(RotateArgs),
    /// Copy labels onto background-substituted images.
    Propagate(PropagateArgs),
    /// Resolve final images to their upstream labels by lineage prefix.
    Merge(MergeArgs),
    /// Check image/label consistency before partitioning.
    Verify(VerifyArgs),
    /// Partition the dataset into train/val/test subtrees.
    Split(SplitArgs),
    /// Write a dataset manifest JSON for downstream tooling.
    Manifest(ManifestArgs),
}

/// Arguments for the rotate subcommand.
#[derive(clap::Args)]
struct RotateArgs {
    /// Directory of hand-authored label files for the original images.
    #[arg(long)]
    labels: PathBuf,

    /// Directory of original images.
    #[arg(long)]
    images: PathBuf,

    /// Directory of renderer-produced rotated images.
    #[arg(long)]
    derived: PathBuf,

    /// Output directory for derived label files.
    #[arg(long)]
    out: PathBuf,

    /// Rotation angles in degrees (comma-separated). Defaults to the
    /// config file's angles, or 0..345 in 15-degree steps.
    #[arg(long, value_delimiter = ',')]
    angles: Option<Vec<i32>>,

    /// Optional pipeline config YAML.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Arguments for the propagate subcommand.
#[derive(clap::Args)]
struct PropagateArgs {
    /// Directory of background-substituted derived images.
    #[arg(long)]
    images: PathBuf,

    /// Rotation-stage output directory holding the source annotations.
    #[arg(long)]
    source_labels: PathBuf,

    /// Output directory for propagated label files.
    #[arg(long)]
    out: PathBuf,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Arguments for the merge subcommand.
#[derive(clap::Args)]
struct MergeArgs {
    /// The final materialized image collection.
    #[arg(long)]
    images: PathBuf,

    /// Rotation-stage output annotations.
    #[arg(long)]
    rotated_labels: PathBuf,

    /// Background-substitution-stage output annotations.
    #[arg(long)]
    background_labels: PathBuf,

    /// Output directory for final label files.
    #[arg(long)]
    out: PathBuf,

    /// Optional pipeline config YAML (lineage prefixes).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Arguments for the verify subcommand.
#[derive(clap::Args)]
struct VerifyArgs {
    /// Image directory to verify.
    #[arg(long)]
    images: PathBuf,

    /// Label directory to verify against.
    #[arg(long)]
    labels: PathBuf,

    /// Also fail on empty and orphan annotations.
    #[arg(long)]
    strict: bool,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Arguments for the split subcommand.
#[derive(clap::Args)]
struct SplitArgs {
    /// Verified image directory.
    #[arg(long)]
    images: PathBuf,

    /// Verified label directory.
    #[arg(long)]
    labels: PathBuf,

    /// Output root for train/val/test subtrees.
    #[arg(long)]
    out: PathBuf,

    /// Training set fraction.
    #[arg(long, default_value_t = 0.7)]
    train: f64,

    /// Validation set fraction.
    #[arg(long, default_value_t = 0.2)]
    val: f64,

    /// Test set fraction.
    #[arg(long, default_value_t = 0.1)]
    test: f64,

    /// Copy files into the split instead of moving them.
    #[arg(long)]
    copy: bool,
}

/// Arguments for the manifest subcommand.
#[derive(clap::Args)]
struct ManifestArgs {
    /// Image directory to summarize.
    #[arg(long)]
    images: PathBuf,

    /// Output path for the manifest JSON.
    #[arg(long)]
    out: PathBuf,
}

/// Run the rotolabel CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), RotolabelError> {
    let _ = env_logger::try_init();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Rotate(args)) => run_rotate(args),
        Some(Commands::Propagate(args)) => run_propagate(args),
        Some(Commands::Merge(args)) => run_merge(args),
        Some(Commands::Verify(args)) => run_verify(args),
        Some(Commands::Split(args)) => run_split(args),
        Some(Commands::Manifest(args)) => run_manifest(args),
        None => {
            println!("rotolabel {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Rotation-consistent YOLO annotation pipeline.");
            println!();
            println!("Run 'rotolabel --help' for usage information.");
            Ok(())
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<PipelineConfig, RotolabelError> {
    match path {
        Some(path) => PipelineConfig::load(path),
        None => Ok(PipelineConfig::default()),
    }
}

/// Print a stage report and turn a non-empty failure list into an error.
///
/// Silent success with failures present is the one behavior the pipeline
/// forbids; the process exit status must reflect the report.
fn finish_stage(report: StageReport, output: &str) -> Result<(), RotolabelError> {
    print_report(&report, output);

    if report.is_ok() {
        Ok(())
    } else {
        Err(RotolabelError::StageFailed {
            stage: report.stage.clone(),
            failure_count: report.failure_count(),
            report,
        })
    }
}

fn print_report<T: serde::Serialize + std::fmt::Display>(report: &T, output: &str) {
    match output {
        "json" => match serde_json::to_string_pretty(report) {
            Ok(json) => println!("{json}"),
            Err(err) => eprintln!("failed to serialize report: {err}"),
        },
        _ => print!("{report}"),
    }
}

/// Execute the rotate subcommand.
fn run_rotate(args: RotateArgs) -> Result<(), RotolabelError> {
    let config = load_config(args.config.as_ref())?;
    let angles = args.angles.unwrap_or(config.angles);

    let opts = RotateOptions {
        original_labels_dir: args.labels,
        original_images_dir: args.images,
        derived_images_dir: args.derived,
        output_labels_dir: args.out,
        angles,
        min_box_size: config.min_box_size,
    };

    let report = stages::run_rotation_stage(&opts)?;
    finish_stage(report, &args.output)
}

/// Execute the propagate subcommand.
fn run_propagate(args: PropagateArgs) -> Result<(), RotolabelError> {
    let opts = PropagateOptions {
        images_dir: args.images,
        source_labels_dir: args.source_labels,
        output_labels_dir: args.out,
    };

    let report = stages::run_propagation_stage(&opts)?;
    finish_stage(report, &args.output)
}

/// Execute the merge subcommand.
fn run_merge(args: MergeArgs) -> Result<(), RotolabelError> {
    let config = load_config(args.config.as_ref())?;

    let opts = MergeOptions {
        final_images_dir: args.images,
        rotated_labels_dir: args.rotated_labels,
        background_labels_dir: args.background_labels,
        output_labels_dir: args.out,
        rotated_prefix: config.rotated_prefix,
        background_prefix: config.background_prefix,
    };

    let report = stages::run_merge_stage(&opts)?;
    finish_stage(report, &args.output)
}

/// Execute the verify subcommand.
fn run_verify(args: VerifyArgs) -> Result<(), RotolabelError> {
    let report = verify::verify_dataset(&args.images, &args.labels)?;
    print_report(&report, &args.output);

    let passed = if args.strict {
        report.is_ok_strict()
    } else {
        report.is_ok()
    };

    if passed {
        Ok(())
    } else {
        Err(RotolabelError::VerificationFailed {
            error_count: report.error_count(),
            total_images: report.total_images,
            report,
        })
    }
}

/// Execute the split subcommand.
fn run_split(args: SplitArgs) -> Result<(), RotolabelError> {
    let opts = SplitOptions {
        images_dir: args.images,
        labels_dir: args.labels,
        output_dir: args.out,
        ratios: SplitRatios {
            train: args.train,
            val: args.val,
            test: args.test,
        },
        copy: args.copy,
    };

    let summary = split::materialize_split(&opts)?;
    println!("{summary}");
    Ok(())
}

/// Execute the manifest subcommand.
fn run_manifest(args: ManifestArgs) -> Result<(), RotolabelError> {
    let manifest = manifest::build_manifest(&args.images)?;
    manifest::write_manifest(&args.out, &manifest)?;
    println!(
        "manifest: {} image(s), {} byte(s) -> {}",
        manifest.image_count,
        manifest.total_size_bytes,
        args.out.display()
    );
    Ok(())
}
