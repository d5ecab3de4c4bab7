use std::path::PathBuf;
use thiserror::Error;

use crate::report::StageReport;
use crate::verify::VerificationReport;

/// The main error type for rotolabel operations.
#[derive(Debug, Error)]
pub enum RotolabelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse label file {path} at line {line}: {message}")]
    LabelParse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Failed to read dimensions of {path}: {source}")]
    ImageDimensionRead {
        path: PathBuf,
        #[source]
        source: imagesize::ImageError,
    },

    #[error("Invalid directory layout at {path}: {message}")]
    LayoutInvalid { path: PathBuf, message: String },

    #[error("Failed to parse pipeline config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{stage} stage completed with {failure_count} failure(s)")]
    StageFailed {
        stage: String,
        failure_count: usize,
        report: StageReport,
    },

    #[error("Verification failed: {error_count} problem(s) across {total_images} image(s)")]
    VerificationFailed {
        error_count: usize,
        total_images: usize,
        report: VerificationReport,
    },

    #[error("Invalid split ratios: {message}")]
    InvalidSplitRatios { message: String },

    #[error("Image/label pairing broken for {count} image(s): {sample}")]
    SplitPairMismatch { count: usize, sample: String },

    #[error("{count} base name(s) shared by multiple image files: {sample}")]
    DuplicateBaseNames { count: usize, sample: String },

    #[error("Failed to serialize manifest for {path}: {source}")]
    ManifestSerialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
