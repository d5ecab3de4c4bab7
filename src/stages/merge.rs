//! Dataset merge stage.
//!
//! The final image collection encodes provenance in its filenames: a fixed
//! prefix marks each image as rotation-derived or background-substituted.
//! That string convention is parsed exactly once, here, into a
//! [`FinalImageRecord`]; every other stage stays prefix-agnostic.

use std::fs;
use std::path::PathBuf;

use log::warn;
use rayon::prelude::*;

use crate::dirscan::{collect_images, file_stem_string};
use crate::error::RotolabelError;
use crate::label::{write_text_atomic, LABEL_EXTENSION};
use crate::report::{FileOutcome, StageReport};

/// Which upstream pipeline produced a final image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DerivationKind {
    Rotated,
    BackgroundSubstituted,
}

/// A final image with its lineage resolved from the filename convention.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FinalImageRecord {
    /// Image file stem as it appears in the final collection (prefixed).
    pub stem: String,
    /// Stem with the lineage prefix stripped; the upstream annotation key.
    pub base_name: String,
    pub kind: DerivationKind,
}

/// Inputs for the merge stage.
#[derive(Clone, Debug)]
pub struct MergeOptions {
    /// The final materialized image collection.
    pub final_images_dir: PathBuf,
    /// Rotation-stage output annotations.
    pub rotated_labels_dir: PathBuf,
    /// Background-substitution-stage output annotations.
    pub background_labels_dir: PathBuf,
    /// Output directory for final label files (named by prefixed stem).
    pub output_labels_dir: PathBuf,
    /// Prefix marking rotation-derived images.
    pub rotated_prefix: String,
    /// Prefix marking background-substituted images.
    pub background_prefix: String,
}

impl MergeOptions {
    /// Resolve a final image stem to its lineage record, or `None` if the
    /// stem matches neither known prefix.
    pub fn classify(&self, stem: &str) -> Option<FinalImageRecord> {
        if let Some(base) = stem.strip_prefix(self.rotated_prefix.as_str()) {
            return Some(FinalImageRecord {
                stem: stem.to_string(),
                base_name: base.to_string(),
                kind: DerivationKind::Rotated,
            });
        }
        if let Some(base) = stem.strip_prefix(self.background_prefix.as_str()) {
            return Some(FinalImageRecord {
                stem: stem.to_string(),
                base_name: base.to_string(),
                kind: DerivationKind::BackgroundSubstituted,
            });
        }
        None
    }
}

/// Run the dataset merge stage.
///
/// Every final image is processed exactly once. Unrecognized prefixes and
/// missing upstream annotations become failures in the report with explicit
/// filenames; on a fully consistent dataset the processed count equals the
/// final image count.
pub fn run_merge_stage(opts: &MergeOptions) -> Result<StageReport, RotolabelError> {
    fs::create_dir_all(&opts.output_labels_dir).map_err(RotolabelError::Io)?;

    let images = collect_images(&opts.final_images_dir)?;

    let outcomes: Vec<FileOutcome> = images
        .par_iter()
        .map(|image_path| {
            let stem = file_stem_string(image_path);

            let Some(record) = opts.classify(&stem) else {
                warn!("merge: {stem}: unrecognized lineage prefix");
                return FileOutcome::failed(
                    &stem,
                    "filename matches neither lineage prefix",
                );
            };

            let source_dir = match record.kind {
                DerivationKind::Rotated => &opts.rotated_labels_dir,
                DerivationKind::BackgroundSubstituted => &opts.background_labels_dir,
            };
            let source = source_dir
                .join(&record.base_name)
                .with_extension(LABEL_EXTENSION);

            if !source.is_file() {
                warn!("merge: {stem}: annotation '{}' not found", record.base_name);
                return FileOutcome::failed(&stem, "upstream annotation not found");
            }

            let target = opts
                .output_labels_dir
                .join(&record.stem)
                .with_extension(LABEL_EXTENSION);

            match fs::read_to_string(&source) {
                Ok(content) => match write_text_atomic(&target, &content) {
                    Ok(()) => FileOutcome::Processed,
                    Err(err) => FileOutcome::failed(&stem, err.to_string()),
                },
                Err(err) => FileOutcome::failed(&stem, err.to_string()),
            }
        })
        .collect();

    let mut report = StageReport::new("merge");
    report.absorb(outcomes);
    Ok(report)
}
