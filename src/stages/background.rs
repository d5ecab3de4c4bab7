//! Background-substitution propagation stage.
//!
//! Background-substituted derivatives share exact object geometry with
//! their rotated counterparts (only background pixels differ), so their
//! annotations are the rotation-stage output copied byte for byte. A
//! missing source annotation is recorded as a failure; writing an empty
//! file in its place would silently turn "annotation not found" into "no
//! objects", which is exactly the confusion this stage must not create.

use std::fs;
use std::path::PathBuf;

use log::warn;
use rayon::prelude::*;

use crate::dirscan::{collect_images, file_stem_string};
use crate::error::RotolabelError;
use crate::label::{write_text_atomic, LABEL_EXTENSION};
use crate::report::{FileOutcome, StageReport};

/// Inputs for the propagation stage.
#[derive(Clone, Debug)]
pub struct PropagateOptions {
    /// Directory of background-substituted derived images.
    pub images_dir: PathBuf,
    /// Rotation-stage output directory holding the source annotations.
    pub source_labels_dir: PathBuf,
    /// Output directory for propagated label files.
    pub output_labels_dir: PathBuf,
}

/// Run the background-substitution propagation stage.
pub fn run_propagation_stage(opts: &PropagateOptions) -> Result<StageReport, RotolabelError> {
    fs::create_dir_all(&opts.output_labels_dir).map_err(RotolabelError::Io)?;

    let images = collect_images(&opts.images_dir)?;

    let outcomes: Vec<FileOutcome> = images
        .par_iter()
        .map(|image_path| {
            let stem = file_stem_string(image_path);
            let source = opts
                .source_labels_dir
                .join(&stem)
                .with_extension(LABEL_EXTENSION);

            if !source.is_file() {
                warn!("propagate: {stem}: no source annotation");
                return FileOutcome::failed(&stem, "no source annotation for base name");
            }

            let target = opts
                .output_labels_dir
                .join(&stem)
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

    let mut report = StageReport::new("propagate");
    report.absorb(outcomes);
    Ok(report)
}
