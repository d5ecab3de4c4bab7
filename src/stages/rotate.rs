//! Rotation transform stage.
//!
//! For every hand-annotated original image and every configured angle, this
//! stage locates the rendered derivative `{base}_rot{angle}.{ext}`, queries
//! its pixel dimensions, pushes each box through the geometry engine, and
//! writes the derived label file. A derivative that has not been rendered
//! yet is a counted skip, not an error.

use std::fs;
use std::path::{Path, PathBuf};

use log::warn;
use rayon::prelude::*;

use crate::dirscan::{
    collect_files_with_extensions, collect_images, file_stem_string, find_image_for_stem,
    read_image_dimensions,
};
use crate::error::RotolabelError;
use crate::geometry::transform_box_with_min;
use crate::label::{
    read_label_file, write_label_file_atomic, LabeledBox, LABEL_EXTENSION, MIN_BOX_SIZE,
};
use crate::report::{FileOutcome, StageReport};

/// Inputs for the rotation transform stage.
#[derive(Clone, Debug)]
pub struct RotateOptions {
    /// Directory of hand-authored label files for the original images.
    pub original_labels_dir: PathBuf,
    /// Directory of original images (dimension source for denormalization).
    pub original_images_dir: PathBuf,
    /// Directory of renderer-produced rotated images.
    pub derived_images_dir: PathBuf,
    /// Output directory for derived label files.
    pub output_labels_dir: PathBuf,
    /// Rotation angles in degrees, matching the renderer's sweep.
    pub angles: Vec<i32>,
    /// Smallest normalized box extent written after transformation.
    pub min_box_size: f64,
}

impl RotateOptions {
    /// Creates options with the default minimum box size.
    pub fn new(
        original_labels_dir: impl Into<PathBuf>,
        original_images_dir: impl Into<PathBuf>,
        derived_images_dir: impl Into<PathBuf>,
        output_labels_dir: impl Into<PathBuf>,
        angles: Vec<i32>,
    ) -> Self {
        Self {
            original_labels_dir: original_labels_dir.into(),
            original_images_dir: original_images_dir.into(),
            derived_images_dir: derived_images_dir.into(),
            output_labels_dir: output_labels_dir.into(),
            angles,
            min_box_size: MIN_BOX_SIZE,
        }
    }
}

/// Run the rotation transform stage.
///
/// Returns a report with one processed entry per written label file, one
/// skip per missing derived image or unannotated original, and a failure
/// per original whose inputs could not be read or per derivative that
/// could not be transformed.
pub fn run_rotation_stage(opts: &RotateOptions) -> Result<StageReport, RotolabelError> {
    fs::create_dir_all(&opts.output_labels_dir).map_err(RotolabelError::Io)?;

    let mut report = StageReport::new("rotate");

    let label_files =
        collect_files_with_extensions(&opts.original_labels_dir, &[LABEL_EXTENSION])?;

    // Originals that were rendered but never annotated are reported as
    // skips so a forgotten annotation set does not vanish silently.
    let annotated: Vec<String> = label_files.iter().map(|p| file_stem_string(p)).collect();
    for image_path in collect_images(&opts.original_images_dir)? {
        let stem = file_stem_string(&image_path);
        if !annotated.contains(&stem) {
            report.record_skip(&stem, "original image has no annotation file");
        }
    }

    let outcomes: Vec<FileOutcome> = label_files
        .par_iter()
        .map(|label_path| process_original(label_path, opts))
        .flatten()
        .collect();

    report.absorb(outcomes);
    Ok(report)
}

/// Process every configured angle for one annotated original.
///
/// The original's label file and image dimensions are read once here, not
/// once per angle; only the derived image varies across the sweep.
fn process_original(label_path: &Path, opts: &RotateOptions) -> Vec<FileOutcome> {
    let base_name = file_stem_string(label_path);
    let mut outcomes = Vec::with_capacity(opts.angles.len());

    let mut rendered: Vec<(i32, PathBuf, String)> = Vec::new();
    for &angle in &opts.angles {
        let derived_stem = format!("{base_name}_rot{angle}");
        match find_image_for_stem(&opts.derived_images_dir, &derived_stem) {
            Some(path) => rendered.push((angle, path, derived_stem)),
            None => outcomes.push(FileOutcome::skipped(
                &derived_stem,
                "derived image not rendered",
            )),
        }
    }

    if rendered.is_empty() {
        return outcomes;
    }

    let (orig_w, orig_h, boxes) = match read_original_inputs(&base_name, label_path, opts) {
        Ok(inputs) => inputs,
        Err(err) => {
            warn!("rotate: {base_name}: {err}");
            outcomes.push(FileOutcome::failed(&base_name, err.to_string()));
            return outcomes;
        }
    };

    for (angle, derived_image, derived_stem) in rendered {
        let result = transform_one(
            &boxes,
            angle,
            orig_w,
            orig_h,
            &derived_image,
            &derived_stem,
            opts,
        );
        match result {
            Ok(()) => outcomes.push(FileOutcome::Processed),
            Err(err) => {
                warn!("rotate: {derived_stem}: {err}");
                outcomes.push(FileOutcome::failed(&derived_stem, err.to_string()));
            }
        }
    }

    outcomes
}

fn read_original_inputs(
    base_name: &str,
    label_path: &Path,
    opts: &RotateOptions,
) -> Result<(u32, u32, Vec<LabeledBox>), RotolabelError> {
    let original_image = find_image_for_stem(&opts.original_images_dir, base_name)
        .ok_or_else(|| RotolabelError::LayoutInvalid {
            path: opts.original_images_dir.clone(),
            message: format!("no original image found for base name '{base_name}'"),
        })?;

    let (orig_w, orig_h) = read_image_dimensions(&original_image)?;
    let boxes = read_label_file(label_path)?;
    Ok((orig_w, orig_h, boxes))
}

fn transform_one(
    boxes: &[LabeledBox],
    angle: i32,
    orig_w: u32,
    orig_h: u32,
    derived_image: &Path,
    derived_stem: &str,
    opts: &RotateOptions,
) -> Result<(), RotolabelError> {
    let (derived_w, derived_h) = read_image_dimensions(derived_image)?;

    let transformed: Vec<_> = boxes
        .iter()
        .map(|b| {
            transform_box_with_min(
                b,
                angle as f64,
                orig_w,
                orig_h,
                derived_w,
                derived_h,
                opts.min_box_size,
            )
        })
        .collect();

    let out_path = opts
        .output_labels_dir
        .join(derived_stem)
        .with_extension(LABEL_EXTENSION);
    write_label_file_atomic(&out_path, &transformed)
}
