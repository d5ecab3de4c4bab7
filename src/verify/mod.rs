//! Dataset consistency verification.
//!
//! Checks 1:1 image/annotation correspondence and per-box numeric
//! invariants over a final dataset directory pair. Strictly read-only: the
//! verifier never writes, mutates, or deletes. It runs between the merge
//! stage and the partitioner, and a failing report is the one condition
//! that halts the pipeline before data reaches the training collaborator.

mod report;

pub use report::{InvalidAnnotation, VerificationReport};

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::dirscan::{collect_files_with_extensions, collect_images, file_stem_string};
use crate::error::RotolabelError;
use crate::label::{read_label_file, LabeledBox, LABEL_EXTENSION};

/// Tolerance for the in-bounds half-extent check, absorbing the six-decimal
/// rounding that label files carry.
const BOUNDS_TOLERANCE: f64 = 1e-6;

/// Verify that every image in `images_dir` has a well-formed annotation in
/// `labels_dir`.
pub fn verify_dataset(
    images_dir: &Path,
    labels_dir: &Path,
) -> Result<VerificationReport, RotolabelError> {
    let images = collect_images(images_dir)?;
    let labels = collect_files_with_extensions(labels_dir, &[LABEL_EXTENSION])?;

    let mut report = VerificationReport {
        total_images: images.len(),
        ..Default::default()
    };

    // The base name is the join key between images and annotations; two
    // image files sharing a stem make the pairing ambiguous and would let
    // one annotation vouch for both.
    let mut stem_counts: BTreeMap<String, usize> = BTreeMap::new();
    for image_path in &images {
        *stem_counts.entry(file_stem_string(image_path)).or_insert(0) += 1;
    }
    report.duplicate_stems = stem_counts
        .iter()
        .filter(|(_, &count)| count > 1)
        .map(|(stem, _)| stem.clone())
        .collect();

    let image_stems: BTreeSet<String> = stem_counts.into_keys().collect();
    for label_path in &labels {
        let stem = file_stem_string(label_path);
        if !image_stems.contains(&stem) {
            report.orphan_annotations.push(stem);
        }
    }

    for image_path in &images {
        let stem = file_stem_string(image_path);
        let label_path = labels_dir.join(&stem).with_extension(LABEL_EXTENSION);

        if !label_path.is_file() {
            report.missing_annotations.push(stem);
            continue;
        }

        let boxes = match read_label_file(&label_path) {
            Ok(boxes) => boxes,
            Err(err) => {
                report.structurally_invalid.push(InvalidAnnotation {
                    file: stem,
                    reason: err.to_string(),
                });
                continue;
            }
        };

        if let Some(reason) = first_box_violation(&boxes) {
            report.structurally_invalid.push(InvalidAnnotation {
                file: stem,
                reason,
            });
            continue;
        }

        if boxes.is_empty() {
            report.empty_annotations += 1;
        }
        report.valid_count += 1;
    }

    Ok(report)
}

/// First invariant violated by any box in the set, if any.
fn first_box_violation(boxes: &[LabeledBox]) -> Option<String> {
    for (idx, b) in boxes.iter().enumerate() {
        if !b.is_finite() {
            return Some(format!("box {}: non-finite coordinates", idx + 1));
        }
        if !b.has_positive_size() {
            return Some(format!(
                "box {}: non-positive size {:.6}x{:.6}",
                idx + 1,
                b.w,
                b.h
            ));
        }
        if !b.in_bounds(BOUNDS_TOLERANCE) {
            return Some(format!(
                "box {}: extends outside [0,1] (center ({:.6}, {:.6}), size {:.6}x{:.6})",
                idx + 1,
                b.cx,
                b.cy,
                b.w,
                b.h
            ));
        }
    }
    None
}
