//! Verification report types.

use serde::Serialize;
use std::fmt;

/// The result of verifying an image directory against a label directory.
///
/// This is the acceptance gate before partitioning: a report with missing
/// or structurally invalid annotations means the dataset must not be handed
/// to the training collaborator.
#[derive(Clone, Debug, Default, Serialize)]
pub struct VerificationReport {
    /// Number of images examined.
    pub total_images: usize,
    /// Images with no annotation file at all.
    pub missing_annotations: Vec<String>,
    /// Images whose annotation file exists but is empty ("no objects").
    /// Valid, but worth surfacing; `--strict` treats these as errors.
    pub empty_annotations: usize,
    /// Images whose annotation file failed parsing or box invariants.
    pub structurally_invalid: Vec<InvalidAnnotation>,
    /// Base names shared by more than one image file. The base name is the
    /// join key between images and annotations, so a duplicate makes the
    /// pairing ambiguous and the dataset unusable.
    pub duplicate_stems: Vec<String>,
    /// Images with an existing, well-formed, in-bounds annotation.
    pub valid_count: usize,
    /// Annotation files with no corresponding image.
    pub orphan_annotations: Vec<String>,
}

impl VerificationReport {
    /// Number of problems that make the dataset unusable.
    pub fn error_count(&self) -> usize {
        self.missing_annotations.len()
            + self.structurally_invalid.len()
            + self.duplicate_stems.len()
    }

    /// Returns true if every image has a well-formed annotation.
    pub fn is_ok(&self) -> bool {
        self.error_count() == 0
    }

    /// Returns true under strict rules: no errors, no empty annotations,
    /// and no orphan annotation files.
    pub fn is_ok_strict(&self) -> bool {
        self.is_ok() && self.empty_annotations == 0 && self.orphan_annotations.is_empty()
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "verify: {}/{} image(s) valid, {} missing, {} invalid, {} duplicate, {} empty",
            self.valid_count,
            self.total_images,
            self.missing_annotations.len(),
            self.structurally_invalid.len(),
            self.duplicate_stems.len(),
            self.empty_annotations
        )?;

        if !self.missing_annotations.is_empty() {
            writeln!(f)?;
            writeln!(f, "Missing annotations ({}):", self.missing_annotations.len())?;
            for name in &self.missing_annotations {
                writeln!(f, "  - {}", name)?;
            }
        }

        if !self.structurally_invalid.is_empty() {
            writeln!(f)?;
            writeln!(
                f,
                "Structurally invalid ({}):",
                self.structurally_invalid.len()
            )?;
            for invalid in &self.structurally_invalid {
                writeln!(f, "  - {}: {}", invalid.file, invalid.reason)?;
            }
        }

        if !self.duplicate_stems.is_empty() {
            writeln!(f)?;
            writeln!(
                f,
                "Base names with multiple image files ({}):",
                self.duplicate_stems.len()
            )?;
            for name in &self.duplicate_stems {
                writeln!(f, "  - {}", name)?;
            }
        }

        if !self.orphan_annotations.is_empty() {
            writeln!(f)?;
            writeln!(
                f,
                "Annotations without images ({}):",
                self.orphan_annotations.len()
            )?;
            for name in &self.orphan_annotations {
                writeln!(f, "  - {}", name)?;
            }
        }

        Ok(())
    }
}

/// One invalid annotation file with the first reason found.
#[derive(Clone, Debug, Serialize)]
pub struct InvalidAnnotation {
    pub file: String,
    pub reason: String,
}
