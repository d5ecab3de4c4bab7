//! Deterministic train/val/test partitioning.
//!
//! The split is a pure function of the sorted filename list and the ratio
//! triple: no randomness, so re-running over the same dataset reproduces
//! the identical split and image/label pairs never drift apart across
//! re-splits. Train and val counts are floored; test takes the remainder,
//! which guarantees the three counts sum exactly to the input count.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::dirscan::{collect_images, file_stem_string};
use crate::error::RotolabelError;
use crate::label::LABEL_EXTENSION;

/// Fractions of the dataset assigned to each subset. Must sum to 1.0.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SplitRatios {
    pub train: f64,
    pub val: f64,
    pub test: f64,
}

impl SplitRatios {
    /// Common 70/20/10 default.
    pub const DEFAULT: SplitRatios = SplitRatios {
        train: 0.7,
        val: 0.2,
        test: 0.1,
    };

    /// Validate that each ratio is in `[0, 1]` and the triple sums to 1.0.
    pub fn validate(&self) -> Result<(), RotolabelError> {
        for (name, value) in [("train", self.train), ("val", self.val), ("test", self.test)] {
            if !(0.0..=1.0).contains(&value) || !value.is_finite() {
                return Err(RotolabelError::InvalidSplitRatios {
                    message: format!("{name} ratio {value} is not in [0, 1]"),
                });
            }
        }

        let sum = self.train + self.val + self.test;
        if (sum - 1.0).abs() > 1e-6 {
            return Err(RotolabelError::InvalidSplitRatios {
                message: format!("ratios sum to {sum}, expected 1.0"),
            });
        }
        Ok(())
    }
}

/// The three disjoint filename lists produced by [`partition`].
#[derive(Clone, Debug, Default, Serialize)]
pub struct Partition {
    pub train: Vec<String>,
    pub val: Vec<String>,
    pub test: Vec<String>,
}

impl Partition {
    /// Total number of entries across all three subsets.
    pub fn len(&self) -> usize {
        self.train.len() + self.val.len() + self.test.len()
    }

    /// Returns true if the partition holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Partition a name list into train/val/test by the given ratios.
///
/// Input order does not matter; names are stably sorted before slicing so
/// the split is reproducible.
pub fn partition(names: &[String], ratios: &SplitRatios) -> Result<Partition, RotolabelError> {
    ratios.validate()?;

    let mut sorted: Vec<String> = names.to_vec();
    sorted.sort();

    let n = sorted.len();
    let train_count = (n as f64 * ratios.train).floor() as usize;
    let val_count = (n as f64 * ratios.val).floor() as usize;

    let mut iter = sorted.into_iter();
    let train: Vec<String> = iter.by_ref().take(train_count).collect();
    let val: Vec<String> = iter.by_ref().take(val_count).collect();
    let test: Vec<String> = iter.collect();

    Ok(Partition { train, val, test })
}

/// Inputs for materializing a split on disk.
#[derive(Clone, Debug)]
pub struct SplitOptions {
    pub images_dir: PathBuf,
    pub labels_dir: PathBuf,
    /// Root under which `train/`, `val/` and `test/` subtrees are created,
    /// each with `images/` and `labels/`.
    pub output_dir: PathBuf,
    pub ratios: SplitRatios,
    /// Copy files instead of moving them.
    pub copy: bool,
}

/// Per-subset counts after materialization.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct SplitSummary {
    pub train: usize,
    pub val: usize,
    pub test: usize,
}

impl std::fmt::Display for SplitSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "split: {} train, {} val, {} test",
            self.train, self.val, self.test
        )
    }
}

/// Partition the dataset and move (or copy) each image together with its
/// label file into the subset subtree.
///
/// Pairing is enforced here, not left to the caller: any image lacking a
/// label file blocks the whole split before a single file is touched.
pub fn materialize_split(opts: &SplitOptions) -> Result<SplitSummary, RotolabelError> {
    let images = collect_images(&opts.images_dir)?;

    let mut unpaired: Vec<String> = Vec::new();
    let mut stems: Vec<String> = Vec::with_capacity(images.len());
    for image_path in &images {
        let stem = file_stem_string(image_path);
        let label = opts.labels_dir.join(&stem).with_extension(LABEL_EXTENSION);
        if !label.is_file() {
            unpaired.push(stem.clone());
        }
        stems.push(stem);
    }

    // Two image files sharing a stem would collapse into one map entry
    // below and land in more than one subset; block before touching files.
    let mut sorted_stems = stems.clone();
    sorted_stems.sort();
    let mut duplicates: Vec<String> = Vec::new();
    for pair in sorted_stems.windows(2) {
        if pair[0] == pair[1] && duplicates.last() != Some(&pair[0]) {
            duplicates.push(pair[0].clone());
        }
    }
    if !duplicates.is_empty() {
        let sample = duplicates
            .iter()
            .take(5)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        return Err(RotolabelError::DuplicateBaseNames {
            count: duplicates.len(),
            sample,
        });
    }

    if !unpaired.is_empty() {
        let sample = unpaired
            .iter()
            .take(5)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        return Err(RotolabelError::SplitPairMismatch {
            count: unpaired.len(),
            sample,
        });
    }

    let split = partition(&stems, &opts.ratios)?;

    let image_by_stem: std::collections::BTreeMap<String, &PathBuf> = images
        .iter()
        .map(|path| (file_stem_string(path), path))
        .collect();

    for (subset, names) in [
        ("train", &split.train),
        ("val", &split.val),
        ("test", &split.test),
    ] {
        let image_out = opts.output_dir.join(subset).join("images");
        let label_out = opts.output_dir.join(subset).join("labels");
        fs::create_dir_all(&image_out).map_err(RotolabelError::Io)?;
        fs::create_dir_all(&label_out).map_err(RotolabelError::Io)?;

        for stem in names {
            let image_src = image_by_stem[stem];
            let image_name = image_src
                .file_name()
                .map(|n| n.to_os_string())
                .unwrap_or_default();
            let label_src = opts.labels_dir.join(stem).with_extension(LABEL_EXTENSION);
            let label_name = format!("{stem}.{LABEL_EXTENSION}");

            transfer(image_src, &image_out.join(image_name), opts.copy)?;
            transfer(&label_src, &label_out.join(label_name), opts.copy)?;
        }
    }

    Ok(SplitSummary {
        train: split.train.len(),
        val: split.val.len(),
        test: split.test.len(),
    })
}

fn transfer(src: &Path, dst: &Path, copy: bool) -> Result<(), RotolabelError> {
    if copy {
        fs::copy(src, dst).map_err(RotolabelError::Io)?;
    } else {
        // rename fails across filesystems; fall back to copy+remove.
        if fs::rename(src, dst).is_err() {
            fs::copy(src, dst).map_err(RotolabelError::Io)?;
            fs::remove_file(src).map_err(RotolabelError::Io)?;
        }
    }
    Ok(())
}
