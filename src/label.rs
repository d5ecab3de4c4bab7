//! YOLO-format label file parsing and writing.
//!
//! A label file holds one line per object:
//! `<class_id> <center_x> <center_y> <width> <height>`, with the four
//! geometry values normalized to `[0, 1]`. An empty file is a valid state
//! meaning "no objects in this image" and must be distinguished from a
//! missing file, which means "never annotated".
//!
//! This format is fixed by the downstream training tooling and must not
//! change; writers emit six decimal places, matching what the trainer and
//! annotation tools produce.

use std::fs;
use std::path::Path;

use crate::error::RotolabelError;

/// Smallest normalized box extent a writer will emit.
///
/// Transformed boxes are clamped to at least this size so a box that
/// collapses under rotation never becomes degenerate in the output.
pub const MIN_BOX_SIZE: f64 = 1e-3;

/// File extension for label files.
pub const LABEL_EXTENSION: &str = "txt";

/// Image extensions recognized when pairing labels with images.
pub const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "png", "jpeg", "bmp", "webp"];

/// One normalized bounding box, as stored in a label file row.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LabeledBox {
    pub class_id: u32,
    /// Box center x, as a fraction of image width.
    pub cx: f64,
    /// Box center y, as a fraction of image height.
    pub cy: f64,
    /// Box width, as a fraction of image width.
    pub w: f64,
    /// Box height, as a fraction of image height.
    pub h: f64,
}

impl LabeledBox {
    /// Creates a new labeled box.
    #[inline]
    pub fn new(class_id: u32, cx: f64, cy: f64, w: f64, h: f64) -> Self {
        Self {
            class_id,
            cx,
            cy,
            w,
            h,
        }
    }

    /// Returns true if all four geometry values are finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.cx.is_finite() && self.cy.is_finite() && self.w.is_finite() && self.h.is_finite()
    }

    /// Returns true if width and height are strictly positive.
    #[inline]
    pub fn has_positive_size(&self) -> bool {
        self.w > 0.0 && self.h > 0.0
    }

    /// Returns true if the box, expanded from its center, stays inside
    /// `[0, 1]` on both axes within `tolerance`.
    pub fn in_bounds(&self, tolerance: f64) -> bool {
        self.cx - self.w / 2.0 >= -tolerance
            && self.cx + self.w / 2.0 <= 1.0 + tolerance
            && self.cy - self.h / 2.0 >= -tolerance
            && self.cy + self.h / 2.0 <= 1.0 + tolerance
    }
}

/// Parse the contents of a label file into an ordered box list.
///
/// Blank lines are skipped. Any non-blank line that does not split into
/// exactly five whitespace-separated tokens, or whose tokens fail numeric
/// parsing, aborts the file with a [`RotolabelError::LabelParse`] carrying
/// the offending line number.
pub fn parse_labels(text: &str, path: &Path) -> Result<Vec<LabeledBox>, RotolabelError> {
    let mut boxes = Vec::new();

    for (line_idx, line) in text.lines().enumerate() {
        let line_num = line_idx + 1;
        if let Some(parsed) = parse_label_line(line, path, line_num)? {
            boxes.push(parsed);
        }
    }

    Ok(boxes)
}

/// Parse a single label line; blank lines yield `None`.
fn parse_label_line(
    line: &str,
    file_path: &Path,
    line_num: usize,
) -> Result<Option<LabeledBox>, RotolabelError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    // Take at most 6 tokens so pathological inputs do not allocate unbounded memory.
    let tokens: Vec<&str> = trimmed.split_whitespace().take(6).collect();

    if tokens.len() != 5 {
        return Err(RotolabelError::LabelParse {
            path: file_path.to_path_buf(),
            line: line_num,
            message: format!("expected 5 tokens, found {}", tokens.len()),
        });
    }

    let class_id = tokens[0]
        .parse::<u32>()
        .map_err(|_| RotolabelError::LabelParse {
            path: file_path.to_path_buf(),
            line: line_num,
            message: format!(
                "invalid class_id '{}'; expected non-negative integer",
                tokens[0]
            ),
        })?;

    let cx = parse_f64_token(tokens[1], "x_center", file_path, line_num)?;
    let cy = parse_f64_token(tokens[2], "y_center", file_path, line_num)?;
    let w = parse_f64_token(tokens[3], "width", file_path, line_num)?;
    let h = parse_f64_token(tokens[4], "height", file_path, line_num)?;

    Ok(Some(LabeledBox {
        class_id,
        cx,
        cy,
        w,
        h,
    }))
}

fn parse_f64_token(
    raw: &str,
    field_name: &str,
    file_path: &Path,
    line_num: usize,
) -> Result<f64, RotolabelError> {
    raw.parse::<f64>()
        .map_err(|_| RotolabelError::LabelParse {
            path: file_path.to_path_buf(),
            line: line_num,
            message: format!("invalid {field_name} '{raw}'; expected floating-point number"),
        })
}

/// Serialize boxes to label-file text: one row per box, six decimal places,
/// input order preserved. An empty slice serializes to an empty string.
pub fn serialize_labels(boxes: &[LabeledBox]) -> String {
    let mut out = String::with_capacity(boxes.len() * 40);
    for b in boxes {
        out.push_str(&format!(
            "{} {:.6} {:.6} {:.6} {:.6}\n",
            b.class_id, b.cx, b.cy, b.w, b.h
        ));
    }
    out
}

/// Read and parse a label file from disk.
pub fn read_label_file(path: &Path) -> Result<Vec<LabeledBox>, RotolabelError> {
    let text = fs::read_to_string(path).map_err(RotolabelError::Io)?;
    parse_labels(&text, path)
}

/// Write a label file atomically: the content lands in a `.tmp` sibling
/// first and is renamed into place, so a crash mid-write never leaves a
/// truncated file that could later parse as a bad annotation.
pub fn write_label_file_atomic(path: &Path, boxes: &[LabeledBox]) -> Result<(), RotolabelError> {
    write_text_atomic(path, &serialize_labels(boxes))
}

/// Atomic text write used for label files and copied annotations.
pub fn write_text_atomic(path: &Path, content: &str) -> Result<(), RotolabelError> {
    let mut tmp_name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    fs::write(&tmp_path, content).map_err(RotolabelError::Io)?;
    fs::rename(&tmp_path, path).map_err(RotolabelError::Io)?;
    Ok(())
}

/// Fuzz-only entrypoint for single-line label parsing.
#[cfg(feature = "fuzzing")]
pub fn fuzz_parse_label_line(input: &str) -> Result<(), RotolabelError> {
    let _ = parse_label_line(input, Path::new("<fuzz>"), 1)?;
    Ok(())
}
