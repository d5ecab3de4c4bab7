//! Directory scanning helpers shared by the pipeline stages.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::RotolabelError;
use crate::label::IMAGE_EXTENSIONS;

/// Collect all files under `root` with one of the given extensions
/// (case-insensitive), sorted by their path relative to `root` so every
/// stage sees a deterministic ordering.
pub fn collect_files_with_extensions(
    root: &Path,
    extensions: &[&str],
) -> Result<Vec<PathBuf>, RotolabelError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(|source| RotolabelError::LayoutInvalid {
            path: root.to_path_buf(),
            message: format!("failed while traversing directory: {source}"),
        })?;

        if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_by_cached_key(|path| rel_string(root, path));
    Ok(files)
}

/// Collect image files under `root`, sorted.
pub fn collect_images(root: &Path) -> Result<Vec<PathBuf>, RotolabelError> {
    collect_files_with_extensions(root, &IMAGE_EXTENSIONS)
}

fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };

    allowed
        .iter()
        .any(|allowed_ext| ext.eq_ignore_ascii_case(allowed_ext))
}

/// Find the image file in `dir` whose stem matches `stem`, trying known
/// image extensions in a fixed preference order.
pub fn find_image_for_stem(dir: &Path, stem: &str) -> Option<PathBuf> {
    for ext in IMAGE_EXTENSIONS {
        let candidate = dir.join(stem).with_extension(ext);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

/// Filename without extension, lossily converted to a string.
pub fn file_stem_string(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Path relative to `root` with forward slashes, for reports and sorting.
pub fn rel_string(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.to_string_lossy().replace('\\', "/")
}

/// Query an image's pixel dimensions from its encoded header.
pub fn read_image_dimensions(path: &Path) -> Result<(u32, u32), RotolabelError> {
    let size = imagesize::size(path).map_err(|source| RotolabelError::ImageDimensionRead {
        path: path.to_path_buf(),
        source,
    })?;

    let width: u32 = size
        .width
        .try_into()
        .map_err(|_| RotolabelError::LayoutInvalid {
            path: path.to_path_buf(),
            message: format!("image width {} does not fit in u32", size.width),
        })?;

    let height: u32 = size
        .height
        .try_into()
        .map_err(|_| RotolabelError::LayoutInvalid {
            path: path.to_path_buf(),
            message: format!("image height {} does not fit in u32", size.height),
        })?;

    Ok((width, height))
}
