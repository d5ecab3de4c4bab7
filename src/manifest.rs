//! Dataset manifest.
//!
//! A write-only summary record produced once per dataset build for
//! downstream tooling; nothing in the pipeline reads it back.

use std::fs;
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::dirscan::{collect_images, rel_string};
use crate::error::RotolabelError;
use crate::label::write_text_atomic;

/// Manifest schema version.
pub const MANIFEST_VERSION: u32 = 1;

/// Summary of a built dataset.
#[derive(Clone, Debug, Serialize)]
pub struct DatasetManifest {
    pub version: u32,
    /// RFC 3339 build timestamp.
    pub created_at: String,
    pub image_count: usize,
    pub total_size_bytes: u64,
    pub per_file: Vec<ManifestEntry>,
}

/// One file record in the manifest.
#[derive(Clone, Debug, Serialize)]
pub struct ManifestEntry {
    pub name: String,
    pub size: u64,
    /// RFC 3339 modification time, if the filesystem reports one.
    pub modified: Option<String>,
}

/// Build a manifest over the images in `images_dir`, sorted by name.
pub fn build_manifest(images_dir: &Path) -> Result<DatasetManifest, RotolabelError> {
    let images = collect_images(images_dir)?;

    let mut per_file = Vec::with_capacity(images.len());
    let mut total_size_bytes = 0u64;

    for image_path in &images {
        let metadata = fs::metadata(image_path).map_err(RotolabelError::Io)?;
        let size = metadata.len();
        total_size_bytes += size;

        per_file.push(ManifestEntry {
            name: rel_string(images_dir, image_path),
            size,
            modified: metadata.modified().ok().map(to_rfc3339),
        });
    }

    Ok(DatasetManifest {
        version: MANIFEST_VERSION,
        created_at: to_rfc3339(SystemTime::now()),
        image_count: per_file.len(),
        total_size_bytes,
        per_file,
    })
}

/// Serialize a manifest to pretty JSON and write it atomically.
pub fn write_manifest(path: &Path, manifest: &DatasetManifest) -> Result<(), RotolabelError> {
    let json = serde_json::to_string_pretty(manifest).map_err(|source| {
        RotolabelError::ManifestSerialize {
            path: path.to_path_buf(),
            source,
        }
    })?;
    write_text_atomic(path, &json)
}

fn to_rfc3339(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339()
}
