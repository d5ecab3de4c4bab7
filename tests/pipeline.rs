//! End-to-end pipeline test: rotate, propagate, merge, verify, split,
//! manifest over a small rendered-fixture dataset.

use std::fs;
use std::path::Path;

use rotolabel::geometry::rotated_canvas_size;
use rotolabel::label::parse_labels;
use rotolabel::manifest::{build_manifest, write_manifest};
use rotolabel::split::{materialize_split, SplitOptions, SplitRatios};
use rotolabel::stages::{
    run_merge_stage, run_propagation_stage, run_rotation_stage, MergeOptions, PropagateOptions,
    RotateOptions,
};
use rotolabel::verify::verify_dataset;

mod common;

const ANGLES: [i32; 4] = [0, 45, 90, 180];

/// Lay out originals, renderer output, and the final image collection the
/// way the external renderer would, for `n` annotated originals.
fn render_fixture_dataset(root: &Path, n: usize) {
    let originals = root.join("originals/images");
    let labels = root.join("originals/labels");
    let rotated = root.join("rendered/rotated");
    let backgrounds = root.join("rendered/backgrounds");
    let final_images = root.join("final/images");

    for i in 0..n {
        let base = format!("scene{i:02}");
        common::write_bmp(&originals.join(format!("{base}.bmp")), 640, 480);
        common::write_label(
            &labels.join(format!("{base}.txt")),
            "0 0.500000 0.500000 0.200000 0.200000\n1 0.300000 0.400000 0.100000 0.150000\n",
        );

        for angle in ANGLES {
            let (w, h) = rotated_canvas_size(640, 480, angle as f64);
            let stem = format!("{base}_rot{angle}");
            common::write_bmp(&rotated.join(format!("{stem}.bmp")), w, h);
            // The final collection carries the lineage prefixes.
            common::write_bmp(&final_images.join(format!("rot_{stem}.bmp")), w, h);
            // Every rotated derivative also gets a background-substituted
            // sibling of the same dimensions.
            common::write_bmp(&backgrounds.join(format!("{stem}.bmp")), w, h);
            common::write_bmp(&final_images.join(format!("bg_{stem}.bmp")), w, h);
        }
    }
}

#[test]
fn full_pipeline_produces_a_consistent_split_dataset() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let root = temp.path();
    let n = 5;
    render_fixture_dataset(root, n);

    // Stage 1: derive labels for the rotated images.
    let rotate_opts = RotateOptions::new(
        root.join("originals/labels"),
        root.join("originals/images"),
        root.join("rendered/rotated"),
        root.join("labels/rotated"),
        ANGLES.to_vec(),
    );
    let report = run_rotation_stage(&rotate_opts).expect("rotation stage");
    assert!(report.is_ok(), "rotation failures: {report}");
    assert_eq!(report.processed, n * ANGLES.len());

    // Stage 2: propagate labels onto the background-substituted siblings.
    let propagate_opts = PropagateOptions {
        images_dir: root.join("rendered/backgrounds"),
        source_labels_dir: root.join("labels/rotated"),
        output_labels_dir: root.join("labels/backgrounds"),
    };
    let report = run_propagation_stage(&propagate_opts).expect("propagation stage");
    assert!(report.is_ok(), "propagation failures: {report}");
    assert_eq!(report.processed, n * ANGLES.len());

    // Stage 3: merge both label sources against the final collection.
    let merge_opts = MergeOptions {
        final_images_dir: root.join("final/images"),
        rotated_labels_dir: root.join("labels/rotated"),
        background_labels_dir: root.join("labels/backgrounds"),
        output_labels_dir: root.join("final/labels"),
        rotated_prefix: "rot_".to_string(),
        background_prefix: "bg_".to_string(),
    };
    let report = run_merge_stage(&merge_opts).expect("merge stage");
    assert!(report.is_ok(), "merge failures: {report}");
    assert_eq!(report.processed, 2 * n * ANGLES.len());

    // A rotated final label and its background sibling must be identical
    // byte-for-byte: the background stage is a pure propagation.
    let rot_label = fs::read_to_string(root.join("final/labels/rot_scene00_rot45.txt"))
        .expect("read rotated final label");
    let bg_label = fs::read_to_string(root.join("final/labels/bg_scene00_rot45.txt"))
        .expect("read background final label");
    assert_eq!(rot_label, bg_label);

    let boxes = parse_labels(&rot_label, Path::new("rot_scene00_rot45.txt")).expect("parse");
    assert_eq!(boxes.len(), 2);

    // Gate: the merged dataset verifies clean.
    let verification = verify_dataset(&root.join("final/images"), &root.join("final/labels"))
        .expect("verify");
    assert!(verification.is_ok_strict(), "verification: {verification}");
    assert_eq!(verification.total_images, 2 * n * ANGLES.len());
    assert_eq!(verification.valid_count, 2 * n * ANGLES.len());

    // Stage 4: deterministic split.
    let split_opts = SplitOptions {
        images_dir: root.join("final/images"),
        labels_dir: root.join("final/labels"),
        output_dir: root.join("dataset"),
        ratios: SplitRatios::DEFAULT,
        copy: false,
    };
    let summary = materialize_split(&split_opts).expect("split");
    let total = 2 * n * ANGLES.len();
    assert_eq!(summary.train + summary.val + summary.test, total);
    assert_eq!(summary.train, (total as f64 * 0.7).floor() as usize);

    // Every split subtree still verifies clean on its own.
    for subset in ["train", "val", "test"] {
        let sub = root.join("dataset").join(subset);
        let report = verify_dataset(&sub.join("images"), &sub.join("labels"))
            .expect("verify subset");
        assert!(report.is_ok_strict(), "{subset} verification: {report}");
    }

    // Manifest over the train images.
    let manifest = build_manifest(&root.join("dataset/train/images")).expect("build manifest");
    assert_eq!(manifest.image_count, summary.train);
    let manifest_path = root.join("dataset/manifest.json");
    write_manifest(&manifest_path, &manifest).expect("write manifest");
    assert!(manifest_path.is_file());
}

#[test]
fn partially_rendered_sweep_yields_skips_not_failures() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let root = temp.path();

    common::write_bmp(&root.join("originals/images/scene.bmp"), 640, 480);
    common::write_label(
        &root.join("originals/labels/scene.txt"),
        "0 0.500000 0.500000 0.200000 0.200000\n",
    );
    // Renderer has only finished the 0-degree frame so far.
    common::write_bmp(&root.join("rendered/rotated/scene_rot0.bmp"), 640, 480);

    let opts = RotateOptions::new(
        root.join("originals/labels"),
        root.join("originals/images"),
        root.join("rendered/rotated"),
        root.join("labels/rotated"),
        ANGLES.to_vec(),
    );
    let report = run_rotation_stage(&opts).expect("rotation stage");
    assert!(report.is_ok());
    assert_eq!(report.processed, 1);
    assert_eq!(report.skip_count(), ANGLES.len() - 1);
}

#[test]
fn merge_reports_stray_final_image_without_halting_the_rest() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let root = temp.path();

    common::write_bmp(&root.join("final/images/rot_scene_rot0.bmp"), 640, 480);
    common::write_bmp(&root.join("final/images/scratch.bmp"), 640, 480);
    common::write_label(
        &root.join("labels/rotated/scene_rot0.txt"),
        "0 0.500000 0.500000 0.200000 0.200000\n",
    );
    fs::create_dir_all(root.join("labels/backgrounds")).expect("create backgrounds dir");

    let opts = MergeOptions {
        final_images_dir: root.join("final/images"),
        rotated_labels_dir: root.join("labels/rotated"),
        background_labels_dir: root.join("labels/backgrounds"),
        output_labels_dir: root.join("final/labels"),
        rotated_prefix: "rot_".to_string(),
        background_prefix: "bg_".to_string(),
    };
    let report = run_merge_stage(&opts).expect("merge stage");

    assert_eq!(report.processed, 1);
    assert_eq!(report.failure_count(), 1);
    assert_eq!(report.failures[0].file, "scratch");
    assert!(root.join("final/labels/rot_scene_rot0.txt").is_file());
}
