//! Rotation stage tests over rendered BMP fixtures.

use std::fs;
use std::path::Path;

use rotolabel::label::parse_labels;
use rotolabel::stages::{run_rotation_stage, RotateOptions};

mod common;

fn layout(root: &Path) -> RotateOptions {
    RotateOptions::new(
        root.join("labels"),
        root.join("images"),
        root.join("derived"),
        root.join("derived_labels"),
        vec![0, 90],
    )
}

#[test]
fn writes_one_label_per_rendered_angle() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let opts = layout(temp.path());

    common::write_bmp(&opts.original_images_dir.join("floor1.bmp"), 640, 640);
    common::write_bmp(&opts.derived_images_dir.join("floor1_rot0.bmp"), 640, 640);
    common::write_bmp(&opts.derived_images_dir.join("floor1_rot90.bmp"), 640, 640);
    common::write_label(
        &opts.original_labels_dir.join("floor1.txt"),
        "0 0.5 0.5 0.2 0.2\n",
    );

    let report = run_rotation_stage(&opts).expect("run stage");
    assert_eq!(report.processed, 2);
    assert_eq!(report.skip_count(), 0);
    assert!(report.is_ok());

    // Centered square box on a square canvas is invariant at 90 degrees.
    let out = fs::read_to_string(opts.output_labels_dir.join("floor1_rot90.txt"))
        .expect("read derived labels");
    let boxes = parse_labels(&out, Path::new("floor1_rot90.txt")).expect("parse");
    assert_eq!(boxes.len(), 1);
    assert!((boxes[0].cx - 0.5).abs() < 1e-6);
    assert!((boxes[0].w - 0.2).abs() < 1e-6);
}

#[test]
fn missing_derived_image_is_a_counted_skip() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let opts = layout(temp.path());

    common::write_bmp(&opts.original_images_dir.join("floor1.bmp"), 640, 640);
    common::write_bmp(&opts.derived_images_dir.join("floor1_rot0.bmp"), 640, 640);
    // rot90 intentionally not rendered.
    common::write_label(
        &opts.original_labels_dir.join("floor1.txt"),
        "0 0.5 0.5 0.2 0.2\n",
    );

    let report = run_rotation_stage(&opts).expect("run stage");
    assert_eq!(report.processed, 1);
    assert_eq!(report.skip_count(), 1);
    assert_eq!(report.skips[0].file, "floor1_rot90");
    assert!(report.is_ok());
}

#[test]
fn unannotated_original_is_reported() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let opts = layout(temp.path());

    common::write_bmp(&opts.original_images_dir.join("floor1.bmp"), 640, 640);
    common::write_bmp(&opts.original_images_dir.join("floor2.bmp"), 640, 640);
    common::write_label(
        &opts.original_labels_dir.join("floor1.txt"),
        "0 0.5 0.5 0.2 0.2\n",
    );
    fs::create_dir_all(&opts.derived_images_dir).expect("create derived dir");

    let report = run_rotation_stage(&opts).expect("run stage");
    assert!(report
        .skips
        .iter()
        .any(|s| s.file == "floor2" && s.reason.contains("no annotation")));
}

#[test]
fn malformed_original_labels_fail_that_original_only() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let opts = layout(temp.path());

    common::write_bmp(&opts.original_images_dir.join("good.bmp"), 640, 640);
    common::write_bmp(&opts.original_images_dir.join("bad.bmp"), 640, 640);
    common::write_bmp(&opts.derived_images_dir.join("good_rot0.bmp"), 640, 640);
    common::write_bmp(&opts.derived_images_dir.join("bad_rot0.bmp"), 640, 640);
    common::write_label(
        &opts.original_labels_dir.join("good.txt"),
        "0 0.5 0.5 0.2 0.2\n",
    );
    common::write_label(
        &opts.original_labels_dir.join("bad.txt"),
        "0 0.5 oops 0.2 0.2\n",
    );

    let opts = RotateOptions {
        angles: vec![0],
        ..opts
    };
    let report = run_rotation_stage(&opts).expect("run stage");

    assert_eq!(report.processed, 1);
    assert_eq!(report.failure_count(), 1);
    assert_eq!(report.failures[0].file, "bad");
    assert!(opts.output_labels_dir.join("good_rot0.txt").is_file());
    assert!(!opts.output_labels_dir.join("bad_rot0.txt").exists());
}

#[test]
fn malformed_labels_with_nothing_rendered_stay_a_skip() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let opts = layout(temp.path());

    // No derived images at all: the label file is never even read, so the
    // whole sweep is skips with no failure.
    common::write_bmp(&opts.original_images_dir.join("bad.bmp"), 640, 640);
    common::write_label(
        &opts.original_labels_dir.join("bad.txt"),
        "0 0.5 oops 0.2 0.2\n",
    );
    fs::create_dir_all(&opts.derived_images_dir).expect("create derived dir");

    let report = run_rotation_stage(&opts).expect("run stage");
    assert_eq!(report.processed, 0);
    assert_eq!(report.skip_count(), 2);
    assert!(report.is_ok());
}

#[test]
fn empty_annotation_set_produces_empty_derived_file() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let opts = layout(temp.path());

    common::write_bmp(&opts.original_images_dir.join("empty.bmp"), 640, 640);
    common::write_bmp(&opts.derived_images_dir.join("empty_rot0.bmp"), 640, 640);
    common::write_label(&opts.original_labels_dir.join("empty.txt"), "");

    let opts = RotateOptions {
        angles: vec![0],
        ..opts
    };
    let report = run_rotation_stage(&opts).expect("run stage");

    assert_eq!(report.processed, 1);
    let out = fs::read_to_string(opts.output_labels_dir.join("empty_rot0.txt"))
        .expect("read derived labels");
    assert!(out.is_empty());
}
