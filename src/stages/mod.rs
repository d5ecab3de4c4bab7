//! Batch pipeline stages.
//!
//! Each stage walks a bounded file collection, fans per-file work out over a
//! rayon pool (every unit is independent), and fans back in to a single
//! [`StageReport`](crate::report::StageReport). Per-file problems are
//! recorded and the stage continues; only the consistency verifier turns an
//! accumulated shortfall into a pipeline-halting failure.

pub mod background;
pub mod merge;
pub mod rotate;

pub use background::{run_propagation_stage, PropagateOptions};
pub use merge::{run_merge_stage, DerivationKind, FinalImageRecord, MergeOptions};
pub use rotate::{run_rotation_stage, RotateOptions};
