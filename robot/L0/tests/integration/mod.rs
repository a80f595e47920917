//! Integration tests across the robot-* crates.
//!
//! These tests exercise the full pipeline:
//! - equivalent rotations written in each format normalize to the same quaternion
//! - equivalent robots written in different formats diff as equal
//! - end-to-end diff scenarios, from document text to rendered report
//! - properties of normalize-then-diff over generated documents

pub mod diff_scenarios;
pub mod format_equivalence;
pub mod proptest_pipeline;
pub mod rotation_equivalence;
