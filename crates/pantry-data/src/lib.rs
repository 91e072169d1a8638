//! Reconstruction pipeline for pantry telemetry.
//!
//! Normalises raw device records into weight and door samples, pairs door
//! openings and closings into cycles with mass deltas, summarises the result,
//! and loads exported telemetry files from disk.

pub mod aggregator;
pub mod analysis;
pub mod normalizer;
pub mod reader;
pub mod reconstructor;

pub use pantry_core as core;
