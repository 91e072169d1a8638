//! Core types for pantry telemetry reconstruction.
//!
//! Holds the canonical data model, the error type, field extraction for raw
//! device records, display formatting and timezone helpers, and CLI settings.

pub mod data_processors;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;

pub use error::{PantryError, Result};
