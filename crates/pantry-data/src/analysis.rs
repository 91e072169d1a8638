//! End-to-end reconstruction pipeline.
//!
//! Runs normalisation, cycle reconstruction and summarisation over one batch
//! of already-fetched records, returning an [`AnalysisResult`] ready for a
//! presentation layer. No I/O happens here.

use chrono::Utc;
use pantry_core::error::{PantryError, Result};
use pantry_core::models::{Cycle, DoorSample, RawTelemetryRecord, TelemetrySummary, WeightSample};
use pantry_core::settings::DEFAULT_RECENT_CYCLES;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregator::SummaryAggregator;
use crate::normalizer::SampleNormalizer;
use crate::reconstructor::{CycleReconstructor, ReconstructOptions};

// ── Public types ──────────────────────────────────────────────────────────────

/// Parameters for [`analyze_records`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisOptions {
    /// How many cycles the recent-activity view lists.
    pub recent_limit: usize,
    pub reconstruct: ReconstructOptions,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            recent_limit: DEFAULT_RECENT_CYCLES as usize,
            reconstruct: ReconstructOptions::default(),
        }
    }
}

/// Metadata produced alongside the analysis result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetadata {
    /// ISO-8601 timestamp when this result was generated.
    pub generated_at: String,
    /// Raw records in the batch.
    pub records_processed: usize,
    pub weight_samples: usize,
    pub door_samples: usize,
    pub cycles_detected: usize,
    /// `closed` readings dropped for lack of a pending open.
    pub unmatched_closes: usize,
    /// Whether a trailing open was dropped.
    pub discarded_open: bool,
}

/// The complete output of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub weight_samples: Vec<WeightSample>,
    pub door_samples: Vec<DoorSample>,
    /// Oldest first.
    pub cycles: Vec<Cycle>,
    pub summary: TelemetrySummary,
    pub metadata: AnalysisMetadata,
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Run the full pipeline over `records`.
///
/// 1. Normalise into weight and door samples.
/// 2. Build the merged timeline and reconstruct cycles.
/// 3. Summarise latest values and recent activity.
///
/// Input order does not matter. Re-running on the same records yields the
/// same result apart from `metadata.generated_at`.
pub fn analyze_records(records: &[RawTelemetryRecord], options: &AnalysisOptions) -> AnalysisResult {
    let samples = SampleNormalizer::normalize(records);

    let timeline = SampleNormalizer::timeline(records);
    let reconstruction = CycleReconstructor::new(options.reconstruct).reconstruct(&timeline);

    let summary = SummaryAggregator::summarize(
        records,
        &samples.weight,
        &samples.doors,
        &reconstruction.cycles,
        options.recent_limit,
    );

    let metadata = AnalysisMetadata {
        generated_at: Utc::now().to_rfc3339(),
        records_processed: records.len(),
        weight_samples: samples.weight.len(),
        door_samples: samples.doors.len(),
        cycles_detected: reconstruction.cycles.len(),
        unmatched_closes: reconstruction.unmatched_closes,
        discarded_open: reconstruction.discarded_open,
    };

    debug!(
        "analyze_records: {} records, {} cycles",
        metadata.records_processed, metadata.cycles_detected
    );

    AnalysisResult {
        weight_samples: samples.weight,
        door_samples: samples.doors,
        cycles: reconstruction.cycles,
        summary,
        metadata,
    }
}

/// Run the pipeline over an untyped JSON document.
///
/// The document must be an array of records; anything else is rejected with
/// [`PantryError::InvalidInput`]. Individual elements are never rejected.
pub fn analyze_value(value: &serde_json::Value, options: &AnalysisOptions) -> Result<AnalysisResult> {
    let items = value.as_array().ok_or_else(|| {
        PantryError::InvalidInput(format!(
            "expected an array of telemetry records, got {}",
            json_kind(value)
        ))
    })?;
    let records: Vec<RawTelemetryRecord> =
        items.iter().cloned().map(RawTelemetryRecord::from).collect();
    Ok(analyze_records(&records, options))
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
