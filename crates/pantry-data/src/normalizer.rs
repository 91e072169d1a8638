//! Raw record normalisation.
//!
//! Turns heterogeneous [`RawTelemetryRecord`]s into the two canonical,
//! time-ordered sample sequences, and into the merged per-record timeline
//! the cycle reconstructor scans.

use pantry_core::data_processors::{DoorStateExtractor, MassExtractor, TimestampProcessor};
use pantry_core::models::{DoorSample, RawTelemetryRecord, TimelineEntry, WeightSample};
use tracing::{debug, warn};

/// Weight and door samples produced from one batch of records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedSamples {
    /// Ascending by timestamp; ties keep input order.
    pub weight: Vec<WeightSample>,
    /// Ascending by timestamp; ties keep input order.
    pub doors: Vec<DoorSample>,
}

/// Stateless converter from raw records to canonical samples.
pub struct SampleNormalizer;

impl SampleNormalizer {
    /// Split `records` into weight and door samples.
    ///
    /// Records are accepted in any order. A record contributes a weight sample
    /// when its mass resolves and a door sample when its flag decodes; each
    /// independently of the other. Nothing is rejected.
    pub fn normalize(records: &[RawTelemetryRecord]) -> NormalizedSamples {
        let mut weight: Vec<WeightSample> = Vec::new();
        let mut doors: Vec<DoorSample> = Vec::new();
        let mut unparsed = 0usize;

        for record in records {
            let timestamp = TimestampProcessor::extract(record);
            if timestamp.raw.is_some() && timestamp.instant.is_none() {
                unparsed += 1;
            }
            if let Some(weight_kg) = MassExtractor::extract(record) {
                weight.push(WeightSample {
                    timestamp: timestamp.clone(),
                    weight_kg,
                });
            }
            if let Some(state) = DoorStateExtractor::extract(record) {
                doors.push(DoorSample { timestamp, state });
            }
        }

        // `sort_by` is stable, so equal timestamps keep input order.
        weight.sort_by(|a, b| a.timestamp.chronological_cmp(&b.timestamp));
        doors.sort_by(|a, b| a.timestamp.chronological_cmp(&b.timestamp));

        if unparsed > 0 {
            warn!(
                "SampleNormalizer: {} records carry an unparseable timestamp and sort last",
                unparsed
            );
        }

        debug!(
            "SampleNormalizer: {} records -> {} weight, {} door samples",
            records.len(),
            weight.len(),
            doors.len()
        );

        NormalizedSamples { weight, doors }
    }

    /// Build the merged timeline: one entry per record, sorted the same way
    /// as the sample sequences.
    pub fn timeline(records: &[RawTelemetryRecord]) -> Vec<TimelineEntry> {
        let mut timeline: Vec<TimelineEntry> = records
            .iter()
            .map(|record| TimelineEntry {
                timestamp: TimestampProcessor::extract(record),
                mass_kg: MassExtractor::extract(record),
                door: DoorStateExtractor::extract(record),
            })
            .collect();
        timeline.sort_by(|a, b| a.timestamp.chronological_cmp(&b.timestamp));
        timeline
    }
}
