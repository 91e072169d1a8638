//! Latest-value summaries and recent-activity views over a reconstructed
//! batch. Everything here is a read-only pass over samples and cycles.

use chrono::{DateTime, Utc};
use pantry_core::models::{
    ActivityEntry, ActivityKind, Cycle, CycleMarker, DoorSample, DoorState, MarkerKind,
    RawTelemetryRecord, TelemetrySummary, WeightRange, WeightSample,
};
use pantry_core::data_processors::TimestampProcessor;

/// Stateless helper that derives presentation summaries.
pub struct SummaryAggregator;

impl SummaryAggregator {
    /// Chronologically last weight, if any sample exists.
    pub fn latest_weight(weight: &[WeightSample]) -> Option<f64> {
        weight.last().map(|w| w.weight_kg)
    }

    /// Chronologically last door state, if any sample exists.
    pub fn latest_door_state(doors: &[DoorSample]) -> Option<DoorState> {
        doors.last().map(|d| d.state)
    }

    /// Latest parsed timestamp across all records.
    pub fn last_updated(records: &[RawTelemetryRecord]) -> Option<DateTime<Utc>> {
        records
            .iter()
            .filter_map(|r| TimestampProcessor::extract(r).instant)
            .max()
    }

    /// Classify a cycle delta. Only an unresolved delta is neutral; a
    /// resolved delta that is not positive counts as a removal.
    pub fn classify(delta_kg: Option<f64>) -> ActivityKind {
        match delta_kg {
            Some(d) if d > 0.0 => ActivityKind::Added,
            Some(_) => ActivityKind::Removed,
            None => ActivityKind::Neutral,
        }
    }

    /// The last `limit` cycles, newest first, each with its classification.
    pub fn recent_activity(cycles: &[Cycle], limit: usize) -> Vec<ActivityEntry> {
        cycles
            .iter()
            .rev()
            .take(limit)
            .map(|cycle| ActivityEntry {
                kind: Self::classify(cycle.delta_kg),
                cycle: cycle.clone(),
            })
            .collect()
    }

    /// Boundary points of the last `limit` cycles whose mass resolved,
    /// sorted chronologically. These replace the raw weight series on the
    /// chart once any cycle exists.
    pub fn cycle_markers(cycles: &[Cycle], limit: usize) -> Vec<CycleMarker> {
        let start = cycles.len().saturating_sub(limit);
        let mut markers: Vec<CycleMarker> = Vec::new();

        for cycle in &cycles[start..] {
            if let Some(kg) = cycle.open_mass_kg {
                markers.push(CycleMarker {
                    timestamp: cycle.open_timestamp.clone(),
                    weight_kg: kg,
                    kind: MarkerKind::Open,
                    delta_kg: cycle.delta_kg,
                });
            }
            if let Some(kg) = cycle.close_mass_kg {
                markers.push(CycleMarker {
                    timestamp: cycle.close_timestamp.clone(),
                    weight_kg: kg,
                    kind: MarkerKind::Close,
                    delta_kg: cycle.delta_kg,
                });
            }
        }

        markers.sort_by(|a, b| a.timestamp.chronological_cmp(&b.timestamp));
        markers
    }

    /// Minimum and maximum of a set of weights, `None` when empty.
    pub fn weight_range(weights: impl IntoIterator<Item = f64>) -> Option<WeightRange> {
        weights.into_iter().fold(None, |acc, kg| match acc {
            None => Some(WeightRange {
                min_kg: kg,
                max_kg: kg,
            }),
            Some(r) => Some(WeightRange {
                min_kg: r.min_kg.min(kg),
                max_kg: r.max_kg.max(kg),
            }),
        })
    }

    /// Assemble the full summary for one batch.
    pub fn summarize(
        records: &[RawTelemetryRecord],
        weight: &[WeightSample],
        doors: &[DoorSample],
        cycles: &[Cycle],
        recent_limit: usize,
    ) -> TelemetrySummary {
        TelemetrySummary {
            latest_weight_kg: Self::latest_weight(weight),
            latest_door_state: Self::latest_door_state(doors),
            record_count: records.len(),
            last_updated: Self::last_updated(records),
            cycle_count: cycles.len(),
            recent_activity: Self::recent_activity(cycles, recent_limit),
        }
    }
}
