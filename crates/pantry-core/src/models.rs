use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Pounds → kilograms conversion factor applied to the `mass` field.
pub const POUNDS_TO_KG: f64 = 0.453592;

/// One raw telemetry record exactly as delivered by the fetch layer.
///
/// The shape is untrusted: any JSON value deserialises, and extraction
/// helpers in [`crate::data_processors`] treat anything they cannot read as
/// absent. A record that is not a JSON object simply contributes nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawTelemetryRecord(Value);

impl RawTelemetryRecord {
    /// Wrap an arbitrary JSON value.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// The underlying JSON value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// A top-level field, treating JSON `null` the same as a missing key.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    /// A field one level down (`outer.inner`), `null` treated as missing.
    pub fn nested(&self, outer: &str, inner: &str) -> Option<&Value> {
        self.0
            .get(outer)
            .and_then(|o| o.get(inner))
            .filter(|v| !v.is_null())
    }
}

impl From<Value> for RawTelemetryRecord {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// A record timestamp: the value as the device sent it plus, when it could
/// be parsed, the UTC instant it denotes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleTime {
    /// Original timestamp rendered as a string; `None` when absent.
    pub raw: Option<String>,
    /// Parsed instant; `None` when absent or unparseable.
    pub instant: Option<DateTime<Utc>>,
}

impl SampleTime {
    /// A timestamp that was not present on the record.
    pub fn missing() -> Self {
        Self {
            raw: None,
            instant: None,
        }
    }

    /// Build from a known instant, using its RFC 3339 form as the raw value.
    pub fn from_instant(instant: DateTime<Utc>) -> Self {
        Self {
            raw: Some(instant.to_rfc3339()),
            instant: Some(instant),
        }
    }

    /// Chronological ordering used for every sort in the pipeline.
    ///
    /// Parsed instants compare by time. Unparseable timestamps compare equal
    /// to each other and after every parsed one, so a stable sort keeps them
    /// in input order at the tail.
    pub fn chronological_cmp(&self, other: &Self) -> Ordering {
        match (self.instant, other.instant) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

/// Canonical door state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoorState {
    Open,
    Closed,
}

impl fmt::Display for DoorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DoorState::Open => write!(f, "open"),
            DoorState::Closed => write!(f, "closed"),
        }
    }
}

/// A normalised weight reading in kilograms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightSample {
    pub timestamp: SampleTime,
    /// Always finite.
    pub weight_kg: f64,
}

/// A normalised door-state reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoorSample {
    pub timestamp: SampleTime,
    pub state: DoorState,
}

/// Per-record view of the merged timeline scanned during cycle
/// reconstruction. Every input record yields exactly one entry, whether or
/// not it carried a door flag.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEntry {
    pub timestamp: SampleTime,
    pub mass_kg: Option<f64>,
    pub door: Option<DoorState>,
}

/// One reconstructed door-open-to-close interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cycle {
    pub open_timestamp: SampleTime,
    pub open_mass_kg: Option<f64>,
    pub close_timestamp: SampleTime,
    pub close_mass_kg: Option<f64>,
    /// `close - open`, rounded to three decimals; `None` unless both masses resolved.
    pub delta_kg: Option<f64>,
    /// Whole minutes between the two boundaries; `None` unless both timestamps parsed.
    pub duration_minutes: Option<i64>,
}

impl Cycle {
    /// Assemble a cycle, deriving `delta_kg` and `duration_minutes`.
    pub fn new(
        open_timestamp: SampleTime,
        open_mass_kg: Option<f64>,
        close_timestamp: SampleTime,
        close_mass_kg: Option<f64>,
    ) -> Self {
        let delta_kg = match (open_mass_kg, close_mass_kg) {
            (Some(open), Some(close)) => Some(round_to_grams(close - open)),
            _ => None,
        };
        let duration_minutes = match (open_timestamp.instant, close_timestamp.instant) {
            (Some(open), Some(close)) => Some(round_minutes((close - open).num_milliseconds())),
            _ => None,
        };
        Self {
            open_timestamp,
            open_mass_kg,
            close_timestamp,
            close_mass_kg,
            delta_kg,
            duration_minutes,
        }
    }

    /// The timestamp shown for the cycle in activity lists: the close
    /// boundary when it has a raw value, otherwise the open boundary.
    pub fn display_timestamp(&self) -> &SampleTime {
        if self.close_timestamp.raw.is_some() {
            &self.close_timestamp
        } else {
            &self.open_timestamp
        }
    }
}

/// Round a kilogram value to three decimal places.
pub fn round_to_grams(kg: f64) -> f64 {
    (kg * 1000.0).round() / 1000.0
}

/// Milliseconds → minutes, rounding halves upwards (1.5 → 2, -1.5 → -1).
fn round_minutes(millis: i64) -> i64 {
    (millis as f64 / 60_000.0 + 0.5).floor() as i64
}

/// Human-facing classification of a cycle's mass change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    /// Mass went up: items were added.
    Added,
    /// Mass went down: items were taken.
    Removed,
    /// No resolvable delta, or no net change.
    Neutral,
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityKind::Added => write!(f, "added"),
            ActivityKind::Removed => write!(f, "removed"),
            ActivityKind::Neutral => write!(f, "neutral"),
        }
    }
}

/// A cycle paired with its classification, as listed in recent activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub cycle: Cycle,
    pub kind: ActivityKind,
}

/// Which boundary of a cycle a chart marker represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerKind {
    Open,
    Close,
}

/// A plotted boundary point of a recent cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleMarker {
    pub timestamp: SampleTime,
    pub weight_kg: f64,
    pub kind: MarkerKind,
    /// Delta of the cycle the marker belongs to; colours close markers.
    pub delta_kg: Option<f64>,
}

/// Minimum and maximum over a set of plotted weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightRange {
    pub min_kg: f64,
    pub max_kg: f64,
}

/// Latest-value summary of one telemetry batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySummary {
    /// Chronologically last weight sample, if any.
    pub latest_weight_kg: Option<f64>,
    /// Chronologically last door sample, if any.
    pub latest_door_state: Option<DoorState>,
    /// Number of raw records in the batch, including unusable ones.
    pub record_count: usize,
    /// Latest parsed record instant.
    pub last_updated: Option<DateTime<Utc>>,
    /// Total completed cycles.
    pub cycle_count: usize,
    /// Most recent cycles, newest first.
    pub recent_activity: Vec<ActivityEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> SampleTime {
        SampleTime::from_instant(Utc.with_ymd_and_hms(2024, 3, 1, h, m, s).unwrap())
    }

    // ── RawTelemetryRecord ────────────────────────────────────────────────

    #[test]
    fn test_record_field_treats_null_as_missing() {
        let rec = RawTelemetryRecord::new(serde_json::json!({"door": null, "mass": 4}));
        assert!(rec.field("door").is_none());
        assert_eq!(rec.field("mass"), Some(&serde_json::json!(4)));
    }

    #[test]
    fn test_record_nested_lookup() {
        let rec = RawTelemetryRecord::new(serde_json::json!({"flags": {"door": "open"}}));
        assert_eq!(rec.nested("flags", "door"), Some(&serde_json::json!("open")));
        assert!(rec.nested("metrics", "weightKg").is_none());
    }

    #[test]
    fn test_record_deserialises_from_any_value() {
        let rec: RawTelemetryRecord = serde_json::from_str("42").unwrap();
        assert!(rec.field("ts").is_none());
    }

    // ── SampleTime ordering ───────────────────────────────────────────────

    #[test]
    fn test_chronological_cmp_parsed_before_unparsed() {
        let parsed = at(10, 0, 0);
        let unparsed = SampleTime {
            raw: Some("yesterday".to_string()),
            instant: None,
        };
        assert_eq!(parsed.chronological_cmp(&unparsed), Ordering::Less);
        assert_eq!(unparsed.chronological_cmp(&parsed), Ordering::Greater);
        assert_eq!(
            unparsed.chronological_cmp(&SampleTime::missing()),
            Ordering::Equal
        );
    }

    // ── Cycle ─────────────────────────────────────────────────────────────

    #[test]
    fn test_cycle_delta_rounded_to_three_decimals() {
        let cycle = Cycle::new(at(10, 0, 0), Some(1.0), at(10, 1, 0), Some(1.123456));
        assert_eq!(cycle.delta_kg, Some(0.123));
    }

    #[test]
    fn test_cycle_delta_none_when_mass_missing() {
        let cycle = Cycle::new(at(10, 0, 0), None, at(10, 1, 0), Some(2.0));
        assert!(cycle.delta_kg.is_none());
    }

    #[test]
    fn test_cycle_duration_rounds_half_up() {
        let cycle = Cycle::new(at(10, 0, 0), None, at(10, 1, 30), None);
        assert_eq!(cycle.duration_minutes, Some(2));
    }

    #[test]
    fn test_cycle_duration_rounds_down_below_half() {
        let cycle = Cycle::new(at(10, 0, 0), None, at(10, 1, 29), None);
        assert_eq!(cycle.duration_minutes, Some(1));
    }

    #[test]
    fn test_cycle_duration_none_when_timestamp_unparsed() {
        let close = SampleTime {
            raw: Some("not a time".to_string()),
            instant: None,
        };
        let cycle = Cycle::new(at(10, 0, 0), Some(1.0), close, Some(1.0));
        assert!(cycle.duration_minutes.is_none());
        assert_eq!(cycle.delta_kg, Some(0.0));
    }

    #[test]
    fn test_display_timestamp_prefers_close() {
        let cycle = Cycle::new(at(10, 0, 0), None, at(10, 5, 0), None);
        assert_eq!(cycle.display_timestamp(), &at(10, 5, 0));

        let cycle = Cycle::new(at(10, 0, 0), None, SampleTime::missing(), None);
        assert_eq!(cycle.display_timestamp(), &at(10, 0, 0));
    }

    // ── serde ─────────────────────────────────────────────────────────────

    #[test]
    fn test_door_state_serde_lowercase() {
        assert_eq!(serde_json::to_string(&DoorState::Open).unwrap(), r#""open""#);
        let back: DoorState = serde_json::from_str(r#""closed""#).unwrap();
        assert_eq!(back, DoorState::Closed);
    }

    #[test]
    fn test_cycle_serialises_camel_case_with_nulls() {
        let cycle = Cycle::new(at(10, 0, 0), None, at(10, 2, 0), Some(3.0));
        let json = serde_json::to_value(&cycle).unwrap();
        assert!(json.get("openMassKg").unwrap().is_null());
        assert_eq!(json["closeMassKg"], serde_json::json!(3.0));
        assert!(json["deltaKg"].is_null());
        assert_eq!(json["durationMinutes"], serde_json::json!(2));
    }
}
