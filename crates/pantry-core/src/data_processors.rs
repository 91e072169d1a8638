use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use tracing::debug;

use crate::models::{DoorState, RawTelemetryRecord, SampleTime, POUNDS_TO_KG};

/// Record key holding the timestamp.
pub const TIMESTAMP_FIELD: &str = "ts";

// ── TimestampProcessor ────────────────────────────────────────────────────────

/// Parses timestamps from the variety of formats devices report.
pub struct TimestampProcessor;

impl TimestampProcessor {
    /// Attempt to parse a [`serde_json::Value`] into a UTC [`DateTime`].
    ///
    /// Handles:
    /// * `null`       → `None`
    /// * JSON string  → ISO 8601 / RFC 3339 (including `Z`-suffix), RFC 2822
    ///   or common naive date-time patterns read as UTC.
    /// * JSON number  → Unix epoch in **milliseconds**.
    pub fn parse(value: &Value) -> Option<DateTime<Utc>> {
        match value {
            Value::Null => None,
            Value::String(s) => Self::parse_str(s.trim()),
            Value::Number(n) => {
                if let Some(millis) = n.as_i64() {
                    DateTime::from_timestamp_millis(millis)
                } else if let Some(f) = n.as_f64() {
                    if !f.is_finite() {
                        return None;
                    }
                    DateTime::from_timestamp_millis(f.round() as i64)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Read the record timestamp, keeping the raw form alongside the parse.
    pub fn extract(record: &RawTelemetryRecord) -> SampleTime {
        match record.field(TIMESTAMP_FIELD) {
            None => SampleTime::missing(),
            Some(value) => {
                let raw = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                SampleTime {
                    raw: Some(raw),
                    instant: Self::parse(value),
                }
            }
        }
    }

    fn parse_str(s: &str) -> Option<DateTime<Utc>> {
        if s.is_empty() {
            return None;
        }

        // Replace trailing 'Z' with '+00:00' for RFC 3339 compatibility.
        let normalised = if let Some(stripped) = s.strip_suffix('Z') {
            format!("{}+00:00", stripped)
        } else {
            s.to_string()
        };

        if let Ok(dt) = DateTime::parse_from_rfc3339(&normalised) {
            return Some(dt.with_timezone(&Utc));
        }

        if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
            return Some(dt.with_timezone(&Utc));
        }

        const DATETIME_FORMATS: &[&str] = &[
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%d %H:%M:%S",
            "%Y-%m-%dT%H:%M",
            "%Y-%m-%d %H:%M",
        ];

        for fmt in DATETIME_FORMATS {
            if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
                return Some(Utc.from_utc_datetime(&naive));
            }
        }

        if let Ok(date) = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            let naive = date.and_hms_opt(0, 0, 0)?;
            return Some(Utc.from_utc_datetime(&naive));
        }

        debug!(
            "TimestampProcessor: could not parse timestamp string \"{}\"",
            s
        );
        None
    }
}

// ── Numeric coercion ──────────────────────────────────────────────────────────

/// Read a JSON value as a finite number.
///
/// JSON numbers and strings holding a decimal literal qualify; booleans,
/// blank strings, containers and non-finite results do not.
pub fn coerce_finite(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok()?
        }
        _ => return None,
    };
    n.is_finite().then_some(n)
}

// ── MassExtractor ─────────────────────────────────────────────────────────────

/// One step in the per-record mass resolution list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MassSource {
    /// A top-level field denominated in pounds. Skipped (falls through to
    /// the next step) when absent or non-numeric.
    Pounds(&'static str),
    /// A nested field denominated in kilograms, accepted under several key
    /// spellings. The first spelling present wins even if it turns out not to
    /// be numeric.
    Kilograms {
        outer: &'static str,
        keys: &'static [&'static str],
    },
}

/// Precedence used to read a record's mass.
pub const MASS_RESOLUTION_ORDER: &[MassSource] = &[
    MassSource::Pounds("mass"),
    MassSource::Kilograms {
        outer: "metrics",
        keys: &["weightKg", "weightkg"],
    },
];

/// Resolves the mass of a record, in kilograms, from whichever encoding it
/// carries.
pub struct MassExtractor;

impl MassExtractor {
    /// Walk [`MASS_RESOLUTION_ORDER`] and return the first resolvable mass.
    pub fn extract(record: &RawTelemetryRecord) -> Option<f64> {
        Self::extract_with(record, MASS_RESOLUTION_ORDER)
    }

    /// Same as [`MassExtractor::extract`] with an explicit resolution list.
    pub fn extract_with(record: &RawTelemetryRecord, order: &[MassSource]) -> Option<f64> {
        order
            .iter()
            .find_map(|source| Self::resolve(record, *source))
            .filter(|kg| kg.is_finite())
    }

    fn resolve(record: &RawTelemetryRecord, source: MassSource) -> Option<f64> {
        match source {
            MassSource::Pounds(key) => record
                .field(key)
                .and_then(coerce_finite)
                .map(|lb| lb * POUNDS_TO_KG),
            MassSource::Kilograms { outer, keys } => keys
                .iter()
                .find_map(|key| record.nested(outer, key))
                .and_then(coerce_finite),
        }
    }
}

// ── DoorStateExtractor ────────────────────────────────────────────────────────

/// Where a door flag may live on a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorField {
    TopLevel(&'static str),
    Nested(&'static str, &'static str),
}

/// Precedence used to locate a record's door flag. The first location that
/// holds a non-null value is used, whether or not that value decodes.
pub const DOOR_FIELD_ORDER: &[DoorField] = &[
    DoorField::TopLevel("door"),
    DoorField::Nested("flags", "door"),
];

/// Decodes the door-state flag of a record.
pub struct DoorStateExtractor;

impl DoorStateExtractor {
    /// Locate the door flag and decode it.
    pub fn extract(record: &RawTelemetryRecord) -> Option<DoorState> {
        let raw = DOOR_FIELD_ORDER.iter().find_map(|field| match *field {
            DoorField::TopLevel(key) => record.field(key),
            DoorField::Nested(outer, inner) => record.nested(outer, inner),
        })?;
        Self::decode(raw)
    }

    /// Map one of the accepted literal encodings to a [`DoorState`].
    ///
    /// `1`, `"1"`, `"open"`, `"opened"` → open; `0`, `"0"`, `"closed"`,
    /// `"close"` → closed. Anything else is unrecognised.
    pub fn decode(value: &Value) -> Option<DoorState> {
        match value {
            Value::Number(n) => match n.as_f64() {
                Some(f) if f == 1.0 => Some(DoorState::Open),
                Some(f) if f == 0.0 => Some(DoorState::Closed),
                _ => None,
            },
            Value::String(s) => match s.as_str() {
                "1" | "open" | "opened" => Some(DoorState::Open),
                "0" | "closed" | "close" => Some(DoorState::Closed),
                _ => None,
            },
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rec(v: Value) -> RawTelemetryRecord {
        RawTelemetryRecord::new(v)
    }

    // ── TimestampProcessor ────────────────────────────────────────────────

    #[test]
    fn test_parse_rfc3339_z_suffix() {
        let dt = TimestampProcessor::parse(&json!("2024-03-01T10:00:00Z")).unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-03-01T10:00:00+00:00");
    }

    #[test]
    fn test_parse_rfc3339_with_offset() {
        let dt = TimestampProcessor::parse(&json!("2024-03-01T12:00:00+02:00")).unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-03-01T10:00:00+00:00");
    }

    #[test]
    fn test_parse_naive_read_as_utc() {
        let dt = TimestampProcessor::parse(&json!("2024-03-01 10:00:00")).unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-03-01T10:00:00+00:00");
    }

    #[test]
    fn test_parse_date_only() {
        let dt = TimestampProcessor::parse(&json!("2024-03-01")).unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-03-01T00:00:00+00:00");
    }

    #[test]
    fn test_parse_epoch_millis() {
        let dt = TimestampProcessor::parse(&json!(1_709_287_200_000_i64)).unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-03-01T10:00:00+00:00");
    }

    #[test]
    fn test_parse_garbage_is_none() {
        assert!(TimestampProcessor::parse(&json!("soon")).is_none());
        assert!(TimestampProcessor::parse(&json!("")).is_none());
        assert!(TimestampProcessor::parse(&json!(true)).is_none());
        assert!(TimestampProcessor::parse(&Value::Null).is_none());
    }

    #[test]
    fn test_extract_keeps_raw_form() {
        let t = TimestampProcessor::extract(&rec(json!({"ts": "later"})));
        assert_eq!(t.raw.as_deref(), Some("later"));
        assert!(t.instant.is_none());

        let t = TimestampProcessor::extract(&rec(json!({"ts": 1_709_287_200_000_i64})));
        assert_eq!(t.raw.as_deref(), Some("1709287200000"));
        assert!(t.instant.is_some());

        let t = TimestampProcessor::extract(&rec(json!({"mass": 1})));
        assert_eq!(t, SampleTime::missing());
    }

    // ── coerce_finite ─────────────────────────────────────────────────────

    #[test]
    fn test_coerce_finite() {
        assert_eq!(coerce_finite(&json!(2.5)), Some(2.5));
        assert_eq!(coerce_finite(&json!(" 7 ")), Some(7.0));
        assert_eq!(coerce_finite(&json!("")), None);
        assert_eq!(coerce_finite(&json!("abc")), None);
        assert_eq!(coerce_finite(&json!("inf")), None);
        assert_eq!(coerce_finite(&json!(true)), None);
        assert_eq!(coerce_finite(&json!([1])), None);
    }

    // ── MassExtractor ─────────────────────────────────────────────────────

    #[test]
    fn test_mass_prefers_pounds() {
        let kg = MassExtractor::extract(&rec(json!({"mass": 10, "metrics": {"weightKg": 1.0}})));
        assert!((kg.unwrap() - 4.53592).abs() < 1e-9);
    }

    #[test]
    fn test_mass_zero_pounds_is_zero_kg() {
        assert_eq!(MassExtractor::extract(&rec(json!({"mass": 0}))), Some(0.0));
    }

    #[test]
    fn test_mass_falls_back_to_kilograms_when_pounds_unparseable() {
        let kg = MassExtractor::extract(&rec(json!({"mass": "n/a", "metrics": {"weightKg": 3.0}})));
        assert_eq!(kg, Some(3.0));
    }

    #[test]
    fn test_mass_lowercase_kilogram_key() {
        let kg = MassExtractor::extract(&rec(json!({"metrics": {"weightkg": "2.25"}})));
        assert_eq!(kg, Some(2.25));
    }

    #[test]
    fn test_mass_first_present_kilogram_key_wins() {
        let kg = MassExtractor::extract(&rec(json!({"metrics": {"weightKg": "bad", "weightkg": 1.0}})));
        assert_eq!(kg, None);
    }

    #[test]
    fn test_mass_null_kilogram_key_skipped() {
        let kg = MassExtractor::extract(&rec(json!({"metrics": {"weightKg": null, "weightkg": 1.5}})));
        assert_eq!(kg, Some(1.5));
    }

    #[test]
    fn test_mass_absent() {
        assert_eq!(MassExtractor::extract(&rec(json!({"door": 1}))), None);
        assert_eq!(MassExtractor::extract(&rec(json!("not an object"))), None);
    }

    #[test]
    fn test_mass_custom_order() {
        let order = [MassSource::Kilograms {
            outer: "metrics",
            keys: &["weightKg"],
        }];
        let kg = MassExtractor::extract_with(&rec(json!({"mass": 10, "metrics": {"weightKg": 1.0}})), &order);
        assert_eq!(kg, Some(1.0));
    }

    // ── DoorStateExtractor ────────────────────────────────────────────────

    #[test]
    fn test_door_decode_encodings() {
        for v in [json!(1), json!("1"), json!("open"), json!("opened")] {
            assert_eq!(DoorStateExtractor::decode(&v), Some(DoorState::Open), "{v}");
        }
        for v in [json!(0), json!("0"), json!("closed"), json!("close")] {
            assert_eq!(DoorStateExtractor::decode(&v), Some(DoorState::Closed), "{v}");
        }
        for v in [json!(2), json!("OPEN"), json!(true), json!(""), json!({})] {
            assert_eq!(DoorStateExtractor::decode(&v), None, "{v}");
        }
    }

    #[test]
    fn test_door_top_level_first() {
        let state = DoorStateExtractor::extract(&rec(json!({"door": 0, "flags": {"door": "open"}})));
        assert_eq!(state, Some(DoorState::Closed));
    }

    #[test]
    fn test_door_nested_when_top_level_missing() {
        let state = DoorStateExtractor::extract(&rec(json!({"door": null, "flags": {"door": "opened"}})));
        assert_eq!(state, Some(DoorState::Open));
    }

    #[test]
    fn test_door_unrecognised_top_level_does_not_fall_through() {
        let state = DoorStateExtractor::extract(&rec(json!({"door": "ajar", "flags": {"door": 1}})));
        assert_eq!(state, None);
    }
}
