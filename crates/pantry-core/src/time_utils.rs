use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::warn;

use crate::formatting::PLACEHOLDER;
use crate::models::SampleTime;

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Uses the `iana-time-zone` crate directly – no subprocess calls.
/// Falls back to `"UTC"` if detection fails or the name is not a known zone.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone()
        .ok()
        .filter(|tz| tz.parse::<Tz>().is_ok())
        .unwrap_or_else(|| "UTC".to_string())
}

// ── TimezoneHandler ───────────────────────────────────────────────────────────

/// Renders UTC instants in a configured display timezone.
pub struct TimezoneHandler {
    display_tz: Tz,
}

impl TimezoneHandler {
    /// Create a handler for the given IANA timezone name.
    ///
    /// If `tz_name` is not a recognised IANA timezone, falls back to UTC
    /// and logs a warning.
    pub fn new(tz_name: &str) -> Self {
        let tz = tz_name.parse::<Tz>().unwrap_or_else(|_| {
            warn!(
                "TimezoneHandler: unrecognised timezone \"{}\", falling back to UTC",
                tz_name
            );
            Tz::UTC
        });
        Self { display_tz: tz }
    }

    /// Validate that `tz_name` is a recognised IANA timezone identifier.
    pub fn validate_timezone(tz_name: &str) -> bool {
        tz_name.parse::<Tz>().is_ok()
    }

    /// Convert a UTC [`DateTime`] to the display timezone.
    pub fn to_display(&self, dt: DateTime<Utc>) -> DateTime<Tz> {
        dt.with_timezone(&self.display_tz)
    }

    /// `YYYY-MM-DD HH:MM` in the display timezone.
    pub fn format_instant(&self, dt: DateTime<Utc>) -> String {
        self.to_display(dt).format("%Y-%m-%d %H:%M").to_string()
    }

    /// Format a record timestamp for display.
    ///
    /// Parsed instants are formatted in the display timezone; an unparseable
    /// timestamp is shown verbatim, and an absent one as a placeholder.
    pub fn format_sample_time(&self, t: &SampleTime) -> String {
        match (&t.instant, &t.raw) {
            (Some(dt), _) => self.format_instant(*dt),
            (None, Some(raw)) => raw.clone(),
            (None, None) => PLACEHOLDER.to_string(),
        }
    }

    /// Expose the configured display timezone.
    pub fn display_tz(&self) -> Tz {
        self.display_tz
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
