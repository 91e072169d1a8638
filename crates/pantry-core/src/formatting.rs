use chrono::{DateTime, Utc};

/// Format a floating-point number with thousands separators and a fixed number
/// of decimal places.
///
/// # Examples
///
/// ```
/// use pantry_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5,  1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    let factor = 10_f64.powi(decimals as i32);
    let magnitude = value.abs();
    // Nudge by one relative ULP so decimal midpoints such as 1.005 round up.
    let scaled = (magnitude * factor + f64::EPSILON * magnitude * factor).round() as u64;

    let divisor = 10_u64.pow(decimals);
    let whole = group_thousands(&(scaled / divisor).to_string());
    let body = if decimals == 0 {
        whole
    } else {
        format!(
            "{}.{:0width$}",
            whole,
            scaled % divisor,
            width = decimals as usize
        )
    };

    if value < 0.0 && scaled != 0 {
        format!("-{}", body)
    } else {
        body
    }
}

/// Format a mass in kilograms with two decimals and thousands separators.
///
/// # Examples
///
/// ```
/// use pantry_core::formatting::format_kg;
///
/// assert_eq!(format_kg(12.3456), "12.35 kg");
/// assert_eq!(format_kg(1500.0), "1,500.00 kg");
/// ```
pub fn format_kg(kg: f64) -> String {
    format!("{} kg", format_number(kg, 2))
}

/// Format an optional mass change with an explicit sign for gains.
///
/// `None` (no resolvable delta) renders as an em dash placeholder.
///
/// # Examples
///
/// ```
/// use pantry_core::formatting::format_kg_delta;
///
/// assert_eq!(format_kg_delta(Some(0.5)),  "+0.50 kg");
/// assert_eq!(format_kg_delta(Some(-1.25)), "-1.25 kg");
/// assert_eq!(format_kg_delta(Some(0.0)),  "0.00 kg");
/// assert_eq!(format_kg_delta(None),       "—");
/// ```
pub fn format_kg_delta(delta_kg: Option<f64>) -> String {
    match delta_kg {
        Some(d) if d.is_finite() => {
            let sign = if d > 0.0 { "+" } else { "" };
            format!("{}{}", sign, format_kg(d))
        }
        _ => PLACEHOLDER.to_string(),
    }
}

/// Format a door-open duration in whole minutes.
///
/// * `None` → `"—"`
/// * `< 60` minutes → `"45m"`
/// * `≥ 60` minutes → `"3h"` or `"3h 45m"`
///
/// # Examples
///
/// ```
/// use pantry_core::formatting::format_duration_minutes;
///
/// assert_eq!(format_duration_minutes(Some(2)),   "2m");
/// assert_eq!(format_duration_minutes(Some(90)),  "1h 30m");
/// assert_eq!(format_duration_minutes(None),      "—");
/// ```
pub fn format_duration_minutes(minutes: Option<i64>) -> String {
    let Some(total_mins) = minutes else {
        return PLACEHOLDER.to_string();
    };
    if total_mins < 60 {
        format!("{}m", total_mins)
    } else {
        let hours = total_mins / 60;
        let mins = total_mins % 60;
        if mins == 0 {
            format!("{}h", hours)
        } else {
            format!("{}h {}m", hours, mins)
        }
    }
}

/// Describe how long ago `instant` was, relative to `now`.
///
/// Under an hour (including instants in the future) → `"updated <1h ago"`;
/// under a day → rounded hours; otherwise rounded days.
pub fn format_relative_age(instant: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let hours = (now - instant).num_milliseconds() as f64 / 3_600_000.0;
    if hours < 1.0 {
        "updated <1h ago".to_string()
    } else if hours < 24.0 {
        format!("updated {}h ago", round_half_up(hours))
    } else {
        format!("updated {}d ago", round_half_up(hours / 24.0))
    }
}

/// Placeholder rendered for absent values.
pub const PLACEHOLDER: &str = "—";

// ── Internal helpers ──────────────────────────────────────────────────────────

fn round_half_up(x: f64) -> i64 {
    (x + 0.5).floor() as i64
}

/// Insert commas every three digits from the right of an ASCII digit string.
fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

// ── Tests ──────────────────────────────────────────────────────────────────────
