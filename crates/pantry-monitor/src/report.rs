//! Plain-text report for the terminal.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use pantry_core::formatting::{
    format_duration_minutes, format_kg, format_kg_delta, format_relative_age, PLACEHOLDER,
};
use pantry_core::models::{ActivityKind, MarkerKind, SampleTime};
use pantry_core::time_utils::TimezoneHandler;
use pantry_data::aggregator::SummaryAggregator;
use pantry_data::analysis::AnalysisResult;

/// A point on the weight chart, either a raw sample or a cycle boundary.
struct ChartPoint<'a> {
    timestamp: &'a SampleTime,
    weight_kg: f64,
    marker: Option<MarkerKind>,
}

/// Render `result` as a human-readable report.
///
/// `recent` bounds both the activity list and the cycles plotted on the
/// weight chart; `now` anchors the relative "updated" label.
pub fn render_text(
    result: &AnalysisResult,
    tz: &TimezoneHandler,
    now: DateTime<Utc>,
    recent: usize,
) -> String {
    let mut out = String::new();
    let summary = &result.summary;

    if summary.record_count == 0 {
        out.push_str("No telemetry records found for this pantry yet.\n");
        return out;
    }

    // ── Summary ──────────────────────────────────────────────────────────
    let _ = writeln!(out, "Pantry telemetry");
    match summary.last_updated {
        Some(ts) => {
            let _ = writeln!(
                out,
                "  Last updated    {} ({})",
                tz.format_instant(ts),
                format_relative_age(ts, now)
            );
        }
        None => {
            let _ = writeln!(out, "  Last updated    {}", PLACEHOLDER);
        }
    }
    let weight = summary
        .latest_weight_kg
        .map(format_kg)
        .unwrap_or_else(|| PLACEHOLDER.to_string());
    let door = summary
        .latest_door_state
        .map(|d| d.to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string());
    let _ = writeln!(out, "  Latest weight   {}", weight);
    let _ = writeln!(out, "  Latest door     {}", door);
    let _ = writeln!(out, "  Records loaded  {}", summary.record_count);

    // ── Recent activity ──────────────────────────────────────────────────
    out.push('\n');
    if summary.recent_activity.is_empty() {
        let _ = writeln!(out, "No recent activity recorded.");
    } else {
        let _ = writeln!(
            out,
            "Recent activity ({} cycles · {} shown)",
            summary.cycle_count,
            summary.recent_activity.len()
        );
        for entry in &summary.recent_activity {
            let cycle = &entry.cycle;
            let label = match entry.kind {
                ActivityKind::Added => "added",
                ActivityKind::Removed => "removed",
                ActivityKind::Neutral => "unknown",
            };
            let _ = writeln!(
                out,
                "  {}  {:<8} {:>10}  door open {}",
                tz.format_sample_time(cycle.display_timestamp()),
                label,
                format_kg_delta(cycle.delta_kg),
                format_duration_minutes(cycle.duration_minutes)
            );
        }
    }

    // ── Weight chart points ──────────────────────────────────────────────
    let markers = SummaryAggregator::cycle_markers(&result.cycles, recent);
    let points: Vec<ChartPoint<'_>> = if result.cycles.is_empty() {
        result
            .weight_samples
            .iter()
            .map(|w| ChartPoint {
                timestamp: &w.timestamp,
                weight_kg: w.weight_kg,
                marker: None,
            })
            .collect()
    } else {
        markers
            .iter()
            .map(|m| ChartPoint {
                timestamp: &m.timestamp,
                weight_kg: m.weight_kg,
                marker: Some(m.kind),
            })
            .collect()
    };

    out.push('\n');
    match SummaryAggregator::weight_range(points.iter().map(|p| p.weight_kg)) {
        None => {
            let _ = writeln!(out, "No weight data available.");
        }
        Some(range) => {
            let _ = writeln!(
                out,
                "Weight (Min {} · Max {})",
                format_kg(range.min_kg),
                format_kg(range.max_kg)
            );
            for p in &points {
                let marker = match p.marker {
                    Some(MarkerKind::Open) => "open",
                    Some(MarkerKind::Close) => "close",
                    None => "",
                };
                let _ = writeln!(
                    out,
                    "  {}  {:>10}  {}",
                    tz.format_sample_time(p.timestamp),
                    format_kg(p.weight_kg),
                    marker
                );
            }
        }
    }

    // Trailing spaces from empty marker columns.
    out.lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        + "\n"
}
