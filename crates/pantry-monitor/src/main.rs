mod bootstrap;
mod report;

use anyhow::{Context, Result};
use pantry_core::settings::Settings;
use pantry_core::time_utils::TimezoneHandler;
use pantry_data::analysis::{analyze_records, AnalysisOptions};
use pantry_data::reader::load_records;
use pantry_data::reconstructor::ReconstructOptions;

fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::setup_logging(&settings.log_level)?;
    settings.validate()?;

    tracing::info!("Pantry monitor v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::debug!(
        "Input: {}, recent: {}, timezone: {}, format: {}",
        settings.input.display(),
        settings.recent,
        settings.timezone,
        settings.format
    );

    let records = load_records(&settings.input)
        .with_context(|| format!("loading telemetry from {}", settings.input.display()))?;

    let options = AnalysisOptions {
        recent_limit: settings.recent as usize,
        reconstruct: ReconstructOptions {
            fallback_window: settings.fallback_window(),
        },
    };
    let result = analyze_records(&records, &options);

    tracing::info!(
        "Reconstructed {} cycles from {} records",
        result.metadata.cycles_detected,
        result.metadata.records_processed
    );

    match settings.format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            let tz = TimezoneHandler::new(&settings.timezone);
            print!(
                "{}",
                report::render_text(&result, &tz, chrono::Utc::now(), options.recent_limit)
            );
        }
    }

    Ok(())
}
