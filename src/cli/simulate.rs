//! Simulate command implementation.

use super::output::{format_event, format_text};
use super::{CliError, OutputFormat};
use prismfall::{Engine, MatchConfig};
use std::path::Path;
use tracing::info;

/// Execute the simulate command.
///
/// # Errors
///
/// Returns an error if the config cannot be loaded or the summary cannot be
/// serialized.
pub(crate) fn execute(
    seed: Option<u64>,
    config: Option<&Path>,
    max_ticks: u32,
    dt: f32,
    format: OutputFormat,
    events: bool,
) -> Result<(), CliError> {
    if dt.is_nan() || dt <= 0.0 {
        return Err(CliError::new("--dt must be positive"));
    }

    let mut config = match config {
        Some(path) => MatchConfig::load(path)?,
        None => MatchConfig::default(),
    };
    if let Some(seed) = seed {
        config.seed = seed;
    }
    // Nobody is there to read it.
    config.tutorial_enabled = false;

    let mut engine = Engine::init(config)?.with_autopilot();
    info!(max_ticks, dt, "simulation started");

    let mut ticks = 0;
    while ticks < max_ticks && !engine.is_finished() {
        engine.tick(dt);
        ticks += 1;

        let drained = engine.drain_events();
        if events {
            let now = engine.scheduler().now();
            for event in &drained {
                println!("{}", format_event(now, event));
            }
        }
    }

    let summary = engine.teardown();
    info!(ticks, outcome = ?summary.outcome, "simulation finished");

    match format {
        OutputFormat::Text => print!("{}", format_text(&summary)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
    }

    Ok(())
}
