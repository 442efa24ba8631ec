//! `run` command implementation.

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::RunArgs;
use crate::commands::load_config;
use crate::pipeline::{LoadPlan, ScenarioSnapshot};

/// Execute the `run` command
pub async fn run_scenario(args: &RunArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;

    let plan = LoadPlan {
        inputs: args.inputs.clone(),
        config,
        shift_s: args.shift_sec,
        calculate_time_offset: !args.no_time_offset,
        strict: args.strict,
    };
    info!(
        inputs = plan.inputs.len(),
        shift_s = plan.shift_s,
        time_offset = plan.calculate_time_offset,
        "Loading inputs"
    );

    let loaded = plan.execute().await?;

    if args.json {
        let snapshot = ScenarioSnapshot::of(&loaded.scenario).with_stats(&loaded.stats);
        let json =
            serde_json::to_string_pretty(&snapshot).context("Failed to serialize scenario")?;
        println!("{json}");
    } else {
        print!("{}", loaded.scenario.overview());
        loaded.stats.print_summary();
    }

    Ok(())
}
