//! `info` command implementation.

use anyhow::{Context, Result};

use crate::cli::InfoArgs;
use crate::commands::load_config;
use crate::error::CliError;
use crate::pipeline::{ScenarioSnapshot, SystemSnapshot};

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    if !args.input.exists() {
        return Err(CliError::input_not_found(&args.input).into());
    }

    let (mut scenario, stats) = ingestion::load_path(&args.input, config, false)
        .map_err(|e| CliError::ingestion(&args.input, e))?;
    if args.process {
        scenario.process(true);
    }

    let snapshot = ScenarioSnapshot::of(&scenario);
    if args.json {
        let json =
            serde_json::to_string_pretty(&snapshot).context("Failed to serialize unit listing")?;
        println!("{json}");
        return Ok(());
    }

    println!("Input: {}", args.input.display());
    println!(
        "  {} events, {} parse errors, {} systems",
        stats.events,
        stats.parse_errors,
        snapshot.systems.len()
    );
    for system in &snapshot.systems {
        print_system(system);
    }
    Ok(())
}

fn print_system(system: &SystemSnapshot) {
    println!(
        "\nSystem {} ({}, {}): {} units",
        system.id,
        system.vehicle_type,
        system.autopilot,
        system.units.len()
    );
    let width = system
        .units
        .iter()
        .map(|u| u.path.len())
        .max()
        .unwrap_or(0);
    for unit in &system.units {
        println!(
            "  {:<width$}  {:<16} {:<8} {:>8}",
            unit.path,
            unit.kind.as_str(),
            unit.class.as_str(),
            unit.samples,
        );
    }
}
