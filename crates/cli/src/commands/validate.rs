//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::EngineConfig;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    config: Option<EngineConfig>,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{json}");
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            config: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                config: Some(config),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            config: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &EngineConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.time.max_backward_jump_s > config.time.max_forward_jump_s {
        warnings.push(format!(
            "time.max_backward_jump_s ({}) exceeds time.max_forward_jump_s ({})",
            config.time.max_backward_jump_s, config.time.max_forward_jump_s
        ));
    }
    if config.timing.max_interval_deviation >= 1.0 {
        warnings.push(
            "timing.max_interval_deviation >= 1.0 - timing repair accepts almost any spacing"
                .to_string(),
        );
    }
    if config.flightbook.min_altitude_m <= 0.0 {
        warnings.push(
            "flightbook.min_altitude_m <= 0 - every sample on the ground counts as airborne"
                .to_string(),
        );
    }
    if config.glide.pitch_max_deg >= 45.0 {
        warnings.push(format!(
            "glide.pitch_max_deg ({}) admits steep dives as glides",
            config.glide.pitch_max_deg
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref config) = result.config {
            println!(
                "\n  Time jumps: backward {} s, forward {} s",
                config.time.max_backward_jump_s, config.time.max_forward_jump_s
            );
            println!(
                "  Timing repair: min {} samples, deviation {}",
                config.timing.min_samples, config.timing.max_interval_deviation
            );
            println!(
                "  Flight book: min altitude {} m, min throttle {} %",
                config.flightbook.min_altitude_m, config.flightbook.min_throttle_percent
            );
            println!(
                "  Glide: speed >= {}, |pitch| < {} deg, |roll| < {} deg",
                config.glide.speed_min, config.glide.pitch_max_deg, config.glide.roll_max_deg
            );
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {warning}");
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {error}");
        }
    }
}
