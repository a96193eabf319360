//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::ProxyBlueprint;
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
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    sub_hal_count: usize,
    sensor_count: usize,
    wake_up_sensor_count: usize,
    sink_count: usize,
    aod_enabled: bool,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
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
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    sub_hal_count: blueprint.sub_hals.len(),
                    sensor_count: blueprint.sensor_count(),
                    wake_up_sensor_count: wake_up_sensor_count(&blueprint),
                    sink_count: blueprint.sinks.len(),
                    aod_enabled: blueprint.policy.aod_enabled,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

fn wake_up_sensor_count(blueprint: &ProxyBlueprint) -> usize {
    blueprint
        .sub_hals
        .iter()
        .flat_map(|s| s.sensors.iter())
        .filter(|s| s.wake_up)
        .count()
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &ProxyBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.sinks.is_empty() {
        warnings.push("No sinks configured - processed batches will be dropped".to_string());
    }

    for sub_hal in &blueprint.sub_hals {
        if sub_hal.sensors.is_empty() {
            warnings.push(format!(
                "Sub-HAL '{}' has no sensors configured",
                sub_hal.name
            ));
        }
    }

    if wake_up_sensor_count(blueprint) == 0 {
        warnings.push("No wake-up sensors configured - the wake lock is never taken".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Sub-HALs: {}", summary.sub_hal_count);
            println!(
                "  Sensors: {} ({} wake-up)",
                summary.sensor_count, summary.wake_up_sensor_count
            );
            println!("  Sinks: {}", summary.sink_count);
            println!("  AOD light mode: {}", summary.aod_enabled);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const CONFIG: &str = r#"
[[sub_hals]]
name = "vendor"

[[sub_hals.sensors]]
handle = 1
name = "Light"
sensor_type = "light"

[[sub_hals]]
name = "empty"
"#;

    #[test]
    fn test_missing_file_is_invalid() {
        let args = ValidateArgs {
            config: PathBuf::from("/nonexistent/proxy.toml"),
            json: false,
        };
        let result = validate_config(&args);
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("File not found"));
    }

    #[test]
    fn test_warnings_collected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proxy.toml");
        std::fs::write(&path, CONFIG).unwrap();

        let result = validate_config(&ValidateArgs {
            config: path,
            json: true,
        });
        assert!(result.valid);

        let warnings = result.warnings.unwrap();
        assert_eq!(warnings.len(), 3);
        assert!(warnings.iter().any(|w| w.contains("No sinks")));
        assert!(warnings.iter().any(|w| w.contains("'empty'")));
        assert!(warnings.iter().any(|w| w.contains("wake-up")));

        let summary = result.summary.unwrap();
        assert_eq!(summary.sub_hal_count, 2);
        assert_eq!(summary.sensor_count, 1);
    }
}
