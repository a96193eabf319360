//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::ProxyBlueprint;
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    policy: PolicyInfo,
    sub_hals: Vec<SubHalInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sinks: Vec<SinkInfo>,
}

#[derive(Serialize)]
struct PolicyInfo {
    glance_detected: f32,
    pick_up_detected: f32,
    aod_enabled: bool,
    aod_light_sensor_type: String,
    aod_light_mode_node: String,
}

#[derive(Serialize)]
struct SubHalInfo {
    index: u8,
    name: String,
    sensor_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sensors: Vec<SensorInfo>,
}

#[derive(Serialize)]
struct SensorInfo {
    name: String,
    local_handle: String,
    encoded_handle: String,
    sensor_type: String,
    type_string: String,
    wake_up: bool,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
    queue_capacity: usize,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn build_config_info(blueprint: &ProxyBlueprint, args: &InfoArgs) -> ConfigInfo {
    let sub_hals = blueprint
        .indexed_sub_hals()
        .map(|(index, sub_hal)| {
            let sensors = if args.sensors {
                sub_hal
                    .sensors
                    .iter()
                    .map(|s| {
                        let info = s.to_sensor_info(index);
                        SensorInfo {
                            name: s.name.clone(),
                            local_handle: format!("{:#x}", s.handle),
                            encoded_handle: format!("{:#010x}", info.sensor_handle),
                            sensor_type: format!("{:?}", s.sensor_type),
                            type_string: info.type_as_string,
                            wake_up: s.wake_up,
                        }
                    })
                    .collect()
            } else {
                Vec::new()
            };

            SubHalInfo {
                index: index.get(),
                name: sub_hal.name.clone(),
                sensor_count: sub_hal.sensors.len(),
                sensors,
            }
        })
        .collect();

    let sinks = if args.sinks {
        blueprint
            .sinks
            .iter()
            .map(|s| SinkInfo {
                name: s.name.clone(),
                sink_type: format!("{:?}", s.sink_type),
                queue_capacity: s.queue_capacity,
            })
            .collect()
    } else {
        Vec::new()
    };

    let policy = &blueprint.policy;
    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        policy: PolicyInfo {
            glance_detected: policy.glance_detected,
            pick_up_detected: policy.pick_up_detected,
            aod_enabled: policy.aod_enabled,
            aod_light_sensor_type: policy.aod_light_sensor_type.clone(),
            aod_light_mode_node: policy.aod_light_mode_node.display().to_string(),
        },
        sub_hals,
        sinks,
    }
}

fn print_config_info(blueprint: &ProxyBlueprint, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               Sensors Proxy Configuration                    ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let policy = &blueprint.policy;
    println!("⚙️  Policy");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   ├─ Glance detected: {}", policy.glance_detected);
    println!("   ├─ Pick-up detected: {}", policy.pick_up_detected);
    if policy.aod_enabled {
        println!(
            "   └─ AOD light mode: {} -> {}",
            policy.aod_light_sensor_type,
            policy.aod_light_mode_node.display()
        );
    } else {
        println!("   └─ AOD light mode: disabled");
    }

    let count = blueprint.sub_hals.len();
    println!("\n🔌 Sub-HALs ({})", count);
    for (index, sub_hal) in blueprint.indexed_sub_hals() {
        let is_last = usize::from(index.get()) == count - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child_prefix = if is_last { "   " } else { "│  " };

        println!("   {} [{}] {}", prefix, index, sub_hal.name);

        if args.sensors && !sub_hal.sensors.is_empty() {
            for (j, sensor) in sub_hal.sensors.iter().enumerate() {
                let sensor_is_last = j == sub_hal.sensors.len() - 1;
                let sensor_prefix = if sensor_is_last { "└─" } else { "├─" };
                println!(
                    "   {}  {} {:#010x} {} ({:?}{})",
                    child_prefix,
                    sensor_prefix,
                    index.encode(sensor.handle),
                    sensor.name,
                    sensor.sensor_type,
                    if sensor.wake_up { ", wake-up" } else { "" }
                );
            }
        } else {
            println!("   {}  └─ {} sensors", child_prefix, sub_hal.sensors.len());
        }
    }

    if args.sinks && !blueprint.sinks.is_empty() {
        println!("\n📤 Sinks ({})", blueprint.sinks.len());
        for (i, sink) in blueprint.sinks.iter().enumerate() {
            let is_last = i == blueprint.sinks.len() - 1;
            let prefix = if is_last { "└─" } else { "├─" };
            println!(
                "   {} {} ({:?}, capacity {})",
                prefix, sink.name, sink.sink_type, sink.queue_capacity
            );
        }
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_info_reports_encoded_handles() {
        let blueprint = config_loader::ConfigLoader::load_from_str(
            r#"
[[sub_hals]]
name = "first"

[[sub_hals]]
name = "second"

[[sub_hals.sensors]]
handle = 0x12
name = "Pick Up"
sensor_type = "pick_up_gesture"
wake_up = true
"#,
            config_loader::ConfigFormat::Toml,
        )
        .unwrap();
        let args = InfoArgs {
            config: PathBuf::from("unused.toml"),
            json: true,
            sensors: true,
            sinks: false,
        };

        let info = build_config_info(&blueprint, &args);
        assert_eq!(info.sub_hals.len(), 2);
        assert_eq!(info.sub_hals[1].index, 1);
        let sensor = &info.sub_hals[1].sensors[0];
        assert_eq!(sensor.local_handle, "0x12");
        assert_eq!(sensor.encoded_handle, "0x01000012");
        assert_eq!(sensor.type_string, "android.sensor.pick_up_gesture");
    }
}
