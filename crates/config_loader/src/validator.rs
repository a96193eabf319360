//! Configuration validation
//!
//! Rules:
//! - at least one sub-HAL, and no more than fit in the handle high bits
//! - sub-HAL names unique and non-empty
//! - local handles inside the low 24 bits, unique per sub-HAL
//! - sink names unique and non-empty
//! - AOD light-mode node set when AOD is enabled

use std::collections::HashSet;

use contracts::{ContractError, MAX_SUB_HAL_INDEX, ProxyBlueprint, check_local_handle};

/// Validate a ProxyBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &ProxyBlueprint) -> Result<(), ContractError> {
    validate_sub_hal_count(blueprint)?;
    validate_sub_hal_names(blueprint)?;
    validate_sensor_handles(blueprint)?;
    validate_sinks(blueprint)?;
    validate_policy(blueprint)?;
    Ok(())
}

fn validate_sub_hal_count(blueprint: &ProxyBlueprint) -> Result<(), ContractError> {
    let count = blueprint.sub_hals.len();
    if count == 0 {
        return Err(ContractError::config_validation(
            "sub_hals",
            "at least one sub-hal is required",
        ));
    }
    let max = usize::from(MAX_SUB_HAL_INDEX) + 1;
    if count > max {
        return Err(ContractError::config_validation(
            "sub_hals",
            format!("too many sub-hals: {count} (max {max})"),
        ));
    }
    Ok(())
}

/// Sub-HAL names must be unique
fn validate_sub_hal_names(blueprint: &ProxyBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, sub_hal) in blueprint.sub_hals.iter().enumerate() {
        if sub_hal.name.is_empty() {
            return Err(ContractError::config_validation(
                format!("sub_hals[{idx}].name"),
                "sub-hal name cannot be empty",
            ));
        }
        if !seen.insert(&sub_hal.name) {
            return Err(ContractError::config_validation(
                format!("sub_hals[name={}]", sub_hal.name),
                "duplicate sub-hal name",
            ));
        }
    }
    Ok(())
}

/// Handles are local to their sub-HAL
fn validate_sensor_handles(blueprint: &ProxyBlueprint) -> Result<(), ContractError> {
    for sub_hal in &blueprint.sub_hals {
        let mut seen = HashSet::new();
        for sensor in &sub_hal.sensors {
            let field = format!("sub_hals[{}].sensors[{}].handle", sub_hal.name, sensor.name);
            check_local_handle(sensor.handle)
                .map_err(|e| ContractError::config_validation(field.as_str(), e.to_string()))?;
            if !seen.insert(sensor.handle) {
                return Err(ContractError::config_validation(
                    field,
                    format!("duplicate handle {:#x}", sensor.handle),
                ));
            }
        }
    }
    Ok(())
}

fn validate_sinks(blueprint: &ProxyBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, sink) in blueprint.sinks.iter().enumerate() {
        if sink.name.is_empty() {
            return Err(ContractError::config_validation(
                format!("sinks[{idx}].name"),
                "sink name cannot be empty",
            ));
        }
        if !seen.insert(&sink.name) {
            return Err(ContractError::config_validation(
                format!("sinks[name={}]", sink.name),
                "duplicate sink name",
            ));
        }
    }
    Ok(())
}

fn validate_policy(blueprint: &ProxyBlueprint) -> Result<(), ContractError> {
    let policy = &blueprint.policy;
    if policy.aod_enabled && policy.aod_light_mode_node.as_os_str().is_empty() {
        return Err(ContractError::config_validation(
            "policy.aod_light_mode_node",
            "light-mode node cannot be empty while AOD is enabled",
        ));
    }
    Ok(())
}
