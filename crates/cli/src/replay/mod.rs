//! Recorded sub-HAL batches and replay bookkeeping.

mod stats;

pub use stats::ReplayStats;

use std::path::Path;

use contracts::{Event, ProxyBlueprint, SubHalIndex};
use serde::{Deserialize, Serialize};

use crate::error::{CliError, Result};

/// One recorded `post_events` call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayBatch {
    /// Name of the posting sub-HAL
    pub sub_hal: String,

    /// Events as the sub-HAL produced them (local handles)
    pub events: Vec<Event>,
}

/// Batches of one sub-HAL, in recorded order
#[derive(Debug)]
pub struct SubHalReplay {
    pub index: SubHalIndex,
    pub batches: Vec<Vec<Event>>,
}

/// Read a JSON list of recorded batches
pub fn load_batches(path: &Path) -> Result<Vec<ReplayBatch>> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| CliError::events_parse(path.display().to_string(), e.to_string()))
}

/// Group batches per sub-HAL, keeping recorded order within each sub-HAL
pub fn group_by_sub_hal(
    blueprint: &ProxyBlueprint,
    batches: Vec<ReplayBatch>,
) -> Result<Vec<SubHalReplay>> {
    let mut groups: Vec<SubHalReplay> = Vec::new();
    for batch in batches {
        let index = blueprint
            .sub_hal_index(&batch.sub_hal)
            .ok_or_else(|| CliError::unknown_sub_hal(&batch.sub_hal))?;

        match groups.iter_mut().find(|g| g.index == index) {
            Some(group) => group.batches.push(batch.events),
            None => groups.push(SubHalReplay {
                index,
                batches: vec![batch.events],
            }),
        }
    }
    Ok(groups)
}
