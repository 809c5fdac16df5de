//! Process-wide constants shared by the resource model and strategy framework.

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// The raw, possibly-partial form of [`Constants`] as read from a YAML file; every field is
/// optional so a caller can override just the constants they care about and fall back to the
/// reference defaults for the rest.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Default)]
pub struct ConstantsRaw {
    /// See [`Constants::save_time`].
    pub save_time: Option<u64>,
    /// See [`Constants::restore_time`].
    pub restore_time: Option<u64>,
    /// See [`Constants::network_bw`].
    pub network_bw: Option<u64>,
    /// See [`Constants::patching_time`].
    pub patching_time: Option<u64>,
}

/// The four process-wide constants that parameterize migration timing and (for datasets that
/// lack per-server patch/sanity durations) the legacy flat patch time.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Copy)]
pub struct Constants {
    /// Time to checkpoint a VM before migrating it, in ticks.
    pub save_time: u64,
    /// Time to restore a VM on its destination, in ticks.
    pub restore_time: u64,
    /// Migration bandwidth, in MB per tick.
    pub network_bw: u64,
    /// Legacy flat patch time. Unused by this crate's loader, which always expects per-server
    /// `patch_duration`/`sanity_check_duration`; carried for dataset-format completeness.
    pub patching_time: u64,
}

impl Constants {
    /// Reference defaults, within the ranges named in the external-interfaces table.
    pub fn new() -> Self {
        Self {
            save_time: 30,
            restore_time: 30,
            network_bw: 125,
            patching_time: 360,
        }
    }

    /// Reads constants from a YAML file, filling in any field the file omits with the default
    /// from [`Constants::new`].
    pub fn from_file(path: &str) -> Result<Self, SimError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| SimError::MalformedDataset(format!("can't read constants file {path:?}: {e}")))?;
        let raw: ConstantsRaw = serde_yaml::from_str(&text)
            .map_err(|e| SimError::MalformedDataset(format!("can't parse constants YAML {path:?}: {e}")))?;
        let default = Self::new();
        Ok(Self {
            save_time: raw.save_time.unwrap_or(default.save_time),
            restore_time: raw.restore_time.unwrap_or(default.restore_time),
            network_bw: raw.network_bw.unwrap_or(default.network_bw),
            patching_time: raw.patching_time.unwrap_or(default.patching_time),
        })
    }
}

impl Default for Constants {
    fn default() -> Self {
        Self::new()
    }
}
