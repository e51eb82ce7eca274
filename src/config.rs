//! Session configuration
//!
//! Loaded once from JSON (everything optional, missing fields fall back to
//! defaults) and validated before a [`Session`](crate::session::Session) is
//! built from it.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::Error;
use crate::core::time::TICKS_PER_SECOND;
use crate::core::types::Result;

/// Tunables for discovery, inspection and felling.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FellingConfig {
    /// Durability consumed per felled log before the unbreaking reduction.
    pub durability_damage_per_block: u32,
    /// Hard ceiling on the number of nodes in a discovered tree.
    pub chop_limit: usize,
    /// Block ids always treated as logs.
    pub included_logs: Vec<String>,
    /// Block ids never treated as logs. Wins over `included_logs`.
    pub excluded_logs: Vec<String>,
    /// Simulated seconds before an inspection record expires.
    pub marker_despawn_secs: u32,
    /// Host tick rate.
    pub ticks_per_second: u32,
    /// Maximum job steps executed per tick.
    pub steps_per_tick: usize,
    /// Wall-clock slice per tick in milliseconds; 0 disables the check.
    pub tick_slice_ms: u64,
    /// Items per dropped stack.
    pub stack_size: u32,
    /// Ticks during which a repeated probe from the same actor is ignored.
    pub probe_cooldown_ticks: u64,
    /// Largest vertical distance merged into one ranged removal.
    pub max_vertical_gap: i32,
    /// Pause between removal batches.
    pub immersive_mode: bool,
    /// Length of the pause in ticks when `immersive_mode` is on.
    pub immersive_delay_ticks: u64,
    /// Spawn block outline markers for probed trees.
    pub spawn_probe_markers: bool,
}

impl Default for FellingConfig {
    fn default() -> Self {
        Self {
            durability_damage_per_block: 3,
            chop_limit: 1500,
            included_logs: Vec::new(),
            excluded_logs: Vec::new(),
            marker_despawn_secs: 5,
            ticks_per_second: TICKS_PER_SECOND,
            steps_per_tick: 256,
            tick_slice_ms: 4,
            stack_size: 64,
            probe_cooldown_ticks: 5,
            max_vertical_gap: 1,
            immersive_mode: false,
            immersive_delay_ticks: 5,
            spawn_probe_markers: true,
        }
    }
}

impl FellingConfig {
    /// Parse a config from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: FellingConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load a config file without blocking the runtime.
    pub async fn load_async(path: impl AsRef<Path>) -> Result<Self> {
        let json = tokio::fs::read_to_string(path).await?;
        Self::from_json(&json)
    }

    /// Write the config as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Reject values that would make every operation a no-op or divide by zero.
    pub fn validate(&self) -> Result<()> {
        if self.chop_limit == 0 {
            return Err(Error::Config("chop_limit must be at least 1".into()));
        }
        if self.stack_size == 0 {
            return Err(Error::Config("stack_size must be at least 1".into()));
        }
        if self.steps_per_tick == 0 {
            return Err(Error::Config("steps_per_tick must be at least 1".into()));
        }
        if self.ticks_per_second == 0 {
            return Err(Error::Config("ticks_per_second must be at least 1".into()));
        }
        if self.max_vertical_gap < 1 {
            return Err(Error::Config("max_vertical_gap must be at least 1".into()));
        }
        Ok(())
    }

    /// Ticks before an inspection record expires.
    pub fn expiry_ticks(&self) -> u64 {
        self.marker_despawn_secs as u64 * self.ticks_per_second as u64
    }
}
