use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ai::Difficulty;
use crate::ship::ShipKind;

pub const BOARD_SIZE: usize = 10;
pub const NUM_SHIPS: usize = 5;
pub const FLEET: [ShipKind; NUM_SHIPS] = [
    ShipKind::Carrier,
    ShipKind::Battleship,
    ShipKind::Cruiser,
    ShipKind::Submarine,
    ShipKind::Destroyer,
];

/// Total number of ship segments in a full fleet.
pub const TOTAL_SHIP_CELLS: usize = 5 + 4 + 3 + 3 + 2;

/// Tunables for a session. Every field has a default, so a config file only
/// needs to name the values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Random (orientation, origin) draws per ship before giving up.
    pub placement_attempts: usize,
    /// Whole-fleet retries before falling back to best-effort placement.
    pub shuffle_attempts: usize,
    pub ai_delay_min_ms: u64,
    pub ai_delay_max_ms: u64,
    pub difficulty: Difficulty,
    /// Turn length enforced by the remote authority. Informational locally.
    pub turn_limit_secs: u64,
    pub game_limit_secs: u64,
    /// The computer opponent takes the opening shot.
    pub ai_first: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            placement_attempts: 1000,
            shuffle_attempts: 64,
            ai_delay_min_ms: 1000,
            ai_delay_max_ms: 3000,
            difficulty: Difficulty::Medium,
            turn_limit_secs: 30,
            game_limit_secs: 1200,
            ai_first: false,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        let config: EngineConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading {}: {}", path.display(), e))?;
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.ai_delay_min_ms > self.ai_delay_max_ms {
            anyhow::bail!(
                "ai_delay_min_ms ({}) exceeds ai_delay_max_ms ({})",
                self.ai_delay_min_ms,
                self.ai_delay_max_ms
            );
        }
        if self.placement_attempts == 0 || self.shuffle_attempts == 0 {
            anyhow::bail!("placement and shuffle attempts must be positive");
        }
        Ok(())
    }
}
