//! Game tuning and configuration
//!
//! Every physics and scoring constant lives here as a named field rather than
//! a magic number in the simulation. Defaults reproduce the classic feel on a
//! roughly 800x600 surface. Persisted separately from run state in
//! LocalStorage.

use serde::{Deserialize, Serialize};

/// Tunable game parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Arrows granted at the start of a run
    pub start_arrows: u32,
    /// Bow vertical speed in logical pixels per frame
    pub bow_speed: f32,
    /// Target vertical speed in logical pixels per frame
    pub target_speed: f32,
    /// Arrow horizontal speed in logical pixels per frame once launched
    pub arrow_speed: f32,

    /// Bow oscillation band inset, as a fraction of surface height per side
    pub bow_band_inset: f32,
    /// Target oscillation band inset (smaller means a wider band)
    pub target_band_inset: f32,
    /// Bow anchor x, as a fraction of surface width
    pub bow_margin: f32,
    /// Target anchor inset from the right edge, as a fraction of surface width
    pub target_margin: f32,

    /// Bow sprite height as a fraction of surface height
    pub bow_height_ratio: f32,
    /// Bow width / height
    pub bow_aspect: f32,
    /// Target sprite height as a fraction of surface height
    pub target_height_ratio: f32,
    /// Target width / height
    pub target_aspect: f32,
    /// Arrow length as a fraction of surface width
    pub arrow_length_ratio: f32,
    /// Arrow thickness as a fraction of surface height
    pub arrow_thickness_ratio: f32,

    /// Number of discrete scoring rings across the target's full height
    pub score_rings: u32,
    /// Points awarded for a dead-center hit
    pub max_points: u32,
    /// Minimum points that count as a near-bullseye
    pub bullseye_points: u32,
    /// Arrows granted per near-bullseye
    pub bonus_arrows: u32,
    /// Score that triggers the one-time bow speed-up
    pub escalation_threshold: u32,
    /// Bow speed multiplier applied at escalation
    pub escalation_factor: f32,

    /// Randomize the target's starting height and direction each run
    pub randomize_target: bool,
    /// Keyboard code that fires (matches `KeyboardEvent.code`)
    pub fire_key: String,
    /// Sound effect volume, 0.0 - 1.0
    pub sfx_volume: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            start_arrows: 10,
            bow_speed: 3.0,
            target_speed: 4.0,
            arrow_speed: 25.0,

            bow_band_inset: 0.15,
            target_band_inset: 0.10,
            bow_margin: 0.06,
            target_margin: 0.14,

            bow_height_ratio: 0.30,
            bow_aspect: 2.0 / 3.0,
            target_height_ratio: 0.27,
            target_aspect: 0.625,
            arrow_length_ratio: 0.12,
            arrow_thickness_ratio: 0.033,

            score_rings: 20,
            max_points: 10,
            bullseye_points: 9,
            bonus_arrows: 2,
            escalation_threshold: 20,
            escalation_factor: 1.5,

            randomize_target: true,
            fire_key: "Space".to_string(),
            sfx_volume: 0.5,
        }
    }
}

impl GameConfig {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "arrow_rush_config";

    /// Load config from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(config) = serde_json::from_str(&json) {
                    log::info!("Loaded config from LocalStorage");
                    return config;
                }
            }
        }

        log::info!("Using default config");
        Self::default()
    }

    /// Save config to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Config saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scoring_shape() {
        let config = GameConfig::default();
        assert_eq!(config.max_points, 10);
        assert_eq!(config.score_rings, 20);
        assert!(config.bullseye_points <= config.max_points);
    }

    #[test]
    fn test_config_round_trip() {
        let mut config = GameConfig::default();
        config.start_arrows = 25;
        config.fire_key = "Enter".to_string();

        let json = serde_json::to_string(&config).unwrap();
        let back: GameConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let back: GameConfig = serde_json::from_str(r#"{"start_arrows": 3}"#).unwrap();
        assert_eq!(back.start_arrows, 3);
        assert_eq!(back.arrow_speed, GameConfig::default().arrow_speed);
    }
}
