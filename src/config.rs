//! Tunables. Every field has a default so a game file may omit `config`
//! entirely or override only what it needs.

use serde::{Deserialize, Serialize};

pub const DEFAULT_STORAGE_KEY: &str = "veil_quest_progress_v4";
pub const DEFAULT_ROOMS_STORAGE_KEY: &str = "veil_quest_rooms_v1";
pub const DEFAULT_STILLNESS_SECONDS: u32 = 120;
pub const DEFAULT_CHOOSE_COUNT: usize = 3;
pub const DEFAULT_COUPON_COUNT: usize = 8;
pub const DEFAULT_WORD: &str = "PINEAPPLE";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QuestConfig {
    pub storage_key: String,
    pub rooms_storage_key: String,
    /// Acceleration magnitude (m/s², gravity excluded) counted as a shake.
    pub shake_threshold: f64,
    /// Minimum gap between two shake-triggered rolls.
    pub shake_cooldown_ms: f64,
    pub stillness_seconds: u32,
    pub choose_count: usize,
    pub coupon_count: usize,
    pub hint_cost: u32,
    pub starting_obols: u32,
    pub obols_base: u32,
    pub obols_high: u32,
    pub obols_top: u32,
}

impl Default for QuestConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            rooms_storage_key: DEFAULT_ROOMS_STORAGE_KEY.to_string(),
            shake_threshold: 15.0,
            shake_cooldown_ms: 1200.0,
            stillness_seconds: DEFAULT_STILLNESS_SECONDS,
            choose_count: DEFAULT_CHOOSE_COUNT,
            coupon_count: DEFAULT_COUPON_COUNT,
            hint_cost: 1,
            starting_obols: 2,
            obols_base: 1,
            obols_high: 2,
            obols_top: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg: QuestConfig = serde_json::from_str(r#"{"hintCost": 2}"#).unwrap();
        assert_eq!(cfg.hint_cost, 2);
        assert_eq!(cfg.storage_key, DEFAULT_STORAGE_KEY);
        assert_eq!(cfg.stillness_seconds, 120);
    }
}
