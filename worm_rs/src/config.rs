//! Configuration file support.
//!
//! Loads optional `.worm/config.toml` from a root directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::bonus::{Bonus, BonusTable, default_bonuses};
use crate::error::{Result, WormError};
use crate::session::Scoring;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WormConfig {
    /// Maximum number of concurrently active sessions.
    pub max_sessions: usize,
    pub create_cooldown_ms: u64,
    pub solve_cooldown_ms: u64,
    /// Finished sessions kept for inspection; the oldest are dropped first.
    pub history_capacity: usize,
    /// Traversal delay for one thread at zero intelligence.
    pub base_guess_time_ms: u64,
    /// Share of the reward kept no matter how many tests were run.
    pub reward_floor: f64,
    pub reward_exponent: f64,
    /// Fresh graphs tried per session before giving up.
    pub generation_attempts: u32,
    pub bonuses: Vec<Bonus>,
}

impl Default for WormConfig {
    fn default() -> Self {
        Self {
            max_sessions: 4,
            create_cooldown_ms: 5_000,
            solve_cooldown_ms: 30_000,
            history_capacity: 50,
            base_guess_time_ms: 10 * 60 * 1000,
            reward_floor: 0.1,
            reward_exponent: 2.0,
            generation_attempts: 16,
            bonuses: default_bonuses(),
        }
    }
}

impl WormConfig {
    pub fn config_path(root: &Path) -> PathBuf {
        root.join(".worm").join("config.toml")
    }

    /// Load config from `.worm/config.toml` in the given root directory.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load(root: &Path) -> Self {
        Self::load_from_path(&Self::config_path(root))
    }

    /// Load config from a specific path, falling back to defaults.
    pub fn load_from_path(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::try_load_from_path(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("{e}; using default configuration");
                Self::default()
            }
        }
    }

    /// Strict variant of [`WormConfig::load_from_path`].
    pub fn try_load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| WormError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| WormError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn bonus_table(&self) -> BonusTable {
        BonusTable::new(self.bonuses.clone())
    }

    /// Penalty curve, with out-of-range values replaced by the defaults.
    pub fn scoring(&self) -> Scoring {
        let defaults = Scoring::default();
        let floor = if self.reward_floor.is_nan() {
            warn!("reward_floor is NaN; using {}", defaults.floor);
            defaults.floor
        } else {
            self.reward_floor.clamp(0.0, 1.0)
        };
        let exponent = if self.reward_exponent.is_finite() && self.reward_exponent > 0.0 {
            self.reward_exponent
        } else {
            warn!(
                "reward_exponent {} must be finite and positive; using {}",
                self.reward_exponent, defaults.exponent
            );
            defaults.exponent
        };
        Scoring { floor, exponent }
    }

    /// Delay before a traversal test answers.
    ///
    /// `base / (threads * (1 + intelligence^0.8 / 600))`, threads clamped to 1.
    pub fn guess_time(&self, threads: u32, intelligence: f64) -> Duration {
        let intelligence_bonus = 1.0 + intelligence.max(0.0).powf(0.8) / 600.0;
        let ms = self.base_guess_time_ms as f64 / (f64::from(threads.max(1)) * intelligence_bonus);
        Duration::from_secs_f64(ms / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_config(temp: &TempDir, body: &str) {
        let dir = temp.path().join(".worm");
        std::fs::create_dir_all(&dir).expect("create .worm");
        let mut file = std::fs::File::create(dir.join("config.toml")).expect("create config");
        writeln!(file, "{body}").expect("write config");
    }

    #[test]
    fn test_default_config() {
        let config = WormConfig::default();
        assert_eq!(config.max_sessions, 4);
        assert_eq!(config.history_capacity, 50);
        assert_eq!(config.bonuses.len(), 8);
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().expect("temp dir");
        assert_eq!(WormConfig::load(temp.path()), WormConfig::default());
    }

    #[test]
    fn test_load_partial_config_keeps_other_defaults() {
        let temp = TempDir::new().expect("temp dir");
        write_config(
            &temp,
            r#"
max_sessions = 9
solve_cooldown_ms = 0

[[bonuses]]
id = 3
name = "Only one"
description = "x $MUL$"
a = 1.0
g = 2.0
k = 0.1
m = 1.0
"#,
        );

        let config = WormConfig::load(temp.path());
        assert_eq!(config.max_sessions, 9);
        assert_eq!(config.solve_cooldown_ms, 0);
        assert_eq!(config.create_cooldown_ms, 5_000);
        assert_eq!(config.bonuses.len(), 1);
        assert!(config.bonus_table().find(3).is_ok());
    }

    #[test]
    fn test_invalid_config_falls_back() {
        let temp = TempDir::new().expect("temp dir");
        write_config(&temp, "max_sessions = \"many\"");

        let path = WormConfig::config_path(temp.path());
        assert_eq!(WormConfig::load_from_path(&path), WormConfig::default());
        assert!(matches!(
            WormConfig::try_load_from_path(&path),
            Err(WormError::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_guess_time_scales_with_threads_and_intelligence() {
        let config = WormConfig::default();
        assert_eq!(config.guess_time(1, 0.0), Duration::from_secs(600));
        assert_eq!(config.guess_time(0, 0.0), Duration::from_secs(600));
        assert_eq!(config.guess_time(4, 0.0), Duration::from_secs(150));
        assert!(config.guess_time(1, 500.0) < Duration::from_secs(600));
    }

    #[test]
    fn test_bad_exponent_keeps_penalty_above_floor() {
        for body in ["reward_exponent = -1.0", "reward_exponent = 0.0", "reward_exponent = nan"] {
            let config: WormConfig = toml::from_str(body).expect("valid toml");
            let scoring = config.scoring();
            assert_eq!(scoring.exponent, 2.0, "{body}");
            let penalty = scoring.penalty(1, 40);
            assert!((0.1..=1.0).contains(&penalty), "{body}: {penalty}");
        }
    }

    #[test]
    fn test_floor_is_clamped() {
        let config: WormConfig = toml::from_str("reward_floor = 1.5").expect("valid toml");
        assert_eq!(config.scoring().floor, 1.0);
        let config: WormConfig = toml::from_str("reward_floor = -0.5").expect("valid toml");
        assert_eq!(config.scoring().floor, 0.0);
    }
}
