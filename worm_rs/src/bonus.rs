//! Bonus table and completion accounting.
//!
//! A bonus turns the completion count into an effect strength with
//! `g + (a - g) * exp(-k * completions^m)`: `a` at zero completions,
//! approaching `g` as completions grow. What the effect multiplies is up to
//! the host game.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, WormError};

/// Receives rewards of solved sessions.
pub trait RewardSink {
    fn apply_reward(&mut self, reward: f64);
}

/// One entry of the bonus table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bonus {
    pub id: u32,
    pub name: String,
    /// May contain `$INC$`, `$DEC$` or `$MUL$`, filled by [`Bonus::describe`].
    pub description: String,
    pub a: f64,
    pub g: f64,
    pub k: f64,
    pub m: f64,
}

impl Bonus {
    fn builtin(id: u32, name: &str, description: &str, g: f64, k: f64, m: f64) -> Self {
        Self {
            id,
            name: name.to_string(),
            description: description.to_string(),
            a: 1.0,
            g,
            k,
            m,
        }
    }

    pub fn effect(&self, completions: f64) -> f64 {
        effect_function(completions, self.a, self.g, self.k, self.m)
    }

    /// Description with the placeholders replaced by percentages.
    pub fn describe(&self, effect: f64) -> String {
        self.description
            .replace("$INC$", &format_percent(effect - 1.0))
            .replace("$DEC$", &format_percent(1.0 - effect))
            .replace("$MUL$", &format_percent(effect))
    }
}

pub fn effect_function(x: f64, a: f64, g: f64, k: f64, m: f64) -> f64 {
    g + (a - g) * (-k * x.max(0.0).powf(m)).exp()
}

fn format_percent(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}

/// The table shipped with the game.
pub fn default_bonuses() -> Vec<Bonus> {
    vec![
        Bonus {
            a: 0.0,
            ..Bonus::builtin(0, "None", "no benefit", 0.0, 0.0, 0.0)
        },
        Bonus::builtin(
            1,
            "Cardinal sin",
            "Increases crime money and success rate by +$INC$",
            1.2,
            0.007,
            0.8,
        ),
        Bonus::builtin(
            2,
            "Favorable appearance",
            "+$INC$ reputation from factions and companies",
            1.7,
            0.005,
            0.85,
        ),
        Bonus::builtin(
            3,
            "Synthetic black friday",
            "-$DEC$ hacknet costs, purchased server costs, home ram and home core costs",
            0.6,
            0.003,
            1.0,
        ),
        Bonus::builtin(
            4,
            "Increased mainframe voltage",
            "+$INC$ game cycles per process",
            1.05,
            0.007,
            0.8,
        ),
        Bonus::builtin(5, "Rapid assimilation", "Gain +$INC$ intelligence exp", 1.1, 0.007, 0.8),
        Bonus::builtin(
            6,
            "Temporal resonator",
            "Reduces the time between stock market updates by $DEC$",
            0.8,
            0.007,
            0.8,
        ),
        Bonus::builtin(
            7,
            "Recordless contracting",
            "Reduces the time needed to complete a bladeburner action by $DEC$",
            0.9,
            0.007,
            0.8,
        ),
    ]
}

/// Lookup over a configured bonus list.
#[derive(Debug, Clone, PartialEq)]
pub struct BonusTable {
    bonuses: Vec<Bonus>,
}

impl Default for BonusTable {
    fn default() -> Self {
        Self::new(default_bonuses())
    }
}

impl BonusTable {
    pub fn new(bonuses: Vec<Bonus>) -> Self {
        Self { bonuses }
    }

    pub fn all(&self) -> &[Bonus] {
        &self.bonuses
    }

    pub fn find(&self, id: u32) -> Result<&Bonus> {
        self.bonuses
            .iter()
            .find(|b| b.id == id)
            .ok_or_else(|| WormError::UnknownBonus {
                id,
                valid: self.bonuses.iter().map(|b| b.id.to_string()).collect(),
            })
    }
}

/// Player-side worm progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worm {
    pub completions: f64,
    pub bonus: Bonus,
}

impl Worm {
    pub fn new(table: &BonusTable) -> Self {
        let bonus = table
            .all()
            .first()
            .cloned()
            .unwrap_or_else(|| default_bonuses().remove(0));
        Self {
            completions: 0.0,
            bonus,
        }
    }

    pub fn set_bonus(&mut self, table: &BonusTable, id: u32) -> Result<()> {
        self.bonus = table.find(id)?.clone();
        info!(bonus = %self.bonus.name, "worm bonus changed");
        Ok(())
    }

    pub fn bonus_effect(&self) -> f64 {
        self.bonus.effect(self.completions)
    }
}

impl RewardSink for Worm {
    fn apply_reward(&mut self, reward: f64) {
        self.completions += reward;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effect_starts_at_a_and_approaches_g() {
        let table = BonusTable::default();
        let sin = table.find(1).expect("builtin");
        assert!((sin.effect(0.0) - 1.0).abs() < 1e-12);
        assert!(sin.effect(10.0) > 1.0);
        assert!(sin.effect(1e9) > 1.19 && sin.effect(1e9) <= 1.2);
        assert!(sin.effect(100.0) > sin.effect(10.0));
    }

    #[test]
    fn test_decreasing_bonus_description() {
        let table = BonusTable::default();
        let friday = table.find(3).expect("builtin");
        assert_eq!(
            friday.describe(0.75),
            "-25.00% hacknet costs, purchased server costs, home ram and home core costs"
        );
    }

    #[test]
    fn test_unknown_bonus_lists_valid_ids() {
        let table = BonusTable::default();
        let err = table.find(42).unwrap_err();
        assert_eq!(
            err.to_string(),
            "value \"42\" is not a valid bonus. Valid: 0, 1, 2, 3, 4, 5, 6, 7"
        );
    }

    #[test]
    fn test_worm_accumulates_rewards() {
        let table = BonusTable::default();
        let mut worm = Worm::new(&table);
        assert_eq!(worm.bonus.id, 0);
        worm.apply_reward(0.6);
        worm.apply_reward(1.0);
        assert!((worm.completions - 1.6).abs() < 1e-12);

        worm.set_bonus(&table, 2).expect("valid id");
        assert_eq!(worm.bonus.name, "Favorable appearance");
        assert!(worm.set_bonus(&table, 99).is_err());
        assert_eq!(worm.bonus.id, 2);
    }
}
