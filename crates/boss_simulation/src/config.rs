//! Конфигурация боя с боссом.
//!
//! Геймплейные константы архетипов живут рядом с архетипами, здесь - только
//! общие размеры уровня/paddle и параметры прогона симуляции.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::boss::BossKind;

/// Размер одного блока уровня (все расстояния в "level units")
pub const PIECE_WIDTH: f32 = 2.5;
pub const PIECE_HEIGHT: f32 = 1.0;
pub const HALF_PIECE_WIDTH: f32 = PIECE_WIDTH / 2.0;
pub const HALF_PIECE_HEIGHT: f32 = PIECE_HEIGHT / 2.0;

/// Скорость/ускорение paddle по умолчанию - от них масштабируются скорости боссов
pub const PADDLE_DEFAULT_MAX_SPEED: f32 = 24.0;
pub const PADDLE_DEFAULT_ACCELERATION: f32 = 125.0;

/// Параметры одного headless-прогона
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterConfig {
    /// Seed для DeterministicRng
    pub seed: u64,
    /// Какой босс участвует в бою
    pub boss_kind: BossKind,
    /// Ширина уровня (level units)
    pub level_width: f32,
    /// Высота уровня (level units)
    pub level_height: f32,
    /// Частота FixedUpdate (Hz)
    pub fixed_hz: f64,
    /// Сколько тиков крутить в headless-бинарнике
    pub max_ticks: u32,
    pub paddle_max_speed: f32,
    pub paddle_acceleration: f32,
}

impl EncounterConfig {
    /// Конфиг с размером уровня, под который сделан этот босс
    pub fn for_boss(boss_kind: BossKind) -> Self {
        let (level_width, level_height) = boss_kind.default_level_size();
        Self {
            seed: 42,
            boss_kind,
            level_width,
            level_height,
            fixed_hz: 60.0,
            max_ticks: 3600, // 1 минута боя на 60Hz
            paddle_max_speed: PADDLE_DEFAULT_MAX_SPEED,
            paddle_acceleration: PADDLE_DEFAULT_ACCELERATION,
        }
    }

    pub fn fixed_dt(&self) -> f32 {
        (1.0 / self.fixed_hz) as f32
    }
}

impl Default for EncounterConfig {
    fn default() -> Self {
        Self::for_boss(BossKind::Classical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encounter_config_default() {
        let config = EncounterConfig::default();
        assert_eq!(config.seed, 42);
        assert_eq!(config.boss_kind, BossKind::Classical);
        assert_eq!(config.fixed_hz, 60.0);
        assert!(config.level_width > 0.0 && config.level_height > 0.0);
        assert_eq!(config.paddle_max_speed, PADDLE_DEFAULT_MAX_SPEED);
    }

    #[test]
    fn test_futurism_uses_wide_level() {
        let config = EncounterConfig::for_boss(BossKind::Futurism);
        assert_eq!((config.level_width, config.level_height), (67.5, 36.0));
    }

    #[test]
    fn test_fixed_dt_matches_hz() {
        let config = EncounterConfig::for_boss(BossKind::Deco);
        assert!((config.fixed_dt() - 1.0 / 60.0).abs() < 1e-6);
    }
}
