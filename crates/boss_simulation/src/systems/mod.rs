//! ECS-обвязка боя с боссом
//!
//! Порядок выполнения в FixedUpdate:
//! 1. tick_boss_encounters - тик босса + автоигрок, события смены стадии/победы
//! 2. dispatch_boss_effects - объявления из EffectBuffer → BossEffectEvent

use bevy::prelude::*;

pub mod encounter;

#[cfg(test)]
mod encounter_tests;

pub use encounter::{dispatch_boss_effects, tick_boss_encounters, AutoPlayer, BossEncounter};

use crate::boss::BossKind;
use crate::effects::BossEffectEvent;

/// Босс перешёл к следующей стадии
#[derive(Event, Debug, Clone, PartialEq)]
pub struct BossStageChanged {
    pub encounter: Entity,
    pub kind: BossKind,
    /// Имя новой стадии
    pub stage: &'static str,
    /// Сколько смен стадий уже было
    pub stage_changes: u32,
}

/// Машина состояний босса завершена (отправляется один раз)
#[derive(Event, Debug, Clone, PartialEq)]
pub struct BossDefeated {
    pub encounter: Entity,
    pub kind: BossKind,
    pub ticks: u64,
}

pub struct BossSimulationPlugin;

impl Plugin for BossSimulationPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<BossEffectEvent>()
            .add_event::<BossStageChanged>()
            .add_event::<BossDefeated>()
            .add_systems(
                FixedUpdate,
                (tick_boss_encounters, dispatch_boss_effects).chain(), // Эффекты строго после тика
            );
    }
}
