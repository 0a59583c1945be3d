//! Общая основа AI боссов: окружение стадии, capability-trait и закрытый enum стадий.
//!
//! Каждая стадия - отдельная структура с собственным enum под-состояний.
//! `BossAi` диспетчеризует к ним через `BossAiStage` (без цепочек наследования).

use bevy::prelude::*;

use crate::archetypes::classical::ClassicalAi;
use crate::archetypes::deco::DecoAi;
use crate::archetypes::futurism::FuturismAi;
use crate::archetypes::gothic::GothicAi;
use crate::archetypes::nouveau::NouveauAi;
use crate::boss::Boss;
use crate::context::{BossContext, ProjectileKind};
use crate::effects::EffectSink;
use crate::parts::PartId;
use crate::random::RandomSource;

pub mod motion;

#[cfg(test)]
mod motion_tests;

pub use motion::{furthest_positions, keep_inside_level, Motion, DEFAULT_TARGET_ERROR_SQ};

/// Всё, что стадия получает извне на один вызов
pub struct BossEnv<'a> {
    pub ctx: &'a mut dyn BossContext,
    pub rng: &'a mut dyn RandomSource,
    pub sink: &'a mut dyn EffectSink,
}

impl<'a> BossEnv<'a> {
    pub fn new(ctx: &'a mut dyn BossContext, rng: &'a mut dyn RandomSource, sink: &'a mut dyn EffectSink) -> Self {
        Self { ctx, rng, sink }
    }
}

/// Чем можно ранить часть в текущем состоянии
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageChannel {
    Ball,
    Projectile(ProjectileKind),
    TeslaArc,
    /// Взрыв мины рядом с частью
    MineExplosion,
}

/// Общий набор возможностей любой стадии
pub trait BossAiStage {
    fn update(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv);

    fn on_ball_collision(&mut self, _boss: &mut Boss, _part: PartId, _env: &mut BossEnv) {}

    fn on_projectile_collision(
        &mut self,
        _boss: &mut Boss,
        _kind: ProjectileKind,
        _part: PartId,
        _env: &mut BossEnv,
    ) {
    }

    /// По умолчанию луч ранит только weakpoint-части
    fn on_beam_collision(
        &mut self,
        boss: &mut Boss,
        part: PartId,
        dt: f32,
        damage_per_second: f32,
        env: &mut BossEnv,
    ) {
        if boss.parts().is_weakpoint(part) {
            boss.beam_hit_weakpoint(part, dt, damage_per_second, env.sink);
        }
    }

    fn on_tesla_arc_hit(&mut self, _boss: &mut Boss, _part: PartId, _env: &mut BossEnv) {}

    /// Взрыв мины игрока: круг `radius` вокруг `center`
    fn on_mine_explosion(&mut self, _boss: &mut Boss, _center: Vec2, _radius: f32, _env: &mut BossEnv) {}

    /// Оставшаяся жизнь всего босса (0..1), а не только текущей стадии
    fn total_life_percent(&self, boss: &Boss) -> f32;

    fn is_finished(&self) -> bool {
        false
    }

    fn stage_name(&self) -> &'static str;

    fn state_name(&self) -> &'static str;

    fn vulnerable_parts(&self, _boss: &Boss) -> Vec<(PartId, DamageChannel)> {
        Vec::new()
    }

    fn can_hurt_paddle_with_body(&self) -> bool {
        false
    }
}

/// Текущая стадия босса (ровно одна живая)
#[derive(Debug)]
pub enum BossAi {
    Classical(ClassicalAi),
    Gothic(GothicAi),
    Deco(DecoAi),
    Futurism(FuturismAi),
    Nouveau(NouveauAi),
}

impl BossAi {
    pub fn as_stage(&self) -> &dyn BossAiStage {
        match self {
            BossAi::Classical(ai) => ai,
            BossAi::Gothic(ai) => ai,
            BossAi::Deco(ai) => ai,
            BossAi::Futurism(ai) => ai,
            BossAi::Nouveau(ai) => ai,
        }
    }

    pub fn as_stage_mut(&mut self) -> &mut dyn BossAiStage {
        match self {
            BossAi::Classical(ai) => ai,
            BossAi::Gothic(ai) => ai,
            BossAi::Deco(ai) => ai,
            BossAi::Futurism(ai) => ai,
            BossAi::Nouveau(ai) => ai,
        }
    }
}

/// Вероятность призыва по числу атак с последнего призыва: 0 → 50% → 80% → 100%
pub fn summon_probability(attacks_since_last_summon: u32) -> f32 {
    match attacks_since_last_summon {
        0 => 0.0,
        1 => 0.5,
        2 => 0.8,
        _ => 1.0,
    }
}

/// Выбор по весам; нулевая сумма весов → первый вариант
pub fn pick_weighted<T: Copy>(rng: &mut dyn RandomSource, options: &[(T, f32)]) -> Option<T> {
    let total: f32 = options.iter().map(|(_, w)| w.max(0.0)).sum();
    let first = options.first().map(|(value, _)| *value)?;
    if total <= 0.0 {
        return Some(first);
    }

    let mut roll = rng.random_zero_to_one() * total;
    for (value, weight) in options {
        let weight = weight.max(0.0);
        if roll <= weight && weight > 0.0 {
            return Some(*value);
        }
        roll -= weight;
    }
    options.iter().rev().find(|(_, w)| *w > 0.0).map(|(value, _)| *value)
}

/// Случайный элемент (по `random_unsigned`)
pub fn pick_index(rng: &mut dyn RandomSource, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(rng.random_unsigned() as usize % len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::ScriptedRandom;

    #[test]
    fn test_summon_probability_ramp() {
        assert_eq!(summon_probability(0), 0.0);
        assert_eq!(summon_probability(1), 0.5);
        assert_eq!(summon_probability(2), 0.8);
        assert_eq!(summon_probability(3), 1.0);
        assert_eq!(summon_probability(17), 1.0);
    }

    #[test]
    fn test_pick_weighted_respects_weights() {
        let options = [("a", 1.0), ("b", 0.0), ("c", 3.0)];
        let mut low = ScriptedRandom::constant(0, 0.1);
        assert_eq!(pick_weighted(&mut low, &options), Some("a"));
        let mut high = ScriptedRandom::constant(0, 0.9);
        assert_eq!(pick_weighted(&mut high, &options), Some("c"));
        let mut exact = ScriptedRandom::constant(0, 1.0);
        assert_eq!(pick_weighted(&mut exact, &options), Some("c"), "вес 0 никогда не выбирается");
    }

    #[test]
    fn test_pick_weighted_empty() {
        let mut rng = ScriptedRandom::new();
        let options: [(u8, f32); 0] = [];
        assert_eq!(pick_weighted(&mut rng, &options), None);
    }

    #[test]
    fn test_pick_index_wraps() {
        let mut rng = ScriptedRandom::new().with_unsigned(vec![7]);
        assert_eq!(pick_index(&mut rng, 3), Some(1));
        assert_eq!(pick_index(&mut rng, 0), None);
    }
}
