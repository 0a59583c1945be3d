//! Канал эффектов: AI сообщает "что произошло" для внешнего presentation-слоя.
//!
//! Вызовы синхронные и упорядоченные, AI никогда не читает результат.
//! Порядок (например summon-эффект до spawn-эффектов) - контракт вызывающего.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::geometry::Rgba;
use crate::parts::PartId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeleportKind {
    Out,
    FastOut,
    In,
    Failed,
}

/// Прочие перечислимые эффекты без собственной нагрузки
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MiscBossEffect {
    LaserSight,
    ItemLoading,
    ArmsRetracting,
    ShieldCracked,
    ShieldShatter,
    BulbExplosion,
    Glitch,
    FrozenInIce,
    /// Луч-притяжение от глаза к захваченному мячу
    AttractorBeam,
}

/// Эффекты, привязанные к части босса
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BossEffect {
    PowerCharge {
        part: PartId,
        time: f32,
        colour: Rgba,
        size: f32,
        offset: Vec3,
    },
    ExpandingHalo {
        part: PartId,
        time: f32,
        colour: Rgba,
        size: f32,
        offset: Vec3,
    },
    SparkBurst {
        part: PartId,
        time: f32,
        colour: Rgba,
        offset: Vec3,
    },
    ElectricitySpasm {
        part: PartId,
        time: f32,
        colour: Rgba,
    },
    Shockwave {
        part: PartId,
        time: f32,
        size: f32,
    },
    FullscreenFlash {
        time: f32,
        intensity: f32,
    },
    Teleport {
        kind: TeleportKind,
        position: Vec2,
        time: f32,
    },
    SummonPortals {
        part: PartId,
        time: f32,
        colour: Rgba,
        positions: Vec<Vec2>,
    },
    Misc {
        kind: MiscBossEffect,
        part: PartId,
        time: f32,
    },
}

/// Эффекты уровня (не привязаны к конкретной части)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeneralEffect {
    LevelShake {
        time: f32,
        direction: Vec2,
        magnitude: f32,
    },
    StarSmash {
        position: Vec2,
        direction: Vec2,
        size: f32,
    },
    ShortCircuit {
        position: Vec2,
        size: f32,
        time: f32,
    },
    BarrierBlockDisintegration {
        position: Vec2,
        direction: Vec2,
        time: f32,
    },
    Explosion {
        position: Vec2,
        size: f32,
    },
}

/// Записанный вызов sink'а
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Announcement {
    BossEffect(BossEffect),
    GeneralEffect(GeneralEffect),
    BossAngry { part: PartId },
    BossHurt { part: PartId },
    ClearActiveBossEffects,
}

pub trait EffectSink {
    fn announce_boss_effect(&mut self, effect: BossEffect);
    fn announce_general_effect(&mut self, effect: GeneralEffect);
    fn announce_boss_angry(&mut self, part: PartId);
    fn announce_boss_hurt(&mut self, part: PartId);
    fn clear_active_boss_effects(&mut self);
}

/// Sink, складывающий объявления по порядку (ECS-плагин, тесты)
#[derive(Debug, Clone, Default)]
pub struct EffectBuffer {
    pub announcements: Vec<Announcement>,
}

impl EffectBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&mut self) -> Vec<Announcement> {
        std::mem::take(&mut self.announcements)
    }

    pub fn len(&self) -> usize {
        self.announcements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.announcements.is_empty()
    }

    pub fn boss_effects(&self) -> impl Iterator<Item = &BossEffect> {
        self.announcements.iter().filter_map(|a| match a {
            Announcement::BossEffect(effect) => Some(effect),
            _ => None,
        })
    }

    pub fn general_effects(&self) -> impl Iterator<Item = &GeneralEffect> {
        self.announcements.iter().filter_map(|a| match a {
            Announcement::GeneralEffect(effect) => Some(effect),
            _ => None,
        })
    }

    pub fn count_hurt(&self) -> usize {
        self.announcements
            .iter()
            .filter(|a| matches!(a, Announcement::BossHurt { .. }))
            .count()
    }

    pub fn count_angry(&self) -> usize {
        self.announcements
            .iter()
            .filter(|a| matches!(a, Announcement::BossAngry { .. }))
            .count()
    }
}

impl EffectSink for EffectBuffer {
    fn announce_boss_effect(&mut self, effect: BossEffect) {
        self.announcements.push(Announcement::BossEffect(effect));
    }

    fn announce_general_effect(&mut self, effect: GeneralEffect) {
        self.announcements.push(Announcement::GeneralEffect(effect));
    }

    fn announce_boss_angry(&mut self, part: PartId) {
        self.announcements.push(Announcement::BossAngry { part });
    }

    fn announce_boss_hurt(&mut self, part: PartId) {
        self.announcements.push(Announcement::BossHurt { part });
    }

    fn clear_active_boss_effects(&mut self) {
        self.announcements.push(Announcement::ClearActiveBossEffects);
    }
}

/// ECS event: одно объявление от босса конкретной entity
#[derive(Event, Debug, Clone)]
pub struct BossEffectEvent {
    pub encounter: Entity,
    pub announcement: Announcement,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_preserves_order() {
        let mut buffer = EffectBuffer::new();
        buffer.announce_boss_effect(BossEffect::SummonPortals {
            part: PartId(3),
            time: 2.0,
            colour: Rgba::WHITE,
            positions: vec![Vec2::ZERO],
        });
        buffer.announce_general_effect(GeneralEffect::Explosion {
            position: Vec2::ZERO,
            size: 1.0,
        });
        buffer.announce_boss_hurt(PartId(3));

        assert_eq!(buffer.len(), 3);
        assert!(matches!(
            buffer.announcements[0],
            Announcement::BossEffect(BossEffect::SummonPortals { .. })
        ));
        assert_eq!(buffer.count_hurt(), 1);

        let drained = buffer.drain();
        assert_eq!(drained.len(), 3);
        assert!(buffer.is_empty());
    }
}
