//! Boss Simulation Core
//!
//! Многостадийные боссы для brick-breaker: дерево частей, weakpoints,
//! иерархические FSM по архетипам (Classical, GothicRomantic, Deco, Futurism, Nouveau).
//!
//! Слои:
//! - `parts` / `boss` - модель тела (arena + PartId), без знания об AI
//! - `ai` / `archetypes` - стадии и состояния, говорят с миром через `BossContext`
//! - `effects` - объявления для presentation-слоя
//! - `systems` - Bevy ECS обвязка (FixedUpdate 60Hz, детерминированный RNG)

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod ai;
pub mod anim;
pub mod archetypes;
pub mod boss;
pub mod config;
pub mod context;
pub mod effects;
pub mod error;
pub mod geometry;
pub mod logger;
pub mod parts;
pub mod random;
pub mod systems;

// Re-export для удобства
pub use ai::{BossAi, BossAiStage, BossEnv, DamageChannel};
pub use boss::{Boss, BossKind, BossStatus};
pub use config::EncounterConfig;
pub use context::{BossContext, HeadlessGameModel, ProjectileKind};
pub use effects::{Announcement, BossEffect, BossEffectEvent, EffectBuffer, EffectSink, GeneralEffect};
pub use error::BossError;
pub use parts::{PartArena, PartId};
pub use random::{RandomSource, ScriptedRandom};
pub use systems::{AutoPlayer, BossDefeated, BossEncounter, BossSimulationPlugin, BossStageChanged};

use logger::init_logger;

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
///
/// Время двигается вручную ровно на один fixed-тик за `app.update()`
/// (первый update только инициализирует часы).
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(60.0)) // 60Hz FixedUpdate
        .insert_resource(bevy::time::TimeUpdateStrategy::ManualDuration(
            std::time::Duration::from_secs_f64(1.0 / 60.0),
        ));

    app
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    // Сериализуем в байты через Debug (простейший способ)
    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
