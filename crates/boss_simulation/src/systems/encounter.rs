//! Бой с боссом как ECS-компонент.

use bevy::prelude::*;

use super::{BossDefeated, BossStageChanged};
use crate::ai::{pick_index, BossEnv, DamageChannel};
use crate::archetypes::futurism::barrier_column;
use crate::boss::{Boss, BossKind, BossStatus};
use crate::config::EncounterConfig;
use crate::context::{HeadlessGameModel, MINE_EXPLOSION_RADIUS};
use crate::effects::{BossEffectEvent, EffectBuffer};
use crate::logger::{log, log_info};
use crate::random::RandomSource;
use crate::DeterministicRng;

/// Один бой: босс, окружающий его уровень и накопленные объявления эффектов
#[derive(Component, Debug)]
pub struct BossEncounter {
    pub boss: Boss,
    pub model: HeadlessGameModel,
    pub effects: EffectBuffer,
    pub ticks: u64,
    /// Сколько снарядов босс выпустил за бой
    pub projectiles_spawned: u64,
    last_stage_changes: u32,
    defeat_reported: bool,
}

impl BossEncounter {
    pub fn new(config: &EncounterConfig, rng: &mut dyn RandomSource) -> Self {
        let boss = Boss::spawn(config.boss_kind, config.level_width, config.level_height, rng);

        let mut model = HeadlessGameModel::new(config.level_width, config.level_height);
        model.paddle_max_speed = config.paddle_max_speed;
        model.paddle_acceleration = config.paddle_acceleration;
        if config.boss_kind == BossKind::Futurism {
            // Колонна между под-аренами, которую босс разрушает во второй стадии
            let (x, top_y, count) = barrier_column();
            model = model.with_barrier(x, top_y, count);
        }

        log_info(&format!(
            "Encounter: {} boss on {}x{} level ({} / {})",
            config.boss_kind.name(),
            config.level_width,
            config.level_height,
            boss.stage_name(),
            boss.state_name()
        ));

        Self {
            boss,
            model,
            effects: EffectBuffer::new(),
            ticks: 0,
            projectiles_spawned: 0,
            last_stage_changes: 0,
            defeat_reported: false,
        }
    }

    pub fn status(&self) -> BossStatus {
        self.boss.status()
    }

    pub fn is_defeated(&self) -> bool {
        self.defeat_reported
    }
}

/// Упрощённый игрок: раз в `hit_interval` секунд попадает в случайную
/// уязвимую часть тем, чем её сейчас можно ранить.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct AutoPlayer {
    pub hit_interval: f32,
    countdown: f32,
    pub hits: u32,
}

impl AutoPlayer {
    pub fn new(hit_interval: f32) -> Self {
        Self {
            hit_interval,
            countdown: hit_interval,
            hits: 0,
        }
    }

    /// `true` если в этот тик был удар
    pub fn tick(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) -> bool {
        self.countdown -= dt;
        if self.countdown > 0.0 {
            return false;
        }
        self.countdown = self.hit_interval;

        let targets = boss.vulnerable_parts();
        let Some((part, channel)) = pick_index(env.rng, targets.len()).and_then(|idx| targets.get(idx).copied())
        else {
            return false;
        };
        match channel {
            DamageChannel::Ball => boss.on_ball_collision(part, env),
            DamageChannel::Projectile(kind) => boss.on_projectile_collision(kind, part, env),
            DamageChannel::TeslaArc => boss.on_tesla_arc_hit(part, env),
            DamageChannel::MineExplosion => {
                // Мина взрывается в центре части
                let center = boss.parts().world_aabb(part).map(|a| a.center());
                match center {
                    Some(center) => boss.on_mine_explosion(center, MINE_EXPLOSION_RADIUS, env),
                    None => return false,
                }
            }
        }
        self.hits += 1;
        log(&format!("AutoPlayer: hit {:?} via {:?}", part, channel));
        true
    }
}

impl Default for AutoPlayer {
    fn default() -> Self {
        Self::new(0.75)
    }
}

/// Тик всех боёв: босс → автоигрок → "физика" уровня → события
pub fn tick_boss_encounters(
    time: Res<Time<Fixed>>,
    mut rng: ResMut<DeterministicRng>,
    mut encounters: Query<(
        Entity,
        &mut BossEncounter,
        Option<&mut AutoPlayer>,
        Option<&mut BossStatus>,
    )>,
    mut stage_events: EventWriter<BossStageChanged>,
    mut defeated_events: EventWriter<BossDefeated>,
) {
    let dt = time.delta_secs();

    for (entity, mut encounter, auto_player, status) in encounters.iter_mut() {
        let enc: &mut BossEncounter = &mut encounter;

        {
            let mut env = BossEnv::new(&mut enc.model, &mut *rng, &mut enc.effects);
            enc.boss.update(dt, &mut env);
            if let Some(mut player) = auto_player {
                player.tick(dt, &mut enc.boss, &mut env);
            }
        }

        enc.model.advance(dt);
        enc.projectiles_spawned += enc.model.projectiles.len() as u64;
        enc.model.clear_spawned();
        enc.ticks += 1;

        let stage_changes = enc.boss.stage_changes();
        if stage_changes != enc.last_stage_changes {
            enc.last_stage_changes = stage_changes;
            stage_events.write(BossStageChanged {
                encounter: entity,
                kind: enc.boss.kind(),
                stage: enc.boss.stage_name(),
                stage_changes,
            });
        }

        if enc.boss.is_finished() && !enc.defeat_reported {
            enc.defeat_reported = true;
            log_info(&format!(
                "Encounter {:?}: {} boss defeated after {} ticks",
                entity,
                enc.boss.kind().name(),
                enc.ticks
            ));
            defeated_events.write(BossDefeated {
                encounter: entity,
                kind: enc.boss.kind(),
                ticks: enc.ticks,
            });
        }

        if let Some(mut status) = status {
            *status = enc.boss.status();
        }
    }
}

/// Объявления эффектов → BossEffectEvent (в порядке объявления)
pub fn dispatch_boss_effects(
    mut encounters: Query<(Entity, &mut BossEncounter)>,
    mut effect_events: EventWriter<BossEffectEvent>,
) {
    for (entity, mut encounter) in encounters.iter_mut() {
        if encounter.effects.is_empty() {
            continue;
        }
        for announcement in encounter.effects.drain() {
            effect_events.write(BossEffectEvent {
                encounter: entity,
                announcement,
            });
        }
    }
}
