//! Стадии Futurism босса.
//!
//! 1. Левая под-арена: ракеты сначала трескают, затем разбивают внешние щиты.
//! 2. Разрушение барьера, затем весь уровень: щит ядра (лёд замораживает,
//!    ракеты трескают и разбивают).
//! 3. Лампы ядра - weakpoints для мяча; все четыре разбиты → смерть.
//!
//! Между ударами босс перемещается, телепортируется и стреляет очередями и лучами.
//! Порталы: "стратегический" ведёт к нише с нужным предметом (ракеты, лёд),
//! "боевой" связывает две части арены. Во второй и третьей стадиях босс
//! притягивает мяч и уносит его с собой телепортом.

use bevy::prelude::*;

use super::{
    arena_confines, arena_move_positions, ice_strategy_portal_zone, piece_cells, rocket_strategy_portal_zone,
    sub_arena_of, FuturismArena, FuturismParts, ShieldLimb, CORE_BOSS_HALF_SIZE, CORE_BOSS_SIZE, CORE_EYE_SIZE,
    DEFAULT_ACCELERATION, DEFAULT_SPEED, FULLY_SHIELDED_BOSS_HEIGHT, FULLY_SHIELDED_BOSS_WIDTH, PORTAL_HALF_SIZE,
};
use crate::ai::{furthest_positions, keep_inside_level, BossAi, BossAiStage, BossEnv, DamageChannel, Motion};
use crate::anim::MultiLerp;
use crate::archetypes::{drop_off_part, part_pos, start_angry_anims, stop_angry_anims};
use crate::boss::{anims, Boss};
use crate::config::PIECE_WIDTH;
use crate::context::{BossContext, ProjectileKind};
use crate::effects::{BossEffect, GeneralEffect, MiscBossEffect, TeleportKind};
use crate::geometry::{rotate_degrees, signed_angle_degrees, Aabb2, Rgba};
use crate::logger::{log, log_info};
use crate::parts::{DiminishOutcome, PartId, INVULNERABLE_TIME_IN_SECS};
use crate::random::RandomSource;

pub const DEFAULT_FROZEN_TIME_IN_SECS: f32 = 8.0;
pub const TWITCH_BEAM_EXPIRE_TIME_IN_SECS: f32 = 0.9;
pub const EYE_BEAM_HALF_RADIUS: f32 = 0.75 * CORE_EYE_SIZE / 2.0;

pub const TIME_UNTIL_BARRIER_DESTRUCTION_SHOT_IN_SECS: f32 = 2.5;
pub const BARRIER_DESTRUCTION_ARC_TIME_IN_SECS: f32 = 3.4;
const BARRIER_BLOCK_DISINTEGRATION_TIME: f32 = 2.0;
const BARRIER_CORE_SPIN_DEGREES: f32 = 1440.0;

/// Сколько телепорт ищет свободное место, прежде чем сдаться
pub const TELEPORT_GIVE_UP_TIME_IN_SECS: f32 = 2.0;
const AVOIDANCE_TELEPORT_TIME_IN_SECS: f32 = 0.05;
const AVOIDANCE_COOLDOWN_IN_SECS: f32 = 5.0;
/// Насколько близко опасность должна подлететь, чтобы босс ушёл телепортом
const AVOIDANCE_DISTANCE: f32 = 2.0 * PIECE_WIDTH;

/// Щит трескается, но не ломается: урон по нему идёт только через AI
pub const SHIELD_LIFE_POINTS: f32 = f32::MAX;
pub const SHIELD_BALL_DAMAGE: f32 = 0.0;
const SHIELD_CRACKED_TIME_IN_SECS: f32 = 1.0;
const SHIELD_BLOWUP_TIME_IN_SECS: f32 = 3.0;
const ANGRY_TIME_IN_SECS: f32 = 2.0;
const ANGRY_SHAKE_MAGNITUDE: f32 = 0.8;

const BURST_WARMUP_TIME_IN_SECS: f32 = 0.5;
const BURST_LINE_JITTER_DEGS: f32 = 4.0;
const BURST_WAVE_ANGLE_INC_DEGS: f32 = 10.0;
const NUM_RANDOM_MOVE_POSITIONS: usize = 5;

const LASER_COLOUR: Rgba = Rgba::rgb(0.6, 1.0, 0.95);
const CHARGE_COLOUR: Rgba = Rgba::rgb(1.0, 0.85, 0.4);

/// Сколько живут порталы босса
pub const BOSS_PORTAL_TERMINATION_TIME_IN_SECS: f32 = 10.0;
const PORTAL_SPAWN_EFFECT_TIME_IN_SECS: f32 = 1.0;
const MIN_TIME_UNTIL_FIRST_PORTAL_IN_SECS: f32 = 10.0;
/// Стратегический портал обязателен, если его не было дольше этого множителя × время жизни
const STRATEGY_PORTAL_OVERDUE_FACTOR: f32 = 2.3;
const WEAPON_PORTAL_COOLDOWN_FACTOR: f32 = 1.25;
const PORTAL_CORE_SPIN_DEGREES: f32 = 720.0;
const PORTAL_COLOURS: [Rgba; 4] = [
    Rgba::rgb(0.0, 0.6, 1.0),
    Rgba::rgb(1.0, 0.5, 0.0),
    Rgba::rgb(0.6, 0.0, 1.0),
    Rgba::rgb(0.0, 1.0, 0.4),
];

const BALL_DISCARD_ANGLE_DEGS: f32 = 15.0;
/// Доля времени притяжения, после которой мяч у ядра можно уносить
const BALL_ATTRACT_MIN_FRACTION: f32 = 0.75;

const STAR_BEAM_TIME_IN_SECS: f32 = 3.0;
const STAR_BEAM_REFIRE_TIME_IN_SECS: f32 = 0.5;
const STAR_ROTATION_DEGS_PER_SEC: f32 = 60.0;
const STAR_BEAM_HALF_RADIUS: f32 = 0.5 * EYE_BEAM_HALF_RADIUS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuturismStage {
    Stage1,
    Stage2,
    Stage3,
}

impl FuturismStage {
    pub fn name(&self) -> &'static str {
        match self {
            FuturismStage::Stage1 => "FuturismStage1AI",
            FuturismStage::Stage2 => "FuturismStage2AI",
            FuturismStage::Stage3 => "FuturismStage3AI",
        }
    }

    pub fn next(&self) -> Option<FuturismStage> {
        match self {
            FuturismStage::Stage1 => Some(FuturismStage::Stage2),
            FuturismStage::Stage2 => Some(FuturismStage::Stage3),
            FuturismStage::Stage3 => None,
        }
    }

    /// Сколько стадий ещё впереди (каждая - треть жизни босса)
    fn stages_remaining_after(&self) -> f32 {
        match self {
            FuturismStage::Stage1 => 2.0,
            FuturismStage::Stage2 => 1.0,
            FuturismStage::Stage3 => 0.0,
        }
    }

    fn first_state(&self) -> FuturismState {
        match self {
            FuturismStage::Stage1 | FuturismStage::Stage3 => FuturismState::Teleport,
            FuturismStage::Stage2 => FuturismState::DestroyLevelBarrier,
        }
    }

    pub fn max_speed(&self) -> f32 {
        match self {
            FuturismStage::Stage1 => DEFAULT_SPEED,
            FuturismStage::Stage2 => 1.15 * DEFAULT_SPEED,
            FuturismStage::Stage3 => 1.25 * DEFAULT_SPEED,
        }
    }

    fn acceleration(&self) -> f32 {
        match self {
            FuturismStage::Stage1 => DEFAULT_ACCELERATION,
            FuturismStage::Stage2 => 1.1 * DEFAULT_ACCELERATION,
            FuturismStage::Stage3 => 1.2 * DEFAULT_ACCELERATION,
        }
    }

    pub fn frozen_time(&self) -> f32 {
        match self {
            FuturismStage::Stage1 => 0.5 * DEFAULT_FROZEN_TIME_IN_SECS,
            FuturismStage::Stage2 | FuturismStage::Stage3 => DEFAULT_FROZEN_TIME_IN_SECS,
        }
    }

    pub fn teleport_in_and_out_time(&self) -> f32 {
        match self {
            FuturismStage::Stage1 => 1.0,
            FuturismStage::Stage2 => 0.9,
            FuturismStage::Stage3 => 0.8,
        }
    }

    fn twitch_beam_shoot_time(&self) -> f32 {
        match self {
            FuturismStage::Stage1 => 0.7,
            FuturismStage::Stage2 => 0.55,
            FuturismStage::Stage3 => 0.5,
        }
    }

    fn beam_arc_hold_time(&self) -> f32 {
        match self {
            FuturismStage::Stage1 => 1.4,
            FuturismStage::Stage2 => 1.2,
            FuturismStage::Stage3 => 1.1,
        }
    }

    fn beam_arcing_time(&self) -> f32 {
        match self {
            FuturismStage::Stage1 => 3.5,
            FuturismStage::Stage2 => 3.1,
            FuturismStage::Stage3 => 3.0,
        }
    }

    fn time_between_burst_line_shots(&self, rng: &mut dyn RandomSource) -> f32 {
        match self {
            FuturismStage::Stage1 => 0.2 + 0.08 * rng.random_zero_to_one(),
            FuturismStage::Stage2 => 0.18 + 0.05 * rng.random_zero_to_one(),
            FuturismStage::Stage3 => 0.16 + 0.04 * rng.random_zero_to_one(),
        }
    }

    fn time_between_burst_wave_shots(&self, rng: &mut dyn RandomSource) -> f32 {
        match self {
            FuturismStage::Stage1 => 0.45 + 0.25 * rng.random_zero_to_one(),
            FuturismStage::Stage2 => 0.4 + 0.2 * rng.random_zero_to_one(),
            FuturismStage::Stage3 => 0.33 + 0.15 * rng.random_zero_to_one(),
        }
    }

    fn num_burst_line_shots(&self, rng: &mut dyn RandomSource) -> u32 {
        match self {
            FuturismStage::Stage1 => 3 + rng.random_unsigned() % 2,
            FuturismStage::Stage2 => 4 + rng.random_unsigned() % 3,
            FuturismStage::Stage3 => 4 + rng.random_unsigned() % 4,
        }
    }

    fn num_wave_bursts(&self, rng: &mut dyn RandomSource) -> u32 {
        match self {
            FuturismStage::Stage1 => 2 + rng.random_unsigned() % 2,
            FuturismStage::Stage2 | FuturismStage::Stage3 => 3 + rng.random_unsigned() % 2,
        }
    }

    pub fn ball_attract_time(&self) -> f32 {
        match self {
            FuturismStage::Stage1 | FuturismStage::Stage2 => 5.0,
            FuturismStage::Stage3 => 4.0,
        }
    }

    fn ball_discard_time(&self) -> f32 {
        match self {
            FuturismStage::Stage1 | FuturismStage::Stage2 => 0.5,
            FuturismStage::Stage3 => 0.4,
        }
    }

    pub fn strategy_portal_shoot_time(&self) -> f32 {
        match self {
            FuturismStage::Stage1 => 4.0,
            FuturismStage::Stage2 => 3.5,
            FuturismStage::Stage3 => 3.3,
        }
    }

    pub fn weapon_portal_shoot_time(&self) -> f32 {
        match self {
            FuturismStage::Stage1 => 4.0,
            FuturismStage::Stage2 => 3.25,
            FuturismStage::Stage3 => 3.1,
        }
    }

    /// Ниша с предметом, который нужен для этой стадии
    pub fn strategy_portal_zone(&self) -> Aabb2 {
        match self {
            FuturismStage::Stage1 => rocket_strategy_portal_zone(),
            FuturismStage::Stage2 | FuturismStage::Stage3 => ice_strategy_portal_zone(),
        }
    }

    /// Притяжение мяча и боевые порталы - только после разрушения барьера
    fn uses_ball_and_weapon_portals(&self) -> bool {
        *self != FuturismStage::Stage1
    }

    pub fn num_shots_per_wave_burst(&self) -> u32 {
        match self {
            FuturismStage::Stage1 | FuturismStage::Stage2 => 3,
            FuturismStage::Stage3 => 5,
        }
    }

    fn after_attack_wait_time(&self, attack: FuturismState) -> f32 {
        let base = match attack {
            FuturismState::LaserBeamArc => 1.5,
            FuturismState::LaserBeamTwitch => 1.0,
            FuturismState::LaserBeamStar => 1.25,
            _ => 0.75,
        };
        match self {
            FuturismStage::Stage1 => 1.25 * base,
            FuturismStage::Stage2 => base,
            FuturismStage::Stage3 => 0.8 * base,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuturismState {
    MoveToPosition,
    Teleport,
    AvoidanceTeleport,
    Frozen,
    BasicBurstLineFire,
    BasicBurstWaveFire,
    LaserBeamTwitch,
    LaserBeamArc,
    /// Вращение с лучами из всех живых ламп
    LaserBeamStar,
    /// Притянуть мяч к ядру, затем унести его телепортом
    BallAttract,
    /// Выбросить унесённый мяч после телепорта
    BallDiscard,
    StationaryFireStrategyPortal,
    StationaryFireWeaponPortal,
    DestroyLevelBarrier,
    ShieldPartCracked,
    ShieldPartDestroyed,
    BulbHitAndDestroyed,
    Angry,
    FinalDeathThroes,
}

impl FuturismState {
    /// После удара: новые попадания игнорируются
    fn is_hurt(&self) -> bool {
        matches!(
            self,
            FuturismState::ShieldPartCracked
                | FuturismState::ShieldPartDestroyed
                | FuturismState::BulbHitAndDestroyed
                | FuturismState::Angry
                | FuturismState::FinalDeathThroes
        )
    }

    fn ignores_damage(&self) -> bool {
        self.is_hurt() || *self == FuturismState::DestroyLevelBarrier
    }

    /// Из этих состояний босс может уйти телепортом от подлетающей опасности
    fn can_avoid(&self) -> bool {
        matches!(
            self,
            FuturismState::MoveToPosition
                | FuturismState::BasicBurstLineFire
                | FuturismState::BasicBurstWaveFire
                | FuturismState::LaserBeamTwitch
                | FuturismState::LaserBeamArc
                | FuturismState::LaserBeamStar
        )
    }

    /// Только в этих состояниях босс держит мяч
    fn can_hold_ball(&self) -> bool {
        matches!(
            self,
            FuturismState::BallAttract | FuturismState::Teleport | FuturismState::BallDiscard
        )
    }

    fn is_portal(&self) -> bool {
        matches!(
            self,
            FuturismState::StationaryFireStrategyPortal | FuturismState::StationaryFireWeaponPortal
        )
    }

    fn is_move(&self) -> bool {
        matches!(
            self,
            FuturismState::MoveToPosition | FuturismState::Teleport | FuturismState::AvoidanceTeleport
        )
    }

    fn is_burst(&self) -> bool {
        matches!(self, FuturismState::BasicBurstLineFire | FuturismState::BasicBurstWaveFire)
    }

    fn is_beam(&self) -> bool {
        matches!(
            self,
            FuturismState::LaserBeamTwitch | FuturismState::LaserBeamArc | FuturismState::LaserBeamStar
        )
    }
}

// Таблицы выбора следующего состояния
const PADDLE_VISIBLE_CHOICES: [FuturismState; 22] = [
    FuturismState::MoveToPosition,
    FuturismState::MoveToPosition,
    FuturismState::MoveToPosition,
    FuturismState::Teleport,
    FuturismState::Teleport,
    FuturismState::Teleport,
    FuturismState::BasicBurstWaveFire,
    FuturismState::BasicBurstWaveFire,
    FuturismState::BasicBurstWaveFire,
    FuturismState::BasicBurstWaveFire,
    FuturismState::BasicBurstWaveFire,
    FuturismState::BasicBurstLineFire,
    FuturismState::BasicBurstLineFire,
    FuturismState::BasicBurstLineFire,
    FuturismState::BasicBurstLineFire,
    FuturismState::BasicBurstLineFire,
    FuturismState::LaserBeamArc,
    FuturismState::LaserBeamArc,
    FuturismState::LaserBeamTwitch,
    FuturismState::LaserBeamTwitch,
    FuturismState::LaserBeamTwitch,
    FuturismState::Teleport,
];

const PADDLE_HIDDEN_CHOICES: [FuturismState; 12] = [
    FuturismState::MoveToPosition,
    FuturismState::MoveToPosition,
    FuturismState::MoveToPosition,
    FuturismState::Teleport,
    FuturismState::Teleport,
    FuturismState::Teleport,
    FuturismState::Teleport,
    FuturismState::Teleport,
    FuturismState::BasicBurstWaveFire,
    FuturismState::BasicBurstLineFire,
    FuturismState::LaserBeamArc,
    FuturismState::LaserBeamArc,
];

const AFTER_MANY_SHOTS_CHOICES: [FuturismState; 7] = [
    FuturismState::MoveToPosition,
    FuturismState::MoveToPosition,
    FuturismState::Teleport,
    FuturismState::Teleport,
    FuturismState::Teleport,
    FuturismState::LaserBeamTwitch,
    FuturismState::LaserBeamArc,
];

const AFTER_MANY_BEAMS_CHOICES: [FuturismState; 4] = [
    FuturismState::MoveToPosition,
    FuturismState::Teleport,
    FuturismState::BasicBurstWaveFire,
    FuturismState::BasicBurstLineFire,
];

/// Фаза атаки: подготовка → стрельба → пауза после атаки
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttackPhase {
    Warmup,
    Active,
    Cooldown,
}

#[derive(Debug, Clone)]
pub struct FuturismAi {
    stage: FuturismStage,
    parts: FuturismParts,
    state: FuturismState,
    arena: FuturismArena,
    motion: Motion,

    num_consecutive_moves: u32,
    num_consecutive_shots: u32,
    num_consecutive_beams: u32,
    num_consecutive_attacks: u32,

    teleport_announced: bool,
    teleported: bool,
    teleport_out_countdown: f32,
    teleport_in_countdown: f32,
    teleport_search_time: f32,
    avoidance_cooldown: f32,

    frozen_countdown: f32,

    phase: AttackPhase,
    phase_countdown: f32,
    shots_left: u32,
    beam_start_dir: Vec2,
    beam_sweep_degrees: f32,
    beam_elapsed: f32,

    barrier_origin: Vec2,
    barrier_start_dir: Vec2,
    barrier_sweep_degrees: f32,

    hurt_countdown: f32,
    angry_countdown: f32,
    bulbs_destroyed: u32,

    ball_attached: bool,
    ball_start_pos: Vec2,
    ball_dir_before_attach: Vec2,
    attract_elapsed: f32,
    discard_countdown: f32,
    has_done_initial_ball_attract: bool,

    portal_shot_countdown: f32,
    portal_state_total: f32,
    portal_state_countdown: f32,
    portal_fired: bool,
    portal_colour_idx: usize,
    time_since_strategy_portal: f32,
    time_since_weapon_portal: f32,

    star_spin_sign: f32,
    star_refire_countdown: f32,

    /// Первый тик текущего состояния уже отработал
    state_entered: bool,
}

impl FuturismAi {
    pub fn new(stage: FuturismStage, parts: FuturismParts, boss: &mut Boss, rng: &mut dyn RandomSource) -> Self {
        let arena = match stage {
            FuturismStage::Stage1 | FuturismStage::Stage2 => FuturismArena::Left,
            FuturismStage::Stage3 => FuturismArena::Full,
        };

        match stage {
            FuturismStage::Stage1 => {}
            FuturismStage::Stage2 => {
                if boss.is_part_alive(parts.core_shield) {
                    parts.regenerate_core_shield_bounds(boss.parts_mut());
                }
            }
            FuturismStage::Stage3 => {
                parts.regenerate_bounds_for_final_core(boss.parts_mut());
                for bulb in parts.bulbs() {
                    if boss.is_part_alive(bulb) && !boss.parts().is_weakpoint(bulb) {
                        boss.make_weakpoint_or_log(bulb, 1.0, 1.0);
                    }
                }
            }
        }

        let mut ai = Self {
            stage,
            parts,
            state: FuturismState::MoveToPosition,
            arena,
            motion: Motion::new(stage.acceleration()),
            num_consecutive_moves: 0,
            num_consecutive_shots: 0,
            num_consecutive_beams: 0,
            num_consecutive_attacks: 0,
            teleport_announced: false,
            teleported: false,
            teleport_out_countdown: 0.0,
            teleport_in_countdown: 0.0,
            teleport_search_time: 0.0,
            avoidance_cooldown: 0.0,
            frozen_countdown: 0.0,
            phase: AttackPhase::Warmup,
            phase_countdown: 0.0,
            shots_left: 0,
            beam_start_dir: Vec2::NEG_Y,
            beam_sweep_degrees: 0.0,
            beam_elapsed: 0.0,
            barrier_origin: Vec2::ZERO,
            barrier_start_dir: Vec2::NEG_Y,
            barrier_sweep_degrees: 0.0,
            hurt_countdown: 0.0,
            angry_countdown: 0.0,
            bulbs_destroyed: 0,
            ball_attached: false,
            ball_start_pos: Vec2::ZERO,
            ball_dir_before_attach: Vec2::NEG_Y,
            attract_elapsed: 0.0,
            discard_countdown: 0.0,
            has_done_initial_ball_attract: false,
            portal_shot_countdown: 0.0,
            portal_state_total: 0.0,
            portal_state_countdown: 0.0,
            portal_fired: false,
            portal_colour_idx: 0,
            // Первый стратегический портал - не раньше чем через MIN_TIME_UNTIL_FIRST_PORTAL
            time_since_strategy_portal: BOSS_PORTAL_TERMINATION_TIME_IN_SECS - MIN_TIME_UNTIL_FIRST_PORTAL_IN_SECS,
            time_since_weapon_portal: 0.0,
            star_spin_sign: 1.0,
            star_refire_countdown: 0.0,
            state_entered: false,
        };
        ai.enter_state(stage.first_state(), rng);
        ai
    }

    pub fn stage(&self) -> FuturismStage {
        self.stage
    }

    pub fn state(&self) -> FuturismState {
        self.state
    }

    pub fn arena(&self) -> FuturismArena {
        self.arena
    }

    pub fn parts(&self) -> &FuturismParts {
        &self.parts
    }

    /// Полуразмер босса для расчёта позиций (щиты убывают по стадиям)
    pub fn half_size(&self) -> Vec2 {
        match self.stage {
            FuturismStage::Stage1 => Vec2::new(FULLY_SHIELDED_BOSS_WIDTH, FULLY_SHIELDED_BOSS_HEIGHT) / 2.0,
            FuturismStage::Stage2 | FuturismStage::Stage3 => Vec2::splat(CORE_BOSS_HALF_SIZE),
        }
    }

    fn shot_origin(&self, boss: &Boss) -> Vec2 {
        part_pos(boss, self.parts.core_body)
    }

    /// Доля жизни текущей стадии (0..1)
    pub fn stage_life_fraction(&self, boss: &Boss) -> f32 {
        let parts = boss.parts();
        match self.stage {
            FuturismStage::Stage1 => self
                .parts
                .outer_shields()
                .iter()
                .map(|shield| {
                    if !boss.is_part_alive(*shield) {
                        0.0
                    } else if parts.is_weakpoint(*shield) {
                        0.125
                    } else {
                        0.25
                    }
                })
                .sum(),
            FuturismStage::Stage2 => {
                let shield = self.parts.core_shield;
                if !boss.is_part_alive(shield) {
                    0.0
                } else if parts.is_weakpoint(shield) {
                    0.5
                } else {
                    1.0
                }
            }
            FuturismStage::Stage3 => {
                let alive = self.parts.bulbs().iter().filter(|b| boss.is_part_alive(**b)).count();
                alive as f32 / 4.0
            }
        }
    }

    fn all_bulbs_destroyed(&self, boss: &Boss) -> bool {
        self.parts.bulbs().iter().all(|b| !boss.is_part_alive(*b))
    }

    /// Всё, что нужно сломать в этой стадии, сломано
    fn all_stage_shields_destroyed(&self, boss: &Boss) -> bool {
        match self.stage {
            FuturismStage::Stage1 => self.parts.outer_shields().iter().all(|s| !boss.is_part_alive(*s)),
            FuturismStage::Stage2 => !boss.is_part_alive(self.parts.core_shield),
            FuturismStage::Stage3 => false,
        }
    }

    /// Пока барьер стоит, paddle виден только из своей под-арены
    fn is_paddle_visible(&self, ctx: &dyn BossContext) -> bool {
        if self.arena == FuturismArena::Full {
            return true;
        }
        let confines = arena_confines(self.arena);
        let x = ctx.paddle().center.x;
        x >= confines.min.x && x <= confines.max.x
    }

    // Поиск позиций ------------------------------------------------------------

    fn collides_with_obstacles(&self, position: Vec2, ctx: &dyn BossContext) -> bool {
        let aabb = Aabb2::from_center(position, self.half_size());
        let hits_hazard = ctx.hazard_aabbs().iter().any(|h| h.intersects(&aabb));
        // Удерживаемый мяч летит вместе с боссом
        let hits_ball = !self.ball_attached && ctx.ball().map(|b| b.aabb().intersects(&aabb)).unwrap_or(false);
        hits_hazard || hits_ball
    }

    /// Позиции арены, куда можно встать: не текущая и без опасностей
    fn valid_move_positions(&self, boss: &Boss, ctx: &dyn BossContext) -> Vec<Vec2> {
        let curr = boss.position();
        arena_move_positions(self.arena, self.half_size())
            .into_iter()
            .filter(|p| p.distance_squared(curr) >= self.motion.target_error_sq)
            .filter(|p| !self.collides_with_obstacles(*p, ctx))
            .collect()
    }

    /// Куда телепортироваться. Чистый запрос: без кандидатов - `None`,
    /// ни позиция, ни эффекты не трогаются.
    pub fn find_teleport_location(
        &self,
        boss: &Boss,
        ctx: &dyn BossContext,
        rng: &mut dyn RandomSource,
    ) -> Option<Vec2> {
        let candidates = self.valid_move_positions(boss, ctx);
        if candidates.is_empty() {
            return None;
        }
        // Самая дальняя половина кандидатов
        let num_furthest = candidates.len().div_ceil(2);
        let furthest = furthest_positions(boss.position(), &candidates, num_furthest);
        let idx = rng.random_unsigned() as usize % furthest.len().max(1);
        furthest.get(idx).copied()
    }

    fn random_move_to_position(&self, boss: &Boss, env: &mut BossEnv) -> Option<Vec2> {
        let candidates = self.valid_move_positions(boss, &*env.ctx);
        let furthest = furthest_positions(boss.position(), &candidates, NUM_RANDOM_MOVE_POSITIONS);
        if furthest.is_empty() {
            return None;
        }
        let idx = env.rng.random_unsigned() as usize % furthest.len();
        furthest.get(idx).copied()
    }

    // Выбор следующего состояния -----------------------------------------------------

    pub(crate) fn random_basic_move_state(rng: &mut dyn RandomSource) -> FuturismState {
        match rng.random_unsigned() % 5 {
            0..=2 => FuturismState::MoveToPosition,
            _ => FuturismState::Teleport,
        }
    }

    /// Чем меньше жизни в стадии, тем опаснее "свободные" слоты таблицы
    pub(crate) fn random_basic_attack_state(&self, boss: &Boss, rng: &mut dyn RandomSource) -> FuturismState {
        match rng.random_unsigned() % 9 {
            0..=2 => FuturismState::BasicBurstLineFire,
            3..=4 => FuturismState::BasicBurstWaveFire,
            5 => FuturismState::LaserBeamArc,
            6 => FuturismState::LaserBeamTwitch,
            _ => {
                let life = self.stage_life_fraction(boss);
                if life < 0.5 {
                    if self.stage == FuturismStage::Stage3 {
                        FuturismState::LaserBeamStar
                    } else {
                        FuturismState::LaserBeamArc
                    }
                } else if life < 0.75 {
                    FuturismState::LaserBeamTwitch
                } else if life < 1.0 {
                    FuturismState::BasicBurstWaveFire
                } else {
                    FuturismState::BasicBurstLineFire
                }
            }
        }
    }

    /// Следующее состояние с учётом того, что босс только что делал
    pub(crate) fn choose_next_state(
        &self,
        boss: &Boss,
        ctx: &dyn BossContext,
        rng: &mut dyn RandomSource,
    ) -> FuturismState {
        let table: &[FuturismState] = if self.is_paddle_visible(ctx) {
            &PADDLE_VISIBLE_CHOICES
        } else {
            &PADDLE_HIDDEN_CHOICES
        };
        let mut choice = table[rng.random_unsigned() as usize % table.len()];
        // Ядро без щитов: половина дуг становится "звездой" из ламп
        if self.stage == FuturismStage::Stage3 && choice == FuturismState::LaserBeamArc && rng.random_unsigned() % 2 == 0
        {
            choice = FuturismState::LaserBeamStar;
        }

        if self.state.is_move() {
            if self.num_consecutive_moves > 2 {
                return self.random_basic_attack_state(boss, rng);
            }
        } else if self.state.is_burst() {
            if self.num_consecutive_attacks > 3 {
                return Self::random_basic_move_state(rng);
            }
            if self.num_consecutive_shots > 2 {
                choice = AFTER_MANY_SHOTS_CHOICES[rng.random_unsigned() as usize % AFTER_MANY_SHOTS_CHOICES.len()];
            }
        } else if self.state.is_beam() {
            // После дёрганого луча не повторяем ни один из лучей, после дуги и звезды - только их
            let repeats_beam = match self.state {
                FuturismState::LaserBeamTwitch => choice.is_beam(),
                _ => matches!(choice, FuturismState::LaserBeamArc | FuturismState::LaserBeamStar),
            };
            if repeats_beam || self.num_consecutive_attacks > 3 {
                return Self::random_basic_move_state(rng);
            }
            if self.num_consecutive_beams > 1 {
                choice = AFTER_MANY_BEAMS_CHOICES[rng.random_unsigned() as usize % AFTER_MANY_BEAMS_CHOICES.len()];
            }
        }
        choice
    }

    /// Порталы и притяжение мяча важнее таблиц выбора
    pub(crate) fn special_next_state(
        &self,
        boss: &Boss,
        ctx: &dyn BossContext,
        rng: &mut dyn RandomSource,
    ) -> Option<FuturismState> {
        // Во второй стадии первым делом забираем мяч
        if self.stage == FuturismStage::Stage2 && !self.has_done_initial_ball_attract && self.can_attract_ball(boss, ctx)
        {
            return Some(FuturismState::BallAttract);
        }
        if self.time_since_strategy_portal > STRATEGY_PORTAL_OVERDUE_FACTOR * BOSS_PORTAL_TERMINATION_TIME_IN_SECS {
            return Some(FuturismState::StationaryFireStrategyPortal);
        }
        if !self.stage.uses_ball_and_weapon_portals() {
            return None;
        }
        if self.num_consecutive_moves == 0
            && self.state != FuturismState::BallDiscard
            && self.can_attract_ball(boss, ctx)
            && rng.random_unsigned() % 6 == 0
        {
            return Some(FuturismState::BallAttract);
        }
        if self.time_since_weapon_portal > WEAPON_PORTAL_COOLDOWN_FACTOR * BOSS_PORTAL_TERMINATION_TIME_IN_SECS
            && self.time_since_strategy_portal > BOSS_PORTAL_TERMINATION_TIME_IN_SECS
            && rng.random_unsigned() % 3 == 0
        {
            return Some(FuturismState::StationaryFireWeaponPortal);
        }
        None
    }

    fn go_to_next_state(&mut self, boss: &mut Boss, env: &mut BossEnv) {
        if self.state == FuturismState::BallDiscard {
            self.has_done_initial_ball_attract = true;
        }
        let next = match self.special_next_state(boss, &*env.ctx, env.rng) {
            Some(special) => special,
            None => self.choose_next_state(boss, &*env.ctx, env.rng),
        };
        self.set_state(next, boss, env);
    }

    // Переходы ---------------------------------------------------------------------

    fn reset_ai_trackers(&mut self) {
        self.num_consecutive_moves = 0;
        self.num_consecutive_shots = 0;
        self.num_consecutive_beams = 0;
        self.num_consecutive_attacks = 0;
    }

    /// Счётчики и таймеры состояния (без эффектов: нужен только rng)
    fn enter_state(&mut self, new_state: FuturismState, rng: &mut dyn RandomSource) {
        if new_state.is_move() {
            self.num_consecutive_moves += 1;
            self.num_consecutive_shots = 0;
            self.num_consecutive_beams = 0;
            self.num_consecutive_attacks = 0;
        } else if new_state.is_burst() {
            self.num_consecutive_shots += 1;
            self.num_consecutive_attacks += 1;
            self.num_consecutive_moves = 0;
            self.num_consecutive_beams = 0;
        } else if new_state.is_beam() {
            self.num_consecutive_beams += 1;
            self.num_consecutive_attacks += 1;
            self.num_consecutive_moves = 0;
            self.num_consecutive_shots = 0;
        } else if new_state.is_hurt() || new_state.is_portal() || new_state == FuturismState::BallAttract {
            self.reset_ai_trackers();
        }

        match new_state {
            FuturismState::Teleport | FuturismState::AvoidanceTeleport => {
                self.motion.stop();
                let time = if new_state == FuturismState::AvoidanceTeleport {
                    AVOIDANCE_TELEPORT_TIME_IN_SECS
                } else {
                    self.stage.teleport_in_and_out_time()
                };
                self.teleport_announced = false;
                self.teleported = false;
                self.teleport_out_countdown = time;
                self.teleport_in_countdown = time;
                self.teleport_search_time = 0.0;
            }
            FuturismState::BasicBurstLineFire => {
                self.motion.stop();
                self.phase = AttackPhase::Warmup;
                self.phase_countdown = BURST_WARMUP_TIME_IN_SECS;
                self.shots_left = self.stage.num_burst_line_shots(rng);
            }
            FuturismState::BasicBurstWaveFire => {
                self.motion.stop();
                self.phase = AttackPhase::Warmup;
                self.phase_countdown = BURST_WARMUP_TIME_IN_SECS;
                self.shots_left = self.stage.num_wave_bursts(rng);
            }
            FuturismState::LaserBeamTwitch => {
                self.motion.stop();
                self.phase = AttackPhase::Warmup;
                self.phase_countdown = self.stage.twitch_beam_shoot_time();
            }
            FuturismState::LaserBeamArc | FuturismState::LaserBeamStar => {
                self.motion.stop();
                self.phase = AttackPhase::Warmup;
                self.phase_countdown = self.stage.twitch_beam_shoot_time();
                self.beam_elapsed = 0.0;
                self.star_refire_countdown = 0.0;
            }
            FuturismState::BallAttract => {
                self.motion.stop();
                self.attract_elapsed = 0.0;
            }
            FuturismState::BallDiscard => {
                self.motion.stop();
                self.discard_countdown = self.stage.ball_discard_time();
            }
            FuturismState::StationaryFireStrategyPortal | FuturismState::StationaryFireWeaponPortal => {
                self.motion.stop();
                self.portal_state_total = if new_state == FuturismState::StationaryFireStrategyPortal {
                    self.stage.strategy_portal_shoot_time()
                } else {
                    self.stage.weapon_portal_shoot_time()
                };
                self.portal_state_countdown = self.portal_state_total;
                self.portal_shot_countdown = 0.5 * self.portal_state_total;
                self.portal_fired = false;
            }
            FuturismState::DestroyLevelBarrier => {
                self.motion.stop();
                self.phase = AttackPhase::Warmup;
                self.phase_countdown = TIME_UNTIL_BARRIER_DESTRUCTION_SHOT_IN_SECS;
                self.beam_elapsed = 0.0;
            }
            FuturismState::Frozen => {
                self.motion.stop();
                self.frozen_countdown = self.stage.frozen_time();
            }
            FuturismState::ShieldPartCracked => {
                self.motion.stop();
                self.hurt_countdown = SHIELD_CRACKED_TIME_IN_SECS;
            }
            FuturismState::ShieldPartDestroyed | FuturismState::BulbHitAndDestroyed => {
                self.motion.stop();
                self.hurt_countdown = INVULNERABLE_TIME_IN_SECS;
            }
            FuturismState::Angry => {
                self.motion.stop();
                self.angry_countdown = ANGRY_TIME_IN_SECS;
            }
            FuturismState::MoveToPosition | FuturismState::FinalDeathThroes => {
                self.motion.stop();
            }
        }
        if self.state != new_state {
            log(&format!("Futurism {}: {:?} -> {:?}", self.stage.name(), self.state, new_state));
        }
        self.state = new_state;
        self.state_entered = false;
    }

    /// `true` ровно один раз - на первом тике состояния
    fn first_tick_of_state(&mut self) -> bool {
        !std::mem::replace(&mut self.state_entered, true)
    }

    pub(crate) fn set_state(&mut self, new_state: FuturismState, boss: &mut Boss, env: &mut BossEnv) {
        let alive = boss.alive_root();
        if !new_state.can_hold_ball() {
            // Замороженный босс выталкивает мяч от себя
            self.release_ball(new_state == FuturismState::Frozen, boss, env);
        }
        // Прерванное вращение ядра сбрасываем
        if self.state.is_portal() {
            let spinner = self.portal_spinner(boss);
            boss.parts_mut().set_z_rotation(spinner, 0.0);
        } else if self.state == FuturismState::LaserBeamStar {
            boss.parts_mut().set_z_rotation(self.parts.core_assembly, 0.0);
        }
        match new_state {
            FuturismState::MoveToPosition => {
                let Some(target) = self.random_move_to_position(boss, env) else {
                    // Некуда идти - сразу атакуем
                    log(&format!("Futurism {}: no free move-to position", self.stage.name()));
                    let attack = self.random_basic_attack_state(boss, env.rng);
                    self.set_state(attack, boss, env);
                    return;
                };
                self.enter_state(new_state, env.rng);
                self.motion.set_target(boss.position(), target);
                return;
            }
            FuturismState::LaserBeamTwitch | FuturismState::LaserBeamArc => {
                env.sink.announce_boss_effect(BossEffect::Misc {
                    kind: MiscBossEffect::LaserSight,
                    part: self.parts.core_body,
                    time: self.stage.twitch_beam_shoot_time(),
                });
            }
            FuturismState::LaserBeamStar => {
                for bulb in self.parts.bulbs() {
                    if !boss.is_part_alive(bulb) {
                        continue;
                    }
                    env.sink.announce_boss_effect(BossEffect::PowerCharge {
                        part: bulb,
                        time: self.stage.twitch_beam_shoot_time(),
                        colour: LASER_COLOUR,
                        size: 0.5 * CORE_EYE_SIZE,
                        offset: Vec3::ZERO,
                    });
                }
                boss.parts_mut().clear_transform_anims(self.parts.core_assembly);
            }
            FuturismState::BallAttract => {
                env.ctx.close_portals();
                if !self.can_attract_ball(boss, &*env.ctx) {
                    log(&format!("Futurism {}: no ball to attract", self.stage.name()));
                    let next = self.choose_next_state(boss, &*env.ctx, env.rng);
                    self.set_state(next, boss, env);
                    return;
                }
            }
            FuturismState::StationaryFireStrategyPortal | FuturismState::StationaryFireWeaponPortal => {
                self.portal_colour_idx = (self.portal_colour_idx + 1) % PORTAL_COLOURS.len();
                let time = if new_state == FuturismState::StationaryFireStrategyPortal {
                    self.stage.strategy_portal_shoot_time()
                } else {
                    self.stage.weapon_portal_shoot_time()
                };
                env.sink.announce_boss_effect(BossEffect::PowerCharge {
                    part: self.parts.core_body,
                    time: 0.5 * time,
                    colour: self.portal_colour(),
                    size: CORE_EYE_SIZE,
                    offset: Vec3::ZERO,
                });
            }
            FuturismState::Frozen => {
                env.sink.clear_active_boss_effects();
                env.sink.announce_boss_effect(BossEffect::Misc {
                    kind: MiscBossEffect::FrozenInIce,
                    part: self.parts.core_body,
                    time: self.stage.frozen_time(),
                });
                env.sink
                    .announce_boss_effect(BossEffect::FullscreenFlash { time: 0.125, intensity: 1.0 });
                boss.parts_mut().clear_transform_anims(alive);
            }
            FuturismState::Angry => {
                start_angry_anims(boss, self.parts.core_body, ANGRY_SHAKE_MAGNITUDE, env.rng, env.sink);
            }
            FuturismState::BulbHitAndDestroyed => {
                boss.parts_mut()
                    .animate_colour(alive, anims::hurt_and_invulnerable_colour_anim());
            }
            FuturismState::FinalDeathThroes => {
                env.sink.clear_active_boss_effects();
                let parts = boss.parts_mut();
                parts.clear_transform_anims(alive);
                parts.animate_colour(alive, anims::final_death_flash_anim());
                for bulb in self.parts.bulbs() {
                    parts.animate_colour(bulb, anims::final_death_flash_anim());
                }
                log_info(&format!("Futurism {}: final death throes", self.stage.name()));
            }
            _ => {}
        }
        self.enter_state(new_state, env.rng);
    }

    // Урон -------------------------------------------------------------------------

    fn hurt_direction(&self, boss: &Boss, env: &BossEnv) -> Vec2 {
        let away_from_paddle = (boss.position() - env.ctx.paddle().center).normalize_or_zero();
        if away_from_paddle == Vec2::ZERO {
            Vec2::Y
        } else {
            away_from_paddle
        }
    }

    /// Лёд, в котором стоит босс, разлетается от удара
    fn shatter_ice_if_frozen(&mut self, env: &mut BossEnv) {
        if self.state == FuturismState::Frozen {
            env.sink
                .announce_boss_effect(BossEffect::FullscreenFlash { time: 0.15, intensity: 0.5 });
        }
    }

    /// Щит становится weakpoint'ом (треснул), урон по нему больше не проходит сам
    fn weaken_shield(&mut self, limb: ShieldLimb, hit_dir: Vec2, magnitude: f32, boss: &mut Boss, env: &mut BossEnv) {
        let shield = self.parts.shield(limb);
        if boss.parts().is_weakpoint(shield) {
            return;
        }
        boss.make_weakpoint_or_log(shield, SHIELD_LIFE_POINTS, SHIELD_BALL_DAMAGE);
        env.sink.announce_boss_effect(BossEffect::Misc {
            kind: MiscBossEffect::ShieldCracked,
            part: shield,
            time: SHIELD_CRACKED_TIME_IN_SECS,
        });
        if let Some(aabb) = boss.parts().world_aabb(shield) {
            let center = part_pos(boss, shield);
            let half = aabb.size() / 2.0;
            for corner in [
                Vec2::new(-half.x, half.y),
                Vec2::new(half.x, half.y),
                Vec2::new(-half.x, -half.y),
                Vec2::new(half.x, -half.y),
            ] {
                let offset = (aabb.center() + corner - center).extend(0.0);
                env.sink.announce_boss_effect(BossEffect::SparkBurst {
                    part: shield,
                    time: 2.0 + env.rng.random_zero_to_one(),
                    colour: Rgba::rgb(0.57, 0.6, 0.63),
                    offset,
                });
            }
        }
        env.sink.announce_boss_hurt(shield);
        self.shatter_ice_if_frozen(env);

        log(&format!("Futurism {}: {:?} shield cracked", self.stage.name(), limb));
        let alive = boss.alive_root();
        boss.parts_mut()
            .animate_translation(alive, anims::hurt_move_anim(hit_dir, magnitude));
        self.set_state(FuturismState::ShieldPartCracked, boss, env);
    }

    /// Треснувший щит отваливается и падает в dead-поддерево
    fn destroy_shield(&mut self, limb: ShieldLimb, hit_dir: Vec2, boss: &mut Boss, env: &mut BossEnv) {
        let shield = self.parts.shield(limb);
        if !boss.parts().is_weakpoint(shield) || !boss.is_part_alive(shield) {
            return;
        }
        let size = boss
            .parts()
            .world_aabb(shield)
            .map(|a| a.size().max_element())
            .unwrap_or(CORE_BOSS_SIZE);
        let x_dir = if hit_dir.x == 0.0 {
            env.rng.random_negative_or_positive()
        } else {
            hit_dir.x.signum()
        };
        let rotation = x_dir * (50.0 + (env.rng.random_unsigned() % 20) as f32);
        drop_off_part(boss, shield, SHIELD_BLOWUP_TIME_IN_SECS, x_dir * size, -5.0 * size, rotation);

        if limb != ShieldLimb::Core {
            self.parts.expose_core_shield_sector(boss.parts_mut(), limb);
        }

        env.sink.announce_boss_effect(BossEffect::Misc {
            kind: MiscBossEffect::ShieldShatter,
            part: shield,
            time: SHIELD_BLOWUP_TIME_IN_SECS,
        });
        env.sink.announce_boss_hurt(shield);
        self.shatter_ice_if_frozen(env);

        log_info(&format!("Futurism {}: {:?} shield destroyed", self.stage.name(), limb));
        let alive = boss.alive_root();
        boss.parts_mut()
            .animate_translation(alive, anims::hurt_move_anim(hit_dir, CORE_BOSS_HALF_SIZE / 2.0));
        self.set_state(FuturismState::ShieldPartDestroyed, boss, env);
    }

    fn hit_shield(&mut self, limb: ShieldLimb, hit_dir: Vec2, magnitude: f32, boss: &mut Boss, env: &mut BossEnv) {
        if boss.parts().is_weakpoint(self.parts.shield(limb)) {
            self.destroy_shield(limb, hit_dir, boss, env);
        } else {
            self.weaken_shield(limb, hit_dir, magnitude, boss, env);
        }
    }

    fn freeze(&mut self, boss: &mut Boss, env: &mut BossEnv) {
        if self.state == FuturismState::Frozen {
            return;
        }
        log(&format!("Futurism {}: frozen by ice blast", self.stage.name()));
        self.set_state(FuturismState::Frozen, boss, env);
    }

    // Выстрелы и лучи -------------------------------------------------------------------

    fn dir_to_paddle(&self, boss: &Boss, env: &BossEnv) -> Vec2 {
        let dir = (env.ctx.paddle().center - self.shot_origin(boss)).normalize_or_zero();
        if dir == Vec2::ZERO {
            Vec2::NEG_Y
        } else {
            dir
        }
    }

    fn fire_laser(&self, boss: &Boss, dir: Vec2, env: &mut BossEnv) {
        let kind = ProjectileKind::BossLaserBullet;
        env.ctx
            .spawn_projectile(kind, self.shot_origin(boss), dir, kind.default_speed());
    }

    fn announce_shot_halo(&self, env: &mut BossEnv) {
        env.sink.announce_boss_effect(BossEffect::ExpandingHalo {
            part: self.parts.core_body,
            time: 0.4,
            colour: LASER_COLOUR,
            size: CORE_EYE_SIZE,
            offset: Vec3::ZERO,
        });
    }

    /// Одна пуля в paddle с небольшим разбросом
    fn fire_burst_line_shot(&self, boss: &Boss, env: &mut BossEnv) {
        let jitter = env.rng.random_neg_one_to_one() * BURST_LINE_JITTER_DEGS;
        let dir = rotate_degrees(self.dir_to_paddle(boss, env), jitter);
        self.fire_laser(boss, dir, env);
        self.announce_shot_halo(env);
    }

    /// Веер: при нечётном числе - центральный выстрел, остальные парами ±10°·k
    pub(crate) fn fire_burst_wave(&self, boss: &Boss, env: &mut BossEnv) {
        let center_dir = self.dir_to_paddle(boss, env);
        let count = self.stage.num_shots_per_wave_burst();
        if count % 2 == 1 {
            self.fire_laser(boss, center_dir, env);
        }
        for k in 1..=count / 2 {
            let angle = if count % 2 == 1 {
                k as f32 * BURST_WAVE_ANGLE_INC_DEGS
            } else {
                (k as f32 - 0.5) * BURST_WAVE_ANGLE_INC_DEGS
            };
            self.fire_laser(boss, rotate_degrees(center_dir, angle), env);
            self.fire_laser(boss, rotate_degrees(center_dir, -angle), env);
        }
        self.announce_shot_halo(env);
    }

    fn execute_burst(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        self.phase_countdown -= dt;
        if self.phase_countdown > 0.0 {
            return;
        }
        match self.phase {
            AttackPhase::Warmup | AttackPhase::Active => {
                if self.state == FuturismState::BasicBurstLineFire {
                    self.fire_burst_line_shot(boss, env);
                    self.phase_countdown = self.stage.time_between_burst_line_shots(env.rng);
                } else {
                    self.fire_burst_wave(boss, env);
                    self.phase_countdown = self.stage.time_between_burst_wave_shots(env.rng);
                }
                self.phase = AttackPhase::Active;
                self.shots_left = self.shots_left.saturating_sub(1);
                if self.shots_left == 0 {
                    self.phase = AttackPhase::Cooldown;
                    self.phase_countdown = self.stage.after_attack_wait_time(self.state);
                }
            }
            AttackPhase::Cooldown => self.go_to_next_state(boss, env),
        }
    }

    fn execute_laser_beam_twitch(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        self.phase_countdown -= dt;
        if self.phase_countdown > 0.0 {
            return;
        }
        match self.phase {
            AttackPhase::Warmup | AttackPhase::Active => {
                let dir = self.dir_to_paddle(boss, env);
                env.ctx.fire_beam(
                    self.shot_origin(boss),
                    dir,
                    EYE_BEAM_HALF_RADIUS,
                    TWITCH_BEAM_EXPIRE_TIME_IN_SECS,
                );
                env.sink
                    .announce_boss_effect(BossEffect::FullscreenFlash { time: 0.2, intensity: 0.5 });
                self.phase = AttackPhase::Cooldown;
                self.phase_countdown =
                    TWITCH_BEAM_EXPIRE_TIME_IN_SECS + self.stage.after_attack_wait_time(self.state);
            }
            AttackPhase::Cooldown => self.go_to_next_state(boss, env),
        }
    }

    fn execute_laser_beam_arc(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        let hold = self.stage.beam_arc_hold_time();
        let arcing = self.stage.beam_arcing_time();
        match self.phase {
            AttackPhase::Warmup => {
                self.phase_countdown -= dt;
                if self.phase_countdown > 0.0 {
                    return;
                }
                // Луч начинает в стороне от paddle и проходит через него дугой
                let sign = env.rng.random_negative_or_positive();
                self.beam_sweep_degrees = sign * (100.0 + 30.0 * env.rng.random_zero_to_one());
                self.beam_start_dir = rotate_degrees(self.dir_to_paddle(boss, env), -self.beam_sweep_degrees / 2.0);
                self.beam_elapsed = 0.0;
                env.ctx.fire_beam(
                    self.shot_origin(boss),
                    self.beam_start_dir,
                    EYE_BEAM_HALF_RADIUS,
                    hold + arcing,
                );
                self.phase = AttackPhase::Active;
            }
            AttackPhase::Active => {
                self.beam_elapsed += dt;
                if self.beam_elapsed > hold {
                    let t = ((self.beam_elapsed - hold) / arcing).min(1.0);
                    env.ctx
                        .update_beam_direction(rotate_degrees(self.beam_start_dir, t * self.beam_sweep_degrees));
                }
                if self.beam_elapsed >= hold + arcing {
                    self.phase = AttackPhase::Cooldown;
                    self.phase_countdown = self.stage.after_attack_wait_time(self.state);
                }
            }
            AttackPhase::Cooldown => {
                self.phase_countdown -= dt;
                if self.phase_countdown <= 0.0 {
                    self.go_to_next_state(boss, env);
                }
            }
        }
    }

    /// Лучи из всех живых ламп, по направлению каждой лампы с учётом вращения ядра
    fn fire_star_beams(&self, boss: &Boss, env: &mut BossEnv) {
        let core = self.shot_origin(boss);
        let spin = boss.parts().rotation(self.parts.core_assembly).z;
        for bulb in self.parts.bulbs() {
            if !boss.is_part_alive(bulb) {
                continue;
            }
            let dir = rotate_degrees(Vec2::Y, boss.parts().rotation(bulb).z + spin);
            env.ctx.fire_beam(
                core + dir * CORE_BOSS_HALF_SIZE,
                dir,
                STAR_BEAM_HALF_RADIUS,
                STAR_BEAM_REFIRE_TIME_IN_SECS,
            );
        }
    }

    fn execute_laser_beam_star(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        let core = self.parts.core_assembly;
        match self.phase {
            AttackPhase::Warmup => {
                self.phase_countdown -= dt;
                if self.phase_countdown > 0.0 {
                    return;
                }
                self.star_spin_sign = env.rng.random_negative_or_positive();
                self.beam_elapsed = 0.0;
                self.star_refire_countdown = 0.0;
                env.sink
                    .announce_boss_effect(BossEffect::FullscreenFlash { time: 0.2, intensity: 0.5 });
                self.phase = AttackPhase::Active;
            }
            AttackPhase::Active => {
                self.beam_elapsed += dt;
                let spun = self.beam_elapsed.min(STAR_BEAM_TIME_IN_SECS);
                boss.parts_mut()
                    .set_z_rotation(core, self.star_spin_sign * STAR_ROTATION_DEGS_PER_SEC * spun);

                if self.beam_elapsed >= STAR_BEAM_TIME_IN_SECS {
                    boss.parts_mut().set_z_rotation(core, 0.0);
                    self.phase = AttackPhase::Cooldown;
                    self.phase_countdown = self.stage.after_attack_wait_time(self.state);
                    return;
                }
                self.star_refire_countdown -= dt;
                if self.star_refire_countdown <= 0.0 {
                    self.fire_star_beams(boss, env);
                    self.star_refire_countdown += STAR_BEAM_REFIRE_TIME_IN_SECS;
                }
            }
            AttackPhase::Cooldown => {
                self.phase_countdown -= dt;
                if self.phase_countdown <= 0.0 {
                    self.go_to_next_state(boss, env);
                }
            }
        }
    }

    // Мяч ----------------------------------------------------------------------------

    fn boss_radius(&self) -> f32 {
        self.half_size().max_element()
    }

    /// Мяч в игре, никем не удерживается и достаточно далеко от босса
    fn can_attract_ball(&self, boss: &Boss, ctx: &dyn BossContext) -> bool {
        if !ctx.is_ball_in_play() {
            return false;
        }
        let Some(ball) = ctx.ball() else {
            return false;
        };
        if ball.attached_to_paddle || ball.attached_to_boss {
            return false;
        }
        let min_dist = 2.0 * self.boss_radius();
        ball.center.distance_squared(boss.position()) >= min_dist * min_dist
    }

    /// Отпустить удерживаемый мяч: по прежнему курсу или прочь от босса
    fn release_ball(&mut self, away_from_boss: bool, boss: &Boss, env: &mut BossEnv) {
        if !self.ball_attached {
            return;
        }
        self.ball_attached = false;
        let away = env
            .ctx
            .ball()
            .map(|b| (b.center - self.shot_origin(boss)).normalize_or_zero())
            .unwrap_or(Vec2::ZERO);
        let dir = if away_from_boss && away != Vec2::ZERO {
            away
        } else {
            self.ball_dir_before_attach
        };
        env.ctx.detach_and_shoot_ball(dir);
        log(&format!("Futurism {}: ball released", self.stage.name()));
    }

    fn execute_ball_attract(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        let ball = match env.ctx.ball() {
            Some(ball) if env.ctx.is_ball_in_play() => ball,
            _ => {
                log(&format!("Futurism {}: ball lost during attraction", self.stage.name()));
                self.release_ball(false, boss, env);
                self.go_to_next_state(boss, env);
                return;
            }
        };
        let total = self.stage.ball_attract_time();

        if self.first_tick_of_state() {
            if !env.ctx.attach_ball_to_boss() {
                self.go_to_next_state(boss, env);
                return;
            }
            self.ball_attached = true;
            self.ball_start_pos = ball.center;
            let dir = ball.velocity.normalize_or_zero();
            self.ball_dir_before_attach = if dir == Vec2::ZERO { Vec2::NEG_Y } else { dir };
            env.sink.announce_boss_effect(BossEffect::Misc {
                kind: MiscBossEffect::AttractorBeam,
                part: self.parts.core_body,
                time: total,
            });
        }

        self.attract_elapsed += dt;
        let target = self.shot_origin(boss);
        let stop_dist = self.boss_radius() + 2.0 * ball.radius;
        let remaining = ball.center.distance(target) - stop_dist;
        let within = remaining <= 0.0;
        if !within {
            // Равномерно за всё время притяжения, без перелёта точки остановки
            let step = ((target - self.ball_start_pos) / total * dt).clamp_length_max(remaining);
            env.ctx.set_ball_position(ball.center + step);
        }

        let held_long_enough = self.attract_elapsed > BALL_ATTRACT_MIN_FRACTION * total;
        if (within && held_long_enough) || self.attract_elapsed >= total {
            self.set_state(FuturismState::Teleport, boss, env);
        }
    }

    fn execute_ball_discard(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        self.discard_countdown -= dt;
        if self.discard_countdown > 0.0 {
            return;
        }
        if self.ball_attached {
            self.ball_attached = false;
            if let Some(ball) = env.ctx.ball() {
                let away = (ball.center - self.shot_origin(boss)).normalize_or_zero();
                let base = if away == Vec2::ZERO { self.ball_dir_before_attach } else { away };
                let jitter = env.rng.random_neg_one_to_one() * BALL_DISCARD_ANGLE_DEGS;
                env.ctx.detach_and_shoot_ball(rotate_degrees(base, jitter));
                env.sink.announce_boss_effect(BossEffect::ExpandingHalo {
                    part: self.parts.core_body,
                    time: 0.5,
                    colour: LASER_COLOUR,
                    size: CORE_BOSS_SIZE,
                    offset: Vec3::ZERO,
                });
            }
        }
        self.go_to_next_state(boss, env);
    }

    // Порталы ------------------------------------------------------------------------

    fn portal_colour(&self) -> Rgba {
        PORTAL_COLOURS[self.portal_colour_idx % PORTAL_COLOURS.len()]
    }

    /// Что крутится, пока босс открывает порталы
    fn portal_spinner(&self, boss: &Boss) -> PartId {
        if boss.is_part_alive(self.parts.core_shield) {
            self.parts.core_shield
        } else {
            self.parts.core_assembly
        }
    }

    /// Под-арена, в которой стоит босс (на колонне барьера - левая)
    fn current_sub_arena(&self, boss: &Boss) -> FuturismArena {
        match self.arena {
            FuturismArena::Full => sub_arena_of(boss.position()).unwrap_or(FuturismArena::Left),
            side => side,
        }
    }

    /// Случайная точка в свободной клетке `area`: не на опасностях, не у босса и не на пути мяча
    pub fn find_portal_location(
        &self,
        area: &Aabb2,
        boss: &Boss,
        ctx: &dyn BossContext,
        rng: &mut dyn RandomSource,
    ) -> Option<Vec2> {
        let portal_size = 2.0 * PORTAL_HALF_SIZE;
        let mut blockers: Vec<Aabb2> = ctx
            .hazard_aabbs()
            .iter()
            .map(|h| h.padded(0.5 * portal_size))
            .collect();
        if let Some(aabb) = boss.alive_aabb() {
            blockers.push(aabb.padded(2.0 * portal_size));
        }
        if let Some(ball) = ctx.ball() {
            let now = ball.aabb();
            let soon = now.translated(0.5 * ball.velocity);
            blockers.push(now.union(&soon));
        }

        let cells: Vec<Aabb2> = piece_cells(area)
            .into_iter()
            .filter(|cell| !blockers.iter().any(|b| b.intersects(cell)))
            .collect();
        if cells.is_empty() {
            return None;
        }
        let cell = cells[rng.random_unsigned() as usize % cells.len()];
        let offset = Vec2::new(rng.random_zero_to_one(), rng.random_zero_to_one()) * cell.size();
        let min = area.min + PORTAL_HALF_SIZE;
        let max = (area.max - PORTAL_HALF_SIZE).max(min);
        Some((cell.min + offset).clamp(min, max))
    }

    /// Пара порталов для текущего состояния; `false` если места нет
    fn try_fire_portals(&mut self, boss: &Boss, env: &mut BossEnv) -> bool {
        let (first_area, second_area) = if self.state == FuturismState::StationaryFireStrategyPortal {
            (arena_confines(self.arena), self.stage.strategy_portal_zone())
        } else {
            let here = self.current_sub_arena(boss);
            (arena_confines(here), arena_confines(here.opposite()))
        };
        let Some(first) = self.find_portal_location(&first_area, boss, &*env.ctx, env.rng) else {
            return false;
        };
        let Some(second) = self.find_portal_location(&second_area, boss, &*env.ctx, env.rng) else {
            return false;
        };

        for position in [first, second] {
            env.ctx
                .spawn_portal(position, PORTAL_HALF_SIZE, BOSS_PORTAL_TERMINATION_TIME_IN_SECS);
        }
        env.sink.announce_boss_effect(BossEffect::SummonPortals {
            part: self.parts.core_body,
            time: PORTAL_SPAWN_EFFECT_TIME_IN_SECS,
            colour: self.portal_colour(),
            positions: vec![first, second],
        });
        if self.state == FuturismState::StationaryFireStrategyPortal {
            self.time_since_strategy_portal = 0.0;
        } else {
            self.time_since_weapon_portal = 0.0;
        }
        log(&format!(
            "Futurism {}: portals opened at {:?} and {:?}",
            self.stage.name(),
            first,
            second
        ));
        true
    }

    /// Стоим и крутим ядро; на середине открываем порталы (если места нет - пробуем каждый тик)
    fn execute_portal(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        self.portal_state_countdown -= dt;
        let spinner = self.portal_spinner(boss);
        let t = (1.0 - self.portal_state_countdown / self.portal_state_total).clamp(0.0, 1.0);
        boss.parts_mut().set_z_rotation(spinner, t * PORTAL_CORE_SPIN_DEGREES);

        if !self.portal_fired {
            self.portal_shot_countdown -= dt;
            if self.portal_shot_countdown <= 0.0 {
                self.portal_fired = self.try_fire_portals(boss, env);
            }
        }

        if self.portal_state_countdown <= 0.0 {
            boss.parts_mut().set_z_rotation(spinner, 0.0);
            if !self.portal_fired {
                log(&format!("Futurism {}: no room for portals", self.stage.name()));
            }
            self.go_to_next_state(boss, env);
        }
    }

    // Под-состояния ------------------------------------------------------------------

    fn execute_move_to_position(&mut self, boss: &mut Boss, env: &mut BossEnv) {
        if self.motion.move_to_target_position(boss.position(), self.stage.max_speed()) {
            self.go_to_next_state(boss, env);
        }
    }

    fn execute_teleport(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        let fast = self.state == FuturismState::AvoidanceTeleport;
        if !self.teleport_announced {
            self.teleport_announced = true;
            if fast {
                env.sink.clear_active_boss_effects();
            }
            env.sink.announce_boss_effect(BossEffect::Teleport {
                kind: if fast { TeleportKind::FastOut } else { TeleportKind::Out },
                position: boss.position(),
                time: self.teleport_out_countdown,
            });
        }

        if !self.teleported {
            if self.teleport_out_countdown > 0.0 {
                self.teleport_out_countdown -= dt;
                return;
            }
            match self.find_teleport_location(boss, &*env.ctx, env.rng) {
                Some(location) => {
                    if !fast {
                        env.sink
                            .announce_boss_effect(BossEffect::FullscreenFlash { time: 0.4, intensity: 1.0 });
                    }
                    env.sink.announce_boss_effect(BossEffect::Teleport {
                        kind: TeleportKind::In,
                        position: location,
                        time: self.teleport_in_countdown,
                    });
                    let delta = location - boss.position();
                    boss.translate(delta);
                    if self.ball_attached {
                        if let Some(ball) = env.ctx.ball() {
                            env.ctx.set_ball_position(ball.center + delta);
                        }
                    }
                    if self.arena != FuturismArena::Full {
                        if let Some(side) = sub_arena_of(location) {
                            self.arena = side;
                        }
                    }
                    self.teleported = true;
                    log(&format!("Futurism {}: teleported to {:?}", self.stage.name(), location));
                }
                None => {
                    // Пробуем снова на следующих тиках
                    self.teleport_search_time += dt;
                    if self.teleport_search_time >= TELEPORT_GIVE_UP_TIME_IN_SECS {
                        env.sink.announce_boss_effect(BossEffect::Teleport {
                            kind: TeleportKind::Failed,
                            position: boss.position(),
                            time: self.teleport_in_countdown,
                        });
                        log(&format!("Futurism {}: teleport failed, no free location", self.stage.name()));
                        self.release_ball(false, boss, env);
                        self.go_to_next_state(boss, env);
                    }
                }
            }
            return;
        }

        self.teleport_in_countdown -= dt;
        if self.teleport_in_countdown <= 0.0 {
            if self.ball_attached {
                self.set_state(FuturismState::BallDiscard, boss, env);
            } else {
                self.go_to_next_state(boss, env);
            }
        }
    }

    fn execute_frozen(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        self.frozen_countdown -= dt;
        if self.frozen_countdown > 0.0 {
            return;
        }
        env.sink
            .announce_boss_effect(BossEffect::FullscreenFlash { time: 0.15, intensity: 0.5 });
        self.go_to_next_state(boss, env);
    }

    /// Заряд, затем луч сверху вниз по колонне барьера; ядро раскручивается
    fn execute_destroy_level_barrier(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        match self.phase {
            AttackPhase::Warmup => {
                if self.first_tick_of_state() {
                    env.sink.announce_boss_effect(BossEffect::PowerCharge {
                        part: self.parts.core_body,
                        time: TIME_UNTIL_BARRIER_DESTRUCTION_SHOT_IN_SECS,
                        colour: CHARGE_COLOUR,
                        size: CORE_BOSS_SIZE,
                        offset: Vec3::ZERO,
                    });
                }
                self.phase_countdown -= dt;
                if self.phase_countdown > 0.0 {
                    return;
                }

                let pieces = env.ctx.barrier_piece_centers();
                let (Some(top), Some(bottom)) = (pieces.first().copied(), pieces.last().copied()) else {
                    self.finish_barrier_destruction(boss, env);
                    return;
                };
                self.barrier_origin = self.shot_origin(boss);
                self.barrier_start_dir = (top - self.barrier_origin).normalize_or_zero();
                let end_dir = (bottom - self.barrier_origin).normalize_or_zero();
                self.barrier_sweep_degrees = signed_angle_degrees(self.barrier_start_dir, end_dir);
                self.beam_elapsed = 0.0;

                env.ctx.fire_beam(
                    self.barrier_origin,
                    self.barrier_start_dir,
                    EYE_BEAM_HALF_RADIUS,
                    BARRIER_DESTRUCTION_ARC_TIME_IN_SECS + dt,
                );
                env.sink
                    .announce_boss_effect(BossEffect::FullscreenFlash { time: 0.3, intensity: 1.0 });
                boss.parts_mut().animate_rotation(
                    self.parts.core_assembly,
                    MultiLerp::simple(
                        0.0,
                        BARRIER_DESTRUCTION_ARC_TIME_IN_SECS,
                        Vec3::ZERO,
                        Vec3::new(0.0, 0.0, BARRIER_CORE_SPIN_DEGREES),
                    ),
                );
                self.phase = AttackPhase::Active;
            }
            AttackPhase::Active => {
                self.beam_elapsed += dt;
                let t = (self.beam_elapsed / BARRIER_DESTRUCTION_ARC_TIME_IN_SECS).min(1.0);
                let dir = rotate_degrees(self.barrier_start_dir, t * self.barrier_sweep_degrees);
                env.ctx.update_beam_direction(dir);
                self.destroy_swept_barrier_pieces(t, dir, env);
                if t >= 1.0 {
                    self.finish_barrier_destruction(boss, env);
                }
            }
            AttackPhase::Cooldown => {}
        }
    }

    /// Разрушить блоки барьера, которые луч уже прошёл (`t` - доля дуги)
    fn destroy_swept_barrier_pieces(&self, t: f32, dir: Vec2, env: &mut BossEnv) {
        let pieces = env.ctx.barrier_piece_centers();
        for (idx, center) in pieces.into_iter().enumerate() {
            let passed = if self.barrier_sweep_degrees.abs() < f32::EPSILON {
                t >= 1.0
            } else {
                let to_piece = (center - self.barrier_origin).normalize_or_zero();
                signed_angle_degrees(self.barrier_start_dir, to_piece) / self.barrier_sweep_degrees <= t
            };
            if (passed || t >= 1.0) && env.ctx.destroy_barrier_piece(idx) {
                env.sink.announce_general_effect(GeneralEffect::BarrierBlockDisintegration {
                    position: center,
                    direction: dir,
                    time: BARRIER_BLOCK_DISINTEGRATION_TIME,
                });
            }
        }
    }

    fn finish_barrier_destruction(&mut self, boss: &mut Boss, env: &mut BossEnv) {
        let parts = boss.parts_mut();
        parts.clear_transform_anims(self.parts.core_assembly);
        parts.set_z_rotation(self.parts.core_assembly, 0.0);
        self.arena = FuturismArena::Full;
        log_info(&format!("Futurism {}: level barrier destroyed", self.stage.name()));
        self.go_to_next_state(boss, env);
    }

    fn execute_shield_part_cracked(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        self.hurt_countdown -= dt;
        if self.hurt_countdown > 0.0 {
            return;
        }
        let alive_root = boss.alive_root();
        boss.parts_mut().clear_transform_anims(alive_root);
        self.go_to_next_state(boss, env);
    }

    fn execute_shield_part_destroyed(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        self.hurt_countdown -= dt;
        if self.hurt_countdown > 0.0 {
            return;
        }
        let alive_root = boss.alive_root();
        boss.parts_mut().clear_transform_anims(alive_root);
        if self.all_stage_shields_destroyed(boss) {
            self.set_state(FuturismState::Angry, boss, env);
        } else {
            self.go_to_next_state(boss, env);
        }
    }

    fn execute_bulb_hit_and_destroyed(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        self.hurt_countdown -= dt;
        if self.hurt_countdown > 0.0 {
            return;
        }
        let alive = boss.alive_root();
        let parts = boss.parts_mut();
        parts.set_colour(alive, Rgba::WHITE);
        parts.clear_transform_anims(alive);
        if self.all_bulbs_destroyed(boss) {
            self.set_state(FuturismState::FinalDeathThroes, boss, env);
        } else {
            self.go_to_next_state(boss, env);
        }
    }

    fn execute_angry(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        self.angry_countdown -= dt;
        if self.angry_countdown > 0.0 {
            return;
        }
        stop_angry_anims(boss);
        let Some(next_stage) = self.stage.next() else {
            self.set_state(FuturismState::FinalDeathThroes, boss, env);
            return;
        };
        if !boss.has_pending_ai_state() {
            let next = FuturismAi::new(next_stage, self.parts.clone(), boss, env.rng);
            boss.set_next_ai_state(BossAi::Futurism(next));
        }
    }

    /// Опасность (ракета, ледяной заряд) подлетела вплотную
    fn hazard_nearby(&self, boss: &Boss, ctx: &dyn BossContext) -> bool {
        let Some(aabb) = boss.alive_aabb() else {
            return false;
        };
        let grown = Aabb2::new(aabb.min - Vec2::splat(AVOIDANCE_DISTANCE), aabb.max + Vec2::splat(AVOIDANCE_DISTANCE));
        ctx.hazard_aabbs().iter().any(|h| h.intersects(&grown))
    }

    fn ball_hit_direction(env: &BossEnv) -> (Vec2, f32) {
        match env.ctx.ball() {
            Some(ball) => (ball.velocity.normalize_or_zero(), 2.0 * ball.radius),
            None => (Vec2::Y, 1.0),
        }
    }
}

impl BossAiStage for FuturismAi {
    fn update(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        self.time_since_strategy_portal += dt;
        self.time_since_weapon_portal += dt;

        // В последней стадии босс уходит от ракет и ледяных зарядов телепортом
        if self.stage == FuturismStage::Stage3 {
            self.avoidance_cooldown = (self.avoidance_cooldown - dt).max(0.0);
            if self.state.can_avoid() && self.avoidance_cooldown <= 0.0 && self.hazard_nearby(boss, &*env.ctx) {
                self.avoidance_cooldown = AVOIDANCE_COOLDOWN_IN_SECS;
                self.set_state(FuturismState::AvoidanceTeleport, boss, env);
            }
        }

        match self.state {
            FuturismState::MoveToPosition => self.execute_move_to_position(boss, env),
            FuturismState::Teleport | FuturismState::AvoidanceTeleport => self.execute_teleport(dt, boss, env),
            FuturismState::Frozen => self.execute_frozen(dt, boss, env),
            FuturismState::BasicBurstLineFire | FuturismState::BasicBurstWaveFire => {
                self.execute_burst(dt, boss, env)
            }
            FuturismState::LaserBeamTwitch => self.execute_laser_beam_twitch(dt, boss, env),
            FuturismState::LaserBeamArc => self.execute_laser_beam_arc(dt, boss, env),
            FuturismState::LaserBeamStar => self.execute_laser_beam_star(dt, boss, env),
            FuturismState::BallAttract => self.execute_ball_attract(dt, boss, env),
            FuturismState::BallDiscard => self.execute_ball_discard(dt, boss, env),
            FuturismState::StationaryFireStrategyPortal | FuturismState::StationaryFireWeaponPortal => {
                self.execute_portal(dt, boss, env)
            }
            FuturismState::DestroyLevelBarrier => self.execute_destroy_level_barrier(dt, boss, env),
            FuturismState::ShieldPartCracked => self.execute_shield_part_cracked(dt, boss, env),
            FuturismState::ShieldPartDestroyed => self.execute_shield_part_destroyed(dt, boss, env),
            FuturismState::BulbHitAndDestroyed => self.execute_bulb_hit_and_destroyed(dt, boss, env),
            FuturismState::Angry => self.execute_angry(dt, boss, env),
            FuturismState::FinalDeathThroes => {}
        }
        self.motion.update_movement(dt, boss);
        keep_inside_level(boss, env.ctx.level_width(), env.ctx.level_height());
    }

    fn on_ball_collision(&mut self, boss: &mut Boss, part: PartId, env: &mut BossEnv) {
        if self.state.ignores_damage() || !boss.is_part_alive(part) {
            return;
        }
        match self.stage {
            FuturismStage::Stage1 => {}
            FuturismStage::Stage2 => {
                if part != self.parts.core_shield {
                    return;
                }
                let (dir, magnitude) = Self::ball_hit_direction(env);
                // Мячом щит ядра можно треснуть только замороженным
                if boss.parts().is_weakpoint(part) {
                    self.destroy_shield(ShieldLimb::Core, dir, boss, env);
                } else if self.state == FuturismState::Frozen {
                    self.weaken_shield(ShieldLimb::Core, dir, magnitude, boss, env);
                }
            }
            FuturismStage::Stage3 => {
                if !self.parts.bulbs().contains(&part) {
                    return;
                }
                if boss.ball_hit_weakpoint(part, env.sink) != DiminishOutcome::Destroyed {
                    return;
                }
                env.sink.announce_boss_effect(BossEffect::Misc {
                    kind: MiscBossEffect::BulbExplosion,
                    part,
                    time: 1.0,
                });
                boss.kill_part_or_log(part);
                self.bulbs_destroyed += 1;
                log_info(&format!("Futurism {}: bulb {:?} destroyed", self.stage.name(), part));
                self.set_state(FuturismState::BulbHitAndDestroyed, boss, env);
            }
        }
    }

    fn on_projectile_collision(&mut self, boss: &mut Boss, kind: ProjectileKind, part: PartId, env: &mut BossEnv) {
        if self.state.ignores_damage() || !boss.is_part_alive(part) {
            return;
        }
        let hit_dir = self.hurt_direction(boss, env);
        match self.stage {
            FuturismStage::Stage1 => {
                if !kind.is_rocket() {
                    return;
                }
                let Some(limb) = self.parts.limb_of(part).filter(|l| *l != ShieldLimb::Core) else {
                    return;
                };
                self.hit_shield(limb, hit_dir, PIECE_WIDTH, boss, env);
            }
            FuturismStage::Stage2 => {
                let on_core = part == self.parts.core_shield || part == self.parts.core_body;
                if !on_core {
                    return;
                }
                if kind == ProjectileKind::PaddleIceBlast {
                    self.freeze(boss, env);
                } else if kind.is_rocket() {
                    self.hit_shield(ShieldLimb::Core, hit_dir, PIECE_WIDTH, boss, env);
                }
            }
            FuturismStage::Stage3 => {
                let on_core = part == self.parts.core_body || self.parts.bulbs().contains(&part);
                if on_core && kind == ProjectileKind::PaddleIceBlast {
                    self.freeze(boss, env);
                }
            }
        }
    }

    fn total_life_percent(&self, boss: &Boss) -> f32 {
        if self.state == FuturismState::FinalDeathThroes {
            return 0.0;
        }
        ((self.stage.stages_remaining_after() + self.stage_life_fraction(boss)) / 3.0).clamp(0.0, 1.0)
    }

    fn is_finished(&self) -> bool {
        self.state == FuturismState::FinalDeathThroes
            || (self.state == FuturismState::BulbHitAndDestroyed
                && self.bulbs_destroyed as usize >= self.parts.bulbs().len())
    }

    fn stage_name(&self) -> &'static str {
        self.stage.name()
    }

    fn state_name(&self) -> &'static str {
        match self.state {
            FuturismState::MoveToPosition => "MoveToPositionAIState",
            FuturismState::Teleport => "TeleportAIState",
            FuturismState::AvoidanceTeleport => "AvoidanceTeleportAIState",
            FuturismState::Frozen => "FrozenAIState",
            FuturismState::BasicBurstLineFire => "BasicBurstLineFireAIState",
            FuturismState::BasicBurstWaveFire => "BasicBurstWaveFireAIState",
            FuturismState::LaserBeamTwitch => "LaserBeamTwitchAIState",
            FuturismState::LaserBeamArc => "LaserBeamArcAIState",
            FuturismState::LaserBeamStar => "LaserBeamStarAIState",
            FuturismState::BallAttract => "BallAttractAIState",
            FuturismState::BallDiscard => "BallDiscardAIState",
            FuturismState::StationaryFireStrategyPortal => "StationaryFireStrategyPortalAIState",
            FuturismState::StationaryFireWeaponPortal => "StationaryFireWeaponPortalAIState",
            FuturismState::DestroyLevelBarrier => "DestroyLevelBarrierAIState",
            FuturismState::ShieldPartCracked => "ShieldPartCrackedAIState",
            FuturismState::ShieldPartDestroyed => "ShieldPartDestroyedAIState",
            FuturismState::BulbHitAndDestroyed => "BulbHitAndDestroyedAIState",
            FuturismState::Angry => "AngryAIState",
            FuturismState::FinalDeathThroes => "FinalDeathThroesAIState",
        }
    }

    fn vulnerable_parts(&self, boss: &Boss) -> Vec<(PartId, DamageChannel)> {
        if self.state.ignores_damage() {
            return Vec::new();
        }
        match self.stage {
            FuturismStage::Stage1 => self
                .parts
                .outer_shields()
                .into_iter()
                .filter(|s| boss.is_part_alive(*s))
                .map(|s| (s, DamageChannel::Projectile(ProjectileKind::PaddleRocket)))
                .collect(),
            FuturismStage::Stage2 => {
                let shield = self.parts.core_shield;
                if !boss.is_part_alive(shield) {
                    return Vec::new();
                }
                let mut result = vec![(shield, DamageChannel::Projectile(ProjectileKind::PaddleRocket))];
                if boss.parts().is_weakpoint(shield) || self.state == FuturismState::Frozen {
                    result.push((shield, DamageChannel::Ball));
                }
                result
            }
            FuturismStage::Stage3 => self
                .parts
                .bulbs()
                .into_iter()
                .filter(|b| boss.is_part_alive(*b))
                .map(|b| (b, DamageChannel::Ball))
                .collect(),
        }
    }
}
