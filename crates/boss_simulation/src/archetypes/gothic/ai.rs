//! Стадии Gothic-Romantic босса: FireBall → IceBall → FreeMoving.
//!
//! В FireBall/IceBall босс перелетает между углами и центром confines и
//! атакует оттуда. FreeMoving - после разрушения confines, по всему уровню.

use bevy::prelude::*;

use super::{
    confines, GothicParts, DEFAULT_ACCELERATION, DELAY_BEFORE_SUMMONING_ITEMS_IN_SECS, NUM_LEGS, TOTAL_HEIGHT,
    TOTAL_WIDTH_WITH_LEGS,
};
use crate::ai::{keep_inside_level, summon_probability, BossAi, BossAiStage, BossEnv, DamageChannel, Motion};
use crate::anim::MultiLerp;
use crate::archetypes::drop_off_part;
use crate::boss::{anims, Boss};
use crate::config::{HALF_PIECE_HEIGHT, HALF_PIECE_WIDTH, PIECE_HEIGHT, PIECE_WIDTH};
use crate::context::{ItemKind, ProjectileKind};
use crate::effects::{BossEffect, GeneralEffect, MiscBossEffect};
use crate::geometry::{lerp, rotate_degrees, Aabb2, Rgba};
use crate::logger::log;
use crate::parts::{DiminishOutcome, PartId, INVULNERABLE_TIME_IN_SECS};
use crate::random::RandomSource;

pub const WEAKPOINT_LIFE_POINTS: f32 = 300.0;
pub const NUM_OF_TOP_POINT_HITS: u32 = 5;
pub const NUM_OF_BOTTOM_POINT_HITS: u32 = 5;
pub const NUM_OF_BODY_HITS: u32 = 6;

pub const DEFAULT_LASER_SPIN_DEGREES_PER_SEC: f32 = 360.0;
pub const GLITCH_TIME_IN_SECS: f32 = 1.5;
pub const DESTROY_CONFINES_CHARGE_TIME_IN_SECS: f32 = 2.0;
pub const DESTROY_CONFINES_FLASH_TIME_IN_SECS: f32 = 2.5;
pub const ORB_SHOT_INTERVAL_IN_SECS: f32 = 0.5;
pub const NUM_ORBS_PER_ATTACK: u32 = 3;

const MOVE_X_BORDER: f32 = HALF_PIECE_WIDTH;
const MOVE_Y_BORDER: f32 = HALF_PIECE_HEIGHT;
const LIMB_FALL_TIME: f32 = 2.0;

/// Предметы, которые босс призывает (все вредят игроку)
const SUMMON_ITEMS: [ItemKind; 7] = [
    ItemKind::ShrinkPaddle,
    ItemKind::BallSpeedUp,
    ItemKind::InvisiPaddle,
    ItemKind::PoisonPaddle,
    ItemKind::UpsideDownPaddle,
    ItemKind::CrazyBall,
    ItemKind::BlackoutLevel,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GothicStage {
    FireBall,
    IceBall,
    FreeMoving,
}

impl GothicStage {
    pub fn name(&self) -> &'static str {
        match self {
            GothicStage::FireBall => "FireBallAI",
            GothicStage::IceBall => "IceBallAI",
            GothicStage::FreeMoving => "FreeMovingAttackAI",
        }
    }

    fn num_summoned_items(&self) -> usize {
        match self {
            GothicStage::FireBall => 2,
            GothicStage::IceBall | GothicStage::FreeMoving => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GothicState {
    BasicMoveAndShoot,
    SpinLaserAttack,
    OrbProjectileAttack,
    SummonItems,
    HurtTop,
    HurtBottom,
    Glitch,
    MoveToCenterOfLevel,
    DestroyConfines,
    FinalDeathThroes,
}

/// Позиции внутри confines; порядок углов важен для выбора следующего угла
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfinedMovePos {
    TopLeftCorner = 0,
    TopRightCorner = 1,
    BottomLeftCorner = 2,
    BottomRightCorner = 3,
    Center = 4,
}

impl ConfinedMovePos {
    const CORNERS: [ConfinedMovePos; 4] = [
        ConfinedMovePos::TopLeftCorner,
        ConfinedMovePos::TopRightCorner,
        ConfinedMovePos::BottomLeftCorner,
        ConfinedMovePos::BottomRightCorner,
    ];

    const ALL: [ConfinedMovePos; 5] = [
        ConfinedMovePos::TopLeftCorner,
        ConfinedMovePos::TopRightCorner,
        ConfinedMovePos::BottomLeftCorner,
        ConfinedMovePos::BottomRightCorner,
        ConfinedMovePos::Center,
    ];

    /// Любая позиция, кроме текущей
    pub fn random_other(curr: ConfinedMovePos, rng: &mut dyn RandomSource) -> ConfinedMovePos {
        let idx = (curr as u32 + 1 + rng.random_unsigned() % 4) % 5;
        Self::ALL[idx as usize]
    }

    /// Угол, отличный от текущего (из центра - любой)
    pub fn random_corner(curr: ConfinedMovePos, rng: &mut dyn RandomSource) -> ConfinedMovePos {
        if curr == ConfinedMovePos::Center {
            return Self::CORNERS[(rng.random_unsigned() % 4) as usize];
        }
        Self::CORNERS[((curr as u32 + 1 + rng.random_unsigned() % 3) % 4) as usize]
    }

    pub fn is_top(&self) -> bool {
        matches!(self, ConfinedMovePos::TopLeftCorner | ConfinedMovePos::TopRightCorner)
    }

    /// Центр босса для этой позиции внутри `area`
    pub fn boss_center(&self, area: &Aabb2) -> Vec2 {
        let left = area.min.x + MOVE_X_BORDER + TOTAL_WIDTH_WITH_LEGS / 2.0;
        let right = area.max.x - (MOVE_X_BORDER + TOTAL_WIDTH_WITH_LEGS / 2.0);
        let top = area.max.y - (MOVE_Y_BORDER + TOTAL_HEIGHT / 2.0);
        let bottom = area.min.y + MOVE_Y_BORDER + TOTAL_HEIGHT / 2.0;
        match self {
            ConfinedMovePos::TopLeftCorner => Vec2::new(left, top),
            ConfinedMovePos::TopRightCorner => Vec2::new(right, top),
            ConfinedMovePos::BottomLeftCorner => Vec2::new(left, bottom),
            ConfinedMovePos::BottomRightCorner => Vec2::new(right, bottom),
            ConfinedMovePos::Center => area.center(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GothicAi {
    stage: GothicStage,
    parts: GothicParts,
    state: GothicState,
    motion: Motion,
    weakpoint: PartId,

    next_move_pos: ConfinedMovePos,
    next_attack: GothicState,
    attacks_since_last_summon: u32,
    shoot_countdown: f32,
    attack_countdown: f32,
    laser_spin_rot_anim: MultiLerp<f32>,
    orbs_left: u32,
    summon_countdown: f32,
    summon_positions: Vec<Vec2>,
    hurt_countdown: f32,
    glitch_countdown: f32,
    charge_countdown: f32,
    flash_countdown: f32,
    charge_complete: bool,
    death_countdown: f32,
    /// Первый тик текущего состояния уже отработал
    state_entered: bool,
    finished: bool,
}

impl GothicAi {
    pub fn new(stage: GothicStage, parts: GothicParts, boss: &mut Boss, rng: &mut dyn RandomSource) -> Self {
        // Мяч не ранит острия: урон только от fire globs / ice blasts
        let weakpoint = match stage {
            GothicStage::FireBall => {
                boss.make_weakpoint_or_log(parts.top_point, WEAKPOINT_LIFE_POINTS, 0.0);
                parts.top_point
            }
            GothicStage::IceBall => {
                boss.make_weakpoint_or_log(parts.bottom_point, WEAKPOINT_LIFE_POINTS, 0.0);
                parts.bottom_point
            }
            GothicStage::FreeMoving => {
                boss.make_weakpoint_or_log(
                    parts.body,
                    WEAKPOINT_LIFE_POINTS,
                    WEAKPOINT_LIFE_POINTS / NUM_OF_BODY_HITS as f32,
                );
                parts.body
            }
        };

        let mut ai = Self {
            stage,
            parts,
            state: GothicState::BasicMoveAndShoot,
            motion: Motion::new(DEFAULT_ACCELERATION),
            weakpoint,
            next_move_pos: ConfinedMovePos::Center,
            next_attack: GothicState::SpinLaserAttack,
            attacks_since_last_summon: 0,
            shoot_countdown: 0.0,
            attack_countdown: 0.0,
            laser_spin_rot_anim: MultiLerp::constant(0.0),
            orbs_left: 0,
            summon_countdown: 0.0,
            summon_positions: Vec::new(),
            hurt_countdown: 0.0,
            glitch_countdown: 0.0,
            charge_countdown: 0.0,
            flash_countdown: 0.0,
            charge_complete: false,
            death_countdown: 0.0,
            state_entered: false,
            finished: false,
        };

        match stage {
            GothicStage::FireBall => {
                ai.next_move_pos = ConfinedMovePos::random_other(ConfinedMovePos::Center, rng);
                ai.next_attack = GothicState::SpinLaserAttack;
                ai.set_state(GothicState::BasicMoveAndShoot, boss, rng);
                // Не стреляем во время первого подлёта
                ai.shoot_countdown = f32::MAX;
            }
            GothicStage::IceBall | GothicStage::FreeMoving => {
                ai.setup_next_attack_state_and_move(boss, rng);
            }
        }
        ai
    }

    pub fn stage(&self) -> GothicStage {
        self.stage
    }

    pub fn state(&self) -> GothicState {
        self.state
    }

    pub fn next_attack(&self) -> GothicState {
        self.next_attack
    }

    pub fn next_move_pos(&self) -> ConfinedMovePos {
        self.next_move_pos
    }

    pub fn attacks_since_last_summon(&self) -> u32 {
        self.attacks_since_last_summon
    }

    pub fn charge_countdown(&self) -> f32 {
        self.charge_countdown
    }

    /// Область движения: confines, а после их разрушения - весь уровень
    pub fn movement_area(&self, level_width: f32, level_height: f32) -> Aabb2 {
        match self.stage {
            GothicStage::FireBall | GothicStage::IceBall => confines(level_width, level_height),
            GothicStage::FreeMoving => Aabb2::new(
                Vec2::new(0.0, 6.0 * PIECE_HEIGHT),
                Vec2::new(level_width, level_height),
            ),
        }
    }

    fn life(&self, boss: &Boss) -> f32 {
        boss.parts().life_percentage(self.weakpoint)
    }

    fn shoot_countdown_for_moving(rng: &mut dyn RandomSource) -> f32 {
        0.2 + rng.random_zero_to_one() * 0.25
    }

    fn shoot_countdown_for_spinning(rng: &mut dyn RandomSource) -> f32 {
        0.075 + rng.random_zero_to_one() * 0.2
    }

    fn laser_spin_time(rng: &mut dyn RandomSource) -> f32 {
        5.0 + rng.random_zero_to_one() * 4.0
    }

    fn free_move_attack_time(rng: &mut dyn RandomSource) -> f32 {
        4.0 + rng.random_zero_to_one() * 3.0
    }

    /// Вероятность орбов растёт вместе с жизнью: 0.33 → 0.66
    fn orb_attack_probability(&self, boss: &Boss) -> f32 {
        lerp(0.33, 0.66, self.life(boss))
    }

    /// Медленнее всего на полной жизни
    fn move_speed(&self, boss: &Boss) -> f32 {
        let base = match self.stage {
            GothicStage::FireBall | GothicStage::IceBall => PIECE_WIDTH,
            GothicStage::FreeMoving => 2.0 * PIECE_WIDTH,
        };
        base * (1.0 + (1.0 - self.life(boss)))
    }

    fn attack_for_move_pos(pos: ConfinedMovePos, orb_probability: f32, rng: &mut dyn RandomSource) -> GothicState {
        let threshold = match pos {
            ConfinedMovePos::Center => return GothicState::SummonItems,
            p if p.is_top() => 1.25 * orb_probability,
            _ => orb_probability,
        };
        if rng.random_zero_to_one() <= threshold {
            GothicState::OrbProjectileAttack
        } else {
            GothicState::SpinLaserAttack
        }
    }

    /// Выбор следующей атаки: призыв по нарастающей вероятности, иначе угол
    fn setup_next_attack_state_and_move(&mut self, boss: &mut Boss, rng: &mut dyn RandomSource) {
        let summon_prob = summon_probability(self.attacks_since_last_summon);
        let summon = rng.random_zero_to_one() < summon_prob;

        if self.stage == GothicStage::FreeMoving {
            self.next_attack = if summon {
                GothicState::SummonItems
            } else if rng.random_zero_to_one() <= self.orb_attack_probability(boss) {
                GothicState::OrbProjectileAttack
            } else {
                GothicState::SpinLaserAttack
            };
        } else if summon {
            self.next_attack = GothicState::SummonItems;
            self.next_move_pos = ConfinedMovePos::Center;
        } else {
            self.next_move_pos = ConfinedMovePos::random_corner(self.next_move_pos, rng);
            self.next_attack = Self::attack_for_move_pos(self.next_move_pos, self.orb_attack_probability(boss), rng);
        }
        self.set_state(GothicState::BasicMoveAndShoot, boss, rng);
    }

    fn set_state(&mut self, new_state: GothicState, boss: &mut Boss, rng: &mut dyn RandomSource) {
        // Вращение всегда сбрасывается при выходе из атаки
        let alive = boss.alive_root();
        boss.parts_mut().set_y_rotation(alive, 0.0);

        match new_state {
            GothicState::BasicMoveAndShoot => {
                self.shoot_countdown = Self::shoot_countdown_for_moving(rng);
                self.attack_countdown = Self::free_move_attack_time(rng);
                if self.stage == GothicStage::FreeMoving {
                    let dir = rotate_degrees(Vec2::X, 45.0 + 90.0 * (rng.random_unsigned() % 4) as f32);
                    self.motion.desired_vel = self.move_speed(boss) * dir;
                } else {
                    self.motion.stop();
                }
            }
            GothicState::SpinLaserAttack => {
                self.motion.stop();
                self.shoot_countdown = Self::shoot_countdown_for_spinning(rng);
                let spin_time = Self::laser_spin_time(rng);
                self.laser_spin_rot_anim =
                    MultiLerp::simple(0.0, spin_time, 0.0, DEFAULT_LASER_SPIN_DEGREES_PER_SEC * spin_time);
                self.attacks_since_last_summon += 1;
            }
            GothicState::OrbProjectileAttack => {
                self.motion.stop();
                self.orbs_left = NUM_ORBS_PER_ATTACK;
                self.shoot_countdown = ORB_SHOT_INTERVAL_IN_SECS;
                self.attacks_since_last_summon += 1;
            }
            GothicState::SummonItems => {
                self.motion.stop();
                self.summon_countdown = DELAY_BEFORE_SUMMONING_ITEMS_IN_SECS;
                self.summon_positions.clear();
                self.attacks_since_last_summon = 0;
            }
            GothicState::HurtTop | GothicState::HurtBottom => {
                self.motion.stop();
                self.hurt_countdown = INVULNERABLE_TIME_IN_SECS;
            }
            GothicState::Glitch => {
                self.motion.stop();
                self.glitch_countdown = GLITCH_TIME_IN_SECS;
            }
            GothicState::MoveToCenterOfLevel => {
                self.motion.stop();
            }
            GothicState::DestroyConfines => {
                self.motion.stop();
                self.charge_countdown = DESTROY_CONFINES_CHARGE_TIME_IN_SECS;
                self.flash_countdown = DESTROY_CONFINES_FLASH_TIME_IN_SECS;
                self.charge_complete = false;
            }
            GothicState::FinalDeathThroes => {
                self.motion.stop();
                self.death_countdown = anims::TOTAL_DEATH_ANIM_TIME;
            }
        }
        if self.state != new_state {
            log(&format!("Gothic {}: {:?} -> {:?}", self.stage.name(), self.state, new_state));
        }
        self.state = new_state;
        self.state_entered = false;
    }

    /// `true` ровно один раз - на первом тике состояния
    fn first_tick_of_state(&mut self) -> bool {
        !std::mem::replace(&mut self.state_entered, true)
    }

    // Выстрелы ---------------------------------------------------------------

    fn shoot_laser_from_leg_point(&self, leg_idx: usize, boss: &Boss, env: &mut BossEnv) {
        let spawn = self.parts.leg_point_pos(boss.parts(), leg_idx);
        let to_paddle = (env.ctx.paddle().center - spawn).normalize_or_zero();
        let dir = rotate_degrees(to_paddle, env.rng.random_neg_one_to_one() * 30.0);
        env.ctx.spawn_projectile(
            ProjectileKind::BossLaserBullet,
            spawn,
            dir,
            ProjectileKind::BossLaserBullet.default_speed(),
        );
    }

    fn shoot_laser_from_body(&self, boss: &Boss, env: &mut BossEnv) {
        let spawn = self.parts.bottom_point_tip_pos(boss.parts());
        let to_paddle = (env.ctx.paddle().center - spawn).normalize_or_zero();
        let dir = rotate_degrees(to_paddle, env.rng.random_neg_one_to_one() * 22.5);
        env.ctx.spawn_projectile(
            ProjectileKind::BossLaserBullet,
            spawn,
            dir,
            ProjectileKind::BossLaserBullet.default_speed(),
        );
    }

    fn shoot_orb(&self, boss: &Boss, env: &mut BossEnv) {
        let spawn = boss.position();
        let dir = (env.ctx.paddle().center - spawn).normalize_or_zero();
        env.ctx.spawn_projectile(
            ProjectileKind::BossOrbBullet,
            spawn,
            dir,
            ProjectileKind::BossOrbBullet.default_speed(),
        );
    }

    // Под-состояния -----------------------------------------------------------

    fn execute_basic_move_and_shoot(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        if self.shoot_countdown <= 0.0 {
            self.shoot_laser_from_body(boss, env);
            self.shoot_countdown = Self::shoot_countdown_for_moving(env.rng);
        } else {
            self.shoot_countdown -= dt;
        }

        let area = self.movement_area(env.ctx.level_width(), env.ctx.level_height());

        if self.stage == GothicStage::FreeMoving {
            let half = Vec2::new(TOTAL_WIDTH_WITH_LEGS, TOTAL_HEIGHT) / 2.0;
            let bounds = Aabb2::new(area.min + half, area.max - half);
            let speed = self.move_speed(boss);
            self.motion.reflect_within(boss.position(), &bounds, speed, env.rng);

            self.attack_countdown -= dt;
            if self.attack_countdown <= 0.0 {
                let next = self.next_attack;
                self.set_state(next, boss, env.rng);
            }
            return;
        }

        let boss_pos = boss.position();
        let move_to = self.next_move_pos.boss_center(&area);
        if boss_pos.distance(move_to) < HALF_PIECE_WIDTH {
            self.motion.stop();
            let next = self.next_attack;
            self.set_state(next, boss, env.rng);
            return;
        }
        self.motion.desired_vel = self.move_speed(boss) * (move_to - boss_pos).normalize_or_zero();
    }

    fn execute_spin_laser_attack(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        if self.laser_spin_rot_anim.tick(dt) {
            self.setup_next_attack_state_and_move(boss, env.rng);
            return;
        }
        let alive = boss.alive_root();
        boss.parts_mut().set_y_rotation(alive, self.laser_spin_rot_anim.value());

        if self.shoot_countdown <= 0.0 {
            let leg = env.rng.random_unsigned() as usize % NUM_LEGS;
            self.shoot_laser_from_leg_point(leg, boss, env);
            self.shoot_countdown = Self::shoot_countdown_for_spinning(env.rng);
        } else {
            self.shoot_countdown -= dt;
        }
    }

    fn execute_orb_projectile_attack(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        self.shoot_countdown -= dt;
        if self.shoot_countdown > 0.0 {
            return;
        }
        if self.orbs_left == 0 {
            self.setup_next_attack_state_and_move(boss, env.rng);
            return;
        }
        self.shoot_orb(boss, env);
        self.orbs_left -= 1;
        self.shoot_countdown = ORB_SHOT_INTERVAL_IN_SECS;
    }

    fn execute_summon_items(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        if self.first_tick_of_state() {
            self.summon_positions = self.generate_summon_positions(boss, env);
            // Эффект порталов строго до появления предметов
            env.sink.announce_boss_effect(BossEffect::SummonPortals {
                part: self.parts.body,
                time: DELAY_BEFORE_SUMMONING_ITEMS_IN_SECS,
                colour: Rgba::rgb(0.6, 0.0, 0.9),
                positions: self.summon_positions.clone(),
            });
        }

        self.summon_countdown -= dt;
        if self.summon_countdown > 0.0 {
            return;
        }

        for (i, pos) in self.summon_positions.iter().enumerate() {
            // Одна из ледяных пушек в IceBall, иначе нечем ранить нижнее остриё
            let item = if self.stage == GothicStage::IceBall && i == 0 {
                ItemKind::IceBlasterPaddle
            } else {
                SUMMON_ITEMS[env.rng.random_unsigned() as usize % SUMMON_ITEMS.len()]
            };
            env.ctx.spawn_item(item, *pos);
        }
        self.summon_positions.clear();
        self.setup_next_attack_state_and_move(boss, env.rng);
    }

    /// Точки под боссом, равномерно по ширине области движения
    fn generate_summon_positions(&self, boss: &Boss, env: &mut BossEnv) -> Vec<Vec2> {
        let area = self.movement_area(env.ctx.level_width(), env.ctx.level_height());
        let count = self.stage.num_summoned_items();
        let below = boss.alive_aabb().map(|a| a.min.y).unwrap_or(area.center().y);
        let y = ((area.min.y + below) / 2.0).max(area.min.y + PIECE_HEIGHT);
        let slot = area.size().x / count as f32;
        (0..count)
            .map(|i| {
                let jitter = env.rng.random_neg_one_to_one() * 0.25 * slot;
                Vec2::new(area.min.x + slot * (i as f32 + 0.5) + jitter, y)
            })
            .collect()
    }

    fn execute_hurt(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        self.hurt_countdown -= dt;
        if self.hurt_countdown > 0.0 {
            return;
        }
        if !boss.parts().is_destroyed(self.weakpoint) {
            self.setup_next_attack_state_and_move(boss, env.rng);
            return;
        }
        match self.stage {
            GothicStage::FireBall => {
                if !boss.has_pending_ai_state() {
                    let next = GothicAi::new(GothicStage::IceBall, self.parts.clone(), boss, env.rng);
                    boss.set_next_ai_state(BossAi::Gothic(next));
                }
            }
            GothicStage::IceBall => self.set_state(GothicState::Glitch, boss, env.rng),
            GothicStage::FreeMoving => self.set_state(GothicState::FinalDeathThroes, boss, env.rng),
        }
    }

    fn execute_glitch(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        if self.first_tick_of_state() {
            env.sink.announce_boss_effect(BossEffect::Misc {
                kind: MiscBossEffect::Glitch,
                part: self.parts.body,
                time: GLITCH_TIME_IN_SECS,
            });
        }
        self.glitch_countdown -= dt;
        if self.glitch_countdown > 0.0 {
            return;
        }
        if self.stage == GothicStage::IceBall {
            let start = boss.position();
            let center = Vec2::new(env.ctx.level_width(), env.ctx.level_height()) / 2.0;
            self.motion.set_target(start, center);
            self.set_state(GothicState::MoveToCenterOfLevel, boss, env.rng);
        } else {
            self.setup_next_attack_state_and_move(boss, env.rng);
        }
    }

    fn execute_move_to_center_of_level(&mut self, boss: &mut Boss, env: &mut BossEnv) {
        let speed = 2.0 * PIECE_WIDTH;
        if self.motion.move_to_target_position(boss.position(), speed) {
            self.set_state(GothicState::DestroyConfines, boss, env.rng);
        }
    }

    /// Заряд → вспышка → confines уничтожены, следующая стадия
    pub fn execute_destroy_confines(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        if self.first_tick_of_state() {
            env.sink.announce_boss_effect(BossEffect::PowerCharge {
                part: self.parts.body,
                time: DESTROY_CONFINES_CHARGE_TIME_IN_SECS,
                colour: Rgba::WHITE,
                size: 3.0,
                offset: Vec3::ZERO,
            });
        }

        if !self.charge_complete {
            self.charge_countdown -= dt;
            if self.charge_countdown <= 0.0 {
                self.charge_complete = true;
                env.sink.announce_boss_effect(BossEffect::ExpandingHalo {
                    part: self.parts.body,
                    time: DESTROY_CONFINES_FLASH_TIME_IN_SECS,
                    colour: Rgba::WHITE,
                    size: 5.0,
                    offset: Vec3::ZERO,
                });
            }
            return;
        }

        self.flash_countdown -= dt;
        if self.flash_countdown > 0.0 || boss.has_pending_ai_state() {
            return;
        }
        env.sink.announce_boss_effect(BossEffect::FullscreenFlash {
            time: 1.0,
            intensity: 1.0,
        });
        env.ctx.destroy_confines();
        env.sink.announce_general_effect(GeneralEffect::LevelShake {
            time: 1.5,
            direction: Vec2::new(0.6, 0.6),
            magnitude: 60.0,
        });
        let next = GothicAi::new(GothicStage::FreeMoving, self.parts.clone(), boss, env.rng);
        boss.set_next_ai_state(BossAi::Gothic(next));
    }

    fn execute_final_death_throes(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        if self.first_tick_of_state() {
            env.sink.clear_active_boss_effects();
            let alive = boss.alive_root();
            let shake = anims::final_death_shake_anim(0.3, env.rng);
            let parts = boss.parts_mut();
            parts.animate_colour(alive, anims::final_death_flash_anim());
            parts.animate_translation(alive, shake);
            env.sink.announce_boss_effect(BossEffect::ExpandingHalo {
                part: self.parts.body,
                time: anims::TOTAL_DEATH_ANIM_TIME,
                colour: Rgba::WHITE,
                size: 5.0,
                offset: Vec3::ZERO,
            });
        }
        self.death_countdown -= dt;
        if self.death_countdown <= 0.0 && !self.finished {
            self.finished = true;
            log("Gothic boss: final death complete");
        }
    }

    // Урон -----------------------------------------------------------------

    fn can_take_damage(&self) -> bool {
        matches!(
            self.state,
            GothicState::BasicMoveAndShoot
                | GothicState::SpinLaserAttack
                | GothicState::OrbProjectileAttack
                | GothicState::SummonItems
        )
    }

    fn hurt_state(&self) -> GothicState {
        match self.stage {
            GothicStage::FireBall => GothicState::HurtTop,
            GothicStage::IceBall => GothicState::HurtBottom,
            GothicStage::FreeMoving => GothicState::Glitch,
        }
    }

    fn react_to_damage(&mut self, outcome: DiminishOutcome, boss: &mut Boss, env: &mut BossEnv) {
        match outcome {
            DiminishOutcome::Ignored => return,
            DiminishOutcome::Hurt => {}
            DiminishOutcome::Destroyed => {
                let level_height = env.ctx.level_height();
                match self.stage {
                    GothicStage::FireBall | GothicStage::IceBall => {
                        drop_off_part(boss, self.weakpoint, LIMB_FALL_TIME, 0.0, -level_height, 30.0);
                        env.sink.announce_boss_angry(self.parts.body);
                    }
                    GothicStage::FreeMoving => {}
                }
                env.sink.announce_general_effect(GeneralEffect::Explosion {
                    position: boss.parts().world_position_2d(self.weakpoint),
                    size: 3.0,
                });
            }
        }

        if self.stage == GothicStage::FreeMoving && outcome == DiminishOutcome::Destroyed {
            self.set_state(GothicState::FinalDeathThroes, boss, env.rng);
        } else {
            let hurt = self.hurt_state();
            self.set_state(hurt, boss, env.rng);
        }
    }
}

impl BossAiStage for GothicAi {
    fn update(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        match self.state {
            GothicState::BasicMoveAndShoot => self.execute_basic_move_and_shoot(dt, boss, env),
            GothicState::SpinLaserAttack => self.execute_spin_laser_attack(dt, boss, env),
            GothicState::OrbProjectileAttack => self.execute_orb_projectile_attack(dt, boss, env),
            GothicState::SummonItems => self.execute_summon_items(dt, boss, env),
            GothicState::HurtTop | GothicState::HurtBottom => self.execute_hurt(dt, boss, env),
            // В свободном полёте Glitch ещё и реакция на удар мячом
            GothicState::Glitch => self.execute_glitch(dt, boss, env),
            GothicState::MoveToCenterOfLevel => self.execute_move_to_center_of_level(boss, env),
            GothicState::DestroyConfines => self.execute_destroy_confines(dt, boss, env),
            GothicState::FinalDeathThroes => self.execute_final_death_throes(dt, boss, env),
        }

        self.motion.update_movement(dt, boss);
        keep_inside_level(boss, env.ctx.level_width(), env.ctx.level_height());
    }

    fn on_ball_collision(&mut self, boss: &mut Boss, part: PartId, env: &mut BossEnv) {
        if self.stage != GothicStage::FreeMoving || part != self.weakpoint || !self.can_take_damage() {
            return;
        }
        let outcome = boss.ball_hit_weakpoint(part, env.sink);
        self.react_to_damage(outcome, boss, env);
    }

    fn on_projectile_collision(&mut self, boss: &mut Boss, kind: ProjectileKind, part: PartId, env: &mut BossEnv) {
        if part != self.weakpoint || !self.can_take_damage() {
            return;
        }
        let hits = match (self.stage, kind) {
            (GothicStage::FireBall, ProjectileKind::FireGlob) => NUM_OF_TOP_POINT_HITS,
            (GothicStage::IceBall, ProjectileKind::PaddleIceBlast) => NUM_OF_BOTTOM_POINT_HITS,
            _ => return,
        };
        let outcome = boss.diminish_weakpoint(part, WEAKPOINT_LIFE_POINTS / hits as f32, env.sink);
        self.react_to_damage(outcome, boss, env);
    }

    fn total_life_percent(&self, boss: &Boss) -> f32 {
        if self.state == GothicState::FinalDeathThroes {
            return 0.0;
        }
        let offset = match self.stage {
            GothicStage::FireBall => 2.0,
            GothicStage::IceBall => 1.0,
            GothicStage::FreeMoving => 0.0,
        };
        (offset + self.life(boss)) / 3.0
    }

    fn is_finished(&self) -> bool {
        self.finished
    }

    fn stage_name(&self) -> &'static str {
        self.stage.name()
    }

    fn state_name(&self) -> &'static str {
        match self.state {
            GothicState::BasicMoveAndShoot => "BasicMoveAndShootState",
            GothicState::SpinLaserAttack => "SpinLaserAttackAIState",
            GothicState::OrbProjectileAttack => "OrbProjectileAttackAIState",
            GothicState::SummonItems => "SummonItemsAIState",
            GothicState::HurtTop => "HurtTopAIState",
            GothicState::HurtBottom => "HurtBottomAIState",
            GothicState::Glitch => "GlitchAIState",
            GothicState::MoveToCenterOfLevel => "MoveToCenterOfLevelAIState",
            GothicState::DestroyConfines => "DestroyConfinesAIState",
            GothicState::FinalDeathThroes => "FinalDeathThroesAIState",
        }
    }

    fn vulnerable_parts(&self, boss: &Boss) -> Vec<(PartId, DamageChannel)> {
        if !self.can_take_damage() || !boss.is_part_alive(self.weakpoint) {
            return Vec::new();
        }
        if boss.parts().weakpoint(self.weakpoint).map(|w| w.is_invulnerable()).unwrap_or(true) {
            return Vec::new();
        }
        let channel = match self.stage {
            GothicStage::FireBall => DamageChannel::Projectile(ProjectileKind::FireGlob),
            GothicStage::IceBall => DamageChannel::Projectile(ProjectileKind::PaddleIceBlast),
            GothicStage::FreeMoving => DamageChannel::Ball,
        };
        vec![(self.weakpoint, channel)]
    }
}
