//! Стадии Deco босса. Все три стадии делят один набор под-состояний,
//! отличаются скоростью, таблицами предметов и весами атак.
//!
//! Урон наносит только тесла-дуга, попавшая в lightning relay:
//! Electrified → ElectrificationRetaliation → Angry → следующая стадия.
//! В последней стадии Electrified сразу ведёт к FinalDeathThroes.

use bevy::prelude::*;

use super::{
    movement_bounds, tesla_block_centers, DecoArm, DecoParts, CORE_AND_ARMS_WIDTH, CORE_HEIGHT, CORE_WIDTH,
    DEFAULT_ACCELERATION, DEFAULT_MAX_X_SPEED, DEFAULT_MAX_Y_SPEED, FULL_BODY_TOTAL_HEIGHT, FULL_BODY_TOTAL_WIDTH,
    HAND_WIDTH, ITEM_DROP_ANIM_DISPLACEMENT, ITEM_LOAD_OFFSET_Y, LIGHTNING_FIRE_OFFSET, SIDE_BODY_PART_HEIGHT,
    SIDE_BODY_PART_WIDTH,
};
use crate::ai::{keep_inside_level, pick_weighted, BossAi, BossAiStage, BossEnv, DamageChannel, Motion};
use crate::anim::MultiLerp;
use crate::archetypes::{drop_off_part, part_pos, start_angry_anims, stop_angry_anims};
use crate::boss::{anims, Boss};
use crate::config::PIECE_WIDTH;
use crate::context::{ItemKind, PaddleInfo, ProjectileKind};
use crate::effects::{BossEffect, GeneralEffect, MiscBossEffect};
use crate::geometry::{rotate_degrees, Aabb2, Rgba};
use crate::logger::log;
use crate::parts::PartId;
use crate::random::RandomSource;

pub const SHOOT_AT_PADDLE_RANDOM_ROT_ANGLE_IN_DEGS: f32 = 13.25;
pub const TOTAL_ELECTRIFIED_TIME_IN_SECS: f32 = 2.5;
pub const TOTAL_RETALIATION_TIME_IN_SECS: f32 = 2.0;
pub const TOTAL_ELECTRIFIED_AND_RETALIATION_TIME_IN_SECS: f32 =
    TOTAL_ELECTRIFIED_TIME_IN_SECS + TOTAL_RETALIATION_TIME_IN_SECS;
pub const ANGRY_TIME_IN_SECS: f32 = 2.5;
pub const ITEM_LOAD_TIME_IN_SECS: f32 = 0.8;
pub const ROTATE_BACK_TO_UPRIGHT_TIME_IN_SECS: f32 = 1.0;

pub const LEVEL_ROTATION_DEGREES_PER_SEC: f32 = 13.0;
/// Ускорение вращения, пока мяч выше босса
pub const LEVEL_ROTATION_BALL_ABOVE_MULTIPLIER: f32 = 1.5;
pub const MAX_LEVEL_ROTATION_DEGREES: f32 = 360.0;

pub const ARM_EXTEND_TIME_IN_SECS: f32 = 0.4;
pub const ARM_HOLD_TIME_IN_SECS: f32 = 0.5;
pub const ARM_RETRACT_TIME_IN_SECS: f32 = 0.7;
const ARM_ATTACK_TOTAL_TIME_IN_SECS: f32 = ARM_EXTEND_TIME_IN_SECS + ARM_HOLD_TIME_IN_SECS + ARM_RETRACT_TIME_IN_SECS;
/// Разброс высоты, с которой бьют руки (над нижней границей движения)
const ARM_ATTACK_Y_RANGE: f32 = 2.0;

pub const NUM_SIDE_TO_SIDE_ITEM_DROPS: usize = 4;

const SIDE_BODY_FALL_TIME: f32 = TOTAL_RETALIATION_TIME_IN_SECS;
const TESLA_BRIGHT_COLOUR: Rgba = Rgba::rgb(0.75, 0.9, 1.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoStage {
    Stage1,
    Stage2,
    Stage3,
}

impl DecoStage {
    pub fn name(&self) -> &'static str {
        match self {
            DecoStage::Stage1 => "DecoStage1AI",
            DecoStage::Stage2 => "DecoStage2AI",
            DecoStage::Stage3 => "DecoStage3AI",
        }
    }

    pub fn next(&self) -> Option<DecoStage> {
        match self {
            DecoStage::Stage1 => Some(DecoStage::Stage2),
            DecoStage::Stage2 => Some(DecoStage::Stage3),
            DecoStage::Stage3 => None,
        }
    }

    pub fn is_final(&self) -> bool {
        *self == DecoStage::Stage3
    }

    /// Сколько ударов relay уже пережито к началу стадии
    fn hits_taken(&self) -> f32 {
        match self {
            DecoStage::Stage1 => 0.0,
            DecoStage::Stage2 => 1.0,
            DecoStage::Stage3 => 2.0,
        }
    }

    pub fn speed_coeff(&self) -> f32 {
        match self {
            DecoStage::Stage1 => 1.0,
            DecoStage::Stage2 => 1.15,
            DecoStage::Stage3 => 1.3,
        }
    }

    fn first_state(&self) -> DecoState {
        match self {
            DecoStage::Stage1 => DecoState::MovingAttackAndItemDrop,
            DecoStage::Stage2 | DecoStage::Stage3 => DecoState::MovingAttack,
        }
    }

    /// Веса следующей атаки; руки и вращение уровня - только без боковых корпусов
    fn attack_weights(&self) -> &'static [(DecoState, f32)] {
        match self {
            DecoStage::Stage1 => &[
                (DecoState::StationaryAttack, 0.3),
                (DecoState::MovingAttack, 0.3),
                (DecoState::MovingAttackAndItemDrop, 0.2),
                (DecoState::SideToSideItemDropFarLeft, 0.1),
                (DecoState::SideToSideItemDropFarRight, 0.1),
            ],
            DecoStage::Stage2 => &[
                (DecoState::StationaryAttack, 0.15),
                (DecoState::MovingAttack, 0.2),
                (DecoState::MovingAttackAndItemDrop, 0.15),
                (DecoState::SideToSideItemDropFarLeft, 0.1),
                (DecoState::SideToSideItemDropFarRight, 0.1),
                (DecoState::MoveToPaddleArmAttackPos, 0.2),
                (DecoState::MoveToCenterForLevelRot, 0.1),
            ],
            DecoStage::Stage3 => &[
                (DecoState::StationaryAttack, 0.1),
                (DecoState::MovingAttack, 0.15),
                (DecoState::MovingAttackAndItemDrop, 0.15),
                (DecoState::SideToSideItemDropFarLeft, 0.1),
                (DecoState::SideToSideItemDropFarRight, 0.1),
                (DecoState::MoveToPaddleArmAttackPos, 0.2),
                (DecoState::MoveToCenterForLevelRot, 0.2),
            ],
        }
    }

    /// (шанс "ещё одного уменьшения", размер таблицы, таблица без уменьшения)
    fn item_table(&self) -> (u32, u32, &'static [ItemKind]) {
        match self {
            DecoStage::Stage1 => (
                3,
                6,
                &[ItemKind::BallSpeedUp, ItemKind::InvisiPaddle, ItemKind::InvisiBall],
            ),
            DecoStage::Stage2 => (
                4,
                9,
                &[
                    ItemKind::InvisiPaddle,
                    ItemKind::InvisiBall,
                    ItemKind::PoisonPaddle,
                    ItemKind::UpsideDownPaddle,
                    ItemKind::BallSpeedUp,
                ],
            ),
            DecoStage::Stage3 => (
                4,
                12,
                &[
                    ItemKind::InvisiBall,
                    ItemKind::PoisonPaddle,
                    ItemKind::UpsideDownPaddle,
                    ItemKind::BallSpeedUp,
                    ItemKind::CrazyBall,
                    ItemKind::Gravity,
                    ItemKind::InvisiPaddle,
                ],
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoState {
    StationaryAttack,
    MovingAttack,
    MovingAttackAndItemDrop,
    SideToSideItemDropFarLeft,
    SideToSideItemDropFarRight,
    MoveToPaddleArmAttackPos,
    ArmAttack,
    MoveToCenterForLevelRot,
    RotatingLevel,
    FinishRotatingLevel,
    Electrified,
    ElectrificationRetaliation,
    Angry,
    FinalDeathThroes,
}

impl DecoState {
    /// Под-состояния после удара дугой (повторный удар игнорируется)
    fn is_hurt(&self) -> bool {
        matches!(
            self,
            DecoState::Electrified
                | DecoState::ElectrificationRetaliation
                | DecoState::Angry
                | DecoState::FinalDeathThroes
        )
    }

    fn uses_rc_camera_override(&self) -> bool {
        matches!(
            self,
            DecoState::StationaryAttack | DecoState::MovingAttack | DecoState::MovingAttackAndItemDrop
        )
    }
}

/// Paddle уже минимального размера: уменьшать дальше нечего
fn is_smallest_paddle(paddle: &PaddleInfo) -> bool {
    paddle.half_width <= 0.5 * PaddleInfo::default().half_width + f32::EPSILON
}

#[derive(Debug, Clone)]
pub struct DecoAi {
    stage: DecoStage,
    parts: DecoParts,
    state: DecoState,
    motion: Motion,

    shoot_countdown: f32,
    num_shots_until_next_state: u32,
    drop_item_countdown: f32,
    item_loading_anim: MultiLerp<f32>,
    next_drop_item: ItemKind,

    side_drop_sweeping: bool,
    side_drop_xs: Vec<f32>,

    attacking_arms: Vec<DecoArm>,
    arm_attack_countdown: f32,
    retract_announced: bool,

    rotate_countdown: f32,
    level_rotation_done: f32,

    tilt_degrees: f32,
    electrified_countdown: f32,
    retaliation_countdown: f32,
    angry_countdown: f32,
    death_countdown: f32,
    finished: bool,
}

impl DecoAi {
    pub fn new(stage: DecoStage, parts: DecoParts, boss: &mut Boss, rng: &mut dyn RandomSource) -> Self {
        if stage != DecoStage::Stage1 {
            for arm in [parts.left_arm, parts.right_arm] {
                if boss.is_part_alive(arm.hand) {
                    arm.expose_bounds(boss.parts_mut());
                }
            }
        }

        let coeff = stage.speed_coeff();
        let mut ai = Self {
            stage,
            parts,
            state: DecoState::MovingAttack,
            motion: Motion::new(coeff * DEFAULT_ACCELERATION),
            shoot_countdown: 0.0,
            num_shots_until_next_state: 0,
            drop_item_countdown: 0.0,
            item_loading_anim: MultiLerp::simple(0.0, ITEM_LOAD_TIME_IN_SECS, 0.0, ITEM_DROP_ANIM_DISPLACEMENT),
            next_drop_item: ItemKind::ShrinkPaddle,
            side_drop_sweeping: false,
            side_drop_xs: Vec::new(),
            attacking_arms: Vec::new(),
            arm_attack_countdown: 0.0,
            retract_announced: false,
            rotate_countdown: 0.0,
            level_rotation_done: 0.0,
            tilt_degrees: 0.0,
            electrified_countdown: 0.0,
            retaliation_countdown: 0.0,
            angry_countdown: 0.0,
            death_countdown: 0.0,
            finished: false,
        };
        ai.enter_attack_state(stage.first_state(), boss, rng);
        ai
    }

    pub fn stage(&self) -> DecoStage {
        self.stage
    }

    pub fn state(&self) -> DecoState {
        self.state
    }

    pub fn num_shots_until_next_state(&self) -> u32 {
        self.num_shots_until_next_state
    }

    pub fn level_rotation_done(&self) -> f32 {
        self.level_rotation_done
    }

    pub fn tilt_degrees(&self) -> f32 {
        self.tilt_degrees
    }

    pub fn drop_item_countdown(&self) -> f32 {
        self.drop_item_countdown
    }

    fn max_x_speed(&self) -> f32 {
        self.stage.speed_coeff() * DEFAULT_MAX_X_SPEED
    }

    fn max_y_speed(&self) -> f32 {
        self.stage.speed_coeff() * DEFAULT_MAX_Y_SPEED
    }

    fn side_bodies_alive(&self, boss: &Boss) -> bool {
        boss.is_part_alive(self.parts.left_body) || boss.is_part_alive(self.parts.right_body)
    }

    fn current_size(&self, boss: &Boss) -> Vec2 {
        if self.side_bodies_alive(boss) {
            Vec2::new(FULL_BODY_TOTAL_WIDTH, FULL_BODY_TOTAL_HEIGHT)
        } else {
            Vec2::new(CORE_AND_ARMS_WIDTH, CORE_HEIGHT)
        }
    }

    fn living_arms(&self, boss: &Boss) -> Vec<DecoArm> {
        [self.parts.left_arm, self.parts.right_arm]
            .into_iter()
            .filter(|arm| boss.is_part_alive(arm.hand))
            .collect()
    }

    /// Область, где может стоять центр босса
    fn center_bounds(&self, boss: &Boss, level_width: f32, level_height: f32) -> Aabb2 {
        let bounds = movement_bounds(level_width, level_height);
        let half = self.current_size(boss) / 2.0;
        let min = bounds.min + half;
        let max = (bounds.max - half).max(min);
        Aabb2::new(min, max)
    }

    fn shoot_countdown_while_stationary(&self, rng: &mut dyn RandomSource) -> f32 {
        (0.5 + 0.5 * rng.random_zero_to_one()) / self.stage.speed_coeff()
    }

    fn shoot_countdown_while_moving(&self, rng: &mut dyn RandomSource) -> f32 {
        (0.75 + 0.75 * rng.random_zero_to_one()) / self.stage.speed_coeff()
    }

    fn num_shots_while_stationary(rng: &mut dyn RandomSource) -> u32 {
        3 + rng.random_unsigned() % 3
    }

    fn num_shots_while_moving(rng: &mut dyn RandomSource) -> u32 {
        4 + rng.random_unsigned() % 4
    }

    fn item_drop_countdown(rng: &mut dyn RandomSource) -> f32 {
        2.0 + 2.0 * rng.random_zero_to_one()
    }

    /// Предмет для следующего сброса; чаще всего - уменьшение paddle
    pub fn random_item_drop_type(&self, paddle: &PaddleInfo, rng: &mut dyn RandomSource) -> ItemKind {
        let (extra_shrink_chance, table_size, others) = self.stage.item_table();
        let smallest = is_smallest_paddle(paddle);

        if self.next_drop_item != ItemKind::ShrinkPaddle && !smallest && rng.random_unsigned() % extra_shrink_chance == 0 {
            return ItemKind::ShrinkPaddle;
        }

        let roll = (rng.random_unsigned() % table_size) as usize;
        let num_shrink_slots = table_size as usize - others.len();
        if roll < num_shrink_slots {
            if !smallest {
                return ItemKind::ShrinkPaddle;
            }
            return others[rng.random_unsigned() as usize % others.len()];
        }
        others[roll - num_shrink_slots]
    }

    fn item_drop_position(&self, boss: &Boss) -> Vec2 {
        part_pos(boss, self.parts.core) + Vec2::new(0.0, ITEM_LOAD_OFFSET_Y - ITEM_DROP_ANIM_DISPLACEMENT)
    }

    fn far_side_position(&self, boss: &Boss, left: bool, level_width: f32, level_height: f32) -> Vec2 {
        let bounds = self.center_bounds(boss, level_width, level_height);
        Vec2::new(if left { bounds.min.x } else { bounds.max.x }, bounds.max.y)
    }

    // Переходы ---------------------------------------------------------------

    /// Вход в атакующее под-состояние (без эффектов: нужен только rng)
    fn enter_attack_state(&mut self, new_state: DecoState, boss: &mut Boss, rng: &mut dyn RandomSource) {
        match new_state {
            DecoState::StationaryAttack => {
                self.motion.stop();
                self.shoot_countdown = self.shoot_countdown_while_stationary(rng);
                self.num_shots_until_next_state = Self::num_shots_while_stationary(rng);
            }
            DecoState::MovingAttack => {
                self.shoot_countdown = self.shoot_countdown_while_moving(rng);
                self.num_shots_until_next_state = Self::num_shots_while_moving(rng);
            }
            DecoState::MovingAttackAndItemDrop => {
                self.drop_item_countdown = Self::item_drop_countdown(rng);
                self.shoot_countdown = self.shoot_countdown_while_moving(rng);
                self.num_shots_until_next_state = Self::num_shots_while_moving(rng);
                self.item_loading_anim.reset_to_start();
            }
            DecoState::SideToSideItemDropFarLeft | DecoState::SideToSideItemDropFarRight => {
                self.motion.stop();
                self.side_drop_sweeping = false;
                self.side_drop_xs.clear();
                self.item_loading_anim.reset_to_start();
            }
            DecoState::MoveToPaddleArmAttackPos => {
                self.motion.stop();
                self.attacking_arms = self.living_arms(boss);
            }
            DecoState::MoveToCenterForLevelRot => {
                self.motion.stop();
                self.level_rotation_done = 0.0;
            }
            _ => {}
        }
        self.log_transition(new_state);
        self.state = new_state;
    }

    fn log_transition(&self, new_state: DecoState) {
        if self.state != new_state {
            log(&format!("Deco {}: {:?} -> {:?}", self.stage.name(), self.state, new_state));
        }
    }

    pub(crate) fn set_state(&mut self, new_state: DecoState, boss: &mut Boss, env: &mut BossEnv) {
        let alive = boss.alive_root();
        match new_state {
            DecoState::SideToSideItemDropFarLeft | DecoState::SideToSideItemDropFarRight => {
                let left = new_state == DecoState::SideToSideItemDropFarLeft;
                let target = self.far_side_position(boss, left, env.ctx.level_width(), env.ctx.level_height());
                self.motion.set_target(boss.position(), target);
            }
            DecoState::MoveToPaddleArmAttackPos => {
                let arms = self.living_arms(boss);
                // Одна рука: над paddle должна оказаться именно она
                let x_offset = match arms.as_slice() {
                    [arm] => boss.parts().translation_2d(arm.arm).x,
                    _ => 0.0,
                };
                let bounds = self.center_bounds(boss, env.ctx.level_width(), env.ctx.level_height());
                let paddle_x = env.ctx.paddle().center.x;
                let y = (bounds.min.y + env.rng.random_zero_to_one() * ARM_ATTACK_Y_RANGE).min(bounds.max.y);
                let target = Vec2::new((paddle_x - x_offset).clamp(bounds.min.x, bounds.max.x), y);
                self.motion.set_target(boss.position(), target);
            }
            DecoState::ArmAttack => {
                self.motion.stop();
                self.start_arm_attack(boss, env);
            }
            DecoState::MoveToCenterForLevelRot => {
                let bounds = self.center_bounds(boss, env.ctx.level_width(), env.ctx.level_height());
                let target = Vec2::new(env.ctx.level_width() / 2.0, bounds.max.y);
                self.motion.set_target(boss.position(), target);
            }
            DecoState::RotatingLevel => {
                self.motion.stop();
                self.rotate_countdown = 3.0 + 3.0 * env.rng.random_zero_to_one();
                self.shoot_countdown = self.shoot_countdown_while_stationary(env.rng);
            }
            DecoState::FinishRotatingLevel => {
                self.motion.stop();
            }
            DecoState::Electrified => {
                self.motion.stop();
                self.item_loading_anim.reset_to_start();
                self.cancel_level_rotation(env);
                self.cancel_arm_attack(boss);

                self.tilt_degrees =
                    env.rng.random_negative_or_positive() * (15.0 + 15.0 * env.rng.random_zero_to_one());
                let anim_time = if self.stage.is_final() {
                    TOTAL_ELECTRIFIED_TIME_IN_SECS
                } else {
                    TOTAL_ELECTRIFIED_AND_RETALIATION_TIME_IN_SECS
                };
                self.electrified_countdown = TOTAL_ELECTRIFIED_TIME_IN_SECS;

                let hurt_dir = if self.tilt_degrees < 0.0 { Vec2::X } else { Vec2::NEG_X };
                let parts = boss.parts_mut();
                parts.set_z_rotation(alive, self.tilt_degrees);
                parts.animate_translation(alive, anims::hurt_move_anim(hurt_dir, CORE_WIDTH / 3.0));
                parts.animate_colour(alive, anims::electrified_colour_anim(anim_time));

                env.sink.announce_boss_effect(BossEffect::ElectricitySpasm {
                    part: self.parts.core,
                    time: anim_time,
                    colour: TESLA_BRIGHT_COLOUR,
                });
                env.sink.announce_boss_hurt(self.parts.lightning_relay);
            }
            DecoState::ElectrificationRetaliation => {
                self.motion.stop();
                self.retaliation_countdown = TOTAL_RETALIATION_TIME_IN_SECS;
                env.sink.announce_boss_effect(BossEffect::Shockwave {
                    part: self.parts.core,
                    time: TOTAL_RETALIATION_TIME_IN_SECS,
                    size: CORE_HEIGHT,
                });
                self.drop_retaliation_parts(boss, env);
            }
            DecoState::Angry => {
                self.motion.stop();
                self.angry_countdown = ANGRY_TIME_IN_SECS;
                start_angry_anims(boss, self.parts.core, 1.0, env.rng, env.sink);
            }
            DecoState::FinalDeathThroes => {
                self.motion.stop();
                self.death_countdown = anims::TOTAL_DEATH_ANIM_TIME;
                env.sink.clear_active_boss_effects();
                let shake = anims::final_death_shake_anim(0.5, env.rng);
                let parts = boss.parts_mut();
                parts.set_z_rotation(alive, 0.0);
                parts.animate_colour(alive, anims::final_death_flash_anim());
                parts.animate_translation(alive, shake);
                env.sink.announce_boss_effect(BossEffect::ExpandingHalo {
                    part: self.parts.core,
                    time: anims::TOTAL_DEATH_ANIM_TIME,
                    colour: Rgba::WHITE,
                    size: CORE_HEIGHT,
                    offset: Vec3::ZERO,
                });
                log(&format!("Deco {}: final death throes", self.stage.name()));
            }
            _ => {}
        }
        self.enter_attack_state(new_state, boss, env.rng);
    }

    /// Случайная следующая атака (не та же самая, что сейчас)
    fn go_to_next_random_attack_state(&mut self, boss: &mut Boss, env: &mut BossEnv) {
        let has_arms = !self.living_arms(boss).is_empty();
        let options: Vec<(DecoState, f32)> = self
            .stage
            .attack_weights()
            .iter()
            .map(|(state, weight)| {
                let allowed = *state != self.state && (has_arms || *state != DecoState::MoveToPaddleArmAttackPos);
                (*state, if allowed { *weight } else { 0.0 })
            })
            .collect();
        let next = pick_weighted(env.rng, &options).unwrap_or(DecoState::MovingAttack);
        self.set_state(next, boss, env);
    }

    /// Камера радиоуправляемой ракеты: стоять на месте нельзя
    fn remote_control_override(&mut self, boss: &mut Boss, env: &mut BossEnv) -> bool {
        if !env.ctx.is_rc_camera_on() {
            return false;
        }
        if self.state == DecoState::StationaryAttack {
            self.set_state(DecoState::MovingAttack, boss, env);
            return true;
        }
        false
    }

    // Выстрелы и предметы ------------------------------------------------------

    fn shot_origin(&self, boss: &Boss) -> Vec2 {
        boss.position() + LIGHTNING_FIRE_OFFSET
    }

    /// Молния в paddle с небольшим случайным отклонением; не стреляем под камерой ракеты
    pub fn shoot_lightning_bolt_at_paddle(&self, boss: &Boss, env: &mut BossEnv) {
        if env.ctx.is_rc_camera_on() {
            return;
        }
        let origin = self.shot_origin(boss);
        let to_paddle = (env.ctx.paddle().center - origin).normalize_or_zero();
        let dir = rotate_degrees(
            to_paddle,
            env.rng.random_neg_one_to_one() * SHOOT_AT_PADDLE_RANDOM_ROT_ANGLE_IN_DEGS,
        );
        let speed_multiplier = 1.0 + 0.25 * env.rng.random_zero_to_one();
        let speed = ProjectileKind::BossLightningBolt
            .default_speed()
            .max(speed_multiplier * self.max_y_speed());
        env.ctx.spawn_projectile(ProjectileKind::BossLightningBolt, origin, dir, speed);
    }

    fn drop_loaded_item(&mut self, boss: &Boss, env: &mut BossEnv) {
        env.ctx.spawn_item(self.next_drop_item, self.item_drop_position(boss));
        log(&format!("Deco {}: dropped {:?}", self.stage.name(), self.next_drop_item));
        let paddle = env.ctx.paddle();
        self.next_drop_item = self.random_item_drop_type(&paddle, env.rng);
        self.item_loading_anim.reset_to_start();
    }

    /// `true`, если выстрелы кончились и состояние сменилось
    fn update_shoot_at_paddle_while_moving(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) -> bool {
        if self.shoot_countdown > 0.0 {
            self.shoot_countdown -= dt;
            return false;
        }
        self.shoot_lightning_bolt_at_paddle(boss, env);
        self.shoot_countdown = self.shoot_countdown_while_moving(env.rng);
        self.num_shots_until_next_state = self.num_shots_until_next_state.saturating_sub(1);
        if self.num_shots_until_next_state == 0 {
            self.go_to_next_random_attack_state(boss, env);
            return true;
        }
        false
    }

    /// Вверх-вниз и из стороны в сторону, с торможением у границ
    fn update_up_down_side_to_side_motion(&mut self, boss: &Boss, env: &mut BossEnv) {
        let Some(aabb) = boss.alive_aabb() else {
            return;
        };
        let bounds = movement_bounds(env.ctx.level_width(), env.ctx.level_height());
        let max_x = self.max_x_speed();
        let max_y = self.max_y_speed();
        let x_buffer = max_x * max_x / (2.0 * self.motion.accel);
        let y_buffer = max_y * max_y / (2.0 * self.motion.accel);

        if aabb.min.y <= bounds.min.y + y_buffer {
            self.motion.desired_vel.y = max_y;
        } else if aabb.max.y >= bounds.max.y - y_buffer {
            self.motion.desired_vel.y = -max_y;
        }
        if self.motion.desired_vel.y.abs() < f32::EPSILON {
            self.motion.desired_vel.y = max_y;
        }

        if aabb.min.x <= bounds.min.x + x_buffer {
            self.motion.desired_vel.x = max_x;
        } else if aabb.max.x >= bounds.max.x - x_buffer {
            self.motion.desired_vel.x = -max_x;
        }
        if self.motion.desired_vel.x.abs() < f32::EPSILON {
            self.motion.desired_vel.x = env.rng.random_negative_or_positive() * max_x;
        }
    }

    // Под-состояния -----------------------------------------------------------

    fn execute_stationary_attack(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        if self.shoot_countdown > 0.0 {
            self.shoot_countdown -= dt;
            return;
        }
        self.shoot_lightning_bolt_at_paddle(boss, env);
        self.shoot_countdown = self.shoot_countdown_while_stationary(env.rng);
        self.num_shots_until_next_state = self.num_shots_until_next_state.saturating_sub(1);
        if self.num_shots_until_next_state == 0 {
            self.go_to_next_random_attack_state(boss, env);
        }
    }

    fn execute_moving_attack(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        if self.update_shoot_at_paddle_while_moving(dt, boss, env) {
            return;
        }
        self.update_up_down_side_to_side_motion(boss, env);
    }

    pub(crate) fn execute_moving_attack_and_item_drop(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        if self.drop_item_countdown <= 0.0 {
            if !env.ctx.is_ball_in_play() {
                self.drop_item_countdown = Self::item_drop_countdown(env.rng);
                self.item_loading_anim.reset_to_start();
            } else {
                // Стоим, пока предмет "заряжается"
                self.motion.desired_vel = Vec2::ZERO;
                if self.item_loading_anim.is_at_start() {
                    let paddle = env.ctx.paddle();
                    self.next_drop_item = self.random_item_drop_type(&paddle, env.rng);
                    env.sink.announce_boss_effect(BossEffect::Misc {
                        kind: MiscBossEffect::ItemLoading,
                        part: self.parts.core,
                        time: ITEM_LOAD_TIME_IN_SECS,
                    });
                }
                if self.item_loading_anim.tick(dt) {
                    self.drop_loaded_item(boss, env);
                    self.drop_item_countdown = Self::item_drop_countdown(env.rng);
                }
                return;
            }
        } else {
            self.drop_item_countdown -= dt;
        }

        if self.update_shoot_at_paddle_while_moving(dt, boss, env) {
            return;
        }
        self.update_up_down_side_to_side_motion(boss, env);
    }

    fn execute_side_to_side_item_drop(&mut self, boss: &mut Boss, env: &mut BossEnv) {
        let from_left = self.state == DecoState::SideToSideItemDropFarLeft;
        let pos = boss.position();

        if !self.side_drop_sweeping {
            if !self.motion.move_to_target_position(pos, self.max_y_speed()) {
                return;
            }
            // На краю: разворот и проход к противоположной стороне
            let (w, h) = (env.ctx.level_width(), env.ctx.level_height());
            let target = self.far_side_position(boss, !from_left, w, h);
            self.motion.set_target(pos, target);
            let span = target.x - pos.x;
            self.side_drop_xs = (1..=NUM_SIDE_TO_SIDE_ITEM_DROPS)
                .map(|i| pos.x + span * i as f32 / (NUM_SIDE_TO_SIDE_ITEM_DROPS + 1) as f32)
                .collect();
            self.side_drop_sweeping = true;
            return;
        }

        if let Some(&next_x) = self.side_drop_xs.first() {
            let passed = if from_left { pos.x >= next_x } else { pos.x <= next_x };
            if passed {
                self.side_drop_xs.remove(0);
                if env.ctx.is_ball_in_play() {
                    self.drop_loaded_item(boss, env);
                }
            }
        }

        if self.motion.move_to_target_position(pos, self.max_x_speed()) {
            self.go_to_next_random_attack_state(boss, env);
        }
    }

    fn execute_move_to_paddle_arm_attack_pos(&mut self, boss: &mut Boss, env: &mut BossEnv) {
        if self.attacking_arms.is_empty() {
            self.go_to_next_random_attack_state(boss, env);
            return;
        }
        if self.motion.move_to_target_position(boss.position(), self.max_y_speed()) {
            self.set_state(DecoState::ArmAttack, boss, env);
        }
    }

    /// Руки выдвигаются до уровня paddle, держатся и втягиваются
    fn start_arm_attack(&mut self, boss: &mut Boss, env: &mut BossEnv) {
        self.attacking_arms = self.living_arms(boss);
        self.arm_attack_countdown = ARM_ATTACK_TOTAL_TIME_IN_SECS;
        self.retract_announced = false;

        let paddle = env.ctx.paddle();
        let paddle_top = paddle.center.y + paddle.half_height;
        for arm in self.attacking_arms.iter() {
            let hand_bottom = part_pos(boss, arm.hand).y - HAND_WIDTH / 2.0;
            let extension = (hand_bottom - paddle_top).max(0.0);
            for (i, seg) in arm.segments().into_iter().enumerate() {
                let dist = extension * (i + 1) as f32 / 3.0;
                let anim = MultiLerp::new(
                    vec![
                        0.0,
                        ARM_EXTEND_TIME_IN_SECS,
                        ARM_EXTEND_TIME_IN_SECS + ARM_HOLD_TIME_IN_SECS,
                        ARM_ATTACK_TOTAL_TIME_IN_SECS,
                    ],
                    vec![
                        Vec3::ZERO,
                        Vec3::new(0.0, -dist, 0.0),
                        Vec3::new(0.0, -dist, 0.0),
                        Vec3::ZERO,
                    ],
                    Vec3::ZERO,
                );
                boss.parts_mut().animate_translation(seg, anim);
            }
        }
    }

    fn cancel_arm_attack(&mut self, boss: &mut Boss) {
        for arm in self.attacking_arms.drain(..) {
            for seg in arm.segments() {
                boss.parts_mut().clear_transform_anims(seg);
            }
        }
    }

    fn execute_arm_attack(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        self.arm_attack_countdown -= dt;
        let retract_at = ARM_RETRACT_TIME_IN_SECS;
        if !self.retract_announced && self.arm_attack_countdown <= retract_at {
            self.retract_announced = true;
            env.sink.announce_boss_effect(BossEffect::Misc {
                kind: MiscBossEffect::ArmsRetracting,
                part: self.parts.core,
                time: ARM_RETRACT_TIME_IN_SECS,
            });
        }
        if self.arm_attack_countdown <= 0.0 {
            self.attacking_arms.clear();
            self.go_to_next_random_attack_state(boss, env);
        }
    }

    fn execute_move_to_center_for_level_rot(&mut self, boss: &mut Boss, env: &mut BossEnv) {
        if self.motion.move_to_target_position(boss.position(), self.max_y_speed()) {
            self.set_state(DecoState::RotatingLevel, boss, env);
        }
    }

    /// Скорость вращения: быстрее, когда мяч выше нижнего края босса
    pub fn level_rotation_speed(&self, boss: &Boss, env: &BossEnv) -> f32 {
        let bottom = boss
            .alive_aabb()
            .map(|a| a.min.y)
            .unwrap_or(boss.position().y - CORE_HEIGHT / 2.0);
        let ball_above = env.ctx.ball().map(|b| b.center.y > bottom).unwrap_or(false);
        if ball_above && !env.ctx.is_rc_camera_on() {
            LEVEL_ROTATION_BALL_ABOVE_MULTIPLIER * LEVEL_ROTATION_DEGREES_PER_SEC
        } else {
            LEVEL_ROTATION_DEGREES_PER_SEC
        }
    }

    /// `true`, когда уровень сделал полный оборот
    fn rotate_level(&mut self, dt: f32, boss: &Boss, env: &mut BossEnv) -> bool {
        let speed = self.level_rotation_speed(boss, env);
        self.level_rotation_done = (self.level_rotation_done + speed * dt).min(MAX_LEVEL_ROTATION_DEGREES);
        if self.level_rotation_done >= MAX_LEVEL_ROTATION_DEGREES {
            env.ctx.set_level_rotation(0.0);
            return true;
        }
        env.ctx.set_level_rotation(self.level_rotation_done);
        false
    }

    fn cancel_level_rotation(&mut self, env: &mut BossEnv) {
        if env.ctx.level_rotation() != 0.0 {
            env.ctx.set_level_rotation(0.0);
        }
        self.level_rotation_done = 0.0;
    }

    fn execute_rotating_level(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        if self.rotate_level(dt, boss, env) {
            self.go_to_next_random_attack_state(boss, env);
            return;
        }
        if self.shoot_countdown > 0.0 {
            self.shoot_countdown -= dt;
        } else {
            self.shoot_lightning_bolt_at_paddle(boss, env);
            self.shoot_countdown = self.shoot_countdown_while_stationary(env.rng);
        }
        self.rotate_countdown -= dt;
        if self.rotate_countdown <= 0.0 {
            self.set_state(DecoState::FinishRotatingLevel, boss, env);
        }
    }

    fn execute_finish_rotating_level(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        if self.rotate_level(dt, boss, env) {
            self.go_to_next_random_attack_state(boss, env);
        }
    }

    fn execute_electrified(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        self.electrified_countdown -= dt;
        if self.electrified_countdown > 0.0 {
            return;
        }
        if self.stage.is_final() {
            let alive = boss.alive_root();
            let parts = boss.parts_mut();
            parts.set_colour(alive, Rgba::WHITE);
            parts.clear_transform_anims(alive);
            self.set_state(DecoState::FinalDeathThroes, boss, env);
        } else {
            self.set_state(DecoState::ElectrificationRetaliation, boss, env);
        }
    }

    /// Стадия 1 теряет боковые корпуса, стадия 2 - одну из рук
    fn drop_retaliation_parts(&mut self, boss: &mut Boss, env: &mut BossEnv) {
        match self.stage {
            DecoStage::Stage1 => {
                for (part, left) in [(self.parts.left_body, true), (self.parts.right_body, false)] {
                    if !boss.is_part_alive(part) {
                        continue;
                    }
                    let sign = if left { -1.0 } else { 1.0 };
                    let x_dist = sign * 3.0 * SIDE_BODY_PART_WIDTH;
                    let y_dist = -part_pos(boss, part).y - 2.0 * SIDE_BODY_PART_HEIGHT;
                    let angle = -sign * (100.0 + (env.rng.random_unsigned() % 51) as f32);
                    drop_off_part(boss, part, SIDE_BODY_FALL_TIME, x_dist, y_dist, angle);
                }
            }
            DecoStage::Stage2 => {
                let arms = self.living_arms(boss);
                let Some(arm) = arms.get(env.rng.random_unsigned() as usize % arms.len().max(1)).copied() else {
                    return;
                };
                let sign = if arm == self.parts.left_arm { -1.0 } else { 1.0 };
                let pos = part_pos(boss, arm.arm);
                drop_off_part(
                    boss,
                    arm.arm,
                    SIDE_BODY_FALL_TIME,
                    sign * 2.0 * PIECE_WIDTH,
                    -pos.y - CORE_HEIGHT,
                    -sign * 90.0,
                );
                env.sink.announce_general_effect(GeneralEffect::Explosion { position: pos, size: 2.0 });
            }
            DecoStage::Stage3 => {}
        }
    }

    fn execute_electrification_retaliation(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        self.retaliation_countdown -= dt;
        if self.retaliation_countdown > 0.0 {
            return;
        }

        let alive = boss.alive_root();
        let parts = boss.parts_mut();
        parts.set_colour(alive, Rgba::WHITE);
        parts.clear_transform_anims(alive);
        parts.set_z_rotation(alive, 0.0);
        parts.animate_rotation(
            alive,
            MultiLerp::simple(
                0.0,
                ROTATE_BACK_TO_UPRIGHT_TIME_IN_SECS,
                Vec3::new(0.0, 0.0, self.tilt_degrees),
                Vec3::ZERO,
            ),
        );
        self.tilt_degrees = 0.0;

        // Тесла-блоки замыкает ответным разрядом
        for center in tesla_block_centers(env.ctx.level_width()) {
            env.sink.announce_general_effect(GeneralEffect::ShortCircuit {
                position: center,
                size: PIECE_WIDTH,
                time: 2.0,
            });
        }
        self.set_state(DecoState::Angry, boss, env);
    }

    fn execute_angry(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        self.angry_countdown -= dt;
        if self.angry_countdown > 0.0 {
            return;
        }
        stop_angry_anims(boss);
        let Some(next_stage) = self.stage.next() else {
            self.set_state(DecoState::FinalDeathThroes, boss, env);
            return;
        };
        if !boss.has_pending_ai_state() {
            let next = DecoAi::new(next_stage, self.parts.clone(), boss, env.rng);
            boss.set_next_ai_state(BossAi::Deco(next));
        }
    }

    fn execute_final_death_throes(&mut self, dt: f32) {
        self.death_countdown -= dt;
        if self.death_countdown <= 0.0 && !self.finished {
            self.finished = true;
            log("Deco boss: final death complete");
        }
    }
}

impl BossAiStage for DecoAi {
    fn update(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        if self.state.uses_rc_camera_override() && self.remote_control_override(boss, env) {
            return;
        }

        match self.state {
            DecoState::StationaryAttack => self.execute_stationary_attack(dt, boss, env),
            DecoState::MovingAttack => self.execute_moving_attack(dt, boss, env),
            DecoState::MovingAttackAndItemDrop => self.execute_moving_attack_and_item_drop(dt, boss, env),
            DecoState::SideToSideItemDropFarLeft | DecoState::SideToSideItemDropFarRight => {
                self.execute_side_to_side_item_drop(boss, env)
            }
            DecoState::MoveToPaddleArmAttackPos => self.execute_move_to_paddle_arm_attack_pos(boss, env),
            DecoState::ArmAttack => self.execute_arm_attack(dt, boss, env),
            DecoState::MoveToCenterForLevelRot => self.execute_move_to_center_for_level_rot(boss, env),
            DecoState::RotatingLevel => self.execute_rotating_level(dt, boss, env),
            DecoState::FinishRotatingLevel => self.execute_finish_rotating_level(dt, boss, env),
            DecoState::Electrified => self.execute_electrified(dt, boss, env),
            DecoState::ElectrificationRetaliation => self.execute_electrification_retaliation(dt, boss, env),
            DecoState::Angry => self.execute_angry(dt, boss, env),
            DecoState::FinalDeathThroes => self.execute_final_death_throes(dt),
        }
        self.motion.update_movement(dt, boss);
        keep_inside_level(boss, env.ctx.level_width(), env.ctx.level_height());
    }

    fn on_tesla_arc_hit(&mut self, boss: &mut Boss, part: PartId, env: &mut BossEnv) {
        if part != self.parts.lightning_relay || self.state.is_hurt() || !boss.is_part_alive(part) {
            return;
        }
        log(&format!("Deco {}: lightning relay struck by tesla arc", self.stage.name()));
        self.set_state(DecoState::Electrified, boss, env);
    }

    fn total_life_percent(&self, _boss: &Boss) -> f32 {
        if self.state == DecoState::FinalDeathThroes {
            return 0.0;
        }
        let hits = self.stage.hits_taken() + if self.state.is_hurt() { 1.0 } else { 0.0 };
        ((3.0 - hits) / 3.0).clamp(0.0, 1.0)
    }

    fn is_finished(&self) -> bool {
        self.finished
    }

    fn stage_name(&self) -> &'static str {
        self.stage.name()
    }

    fn state_name(&self) -> &'static str {
        match self.state {
            DecoState::StationaryAttack => "StationaryAttackAIState",
            DecoState::MovingAttack => "MovingAttackAIState",
            DecoState::MovingAttackAndItemDrop => "MovingAttackAndItemDropAIState",
            DecoState::SideToSideItemDropFarLeft => "SideToSideItemDropFarLeftAIState",
            DecoState::SideToSideItemDropFarRight => "SideToSideItemDropFarRightAIState",
            DecoState::MoveToPaddleArmAttackPos => "MoveToPaddleArmAttackPosAIState",
            DecoState::ArmAttack => "ArmAttackAIState",
            DecoState::MoveToCenterForLevelRot => "MoveToCenterForLevelRotAIState",
            DecoState::RotatingLevel => "RotatingLevelAIState",
            DecoState::FinishRotatingLevel => "FinishRotatingLevelAIState",
            DecoState::Electrified => "ElectrifiedAIState",
            DecoState::ElectrificationRetaliation => "ElectrificationRetaliationAIState",
            DecoState::Angry => "AngryAIState",
            DecoState::FinalDeathThroes => "FinalDeathThroesAIState",
        }
    }

    fn vulnerable_parts(&self, boss: &Boss) -> Vec<(PartId, DamageChannel)> {
        if self.state.is_hurt() || !boss.is_part_alive(self.parts.lightning_relay) {
            return Vec::new();
        }
        vec![(self.parts.lightning_relay, DamageChannel::TeslaArc)]
    }

    fn can_hurt_paddle_with_body(&self) -> bool {
        self.state == DecoState::ArmAttack
    }
}
