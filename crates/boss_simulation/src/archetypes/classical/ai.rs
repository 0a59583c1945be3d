//! Стадии Classical босса: ArmsBodyHead → BodyHead → Head → Eye → Dying.
//!
//! Все стадии делят один набор под-состояний; стадия определяет, какие части
//! являются weakpoint'ами, скорость и доступные атаки (руки есть только в первой).

use bevy::prelude::*;

use super::{
    ClassicalParts, ARMS_BODY_HEAD_ACCELERATION, ARMS_BODY_HEAD_MAX_SPEED, ARM_HEIGHT, ARM_WIDTH,
    ARM_X_TRANSLATION_FROM_CENTER, BODY_HEAD_ACCELERATION, BODY_HEAD_MAX_SPEED, EYE_ACCELERATION, EYE_MAX_SPEED,
    HALF_ARM_WIDTH, PEDIMENT_ACCELERATION, PEDIMENT_MAX_SPEED,
};
use crate::ai::{keep_inside_level, BossAi, BossAiStage, BossEnv, DamageChannel, Motion};
use crate::anim::MultiLerp;
use crate::archetypes::{drop_off_part, part_pos, start_angry_anims, stop_angry_anims};
use crate::boss::{anims, Boss};
use crate::config::PIECE_WIDTH;
use crate::context::ProjectileKind;
use crate::effects::{BossEffect, GeneralEffect};
use crate::geometry::{rotate_degrees, Rgba};
use crate::logger::log;
use crate::parts::{DiminishOutcome, PartId, INVULNERABLE_TIME_IN_SECS};
use crate::random::RandomSource;

pub const ARM_LIFE_POINTS: f32 = 300.0;
pub const ARM_BALL_DAMAGE: f32 = 100.0;
pub const COLUMN_LIFE_POINTS: f32 = 200.0;
pub const COLUMN_BALL_DAMAGE: f32 = 100.0;
pub const PEDIMENT_LIFE_POINTS: f32 = 300.0;
pub const PEDIMENT_BALL_DAMAGE: f32 = 100.0;
pub const EYE_LIFE_POINTS: f32 = 300.0;
pub const EYE_BALL_DAMAGE: f32 = 100.0;

pub const LASER_SPRAY_RESET_TIME_IN_SECS: f32 = 1.5;
pub const ANGLE_BETWEEN_LASERS_IN_DEGS: f32 = 15.0;
pub const PREP_LASER_TIME_IN_SECS: f32 = 1.25;
pub const BARRAGE_SHOT_INTERVAL_IN_SECS: f32 = 0.3;
pub const ANGRY_TIME_IN_SECS: f32 = 3.0;
const LIMB_FALL_TIME: f32 = 2.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassicalStage {
    ArmsBodyHead,
    BodyHead,
    Head,
    Eye,
    Dying,
}

impl ClassicalStage {
    pub fn name(&self) -> &'static str {
        match self {
            ClassicalStage::ArmsBodyHead => "ArmsBodyHeadAI",
            ClassicalStage::BodyHead => "BodyHeadAI",
            ClassicalStage::Head => "HeadAI",
            ClassicalStage::Eye => "EyeAI",
            ClassicalStage::Dying => "DyingAI",
        }
    }

    fn next(&self) -> ClassicalStage {
        match self {
            ClassicalStage::ArmsBodyHead => ClassicalStage::BodyHead,
            ClassicalStage::BodyHead => ClassicalStage::Head,
            ClassicalStage::Head => ClassicalStage::Eye,
            ClassicalStage::Eye | ClassicalStage::Dying => ClassicalStage::Dying,
        }
    }

    fn max_speed(&self) -> f32 {
        match self {
            ClassicalStage::ArmsBodyHead => ARMS_BODY_HEAD_MAX_SPEED,
            ClassicalStage::BodyHead => BODY_HEAD_MAX_SPEED,
            ClassicalStage::Head => PEDIMENT_MAX_SPEED,
            ClassicalStage::Eye => EYE_MAX_SPEED,
            ClassicalStage::Dying => 0.0,
        }
    }

    fn acceleration(&self) -> f32 {
        match self {
            ClassicalStage::ArmsBodyHead => ARMS_BODY_HEAD_ACCELERATION,
            ClassicalStage::BodyHead => BODY_HEAD_ACCELERATION,
            ClassicalStage::Head => PEDIMENT_ACCELERATION,
            ClassicalStage::Eye => EYE_ACCELERATION,
            ClassicalStage::Dying => 0.0,
        }
    }

    /// Доля общей жизни, уже потерянная до начала стадии
    fn life_offset(&self) -> f32 {
        match self {
            ClassicalStage::ArmsBodyHead => 0.75,
            ClassicalStage::BodyHead => 0.5,
            ClassicalStage::Head => 0.25,
            ClassicalStage::Eye | ClassicalStage::Dying => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassicalState {
    BasicMoveAndLaserSpray,
    ChasePaddle,
    AttackLeftArm,
    AttackRightArm,
    AttackBothArms,
    PrepLaser,
    MoveAndBarrageWithLaser,
    Hurt,
    Angry,
    FinalDeathThroes,
}

impl ClassicalState {
    fn is_arm_attack(&self) -> bool {
        matches!(
            self,
            ClassicalState::AttackLeftArm | ClassicalState::AttackRightArm | ClassicalState::AttackBothArms
        )
    }
}

#[derive(Debug, Clone)]
pub struct ClassicalAi {
    stage: ClassicalStage,
    parts: ClassicalParts,
    state: ClassicalState,
    motion: Motion,
    weakpoints: Vec<PartId>,

    laser_spray_countdown: f32,
    countdown_to_next_state: f32,
    countdown_to_attack: f32,
    prep_laser_countdown: f32,
    barrage_shot_countdown: f32,
    num_shots_until_next_state: u32,
    hurt_countdown: f32,
    angry_countdown: f32,
    death_countdown: f32,
    arm_attack_countdown: f32,
    /// Первый тик текущего состояния уже отработал
    state_entered: bool,
    finished: bool,
}

impl ClassicalAi {
    /// Начать стадию: конвертирует её weakpoint'ы и входит в стартовое под-состояние
    pub fn new(stage: ClassicalStage, parts: ClassicalParts, boss: &mut Boss, rng: &mut dyn RandomSource) -> Self {
        let weakpoints = match stage {
            ClassicalStage::ArmsBodyHead => {
                boss.make_weakpoint_or_log(parts.left_arm_square, ARM_LIFE_POINTS, ARM_BALL_DAMAGE);
                boss.make_weakpoint_or_log(parts.right_arm_square, ARM_LIFE_POINTS, ARM_BALL_DAMAGE);
                vec![parts.left_arm_square, parts.right_arm_square]
            }
            ClassicalStage::BodyHead => {
                parts.generate_full_column_pediment_bounds(boss.parts_mut());
                for column in parts.columns {
                    boss.make_weakpoint_or_log(column, COLUMN_LIFE_POINTS, COLUMN_BALL_DAMAGE);
                }
                parts.columns.to_vec()
            }
            ClassicalStage::Head => {
                boss.make_weakpoint_or_log(parts.pediment, PEDIMENT_LIFE_POINTS, PEDIMENT_BALL_DAMAGE);
                vec![parts.pediment]
            }
            ClassicalStage::Eye => {
                parts.generate_eye_bounds(boss.parts_mut());
                boss.make_weakpoint_or_log(parts.eye, EYE_LIFE_POINTS, EYE_BALL_DAMAGE);
                vec![parts.eye]
            }
            ClassicalStage::Dying => Vec::new(),
        };

        let mut ai = Self {
            stage,
            parts,
            state: ClassicalState::BasicMoveAndLaserSpray,
            motion: Motion::new(stage.acceleration()),
            weakpoints,
            laser_spray_countdown: LASER_SPRAY_RESET_TIME_IN_SECS,
            countdown_to_next_state: 0.0,
            countdown_to_attack: 0.0,
            prep_laser_countdown: 0.0,
            barrage_shot_countdown: 0.0,
            num_shots_until_next_state: 0,
            hurt_countdown: 0.0,
            angry_countdown: 0.0,
            death_countdown: 0.0,
            arm_attack_countdown: 0.0,
            state_entered: false,
            finished: false,
        };

        if stage == ClassicalStage::Dying {
            ai.start_dying(boss, rng);
        } else {
            ai.set_state(ClassicalState::BasicMoveAndLaserSpray, boss, rng);
        }
        ai
    }

    pub fn stage(&self) -> ClassicalStage {
        self.stage
    }

    pub fn state(&self) -> ClassicalState {
        self.state
    }

    pub fn parts(&self) -> &ClassicalParts {
        &self.parts
    }

    pub fn num_shots_until_next_state(&self) -> u32 {
        self.num_shots_until_next_state
    }

    pub fn set_num_shots_until_next_state(&mut self, shots: u32) {
        self.num_shots_until_next_state = shots;
    }

    fn generate_basic_move_time(rng: &mut dyn RandomSource) -> f32 {
        10.0 + rng.random_zero_to_one() * 5.0
    }

    fn generate_follow_time(rng: &mut dyn RandomSource) -> f32 {
        5.0 + rng.random_zero_to_one() * 5.0
    }

    fn generate_num_barrage_shots(rng: &mut dyn RandomSource) -> u32 {
        6 + rng.random_unsigned() % 5
    }

    /// Средняя жизнь weakpoint'ов стадии
    fn stage_life_percent(&self, boss: &Boss) -> f32 {
        if self.weakpoints.is_empty() {
            return 0.0;
        }
        let sum: f32 = self.weakpoints.iter().map(|w| boss.parts().life_percentage(*w)).sum();
        sum / self.weakpoints.len() as f32
    }

    fn max_arm_attack_y_movement() -> f32 {
        0.7 * ARM_HEIGHT
    }

    fn follow_and_attack_height(boss: &Boss) -> f32 {
        let alive_height = boss.alive_aabb().map(|a| a.size().y).unwrap_or(0.0);
        0.8 * Self::max_arm_attack_y_movement() + alive_height / 2.0
    }

    fn basic_movement_height(boss: &Boss, level_height: f32) -> f32 {
        let alive_height = boss.alive_aabb().map(|a| a.size().y).unwrap_or(0.0);
        level_height - 0.75 * alive_height
    }

    // Переходы -------------------------------------------------------------

    fn set_state(&mut self, new_state: ClassicalState, boss: &mut Boss, rng: &mut dyn RandomSource) {
        // Выход из атаки рукой: руки возвращаются на место
        if self.state.is_arm_attack() && !new_state.is_arm_attack() {
            self.reset_arms(boss);
        }

        match new_state {
            ClassicalState::BasicMoveAndLaserSpray => {
                self.laser_spray_countdown = LASER_SPRAY_RESET_TIME_IN_SECS;
                self.countdown_to_next_state = Self::generate_basic_move_time(rng);
            }
            ClassicalState::ChasePaddle => {
                self.countdown_to_attack = Self::generate_follow_time(rng);
                self.laser_spray_countdown = LASER_SPRAY_RESET_TIME_IN_SECS;
            }
            ClassicalState::AttackLeftArm | ClassicalState::AttackRightArm | ClassicalState::AttackBothArms => {
                self.motion.stop();
                let anim = Self::arm_attack_anim();
                self.arm_attack_countdown = anim.final_time();
                let (left, right) = match new_state {
                    ClassicalState::AttackLeftArm => (true, false),
                    ClassicalState::AttackRightArm => (false, true),
                    _ => (true, true),
                };
                if left && boss.is_part_alive(self.parts.left_arm) {
                    boss.parts_mut().animate_translation(self.parts.left_arm, anim.clone());
                }
                if right && boss.is_part_alive(self.parts.right_arm) {
                    boss.parts_mut().animate_translation(self.parts.right_arm, anim);
                }
            }
            ClassicalState::PrepLaser => {
                self.motion.stop();
                self.prep_laser_countdown = PREP_LASER_TIME_IN_SECS;
            }
            ClassicalState::MoveAndBarrageWithLaser => {
                self.barrage_shot_countdown = BARRAGE_SHOT_INTERVAL_IN_SECS;
                self.num_shots_until_next_state = Self::generate_num_barrage_shots(rng);
                self.motion.desired_vel = Vec2::new(rng.random_negative_or_positive() * self.stage.max_speed(), 0.0);
            }
            ClassicalState::Hurt => {
                self.motion.stop();
                self.hurt_countdown = INVULNERABLE_TIME_IN_SECS;
            }
            ClassicalState::Angry => {
                self.motion.stop();
                self.angry_countdown = ANGRY_TIME_IN_SECS;
            }
            ClassicalState::FinalDeathThroes => {
                self.motion.stop();
                self.death_countdown = anims::TOTAL_DEATH_ANIM_TIME;
            }
        }
        if self.state != new_state {
            log(&format!(
                "Classical {}: {:?} -> {:?}",
                self.stage.name(),
                self.state,
                new_state
            ));
        }
        self.state = new_state;
        self.state_entered = false;
    }

    /// `true` ровно один раз - на первом тике состояния
    fn first_tick_of_state(&mut self) -> bool {
        !std::mem::replace(&mut self.state_entered, true)
    }

    fn reset_arms(&mut self, boss: &mut Boss) {
        for arm in [self.parts.left_arm, self.parts.right_arm] {
            if boss.is_part_alive(arm) {
                boss.parts_mut().clear_transform_anims(arm);
            }
        }
    }

    /// Тряска руки по X (предупреждение), затем удар вниз и возврат
    fn arm_attack_anim() -> MultiLerp<Vec3> {
        let max_move = 0.15 * ARM_WIDTH;
        let shake: [(f32, f32); 9] = [
            (0.0, 0.0),
            (0.07, -max_move),
            (0.18, max_move),
            (0.27, 0.6 * max_move),
            (0.34, -max_move),
            (0.49, max_move),
            (0.67, -0.2 * max_move),
            (0.87, max_move),
            (1.0, 0.0),
        ];
        let y_max = Self::max_arm_attack_y_movement();
        let attack: [(f32, f32); 4] = [(0.4, -1.15 * y_max), (0.48, -y_max), (1.0, -y_max), (2.5, 0.0)];

        let mut times = Vec::with_capacity(shake.len() + attack.len());
        let mut values = Vec::with_capacity(times.capacity());
        for (t, x) in shake {
            times.push(t);
            values.push(Vec3::new(x, 0.0, 0.0));
        }
        for (t, y) in attack {
            times.push(1.0 + t);
            values.push(Vec3::new(0.0, y, 0.0));
        }
        MultiLerp::new(times, values, Vec3::ZERO)
    }

    // Атаки ----------------------------------------------------------------

    /// Веер из 5 лазеров из глаза в сторону paddle
    pub fn execute_laser_spray(&self, boss: &Boss, env: &mut BossEnv) {
        let eye_pos = part_pos(boss, self.parts.eye);
        let paddle_pos = env.ctx.paddle().center;
        let init_dir = (paddle_pos - eye_pos).normalize_or_zero();
        let init_dir = if init_dir == Vec2::ZERO { Vec2::NEG_Y } else { init_dir };
        let speed = ProjectileKind::BossLaserBullet.default_speed();

        for step in [0.0, 1.0, 2.0, -1.0, -2.0] {
            let dir = rotate_degrees(init_dir, step * ANGLE_BETWEEN_LASERS_IN_DEGS);
            env.ctx.spawn_projectile(ProjectileKind::BossLaserBullet, eye_pos, dir, speed);
        }
    }

    /// Один выстрел барража; на последнем - возврат к базовому движению
    pub fn shoot_barrage_laser(&mut self, boss: &mut Boss, env: &mut BossEnv) {
        let eye_pos = part_pos(boss, self.parts.eye);
        let dir = (env.ctx.paddle().center - eye_pos).normalize_or_zero();
        env.ctx.spawn_projectile(
            ProjectileKind::BossLaserBullet,
            eye_pos,
            dir,
            ProjectileKind::BossLaserBullet.default_speed(),
        );

        self.num_shots_until_next_state = self.num_shots_until_next_state.saturating_sub(1);
        if self.num_shots_until_next_state == 0 {
            self.set_state(ClassicalState::BasicMoveAndLaserSpray, boss, env.rng);
            // Счётчик для следующего барража
            self.num_shots_until_next_state = Self::generate_num_barrage_shots(env.rng);
        }
    }

    // Под-состояния ---------------------------------------------------------

    fn execute_basic_move_and_laser_spray(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        let boss_pos = boss.position();
        let max_speed = self.stage.max_speed();
        let level_width = env.ctx.level_width();
        let avg_height = Self::basic_movement_height(boss, env.ctx.level_height());
        let alive = boss.alive_aabb();
        let half_width = alive.map(|a| a.size().x / 2.0).unwrap_or(0.0);
        let up_down = alive.map(|a| a.size().y / 5.0).unwrap_or(1.0);

        if boss_pos.y < avg_height - up_down {
            self.motion.desired_vel.y = max_speed / 2.0;
        }
        if boss_pos.y > avg_height + up_down {
            self.motion.desired_vel.y = -max_speed / 2.0;
        }

        // Из стороны в сторону
        if boss_pos.x <= half_width + PIECE_WIDTH {
            self.motion.desired_vel.x = max_speed / 1.25;
        } else if boss_pos.x >= level_width - half_width - PIECE_WIDTH {
            self.motion.desired_vel.x = -max_speed / 1.25;
        }
        if self.motion.desired_vel.x.abs() < f32::EPSILON {
            self.motion.desired_vel.x = env.rng.random_negative_or_positive() * max_speed / 1.25;
        }

        if self.countdown_to_next_state <= 0.0 {
            // Чем меньше жизни, тем чаще лазерный барраж
            let life = self.stage_life_percent(boss);
            if env.rng.random_zero_to_one() >= life - 0.1 {
                self.set_state(ClassicalState::PrepLaser, boss, env.rng);
            } else {
                self.set_state(ClassicalState::ChasePaddle, boss, env.rng);
            }
            return;
        }
        self.countdown_to_next_state -= dt;

        if self.laser_spray_countdown <= 0.0 {
            self.execute_laser_spray(boss, env);
            self.laser_spray_countdown = LASER_SPRAY_RESET_TIME_IN_SECS;
        } else {
            self.laser_spray_countdown -= dt;
        }
    }

    fn execute_chase_paddle(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        let paddle_pos = env.ctx.paddle().center;
        let boss_pos = boss.position();
        let max_speed = self.stage.max_speed();
        let has_arms = self.stage == ClassicalStage::ArmsBodyHead;

        // Спуск на высоту атаки
        let mut allowed_to_attack = false;
        if boss_pos.y > Self::follow_and_attack_height(boss) {
            self.motion.desired_vel.y = -max_speed / 2.0;
        } else {
            self.motion.curr_vel.y = 0.0;
            self.motion.desired_vel.y = 0.0;
            allowed_to_attack = true;
        }

        let boss_to_paddle = paddle_pos - boss_pos;
        let abs_x = boss_to_paddle.x.abs();

        if has_arms {
            let arm_min = ARM_X_TRANSLATION_FROM_CENTER - HALF_ARM_WIDTH;
            let arm_max = ARM_X_TRANSLATION_FROM_CENTER + HALF_ARM_WIDTH;
            if (arm_min..=arm_max).contains(&abs_x) {
                // Paddle прямо под рукой - бьём сразу
                self.motion.desired_vel.x = 0.0;
                if allowed_to_attack {
                    let next = self.determine_next_arm_attack_state(boss, boss_to_paddle, env.rng);
                    self.set_state(next, boss, env.rng);
                }
                return;
            } else if abs_x > arm_max {
                self.motion.desired_vel.x = boss_to_paddle.x.signum() * max_speed;
            } else {
                // Слишком близко к центру: отходим, чтобы paddle оказался под рукой
                let sign = if abs_x < f32::EPSILON {
                    if env.rng.random_unsigned() % 2 == 0 {
                        1.0
                    } else {
                        -1.0
                    }
                } else if boss_to_paddle.x < 0.0 {
                    1.0
                } else {
                    -1.0
                };
                self.motion.desired_vel.x = sign * max_speed;
            }
        } else {
            // Без рук: висим над paddle и поливаем лазерами
            self.motion.desired_vel.x = if abs_x > PIECE_WIDTH {
                boss_to_paddle.x.signum() * max_speed
            } else {
                0.0
            };
            if self.laser_spray_countdown <= 0.0 {
                self.execute_laser_spray(boss, env);
                self.laser_spray_countdown = LASER_SPRAY_RESET_TIME_IN_SECS;
            } else {
                self.laser_spray_countdown -= dt;
            }
        }

        if self.countdown_to_attack <= 0.0 {
            if has_arms {
                if allowed_to_attack {
                    let next = self.determine_next_arm_attack_state(boss, boss_to_paddle, env.rng);
                    self.set_state(next, boss, env.rng);
                }
            } else {
                self.set_state(ClassicalState::BasicMoveAndLaserSpray, boss, env.rng);
            }
        } else {
            self.countdown_to_attack -= dt;
        }
    }

    fn determine_next_arm_attack_state(
        &self,
        boss: &Boss,
        boss_to_paddle: Vec2,
        rng: &mut dyn RandomSource,
    ) -> ClassicalState {
        let left_alive = boss.is_part_alive(self.parts.left_arm);
        let right_alive = boss.is_part_alive(self.parts.right_arm);
        match (left_alive, right_alive) {
            (true, false) => return ClassicalState::AttackLeftArm,
            (false, true) => return ClassicalState::AttackRightArm,
            _ => {}
        }

        let life = self.stage_life_percent(boss);
        if rng.random_zero_to_one() >= life - 0.05 {
            ClassicalState::AttackBothArms
        } else if boss_to_paddle.x < 0.0 {
            ClassicalState::AttackLeftArm
        } else {
            ClassicalState::AttackRightArm
        }
    }

    fn execute_arm_attack(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        self.arm_attack_countdown -= dt;
        if self.arm_attack_countdown <= 0.0 {
            self.set_state(ClassicalState::BasicMoveAndLaserSpray, boss, env.rng);
        }
    }

    fn execute_prep_laser(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        if self.first_tick_of_state() {
            env.sink.announce_boss_effect(BossEffect::PowerCharge {
                part: self.parts.eye,
                time: PREP_LASER_TIME_IN_SECS,
                colour: Rgba::RED,
                size: 2.0,
                offset: Vec3::ZERO,
            });
        }
        self.prep_laser_countdown -= dt;
        if self.prep_laser_countdown <= 0.0 {
            self.set_state(ClassicalState::MoveAndBarrageWithLaser, boss, env.rng);
        }
    }

    fn execute_move_and_barrage(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        let boss_pos = boss.position();
        let max_speed = self.stage.max_speed();
        let half_width = boss.alive_aabb().map(|a| a.size().x / 2.0).unwrap_or(0.0);
        let level_width = env.ctx.level_width();
        if boss_pos.x <= half_width + PIECE_WIDTH {
            self.motion.desired_vel.x = max_speed;
        } else if boss_pos.x >= level_width - half_width - PIECE_WIDTH {
            self.motion.desired_vel.x = -max_speed;
        }

        self.barrage_shot_countdown -= dt;
        if self.barrage_shot_countdown <= 0.0 {
            self.barrage_shot_countdown = BARRAGE_SHOT_INTERVAL_IN_SECS;
            self.shoot_barrage_laser(boss, env);
        }
    }

    fn execute_hurt(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        self.hurt_countdown -= dt;
        if self.hurt_countdown <= 0.0 {
            self.set_state(ClassicalState::BasicMoveAndLaserSpray, boss, env.rng);
        }
    }

    fn execute_angry(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        if self.first_tick_of_state() {
            start_angry_anims(boss, self.parts.eye, 0.3, env.rng, env.sink);
            if self.stage == ClassicalStage::BodyHead {
                self.drop_lower_body(boss, env);
            }
        }
        self.angry_countdown -= dt;
        if self.angry_countdown <= 0.0 && !boss.has_pending_ai_state() {
            stop_angry_anims(boss);
            let next = ClassicalAi::new(self.stage.next(), self.parts.clone(), boss, env.rng);
            boss.set_next_ai_state(BossAi::Classical(next));
        }
    }

    /// База и нижние антаблементы отваливаются после потери всех колонн
    fn drop_lower_body(&self, boss: &mut Boss, env: &mut BossEnv) {
        let level_height = env.ctx.level_height();
        for (part, x_dist, rot) in [
            (self.parts.base, 0.0, 5.0),
            (self.parts.bottom_left_tablature, -3.0, 25.0),
            (self.parts.bottom_right_tablature, 3.0, -25.0),
        ] {
            if boss.is_part_alive(part) {
                drop_off_part(boss, part, LIMB_FALL_TIME, x_dist, -level_height, rot);
            }
        }
        env.sink.announce_general_effect(GeneralEffect::LevelShake {
            time: 1.0,
            direction: Vec2::new(0.0, -0.6),
            magnitude: 100.0,
        });
    }

    fn start_dying(&mut self, boss: &mut Boss, rng: &mut dyn RandomSource) {
        self.set_state(ClassicalState::FinalDeathThroes, boss, rng);
        let alive = boss.alive_root();
        let shake = anims::final_death_shake_anim(0.35, rng);
        let parts = boss.parts_mut();
        parts.animate_colour(alive, anims::final_death_flash_anim());
        parts.animate_translation(alive, shake);
    }

    fn execute_final_death_throes(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        if self.first_tick_of_state() {
            env.sink.clear_active_boss_effects();
            env.sink.announce_boss_effect(BossEffect::ExpandingHalo {
                part: self.parts.eye,
                time: anims::TOTAL_DEATH_ANIM_TIME,
                colour: Rgba::WHITE,
                size: 6.0,
                offset: Vec3::ZERO,
            });
        }
        self.death_countdown -= dt;
        if self.death_countdown <= 0.0 && !self.finished {
            self.finished = true;
            let alive_root = boss.alive_root();
            boss.parts_mut().clear_transform_anims(alive_root);
            log(&format!("Classical {}: final death complete", self.stage.name()));
        }
    }

    // Урон -----------------------------------------------------------------

    fn can_take_damage(&self) -> bool {
        !matches!(
            self.state,
            ClassicalState::Hurt | ClassicalState::Angry | ClassicalState::FinalDeathThroes
        )
    }

    /// Реакция на исход удара по weakpoint'у стадии
    fn react_to_damage(&mut self, part: PartId, outcome: DiminishOutcome, boss: &mut Boss, env: &mut BossEnv) {
        match outcome {
            DiminishOutcome::Ignored => {}
            DiminishOutcome::Hurt => self.set_state(ClassicalState::Hurt, boss, env.rng),
            DiminishOutcome::Destroyed => {
                self.drop_destroyed_weakpoint(part, boss, env);
                let all_gone = self.weakpoints.iter().all(|w| boss.parts().is_destroyed(*w));
                if all_gone {
                    self.set_state(ClassicalState::Angry, boss, env.rng);
                } else {
                    self.set_state(ClassicalState::Hurt, boss, env.rng);
                }
            }
        }
    }

    fn drop_destroyed_weakpoint(&mut self, part: PartId, boss: &mut Boss, env: &mut BossEnv) {
        let level_height = env.ctx.level_height();
        let boss_x = boss.position().x;
        match self.stage {
            ClassicalStage::ArmsBodyHead => {
                // Отваливается вся рука, а не только квадрат
                let (arm, dir) = if part == self.parts.left_arm_square {
                    (self.parts.left_arm, -1.0)
                } else {
                    (self.parts.right_arm, 1.0)
                };
                self.reset_arms(boss);
                drop_off_part(boss, arm, LIMB_FALL_TIME, dir * 3.0, -level_height, dir * -30.0);
            }
            ClassicalStage::BodyHead => {
                let dir = (part_pos(boss, part).x - boss_x).signum();
                drop_off_part(boss, part, LIMB_FALL_TIME, dir * 2.0, -level_height, dir * -20.0);
            }
            ClassicalStage::Head => {
                for p in [self.parts.pediment, self.parts.top_left_tablature, self.parts.top_right_tablature] {
                    if boss.is_part_alive(p) || p == part {
                        let dir = (part_pos(boss, p).x - boss_x).signum();
                        drop_off_part(boss, p, LIMB_FALL_TIME, dir * 2.0, -level_height, dir * -15.0);
                    }
                }
            }
            ClassicalStage::Eye | ClassicalStage::Dying => {}
        }
        env.sink.announce_general_effect(GeneralEffect::Explosion {
            position: part_pos(boss, part),
            size: 4.0,
        });
    }

    fn is_stage_weakpoint(&self, part: PartId) -> bool {
        self.weakpoints.contains(&part)
    }
}

impl BossAiStage for ClassicalAi {
    fn update(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        match self.state {
            ClassicalState::BasicMoveAndLaserSpray => self.execute_basic_move_and_laser_spray(dt, boss, env),
            ClassicalState::ChasePaddle => self.execute_chase_paddle(dt, boss, env),
            ClassicalState::AttackLeftArm | ClassicalState::AttackRightArm | ClassicalState::AttackBothArms => {
                self.execute_arm_attack(dt, boss, env)
            }
            ClassicalState::PrepLaser => self.execute_prep_laser(dt, boss, env),
            ClassicalState::MoveAndBarrageWithLaser => self.execute_move_and_barrage(dt, boss, env),
            ClassicalState::Hurt => self.execute_hurt(dt, boss, env),
            ClassicalState::Angry => self.execute_angry(dt, boss, env),
            ClassicalState::FinalDeathThroes => self.execute_final_death_throes(dt, boss, env),
        }

        // Интеграция движения последней
        self.motion.update_movement(dt, boss);
        keep_inside_level(boss, env.ctx.level_width(), env.ctx.level_height());
    }

    fn on_ball_collision(&mut self, boss: &mut Boss, part: PartId, env: &mut BossEnv) {
        if !self.can_take_damage() || !self.is_stage_weakpoint(part) {
            return;
        }
        let outcome = boss.ball_hit_weakpoint(part, env.sink);
        self.react_to_damage(part, outcome, boss, env);
    }

    fn on_projectile_collision(&mut self, boss: &mut Boss, kind: ProjectileKind, part: PartId, env: &mut BossEnv) {
        if !self.can_take_damage() || !self.is_stage_weakpoint(part) {
            return;
        }
        let outcome = boss.projectile_hit_weakpoint(part, kind, env.sink);
        self.react_to_damage(part, outcome, boss, env);
    }

    fn total_life_percent(&self, boss: &Boss) -> f32 {
        if self.stage == ClassicalStage::Dying {
            return 0.0;
        }
        self.stage.life_offset() + 0.25 * self.stage_life_percent(boss)
    }

    fn is_finished(&self) -> bool {
        self.finished
    }

    fn stage_name(&self) -> &'static str {
        self.stage.name()
    }

    fn state_name(&self) -> &'static str {
        match self.state {
            ClassicalState::BasicMoveAndLaserSpray => "BasicMoveAndLaserSprayAIState",
            ClassicalState::ChasePaddle => "ChasePaddleAIState",
            ClassicalState::AttackLeftArm => "AttackLeftArmAIState",
            ClassicalState::AttackRightArm => "AttackRightArmAIState",
            ClassicalState::AttackBothArms => "AttackBothArmsAIState",
            ClassicalState::PrepLaser => "PrepLaserAIState",
            ClassicalState::MoveAndBarrageWithLaser => "MoveAndBarrageWithLaserAIState",
            ClassicalState::Hurt => "HurtAIState",
            ClassicalState::Angry if self.stage == ClassicalStage::ArmsBodyHead => "LostArmsAngryAIState",
            ClassicalState::Angry => "AngryAIState",
            ClassicalState::FinalDeathThroes => "FinalDeathThroesAIState",
        }
    }

    fn vulnerable_parts(&self, boss: &Boss) -> Vec<(PartId, DamageChannel)> {
        if !self.can_take_damage() {
            return Vec::new();
        }
        self.weakpoints
            .iter()
            .copied()
            .filter(|w| boss.is_part_alive(*w))
            .filter(|w| boss.parts().weakpoint(*w).map(|s| !s.is_invulnerable()).unwrap_or(false))
            .flat_map(|w| {
                [
                    (w, DamageChannel::Ball),
                    (w, DamageChannel::Projectile(ProjectileKind::PaddleLaserBullet)),
                ]
            })
            .collect()
    }

    fn can_hurt_paddle_with_body(&self) -> bool {
        self.state.is_arm_attack()
    }
}
