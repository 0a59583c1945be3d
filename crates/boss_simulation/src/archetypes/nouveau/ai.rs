//! Стадии Nouveau босса: SideSphere → GlassDome → TopSphere.
//!
//! Все стадии делят набор атак (движение по целям с выстрелами, веер, стремительная
//! очередь, лучи) и отличаются weakpoint'ами и таблицей таймингов. Стадии ничего не
//! знают о раскладке уровня: призмы, отражающие лазеры, не моделируются.

use bevy::prelude::*;

use super::{
    movement_aabb, side_curl_shoot_offset, NouveauParts, ARM_SPHERE_HOLDER_CURL_WIDTH, BOTTOM_BEAM_HALF_RADIUS,
    BOTTOM_SPHERE_BEAM_OFFSET, GLASS_DOME_ACCELERATION, GLASS_DOME_MAX_SPEED, MAX_Y_BOUNDS_WITH_PADDING,
    MIN_Y_BOUNDS_WITH_PADDING, SIDE_BEAM_HALF_RADIUS, SIDE_SPHERE_ACCELERATION, SIDE_SPHERE_MAX_SPEED,
    TOP_SPHERE_ACCELERATION, TOP_SPHERE_MAX_SPEED,
};
use crate::ai::{keep_inside_level, BossAi, BossAiStage, BossEnv, DamageChannel, Motion};
use crate::archetypes::{drop_off_part, part_pos, start_angry_anims, stop_angry_anims};
use crate::boss::{anims, Boss};
use crate::context::ProjectileKind;
use crate::effects::{BossEffect, GeneralEffect};
use crate::geometry::{rotate_degrees, Rgba};
use crate::logger::log;
use crate::parts::{DiminishOutcome, PartId, INVULNERABLE_TIME_IN_SECS};
use crate::random::RandomSource;

/// Одно попадание по открытой сфере уничтожает её
pub const SIDE_SPHERE_LIFE_POINTS: f32 = 10.0;
pub const DOME_LIFE_POINTS: f32 = 300.0;
pub const DOME_DAMAGE_ON_HIT: f32 = DOME_LIFE_POINTS / 3.0;
pub const NUM_TOP_SPHERE_HITS_UNTIL_DEAD: u32 = 5;
pub const TOP_SPHERE_LIFE_POINTS: f32 = 500.0;
pub const TOP_SPHERE_DAMAGE_ON_HIT: f32 = TOP_SPHERE_LIFE_POINTS / NUM_TOP_SPHERE_HITS_UNTIL_DEAD as f32;

pub const ANGRY_TIME_IN_SECS: f32 = 3.0;
pub const BEAM_LIFETIME_IN_SECS: f32 = 2.0;
pub const ARC_SPRAY_NUM_LASERS: usize = 7;
pub const ANGLE_BETWEEN_ARC_LASERS_IN_DEGS: f32 = 15.0;
pub const RAPID_FIRE_SWEEP_ANGLE_IN_DEGS: f32 = 120.0;

const SIDE_FRILL_FADEOUT_TIME: f32 = 0.1;
const ARM_FADE_TIME: f32 = 3.0;
const TOP_FALL_TIME: f32 = 3.0;
const NUM_TARGET_RAYS: usize = 8;
const NUM_TARGET_RAYS_TO_ELIMINATE: usize = 6;
const BRUTAL_SPEED_MULTIPLIER: f32 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NouveauStage {
    SideSphere,
    GlassDome,
    TopSphere,
}

impl NouveauStage {
    pub fn name(&self) -> &'static str {
        match self {
            NouveauStage::SideSphere => "SideSphereAI",
            NouveauStage::GlassDome => "GlassDomeAI",
            NouveauStage::TopSphere => "TopSphereAI",
        }
    }

    fn max_speed(&self) -> f32 {
        match self {
            NouveauStage::SideSphere => SIDE_SPHERE_MAX_SPEED,
            NouveauStage::GlassDome => GLASS_DOME_MAX_SPEED,
            NouveauStage::TopSphere => TOP_SPHERE_MAX_SPEED,
        }
    }

    fn acceleration(&self) -> f32 {
        match self {
            NouveauStage::SideSphere => SIDE_SPHERE_ACCELERATION,
            NouveauStage::GlassDome => GLASS_DOME_ACCELERATION,
            NouveauStage::TopSphere => TOP_SPHERE_ACCELERATION,
        }
    }

    /// Доля общей жизни, уже потерянная до начала стадии
    fn life_offset(&self) -> f32 {
        match self {
            NouveauStage::SideSphere => 2.0 / 3.0,
            NouveauStage::GlassDome => 1.0 / 3.0,
            NouveauStage::TopSphere => 0.0,
        }
    }

    fn attack_states(&self) -> &'static [NouveauState] {
        const COMMON: [NouveauState; 4] = [
            NouveauState::MoveToTargetStopAndShoot,
            NouveauState::ArcSprayFire,
            NouveauState::RapidFireSweep,
            NouveauState::MoveToLaserTargetableLocation,
        ];
        const WITH_BRUTAL: [NouveauState; 5] = [
            NouveauState::MoveToTargetStopAndShoot,
            NouveauState::ArcSprayFire,
            NouveauState::RapidFireSweep,
            NouveauState::MoveToLaserTargetableLocation,
            NouveauState::BrutalMoveAndShoot,
        ];
        match self {
            NouveauStage::SideSphere | NouveauStage::GlassDome => &COMMON,
            NouveauStage::TopSphere => &WITH_BRUTAL,
        }
    }

    // Тайминги MoveToTargetStopAndShoot

    fn generate_num_movements(&self, rng: &mut dyn RandomSource) -> u32 {
        match self {
            NouveauStage::SideSphere => 4 + rng.random_unsigned() % 8,
            NouveauStage::GlassDome | NouveauStage::TopSphere => 3 + rng.random_unsigned() % 4,
        }
    }

    fn generate_wait_at_target_time(&self, rng: &mut dyn RandomSource) -> f32 {
        let r = rng.random_zero_to_one();
        match self {
            NouveauStage::SideSphere => 1.0 + 4.0 * r,
            NouveauStage::GlassDome => 0.75 + 3.5 * r,
            NouveauStage::TopSphere => 0.75 + 2.5 * r,
        }
    }

    fn generate_time_between_lasers_at_target(&self, rng: &mut dyn RandomSource) -> f32 {
        let r = rng.random_zero_to_one();
        match self {
            NouveauStage::SideSphere => 0.33 + 0.3 * r,
            NouveauStage::GlassDome => 0.275 + 0.275 * r,
            NouveauStage::TopSphere => 0.225 + 0.225 * r,
        }
    }

    // Веер и очередь

    fn generate_time_between_arc_sprays(&self, rng: &mut dyn RandomSource) -> f32 {
        let r = rng.random_zero_to_one();
        match self {
            NouveauStage::SideSphere => 0.75 + 0.33 * r,
            NouveauStage::GlassDome => 0.5 + 0.5 * r,
            NouveauStage::TopSphere => 0.4 + 0.4 * r,
        }
    }

    fn generate_time_between_rapid_fire_lasers(&self, rng: &mut dyn RandomSource) -> f32 {
        let r = rng.random_zero_to_one();
        match self {
            NouveauStage::SideSphere => 0.09 + 0.2 * r,
            NouveauStage::GlassDome => 0.08 + 0.16 * r,
            NouveauStage::TopSphere => 0.07 + 0.14 * r,
        }
    }

    fn rapid_fire_degs_per_sec(&self) -> f32 {
        match self {
            NouveauStage::SideSphere => 60.0,
            NouveauStage::GlassDome => 75.0,
            NouveauStage::TopSphere => 90.0,
        }
    }

    // Лучи: интервалы между подготовками и выстрелами постоянны

    fn time_between_beam_preps(&self) -> f32 {
        match self {
            NouveauStage::SideSphere => 0.5,
            NouveauStage::GlassDome => 1.0,
            NouveauStage::TopSphere => 0.85,
        }
    }

    fn time_between_last_prep_and_fire(&self) -> f32 {
        match self {
            NouveauStage::SideSphere => 2.5,
            NouveauStage::GlassDome => 1.5,
            NouveauStage::TopSphere => 1.2,
        }
    }

    fn time_between_beam_firings(&self) -> f32 {
        match self {
            NouveauStage::SideSphere => 1.0,
            NouveauStage::GlassDome => 0.75,
            NouveauStage::TopSphere => 0.66,
        }
    }

    fn generate_num_beams(&self, stage_life: f32, rng: &mut dyn RandomSource) -> usize {
        let base = if stage_life < 1.0 { 2 } else { 1 };
        let num = match self {
            NouveauStage::SideSphere => 1,
            NouveauStage::GlassDome => rng.random_unsigned() % 2 + base,
            NouveauStage::TopSphere => rng.random_unsigned() % 3 + base,
        };
        (num as usize).min(BeamFireLocation::ALL.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NouveauState {
    MoveToTargetStopAndShoot,
    ArcSprayFire,
    RapidFireSweep,
    MoveToLaserTargetableLocation,
    PrepLaserBeamAttack,
    LaserBeamAttack,
    BrutalMoveAndShoot,
    LostLeftArm,
    LostRightArm,
    BothArmsLost,
    HurtTop,
    TopLost,
    FinalDeathThroes,
}

/// Откуда стреляет луч
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeamFireLocation {
    LeftSideTop,
    LeftSideBottom,
    CenterBottom,
    RightSideTop,
    RightSideBottom,
}

impl BeamFireLocation {
    pub const ALL: [BeamFireLocation; 5] = [
        BeamFireLocation::LeftSideTop,
        BeamFireLocation::LeftSideBottom,
        BeamFireLocation::CenterBottom,
        BeamFireLocation::RightSideTop,
        BeamFireLocation::RightSideBottom,
    ];

    /// Часть, на которой заряжается луч
    pub fn part(&self, parts: &NouveauParts) -> PartId {
        match self {
            BeamFireLocation::LeftSideTop | BeamFireLocation::LeftSideBottom => parts.left_side_curls,
            BeamFireLocation::CenterBottom => parts.bottom_hex_sphere,
            BeamFireLocation::RightSideTop | BeamFireLocation::RightSideBottom => parts.right_side_curls,
        }
    }

    /// Смещение начала луча относительно части
    pub fn local_offset(&self) -> Vec2 {
        match self {
            BeamFireLocation::LeftSideTop => side_curl_shoot_offset(false, true),
            BeamFireLocation::LeftSideBottom => side_curl_shoot_offset(false, false),
            BeamFireLocation::CenterBottom => BOTTOM_SPHERE_BEAM_OFFSET,
            BeamFireLocation::RightSideTop => side_curl_shoot_offset(true, true),
            BeamFireLocation::RightSideBottom => side_curl_shoot_offset(true, false),
        }
    }

    pub fn half_radius(&self) -> f32 {
        match self {
            BeamFireLocation::CenterBottom => BOTTOM_BEAM_HALF_RADIUS,
            _ => SIDE_BEAM_HALF_RADIUS,
        }
    }

    pub fn origin(&self, boss: &Boss, parts: &NouveauParts) -> Vec2 {
        part_pos(boss, self.part(parts)) + self.local_offset()
    }
}

/// Подготовленный луч: откуда и куда
#[derive(Debug, Clone, Copy, PartialEq)]
struct PreppedBeam {
    location: BeamFireLocation,
    origin: Vec2,
    direction: Vec2,
}

#[derive(Debug, Clone)]
pub struct NouveauAi {
    stage: NouveauStage,
    parts: NouveauParts,
    state: NouveauState,
    motion: Motion,
    weakpoints: Vec<PartId>,

    // MoveToTargetStopAndShoot / BrutalMoveAndShoot
    num_movements: u32,
    waiting_at_target_countdown: f32,
    laser_countdown: f32,
    // ArcSprayFire
    num_arc_sprays: u32,
    arc_spray_countdown: f32,
    // RapidFireSweep
    rapid_fire_countdown: f32,
    rapid_fire_dir: Vec2,
    rapid_fire_sign: f32,
    rapid_fire_total_angle: f32,
    // PrepLaserBeamAttack / LaserBeamAttack
    beam_locations: Vec<BeamFireLocation>,
    beams_to_fire: Vec<PreppedBeam>,
    beam_prep_countdown: f32,
    last_prep_to_fire_countdown: f32,
    beam_fire_countdown: f32,
    wait_for_last_beam_countdown: f32,

    transition_countdown: f32,
    /// Первый тик текущего состояния уже отработал
    state_entered: bool,
    finished: bool,
}

impl NouveauAi {
    /// Начать стадию: конвертирует её weakpoint'ы и уходит в движение по целям
    pub fn new(stage: NouveauStage, parts: NouveauParts, boss: &mut Boss, rng: &mut dyn RandomSource) -> Self {
        let weakpoints = match stage {
            NouveauStage::SideSphere => {
                boss.make_weakpoint_or_log(parts.left_sphere, SIDE_SPHERE_LIFE_POINTS, SIDE_SPHERE_LIFE_POINTS);
                boss.make_weakpoint_or_log(parts.right_sphere, SIDE_SPHERE_LIFE_POINTS, SIDE_SPHERE_LIFE_POINTS);
                vec![parts.left_sphere, parts.right_sphere]
            }
            NouveauStage::GlassDome => {
                boss.make_weakpoint_or_log(parts.dome, DOME_LIFE_POINTS, DOME_DAMAGE_ON_HIT);
                vec![parts.dome]
            }
            NouveauStage::TopSphere => {
                boss.make_weakpoint_or_log(parts.top_sphere, TOP_SPHERE_LIFE_POINTS, TOP_SPHERE_DAMAGE_ON_HIT);
                vec![parts.top_sphere]
            }
        };

        let mut ai = Self {
            stage,
            parts,
            state: NouveauState::MoveToTargetStopAndShoot,
            motion: Motion::new(stage.acceleration()),
            weakpoints,
            num_movements: 0,
            waiting_at_target_countdown: 0.0,
            laser_countdown: 0.0,
            num_arc_sprays: 0,
            arc_spray_countdown: 0.0,
            rapid_fire_countdown: 0.0,
            rapid_fire_dir: Vec2::NEG_Y,
            rapid_fire_sign: 1.0,
            rapid_fire_total_angle: 0.0,
            beam_locations: Vec::new(),
            beams_to_fire: Vec::new(),
            beam_prep_countdown: 0.0,
            last_prep_to_fire_countdown: 0.0,
            beam_fire_countdown: 0.0,
            wait_for_last_beam_countdown: 0.0,
            transition_countdown: 0.0,
            state_entered: false,
            finished: false,
        };
        ai.set_state(NouveauState::MoveToTargetStopAndShoot, boss, rng);
        ai
    }

    pub fn stage(&self) -> NouveauStage {
        self.stage
    }

    pub fn state(&self) -> NouveauState {
        self.state
    }

    pub fn parts(&self) -> &NouveauParts {
        &self.parts
    }

    pub fn num_movements(&self) -> u32 {
        self.num_movements
    }

    /// Средняя жизнь weakpoint'ов стадии
    fn stage_life_percent(&self, boss: &Boss) -> f32 {
        if self.weakpoints.is_empty() {
            return 0.0;
        }
        let sum: f32 = self.weakpoints.iter().map(|w| boss.parts().life_percentage(*w)).sum();
        sum / self.weakpoints.len() as f32
    }

    // Переходы -------------------------------------------------------------

    /// Войти в под-состояние (атаки стадии и переходы между ними)
    pub fn set_state(&mut self, new_state: NouveauState, boss: &mut Boss, rng: &mut dyn RandomSource) {
        match new_state {
            NouveauState::MoveToTargetStopAndShoot => {
                self.motion.stop();
                let pos = boss.position();
                self.motion.set_target(pos, pos);
                self.num_movements = self.stage.generate_num_movements(rng);
                self.waiting_at_target_countdown = 0.0;
                self.laser_countdown = 0.0;
            }
            NouveauState::ArcSprayFire => {
                self.motion.stop();
                self.num_arc_sprays = 2 + rng.random_unsigned() % 2;
                self.arc_spray_countdown = 0.0;
            }
            NouveauState::RapidFireSweep => {
                self.motion.stop();
                self.rapid_fire_countdown = 0.0;
                self.rapid_fire_total_angle = 0.0;
                self.rapid_fire_sign = if rng.random_unsigned() % 2 == 0 { 1.0 } else { -1.0 };
            }
            NouveauState::MoveToLaserTargetableLocation => {
                let target = laser_targetable_position(boss);
                self.motion.set_target(boss.position(), target);
            }
            NouveauState::PrepLaserBeamAttack => {
                self.motion.stop();
                let num_beams = self.stage.generate_num_beams(self.stage_life_percent(boss), rng);
                let mut pool = BeamFireLocation::ALL.to_vec();
                self.beam_locations.clear();
                for _ in 0..num_beams {
                    let idx = rng.random_unsigned() as usize % pool.len();
                    self.beam_locations.push(pool.remove(idx));
                }
                self.beams_to_fire.clear();
                self.beam_prep_countdown = 0.0;
                self.last_prep_to_fire_countdown = self.stage.time_between_last_prep_and_fire();
            }
            NouveauState::LaserBeamAttack => {
                self.motion.stop();
                self.beam_fire_countdown = 0.0;
                self.wait_for_last_beam_countdown = BEAM_LIFETIME_IN_SECS;
            }
            NouveauState::BrutalMoveAndShoot => {
                let start = boss.position();
                self.motion.set_target(start, choose_target_position(boss, start, rng));
                self.num_movements = 3 + rng.random_unsigned() % 3;
                self.laser_countdown = 0.0;
            }
            NouveauState::LostLeftArm | NouveauState::LostRightArm => {
                self.motion.stop();
                self.transition_countdown = INVULNERABLE_TIME_IN_SECS;
                let alive = boss.alive_root();
                let parts = boss.parts_mut();
                parts.animate_colour(alive, anims::hurt_and_invulnerable_colour_anim());
                parts.animate_translation(alive, anims::shake_anim(0.0, INVULNERABLE_TIME_IN_SECS, 0.075, 0.3, 0.1));
            }
            NouveauState::BothArmsLost | NouveauState::TopLost => {
                self.motion.stop();
                self.transition_countdown = ANGRY_TIME_IN_SECS;
            }
            NouveauState::HurtTop => {
                self.motion.stop();
                self.transition_countdown = INVULNERABLE_TIME_IN_SECS;
                let alive = boss.alive_root();
                boss.parts_mut().animate_translation(alive, anims::hurt_move_anim(Vec2::NEG_Y, 0.5));
            }
            NouveauState::FinalDeathThroes => {
                self.motion.stop();
                self.transition_countdown = anims::TOTAL_DEATH_ANIM_TIME;
            }
        }
        if self.state != new_state {
            log(&format!(
                "Nouveau {}: {:?} -> {:?}",
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

    /// Случайная атака стадии, не повторяющая текущее состояние
    fn go_to_next_random_attack(&mut self, boss: &mut Boss, rng: &mut dyn RandomSource) {
        let attacks = self.stage.attack_states();
        let mut idx = rng.random_unsigned() as usize % attacks.len();
        if attacks[idx] == self.state {
            idx = (idx + 1) % attacks.len();
        }
        self.set_state(attacks[idx], boss, rng);
    }

    // Атаки ----------------------------------------------------------------

    /// Одиночный лазер: из нижней сферы (±5°) или из точки завитка (±15°)
    pub fn shoot_random_laser(&self, boss: &Boss, env: &mut BossEnv) {
        let paddle_pos = env.ctx.paddle().center;
        let (origin, jitter) = if env.rng.random_unsigned() % 2 == 0 {
            (self.parts.bottom_sphere_shoot_point(boss.parts()), 5.0)
        } else {
            let right = env.rng.random_unsigned() % 2 == 1;
            let top = env.rng.random_unsigned() % 2 == 0;
            (self.parts.side_curl_shoot_point(boss.parts(), right, top), 15.0)
        };
        let dir = rotate_degrees(aim(origin, paddle_pos), env.rng.random_neg_one_to_one() * jitter);
        env.ctx.spawn_projectile(
            ProjectileKind::BossLaserBullet,
            origin,
            dir,
            ProjectileKind::BossLaserBullet.default_speed(),
        );
    }

    /// Веер из ARC_SPRAY_NUM_LASERS лазеров из нижней сферы, центр - на paddle
    pub fn execute_laser_arc_spray(&self, boss: &Boss, env: &mut BossEnv) {
        let origin = self.parts.bottom_sphere_shoot_point(boss.parts());
        let base = aim(origin, env.ctx.paddle().center);
        let half = (ARC_SPRAY_NUM_LASERS / 2) as f32;
        let speed = ProjectileKind::BossLaserBullet.default_speed();
        for i in 0..ARC_SPRAY_NUM_LASERS {
            let dir = rotate_degrees(base, (i as f32 - half) * ANGLE_BETWEEN_ARC_LASERS_IN_DEGS);
            env.ctx.spawn_projectile(ProjectileKind::BossLaserBullet, origin, dir, speed);
        }
    }

    // Под-состояния ---------------------------------------------------------

    fn execute_move_to_target_stop_and_shoot(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        let arrived = self.motion.move_to_target_position(boss.position(), self.stage.max_speed());
        if !arrived {
            return;
        }

        self.waiting_at_target_countdown -= dt;
        if self.waiting_at_target_countdown <= 0.0 {
            self.num_movements = self.num_movements.saturating_sub(1);
            if self.num_movements == 0 {
                self.go_to_next_random_attack(boss, env.rng);
            } else {
                let start = boss.position();
                let target = choose_target_position(boss, start, env.rng);
                self.motion.set_target(start, target);
                self.waiting_at_target_countdown = self.stage.generate_wait_at_target_time(env.rng);
                self.laser_countdown = 0.0;
            }
        } else if self.laser_countdown <= 0.0 {
            self.shoot_random_laser(boss, env);
            self.laser_countdown = self.stage.generate_time_between_lasers_at_target(env.rng);
        } else {
            self.laser_countdown -= dt;
        }
    }

    fn execute_arc_spray_fire(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        self.arc_spray_countdown -= dt;
        if self.arc_spray_countdown > 0.0 {
            return;
        }
        self.execute_laser_arc_spray(boss, env);
        self.num_arc_sprays = self.num_arc_sprays.saturating_sub(1);
        if self.num_arc_sprays == 0 {
            self.go_to_next_random_attack(boss, env.rng);
        } else {
            self.arc_spray_countdown = self.stage.generate_time_between_arc_sprays(env.rng);
        }
    }

    /// Очередь лазеров, ствол проходит RAPID_FIRE_SWEEP_ANGLE_IN_DEGS через paddle
    fn execute_rapid_fire_sweep(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        let origin = self.parts.bottom_sphere_shoot_point(boss.parts());
        if self.first_tick_of_state() {
            let to_paddle = aim(origin, env.ctx.paddle().center);
            self.rapid_fire_dir = rotate_degrees(to_paddle, -self.rapid_fire_sign * RAPID_FIRE_SWEEP_ANGLE_IN_DEGS / 2.0);
        }

        self.rapid_fire_countdown -= dt;
        if self.rapid_fire_countdown <= 0.0 {
            env.ctx.spawn_projectile(
                ProjectileKind::BossLaserBullet,
                origin,
                self.rapid_fire_dir,
                ProjectileKind::BossLaserBullet.default_speed(),
            );
            self.rapid_fire_countdown = self.stage.generate_time_between_rapid_fire_lasers(env.rng);
        }

        let step = self.stage.rapid_fire_degs_per_sec() * dt;
        self.rapid_fire_dir = rotate_degrees(self.rapid_fire_dir, self.rapid_fire_sign * step);
        self.rapid_fire_total_angle += step;
        if self.rapid_fire_total_angle >= RAPID_FIRE_SWEEP_ANGLE_IN_DEGS {
            self.go_to_next_random_attack(boss, env.rng);
        }
    }

    fn execute_move_to_laser_targetable_location(&mut self, boss: &mut Boss, env: &mut BossEnv) {
        if self.motion.move_to_target_position(boss.position(), self.stage.max_speed()) {
            self.set_state(NouveauState::PrepLaserBeamAttack, boss, env.rng);
        }
    }

    fn execute_prep_laser_beam_attack(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        self.beam_prep_countdown -= dt;
        if self.beam_prep_countdown <= 0.0 && !self.beam_locations.is_empty() {
            let location = self.beam_locations.remove(0);
            self.prep_beam(location, boss, env);
            self.beam_prep_countdown = self.stage.time_between_beam_preps();
            return;
        }
        if self.beam_locations.is_empty() {
            self.last_prep_to_fire_countdown -= dt;
            if self.last_prep_to_fire_countdown <= 0.0 {
                self.set_state(NouveauState::LaserBeamAttack, boss, env.rng);
            }
        }
    }

    /// Зарядка одного луча: направление фиксируется сейчас, выстрел - позже
    fn prep_beam(&mut self, location: BeamFireLocation, boss: &Boss, env: &mut BossEnv) {
        let origin = location.origin(boss, &self.parts);
        let direction = aim(origin, env.ctx.paddle().center);
        let until_fire = self.beam_locations.len() as f32 * self.stage.time_between_beam_preps()
            + self.stage.time_between_last_prep_and_fire()
            + self.beams_to_fire.len() as f32 * self.stage.time_between_beam_firings();
        env.sink.announce_boss_effect(BossEffect::PowerCharge {
            part: location.part(&self.parts),
            time: until_fire,
            colour: Rgba::RED,
            size: 2.0 * location.half_radius(),
            offset: location.local_offset().extend(0.0),
        });
        self.beams_to_fire.push(PreppedBeam {
            location,
            origin,
            direction,
        });
    }

    fn execute_laser_beam_attack(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        if self.beams_to_fire.is_empty() {
            self.wait_for_last_beam_countdown -= dt;
            if self.wait_for_last_beam_countdown <= 0.0 {
                self.go_to_next_random_attack(boss, env.rng);
            }
            return;
        }

        self.beam_fire_countdown -= dt;
        if self.beam_fire_countdown <= 0.0 {
            let beam = self.beams_to_fire.remove(0);
            env.ctx
                .fire_beam(beam.origin, beam.direction, beam.location.half_radius(), BEAM_LIFETIME_IN_SECS);
            self.beam_fire_countdown = self.stage.time_between_beam_firings();
        }
    }

    /// Быстрые перелёты между целями без остановок, стрельба не прекращается
    fn execute_brutal_move_and_shoot(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        self.laser_countdown -= dt;
        if self.laser_countdown <= 0.0 {
            self.shoot_random_laser(boss, env);
            self.laser_countdown = self.stage.generate_time_between_lasers_at_target(env.rng);
        }

        let speed = BRUTAL_SPEED_MULTIPLIER * self.stage.max_speed();
        if !self.motion.move_to_target_position(boss.position(), speed) {
            return;
        }
        self.num_movements = self.num_movements.saturating_sub(1);
        if self.num_movements == 0 {
            self.go_to_next_random_attack(boss, env.rng);
        } else {
            let start = boss.position();
            let target = choose_target_position(boss, start, env.rng);
            self.motion.set_target(start, target);
        }
    }

    fn execute_lost_arm(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        self.transition_countdown -= dt;
        if self.transition_countdown > 0.0 {
            return;
        }
        stop_angry_anims(boss);
        let both_lost =
            !boss.is_part_alive(self.parts.left_sphere_holder) && !boss.is_part_alive(self.parts.right_sphere_holder);
        if both_lost {
            self.set_state(NouveauState::BothArmsLost, boss, env.rng);
        } else {
            self.go_to_next_random_attack(boss, env.rng);
        }
    }

    /// Злость перед сменой стадии (BothArmsLost, TopLost)
    fn execute_angry_transition(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        if self.first_tick_of_state() {
            let focus = if self.state == NouveauState::TopLost {
                self.parts.top_sphere
            } else {
                self.parts.body
            };
            start_angry_anims(boss, focus, 0.3, env.rng, env.sink);
        }
        self.transition_countdown -= dt;
        if self.transition_countdown <= 0.0 && !boss.has_pending_ai_state() {
            stop_angry_anims(boss);
            let next_stage = match self.stage {
                NouveauStage::SideSphere => NouveauStage::GlassDome,
                NouveauStage::GlassDome | NouveauStage::TopSphere => NouveauStage::TopSphere,
            };
            let next = NouveauAi::new(next_stage, self.parts.clone(), boss, env.rng);
            boss.set_next_ai_state(BossAi::Nouveau(next));
        }
    }

    fn execute_hurt_top(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        self.transition_countdown -= dt;
        if self.transition_countdown <= 0.0 {
            self.go_to_next_random_attack(boss, env.rng);
        }
    }

    fn start_dying(&mut self, boss: &mut Boss, rng: &mut dyn RandomSource) {
        self.set_state(NouveauState::FinalDeathThroes, boss, rng);
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
                part: self.parts.body,
                time: anims::TOTAL_DEATH_ANIM_TIME,
                colour: Rgba::WHITE,
                size: 8.0,
                offset: Vec3::ZERO,
            });
        }
        self.transition_countdown -= dt;
        if self.transition_countdown <= 0.0 && !self.finished {
            self.finished = true;
            let alive_root = boss.alive_root();
            boss.parts_mut().clear_transform_anims(alive_root);
            log(&format!("Nouveau {}: final death complete", self.stage.name()));
        }
    }

    // Урон -----------------------------------------------------------------

    fn can_take_damage(&self) -> bool {
        !matches!(
            self.state,
            NouveauState::LostLeftArm
                | NouveauState::LostRightArm
                | NouveauState::BothArmsLost
                | NouveauState::HurtTop
                | NouveauState::TopLost
                | NouveauState::FinalDeathThroes
        )
    }

    /// Сторона открытой (без оборки) живой сферы; `Some(true)` - правая
    fn exposed_sphere_side(&self, boss: &Boss, part: PartId) -> Option<bool> {
        [(self.parts.left_sphere, self.parts.left_frill, false), (self.parts.right_sphere, self.parts.right_frill, true)]
            .into_iter()
            .find(|(sphere, frill, _)| part == *sphere && boss.is_part_alive(*sphere) && !boss.is_part_alive(*frill))
            .map(|(_, _, right)| right)
    }

    /// Мина срывает оборку: часть уходит в dead и быстро растворяется
    fn blow_off_frill(&mut self, frill: PartId, center: Vec2, boss: &mut Boss, env: &mut BossEnv) {
        boss.kill_part_or_log(frill);
        boss.parts_mut()
            .animate_colour(frill, anims::hurt_flash_and_fade_anim(SIDE_FRILL_FADEOUT_TIME));
        env.sink.announce_general_effect(GeneralEffect::Explosion {
            position: center,
            size: 2.0,
        });
        env.sink.announce_boss_effect(BossEffect::FullscreenFlash {
            time: 0.2,
            intensity: 0.0,
        });
        log(&format!("Nouveau {}: frill {:?} blown off", self.stage.name(), frill));
    }

    /// Открытая сфера уничтожена: рука целиком отваливается
    fn kill_arm(&mut self, right: bool, boss: &mut Boss, env: &mut BossEnv) {
        let (holder, sphere, curl) = if right {
            (self.parts.right_sphere_holder, self.parts.right_sphere, self.parts.right_holder_curl)
        } else {
            (self.parts.left_sphere_holder, self.parts.left_sphere, self.parts.left_holder_curl)
        };
        boss.diminish_weakpoint(sphere, SIDE_SPHERE_LIFE_POINTS, env.sink);
        env.sink.announce_general_effect(GeneralEffect::Explosion {
            position: part_pos(boss, sphere),
            size: 3.0,
        });

        let sign = if right { 1.0 } else { -1.0 };
        let x_dist = sign * 3.0 * ARM_SPHERE_HOLDER_CURL_WIDTH;
        let y_dist = -part_pos(boss, curl).y - 2.0 * ARM_SPHERE_HOLDER_CURL_WIDTH;
        drop_off_part(boss, holder, ARM_FADE_TIME, x_dist, y_dist, -sign * 180.0);

        let next = if right {
            NouveauState::LostRightArm
        } else {
            NouveauState::LostLeftArm
        };
        self.set_state(next, boss, env.rng);
    }

    /// Исход удара по куполу / верхней сфере
    fn react_to_top_damage(&mut self, outcome: DiminishOutcome, boss: &mut Boss, env: &mut BossEnv) {
        match outcome {
            DiminishOutcome::Ignored => {}
            DiminishOutcome::Hurt => self.set_state(NouveauState::HurtTop, boss, env.rng),
            DiminishOutcome::Destroyed if self.stage == NouveauStage::GlassDome => {
                env.sink.announce_general_effect(GeneralEffect::Explosion {
                    position: part_pos(boss, self.parts.dome),
                    size: 4.0,
                });
                let dir = env.rng.random_negative_or_positive();
                let level_height = env.ctx.level_height();
                drop_off_part(boss, self.parts.top_enclosure, TOP_FALL_TIME, dir * 2.0, -level_height, dir * -20.0);
                self.set_state(NouveauState::TopLost, boss, env.rng);
            }
            DiminishOutcome::Destroyed => self.start_dying(boss, env.rng),
        }
    }

    /// Weakpoint, по которому в этой стадии бьют напрямую (купол / верхняя сфера)
    fn top_weakpoint(&self) -> Option<PartId> {
        match self.stage {
            NouveauStage::SideSphere => None,
            NouveauStage::GlassDome => Some(self.parts.dome),
            NouveauStage::TopSphere => Some(self.parts.top_sphere),
        }
    }

    fn top_damage_on_hit(&self) -> f32 {
        match self.stage {
            NouveauStage::GlassDome => DOME_DAMAGE_ON_HIT,
            _ => TOP_SPHERE_DAMAGE_ON_HIT,
        }
    }

    fn is_open_weakpoint(boss: &Boss, part: PartId) -> bool {
        boss.is_part_alive(part) && boss.parts().weakpoint(part).map(|s| !s.is_invulnerable()).unwrap_or(false)
    }
}

impl BossAiStage for NouveauAi {
    fn update(&mut self, dt: f32, boss: &mut Boss, env: &mut BossEnv) {
        match self.state {
            NouveauState::MoveToTargetStopAndShoot => self.execute_move_to_target_stop_and_shoot(dt, boss, env),
            NouveauState::ArcSprayFire => self.execute_arc_spray_fire(dt, boss, env),
            NouveauState::RapidFireSweep => self.execute_rapid_fire_sweep(dt, boss, env),
            NouveauState::MoveToLaserTargetableLocation => self.execute_move_to_laser_targetable_location(boss, env),
            NouveauState::PrepLaserBeamAttack => self.execute_prep_laser_beam_attack(dt, boss, env),
            NouveauState::LaserBeamAttack => self.execute_laser_beam_attack(dt, boss, env),
            NouveauState::BrutalMoveAndShoot => self.execute_brutal_move_and_shoot(dt, boss, env),
            NouveauState::LostLeftArm | NouveauState::LostRightArm => self.execute_lost_arm(dt, boss, env),
            NouveauState::BothArmsLost | NouveauState::TopLost => self.execute_angry_transition(dt, boss, env),
            NouveauState::HurtTop => self.execute_hurt_top(dt, boss, env),
            NouveauState::FinalDeathThroes => self.execute_final_death_throes(dt, boss, env),
        }

        self.motion.update_movement(dt, boss);
        keep_inside_level(boss, env.ctx.level_width(), env.ctx.level_height());
    }

    fn on_ball_collision(&mut self, boss: &mut Boss, part: PartId, env: &mut BossEnv) {
        if !self.can_take_damage() {
            return;
        }
        match self.stage {
            NouveauStage::SideSphere => {
                if let Some(right) = self.exposed_sphere_side(boss, part) {
                    self.kill_arm(right, boss, env);
                }
            }
            // Мяч отскакивает от стекла
            NouveauStage::GlassDome => {}
            NouveauStage::TopSphere => {
                if part == self.parts.top_sphere {
                    let outcome = boss.ball_hit_weakpoint(part, env.sink);
                    self.react_to_top_damage(outcome, boss, env);
                }
            }
        }
    }

    /// Прямой урон в этом бою наносит только лазер paddle
    fn on_projectile_collision(&mut self, boss: &mut Boss, kind: ProjectileKind, part: PartId, env: &mut BossEnv) {
        if kind != ProjectileKind::PaddleLaserBullet || !self.can_take_damage() {
            return;
        }
        if self.stage == NouveauStage::SideSphere {
            if let Some(right) = self.exposed_sphere_side(boss, part) {
                self.kill_arm(right, boss, env);
            }
            return;
        }
        if self.top_weakpoint() == Some(part) {
            let outcome = boss.diminish_weakpoint(part, self.top_damage_on_hit(), env.sink);
            self.react_to_top_damage(outcome, boss, env);
        }
    }

    fn on_mine_explosion(&mut self, boss: &mut Boss, center: Vec2, radius: f32, env: &mut BossEnv) {
        if !self.can_take_damage() {
            return;
        }
        match self.stage {
            NouveauStage::SideSphere => {
                // Сначала оборки, и только одна часть за взрыв
                for frill in [self.parts.left_frill, self.parts.right_frill] {
                    if mine_hits(boss, frill, center, radius) {
                        self.blow_off_frill(frill, center, boss, env);
                        return;
                    }
                }
                for (sphere, right) in [(self.parts.left_sphere, false), (self.parts.right_sphere, true)] {
                    if mine_hits(boss, sphere, center, radius) && self.exposed_sphere_side(boss, sphere).is_some() {
                        self.kill_arm(right, boss, env);
                        return;
                    }
                }
            }
            NouveauStage::GlassDome => {}
            NouveauStage::TopSphere => {
                if mine_hits(boss, self.parts.top_sphere, center, radius) {
                    let outcome = boss.diminish_weakpoint(self.parts.top_sphere, TOP_SPHERE_DAMAGE_ON_HIT, env.sink);
                    self.react_to_top_damage(outcome, boss, env);
                }
            }
        }
    }

    fn total_life_percent(&self, boss: &Boss) -> f32 {
        self.stage.life_offset() + self.stage_life_percent(boss) / 3.0
    }

    fn is_finished(&self) -> bool {
        self.finished
    }

    fn stage_name(&self) -> &'static str {
        self.stage.name()
    }

    fn state_name(&self) -> &'static str {
        match self.state {
            NouveauState::MoveToTargetStopAndShoot => "MoveToTargetStopAndShootAIState",
            NouveauState::ArcSprayFire => "ArcSprayFireAIState",
            NouveauState::RapidFireSweep => "RapidFireSweepAIState",
            NouveauState::MoveToLaserTargetableLocation => "MoveToLaserTargetableLocationAIState",
            NouveauState::PrepLaserBeamAttack => "PrepLaserBeamAttackAIState",
            NouveauState::LaserBeamAttack => "LaserBeamAttackAIState",
            NouveauState::BrutalMoveAndShoot => "BrutalMoveAndShootAIState",
            NouveauState::LostLeftArm => "LostLeftArmAIState",
            NouveauState::LostRightArm => "LostRightArmAIState",
            NouveauState::BothArmsLost => "BothArmsLostAIState",
            NouveauState::HurtTop => "HurtTopAIState",
            NouveauState::TopLost => "TopLostAIState",
            NouveauState::FinalDeathThroes => "FinalDeathThroesAIState",
        }
    }

    fn vulnerable_parts(&self, boss: &Boss) -> Vec<(PartId, DamageChannel)> {
        if !self.can_take_damage() {
            return Vec::new();
        }
        let laser = DamageChannel::Projectile(ProjectileKind::PaddleLaserBullet);
        match self.stage {
            NouveauStage::SideSphere => [
                (self.parts.left_sphere, self.parts.left_frill),
                (self.parts.right_sphere, self.parts.right_frill),
            ]
            .into_iter()
            .flat_map(|(sphere, frill)| {
                if boss.is_part_alive(frill) {
                    vec![(frill, DamageChannel::MineExplosion)]
                } else if boss.is_part_alive(sphere) {
                    vec![
                        (sphere, DamageChannel::Ball),
                        (sphere, laser),
                        (sphere, DamageChannel::MineExplosion),
                    ]
                } else {
                    Vec::new()
                }
            })
            .collect(),
            NouveauStage::GlassDome if Self::is_open_weakpoint(boss, self.parts.dome) => vec![(self.parts.dome, laser)],
            NouveauStage::TopSphere if Self::is_open_weakpoint(boss, self.parts.top_sphere) => vec![
                (self.parts.top_sphere, DamageChannel::Ball),
                (self.parts.top_sphere, laser),
                (self.parts.top_sphere, DamageChannel::MineExplosion),
            ],
            _ => Vec::new(),
        }
    }
}

fn mine_hits(boss: &Boss, part: PartId, center: Vec2, radius: f32) -> bool {
    boss.is_part_alive(part)
        && boss
            .parts()
            .world_aabb(part)
            .map(|aabb| aabb.intersects_circle(center, radius))
            .unwrap_or(false)
}

fn aim(origin: Vec2, target: Vec2) -> Vec2 {
    let dir = (target - origin).normalize_or_zero();
    if dir == Vec2::ZERO {
        Vec2::NEG_Y
    } else {
        dir
    }
}

/// Следующая цель движения: 8 лучей из `start` (по одному в каждом 45° секторе),
/// выбирается один из двух самых длинных до края рамки, точка - на последней четверти луча
pub fn choose_target_position(boss: &Boss, start: Vec2, rng: &mut dyn RandomSource) -> Vec2 {
    let bounds = movement_aabb(boss);
    let mut rays: Vec<(f32, Vec2)> = (0..NUM_TARGET_RAYS)
        .map(|i| {
            let dir = rotate_degrees(Vec2::Y, 45.0 * i as f32 + 45.0 * rng.random_zero_to_one());
            // Старт вне рамки: такие лучи не выбираем
            let t = bounds.ray_exit_distance(start, dir).unwrap_or(-1.0);
            (t, dir)
        })
        .collect();
    rays.sort_by(|a, b| a.0.total_cmp(&b.0));

    let idx = NUM_TARGET_RAYS_TO_ELIMINATE
        + rng.random_unsigned() as usize % (NUM_TARGET_RAYS - NUM_TARGET_RAYS_TO_ELIMINATE);
    let Some(&(furthest, dir)) = rays.get(idx) else {
        return bounds.center();
    };
    if furthest <= 0.0 {
        return bounds.center();
    }
    let near = 0.75 * furthest;
    start + dir * (near + rng.random_zero_to_one() * (furthest - near))
}

/// Позиция, откуда лазерам paddle удобно бить по верху: центр рамки по X, середина по Y
pub fn laser_targetable_position(boss: &Boss) -> Vec2 {
    let bounds = movement_aabb(boss);
    let reasonable_y = MIN_Y_BOUNDS_WITH_PADDING + (MAX_Y_BOUNDS_WITH_PADDING - MIN_Y_BOUNDS_WITH_PADDING) / 2.0;
    Vec2::new(bounds.center().x, reasonable_y.clamp(bounds.min.y, bounds.max.y))
}
