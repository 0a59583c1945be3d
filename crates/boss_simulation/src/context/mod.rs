//! Узкий интерфейс к остальной игре (paddle, мяч, уровень, спавн).
//!
//! AI босса не знает о реализации уровня: всё чтение/запись идёт через
//! `BossContext`. `HeadlessGameModel` - in-crate реализация для тестов,
//! ECS-плагина и headless-бинарника.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{PIECE_HEIGHT, PIECE_WIDTH};
use crate::geometry::Aabb2;

pub mod headless;

pub use headless::{HeadlessGameModel, SpawnedBeam, SpawnedPortal, SpawnedProjectile};

/// Радиус взрыва мины игрока (paddle mine / mine turret)
pub const MINE_EXPLOSION_RADIUS: f32 = 1.25 * PIECE_WIDTH;

/// Типы снарядов, которые видит босс
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectileKind {
    // Оружие игрока / уровня
    PaddleLaserBullet,
    BallLaserBullet,
    LaserTurretBullet,
    CollateralBlock,
    RocketTurretBullet,
    PaddleRocket,
    PaddleRemoteControlRocket,
    FireGlob,
    PaddleFlameBlast,
    PaddleIceBlast,
    PaddleMineBullet,
    MineTurretBullet,
    // Снаряды босса
    BossLaserBullet,
    BossRocketBullet,
    BossOrbBullet,
    BossLightningBolt,
}

impl ProjectileKind {
    /// Урон по weakpoint; `None` - снаряд боссу не вредит
    pub fn weakpoint_damage(&self) -> Option<f32> {
        match self {
            ProjectileKind::PaddleLaserBullet
            | ProjectileKind::BallLaserBullet
            | ProjectileKind::LaserTurretBullet => Some(10.0),
            ProjectileKind::CollateralBlock => Some(30.0),
            ProjectileKind::RocketTurretBullet => Some(60.0),
            ProjectileKind::PaddleRocket | ProjectileKind::PaddleRemoteControlRocket => Some(100.0),
            ProjectileKind::FireGlob => Some(60.0),
            ProjectileKind::PaddleFlameBlast | ProjectileKind::PaddleIceBlast => Some(60.0),
            // Мины наносят урон только взрывом
            ProjectileKind::PaddleMineBullet | ProjectileKind::MineTurretBullet => None,
            ProjectileKind::BossLaserBullet
            | ProjectileKind::BossRocketBullet
            | ProjectileKind::BossOrbBullet
            | ProjectileKind::BossLightningBolt => None,
        }
    }

    pub fn is_rocket(&self) -> bool {
        matches!(
            self,
            ProjectileKind::RocketTurretBullet
                | ProjectileKind::PaddleRocket
                | ProjectileKind::PaddleRemoteControlRocket
        )
    }

    pub fn is_boss_projectile(&self) -> bool {
        matches!(
            self,
            ProjectileKind::BossLaserBullet
                | ProjectileKind::BossRocketBullet
                | ProjectileKind::BossOrbBullet
                | ProjectileKind::BossLightningBolt
        )
    }

    /// Скорость по умолчанию для снарядов босса (level units / sec)
    pub fn default_speed(&self) -> f32 {
        match self {
            ProjectileKind::BossLaserBullet => 24.0,
            ProjectileKind::BossRocketBullet => 14.0,
            ProjectileKind::BossOrbBullet => 9.0,
            ProjectileKind::BossLightningBolt => 18.0,
            _ => 20.0,
        }
    }
}

/// Предметы, которые босс может выбросить
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    ShrinkPaddle,
    BallSpeedUp,
    InvisiPaddle,
    InvisiBall,
    PoisonPaddle,
    UpsideDownPaddle,
    CrazyBall,
    Gravity,
    BlackoutLevel,
    FlameBlasterPaddle,
    IceBlasterPaddle,
    RocketPaddle,
    RemoteControlRocketPaddle,
    LifeUp,
}

/// Срез состояния paddle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaddleInfo {
    pub center: Vec2,
    pub half_width: f32,
    pub half_height: f32,
    pub has_shield: bool,
    pub has_remote_control_rocket: bool,
}

impl PaddleInfo {
    pub fn aabb(&self) -> Aabb2 {
        Aabb2::from_center(self.center, Vec2::new(self.half_width, self.half_height))
    }
}

impl Default for PaddleInfo {
    fn default() -> Self {
        Self {
            center: Vec2::new(0.0, 2.0 * PIECE_HEIGHT),
            half_width: 1.5 * PIECE_WIDTH / 2.0,
            half_height: PIECE_HEIGHT / 4.0,
            has_shield: false,
            has_remote_control_rocket: false,
        }
    }
}

/// Срез состояния первого мяча
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallInfo {
    pub center: Vec2,
    pub radius: f32,
    pub velocity: Vec2,
    /// Мяч прицеплен к paddle (ещё не запущен)
    pub attached_to_paddle: bool,
    /// Мяч удерживает босс: сам не летит, позицию задаёт AI
    pub attached_to_boss: bool,
}

impl BallInfo {
    pub fn aabb(&self) -> Aabb2 {
        Aabb2::from_center(self.center, Vec2::splat(self.radius))
    }
}

pub trait BossContext {
    // Уровень
    fn level_width(&self) -> f32;
    fn level_height(&self) -> f32;

    // Игрок
    fn paddle(&self) -> PaddleInfo;
    fn ball(&self) -> Option<BallInfo>;
    /// Идёт розыгрыш мяча (не смерть мяча / не пауза между жизнями)
    fn is_ball_in_play(&self) -> bool;
    /// Активна камера управляемой ракеты
    fn is_rc_camera_on(&self) -> bool;
    /// Захватить первый мяч; `false` если мяча нет
    fn attach_ball_to_boss(&mut self) -> bool;
    fn set_ball_position(&mut self, center: Vec2);
    /// Отпустить захваченный мяч в `direction`, скорость сохраняется
    fn detach_and_shoot_ball(&mut self, direction: Vec2);

    // Спавн
    fn spawn_projectile(&mut self, kind: ProjectileKind, position: Vec2, direction: Vec2, speed: f32);
    fn spawn_item(&mut self, kind: ItemKind, position: Vec2);
    fn spawn_portal(&mut self, position: Vec2, half_size: Vec2, lifetime: f32);
    fn close_portals(&mut self);
    fn fire_beam(&mut self, origin: Vec2, direction: Vec2, half_radius: f32, lifetime: f32);
    /// Повернуть активный луч; `false` если луча нет
    fn update_beam_direction(&mut self, direction: Vec2) -> bool;

    /// AABB опасностей, куда боссу нельзя телепортироваться (порталы, ракеты, ледяные заряды)
    fn hazard_aabbs(&self) -> Vec<Aabb2>;

    // Мутации уровня
    fn destroy_confines(&mut self);
    fn barrier_piece_centers(&self) -> Vec<Vec2>;
    /// `true` если блок существовал и был разрушен
    fn destroy_barrier_piece(&mut self, index: usize) -> bool;
    fn level_rotation(&self) -> f32;
    fn set_level_rotation(&mut self, degrees: f32);
}
