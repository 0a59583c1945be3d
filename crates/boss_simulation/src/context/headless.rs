//! Headless реализация `BossContext`: хранит минимальное состояние уровня и
//! записывает всё, что босс заспавнил.

use bevy::prelude::*;

use super::{BallInfo, BossContext, ItemKind, PaddleInfo, ProjectileKind};
use crate::config::{PADDLE_DEFAULT_ACCELERATION, PADDLE_DEFAULT_MAX_SPEED, PIECE_HEIGHT, PIECE_WIDTH};
use crate::geometry::Aabb2;

#[derive(Debug, Clone, PartialEq)]
pub struct SpawnedProjectile {
    pub kind: ProjectileKind,
    pub position: Vec2,
    pub direction: Vec2,
    pub speed: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpawnedPortal {
    pub position: Vec2,
    pub half_size: Vec2,
    pub time_left: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpawnedBeam {
    pub origin: Vec2,
    pub direction: Vec2,
    pub half_radius: f32,
    pub time_left: f32,
}

#[derive(Debug, Clone)]
pub struct HeadlessGameModel {
    pub level_width: f32,
    pub level_height: f32,
    pub paddle: PaddleInfo,
    pub paddle_max_speed: f32,
    pub paddle_acceleration: f32,
    paddle_velocity: f32,
    pub ball: Option<BallInfo>,
    pub ball_in_play: bool,
    pub rc_camera_on: bool,
    /// Внешние опасности (ракеты игрока, ледяные заряды)
    pub hazards: Vec<Aabb2>,
    pub level_rotation: f32,
    pub confines_destroyed: bool,
    /// Центры блоков барьера сверху вниз + жив ли блок
    pub barrier: Vec<(Vec2, bool)>,

    pub projectiles: Vec<SpawnedProjectile>,
    pub items: Vec<(ItemKind, Vec2)>,
    pub portals: Vec<SpawnedPortal>,
    pub beams: Vec<SpawnedBeam>,
}

impl HeadlessGameModel {
    pub fn new(level_width: f32, level_height: f32) -> Self {
        let paddle = PaddleInfo {
            center: Vec2::new(level_width / 2.0, 2.0 * PIECE_HEIGHT),
            ..Default::default()
        };
        let ball = BallInfo {
            center: Vec2::new(level_width / 2.0, level_height / 3.0),
            radius: 0.5,
            velocity: Vec2::new(3.0, 12.0),
            attached_to_paddle: false,
            attached_to_boss: false,
        };

        Self {
            level_width,
            level_height,
            paddle,
            paddle_max_speed: PADDLE_DEFAULT_MAX_SPEED,
            paddle_acceleration: PADDLE_DEFAULT_ACCELERATION,
            paddle_velocity: 0.0,
            ball: Some(ball),
            ball_in_play: true,
            rc_camera_on: false,
            hazards: Vec::new(),
            level_rotation: 0.0,
            confines_destroyed: false,
            barrier: Vec::new(),
            projectiles: Vec::new(),
            items: Vec::new(),
            portals: Vec::new(),
            beams: Vec::new(),
        }
    }

    /// Вертикальный барьер из `count` блоков в колонке `x` (начиная от `top_y` вниз)
    pub fn with_barrier(mut self, x: f32, top_y: f32, count: usize) -> Self {
        self.barrier = (0..count)
            .map(|i| (Vec2::new(x, top_y - i as f32 * PIECE_HEIGHT), true))
            .collect();
        self
    }

    /// Простая "физика" вне босса: мяч летает и отражается от стен,
    /// paddle следует за мячом, порталы и лучи истекают.
    pub fn advance(&mut self, dt: f32) {
        if let Some(ball) = self.ball.as_mut() {
            if !ball.attached_to_paddle && !ball.attached_to_boss && self.ball_in_play {
                ball.center += ball.velocity * dt;
                if ball.center.x < ball.radius || ball.center.x > self.level_width - ball.radius {
                    ball.velocity.x = -ball.velocity.x;
                    ball.center.x = ball.center.x.clamp(ball.radius, self.level_width - ball.radius);
                }
                if ball.center.y < self.paddle.center.y || ball.center.y > self.level_height - ball.radius {
                    ball.velocity.y = -ball.velocity.y;
                    ball.center.y = ball
                        .center
                        .y
                        .clamp(self.paddle.center.y, self.level_height - ball.radius);
                }
            }

            // Разгон к мячу с ограничением скорости, без перелёта
            let dx = ball.center.x - self.paddle.center.x;
            let desired = (dx / dt.max(f32::EPSILON)).clamp(-self.paddle_max_speed, self.paddle_max_speed);
            let max_dv = self.paddle_acceleration * dt;
            self.paddle_velocity += (desired - self.paddle_velocity).clamp(-max_dv, max_dv);
            self.paddle.center.x += self.paddle_velocity * dt;
            self.paddle.center.x = self
                .paddle
                .center
                .x
                .clamp(PIECE_WIDTH, self.level_width - PIECE_WIDTH);
        }

        for portal in self.portals.iter_mut() {
            portal.time_left -= dt;
        }
        self.portals.retain(|p| p.time_left > 0.0);
        for beam in self.beams.iter_mut() {
            beam.time_left -= dt;
        }
        self.beams.retain(|b| b.time_left > 0.0);
    }

    pub fn clear_spawned(&mut self) {
        self.projectiles.clear();
        self.items.clear();
    }

    pub fn barrier_alive_count(&self) -> usize {
        self.barrier.iter().filter(|(_, alive)| *alive).count()
    }
}

impl BossContext for HeadlessGameModel {
    fn level_width(&self) -> f32 {
        self.level_width
    }

    fn level_height(&self) -> f32 {
        self.level_height
    }

    fn paddle(&self) -> PaddleInfo {
        self.paddle
    }

    fn ball(&self) -> Option<BallInfo> {
        self.ball
    }

    fn is_ball_in_play(&self) -> bool {
        self.ball_in_play
    }

    fn is_rc_camera_on(&self) -> bool {
        self.rc_camera_on
    }

    fn attach_ball_to_boss(&mut self) -> bool {
        match self.ball.as_mut() {
            Some(ball) => {
                ball.attached_to_boss = true;
                true
            }
            None => false,
        }
    }

    fn set_ball_position(&mut self, center: Vec2) {
        if let Some(ball) = self.ball.as_mut() {
            ball.center = center;
        }
    }

    fn detach_and_shoot_ball(&mut self, direction: Vec2) {
        let Some(ball) = self.ball.as_mut().filter(|b| b.attached_to_boss) else {
            return;
        };
        let dir = direction.normalize_or_zero();
        if dir != Vec2::ZERO {
            ball.velocity = ball.velocity.length() * dir;
        }
        ball.attached_to_boss = false;
    }

    fn spawn_projectile(&mut self, kind: ProjectileKind, position: Vec2, direction: Vec2, speed: f32) {
        self.projectiles.push(SpawnedProjectile {
            kind,
            position,
            direction: direction.normalize_or_zero(),
            speed,
        });
    }

    fn spawn_item(&mut self, kind: ItemKind, position: Vec2) {
        self.items.push((kind, position));
    }

    fn spawn_portal(&mut self, position: Vec2, half_size: Vec2, lifetime: f32) {
        self.portals.push(SpawnedPortal {
            position,
            half_size,
            time_left: lifetime,
        });
    }

    fn close_portals(&mut self) {
        self.portals.clear();
    }

    fn fire_beam(&mut self, origin: Vec2, direction: Vec2, half_radius: f32, lifetime: f32) {
        self.beams.push(SpawnedBeam {
            origin,
            direction: direction.normalize_or_zero(),
            half_radius,
            time_left: lifetime,
        });
    }

    fn update_beam_direction(&mut self, direction: Vec2) -> bool {
        match self.beams.last_mut() {
            Some(beam) => {
                beam.direction = direction.normalize_or_zero();
                true
            }
            None => false,
        }
    }

    fn hazard_aabbs(&self) -> Vec<Aabb2> {
        let mut result = self.hazards.clone();
        result.extend(
            self.portals
                .iter()
                .map(|p| Aabb2::from_center(p.position, p.half_size)),
        );
        result
    }

    fn destroy_confines(&mut self) {
        self.confines_destroyed = true;
    }

    fn barrier_piece_centers(&self) -> Vec<Vec2> {
        self.barrier.iter().map(|(center, _)| *center).collect()
    }

    fn destroy_barrier_piece(&mut self, index: usize) -> bool {
        match self.barrier.get_mut(index) {
            Some((_, alive)) if *alive => {
                *alive = false;
                true
            }
            _ => false,
        }
    }

    fn level_rotation(&self) -> f32 {
        self.level_rotation
    }

    fn set_level_rotation(&mut self, degrees: f32) {
        self.level_rotation = degrees;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projectile_and_item_recording() {
        let mut model = HeadlessGameModel::new(50.0, 30.0);
        model.spawn_projectile(ProjectileKind::BossLaserBullet, Vec2::ZERO, Vec2::new(0.0, -3.0), 24.0);
        model.spawn_item(ItemKind::Gravity, Vec2::new(1.0, 1.0));

        assert_eq!(model.projectiles.len(), 1);
        assert_eq!(model.projectiles[0].direction, Vec2::NEG_Y);
        assert_eq!(model.items, vec![(ItemKind::Gravity, Vec2::new(1.0, 1.0))]);
    }

    #[test]
    fn test_portals_are_hazards_until_expired() {
        let mut model = HeadlessGameModel::new(50.0, 30.0);
        model.spawn_portal(Vec2::new(10.0, 10.0), Vec2::splat(1.0), 0.5);
        assert_eq!(model.hazard_aabbs().len(), 1);

        model.advance(1.0);
        assert!(model.hazard_aabbs().is_empty());
    }

    #[test]
    fn test_paddle_follows_ball_with_limited_acceleration() {
        let mut model = HeadlessGameModel::new(50.0, 30.0);
        model.ball_in_play = false;
        if let Some(ball) = model.ball.as_mut() {
            ball.center.x = 45.0;
        }
        let start = model.paddle.center.x;

        model.advance(0.1);
        let first_step = model.paddle.center.x - start;
        assert!(first_step > 0.0, "paddle двигается к мячу");
        assert!(first_step <= PADDLE_DEFAULT_ACCELERATION * 0.1 * 0.1 + 1e-4, "разгон ограничен");

        for _ in 0..50 {
            model.advance(0.1);
        }
        assert!((model.paddle.center.x - 45.0).abs() < 0.5, "paddle догнал мяч: {}", model.paddle.center.x);
    }

    #[test]
    fn test_held_ball_stays_put_until_shot() {
        let mut model = HeadlessGameModel::new(50.0, 30.0);
        let speed = model.ball.map(|b| b.velocity.length()).unwrap_or(0.0);
        assert!(model.attach_ball_to_boss());
        model.set_ball_position(Vec2::new(20.0, 20.0));

        model.advance(0.5);
        let ball = model.ball.unwrap();
        assert_eq!(ball.center, Vec2::new(20.0, 20.0), "захваченный мяч не летит сам");

        model.detach_and_shoot_ball(Vec2::new(0.0, -2.0));
        let ball = model.ball.unwrap();
        assert!(!ball.attached_to_boss);
        assert!((ball.velocity - Vec2::new(0.0, -speed)).length() < 1e-4, "скорость сохраняется");

        model.advance(0.1);
        assert!(model.ball.unwrap().center.y < 20.0);
    }

    #[test]
    fn test_close_portals_removes_portal_hazards() {
        let mut model = HeadlessGameModel::new(50.0, 30.0);
        model.spawn_portal(Vec2::new(10.0, 10.0), Vec2::splat(1.0), 10.0);
        model.spawn_portal(Vec2::new(30.0, 10.0), Vec2::splat(1.0), 10.0);
        model.close_portals();
        assert!(model.portals.is_empty());
        assert!(model.hazard_aabbs().is_empty());
    }

    #[test]
    fn test_barrier_piece_destroyed_once() {
        let mut model = HeadlessGameModel::new(50.0, 30.0).with_barrier(25.0, 20.0, 3);
        assert_eq!(model.barrier_piece_centers().len(), 3);
        assert!(model.destroy_barrier_piece(1));
        assert!(!model.destroy_barrier_piece(1));
        assert!(!model.destroy_barrier_piece(7));
        assert_eq!(model.barrier_alive_count(), 2);
    }

    #[test]
    fn test_weakpoint_damage_table() {
        assert_eq!(ProjectileKind::PaddleRocket.weakpoint_damage(), Some(100.0));
        assert_eq!(ProjectileKind::PaddleMineBullet.weakpoint_damage(), None);
        assert_eq!(ProjectileKind::BossOrbBullet.weakpoint_damage(), None);
        assert!(ProjectileKind::PaddleRemoteControlRocket.is_rocket());
        assert!(ProjectileKind::BossLightningBolt.is_boss_projectile());
    }
}
