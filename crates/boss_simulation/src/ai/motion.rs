//! Модель движения босса: желаемая/текущая скорость + ускорение, движение к цели.

use bevy::prelude::*;

use crate::boss::Boss;
use crate::config::PIECE_HEIGHT;
use crate::geometry::{rotate_degrees, Aabb2};
use crate::random::RandomSource;

/// Квадрат расстояния, при котором цель считается достигнутой (сравнивается с `distance_squared`)
pub const DEFAULT_TARGET_ERROR_SQ: f32 = 0.1 * PIECE_HEIGHT;

#[derive(Debug, Clone, PartialEq)]
pub struct Motion {
    pub curr_vel: Vec2,
    pub desired_vel: Vec2,
    pub accel: f32,
    pub start_pos: Vec2,
    pub target_pos: Vec2,
    pub target_error_sq: f32,
}

impl Motion {
    pub fn new(accel: f32) -> Self {
        Self {
            curr_vel: Vec2::ZERO,
            desired_vel: Vec2::ZERO,
            accel,
            start_pos: Vec2::ZERO,
            target_pos: Vec2::ZERO,
            target_error_sq: DEFAULT_TARGET_ERROR_SQ,
        }
    }

    pub fn stop(&mut self) {
        self.curr_vel = Vec2::ZERO;
        self.desired_vel = Vec2::ZERO;
    }

    pub fn is_stopped(&self) -> bool {
        self.curr_vel == Vec2::ZERO && self.desired_vel == Vec2::ZERO
    }

    pub fn set_target(&mut self, start: Vec2, target: Vec2) {
        self.start_pos = start;
        self.target_pos = target;
    }

    /// Сдвинуть босса на curr_vel·dt, затем подтянуть curr_vel к desired_vel
    pub fn update_movement(&mut self, dt: f32, boss: &mut Boss) {
        boss.translate(self.curr_vel * dt);
        self.ease(dt);
    }

    /// Покомпонентно: не больше dt·accel за тик, без перелёта через desired
    pub fn ease(&mut self, dt: f32) {
        let step = dt * self.accel;
        for i in 0..2 {
            let diff = self.desired_vel[i] - self.curr_vel[i];
            if diff.abs() <= step {
                self.curr_vel[i] = self.desired_vel[i];
            } else {
                self.curr_vel[i] += step * diff.signum();
            }
        }
    }

    /// Ведёт к `target_pos`; `true` - прибыли (скорости обнулены).
    ///
    /// Прибытие: квадрат расстояния меньше `target_error_sq` или цель уже позади
    /// (проскочили). Торможение начинается на дистанции v²/2a.
    pub fn move_to_target_position(&mut self, boss_pos: Vec2, max_speed: f32) -> bool {
        let start_to_target = self.target_pos - self.start_pos;
        let curr_to_target = self.target_pos - boss_pos;
        let dist_sq = curr_to_target.length_squared();

        if dist_sq < self.target_error_sq || start_to_target.dot(curr_to_target) <= 0.0 {
            self.stop();
            return true;
        }

        let speed = self.curr_vel.length();
        let stop_dist = if self.accel > 0.0 {
            speed * speed / (2.0 * self.accel)
        } else {
            0.0
        };

        if dist_sq - self.target_error_sq <= stop_dist * stop_dist {
            self.desired_vel = Vec2::ZERO;
        } else {
            self.desired_vel = max_speed * curr_to_target.normalize_or_zero();
        }
        false
    }

    /// Отражение desired_vel у границ; почти нулевая скорость → случайное направление
    pub fn reflect_within(&mut self, pos: Vec2, bounds: &Aabb2, speed: f32, rng: &mut dyn RandomSource) {
        if pos.x <= bounds.min.x && self.desired_vel.x < 0.0 {
            self.desired_vel.x = -self.desired_vel.x;
        } else if pos.x >= bounds.max.x && self.desired_vel.x > 0.0 {
            self.desired_vel.x = -self.desired_vel.x;
        }
        if pos.y <= bounds.min.y && self.desired_vel.y < 0.0 {
            self.desired_vel.y = -self.desired_vel.y;
        } else if pos.y >= bounds.max.y && self.desired_vel.y > 0.0 {
            self.desired_vel.y = -self.desired_vel.y;
        }

        if self.desired_vel.length_squared() < f32::EPSILON {
            let to_center = (bounds.center() - pos).normalize_or_zero();
            let base = if to_center == Vec2::ZERO { Vec2::X } else { to_center };
            let jitter = 45.0 * rng.random_neg_one_to_one();
            self.desired_vel = speed * rotate_degrees(base, jitter);
        } else {
            self.desired_vel = speed * self.desired_vel.normalize_or_zero();
        }
    }
}

/// Вытолкнуть живую часть босса обратно в пределы уровня; `true` если была коррекция
pub fn keep_inside_level(boss: &mut Boss, level_width: f32, level_height: f32) -> bool {
    let Some(aabb) = boss.alive_aabb() else {
        return false;
    };
    let mut correction = Vec2::ZERO;
    if aabb.min.x < 0.0 {
        correction.x = -aabb.min.x;
    } else if aabb.max.x > level_width {
        correction.x = level_width - aabb.max.x;
    }
    if aabb.min.y < 0.0 {
        correction.y = -aabb.min.y;
    } else if aabb.max.y > level_height {
        correction.y = level_height - aabb.max.y;
    }
    if correction == Vec2::ZERO {
        return false;
    }
    boss.translate(correction);
    true
}

/// `n` кандидатов, самых далёких от `from` (по убыванию расстояния)
pub fn furthest_positions(from: Vec2, candidates: &[Vec2], n: usize) -> Vec<Vec2> {
    let mut sorted = candidates.to_vec();
    sorted.sort_by(|a, b| {
        b.distance_squared(from)
            .partial_cmp(&a.distance_squared(from))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    sorted.truncate(n);
    sorted
}
