//! Weakpoint - часть с пулом HP и окном неуязвимости после попадания.

use serde::{Deserialize, Serialize};

use crate::anim::MultiLerp;
use crate::geometry::Rgba;

/// Длительность неуязвимости после попадания (секунды)
pub const INVULNERABLE_TIME_IN_SECS: f32 = 1.5;

/// Результат попытки нанести урон
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiminishOutcome {
    /// Неуязвим / уже уничтожен / нулевой урон - ничего не изменилось
    Ignored,
    /// HP уменьшились, часть жива и теперь неуязвима
    Hurt,
    /// Этот удар уничтожил часть (возвращается ровно один раз)
    Destroyed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeakpointState {
    pub total_life: f32,
    pub curr_life: f32,
    pub dmg_on_ball_hit: f32,
    pub invulnerable_timer: f32,
    pub total_invulnerable_time: f32,
}

impl WeakpointState {
    pub fn new(life_points: f32, dmg_on_ball_hit: f32) -> Self {
        Self {
            total_life: life_points,
            curr_life: life_points,
            dmg_on_ball_hit,
            invulnerable_timer: 0.0,
            total_invulnerable_time: INVULNERABLE_TIME_IN_SECS,
        }
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable_timer > 0.0
    }

    /// max(curr, 0) / total
    pub fn life_percentage(&self) -> f32 {
        if self.total_life <= 0.0 {
            return 0.0;
        }
        self.curr_life.max(0.0) / self.total_life
    }

    /// Отсчёт неуязвимости (не уходит ниже нуля)
    pub fn tick(&mut self, dt: f32) {
        self.invulnerable_timer = (self.invulnerable_timer - dt).max(0.0);
    }

    /// Урон по weakpoint; `already_destroyed` - флаг destroyed узла-владельца.
    /// Любой источник (мяч, снаряд, тик луча) запускает окно неуязвимости
    pub fn diminish(&mut self, amount: f32, already_destroyed: bool) -> DiminishOutcome {
        if already_destroyed || self.is_invulnerable() || amount <= 0.0 {
            return DiminishOutcome::Ignored;
        }

        self.curr_life = (self.curr_life - amount).max(0.0);
        if self.curr_life <= 0.0 {
            // Уничтожение терминально - неуязвимость больше не нужна
            self.invulnerable_timer = 0.0;
            DiminishOutcome::Destroyed
        } else {
            self.invulnerable_timer = self.total_invulnerable_time;
            DiminishOutcome::Hurt
        }
    }
}

/// Мигание красный↔белый, пока weakpoint жив
pub fn flashing_colour_anim() -> MultiLerp<Rgba> {
    MultiLerp::new(
        vec![0.0, 0.65, 0.67, 1.32],
        vec![Rgba::RED, Rgba::WHITE, Rgba::WHITE, Rgba::RED],
        Rgba::RED,
    )
    .with_repeat(true)
}
