//! Keyframe-анимации частей босса (цвет, смещение, поворот).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::geometry::{lerp, Rgba};

pub trait Lerp: Copy {
    fn lerp_to(self, other: Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp_to(self, other: Self, t: f32) -> Self {
        lerp(self, other, t)
    }
}

impl Lerp for Vec2 {
    fn lerp_to(self, other: Self, t: f32) -> Self {
        self.lerp(other, t)
    }
}

impl Lerp for Vec3 {
    fn lerp_to(self, other: Self, t: f32) -> Self {
        self.lerp(other, t)
    }
}

impl Lerp for Rgba {
    fn lerp_to(self, other: Self, t: f32) -> Self {
        Rgba::new(
            lerp(self.r, other.r, t),
            lerp(self.g, other.g, t),
            lerp(self.b, other.b, t),
            lerp(self.a, other.a, t),
        )
    }
}

/// Кусочно-линейная анимация по ключевым кадрам.
///
/// Не-повторяющаяся анимация после окончания держит последнее значение.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiLerp<T> {
    times: Vec<f32>,
    values: Vec<T>,
    curr_time: f32,
    repeat: bool,
    value: T,
}

impl<T: Lerp> MultiLerp<T> {
    /// `times` по возрастанию, той же длины что и `values` (лишнее отбрасывается)
    pub fn new(mut times: Vec<f32>, mut values: Vec<T>, initial: T) -> Self {
        let len = times.len().min(values.len());
        times.truncate(len);
        values.truncate(len);
        debug_assert!(times.windows(2).all(|w| w[0] <= w[1]));

        let value = values.first().copied().unwrap_or(initial);
        let curr_time = times.first().copied().unwrap_or(0.0);
        Self {
            times,
            values,
            curr_time,
            repeat: false,
            value,
        }
    }

    /// Два ключа: `v0` в `t0` → `v1` в `t1`
    pub fn simple(t0: f32, t1: f32, v0: T, v1: T) -> Self {
        Self::new(vec![t0, t1], vec![v0, v1], v0)
    }

    /// Анимация без ключей - всегда `value`, сразу завершена
    pub fn constant(value: T) -> Self {
        Self::new(vec![0.0], vec![value], value)
    }

    pub fn with_repeat(mut self, repeat: bool) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn repeat(&self) -> bool {
        self.repeat
    }

    pub fn value(&self) -> T {
        self.value
    }

    pub fn curr_time(&self) -> f32 {
        self.curr_time
    }

    pub fn final_time(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    pub fn final_value(&self) -> T {
        self.values.last().copied().unwrap_or(self.value)
    }

    pub fn is_at_start(&self) -> bool {
        self.curr_time <= self.times.first().copied().unwrap_or(0.0)
    }

    pub fn is_finished(&self) -> bool {
        !self.repeat && self.curr_time >= self.final_time()
    }

    pub fn reset_to_start(&mut self) {
        self.curr_time = self.times.first().copied().unwrap_or(0.0);
        if let Some(first) = self.values.first() {
            self.value = *first;
        }
    }

    /// Продвинуть анимацию; `true` - анимация закончилась (для repeat никогда)
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.times.len() < 2 {
            if let Some(last) = self.values.last() {
                self.value = *last;
            }
            return !self.repeat;
        }

        let start = self.times[0];
        let end = self.final_time();
        self.curr_time += dt;

        if self.curr_time >= end {
            if self.repeat && end > start {
                self.curr_time = start + (self.curr_time - start) % (end - start);
            } else {
                self.curr_time = end;
                self.value = self.final_value();
                return !self.repeat;
            }
        }

        // Находим сегмент [times[i], times[i+1]) с текущим временем
        let idx = self
            .times
            .windows(2)
            .position(|w| self.curr_time >= w[0] && self.curr_time < w[1])
            .unwrap_or(0);

        let (t0, t1) = (self.times[idx], self.times[idx + 1]);
        let span = t1 - t0;
        let t = if span > f32::EPSILON {
            (self.curr_time - t0) / span
        } else {
            1.0
        };
        self.value = self.values[idx].lerp_to(self.values[idx + 1], t);
        false
    }
}
