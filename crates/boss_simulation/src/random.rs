//! Источник случайности для AI боссов.
//!
//! AI никогда не обращается к глобальному RNG: всё идёт через `RandomSource`,
//! поэтому одинаковый seed даёт одинаковый бой, а тесты подменяют значения.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::DeterministicRng;

pub trait RandomSource {
    /// Равномерное целое (аналог RAND_MAX-генератора)
    fn random_unsigned(&mut self) -> u32;
    /// Равномерное в [0, 1]
    fn random_zero_to_one(&mut self) -> f32;
    /// Равномерное в [-1, 1]
    fn random_neg_one_to_one(&mut self) -> f32;
    /// -1.0 или 1.0
    fn random_negative_or_positive(&mut self) -> f32;
}

impl RandomSource for ChaCha8Rng {
    fn random_unsigned(&mut self) -> u32 {
        self.gen::<u32>()
    }

    fn random_zero_to_one(&mut self) -> f32 {
        self.gen_range(0.0..=1.0)
    }

    fn random_neg_one_to_one(&mut self) -> f32 {
        self.gen_range(-1.0..=1.0)
    }

    fn random_negative_or_positive(&mut self) -> f32 {
        if self.gen::<bool>() {
            1.0
        } else {
            -1.0
        }
    }
}

impl RandomSource for DeterministicRng {
    fn random_unsigned(&mut self) -> u32 {
        self.rng.random_unsigned()
    }

    fn random_zero_to_one(&mut self) -> f32 {
        self.rng.random_zero_to_one()
    }

    fn random_neg_one_to_one(&mut self) -> f32 {
        self.rng.random_neg_one_to_one()
    }

    fn random_negative_or_positive(&mut self) -> f32 {
        self.rng.random_negative_or_positive()
    }
}

/// Заранее записанная последовательность значений (тесты, replay).
///
/// Каждый канал крутится по кругу; пустой канал отдаёт 0 / 0.0 / +1.0.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    unsigned: Vec<u32>,
    unit: Vec<f32>,
    signs: Vec<f32>,
    unsigned_idx: usize,
    unit_idx: usize,
    sign_idx: usize,
}

impl ScriptedRandom {
    pub fn new() -> Self {
        Self::default()
    }

    /// Все вызовы отдают одно и то же
    pub fn constant(unsigned: u32, unit: f32) -> Self {
        Self::new().with_unsigned(vec![unsigned]).with_unit(vec![unit])
    }

    pub fn with_unsigned(mut self, values: Vec<u32>) -> Self {
        self.unsigned = values;
        self.unsigned_idx = 0;
        self
    }

    /// Значения для `random_zero_to_one` (из них же строится [-1, 1])
    pub fn with_unit(mut self, values: Vec<f32>) -> Self {
        self.unit = values;
        self.unit_idx = 0;
        self
    }

    pub fn with_signs(mut self, values: Vec<f32>) -> Self {
        self.signs = values;
        self.sign_idx = 0;
        self
    }

    fn next_from<T: Copy>(values: &[T], idx: &mut usize, fallback: T) -> T {
        if values.is_empty() {
            return fallback;
        }
        let value = values[*idx % values.len()];
        *idx += 1;
        value
    }
}

impl RandomSource for ScriptedRandom {
    fn random_unsigned(&mut self) -> u32 {
        Self::next_from(&self.unsigned, &mut self.unsigned_idx, 0)
    }

    fn random_zero_to_one(&mut self) -> f32 {
        Self::next_from(&self.unit, &mut self.unit_idx, 0.0).clamp(0.0, 1.0)
    }

    fn random_neg_one_to_one(&mut self) -> f32 {
        2.0 * self.random_zero_to_one() - 1.0
    }

    fn random_negative_or_positive(&mut self) -> f32 {
        let sign = Self::next_from(&self.signs, &mut self.sign_idx, 1.0);
        if sign < 0.0 {
            -1.0
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_chacha_ranges() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..500 {
            let u = rng.random_zero_to_one();
            assert!((0.0..=1.0).contains(&u));
            let n = rng.random_neg_one_to_one();
            assert!((-1.0..=1.0).contains(&n));
            let s = rng.random_negative_or_positive();
            assert!(s == 1.0 || s == -1.0);
        }
    }

    #[test]
    fn test_scripted_random_cycles() {
        let mut rng = ScriptedRandom::new()
            .with_unsigned(vec![3, 8])
            .with_unit(vec![0.25])
            .with_signs(vec![-1.0, 1.0]);

        assert_eq!(rng.random_unsigned(), 3);
        assert_eq!(rng.random_unsigned(), 8);
        assert_eq!(rng.random_unsigned(), 3);
        assert_eq!(rng.random_zero_to_one(), 0.25);
        assert_eq!(rng.random_neg_one_to_one(), -0.5);
        assert_eq!(rng.random_negative_or_positive(), -1.0);
        assert_eq!(rng.random_negative_or_positive(), 1.0);
    }

    #[test]
    fn test_scripted_random_empty_fallbacks() {
        let mut rng = ScriptedRandom::new();
        assert_eq!(rng.random_unsigned(), 0);
        assert_eq!(rng.random_zero_to_one(), 0.0);
        assert_eq!(rng.random_negative_or_positive(), 1.0);
    }
}
