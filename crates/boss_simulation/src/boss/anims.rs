//! Готовые анимации, общие для всех боссов (ранение, злость, смерть, отпадание частей).

use bevy::prelude::*;

use crate::anim::MultiLerp;
use crate::geometry::Rgba;
use crate::parts::INVULNERABLE_TIME_IN_SECS;
use crate::random::RandomSource;

pub const WAIT_BEFORE_FADE_TO_BLACK_FINAL_DEAD_BODY_PART_TIME: f32 = 1.5;
pub const TOTAL_DEATH_ANIM_TIME: f32 = 6.5;
pub const FADE_TO_BLACK_FINAL_DEAD_BODY_PART_TIME: f32 = TOTAL_DEATH_ANIM_TIME / 1.75;

const ANGRY_COLOUR_FLASH_TIME: f32 = 0.2;
const ANGRY_NUM_SHAKES: usize = 15;
const ANGRY_SHAKE_INC_TIME: f32 = 0.03;

/// Красно-белое мигание на всё окно неуязвимости, в конце - белый
pub fn hurt_and_invulnerable_colour_anim() -> MultiLerp<Rgba> {
    const NUM_FLASHES: usize = 20;
    let time_inc = INVULNERABLE_TIME_IN_SECS / (2 * NUM_FLASHES) as f32;

    let times: Vec<f32> = (0..=2 * NUM_FLASHES).map(|i| i as f32 * time_inc).collect();
    let mut colours = Vec::with_capacity(times.len());
    for _ in 0..NUM_FLASHES {
        colours.push(Rgba::new(1.0, 0.25, 0.25, 1.0));
        colours.push(Rgba::new(1.0, 0.9, 0.9, 0.5));
    }
    colours.push(Rgba::WHITE);

    MultiLerp::new(times, colours, Rgba::WHITE)
}

/// Мигание с затуханием до полной прозрачности (часть, которая умирает)
pub fn hurt_flash_and_fade_anim(total_time: f32) -> MultiLerp<Rgba> {
    const FIRST_FADE_OUT_TIME: f32 = 0.5;
    const FIRST_ALPHA: f32 = 0.5;
    const SECOND_ALPHA: f32 = 0.25;

    let num_flashes = ((25.0 * total_time / 4.0) as usize).max(1);
    let flash_inc = (total_time - FIRST_FADE_OUT_TIME).max(0.0) / (2 * num_flashes + 1) as f32;

    let mut times = vec![0.0, FIRST_FADE_OUT_TIME];
    for _ in 0..=2 * num_flashes {
        let last = times.last().copied().unwrap_or(0.0);
        times.push(last + flash_inc);
    }

    let mut colours = vec![Rgba::WHITE, Rgba::WHITE.with_alpha(FIRST_ALPHA)];
    for _ in 0..num_flashes {
        colours.push(Rgba::new(1.0, 0.0, 0.0, SECOND_ALPHA));
        colours.push(Rgba::new(1.0, 0.8, 0.8, FIRST_ALPHA));
    }
    colours.push(Rgba::new(0.0, 0.0, 0.0, 0.0));

    MultiLerp::new(times, colours, Rgba::WHITE)
}

/// Последняя живая часть: белый → чёрный → прозрачный за TOTAL_DEATH_ANIM_TIME
pub fn final_death_flash_anim() -> MultiLerp<Rgba> {
    MultiLerp::new(
        vec![
            0.0,
            WAIT_BEFORE_FADE_TO_BLACK_FINAL_DEAD_BODY_PART_TIME,
            FADE_TO_BLACK_FINAL_DEAD_BODY_PART_TIME,
            TOTAL_DEATH_ANIM_TIME,
        ],
        vec![
            Rgba::WHITE,
            Rgba::WHITE,
            Rgba::new(0.0, 0.0, 0.0, 1.0),
            Rgba::new(0.0, 0.0, 0.0, 0.0),
        ],
        Rgba::WHITE,
    )
}

pub fn angry_flash_anim() -> MultiLerp<Rgba> {
    let times = (0..5).map(|i| i as f32 * ANGRY_COLOUR_FLASH_TIME).collect();
    let colours = vec![
        Rgba::WHITE,
        Rgba::RED,
        Rgba::rgb(1.0, 1.0, 0.0),
        Rgba::RED,
        Rgba::WHITE,
    ];
    MultiLerp::new(times, colours, Rgba::WHITE).with_repeat(true)
}

/// Случайная тряска ±magnitude, в конце возвращается в 0
pub fn angry_shake_anim(magnitude: f32, rng: &mut dyn RandomSource) -> MultiLerp<Vec3> {
    let times: Vec<f32> = (0..=2 * ANGRY_NUM_SHAKES + 1)
        .map(|i| i as f32 * ANGRY_SHAKE_INC_TIME)
        .collect();

    let mut moves = Vec::with_capacity(times.len());
    moves.push(Vec3::ZERO);
    for _ in 0..ANGRY_NUM_SHAKES {
        let x = rng.random_neg_one_to_one() * magnitude;
        let y = rng.random_neg_one_to_one() * magnitude;
        moves.push(Vec3::new(x, y, 0.0));
        moves.push(Vec3::new(-x, -y, 0.0));
    }
    moves.push(Vec3::ZERO);

    MultiLerp::new(times, moves, Vec3::ZERO)
}

pub fn final_death_shake_anim(magnitude: f32, rng: &mut dyn RandomSource) -> MultiLerp<Vec3> {
    angry_shake_anim(magnitude, rng).with_repeat(true)
}

/// Короткий "отскок" в сторону удара и обратно
pub fn hurt_move_anim(hurt_dir: Vec2, magnitude: f32) -> MultiLerp<Vec3> {
    let dir = hurt_dir.normalize_or_zero().extend(0.0);
    MultiLerp::new(
        vec![0.0, 0.1, 0.35, 0.6],
        vec![Vec3::ZERO, dir * magnitude, -dir * 0.25 * magnitude, Vec3::ZERO],
        Vec3::ZERO,
    )
}

/// Тряска с нарастанием и спадом, используется для стадийных "электрических" эффектов
pub fn shake_anim(start: f32, end: f32, freq: f32, x_mag: f32, y_mag: f32) -> MultiLerp<Vec3> {
    let span = (end - start).max(freq);
    let steps = ((span / freq.max(f32::EPSILON)) as usize).max(2);
    let times = (0..=steps).map(|i| start + i as f32 * span / steps as f32).collect::<Vec<_>>();
    let values = (0..=steps)
        .map(|i| {
            if i == 0 || i == steps {
                Vec3::ZERO
            } else if i % 2 == 1 {
                Vec3::new(x_mag, y_mag, 0.0)
            } else {
                Vec3::new(-x_mag, -y_mag, 0.0)
            }
        })
        .collect();
    MultiLerp::new(times, values, Vec3::ZERO)
}

/// Смещение отпавшей части
pub fn limb_fall_off_translation_anim(total_time: f32, x_dist: f32, y_dist: f32) -> MultiLerp<Vec3> {
    MultiLerp::simple(0.0, total_time, Vec3::ZERO, Vec3::new(x_dist, y_dist, 0.0))
}

/// Поворот отпавшей части вокруг Z (градусы)
pub fn limb_fall_off_z_rotation_anim(total_time: f32, degrees: f32) -> MultiLerp<Vec3> {
    MultiLerp::simple(0.0, total_time, Vec3::ZERO, Vec3::new(0.0, 0.0, degrees))
}

/// Голубое "электрическое" мерцание (ElectrifiedState у Deco)
pub fn electrified_colour_anim(total_time: f32) -> MultiLerp<Rgba> {
    const NUM_FLASHES: usize = 12;
    let inc = total_time / (2 * NUM_FLASHES) as f32;
    let times: Vec<f32> = (0..=2 * NUM_FLASHES).map(|i| i as f32 * inc).collect();
    let mut colours = Vec::with_capacity(times.len());
    for _ in 0..NUM_FLASHES {
        colours.push(Rgba::rgb(0.5, 0.85, 1.0));
        colours.push(Rgba::WHITE);
    }
    colours.push(Rgba::WHITE);
    MultiLerp::new(times, colours, Rgba::WHITE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::ScriptedRandom;

    #[test]
    fn test_hurt_colour_anim_spans_invulnerability() {
        let anim = hurt_and_invulnerable_colour_anim();
        assert!((anim.final_time() - INVULNERABLE_TIME_IN_SECS).abs() < 1e-4);
        assert_eq!(anim.final_value(), Rgba::WHITE);
        assert!(!anim.repeat());
    }

    #[test]
    fn test_angry_shake_returns_to_origin() {
        let mut rng = ScriptedRandom::new().with_unit(vec![0.9, 0.1, 0.6]);
        let mut anim = angry_shake_anim(0.5, &mut rng);
        assert!(anim.tick(10.0), "не-повторяющаяся тряска должна закончиться");
        assert_eq!(anim.value(), Vec3::ZERO);
    }

    #[test]
    fn test_final_death_shake_repeats() {
        let mut rng = ScriptedRandom::constant(0, 0.5);
        let mut anim = final_death_shake_anim(1.0, &mut rng);
        assert!(!anim.tick(100.0));
        assert!(!anim.is_finished());
    }

    #[test]
    fn test_limb_fall_off_reaches_target() {
        let mut trans = limb_fall_off_translation_anim(2.0, -3.0, -10.0);
        let mut rot = limb_fall_off_z_rotation_anim(2.0, 45.0);
        trans.tick(2.5);
        rot.tick(2.5);
        assert_eq!(trans.value(), Vec3::new(-3.0, -10.0, 0.0));
        assert_eq!(rot.value().z, 45.0);
    }

    #[test]
    fn test_fade_anim_ends_transparent() {
        let anim = hurt_flash_and_fade_anim(2.0);
        assert_eq!(anim.final_value().a, 0.0);
        assert!((anim.final_time() - 2.0).abs() < 1e-3);
    }
}
