//! Архетипы боссов: раскладка частей + стадии AI.
//!
//! Каждый архетип: `mod.rs` строит дерево частей и ставит первую стадию,
//! `ai.rs` - стадии и их под-состояния.

use bevy::prelude::*;

use crate::boss::anims;
use crate::boss::Boss;
use crate::effects::EffectSink;
use crate::parts::PartId;

pub mod classical;
pub mod deco;
pub mod futurism;
pub mod gothic;
pub mod nouveau;

/// Отвалить живую часть: перенос в dead + падение/поворот/затухание
pub(crate) fn drop_off_part(
    boss: &mut Boss,
    part: PartId,
    fall_time: f32,
    x_dist: f32,
    y_dist: f32,
    rot_degrees: f32,
) {
    boss.kill_part_or_log(part);
    let parts = boss.parts_mut();
    parts.animate_translation(part, anims::limb_fall_off_translation_anim(fall_time, x_dist, y_dist));
    parts.animate_rotation(part, anims::limb_fall_off_z_rotation_anim(fall_time, rot_degrees));
    parts.animate_colour(part, anims::hurt_flash_and_fade_anim(fall_time));
}

/// Общая "злость": мигание всего живого дерева + тряска + announce
pub(crate) fn start_angry_anims(
    boss: &mut Boss,
    focus: PartId,
    shake_magnitude: f32,
    rng: &mut dyn crate::random::RandomSource,
    sink: &mut dyn EffectSink,
) {
    let alive = boss.alive_root();
    let shake = anims::angry_shake_anim(shake_magnitude, rng);
    let parts = boss.parts_mut();
    parts.animate_colour(alive, anims::angry_flash_anim());
    parts.animate_translation(alive, shake);
    sink.announce_boss_angry(focus);
}

/// Снять анимации злости (цвет возвращается к базовому)
pub(crate) fn stop_angry_anims(boss: &mut Boss) {
    let alive = boss.alive_root();
    let parts = boss.parts_mut();
    parts.set_colour(alive, crate::geometry::Rgba::WHITE);
    parts.clear_transform_anims(alive);
}

/// Позиция части в плоскости уровня
pub(crate) fn part_pos(boss: &Boss, part: PartId) -> Vec2 {
    boss.parts().world_position_2d(part)
}
