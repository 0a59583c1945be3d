//! Gothic-Romantic босс - вращающийся шпиль: тело, верхнее и нижнее острия, 8 "ног".
//!
//! Первые две стадии проходят внутри confines (рамки из блоков), после их
//! разрушения босс свободно летает по всему уровню.

use bevy::prelude::*;

use crate::ai::BossAi;
use crate::boss::{Boss, BossKind, BossLayout, BossRoots};
use crate::config::{PADDLE_DEFAULT_ACCELERATION, PIECE_HEIGHT, PIECE_WIDTH};
use crate::geometry::{Aabb2, BoundingLines};
use crate::parts::{PartArena, PartId};
use crate::random::RandomSource;

pub mod ai;

#[cfg(test)]
mod ai_tests;

pub use ai::{ConfinedMovePos, GothicAi, GothicStage, GothicState};

pub const TOTAL_WIDTH_WITH_LEGS: f32 = 10.25;
pub const TOTAL_HEIGHT: f32 = 9.258;

pub const BODY_WIDTH: f32 = 3.45;
pub const BODY_HEIGHT: f32 = 7.0;
pub const HALF_BODY_WIDTH: f32 = BODY_WIDTH / 2.0;
pub const HALF_BODY_HEIGHT: f32 = BODY_HEIGHT / 2.0;

pub const TOP_POINT_WIDTH: f32 = 2.644;
pub const TOP_POINT_TIP_Y: f32 = 1.208;
pub const BOTTOM_POINT_WIDTH: f32 = 3.75;
pub const BOTTOM_POINT_TIP_Y: f32 = -1.069;

pub const NUM_LEGS: usize = 8;

pub const DEFAULT_ACCELERATION: f32 = 1.5 * PADDLE_DEFAULT_ACCELERATION;
pub const DELAY_BEFORE_SUMMONING_ITEMS_IN_SECS: f32 = 2.0;

/// Рамка confines в блоках от краёв уровня
pub const CONFINES_X_PADDING_NUM_PIECES: f32 = 2.0;
pub const CONFINES_MIN_Y_NUM_PIECES: f32 = 8.0;
pub const CONFINES_TOP_PADDING_NUM_PIECES: f32 = 1.0;

/// Смещение и Y-поворот каждой ноги вокруг тела
const LEG_PLACEMENTS: [(Vec3, f32); NUM_LEGS] = [
    (Vec3::new(0.0, -1.859, 1.876), 0.0),
    (Vec3::new(1.326, -1.859, 1.327), 45.0),
    (Vec3::new(1.875, -1.859, 0.0), 90.0),
    (Vec3::new(1.326, -1.859, -1.325), 135.0),
    (Vec3::new(0.0, -1.859, -1.876), 180.0),
    (Vec3::new(-1.326, -1.859, -1.325), 225.0),
    (Vec3::new(-1.875, -1.859, 0.0), 270.0),
    (Vec3::new(-1.326, -1.859, 1.327), 315.0),
];

#[derive(Debug, Clone, PartialEq)]
pub struct GothicParts {
    pub body: PartId,
    pub top_point: PartId,
    pub bottom_point: PartId,
    pub legs: [PartId; NUM_LEGS],
}

impl GothicParts {
    pub fn build(arena: &mut PartArena, alive: PartId) -> Self {
        let body = arena.add_part(
            Some(alive),
            BoundingLines::rect_from_corners(
                Vec2::new(-HALF_BODY_WIDTH, -2.984),
                Vec2::new(HALF_BODY_WIDTH, HALF_BODY_HEIGHT),
            ),
        );

        let top_point = arena.add_part(Some(alive), BoundingLines::spike_up(TOP_POINT_WIDTH, TOP_POINT_TIP_Y, -0.284));
        arena.translate(top_point, Vec3::new(0.0, 3.542, 0.0));

        let bottom_point = arena.add_part(
            Some(alive),
            BoundingLines::spike_down(BOTTOM_POINT_WIDTH, BOTTOM_POINT_TIP_Y, 0.447),
        );
        arena.translate(bottom_point, Vec3::new(0.0, -3.431, 0.0));

        // Ноги без геометрии: мяч отскакивает от тела
        let legs = LEG_PLACEMENTS.map(|(translation, y_rot)| {
            let leg = arena.add_part(Some(alive), BoundingLines::new());
            arena.set_y_rotation(leg, y_rot);
            arena.translate(leg, translation);
            leg
        });

        Self {
            body,
            top_point,
            bottom_point,
            legs,
        }
    }

    /// Точка выстрела на кончике ноги (в мире)
    pub fn leg_point_pos(&self, arena: &PartArena, idx: usize) -> Vec2 {
        let leg = self.legs[idx % NUM_LEGS];
        arena
            .world_transform(leg)
            .transform_point3(Vec3::new(0.0, -1.875, 3.0))
            .truncate()
    }

    pub fn bottom_point_tip_pos(&self, arena: &PartArena) -> Vec2 {
        arena.world_position_2d(self.bottom_point) + Vec2::new(0.0, BOTTOM_POINT_TIP_Y)
    }

    pub fn top_point_tip_pos(&self, arena: &PartArena) -> Vec2 {
        arena.world_position_2d(self.top_point) + Vec2::new(0.0, TOP_POINT_TIP_Y)
    }
}

/// Внутренняя область confines (до их разрушения)
pub fn confines(level_width: f32, level_height: f32) -> Aabb2 {
    Aabb2::new(
        Vec2::new(CONFINES_X_PADDING_NUM_PIECES * PIECE_WIDTH, CONFINES_MIN_Y_NUM_PIECES * PIECE_HEIGHT),
        Vec2::new(
            level_width - CONFINES_X_PADDING_NUM_PIECES * PIECE_WIDTH,
            level_height - CONFINES_TOP_PADDING_NUM_PIECES * PIECE_HEIGHT,
        ),
    )
}

pub fn spawn(level_width: f32, level_height: f32, rng: &mut dyn RandomSource) -> Boss {
    let mut arena = PartArena::new();
    let roots = BossRoots::build(&mut arena);
    let parts = GothicParts::build(&mut arena, roots.alive);
    let start = confines(level_width, level_height).center();
    arena.translate(roots.alive, start.extend(0.0));

    let mut boss = Boss::assemble(BossKind::GothicRomantic, arena, roots, BossLayout::Gothic(parts.clone()));
    let first = GothicAi::new(GothicStage::FireBall, parts, &mut boss, rng);
    boss.set_current_ai_immediately(BossAi::Gothic(first));
    boss
}
