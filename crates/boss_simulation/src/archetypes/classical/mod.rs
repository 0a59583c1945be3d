//! Classical босс - фасад храма: глаз, фронтон, 4 антаблемента, 6 колонн,
//! база и две руки-колонны с квадратами.
//!
//! ```text
//! root
//! |____dead
//! |____alive
//!      |____eye, pediment
//!      |____top/bottom left/right tablature
//!      |____left/right column 1..3
//!      |____base
//!      |____left_arm  {rest_of_arm, square}
//!      |____right_arm {rest_of_arm, square}
//! ```

use bevy::prelude::*;

use crate::ai::BossAi;
use crate::boss::{Boss, BossKind, BossLayout, BossRoots};
use crate::config::{PADDLE_DEFAULT_ACCELERATION, PADDLE_DEFAULT_MAX_SPEED};
use crate::geometry::BoundingLines;
use crate::parts::{PartArena, PartId};
use crate::random::RandomSource;

pub mod ai;

#[cfg(test)]
mod ai_tests;

pub use ai::{ClassicalAi, ClassicalStage, ClassicalState};

pub const ARM_X_TRANSLATION_FROM_CENTER: f32 = 10.3;
pub const ARM_WIDTH: f32 = 2.4;
pub const HALF_ARM_WIDTH: f32 = ARM_WIDTH / 2.0;
pub const ARM_HEIGHT: f32 = 9.66;

pub const COLUMN_WIDTH: f32 = 1.704;
pub const COLUMN_HEIGHT: f32 = 4.373;
pub const BASE_WIDTH: f32 = 18.355;
pub const BASE_HEIGHT: f32 = 2.150;
pub const TABLATURE_WIDTH: f32 = 7.621;
pub const TABLATURE_HEIGHT: f32 = 1.334;
pub const PEDIMENT_WIDTH: f32 = 17.823;
pub const PEDIMENT_HEIGHT: f32 = 3.16;
pub const EYE_WIDTH: f32 = 3.150;
pub const EYE_HEIGHT: f32 = 1.575;

// Скорости стадий - от параметров paddle
pub const ARMS_BODY_HEAD_MAX_SPEED: f32 = 0.8 * PADDLE_DEFAULT_MAX_SPEED / 1.75;
pub const ARMS_BODY_HEAD_ACCELERATION: f32 = 0.8 * PADDLE_DEFAULT_ACCELERATION / 2.25;
pub const BODY_HEAD_MAX_SPEED: f32 = 0.8 * PADDLE_DEFAULT_MAX_SPEED + 5.0;
pub const BODY_HEAD_ACCELERATION: f32 = 0.8 * PADDLE_DEFAULT_ACCELERATION;
pub const PEDIMENT_MAX_SPEED: f32 = 0.8 * PADDLE_DEFAULT_MAX_SPEED;
pub const PEDIMENT_ACCELERATION: f32 = 0.8 * PADDLE_DEFAULT_ACCELERATION;
pub const EYE_MAX_SPEED: f32 = 0.8 * PADDLE_DEFAULT_MAX_SPEED + 8.0;
pub const EYE_ACCELERATION: f32 = 0.8 * PADDLE_DEFAULT_ACCELERATION + 12.0;

const COLUMN_X_OFFSETS: [f32; 6] = [-7.275, -5.101, -2.927, 7.275, 5.101, 2.927];

/// Handles всех частей Classical босса
#[derive(Debug, Clone, PartialEq)]
pub struct ClassicalParts {
    pub eye: PartId,
    pub pediment: PartId,
    pub top_left_tablature: PartId,
    pub top_right_tablature: PartId,
    pub bottom_left_tablature: PartId,
    pub bottom_right_tablature: PartId,
    /// left1, left2, left3, right1, right2, right3
    pub columns: [PartId; 6],
    pub base: PartId,
    pub left_arm: PartId,
    pub left_rest_of_arm: PartId,
    pub left_arm_square: PartId,
    pub right_arm: PartId,
    pub right_rest_of_arm: PartId,
    pub right_arm_square: PartId,
}

impl ClassicalParts {
    /// Построить дерево под `alive`
    pub fn build(arena: &mut PartArena, alive: PartId) -> Self {
        // Глаз без геометрии: внутри фронтона и не должен мешать мячу
        let eye = arena.add_part(Some(alive), BoundingLines::new());
        arena.translate(eye, Vec3::new(0.0, 5.081, 1.053));

        let pediment = arena.add_part(
            Some(alive),
            BoundingLines::spike_up(PEDIMENT_WIDTH, PEDIMENT_HEIGHT / 2.0, -PEDIMENT_HEIGHT / 2.0),
        );
        arena.translate(pediment, Vec3::new(0.0, 5.0905, 0.0));

        let tablature = |arena: &mut PartArena, x: f32, y: f32, flipped: bool| {
            let id = arena.add_part(Some(alive), BoundingLines::rect(TABLATURE_WIDTH, TABLATURE_HEIGHT));
            if flipped {
                arena.rotate_z(id, 180.0);
            }
            arena.translate(id, Vec3::new(x, y, 0.0));
            id
        };
        let top_left_tablature = tablature(arena, -5.101, 2.854, true);
        let top_right_tablature = tablature(arena, 5.101, 2.854, true);
        let bottom_left_tablature = tablature(arena, -5.101, -2.854, false);
        let bottom_right_tablature = tablature(arena, 5.101, -2.854, false);

        // Только крайние колонны сразу с геометрией, внутренние закрыты руками/базой
        let columns = COLUMN_X_OFFSETS.map(|x| {
            let outer = (x.abs() - 7.275).abs() < f32::EPSILON;
            let bounds = if outer { column_bounds() } else { BoundingLines::new() };
            let id = arena.add_part(Some(alive), bounds);
            arena.translate(id, Vec3::new(x, 0.0, 0.0));
            id
        });

        let base = arena.add_part(Some(alive), BoundingLines::rect(BASE_WIDTH, BASE_HEIGHT));
        arena.translate(base, Vec3::new(0.0, -4.596, 0.0));

        let (left_arm, left_rest_of_arm, left_arm_square) =
            build_arm(arena, alive, Vec3::new(-ARM_X_TRANSLATION_FROM_CENTER, 0.834, 0.0));
        let (right_arm, right_rest_of_arm, right_arm_square) =
            build_arm(arena, alive, Vec3::new(ARM_X_TRANSLATION_FROM_CENTER, 0.834, 0.0));

        Self {
            eye,
            pediment,
            top_left_tablature,
            top_right_tablature,
            bottom_left_tablature,
            bottom_right_tablature,
            columns,
            base,
            left_arm,
            left_rest_of_arm,
            left_arm_square,
            right_arm,
            right_rest_of_arm,
            right_arm_square,
        }
    }

    /// Фронтон получает нижнюю грань, внутренние колонны - геометрию
    pub fn generate_full_column_pediment_bounds(&self, arena: &mut PartArena) {
        let mut pediment = BoundingLines::spike_up(PEDIMENT_WIDTH, PEDIMENT_HEIGHT / 2.0, -PEDIMENT_HEIGHT / 2.0);
        let hw = PEDIMENT_WIDTH / 2.0;
        let hh = PEDIMENT_HEIGHT / 2.0;
        pediment.add_bound(Vec2::new(-hw, -hh), Vec2::new(hw, -hh), Vec2::NEG_Y);
        arena.set_bounds(self.pediment, pediment);

        for column in self.columns {
            arena.set_bounds(column, column_bounds());
        }
    }

    pub fn generate_eye_bounds(&self, arena: &mut PartArena) {
        arena.set_bounds(self.eye, BoundingLines::diamond(EYE_WIDTH, EYE_HEIGHT));
    }
}

fn column_bounds() -> BoundingLines {
    BoundingLines::rect(COLUMN_WIDTH, COLUMN_HEIGHT)
}

/// Рука: composite {rest_of_arm, square}
fn build_arm(arena: &mut PartArena, alive: PartId, translation: Vec3) -> (PartId, PartId, PartId) {
    const FAVOUR_SQUARE_SIZE: f32 = 0.25;
    const SQUARE_SIZE: f32 = 2.445 + FAVOUR_SQUARE_SIZE;
    const SUPPORT_HEIGHT: f32 = 0.652 - FAVOUR_SQUARE_SIZE;
    const COLUMN_HALF_WIDTH: f32 = 2.375 / 2.0;
    const COLUMN_TOTAL_HEIGHT: f32 = 0.292 + 0.207 + 4.792 + 0.621;

    let arm = arena.add_composite(Some(alive));

    // Верхняя опора + колонна под квадратом
    let mut rest = BoundingLines::rect_from_corners(
        Vec2::new(-SQUARE_SIZE / 2.0, 3.097),
        Vec2::new(SQUARE_SIZE / 2.0, 3.097 + SUPPORT_HEIGHT),
    );
    rest.lines.extend(
        BoundingLines::rect_from_corners(
            Vec2::new(-COLUMN_HALF_WIDTH, -COLUMN_TOTAL_HEIGHT),
            Vec2::new(COLUMN_HALF_WIDTH, SUPPORT_HEIGHT),
        )
        .lines,
    );
    let rest_of_arm = arena.add_part(Some(arm), rest);

    let square = arena.add_part(Some(arm), BoundingLines::rect(SQUARE_SIZE, SQUARE_SIZE));
    arena.translate(square, Vec3::new(0.0, SUPPORT_HEIGHT + SQUARE_SIZE / 2.0, 0.0));

    arena.translate(arm, translation);
    (arm, rest_of_arm, square)
}

/// Позиция появления: по центру, у верха уровня
pub fn start_position(level_width: f32, level_height: f32) -> Vec2 {
    Vec2::new(level_width / 2.0, level_height - 7.5)
}

pub fn spawn(level_width: f32, level_height: f32, rng: &mut dyn RandomSource) -> Boss {
    let mut arena = PartArena::new();
    let roots = BossRoots::build(&mut arena);
    let parts = ClassicalParts::build(&mut arena, roots.alive);
    arena.translate(roots.alive, start_position(level_width, level_height).extend(0.0));

    let mut boss = Boss::assemble(BossKind::Classical, arena, roots, BossLayout::Classical(parts.clone()));
    let first = ClassicalAi::new(ClassicalStage::ArmsBodyHead, parts, &mut boss, rng);
    boss.set_current_ai_immediately(BossAi::Classical(first));
    boss
}
