//! Deco босс - робот с громоотводом (lightning relay).
//!
//! Средний корпус: ядро, relay снизу и две выдвижные руки (шестерня, два
//! телескопических сегмента, кисть). По бокам - два боковых корпуса, которые
//! отваливаются после первого удара тесла-дугой.

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

pub use ai::{DecoAi, DecoStage, DecoState};

pub const SCALE: f32 = 1.4;

pub const CORE_WIDTH: f32 = 3.563 * SCALE;
pub const CORE_HEIGHT: f32 = 8.552 * SCALE;
pub const HALF_CORE_HEIGHT: f32 = CORE_HEIGHT / 2.0;

pub const SIDE_BODY_PART_WIDTH: f32 = 5.614 * SCALE;
pub const SIDE_BODY_PART_HEIGHT: f32 = 7.660 * SCALE;
pub const SIDE_POS_X_OFFSET: f32 = 3.962 * SCALE;
pub const SIDE_Y_OFFSET: f32 = -3.283;

pub const FULL_BODY_TOTAL_WIDTH: f32 = 18.9;
pub const FULL_BODY_TOTAL_HEIGHT: f32 = 13.4;
pub const CORE_AND_ARMS_WIDTH: f32 = 8.0;

pub const ARM_POS_X_OFFSET: f32 = 2.475 * SCALE;
pub const ARM_Y_OFFSET: f32 = -0.973 * SCALE;
pub const ARM_Z_OFFSET: f32 = 0.148 * SCALE;
pub const HAND_WIDTH: f32 = 1.1 * SCALE;
const ARM_SEG_HEIGHT: f32 = 1.0 * SCALE;
const HAND_Y_OFFSET: f32 = -2.6 * SCALE;

/// Откуда вылетают молнии (относительно alive-корня)
pub const LIGHTNING_FIRE_OFFSET: Vec2 = Vec2::new(0.0, -4.95 * SCALE);
/// Где "заряжается" предмет перед сбросом (относительно ядра)
pub const ITEM_LOAD_OFFSET_Y: f32 = -4.6 * SCALE;
pub const ITEM_DROP_ANIM_DISPLACEMENT: f32 = PIECE_HEIGHT;

pub const DEFAULT_ACCELERATION: f32 = 0.25 * PADDLE_DEFAULT_ACCELERATION;
pub const DEFAULT_MAX_X_SPEED: f32 = 8.0;
pub const DEFAULT_MAX_Y_SPEED: f32 = 14.0;

/// Рамка confines в блоках и отступы области движения внутри неё
pub const CONFINE_X_PADDING_NUM_PIECES: f32 = 3.0;
pub const CONFINE_Y_TOP_PADDING_NUM_PIECES: f32 = 2.0;
pub const MOVEMENT_PADDING_X: f32 = PIECE_WIDTH;
pub const MOVEMENT_PADDING_Y: f32 = 1.5 * PIECE_HEIGHT;
pub const MOVEMENT_MIN_Y_BOUNDARY: f32 = 6.0 * PIECE_HEIGHT;

/// Строка тесла-блоков по обе стороны confines
pub const TESLA_BLOCK_Y_NUM_PIECES: f32 = 17.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecoArm {
    pub arm: PartId,
    pub gear: PartId,
    pub seg1: PartId,
    pub seg2: PartId,
    pub hand: PartId,
}

impl DecoArm {
    fn build(arena: &mut PartArena, middle_body: PartId, x_offset: f32) -> Self {
        let arm = arena.add_composite(Some(middle_body));
        let gear = arena.add_part(Some(arm), BoundingLines::new());
        let seg1 = arena.add_part(Some(arm), BoundingLines::new());
        arena.translate(seg1, Vec3::new(0.0, -ARM_SEG_HEIGHT, 0.0));
        let seg2 = arena.add_part(Some(arm), BoundingLines::new());
        arena.translate(seg2, Vec3::new(0.0, -2.0 * ARM_SEG_HEIGHT, 0.0));
        let hand = arena.add_part(Some(arm), BoundingLines::new());
        arena.translate(hand, Vec3::new(0.0, HAND_Y_OFFSET, 0.0));

        arena.translate(arm, Vec3::new(x_offset, ARM_Y_OFFSET, ARM_Z_OFFSET));
        Self {
            arm,
            gear,
            seg1,
            seg2,
            hand,
        }
    }

    pub fn segments(&self) -> [PartId; 3] {
        [self.seg1, self.seg2, self.hand]
    }

    /// Без боковых корпусов руки открыты: мяч отскакивает от кисти и сегментов
    pub fn expose_bounds(&self, arena: &mut PartArena) {
        arena.set_bounds(self.seg1, BoundingLines::rect(0.6 * HAND_WIDTH, ARM_SEG_HEIGHT));
        arena.set_bounds(self.seg2, BoundingLines::rect(0.5 * HAND_WIDTH, ARM_SEG_HEIGHT));
        arena.set_bounds(self.hand, BoundingLines::rect(HAND_WIDTH, HAND_WIDTH));
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecoParts {
    pub middle_body: PartId,
    pub core: PartId,
    pub lightning_relay: PartId,
    pub left_arm: DecoArm,
    pub right_arm: DecoArm,
    pub left_body: PartId,
    pub right_body: PartId,
}

impl DecoParts {
    pub fn build(arena: &mut PartArena, alive: PartId) -> Self {
        let middle_body = arena.add_composite(Some(alive));

        let core = arena.add_part(Some(middle_body), core_bounds());
        let lightning_relay = arena.add_part(Some(middle_body), relay_bounds());
        let left_arm = DecoArm::build(arena, middle_body, -ARM_POS_X_OFFSET);
        let right_arm = DecoArm::build(arena, middle_body, ARM_POS_X_OFFSET);

        let mut side = side_body_bounds();
        let left_body = arena.add_part(Some(alive), side.clone());
        arena.translate(left_body, Vec3::new(-SIDE_POS_X_OFFSET, SIDE_Y_OFFSET, 0.0));
        side.reflect_x();
        side.translate(Vec2::new(0.034 * SCALE, 0.0));
        let right_body = arena.add_part(Some(alive), side);
        arena.translate(right_body, Vec3::new(SIDE_POS_X_OFFSET, SIDE_Y_OFFSET, 0.0));

        Self {
            middle_body,
            core,
            lightning_relay,
            left_arm,
            right_arm,
            left_body,
            right_body,
        }
    }

    pub fn arm(&self, left: bool) -> &DecoArm {
        if left {
            &self.left_arm
        } else {
            &self.right_arm
        }
    }
}

fn scaled(x: f32, y: f32) -> Vec2 {
    Vec2::new(x, y) * SCALE
}

/// Перпендикуляр к отрезку (правая сторона при обходе p0 → p1)
fn right_normal(p0: Vec2, p1: Vec2) -> Vec2 {
    Vec2::new(p1.y - p0.y, p0.x - p1.x).normalize_or_zero()
}

fn core_bounds() -> BoundingLines {
    let pts = [
        scaled(-1.172, 1.526),
        scaled(-1.172, 2.901),
        scaled(-0.410, 4.276),
        scaled(0.410, 4.276),
        scaled(1.172, 2.489),
        scaled(1.172, 1.526),
    ];
    let mut bounds = BoundingLines::new();
    // Ядро обходится по часовой стрелке, наружу смотрит левая сторона
    for w in pts.windows(2) {
        bounds.add_bound(w[0], w[1], -right_normal(w[0], w[1]));
    }
    bounds.add_bound(scaled(-1.782, -4.166), scaled(1.782, -4.166), Vec2::new(0.0, -1.0));
    bounds
}

fn relay_bounds() -> BoundingLines {
    let pts = [
        scaled(-1.409, -4.276),
        scaled(-0.749, -4.881),
        scaled(0.749, -4.881),
        scaled(1.409, -4.276),
    ];
    let mut bounds = BoundingLines::new();
    for w in pts.windows(2) {
        bounds.add_bound(w[0], w[1], right_normal(w[0], w[1]));
    }
    bounds
}

fn side_body_bounds() -> BoundingLines {
    let pts = [
        scaled(2.824, 4.729),
        scaled(1.776, 4.729),
        scaled(1.008, 3.316),
        scaled(-0.877, 3.316),
        scaled(-2.168, 3.035),
        scaled(-2.790, 1.849),
        scaled(-2.790, -2.161),
        scaled(-2.020, -2.931),
        scaled(-1.470, -2.931),
        scaled(-0.590, -2.051),
        scaled(2.215, -2.051),
    ];
    let mut bounds = BoundingLines::new();
    for w in pts.windows(2) {
        bounds.add_bound(w[0], w[1], right_normal(w[0], w[1]));
    }
    bounds
}

pub fn confines(level_width: f32, level_height: f32) -> Aabb2 {
    Aabb2::new(
        Vec2::new(CONFINE_X_PADDING_NUM_PIECES * PIECE_WIDTH, 0.0),
        Vec2::new(
            level_width - CONFINE_X_PADDING_NUM_PIECES * PIECE_WIDTH,
            level_height - CONFINE_Y_TOP_PADDING_NUM_PIECES * PIECE_HEIGHT,
        ),
    )
}

/// Область, в которой держится AABB босса
pub fn movement_bounds(level_width: f32, level_height: f32) -> Aabb2 {
    let area = confines(level_width, level_height);
    Aabb2::new(
        Vec2::new(area.min.x + MOVEMENT_PADDING_X, MOVEMENT_MIN_Y_BOUNDARY),
        Vec2::new(area.max.x - MOVEMENT_PADDING_X, area.max.y - MOVEMENT_PADDING_Y),
    )
}

/// Центры левого и правого тесла-блоков
pub fn tesla_block_centers(level_width: f32) -> [Vec2; 2] {
    let y = (TESLA_BLOCK_Y_NUM_PIECES + 0.5) * PIECE_HEIGHT;
    let left_x = (CONFINE_X_PADDING_NUM_PIECES - 0.5) * PIECE_WIDTH;
    let right_x = level_width - left_x;
    [Vec2::new(left_x, y), Vec2::new(right_x, y)]
}

pub fn spawn(level_width: f32, level_height: f32, rng: &mut dyn RandomSource) -> Boss {
    let mut arena = PartArena::new();
    let roots = BossRoots::build(&mut arena);
    let parts = DecoParts::build(&mut arena, roots.alive);
    let bounds = movement_bounds(level_width, level_height);
    let start = Vec2::new(bounds.center().x, bounds.max.y - FULL_BODY_TOTAL_HEIGHT / 2.0);
    arena.translate(roots.alive, start.extend(0.0));

    let mut boss = Boss::assemble(BossKind::Deco, arena, roots, BossLayout::Deco(parts.clone()));
    let first = DecoAi::new(DecoStage::Stage1, parts, &mut boss, rng);
    boss.set_current_ai_immediately(BossAi::Deco(first));
    boss
}
