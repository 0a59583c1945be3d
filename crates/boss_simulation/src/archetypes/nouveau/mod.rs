//! Nouveau босс - трапеция корпуса с беседкой и стеклянным куполом сверху,
//! завитками по бокам и двумя руками-держателями сфер.
//!
//! ```text
//! root
//! |____dead
//! |____alive
//!      |____body
//!      |____top_enclosure {gazebo, dome}
//!      |____top_sphere
//!      |____left/right side curls
//!      |____left_sphere_holder  {holder_curl, sphere, frill}
//!      |____right_sphere_holder {holder_curl, sphere, frill}
//!      |____bottom curls x8
//!      |____bottom_hex_sphere
//! ```

use bevy::prelude::*;

use crate::ai::BossAi;
use crate::boss::{Boss, BossKind, BossLayout, BossRoots};
use crate::config::{PADDLE_DEFAULT_ACCELERATION, PADDLE_DEFAULT_MAX_SPEED, PIECE_HEIGHT, PIECE_WIDTH};
use crate::geometry::{Aabb2, BoundingLines};
use crate::logger::log_warning;
use crate::parts::{PartArena, PartId};
use crate::random::RandomSource;

pub mod ai;


pub use ai::{BeamFireLocation, NouveauAi, NouveauStage, NouveauState};

pub const BODY_CORE_HEIGHT: f32 = 4.719;
pub const BODY_CORE_TOP_WIDTH: f32 = 4.236;
pub const BODY_CORE_BOTTOM_WIDTH: f32 = 9.705;

pub const TOP_ENCLOSURE_GAZEBO_HEIGHT: f32 = 2.48;
pub const TOP_ENCLOSURE_GAZEBO_WIDTH: f32 = 3.972;
pub const TOP_ENCLOSURE_DOME_HEIGHT: f32 = 1.555;
pub const TOP_ENCLOSURE_DOME_TOP_WIDTH: f32 = 1.312;

pub const ARM_SPHERE_HOLDER_CURL_WIDTH: f32 = 5.485;
pub const ARM_SPHERE_HOLDER_CURL_HEIGHT: f32 = 1.961;
pub const SIDE_SPHERE_HEIGHT: f32 = 1.215;

pub const NUM_CURLS: usize = 8;

// Где босс может находиться (позиция alive-корня после сдвига на полуразмер)
pub const MIN_X_BOUNDS_WITH_PADDING: f32 = 6.0 * PIECE_WIDTH;
pub const MAX_X_BOUNDS_WITH_PADDING: f32 = 17.0 * PIECE_WIDTH;
pub const MIN_Y_BOUNDS_WITH_PADDING: f32 = 12.0 * PIECE_HEIGHT;
pub const MAX_Y_BOUNDS_WITH_PADDING: f32 = 25.0 * PIECE_HEIGHT;

// Скорости стадий
pub const SIDE_SPHERE_MAX_SPEED: f32 = 0.4 * PADDLE_DEFAULT_MAX_SPEED;
pub const SIDE_SPHERE_ACCELERATION: f32 = 0.25 * PADDLE_DEFAULT_ACCELERATION;
pub const GLASS_DOME_MAX_SPEED: f32 = 0.6 * PADDLE_DEFAULT_MAX_SPEED;
pub const GLASS_DOME_ACCELERATION: f32 = 0.35 * PADDLE_DEFAULT_ACCELERATION;
pub const TOP_SPHERE_MAX_SPEED: f32 = 0.8 * PADDLE_DEFAULT_MAX_SPEED;
pub const TOP_SPHERE_ACCELERATION: f32 = 0.5 * PADDLE_DEFAULT_ACCELERATION;

/// Точка выстрела нижней сферы относительно её центра
pub const BOTTOM_SPHERE_SHOOT_OFFSET: Vec2 = Vec2::new(0.0, -2.25);
/// Луч из нижней сферы стартует чуть выше точки выстрела лазером
pub const BOTTOM_SPHERE_BEAM_OFFSET: Vec2 = Vec2::new(0.0, -1.25);
/// Точки выстрела левого завитка (правый - зеркально)
pub const LEFT_SIDE_CURL_SHOOT_TOP_OFFSET: Vec2 = Vec2::new(-5.773, -0.902);
pub const LEFT_SIDE_CURL_SHOOT_BOTTOM_OFFSET: Vec2 = Vec2::new(-5.118, -2.362);

pub const BOTTOM_BEAM_HALF_RADIUS: f32 = 1.0;
pub const SIDE_BEAM_HALF_RADIUS: f32 = 0.6;

const SIDE_CURLS_OFFSET: Vec2 = Vec2::new(2.986, 0.82);
const SPHERE_HOLDER_OFFSET: Vec2 = Vec2::new(2.386, 1.07);
const SPHERE_IN_HOLDER_OFFSET: Vec2 = Vec2::new(3.112, 1.558);
const TOP_ENCLOSURE_Y: f32 = 2.32 + TOP_ENCLOSURE_GAZEBO_HEIGHT / 2.0;
const TOP_SPHERE_Y: f32 = 2.667;
const BOTTOM_HEX_SPHERE_Y: f32 = -1.68;
const BOTTOM_CURLS_Y: f32 = -1.545;

/// (x, z, поворот вокруг Y) нижних завитков; геометрию имеют только крайние
const BOTTOM_CURL_PLACEMENTS: [(f32, f32, f32); NUM_CURLS] = [
    (-4.909, 2.034, 22.5),
    (-3.757, -0.664, 67.5),
    (-1.152, -3.398, 112.5),
    (1.152, -3.398, 67.5),
    (3.757, -0.664, 112.5),
    (4.909, 2.034, 157.5),
    (-2.034, 4.909, 67.5),
    (2.034, 4.909, 112.5),
];

/// Handles всех частей Nouveau босса
#[derive(Debug, Clone, PartialEq)]
pub struct NouveauParts {
    pub body: PartId,
    pub top_enclosure: PartId,
    pub gazebo: PartId,
    pub dome: PartId,
    pub top_sphere: PartId,
    pub left_side_curls: PartId,
    pub right_side_curls: PartId,
    pub left_sphere_holder: PartId,
    pub left_holder_curl: PartId,
    pub left_sphere: PartId,
    pub left_frill: PartId,
    pub right_sphere_holder: PartId,
    pub right_holder_curl: PartId,
    pub right_sphere: PartId,
    pub right_frill: PartId,
    pub bottom_curls: [PartId; NUM_CURLS],
    pub bottom_hex_sphere: PartId,
}

/// Рука: composite {holder_curl, sphere, frill}
#[derive(Debug, Clone, Copy)]
struct SphereHolder {
    holder: PartId,
    curl: PartId,
    sphere: PartId,
    frill: PartId,
}

impl NouveauParts {
    /// Построить дерево под `alive`
    pub fn build(arena: &mut PartArena, alive: PartId) -> Self {
        let body = arena.add_part(Some(alive), body_bounds());

        let top_enclosure = arena.add_composite(Some(alive));
        let gazebo = arena.add_part(Some(top_enclosure), gazebo_bounds());
        let dome = arena.add_part(Some(top_enclosure), dome_bounds());
        arena.translate(dome, Vec3::new(0.0, TOP_ENCLOSURE_GAZEBO_HEIGHT / 2.0, 0.0));
        arena.translate(top_enclosure, Vec3::new(0.0, TOP_ENCLOSURE_Y, 0.0));

        // Сфера внутри беседки: открывается только после потери купола
        let top_sphere = arena.add_part(Some(alive), top_sphere_bounds());
        arena.translate(top_sphere, Vec3::new(0.0, TOP_SPHERE_Y, 0.0));

        let left_side_curls = arena.add_part(Some(alive), side_curl_bounds(false));
        arena.translate(left_side_curls, Vec3::new(-SIDE_CURLS_OFFSET.x, SIDE_CURLS_OFFSET.y, 0.0));
        let right_side_curls = arena.add_part(Some(alive), side_curl_bounds(true));
        arena.translate(right_side_curls, SIDE_CURLS_OFFSET.extend(0.0));

        let left = build_sphere_holder(arena, alive, false);
        let right = build_sphere_holder(arena, alive, true);

        let bottom_curls = BOTTOM_CURL_PLACEMENTS.map(|(x, z, y_rot)| {
            let outer = (y_rot - 22.5).abs() < f32::EPSILON || (y_rot - 157.5).abs() < f32::EPSILON;
            let bounds = if outer { bottom_curl_bounds() } else { BoundingLines::new() };
            let id = arena.add_part(Some(alive), bounds);
            arena.set_y_rotation(id, y_rot);
            arena.translate(id, Vec3::new(x, BOTTOM_CURLS_Y, z));
            id
        });

        let bottom_hex_sphere = arena.add_part(Some(alive), bottom_hex_sphere_bounds());
        arena.translate(bottom_hex_sphere, Vec3::new(0.0, BOTTOM_HEX_SPHERE_Y, 0.0));

        Self {
            body,
            top_enclosure,
            gazebo,
            dome,
            top_sphere,
            left_side_curls,
            right_side_curls,
            left_sphere_holder: left.holder,
            left_holder_curl: left.curl,
            left_sphere: left.sphere,
            left_frill: left.frill,
            right_sphere_holder: right.holder,
            right_holder_curl: right.curl,
            right_sphere: right.sphere,
            right_frill: right.frill,
            bottom_curls,
            bottom_hex_sphere,
        }
    }

    pub fn bottom_sphere_shoot_point(&self, arena: &PartArena) -> Vec2 {
        arena.world_position_2d(self.bottom_hex_sphere) + BOTTOM_SPHERE_SHOOT_OFFSET
    }

    /// Точка выстрела завитка: `right` - сторона, `top` - верхняя или нижняя
    pub fn side_curl_shoot_point(&self, arena: &PartArena, right: bool, top: bool) -> Vec2 {
        let curls = if right { self.right_side_curls } else { self.left_side_curls };
        arena.world_position_2d(curls) + side_curl_shoot_offset(right, top)
    }
}

/// Смещение точки выстрела в локальных координатах завитка
pub fn side_curl_shoot_offset(right: bool, top: bool) -> Vec2 {
    let offset = if top {
        LEFT_SIDE_CURL_SHOOT_TOP_OFFSET
    } else {
        LEFT_SIDE_CURL_SHOOT_BOTTOM_OFFSET
    };
    if right {
        Vec2::new(-offset.x, offset.y)
    } else {
        offset
    }
}

// Геометрия: ломаные обходятся против часовой, нормали смотрят наружу

fn body_bounds() -> BoundingLines {
    let hh = BODY_CORE_HEIGHT / 2.0;
    let htw = BODY_CORE_TOP_WIDTH / 2.0;
    let hbw = BODY_CORE_BOTTOM_WIDTH / 2.0;
    // Правая диагональ, верх, левая диагональ; низ закрыт нижней сферой
    BoundingLines::polyline(&[
        Vec2::new(hbw, -hh),
        Vec2::new(htw, hh),
        Vec2::new(-htw, hh),
        Vec2::new(-hbw, -hh),
    ])
}

fn gazebo_bounds() -> BoundingLines {
    let hw = TOP_ENCLOSURE_GAZEBO_WIDTH / 2.0;
    let hh = TOP_ENCLOSURE_GAZEBO_HEIGHT / 2.0;
    let mut bounds = BoundingLines::new();
    bounds.add_bound(Vec2::new(-hw, -hh), Vec2::new(-hw, hh), Vec2::NEG_X);
    bounds.add_bound(Vec2::new(hw, -hh), Vec2::new(hw, hh), Vec2::X);
    bounds
}

fn dome_bounds() -> BoundingLines {
    let hw = TOP_ENCLOSURE_GAZEBO_WIDTH / 2.0;
    let top = TOP_ENCLOSURE_DOME_TOP_WIDTH / 2.0;
    BoundingLines::polyline(&[
        Vec2::new(hw, 0.0),
        Vec2::new(1.657, 0.692),
        Vec2::new(1.247, 1.246),
        Vec2::new(top, TOP_ENCLOSURE_DOME_HEIGHT),
        Vec2::new(-top, TOP_ENCLOSURE_DOME_HEIGHT),
        Vec2::new(-1.247, 1.246),
        Vec2::new(-1.657, 0.692),
        Vec2::new(-hw, 0.0),
    ])
}

fn top_sphere_bounds() -> BoundingLines {
    BoundingLines::polyline(&[
        Vec2::new(1.343, 0.0),
        Vec2::new(0.928, 0.948),
        Vec2::new(0.0, 1.321),
        Vec2::new(-0.928, 0.948),
        Vec2::new(-1.343, 0.0),
    ])
}

/// Левый завиток; правый получается зеркалом
fn side_curl_bounds(right: bool) -> BoundingLines {
    let mut bounds = BoundingLines::polyline(&[
        Vec2::ZERO,
        Vec2::new(-2.689, 1.173),
        Vec2::new(-5.39, 0.0),
        LEFT_SIDE_CURL_SHOOT_TOP_OFFSET,
        LEFT_SIDE_CURL_SHOOT_BOTTOM_OFFSET,
        Vec2::new(-4.39, -2.51),
        Vec2::new(-0.75, -1.361),
    ]);
    if right {
        bounds.reflect_x();
    }
    bounds
}

fn build_sphere_holder(arena: &mut PartArena, alive: PartId, right: bool) -> SphereHolder {
    let sign = if right { 1.0 } else { -1.0 };
    let holder = arena.add_composite(Some(alive));

    let mut curl_bounds = BoundingLines::polyline(&[
        Vec2::new(0.15, ARM_SPHERE_HOLDER_CURL_HEIGHT),
        Vec2::new(-ARM_SPHERE_HOLDER_CURL_WIDTH, ARM_SPHERE_HOLDER_CURL_HEIGHT),
        Vec2::new(-ARM_SPHERE_HOLDER_CURL_WIDTH, 0.154),
    ]);
    let mut sphere_bounds = BoundingLines::polyline(&[
        Vec2::new(1.5, 0.0),
        Vec2::new(1.06, SIDE_SPHERE_HEIGHT * 0.75),
        Vec2::new(0.0, SIDE_SPHERE_HEIGHT),
        Vec2::new(-1.06, SIDE_SPHERE_HEIGHT * 0.75),
        Vec2::new(-1.5, 0.0),
    ]);
    let mut frill_bounds = BoundingLines::polyline(&[
        Vec2::new(2.606, 0.0),
        Vec2::new(2.606, 1.407),
        Vec2::new(0.984, 2.599),
        Vec2::new(-0.984, 2.599),
        Vec2::new(-2.606, 1.407),
        Vec2::new(-2.606, 0.0),
    ]);
    if right {
        curl_bounds.reflect_x();
        sphere_bounds.reflect_x();
        frill_bounds.reflect_x();
    }

    let curl = arena.add_part(Some(holder), curl_bounds);
    let sphere_pos = Vec3::new(sign * SPHERE_IN_HOLDER_OFFSET.x, SPHERE_IN_HOLDER_OFFSET.y, 0.0);
    let sphere = arena.add_part(Some(holder), sphere_bounds);
    arena.translate(sphere, sphere_pos);
    let frill = arena.add_part(Some(holder), frill_bounds);
    arena.translate(frill, sphere_pos);

    arena.translate(holder, Vec3::new(sign * SPHERE_HOLDER_OFFSET.x, SPHERE_HOLDER_OFFSET.y, 0.0));
    SphereHolder {
        holder,
        curl,
        sphere,
        frill,
    }
}

fn bottom_curl_bounds() -> BoundingLines {
    BoundingLines::polyline(&[
        Vec2::new(-0.57, 0.0),
        Vec2::new(-0.57, -2.275),
        Vec2::new(0.505, -3.549),
        Vec2::new(3.034, -3.549),
        Vec2::new(3.034, 0.0),
    ])
}

fn bottom_hex_sphere_bounds() -> BoundingLines {
    let bottom = BOTTOM_SPHERE_SHOOT_OFFSET.y;
    BoundingLines::polyline(&[
        Vec2::new(-2.456, 0.0),
        Vec2::new(-1.616, -1.25),
        Vec2::new(-0.512, bottom),
        Vec2::new(0.512, bottom),
        Vec2::new(1.616, -1.25),
        Vec2::new(2.456, 0.0),
    ])
}

/// Где может стоять центр босса: рамка уровня, сжатая на полуразмер живой части.
/// Если босс шире рамки - вырождается в её центр
pub fn movement_aabb(boss: &Boss) -> Aabb2 {
    let half = boss.alive_aabb().map(|a| a.size() / 2.0).unwrap_or(Vec2::ZERO);
    let outer = Aabb2::new(
        Vec2::new(MIN_X_BOUNDS_WITH_PADDING, MIN_Y_BOUNDS_WITH_PADDING),
        Vec2::new(MAX_X_BOUNDS_WITH_PADDING, MAX_Y_BOUNDS_WITH_PADDING),
    );
    let center = outer.center();
    let min = (outer.min + half).min(center);
    let max = (outer.max - half).max(center);
    Aabb2 { min, max }
}

/// Позиция появления: центр рамки движения
pub fn start_position() -> Vec2 {
    Vec2::new(
        (MIN_X_BOUNDS_WITH_PADDING + MAX_X_BOUNDS_WITH_PADDING) / 2.0,
        (MIN_Y_BOUNDS_WITH_PADDING + MAX_Y_BOUNDS_WITH_PADDING) / 2.0,
    )
}

pub fn spawn(level_width: f32, level_height: f32, rng: &mut dyn RandomSource) -> Boss {
    if level_width < MAX_X_BOUNDS_WITH_PADDING || level_height < MAX_Y_BOUNDS_WITH_PADDING {
        log_warning(&format!(
            "Nouveau boss: level {}x{} is smaller than its movement bounds",
            level_width, level_height
        ));
    }

    let mut arena = PartArena::new();
    let roots = BossRoots::build(&mut arena);
    let parts = NouveauParts::build(&mut arena, roots.alive);
    arena.translate(roots.alive, start_position().extend(0.0));

    let mut boss = Boss::assemble(BossKind::Nouveau, arena, roots, BossLayout::Nouveau(parts.clone()));
    let first = NouveauAi::new(NouveauStage::SideSphere, parts, &mut boss, rng);
    boss.set_current_ai_immediately(BossAi::Nouveau(first));
    boss
}
