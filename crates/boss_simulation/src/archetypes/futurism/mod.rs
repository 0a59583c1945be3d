//! Futurism босс - ядро с четырьмя лампами под слоями щитов.
//!
//! Уровень разделён вертикальным барьером на две под-арены. Первая стадия
//! целиком проходит в левой; барьер разрушается в начале второй стадии.

use bevy::prelude::*;

use crate::ai::BossAi;
use crate::boss::{Boss, BossKind, BossLayout, BossRoots};
use crate::config::{PADDLE_DEFAULT_ACCELERATION, PIECE_HEIGHT, PIECE_WIDTH};
use crate::geometry::{rotate_degrees, Aabb2, BoundingLines};
use crate::logger::log_warning;
use crate::parts::{PartArena, PartId};
use crate::random::RandomSource;

pub mod ai;

#[cfg(test)]
mod ai_tests;

pub use ai::{FuturismAi, FuturismStage, FuturismState};

pub const FULLY_SHIELDED_BOSS_WIDTH: f32 = 8.8;
pub const FULLY_SHIELDED_BOSS_HEIGHT: f32 = 10.0;
pub const CORE_BOSS_SIZE: f32 = 5.037;
pub const CORE_BOSS_HALF_SIZE: f32 = CORE_BOSS_SIZE / 2.0;
pub const CORE_EYE_SIZE: f32 = 1.4;
const CORE_SHIELD_CORNER_HEIGHT: f32 = 1.167;

pub const BLOCK_TO_BOSS_X_PADDING: f32 = PIECE_HEIGHT;
pub const BLOCK_TO_BOSS_Y_PADDING: f32 = PIECE_HEIGHT;

// Разметка уровня в блоках
pub const LEVEL_X_OUTER_PADDING_NUM_PIECES: f32 = 4.0;
pub const LEVEL_SUBARENA_WIDTH_NUM_PIECES: f32 = 9.0;
pub const LEVEL_Y_OUTER_PADDING_NUM_PIECES: f32 = 4.0;
pub const LEVEL_SUBARENA_HEIGHT_NUM_PIECES: f32 = 28.0;
/// Ширина уровня, под которую сделана разметка (две под-арены + колонна барьера)
pub const LEVEL_WIDTH: f32 =
    (2.0 * LEVEL_X_OUTER_PADDING_NUM_PIECES + 2.0 * LEVEL_SUBARENA_WIDTH_NUM_PIECES + 1.0) * PIECE_WIDTH;

pub const DEFAULT_ACCELERATION: f32 = 0.1 * PADDLE_DEFAULT_ACCELERATION;
pub const DEFAULT_SPEED: f32 = 5.0;

/// Полуразмер портала, который выпускает босс
pub const PORTAL_HALF_SIZE: Vec2 = Vec2::new(0.45 * PIECE_WIDTH, 0.45 * PIECE_HEIGHT);

/// Где босс может находиться
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuturismArena {
    Left,
    Right,
    /// Барьер разрушен: весь уровень
    Full,
}

impl FuturismArena {
    /// Соседняя под-арена; у Full соседа нет
    pub fn opposite(&self) -> FuturismArena {
        match self {
            FuturismArena::Left => FuturismArena::Right,
            FuturismArena::Right => FuturismArena::Left,
            FuturismArena::Full => FuturismArena::Full,
        }
    }
}

/// Щиты: четыре внешних и щит ядра
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShieldLimb {
    Top,
    Bottom,
    Left,
    Right,
    Core,
}

impl ShieldLimb {
    pub const OUTER: [ShieldLimb; 4] = [ShieldLimb::Top, ShieldLimb::Bottom, ShieldLimb::Left, ShieldLimb::Right];

    /// Поворот сектора щита ядра, который открывается вместе с этим щитом
    fn core_sector_rotation(&self) -> f32 {
        match self {
            ShieldLimb::Top | ShieldLimb::Core => 0.0,
            ShieldLimb::Bottom => 180.0,
            ShieldLimb::Left => 90.0,
            ShieldLimb::Right => -90.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuturismParts {
    pub core_assembly: PartId,
    pub core_body: PartId,
    pub top_bulb: PartId,
    pub left_bulb: PartId,
    pub bottom_bulb: PartId,
    pub right_bulb: PartId,
    pub core_shield: PartId,
    pub top_shield: PartId,
    pub bottom_shield: PartId,
    pub left_shield: PartId,
    pub right_shield: PartId,
}

impl FuturismParts {
    pub fn build(arena: &mut PartArena, alive: PartId) -> Self {
        let core_assembly = arena.add_composite(Some(alive));
        // Ядро и лампы получают геометрию только в последней стадии
        let core_body = arena.add_part(Some(core_assembly), BoundingLines::new());
        let top_bulb = arena.add_part(Some(core_assembly), BoundingLines::new());
        let left_bulb = arena.add_part(Some(core_assembly), BoundingLines::new());
        arena.set_z_rotation(left_bulb, 90.0);
        let bottom_bulb = arena.add_part(Some(core_assembly), BoundingLines::new());
        arena.set_z_rotation(bottom_bulb, 180.0);
        let right_bulb = arena.add_part(Some(core_assembly), BoundingLines::new());
        arena.set_z_rotation(right_bulb, 270.0);

        // Щит ядра спрятан за внешними щитами
        let core_shield = arena.add_part(Some(alive), BoundingLines::new());

        let top_shield = arena.add_part(Some(alive), vertical_shield_bounds());
        let bottom_shield = arena.add_part(Some(alive), vertical_shield_bounds());
        arena.set_z_rotation(bottom_shield, 180.0);
        let right_shield = arena.add_part(Some(alive), horizontal_shield_bounds());
        let left_shield = arena.add_part(Some(alive), horizontal_shield_bounds());
        arena.set_z_rotation(left_shield, 180.0);

        Self {
            core_assembly,
            core_body,
            top_bulb,
            left_bulb,
            bottom_bulb,
            right_bulb,
            core_shield,
            top_shield,
            bottom_shield,
            left_shield,
            right_shield,
        }
    }

    pub fn bulbs(&self) -> [PartId; 4] {
        [self.top_bulb, self.left_bulb, self.bottom_bulb, self.right_bulb]
    }

    pub fn outer_shields(&self) -> [PartId; 4] {
        [self.top_shield, self.bottom_shield, self.left_shield, self.right_shield]
    }

    pub fn shield(&self, limb: ShieldLimb) -> PartId {
        match limb {
            ShieldLimb::Top => self.top_shield,
            ShieldLimb::Bottom => self.bottom_shield,
            ShieldLimb::Left => self.left_shield,
            ShieldLimb::Right => self.right_shield,
            ShieldLimb::Core => self.core_shield,
        }
    }

    pub fn limb_of(&self, part: PartId) -> Option<ShieldLimb> {
        [
            ShieldLimb::Top,
            ShieldLimb::Bottom,
            ShieldLimb::Left,
            ShieldLimb::Right,
            ShieldLimb::Core,
        ]
        .into_iter()
        .find(|limb| self.shield(*limb) == part)
    }

    /// Внешний щит разрушен: открыть соответствующий сектор щита ядра
    pub fn expose_core_shield_sector(&self, arena: &mut PartArena, limb: ShieldLimb) {
        let mut bounds = arena
            .get(self.core_shield)
            .map(|p| p.bounds().clone())
            .unwrap_or_default();
        add_core_shield_sector(&mut bounds, limb.core_sector_rotation());
        arena.set_bounds(self.core_shield, bounds);
    }

    /// Щит ядра целиком (все четыре сектора)
    pub fn regenerate_core_shield_bounds(&self, arena: &mut PartArena) {
        let mut bounds = BoundingLines::new();
        for limb in ShieldLimb::OUTER {
            add_core_shield_sector(&mut bounds, limb.core_sector_rotation());
        }
        arena.set_bounds(self.core_shield, bounds);
    }

    /// Без щитов: восьмиугольное ядро и четыре лампы по краям
    pub fn regenerate_bounds_for_final_core(&self, arena: &mut PartArena) {
        let pts = [
            Vec2::new(-2.137, 0.340),
            Vec2::new(-0.386, 2.090),
            Vec2::new(0.386, 2.090),
            Vec2::new(2.137, 0.340),
            Vec2::new(2.137, -0.340),
            Vec2::new(0.386, -2.090),
            Vec2::new(-0.386, -2.090),
            Vec2::new(-2.137, -0.340),
        ];
        let mut core = BoundingLines::new();
        for pair in pts.chunks(2) {
            core.add_bound(pair[0], pair[1], outward_normal(pair[0], pair[1]));
        }
        arena.set_bounds(self.core_body, core);

        for bulb in self.bulbs() {
            arena.set_bounds(bulb, bulb_bounds());
        }
    }
}

/// Нормаль слева от направления p0 → p1 (наружу при обходе против часовой)
fn outward_normal(p0: Vec2, p1: Vec2) -> Vec2 {
    Vec2::new(p0.y - p1.y, p1.x - p0.x).normalize_or_zero()
}

fn polyline_bounds(pts: &[Vec2]) -> BoundingLines {
    let mut bounds = BoundingLines::new();
    for w in pts.windows(2) {
        bounds.add_bound(w[0], w[1], outward_normal(w[0], w[1]));
    }
    bounds
}

fn vertical_shield_bounds() -> BoundingLines {
    polyline_bounds(&[
        Vec2::new(-2.159, CORE_SHIELD_CORNER_HEIGHT),
        Vec2::new(-0.818, 4.517),
        Vec2::new(-0.258, 5.0),
        Vec2::new(0.258, 5.0),
        Vec2::new(0.818, 4.517),
        Vec2::new(2.159, CORE_SHIELD_CORNER_HEIGHT),
    ])
}

fn horizontal_shield_bounds() -> BoundingLines {
    polyline_bounds(&[
        Vec2::new(2.159, 1.167),
        Vec2::new(2.909, 1.417),
        Vec2::new(4.4, 1.417),
        Vec2::new(4.4, -1.417),
        Vec2::new(2.909, -1.417),
        Vec2::new(2.159, -1.167),
    ])
}

fn bulb_bounds() -> BoundingLines {
    polyline_bounds(&[
        Vec2::new(-0.386, 2.090),
        Vec2::new(-0.580, 2.219),
        Vec2::new(-0.435, 2.562),
        Vec2::new(0.435, 2.562),
        Vec2::new(0.580, 2.219),
        Vec2::new(0.386, 2.090),
    ])
}

fn add_core_shield_sector(bounds: &mut BoundingLines, rotation: f32) {
    let pts = [
        Vec2::new(-CORE_SHIELD_CORNER_HEIGHT, CORE_SHIELD_CORNER_HEIGHT),
        Vec2::new(-0.435, 2.529),
        Vec2::new(0.435, 2.529),
        Vec2::new(CORE_SHIELD_CORNER_HEIGHT, CORE_SHIELD_CORNER_HEIGHT),
    ];
    for w in pts.windows(2) {
        let p0 = rotate_degrees(w[0], rotation);
        let p1 = rotate_degrees(w[1], rotation);
        bounds.add_bound(p0, p1, outward_normal(p0, p1));
    }
}

// Арены ---------------------------------------------------------------------

fn sub_arena_width() -> f32 {
    LEVEL_SUBARENA_WIDTH_NUM_PIECES * PIECE_WIDTH
}

/// Границы под-арены (для Full - обе арены вместе с колонной барьера)
pub fn arena_confines(arena: FuturismArena) -> Aabb2 {
    let min_y = LEVEL_Y_OUTER_PADDING_NUM_PIECES * PIECE_HEIGHT;
    let max_y = LEVEL_SUBARENA_HEIGHT_NUM_PIECES * PIECE_HEIGHT;
    let left_min_x = LEVEL_X_OUTER_PADDING_NUM_PIECES * PIECE_WIDTH;
    let left_max_x = left_min_x + sub_arena_width();
    let right_min_x = left_max_x + PIECE_WIDTH;
    let right_max_x = right_min_x + sub_arena_width();

    match arena {
        FuturismArena::Left => Aabb2::new(Vec2::new(left_min_x, min_y), Vec2::new(left_max_x, max_y)),
        FuturismArena::Right => Aabb2::new(Vec2::new(right_min_x, min_y), Vec2::new(right_max_x, max_y)),
        FuturismArena::Full => Aabb2::new(Vec2::new(left_min_x, min_y), Vec2::new(right_max_x, max_y)),
    }
}

/// Где может стоять центр босса с полуразмером `half_size`
pub fn boss_position_bounds(arena: FuturismArena, half_size: Vec2) -> Aabb2 {
    let confines = arena_confines(arena);
    let padding = Vec2::new(BLOCK_TO_BOSS_X_PADDING, BLOCK_TO_BOSS_Y_PADDING);
    let min = confines.min + padding + half_size;
    let max = (confines.max - padding - half_size).max(min);
    Aabb2::new(min, max)
}

/// Центр всего уровня (центр колонны барьера)
pub fn level_center() -> Vec2 {
    arena_confines(FuturismArena::Full).center()
}

fn sub_arena_grid(arena: FuturismArena, half_size: Vec2) -> Vec<Vec2> {
    let bounds = boss_position_bounds(arena, half_size);
    let center = bounds.center();
    let mut positions = Vec::with_capacity(9);
    for y in [bounds.max.y, center.y, bounds.min.y] {
        for x in [bounds.min.x, center.x, bounds.max.x] {
            positions.push(Vec2::new(x, y));
        }
    }
    positions
}

/// Девять позиций на под-арену (сверху слева построчно); Full - обе сетки и центр уровня
pub fn arena_move_positions(arena: FuturismArena, half_size: Vec2) -> Vec<Vec2> {
    match arena {
        FuturismArena::Left | FuturismArena::Right => sub_arena_grid(arena, half_size),
        FuturismArena::Full => {
            let mut positions = sub_arena_grid(FuturismArena::Left, half_size);
            positions.extend(sub_arena_grid(FuturismArena::Right, half_size));
            positions.push(level_center());
            positions
        }
    }
}

/// Под-арена, внутри которой лежит точка
pub fn sub_arena_of(point: Vec2) -> Option<FuturismArena> {
    [FuturismArena::Left, FuturismArena::Right]
        .into_iter()
        .find(|arena| arena_confines(*arena).contains(point))
}

/// Ниша с блоками ракет справа от правой под-арены (ряды 11..=17)
pub fn rocket_strategy_portal_zone() -> Aabb2 {
    let min_x = LEVEL_WIDTH - 3.0 * PIECE_WIDTH;
    Aabb2::new(
        Vec2::new(min_x, 11.0 * PIECE_HEIGHT),
        Vec2::new(min_x + 2.0 * PIECE_WIDTH, 18.0 * PIECE_HEIGHT),
    )
}

/// Ниша с ледяными блоками слева от левой под-арены (ряды 15..=21)
pub fn ice_strategy_portal_zone() -> Aabb2 {
    Aabb2::new(
        Vec2::new(0.0, 15.0 * PIECE_HEIGHT),
        Vec2::new(3.0 * PIECE_WIDTH, 22.0 * PIECE_HEIGHT),
    )
}

/// Клетки сетки блоков, целиком лежащие внутри `area`
pub fn piece_cells(area: &Aabb2) -> Vec<Aabb2> {
    let first_col = (area.min.x / PIECE_WIDTH).ceil() as i32;
    let last_col = (area.max.x / PIECE_WIDTH).floor() as i32;
    let first_row = (area.min.y / PIECE_HEIGHT).ceil() as i32;
    let last_row = (area.max.y / PIECE_HEIGHT).floor() as i32;

    let mut cells = Vec::new();
    for row in first_row..last_row {
        for col in first_col..last_col {
            let min = Vec2::new(col as f32 * PIECE_WIDTH, row as f32 * PIECE_HEIGHT);
            cells.push(Aabb2::new(min, min + Vec2::new(PIECE_WIDTH, PIECE_HEIGHT)));
        }
    }
    cells
}

/// Колонна барьера: (x, y верхнего блока, число блоков)
pub fn barrier_column() -> (f32, f32, usize) {
    let left = arena_confines(FuturismArena::Left);
    let x = left.max.x + PIECE_WIDTH / 2.0;
    let count = (LEVEL_SUBARENA_HEIGHT_NUM_PIECES - LEVEL_Y_OUTER_PADDING_NUM_PIECES) as usize;
    (x, left.max.y - PIECE_HEIGHT / 2.0, count)
}

pub fn spawn(level_width: f32, level_height: f32, rng: &mut dyn RandomSource) -> Boss {
    if (level_width - LEVEL_WIDTH).abs() > f32::EPSILON
        || level_height < LEVEL_SUBARENA_HEIGHT_NUM_PIECES * PIECE_HEIGHT
    {
        log_warning(&format!(
            "Futurism boss: level {}x{} does not match sub-arena layout ({} wide)",
            level_width, level_height, LEVEL_WIDTH
        ));
    }

    let mut arena = PartArena::new();
    let roots = BossRoots::build(&mut arena);
    let parts = FuturismParts::build(&mut arena, roots.alive);

    let half = Vec2::new(FULLY_SHIELDED_BOSS_WIDTH, FULLY_SHIELDED_BOSS_HEIGHT) / 2.0;
    let start = sub_arena_grid(FuturismArena::Left, half)
        .first()
        .copied()
        .unwrap_or_else(|| arena_confines(FuturismArena::Left).center());
    arena.translate(roots.alive, start.extend(0.0));

    let mut boss = Boss::assemble(BossKind::Futurism, arena, roots, BossLayout::Futurism(parts.clone()));
    let first = FuturismAi::new(FuturismStage::Stage1, parts, &mut boss, rng);
    boss.set_current_ai_immediately(BossAi::Futurism(first));
    boss
}
