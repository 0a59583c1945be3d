//! 2D геометрия частей босса: AABB, bounding lines, цвет, повороты.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box в плоскости уровня
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb2 {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb2 {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_center(center: Vec2, half_extents: Vec2) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    pub fn from_points(points: impl IntoIterator<Item = Vec2>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { min, max })
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn union(&self, other: &Aabb2) -> Aabb2 {
        Aabb2 {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn translated(&self, delta: Vec2) -> Aabb2 {
        Aabb2 {
            min: self.min + delta,
            max: self.max + delta,
        }
    }

    /// Расширение на `amount` с каждой стороны
    pub fn padded(&self, amount: Vec2) -> Aabb2 {
        Aabb2::new(self.min - amount, self.max + amount)
    }

    pub fn intersects(&self, other: &Aabb2) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    /// Пересечение с кругом (взрыв мины)
    pub fn intersects_circle(&self, center: Vec2, radius: f32) -> bool {
        let closest = center.clamp(self.min, self.max);
        closest.distance_squared(center) <= radius * radius
    }

    /// Дистанция вдоль луча до выхода из бокса; `None` если начало снаружи
    pub fn ray_exit_distance(&self, origin: Vec2, dir: Vec2) -> Option<f32> {
        if !self.contains(origin) {
            return None;
        }
        let mut exit = f32::INFINITY;
        for i in 0..2 {
            if dir[i] > f32::EPSILON {
                exit = exit.min((self.max[i] - origin[i]) / dir[i]);
            } else if dir[i] < -f32::EPSILON {
                exit = exit.min((self.min[i] - origin[i]) / dir[i]);
            }
        }
        exit.is_finite().then_some(exit)
    }
}

/// Отрезок границы части + внешняя нормаль
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundLine {
    pub p0: Vec2,
    pub p1: Vec2,
    pub normal: Vec2,
}

/// Набор отрезков коллизии части в её локальных координатах
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingLines {
    pub lines: Vec<BoundLine>,
}

impl BoundingLines {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_bound(&mut self, p0: Vec2, p1: Vec2, normal: Vec2) {
        self.lines.push(BoundLine {
            p0,
            p1,
            normal: normal.normalize_or_zero(),
        });
    }

    /// Ломаная через `points`; нормаль каждого отрезка (dy, -dx)
    pub fn polyline(points: &[Vec2]) -> Self {
        let mut bounds = Self::new();
        for pair in points.windows(2) {
            let (p0, p1) = (pair[0], pair[1]);
            bounds.add_bound(p0, p1, Vec2::new(p1.y - p0.y, p0.x - p1.x));
        }
        bounds
    }

    /// Прямоугольник с центром в начале координат
    pub fn rect(width: f32, height: f32) -> Self {
        let hw = width / 2.0;
        let hh = height / 2.0;
        Self::rect_from_corners(Vec2::new(-hw, -hh), Vec2::new(hw, hh))
    }

    pub fn rect_from_corners(min: Vec2, max: Vec2) -> Self {
        let mut bounds = Self::new();
        bounds.add_bound(Vec2::new(min.x, max.y), Vec2::new(max.x, max.y), Vec2::Y); // Top
        bounds.add_bound(Vec2::new(min.x, min.y), Vec2::new(max.x, min.y), Vec2::NEG_Y); // Bottom
        bounds.add_bound(Vec2::new(min.x, min.y), Vec2::new(min.x, max.y), Vec2::NEG_X); // Left
        bounds.add_bound(Vec2::new(max.x, min.y), Vec2::new(max.x, max.y), Vec2::X); // Right
        bounds
    }

    /// Ромб (глаз classical босса, лампы futurism)
    pub fn diamond(width: f32, height: f32) -> Self {
        let hw = width / 2.0;
        let hh = height / 2.0;
        let top = Vec2::new(0.0, hh);
        let bottom = Vec2::new(0.0, -hh);
        let left = Vec2::new(-hw, 0.0);
        let right = Vec2::new(hw, 0.0);

        let mut bounds = Self::new();
        bounds.add_bound(left, top, Vec2::new(-hh, hw));
        bounds.add_bound(top, right, Vec2::new(hh, hw));
        bounds.add_bound(right, bottom, Vec2::new(hh, -hw));
        bounds.add_bound(bottom, left, Vec2::new(-hh, -hw));
        bounds
    }

    /// Треугольник остриём вверх: tip на `tip_y`, основание на `base_y`
    pub fn spike_up(width: f32, tip_y: f32, base_y: f32) -> Self {
        let hw = width / 2.0;
        let tip = Vec2::new(0.0, tip_y);
        let mut bounds = Self::new();
        bounds.add_bound(tip, Vec2::new(-hw, base_y), Vec2::new(base_y - tip_y, hw));
        bounds.add_bound(tip, Vec2::new(hw, base_y), Vec2::new(tip_y - base_y, hw));
        bounds
    }

    /// Треугольник остриём вниз
    pub fn spike_down(width: f32, tip_y: f32, base_y: f32) -> Self {
        let hw = width / 2.0;
        let tip = Vec2::new(0.0, tip_y);
        let mut bounds = Self::new();
        bounds.add_bound(tip, Vec2::new(-hw, base_y), Vec2::new(tip_y - base_y, -hw));
        bounds.add_bound(tip, Vec2::new(hw, base_y), Vec2::new(base_y - tip_y, -hw));
        bounds
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Зеркалирование по X (левая/правая половины одного меша)
    pub fn reflect_x(&mut self) {
        for line in self.lines.iter_mut() {
            line.p0.x = -line.p0.x;
            line.p1.x = -line.p1.x;
            line.normal.x = -line.normal.x;
        }
    }

    pub fn translate(&mut self, delta: Vec2) {
        for line in self.lines.iter_mut() {
            line.p0 += delta;
            line.p1 += delta;
        }
    }

    pub fn local_aabb(&self) -> Option<Aabb2> {
        Aabb2::from_points(self.lines.iter().flat_map(|l| [l.p0, l.p1]))
    }

    /// AABB после применения мировой матрицы части
    pub fn world_aabb(&self, world: &Mat4) -> Option<Aabb2> {
        Aabb2::from_points(self.lines.iter().flat_map(|l| {
            [l.p0, l.p1].map(|p| world.transform_point3(p.extend(0.0)).truncate())
        }))
    }
}

/// RGBA цвет части (0..1)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::new(1.0, 1.0, 1.0, 1.0);
    pub const RED: Rgba = Rgba::new(1.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT_WHITE: Rgba = Rgba::new(1.0, 1.0, 1.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::WHITE
    }
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Поворот вектора на угол в градусах (против часовой)
pub fn rotate_degrees(v: Vec2, degrees: f32) -> Vec2 {
    Vec2::from_angle(degrees.to_radians()).rotate(v)
}

/// Знаковый угол (градусы) от `from` к `to`
pub fn signed_angle_degrees(from: Vec2, to: Vec2) -> f32 {
    from.perp_dot(to).atan2(from.dot(to)).to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_union_and_intersection() {
        let a = Aabb2::new(Vec2::new(0.0, 0.0), Vec2::new(2.0, 2.0));
        let b = Aabb2::new(Vec2::new(1.0, 1.0), Vec2::new(3.0, 4.0));
        let c = Aabb2::new(Vec2::new(5.0, 5.0), Vec2::new(6.0, 6.0));

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        let u = a.union(&c);
        assert_eq!(u.min, Vec2::ZERO);
        assert_eq!(u.max, Vec2::new(6.0, 6.0));
    }

    #[test]
    fn test_rect_bounds_aabb() {
        let bounds = BoundingLines::rect(4.0, 2.0);
        let aabb = bounds.local_aabb().unwrap();
        assert_eq!(aabb.min, Vec2::new(-2.0, -1.0));
        assert_eq!(aabb.max, Vec2::new(2.0, 1.0));
    }

    #[test]
    fn test_world_aabb_follows_translation() {
        let bounds = BoundingLines::diamond(2.0, 1.0);
        let world = Mat4::from_translation(Vec3::new(10.0, -3.0, 0.0));
        let aabb = bounds.world_aabb(&world).unwrap();
        assert!((aabb.center() - Vec2::new(10.0, -3.0)).length() < 1e-5);
        assert!((aabb.size() - Vec2::new(2.0, 1.0)).length() < 1e-5);
    }

    #[test]
    fn test_reflect_x_mirrors_points() {
        let mut bounds = BoundingLines::rect_from_corners(Vec2::new(1.0, 0.0), Vec2::new(3.0, 1.0));
        bounds.reflect_x();
        let aabb = bounds.local_aabb().unwrap();
        assert_eq!(aabb.min.x, -3.0);
        assert_eq!(aabb.max.x, -1.0);
    }

    #[test]
    fn test_padded_grows_every_side() {
        let a = Aabb2::new(Vec2::new(1.0, 1.0), Vec2::new(2.0, 3.0)).padded(Vec2::new(0.5, 1.0));
        assert_eq!(a.min, Vec2::new(0.5, 0.0));
        assert_eq!(a.max, Vec2::new(2.5, 4.0));
    }

    #[test]
    fn test_circle_touches_box_edge() {
        let a = Aabb2::new(Vec2::ZERO, Vec2::new(2.0, 2.0));
        assert!(a.intersects_circle(Vec2::new(3.0, 1.0), 1.0), "касание справа");
        assert!(a.intersects_circle(Vec2::new(1.0, 1.0), 0.1), "центр внутри");
        assert!(!a.intersects_circle(Vec2::new(3.0, 3.0), 1.0), "угол дальше радиуса");
    }

    #[test]
    fn test_ray_exit_distance() {
        let a = Aabb2::new(Vec2::ZERO, Vec2::new(10.0, 4.0));
        let t = a.ray_exit_distance(Vec2::new(2.0, 2.0), Vec2::X).unwrap();
        assert!((t - 8.0).abs() < 1e-5);
        let diag = a.ray_exit_distance(Vec2::new(2.0, 2.0), Vec2::new(1.0, 1.0).normalize()).unwrap();
        assert!((diag - 2.0 * 2f32.sqrt()).abs() < 1e-4, "выход через верх");
        assert_eq!(a.ray_exit_distance(Vec2::new(-1.0, 2.0), Vec2::X), None);
    }

    #[test]
    fn test_polyline_segments() {
        let bounds = BoundingLines::polyline(&[Vec2::ZERO, Vec2::X, Vec2::new(1.0, 1.0)]);
        assert_eq!(bounds.lines.len(), 2);
        assert_eq!(bounds.lines[0].normal, Vec2::NEG_Y);
        assert_eq!(bounds.lines[1].normal, Vec2::X);
    }

    #[test]
    fn test_rotate_degrees() {
        let v = rotate_degrees(Vec2::X, 90.0);
        assert!((v - Vec2::Y).length() < 1e-5);
        assert!((signed_angle_degrees(Vec2::X, Vec2::Y) - 90.0).abs() < 1e-3);
    }
}
