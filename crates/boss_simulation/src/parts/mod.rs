//! Части тела босса: arena с устойчивыми PartId вместо указателей.
//!
//! Дерево у каждого босса одно: root → {alive, dead}. Части не удаляются,
//! "смерть" части - перенос из alive-поддерева в dead-поддерево.

use bevy::math::EulerRot;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::anim::MultiLerp;
use crate::geometry::{BoundingLines, Rgba};

pub mod arena;
pub mod weakpoint;


pub use arena::PartArena;
pub use weakpoint::{DiminishOutcome, WeakpointState, INVULNERABLE_TIME_IN_SECS};

/// Устойчивый handle части (индекс в arena, не переиспользуется)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartId(pub usize);

/// Локальная трансформация: смещение + повороты по осям (градусы)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LocalTransform {
    pub translation: Vec3,
    pub rotation_deg: Vec3,
}

impl LocalTransform {
    /// T · Rz · Ry · Rx с учётом анимационных смещений
    pub fn matrix(&self, extra_translation: Vec3, extra_rotation_deg: Vec3) -> Mat4 {
        let rot = self.rotation_deg + extra_rotation_deg;
        Mat4::from_translation(self.translation + extra_translation)
            * Mat4::from_rotation_z(rot.z.to_radians())
            * Mat4::from_rotation_y(rot.y.to_radians())
            * Mat4::from_rotation_x(rot.x.to_radians())
    }

    /// Обратная операция к `matrix` (без масштаба)
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let (_, rotation, translation) = matrix.to_scale_rotation_translation();
        let (z, y, x) = rotation.to_euler(EulerRot::ZYX);
        Self {
            translation,
            rotation_deg: Vec3::new(x.to_degrees(), y.to_degrees(), z.to_degrees()),
        }
    }
}

/// Роль узла в дереве
#[derive(Debug, Clone, PartialEq)]
pub enum PartKind {
    Basic,
    Composite { children: Vec<PartId> },
    Weakpoint(WeakpointState),
}

/// Узел дерева частей
#[derive(Debug, Clone)]
pub struct BodyPart {
    pub(crate) parent: Option<PartId>,
    pub(crate) kind: PartKind,
    pub(crate) local: LocalTransform,
    pub(crate) bounds: BoundingLines,
    pub(crate) colour: Rgba,
    pub(crate) colour_anim: Option<MultiLerp<Rgba>>,
    pub(crate) translation_anim: Option<MultiLerp<Vec3>>,
    pub(crate) rotation_anim: Option<MultiLerp<Vec3>>,
    pub(crate) destroyed: bool,
}

impl BodyPart {
    pub(crate) fn new(kind: PartKind, bounds: BoundingLines) -> Self {
        Self {
            parent: None,
            kind,
            local: LocalTransform::default(),
            bounds,
            colour: Rgba::WHITE,
            colour_anim: None,
            translation_anim: None,
            rotation_anim: None,
            destroyed: false,
        }
    }

    pub fn parent(&self) -> Option<PartId> {
        self.parent
    }

    pub fn kind(&self) -> &PartKind {
        &self.kind
    }

    pub fn local_transform(&self) -> &LocalTransform {
        &self.local
    }

    pub fn bounds(&self) -> &BoundingLines {
        &self.bounds
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.kind, PartKind::Composite { .. })
    }

    pub fn weakpoint(&self) -> Option<&WeakpointState> {
        match &self.kind {
            PartKind::Weakpoint(state) => Some(state),
            _ => None,
        }
    }

    pub fn children(&self) -> &[PartId] {
        match &self.kind {
            PartKind::Composite { children } => children,
            _ => &[],
        }
    }

    /// Текущий цвет (анимация имеет приоритет)
    pub fn colour(&self) -> Rgba {
        self.colour_anim.as_ref().map(|a| a.value()).unwrap_or(self.colour)
    }

    pub(crate) fn anim_translation(&self) -> Vec3 {
        self.translation_anim.as_ref().map(|a| a.value()).unwrap_or(Vec3::ZERO)
    }

    pub(crate) fn anim_rotation(&self) -> Vec3 {
        self.rotation_anim.as_ref().map(|a| a.value()).unwrap_or(Vec3::ZERO)
    }

    /// Локальная матрица с анимациями
    pub fn local_matrix(&self) -> Mat4 {
        self.local.matrix(self.anim_translation(), self.anim_rotation())
    }
}
