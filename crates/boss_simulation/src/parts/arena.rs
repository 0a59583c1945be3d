//! PartArena - владелец всех частей одного босса.
//!
//! Мировая трансформация не кэшируется: считается проходом по цепочке
//! родителей в момент запроса, поэтому после мутации предка она всегда свежая.

use bevy::prelude::*;

use super::weakpoint::flashing_colour_anim;
use super::{BodyPart, DiminishOutcome, LocalTransform, PartId, PartKind, WeakpointState};
use crate::anim::MultiLerp;
use crate::error::BossError;
use crate::geometry::{Aabb2, BoundingLines, Rgba};
use crate::logger::log_error;

#[derive(Debug, Clone, Default)]
pub struct PartArena {
    parts: Vec<BodyPart>,
}

impl PartArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = PartId> {
        (0..self.parts.len()).map(PartId)
    }

    pub fn get(&self, id: PartId) -> Option<&BodyPart> {
        self.parts.get(id.0)
    }

    fn get_mut(&mut self, id: PartId) -> Option<&mut BodyPart> {
        self.parts.get_mut(id.0)
    }

    fn push(&mut self, part: BodyPart, parent: Option<PartId>) -> PartId {
        let id = PartId(self.parts.len());
        self.parts.push(part);
        if let Some(parent) = parent {
            if let Err(err) = self.add_child(parent, id) {
                log_error(&format!("PartArena: failed to attach {:?}: {}", id, err));
            }
        }
        id
    }

    /// Новый пустой composite (корни, группы)
    pub fn add_composite(&mut self, parent: Option<PartId>) -> PartId {
        self.push(
            BodyPart::new(PartKind::Composite { children: Vec::new() }, BoundingLines::new()),
            parent,
        )
    }

    /// Новая листовая часть с геометрией коллизии
    pub fn add_part(&mut self, parent: Option<PartId>, bounds: BoundingLines) -> PartId {
        self.push(BodyPart::new(PartKind::Basic, bounds), parent)
    }

    /// Прикрепить `child` к composite `parent` (отцепив от прежнего родителя)
    pub fn add_child(&mut self, parent: PartId, child: PartId) -> Result<(), BossError> {
        if self.get(child).is_none() {
            return Err(BossError::UnknownPart(child));
        }
        match self.get(parent) {
            None => return Err(BossError::UnknownPart(parent)),
            Some(p) if !p.is_composite() => return Err(BossError::NotAComposite(parent)),
            _ => {}
        }
        if self.is_or_contains(child, parent) {
            return Err(BossError::WouldCreateCycle { parent, child });
        }

        if let Some(old_parent) = self.parts[child.0].parent {
            self.remove_child(old_parent, child);
        }
        if let PartKind::Composite { children } = &mut self.parts[parent.0].kind {
            children.push(child);
        }
        self.parts[child.0].parent = Some(parent);
        Ok(())
    }

    /// Отцепить ребёнка; `false` если он не был ребёнком `parent`
    pub fn remove_child(&mut self, parent: PartId, child: PartId) -> bool {
        let removed = match self.get_mut(parent).map(|p| &mut p.kind) {
            Some(PartKind::Composite { children }) => {
                let before = children.len();
                children.retain(|c| *c != child);
                before != children.len()
            }
            _ => false,
        };
        if removed {
            if let Some(part) = self.get_mut(child) {
                part.parent = None;
            }
        }
        removed
    }

    pub fn search_for_parent(&self, child: PartId) -> Option<PartId> {
        self.get(child).and_then(|p| p.parent)
    }

    pub fn children(&self, id: PartId) -> &[PartId] {
        self.get(id).map(|p| p.children()).unwrap_or(&[])
    }

    /// `id == other` или `other` лежит в поддереве `id`
    pub fn is_or_contains(&self, id: PartId, other: PartId) -> bool {
        let mut curr = Some(other);
        while let Some(c) = curr {
            if c == id {
                return true;
            }
            curr = self.search_for_parent(c);
        }
        false
    }

    // Трансформации --------------------------------------------------------

    pub fn translate(&mut self, id: PartId, delta: Vec3) {
        if let Some(part) = self.get_mut(id) {
            part.local.translation += delta;
        }
    }

    pub fn set_translation(&mut self, id: PartId, translation: Vec3) {
        if let Some(part) = self.get_mut(id) {
            part.local.translation = translation;
        }
    }

    pub fn translation(&self, id: PartId) -> Vec3 {
        self.get(id).map(|p| p.local.translation).unwrap_or(Vec3::ZERO)
    }

    pub fn translation_2d(&self, id: PartId) -> Vec2 {
        self.translation(id).truncate()
    }

    /// Добавить поворот (градусы) вокруг осей x/y/z
    pub fn rotate(&mut self, id: PartId, delta_deg: Vec3) {
        if let Some(part) = self.get_mut(id) {
            part.local.rotation_deg += delta_deg;
        }
    }

    pub fn rotate_z(&mut self, id: PartId, delta_deg: f32) {
        self.rotate(id, Vec3::new(0.0, 0.0, delta_deg));
    }

    pub fn set_z_rotation(&mut self, id: PartId, degrees: f32) {
        if let Some(part) = self.get_mut(id) {
            part.local.rotation_deg.z = degrees;
        }
    }

    pub fn set_y_rotation(&mut self, id: PartId, degrees: f32) {
        if let Some(part) = self.get_mut(id) {
            part.local.rotation_deg.y = degrees;
        }
    }

    pub fn rotation(&self, id: PartId) -> Vec3 {
        self.get(id).map(|p| p.local.rotation_deg).unwrap_or(Vec3::ZERO)
    }

    /// Мировая матрица: композиция локальных матриц от корня
    pub fn world_transform(&self, id: PartId) -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        let mut curr = Some(id);
        while let Some(c) = curr {
            match self.get(c) {
                Some(part) => {
                    matrix = part.local_matrix() * matrix;
                    curr = part.parent;
                }
                None => break,
            }
        }
        matrix
    }

    pub fn world_position(&self, id: PartId) -> Vec3 {
        self.world_transform(id).transform_point3(Vec3::ZERO)
    }

    pub fn world_position_2d(&self, id: PartId) -> Vec2 {
        self.world_position(id).truncate()
    }

    /// AABB в мире; для composite - объединение детей
    pub fn world_aabb(&self, id: PartId) -> Option<Aabb2> {
        let part = self.get(id)?;
        match &part.kind {
            PartKind::Composite { children } => children
                .iter()
                .filter_map(|c| self.world_aabb(*c))
                .reduce(|a, b| a.union(&b)),
            _ => part.bounds.world_aabb(&self.world_transform(id)),
        }
    }

    /// Заменить геометрию коллизии (части "проявляются" на поздних стадиях)
    pub fn set_bounds(&mut self, id: PartId, bounds: BoundingLines) {
        if let Some(part) = self.get_mut(id) {
            part.bounds = bounds;
        }
    }

    // Анимации -------------------------------------------------------------

    pub fn animate_translation(&mut self, id: PartId, anim: MultiLerp<Vec3>) {
        if let Some(part) = self.get_mut(id) {
            part.translation_anim = Some(anim);
        }
    }

    pub fn animate_rotation(&mut self, id: PartId, anim: MultiLerp<Vec3>) {
        if let Some(part) = self.get_mut(id) {
            part.rotation_anim = Some(anim);
        }
    }

    pub fn clear_transform_anims(&mut self, id: PartId) {
        if let Some(part) = self.get_mut(id) {
            part.translation_anim = None;
            part.rotation_anim = None;
        }
    }

    pub fn is_translation_animating(&self, id: PartId) -> bool {
        self.get(id)
            .and_then(|p| p.translation_anim.as_ref())
            .map(|a| !a.is_finished())
            .unwrap_or(false)
    }

    pub fn is_rotation_animating(&self, id: PartId) -> bool {
        self.get(id)
            .and_then(|p| p.rotation_anim.as_ref())
            .map(|a| !a.is_finished())
            .unwrap_or(false)
    }

    /// Цвет composite раздаётся всем листьям поддерева
    pub fn set_colour(&mut self, id: PartId, colour: Rgba) {
        for leaf in self.leaves(id) {
            if let Some(part) = self.get_mut(leaf) {
                part.colour = colour;
                part.colour_anim = None;
            }
        }
    }

    pub fn animate_colour(&mut self, id: PartId, anim: MultiLerp<Rgba>) {
        for leaf in self.leaves(id) {
            if let Some(part) = self.get_mut(leaf) {
                part.colour_anim = Some(anim.clone());
            }
        }
    }

    pub fn colour(&self, id: PartId) -> Rgba {
        self.get(id).map(|p| p.colour()).unwrap_or_default()
    }

    pub fn is_colour_animating(&self, id: PartId) -> bool {
        self.leaves(id).into_iter().any(|leaf| {
            self.get(leaf)
                .and_then(|p| p.colour_anim.as_ref())
                .map(|a| !a.is_finished())
                .unwrap_or(false)
        })
    }

    /// Все не-composite узлы поддерева (включая сам узел если он лист)
    pub fn leaves(&self, id: PartId) -> Vec<PartId> {
        let mut result = Vec::new();
        let mut stack = vec![id];
        while let Some(curr) = stack.pop() {
            match self.get(curr) {
                Some(part) if part.is_composite() => stack.extend(part.children().iter().rev()),
                Some(_) => result.push(curr),
                None => {}
            }
        }
        result
    }

    // Разрушение -----------------------------------------------------------

    pub fn is_destroyed(&self, id: PartId) -> bool {
        self.get(id).map(|p| p.destroyed).unwrap_or(true)
    }

    /// true → можно сколько угодно раз (composite помечает всё поддерево);
    /// false для уже уничтоженной части - ошибка программиста.
    pub fn set_destroyed(&mut self, id: PartId, destroyed: bool) {
        if !destroyed {
            debug_assert!(!self.is_destroyed(id), "part {:?} cannot be un-destroyed", id);
            return;
        }

        let mut stack = vec![id];
        while let Some(curr) = stack.pop() {
            if let Some(part) = self.get_mut(curr) {
                part.destroyed = true;
                if let PartKind::Weakpoint(state) = &mut part.kind {
                    state.invulnerable_timer = 0.0;
                }
                stack.extend(part.children().iter().copied());
            }
        }
    }

    /// Все дети composite уничтожены (пустой composite → true)
    pub fn all_children_destroyed(&self, id: PartId) -> bool {
        self.children(id).iter().all(|c| self.is_destroyed(*c))
    }

    // Weakpoints -----------------------------------------------------------

    pub fn weakpoint(&self, id: PartId) -> Option<&WeakpointState> {
        self.get(id).and_then(|p| p.weakpoint())
    }

    pub fn is_weakpoint(&self, id: PartId) -> bool {
        self.weakpoint(id).is_some()
    }

    /// Повышение роли листа до weakpoint на том же месте дерева
    pub fn convert_to_weakpoint(
        &mut self,
        id: PartId,
        life_points: f32,
        dmg_on_ball_hit: f32,
    ) -> Result<(), BossError> {
        let part = self.get_mut(id).ok_or(BossError::UnknownPart(id))?;
        if part.destroyed {
            return Err(BossError::AlreadyDead(id));
        }
        match part.kind {
            PartKind::Weakpoint(_) => Err(BossError::AlreadyWeakpoint(id)),
            PartKind::Composite { .. } => Err(BossError::CompositeCannotBeWeakpoint(id)),
            PartKind::Basic => {
                part.kind = PartKind::Weakpoint(WeakpointState::new(life_points, dmg_on_ball_hit));
                part.colour_anim = Some(flashing_colour_anim());
                Ok(())
            }
        }
    }

    /// Урон по weakpoint. Для не-weakpoint частей - `Ignored`
    pub fn diminish(&mut self, id: PartId, amount: f32) -> DiminishOutcome {
        let Some(part) = self.get_mut(id) else {
            return DiminishOutcome::Ignored;
        };
        let already_destroyed = part.destroyed;
        let outcome = match &mut part.kind {
            PartKind::Weakpoint(state) => state.diminish(amount, already_destroyed),
            _ => DiminishOutcome::Ignored,
        };
        if outcome == DiminishOutcome::Destroyed {
            part.destroyed = true;
            part.colour_anim = None;
        }
        outcome
    }

    /// Длительность окна неуязвимости конкретного weakpoint (задаётся архетипом)
    pub fn set_invulnerable_time(&mut self, id: PartId, secs: f32) {
        if let Some(PartKind::Weakpoint(state)) = self.get_mut(id).map(|p| &mut p.kind) {
            state.total_invulnerable_time = secs.max(0.0);
        }
    }

    /// Процент жизни: weakpoint по HP, обычная часть 1/0 по флагу
    pub fn life_percentage(&self, id: PartId) -> f32 {
        match self.get(id) {
            Some(part) => match part.weakpoint() {
                Some(state) => state.life_percentage(),
                None if part.destroyed => 0.0,
                None => 1.0,
            },
            None => 0.0,
        }
    }

    // Перенос между поддеревьями --------------------------------------------

    /// Перевесить часть под `new_parent`, сохранив её мировую трансформацию.
    /// Анимации смещения/поворота "запекаются" в локальную трансформацию.
    pub fn reparent_preserving_world(&mut self, id: PartId, new_parent: PartId) -> Result<(), BossError> {
        let world = self.world_transform(id);
        let parent_world = self.world_transform(new_parent);
        self.add_child(new_parent, id)?;

        let local = LocalTransform::from_matrix(&(parent_world.inverse() * world));
        if let Some(part) = self.get_mut(id) {
            part.local = local;
            part.translation_anim = None;
            part.rotation_anim = None;
        }
        Ok(())
    }

    // Тик ------------------------------------------------------------------

    /// Продвигает все анимации и счётчики неуязвимости
    pub fn tick(&mut self, dt: f32) {
        for part in self.parts.iter_mut() {
            if let Some(anim) = part.translation_anim.as_mut() {
                anim.tick(dt);
            }
            if let Some(anim) = part.rotation_anim.as_mut() {
                anim.tick(dt);
            }
            if let Some(anim) = part.colour_anim.as_mut() {
                anim.tick(dt);
            }
            if let PartKind::Weakpoint(state) = &mut part.kind {
                state.tick(dt);
                // Живой weakpoint снова мигает, когда разовая анимация цвета закончилась
                let finished = part.colour_anim.as_ref().map(|a| a.is_finished()).unwrap_or(true);
                if !part.destroyed && finished {
                    part.colour_anim = Some(flashing_colour_anim());
                }
            }
        }
    }
}
