//! Boss - владелец arena частей и текущего/следующего AI-состояния.
//!
//! Дерево: root → {dead, alive}. AI-стадия получает `&mut Boss` на время
//! update: она временно вынимается из `curr_ai`, поэтому переход на новую
//! стадию возможен только через `set_next_ai_state` (подмена после update).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ai::{BossAi, BossEnv, DamageChannel};
use crate::archetypes::{classical, deco, futurism, gothic, nouveau};
use crate::context::ProjectileKind;
use crate::effects::EffectSink;
use crate::error::BossError;
use crate::geometry::Aabb2;
use crate::logger::{log, log_error, log_info};
use crate::parts::{DiminishOutcome, PartArena, PartId};
use crate::random::RandomSource;

pub mod anims;

#[cfg(test)]
mod boss_tests;

/// Архетип босса (по "стилю" мира)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BossKind {
    Classical,
    GothicRomantic,
    Deco,
    Futurism,
    Nouveau,
}

impl BossKind {
    pub const ALL: [BossKind; 5] = [
        BossKind::Classical,
        BossKind::GothicRomantic,
        BossKind::Deco,
        BossKind::Futurism,
        BossKind::Nouveau,
    ];

    /// Размер уровня (ширина, высота), под который сделан босс
    pub fn default_level_size(&self) -> (f32, f32) {
        match self {
            BossKind::Classical => (52.5, 32.0),
            BossKind::GothicRomantic => (52.5, 31.0),
            BossKind::Deco => (52.5, 36.0),
            BossKind::Futurism => (67.5, 36.0),
            BossKind::Nouveau => (62.5, 35.0),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BossKind::Classical => "Classical",
            BossKind::GothicRomantic => "GothicRomantic",
            BossKind::Deco => "Deco",
            BossKind::Futurism => "Futurism",
            BossKind::Nouveau => "Nouveau",
        }
    }
}

/// Три именованных корня дерева
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BossRoots {
    pub root: PartId,
    pub dead: PartId,
    pub alive: PartId,
}

impl BossRoots {
    /// Создаёт root → {dead, alive} в пустой arena
    pub fn build(arena: &mut PartArena) -> Self {
        let root = arena.add_composite(None);
        let dead = arena.add_composite(Some(root));
        let alive = arena.add_composite(Some(root));
        Self { root, dead, alive }
    }
}

/// Именованные handles частей конкретного архетипа
#[derive(Debug, Clone)]
pub enum BossLayout {
    Classical(classical::ClassicalParts),
    Gothic(gothic::GothicParts),
    Deco(deco::DecoParts),
    Futurism(futurism::FuturismParts),
    Nouveau(nouveau::NouveauParts),
}

/// Срез состояния для presentation/логов/snapshot'ов
#[derive(Component, Debug, Clone, PartialEq)]
pub struct BossStatus {
    pub kind: BossKind,
    pub stage: &'static str,
    pub state: &'static str,
    pub life_percent: f32,
    pub position: Vec2,
    pub stage_changes: u32,
    pub finished: bool,
}

#[derive(Debug)]
pub struct Boss {
    kind: BossKind,
    parts: PartArena,
    roots: BossRoots,
    layout: BossLayout,
    curr_ai: Option<BossAi>,
    next_ai: Option<BossAi>,
    stage_changes: u32,
}

impl Boss {
    /// Собрать босса из готового дерева (AI ставится отдельно)
    pub fn assemble(kind: BossKind, parts: PartArena, roots: BossRoots, layout: BossLayout) -> Self {
        Self {
            kind,
            parts,
            roots,
            layout,
            curr_ai: None,
            next_ai: None,
            stage_changes: 0,
        }
    }

    /// Построить босса нужного архетипа в уровне заданного размера
    pub fn spawn(kind: BossKind, level_width: f32, level_height: f32, rng: &mut dyn RandomSource) -> Self {
        let boss = match kind {
            BossKind::Classical => classical::spawn(level_width, level_height, rng),
            BossKind::GothicRomantic => gothic::spawn(level_width, level_height, rng),
            BossKind::Deco => deco::spawn(level_width, level_height, rng),
            BossKind::Futurism => futurism::spawn(level_width, level_height, rng),
            BossKind::Nouveau => nouveau::spawn(level_width, level_height, rng),
        };
        log_info(&format!(
            "Boss spawned: {} ({} parts) at {:?}, stage {}",
            kind.name(),
            boss.parts.len(),
            boss.position(),
            boss.stage_name()
        ));
        boss
    }

    pub fn kind(&self) -> BossKind {
        self.kind
    }

    pub fn parts(&self) -> &PartArena {
        &self.parts
    }

    pub fn parts_mut(&mut self) -> &mut PartArena {
        &mut self.parts
    }

    pub fn roots(&self) -> BossRoots {
        self.roots
    }

    pub fn root(&self) -> PartId {
        self.roots.root
    }

    pub fn alive_root(&self) -> PartId {
        self.roots.alive
    }

    pub fn dead_root(&self) -> PartId {
        self.roots.dead
    }

    pub fn layout(&self) -> &BossLayout {
        &self.layout
    }

    pub fn stage_changes(&self) -> u32 {
        self.stage_changes
    }

    /// Позиция босса в уровне = мировой центр alive-поддерева
    pub fn position(&self) -> Vec2 {
        self.parts.world_position_2d(self.roots.alive)
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.parts.translate(self.roots.alive, delta.extend(0.0));
    }

    /// AABB живой части босса
    pub fn alive_aabb(&self) -> Option<Aabb2> {
        self.parts.world_aabb(self.roots.alive)
    }

    /// Часть лежит в alive-поддереве и не уничтожена
    pub fn is_part_alive(&self, id: PartId) -> bool {
        self.parts.is_or_contains(self.roots.alive, id) && !self.parts.is_destroyed(id)
    }

    pub fn is_part_dead(&self, id: PartId) -> bool {
        self.parts.is_or_contains(self.roots.dead, id)
    }

    // Смена ролей частей ---------------------------------------------------

    /// Повысить живую часть до weakpoint (та же ячейка, та же геометрия)
    pub fn convert_alive_part_to_weakpoint(
        &mut self,
        id: PartId,
        life_points: f32,
        dmg_on_ball_hit: f32,
    ) -> Result<(), BossError> {
        if self.parts.get(id).is_none() {
            return Err(BossError::UnknownPart(id));
        }
        if !self.parts.is_or_contains(self.roots.alive, id) {
            return Err(BossError::NotAlive(id));
        }
        self.parts.convert_to_weakpoint(id, life_points, dmg_on_ball_hit)?;
        log(&format!(
            "Boss {}: part {:?} is now a weakpoint ({} HP, {} per ball hit)",
            self.kind.name(),
            id,
            life_points,
            dmg_on_ball_hit
        ));
        Ok(())
    }

    /// Перенести часть из alive в dead, сохранив мировую трансформацию
    pub fn convert_alive_part_to_dead_part(&mut self, id: PartId) -> Result<(), BossError> {
        if self.parts.get(id).is_none() {
            return Err(BossError::UnknownPart(id));
        }
        if self.parts.is_or_contains(self.roots.dead, id) {
            return Err(BossError::AlreadyDead(id));
        }
        if !self.parts.is_or_contains(self.roots.alive, id) || id == self.roots.alive {
            return Err(BossError::NotAlive(id));
        }
        self.parts.reparent_preserving_world(id, self.roots.dead)?;
        log(&format!("Boss {}: part {:?} moved to dead parts", self.kind.name(), id));
        Ok(())
    }

    /// Конвертация, ошибка которой логируется и пропускается
    pub(crate) fn make_weakpoint_or_log(&mut self, id: PartId, life_points: f32, dmg_on_ball_hit: f32) {
        if let Err(err) = self.convert_alive_part_to_weakpoint(id, life_points, dmg_on_ball_hit) {
            log_error(&format!("Boss {}: weakpoint conversion skipped: {}", self.kind.name(), err));
        }
    }

    pub(crate) fn kill_part_or_log(&mut self, id: PartId) {
        if let Err(err) = self.convert_alive_part_to_dead_part(id) {
            log_error(&format!("Boss {}: dead-part conversion skipped: {}", self.kind.name(), err));
        }
    }

    // Урон ----------------------------------------------------------------

    /// Урон по weakpoint; Hurt → мигание неуязвимости, Hurt/Destroyed → announce_boss_hurt
    pub fn diminish_weakpoint(&mut self, id: PartId, amount: f32, sink: &mut dyn EffectSink) -> DiminishOutcome {
        let outcome = self.parts.diminish(id, amount);
        self.after_damage(id, outcome, sink, true);
        outcome
    }

    pub fn ball_hit_weakpoint(&mut self, id: PartId, sink: &mut dyn EffectSink) -> DiminishOutcome {
        let Some(dmg) = self.parts.weakpoint(id).map(|w| w.dmg_on_ball_hit) else {
            return DiminishOutcome::Ignored;
        };
        self.diminish_weakpoint(id, dmg, sink)
    }

    pub fn projectile_hit_weakpoint(
        &mut self,
        id: PartId,
        kind: ProjectileKind,
        sink: &mut dyn EffectSink,
    ) -> DiminishOutcome {
        match kind.weakpoint_damage() {
            Some(dmg) => self.diminish_weakpoint(id, dmg, sink),
            None => DiminishOutcome::Ignored,
        }
    }

    /// Луч: `dt × dps` за тик. Как и прочий урон, попадание запускает неуязвимость,
    /// так что луч режет HP примерно раз в INVULNERABLE_TIME_IN_SECS
    pub fn beam_hit_weakpoint(
        &mut self,
        id: PartId,
        dt: f32,
        damage_per_second: f32,
        sink: &mut dyn EffectSink,
    ) -> DiminishOutcome {
        let outcome = self.parts.diminish(id, dt * damage_per_second);
        self.after_damage(id, outcome, sink, false);
        outcome
    }

    fn after_damage(&mut self, id: PartId, outcome: DiminishOutcome, sink: &mut dyn EffectSink, flash: bool) {
        match outcome {
            DiminishOutcome::Ignored => {}
            DiminishOutcome::Hurt => {
                if flash {
                    self.parts.animate_colour(id, anims::hurt_and_invulnerable_colour_anim());
                }
                sink.announce_boss_hurt(id);
            }
            DiminishOutcome::Destroyed => {
                log_info(&format!("Boss {}: weakpoint {:?} destroyed", self.kind.name(), id));
                sink.announce_boss_hurt(id);
            }
        }
    }

    /// Первая живая часть с геометрией, пересекающая `aabb`
    pub fn collision_check(&self, aabb: &Aabb2) -> Option<PartId> {
        self.parts
            .leaves(self.roots.alive)
            .into_iter()
            .filter(|id| !self.parts.is_destroyed(*id))
            .filter(|id| self.parts.get(*id).map(|p| !p.bounds().is_empty()).unwrap_or(false))
            .find(|id| {
                self.parts
                    .world_aabb(*id)
                    .map(|part_aabb| part_aabb.intersects(aabb))
                    .unwrap_or(false)
            })
    }

    // AI -------------------------------------------------------------------

    /// Следующая стадия; подменяет текущую после завершения update
    pub fn set_next_ai_state(&mut self, next: BossAi) {
        if let Some(dropped) = self.next_ai.replace(next) {
            log(&format!(
                "Boss {}: pending stage {} replaced before activation",
                self.kind.name(),
                dropped.as_stage().stage_name()
            ));
        }
    }

    pub fn set_current_ai_immediately(&mut self, ai: BossAi) {
        self.curr_ai = Some(ai);
    }

    pub fn has_pending_ai_state(&self) -> bool {
        self.next_ai.is_some()
    }

    pub fn current_ai(&self) -> Option<&BossAi> {
        self.curr_ai.as_ref()
    }

    /// Один тик: анимации частей → текущая стадия → подмена на next
    pub fn update(&mut self, dt: f32, env: &mut BossEnv) {
        self.parts.tick(dt);

        if let Some(mut ai) = self.curr_ai.take() {
            ai.as_stage_mut().update(dt, self, env);
            self.curr_ai = Some(ai);
        }

        self.promote_next_ai_state();
    }

    fn promote_next_ai_state(&mut self) {
        let Some(next) = self.next_ai.take() else {
            return;
        };
        let prev = self.stage_name();
        self.curr_ai = Some(next);
        self.stage_changes += 1;
        log_info(&format!(
            "Boss {}: stage {} -> {} (state {})",
            self.kind.name(),
            prev,
            self.stage_name(),
            self.state_name()
        ));
    }

    pub fn on_ball_collision(&mut self, part: PartId, env: &mut BossEnv) {
        if let Some(mut ai) = self.curr_ai.take() {
            ai.as_stage_mut().on_ball_collision(self, part, env);
            self.curr_ai = Some(ai);
        }
        self.promote_next_ai_state();
    }

    pub fn on_projectile_collision(&mut self, kind: ProjectileKind, part: PartId, env: &mut BossEnv) {
        if let Some(mut ai) = self.curr_ai.take() {
            ai.as_stage_mut().on_projectile_collision(self, kind, part, env);
            self.curr_ai = Some(ai);
        }
        self.promote_next_ai_state();
    }

    pub fn on_beam_collision(&mut self, part: PartId, dt: f32, damage_per_second: f32, env: &mut BossEnv) {
        if let Some(mut ai) = self.curr_ai.take() {
            ai.as_stage_mut().on_beam_collision(self, part, dt, damage_per_second, env);
            self.curr_ai = Some(ai);
        }
        self.promote_next_ai_state();
    }

    pub fn on_tesla_arc_hit(&mut self, part: PartId, env: &mut BossEnv) {
        if let Some(mut ai) = self.curr_ai.take() {
            ai.as_stage_mut().on_tesla_arc_hit(self, part, env);
            self.curr_ai = Some(ai);
        }
        self.promote_next_ai_state();
    }

    pub fn on_mine_explosion(&mut self, center: Vec2, radius: f32, env: &mut BossEnv) {
        if let Some(mut ai) = self.curr_ai.take() {
            ai.as_stage_mut().on_mine_explosion(self, center, radius, env);
            self.curr_ai = Some(ai);
        }
        self.promote_next_ai_state();
    }

    // Запросы ---------------------------------------------------------------

    pub fn is_finished(&self) -> bool {
        self.curr_ai.as_ref().map(|ai| ai.as_stage().is_finished()).unwrap_or(false)
    }

    pub fn total_life_percent(&self) -> f32 {
        self.curr_ai
            .as_ref()
            .map(|ai| ai.as_stage().total_life_percent(self))
            .unwrap_or(0.0)
    }

    pub fn stage_name(&self) -> &'static str {
        self.curr_ai.as_ref().map(|ai| ai.as_stage().stage_name()).unwrap_or("None")
    }

    pub fn state_name(&self) -> &'static str {
        self.curr_ai.as_ref().map(|ai| ai.as_stage().state_name()).unwrap_or("None")
    }

    pub fn can_hurt_paddle_with_body(&self) -> bool {
        self.curr_ai
            .as_ref()
            .map(|ai| ai.as_stage().can_hurt_paddle_with_body())
            .unwrap_or(false)
    }

    /// Части, которые сейчас можно ранить, и чем
    pub fn vulnerable_parts(&self) -> Vec<(PartId, DamageChannel)> {
        self.curr_ai
            .as_ref()
            .map(|ai| ai.as_stage().vulnerable_parts(self))
            .unwrap_or_default()
    }

    pub fn status(&self) -> BossStatus {
        BossStatus {
            kind: self.kind,
            stage: self.stage_name(),
            state: self.state_name(),
            life_percent: self.total_life_percent(),
            position: self.position(),
            stage_changes: self.stage_changes,
            finished: self.is_finished(),
        }
    }
}
