//! Tests for Boss part roles and stage promotion.

#[cfg(test)]
mod tests {
    use bevy::prelude::*;

    use super::super::{Boss, BossKind, BossLayout, BossRoots};
    use crate::ai::{BossAi, BossEnv};
    use crate::archetypes::classical::{start_position, ClassicalAi, ClassicalParts, ClassicalStage};
    use crate::context::HeadlessGameModel;
    use crate::effects::EffectBuffer;
    use crate::error::BossError;
    use crate::geometry::Aabb2;
    use crate::parts::{PartArena, PartId};
    use crate::random::ScriptedRandom;

    const LEVEL_W: f32 = 52.5;
    const LEVEL_H: f32 = 32.0;

    fn bare_boss() -> (Boss, ClassicalParts) {
        let mut arena = PartArena::new();
        let roots = BossRoots::build(&mut arena);
        let parts = ClassicalParts::build(&mut arena, roots.alive);
        arena.translate(roots.alive, start_position(LEVEL_W, LEVEL_H).extend(0.0));
        let boss = Boss::assemble(BossKind::Classical, arena, roots, BossLayout::Classical(parts.clone()));
        (boss, parts)
    }

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn test_weakpoint_conversion_rejects_bad_parts() {
        let (mut boss, parts) = bare_boss();

        assert_eq!(
            boss.convert_alive_part_to_weakpoint(PartId(9999), 1.0, 1.0),
            Err(BossError::UnknownPart(PartId(9999)))
        );
        assert_eq!(
            boss.convert_alive_part_to_weakpoint(parts.left_arm, 1.0, 1.0),
            Err(BossError::CompositeCannotBeWeakpoint(parts.left_arm))
        );

        let dead_root = boss.dead_root();
        assert_eq!(
            boss.convert_alive_part_to_weakpoint(dead_root, 1.0, 1.0),
            Err(BossError::NotAlive(dead_root))
        );
    }

    #[test]
    fn test_weakpoint_upgrade_keeps_geometry() {
        let (mut boss, parts) = bare_boss();
        let before = boss.parts().world_aabb(parts.pediment).unwrap();

        boss.convert_alive_part_to_weakpoint(parts.pediment, 12.0, 1.0).unwrap();

        let after = boss.parts().world_aabb(parts.pediment).unwrap();
        assert!(approx(before.min, after.min) && approx(before.max, after.max), "геометрия не должна меняться");
        assert!(boss.parts().is_weakpoint(parts.pediment));
        assert!(boss.is_part_alive(parts.pediment));
        assert_eq!(
            boss.convert_alive_part_to_weakpoint(parts.pediment, 12.0, 1.0),
            Err(BossError::AlreadyWeakpoint(parts.pediment)),
            "повторное повышение - ошибка"
        );
    }

    #[test]
    fn test_dead_part_keeps_world_position() {
        let (mut boss, parts) = bare_boss();
        let before = boss.parts().world_position_2d(parts.left_arm);

        boss.convert_alive_part_to_dead_part(parts.left_arm).unwrap();

        assert!(approx(boss.parts().world_position_2d(parts.left_arm), before));
        assert!(boss.is_part_dead(parts.left_arm));
        assert!(boss.is_part_dead(parts.left_arm_square), "дети переезжают вместе с частью");
        assert!(!boss.is_part_alive(parts.left_arm_square));

        // Сдвиг живого босса больше не тащит мёртвую руку
        boss.translate(Vec2::new(3.0, 0.0));
        assert!(approx(boss.parts().world_position_2d(parts.left_arm), before));

        assert_eq!(
            boss.convert_alive_part_to_dead_part(parts.left_arm),
            Err(BossError::AlreadyDead(parts.left_arm))
        );
        assert_eq!(
            boss.convert_alive_part_to_weakpoint(parts.left_arm_square, 1.0, 1.0),
            Err(BossError::NotAlive(parts.left_arm_square))
        );
    }

    #[test]
    fn test_alive_root_cannot_die() {
        let (mut boss, _parts) = bare_boss();
        let alive = boss.alive_root();

        assert_eq!(boss.convert_alive_part_to_dead_part(alive), Err(BossError::NotAlive(alive)));
    }

    #[test]
    fn test_collision_check_finds_touched_part() {
        let (boss, parts) = bare_boss();
        let center = boss.parts().world_aabb(parts.base).unwrap().center();

        let hit = boss
            .collision_check(&Aabb2::from_center(center, Vec2::splat(0.05)))
            .expect("по центру основания должна быть часть");
        let hit_aabb = boss.parts().world_aabb(hit).unwrap();
        assert!(hit_aabb.contains(center));

        assert_eq!(boss.collision_check(&Aabb2::from_center(Vec2::splat(-100.0), Vec2::ONE)), None);
    }

    #[test]
    fn test_boss_without_ai_reports_nothing() {
        let (boss, _parts) = bare_boss();
        let status = boss.status();

        assert_eq!(status.stage, "None");
        assert_eq!(status.state, "None");
        assert_eq!(status.life_percent, 0.0);
        assert!(!status.finished);
        assert!(boss.vulnerable_parts().is_empty());
    }

    #[test]
    fn test_next_stage_promoted_after_update() {
        let (mut boss, parts) = bare_boss();
        let mut rng = ScriptedRandom::constant(0, 0.5);
        let first = ClassicalAi::new(ClassicalStage::ArmsBodyHead, parts.clone(), &mut boss, &mut rng);
        boss.set_current_ai_immediately(BossAi::Classical(first));
        let first_stage = boss.stage_name();

        let next = ClassicalAi::new(ClassicalStage::BodyHead, parts, &mut boss, &mut rng);
        boss.set_next_ai_state(BossAi::Classical(next));

        // До конца тика текущая стадия не меняется
        assert_eq!(boss.stage_name(), first_stage);
        assert!(boss.has_pending_ai_state());
        assert_eq!(boss.stage_changes(), 0);

        let mut model = HeadlessGameModel::new(LEVEL_W, LEVEL_H);
        let mut buffer = EffectBuffer::new();
        let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);
        boss.update(1.0 / 60.0, &mut env);

        assert_ne!(boss.stage_name(), first_stage, "стадия должна смениться после update");
        assert_eq!(boss.stage_name(), ClassicalStage::BodyHead.name());
        assert!(!boss.has_pending_ai_state());
        assert_eq!(boss.stage_changes(), 1);
    }

    #[test]
    fn test_beam_damage_respects_invulnerability_window() {
        let (mut boss, parts) = bare_boss();
        let mut rng = ScriptedRandom::constant(0, 0.5);
        let ai = ClassicalAi::new(ClassicalStage::ArmsBodyHead, parts.clone(), &mut boss, &mut rng);
        boss.set_current_ai_immediately(BossAi::Classical(ai));
        boss.convert_alive_part_to_weakpoint(parts.base, 10.0, 1.0).unwrap();

        let mut model = HeadlessGameModel::new(LEVEL_W, LEVEL_H);
        let mut buffer = EffectBuffer::new();
        let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);

        // Два тика луча подряд - второй попадает в окно неуязвимости
        boss.on_beam_collision(parts.base, 0.1, 10.0, &mut env);
        boss.on_beam_collision(parts.base, 0.1, 10.0, &mut env);

        let wp = boss.parts().weakpoint(parts.base).unwrap();
        assert_eq!(wp.curr_life, 9.0, "луч должен снять HP ровно один раз");
        assert!(wp.is_invulnerable());
        assert_eq!(buffer.count_hurt(), 1);
    }
}
