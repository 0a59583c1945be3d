//! Tests for Classical boss stages.

#[cfg(test)]
mod tests {
    use bevy::prelude::*;

    use super::super::ai::{ClassicalAi, ClassicalStage, ClassicalState};
    use super::super::{start_position, ClassicalParts};
    use crate::ai::{BossAiStage, BossEnv};
    use crate::boss::{anims, Boss, BossKind, BossLayout, BossRoots};
    use crate::context::{HeadlessGameModel, ProjectileKind};
    use crate::effects::{Announcement, BossEffect, EffectBuffer};
    use crate::parts::PartArena;
    use crate::random::ScriptedRandom;

    const LEVEL_W: f32 = 52.5;
    const LEVEL_H: f32 = 32.0;

    /// Босс без AI: стадии создаются в тесте напрямую
    fn bare_boss() -> (Boss, ClassicalParts) {
        let mut arena = PartArena::new();
        let roots = BossRoots::build(&mut arena);
        let parts = ClassicalParts::build(&mut arena, roots.alive);
        arena.translate(roots.alive, start_position(LEVEL_W, LEVEL_H).extend(0.0));
        let boss = Boss::assemble(BossKind::Classical, arena, roots, BossLayout::Classical(parts.clone()));
        (boss, parts)
    }

    fn classical_parts(boss: &Boss) -> ClassicalParts {
        match boss.layout() {
            BossLayout::Classical(parts) => parts.clone(),
            other => panic!("ожидалась раскладка Classical, получено {:?}", other),
        }
    }

    #[test]
    fn test_spawn_starts_with_arm_weakpoints() {
        let mut rng = ScriptedRandom::constant(0, 0.5);
        let boss = Boss::spawn(BossKind::Classical, LEVEL_W, LEVEL_H, &mut rng);
        let parts = classical_parts(&boss);

        assert_eq!(boss.stage_name(), "ArmsBodyHeadAI");
        assert_eq!(boss.state_name(), "BasicMoveAndLaserSprayAIState");
        assert!(boss.parts().is_weakpoint(parts.left_arm_square));
        assert!(boss.parts().is_weakpoint(parts.right_arm_square));
        assert!(!boss.parts().is_weakpoint(parts.eye), "глаз становится weakpoint'ом только в последней стадии");
        assert!((boss.total_life_percent() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_laser_spray_fires_five_lasers_toward_paddle() {
        let (mut boss, parts) = bare_boss();
        let mut rng = ScriptedRandom::constant(0, 0.5);
        let ai = ClassicalAi::new(ClassicalStage::ArmsBodyHead, parts.clone(), &mut boss, &mut rng);

        let mut model = HeadlessGameModel::new(LEVEL_W, LEVEL_H);
        let mut buffer = EffectBuffer::new();
        let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);
        ai.execute_laser_spray(&boss, &mut env);

        assert_eq!(model.projectiles.len(), 5);
        assert!(model.projectiles.iter().all(|p| p.kind == ProjectileKind::BossLaserBullet));

        let eye = boss.parts().world_position_2d(parts.eye);
        let to_paddle = (model.paddle.center - eye).normalize();
        assert!(
            model.projectiles[0].direction.dot(to_paddle) > 0.999,
            "первый лазер летит прямо в paddle"
        );
    }

    #[test]
    fn test_barrage_ends_after_last_shot() {
        let (mut boss, parts) = bare_boss();
        // unit = 1.0 → после базового движения всегда лазерный барраж
        let mut rng = ScriptedRandom::constant(0, 1.0);
        let mut ai = ClassicalAi::new(ClassicalStage::ArmsBodyHead, parts, &mut boss, &mut rng);
        let mut model = HeadlessGameModel::new(LEVEL_W, LEVEL_H);
        let mut buffer = EffectBuffer::new();

        {
            let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);
            for _ in 0..400 {
                ai.update(0.1, &mut boss, &mut env);
                if ai.state() == ClassicalState::MoveAndBarrageWithLaser {
                    break;
                }
            }
        }
        assert_eq!(ai.state(), ClassicalState::MoveAndBarrageWithLaser);
        assert!(
            buffer.boss_effects().any(|e| matches!(e, BossEffect::PowerCharge { .. })),
            "перед барражем глаз заряжается"
        );

        ai.set_num_shots_until_next_state(3);
        model.clear_spawned();

        let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);
        ai.update(0.3, &mut boss, &mut env);
        ai.update(0.3, &mut boss, &mut env);
        assert_eq!(ai.state(), ClassicalState::MoveAndBarrageWithLaser, "после 2 выстрелов барраж продолжается");
        ai.update(0.3, &mut boss, &mut env);

        assert_eq!(model.projectiles.len(), 3);
        assert_eq!(ai.state(), ClassicalState::BasicMoveAndLaserSpray);
        assert!(ai.num_shots_until_next_state() > 0, "счётчик заново заполнен для следующего барража");
    }

    #[test]
    fn test_hurt_is_edge_triggered() {
        let (mut boss, parts) = bare_boss();
        let mut rng = ScriptedRandom::constant(0, 0.5);
        let mut ai = ClassicalAi::new(ClassicalStage::ArmsBodyHead, parts.clone(), &mut boss, &mut rng);
        let mut model = HeadlessGameModel::new(LEVEL_W, LEVEL_H);
        let mut buffer = EffectBuffer::new();
        let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);

        ai.on_ball_collision(&mut boss, parts.left_arm_square, &mut env);
        assert_eq!(ai.state(), ClassicalState::Hurt);
        let life = boss.parts().life_percentage(parts.left_arm_square);
        assert!((life - 2.0 / 3.0).abs() < 1e-5);

        // Повторные удары в Hurt игнорируются
        ai.on_ball_collision(&mut boss, parts.left_arm_square, &mut env);
        ai.on_ball_collision(&mut boss, parts.right_arm_square, &mut env);
        assert!((boss.parts().life_percentage(parts.left_arm_square) - life).abs() < 1e-5);
        assert!((boss.parts().life_percentage(parts.right_arm_square) - 1.0).abs() < 1e-5);
        drop(env);
        assert_eq!(buffer.count_hurt(), 1);
    }

    #[test]
    fn test_non_stage_parts_take_no_damage() {
        let (mut boss, parts) = bare_boss();
        let mut rng = ScriptedRandom::constant(0, 0.5);
        let mut ai = ClassicalAi::new(ClassicalStage::ArmsBodyHead, parts.clone(), &mut boss, &mut rng);
        let mut model = HeadlessGameModel::new(LEVEL_W, LEVEL_H);
        let mut buffer = EffectBuffer::new();
        let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);

        ai.on_ball_collision(&mut boss, parts.base, &mut env);
        ai.on_projectile_collision(&mut boss, ProjectileKind::PaddleRocket, parts.columns[0], &mut env);
        assert_eq!(ai.state(), ClassicalState::BasicMoveAndLaserSpray);
    }

    #[test]
    fn test_losing_both_arms_moves_to_body_head() {
        let mut rng = ScriptedRandom::constant(0, 0.5);
        let mut boss = Boss::spawn(BossKind::Classical, LEVEL_W, LEVEL_H, &mut rng);
        let parts = classical_parts(&boss);
        let mut model = HeadlessGameModel::new(LEVEL_W, LEVEL_H);
        let mut buffer = EffectBuffer::new();
        let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);

        for square in [parts.left_arm_square, parts.right_arm_square] {
            for _ in 0..3 {
                boss.on_ball_collision(square, &mut env);
                if boss.state_name() == "LostArmsAngryAIState" {
                    break;
                }
                // Ждём конца Hurt и неуязвимости
                for _ in 0..16 {
                    boss.update(0.1, &mut env);
                }
            }
        }
        assert!(boss.is_part_dead(parts.left_arm), "левая рука отвалилась целиком");
        assert!(boss.is_part_dead(parts.right_arm));
        assert_eq!(boss.state_name(), "LostArmsAngryAIState");
        assert!((boss.total_life_percent() - 0.75).abs() < 1e-5);

        for _ in 0..50 {
            boss.update(0.1, &mut env);
            if boss.stage_changes() > 0 {
                break;
            }
        }
        assert_eq!(boss.stage_name(), "BodyHeadAI");
        assert_eq!(boss.stage_changes(), 1);
        assert!(parts.columns.iter().all(|c| boss.parts().is_weakpoint(*c)));
        assert!((boss.total_life_percent() - 0.75).abs() < 1e-5, "жизнь не прыгает при смене стадии");
        drop(env);
        assert!(buffer.count_angry() >= 1);
    }

    #[test]
    fn test_dying_stage_finishes_after_death_anim() {
        let (mut boss, parts) = bare_boss();
        let mut rng = ScriptedRandom::constant(0, 0.5);
        let mut ai = ClassicalAi::new(ClassicalStage::Dying, parts, &mut boss, &mut rng);
        assert_eq!(ai.state(), ClassicalState::FinalDeathThroes);
        assert_eq!(ai.total_life_percent(&boss), 0.0);

        let mut model = HeadlessGameModel::new(LEVEL_W, LEVEL_H);
        let mut buffer = EffectBuffer::new();
        let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);
        let ticks = (anims::TOTAL_DEATH_ANIM_TIME / 0.1).ceil() as usize + 2;
        for _ in 0..ticks {
            ai.update(0.1, &mut boss, &mut env);
        }
        drop(env);

        assert!(ai.is_finished());
        assert!(matches!(buffer.announcements.first(), Some(Announcement::ClearActiveBossEffects)));
        assert!(buffer
            .boss_effects()
            .any(|e| matches!(e, BossEffect::ExpandingHalo { .. })));
    }

    #[test]
    fn test_eye_stage_life_is_last_quarter() {
        let (mut boss, parts) = bare_boss();
        let mut rng = ScriptedRandom::constant(0, 0.5);
        let mut ai = ClassicalAi::new(ClassicalStage::Eye, parts.clone(), &mut boss, &mut rng);
        assert!(boss.parts().is_weakpoint(parts.eye));
        assert!((ai.total_life_percent(&boss) - 0.25).abs() < 1e-5);

        let mut model = HeadlessGameModel::new(LEVEL_W, LEVEL_H);
        let mut buffer = EffectBuffer::new();
        let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);
        ai.on_ball_collision(&mut boss, parts.eye, &mut env);
        assert!((ai.total_life_percent(&boss) - 0.25 * 2.0 / 3.0).abs() < 1e-5);
    }
}
