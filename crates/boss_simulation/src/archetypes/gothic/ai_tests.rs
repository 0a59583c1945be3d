//! Tests for Gothic-Romantic boss stages.

#[cfg(test)]
mod tests {
    use super::super::ai::{ConfinedMovePos, GothicAi, GothicStage, GothicState};
    use super::super::{confines, GothicParts};
    use crate::ai::{BossAiStage, BossEnv};
    use crate::boss::{Boss, BossKind, BossLayout, BossRoots};
    use crate::context::{HeadlessGameModel, ProjectileKind};
    use crate::effects::{BossEffect, EffectBuffer};
    use crate::parts::PartArena;
    use crate::random::ScriptedRandom;

    const LEVEL_W: f32 = 52.5;
    const LEVEL_H: f32 = 31.0;
    const DT: f32 = 0.1;

    fn bare_boss() -> (Boss, GothicParts) {
        let mut arena = PartArena::new();
        let roots = BossRoots::build(&mut arena);
        let parts = GothicParts::build(&mut arena, roots.alive);
        arena.translate(roots.alive, confines(LEVEL_W, LEVEL_H).center().extend(0.0));
        let boss = Boss::assemble(BossKind::GothicRomantic, arena, roots, BossLayout::Gothic(parts.clone()));
        (boss, parts)
    }

    fn count_halos(buffer: &EffectBuffer) -> usize {
        buffer
            .boss_effects()
            .filter(|e| matches!(e, BossEffect::ExpandingHalo { .. }))
            .count()
    }

    #[test]
    fn test_random_corner_never_repeats_current() {
        for u in 0..12 {
            let mut rng = ScriptedRandom::constant(u, 0.5);
            for corner in [
                ConfinedMovePos::TopLeftCorner,
                ConfinedMovePos::TopRightCorner,
                ConfinedMovePos::BottomLeftCorner,
                ConfinedMovePos::BottomRightCorner,
            ] {
                let next = ConfinedMovePos::random_corner(corner, &mut rng);
                assert_ne!(next, corner);
                assert_ne!(next, ConfinedMovePos::Center);
            }
            let from_center = ConfinedMovePos::random_corner(ConfinedMovePos::Center, &mut rng);
            assert_ne!(from_center, ConfinedMovePos::Center);
        }
    }

    #[test]
    fn test_corner_positions_fit_inside_confines() {
        let area = confines(LEVEL_W, LEVEL_H);
        for pos in [
            ConfinedMovePos::TopLeftCorner,
            ConfinedMovePos::TopRightCorner,
            ConfinedMovePos::BottomLeftCorner,
            ConfinedMovePos::BottomRightCorner,
            ConfinedMovePos::Center,
        ] {
            assert!(area.contains(pos.boss_center(&area)), "{:?} вне confines", pos);
        }
    }

    #[test]
    fn test_first_decision_never_summons() {
        let (mut boss, parts) = bare_boss();
        // unit = 0.0 - самый "удачный" бросок для призыва
        let mut rng = ScriptedRandom::constant(0, 0.0);
        let ai = GothicAi::new(GothicStage::IceBall, parts, &mut boss, &mut rng);

        assert_eq!(ai.attacks_since_last_summon(), 0);
        assert_ne!(ai.next_attack(), GothicState::SummonItems, "при 0 атаках вероятность призыва 0");
        assert_ne!(ai.next_move_pos(), ConfinedMovePos::Center);
        assert_eq!(ai.state(), GothicState::BasicMoveAndShoot);
    }

    #[test]
    fn test_fire_ball_hurt_only_by_fire_globs() {
        let (mut boss, parts) = bare_boss();
        let mut rng = ScriptedRandom::constant(0, 0.5);
        let mut ai = GothicAi::new(GothicStage::FireBall, parts.clone(), &mut boss, &mut rng);
        let mut model = HeadlessGameModel::new(LEVEL_W, LEVEL_H);
        let mut buffer = EffectBuffer::new();
        let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);

        ai.on_ball_collision(&mut boss, parts.top_point, &mut env);
        ai.on_projectile_collision(&mut boss, ProjectileKind::PaddleLaserBullet, parts.top_point, &mut env);
        ai.on_projectile_collision(&mut boss, ProjectileKind::FireGlob, parts.bottom_point, &mut env);
        assert_eq!(ai.state(), GothicState::BasicMoveAndShoot);
        assert_eq!(boss.parts().life_percentage(parts.top_point), 1.0);

        ai.on_projectile_collision(&mut boss, ProjectileKind::FireGlob, parts.top_point, &mut env);
        assert_eq!(ai.state(), GothicState::HurtTop);
        assert!((boss.parts().life_percentage(parts.top_point) - 0.8).abs() < 1e-5);
        assert!((ai.total_life_percent(&boss) - 2.8 / 3.0).abs() < 1e-5);
    }

    /// Обе стадии с остриями пройдены, босс только что вошёл в DestroyConfines
    fn boss_at_destroy_confines() -> (Boss, GothicParts, HeadlessGameModel, EffectBuffer, ScriptedRandom) {
        let mut rng = ScriptedRandom::constant(0, 0.5);
        let mut boss = Boss::spawn(BossKind::GothicRomantic, LEVEL_W, LEVEL_H, &mut rng);
        let parts = match boss.layout() {
            BossLayout::Gothic(parts) => parts.clone(),
            other => panic!("ожидалась раскладка Gothic, получено {:?}", other),
        };
        let mut model = HeadlessGameModel::new(LEVEL_W, LEVEL_H);
        let mut buffer = EffectBuffer::new();

        {
            let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);
            for (part, kind, stage) in [
                (parts.top_point, ProjectileKind::FireGlob, "FireBallAI"),
                (parts.bottom_point, ProjectileKind::PaddleIceBlast, "IceBallAI"),
            ] {
                for _ in 0..5 {
                    assert_eq!(boss.stage_name(), stage);
                    boss.on_projectile_collision(kind, part, &mut env);
                    for _ in 0..16 {
                        boss.update(DT, &mut env);
                    }
                }
            }
            assert!(boss.is_part_dead(parts.top_point));
            assert!(boss.is_part_dead(parts.bottom_point));

            for _ in 0..300 {
                boss.update(DT, &mut env);
                if boss.state_name() == "DestroyConfinesAIState" {
                    break;
                }
            }
        }
        (boss, parts, model, buffer, rng)
    }

    #[test]
    fn test_ice_ball_destruction_destroys_confines_once() {
        let (mut boss, parts, mut model, mut buffer, mut rng) = boss_at_destroy_confines();
        assert_eq!(boss.state_name(), "DestroyConfinesAIState");
        assert!(!model.confines_destroyed);
        let halos_before = count_halos(&buffer);

        // Тик, на котором countdown впервые становится ≤ 0
        let mut countdown = 2.0_f32;
        let mut charge_ticks = 0;
        while countdown > 0.0 {
            countdown -= DT;
            charge_ticks += 1;
        }

        let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);
        for _ in 0..charge_ticks - 1 {
            boss.update(DT, &mut env);
        }
        drop(env);
        assert_eq!(count_halos(&buffer), halos_before, "эффект заряда не раньше времени");

        let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);
        boss.update(DT, &mut env);
        drop(env);
        assert_eq!(count_halos(&buffer), halos_before + 1);

        let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);
        for _ in 0..40 {
            boss.update(DT, &mut env);
            if boss.stage_name() == "FreeMovingAttackAI" {
                break;
            }
        }
        drop(env);
        assert_eq!(boss.stage_name(), "FreeMovingAttackAI");
        assert_eq!(count_halos(&buffer), halos_before + 1, "заряд срабатывает ровно один раз");
        assert!(model.confines_destroyed);
        assert!(boss.parts().is_weakpoint(parts.body));
    }

    #[test]
    fn test_free_moving_body_hits_lead_to_death() {
        let (mut boss, parts) = bare_boss();
        let mut rng = ScriptedRandom::constant(1, 0.5);
        let mut ai = GothicAi::new(GothicStage::FreeMoving, parts.clone(), &mut boss, &mut rng);
        let mut model = HeadlessGameModel::new(LEVEL_W, LEVEL_H);
        let mut buffer = EffectBuffer::new();
        let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);

        for _ in 0..6 {
            ai.on_ball_collision(&mut boss, parts.body, &mut env);
            if ai.state() == GothicState::FinalDeathThroes {
                break;
            }
            assert_eq!(ai.state(), GothicState::Glitch);
            for _ in 0..16 {
                boss.parts_mut().tick(DT);
                ai.update(DT, &mut boss, &mut env);
            }
        }
        assert_eq!(ai.state(), GothicState::FinalDeathThroes);
        assert_eq!(ai.total_life_percent(&boss), 0.0);

        for _ in 0..70 {
            ai.update(DT, &mut boss, &mut env);
        }
        assert!(ai.is_finished());
    }

    #[test]
    fn test_destroy_confines_charge_announced_once_with_zero_dt() {
        let (mut boss, parts, mut model, mut buffer, mut rng) = boss_at_destroy_confines();
        let count_charges = |buffer: &EffectBuffer| {
            buffer
                .boss_effects()
                .filter(|e| matches!(e, BossEffect::PowerCharge { part, .. } if *part == parts.body))
                .count()
        };
        let before = count_charges(&buffer);

        // Нулевой dt не сдвигает countdown - заряд всё равно объявляется один раз
        let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);
        boss.update(0.0, &mut env);
        boss.update(0.0, &mut env);
        boss.update(DT, &mut env);

        assert_eq!(boss.state_name(), "DestroyConfinesAIState");
        assert_eq!(count_charges(&buffer), before + 1, "заряд только на первом тике состояния");
    }
}
