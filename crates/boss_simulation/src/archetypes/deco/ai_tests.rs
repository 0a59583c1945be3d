//! Tests for Deco boss stages.

#[cfg(test)]
mod tests {
    use super::super::ai::{DecoAi, DecoStage, DecoState};
    use super::super::DecoParts;
    use crate::ai::{BossAiStage, BossEnv, DamageChannel};
    use crate::boss::{Boss, BossKind, BossLayout};
    use crate::context::{HeadlessGameModel, ItemKind, ProjectileKind};
    use crate::effects::{Announcement, BossEffect, EffectBuffer, GeneralEffect, MiscBossEffect};
    use crate::random::ScriptedRandom;

    const LEVEL_W: f32 = 52.5;
    const LEVEL_H: f32 = 36.0;
    const DT: f32 = 0.1;

    fn spawned(rng: &mut ScriptedRandom) -> (Boss, DecoParts) {
        let boss = Boss::spawn(BossKind::Deco, LEVEL_W, LEVEL_H, rng);
        let parts = match boss.layout() {
            BossLayout::Deco(parts) => parts.clone(),
            other => panic!("ожидалась раскладка Deco, получено {:?}", other),
        };
        (boss, parts)
    }

    fn count_misc(buffer: &EffectBuffer, kind: MiscBossEffect) -> usize {
        buffer
            .boss_effects()
            .filter(|e| matches!(e, BossEffect::Misc { kind: k, .. } if *k == kind))
            .count()
    }

    #[test]
    fn test_spawn_starts_with_item_drop_and_relay_is_not_weakpoint() {
        let mut rng = ScriptedRandom::constant(0, 0.5);
        let (boss, parts) = spawned(&mut rng);

        assert_eq!(boss.stage_name(), "DecoStage1AI");
        assert_eq!(boss.state_name(), "MovingAttackAndItemDropAIState");
        assert_eq!(boss.total_life_percent(), 1.0);
        assert!(!boss.parts().is_weakpoint(parts.lightning_relay));
        assert_eq!(
            boss.vulnerable_parts(),
            vec![(parts.lightning_relay, DamageChannel::TeslaArc)]
        );
        // Руки в первой стадии спрятаны за боковыми корпусами
        assert!(boss.parts().world_aabb(parts.left_arm.hand).is_none());
    }

    #[test]
    fn test_ball_and_projectiles_do_not_hurt() {
        let mut rng = ScriptedRandom::constant(0, 0.5);
        let (mut boss, parts) = spawned(&mut rng);
        let mut model = HeadlessGameModel::new(LEVEL_W, LEVEL_H);
        let mut buffer = EffectBuffer::new();
        let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);

        boss.on_ball_collision(parts.lightning_relay, &mut env);
        boss.on_projectile_collision(ProjectileKind::PaddleLaserBullet, parts.core, &mut env);
        boss.on_projectile_collision(ProjectileKind::PaddleRocket, parts.lightning_relay, &mut env);
        drop(env);

        assert_eq!(boss.state_name(), "MovingAttackAndItemDropAIState");
        assert_eq!(boss.total_life_percent(), 1.0);
        assert_eq!(buffer.count_hurt(), 0);
    }

    #[test]
    fn test_tesla_arc_on_relay_electrifies_once() {
        let mut rng = ScriptedRandom::constant(0, 0.5);
        let (mut boss, parts) = spawned(&mut rng);
        let mut model = HeadlessGameModel::new(LEVEL_W, LEVEL_H);
        let mut buffer = EffectBuffer::new();
        let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);

        boss.on_tesla_arc_hit(parts.core, &mut env);
        assert_eq!(boss.state_name(), "MovingAttackAndItemDropAIState", "дуга в ядро не считается");

        boss.on_tesla_arc_hit(parts.lightning_relay, &mut env);
        assert_eq!(boss.state_name(), "ElectrifiedAIState");
        boss.on_tesla_arc_hit(parts.lightning_relay, &mut env);
        drop(env);

        assert_eq!(buffer.count_hurt(), 1, "повторный удар во время электризации игнорируется");
        assert!(buffer
            .boss_effects()
            .any(|e| matches!(e, BossEffect::ElectricitySpasm { part, .. } if *part == parts.core)));
        assert!((boss.total_life_percent() - 2.0 / 3.0).abs() < 1e-5);
        assert!(boss.vulnerable_parts().is_empty());

        // unit = 0.5, знак +1 → наклон 15 + 7.5
        let tilt = boss.parts().rotation(boss.alive_root()).z;
        assert!((tilt - 22.5).abs() < 1e-4, "наклон {}", tilt);
    }

    #[test]
    fn test_stage_one_loses_side_bodies_and_advances() {
        let mut rng = ScriptedRandom::constant(0, 0.5);
        let (mut boss, parts) = spawned(&mut rng);
        let mut model = HeadlessGameModel::new(LEVEL_W, LEVEL_H);
        let mut buffer = EffectBuffer::new();
        let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);

        boss.on_tesla_arc_hit(parts.lightning_relay, &mut env);
        let mut saw_retaliation = false;
        let mut saw_angry = false;
        for _ in 0..150 {
            boss.update(DT, &mut env);
            saw_retaliation |= boss.state_name() == "ElectrificationRetaliationAIState";
            saw_angry |= boss.state_name() == "AngryAIState";
            if boss.stage_name() == "DecoStage2AI" {
                break;
            }
        }
        drop(env);

        assert!(saw_retaliation && saw_angry, "порядок Electrified → Retaliation → Angry");
        assert_eq!(boss.stage_name(), "DecoStage2AI");
        assert_eq!(boss.state_name(), "MovingAttackAIState");
        assert_eq!(boss.stage_changes(), 1);
        assert!(boss.is_part_dead(parts.left_body));
        assert!(boss.is_part_dead(parts.right_body));
        assert!(boss.is_part_alive(parts.lightning_relay));
        assert!((boss.total_life_percent() - 2.0 / 3.0).abs() < 1e-5);
        assert!(boss.parts().world_aabb(parts.left_arm.hand).is_some(), "руки открыты во второй стадии");

        assert!(buffer
            .boss_effects()
            .any(|e| matches!(e, BossEffect::Shockwave { .. })));
        let short_circuits = buffer
            .general_effects()
            .filter(|e| matches!(e, GeneralEffect::ShortCircuit { .. }))
            .count();
        assert_eq!(short_circuits, 2, "по одному замыканию на каждый тесла-блок");
        assert_eq!(buffer.count_angry(), 1);
    }

    #[test]
    fn test_final_stage_electrification_leads_to_death() {
        let mut rng = ScriptedRandom::constant(0, 0.5);
        let (mut boss, parts) = spawned(&mut rng);
        let mut ai = DecoAi::new(DecoStage::Stage3, parts.clone(), &mut boss, &mut rng);
        let mut model = HeadlessGameModel::new(LEVEL_W, LEVEL_H);
        let mut buffer = EffectBuffer::new();
        let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);

        assert!((ai.total_life_percent(&boss) - 1.0 / 3.0).abs() < 1e-5);
        ai.on_tesla_arc_hit(&mut boss, parts.lightning_relay, &mut env);
        assert_eq!(ai.state(), DecoState::Electrified);

        for _ in 0..40 {
            ai.update(DT, &mut boss, &mut env);
            if ai.state() == DecoState::FinalDeathThroes {
                break;
            }
        }
        assert_eq!(ai.state(), DecoState::FinalDeathThroes);
        assert_eq!(ai.total_life_percent(&boss), 0.0);
        assert!(!ai.is_finished());

        for _ in 0..70 {
            ai.update(DT, &mut boss, &mut env);
        }
        drop(env);
        assert!(ai.is_finished());
        assert!(buffer
            .announcements
            .iter()
            .any(|a| matches!(a, Announcement::ClearActiveBossEffects)));
    }

    #[test]
    fn test_rc_camera_forces_movement_and_blocks_shots() {
        let mut rng = ScriptedRandom::constant(0, 0.5);
        let (mut boss, parts) = spawned(&mut rng);
        let mut ai = DecoAi::new(DecoStage::Stage1, parts, &mut boss, &mut rng);
        let mut model = HeadlessGameModel::new(LEVEL_W, LEVEL_H);
        model.rc_camera_on = true;
        let mut buffer = EffectBuffer::new();
        let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);

        ai.set_state(DecoState::StationaryAttack, &mut boss, &mut env);
        ai.update(DT, &mut boss, &mut env);
        assert_eq!(ai.state(), DecoState::MovingAttack);

        for _ in 0..60 {
            ai.update(DT, &mut boss, &mut env);
            assert_ne!(ai.state(), DecoState::StationaryAttack);
        }
        drop(env);
        assert!(model.projectiles.is_empty(), "под камерой ракеты босс не стреляет");
    }

    #[test]
    fn test_stationary_attack_never_repeats_itself() {
        for unit in [0.0, 0.3, 0.6, 1.0] {
            let mut rng = ScriptedRandom::constant(0, unit);
            let (mut boss, parts) = spawned(&mut rng);
            let mut ai = DecoAi::new(DecoStage::Stage1, parts, &mut boss, &mut rng);
            let mut model = HeadlessGameModel::new(LEVEL_W, LEVEL_H);
            let mut buffer = EffectBuffer::new();
            let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);

            ai.set_state(DecoState::StationaryAttack, &mut boss, &mut env);
            assert_eq!(ai.num_shots_until_next_state(), 3);
            for _ in 0..100 {
                ai.update(DT, &mut boss, &mut env);
                if ai.state() != DecoState::StationaryAttack {
                    break;
                }
            }
            drop(env);

            assert_ne!(ai.state(), DecoState::StationaryAttack, "unit {}", unit);
            assert_eq!(model.projectiles.len(), 3);
            assert!(model
                .projectiles
                .iter()
                .all(|p| p.kind == ProjectileKind::BossLightningBolt));
        }
    }

    #[test]
    fn test_item_drop_only_while_ball_in_play() {
        let mut rng = ScriptedRandom::constant(0, 0.0);
        let (mut boss, parts) = spawned(&mut rng);
        let mut ai = DecoAi::new(DecoStage::Stage1, parts.clone(), &mut boss, &mut rng);
        let mut model = HeadlessGameModel::new(LEVEL_W, LEVEL_H);
        let mut buffer = EffectBuffer::new();
        {
            let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);
            assert_eq!(ai.state(), DecoState::MovingAttackAndItemDrop);
            for _ in 0..60 {
                ai.execute_moving_attack_and_item_drop(DT, &mut boss, &mut env);
                if ai.state() != DecoState::MovingAttackAndItemDrop {
                    break;
                }
            }
        }
        assert_eq!(model.items.len(), 1);
        assert_eq!(model.items[0].0, ItemKind::ShrinkPaddle);
        assert!(model.items[0].1.y < boss.parts().world_position_2d(parts.core).y);
        assert_eq!(count_misc(&buffer, MiscBossEffect::ItemLoading), 1);

        let mut rng = ScriptedRandom::constant(0, 0.0);
        let (mut boss, parts) = spawned(&mut rng);
        let mut ai = DecoAi::new(DecoStage::Stage1, parts, &mut boss, &mut rng);
        let mut model = HeadlessGameModel::new(LEVEL_W, LEVEL_H);
        model.ball_in_play = false;
        let mut buffer = EffectBuffer::new();
        let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);
        for _ in 0..60 {
            ai.execute_moving_attack_and_item_drop(DT, &mut boss, &mut env);
            if ai.state() != DecoState::MovingAttackAndItemDrop {
                break;
            }
        }
        drop(env);
        assert!(model.items.is_empty());
        assert_eq!(count_misc(&buffer, MiscBossEffect::ItemLoading), 0);
    }

    #[test]
    fn test_level_rotation_speeds_up_when_ball_above() {
        let mut rng = ScriptedRandom::constant(0, 0.5);
        let (mut boss, parts) = spawned(&mut rng);
        let mut ai = DecoAi::new(DecoStage::Stage2, parts, &mut boss, &mut rng);
        let mut model = HeadlessGameModel::new(LEVEL_W, LEVEL_H);
        let mut buffer = EffectBuffer::new();

        {
            let env = BossEnv::new(&mut model, &mut rng, &mut buffer);
            assert_eq!(ai.level_rotation_speed(&boss, &env), 13.0);
        }
        if let Some(ball) = model.ball.as_mut() {
            ball.center.y = LEVEL_H - 1.0;
        }
        {
            let env = BossEnv::new(&mut model, &mut rng, &mut buffer);
            assert_eq!(ai.level_rotation_speed(&boss, &env), 19.5);
        }
        model.rc_camera_on = true;
        {
            let env = BossEnv::new(&mut model, &mut rng, &mut buffer);
            assert_eq!(ai.level_rotation_speed(&boss, &env), 13.0, "камера ракеты отключает ускорение");
        }
        model.rc_camera_on = false;
        if let Some(ball) = model.ball.as_mut() {
            ball.center.y = 2.0;
        }

        let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);
        ai.set_state(DecoState::RotatingLevel, &mut boss, &mut env);
        ai.update(DT, &mut boss, &mut env);
        assert!((env.ctx.level_rotation() - 1.3).abs() < 1e-4);

        let mut saw_finish = false;
        for _ in 0..400 {
            ai.update(DT, &mut boss, &mut env);
            saw_finish |= ai.state() == DecoState::FinishRotatingLevel;
            if !matches!(ai.state(), DecoState::RotatingLevel | DecoState::FinishRotatingLevel) {
                break;
            }
        }
        assert!(saw_finish);
        assert!(!matches!(
            ai.state(),
            DecoState::RotatingLevel | DecoState::FinishRotatingLevel
        ));
        assert_eq!(env.ctx.level_rotation(), 0.0, "полный оборот возвращает уровень в 0");
    }

    #[test]
    fn test_arm_attack_hurts_paddle_then_retracts() {
        let mut rng = ScriptedRandom::constant(0, 0.5);
        let (mut boss, parts) = spawned(&mut rng);
        let mut ai = DecoAi::new(DecoStage::Stage2, parts, &mut boss, &mut rng);
        let mut model = HeadlessGameModel::new(LEVEL_W, LEVEL_H);
        let mut buffer = EffectBuffer::new();
        let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);

        ai.set_state(DecoState::MoveToPaddleArmAttackPos, &mut boss, &mut env);
        for _ in 0..200 {
            ai.update(DT, &mut boss, &mut env);
            if ai.state() == DecoState::ArmAttack {
                break;
            }
        }
        assert_eq!(ai.state(), DecoState::ArmAttack);
        assert!(ai.can_hurt_paddle_with_body());

        for _ in 0..30 {
            boss.parts_mut().tick(DT);
            ai.update(DT, &mut boss, &mut env);
            if ai.state() != DecoState::ArmAttack {
                break;
            }
        }
        drop(env);
        assert_ne!(ai.state(), DecoState::ArmAttack);
        assert!(!ai.can_hurt_paddle_with_body());
        assert_eq!(count_misc(&buffer, MiscBossEffect::ArmsRetracting), 1);
    }
}
