//! Tests for Futurism boss stages.

#[cfg(test)]
mod tests {
    use bevy::prelude::*;

    use super::super::ai::{FuturismAi, FuturismStage, FuturismState};
    use super::super::{
        arena_confines, arena_move_positions, barrier_column, ice_strategy_portal_zone, piece_cells,
        rocket_strategy_portal_zone, FuturismArena, FuturismParts, CORE_BOSS_HALF_SIZE, LEVEL_WIDTH,
    };
    use crate::ai::{BossAi, BossEnv, DamageChannel};
    use crate::boss::{Boss, BossKind, BossLayout};
    use crate::context::{BossContext, HeadlessGameModel, ProjectileKind};
    use crate::effects::{Announcement, BossEffect, EffectBuffer, GeneralEffect, MiscBossEffect, TeleportKind};
    use crate::geometry::{rotate_degrees, signed_angle_degrees, Aabb2};
    use crate::random::ScriptedRandom;

    const LEVEL_H: f32 = 36.0;
    const DT: f32 = 0.1;

    fn spawned(rng: &mut ScriptedRandom) -> (Boss, FuturismParts) {
        let boss = Boss::spawn(BossKind::Futurism, LEVEL_WIDTH, LEVEL_H, rng);
        let parts = match boss.layout() {
            BossLayout::Futurism(parts) => parts.clone(),
            other => panic!("ожидалась раскладка Futurism, получено {:?}", other),
        };
        (boss, parts)
    }

    /// Босс сразу в нужной стадии (как будто предыдущие пройдены)
    fn spawned_at(stage: FuturismStage, rng: &mut ScriptedRandom) -> (Boss, FuturismParts) {
        let (mut boss, parts) = spawned(rng);
        let ai = FuturismAi::new(stage, parts.clone(), &mut boss, rng);
        boss.set_current_ai_immediately(BossAi::Futurism(ai));
        (boss, parts)
    }

    fn futurism_ai(boss: &Boss) -> &FuturismAi {
        match boss.current_ai() {
            Some(BossAi::Futurism(ai)) => ai,
            other => panic!("ожидался Futurism AI, получено {:?}", other),
        }
    }

    fn count_teleports(buffer: &EffectBuffer, kind: TeleportKind) -> usize {
        buffer
            .boss_effects()
            .filter(|e| matches!(e, BossEffect::Teleport { kind: k, .. } if *k == kind))
            .count()
    }

    fn count_misc(buffer: &EffectBuffer, kind: MiscBossEffect) -> usize {
        buffer
            .boss_effects()
            .filter(|e| matches!(e, BossEffect::Misc { kind: k, .. } if *k == kind))
            .count()
    }

    fn tick(boss: &mut Boss, env: &mut BossEnv, n: usize) {
        for _ in 0..n {
            boss.update(DT, env);
        }
    }

    /// Босс в стадии `stage`, AI сразу переведён в `state`
    fn spawned_in_state(
        stage: FuturismStage,
        state: FuturismState,
        model: &mut HeadlessGameModel,
        rng: &mut ScriptedRandom,
        buffer: &mut EffectBuffer,
    ) -> (Boss, FuturismParts) {
        let (mut boss, parts) = spawned(rng);
        let mut ai = FuturismAi::new(stage, parts.clone(), &mut boss, rng);
        {
            let mut env = BossEnv::new(model, rng, buffer);
            ai.set_state(state, &mut boss, &mut env);
        }
        boss.set_current_ai_immediately(BossAi::Futurism(ai));
        (boss, parts)
    }

    fn count_power_charges(buffer: &EffectBuffer) -> usize {
        buffer
            .boss_effects()
            .filter(|e| matches!(e, BossEffect::PowerCharge { .. }))
            .count()
    }

    #[test]
    fn test_spawn_in_left_arena_with_shields_vulnerable_to_rockets() {
        let mut rng = ScriptedRandom::constant(0, 0.5);
        let (boss, parts) = spawned(&mut rng);

        assert_eq!(boss.stage_name(), "FuturismStage1AI");
        assert_eq!(boss.state_name(), "TeleportAIState");
        assert_eq!(futurism_ai(&boss).arena(), FuturismArena::Left);
        assert_eq!(boss.total_life_percent(), 1.0);

        let vulnerable = boss.vulnerable_parts();
        assert_eq!(vulnerable.len(), 4);
        for shield in parts.outer_shields() {
            assert!(vulnerable.contains(&(shield, DamageChannel::Projectile(ProjectileKind::PaddleRocket))));
        }
        let start = boss.position();
        assert!((start - Vec2::new(15.4, 22.0)).length() < 1e-3, "старт {:?}", start);
    }

    #[test]
    fn test_teleport_without_free_location_keeps_position_then_gives_up() {
        let mut rng = ScriptedRandom::constant(0, 0.5);
        let (mut boss, _parts) = spawned(&mut rng);
        let start = boss.position();
        let mut model = HeadlessGameModel::new(LEVEL_WIDTH, LEVEL_H);
        model.hazards.push(Aabb2::new(Vec2::ZERO, Vec2::new(LEVEL_WIDTH, LEVEL_H)));

        assert!(futurism_ai(&boss).find_teleport_location(&boss, &model, &mut rng).is_none());

        let mut buffer = EffectBuffer::new();
        let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);
        tick(&mut boss, &mut env, 15);
        drop(env);

        assert_eq!(count_teleports(&buffer, TeleportKind::Out), 1);
        assert_eq!(count_teleports(&buffer, TeleportKind::In), 0, "без места не телепортируемся");
        assert_eq!(count_teleports(&buffer, TeleportKind::Failed), 0);
        assert_eq!(boss.state_name(), "TeleportAIState", "поиск продолжается");
        assert!((boss.position() - start).length() < 1e-5);

        let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);
        tick(&mut boss, &mut env, 30);
        drop(env);

        assert_eq!(count_teleports(&buffer, TeleportKind::Out), 1);
        assert_eq!(count_teleports(&buffer, TeleportKind::Failed), 1);
        assert_eq!(count_teleports(&buffer, TeleportKind::In), 0);
        assert_ne!(boss.state_name(), "TeleportAIState");
        assert!((boss.position() - start).length() < 1e-5, "позиция не изменилась");
    }

    #[test]
    fn test_teleport_lands_on_furthest_arena_position() {
        let mut rng = ScriptedRandom::constant(0, 0.5);
        let (mut boss, _parts) = spawned(&mut rng);
        let start = boss.position();
        let mut model = HeadlessGameModel::new(LEVEL_WIDTH, LEVEL_H);
        let mut buffer = EffectBuffer::new();
        let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);

        tick(&mut boss, &mut env, 13);
        drop(env);

        assert_eq!(count_teleports(&buffer, TeleportKind::In), 1);
        let pos = boss.position();
        assert!((pos - start).length() > 1.0, "босс переместился");
        let half = futurism_ai(&boss).half_size();
        assert!(arena_move_positions(FuturismArena::Left, half)
            .iter()
            .any(|p| (*p - pos).length() < 1e-3));
        // Самая дальняя позиция левой арены от стартовой (левый верхний угол)
        assert!((pos - Vec2::new(27.1, 10.0)).length() < 1e-3, "позиция {:?}", pos);
        assert_eq!(futurism_ai(&boss).arena(), FuturismArena::Left);
    }

    #[test]
    fn test_stage_one_rockets_crack_then_destroy_shields() {
        let mut rng = ScriptedRandom::constant(0, 0.5);
        let (mut boss, parts) = spawned(&mut rng);
        let mut model = HeadlessGameModel::new(LEVEL_WIDTH, LEVEL_H);
        let mut buffer = EffectBuffer::new();
        let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);

        // Лазер и мяч по щитам не проходят
        boss.on_projectile_collision(ProjectileKind::PaddleLaserBullet, parts.top_shield, &mut env);
        boss.on_ball_collision(parts.top_shield, &mut env);
        assert_eq!(boss.state_name(), "TeleportAIState");
        assert!(!boss.parts().is_weakpoint(parts.top_shield));

        boss.on_projectile_collision(ProjectileKind::PaddleRocket, parts.top_shield, &mut env);
        assert_eq!(boss.state_name(), "ShieldPartCrackedAIState");
        assert!(boss.parts().is_weakpoint(parts.top_shield));
        assert!((boss.total_life_percent() - (2.0 + 0.875) / 3.0).abs() < 1e-5);

        // Пока щит "трещит", повторная ракета игнорируется
        boss.on_projectile_collision(ProjectileKind::PaddleRocket, parts.top_shield, &mut env);
        assert!(boss.is_part_alive(parts.top_shield));
        tick(&mut boss, &mut env, 15);

        boss.on_projectile_collision(ProjectileKind::PaddleRocket, parts.top_shield, &mut env);
        assert_eq!(boss.state_name(), "ShieldPartDestroyedAIState");
        assert!(boss.is_part_dead(parts.top_shield));
        assert!((boss.total_life_percent() - (2.0 + 0.75) / 3.0).abs() < 1e-5);
        tick(&mut boss, &mut env, 20);

        for shield in [parts.bottom_shield, parts.left_shield, parts.right_shield] {
            boss.on_projectile_collision(ProjectileKind::PaddleRocket, shield, &mut env);
            tick(&mut boss, &mut env, 15);
            boss.on_projectile_collision(ProjectileKind::PaddleRocket, shield, &mut env);
            assert!(boss.is_part_dead(shield));
            if shield != parts.right_shield {
                tick(&mut boss, &mut env, 20);
            }
        }
        assert_eq!(boss.state_name(), "ShieldPartDestroyedAIState");

        let mut saw_angry = false;
        for _ in 0..60 {
            boss.update(DT, &mut env);
            saw_angry |= boss.state_name() == "AngryAIState";
            if boss.stage_name() == "FuturismStage2AI" {
                break;
            }
        }
        drop(env);

        assert!(saw_angry, "после последнего щита босс злится");
        assert_eq!(boss.stage_name(), "FuturismStage2AI");
        assert_eq!(boss.stage_changes(), 1);
        assert_eq!(boss.state_name(), "DestroyLevelBarrierAIState");
        assert!((boss.total_life_percent() - 2.0 / 3.0).abs() < 1e-5);
        assert_eq!(buffer.count_angry(), 1);
        assert_eq!(count_misc(&buffer, MiscBossEffect::ShieldShatter), 4);
        assert_eq!(count_misc(&buffer, MiscBossEffect::ShieldCracked), 4);
    }

    #[test]
    fn test_stage_two_destroys_level_barrier() {
        let mut rng = ScriptedRandom::constant(0, 0.5);
        let (mut boss, parts) = spawned_at(FuturismStage::Stage2, &mut rng);
        let (x, top_y, count) = barrier_column();
        let mut model = HeadlessGameModel::new(LEVEL_WIDTH, LEVEL_H).with_barrier(x, top_y, count);
        let mut buffer = EffectBuffer::new();
        let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);

        // Во время разрушения барьера урон не проходит
        boss.on_projectile_collision(ProjectileKind::PaddleRocket, parts.core_shield, &mut env);
        assert!(!boss.parts().is_weakpoint(parts.core_shield));

        tick(&mut boss, &mut env, 80);
        drop(env);

        assert_eq!(model.barrier_alive_count(), 0);
        let disintegrations = buffer
            .general_effects()
            .filter(|e| matches!(e, GeneralEffect::BarrierBlockDisintegration { .. }))
            .count();
        assert_eq!(disintegrations, 24);
        assert_eq!(futurism_ai(&boss).arena(), FuturismArena::Full);
        assert_eq!(model.beams.len(), 1, "один луч на весь барьер");
        let charges = buffer
            .boss_effects()
            .filter(|e| matches!(e, BossEffect::PowerCharge { .. }))
            .count();
        assert_eq!(charges, 1);
        assert_ne!(boss.state_name(), "DestroyLevelBarrierAIState");
        // Раскрутка ядра сброшена
        assert!(boss.parts().rotation(parts.core_assembly).z.abs() < 1e-5);
    }

    #[test]
    fn test_stage_two_freeze_crack_and_shatter_core_shield() {
        let mut rng = ScriptedRandom::constant(0, 0.5);
        let (mut boss, parts) = spawned_at(FuturismStage::Stage2, &mut rng);
        let mut model = HeadlessGameModel::new(LEVEL_WIDTH, LEVEL_H);
        let mut buffer = EffectBuffer::new();
        let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);

        // Барьера нет: после заряда сразу открывается весь уровень
        tick(&mut boss, &mut env, 30);
        assert_ne!(boss.state_name(), "DestroyLevelBarrierAIState");
        assert_eq!(futurism_ai(&boss).arena(), FuturismArena::Full);

        // Незамороженного босса мяч не трескает
        boss.on_ball_collision(parts.core_shield, &mut env);
        assert!(!boss.parts().is_weakpoint(parts.core_shield));

        boss.on_projectile_collision(ProjectileKind::PaddleIceBlast, parts.core_body, &mut env);
        assert_eq!(boss.state_name(), "FrozenAIState");
        assert!(boss
            .vulnerable_parts()
            .contains(&(parts.core_shield, DamageChannel::Ball)));

        boss.on_ball_collision(parts.core_shield, &mut env);
        assert_eq!(boss.state_name(), "ShieldPartCrackedAIState");
        assert!(boss.parts().is_weakpoint(parts.core_shield));
        assert!((boss.total_life_percent() - 0.5).abs() < 1e-5);

        tick(&mut boss, &mut env, 15);
        boss.on_projectile_collision(ProjectileKind::PaddleRocket, parts.core_shield, &mut env);
        assert_eq!(boss.state_name(), "ShieldPartDestroyedAIState");
        assert!(boss.is_part_dead(parts.core_shield));

        for _ in 0..60 {
            boss.update(DT, &mut env);
            if boss.stage_name() == "FuturismStage3AI" {
                break;
            }
        }
        drop(env);

        assert_eq!(boss.stage_name(), "FuturismStage3AI");
        assert_eq!(boss.stage_changes(), 1);
        assert!((boss.total_life_percent() - 1.0 / 3.0).abs() < 1e-5);
        assert_eq!(count_misc(&buffer, MiscBossEffect::FrozenInIce), 1);
        for bulb in parts.bulbs() {
            assert!(boss.parts().is_weakpoint(bulb), "лампы стали weakpoints");
        }
    }

    #[test]
    fn test_stage_three_bulbs_destroyed_by_ball_finish_boss() {
        let mut rng = ScriptedRandom::constant(0, 0.5);
        let (mut boss, parts) = spawned_at(FuturismStage::Stage3, &mut rng);
        let mut model = HeadlessGameModel::new(LEVEL_WIDTH, LEVEL_H);
        let mut buffer = EffectBuffer::new();
        let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);

        assert_eq!(boss.vulnerable_parts().len(), 4);
        // Ракеты ядру без щитов ничего не делают
        boss.on_projectile_collision(ProjectileKind::PaddleRocket, parts.top_bulb, &mut env);
        assert!(boss.is_part_alive(parts.top_bulb));

        let bulbs = parts.bulbs();
        for (i, bulb) in bulbs.iter().enumerate() {
            boss.on_ball_collision(*bulb, &mut env);
            assert_eq!(boss.state_name(), "BulbHitAndDestroyedAIState");
            assert!(boss.is_part_dead(*bulb));
            let expected = (3 - i) as f32 / 4.0 / 3.0;
            assert!((boss.total_life_percent() - expected).abs() < 1e-5);
            if i + 1 < bulbs.len() {
                assert!(!boss.is_finished());
                tick(&mut boss, &mut env, 20);
            }
        }
        assert!(boss.is_finished(), "последняя лампа завершает бой");

        tick(&mut boss, &mut env, 20);
        drop(env);

        assert_eq!(boss.state_name(), "FinalDeathThroesAIState");
        assert!(boss.is_finished());
        assert_eq!(boss.total_life_percent(), 0.0);
        assert_eq!(count_misc(&buffer, MiscBossEffect::BulbExplosion), 4);
        assert!(boss.vulnerable_parts().is_empty());
    }

    #[test]
    fn test_random_basic_state_tables() {
        let mut rng = ScriptedRandom::constant(0, 0.5);
        let (boss, _parts) = spawned(&mut rng);
        let ai = futurism_ai(&boss).clone();

        let mut rng = ScriptedRandom::new().with_unsigned(vec![0, 3, 5, 6, 7]);
        let picks: Vec<FuturismState> = (0..5).map(|_| ai.random_basic_attack_state(&boss, &mut rng)).collect();
        assert_eq!(
            picks,
            vec![
                FuturismState::BasicBurstLineFire,
                FuturismState::BasicBurstWaveFire,
                FuturismState::LaserBeamArc,
                FuturismState::LaserBeamTwitch,
                // Полная жизнь стадии → линия
                FuturismState::BasicBurstLineFire,
            ]
        );

        let mut rng = ScriptedRandom::new().with_unsigned(vec![0, 2, 3, 4]);
        let moves: Vec<FuturismState> = (0..4).map(|_| FuturismAi::random_basic_move_state(&mut rng)).collect();
        assert_eq!(
            moves,
            vec![
                FuturismState::MoveToPosition,
                FuturismState::MoveToPosition,
                FuturismState::Teleport,
                FuturismState::Teleport,
            ]
        );
    }

    #[test]
    fn test_wave_burst_is_symmetric_fan_at_paddle() {
        let mut rng = ScriptedRandom::constant(0, 0.5);
        let (boss, parts) = spawned_at(FuturismStage::Stage3, &mut rng);
        let ai = futurism_ai(&boss).clone();
        let mut model = HeadlessGameModel::new(LEVEL_WIDTH, LEVEL_H);
        let mut buffer = EffectBuffer::new();
        let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);

        ai.fire_burst_wave(&boss, &mut env);
        drop(env);

        assert_eq!(model.projectiles.len(), 5);
        let origin = boss.parts().world_position_2d(parts.core_body);
        let center = (model.paddle.center - origin).normalize();
        let mut angles: Vec<f32> = model
            .projectiles
            .iter()
            .map(|p| {
                assert_eq!(p.kind, ProjectileKind::BossLaserBullet);
                signed_angle_degrees(center, p.direction)
            })
            .collect();
        angles.sort_by(|a, b| a.total_cmp(b));
        for (angle, expected) in angles.iter().zip([-20.0, -10.0, 0.0, 10.0, 20.0]) {
            assert!((angle - expected).abs() < 1e-2, "угол {} вместо {}", angle, expected);
        }
    }

    #[test]
    fn test_stage_three_teleports_away_from_nearby_hazard() {
        let mut rng = ScriptedRandom::constant(0, 0.5);
        let (mut boss, parts) = spawned(&mut rng);
        let mut model = HeadlessGameModel::new(LEVEL_WIDTH, LEVEL_H);
        let mut buffer = EffectBuffer::new();

        let mut ai = FuturismAi::new(FuturismStage::Stage3, parts, &mut boss, &mut rng);
        {
            let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);
            ai.set_state(FuturismState::BasicBurstLineFire, &mut boss, &mut env);
        }
        boss.set_current_ai_immediately(BossAi::Futurism(ai));

        let start = boss.position();
        let aabb = boss.alive_aabb().expect("у живого босса есть AABB");
        model
            .hazards
            .push(Aabb2::from_center(Vec2::new(start.x, aabb.min.y - 3.0), Vec2::splat(0.5)));

        let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);
        boss.update(DT, &mut env);
        assert_eq!(boss.state_name(), "AvoidanceTeleportAIState");
        boss.update(DT, &mut env);
        drop(env);

        assert!(buffer
            .announcements
            .iter()
            .any(|a| matches!(a, Announcement::ClearActiveBossEffects)));
        assert_eq!(count_teleports(&buffer, TeleportKind::FastOut), 1);
        assert_eq!(count_teleports(&buffer, TeleportKind::In), 1);
        assert!((boss.position() - start).length() > 1.0, "босс ушёл от опасности");
        assert!(model.projectiles.is_empty(), "очередь прервана до первого выстрела");
    }

    #[test]
    fn test_teleport_out_announced_on_first_tick() {
        let mut rng = ScriptedRandom::constant(0, 0.5);
        let (mut boss, _parts) = spawned(&mut rng);
        let mut model = HeadlessGameModel::new(LEVEL_WIDTH, LEVEL_H);
        let mut buffer = EffectBuffer::new();
        let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);

        assert_eq!(boss.state_name(), "TeleportAIState");
        boss.update(DT, &mut env);
        drop(env);

        assert_eq!(count_teleports(&buffer, TeleportKind::Out), 1, "Out объявляется сразу");
        assert_eq!(count_teleports(&buffer, TeleportKind::In), 0);
    }

    #[test]
    fn test_barrier_charge_announced_once_with_zero_dt() {
        let mut rng = ScriptedRandom::constant(0, 0.5);
        let (mut boss, _parts) = spawned_at(FuturismStage::Stage2, &mut rng);
        let (x, top_y, count) = barrier_column();
        let mut model = HeadlessGameModel::new(LEVEL_WIDTH, LEVEL_H).with_barrier(x, top_y, count);
        let mut buffer = EffectBuffer::new();
        let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);

        boss.update(0.0, &mut env);
        boss.update(0.0, &mut env);
        boss.update(DT, &mut env);
        drop(env);

        assert_eq!(boss.state_name(), "DestroyLevelBarrierAIState");
        assert_eq!(count_power_charges(&buffer), 1, "заряд только на первом тике");
    }

    #[test]
    fn test_strategy_portal_zones_follow_block_grid() {
        assert_eq!(piece_cells(&rocket_strategy_portal_zone()).len(), 14);
        assert_eq!(piece_cells(&ice_strategy_portal_zone()).len(), 21);
        assert_eq!(FuturismStage::Stage1.strategy_portal_zone(), rocket_strategy_portal_zone());
        assert_eq!(FuturismStage::Stage3.strategy_portal_zone(), ice_strategy_portal_zone());
    }

    #[test]
    fn test_strategy_portal_links_arena_with_rocket_zone() {
        let mut rng = ScriptedRandom::constant(0, 0.5);
        let mut model = HeadlessGameModel::new(LEVEL_WIDTH, LEVEL_H);
        let mut buffer = EffectBuffer::new();
        let (mut boss, parts) = spawned_in_state(
            FuturismStage::Stage1,
            FuturismState::StationaryFireStrategyPortal,
            &mut model,
            &mut rng,
            &mut buffer,
        );
        assert_eq!(count_power_charges(&buffer), 1);

        let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);
        tick(&mut boss, &mut env, 15);
        assert_eq!(boss.state_name(), "StationaryFireStrategyPortalAIState");
        assert!(boss.parts().rotation(parts.core_shield).z.abs() > 1.0, "щит ядра крутится");
        drop(env);
        assert!(model.portals.is_empty(), "порталы открываются на середине состояния");

        let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);
        tick(&mut boss, &mut env, 30);
        drop(env);

        assert_ne!(boss.state_name(), "StationaryFireStrategyPortalAIState");
        assert!(boss.parts().rotation(parts.core_shield).z.abs() < 1e-5);
        assert_eq!(model.portals.len(), 2);
        let arena = arena_confines(FuturismArena::Left);
        let zone = rocket_strategy_portal_zone();
        assert!(model.portals.iter().any(|p| arena.contains(p.position)));
        assert!(model.portals.iter().any(|p| zone.contains(p.position)));
        let summons = buffer
            .boss_effects()
            .filter(|e| matches!(e, BossEffect::SummonPortals { positions, .. } if positions.len() == 2))
            .count();
        assert_eq!(summons, 1);
    }

    #[test]
    fn test_portal_retries_until_area_clears() {
        let mut rng = ScriptedRandom::constant(0, 0.5);
        let mut model = HeadlessGameModel::new(LEVEL_WIDTH, LEVEL_H);
        model.hazards.push(arena_confines(FuturismArena::Left));
        let mut buffer = EffectBuffer::new();
        let (mut boss, _parts) = spawned_in_state(
            FuturismStage::Stage1,
            FuturismState::StationaryFireStrategyPortal,
            &mut model,
            &mut rng,
            &mut buffer,
        );

        let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);
        tick(&mut boss, &mut env, 30);
        drop(env);
        assert!(model.portals.is_empty(), "арена занята - порталов нет");
        assert_eq!(boss.state_name(), "StationaryFireStrategyPortalAIState");

        model.hazards.clear();
        let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);
        tick(&mut boss, &mut env, 3);
        drop(env);
        assert_eq!(model.portals.len(), 2, "порталы открылись на следующем тике");
    }

    #[test]
    fn test_weapon_portal_links_both_sub_arenas() {
        let mut rng = ScriptedRandom::constant(0, 0.5);
        let mut model = HeadlessGameModel::new(LEVEL_WIDTH, LEVEL_H);
        let mut buffer = EffectBuffer::new();
        let (mut boss, _parts) = spawned_in_state(
            FuturismStage::Stage3,
            FuturismState::StationaryFireWeaponPortal,
            &mut model,
            &mut rng,
            &mut buffer,
        );

        let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);
        tick(&mut boss, &mut env, 25);
        drop(env);

        assert_eq!(boss.state_name(), "StationaryFireWeaponPortalAIState");
        assert_eq!(model.portals.len(), 2);
        for side in [FuturismArena::Left, FuturismArena::Right] {
            let confines = arena_confines(side);
            assert_eq!(
                model.portals.iter().filter(|p| confines.contains(p.position)).count(),
                1,
                "по порталу в каждой под-арене ({:?})",
                side
            );
        }
    }

    #[test]
    fn test_attracted_ball_travels_with_teleport_then_discarded() {
        let mut rng = ScriptedRandom::constant(0, 0.5);
        let mut model = HeadlessGameModel::new(LEVEL_WIDTH, LEVEL_H);
        model.spawn_portal(Vec2::new(50.0, 10.0), Vec2::ONE, 10.0);
        let speed = model.ball.map(|b| b.velocity.length()).unwrap_or_default();
        let mut buffer = EffectBuffer::new();
        let (mut boss, parts) = spawned_in_state(
            FuturismStage::Stage2,
            FuturismState::BallAttract,
            &mut model,
            &mut rng,
            &mut buffer,
        );
        assert!(model.portals.is_empty(), "притяжение закрывает порталы");

        let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);
        boss.update(DT, &mut env);
        drop(env);
        let ball = model.ball.expect("мяч есть");
        assert!(ball.attached_to_boss);
        assert_eq!(count_misc(&buffer, MiscBossEffect::AttractorBeam), 1);

        // Притягиваем до телепорта
        let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);
        for _ in 0..60 {
            if boss.state_name() == "TeleportAIState" {
                break;
            }
            boss.update(DT, &mut env);
        }
        drop(env);
        assert_eq!(boss.state_name(), "TeleportAIState");
        let ball = model.ball.expect("мяч есть");
        let core = boss.parts().world_position_2d(parts.core_body);
        let offset = ball.center - boss.position();
        assert!(ball.attached_to_boss);
        assert!(ball.center.distance(core) < 4.0, "мяч у ядра");
        let start = boss.position();

        let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);
        for _ in 0..40 {
            if boss.state_name() == "BallDiscardAIState" {
                break;
            }
            boss.update(DT, &mut env);
        }
        drop(env);
        assert_eq!(boss.state_name(), "BallDiscardAIState");
        assert!((boss.position() - start).length() > 1.0, "босс телепортировался");
        let ball = model.ball.expect("мяч есть");
        assert!(ball.attached_to_boss, "мяч всё ещё удерживается");
        assert!(
            (ball.center - boss.position() - offset).length() < 1e-3,
            "мяч перенесён вместе с боссом"
        );

        let core = boss.parts().world_position_2d(parts.core_body);
        let away = (ball.center - core).normalize();
        let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);
        tick(&mut boss, &mut env, 6);
        drop(env);
        assert_ne!(boss.state_name(), "BallDiscardAIState");
        let ball = model.ball.expect("мяч есть");
        assert!(!ball.attached_to_boss);
        assert!((ball.velocity.length() - speed).abs() < 1e-3, "скорость мяча сохраняется");
        assert!(ball.velocity.normalize().dot(away) > 0.99, "мяч выброшен от ядра");
    }

    #[test]
    fn test_beam_star_fires_from_each_alive_bulb() {
        let mut rng = ScriptedRandom::constant(0, 0.5);
        let mut model = HeadlessGameModel::new(LEVEL_WIDTH, LEVEL_H);
        let mut buffer = EffectBuffer::new();
        let (mut boss, parts) = spawned(&mut rng);
        let mut ai = FuturismAi::new(FuturismStage::Stage3, parts.clone(), &mut boss, &mut rng);
        boss.kill_part_or_log(parts.top_bulb);
        {
            let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);
            ai.set_state(FuturismState::LaserBeamStar, &mut boss, &mut env);
        }
        boss.set_current_ai_immediately(BossAi::Futurism(ai));
        assert_eq!(boss.state_name(), "LaserBeamStarAIState");
        assert_eq!(count_power_charges(&buffer), 3, "заряд на каждой живой лампе");

        let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);
        tick(&mut boss, &mut env, 8);
        drop(env);

        assert_eq!(model.beams.len(), 3, "первый залп - по лучу на лампу");
        let core = boss.parts().world_position_2d(parts.core_body);
        let spin = boss.parts().rotation(parts.core_assembly).z;
        assert!(spin.abs() > 1.0, "ядро вращается");
        for beam in &model.beams {
            assert!(((beam.origin - core).length() - CORE_BOSS_HALF_SIZE).abs() < 1e-3);
            assert!((beam.origin - core).normalize().dot(beam.direction) > 0.999);
            // Луч смотрит туда же, куда одна из живых ламп (левая, нижняя, правая)
            let matches_bulb = [90.0, 180.0, 270.0].iter().any(|deg| {
                let first_volley = rotate_degrees(Vec2::Y, deg + 6.0);
                first_volley.dot(beam.direction) > 0.999
            });
            assert!(matches_bulb, "луч {:?} не из лампы", beam.direction);
        }

        let mut env = BossEnv::new(&mut model, &mut rng, &mut buffer);
        for _ in 0..60 {
            if boss.state_name() != "LaserBeamStarAIState" {
                break;
            }
            boss.update(DT, &mut env);
        }
        drop(env);

        assert_ne!(boss.state_name(), "LaserBeamStarAIState");
        assert!(boss.parts().rotation(parts.core_assembly).z.abs() < 1e-5, "вращение сброшено");
        assert_eq!(model.beams.len() % 3, 0);
        assert!(model.beams.len() >= 15, "залпы повторяются, получено {}", model.beams.len());
    }
}
