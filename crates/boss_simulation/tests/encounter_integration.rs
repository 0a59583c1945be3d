//! Encounter integration test
//!
//! Бой headless через BossSimulationPlugin: автоигрок против босса.
//!
//! Проверяем:
//! - события смены стадии и эффектов доходят до ECS
//! - EffectBuffer опустошается каждый тик
//! - BossStatus компонент обновляется, жизнь в [0, 1]
//! - Нет паники/крашей

use bevy::prelude::*;
use boss_simulation::systems::dispatch_boss_effects;
use boss_simulation::*;

/// Всё, что системы отправили за прогон
#[derive(Resource, Default)]
struct Collected {
    stages: Vec<&'static str>,
    effects: usize,
    defeated: usize,
}

fn collect_events(
    mut collected: ResMut<Collected>,
    mut stage_events: EventReader<BossStageChanged>,
    mut effect_events: EventReader<BossEffectEvent>,
    mut defeated_events: EventReader<BossDefeated>,
) {
    for event in stage_events.read() {
        collected.stages.push(event.stage);
    }
    collected.effects += effect_events.read().count();
    collected.defeated += defeated_events.read().count();
}

/// Helper: App с плагином, сборщиком событий и одним боем
fn create_encounter_app(seed: u64, kind: BossKind, hit_interval: f32) -> (App, Entity) {
    let mut app = create_headless_app(seed);
    app.add_plugins(BossSimulationPlugin)
        .init_resource::<Collected>()
        .add_systems(FixedUpdate, collect_events.after(dispatch_boss_effects));

    let config = EncounterConfig::for_boss(kind);
    let encounter = {
        let mut rng = app.world_mut().resource_mut::<DeterministicRng>();
        BossEncounter::new(&config, &mut *rng)
    };
    let status = encounter.status();
    let entity = app
        .world_mut()
        .spawn((encounter, AutoPlayer::new(hit_interval), status))
        .id();

    (app, entity)
}

/// Test: Futurism доходит до второй стадии под ракетами автоигрока
#[test]
fn test_futurism_reaches_second_stage() {
    let (mut app, entity) = create_encounter_app(42, BossKind::Futurism, 0.2);

    for _ in 0..1500 {
        app.update();
    }

    let collected = app.world().resource::<Collected>();
    assert!(
        collected.stages.contains(&"FuturismStage2AI"),
        "Ожидалась смена стадии на FuturismStage2AI, получено {:?}",
        collected.stages
    );
    assert!(collected.effects > 0, "Эффекты должны доходить до ECS");
    assert!(collected.defeated <= 1, "BossDefeated отправляется не больше одного раза");

    let encounter = app.world().get::<BossEncounter>(entity).unwrap();
    assert!(encounter.effects.is_empty(), "Буфер эффектов должен опустошаться");
    assert!(encounter.ticks > 0);

    let status = app.world().get::<BossStatus>(entity).unwrap();
    assert_eq!(*status, encounter.status(), "BossStatus компонент отстаёт от босса");
    assert!(status.stage_changes >= 1);
    assert!(status.life_percent < 1.0, "После смены стадии жизнь должна уменьшиться");
}

/// Test: у всех архетипов процент жизни остаётся в [0, 1]
#[test]
fn test_life_percent_stays_in_range_for_all_bosses() {
    for kind in BossKind::ALL {
        let (mut app, entity) = create_encounter_app(7, kind, 0.25);

        for tick in 0..900 {
            app.update();

            let status = app.world().get::<BossStatus>(entity).unwrap();
            assert!(
                (0.0..=1.0).contains(&status.life_percent),
                "{}: жизнь {} вне [0, 1] на тике {}",
                kind.name(),
                status.life_percent,
                tick
            );
        }
    }
}

/// Test: без автоигрока босс живёт и ничего не теряет
#[test]
fn test_boss_without_player_keeps_full_life() {
    let mut app = create_headless_app(3);
    app.add_plugins(BossSimulationPlugin);

    let config = EncounterConfig::for_boss(BossKind::Classical);
    let encounter = {
        let mut rng = app.world_mut().resource_mut::<DeterministicRng>();
        BossEncounter::new(&config, &mut *rng)
    };
    let entity = app.world_mut().spawn(encounter).id();

    for _ in 0..600 {
        app.update();
    }

    let encounter = app.world().get::<BossEncounter>(entity).unwrap();
    assert_eq!(encounter.boss.stage_changes(), 0);
    assert!(!encounter.is_defeated());
    assert!(encounter.ticks > 500, "Каждый update после первого - один fixed-тик");
    assert!((encounter.status().life_percent - 1.0).abs() < 1e-4);
}
