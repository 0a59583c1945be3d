//! Тесты детерминизма боя с боссом
//!
//! Одинаковый seed → идентичный бой (позиции, состояния, эффекты)

use bevy::prelude::*;
use boss_simulation::{
    create_headless_app, world_snapshot, AutoPlayer, BossEncounter, BossKind, BossSimulationPlugin, BossStatus,
    DeterministicRng, EncounterConfig,
};

/// Запускает бой и возвращает snapshot статуса + полного состояния боя
fn run_simulation(seed: u64, kind: BossKind, tick_count: usize) -> (Vec<u8>, Vec<u8>) {
    let mut app = create_headless_app(seed);
    app.add_plugins(BossSimulationPlugin);

    let mut config = EncounterConfig::for_boss(kind);
    config.seed = seed;
    let encounter = {
        let mut rng = app.world_mut().resource_mut::<DeterministicRng>();
        BossEncounter::new(&config, &mut *rng)
    };
    let status = encounter.status();
    app.world_mut().spawn((encounter, AutoPlayer::new(0.3), status));

    for _ in 0..tick_count {
        app.update();
    }

    (
        world_snapshot::<BossStatus>(app.world_mut()),
        world_snapshot::<BossEncounter>(app.world_mut()),
    )
}

#[test]
fn test_determinism_same_seed() {
    const SEED: u64 = 12345;
    const TICK_COUNT: usize = 600;

    for kind in BossKind::ALL {
        let first = run_simulation(SEED, kind, TICK_COUNT);
        let second = run_simulation(SEED, kind, TICK_COUNT);

        assert_eq!(
            first, second,
            "Бой {} с одинаковым seed ({}) дал разные результаты!",
            kind.name(),
            SEED
        );
    }
}

#[test]
fn test_determinism_multiple_runs() {
    const SEED: u64 = 42;
    const TICK_COUNT: usize = 900;

    // Запускаем 3 раза - все должны быть идентичны
    let snapshots: Vec<_> = (0..3)
        .map(|_| run_simulation(SEED, BossKind::Futurism, TICK_COUNT))
        .collect();

    for (i, snapshot) in snapshots.iter().enumerate().skip(1) {
        assert_eq!(snapshots[0], *snapshot, "Прогон {} дал результат отличный от прогона 0", i);
    }
}
