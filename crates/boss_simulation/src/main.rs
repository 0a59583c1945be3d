//! Headless прогон боя с боссом
//!
//! `boss_simulation [classical|gothic|deco|futurism|nouveau] [seed]`
//! Автоигрок бьёт по уязвимым частям, пока босс не побеждён или не кончились тики.

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use boss_simulation::logger::{log_info, log_warning};
use boss_simulation::{
    create_headless_app, AutoPlayer, BossEncounter, BossKind, BossSimulationPlugin, DeterministicRng, EncounterConfig,
};

fn parse_kind(arg: &str) -> Option<BossKind> {
    match arg.to_ascii_lowercase().as_str() {
        "classical" => Some(BossKind::Classical),
        "gothic" | "gothicromantic" => Some(BossKind::GothicRomantic),
        "deco" => Some(BossKind::Deco),
        "futurism" => Some(BossKind::Futurism),
        "nouveau" => Some(BossKind::Nouveau),
        _ => None,
    }
}

fn main() {
    let mut args = std::env::args().skip(1);
    let mut config = EncounterConfig::default();

    if let Some(arg) = args.next() {
        match parse_kind(&arg) {
            Some(kind) => {
                let seed = config.seed;
                config = EncounterConfig::for_boss(kind);
                config.seed = seed;
            }
            None => log_warning(&format!("Unknown boss kind '{}', using {}", arg, config.boss_kind.name())),
        }
    }
    if let Some(arg) = args.next() {
        match arg.parse::<u64>() {
            Ok(seed) => config.seed = seed,
            Err(err) => log_warning(&format!("Bad seed '{}': {}", arg, err)),
        }
    }

    println!(
        "Starting boss simulation: {} (seed: {})",
        config.boss_kind.name(),
        config.seed
    );

    let mut app = create_headless_app(config.seed);
    app.insert_resource(Time::<Fixed>::from_hz(config.fixed_hz))
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(
            1.0 / config.fixed_hz,
        )))
        .add_plugins(BossSimulationPlugin);

    let encounter = {
        let mut rng = app.world_mut().resource_mut::<DeterministicRng>();
        BossEncounter::new(&config, &mut *rng)
    };
    let status = encounter.status();
    let entity = app
        .world_mut()
        .spawn((encounter, AutoPlayer::default(), status))
        .id();

    // Первый update только запускает часы
    app.update();

    for tick in 0..config.max_ticks {
        app.update();

        let Some(encounter) = app.world().get::<BossEncounter>(entity) else {
            break;
        };
        let status = encounter.status();

        if tick % 100 == 0 {
            println!(
                "Tick {}: {} / {} life {:.1}%",
                tick,
                status.stage,
                status.state,
                status.life_percent * 100.0
            );
        }

        if encounter.is_defeated() {
            log_info(&format!(
                "{} defeated at tick {} ({} projectiles spawned)",
                config.boss_kind.name(),
                tick,
                encounter.projectiles_spawned
            ));
            break;
        }
    }

    println!("Simulation complete!");
}
