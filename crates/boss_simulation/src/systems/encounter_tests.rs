//! Tests for encounter component and auto player.

#[cfg(test)]
mod tests {
    use super::super::encounter::{AutoPlayer, BossEncounter};
    use crate::ai::BossEnv;
    use crate::boss::BossKind;
    use crate::config::EncounterConfig;
    use crate::effects::EffectBuffer;
    use crate::random::ScriptedRandom;

    #[test]
    fn test_futurism_encounter_builds_barrier_and_paddle_limits() {
        let mut config = EncounterConfig::for_boss(BossKind::Futurism);
        config.paddle_max_speed = 18.0;
        let mut rng = ScriptedRandom::constant(0, 0.5);

        let encounter = BossEncounter::new(&config, &mut rng);

        assert_eq!(encounter.model.barrier_alive_count(), 24);
        assert_eq!(encounter.model.paddle_max_speed, 18.0);
        assert_eq!(encounter.status().stage, "FuturismStage1AI");
        assert!(!encounter.is_defeated());
        assert_eq!(encounter.ticks, 0);
    }

    #[test]
    fn test_other_bosses_have_no_barrier() {
        let mut rng = ScriptedRandom::constant(0, 0.5);
        for kind in [BossKind::Classical, BossKind::GothicRomantic, BossKind::Deco, BossKind::Nouveau] {
            let encounter = BossEncounter::new(&EncounterConfig::for_boss(kind), &mut rng);
            assert_eq!(encounter.model.barrier_alive_count(), 0, "{:?}", kind);
            assert_eq!(encounter.boss.kind(), kind);
        }
    }

    #[test]
    fn test_auto_player_hits_after_interval() {
        let config = EncounterConfig::for_boss(BossKind::Futurism);
        let mut rng = ScriptedRandom::constant(0, 0.5);
        let mut encounter = BossEncounter::new(&config, &mut rng);
        let mut buffer = EffectBuffer::new();
        let mut player = AutoPlayer::new(0.5);

        let mut env = BossEnv::new(&mut encounter.model, &mut rng, &mut buffer);
        assert!(!player.tick(0.25, &mut encounter.boss, &mut env));
        assert!(player.tick(0.25, &mut encounter.boss, &mut env), "интервал истёк");
        drop(env);

        assert_eq!(player.hits, 1);
        // Ракета в первый уязвимый внешний щит его трескает
        assert_eq!(buffer.count_hurt(), 1);
        assert_eq!(encounter.boss.state_name(), "ShieldPartCrackedAIState");
    }

    #[test]
    fn test_auto_player_idle_when_nothing_vulnerable() {
        let config = EncounterConfig::for_boss(BossKind::Futurism);
        let mut rng = ScriptedRandom::constant(0, 0.5);
        let mut encounter = BossEncounter::new(&config, &mut rng);
        let mut buffer = EffectBuffer::new();
        let mut player = AutoPlayer::new(0.1);

        let mut env = BossEnv::new(&mut encounter.model, &mut rng, &mut buffer);
        assert!(player.tick(0.1, &mut encounter.boss, &mut env));
        // Пока щит трещит, уязвимых частей нет
        assert!(encounter.boss.vulnerable_parts().is_empty());
        assert!(!player.tick(0.1, &mut encounter.boss, &mut env));
        drop(env);

        assert_eq!(player.hits, 1);
    }
}
