//! Tests for the boss movement model.

#[cfg(test)]
mod tests {
    use bevy::prelude::*;

    use super::super::motion::{furthest_positions, Motion, DEFAULT_TARGET_ERROR_SQ};
    use crate::geometry::Aabb2;
    use crate::random::ScriptedRandom;

    #[test]
    fn test_ease_does_not_overshoot() {
        let mut motion = Motion::new(10.0);
        motion.desired_vel = Vec2::new(3.0, -1.0);

        motion.ease(0.2); // шаг 2.0
        assert_eq!(motion.curr_vel, Vec2::new(2.0, -1.0));
        motion.ease(0.2);
        assert_eq!(motion.curr_vel, Vec2::new(3.0, -1.0), "скорость не должна перелетать desired");
    }

    #[test]
    fn test_arrives_when_within_error() {
        let mut motion = Motion::new(10.0);
        motion.set_target(Vec2::ZERO, Vec2::new(10.0, 0.0));
        motion.curr_vel = Vec2::new(5.0, 0.0);

        let arrived = motion.move_to_target_position(Vec2::new(10.0 - DEFAULT_TARGET_ERROR_SQ.sqrt() * 0.5, 0.0), 8.0);
        assert!(arrived);
        assert!(motion.is_stopped());
    }

    #[test]
    fn test_target_error_is_squared_distance() {
        // Линейное отклонение больше константы, но его квадрат меньше
        let offset = DEFAULT_TARGET_ERROR_SQ.sqrt() * 0.9;
        assert!(offset > DEFAULT_TARGET_ERROR_SQ);

        let mut motion = Motion::new(10.0);
        motion.set_target(Vec2::ZERO, Vec2::new(10.0, 0.0));
        assert!(
            motion.move_to_target_position(Vec2::new(10.0 - offset, 0.0), 8.0),
            "сравнение идёт с квадратом расстояния"
        );

        let mut motion = Motion::new(10.0);
        motion.set_target(Vec2::ZERO, Vec2::new(10.0, 0.0));
        let outside = DEFAULT_TARGET_ERROR_SQ.sqrt() * 1.5;
        assert!(!motion.move_to_target_position(Vec2::new(10.0 - outside, 0.0), 8.0));
    }

    #[test]
    fn test_overshoot_counts_as_arrival() {
        let mut motion = Motion::new(10.0);
        motion.set_target(Vec2::ZERO, Vec2::new(10.0, 0.0));
        assert!(motion.move_to_target_position(Vec2::new(12.0, 0.0), 8.0));
    }

    #[test]
    fn test_far_target_sets_full_speed() {
        let mut motion = Motion::new(10.0);
        motion.set_target(Vec2::ZERO, Vec2::new(0.0, 20.0));
        assert!(!motion.move_to_target_position(Vec2::ZERO, 8.0));
        assert_eq!(motion.desired_vel, Vec2::new(0.0, 8.0));
    }

    #[test]
    fn test_brakes_near_target() {
        let mut motion = Motion::new(10.0);
        motion.set_target(Vec2::ZERO, Vec2::new(10.0, 0.0));
        // v = 10 → тормозной путь 5, до цели 2
        motion.curr_vel = Vec2::new(10.0, 0.0);
        assert!(!motion.move_to_target_position(Vec2::new(8.0, 0.0), 10.0));
        assert_eq!(motion.desired_vel, Vec2::ZERO);
    }

    #[test]
    fn test_reflect_within_points_inward() {
        let mut motion = Motion::new(10.0);
        let bounds = Aabb2::new(Vec2::ZERO, Vec2::new(10.0, 10.0));
        let mut rng = ScriptedRandom::constant(0, 0.5);

        motion.desired_vel = Vec2::new(-4.0, 0.0);
        motion.reflect_within(Vec2::new(-0.1, 5.0), &bounds, 4.0, &mut rng);
        assert!(motion.desired_vel.x > 0.0);
        assert!((motion.desired_vel.length() - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_reflect_within_unsticks_zero_velocity() {
        let mut motion = Motion::new(10.0);
        let bounds = Aabb2::new(Vec2::ZERO, Vec2::new(10.0, 10.0));
        let mut rng = ScriptedRandom::constant(0, 0.5); // jitter = 0

        motion.reflect_within(Vec2::new(0.0, 5.0), &bounds, 3.0, &mut rng);
        assert!((motion.desired_vel - Vec2::new(3.0, 0.0)).length() < 1e-4, "должен двигаться к центру");
    }

    #[test]
    fn test_furthest_positions_order() {
        let candidates = [Vec2::new(1.0, 0.0), Vec2::new(5.0, 0.0), Vec2::new(3.0, 0.0)];
        let result = furthest_positions(Vec2::ZERO, &candidates, 2);
        assert_eq!(result, vec![Vec2::new(5.0, 0.0), Vec2::new(3.0, 0.0)]);
    }
}
