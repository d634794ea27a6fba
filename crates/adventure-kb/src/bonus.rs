//! Score and modifier arithmetic.
//!
//! Everything here is pure so it can be used by hydration, by the in-memory
//! store and directly by callers that only need the numbers.

/// Hit points a character always keeps, whatever its constitution.
pub const MIN_MAX_HIT_POINTS: i64 = 1;

/// Base hit points before the constitution modifier is applied.
pub const BASE_HIT_POINTS: i64 = 10;

/// DnD-style modifier: `floor((effective_score - 10) / 2)`.
///
/// Division rounds toward negative infinity, so 9 gives -1 rather than 0.
/// Defined for every `i64`.
pub fn modifier_for(effective_score: i64) -> i64 {
    effective_score.div_euclid(2) - 5
}

/// Total points contributed by a set of habits, each given as
/// `(completion_count, points_per_completion)`.
pub fn habit_points<I>(habits: I) -> i64
where
    I: IntoIterator<Item = (i64, i64)>,
{
    habits
        .into_iter()
        .map(|(completions, points)| completions.saturating_mul(points))
        .fold(0i64, i64::saturating_add)
}

/// Base score plus accumulated habit points.
pub fn effective_score(base_score: i64, habit_points: i64) -> i64 {
    base_score.saturating_add(habit_points)
}

/// Maximum hit points of a freshly created character.
pub fn max_hit_points(constitution: i64) -> i64 {
    (BASE_HIT_POINTS + modifier_for(constitution)).max(MIN_MAX_HIT_POINTS)
}

/// Applies a damage (negative) or healing (positive) delta, clamped to `[0, max_hp]`.
pub fn clamp_hit_points(current_hp: i64, delta: i64, max_hp: i64) -> i64 {
    current_hp.saturating_add(delta).clamp(0, max_hp.max(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifier_reference_values() {
        assert_eq!(modifier_for(10), 0);
        assert_eq!(modifier_for(11), 0);
        assert_eq!(modifier_for(9), -1);
        assert_eq!(modifier_for(20), 5);
        assert_eq!(modifier_for(1), -5);
        assert_eq!(modifier_for(0), -5);
    }

    #[test]
    fn test_modifier_is_floor_division() {
        for e in -40i64..=60 {
            let expected = ((e - 10) as f64 / 2.0).floor() as i64;
            assert_eq!(modifier_for(e), expected, "effective score {}", e);
        }
        assert_eq!(modifier_for(i64::MIN), i64::MIN / 2 - 5);
        assert_eq!(modifier_for(i64::MAX), i64::MAX / 2 - 5);
        assert_eq!(max_hit_points(i64::MIN), MIN_MAX_HIT_POINTS);
    }

    #[test]
    fn test_habit_points() {
        assert_eq!(habit_points(Vec::new()), 0);
        assert_eq!(habit_points(vec![(3, 2), (1, 5)]), 11);
    }

    #[test]
    fn test_effective_score() {
        assert_eq!(effective_score(12, 0), 12);
        assert_eq!(effective_score(12, 7), 19);
    }

    #[test]
    fn test_max_hit_points() {
        assert_eq!(max_hit_points(10), 10);
        assert_eq!(max_hit_points(14), 12);
        assert_eq!(max_hit_points(8), 9);
        // Constitution 0 would give 5, the floor only kicks in for absurd inputs
        assert_eq!(max_hit_points(-30), MIN_MAX_HIT_POINTS);
    }

    #[test]
    fn test_clamp_hit_points() {
        assert_eq!(clamp_hit_points(10, -3, 12), 7);
        assert_eq!(clamp_hit_points(2, -5, 12), 0);
        assert_eq!(clamp_hit_points(10, 8, 12), 12);
    }
}
