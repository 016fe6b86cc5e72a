use plexguard_shared::DayOfWeek;

use crate::models::TimeRule;

/// Resolves whether the current wall-clock falls inside an enabled block
/// window for `device_identifier` on `day_of_week` (spec §4.3.1 step 4).
///
/// `rules` must already be filtered to `enabled = true` rows for the
/// session's user (this is what `TimeRuleRepository::for_user` returns).
/// Device-specific rules for the current day take precedence over
/// user-wide rules for that same day; other days are unaffected.
///
/// Cross-midnight windows (spec §9) are represented as two rows, one per
/// day, rather than wraparound arithmetic on a single row - a row whose
/// `start_time >= end_time` never matches.
pub fn is_blocked(rules: &[TimeRule], device_identifier: &str, day_of_week: DayOfWeek, wall_clock_hhmm: &str) -> bool {
    let todays_rules: Vec<&TimeRule> = rules.iter().filter(|rule| rule.enabled && rule.day_of_week == day_of_week).collect();

    let device_specific: Vec<&&TimeRule> =
        todays_rules.iter().filter(|rule| rule.device_identifier.as_deref() == Some(device_identifier)).collect();

    let applicable: Vec<&TimeRule> = if !device_specific.is_empty() {
        device_specific.into_iter().copied().collect()
    } else {
        todays_rules.into_iter().filter(|rule| rule.device_identifier.is_none()).collect()
    };

    applicable.iter().any(|rule| window_contains(&rule.start_time, &rule.end_time, wall_clock_hhmm))
}

fn window_contains(start: &str, end: &str, now: &str) -> bool {
    start < end && now >= start && now < end
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(device_identifier: Option<&str>, day: DayOfWeek, start: &str, end: &str) -> TimeRule {
        TimeRule {
            id: 1,
            user_id: "42".into(),
            device_identifier: device_identifier.map(str::to_string),
            day_of_week: day,
            start_time: start.into(),
            end_time: end.into(),
            enabled: true,
            rule_name: "test".into(),
        }
    }

    #[test]
    fn blocks_inside_a_user_wide_window() {
        let rules = vec![rule(None, 3, "20:00", "22:00")];
        assert!(is_blocked(&rules, "AAA", 3, "21:00"));
        assert!(!is_blocked(&rules, "AAA", 3, "22:00"));
        assert!(!is_blocked(&rules, "AAA", 4, "21:00"));
    }

    #[test]
    fn device_specific_rule_shadows_user_wide_rule_for_that_day() {
        let rules = vec![rule(None, 3, "20:00", "22:00"), rule(Some("AAA"), 3, "01:00", "02:00")];
        assert!(!is_blocked(&rules, "AAA", 3, "21:00"));
        assert!(is_blocked(&rules, "AAA", 3, "01:30"));
        assert!(is_blocked(&rules, "BBB", 3, "21:00"));
    }

    #[test]
    fn disabled_rules_never_block() {
        let mut disabled = rule(None, 3, "20:00", "22:00");
        disabled.enabled = false;
        assert!(!is_blocked(&[disabled], "AAA", 3, "21:00"));
    }
}
