use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

/// One session's inputs to the concurrent-cap algorithm (spec §4.3.2),
/// already resolved from the snapshot/registry/history so this module
/// stays a pure function of its arguments.
#[derive(Debug, Clone)]
pub struct CountableInput {
    pub user_id: String,
    pub session_id: String,
    pub session_key: String,
    pub started_at: DateTime<Utc>,
    pub is_plexamp: bool,
    pub exclude_from_concurrent_limit: bool,
    pub has_active_temp_grant: bool,
}

/// Resolves which sessions the concurrent-stream cap selects for
/// termination, per user, across the whole snapshot. Selected sessions are
/// excluded from the per-session policy loop (spec §4.3.2, last paragraph).
pub fn select_for_termination(
    sessions: &[CountableInput],
    user_limit: impl Fn(&str) -> Option<i64>,
    global_limit: i64,
    include_temp_access: bool,
) -> HashSet<String> {
    let mut by_user: HashMap<&str, Vec<&CountableInput>> = HashMap::new();
    for session in sessions {
        by_user.entry(session.user_id.as_str()).or_default().push(session);
    }

    let mut selected = HashSet::new();

    for (user_id, user_sessions) in by_user {
        let limit = user_limit(user_id).unwrap_or(global_limit);
        if limit == 0 {
            continue;
        }

        let mut countable: Vec<&&CountableInput> = user_sessions
            .iter()
            .filter(|s| !s.is_plexamp)
            .filter(|s| !s.exclude_from_concurrent_limit)
            .filter(|s| include_temp_access || !s.has_active_temp_grant)
            .collect();

        if countable.len() as i64 <= limit {
            continue;
        }

        countable.sort_by(|a, b| b.started_at.cmp(&a.started_at).then_with(|| b.session_key.cmp(&a.session_key)));

        let excess = countable.len() - limit as usize;
        for session in countable.into_iter().take(excess) {
            selected.insert(session.session_id.clone());
        }
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(user_id: &str, session_id: &str, session_key: &str, started_at: DateTime<Utc>) -> CountableInput {
        CountableInput {
            user_id: user_id.into(),
            session_id: session_id.into(),
            session_key: session_key.into(),
            started_at,
            is_plexamp: false,
            exclude_from_concurrent_limit: false,
            has_active_temp_grant: false,
        }
    }

    #[test]
    fn terminates_the_newest_excess_sessions() {
        let base = "2024-01-01T10:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let sessions = vec![
            input("u1", "s_a", "k_a", base),
            input("u1", "s_b", "k_b", base + chrono::Duration::minutes(5)),
            input("u1", "s_c", "k_c", base + chrono::Duration::minutes(10)),
        ];

        let selected = select_for_termination(&sessions, |_| None, 2, true);
        assert_eq!(selected.len(), 1);
        assert!(selected.contains("s_c"));
    }

    #[test]
    fn plexamp_sessions_are_never_counted() {
        let base = Utc::now();
        let mut plexamp = input("u1", "s_a", "k_a", base);
        plexamp.is_plexamp = true;
        let sessions = vec![plexamp, input("u1", "s_b", "k_b", base)];

        let selected = select_for_termination(&sessions, |_| None, 1, true);
        assert!(selected.is_empty());
    }

    #[test]
    fn zero_global_limit_means_unlimited() {
        let base = Utc::now();
        let sessions = vec![input("u1", "s_a", "k_a", base), input("u1", "s_b", "k_b", base)];
        let selected = select_for_termination(&sessions, |_| None, 0, true);
        assert!(selected.is_empty());
    }

    #[test]
    fn excluding_temp_access_sessions_from_the_cap() {
        let base = Utc::now();
        let mut temp = input("u1", "s_a", "k_a", base);
        temp.has_active_temp_grant = true;
        let sessions = vec![temp, input("u1", "s_b", "k_b", base)];

        let selected = select_for_termination(&sessions, |_| None, 1, false);
        assert!(selected.is_empty());
    }
}
