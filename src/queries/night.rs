use crate::config::Config;
use crate::error::Result;
use crate::types::{Logs, NightListener};
use std::collections::BTreeSet;

/// Half-open range of hours, `[start_hour, end_hour)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NightWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl Default for NightWindow {
    fn default() -> Self {
        Self {
            start_hour: 0,
            end_hour: 5,
        }
    }
}

impl NightWindow {
    pub fn from_config(config: &Config) -> Self {
        Self {
            start_hour: config.night_start_hour,
            end_hour: config.night_end_hour,
        }
    }

    pub fn contains(&self, hour: u32) -> bool {
        self.start_hour <= hour && hour < self.end_hour
    }
}

/// Distinct users with at least one listen whose stored hour falls in `window`.
/// Every non-empty timestamp must parse, including ones outside the window;
/// a null timestamp is never in the window.
pub fn night_listeners(logs: &Logs, window: NightWindow) -> Result<Vec<NightListener>> {
    let mut users = BTreeSet::new();
    for event in &logs.rows {
        if event.hour()?.is_some_and(|hour| window.contains(hour)) {
            users.insert(event.user_id.as_str());
        }
    }

    Ok(users
        .into_iter()
        .map(|user_id| NightListener {
            user_id: user_id.to_string(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::fixtures;

    #[test]
    fn test_window_boundaries() {
        let window = NightWindow::default();
        assert!(window.contains(0));
        assert!(window.contains(4));
        assert!(!window.contains(5));
        assert!(!window.contains(23));
    }

    #[test]
    fn test_distinct_night_users() {
        let logs = fixtures::logs(&[
            ("u1", "s1", "2024-01-01 00:00:00", "10"),
            ("u1", "s1", "2024-01-02 03:15:00", "10"),
            ("u2", "s1", "2024-01-01 05:00:00", "10"),
            ("u3", "s1", "2024-01-01 04:59:59", "10"),
            ("u4", "s1", "2024-01-01 23:59:59", "10"),
        ]);

        let users: Vec<_> = night_listeners(&logs, NightWindow::default())
            .unwrap()
            .into_iter()
            .map(|n| n.user_id)
            .collect();
        assert_eq!(users, vec!["u1", "u3"]);
    }

    #[test]
    fn test_custom_window() {
        let logs = fixtures::logs(&[
            ("u1", "s1", "2024-01-01 22:00:00", "10"),
            ("u2", "s1", "2024-01-01 02:00:00", "10"),
        ]);
        let window = NightWindow {
            start_hour: 21,
            end_hour: 24,
        };
        let users = night_listeners(&logs, window).unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].user_id, "u1");
    }

    #[test]
    fn test_null_timestamp_is_not_at_night() {
        let logs = fixtures::logs(&[
            ("u1", "s1", "2024-01-01 02:00:00", "100"),
            ("u1", "s1", "", ""),
            ("u2", "s1", "2024-01-01 03:00:00", "40"),
            ("u3", "s1", "", "10"),
        ]);
        let users: Vec<_> = night_listeners(&logs, NightWindow::default())
            .unwrap()
            .into_iter()
            .map(|n| n.user_id)
            .collect();
        assert_eq!(users, vec!["u1", "u2"]);
    }

    #[test]
    fn test_unparsable_timestamp_fails_query() {
        let logs = fixtures::logs(&[
            ("u1", "s1", "2024-01-01 01:00:00", "10"),
            ("u2", "s1", "midnight-ish", "10"),
        ]);
        assert!(night_listeners(&logs, NightWindow::default()).is_err());
    }
}
