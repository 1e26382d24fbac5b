//! The four analytic queries. Each reads `Logs`/`Songs` immutably and returns
//! a new relation, so they can run in any order or concurrently.

pub mod favorite_genre;
pub mod listen_time;
pub mod loyalty;
pub mod night;
pub mod rank;

pub use favorite_genre::favorite_genres;
pub use listen_time::average_listen_time;
pub use loyalty::{genre_loyalty, top_loyal_users};
pub use night::{night_listeners, NightWindow};

use crate::types::{ListenEvent, Logs, Songs};
use std::collections::HashMap;

/// A log row matched to one catalog genre by the inner join on `song_id`
#[derive(Debug, Clone, Copy)]
pub struct JoinedRow<'a> {
    pub event: &'a ListenEvent,
    pub genre: &'a str,
    /// (log row position, catalog match position) for first-seen ordering
    pub order: (usize, usize),
}

/// Inner join of `Logs` to `Songs` on `song_id`. Unmatched log rows are dropped;
/// a song_id listed several times in the catalog yields one row per listing.
pub fn inner_join<'a>(logs: &'a Logs, songs: &'a Songs) -> Vec<JoinedRow<'a>> {
    let index: HashMap<&str, Vec<&str>> = songs.genre_index();
    let mut joined = Vec::with_capacity(logs.len());
    for (pos, event) in logs.rows.iter().enumerate() {
        if let Some(genres) = index.get(event.song_id.as_str()) {
            for (k, genre) in genres.iter().copied().enumerate() {
                joined.push(JoinedRow {
                    event,
                    genre,
                    order: (pos, k),
                });
            }
        }
    }
    joined
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::types::{ListenEvent, Logs, Song, Songs};

    pub fn logs(rows: &[(&str, &str, &str, &str)]) -> Logs {
        Logs::new(
            rows.iter()
                .enumerate()
                .map(|(i, (u, s, t, d))| ListenEvent::from_raw(u, s, t, d, i as u64 + 2))
                .collect(),
        )
    }

    pub fn songs(rows: &[(&str, &str)]) -> Songs {
        Songs::new(
            rows.iter()
                .map(|(s, g)| Song {
                    song_id: s.to_string(),
                    genre: g.to_string(),
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures;
    use super::*;

    #[test]
    fn test_inner_join_drops_unmatched_rows() {
        let logs = fixtures::logs(&[
            ("u1", "s1", "2024-01-01 10:00:00", "10"),
            ("u1", "missing", "2024-01-01 11:00:00", "20"),
            ("u2", "s2", "2024-01-01 12:00:00", "30"),
        ]);
        let songs = fixtures::songs(&[("s1", "rock"), ("s2", "pop")]);

        let joined = inner_join(&logs, &songs);
        assert_eq!(joined.len(), 2);
        assert_eq!(joined[0].genre, "rock");
        assert_eq!(joined[1].event.user_id, "u2");
        assert_eq!(joined[1].order, (2, 0));
    }

    #[test]
    fn test_inner_join_multiplies_duplicate_catalog_rows() {
        let logs = fixtures::logs(&[("u1", "s1", "2024-01-01 10:00:00", "10")]);
        let songs = fixtures::songs(&[("s1", "rock"), ("s1", "indie")]);

        let joined = inner_join(&logs, &songs);
        let genres: Vec<_> = joined.iter().map(|j| j.genre).collect();
        assert_eq!(genres, vec!["rock", "indie"]);
    }
}
