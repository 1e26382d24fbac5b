use super::inner_join;
use super::rank::top_n_per_partition;
use crate::error::Result;
use crate::types::{FavoriteGenre, Logs, Songs};
use std::collections::HashMap;
use tracing::debug;

/// One row of `UserGenreCounts`
#[derive(Debug, Clone, PartialEq)]
pub struct UserGenreCount {
    pub user_id: String,
    pub genre: String,
    pub count: u64,
    /// Position of the first joined log row for this pair
    pub first_seen: (usize, usize),
}

/// Joins logs to songs and counts rows per (user_id, genre).
pub fn user_genre_counts(logs: &Logs, songs: &Songs) -> Vec<UserGenreCount> {
    let mut counts: HashMap<(&str, &str), UserGenreCount> = HashMap::new();
    for row in inner_join(logs, songs) {
        counts
            .entry((row.event.user_id.as_str(), row.genre))
            .and_modify(|c| c.count += 1)
            .or_insert_with(|| UserGenreCount {
                user_id: row.event.user_id.clone(),
                genre: row.genre.to_string(),
                count: 1,
                first_seen: row.order,
            });
    }
    counts.into_values().collect()
}

/// Most-listened genre per user, by joined row count. Equal counts go to the
/// genre the user was first seen listening to. Ordered by user_id.
pub fn favorite_genres(logs: &Logs, songs: &Songs) -> Result<Vec<FavoriteGenre>> {
    let counts = user_genre_counts(logs, songs);
    debug!("{} (user, genre) groups", counts.len());

    let ranked = top_n_per_partition(
        counts,
        |c| c.user_id.clone(),
        |a, b| b.count.cmp(&a.count).then(a.first_seen.cmp(&b.first_seen)),
        1,
    );

    Ok(ranked
        .into_values()
        .flatten()
        .map(|c| FavoriteGenre {
            user_id: c.user_id,
            genre: c.genre,
            genre_listen_count: c.count,
        })
        .collect())
}
