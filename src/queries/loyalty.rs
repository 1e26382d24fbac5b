use super::inner_join;
use super::rank::top_n_per_partition;
use crate::error::Result;
use crate::types::{LoyaltyScore, Logs, Songs};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

/// Share of each user's total listening time spent in each genre they played,
/// as a percentage. Total time covers every log row, including rows whose song
/// is missing from the catalog. Null durations are left out of both sums; a
/// (user, genre) pair whose durations are all null scores null. Ordered by
/// (user_id, genre).
pub fn genre_loyalty(logs: &Logs, songs: &Songs) -> Result<Vec<LoyaltyScore>> {
    let mut user_total: HashMap<&str, f64> = HashMap::new();
    for event in &logs.rows {
        if let Some(duration) = event.duration()? {
            *user_total.entry(event.user_id.as_str()).or_default() += duration;
        }
    }

    let mut genre_time: HashMap<(&str, &str), Option<f64>> = HashMap::new();
    for row in inner_join(logs, songs) {
        let duration = row.event.duration()?;
        let time = genre_time
            .entry((row.event.user_id.as_str(), row.genre))
            .or_default();
        if let Some(duration) = duration {
            *time = Some(time.unwrap_or_default() + duration);
        }
    }

    let mut scores: Vec<LoyaltyScore> = genre_time
        .into_iter()
        .map(|((user_id, genre), time)| {
            let total = user_total.get(user_id).copied().unwrap_or_default();
            // all-zero durations would divide 0 by 0
            let loyalty_score =
                time.map(|time| if total > 0.0 { time / total * 100.0 } else { 0.0 });
            LoyaltyScore {
                genre: genre.to_string(),
                user_id: user_id.to_string(),
                loyalty_score,
            }
        })
        .collect();
    scores.sort_by(|a, b| a.user_id.cmp(&b.user_id).then_with(|| a.genre.cmp(&b.genre)));

    debug!("{} (user, genre) loyalty rows", scores.len());
    Ok(scores)
}

/// Top `n` users per genre by loyalty score, null scores last. Equal scores
/// rank by user_id ascending. Ordered by genre, then rank.
pub fn top_loyal_users(scores: Vec<LoyaltyScore>, n: usize) -> Vec<LoyaltyScore> {
    top_n_per_partition(
        scores,
        |s| s.genre.clone(),
        |a, b| {
            descending_nulls_last(a.loyalty_score, b.loyalty_score)
                .then_with(|| a.user_id.cmp(&b.user_id))
        },
        n,
    )
    .into_values()
    .flatten()
    .collect()
}

fn descending_nulls_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalyticsError;
    use crate::queries::fixtures;

    fn score(genre: &str, user_id: &str, loyalty_score: f64) -> LoyaltyScore {
        LoyaltyScore {
            genre: genre.into(),
            user_id: user_id.into(),
            loyalty_score: Some(loyalty_score),
        }
    }

    #[test]
    fn test_loyalty_sums_to_hundred_per_user() {
        let logs = fixtures::logs(&[
            ("u1", "s1", "2024-01-01 02:00:00", "100"),
            ("u1", "s2", "2024-01-01 10:00:00", "50"),
            ("u2", "s2", "2024-01-01 10:00:00", "30"),
            ("u2", "s3", "2024-01-01 11:00:00", "10"),
            ("u2", "s1", "2024-01-01 12:00:00", "60"),
        ]);
        let songs = fixtures::songs(&[("s1", "rock"), ("s2", "pop"), ("s3", "jazz")]);

        let scores = genre_loyalty(&logs, &songs).unwrap();
        assert_eq!(scores.len(), 5);
        for user in ["u1", "u2"] {
            let total: f64 = scores
                .iter()
                .filter(|s| s.user_id == user)
                .filter_map(|s| s.loyalty_score)
                .sum();
            assert!((total - 100.0).abs() < 1e-9, "{user}: {total}");
        }

        let rock_u1 = scores
            .iter()
            .find(|s| s.user_id == "u1" && s.genre == "rock")
            .unwrap();
        assert!((rock_u1.loyalty_score.unwrap() - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_unmatched_rows_count_toward_total_time() {
        let logs = fixtures::logs(&[
            ("u1", "s1", "2024-01-01 02:00:00", "25"),
            ("u1", "missing", "2024-01-01 03:00:00", "75"),
        ]);
        let songs = fixtures::songs(&[("s1", "rock")]);

        let scores = genre_loyalty(&logs, &songs).unwrap();
        assert_eq!(scores, vec![score("rock", "u1", 25.0)]);
    }

    #[test]
    fn test_zero_total_time_scores_zero() {
        let logs = fixtures::logs(&[("u1", "s1", "2024-01-01 02:00:00", "0")]);
        let songs = fixtures::songs(&[("s1", "rock")]);

        let scores = genre_loyalty(&logs, &songs).unwrap();
        assert_eq!(scores[0].loyalty_score, Some(0.0));
    }

    #[test]
    fn test_null_durations_are_skipped() {
        let logs = fixtures::logs(&[
            ("u1", "s1", "2024-01-01 02:00:00", "30"),
            ("u1", "s2", "2024-01-01 02:30:00", ""),
            ("u1", "s3", "2024-01-01 03:00:00", "90"),
            ("u1", "s1", "", ""),
        ]);
        let songs = fixtures::songs(&[("s1", "rock"), ("s2", "pop"), ("s3", "jazz")]);

        let scores = genre_loyalty(&logs, &songs).unwrap();
        assert_eq!(
            scores,
            vec![
                score("jazz", "u1", 75.0),
                LoyaltyScore {
                    genre: "pop".into(),
                    user_id: "u1".into(),
                    loyalty_score: None,
                },
                score("rock", "u1", 25.0),
            ]
        );
    }

    #[test]
    fn test_null_scores_rank_last() {
        let scores = vec![
            LoyaltyScore {
                genre: "pop".into(),
                user_id: "u0".into(),
                loyalty_score: None,
            },
            score("pop", "u2", 5.0),
            score("pop", "u1", 60.0),
        ];
        let top = top_loyal_users(scores, 10);
        let users: Vec<_> = top.iter().map(|s| s.user_id.as_str()).collect();
        assert_eq!(users, vec!["u1", "u2", "u0"]);
    }

    #[test]
    fn test_negative_duration_fails_query() {
        let logs = fixtures::logs(&[("u1", "s1", "2024-01-01 02:00:00", "-5")]);
        let songs = fixtures::songs(&[("s1", "rock")]);
        assert!(matches!(
            genre_loyalty(&logs, &songs).unwrap_err(),
            AnalyticsError::TypeCoercion { .. }
        ));
    }

    #[test]
    fn test_top_n_per_genre() {
        let mut scores: Vec<LoyaltyScore> = (0..12)
            .map(|i| score("rock", &format!("user_{i:02}"), i as f64))
            .collect();
        scores.push(score("pop", "user_00", 40.0));

        let top = top_loyal_users(scores, 10);
        assert_eq!(top.len(), 11);
        assert_eq!(top[0], score("pop", "user_00", 40.0));

        let rock: Vec<_> = top.iter().filter(|s| s.genre == "rock").collect();
        assert_eq!(rock.len(), 10);
        assert_eq!(rock[0].user_id, "user_11");
        assert_eq!(rock[9].user_id, "user_02");
        assert!(rock
            .windows(2)
            .all(|w| w[0].loyalty_score >= w[1].loyalty_score));
    }

    #[test]
    fn test_equal_scores_rank_by_user_id() {
        let scores = vec![
            score("rock", "u3", 50.0),
            score("rock", "u1", 50.0),
            score("rock", "u2", 50.0),
        ];
        let top = top_loyal_users(scores, 2);
        let users: Vec<_> = top.iter().map(|s| s.user_id.as_str()).collect();
        assert_eq!(users, vec!["u1", "u2"]);
    }
}
