use crate::error::Result;
use crate::types::{AverageListenTime, Logs};
use std::collections::BTreeMap;

/// Mean `duration_sec` per user over every log row, joined or not. Null
/// durations are left out of both the sum and the count; a user with no
/// non-null duration still gets a row, with a null average.
pub fn average_listen_time(logs: &Logs) -> Result<Vec<AverageListenTime>> {
    let mut totals: BTreeMap<&str, (f64, u64)> = BTreeMap::new();
    for event in &logs.rows {
        let duration = event.duration()?;
        let entry = totals.entry(event.user_id.as_str()).or_insert((0.0, 0));
        if let Some(duration) = duration {
            entry.0 += duration;
            entry.1 += 1;
        }
    }

    Ok(totals
        .into_iter()
        .map(|(user_id, (sum, count))| AverageListenTime {
            user_id: user_id.to_string(),
            avg_duration: (count > 0).then(|| sum / count as f64),
        })
        .collect())
}
