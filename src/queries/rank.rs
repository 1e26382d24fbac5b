use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Window ranking: splits `rows` into partitions by key, orders each partition with
/// `cmp` and keeps the first `n` rows (row_number <= n). Partitions come back in
/// ascending key order. `cmp` must be a total order for the result to be deterministic.
pub fn top_n_per_partition<T, K, P, C>(rows: Vec<T>, partition: P, cmp: C, n: usize) -> BTreeMap<K, Vec<T>>
where
    K: Ord,
    P: Fn(&T) -> K,
    C: Fn(&T, &T) -> Ordering,
{
    let mut partitions: BTreeMap<K, Vec<T>> = BTreeMap::new();
    for row in rows {
        partitions.entry(partition(&row)).or_default().push(row);
    }
    for rows in partitions.values_mut() {
        rows.sort_by(&cmp);
        rows.truncate(n);
    }
    partitions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_top_rows_per_partition() {
        let rows = vec![("a", 3), ("b", 1), ("a", 5), ("a", 4), ("b", 2)];
        let ranked = top_n_per_partition(rows, |r| r.0, |x, y| y.1.cmp(&x.1), 2);

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked["a"], vec![("a", 5), ("a", 4)]);
        assert_eq!(ranked["b"], vec![("b", 2), ("b", 1)]);
    }

    #[test]
    fn test_partitions_in_key_order() {
        let rows = vec![("z", 1), ("m", 1), ("a", 1)];
        let ranked = top_n_per_partition(rows, |r| r.0, |x, y| x.1.cmp(&y.1), 1);
        let keys: Vec<_> = ranked.keys().copied().collect();
        assert_eq!(keys, vec!["a", "m", "z"]);
    }
}
