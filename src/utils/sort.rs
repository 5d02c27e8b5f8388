use std::cmp::Ordering;

/// Ranking order: score descending, then key ascending.
/// `total_cmp` keeps the order total so equal scores always fall to the key.
#[inline]
pub fn rank_cmp<K: Ord>(a: &(K, f64), b: &(K, f64)) -> Ordering {
    b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0))
}

/// Sort `(key, score)` pairs into ranking order.
/// NaN scores are removed first.
pub fn sort_ranking<K: Ord>(list: &mut Vec<(K, f64)>) {
    list.retain(|(_, s)| !s.is_nan());
    list.sort_unstable_by(rank_cmp);
}

/// Partial sort: only the first `top_n` entries are guaranteed ordered,
/// the rest are dropped.
pub fn top_n_ranking<K: Ord>(list: &mut Vec<(K, f64)>, top_n: usize) {
    list.retain(|(_, s)| !s.is_nan());
    if top_n == 0 {
        list.clear();
        return;
    }
    if top_n < list.len() {
        list.select_nth_unstable_by(top_n - 1, rank_cmp);
        list.truncate(top_n);
    }
    list.sort_unstable_by(rank_cmp);
}
