use approx::assert_abs_diff_eq;
use item_recommender::{recommend, ItemSimilarityMatrix, RatingMatrix, RatingRecord};
use proptest::prelude::*;

/// Small id spaces so users and items collide often
fn records() -> impl Strategy<Value = Vec<RatingRecord<u32>>> {
    prop::collection::vec(
        (0u32..6, 0u32..8, prop::bool::weighted(0.85), 0u32..=5),
        0..40,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .map(|(u, i, in_cat, r)| RatingRecord::new(u, i, if in_cat { "ml" } else { "db" }, r as f64))
            .collect()
    })
}

proptest! {
    #[test]
    fn rebuilding_is_deterministic(recs in records()) {
        let a = RatingMatrix::build(&recs, "ml");
        let b = RatingMatrix::build(&recs, "ml");
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(ItemSimilarityMatrix::compute(&a), ItemSimilarityMatrix::compute(&b));
    }

    #[test]
    fn similarity_is_symmetric_with_unit_diagonal(recs in records()) {
        let m = RatingMatrix::build(&recs, "ml");
        let sim = ItemSimilarityMatrix::compute(&m);
        for (j, a) in m.items().iter().enumerate() {
            let has_signal = m.item_column(j).any(|v| v > 0.0);
            let self_sim = sim.get(a, a).unwrap();
            if has_signal {
                assert_abs_diff_eq!(self_sim, 1.0, epsilon = 1e-9);
            } else {
                prop_assert_eq!(self_sim, 0.0);
            }
            for b in m.items() {
                let ab = sim.get(a, b).unwrap();
                let ba = sim.get(b, a).unwrap();
                assert_abs_diff_eq!(ab, ba, epsilon = 1e-12);
                prop_assert!((-1.0..=1.0).contains(&ab));
            }
        }
    }

    #[test]
    fn rated_items_are_never_recommended(recs in records(), user in 0u32..6, top_n in 0usize..10) {
        let m = RatingMatrix::build(&recs, "ml");
        let sim = ItemSimilarityMatrix::compute(&m);
        let out = recommend(&user, &m, &sim, top_n);
        if let Some(row) = m.user_row(&user) {
            let rated: Vec<u32> = m.items().iter().zip(row).filter(|(_, r)| **r > 0.0).map(|(i, _)| *i).collect();
            let unrated = m.n_items() - rated.len();
            // fallback only kicks in once every item is rated
            if unrated > 0 && top_n > 0 {
                for item in &out {
                    prop_assert!(!rated.contains(item), "item {} was already rated", item);
                }
            }
        }
    }

    #[test]
    fn output_is_bounded_and_full_when_possible(recs in records(), user in 0u32..10, top_n in 0usize..10) {
        let m = RatingMatrix::build(&recs, "ml");
        let sim = ItemSimilarityMatrix::compute(&m);
        let out = recommend(&user, &m, &sim, top_n);
        prop_assert!(out.len() <= top_n);
        let eligible = match m.user_row(&user) {
            Some(row) => {
                let unrated = row.iter().filter(|r| **r <= 0.0).count();
                if unrated == 0 { m.n_items() } else { unrated }
            }
            None => m.n_items(),
        };
        prop_assert_eq!(out.len(), top_n.min(eligible));
        let mut dedup = out.clone();
        dedup.sort_unstable();
        dedup.dedup();
        prop_assert_eq!(dedup.len(), out.len());
    }

    #[test]
    fn unknown_users_share_the_cold_start_list(recs in records(), top_n in 0usize..10) {
        let m = RatingMatrix::build(&recs, "ml");
        let sim = ItemSimilarityMatrix::compute(&m);
        // user ids 100+ never appear in the generated records
        prop_assert_eq!(recommend(&100, &m, &sim, top_n), recommend(&101, &m, &sim, top_n));
    }
}
