pub mod record;
pub mod matrix;
pub mod similarity;
pub mod evaluate;
pub mod catalog;
pub mod serde;

use std::{fmt::Debug, hash::Hash};

use crate::{
    config::RecommenderConfig,
    recommender::{
        evaluate::scoring::{recommend_scored, Recommendation},
        matrix::RatingMatrix,
        record::RatingRecord,
        similarity::{CosineEngine, ItemSimilarityMatrix},
    },
};

/// The three stages bound to one configuration
///
/// Holds no rating state: every call works on the values passed in, so one
/// instance can serve any number of requests concurrently.
#[derive(Debug, Clone, Default)]
pub struct Recommender {
    pub config: RecommenderConfig,
}

impl Recommender {
    pub fn new(config: RecommenderConfig) -> Self {
        Self { config }
    }

    /// Matrix Builder stage
    pub fn build_matrix<K>(&self, records: &[RatingRecord<K>], category: &str) -> RatingMatrix<K>
    where
        K: Clone + Eq + Hash,
    {
        RatingMatrix::build_with_policy(records, category, self.config.duplicate_policy)
    }

    /// Similarity Engine stage
    pub fn similarity<K>(&self, matrix: &RatingMatrix<K>) -> ItemSimilarityMatrix<K>
    where
        K: Clone + Eq + Hash + Send + Sync,
    {
        ItemSimilarityMatrix::compute_with::<CosineEngine>(matrix, self.config.parallel_threshold)
    }

    /// Recommender stage, `top_n` from the config unless overridden
    pub fn recommend<K>(
        &self,
        user: &K,
        matrix: &RatingMatrix<K>,
        sim: &ItemSimilarityMatrix<K>,
        top_n: Option<usize>,
    ) -> Recommendation<K>
    where
        K: Clone + Eq + Hash + Ord + Debug,
    {
        recommend_scored(user, matrix, sim, top_n.unwrap_or(self.config.top_n))
    }

    /// All three stages for one category
    pub fn run<K>(&self, records: &[RatingRecord<K>], category: &str, user: &K) -> Recommendation<K>
    where
        K: Clone + Eq + Hash + Ord + Debug + Send + Sync,
    {
        let matrix = self.build_matrix(records, category);
        let sim = self.similarity(&matrix);
        self.recommend(user, &matrix, &sim, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommender::evaluate::scoring::RecommendSource;

    fn s(v: &str) -> String {
        v.to_string()
    }

    #[test]
    fn run_chains_the_stages() {
        let rec = |u: &str, i: &str, r: f64| RatingRecord::new(s(u), s(i), "ml", r);
        let records = vec![
            rec("A", "X", 5.0),
            rec("A", "Z", 3.0),
            rec("B", "X", 1.0),
            rec("B", "Y", 4.0),
        ];
        let engine = Recommender::default();
        let out = engine.run(&records, "ml", &s("A"));
        assert_eq!(out.source, RecommendSource::Personalized);
        assert_eq!(out.into_items(), vec![s("Y")]);

        let out = engine.run(&records, "ml", &s("nobody"));
        assert_eq!(out.into_items(), vec![s("X"), s("Y"), s("Z")]);
    }

    #[test]
    fn top_n_override_wins_over_config() {
        let rec = |u: &str, i: &str, r: f64| RatingRecord::new(s(u), s(i), "ml", r);
        let records = vec![rec("A", "X", 5.0), rec("A", "Y", 3.0), rec("A", "Z", 1.0)];
        let engine = Recommender::default();
        let m = engine.build_matrix(&records, "ml");
        let sim = engine.similarity(&m);
        assert_eq!(engine.recommend(&s("new"), &m, &sim, Some(1)).into_items(), vec![s("X")]);
        assert_eq!(engine.recommend(&s("new"), &m, &sim, None).ranking.len(), 3);
    }
}
