use std::{fmt::Debug, hash::Hash};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    recommender::{matrix::RatingMatrix, similarity::ItemSimilarityMatrix},
    utils::{math::dot_dense, sort::{sort_ranking, top_n_ranking}},
};

/// Ranked `(item, score)` list, highest first
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranking<K> {
    pub list: Vec<(K, f64)>,
}

impl<K: Ord> Ranking<K> {
    pub fn new(list: Vec<(K, f64)>) -> Self {
        Ranking { list }
    }

    /// Sort by descending score, ties by ascending item id.
    /// NaN scores are dropped.
    pub fn sort_by_score(&mut self) -> &mut Self {
        sort_ranking(&mut self.list);
        self
    }

    /// Keep only the best `top_n`, in ranking order
    pub fn truncate_top(&mut self, top_n: usize) -> &mut Self {
        top_n_ranking(&mut self.list, top_n);
        self
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn into_keys(self) -> Vec<K> {
        self.list.into_iter().map(|(k, _)| k).collect()
    }
}

impl<K> Debug for Ranking<K>
where
    K: Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if f.alternate() {
            writeln!(f, "Ranking [")?;
            for (key, score) in &self.list {
                writeln!(f, "    {:?}: {:.6}", key, score)?;
            }
            write!(f, "]")
        } else {
            f.debug_list().entries(&self.list).finish()
        }
    }
}

/// Which path produced a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendSource {
    /// similarity-weighted average of the user's own ratings
    Personalized,
    /// global mean rating, used for unknown or exhausted users
    Popularity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation<K> {
    pub ranking: Ranking<K>,
    pub source: RecommendSource,
}

impl<K: Ord> Recommendation<K> {
    pub fn into_items(self) -> Vec<K> {
        self.ranking.into_keys()
    }
}

/// Recommend up to `top_n` items `user` has not rated yet.
///
/// Falls back to global popularity when the user is unknown or no
/// candidate is left. Never fails: an empty matrix gives an empty list.
pub fn recommend<K>(user: &K, matrix: &RatingMatrix<K>, sim: &ItemSimilarityMatrix<K>, top_n: usize) -> Vec<K>
where
    K: Clone + Eq + Hash + Ord + Debug,
{
    recommend_scored(user, matrix, sim, top_n).into_items()
}

/// Same as `recommend`, keeping scores and the path taken
pub fn recommend_scored<K>(
    user: &K,
    matrix: &RatingMatrix<K>,
    sim: &ItemSimilarityMatrix<K>,
    top_n: usize,
) -> Recommendation<K>
where
    K: Clone + Eq + Hash + Ord + Debug,
{
    if let Some(mut ranking) = personalized_scores(user, matrix, sim) {
        ranking.truncate_top(top_n);
        if !ranking.is_empty() {
            return Recommendation {
                ranking,
                source: RecommendSource::Personalized,
            };
        }
        info!(user = ?user, "no candidates left for user, falling back to popularity");
    } else {
        info!(user = ?user, "unknown user, falling back to popularity");
    }
    let mut ranking = popularity_scores(matrix);
    ranking.truncate_top(top_n);
    Recommendation {
        ranking,
        source: RecommendSource::Popularity,
    }
}

/// Predicted affinity of `user` for every item they have not rated
/// positively, unsorted. `None` when the user is not a row of `matrix`.
///
/// score(j) = Σ_i sim(j, i) * r(i) / Σ_i sim(j, i)
///
/// Candidates are the items of `sim`. A `sim` item missing from `matrix`
/// counts as unrated. A zero (or non-finite) similarity sum scores 0.
pub fn personalized_scores<K>(user: &K, matrix: &RatingMatrix<K>, sim: &ItemSimilarityMatrix<K>) -> Option<Ranking<K>>
where
    K: Clone + Eq + Hash + Ord,
{
    let row = matrix.user_row(user)?;

    // sim の並び順に合わせたユーザー評価ベクトル
    let mut unknown = 0usize;
    let ratings: Vec<f64> = sim
        .items()
        .iter()
        .map(|item| match matrix.items().get_index_of(item) {
            Some(idx) => row[idx],
            None => {
                unknown += 1;
                0.0
            }
        })
        .collect();
    if unknown > 0 {
        warn!(unknown, "similarity matrix has items missing from the rating matrix");
    }

    let list: Vec<(K, f64)> = sim
        .items()
        .iter()
        .enumerate()
        .filter(|(j, _)| ratings[*j] <= 0.0)
        .map(|(j, item)| {
            let sims = sim.row(j).unwrap_or_default();
            let norm: f64 = sims.iter().sum();
            let score = if norm == 0.0 || !norm.is_finite() {
                0.0
            } else {
                dot_dense(sims, &ratings) / norm
            };
            (item.clone(), if score.is_finite() { score } else { 0.0 })
        })
        .collect();

    debug!(candidates = list.len(), items = sim.n_items(), "personalized scores computed");
    Some(Ranking::new(list))
}

/// Mean rating of every item over all users, unrated cells as 0, unsorted
pub fn popularity_scores<K>(matrix: &RatingMatrix<K>) -> Ranking<K>
where
    K: Clone + Eq + Hash + Ord,
{
    Ranking::new(matrix.item_means())
}
