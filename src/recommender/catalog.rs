use std::{fmt::Debug, hash::Hash};

use indexmap::{IndexMap, IndexSet};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    config::RecommenderConfig,
    recommender::{
        evaluate::scoring::recommend,
        matrix::RatingMatrix,
        record::RatingRecord,
        similarity::{CosineEngine, ItemSimilarityMatrix},
    },
};

/// Rating and similarity matrices of one category
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryModel<K = String>
where
    K: Hash + Eq,
{
    pub ratings: RatingMatrix<K>,
    pub similarity: ItemSimilarityMatrix<K>,
}

/// One recommended item together with the category it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorizedItem<K = String> {
    pub item_id: K,
    pub category: String,
}

/// Every category found in a record set, each with its own matrices
///
/// Categories are kept in first-seen order. Each category is an
/// independent request-sized problem, so they are built on the rayon pool.
#[derive(Debug, Clone)]
pub struct CategoryCatalog<K = String>
where
    K: Hash + Eq,
{
    pub categories: IndexMap<String, CategoryModel<K>>,
}

impl<K> CategoryCatalog<K>
where
    K: Clone + Eq + Hash + Ord + Debug + Send + Sync,
{
    pub fn build(records: &[RatingRecord<K>], config: &RecommenderConfig) -> Self {
        let names: Vec<&str> = records
            .iter()
            .map(|r| r.category.as_str())
            .collect::<IndexSet<&str>>()
            .into_iter()
            .collect();
        let built: Vec<(String, CategoryModel<K>)> = names
            .par_iter()
            .map(|&name| {
                let ratings = RatingMatrix::build_with_policy(records, name, config.duplicate_policy);
                let similarity =
                    ItemSimilarityMatrix::compute_with::<CosineEngine>(&ratings, config.parallel_threshold);
                (name.to_string(), CategoryModel { ratings, similarity })
            })
            .collect();
        debug!(categories = built.len(), records = records.len(), "category catalog built");
        Self {
            categories: built.into_iter().collect(),
        }
    }

    pub fn get(&self, category: &str) -> Option<&CategoryModel<K>> {
        self.categories.get(category)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Recommendations for `user` in a single category; empty when the
    /// category is unknown
    pub fn recommend(&self, user: &K, category: &str, top_n: usize) -> Vec<K> {
        self.get(category)
            .map(|m| recommend(user, &m.ratings, &m.similarity, top_n))
            .unwrap_or_default()
    }

    /// Up to `top_n` items per category, categories in catalog order
    pub fn recommend_all(&self, user: &K, top_n: usize) -> Vec<CategorizedItem<K>> {
        self.categories
            .iter()
            .flat_map(|(category, m)| {
                recommend(user, &m.ratings, &m.similarity, top_n)
                    .into_iter()
                    .map(move |item_id| CategorizedItem {
                        item_id,
                        category: category.clone(),
                    })
            })
            .collect()
    }
}
