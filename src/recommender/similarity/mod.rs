use std::hash::Hash;

use indexmap::IndexSet;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{RecommendError, Result},
    recommender::matrix::RatingMatrix,
    utils::math::{cosine, SparseVec},
};

/// Item count from which `compute` fans out over rayon
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 64;

/// Pairwise item similarity strategy
///
/// Implementations must be symmetric (`pair(a, b) == pair(b, a)`) and
/// return 0 rather than NaN for degenerate vectors.
pub trait SimilarityEngine {
    fn pair(a: &SparseVec<f64>, b: &SparseVec<f64>) -> f64;
}

/// Cosine similarity over item rating columns
#[derive(Debug, Clone, Copy, Default)]
pub struct CosineEngine;

impl SimilarityEngine for CosineEngine {
    #[inline]
    fn pair(a: &SparseVec<f64>, b: &SparseVec<f64>) -> f64 {
        // 丸め誤差で 1.0 をわずかに超えることがある
        cosine(a, b).clamp(-1.0, 1.0)
    }
}

/// Symmetric item x item similarity table
///
/// Derived from a `RatingMatrix`; rebuild it whenever the ratings change.
/// Deserializing checks the shape like `from_parts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "ItemSimilarityRaw<K>",
    bound(
        serialize = "K: Serialize + Hash + Eq",
        deserialize = "K: Deserialize<'de> + Clone + Hash + Eq"
    )
)]
pub struct ItemSimilarityMatrix<K = String>
where
    K: Hash + Eq,
{
    items: IndexSet<K>,
    /// row-major, `items.len()^2`
    values: Vec<f64>,
}

/// Unchecked wire form of `ItemSimilarityMatrix`
#[derive(Deserialize)]
#[serde(bound(deserialize = "K: Deserialize<'de> + Hash + Eq"))]
struct ItemSimilarityRaw<K>
where
    K: Hash + Eq,
{
    items: IndexSet<K>,
    values: Vec<f64>,
}

impl<K> TryFrom<ItemSimilarityRaw<K>> for ItemSimilarityMatrix<K>
where
    K: Clone + Eq + Hash,
{
    type Error = RecommendError;

    fn try_from(raw: ItemSimilarityRaw<K>) -> Result<Self> {
        Self::from_parts(raw.items, raw.values)
    }
}

impl<K> ItemSimilarityMatrix<K>
where
    K: Clone + Eq + Hash + Send + Sync,
{
    /// Cosine similarity between every pair of item columns
    pub fn compute(matrix: &RatingMatrix<K>) -> Self {
        Self::compute_with::<CosineEngine>(matrix, DEFAULT_PARALLEL_THRESHOLD)
    }

    /// Similarity with a chosen engine.
    /// Only the upper triangle is computed, then mirrored.
    pub fn compute_with<E: SimilarityEngine>(matrix: &RatingMatrix<K>, parallel_threshold: usize) -> Self {
        let columns = matrix.item_columns_sparse();
        let n = columns.len();

        let upper_row = |i: usize| -> Vec<f64> {
            (i..n).map(|j| E::pair(&columns[i], &columns[j])).collect()
        };
        let upper: Vec<Vec<f64>> = if n >= parallel_threshold {
            (0..n).into_par_iter().map(upper_row).collect()
        } else {
            (0..n).map(upper_row).collect()
        };

        let mut values = vec![0.0; n * n];
        for (i, row) in upper.into_iter().enumerate() {
            for (offset, sim) in row.into_iter().enumerate() {
                let j = i + offset;
                values[i * n + j] = sim;
                values[j * n + i] = sim;
            }
        }

        debug!(items = n, pairs = n * (n + 1) / 2, parallel = n >= parallel_threshold, "item similarity computed");
        Self {
            items: matrix.items().clone(),
            values,
        }
    }
}

impl<K> ItemSimilarityMatrix<K>
where
    K: Clone + Eq + Hash,
{
    pub fn empty() -> Self {
        Self {
            items: IndexSet::new(),
            values: Vec::new(),
        }
    }

    /// Assemble from labels and row-major values
    pub fn from_parts(items: IndexSet<K>, values: Vec<f64>) -> Result<Self> {
        let n = items.len();
        if values.len() != n * n {
            return Err(RecommendError::InvalidMatrix {
                reason: format!("{} similarity values for {} items", values.len(), n),
            });
        }
        Ok(Self { items, values })
    }

    #[inline]
    pub fn items(&self) -> &IndexSet<K> {
        &self.items
    }

    #[inline]
    pub fn n_items(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// sim(a, b), `None` when either item is unknown
    pub fn get(&self, a: &K, b: &K) -> Option<f64> {
        let i = self.items.get_index_of(a)?;
        let j = self.items.get_index_of(b)?;
        Some(self.values[i * self.n_items() + j])
    }

    /// Row `idx`: similarity of item `idx` to every item, `None` when
    /// `idx` is out of range
    #[inline]
    pub fn row(&self, idx: usize) -> Option<&[f64]> {
        let n = self.n_items();
        if idx >= n {
            return None;
        }
        Some(&self.values[idx * n..(idx + 1) * n])
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

impl<K> Default for ItemSimilarityMatrix<K>
where
    K: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::recommender::record::RatingRecord;

    fn scenario() -> RatingMatrix {
        let rec = |u: &str, i: &str, r: f64| RatingRecord::new(u.to_string(), i.to_string(), "ml", r);
        RatingMatrix::build(
            &[
                rec("A", "X", 5.0),
                rec("A", "Y", 0.0),
                rec("A", "Z", 3.0),
                rec("B", "X", 1.0),
                rec("B", "Y", 4.0),
                rec("B", "Z", 0.0),
            ],
            "ml",
        )
    }

    fn s(v: &str) -> String {
        v.to_string()
    }

    #[test]
    fn scenario_values() {
        let sim = ItemSimilarityMatrix::compute(&scenario());
        assert_abs_diff_eq!(sim.get(&s("X"), &s("Y")).unwrap(), 0.196, epsilon = 1e-3);
        assert_abs_diff_eq!(sim.get(&s("X"), &s("Z")).unwrap(), 0.981, epsilon = 1e-3);
        assert_abs_diff_eq!(sim.get(&s("Y"), &s("Z")).unwrap(), 0.0);
    }

    #[test]
    fn symmetric_with_unit_diagonal() {
        let sim = ItemSimilarityMatrix::compute(&scenario());
        for a in sim.items() {
            assert_abs_diff_eq!(sim.get(a, a).unwrap(), 1.0, epsilon = 1e-12);
            for b in sim.items() {
                assert_eq!(sim.get(a, b), sim.get(b, a));
            }
        }
    }

    #[test]
    fn parallel_matches_sequential() {
        let m = scenario();
        let seq = ItemSimilarityMatrix::compute_with::<CosineEngine>(&m, usize::MAX);
        let par = ItemSimilarityMatrix::compute_with::<CosineEngine>(&m, 0);
        assert_eq!(seq, par);
    }

    #[test]
    fn zero_column_has_zero_similarity() {
        let users: IndexSet<String> = [s("A")].into_iter().collect();
        let items: IndexSet<String> = [s("X"), s("Y")].into_iter().collect();
        let m = RatingMatrix::from_parts(users, items, vec![0.0, 2.0]).unwrap();
        let sim = ItemSimilarityMatrix::compute(&m);
        assert_eq!(sim.get(&s("X"), &s("X")), Some(0.0));
        assert_eq!(sim.get(&s("X"), &s("Y")), Some(0.0));
        assert_eq!(sim.get(&s("Y"), &s("Y")), Some(1.0));
    }

    #[test]
    fn empty_matrix_gives_empty_similarity() {
        let sim = ItemSimilarityMatrix::compute(&RatingMatrix::<String>::empty());
        assert!(sim.is_empty());
        assert!(sim.values().is_empty());
        assert_eq!(sim.row(0), None);
    }

    #[test]
    fn row_is_bounds_checked() {
        let sim = ItemSimilarityMatrix::compute(&scenario());
        assert_eq!(sim.row(2).map(<[f64]>::len), Some(3));
        assert_eq!(sim.row(3), None);
    }

    #[test]
    fn deserialize_rejects_wrong_shape() {
        let bad = r#"{"items":["X","Y"],"values":[1.0,0.5,0.5]}"#;
        assert!(serde_json::from_str::<ItemSimilarityMatrix>(bad).is_err());
        let bytes = serde_cbor::to_vec(&serde_json::json!({"items": ["X"], "values": []})).unwrap();
        assert!(serde_cbor::from_slice::<ItemSimilarityMatrix>(&bytes).is_err());

        let good = r#"{"items":["X","Y"],"values":[1.0,0.5,0.5,1.0]}"#;
        let sim: ItemSimilarityMatrix = serde_json::from_str(good).unwrap();
        assert_eq!(sim.get(&s("X"), &s("Y")), Some(0.5));
    }
}
