use std::hash::Hash;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    config::DuplicatePolicy,
    error::{RecommendError, Result},
    recommender::record::RatingRecord,
    utils::math::SparseVec,
};

/// Dense user x item rating table for one category
///
/// Rows are users, columns are items, both in first-seen order.
/// A cell nobody rated holds `0.0`, which is indistinguishable from an
/// explicit zero rating.
///
/// # Serialization
/// The derived form (labels plus row-major cells) is the compact snapshot
/// used for CBOR. Deserializing checks the shape like `from_parts`.
/// The `{item: {user: rating}}` mapping lives in `recommender::serde`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "RatingMatrixRaw<K>",
    bound(
        serialize = "K: Serialize + Hash + Eq",
        deserialize = "K: Deserialize<'de> + Clone + Hash + Eq"
    )
)]
pub struct RatingMatrix<K = String>
where
    K: Hash + Eq,
{
    users: IndexSet<K>,
    items: IndexSet<K>,
    /// row-major, `users.len() * items.len()`
    cells: Vec<f64>,
}

/// Unchecked wire form of `RatingMatrix`
#[derive(Deserialize)]
#[serde(bound(deserialize = "K: Deserialize<'de> + Hash + Eq"))]
struct RatingMatrixRaw<K>
where
    K: Hash + Eq,
{
    users: IndexSet<K>,
    items: IndexSet<K>,
    cells: Vec<f64>,
}

impl<K> TryFrom<RatingMatrixRaw<K>> for RatingMatrix<K>
where
    K: Clone + Eq + Hash,
{
    type Error = RecommendError;

    fn try_from(raw: RatingMatrixRaw<K>) -> Result<Self> {
        Self::from_parts(raw.users, raw.items, raw.cells)
    }
}

impl<K> RatingMatrix<K>
where
    K: Clone + Eq + Hash,
{
    pub fn empty() -> Self {
        Self {
            users: IndexSet::new(),
            items: IndexSet::new(),
            cells: Vec::new(),
        }
    }

    /// Build the matrix from the records of `category`.
    /// Records of other categories are skipped. A pair rated twice keeps
    /// the last rating.
    pub fn build(records: &[RatingRecord<K>], category: &str) -> Self {
        Self::build_with_policy(records, category, DuplicatePolicy::LastWrite)
    }

    /// Build the matrix with an explicit rule for repeated `(user, item)` pairs
    pub fn build_with_policy(records: &[RatingRecord<K>], category: &str, policy: DuplicatePolicy) -> Self {
        let mut users = IndexSet::new();
        let mut items = IndexSet::new();
        let mut kept = Vec::new();
        for rec in records.iter().filter(|r| r.category == category) {
            let (u, _) = users.insert_full(rec.user_id.clone());
            let (i, _) = items.insert_full(rec.item_id.clone());
            kept.push((u, i, rec.rating));
        }

        let n_items = items.len();
        let mut cells = vec![0.0; users.len() * n_items];
        match policy {
            DuplicatePolicy::LastWrite => {
                for &(u, i, rating) in &kept {
                    cells[u * n_items + i] = rating;
                }
            }
            DuplicatePolicy::Mean => {
                let mut counts = vec![0u32; cells.len()];
                for &(u, i, rating) in &kept {
                    cells[u * n_items + i] += rating;
                    counts[u * n_items + i] += 1;
                }
                for (cell, &n) in cells.iter_mut().zip(&counts) {
                    if n > 1 {
                        *cell /= n as f64;
                    }
                }
            }
        }

        debug!(
            category,
            records = records.len(),
            kept = kept.len(),
            users = users.len(),
            items = n_items,
            "rating matrix built"
        );
        Self { users, items, cells }
    }

    /// Assemble a matrix from labels and row-major cells
    pub fn from_parts(users: IndexSet<K>, items: IndexSet<K>, cells: Vec<f64>) -> Result<Self> {
        if cells.len() != users.len() * items.len() {
            return Err(RecommendError::InvalidMatrix {
                reason: format!(
                    "{} cells for {} users x {} items",
                    cells.len(),
                    users.len(),
                    items.len()
                ),
            });
        }
        Ok(Self { users, items, cells })
    }

    #[inline]
    pub fn users(&self) -> &IndexSet<K> {
        &self.users
    }

    #[inline]
    pub fn items(&self) -> &IndexSet<K> {
        &self.items
    }

    #[inline]
    pub fn n_users(&self) -> usize {
        self.users.len()
    }

    #[inline]
    pub fn n_items(&self) -> usize {
        self.items.len()
    }

    /// no rows or no columns
    pub fn is_empty(&self) -> bool {
        self.users.is_empty() || self.items.is_empty()
    }

    pub fn contains_user(&self, user: &K) -> bool {
        self.users.contains(user)
    }

    /// Rating of `user` for `item`; `Some(0.0)` when unrated, `None` when
    /// either label is unknown
    pub fn get(&self, user: &K, item: &K) -> Option<f64> {
        let u = self.users.get_index_of(user)?;
        let i = self.items.get_index_of(item)?;
        Some(self.cells[u * self.n_items() + i])
    }

    /// The user's rating vector, one entry per item column
    pub fn user_row(&self, user: &K) -> Option<&[f64]> {
        let u = self.users.get_index_of(user)?;
        let n = self.n_items();
        Some(&self.cells[u * n..(u + 1) * n])
    }

    /// Column `item_idx` over all users
    pub fn item_column(&self, item_idx: usize) -> impl Iterator<Item = f64> + '_ {
        self.cells
            .iter()
            .skip(item_idx)
            .step_by(self.n_items().max(1))
            .copied()
            .take(if item_idx < self.n_items() { self.n_users() } else { 0 })
    }

    /// Every item column as a sparse vector over user indices
    pub fn item_columns_sparse(&self) -> Vec<SparseVec<f64>> {
        (0..self.n_items())
            .map(|j| SparseVec::from_dense(self.item_column(j)))
            .collect()
    }

    /// Mean rating per item over all users, unrated cells counting as 0
    pub fn item_means(&self) -> Vec<(K, f64)> {
        let n_users = self.n_users();
        self.items
            .iter()
            .enumerate()
            .map(|(j, item)| {
                let mean = if n_users == 0 {
                    0.0
                } else {
                    self.item_column(j).sum::<f64>() / n_users as f64
                };
                (item.clone(), mean)
            })
            .collect()
    }

    /// row-major cells
    pub fn cells(&self) -> &[f64] {
        &self.cells
    }
}

impl<K> Default for RatingMatrix<K>
where
    K: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::empty()
    }
}
