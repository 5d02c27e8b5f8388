use std::hash::Hash;

use indexmap::{IndexMap, IndexSet};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use crate::{
    error::{RecommendError, Result},
    recommender::{matrix::RatingMatrix, similarity::ItemSimilarityMatrix},
};

/// Column-oriented nested mapping, `{column: {row: value}}`.
/// This is the shape `DataFrame.to_dict()` emits, which the request layer
/// passes around for both matrices.
pub type NestedMatrix = IndexMap<String, IndexMap<String, f64>>;

impl RatingMatrix<String> {
    /// `{item: {user: rating}}`, every cell present
    pub fn to_nested(&self) -> NestedMatrix {
        let n_items = self.n_items();
        self.items()
            .iter()
            .enumerate()
            .map(|(j, item)| {
                let col = self
                    .users()
                    .iter()
                    .enumerate()
                    .map(|(u, user)| (user.clone(), self.cells()[u * n_items + j]))
                    .collect();
                (item.clone(), col)
            })
            .collect()
    }

    /// Read `{item: {user: rating}}`.
    /// Users appear in first-seen order across columns; a user missing from
    /// a column is an unrated cell (0). Ratings must be non-negative numbers.
    pub fn from_nested_value(value: &Value) -> Result<Self> {
        let (items, users, cols) = read_nested(value, "user_item_matrix", |v| v >= 0.0)?;
        let cells = transpose(&cols, users.len());
        RatingMatrix::from_parts(users, items, cells)
    }
}

impl ItemSimilarityMatrix<String> {
    /// `{item: {item: similarity}}`
    pub fn to_nested(&self) -> NestedMatrix {
        self.items()
            .iter()
            .enumerate()
            .map(|(i, a)| {
                let row = self
                    .items()
                    .iter()
                    .zip(self.row(i).unwrap_or_default())
                    .map(|(b, &v)| (b.clone(), v))
                    .collect();
                (a.clone(), row)
            })
            .collect()
    }

    /// Read `{item: {item: similarity}}`.
    /// The item set is the union of outer and inner labels, missing pairs are 0.
    pub fn from_nested_value(value: &Value) -> Result<Self> {
        let (outer, inner, cols) = read_nested(value, "item_similarity_df", f64::is_finite)?;
        let mut items = outer.clone();
        for label in &inner {
            items.insert(label.clone());
        }
        let n = items.len();
        let mut values = vec![0.0; n * n];
        for (c, col) in cols.iter().enumerate() {
            // outer labels were inserted first, so index c is stable
            for (r, &v) in col.iter().enumerate() {
                if let Some(row_idx) = inner.get_index(r).and_then(|label| items.get_index_of(label)) {
                    values[row_idx * n + c] = v;
                }
            }
        }
        ItemSimilarityMatrix::from_parts(items, values)
    }
}

/// Binary snapshot of any matrix type
pub fn to_cbor<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_cbor::to_vec(value)?)
}

pub fn from_cbor<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(serde_cbor::from_slice(bytes)?)
}

impl<K> RatingMatrix<K>
where
    K: Clone + Eq + Hash + Serialize + DeserializeOwned,
{
    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        to_cbor(self)
    }

    /// The shape is checked during decoding
    pub fn from_cbor(bytes: &[u8]) -> Result<Self> {
        from_cbor(bytes)
    }
}

impl<K> ItemSimilarityMatrix<K>
where
    K: Clone + Eq + Hash + Serialize + DeserializeOwned,
{
    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        to_cbor(self)
    }

    pub fn from_cbor(bytes: &[u8]) -> Result<Self> {
        from_cbor(bytes)
    }
}

/// Column labels, row labels (first-seen), and dense columns
/// (`cols[c][r]`, 0 where absent).
fn read_nested<F>(value: &Value, what: &str, accept: F) -> Result<(IndexSet<String>, IndexSet<String>, Vec<Vec<f64>>)>
where
    F: Fn(f64) -> bool,
{
    let outer = as_object(value, what)?;
    let mut columns = IndexSet::with_capacity(outer.len());
    let mut rows: IndexSet<String> = IndexSet::new();
    let mut sparse: Vec<Vec<(usize, f64)>> = Vec::with_capacity(outer.len());

    for (col_label, inner) in outer {
        columns.insert(col_label.clone());
        let inner = as_object(inner, &format!("{what}[{col_label}]"))?;
        let mut col = Vec::with_capacity(inner.len());
        for (row_label, cell) in inner {
            let v = cell.as_f64().filter(|v| accept(*v)).ok_or_else(|| RecommendError::InvalidMatrix {
                reason: format!("{what}[{col_label}][{row_label}]: unusable value {cell}"),
            })?;
            let (r, _) = rows.insert_full(row_label.clone());
            col.push((r, v));
        }
        sparse.push(col);
    }

    let dense = sparse
        .into_iter()
        .map(|col| {
            let mut d = vec![0.0; rows.len()];
            for (r, v) in col {
                d[r] = v;
            }
            d
        })
        .collect();
    Ok((columns, rows, dense))
}

fn as_object<'a>(value: &'a Value, what: &str) -> Result<&'a Map<String, Value>> {
    value.as_object().ok_or_else(|| RecommendError::InvalidMatrix {
        reason: format!("{what} must be an object, got {value}"),
    })
}

/// `cols[c][r]` to row-major `r * n_cols + c`
fn transpose(cols: &[Vec<f64>], n_rows: usize) -> Vec<f64> {
    let n_cols = cols.len();
    let mut cells = vec![0.0; n_rows * n_cols];
    for (c, col) in cols.iter().enumerate() {
        for (r, &v) in col.iter().enumerate() {
            cells[r * n_cols + c] = v;
        }
    }
    cells
}
