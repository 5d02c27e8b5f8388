/// This crate is an item-based collaborative filtering recommender.
/// Ratings of one content category go in, a ranked list of items the user
/// has not rated yet comes out.
pub mod recommender;
pub mod utils;
pub mod config;
pub mod error;
pub mod service;

/// Rating Record
/// One observed `{user_id, item_id, category, rating}` interaction.
/// `RatingRecord::parse_payload` validates loosely shaped JSON (a list of
/// rows or a column table) and reports the offending record and field.
pub use recommender::record::RatingRecord;

/// Rating Matrix
/// Dense user x item table for a single category, built fresh per request.
/// Absent ratings are stored as `0.0`.
///
/// # Serialization
/// Supported.
/// The derived form is a compact snapshot (CBOR via `to_cbor`), and
/// `to_nested` / `from_nested_value` speak the `{item: {user: rating}}`
/// mapping of the request layer.
pub use recommender::matrix::RatingMatrix;

/// Item Similarity Matrix
/// Symmetric item x item cosine similarity derived from a `RatingMatrix`.
/// The pairwise strategy is pluggable through `SimilarityEngine`;
/// `CosineEngine` is the default.
pub use recommender::similarity::{CosineEngine, ItemSimilarityMatrix, SimilarityEngine};

/// Recommendation
/// - `recommend`: ranked item ids for a user, with cold-start fallback
/// - `recommend_scored`: the same, keeping scores and the path taken
/// - `Ranking`: `(item, score)` list ordered by score, ties by item id
pub use recommender::evaluate::scoring::{recommend, recommend_scored, Ranking, Recommendation, RecommendSource};

/// Category Catalog
/// Builds matrices for every category in a record set and recommends
/// across all of them.
pub use recommender::catalog::{CategorizedItem, CategoryCatalog};

/// Stage facade bound to a `RecommenderConfig`
pub use recommender::Recommender;

pub use config::{DuplicatePolicy, RecommenderConfig};
pub use error::{RecommendError, Result};
pub use service::{Endpoint, Service};
