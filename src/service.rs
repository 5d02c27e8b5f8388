use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::{
    error::{RecommendError, Result},
    recommender::{
        catalog::{CategorizedItem, CategoryCatalog},
        matrix::RatingMatrix,
        record::{id_string, RatingRecord},
        serde::NestedMatrix,
        similarity::ItemSimilarityMatrix,
        Recommender,
    },
};

/// The operations the request layer dispatches into the core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// records + category -> rating matrix
    UserItemMatrix,
    /// rating matrix -> item similarity matrix
    ItemSimilarity,
    /// user + both matrices -> recommended items
    Recommend,
    /// records + user -> recommendations for every category
    RecommendAll,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::UserItemMatrix => "/get-user-item-matrix",
            Endpoint::ItemSimilarity => "/get-item-similarity-df",
            Endpoint::Recommend => "/recommend-document",
            Endpoint::RecommendAll => "/recommend-all",
        }
    }
}

impl FromStr for Endpoint {
    type Err = RecommendError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().trim_start_matches('/');
        match name {
            "get-user-item-matrix" | "matrix" => Ok(Endpoint::UserItemMatrix),
            "get-item-similarity-df" | "similarity" => Ok(Endpoint::ItemSimilarity),
            "recommend-document" | "recommend" => Ok(Endpoint::Recommend),
            "recommend-all" | "catalog" => Ok(Endpoint::RecommendAll),
            other => Err(RecommendError::Config(format!("unknown endpoint `{other}`"))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatrixRequest {
    /// list of records or column table
    pub data: Value,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixResponse {
    pub user_item_matrix: NestedMatrix,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimilarityRequest {
    pub user_item_matrix: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResponse {
    pub item_similarity_df: NestedMatrix,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecommendRequest {
    pub user_id: Value,
    pub user_item_matrix: Value,
    pub item_similarity_df: Value,
    #[serde(default)]
    pub top_n: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendResponse {
    pub recommended_items: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogRequest {
    pub data: Value,
    pub user_id: Value,
    #[serde(default)]
    pub top_n: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogResponse {
    pub recommendations: Vec<CategorizedItem>,
}

/// JSON boundary of the recommender core
///
/// Loosely shaped payloads are validated and converted to typed matrices
/// here, before any core logic runs.
#[derive(Debug, Clone, Default)]
pub struct Service {
    pub recommender: Recommender,
}

impl Service {
    pub fn new(recommender: Recommender) -> Self {
        Self { recommender }
    }

    pub fn user_item_matrix(&self, req: &MatrixRequest) -> Result<MatrixResponse> {
        let records = RatingRecord::parse_payload(&req.data)?;
        let matrix = self.recommender.build_matrix(&records, &req.category);
        Ok(MatrixResponse {
            user_item_matrix: matrix.to_nested(),
        })
    }

    pub fn item_similarity(&self, req: &SimilarityRequest) -> Result<SimilarityResponse> {
        let matrix = RatingMatrix::from_nested_value(&req.user_item_matrix)?;
        let sim = self.recommender.similarity(&matrix);
        Ok(SimilarityResponse {
            item_similarity_df: sim.to_nested(),
        })
    }

    pub fn recommend(&self, req: &RecommendRequest) -> Result<RecommendResponse> {
        let user = id_string(0, "user_id", &req.user_id)?;
        let matrix = RatingMatrix::from_nested_value(&req.user_item_matrix)?;
        let sim = ItemSimilarityMatrix::from_nested_value(&req.item_similarity_df)?;
        let rec = self.recommender.recommend(&user, &matrix, &sim, req.top_n);
        debug!(user = %user, source = ?rec.source, count = rec.ranking.len(), "recommendation served");
        Ok(RecommendResponse {
            recommended_items: rec.into_items(),
        })
    }

    pub fn recommend_all(&self, req: &CatalogRequest) -> Result<CatalogResponse> {
        let user = id_string(0, "user_id", &req.user_id)?;
        let records = RatingRecord::parse_payload(&req.data)?;
        let catalog = CategoryCatalog::build(&records, &self.recommender.config);
        let top_n = req.top_n.unwrap_or(self.recommender.config.top_n);
        Ok(CatalogResponse {
            recommendations: catalog.recommend_all(&user, top_n),
        })
    }

    /// Decode `body` for `endpoint`, run it, encode the response
    pub fn dispatch(&self, endpoint: Endpoint, body: Value) -> Result<Value> {
        let out = match endpoint {
            Endpoint::UserItemMatrix => serde_json::to_value(self.user_item_matrix(&serde_json::from_value(body)?)?)?,
            Endpoint::ItemSimilarity => serde_json::to_value(self.item_similarity(&serde_json::from_value(body)?)?)?,
            Endpoint::Recommend => serde_json::to_value(self.recommend(&serde_json::from_value(body)?)?)?,
            Endpoint::RecommendAll => serde_json::to_value(self.recommend_all(&serde_json::from_value(body)?)?)?,
        };
        Ok(out)
    }
}
