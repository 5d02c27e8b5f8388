use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{RecommendError, Result};

/// One observed user-item interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingRecord<K = String> {
    pub user_id: K,
    pub item_id: K,
    pub category: String,
    pub rating: f64,
}

impl<K> RatingRecord<K> {
    pub fn new(user_id: K, item_id: K, category: impl Into<String>, rating: f64) -> Self {
        Self {
            user_id,
            item_id,
            category: category.into(),
            rating,
        }
    }
}

const FIELDS: [&str; 4] = ["user_id", "item_id", "category", "rating"];

impl RatingRecord<String> {
    /// Decode and validate a record payload.
    ///
    /// Accepts either a list of row objects or a column table
    /// (`{"user_id": [..], "item_id": [..], "rating": [..], "category": [..]}`).
    /// Integer ids are rendered as decimal strings. Nothing else is coerced:
    /// a missing or null field, a non-numeric rating or a negative rating
    /// fails with the index of the offending record.
    pub fn parse_payload(value: &Value) -> Result<Vec<Self>> {
        match value {
            Value::Array(rows) => rows
                .iter()
                .enumerate()
                .map(|(index, row)| match row {
                    Value::Object(obj) => Self::from_fields(index, |field| obj.get(field)),
                    _ => Err(RecommendError::InvalidField {
                        index,
                        field: "record",
                        reason: "expected an object".to_string(),
                    }),
                })
                .collect(),
            Value::Object(columns) => Self::from_columns(columns),
            _ => Err(RecommendError::InvalidField {
                index: 0,
                field: "data",
                reason: "expected a list of records or a column table".to_string(),
            }),
        }
    }

    fn from_columns(columns: &Map<String, Value>) -> Result<Vec<Self>> {
        let mut cols: Vec<&Vec<Value>> = Vec::with_capacity(FIELDS.len());
        for field in FIELDS {
            match columns.get(field) {
                Some(Value::Array(col)) => cols.push(col),
                Some(Value::Null) | None => return Err(RecommendError::MissingField { index: 0, field }),
                Some(_) => {
                    return Err(RecommendError::InvalidField {
                        index: 0,
                        field,
                        reason: "expected a column array".to_string(),
                    })
                }
            }
        }
        let expected = cols[0].len();
        for (field, col) in FIELDS.iter().zip(&cols) {
            if col.len() != expected {
                return Err(RecommendError::ColumnLengthMismatch {
                    field: *field,
                    expected,
                    actual: col.len(),
                });
            }
        }
        (0..expected)
            .map(|index| {
                Self::from_fields(index, |field| {
                    FIELDS
                        .iter()
                        .position(|f| *f == field)
                        .map(|c| {
                            let col: &Vec<Value> = cols[c];
                            &col[index]
                        })
                })
            })
            .collect()
    }

    fn from_fields<'a, F>(index: usize, get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<&'a Value>,
    {
        let require = |field: &'static str| -> Result<&'a Value> {
            match get(field) {
                None | Some(Value::Null) => Err(RecommendError::MissingField { index, field }),
                Some(v) => Ok(v),
            }
        };
        Ok(Self {
            user_id: id_string(index, "user_id", require("user_id")?)?,
            item_id: id_string(index, "item_id", require("item_id")?)?,
            category: match require("category")? {
                Value::String(s) => s.clone(),
                other => {
                    return Err(RecommendError::InvalidField {
                        index,
                        field: "category",
                        reason: format!("expected a string, got {other}"),
                    })
                }
            },
            rating: rating_value(index, require("rating")?)?,
        })
    }
}

pub(crate) fn id_string(index: usize, field: &'static str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) if n.is_u64() || n.is_i64() => Ok(n.to_string()),
        other => Err(RecommendError::InvalidField {
            index,
            field,
            reason: format!("expected a string or integer id, got {other}"),
        }),
    }
}

fn rating_value(index: usize, value: &Value) -> Result<f64> {
    let rating = value.as_f64().ok_or_else(|| RecommendError::InvalidField {
        index,
        field: "rating",
        reason: format!("expected a number, got {value}"),
    })?;
    if !rating.is_finite() || rating < 0.0 {
        return Err(RecommendError::InvalidField {
            index,
            field: "rating",
            reason: format!("must be a non-negative real, got {rating}"),
        });
    }
    Ok(rating)
}
