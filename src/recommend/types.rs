use serde::{Deserialize, Serialize};

use super::error::RecommendError;

/// A raw external user identifier as it arrives over the wire.
///
/// Book-Crossing user ids are integers, but any string id is accepted. Both
/// forms are compared by their decimal/string rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawIdentifier {
    Integer(i64),
    Text(String),
}

impl RawIdentifier {
    /// Accepts JSON strings and integers; anything else is an invalid request.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, RecommendError> {
        match value {
            serde_json::Value::String(s) => Ok(RawIdentifier::Text(s.clone())),
            serde_json::Value::Number(n) => n.as_i64().map(RawIdentifier::Integer).ok_or_else(|| {
                RecommendError::invalid_request(format!("user_id {} is not an integer", n))
            }),
            other => Err(RecommendError::invalid_request(format!(
                "user_id must be a string or integer, got {}",
                json_kind(other)
            ))),
        }
    }

    pub fn into_string(self) -> String {
        match self {
            RawIdentifier::Integer(i) => i.to_string(),
            RawIdentifier::Text(s) => s,
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// One top-K request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendRequest {
    /// Raw external user identifier.
    pub user_id: String,
    /// Maximum number of items to return; at least 1.
    pub k: usize,
}

impl RecommendRequest {
    pub fn new(user_id: impl Into<String>, k: usize) -> Self {
        Self {
            user_id: user_id.into(),
            k,
        }
    }

    pub fn validate(&self) -> Result<(), RecommendError> {
        if self.k == 0 {
            return Err(RecommendError::invalid_request("k must be at least 1"));
        }
        if self.user_id.trim().is_empty() {
            return Err(RecommendError::invalid_request("user_id must not be empty"));
        }
        Ok(())
    }
}

/// Candidate item paired with its model score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredItem {
    pub item: u32,
    pub score: f32,
}

/// Ranked result of one request, best first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub user_id: String,
    pub items: Vec<String>,
    pub scores: Vec<f32>,
}

impl Recommendation {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// `(item, score)` pairs in rank order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.items
            .iter()
            .map(String::as_str)
            .zip(self.scores.iter().copied())
    }
}
