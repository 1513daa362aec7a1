use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    pub short_code: String,
    pub original_url: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub click_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_code: Option<String>,
}

impl Mapping {
    /// A mapping is live until the instant after its expiry
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|expires_at| now <= expires_at)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateUrlRequest {
    pub url: String,
    pub custom_code: Option<String>,
    pub expires_in_days: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkCreateItem {
    pub url: String,
    #[serde(default)]
    pub custom_code: Option<String>,
}

/// Outcome of one item of a bulk create, in request order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BulkCreateResult {
    Created { url: String, short_code: String },
    Failed { url: String, error: String },
}

impl BulkCreateResult {
    pub fn short_code(&self) -> Option<&str> {
        match self {
            Self::Created { short_code, .. } => Some(short_code),
            Self::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkDeleteResult {
    pub deleted: Vec<String>,
    pub not_found: Vec<String>,
}
