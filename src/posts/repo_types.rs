use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Imported post, read-only through the API. JSON names follow the seed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "startTime")]
    #[sqlx(rename = "startTime")]
    pub start_time: Option<i64>, // epoch seconds
    #[serde(rename = "totalPurchaseCount")]
    #[sqlx(rename = "totalPurchaseCount")]
    pub total_purchase_count: Option<i64>,
    pub user: Option<i64>,
    pub username: Option<String>,
    pub owner: Option<i64>,
    pub image_cover: Option<String>,
}
