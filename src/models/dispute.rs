use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Amount, OrderStatus};

pub const DISPUTE_PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DisputeStatus {
    Disputing,
    Refund,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DisputeWithOrder {
    pub id: u64,
    pub order_id: u64,
    pub status: DisputeStatus,
    #[serde(default)]
    pub reason: String,
    pub order_no: String,
    pub order_name: String,
    #[schema(value_type = String)]
    pub amount: Amount,
    pub order_status: OrderStatus,
    #[serde(default)]
    pub initiator_username: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisputeQuery {
    pub page: u32,
    pub page_size: u32,
    pub status: DisputeStatus,
}

impl DisputeQuery {
    pub fn open_disputes() -> Self {
        Self {
            page: 1,
            page_size: DISPUTE_PAGE_SIZE,
            status: DisputeStatus::Disputing,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct DisputeList {
    pub total: u64,
    #[serde(default)]
    pub disputes: Vec<DisputeWithOrder>,
}
