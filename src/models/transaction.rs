use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::Amount;

/// 账户余额
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Balance {
    #[schema(value_type = String)]
    pub available_balance: Amount,
    #[serde(default = "Amount::zero")]
    #[schema(value_type = String)]
    pub total_receive: Amount,
    #[serde(default = "Amount::zero")]
    #[schema(value_type = String)]
    pub total_payment: Amount,
    #[serde(default = "Amount::zero")]
    #[schema(value_type = String)]
    pub total_transfer_in: Amount,
    #[serde(default = "Amount::zero")]
    #[schema(value_type = String)]
    pub total_transfer_out: Amount,
    #[serde(default = "Amount::zero")]
    #[schema(value_type = String)]
    pub total_community: Amount,
    #[serde(default)]
    pub pay_score: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Receive,
    Payment,
    Transfer,
    Community,
    Online,
    RedEnvelopeSend,
    RedEnvelopeReceive,
    RedEnvelopeRefund,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Success,
    Failed,
    Expired,
    Disputing,
    Refund,
    RefundRejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Transaction {
    pub id: u64,
    pub order_no: String,
    pub order_name: String,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub status: OrderStatus,
    #[schema(value_type = String)]
    pub amount: Amount,
    #[serde(default)]
    pub payer_username: Option<String>,
    #[serde(default)]
    pub payee_username: Option<String>,
    #[serde(default)]
    pub remark: Option<String>,
    #[serde(default)]
    pub trade_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// 交易记录查询条件（不含页码，页码由 store 管理）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TransactionQuery {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub order_type: Option<OrderType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(rename = "startTime", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(rename = "endTime", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

impl TransactionQuery {
    /// 最近一个月的时间窗口
    pub fn last_month(now: DateTime<Utc>) -> Self {
        Self {
            start_time: Some(now - Duration::days(30)),
            end_time: Some(now),
            page_size: Some(20),
            ..Default::default()
        }
    }

    pub fn with_type(mut self, order_type: Option<OrderType>) -> Self {
        self.order_type = order_type;
        self
    }
}

/// 发往上游的分页请求体
#[derive(Debug, Serialize)]
pub struct TransactionPageRequest<'a> {
    #[serde(flatten)]
    pub query: &'a TransactionQuery,
    pub page: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_month_window() {
        let now = Utc::now();
        let q = TransactionQuery::last_month(now).with_type(Some(OrderType::Receive));
        assert_eq!(q.end_time, Some(now));
        assert_eq!(q.start_time, Some(now - Duration::days(30)));
        assert_eq!(q.order_type, Some(OrderType::Receive));
    }

    #[test]
    fn test_page_request_flattens_query() {
        let q = TransactionQuery {
            order_type: Some(OrderType::Transfer),
            page_size: Some(20),
            ..Default::default()
        };
        let v = serde_json::to_value(TransactionPageRequest { query: &q, page: 2 }).unwrap();
        assert_eq!(v, serde_json::json!({"type": "transfer", "page_size": 20, "page": 2}));
    }
}
