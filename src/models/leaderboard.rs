use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::Amount;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PeriodType {
    Day,
    Week,
    Month,
    AllTime,
}

impl PeriodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodType::Day => "day",
            PeriodType::Week => "week",
            PeriodType::Month => "month",
            PeriodType::AllTime => "all_time",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    ReceiveAmount,
    PaymentAmount,
    TransferInAmount,
    TransferOutAmount,
    VolumeAmount,
    NetAmount,
}

impl MetricType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::ReceiveAmount => "receive_amount",
            MetricType::PaymentAmount => "payment_amount",
            MetricType::TransferInAmount => "transfer_in_amount",
            MetricType::TransferOutAmount => "transfer_out_amount",
            MetricType::VolumeAmount => "volume_amount",
            MetricType::NetAmount => "net_amount",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub user_id: u64,
    pub username: String,
    #[serde(default)]
    pub avatar_url: String,
    #[schema(value_type = String)]
    pub score: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_rank: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LeaderboardPeriod {
    #[serde(rename = "type")]
    pub period_type: PeriodType,
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LeaderboardList {
    pub period: LeaderboardPeriod,
    pub metric: MetricType,
    pub snapshot_at: String,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    #[serde(default)]
    pub items: Vec<LeaderboardEntry>,
}

impl LeaderboardList {
    /// 排名必须为正且在页内非递减
    pub fn validate(self) -> Result<Self, AppError> {
        if self.page == 0 || self.page_size == 0 {
            return Err(AppError::InvalidResponse("leaderboard page must be >= 1".into()));
        }
        if self.items.iter().any(|e| e.rank == 0) {
            return Err(AppError::InvalidResponse("leaderboard rank must be >= 1".into()));
        }
        if self.items.windows(2).any(|w| w[0].rank > w[1].rank) {
            return Err(AppError::InvalidResponse("leaderboard items out of order".into()));
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserRankInfo {
    pub user_id: u64,
    pub rank: u32,
    #[schema(value_type = String)]
    pub score: Amount,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserRank {
    pub period: LeaderboardPeriod,
    pub metric: MetricType,
    pub snapshot_at: String,
    pub user: UserRankInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MetricInfo {
    pub key: MetricType,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LeaderboardDefaults {
    pub period: PeriodType,
    pub metric: MetricType,
    pub page_size: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LeaderboardMetadata {
    pub periods: Vec<PeriodType>,
    pub metrics: Vec<MetricInfo>,
    pub timezone: String,
    pub defaults: LeaderboardDefaults,
}

/// 排行榜查询参数，对应 `/api/v1/leaderboard` 的 query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeaderboardQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<PeriodType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<MetricType>,
    /// YYYY-MM-DD
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

impl LeaderboardQuery {
    /// 只保留周期与指标，用于查询个人排名
    pub fn rank_scope(&self) -> Self {
        Self {
            period: self.period,
            metric: self.metric,
            ..Default::default()
        }
    }

    /// 合并部分参数；page 由 store 管理，始终忽略
    pub fn merge(&self, patch: LeaderboardQuery) -> Self {
        Self {
            period: patch.period.or(self.period),
            metric: patch.metric.or(self.metric),
            date: patch.date.or_else(|| self.date.clone()),
            page: None,
            page_size: patch.page_size.or(self.page_size),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Down,
    Same,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RankedEntryView {
    pub rank: u32,
    pub rank_label: String,
    pub user_id: u64,
    pub username: String,
    pub avatar_url: String,
    pub score: String,
    pub trend: TrendDirection,
    pub trend_delta: u32,
}

/// 排行榜页视图
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaderboardView {
    pub period: LeaderboardPeriod,
    pub metric: MetricType,
    pub snapshot_at: String,
    /// 领奖台顺序：第二、第一、第三
    pub podium: Vec<RankedEntryView>,
    pub items: Vec<RankedEntryView>,
    pub my_rank: Option<UserRank>,
    pub page: u32,
    pub total: u64,
    pub has_more: bool,
}
