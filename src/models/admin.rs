use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::Amount;
use crate::error::{AppError, AppResult};

/// 支付等级配置（按积分区间划分费率）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserPayConfig {
    pub id: u64,
    pub level: u8,
    pub min_score: i64,
    #[serde(default)]
    pub max_score: Option<i64>,
    #[serde(default)]
    pub daily_limit: Option<i64>,
    #[schema(value_type = String)]
    pub fee_rate: Amount,
    #[schema(value_type = String)]
    pub score_rate: Amount,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserPayConfig {
    /// 积分落在 [min_score, max_score) 区间内；max_score 为空表示无上限
    pub fn covers(&self, score: i64) -> bool {
        self.min_score <= score && self.max_score.is_none_or(|max| max > score)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SystemConfig {
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateUserPayConfigRequest {
    pub min_score: i64,
    #[serde(default)]
    pub max_score: Option<i64>,
    #[serde(default)]
    pub daily_limit: Option<i64>,
    /// 0 到 1 之间的小数
    pub fee_rate: String,
    pub score_rate: String,
}

impl UpdateUserPayConfigRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.min_score < 0 {
            return Err(AppError::ValidationError("最低分数不能为负数".into()));
        }
        if let Some(max) = self.max_score
            && max <= self.min_score
        {
            return Err(AppError::ValidationError("最高分数必须大于最低分数".into()));
        }
        if let Some(limit) = self.daily_limit
            && limit < 0
        {
            return Err(AppError::ValidationError("每日限额不能为负数".into()));
        }
        validate_rate("费率", &self.fee_rate)?;
        validate_rate("积分比例", &self.score_rate)?;
        Ok(())
    }
}

fn validate_rate(label: &str, raw: &str) -> AppResult<()> {
    let rate = Amount::parse(raw)
        .map_err(|_| AppError::ValidationError(format!("{label}必须是数字")))?;
    if !(Decimal::ZERO..=Decimal::ONE).contains(&rate.value()) {
        return Err(AppError::ValidationError(format!("{label}必须在 0 到 1 之间")));
    }
    Ok(())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateSystemConfigRequest {
    pub value: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl UpdateSystemConfigRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.value.trim().is_empty() {
            return Err(AppError::ValidationError("配置值不能为空".into()));
        }
        Ok(())
    }
}
