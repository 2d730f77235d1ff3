use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::Amount;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RedEnvelopeType {
    /// 普通红包，平均分配
    Fixed,
    /// 拼手气红包
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RedEnvelopeStatus {
    Active,
    Finished,
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RedEnvelope {
    pub id: String,
    #[serde(rename = "type")]
    pub envelope_type: RedEnvelopeType,
    #[schema(value_type = String)]
    pub total_amount: Amount,
    pub total_count: u32,
    pub remaining_count: u32,
    pub status: RedEnvelopeStatus,
    #[serde(default)]
    pub greeting: Option<String>,
    #[serde(default)]
    pub creator_id: Option<u64>,
    #[serde(default)]
    pub creator_username: Option<String>,
    #[serde(default)]
    pub creator_avatar_url: Option<String>,
    #[serde(default)]
    pub cover_upload_id: Option<u64>,
    #[serde(default)]
    pub heterotypic_upload_id: Option<u64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RedEnvelopeClaim {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<u64>,
    pub username: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[schema(value_type = String)]
    pub amount: Amount,
    #[serde(default)]
    pub claimed_at: Option<String>,
}

/// 当前用户的领取记录
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserClaimed {
    #[schema(value_type = String)]
    pub amount: Amount,
    #[serde(default)]
    pub claimed_at: Option<String>,
}

/// 上游原始红包详情，未经校验
#[derive(Debug, Deserialize)]
pub struct RedEnvelopeDetailRaw {
    pub red_envelope: RedEnvelope,
    #[serde(default)]
    pub claims: Option<Vec<RedEnvelopeClaim>>,
    #[serde(default)]
    pub user_claimed: Option<UserClaimed>,
}

/// 校验后的红包详情快照
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RedEnvelopeDetail {
    pub red_envelope: RedEnvelope,
    pub claims: Vec<RedEnvelopeClaim>,
    pub user_claimed: Option<UserClaimed>,
}

impl TryFrom<RedEnvelopeDetailRaw> for RedEnvelopeDetail {
    type Error = AppError;

    fn try_from(raw: RedEnvelopeDetailRaw) -> Result<Self, Self::Error> {
        let envelope = raw.red_envelope;
        if envelope.id.trim().is_empty() {
            return Err(AppError::InvalidResponse("red envelope id is empty".into()));
        }
        if envelope.remaining_count > envelope.total_count {
            return Err(AppError::InvalidResponse(format!(
                "remaining_count {} exceeds total_count {}",
                envelope.remaining_count, envelope.total_count
            )));
        }
        if envelope.total_amount.is_negative() {
            return Err(AppError::InvalidResponse("negative total_amount".into()));
        }

        let claims = raw.claims.unwrap_or_default();
        if let Some(bad) = claims
            .iter()
            .find(|c| c.id.trim().is_empty() || c.amount.is_negative())
        {
            return Err(AppError::InvalidResponse(format!(
                "invalid claim record {:?}",
                bad.id
            )));
        }
        if let Some(claimed) = &raw.user_claimed
            && claimed.amount.is_negative()
        {
            return Err(AppError::InvalidResponse("negative user_claimed amount".into()));
        }

        Ok(Self {
            red_envelope: envelope,
            claims,
            user_claimed: raw.user_claimed,
        })
    }
}

impl RedEnvelopeDetail {
    /// 手气最佳：拼手气红包中金额最高的领取记录，金额相同取数组中靠前者
    pub fn best_luck_claim_id(&self) -> Option<&str> {
        if self.red_envelope.envelope_type != RedEnvelopeType::Random {
            return None;
        }

        let mut best: Option<&RedEnvelopeClaim> = None;
        for claim in &self.claims {
            match best {
                Some(top) if claim.amount.value() <= top.amount.value() => {}
                _ => best = Some(claim),
            }
        }
        best.map(|c| c.id.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClaimRequest {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClaimResponse {
    #[schema(value_type = String)]
    pub amount: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RedEnvelopeListQuery {
    pub page: u32,
    pub page_size: u32,
    /// sent / received
    #[serde(rename = "type")]
    pub list_type: String,
}

/// 红包领取页的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ClaimState {
    Loading,
    Ready,
    Opening,
    /// 红包已结束，当前用户未领取
    Opened,
    Claimed,
    Error,
}

/// 领取列表中的一行
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ClaimRowView {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub amount: String,
    pub claimed_at: String,
    pub best_luck: bool,
}

/// 红包领取页视图
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ClaimView {
    pub state: ClaimState,
    pub error: Option<String>,
    pub envelope_id: String,
    pub envelope_type: Option<RedEnvelopeType>,
    pub greeting: Option<String>,
    pub creator_username: Option<String>,
    pub creator_display_name: Option<String>,
    pub creator_avatar_url: Option<String>,
    pub cover_image: Option<String>,
    pub heterotypic_image: Option<String>,
    /// 仅在 claimed 状态下给出
    pub claimed_amount: Option<String>,
    pub exhausted_message: Option<String>,
    pub total_amount: Option<String>,
    pub claimed_count: usize,
    pub total_count: usize,
    pub claims: Vec<ClaimRowView>,
}
