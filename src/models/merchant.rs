use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::Amount;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatePaymentLinkRequest {
    pub product_name: String,
    /// 十进制金额字符串
    pub amount: String,
    #[serde(default)]
    pub remark: Option<String>,
}

impl CreatePaymentLinkRequest {
    /// 提交前校验，失败时不发出任何请求
    pub fn validate(&self) -> AppResult<Amount> {
        if self.product_name.trim().is_empty() || self.amount.trim().is_empty() {
            return Err(AppError::ValidationError("请填写完整信息".into()));
        }
        if self.product_name.chars().count() > 64 {
            return Err(AppError::ValidationError("商品名称不能超过 64 个字符".into()));
        }
        let amount = Amount::parse(&self.amount)
            .map_err(|_| AppError::ValidationError("金额格式无效".into()))?;
        if !amount.is_positive() {
            return Err(AppError::ValidationError("金额必须大于 0".into()));
        }
        Ok(amount)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentLink {
    pub id: u64,
    pub token: String,
    pub product_name: String,
    #[schema(value_type = String)]
    pub amount: Amount,
    #[serde(default)]
    pub remark: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PaymentLink {
    /// 面向付款方的支付页地址
    pub fn pay_url(&self, origin: &str) -> String {
        format!("{}/paying/online?token={}", origin.trim_end_matches('/'), self.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_link_validation() {
        let req = CreatePaymentLinkRequest {
            product_name: "".into(),
            amount: "10".into(),
            remark: None,
        };
        assert_eq!(
            req.validate().unwrap_err().user_message(),
            "请填写完整信息"
        );

        let req = CreatePaymentLinkRequest {
            product_name: "VPS".into(),
            amount: "0".into(),
            remark: None,
        };
        assert!(req.validate().is_err());

        let req = CreatePaymentLinkRequest {
            product_name: "VPS".into(),
            amount: "9.90".into(),
            remark: Some("月付".into()),
        };
        assert_eq!(req.validate().unwrap().as_str(), "9.90");
    }
}
