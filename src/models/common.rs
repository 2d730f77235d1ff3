use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use utoipa::ToSchema;

use super::{Balance, ClaimView, CropResponse, DisputeList, LeaderboardView, PaymentLink};
use crate::error::{AppError, AppResult, ErrorInfo};

/// 本服务对外的统一响应
#[derive(Debug, Serialize, ToSchema)]
#[aliases(
    ClaimViewResponse = ApiResponse<ClaimView>,
    LeaderboardViewResponse = ApiResponse<LeaderboardView>,
    BalanceResponse = ApiResponse<Balance>,
    DisputeListResponse = ApiResponse<DisputeList>,
    PaymentLinkResponse = ApiResponse<PaymentLink>,
    CropApiResponse = ApiResponse<CropResponse>
)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error: None,
        }
    }

    pub fn failure(error: ErrorInfo) -> Self {
        Self {
            success: false,
            data: None,
            message: None,
            error: Some(error),
        }
    }
}

/// 上游 Credit API 的响应包裹 `{ "error_msg": "", "data": ... }`
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub error_msg: String,
    pub data: Option<T>,
}

/// 十进制金额 / 分数
///
/// 上游以字符串（有时是数字）下发，保留原始文本用于回传，
/// 比较与格式化使用 [`Decimal`]。
#[derive(Debug, Clone, PartialEq)]
pub struct Amount {
    raw: String,
    value: Decimal,
}

impl Amount {
    pub fn parse(raw: &str) -> AppResult<Self> {
        let raw = raw.trim();
        let digits = raw.strip_prefix('-').unwrap_or(raw);
        let mut parts = digits.splitn(2, '.');
        let int_part = parts.next().unwrap_or_default();
        let frac_part = parts.next();

        // 只接受普通十进制写法，不接受科学计数法
        let valid = !int_part.is_empty()
            && int_part.chars().all(|c| c.is_ascii_digit())
            && frac_part.is_none_or(|f| !f.is_empty() && f.chars().all(|c| c.is_ascii_digit()));
        if !valid {
            return Err(AppError::InvalidResponse(format!("invalid amount: {raw:?}")));
        }

        let value = Decimal::from_str_exact(raw)
            .map_err(|e| AppError::InvalidResponse(format!("invalid amount {raw:?}: {e}")))?;

        Ok(Self {
            raw: raw.to_string(),
            value,
        })
    }

    pub fn zero() -> Self {
        Self {
            raw: "0".to_string(),
            value: Decimal::ZERO,
        }
    }

    pub fn value(&self) -> Decimal {
        self.value
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_negative(&self) -> bool {
        self.value < Decimal::ZERO
    }

    pub fn is_positive(&self) -> bool {
        self.value > Decimal::ZERO
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(serde_json::Number),
        }

        let raw = match Raw::deserialize(deserializer)? {
            Raw::Text(s) => s,
            Raw::Number(n) => n.to_string(),
        };
        Amount::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_parse() {
        assert_eq!(Amount::parse("12.50").unwrap().value(), Decimal::new(125, 1));
        assert_eq!(Amount::parse(" 3 ").unwrap().as_str(), "3");
        assert!(Amount::parse("-1.2").unwrap().is_negative());
        assert!(Amount::parse("NaN").is_err());
        assert!(Amount::parse("1e5").is_err());
        assert!(Amount::parse("1.").is_err());
        assert!(Amount::parse("").is_err());

        // 超出 f64 精度的金额仍能区分大小
        let a = Amount::parse("10000000000000000.01").unwrap();
        let b = Amount::parse("10000000000000000.02").unwrap();
        assert!(a.value() < b.value());
    }

    #[test]
    fn test_amount_deserialize_string_or_number() {
        let a: Amount = serde_json::from_str("\"8.88\"").unwrap();
        assert_eq!(a.as_str(), "8.88");
        let b: Amount = serde_json::from_str("6").unwrap();
        assert_eq!(b.value(), Decimal::from(6));
        assert!(serde_json::from_str::<Amount>("\"abc\"").is_err());
        assert_eq!(serde_json::to_string(&a).unwrap(), "\"8.88\"");
    }

    #[test]
    fn test_envelope_defaults() {
        let env: Envelope<serde_json::Value> = serde_json::from_str(r#"{"data": 1}"#).unwrap();
        assert!(env.error_msg.is_empty());
        assert_eq!(env.data, Some(serde_json::json!(1)));
    }
}
