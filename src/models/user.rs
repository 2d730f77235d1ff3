use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// 当前登录用户
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub trust_level: u8,
    #[serde(default)]
    pub pay_score: i64,
    #[serde(default)]
    pub is_admin: bool,
}

/// OAuth 回调参数
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CallbackRequest {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

/// 发往上游的回调交换请求体
#[derive(Debug, Clone, Serialize)]
pub struct CallbackExchange {
    pub code: String,
    pub state: String,
}

impl CallbackRequest {
    pub fn into_exchange(self) -> Option<CallbackExchange> {
        match (self.code, self.state) {
            (Some(code), Some(state)) if !code.is_empty() && !state.is_empty() => {
                Some(CallbackExchange { code, state })
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_requires_code_and_state() {
        let req = CallbackRequest {
            code: Some("abc".into()),
            state: None,
        };
        assert!(req.into_exchange().is_none());

        let req = CallbackRequest {
            code: Some("abc".into()),
            state: Some("".into()),
        };
        assert!(req.into_exchange().is_none());

        let req = CallbackRequest {
            code: Some("abc".into()),
            state: Some("xyz".into()),
        };
        let ex = req.into_exchange().unwrap();
        assert_eq!(ex.code, "abc");
        assert_eq!(ex.state, "xyz");
    }
}
