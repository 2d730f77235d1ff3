use crate::config::UpstreamConfig;
use crate::error::{AppError, AppResult};
use crate::models::*;
use reqwest::{Client, RequestBuilder, StatusCode, header};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 远端 Credit API 客户端
///
/// 克隆开销很小（内部共享连接池）；每个浏览器请求通过 [`CreditApi::with_cookie`]
/// 派生出携带该用户会话 Cookie 的实例。
#[derive(Clone)]
pub struct CreditApi {
    http: Client,
    base_url: String,
    cookie: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RedEnvelopeListRaw {
    total: u64,
    #[serde(default)]
    list: Vec<RedEnvelope>,
}

#[derive(Debug, Deserialize)]
struct LoginUrlRaw {
    url: String,
}

impl CreditApi {
    pub fn new(cfg: &UpstreamConfig) -> AppResult<Self> {
        let http = Client::builder()
            .user_agent(cfg.user_agent.as_str())
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            cookie: None,
        })
    }

    /// 派生一个携带调用方 Cookie 的客户端
    pub fn with_cookie(&self, cookie: Option<String>) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            cookie: cookie.filter(|c| !c.is_empty()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn prepare(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.cookie {
            Some(cookie) => req.header(header::COOKIE, cookie),
            None => req,
        }
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> AppResult<T> {
        let resp = self.prepare(req).send().await?;
        let status = resp.status();
        let body = resp.bytes().await?;
        decode_envelope(status, &body)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &impl Serialize) -> AppResult<T> {
        log::debug!("GET {path}");
        self.send(self.http.get(self.url(path)).query(query)).await
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: &impl Serialize) -> AppResult<T> {
        log::debug!("POST {path}");
        self.send(self.http.post(self.url(path)).json(body)).await
    }

    async fn put<T: DeserializeOwned>(&self, path: &str, body: &impl Serialize) -> AppResult<T> {
        log::debug!("PUT {path}");
        self.send(self.http.put(self.url(path)).json(body)).await
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        log::debug!("DELETE {path}");
        self.send::<serde_json::Value>(self.http.delete(self.url(path)))
            .await
            .map(|_| ())
    }

    // ---- 排行榜 ----

    pub async fn leaderboard_list(&self, query: &LeaderboardQuery) -> AppResult<LeaderboardList> {
        let list: LeaderboardList = self.get("/api/v1/leaderboard", query).await?;
        list.validate()
    }

    pub async fn my_rank(&self, query: &LeaderboardQuery) -> AppResult<UserRank> {
        self.get("/api/v1/leaderboard/me", &query.rank_scope()).await
    }

    pub async fn user_rank(&self, user_id: u64, query: &LeaderboardQuery) -> AppResult<UserRank> {
        self.get(
            &format!("/api/v1/leaderboard/users/{user_id}"),
            &query.rank_scope(),
        )
        .await
    }

    pub async fn leaderboard_metadata(&self) -> AppResult<LeaderboardMetadata> {
        self.get("/api/v1/leaderboard/metadata", &()).await
    }

    // ---- 登录 ----

    pub async fn login_url(&self) -> AppResult<String> {
        let raw: LoginUrlRaw = self.get("/api/v1/oauth/login", &()).await?;
        Ok(raw.url)
    }

    /// 交换 OAuth code，返回上游下发的 Set-Cookie 头
    pub async fn exchange_callback(&self, exchange: &CallbackExchange) -> AppResult<Vec<String>> {
        let resp = self
            .prepare(self.http.post(self.url("/api/v1/oauth/callback")).json(exchange))
            .send()
            .await?;
        let status = resp.status();
        let cookies: Vec<String> = resp
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok().map(str::to_string))
            .collect();
        let body = resp.bytes().await?;
        decode_envelope::<serde_json::Value>(status, &body)?;
        Ok(cookies)
    }

    pub async fn user_info(&self) -> AppResult<User> {
        self.get("/api/v1/oauth/user-info", &()).await
    }

    // ---- 余额与交易 ----

    pub async fn balance(&self) -> AppResult<Balance> {
        self.get("/api/v1/balance", &()).await
    }

    pub async fn transactions(
        &self,
        query: &TransactionQuery,
        page: u32,
    ) -> AppResult<Page<Transaction>> {
        self.post(
            "/api/v1/order/transactions",
            &TransactionPageRequest { query, page },
        )
        .await
    }

    // ---- 红包 ----

    pub async fn red_envelope_detail(&self, id: &str) -> AppResult<RedEnvelopeDetail> {
        let id = validate_path_segment(id)?;
        let raw: RedEnvelopeDetailRaw = self.get(&format!("/api/v1/redenvelope/{id}"), &()).await?;
        RedEnvelopeDetail::try_from(raw)
    }

    pub async fn claim_red_envelope(&self, id: &str) -> AppResult<ClaimResponse> {
        let id = validate_path_segment(id)?;
        let resp: ClaimResponse = self
            .post("/api/v1/redenvelope/claim", &ClaimRequest { id: id.to_string() })
            .await?;
        if resp.amount.is_negative() {
            return Err(AppError::InvalidResponse("negative claim amount".into()));
        }
        Ok(resp)
    }

    pub async fn red_envelope_list(
        &self,
        query: &RedEnvelopeListQuery,
    ) -> AppResult<Page<RedEnvelope>> {
        let raw: RedEnvelopeListRaw = self.post("/api/v1/redenvelope/list", query).await?;
        Ok(Page::new(raw.list, query.page, query.page_size, raw.total))
    }

    // ---- 争议 ----

    pub async fn disputes(&self, query: &DisputeQuery) -> AppResult<DisputeList> {
        self.post("/api/v1/dispute/list", query).await
    }

    // ---- 商户 ----

    pub async fn create_payment_link(
        &self,
        api_key_id: u64,
        req: &CreatePaymentLinkRequest,
    ) -> AppResult<PaymentLink> {
        self.post(
            &format!("/api/v1/merchant/api-keys/{api_key_id}/payment-links"),
            req,
        )
        .await
    }

    // ---- 管理后台 ----

    pub async fn list_user_pay_configs(&self) -> AppResult<Vec<UserPayConfig>> {
        self.get("/api/v1/admin/user-pay-configs", &()).await
    }

    pub async fn update_user_pay_config(
        &self,
        id: u64,
        req: &UpdateUserPayConfigRequest,
    ) -> AppResult<()> {
        self.put::<serde_json::Value>(&format!("/api/v1/admin/user-pay-configs/{id}"), req)
            .await
            .map(|_| ())
    }

    pub async fn delete_user_pay_config(&self, id: u64) -> AppResult<()> {
        self.delete(&format!("/api/v1/admin/user-pay-configs/{id}"))
            .await
    }

    pub async fn list_system_configs(&self) -> AppResult<Vec<SystemConfig>> {
        self.get("/api/v1/admin/system-configs", &()).await
    }

    pub async fn update_system_config(
        &self,
        key: &str,
        req: &UpdateSystemConfigRequest,
    ) -> AppResult<()> {
        let key = validate_path_segment(key)?;
        self.put::<serde_json::Value>(&format!("/api/v1/admin/system-configs/{key}"), req)
            .await
            .map(|_| ())
    }

    pub async fn delete_system_config(&self, key: &str) -> AppResult<()> {
        let key = validate_path_segment(key)?;
        self.delete(&format!("/api/v1/admin/system-configs/{key}"))
            .await
    }
}

/// 解析上游响应包裹，非 2xx 按状态码映射错误
pub fn decode_envelope<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> AppResult<T> {
    let envelope: Option<Envelope<serde_json::Value>> = serde_json::from_slice(body).ok();

    if !status.is_success() {
        let message = envelope
            .map(|e| e.error_msg)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
        return Err(AppError::from_upstream(status.as_u16(), message));
    }

    let envelope = envelope.ok_or_else(|| {
        AppError::InvalidResponse(format!("HTTP {}: body is not a JSON envelope", status.as_u16()))
    })?;
    if !envelope.error_msg.is_empty() {
        return Err(AppError::Rejected(envelope.error_msg));
    }

    serde_json::from_value(envelope.data.unwrap_or(serde_json::Value::Null))
        .map_err(|e| AppError::InvalidResponse(e.to_string()))
}

/// 只允许字母数字、`-`、`_`、`.` 组成的路径片段
pub fn validate_path_segment(segment: &str) -> AppResult<&str> {
    let ok = !segment.is_empty()
        && segment.len() <= 128
        && segment != "."
        && segment != ".."
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if ok {
        Ok(segment)
    } else {
        Err(AppError::ValidationError(format!("invalid identifier: {segment:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_success() {
        let body = br#"{"error_msg": "", "data": {"amount": "6.66"}}"#;
        let resp: ClaimResponse = decode_envelope(StatusCode::OK, body).unwrap();
        assert_eq!(resp.amount.as_str(), "6.66");
    }

    #[test]
    fn test_decode_error_uses_server_message() {
        let body = r#"{"error_msg": "红包已领完", "data": null}"#.as_bytes();
        let err = decode_envelope::<ClaimResponse>(StatusCode::BAD_REQUEST, body).unwrap_err();
        assert!(matches!(err, AppError::Rejected(ref m) if m == "红包已领完"));

        let err = decode_envelope::<ClaimResponse>(StatusCode::NOT_FOUND, b"<html>").unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref m) if m == "Not Found"));
    }

    #[test]
    fn test_decode_rejects_bad_shape() {
        let body = br#"{"error_msg": "", "data": {"amount": "lots"}}"#;
        let err = decode_envelope::<ClaimResponse>(StatusCode::OK, body).unwrap_err();
        assert!(matches!(err, AppError::InvalidResponse(_)));

        let err = decode_envelope::<ClaimResponse>(StatusCode::OK, b"not json").unwrap_err();
        assert!(matches!(err, AppError::InvalidResponse(_)));
    }

    #[test]
    fn test_decode_unit_payload() {
        let body = br#"{"error_msg": ""}"#;
        let v: serde_json::Value = decode_envelope(StatusCode::OK, body).unwrap();
        assert!(v.is_null());
    }

    #[test]
    fn test_validate_path_segment() {
        assert!(validate_path_segment("abc-123_X").is_ok());
        assert!(validate_path_segment("").is_err());
        assert!(validate_path_segment("..").is_err());
        assert!(validate_path_segment("a/b").is_err());
        assert!(validate_path_segment("a?b=1").is_err());
    }

    #[test]
    fn test_with_cookie_drops_empty() {
        let cfg = UpstreamConfig {
            base_url: "https://credit.example/".into(),
            timeout_secs: 5,
            user_agent: "test".into(),
        };
        let api = CreditApi::new(&cfg).unwrap();
        assert_eq!(api.base_url(), "https://credit.example");
        assert!(api.with_cookie(Some(String::new())).cookie.is_none());
        assert_eq!(
            api.with_cookie(Some("a=b".into())).cookie.as_deref(),
            Some("a=b")
        );
    }
}
