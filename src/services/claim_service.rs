use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, watch};

use crate::error::{AppError, AppResult, ErrorInfo};
use crate::external::CreditApi;
use crate::models::*;
use crate::utils::{file_url, format_amount, format_claimed_at, sanitize_image_url, truncate_text};

pub const DEFAULT_GREETING: &str = "新年快乐，恭喜发财";
pub const EXHAUSTED_MESSAGE: &str = "手慢了，红包派完了";
const NAME_MAX_CHARS: usize = 12;

/// 红包数据来源
pub trait RedEnvelopeSource {
    fn detail(&self, id: &str) -> impl Future<Output = AppResult<RedEnvelopeDetail>>;
    fn claim(&self, id: &str) -> impl Future<Output = AppResult<ClaimResponse>>;
}

impl RedEnvelopeSource for CreditApi {
    async fn detail(&self, id: &str) -> AppResult<RedEnvelopeDetail> {
        self.red_envelope_detail(id).await
    }

    async fn claim(&self, id: &str) -> AppResult<ClaimResponse> {
        self.claim_red_envelope(id).await
    }
}

struct ClaimInner {
    state: ClaimState,
    detail: Option<RedEnvelopeDetail>,
    claimed_amount: Option<Amount>,
    error: Option<ErrorInfo>,
}

/// 根据详情决定初始状态：已领取优先，其次看红包是否仍可领
fn resolve_state(detail: &RedEnvelopeDetail) -> ClaimState {
    if detail.user_claimed.is_some() {
        ClaimState::Claimed
    } else if detail.red_envelope.status != RedEnvelopeStatus::Active {
        ClaimState::Opened
    } else {
        ClaimState::Ready
    }
}

/// 单个红包的领取流程
///
/// `loading → {ready, opened, claimed, error}`，`ready → opening → claimed`。
/// 状态变化通过 [`ClaimMachine::subscribe`] 广播，渲染端可据此播放开启动画。
pub struct ClaimMachine<S> {
    source: S,
    envelope_id: String,
    reveal_delay: Duration,
    state_tx: watch::Sender<ClaimState>,
    inner: RwLock<ClaimInner>,
}

impl<S: RedEnvelopeSource> ClaimMachine<S> {
    pub fn new(source: S, envelope_id: impl Into<String>, reveal_delay: Duration) -> Self {
        let (state_tx, _) = watch::channel(ClaimState::Loading);
        Self {
            source,
            envelope_id: envelope_id.into(),
            reveal_delay,
            state_tx,
            inner: RwLock::new(ClaimInner {
                state: ClaimState::Loading,
                detail: None,
                claimed_amount: None,
                error: None,
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ClaimState> {
        self.state_tx.subscribe()
    }

    pub fn state(&self) -> ClaimState {
        *self.state_tx.borrow()
    }

    fn transition(&self, inner: &mut ClaimInner, state: ClaimState) {
        log::debug!(
            "red envelope {} state {:?} -> {:?}",
            self.envelope_id,
            inner.state,
            state
        );
        inner.state = state;
        self.state_tx.send_replace(state);
    }

    /// 首次加载详情
    pub async fn load(&self) -> AppResult<ClaimState> {
        if self.state() != ClaimState::Loading {
            return Err(AppError::ValidationError("红包已加载".to_string()));
        }

        let result = self.source.detail(&self.envelope_id).await;

        let mut inner = self.inner.write().await;
        match result {
            Ok(detail) => {
                let state = resolve_state(&detail);
                inner.claimed_amount = detail.user_claimed.as_ref().map(|c| c.amount.clone());
                inner.detail = Some(detail);
                self.transition(&mut inner, state);
                Ok(state)
            }
            Err(e) => {
                log::warn!("failed to load red envelope {}: {}", self.envelope_id, e);
                inner.error = Some(e.info());
                self.transition(&mut inner, ClaimState::Error);
                Err(e)
            }
        }
    }

    /// 拆红包，成功返回领取金额
    ///
    /// 仅在 ready 状态下可调用。网络或服务端错误回到 ready；
    /// 业务拒绝（如已被领完）会重新拉取详情并据此决定状态。
    /// 领取成功但详情拉取失败时同样回到 ready 并返回该错误。
    pub async fn open(&self) -> AppResult<Amount> {
        {
            let mut inner = self.inner.write().await;
            if inner.state != ClaimState::Ready {
                return Err(AppError::ValidationError("红包当前不可领取".to_string()));
            }
            inner.error = None;
            self.transition(&mut inner, ClaimState::Opening);
        }

        match self.source.claim(&self.envelope_id).await {
            Ok(resp) => {
                // 领取成功后以服务端列表为准，拉取失败时不展示金额
                let detail = match self.source.detail(&self.envelope_id).await {
                    Ok(detail) => detail,
                    Err(e) => {
                        log::warn!(
                            "failed to refresh red envelope {} after claim: {}",
                            self.envelope_id,
                            e
                        );
                        let mut inner = self.inner.write().await;
                        inner.error = Some(e.info());
                        self.transition(&mut inner, ClaimState::Ready);
                        return Err(e);
                    }
                };
                {
                    let mut inner = self.inner.write().await;
                    inner.claimed_amount = Some(resp.amount.clone());
                    inner.detail = Some(detail);
                }

                tokio::time::sleep(self.reveal_delay).await;

                let mut inner = self.inner.write().await;
                self.transition(&mut inner, ClaimState::Claimed);
                log::info!("red envelope {} claimed {}", self.envelope_id, resp.amount);
                Ok(resp.amount)
            }
            Err(e @ AppError::Rejected(_)) => {
                log::info!("claim of red envelope {} rejected: {}", self.envelope_id, e);
                let refreshed = self.source.detail(&self.envelope_id).await;

                let mut inner = self.inner.write().await;
                inner.error = Some(e.info());
                match refreshed {
                    Ok(detail) => {
                        let state = resolve_state(&detail);
                        inner.claimed_amount =
                            detail.user_claimed.as_ref().map(|c| c.amount.clone());
                        inner.detail = Some(detail);
                        self.transition(&mut inner, state);
                    }
                    Err(refresh_err) => {
                        log::warn!(
                            "failed to refresh red envelope {} after rejection: {}",
                            self.envelope_id,
                            refresh_err
                        );
                        self.transition(&mut inner, ClaimState::Ready);
                    }
                }
                Err(e)
            }
            Err(e) => {
                log::warn!("claim of red envelope {} failed: {}", self.envelope_id, e);
                let mut inner = self.inner.write().await;
                inner.error = Some(e.info());
                self.transition(&mut inner, ClaimState::Ready);
                Err(e)
            }
        }
    }

    /// 当前状态对应的页面视图
    pub async fn view(&self, now: DateTime<Utc>) -> ClaimView {
        let inner = self.inner.read().await;
        let mut view = ClaimView {
            state: inner.state,
            error: inner.error.as_ref().map(|e| e.message.clone()),
            envelope_id: self.envelope_id.clone(),
            envelope_type: None,
            greeting: None,
            creator_username: None,
            creator_display_name: None,
            creator_avatar_url: None,
            cover_image: None,
            heterotypic_image: None,
            claimed_amount: None,
            exhausted_message: None,
            total_amount: None,
            claimed_count: 0,
            total_count: 0,
            claims: Vec::new(),
        };

        let Some(detail) = &inner.detail else {
            return view;
        };
        let envelope = &detail.red_envelope;
        let best_luck = detail.best_luck_claim_id();

        view.envelope_type = Some(envelope.envelope_type);
        view.greeting = Some(
            envelope
                .greeting
                .as_deref()
                .filter(|g| !g.trim().is_empty())
                .unwrap_or(DEFAULT_GREETING)
                .to_string(),
        );
        view.creator_username = envelope.creator_username.clone();
        view.creator_display_name = envelope
            .creator_username
            .as_deref()
            .map(|name| truncate_text(Some(name), NAME_MAX_CHARS));
        view.creator_avatar_url = envelope.creator_avatar_url.clone();
        view.cover_image = sanitize_image_url(file_url(envelope.cover_upload_id).as_deref());
        view.heterotypic_image =
            sanitize_image_url(file_url(envelope.heterotypic_upload_id).as_deref());

        match inner.state {
            ClaimState::Claimed => {
                view.claimed_amount = inner.claimed_amount.as_ref().map(format_amount);
            }
            ClaimState::Opened => view.exhausted_message = Some(EXHAUSTED_MESSAGE.to_string()),
            _ => {}
        }

        view.total_amount = Some(format_amount(&envelope.total_amount));
        view.claimed_count = detail.claims.len();
        view.total_count = envelope.total_count as usize;
        view.claims = detail
            .claims
            .iter()
            .map(|claim| ClaimRowView {
                id: claim.id.clone(),
                username: claim.username.clone(),
                display_name: truncate_text(Some(&claim.username), NAME_MAX_CHARS),
                avatar_url: claim.avatar_url.clone(),
                amount: format_amount(&claim.amount),
                claimed_at: format_claimed_at(claim.claimed_at.as_deref(), now),
                best_luck: best_luck == Some(claim.id.as_str()),
            })
            .collect();
        view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockSource {
        details: Mutex<VecDeque<AppResult<RedEnvelopeDetail>>>,
        claims: Mutex<VecDeque<AppResult<ClaimResponse>>>,
        claim_calls: Mutex<u32>,
    }

    impl MockSource {
        fn with_details(details: Vec<AppResult<RedEnvelopeDetail>>) -> Self {
            Self {
                details: Mutex::new(details.into()),
                ..Default::default()
            }
        }

        fn push_claim(self, result: AppResult<ClaimResponse>) -> Self {
            self.claims.lock().unwrap().push_back(result);
            self
        }
    }

    impl RedEnvelopeSource for MockSource {
        async fn detail(&self, _id: &str) -> AppResult<RedEnvelopeDetail> {
            self.details
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AppError::NotFound("no more details".into())))
        }

        async fn claim(&self, _id: &str) -> AppResult<ClaimResponse> {
            *self.claim_calls.lock().unwrap() += 1;
            self.claims
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AppError::ExternalApiError("no claim".into())))
        }
    }

    fn detail(status: &str, claims: serde_json::Value, user_claimed: Option<&str>) -> RedEnvelopeDetail {
        let mut raw = json!({
            "red_envelope": {
                "id": "env-1",
                "type": "random",
                "total_amount": "100",
                "total_count": 5,
                "remaining_count": 3,
                "status": status,
                "creator_username": "a_very_long_creator_name",
                "cover_upload_id": 7
            },
            "claims": claims
        });
        if let Some(amount) = user_claimed {
            raw["user_claimed"] = json!({"amount": amount});
        }
        let raw: RedEnvelopeDetailRaw = serde_json::from_value(raw).unwrap();
        RedEnvelopeDetail::try_from(raw).unwrap()
    }

    fn claim_ok(amount: &str) -> AppResult<ClaimResponse> {
        Ok(ClaimResponse {
            amount: Amount::parse(amount).unwrap(),
        })
    }

    fn machine(source: MockSource) -> ClaimMachine<MockSource> {
        ClaimMachine::new(source, "env-1", Duration::from_millis(1500))
    }

    #[tokio::test]
    async fn test_inactive_unclaimed_is_opened() {
        for status in ["finished", "expired"] {
            let m = machine(MockSource::with_details(vec![Ok(detail(status, json!([]), None))]));
            assert_eq!(m.load().await.unwrap(), ClaimState::Opened);
            let view = m.view(Utc::now()).await;
            assert_eq!(view.exhausted_message.as_deref(), Some(EXHAUSTED_MESSAGE));
            assert!(view.claimed_amount.is_none());
            assert!(m.open().await.is_err());
        }
    }

    #[tokio::test]
    async fn test_user_claimed_wins_over_status() {
        for status in ["active", "finished", "expired"] {
            let m = machine(MockSource::with_details(vec![Ok(detail(
                status,
                json!([]),
                Some("8.88"),
            ))]));
            assert_eq!(m.load().await.unwrap(), ClaimState::Claimed);
            assert_eq!(m.view(Utc::now()).await.claimed_amount.as_deref(), Some("8.88"));
        }
    }

    #[tokio::test]
    async fn test_load_failure_is_terminal_error() {
        let m = machine(MockSource::with_details(vec![Err(AppError::NotFound(
            "红包不存在".into(),
        ))]));
        assert!(m.load().await.is_err());
        assert_eq!(m.state(), ClaimState::Error);
        let view = m.view(Utc::now()).await;
        assert_eq!(view.error.as_deref(), Some("红包不存在"));
        assert!(m.open().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_claim_uses_refetched_claims() {
        let refreshed = detail(
            "active",
            json!([
                {"id": "c1", "username": "bob", "amount": "2.00"},
                {"id": "c2", "username": "me", "amount": "5.00"}
            ]),
            Some("5.00"),
        );
        let source = MockSource::with_details(vec![
            Ok(detail("active", json!([{"id": "c1", "username": "bob", "amount": "2.00"}]), None)),
            Ok(refreshed),
        ])
        .push_claim(claim_ok("5.00"));
        let m = machine(source);
        assert_eq!(m.load().await.unwrap(), ClaimState::Ready);

        let amount = m.open().await.unwrap();
        assert_eq!(amount.as_str(), "5.00");
        assert_eq!(m.state(), ClaimState::Claimed);

        let view = m.view(Utc::now()).await;
        let ids: Vec<&str> = view.claims.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2"]);
        assert!(view.claims[1].best_luck);
        assert_eq!(view.claimed_amount.as_deref(), Some("5.00"));
        assert_eq!(view.claimed_count, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_opening_is_observable_and_amount_hidden() {
        let source = MockSource::with_details(vec![
            Ok(detail("active", json!([]), None)),
            Ok(detail("active", json!([]), Some("1.23"))),
        ])
        .push_claim(claim_ok("1.23"));
        let m = machine(source);
        m.load().await.unwrap();

        let mut rx = m.subscribe();
        let observer = async {
            let mut seen = Vec::new();
            while rx.changed().await.is_ok() {
                let state = *rx.borrow_and_update();
                if state == ClaimState::Opening {
                    assert!(m.view(Utc::now()).await.claimed_amount.is_none());
                }
                seen.push(state);
                if state != ClaimState::Opening {
                    break;
                }
            }
            seen
        };
        let (opened, seen) = tokio::join!(m.open(), observer);
        assert!(opened.is_ok());
        assert_eq!(seen, vec![ClaimState::Opening, ClaimState::Claimed]);
    }

    #[tokio::test]
    async fn test_transient_failure_returns_to_ready() {
        let source = MockSource::with_details(vec![Ok(detail("active", json!([]), None))])
            .push_claim(Err(AppError::ExternalApiError("服务繁忙".into())))
            .push_claim(claim_ok("3"));
        let m = ClaimMachine::new(source, "env-1", Duration::ZERO);
        m.load().await.unwrap();

        let err = m.open().await.unwrap_err();
        assert_eq!(err.surface(), crate::error::ErrorSurface::Toast);
        assert_eq!(m.state(), ClaimState::Ready);
        assert_eq!(m.view(Utc::now()).await.error.as_deref(), Some("服务繁忙"));

        // 可以再次尝试
        assert!(m.open().await.is_ok());
        assert_eq!(*m.source.claim_calls.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_refetch_failure_after_claim_returns_to_ready() {
        let source = MockSource::with_details(vec![
            Ok(detail("active", json!([]), None)),
            Err(AppError::ExternalApiError("网络异常".into())),
        ])
        .push_claim(claim_ok("4.20"));
        let m = ClaimMachine::new(source, "env-1", Duration::ZERO);
        m.load().await.unwrap();

        let err = m.open().await.unwrap_err();
        assert_eq!(err.surface(), crate::error::ErrorSurface::Toast);
        assert_eq!(m.state(), ClaimState::Ready);

        let view = m.view(Utc::now()).await;
        assert_eq!(view.error.as_deref(), Some("网络异常"));
        assert!(view.claimed_amount.is_none());
        assert_eq!(view.claimed_count, 0);
    }

    #[tokio::test]
    async fn test_rejection_resolves_from_fresh_detail() {
        let source = MockSource::with_details(vec![
            Ok(detail("active", json!([]), None)),
            Ok(detail("finished", json!([{"id": "c1", "username": "x", "amount": "100"}]), None)),
        ])
        .push_claim(Err(AppError::Rejected("红包已领完".into())));
        let m = machine(source);
        m.load().await.unwrap();

        assert!(matches!(m.open().await, Err(AppError::Rejected(_))));
        assert_eq!(m.state(), ClaimState::Opened);
        assert_eq!(m.view(Utc::now()).await.claims.len(), 1);
    }

    #[tokio::test]
    async fn test_view_presentation() {
        let m = machine(MockSource::with_details(vec![Ok(detail(
            "active",
            json!([{"id": "c1", "username": "一二三四五六七八九十壹贰叁", "amount": "1"}]),
            None,
        ))]));
        m.load().await.unwrap();
        let view = m.view(Utc::now()).await;
        assert_eq!(view.greeting.as_deref(), Some(DEFAULT_GREETING));
        assert_eq!(view.creator_display_name.as_deref(), Some("a_very_long_…"));
        assert_eq!(view.cover_image.as_deref(), Some("/f/7"));
        assert!(view.heterotypic_image.is_none());
        assert_eq!(view.claims[0].display_name, "一二三四五六七八九十壹贰…");
        assert_eq!(view.total_amount.as_deref(), Some("100.00"));
        assert_eq!(view.total_count, 5);
    }
}
