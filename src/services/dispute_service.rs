use std::future::Future;

use crate::error::{AppError, AppResult};
use crate::external::CreditApi;
use crate::models::*;
use crate::store::{Resource, ResourceState};

pub trait DisputeSource {
    fn disputes(&self, query: &DisputeQuery) -> impl Future<Output = AppResult<DisputeList>>;
}

impl DisputeSource for CreditApi {
    async fn disputes(&self, query: &DisputeQuery) -> AppResult<DisputeList> {
        CreditApi::disputes(self, query).await
    }
}

/// 待处理争议（第一页 `disputing`）
///
/// 首次加载失败时降级为空列表，手动刷新失败才提示错误。
pub struct DisputeStore<S> {
    source: S,
    signed_in: bool,
    disputes: Resource<DisputeList>,
}

impl<S: DisputeSource> DisputeStore<S> {
    pub fn new(source: S, signed_in: bool) -> Self {
        Self {
            source,
            signed_in,
            disputes: Resource::new(),
        }
    }

    pub async fn initial_load(&self) -> AppResult<DisputeList> {
        if !self.signed_in {
            return Ok(DisputeList::default());
        }
        match self
            .disputes
            .load(self.source.disputes(&DisputeQuery::open_disputes()))
            .await
        {
            Ok(list) => Ok(list),
            Err(AppError::Cancelled) => Err(AppError::Cancelled),
            Err(e) => {
                log::warn!("failed to load disputes: {e}");
                let empty = DisputeList::default();
                self.disputes.set(empty.clone()).await;
                Ok(empty)
            }
        }
    }

    pub async fn refresh(&self) -> AppResult<DisputeList> {
        if !self.signed_in {
            return Err(AppError::AuthError("请先登录".to_string()));
        }
        self.disputes
            .load(self.source.disputes(&DisputeQuery::open_disputes()))
            .await
    }

    pub async fn snapshot(&self) -> ResourceState<DisputeList> {
        self.disputes.snapshot().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockDisputes {
        fail: bool,
        calls: Mutex<Vec<DisputeQuery>>,
    }

    impl DisputeSource for MockDisputes {
        async fn disputes(&self, query: &DisputeQuery) -> AppResult<DisputeList> {
            self.calls.lock().unwrap().push(query.clone());
            if self.fail {
                return Err(AppError::ExternalApiError("服务繁忙".into()));
            }
            Ok(DisputeList {
                total: 1,
                disputes: Vec::new(),
            })
        }
    }

    #[tokio::test]
    async fn test_initial_failure_degrades_to_empty() {
        let store = DisputeStore::new(
            MockDisputes {
                fail: true,
                ..Default::default()
            },
            true,
        );
        let list = store.initial_load().await.unwrap();
        assert_eq!(list.total, 0);
        assert!(store.snapshot().await.error.is_none());

        let err = store.refresh().await.unwrap_err();
        assert_eq!(err.surface(), crate::error::ErrorSurface::Toast);
        assert!(store.snapshot().await.error.is_some());
    }

    #[tokio::test]
    async fn test_requests_first_page_of_open_disputes() {
        let store = DisputeStore::new(MockDisputes::default(), true);
        assert_eq!(store.initial_load().await.unwrap().total, 1);

        let calls = store.source.calls.lock().unwrap();
        assert_eq!(calls[0].page, 1);
        assert_eq!(calls[0].page_size, DISPUTE_PAGE_SIZE);
        assert_eq!(calls[0].status, DisputeStatus::Disputing);
    }

    #[tokio::test]
    async fn test_signed_out_skips_fetch() {
        let store = DisputeStore::new(MockDisputes::default(), false);
        assert_eq!(store.initial_load().await.unwrap().total, 0);
        assert!(store.refresh().await.is_err());
        assert!(store.source.calls.lock().unwrap().is_empty());
    }
}
