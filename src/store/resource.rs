use std::future::Future;

use serde::Serialize;
use tokio::sync::RwLock;

use super::RequestGuard;
use crate::error::{AppError, AppResult, ErrorInfo};

/// 单值数据的状态快照：`{data, loading, error}`
#[derive(Debug, Clone, Serialize)]
pub struct ResourceState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<ErrorInfo>,
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

/// 单值数据（余额、元数据、个人排名、配置列表等）
///
/// 只有最近一次发起的请求能写入状态。
pub struct Resource<T> {
    guard: RequestGuard,
    state: RwLock<ResourceState<T>>,
}

impl<T> Default for Resource<T> {
    fn default() -> Self {
        Self {
            guard: RequestGuard::new(),
            state: RwLock::new(ResourceState::default()),
        }
    }
}

impl<T: Clone> Resource<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 执行一次加载；被更新的请求取代时返回 [`AppError::Cancelled`] 且不改动状态
    pub async fn load<F>(&self, fut: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        let token = self.guard.issue();
        {
            let mut state = self.state.write().await;
            state.loading = true;
            state.error = None;
        }

        let result = fut.await;

        let mut state = self.state.write().await;
        if !self.guard.is_current(token) {
            log::debug!("dropping superseded response");
            return Err(AppError::Cancelled);
        }
        state.loading = false;
        match result {
            Ok(data) => {
                state.data = Some(data.clone());
                Ok(data)
            }
            Err(e) => {
                if !e.is_cancel() {
                    state.error = Some(e.info());
                }
                Err(e)
            }
        }
    }

    pub async fn snapshot(&self) -> ResourceState<T> {
        self.state.read().await.clone()
    }

    pub async fn data(&self) -> Option<T> {
        self.state.read().await.data.clone()
    }

    /// 直接写入数据，并使进行中的请求失效
    pub async fn set(&self, data: T) {
        let mut state = self.state.write().await;
        self.guard.invalidate();
        state.data = Some(data);
        state.loading = false;
        state.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_load_commits_data() {
        let res: Resource<u32> = Resource::new();
        assert_eq!(res.load(async { Ok(7) }).await.unwrap(), 7);
        let snap = res.snapshot().await;
        assert_eq!(snap.data, Some(7));
        assert!(!snap.loading);
        assert!(snap.error.is_none());
    }

    #[tokio::test]
    async fn test_error_recorded_data_kept() {
        let res: Resource<u32> = Resource::new();
        res.load(async { Ok(1) }).await.unwrap();
        let err = res
            .load(async { Err(AppError::ExternalApiError("boom".into())) })
            .await;
        assert!(err.is_err());
        let snap = res.snapshot().await;
        assert_eq!(snap.data, Some(1));
        assert_eq!(snap.error.unwrap().message, "boom");
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_stale_response_is_dropped() {
        let res: Resource<&'static str> = Resource::new();
        let slow = res.load(async {
            tokio::time::sleep(Duration::from_millis(300)).await;
            Ok("old")
        });
        let fast = res.load(async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok("new")
        });
        let (slow, fast) = tokio::join!(slow, fast);
        assert!(matches!(slow, Err(AppError::Cancelled)));
        assert_eq!(fast.unwrap(), "new");
        assert_eq!(res.data().await, Some("new"));
    }
}
