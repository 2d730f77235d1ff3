use std::future::Future;

use serde::Serialize;
use tokio::sync::RwLock;

use super::RequestGuard;
use crate::error::{AppError, AppResult, ErrorInfo};
use crate::models::{Page, has_more};

/// 分页数据来源
pub trait PageSource {
    type Item: Clone;
    type Query: Clone;

    fn fetch_page(
        &self,
        query: &Self::Query,
        page: u32,
    ) -> impl Future<Output = AppResult<Page<Self::Item>>>;
}

#[derive(Debug, Clone, Serialize)]
pub struct PagedState<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub loading: bool,
    pub loading_more: bool,
    pub error: Option<ErrorInfo>,
}

impl<T> Default for PagedState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            page: 0,
            page_size: 0,
            total: 0,
            loading: false,
            loading_more: false,
            error: None,
        }
    }
}

impl<T> PagedState<T> {
    pub fn has_more(&self) -> bool {
        self.page > 0 && has_more(self.page, self.page_size, self.total)
    }
}

/// 分页列表：筛选条件变化时替换列表，加载更多时追加
pub struct PagedStore<S: PageSource> {
    source: S,
    guard: RequestGuard,
    query: RwLock<S::Query>,
    state: RwLock<PagedState<S::Item>>,
}

impl<S: PageSource> PagedStore<S> {
    pub fn new(source: S, query: S::Query) -> Self {
        Self {
            source,
            guard: RequestGuard::new(),
            query: RwLock::new(query),
            state: RwLock::new(PagedState::default()),
        }
    }

    pub async fn query(&self) -> S::Query {
        self.query.read().await.clone()
    }

    pub async fn snapshot(&self) -> PagedState<S::Item> {
        self.state.read().await.clone()
    }

    /// 替换筛选条件并从第一页重新加载
    pub async fn set_query(&self, query: S::Query) -> AppResult<()> {
        *self.query.write().await = query;
        {
            let mut state = self.state.write().await;
            state.items.clear();
            state.page = 0;
            state.total = 0;
        }
        self.refetch().await
    }

    /// 重新加载第一页；返回 [`AppError::Cancelled`] 表示结果已被更新的请求取代
    pub async fn refetch(&self) -> AppResult<()> {
        let token = self.guard.issue();
        let query = self.query().await;
        {
            let mut state = self.state.write().await;
            state.loading = true;
            state.loading_more = false;
            state.error = None;
        }

        let result = self.source.fetch_page(&query, 1).await;

        let mut state = self.state.write().await;
        if !self.guard.is_current(token) {
            log::debug!("dropping superseded page response");
            return Err(AppError::Cancelled);
        }
        state.loading = false;
        match result {
            Ok(page) => {
                state.page = page.page.max(1);
                state.page_size = page.page_size;
                state.total = page.total;
                state.items = page.items;
                Ok(())
            }
            Err(e) => {
                state.error = Some(e.info());
                Err(e)
            }
        }
    }

    /// 加载下一页并追加；没有更多或正在加载时返回 `Ok(false)`
    pub async fn load_more(&self) -> AppResult<bool> {
        let (token, next_page) = {
            let mut state = self.state.write().await;
            if state.loading || state.loading_more || !state.has_more() {
                return Ok(false);
            }
            state.loading_more = true;
            state.error = None;
            (self.guard.current(), state.page + 1)
        };
        let query = self.query().await;

        let result = self.source.fetch_page(&query, next_page).await;

        let mut state = self.state.write().await;
        if !self.guard.is_current(token) {
            log::debug!("dropping page {next_page} loaded for outdated query");
            return Err(AppError::Cancelled);
        }
        state.loading_more = false;
        match result {
            Ok(page) => {
                state.page = page.page.max(next_page);
                state.page_size = page.page_size;
                state.total = page.total;
                state.items.extend(page.items);
                Ok(true)
            }
            Err(e) => {
                state.error = Some(e.info());
                Err(e)
            }
        }
    }
}
