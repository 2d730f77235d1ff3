use std::future::Future;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::{AppError, AppResult, ErrorInfo};
use crate::external::CreditApi;
use crate::models::*;
use crate::store::{RequestGuard, Resource};
use crate::utils::{format_rank, format_score, podium_order, trend};

pub trait LeaderboardSource {
    fn list(&self, query: &LeaderboardQuery) -> impl Future<Output = AppResult<LeaderboardList>>;
    fn my_rank(&self, query: &LeaderboardQuery) -> impl Future<Output = AppResult<UserRank>>;
    fn user_rank(
        &self,
        user_id: u64,
        query: &LeaderboardQuery,
    ) -> impl Future<Output = AppResult<UserRank>>;
    fn metadata(&self) -> impl Future<Output = AppResult<LeaderboardMetadata>>;
}

impl LeaderboardSource for CreditApi {
    async fn list(&self, query: &LeaderboardQuery) -> AppResult<LeaderboardList> {
        self.leaderboard_list(query).await
    }

    async fn my_rank(&self, query: &LeaderboardQuery) -> AppResult<UserRank> {
        CreditApi::my_rank(self, query).await
    }

    async fn user_rank(&self, user_id: u64, query: &LeaderboardQuery) -> AppResult<UserRank> {
        CreditApi::user_rank(self, user_id, query).await
    }

    async fn metadata(&self) -> AppResult<LeaderboardMetadata> {
        self.leaderboard_metadata().await
    }
}

/// 排行榜列表状态；`items` 为已加载的所有页
#[derive(Debug, Clone, Default, Serialize)]
pub struct LeaderboardState {
    pub list: Option<LeaderboardList>,
    pub items: Vec<LeaderboardEntry>,
    pub loading: bool,
    pub loading_more: bool,
    pub error: Option<ErrorInfo>,
}

impl LeaderboardState {
    pub fn has_more(&self) -> bool {
        self.list
            .as_ref()
            .is_some_and(|l| has_more(l.page, l.page_size, l.total))
    }
}

pub struct LeaderboardStore<S> {
    source: S,
    guard: RequestGuard,
    params: RwLock<LeaderboardQuery>,
    state: RwLock<LeaderboardState>,
    my_rank: Resource<UserRank>,
    metadata: Resource<LeaderboardMetadata>,
}

impl<S: LeaderboardSource> LeaderboardStore<S> {
    pub fn new(source: S, params: LeaderboardQuery) -> Self {
        Self {
            source,
            guard: RequestGuard::new(),
            params: RwLock::new(params.merge(LeaderboardQuery::default())),
            state: RwLock::new(LeaderboardState::default()),
            my_rank: Resource::new(),
            metadata: Resource::new(),
        }
    }

    pub async fn params(&self) -> LeaderboardQuery {
        self.params.read().await.clone()
    }

    pub async fn snapshot(&self) -> LeaderboardState {
        self.state.read().await.clone()
    }

    pub async fn my_rank(&self) -> Option<UserRank> {
        self.my_rank.data().await
    }

    /// 合并参数后重新加载列表与个人排名；传入的 page 会被忽略
    pub async fn update_params(&self, patch: LeaderboardQuery) -> AppResult<()> {
        {
            let mut params = self.params.write().await;
            *params = params.merge(patch);
        }
        self.refresh().await
    }

    /// 从第一页重新加载列表，同时刷新个人排名
    pub async fn refresh(&self) -> AppResult<()> {
        let token = self.guard.issue();
        let params = self.params().await;
        {
            let mut state = self.state.write().await;
            state.loading = true;
            state.loading_more = false;
            state.items.clear();
            state.error = None;
        }

        let list_query = LeaderboardQuery {
            page: Some(1),
            ..params.clone()
        };
        let rank_query = params.rank_scope();
        let (list, rank) = tokio::join!(
            self.source.list(&list_query),
            self.my_rank.load(self.source.my_rank(&rank_query))
        );

        match rank {
            Ok(_) | Err(AppError::Cancelled) => {}
            Err(e) => log::warn!("failed to fetch my rank: {e}"),
        }

        let mut state = self.state.write().await;
        if !self.guard.is_current(token) {
            log::debug!("dropping superseded leaderboard response");
            return Err(AppError::Cancelled);
        }
        state.loading = false;
        match list {
            Ok(list) => {
                state.items = list.items.clone();
                state.list = Some(list);
                Ok(())
            }
            Err(e) => {
                state.error = Some(e.info());
                Err(e)
            }
        }
    }

    /// 加载下一页；没有更多或正在加载时返回 `Ok(false)`
    pub async fn load_next_page(&self) -> AppResult<bool> {
        let (token, next_page) = {
            let mut state = self.state.write().await;
            if state.loading || state.loading_more || !state.has_more() {
                return Ok(false);
            }
            let Some(list) = &state.list else {
                return Ok(false);
            };
            let next = list.page + 1;
            state.loading_more = true;
            state.error = None;
            (self.guard.current(), next)
        };
        let query = LeaderboardQuery {
            page: Some(next_page),
            ..self.params().await
        };

        let result = self.source.list(&query).await;

        let mut state = self.state.write().await;
        if !self.guard.is_current(token) {
            log::debug!("dropping leaderboard page {next_page} loaded for outdated params");
            return Err(AppError::Cancelled);
        }
        state.loading_more = false;
        match result {
            Ok(list) => {
                state.items.extend(list.items.iter().cloned());
                state.list = Some(list);
                Ok(true)
            }
            Err(e) => {
                state.error = Some(e.info());
                Err(e)
            }
        }
    }

    /// 元数据只加载一次
    pub async fn metadata(&self) -> AppResult<LeaderboardMetadata> {
        if let Some(metadata) = self.metadata.data().await {
            return Ok(metadata);
        }
        self.metadata.load(self.source.metadata()).await
    }

    /// 查询其他用户在当前周期与指标下的排名
    pub async fn user_rank(&self, user_id: u64) -> AppResult<UserRank> {
        let query = self.params().await.rank_scope();
        self.source.user_rank(user_id, &query).await
    }

    pub async fn view(&self) -> Option<LeaderboardView> {
        let state = self.snapshot().await;
        let my_rank = self.my_rank().await;
        let list = state.list.as_ref()?;
        Some(build_view(list, &state.items, my_rank, state.has_more()))
    }
}

fn entry_view(entry: &LeaderboardEntry) -> RankedEntryView {
    let (direction, delta) = trend(entry.rank, entry.previous_rank);
    RankedEntryView {
        rank: entry.rank,
        rank_label: format_rank(entry.rank as i64),
        user_id: entry.user_id,
        username: entry.username.clone(),
        avatar_url: entry.avatar_url.clone(),
        score: format_score(&entry.score),
        trend: direction,
        trend_delta: delta,
    }
}

/// 前三名进入领奖台，其余进入列表
pub fn build_view(
    list: &LeaderboardList,
    items: &[LeaderboardEntry],
    my_rank: Option<UserRank>,
    has_more: bool,
) -> LeaderboardView {
    LeaderboardView {
        period: list.period.clone(),
        metric: list.metric,
        snapshot_at: list.snapshot_at.clone(),
        podium: podium_order(items).into_iter().map(entry_view).collect(),
        items: items.iter().skip(3).map(entry_view).collect(),
        my_rank,
        page: list.page,
        total: list.total,
        has_more,
    }
}
