use std::future::Future;

use crate::error::AppResult;
use crate::external::CreditApi;
use crate::models::*;
use crate::store::{PageSource, PagedStore, Resource, ResourceState};

pub trait BalanceSource {
    fn balance(&self) -> impl Future<Output = AppResult<Balance>>;
    fn transactions(
        &self,
        query: &TransactionQuery,
        page: u32,
    ) -> impl Future<Output = AppResult<Page<Transaction>>>;
}

impl BalanceSource for CreditApi {
    async fn balance(&self) -> AppResult<Balance> {
        CreditApi::balance(self).await
    }

    async fn transactions(&self, query: &TransactionQuery, page: u32) -> AppResult<Page<Transaction>> {
        CreditApi::transactions(self, query, page).await
    }
}

pub struct BalanceStore<S> {
    source: S,
    balance: Resource<Balance>,
}

impl<S: BalanceSource> BalanceStore<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            balance: Resource::new(),
        }
    }

    pub async fn refetch(&self) -> AppResult<Balance> {
        self.balance.load(self.source.balance()).await
    }

    pub async fn snapshot(&self) -> ResourceState<Balance> {
        self.balance.snapshot().await
    }
}

/// 交易记录分页来源
pub struct TransactionPages<S>(pub S);

impl<S: BalanceSource> PageSource for TransactionPages<S> {
    type Item = Transaction;
    type Query = TransactionQuery;

    async fn fetch_page(&self, query: &TransactionQuery, page: u32) -> AppResult<Page<Transaction>> {
        self.0.transactions(query, page).await
    }
}

pub type TransactionStore<S> = PagedStore<TransactionPages<S>>;

/// 默认查询最近 30 天
pub fn transaction_store<S: BalanceSource>(
    source: S,
    now: chrono::DateTime<chrono::Utc>,
) -> TransactionStore<S> {
    PagedStore::new(TransactionPages(source), TransactionQuery::last_month(now))
}
