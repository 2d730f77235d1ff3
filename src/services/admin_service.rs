use std::future::Future;

use crate::error::AppResult;
use crate::external::CreditApi;
use crate::models::*;
use crate::store::{Resource, ResourceState};

pub trait AdminSource {
    fn list_user_pay_configs(&self) -> impl Future<Output = AppResult<Vec<UserPayConfig>>>;
    fn update_user_pay_config(
        &self,
        id: u64,
        req: &UpdateUserPayConfigRequest,
    ) -> impl Future<Output = AppResult<()>>;
    fn delete_user_pay_config(&self, id: u64) -> impl Future<Output = AppResult<()>>;
    fn list_system_configs(&self) -> impl Future<Output = AppResult<Vec<SystemConfig>>>;
    fn update_system_config(
        &self,
        key: &str,
        req: &UpdateSystemConfigRequest,
    ) -> impl Future<Output = AppResult<()>>;
    fn delete_system_config(&self, key: &str) -> impl Future<Output = AppResult<()>>;
}

impl AdminSource for CreditApi {
    async fn list_user_pay_configs(&self) -> AppResult<Vec<UserPayConfig>> {
        CreditApi::list_user_pay_configs(self).await
    }

    async fn update_user_pay_config(&self, id: u64, req: &UpdateUserPayConfigRequest) -> AppResult<()> {
        CreditApi::update_user_pay_config(self, id, req).await
    }

    async fn delete_user_pay_config(&self, id: u64) -> AppResult<()> {
        CreditApi::delete_user_pay_config(self, id).await
    }

    async fn list_system_configs(&self) -> AppResult<Vec<SystemConfig>> {
        CreditApi::list_system_configs(self).await
    }

    async fn update_system_config(&self, key: &str, req: &UpdateSystemConfigRequest) -> AppResult<()> {
        CreditApi::update_system_config(self, key, req).await
    }

    async fn delete_system_config(&self, key: &str) -> AppResult<()> {
        CreditApi::delete_system_config(self, key).await
    }
}

/// 管理后台配置：修改或删除后重新拉取列表
pub struct AdminStore<S> {
    source: S,
    pay_configs: Resource<Vec<UserPayConfig>>,
    system_configs: Resource<Vec<SystemConfig>>,
}

impl<S: AdminSource> AdminStore<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            pay_configs: Resource::new(),
            system_configs: Resource::new(),
        }
    }

    pub async fn refetch_pay_configs(&self) -> AppResult<Vec<UserPayConfig>> {
        self.pay_configs
            .load(self.source.list_user_pay_configs())
            .await
    }

    pub async fn update_pay_config(
        &self,
        id: u64,
        req: &UpdateUserPayConfigRequest,
    ) -> AppResult<Vec<UserPayConfig>> {
        req.validate()?;
        self.source.update_user_pay_config(id, req).await?;
        log::info!("user pay config {id} updated");
        self.refetch_pay_configs().await
    }

    pub async fn delete_pay_config(&self, id: u64) -> AppResult<Vec<UserPayConfig>> {
        self.source.delete_user_pay_config(id).await?;
        log::info!("user pay config {id} deleted");
        self.refetch_pay_configs().await
    }

    pub async fn refetch_system_configs(&self) -> AppResult<Vec<SystemConfig>> {
        self.system_configs
            .load(self.source.list_system_configs())
            .await
    }

    pub async fn update_system_config(
        &self,
        key: &str,
        req: &UpdateSystemConfigRequest,
    ) -> AppResult<Vec<SystemConfig>> {
        req.validate()?;
        self.source.update_system_config(key, req).await?;
        log::info!("system config {key} updated");
        self.refetch_system_configs().await
    }

    pub async fn delete_system_config(&self, key: &str) -> AppResult<Vec<SystemConfig>> {
        self.source.delete_system_config(key).await?;
        log::info!("system config {key} deleted");
        self.refetch_system_configs().await
    }

    pub async fn pay_configs(&self) -> ResourceState<Vec<UserPayConfig>> {
        self.pay_configs.snapshot().await
    }

    pub async fn system_configs(&self) -> ResourceState<Vec<SystemConfig>> {
        self.system_configs.snapshot().await
    }
}

/// 按积分查找所在的支付等级
pub fn pay_config_for_score(configs: &[UserPayConfig], score: i64) -> Option<&UserPayConfig> {
    configs.iter().find(|c| c.covers(score))
}
