//! The slice of the remote platform the reconciler talks to.

use async_trait::async_trait;

use redeliver_common::error::AppResult;
use redeliver_common::types::{DeliveryAttempt, Page, Webhook};
use redeliver_github::GitHubClient;

/// Webhook endpoints, their delivery history and the redelivery call.
#[async_trait]
pub trait HookApi: Send + Sync {
    async fn list_webhooks(&self) -> AppResult<Vec<Webhook>>;

    async fn get_webhook(&self, hook_id: u64) -> AppResult<Webhook>;

    /// One page of deliveries, newest first. `cursor` comes from the previous
    /// page's `next`.
    async fn deliveries_page(
        &self,
        hook_id: u64,
        cursor: Option<&str>,
    ) -> AppResult<Page<DeliveryAttempt>>;

    async fn redeliver(&self, hook_id: u64, delivery_id: u64) -> AppResult<()>;
}

#[async_trait]
impl HookApi for GitHubClient {
    async fn list_webhooks(&self) -> AppResult<Vec<Webhook>> {
        GitHubClient::list_webhooks(self).await
    }

    async fn get_webhook(&self, hook_id: u64) -> AppResult<Webhook> {
        GitHubClient::get_webhook(self, hook_id).await
    }

    async fn deliveries_page(
        &self,
        hook_id: u64,
        cursor: Option<&str>,
    ) -> AppResult<Page<DeliveryAttempt>> {
        GitHubClient::deliveries_page(self, hook_id, cursor).await
    }

    async fn redeliver(&self, hook_id: u64, delivery_id: u64) -> AppResult<()> {
        GitHubClient::redeliver(self, hook_id, delivery_id).await
    }
}
