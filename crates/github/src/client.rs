//! GitHub REST client for repository webhooks and Actions variables.
//!
//! Covers exactly the calls the reconciler needs: listing hooks, walking a
//! hook's delivery feed page by page, requesting a redelivery and reading or
//! writing one repository variable. No call is retried here.

use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderName, HeaderValue, LINK, USER_AGENT};
use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};

use redeliver_common::error::{AppError, AppResult};
use redeliver_common::types::{DeliveryAttempt, Page, Repository, Webhook};

use crate::link::next_link;

/// Page size used for every paginated listing (GitHub's maximum).
pub const PER_PAGE: u32 = 100;

const API_VERSION: &str = "2022-11-28";

/// A repository Actions variable.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Variable {
    pub name: String,
    pub value: String,
}

#[derive(Serialize)]
struct VariableBody<'a> {
    name: &'a str,
    value: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// GitHub REST API client scoped to one repository.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    base_url: String,
    repository: Repository,
}

impl GitHubClient {
    /// Build a client authenticating every request with `token`.
    pub fn new(
        base_url: &str,
        token: &str,
        repository: Repository,
        timeout: Duration,
    ) -> AppResult<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| AppError::Config("token contains invalid header characters".to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(
            HeaderName::from_static("x-github-api-version"),
            HeaderValue::from_static(API_VERSION),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("webhook-redeliver"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            repository,
        })
    }

    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}{}",
            self.base_url, self.repository.owner, self.repository.name, path
        )
    }

    /// List every webhook of the repository, following pagination.
    pub async fn list_webhooks(&self) -> AppResult<Vec<Webhook>> {
        let mut hooks = Vec::new();
        let mut url = Some(format!("{}?per_page={}", self.repo_url("/hooks"), PER_PAGE));

        while let Some(current) = url.take() {
            let response = check(self.http.get(&current).send().await?).await?;
            url = next_link(response.headers().get(LINK));
            let page: Vec<Webhook> = response.json().await?;
            hooks.extend(page);
        }

        tracing::debug!(repository = %self.repository, count = hooks.len(), "Listed webhooks");
        Ok(hooks)
    }

    pub async fn get_webhook(&self, hook_id: u64) -> AppResult<Webhook> {
        let url = self.repo_url(&format!("/hooks/{}", hook_id));
        let response = check(self.http.get(&url).send().await?).await?;
        Ok(response.json().await?)
    }

    /// Fetch one page of a hook's deliveries, newest first.
    ///
    /// `cursor` is the `next` value of the previous page; `None` requests the
    /// newest page.
    pub async fn deliveries_page(
        &self,
        hook_id: u64,
        cursor: Option<&str>,
    ) -> AppResult<Page<DeliveryAttempt>> {
        let url = match cursor {
            Some(next) => next.to_string(),
            None => format!(
                "{}?per_page={}",
                self.repo_url(&format!("/hooks/{}/deliveries", hook_id)),
                PER_PAGE
            ),
        };

        let response = check(self.http.get(&url).send().await?).await?;
        let next = next_link(response.headers().get(LINK));
        let items: Vec<DeliveryAttempt> = response.json().await?;

        Ok(Page { items, next })
    }

    /// Ask GitHub to redeliver one specific delivery attempt.
    pub async fn redeliver(&self, hook_id: u64, delivery_id: u64) -> AppResult<()> {
        let url = self.repo_url(&format!(
            "/hooks/{}/deliveries/{}/attempts",
            hook_id, delivery_id
        ));
        check(self.http.post(&url).send().await?).await?;
        Ok(())
    }

    /// Read a repository variable; `None` when it does not exist.
    pub async fn get_variable(&self, name: &str) -> AppResult<Option<Variable>> {
        let url = self.repo_url(&format!("/actions/variables/{}", name));
        match check(self.http.get(&url).send().await?).await {
            Ok(response) => Ok(Some(response.json().await?)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Create a repository variable. Fails if it already exists.
    pub async fn create_variable(&self, name: &str, value: &str) -> AppResult<()> {
        let url = self.repo_url("/actions/variables");
        let request = self.http.post(&url).json(&VariableBody { name, value });
        check(request.send().await?).await?;
        Ok(())
    }

    /// Update an existing repository variable. Fails if it does not exist.
    pub async fn update_variable(&self, name: &str, value: &str) -> AppResult<()> {
        let url = self.repo_url(&format!("/actions/variables/{}", name));
        let request = self.http.patch(&url).json(&VariableBody { name, value });
        check(request.send().await?).await?;
        Ok(())
    }
}

/// Map non-success responses to `AppError`, keeping GitHub's message.
async fn check(response: Response) -> AppResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().path().to_string();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|e| e.message)
        .unwrap_or(body);

    tracing::debug!(status = status.as_u16(), path = %url, %message, "GitHub API request failed");

    if status == StatusCode::NOT_FOUND {
        Err(AppError::NotFound(format!("{}: {}", url, message)))
    } else {
        Err(AppError::Api {
            status: status.as_u16(),
            message,
        })
    }
}
