use std::{fmt::Debug, time::Duration};

use anyhow::{Context as _, anyhow};
use chrono::Utc;
use futures::{FutureExt as _, future::BoxFuture};
use reqwest::{
    Method, RequestBuilder, Response, StatusCode,
    header::{self, HeaderMap},
};
use serde::{Deserialize, de::DeserializeOwned};
use tracing::{debug, error, info, warn};

use super::{ActionsApi, ApiError};
use crate::{
    config::Repository,
    env::MAX_RETRIES,
    framework::{StateError, StateResult, retry},
    workflow::{Branch, Workflow, WorkflowRun},
};

const PER_PAGE: u8 = 100;
const USER_AGENT: &str = concat!("workflow-retention/", env!("CARGO_PKG_VERSION"));

/// Represents a page of workflows from GitHub REST API.
#[derive(Debug, Deserialize, Clone)]
pub struct Workflows {
    /// The number of workflows across every page.
    pub total_count: u64,
    /// The workflows on this page.
    pub workflows: Vec<Workflow>,
}

/// Represents a page of workflow runs from GitHub REST API.
#[derive(Debug, Deserialize, Clone)]
pub struct WorkflowRuns {
    /// The number of runs across every page.
    pub total_count: u64,
    /// The runs on this page.
    pub workflow_runs: Vec<WorkflowRun>,
}

/// An [`ActionsApi`] backed by GitHub REST API.
#[derive(Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    repository: Repository,
    max_retries: u8,
}

impl Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("repository", &self.repository)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl GitHubClient {
    /// Creates a client for `repository` at the REST endpoint `base_url`.
    ///
    /// Requests authenticate with `token` if given, and retry up to [`MAX_RETRIES`] times.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(base_url: &str, token: Option<String>, repository: Repository) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            token,
            repository,
            max_retries: *MAX_RETRIES,
        })
    }

    /// Sets how many times a rate-limited or timed out request is retried.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u8) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// The repository this client reads and deletes runs of.
    pub const fn repository(&self) -> &Repository {
        &self.repository
    }

    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}{path}",
            self.base_url, self.repository.owner, self.repository.name
        )
    }

    /// Builds a request for GitHub REST API.
    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let request = self
            .http
            .request(method, url)
            .header(header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");

        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, method: Method, url: &str) -> StateResult<Response> {
        let response = match self.request(method.clone(), url).send().await {
            Ok(response) => response,
            Err(err) => {
                error!("failed to request {method} {url}: {err}");
                let retryable = err.is_connect() || err.is_timeout();
                let err = anyhow!(err).context(format!("failed to request {method} {url}"));
                return Err(if retryable {
                    StateError::Retry(err)
                } else {
                    StateError::Cancelled(err)
                });
            }
        };

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let rate_limit = RateLimit::from_response(status, response.headers());
        let error = ApiError {
            method: method.to_string(),
            url: url.to_owned(),
            status: status.as_u16(),
            message: error_message(response).await,
        };

        Err(match rate_limit.or_else(|| RateLimit::from_message(status, &error.message)) {
            Some(RateLimit::Primary(delay)) => {
                warn!("request quota exhausted for request {method} {url}");
                StateError::RetryAfter(delay, error.into())
            }
            Some(RateLimit::Secondary) => {
                warn!("secondary rate limit detected for request {method} {url}");
                StateError::Cancelled(error.into())
            }
            None => StateError::Cancelled(error.into()),
        })
    }

    async fn fetch_page<P>(&self, url: &str) -> StateResult<(P, Option<String>)>
    where
        P: DeserializeOwned,
    {
        debug!("fetching {url}…");
        let response = self.send(Method::GET, url).await?;
        let next = next_page_url(response.headers());

        match response.json::<P>().await {
            Ok(page) => Ok((page, next)),
            Err(err) => {
                error!("failed to parse data from {url}: {err}");
                Err(StateError::Cancelled(
                    anyhow!(err).context(format!("failed to parse data from {url}")),
                ))
            }
        }
    }

    /// Fetches every page starting from `path`, following the `Link` header.
    async fn paginate<P, T, F>(&self, path: &str, items_of: F) -> anyhow::Result<Vec<T>>
    where
        P: DeserializeOwned,
        F: Fn(P) -> Vec<T>,
    {
        let mut url = format!("{}?per_page={PER_PAGE}", self.repo_url(path));
        let mut items = Vec::new();

        loop {
            let page_url = url.as_str();
            let (page, next) = retry(&format!("GET {page_url}"), self.max_retries, move || {
                self.fetch_page::<P>(page_url)
            })
            .await?;
            items.extend(items_of(page));

            match next {
                Some(next) => url = next,
                None => break,
            }
        }

        debug!("fetched {} item(s) from {path}", items.len());
        Ok(items)
    }

    /// Lists every workflow defined in the repository.
    ///
    /// # Errors
    ///
    /// Returns an error if any page cannot be fetched.
    pub async fn workflows(&self) -> anyhow::Result<Vec<Workflow>> {
        self.paginate("/actions/workflows", |page: Workflows| page.workflows)
            .await
    }

    /// Lists every run in the repository.
    ///
    /// # Errors
    ///
    /// Returns an error if any page cannot be fetched.
    pub async fn runs(&self) -> anyhow::Result<Vec<WorkflowRun>> {
        self.paginate("/actions/runs", |page: WorkflowRuns| page.workflow_runs)
            .await
    }

    /// Lists every run of one workflow.
    ///
    /// # Errors
    ///
    /// Returns an error if any page cannot be fetched.
    pub async fn workflow_runs(&self, workflow_id: u64) -> anyhow::Result<Vec<WorkflowRun>> {
        self.paginate(
            &format!("/actions/workflows/{workflow_id}/runs"),
            |page: WorkflowRuns| page.workflow_runs,
        )
        .await
    }

    /// Lists every branch of the repository.
    ///
    /// # Errors
    ///
    /// Returns an error if any page cannot be fetched.
    pub async fn branches(&self) -> anyhow::Result<Vec<Branch>> {
        self.paginate("/branches", |page: Vec<Branch>| page).await
    }

    /// Deletes one run.
    ///
    /// # Errors
    ///
    /// Returns an error if the run cannot be deleted.
    pub async fn delete(&self, run_id: u64) -> anyhow::Result<()> {
        let url = self.repo_url(&format!("/actions/runs/{run_id}"));
        let url = url.as_str();

        retry(&format!("DELETE {url}"), self.max_retries, move || async move {
            self.send(Method::DELETE, url).await.map(drop)
        })
        .await?;

        info!("deleted run {run_id} of {}", self.repository);
        Ok(())
    }
}

impl ActionsApi for GitHubClient {
    fn list_workflows(&self) -> BoxFuture<'_, anyhow::Result<Vec<Workflow>>> {
        self.workflows().boxed()
    }

    fn list_runs(&self) -> BoxFuture<'_, anyhow::Result<Vec<WorkflowRun>>> {
        self.runs().boxed()
    }

    fn list_workflow_runs(
        &self,
        workflow_id: u64,
    ) -> BoxFuture<'_, anyhow::Result<Vec<WorkflowRun>>> {
        self.workflow_runs(workflow_id).boxed()
    }

    fn list_branch_names(&self) -> BoxFuture<'_, anyhow::Result<Vec<String>>> {
        async move {
            let branches = self.branches().await?;
            Ok(branches.into_iter().map(|branch| branch.name).collect())
        }
        .boxed()
    }

    fn delete_run(&self, run_id: u64) -> BoxFuture<'_, anyhow::Result<()>> {
        self.delete(run_id).boxed()
    }
}

/// How a request was rate limited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RateLimit {
    /// The request quota is exhausted until the given delay has passed.
    Primary(Duration),
    /// Too many requests were made too quickly.
    Secondary,
}

impl RateLimit {
    fn from_response(status: StatusCode, headers: &HeaderMap) -> Option<Self> {
        if !matches!(status, StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS) {
            return None;
        }

        let retry_after = header_value::<u64>(headers, header::RETRY_AFTER.as_str());
        if header_value::<u64>(headers, "x-ratelimit-remaining") == Some(0) {
            let delay = retry_after.map(Duration::from_secs).unwrap_or_else(|| {
                header_value::<i64>(headers, "x-ratelimit-reset")
                    .and_then(|reset| u64::try_from(reset - Utc::now().timestamp()).ok())
                    .map_or(Duration::ZERO, Duration::from_secs)
            });
            Some(Self::Primary(delay))
        } else if retry_after.is_some() || status == StatusCode::TOO_MANY_REQUESTS {
            Some(Self::Secondary)
        } else {
            None
        }
    }

    fn from_message(status: StatusCode, message: &str) -> Option<Self> {
        (status == StatusCode::FORBIDDEN
            && message.to_lowercase().contains("secondary rate limit"))
        .then_some(Self::Secondary)
    }
}

fn header_value<T>(headers: &HeaderMap, name: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

/// Finds the URL of the next page in a `Link` header.
fn next_page_url(headers: &HeaderMap) -> Option<String> {
    let link = headers.get(header::LINK)?.to_str().ok()?;

    link.split(',').find_map(|part| {
        let (target, params) = part.split_once(';')?;
        params
            .split(';')
            .any(|param| param.trim() == r#"rel="next""#)
            .then(|| {
                target
                    .trim()
                    .trim_start_matches('<')
                    .trim_end_matches('>')
                    .to_owned()
            })
    })
}

async fn error_message(response: Response) -> String {
    #[derive(Deserialize)]
    struct Body {
        message: String,
    }

    let reason = response
        .status()
        .canonical_reason()
        .unwrap_or("unknown error")
        .to_owned();

    match response.json::<Body>().await {
        Ok(body) => body.message,
        Err(_) => reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use reqwest::header::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        pairs
            .iter()
            .map(|(name, value)| {
                (
                    header::HeaderName::from_static(name),
                    HeaderValue::from_static(value),
                )
            })
            .collect()
    }

    #[test]
    fn finds_next_page() {
        let headers = headers(&[(
            "link",
            r#"<https://api.github.com/repositories/1/actions/runs?page=2>; rel="next", <https://api.github.com/repositories/1/actions/runs?page=5>; rel="last""#,
        )]);
        assert_eq!(
            next_page_url(&headers).as_deref(),
            Some("https://api.github.com/repositories/1/actions/runs?page=2")
        );
    }

    #[test]
    fn last_page_has_no_next() {
        let headers = headers(&[(
            "link",
            r#"<https://api.github.com/x?page=1>; rel="prev", <https://api.github.com/x?page=1>; rel="first""#,
        )]);
        assert_eq!(next_page_url(&headers), None);
        assert_eq!(next_page_url(&HeaderMap::new()), None);
    }

    #[test]
    fn detects_primary_rate_limit() {
        let limited = headers(&[("x-ratelimit-remaining", "0"), ("retry-after", "7")]);
        assert_eq!(
            RateLimit::from_response(StatusCode::FORBIDDEN, &limited),
            Some(RateLimit::Primary(Duration::from_secs(7)))
        );

        let reset_passed = headers(&[("x-ratelimit-remaining", "0"), ("x-ratelimit-reset", "1")]);
        assert_eq!(
            RateLimit::from_response(StatusCode::TOO_MANY_REQUESTS, &reset_passed),
            Some(RateLimit::Primary(Duration::ZERO))
        );
    }

    #[test]
    fn detects_secondary_rate_limit() {
        let limited = headers(&[("x-ratelimit-remaining", "4000"), ("retry-after", "60")]);
        assert_eq!(
            RateLimit::from_response(StatusCode::FORBIDDEN, &limited),
            Some(RateLimit::Secondary)
        );
        assert_eq!(
            RateLimit::from_response(StatusCode::TOO_MANY_REQUESTS, &HeaderMap::new()),
            Some(RateLimit::Secondary)
        );
        assert_eq!(
            RateLimit::from_message(
                StatusCode::FORBIDDEN,
                "You have exceeded a secondary rate limit. Please wait a few minutes before you try again."
            ),
            Some(RateLimit::Secondary)
        );
    }

    #[test]
    fn other_errors_are_not_rate_limits() {
        assert_eq!(
            RateLimit::from_response(StatusCode::FORBIDDEN, &HeaderMap::new()),
            None
        );
        let limited = headers(&[("x-ratelimit-remaining", "0")]);
        assert_eq!(RateLimit::from_response(StatusCode::NOT_FOUND, &limited), None);
        assert_eq!(
            RateLimit::from_message(StatusCode::FORBIDDEN, "Resource not accessible by integration"),
            None
        );
    }
}
