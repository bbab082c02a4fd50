//! BigQuery REST client

use std::path::Path;

use chrono::Utc;
use jsonwebtoken::EncodingKey;
use reqwest::Client;
use santoku_credentials::FromSecret;
use santoku_errors::{AppError, AppResult};
use serde_json::json;
use tracing::{debug, info};

use crate::auth::{AccessToken, fetch_access_token, signing_key};
use crate::config::ServiceAccountKey;
use crate::query::{JobReference, QueryResponse, QueryResult};

pub(crate) const SERVICE: &str = "bigquery";

const BIGQUERY_API_BASE: &str = "https://bigquery.googleapis.com/bigquery/v2";

/// BigQuery handler
pub struct BigQueryHandler {
    http: Client,
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    api_base_url: String,
    token: Option<AccessToken>,
}

impl std::fmt::Debug for BigQueryHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BigQueryHandler")
            .field("project_id", &self.key.project_id)
            .field("client_email", &self.key.client_email)
            .field("api_base_url", &self.api_base_url)
            .finish_non_exhaustive()
    }
}

impl BigQueryHandler {
    /// Authenticate as the given service account.
    pub fn from_service_account_key(key: ServiceAccountKey) -> AppResult<Self> {
        if key.key_type != "service_account" {
            return Err(AppError::configuration(format!(
                "Expected a service_account key, got '{}'.",
                key.key_type
            )));
        }
        let encoding_key = signing_key(&key)?;

        info!(
            project = %key.project_id,
            account = %key.client_email,
            "BigQuery handler created"
        );
        Ok(Self {
            http: Client::new(),
            key,
            encoding_key,
            api_base_url: BIGQUERY_API_BASE.to_string(),
            token: None,
        })
    }

    /// Authenticate with a service account key file.
    pub fn from_service_account_file(path: impl AsRef<Path>) -> AppResult<Self> {
        Self::from_service_account_key(ServiceAccountKey::from_file(path)?)
    }

    /// Authenticate with the key file named by `GOOGLE_APPLICATION_CREDENTIALS`.
    pub fn from_default_credentials() -> AppResult<Self> {
        let path = std::env::var("GOOGLE_APPLICATION_CREDENTIALS").map_err(|_| {
            AppError::configuration("GOOGLE_APPLICATION_CREDENTIALS environment variable is not set")
        })?;
        Self::from_service_account_file(path)
    }

    pub fn with_api_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn project_id(&self) -> &str {
        &self.key.project_id
    }

    async fn access_token(&mut self) -> AppResult<String> {
        let now = Utc::now();
        if let Some(token) = self.token.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.secret().to_string());
        }

        let token = fetch_access_token(&self.http, &self.key, &self.encoding_key).await?;
        let secret = token.secret().to_string();
        self.token = Some(token);
        Ok(secret)
    }

    /// Run a standard SQL query in the key's project.
    ///
    /// Waits for the job to finish and reads every result page before returning.
    pub async fn run_query(&mut self, sql: &str) -> AppResult<QueryResult> {
        let token = self.access_token().await?;
        let url = format!("{}/projects/{}/queries", self.api_base_url, self.key.project_id);

        debug!("Running BigQuery query: {}", sql);
        let mut response: QueryResponse = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&json!({ "query": sql, "useLegacySql": false }))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::vendor(SERVICE, e))?
            .json()
            .await
            .map_err(|e| AppError::vendor(SERVICE, e))?;

        let job = response.job_reference.take();
        let mut more = response.has_more();
        let mut page_token = response.page_token.take();
        let mut result = QueryResult::from(response);

        while more {
            let job = job.as_ref().ok_or_else(|| {
                AppError::malformed("BigQuery returned a partial result without a job reference.")
            })?;
            let page = self.query_results(job, page_token.as_deref()).await?;
            more = page.has_more();
            page_token = page.page_token.clone();
            result.extend(QueryResult::from(page));
        }

        debug!(
            rows = result.rows.len(),
            total_rows = result.total_rows,
            "BigQuery query finished"
        );
        Ok(result)
    }

    /// One `jobs.getQueryResults` call. Without a page token it waits for the job to finish.
    async fn query_results(
        &mut self,
        job: &JobReference,
        page_token: Option<&str>,
    ) -> AppResult<QueryResponse> {
        let token = self.access_token().await?;
        let url = format!(
            "{}/projects/{}/queries/{}",
            self.api_base_url, job.project_id, job.job_id
        );

        let mut params: Vec<(&str, &str)> = Vec::new();
        if let Some(page_token) = page_token {
            params.push(("pageToken", page_token));
        }
        if let Some(location) = job.location.as_deref() {
            params.push(("location", location));
        }

        debug!(job_id = %job.job_id, page_token = ?page_token, "Fetching BigQuery results");
        self.http
            .get(&url)
            .bearer_auth(token)
            .query(&params)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::vendor(SERVICE, e))?
            .json()
            .await
            .map_err(|e| AppError::vendor(SERVICE, e))
    }
}

impl FromSecret for BigQueryHandler {
    type Credentials = ServiceAccountKey;

    fn from_credentials(credentials: Self::Credentials) -> AppResult<Self> {
        Self::from_service_account_key(credentials)
    }
}
