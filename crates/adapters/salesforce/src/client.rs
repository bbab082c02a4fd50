//! Salesforce REST client

use std::collections::HashMap;

use reqwest::{Client, Method};
use santoku_credentials::FromSecret;
use santoku_errors::{AppError, AppResult};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::config::SalesforceCredentials;
use crate::error::map_salesforce_error;
use crate::path::object_name_from_path;

#[derive(Deserialize)]
struct TokenResponse {
    access_token: SecretString,
    instance_url: String,
}

struct Session {
    instance_url: String,
    access_token: SecretString,
}

#[derive(Deserialize)]
struct QueryPage {
    #[serde(default)]
    records: Vec<Value>,
    #[serde(rename = "nextRecordsUrl")]
    next_records_url: Option<String>,
}

#[derive(Deserialize)]
struct NamedItem {
    name: String,
}

#[derive(Deserialize)]
struct SObjectList {
    sobjects: Vec<NamedItem>,
}

#[derive(Deserialize)]
struct SObjectDescribe {
    fields: Vec<NamedItem>,
}

/// Salesforce handler
///
/// Authentication happens on the first request. Object names and per-object field lists are
/// fetched once and cached for the lifetime of the handler.
pub struct SalesforceHandler {
    http: Client,
    credentials: SalesforceCredentials,
    session: Option<Session>,
    object_names: Option<Vec<String>>,
    object_fields: HashMap<String, Vec<String>>,
}

impl std::fmt::Debug for SalesforceHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SalesforceHandler")
            .field("auth_url", &self.credentials.auth_url)
            .field("api_version", &self.credentials.api_version)
            .field("authenticated", &self.session.is_some())
            .finish_non_exhaustive()
    }
}

impl SalesforceHandler {
    pub fn new(credentials: SalesforceCredentials) -> Self {
        Self {
            http: Client::new(),
            credentials,
            session: None,
            object_names: None,
            object_fields: HashMap::new(),
        }
    }

    pub fn with_auth_url(mut self, auth_url: impl Into<String>) -> Self {
        self.credentials.auth_url = auth_url.into();
        self
    }

    pub fn with_api_version(mut self, api_version: f64) -> Self {
        self.credentials.api_version = api_version;
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn auth_url(&self) -> &str {
        &self.credentials.auth_url
    }

    pub fn api_version(&self) -> f64 {
        self.credentials.api_version
    }

    async fn authenticate(&mut self) -> AppResult<()> {
        info!("Authenticating with Salesforce at {}", self.credentials.auth_url);

        let form = [
            ("grant_type", self.credentials.grant_type.as_str()),
            ("username", self.credentials.username.as_str()),
            ("password", self.credentials.password.expose_secret().as_str()),
            ("client_id", self.credentials.client_id.as_str()),
            (
                "client_secret",
                self.credentials.client_secret.expose_secret().as_str(),
            ),
        ];

        let token: TokenResponse = self
            .http
            .post(&self.credentials.auth_url)
            .header("Accept", "application/json")
            .form(&form)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(map_salesforce_error)?
            .json()
            .await
            .map_err(map_salesforce_error)?;

        info!("Successfully authenticated, instance: {}", token.instance_url);
        self.session = Some(Session {
            instance_url: token.instance_url.trim_end_matches('/').to_string(),
            access_token: token.access_token,
        });
        Ok(())
    }

    async fn session(&mut self) -> AppResult<&Session> {
        if self.session.is_none() {
            self.authenticate().await?;
        }
        self.session
            .as_ref()
            .ok_or_else(|| AppError::internal("Salesforce session missing after authentication"))
    }

    /// Send a request to an absolute URL, without any object validation.
    async fn send_url(
        &mut self,
        method: Method,
        url: String,
        payload: Option<&Map<String, Value>>,
    ) -> AppResult<String> {
        let token = self.session().await?.access_token.expose_secret().clone();

        debug!("{} {}", method, url);
        let mut request = self
            .http
            .request(method, &url)
            .header("Authorization", format!("OAuth {}", token))
            .header("Content-Type", "application/json");
        if let Some(payload) = payload {
            request = request.json(payload);
        }

        request
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(map_salesforce_error)?
            .text()
            .await
            .map_err(map_salesforce_error)
    }

    async fn send(
        &mut self,
        method: Method,
        path: &str,
        payload: Option<&Map<String, Value>>,
    ) -> AppResult<String> {
        let instance_url = self.session().await?.instance_url.clone();
        let url = format!(
            "{}/services/data/v{:.1}/{}",
            instance_url, self.credentials.api_version, path
        );
        self.send_url(method, url, payload).await
    }

    /// Names of all objects in the org, fetched once.
    pub async fn object_names(&mut self) -> AppResult<&[String]> {
        if self.object_names.is_none() {
            let body = self.send(Method::GET, "sobjects", None).await?;
            let list: SObjectList = parse_body(&body)?;
            self.object_names = Some(list.sobjects.into_iter().map(|o| o.name).collect());
        }
        Ok(self.object_names.as_deref().unwrap_or_default())
    }

    /// Field names of an object, fetched once per object.
    pub async fn object_fields(&mut self, object_name: &str) -> AppResult<&[String]> {
        if !self.object_fields.contains_key(object_name) {
            let path = format!("sobjects/{}/describe", object_name);
            let body = self.send(Method::GET, &path, None).await?;
            let describe: SObjectDescribe = parse_body(&body)?;
            self.object_fields.insert(
                object_name.to_string(),
                describe.fields.into_iter().map(|f| f.name).collect(),
            );
        }
        Ok(self
            .object_fields
            .get(object_name)
            .map(Vec::as_slice)
            .unwrap_or_default())
    }

    /// Canonical spelling of an object name, or a validation error if the org has no such object.
    async fn validate_object(&mut self, object_name: &str) -> AppResult<String> {
        let found = self
            .object_names()
            .await?
            .iter()
            .find(|name| name.eq_ignore_ascii_case(object_name))
            .cloned();

        found.ok_or_else(|| {
            warn!("Rejected request for unknown object: {}", object_name);
            AppError::validation(format!("{} isn't a valid object", object_name))
        })
    }

    /// Send a request to a path relative to `/services/data/v{version}/`.
    ///
    /// The object referenced by `path` must exist in the org. `POST` and `PATCH` require a
    /// payload whose keys are all fields of that object. Returns the response body.
    pub async fn do_request(
        &mut self,
        method: Method,
        path: &str,
        payload: Option<&Map<String, Value>>,
    ) -> AppResult<String> {
        if ![Method::GET, Method::POST, Method::PATCH, Method::DELETE].contains(&method) {
            return Err(AppError::validation("Method isn't supported."));
        }

        let object_name = match object_name_from_path(path) {
            Some(name) => Some(self.validate_object(&name).await?),
            None => None,
        };

        let payload = if method == Method::POST || method == Method::PATCH {
            let Some(payload) = payload.filter(|p| !p.is_empty()) else {
                return Err(AppError::validation(
                    "Payload must be defined for a POST, PATCH request.",
                ));
            };
            if let Some(object_name) = &object_name {
                let fields = self.object_fields(object_name).await?;
                if let Some(field) = payload.keys().find(|key| !fields.contains(key)) {
                    return Err(AppError::validation(format!("{} isn't a valid field", field)));
                }
            }
            Some(payload)
        } else {
            None
        };

        self.send(method, path, payload).await
    }

    /// Run a SOQL query and collect the records of every result page.
    pub async fn do_query_with_soql(&mut self, query: &str) -> AppResult<Vec<Value>> {
        let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
        let path = format!("query?q={}", encoded);
        let body = self.do_request(Method::GET, &path, None).await?;
        let mut page: QueryPage = parse_body(&body)?;

        let mut records = std::mem::take(&mut page.records);
        while let Some(next) = page.next_records_url.take() {
            let instance_url = self.session().await?.instance_url.clone();
            let body = self
                .send_url(Method::GET, format!("{}{}", instance_url, next), None)
                .await?;
            page = parse_body(&body)?;
            records.append(&mut page.records);
        }

        debug!(count = records.len(), "SOQL query completed");
        Ok(records)
    }

    /// Create a record and return its id.
    pub async fn insert_object(
        &mut self,
        object_name: &str,
        fields: &Map<String, Value>,
    ) -> AppResult<String> {
        let path = format!("sobjects/{}", object_name);
        let body = self.do_request(Method::POST, &path, Some(fields)).await?;
        let created: Value = parse_body(&body)?;

        let id = created
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| AppError::malformed("Salesforce did not return the new record id."))?;
        info!(object = object_name, id = %id, "Salesforce record created");
        Ok(id)
    }

    pub async fn modify_object(
        &mut self,
        object_name: &str,
        record_id: &str,
        fields: &Map<String, Value>,
    ) -> AppResult<()> {
        let path = format!("sobjects/{}/{}", object_name, record_id);
        self.do_request(Method::PATCH, &path, Some(fields)).await?;
        info!(object = object_name, id = record_id, "Salesforce record updated");
        Ok(())
    }

    pub async fn delete_object(&mut self, object_name: &str, record_id: &str) -> AppResult<()> {
        let path = format!("sobjects/{}/{}", object_name, record_id);
        self.do_request(Method::DELETE, &path, None).await?;
        info!(object = object_name, id = record_id, "Salesforce record deleted");
        Ok(())
    }

    /// Remaining daily API requests of the org, from the `limits` resource.
    pub async fn get_remaining_daily_api_requests(&mut self) -> AppResult<u64> {
        let body = self.do_request(Method::GET, "limits", None).await?;
        let limits: Value = parse_body(&body)?;

        limits
            .pointer("/DailyApiRequests/Remaining")
            .and_then(Value::as_u64)
            .ok_or_else(|| AppError::malformed("The limits response has no DailyApiRequests."))
    }
}

impl FromSecret for SalesforceHandler {
    type Credentials = SalesforceCredentials;

    fn from_credentials(credentials: Self::Credentials) -> AppResult<Self> {
        Ok(Self::new(credentials))
    }
}

fn parse_body<T: serde::de::DeserializeOwned>(body: &str) -> AppResult<T> {
    serde_json::from_str(body)
        .map_err(|e| AppError::malformed(format!("Unexpected Salesforce response: {}", e)))
}
