//! API client for the Birthday Messenger backend.
//!
//! All endpoints exchange JSON. Everything except `/login` expects the
//! bearer token from a previous login.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, multipart, Client, RequestBuilder, Response, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::{AcademicYear, BirthdayResults, CardRequest, FileListing};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Content type of the student spreadsheets the backend accepts.
const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    user: &'a str,
    password: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChangePasswordRequest<'a> {
    old_password: &'a str,
    new_password: &'a str,
}

/// Convert the date picker's `YYYY-MM-DD` into the backend's `MM-DD`.
/// Anything else is passed through unchanged.
pub fn birthday_query_param(date: &str) -> String {
    let bytes = date.as_bytes();
    if bytes.len() == 10 && bytes[4] == b'-' && bytes[7] == b'-' {
        date[5..].to_string()
    } else {
        date.to_string()
    }
}

/// API client for the Birthday Messenger backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client for the backend at `base_url`
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = self.token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }
        Ok(headers)
    }

    /// Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(response: Response) -> Result<Option<Response>> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    /// Send a request built by `build`, retrying with exponential backoff on 429.
    async fn send_with_retry<F>(&self, what: &str, build: F) -> Result<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = build()
                .headers(self.auth_headers()?)
                .send()
                .await
                .with_context(|| format!("Failed to send {} request", what))?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => return Ok(response),
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited.into());
                    }
                    warn!(request = what, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2;
                }
            }
        }
    }

    async fn parse_json<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse {} response", what))
    }

    /// Parse a JSON body, tolerating an empty or non-JSON one.
    async fn parse_value(response: Response) -> Value {
        let text = response.text().await.unwrap_or_default();
        serde_json::from_str(&text).unwrap_or(Value::Null)
    }

    // ===== Session =====

    /// Log in and return the issued token, if any
    pub async fn login(&self, user: &str, password: &str) -> Result<LoginResponse> {
        let url = self.url("/login");
        let body = LoginRequest { user, password };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("Could not connect to server")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::login_failed(status, &body).into());
        }
        Self::parse_json(response, "login").await
    }

    /// Revoke the current token on the server
    pub async fn logout(&self) -> Result<()> {
        let url = self.url("/logout");
        let response = self
            .client
            .post(&url)
            .headers(self.auth_headers()?)
            .send()
            .await
            .context("Failed to send logout request")?;
        Self::check_response(response).await?;
        Ok(())
    }

    pub async fn change_password(&self, old_password: &str, new_password: &str) -> Result<Value> {
        let url = self.url("/change_password");
        let body = ChangePasswordRequest {
            old_password,
            new_password,
        };
        let response = self
            .send_with_retry("change password", || self.client.post(&url).json(&body))
            .await?;
        Ok(Self::parse_value(response).await)
    }

    // ===== Birthdays =====

    /// Find people whose birthday is on `month_day` (`MM-DD`)
    pub async fn filter_birthdays(&self, month_day: &str) -> Result<BirthdayResults> {
        let url = self.url("/filter");
        debug!(date = month_day, "Fetching birthdays");
        let response = self
            .send_with_retry("birthday filter", || {
                self.client.get(&url).query(&[("date", month_day)])
            })
            .await?;
        Self::parse_json(response, "birthday filter").await
    }

    pub async fn send_card(&self, card: &CardRequest) -> Result<Value> {
        let url = self.url("/send_card");
        let response = self
            .send_with_retry("send card", || self.client.post(&url).json(card))
            .await?;
        Ok(Self::parse_value(response).await)
    }

    // ===== Spreadsheets =====

    /// Upload a student spreadsheet for `year`.
    ///
    /// Multipart bodies cannot be replayed, so this is not retried on 429.
    pub async fn upload_spreadsheet(&self, year: AcademicYear, path: &Path) -> Result<Value> {
        let url = self.url("/upload_excel");
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| anyhow::anyhow!("Not a file: {}", path.display()))?;
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name.clone())
            .mime_str(XLSX_MIME)?;
        let form = multipart::Form::new()
            .part("file", part)
            .text("year", year.as_str());

        debug!(file = %file_name, year = %year, "Uploading spreadsheet");
        let response = self
            .client
            .post(&url)
            .headers(self.auth_headers()?)
            .multipart(form)
            .send()
            .await
            .context("Failed to send upload request")?;

        let response = Self::check_response(response).await?;
        Ok(Self::parse_value(response).await)
    }

    pub async fn list_files(&self) -> Result<FileListing> {
        let url = self.url("/files");
        let response = self
            .send_with_retry("file listing", || self.client.get(&url))
            .await?;
        Self::parse_json(response, "file listing").await
    }

    pub async fn delete_file(&self, name: &str) -> Result<Value> {
        let mut url = Url::parse(&self.url("/files")).context("Invalid API base URL")?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("API base URL cannot have path segments"))?
            .push(name);

        let response = self
            .send_with_retry("delete file", || self.client.delete(url.clone()))
            .await?;
        Ok(Self::parse_value(response).await)
    }

    pub async fn delete_all_files(&self) -> Result<Value> {
        let url = self.url("/files");
        let response = self
            .send_with_retry("delete all files", || self.client.delete(&url))
            .await?;
        Ok(Self::parse_value(response).await)
    }

    /// Consolidate the uploaded spreadsheets into the backend's CSV master list
    pub async fn convert_to_csv(&self) -> Result<Value> {
        let url = self.url("/convert_csv");
        let response = self
            .send_with_retry("CSV conversion", || self.client.post(&url))
            .await?;
        Ok(Self::parse_value(response).await)
    }
}
