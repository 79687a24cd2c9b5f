//! HTTP access to the attendance server.
//!
//! [`ApiClient::get`] and [`ApiClient::post`] are the two low-level wrappers every
//! view goes through. They negotiate JSON vs text from the response content type and
//! turn non-success statuses into [`ApiError::Status`]. The typed helpers below them
//! cover the endpoints the dashboard uses.

pub mod types;

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::Form;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

pub use types::{AttendanceRecord, HealthStatus, MarkEntry, MarkResponse, RegisterResponse, User};

pub const DEFAULT_SERVER: &str = "http://127.0.0.1:5000";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid server URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("cannot build form field '{field}': {source}")]
    Multipart {
        field: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ApiError {
    /// True when the request never produced an HTTP response.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message suitable for a toast: the server's own text for status errors.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// A decoded response body.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
}

impl Payload {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Payload::Json(v) => Some(v),
            Payload::Text(_) => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        self.as_json().and_then(Value::as_array)
    }

    pub fn to_pretty(&self) -> String {
        match self {
            Payload::Json(v) => serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string()),
            Payload::Text(t) => t.clone(),
        }
    }
}

pub enum PostBody {
    Empty,
    Json(Value),
    Multipart(Form),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportKind {
    Employees,
    Attendance,
}

impl ExportKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "employees" | "users" => Some(Self::Employees),
            "attendance" => Some(Self::Attendance),
            _ => None,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            ExportKind::Employees => "/download_employees",
            ExportKind::Attendance => "/download_attendance",
        }
    }

    pub fn default_file_name(&self) -> &'static str {
        match self {
            ExportKind::Employees => "employees.xlsx",
            ExportKind::Attendance => "attendance.xlsx",
        }
    }
}

#[derive(Clone, Debug)]
pub struct ClientOptions {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SERVER.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            user_agent: format!("attendance-dash/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

pub fn normalize_base_url(url: &str) -> Result<String, ApiError> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ApiError::InvalidUrl {
            url: url.to_string(),
            message: "URL cannot be empty".to_string(),
        });
    }
    if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
        return Err(ApiError::InvalidUrl {
            url: url.to_string(),
            message: "URL must start with http:// or https://".to_string(),
        });
    }
    reqwest::Url::parse(trimmed).map_err(|e| ApiError::InvalidUrl {
        url: url.to_string(),
        message: e.to_string(),
    })?;
    Ok(trimmed.to_string())
}

fn status_text(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}

impl ApiClient {
    pub fn new(options: &ClientOptions) -> Result<Self, ApiError> {
        let base_url = normalize_base_url(&options.base_url)?;
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(options.user_agent.clone())
            .timeout(Duration::from_secs(options.timeout_seconds.max(1)))
            .build()
            .map_err(|source| ApiError::ClientBuild { source })?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    pub async fn get(&self, path: &str) -> Result<Payload, ApiError> {
        self.get_with_query(path, &[]).await
    }

    pub async fn get_with_query(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Payload, ApiError> {
        let url = self.url(path);
        debug!(%url, ?query, "GET");
        let mut request = self.http.get(&url);
        if !query.is_empty() {
            request = request.query(query);
        }
        let response = request.send().await.map_err(|source| ApiError::Transport {
            url: url.clone(),
            source,
        })?;
        let status = response.status();
        if !status.is_success() {
            debug!(%url, status = status.as_u16(), "GET failed");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: status_text(status),
            });
        }
        decode(&url, response).await
    }

    pub async fn post(&self, path: &str, body: PostBody) -> Result<Payload, ApiError> {
        let url = self.url(path);
        debug!(%url, "POST");
        let request = self.http.request(Method::POST, &url);
        let request = match body {
            PostBody::Empty => request,
            PostBody::Json(value) => request.json(&value),
            PostBody::Multipart(form) => request.multipart(form),
        };
        let response = request.send().await.map_err(|source| ApiError::Transport {
            url: url.clone(),
            source,
        })?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(%url, status = status.as_u16(), "POST failed");
            let message = if body.trim().is_empty() {
                status_text(status)
            } else {
                body
            };
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }
        decode(&url, response).await
    }

    pub async fn get_bytes(&self, path: &str) -> Result<Vec<u8>, ApiError> {
        let url = self.url(path);
        debug!(%url, "GET (bytes)");
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.clone(),
                source,
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: status_text(status),
            });
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|source| ApiError::Transport { url, source })?;
        Ok(bytes.to_vec())
    }

    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        let url = self.url("/health");
        match self.get("/health").await? {
            Payload::Json(value) => {
                serde_json::from_value(value).map_err(|e| ApiError::Decode {
                    url,
                    message: e.to_string(),
                })
            }
            Payload::Text(_) => Err(ApiError::Decode {
                url,
                message: "expected a JSON body".to_string(),
            }),
        }
    }

    /// Raw attendance payload; the attendance view decides what an unexpected shape means.
    pub async fn attendance(&self, query: &[(&str, String)]) -> Result<Payload, ApiError> {
        self.get_with_query("/api/attendance", query).await
    }

    /// All users. Entries that do not look like users are skipped and a
    /// non-array body is an empty list.
    pub async fn users(&self) -> Result<Vec<User>, ApiError> {
        let payload = self.get("/api/users").await?;
        Ok(users_from_payload(&payload))
    }

    pub async fn register(&self, form: Form) -> Result<Payload, ApiError> {
        self.post("/register", PostBody::Multipart(form)).await
    }

    pub async fn download(&self, kind: ExportKind) -> Result<Vec<u8>, ApiError> {
        self.get_bytes(kind.path()).await
    }
}

async fn decode(url: &str, response: reqwest::Response) -> Result<Payload, ApiError> {
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase().contains("json"))
        .unwrap_or(false);
    let body = response
        .text()
        .await
        .map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;
    if is_json {
        serde_json::from_str(&body)
            .map(Payload::Json)
            .map_err(|e| ApiError::Decode {
                url: url.to_string(),
                message: e.to_string(),
            })
    } else {
        Ok(Payload::Text(body))
    }
}

pub fn users_from_payload(payload: &Payload) -> Vec<User> {
    payload
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value::<User>(item.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}
