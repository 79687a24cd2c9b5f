use reqwest::Method;
use tracing::{debug, warn};

use crate::api::{ApiClient, ApiError, MarkResponse, Payload, PostBody};
use crate::toast::Severity;
use crate::ui::Ui;

pub const MARK_PATH: &str = "/mark_attendance";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum HealthLine {
    #[default]
    Unknown,
    Ok {
        timestamp: String,
    },
}

impl HealthLine {
    pub fn render(&self) -> String {
        match self {
            HealthLine::Unknown => "Server status: unknown".to_string(),
            HealthLine::Ok { timestamp } if timestamp.is_empty() => "Server OK".to_string(),
            HealthLine::Ok { timestamp } => format!("Server OK · {timestamp}"),
        }
    }
}

/// Result of one mark-attendance action.
#[derive(Clone, Debug, PartialEq)]
pub struct MarkReport {
    /// Method of the request that produced `body`.
    pub method: Method,
    pub http_status: Option<u16>,
    pub ok: bool,
    /// Pretty-printed JSON when the body was JSON, the raw text otherwise.
    pub body: String,
    pub parsed: Option<MarkResponse>,
}

/// Only a request that never got an answer, or a server that does not take
/// POST here, is worth repeating as GET. Any other error status is the
/// server's verdict.
pub fn should_fall_back(err: &ApiError) -> bool {
    err.is_transport() || err.status() == Some(405)
}

fn pretty_text(text: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|_| text.to_string()),
        Err(_) => text.to_string(),
    }
}

fn report_from(method: Method, result: Result<Payload, ApiError>) -> MarkReport {
    match result {
        Ok(payload) => {
            let parsed = payload
                .as_json()
                .and_then(|v| serde_json::from_value::<MarkResponse>(v.clone()).ok());
            MarkReport {
                method,
                http_status: None,
                ok: true,
                body: payload.to_pretty(),
                parsed,
            }
        }
        Err(ApiError::Status { status, message }) => MarkReport {
            method,
            http_status: Some(status),
            ok: false,
            parsed: serde_json::from_str::<MarkResponse>(&message).ok(),
            body: pretty_text(&message),
        },
        Err(e) => MarkReport {
            method,
            http_status: None,
            ok: false,
            body: e.to_string(),
            parsed: None,
        },
    }
}

#[derive(Clone, Debug, Default)]
pub struct DashboardView {
    health: HealthLine,
    last_mark: Option<MarkReport>,
}

impl DashboardView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn health(&self) -> &HealthLine {
        &self.health
    }

    pub fn last_mark(&self) -> Option<&MarkReport> {
        self.last_mark.as_ref()
    }

    /// One best-effort health probe; any failure leaves the line at "unknown".
    pub async fn check_health(&mut self, client: &ApiClient) -> &HealthLine {
        self.health = match client.health().await {
            Ok(status) => HealthLine::Ok {
                timestamp: status.timestamp.unwrap_or_default(),
            },
            Err(e) => {
                debug!(error = %e, "health check failed");
                HealthLine::Unknown
            }
        };
        &self.health
    }

    pub fn status_line(&self) -> String {
        self.health.render()
    }

    pub async fn mark_attendance(&mut self, client: &ApiClient, ui: &mut Ui) -> &MarkReport {
        let pb = ui.spinner("Marking attendance...");
        let first = client.post(MARK_PATH, PostBody::Empty).await;
        let report = match first {
            Err(e) if should_fall_back(&e) => {
                warn!(error = %e, "POST {MARK_PATH} failed, retrying with GET");
                report_from(Method::GET, client.get(MARK_PATH).await)
            }
            other => report_from(Method::POST, other),
        };
        pb.finish_and_clear();

        let summary = match (&report.parsed, report.ok) {
            (Some(resp), true) if resp.is_success() => Some((
                format!(
                    "Attendance marked: {} new, {} already present",
                    resp.count("marked"),
                    resp.count("already")
                ),
                Severity::Success,
            )),
            (Some(resp), _) => Some((
                resp.message
                    .clone()
                    .unwrap_or_else(|| "Attendance not marked".to_string()),
                if report.ok {
                    Severity::Warning
                } else {
                    Severity::Error
                },
            )),
            (None, true) => None,
            (None, false) => Some(("Mark attendance failed".to_string(), Severity::Error)),
        };
        if let Some((message, severity)) = summary {
            ui.toast(message, severity);
        }
        self.last_mark.insert(report)
    }

    pub fn render(&self) -> String {
        let mut out = self.status_line();
        out.push('\n');
        if let Some(report) = self.last_mark.as_ref() {
            out.push('\n');
            let status = match report.http_status {
                Some(code) => format!(" -> HTTP {code}"),
                None => String::new(),
            };
            out.push_str(&format!("{} {MARK_PATH}{status}\n", report.method));
            out.push_str(&report.body);
            out.push('\n');
        }
        out
    }
}
