use std::path::Path;
use std::time::Duration;

use thiserror::Error;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::api::{self, ApiClient, ApiError, ClientOptions, ExportKind};
use crate::output::OutputFormat;
use crate::ui::Ui;
use crate::views::{AttendanceView, DashboardView, RegisterView, UsersView, PAGE_SIZE};

#[derive(Clone, Debug)]
pub struct Options {
    pub server: String,
    pub timeout_seconds: u64,
    pub user_agent: Option<String>,
    pub page_size: usize,
    pub toast_ttl_ms: u64,
    pub output_format: OutputFormat,
    pub spinners: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            server: api::DEFAULT_SERVER.to_string(),
            timeout_seconds: api::DEFAULT_TIMEOUT_SECONDS,
            user_agent: None,
            page_size: PAGE_SIZE,
            toast_ttl_ms: 4000,
            output_format: OutputFormat::Text,
            spinners: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid page_size {value}, expected a positive integer")]
    InvalidPageSize { value: usize },

    #[error("invalid timeout {value}, expected a positive number of seconds")]
    InvalidTimeout { value: u64 },

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Everything one dashboard session owns: the client, the UI context and a
/// controller per view.
#[derive(Debug)]
pub struct Session {
    pub client: ApiClient,
    pub ui: Ui,
    pub dashboard: DashboardView,
    pub users: UsersView,
    pub attendance: AttendanceView,
    pub register: RegisterView,
}

impl Session {
    pub fn new(options: Options) -> Result<Self, SessionError> {
        if options.page_size == 0 {
            return Err(SessionError::InvalidPageSize {
                value: options.page_size,
            });
        }
        if options.timeout_seconds == 0 {
            return Err(SessionError::InvalidTimeout {
                value: options.timeout_seconds,
            });
        }
        let mut client_options = ClientOptions {
            base_url: options.server.clone(),
            timeout_seconds: options.timeout_seconds,
            ..ClientOptions::default()
        };
        if let Some(agent) = options.user_agent.as_ref() {
            client_options.user_agent = agent.clone();
        }
        let client = ApiClient::new(&client_options)?;

        let mut ui = Ui::new(
            Duration::from_millis(options.toast_ttl_ms),
            options.output_format,
        );
        if !options.spinners {
            ui = ui.quiet();
        }

        Ok(Self {
            client,
            ui,
            dashboard: DashboardView::new(),
            users: UsersView::new(options.page_size),
            attendance: AttendanceView::new(),
            register: RegisterView::new(),
        })
    }

    /// Downloads a spreadsheet export into `path`, replacing any existing file.
    pub async fn export(&mut self, kind: ExportKind, path: &Path) -> Result<usize, String> {
        let pb = self.ui.spinner("Downloading export...");
        let result = self.client.download(kind).await;
        pb.finish_and_clear();
        let bytes = result.map_err(|e| format!("failed to download {}: {e}", kind.path()))?;

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .await
            .map_err(|e| format!("failed to open output file '{}': {e}", path.display()))?;
        file.write_all(&bytes)
            .await
            .map_err(|e| format!("failed to write output file '{}': {e}", path.display()))?;
        info!(path = %path.display(), bytes = bytes.len(), "export written");
        Ok(bytes.len())
    }
}
