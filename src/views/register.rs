use std::path::{Path, PathBuf};

use reqwest::multipart::{Form, Part};
use thiserror::Error;
use tracing::debug;

use crate::api::{ApiClient, ApiError, Payload, RegisterResponse};
use crate::output;
use crate::toast::Severity;
use crate::ui::Ui;
use crate::utils;

pub const GENERIC_FAILURE: &str = "Registration failed";

#[derive(Debug, Error)]
pub enum FormError {
    #[error("Name is required")]
    MissingName,

    #[error("Upload a face image")]
    MissingImage,

    #[error("cannot use image {path}: {source}")]
    ImageRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// What the form knows about the selected image. It only lives as long as
/// the form keeps it selected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImagePreview {
    pub path: PathBuf,
    pub file_name: String,
    pub size: u64,
    pub mime: &'static str,
}

impl ImagePreview {
    pub fn load(path: &Path) -> Result<Self, FormError> {
        let meta = std::fs::metadata(path).map_err(|source| FormError::ImageRead {
            path: path.display().to_string(),
            source,
        })?;
        if !meta.is_file() {
            return Err(FormError::ImageRead {
                path: path.display().to_string(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a file"),
            });
        }
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();
        Ok(Self {
            path: path.to_path_buf(),
            file_name,
            size: meta.len(),
            mime: utils::mime_for_path(path),
        })
    }

    pub fn describe(&self) -> String {
        format!(
            "{} ({}, {})",
            self.file_name,
            self.mime,
            utils::human_bytes(self.size)
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub proxy: String,
    pub salary: String,
    image: Option<ImagePreview>,
}

impl RegisterForm {
    pub fn select_image(&mut self, path: &Path) -> Result<&ImagePreview, FormError> {
        let preview = ImagePreview::load(path)?;
        Ok(&*self.image.insert(preview))
    }

    pub fn clear_image(&mut self) {
        self.image = None;
    }

    pub fn image(&self) -> Option<&ImagePreview> {
        self.image.as_ref()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn render(&self) -> String {
        let field = |label: &str, value: &str| {
            let value = if value.trim().is_empty() { "-" } else { value.trim() };
            output::format_kv_line(label, value)
        };
        let image = self
            .image
            .as_ref()
            .map(ImagePreview::describe)
            .unwrap_or_else(|| "no image selected".to_string());
        [
            field("Name", &self.name),
            field("Email", &self.email),
            field("Proxy", &self.proxy),
            field("Salary", &self.salary),
            field("Image", &image),
        ]
        .join("\n")
    }

    pub fn validate(&self) -> Result<Registration, FormError> {
        let name = utils::optional_trimmed(&self.name).ok_or(FormError::MissingName)?;
        let image = self.image.clone().ok_or(FormError::MissingImage)?;
        Ok(Registration {
            name,
            email: utils::optional_trimmed(&self.email),
            proxy: utils::optional_trimmed(&self.proxy),
            salary: utils::optional_trimmed(&self.salary),
            image,
        })
    }
}

/// A validated form, ready to be sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub email: Option<String>,
    pub proxy: Option<String>,
    pub salary: Option<String>,
    pub image: ImagePreview,
}

impl Registration {
    pub async fn into_form(self) -> Result<Form, ApiError> {
        let bytes = tokio::fs::read(&self.image.path)
            .await
            .map_err(|source| ApiError::Io {
                path: self.image.path.display().to_string(),
                source,
            })?;
        let image = Part::bytes(bytes)
            .file_name(self.image.file_name.clone())
            .mime_str(self.image.mime)
            .map_err(|source| ApiError::Multipart {
                field: "image".to_string(),
                source,
            })?;
        let mut form = Form::new().text("name", self.name);
        for (field, value) in [
            ("email", self.email),
            ("proxy", self.proxy),
            ("salary", self.salary),
        ] {
            if let Some(value) = value {
                form = form.text(field, value);
            }
        }
        Ok(form.part("image", image))
    }
}

#[derive(Debug)]
pub enum RegisterOutcome {
    Invalid(FormError),
    Registered { user_id: Option<String> },
    Rejected(String),
}

#[derive(Clone, Debug, Default)]
pub struct RegisterView {
    pub form: RegisterForm,
}

impl RegisterView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and sends the form. Invalid forms never reach the network.
    pub async fn submit(&mut self, client: &ApiClient, ui: &mut Ui) -> RegisterOutcome {
        let registration = match self.form.validate() {
            Ok(r) => r,
            Err(e) => {
                ui.toast(e.to_string(), Severity::Warning);
                return RegisterOutcome::Invalid(e);
            }
        };
        debug!(name = %registration.name, image = %registration.image.file_name, "registering user");

        let pb = ui.spinner("Registering...");
        let result = match registration.into_form().await {
            Ok(form) => client.register(form).await,
            Err(e) => Err(e),
        };
        pb.finish_and_clear();

        let outcome = match result {
            Ok(Payload::Json(value)) => {
                let response: RegisterResponse =
                    serde_json::from_value(value).unwrap_or_default();
                if response.is_success() {
                    RegisterOutcome::Registered {
                        user_id: response.user_id,
                    }
                } else {
                    RegisterOutcome::Rejected(
                        response
                            .message
                            .unwrap_or_else(|| GENERIC_FAILURE.to_string()),
                    )
                }
            }
            Ok(Payload::Text(_)) => RegisterOutcome::Rejected(GENERIC_FAILURE.to_string()),
            Err(ApiError::Status { message, .. }) => RegisterOutcome::Rejected(
                server_message(&message).unwrap_or_else(|| GENERIC_FAILURE.to_string()),
            ),
            Err(e) => RegisterOutcome::Rejected(format!("{GENERIC_FAILURE}: {e}")),
        };

        match &outcome {
            RegisterOutcome::Registered { user_id } => {
                let msg = match user_id {
                    Some(id) => format!("Registered {} (id {id})", self.form.name.trim()),
                    None => format!("Registered {}", self.form.name.trim()),
                };
                ui.toast(msg, Severity::Success);
                self.form.reset();
            }
            RegisterOutcome::Rejected(message) => {
                ui.toast(message.clone(), Severity::Error);
            }
            RegisterOutcome::Invalid(_) => {}
        }
        outcome
    }
}

/// The `message` of a JSON error body, or the body itself when it is plain text.
fn server_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    match serde_json::from_str::<RegisterResponse>(body) {
        Ok(resp) => resp.message,
        Err(_) => Some(body.to_string()),
    }
}
