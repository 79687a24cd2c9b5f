use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Accepts strings, numbers and booleans and keeps them as text. `null` and
/// missing fields become `None`.
fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_text(deserializer)?.unwrap_or_default())
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct User {
    #[serde(default, deserialize_with = "text")]
    pub user_id: String,
    #[serde(default, deserialize_with = "text")]
    pub name: String,
    #[serde(default, deserialize_with = "optional_text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub proxy: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub salary: Option<String>,
    #[serde(
        default,
        deserialize_with = "optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub department: Option<String>,
    #[serde(
        default,
        deserialize_with = "optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<String>,
}

impl User {
    /// Text the users view searches through.
    pub fn search_haystack(&self) -> String {
        format!(
            "{} {} {} {}",
            self.user_id,
            self.name,
            self.email.as_deref().unwrap_or(""),
            self.proxy.as_deref().unwrap_or("")
        )
        .to_lowercase()
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct AttendanceRecord {
    #[serde(default, deserialize_with = "text")]
    pub name: String,
    #[serde(default, deserialize_with = "text")]
    pub timestamp: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct HealthStatus {
    #[serde(default, deserialize_with = "optional_text")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub timestamp: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct RegisterResponse {
    #[serde(default, deserialize_with = "optional_text")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub user_id: Option<String>,
}

impl RegisterResponse {
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some("success")
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct MarkEntry {
    #[serde(default, deserialize_with = "text")]
    pub user_id: String,
    #[serde(default, deserialize_with = "text")]
    pub name: String,
    #[serde(default, deserialize_with = "text")]
    pub result: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct MarkResponse {
    #[serde(default, deserialize_with = "optional_text")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub message: Option<String>,
    #[serde(default)]
    pub results: Vec<MarkEntry>,
    #[serde(default, deserialize_with = "optional_text")]
    pub absentees_csv: Option<String>,
}

impl MarkResponse {
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some("success")
    }

    pub fn count(&self, outcome: &str) -> usize {
        self.results.iter().filter(|r| r.result == outcome).count()
    }
}
