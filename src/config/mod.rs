use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    #[serde(alias = "server_url", alias = "url")]
    pub server: Option<String>,
    pub timeout: Option<u64>,
    pub page_size: Option<usize>,
    #[serde(alias = "toast_ttl")]
    pub toast_ttl_ms: Option<u64>,
    pub no_color: Option<bool>,
    pub output_format: Option<String>,
    pub user_agent: Option<String>,
}

/// `HOME`, then the Windows profile variables.
fn home_from(var: impl Fn(&str) -> Option<OsString>) -> Option<PathBuf> {
    if let Some(home) = var("HOME").or_else(|| var("USERPROFILE")) {
        return Some(PathBuf::from(home));
    }
    Some(PathBuf::from(var("HOMEDRIVE")?).join(var("HOMEPATH")?))
}

fn home_dir() -> Option<PathBuf> {
    home_from(|key| env::var_os(key))
}

pub fn default_config_path() -> Option<PathBuf> {
    Some(home_dir()?.join(".attendance-dash").join("config.yml"))
}

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// `~` alone or followed by a separator; `~user` forms are left as they are.
fn expand_against(path: &str, home: Option<&Path>) -> PathBuf {
    let (Some(rest), Some(home)) = (path.strip_prefix('~'), home) else {
        return PathBuf::from(path);
    };
    if !rest.is_empty() && !rest.starts_with(is_separator) {
        return PathBuf::from(path);
    }
    home.join(rest.trim_start_matches(is_separator))
}

pub fn expand_tilde(path: &str) -> PathBuf {
    expand_against(path, home_dir().as_deref())
}

pub fn load_config(path: &Path, allow_missing: bool) -> Result<ConfigFile, String> {
    match std::fs::read_to_string(path) {
        Ok(contents) if contents.trim().is_empty() => Ok(ConfigFile::default()),
        Ok(contents) => serde_yaml::from_str::<ConfigFile>(&contents)
            .map_err(|e| format!("failed to parse config '{}': {e}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && allow_missing => {
            Ok(ConfigFile::default())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(format!("config file not found '{}'", path.display()))
        }
        Err(e) => Err(format!("failed to read config '{}': {e}", path.display())),
    }
}

fn default_config_yaml() -> String {
    r#"# attendance-dash config
#
# Location (default):
#   ~/.attendance-dash/config.yml

# Attendance server base URL
server: http://127.0.0.1:5000

# Per-request timeout in seconds
timeout: 10

# Users table rows per page
page_size: 12

# How long notifications stay listed, in milliseconds
toast_ttl_ms: 4000

# Output: text or json
output_format: text

# Output styling
no_color: false

# user_agent: attendance-dash
"#
    .to_string()
}

/// Writes the commented default file. Returns `false` when a file already exists.
pub fn ensure_default_config_file(path: &Path) -> Result<bool, String> {
    if path.exists() {
        return Ok(false);
    }
    let parent = path
        .parent()
        .ok_or_else(|| format!("invalid config path '{}'", path.display()))?;
    std::fs::create_dir_all(parent).map_err(|e| {
        format!(
            "failed to create config directory '{}': {e}",
            parent.display()
        )
    })?;
    std::fs::write(path, default_config_yaml())
        .map_err(|e| format!("failed to write config file '{}': {e}", path.display()))?;
    Ok(true)
}
