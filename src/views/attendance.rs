use tracing::debug;

use crate::api::{ApiClient, AttendanceRecord, Payload};
use crate::output::{self, OutputFormat, Table};
use crate::toast::Severity;
use crate::ui::Ui;
use crate::utils;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FilterMode {
    #[default]
    Single,
    Range,
}

impl FilterMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "single" | "date" | "day" => Some(Self::Single),
            "range" => Some(Self::Range),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterMode::Single => "single",
            FilterMode::Range => "range",
        }
    }
}

/// Inputs for both filter modes. Only the active mode's inputs reach the query;
/// the others are kept so switching back restores them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttendanceFilter {
    pub mode: FilterMode,
    pub date: String,
    pub start_date: String,
    pub end_date: String,
}

impl AttendanceFilter {
    pub fn single(date: &str) -> Self {
        Self {
            mode: FilterMode::Single,
            date: date.trim().to_string(),
            ..Self::default()
        }
    }

    pub fn range(start_date: &str, end_date: &str) -> Self {
        Self {
            mode: FilterMode::Range,
            start_date: start_date.trim().to_string(),
            end_date: end_date.trim().to_string(),
            ..Self::default()
        }
    }

    pub fn set_mode(&mut self, mode: FilterMode) {
        self.mode = mode;
    }

    /// Names of the inputs shown for the current mode.
    pub fn active_inputs(&self) -> &'static [&'static str] {
        match self.mode {
            FilterMode::Single => &["date"],
            FilterMode::Range => &["start_date", "end_date"],
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match self.mode {
            FilterMode::Single => {
                if !self.date.is_empty() {
                    utils::parse_date(&self.date)?;
                }
            }
            FilterMode::Range => {
                let start = (!self.start_date.is_empty())
                    .then(|| utils::parse_date(&self.start_date))
                    .transpose()?;
                let end = (!self.end_date.is_empty())
                    .then(|| utils::parse_date(&self.end_date))
                    .transpose()?;
                if let (Some(start), Some(end)) = (start, end) {
                    if start > end {
                        return Err(format!(
                            "start date {start} is after end date {end}"
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("filter_type", self.mode.as_str().to_string())];
        match self.mode {
            FilterMode::Single => {
                if !self.date.is_empty() {
                    pairs.push(("date", self.date.clone()));
                }
            }
            FilterMode::Range => {
                if !self.start_date.is_empty() {
                    pairs.push(("start_date", self.start_date.clone()));
                }
                if !self.end_date.is_empty() {
                    pairs.push(("end_date", self.end_date.clone()));
                }
            }
        }
        pairs
    }

    pub fn query_string(&self) -> String {
        self.query_pairs()
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AttendanceState {
    #[default]
    Idle,
    Loading,
    Rows(Vec<AttendanceRecord>),
    NoRecords,
    NoData,
    Error(String),
}

impl AttendanceState {
    /// Empty array means "no records"; any other non-array body means "no data".
    pub fn from_payload(payload: &Payload) -> Self {
        let Some(items) = payload.as_array() else {
            return AttendanceState::NoData;
        };
        if items.is_empty() {
            return AttendanceState::NoRecords;
        }
        let rows: Vec<AttendanceRecord> = items
            .iter()
            .filter_map(|item| serde_json::from_value(item.clone()).ok())
            .collect();
        if rows.is_empty() {
            AttendanceState::NoData
        } else {
            AttendanceState::Rows(rows)
        }
    }

    pub fn placeholder(&self) -> &'static str {
        match self {
            AttendanceState::Idle => "Apply a filter to load records",
            AttendanceState::Loading => "Loading...",
            AttendanceState::Rows(_) => "",
            AttendanceState::NoRecords => "No records",
            AttendanceState::NoData => "No data",
            AttendanceState::Error(_) => "Failed to load",
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct AttendanceView {
    filter: AttendanceFilter,
    state: AttendanceState,
}

impl AttendanceView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(&self) -> &AttendanceFilter {
        &self.filter
    }

    pub fn filter_mut(&mut self) -> &mut AttendanceFilter {
        &mut self.filter
    }

    pub fn set_filter(&mut self, filter: AttendanceFilter) {
        self.filter = filter;
    }

    pub fn state(&self) -> &AttendanceState {
        &self.state
    }

    pub fn records(&self) -> &[AttendanceRecord] {
        match &self.state {
            AttendanceState::Rows(rows) => rows,
            _ => &[],
        }
    }

    /// Re-fetches with the current filter. Failures end up in the state and
    /// as a toast; they are never returned.
    pub async fn apply(&mut self, client: &ApiClient, ui: &mut Ui) -> &AttendanceState {
        if let Err(e) = self.filter.validate() {
            ui.toast(e, Severity::Warning);
            return &self.state;
        }
        self.state = AttendanceState::Loading;
        let pairs = self.filter.query_pairs();
        debug!(query = %self.filter.query_string(), "loading attendance");
        let pb = ui.spinner("Loading attendance...");
        let result = client.attendance(&pairs).await;
        pb.finish_and_clear();
        self.state = match result {
            Ok(payload) => AttendanceState::from_payload(&payload),
            Err(e) => {
                ui.toast(
                    format!("Failed to load attendance: {}", e.user_message()),
                    Severity::Error,
                );
                AttendanceState::Error(e.to_string())
            }
        };
        &self.state
    }

    pub fn render(&self, format: OutputFormat) -> String {
        if format == OutputFormat::Json {
            return output::render_json(self.records());
        }
        let mut table =
            Table::new(["Name", "Time", "Timestamp"]).placeholder(self.state.placeholder());
        for r in self.records() {
            table.push_row([
                r.name.clone(),
                utils::format_timestamp(&r.timestamp),
                r.timestamp.clone(),
            ]);
        }
        let mut out = output::format_kv_line("Filter", &self.filter.query_string());
        out.push('\n');
        out.push_str(&table.render());
        out
    }
}
