use colored::Colorize;
use itertools::Itertools;

/// Plain-text table with left-aligned, width-fitted columns.
///
/// A table with no rows renders a single placeholder row instead
/// ("No records", "Loading...").
#[derive(Clone, Debug, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    placeholder: Option<String>,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
            placeholder: None,
        }
    }

    pub fn push_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut row: Vec<String> = cells.into_iter().map(Into::into).collect();
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    pub fn placeholder(mut self, text: impl Into<String>) -> Self {
        self.placeholder = Some(text.into());
        self
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn widths(&self) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                self.rows
                    .iter()
                    .map(|r| r[i].chars().count())
                    .chain(std::iter::once(h.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }

    pub fn render(&self) -> String {
        let widths = self.widths();
        let header = self
            .headers
            .iter()
            .zip(widths.iter())
            .map(|(h, w)| format!("{:<w$}", h, w = *w))
            .join("  ");
        let rule = widths.iter().map(|w| "-".repeat(*w)).join("  ");

        let mut out = String::new();
        out.push_str(&header.bold().to_string());
        out.push('\n');
        out.push_str(&rule);
        out.push('\n');
        if self.rows.is_empty() {
            if let Some(text) = self.placeholder.as_deref() {
                out.push_str(text);
                out.push('\n');
            }
            return out;
        }
        for row in &self.rows {
            let line = row
                .iter()
                .zip(widths.iter())
                .map(|(c, w)| format!("{:<w$}", c, w = *w))
                .join("  ");
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out
    }
}
