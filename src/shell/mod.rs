//! Line-driven interactive dashboard.
//!
//! Every line typed at the `>` prompt is a shortcut key, optionally followed by
//! an argument (`s name`, `/ ada`, `x employees out.xlsx`). Forms and filters
//! ask for their fields one prompt at a time; while a prompt is open the input
//! has focus and shortcut keys are plain text. One command runs at a time and
//! the next prompt appears only once its request has finished.

pub mod shortcuts;

use std::io::Write;
use std::path::PathBuf;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

use crate::api::ExportKind;
use crate::session::Session;
use crate::toast::Severity;
use crate::views::{AttendanceState, FilterMode, SortKey};

pub use shortcuts::{nav_bar, Action, Focus, Shortcuts, View};

pub struct Shell<R, W> {
    session: Session,
    shortcuts: Shortcuts,
    active: View,
    focus: Focus,
    lines: Lines<R>,
    out: W,
}

/// Splits `"s name"` into `('s', "name")`. `/` may be glued to its argument.
fn split_command(line: &str) -> Option<(char, &str)> {
    let mut chars = line.chars();
    let key = chars.next()?;
    let rest = chars.as_str();
    if key != '/' && !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some((key, rest.trim()))
}

impl<R, W> Shell<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(session: Session, reader: R, out: W) -> Self {
        Self {
            session,
            shortcuts: Shortcuts::default(),
            active: View::Dashboard,
            focus: Focus::Nav,
            lines: reader.lines(),
            out,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn active(&self) -> View {
        self.active
    }

    pub fn into_parts(self) -> (Session, W) {
        (self.session, self.out)
    }

    fn emit(&mut self, text: &str) -> Result<(), String> {
        writeln!(self.out, "{text}").map_err(|e| format!("failed to write output: {e}"))
    }

    fn flush_toasts(&mut self) -> Result<(), String> {
        for line in self.session.ui.drain_new_toasts() {
            self.emit(&line)?;
        }
        Ok(())
    }

    async fn read_line(&mut self) -> Result<Option<String>, String> {
        self.out
            .flush()
            .map_err(|e| format!("failed to write output: {e}"))?;
        self.lines
            .next_line()
            .await
            .map_err(|e| format!("failed to read input: {e}"))
    }

    /// Reads one field. `None` means end of input.
    async fn prompt(&mut self, label: &str) -> Result<Option<String>, String> {
        self.focus = Focus::Input;
        write!(self.out, "{label}: ").map_err(|e| format!("failed to write output: {e}"))?;
        let line = self.read_line().await;
        self.focus = Focus::Nav;
        line
    }

    /// Runs until `q` or end of input.
    pub async fn run(&mut self) -> Result<(), String> {
        self.session
            .dashboard
            .check_health(&self.session.client)
            .await;
        self.render_active()?;
        loop {
            self.flush_toasts()?;
            write!(self.out, "> ").map_err(|e| format!("failed to write output: {e}"))?;
            let Some(line) = self.read_line().await? else {
                break;
            };
            if !self.handle(&line).await? {
                break;
            }
        }
        self.flush_toasts()
    }

    fn render_active(&mut self) -> Result<(), String> {
        let format = self.session.ui.format();
        let body = match self.active {
            View::Dashboard => self.session.dashboard.render(),
            View::Users => self.session.users.render(format),
            View::Attendance => self.session.attendance.render(format),
            View::Register => format!(
                "{}\n(fill with r, send with g)",
                self.session.register.form.render()
            ),
        };
        let nav = nav_bar(self.active);
        self.emit(&nav)?;
        self.emit(&body)
    }

    async fn ensure_users(&mut self) {
        if !self.session.users.is_loaded() {
            self.session
                .users
                .load(&self.session.client, &mut self.session.ui)
                .await;
        }
    }

    /// Handles one line typed at the main prompt. Returns `false` to quit.
    pub async fn handle(&mut self, line: &str) -> Result<bool, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(true);
        }
        let Some((key, arg)) = split_command(line) else {
            self.emit(&format!("unknown command '{line}' (? for help)"))?;
            return Ok(true);
        };
        let Some(action) = self.shortcuts.dispatch(key, self.focus) else {
            self.emit(&format!("unknown command '{line}' (? for help)"))?;
            return Ok(true);
        };
        let arg = arg.to_string();

        match action {
            Action::Quit => return Ok(false),
            Action::Help => {
                let help = self.shortcuts.help();
                self.emit(&help)?;
            }
            Action::Show(View::Users) => {
                self.active = View::Users;
                self.ensure_users().await;
                self.render_active()?;
            }
            Action::Show(View::Attendance) => {
                self.active = View::Attendance;
                if *self.session.attendance.state() == AttendanceState::Idle {
                    self.session
                        .attendance
                        .apply(&self.session.client, &mut self.session.ui)
                        .await;
                }
                self.render_active()?;
            }
            Action::Show(View::Register) => {
                self.active = View::Register;
                self.fill_register_form().await?;
                self.render_active()?;
            }
            Action::Show(View::Dashboard) => {
                self.active = View::Dashboard;
                self.render_active()?;
            }
            Action::MarkAttendance => {
                self.active = View::Dashboard;
                self.session
                    .dashboard
                    .mark_attendance(&self.session.client, &mut self.session.ui)
                    .await;
                self.render_active()?;
            }
            Action::NextPage | Action::PrevPage => {
                if self.active != View::Users {
                    self.emit("paging applies to the users view (u)")?;
                } else {
                    let moved = if action == Action::NextPage {
                        self.session.users.next_page()
                    } else {
                        self.session.users.prev_page()
                    };
                    if moved {
                        self.render_active()?;
                    } else {
                        let pager = self.session.users.pager();
                        self.emit(&pager)?;
                    }
                }
            }
            Action::Search => {
                let term = if arg.is_empty() {
                    match self.prompt("Search").await? {
                        Some(t) => t,
                        None => return Ok(false),
                    }
                } else {
                    arg
                };
                self.active = View::Users;
                self.ensure_users().await;
                self.session.users.set_search(&term);
                self.render_active()?;
            }
            Action::Sort => {
                let column = if arg.is_empty() {
                    match self.prompt("Sort by (id/name/email/proxy/salary)").await? {
                        Some(c) => c,
                        None => return Ok(false),
                    }
                } else {
                    arg
                };
                match SortKey::parse(&column) {
                    Some(key) => {
                        self.active = View::Users;
                        self.ensure_users().await;
                        self.session.users.sort_by(key);
                        self.render_active()?;
                    }
                    None => {
                        self.session
                            .ui
                            .toast(format!("Unknown column '{column}'"), Severity::Warning);
                    }
                }
            }
            Action::Filter => {
                if !self.fill_attendance_filter().await? {
                    return Ok(false);
                }
                self.active = View::Attendance;
                self.session
                    .attendance
                    .apply(&self.session.client, &mut self.session.ui)
                    .await;
                self.render_active()?;
            }
            Action::Submit => {
                self.active = View::Register;
                self.session
                    .register
                    .submit(&self.session.client, &mut self.session.ui)
                    .await;
                self.render_active()?;
            }
            Action::Export => self.export(&arg).await?,
            Action::Toasts => self.toasts(&arg)?,
            Action::Reload => {
                match self.active {
                    View::Dashboard => {
                        self.session
                            .dashboard
                            .check_health(&self.session.client)
                            .await;
                    }
                    View::Users => {
                        self.session
                            .users
                            .load(&self.session.client, &mut self.session.ui)
                            .await;
                    }
                    View::Attendance => {
                        self.session
                            .attendance
                            .apply(&self.session.client, &mut self.session.ui)
                            .await;
                    }
                    View::Register => {}
                }
                self.render_active()?;
            }
        }
        Ok(true)
    }

    /// Prompts for each field. An empty line keeps the current value and
    /// never sends the form; `-` clears a field.
    async fn fill_register_form(&mut self) -> Result<(), String> {
        let fields = ["Name", "Email", "Proxy", "Salary"];
        for label in fields {
            let Some(value) = self.prompt(label).await? else {
                return Ok(());
            };
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            let value = if value == "-" { "" } else { value };
            let form = &mut self.session.register.form;
            let slot = match label {
                "Name" => &mut form.name,
                "Email" => &mut form.email,
                "Proxy" => &mut form.proxy,
                _ => &mut form.salary,
            };
            *slot = value.to_string();
        }

        let Some(path) = self.prompt("Image file").await? else {
            return Ok(());
        };
        let path = path.trim();
        if path == "-" {
            self.session.register.form.clear_image();
        } else if !path.is_empty() {
            let path = crate::config::expand_tilde(path);
            if let Err(e) = self.session.register.form.select_image(&path) {
                self.session.ui.toast(e.to_string(), Severity::Warning);
            }
        }
        Ok(())
    }

    /// Returns `false` on end of input.
    async fn fill_attendance_filter(&mut self) -> Result<bool, String> {
        let current = self.session.attendance.filter().mode;
        let Some(mode) = self
            .prompt(&format!("Mode single/range [{}]", current.as_str()))
            .await?
        else {
            return Ok(false);
        };
        if let Some(mode) = FilterMode::parse(&mode) {
            self.session.attendance.filter_mut().set_mode(mode);
        }

        let labels: &[&str] = match self.session.attendance.filter().mode {
            FilterMode::Single => &["Date (YYYY-MM-DD)"],
            FilterMode::Range => &["Start date (YYYY-MM-DD)", "End date (YYYY-MM-DD)"],
        };
        for (idx, label) in labels.iter().enumerate() {
            let Some(value) = self.prompt(label).await? else {
                return Ok(false);
            };
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            let value = if value == "-" { "" } else { value };
            let filter = self.session.attendance.filter_mut();
            let slot = match (filter.mode, idx) {
                (FilterMode::Single, _) => &mut filter.date,
                (FilterMode::Range, 0) => &mut filter.start_date,
                (FilterMode::Range, _) => &mut filter.end_date,
            };
            *slot = value.to_string();
        }
        Ok(true)
    }

    async fn export(&mut self, arg: &str) -> Result<(), String> {
        let arg = if arg.is_empty() {
            match self.prompt("Export employees/attendance").await? {
                Some(a) => a,
                None => return Ok(()),
            }
        } else {
            arg.to_string()
        };
        let mut parts = arg.split_whitespace();
        let Some(kind) = parts.next().and_then(ExportKind::parse) else {
            self.session
                .ui
                .toast(format!("Unknown export '{arg}'"), Severity::Warning);
            return Ok(());
        };
        let path = parts
            .next()
            .map(crate::config::expand_tilde)
            .unwrap_or_else(|| PathBuf::from(kind.default_file_name()));
        match self.session.export(kind, &path).await {
            Ok(size) => {
                self.session.ui.toast(
                    format!("Saved {} ({} bytes)", path.display(), size),
                    Severity::Success,
                );
            }
            Err(e) => {
                self.session.ui.toast(e, Severity::Error);
            }
        }
        Ok(())
    }

    fn toasts(&mut self, arg: &str) -> Result<(), String> {
        if !arg.is_empty() {
            match arg.parse::<u64>() {
                Ok(id) if self.session.ui.toasts_mut().dismiss(id) => {}
                _ => self.emit(&format!("no notification #{arg}"))?,
            }
            return Ok(());
        }
        self.session
            .ui
            .toasts_mut()
            .expire(std::time::Instant::now());
        let lines: Vec<String> = self.session.ui.toasts().iter().map(|t| t.render()).collect();
        if lines.is_empty() {
            self.emit("no notifications")?;
        }
        for line in lines {
            self.emit(&line)?;
        }
        Ok(())
    }
}
