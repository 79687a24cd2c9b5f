use colored::Colorize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    Dashboard,
    Users,
    Attendance,
    Register,
}

impl View {
    pub const ALL: [View; 4] = [View::Dashboard, View::Users, View::Attendance, View::Register];

    pub fn label(&self) -> &'static str {
        match self {
            View::Dashboard => "dashboard",
            View::Users => "users",
            View::Attendance => "attendance",
            View::Register => "register",
        }
    }

    pub fn key(&self) -> char {
        match self {
            View::Dashboard => 'd',
            View::Users => 'u',
            View::Attendance => 'a',
            View::Register => 'r',
        }
    }
}

/// Navigation bar with the active view highlighted.
pub fn nav_bar(active: View) -> String {
    View::ALL
        .iter()
        .map(|v| {
            let label = v.label();
            let item = format!("[{}]{}", v.key(), &label[1..]);
            if *v == active {
                item.black().on_cyan().bold().to_string()
            } else {
                item.dimmed().to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Focus {
    Nav,
    /// A form field or prompt is reading the line.
    Input,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Show(View),
    MarkAttendance,
    NextPage,
    PrevPage,
    Search,
    Sort,
    Filter,
    Submit,
    Export,
    Toasts,
    Reload,
    Help,
    Quit,
}

#[derive(Clone, Debug)]
pub struct Shortcuts {
    bindings: Vec<(char, Action, &'static str)>,
}

impl Default for Shortcuts {
    fn default() -> Self {
        Self {
            bindings: vec![
                ('d', Action::Show(View::Dashboard), "dashboard"),
                ('u', Action::Show(View::Users), "users"),
                ('a', Action::Show(View::Attendance), "attendance"),
                ('r', Action::Show(View::Register), "register form"),
                ('m', Action::MarkAttendance, "mark attendance"),
                ('n', Action::NextPage, "next page"),
                ('p', Action::PrevPage, "previous page"),
                ('/', Action::Search, "search users: / TEXT"),
                ('s', Action::Sort, "sort users: s COLUMN"),
                ('f', Action::Filter, "attendance filter"),
                ('g', Action::Submit, "send the register form"),
                ('x', Action::Export, "export: x employees|attendance [FILE]"),
                ('t', Action::Toasts, "notifications: t [ID to dismiss]"),
                ('l', Action::Reload, "reload current view"),
                ('?', Action::Help, "help"),
                ('q', Action::Quit, "quit"),
            ],
        }
    }
}

impl Shortcuts {
    /// Keys are ignored while an input has focus; they belong to the field.
    pub fn dispatch(&self, key: char, focus: Focus) -> Option<Action> {
        if focus == Focus::Input {
            return None;
        }
        let key = key.to_ascii_lowercase();
        self.bindings
            .iter()
            .find(|(k, _, _)| *k == key)
            .map(|(_, action, _)| *action)
    }

    pub fn help(&self) -> String {
        self.bindings
            .iter()
            .map(|(k, _, desc)| format!("  {k}  {desc}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
