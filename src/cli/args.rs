use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "attendance-dash",
    version,
    about = "terminal dashboard for face-recognition attendance servers",
    long_about = "attendance-dash talks to a face-recognition attendance server: it lists users and attendance records, registers new users from a face image and triggers attendance marking.\n\nExamples:\n  attendance-dash\n  attendance-dash users --search ada --sort name\n  attendance-dash attendance --from 2026-10-01 --to 2026-10-19\n  attendance-dash register --name 'Ada Lovelace' --image ./ada.jpg\n  attendance-dash --server http://10.0.0.5:5000 mark\n\nTip: Use --config (or `attendance-dash init-config`) to persist the server URL."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "vb",
        visible_alias = "verbose",
        action = ArgAction::Count,
        global = true,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv)."
    )]
    pub verbose: u8,

    #[arg(
        short = 'n',
        long = "nc",
        visible_alias = "no-color",
        global = true,
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'A',
        long = "of",
        visible_alias = "output-format",
        value_name = "FORMAT",
        global = true,
        help_heading = "Output",
        help = "Output format (text or json)."
    )]
    pub output_format: Option<String>,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        global = true,
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.attendance-dash/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        short = 's',
        long = "srv",
        visible_alias = "server",
        value_name = "URL",
        global = true,
        help_heading = "HTTP",
        help = "Attendance server base URL (e.g. http://127.0.0.1:5000)."
    )]
    pub server: Option<String>,

    #[arg(
        short = 'T',
        long = "tmo",
        visible_alias = "timeout",
        value_name = "SECONDS",
        global = true,
        help_heading = "HTTP",
        help = "Per-request timeout in seconds."
    )]
    pub timeout: Option<u64>,

    #[arg(
        long = "ps",
        visible_alias = "page-size",
        value_name = "N",
        global = true,
        help_heading = "Users",
        help = "Rows per page in the users table."
    )]
    pub page_size: Option<usize>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Interactive dashboard (default when no command is given).
    Shell,
    /// Query the server health endpoint.
    Health,
    /// Show attendance records for a date or a date range.
    Attendance(AttendanceArgs),
    /// List users with search, sort and paging.
    Users(UsersArgs),
    /// Register a new user from a face image.
    Register(RegisterArgs),
    /// Mark attendance for the faces currently in front of the camera.
    Mark,
    /// Download a spreadsheet export.
    Export(ExportArgs),
    /// Write a commented default config file.
    InitConfig,
}

#[derive(Args, Debug, Clone, Default)]
pub struct AttendanceArgs {
    #[arg(short = 'd', long = "date", value_name = "YYYY-MM-DD", help = "Single day.")]
    pub date: Option<String>,

    #[arg(long = "from", value_name = "YYYY-MM-DD", help = "Range start (inclusive).")]
    pub from: Option<String>,

    #[arg(long = "to", value_name = "YYYY-MM-DD", help = "Range end (inclusive).")]
    pub to: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct UsersArgs {
    #[arg(short = 'q', long = "search", value_name = "TEXT", help = "Case-insensitive search over id, name, email and proxy.")]
    pub search: Option<String>,

    #[arg(long = "sort", value_name = "COLUMN", help = "Sort column (id, name, email, proxy, salary).")]
    pub sort: Option<String>,

    #[arg(long = "desc", requires = "sort", help = "Sort descending.")]
    pub desc: bool,

    #[arg(short = 'p', long = "page", value_name = "N", help = "Page to show (clamped to the last page).")]
    pub page: Option<usize>,

    #[arg(long = "all", conflicts_with = "page", help = "Print every page.")]
    pub all: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RegisterArgs {
    #[arg(long = "name", value_name = "NAME", help = "Full name (required).")]
    pub name: Option<String>,

    #[arg(long = "email", value_name = "EMAIL")]
    pub email: Option<String>,

    #[arg(long = "proxy", value_name = "ID", help = "Proxy / badge identifier.")]
    pub proxy: Option<String>,

    #[arg(long = "salary", value_name = "AMOUNT")]
    pub salary: Option<String>,

    #[arg(short = 'i', long = "image", value_name = "FILE", help = "Face image (required).")]
    pub image: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportTarget {
    Employees,
    Attendance,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    #[arg(value_enum)]
    pub target: ExportTarget,

    #[arg(short = 'o', long = "out", visible_alias = "output", value_name = "FILE", help = "Destination file (defaults to <target>.xlsx).")]
    pub output: Option<String>,
}
