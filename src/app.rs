use std::path::PathBuf;

use clap::{error::ErrorKind, CommandFactory, Parser};
use itertools::Itertools;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

use crate::api::ExportKind;
use crate::cli::args::{
    AttendanceArgs, CliArgs, Command, ExportArgs, ExportTarget, RegisterArgs, UsersArgs,
};
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::output::{self, format_kv_line, OutputFormat};
use crate::session::{Options, Session};
use crate::shell::Shell;
use crate::views::{AttendanceFilter, AttendanceState, HealthLine, RegisterOutcome, SortKey};

fn print_banner() {
    const BANNER: &str = r#"
         __  __                 __
  ____ _/ /_/ /____  ____  ____/ /
 / __ `/ __/ __/ _ \/ __ \/ __  /
/ /_/ / /_/ /_/  __/ / / / /_/ /
\__,_/\__/\__/\___/_/ /_/\__,_/  dash
"#;
    print!("{}", BANNER);
    println!("  v{} - attendance dashboard", env!("CARGO_PKG_VERSION"));
    println!();
}

/// `-s, --srv, --server <URL>` for one argument.
fn flag_spec(arg: &clap::Arg) -> String {
    let short = arg.get_short().map(|c| format!("-{c}"));
    let long = arg.get_long().map(|l| format!("--{l}"));
    let aliases = arg
        .get_visible_aliases()
        .unwrap_or_default()
        .into_iter()
        .map(|a| format!("--{a}"));
    let mut spec = short.into_iter().chain(long).chain(aliases).unique().join(", ");
    if arg.get_action().takes_values() {
        let value = arg
            .get_value_names()
            .and_then(|names| names.first())
            .map(|name| name.as_str())
            .unwrap_or("VALUE");
        spec.push_str(&format!(" <{value}>"));
    }
    spec
}

fn section_of(arg: &clap::Arg) -> &str {
    arg.get_help_heading().unwrap_or("Options")
}

/// Subcommands with their own flags, then global options grouped by heading
/// in declaration order.
fn render_custom_help() -> String {
    let cmd = CliArgs::command();
    let mut out = format!(
        "{} {}\n{}\n\nUsage: {} [OPTIONS] [COMMAND]\n\nCommands:\n",
        cmd.get_name(),
        cmd.get_version().unwrap_or_default(),
        cmd.get_about().map(|a| a.to_string()).unwrap_or_default(),
        cmd.get_name(),
    );

    for sub in cmd.get_subcommands() {
        let about = sub.get_about().map(|a| a.to_string()).unwrap_or_default();
        out.push_str(&format!("  {:<12}  {}\n", sub.get_name(), about));
        let flags = sub
            .get_arguments()
            .filter(|a| !a.is_global_set() && !a.is_hide_set())
            .filter(|a| a.get_long().is_some())
            .map(|a| format!("--{}", a.get_long().unwrap_or_default()))
            .join(" ");
        if !flags.is_empty() {
            out.push_str(&format!("  {:<12}  [{}]\n", "", flags));
        }
    }

    let args = cmd.get_arguments().filter(|a| !a.is_hide_set()).collect_vec();
    for section in args.iter().map(|a| section_of(a)).unique() {
        out.push_str(&format!("\n{section}:\n"));
        for arg in args.iter().filter(|a| section_of(a) == section) {
            out.push_str(&format!("  {}\n", flag_spec(arg)));
            let help = arg.get_help().map(|h| h.to_string()).unwrap_or_default();
            if !help.trim().is_empty() {
                out.push_str(&format!("          {}\n", help.trim()));
            }
        }
    }

    if let Some(long_about) = cmd.get_long_about() {
        out.push_str(&format!("\n{long_about}\n"));
    }
    out
}

#[derive(Clone, Debug)]
struct RunConfig {
    config_path: Option<PathBuf>,
    server: String,
    timeout: u64,
    page_size: usize,
    toast_ttl_ms: u64,
    no_color: bool,
    output_format: OutputFormat,
    user_agent: Option<String>,
    verbose: u8,
    command: Command,
}

impl RunConfig {
    fn session_options(&self) -> Options {
        Options {
            server: self.server.clone(),
            timeout_seconds: self.timeout,
            user_agent: self.user_agent.clone(),
            page_size: self.page_size,
            toast_ttl_ms: self.toast_ttl_ms,
            output_format: self.output_format,
            spinners: self.output_format == OutputFormat::Text,
        }
    }
}

fn build_run_config(
    args: CliArgs,
    cfg: ConfigFile,
    config_path: Option<PathBuf>,
) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let defaults = Options::default();
    let server = args.server.or(cfg.server).unwrap_or(defaults.server);
    let timeout = args
        .timeout
        .or(cfg.timeout)
        .unwrap_or(defaults.timeout_seconds);
    let page_size = args
        .page_size
        .or(cfg.page_size)
        .unwrap_or(defaults.page_size);
    let toast_ttl_ms = cfg.toast_ttl_ms.unwrap_or(defaults.toast_ttl_ms);
    let no_color = args.no_color || cfg.no_color.unwrap_or(false);

    let output_format = match args.output_format.or(cfg.output_format) {
        Some(raw) => OutputFormat::parse(&raw)
            .ok_or_else(|| format!("invalid output format '{raw}', expected text or json"))?,
        None => OutputFormat::Text,
    };

    Ok(RunConfig {
        config_path,
        server,
        timeout,
        page_size,
        toast_ttl_ms,
        no_color,
        output_format,
        user_agent: cfg.user_agent,
        verbose: args.verbose,
        command: args.command.unwrap_or(Command::Shell),
    })
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("attendance_dash={level}")));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn print_toasts(session: &mut Session) {
    for line in session.ui.drain_new_toasts() {
        eprintln!("{line}");
    }
}

async fn run_health(session: &mut Session) -> Result<(), String> {
    let line = session
        .dashboard
        .check_health(&session.client)
        .await
        .clone();
    if session.ui.format() == OutputFormat::Json {
        let value = match &line {
            HealthLine::Ok { timestamp } => {
                serde_json::json!({ "status": "ok", "timestamp": timestamp })
            }
            HealthLine::Unknown => serde_json::json!({ "status": "unknown" }),
        };
        println!("{}", output::render_json(&value));
    } else {
        println!("{}", format_kv_line("Server", session.client.base_url()));
        println!("{}", line.render());
    }
    Ok(())
}

async fn run_attendance(session: &mut Session, args: AttendanceArgs) -> Result<(), String> {
    let filter = match (args.date, args.from, args.to) {
        (Some(date), _, _) => AttendanceFilter::single(&date),
        (None, Some(from), Some(to)) => AttendanceFilter::range(&from, &to),
        _ => AttendanceFilter::default(),
    };
    session.attendance.set_filter(filter);
    session
        .attendance
        .apply(&session.client, &mut session.ui)
        .await;
    print!("{}", session.attendance.render(session.ui.format()));
    print_toasts(session);
    match session.attendance.state() {
        AttendanceState::Error(e) => Err(e.clone()),
        _ => Ok(()),
    }
}

async fn run_users(session: &mut Session, args: UsersArgs) -> Result<(), String> {
    let loaded = session.users.load(&session.client, &mut session.ui).await;
    if !loaded {
        print_toasts(session);
        return Err("could not load users".to_string());
    }
    if let Some(term) = args.search.as_deref() {
        session.users.set_search(term);
    }
    if let Some(key) = args.sort.as_deref().and_then(SortKey::parse) {
        session.users.sort_by(key);
        if args.desc {
            session.users.sort_by(key);
        }
    }
    let format = session.ui.format();
    if args.all {
        if format == OutputFormat::Json {
            println!("{}", output::render_json(&session.users.filtered()));
        } else {
            for page in 1..=session.users.page_count() {
                session.users.set_page(page);
                print!("{}", session.users.render(format));
            }
        }
    } else {
        session.users.set_page(args.page.unwrap_or(1));
        print!("{}", session.users.render(format));
    }
    print_toasts(session);
    Ok(())
}

async fn run_register(session: &mut Session, args: RegisterArgs) -> Result<(), String> {
    let form = &mut session.register.form;
    form.name = args.name.unwrap_or_default();
    form.email = args.email.unwrap_or_default();
    form.proxy = args.proxy.unwrap_or_default();
    form.salary = args.salary.unwrap_or_default();
    if let Some(image) = args.image.as_deref() {
        let path = config::expand_tilde(image);
        form.select_image(&path).map_err(|e| e.to_string())?;
    }

    let outcome = session
        .register
        .submit(&session.client, &mut session.ui)
        .await;
    print_toasts(session);
    if let RegisterOutcome::Registered { user_id } = &outcome {
        if session.ui.format() == OutputFormat::Json {
            let value = serde_json::json!({ "status": "success", "user_id": user_id });
            println!("{}", output::render_json(&value));
        }
    }
    register_status(&outcome)
}

/// Exit status for a submission. The details were already printed as a toast.
fn register_status(outcome: &RegisterOutcome) -> Result<(), String> {
    match outcome {
        RegisterOutcome::Registered { .. } => Ok(()),
        RegisterOutcome::Invalid(_) => Err("registration form is incomplete".to_string()),
        RegisterOutcome::Rejected(_) => Err("registration was rejected".to_string()),
    }
}

async fn run_mark(session: &mut Session) -> Result<(), String> {
    let report = session
        .dashboard
        .mark_attendance(&session.client, &mut session.ui)
        .await
        .clone();
    if session.ui.format() == OutputFormat::Json {
        println!("{}", report.body);
    } else {
        print!("{}", session.dashboard.render());
    }
    print_toasts(session);
    if report.ok {
        Ok(())
    } else {
        Err("attendance was not marked".to_string())
    }
}

async fn run_export(session: &mut Session, args: ExportArgs) -> Result<(), String> {
    let kind = match args.target {
        ExportTarget::Employees => ExportKind::Employees,
        ExportTarget::Attendance => ExportKind::Attendance,
    };
    let path = args
        .output
        .as_deref()
        .map(config::expand_tilde)
        .unwrap_or_else(|| PathBuf::from(kind.default_file_name()));
    let size = session.export(kind, &path).await?;
    println!("{}", format_kv_line("Saved", &path.display().to_string()));
    println!("{}", format_kv_line("Size", &format!("{size} bytes")));
    Ok(())
}

fn run_init_config(path: Option<PathBuf>) -> Result<(), String> {
    let path = path
        .or_else(config::default_config_path)
        .ok_or_else(|| "cannot determine home directory, pass --config".to_string())?;
    if config::ensure_default_config_file(&path)? {
        println!("{}", format_kv_line("Created", &path.display().to_string()));
    } else {
        println!("{}", format_kv_line("Exists", &path.display().to_string()));
    }
    Ok(())
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.no_color {
        colored::control::set_override(false);
    }

    if let Command::InitConfig = run.command {
        return run_init_config(run.config_path.clone());
    }

    let mut session = Session::new(run.session_options()).map_err(|e| e.to_string())?;
    match run.command {
        Command::Shell => {
            print_banner();
            println!("{}", format_kv_line("Server", session.client.base_url()));
            println!("{}", format_kv_line("Help", "press ? for shortcuts, q to quit"));
            println!();
            let mut shell = Shell::new(
                session,
                BufReader::new(tokio::io::stdin()),
                std::io::stdout(),
            );
            shell.run().await
        }
        Command::Health => run_health(&mut session).await,
        Command::Attendance(args) => run_attendance(&mut session, args).await,
        Command::Users(args) => run_users(&mut session, args).await,
        Command::Register(args) => run_register(&mut session, args).await,
        Command::Mark => run_mark(&mut session).await,
        Command::Export(args) => run_export(&mut session, args).await,
        Command::InitConfig => Ok(()),
    }
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp if std::env::args().len() <= 2 => {
                print!("{}", render_custom_help());
                return Ok(());
            }
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{e}");
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    init_tracing(args.verbose);

    let user_config_path = args.config.clone().map(|p| config::expand_tilde(&p));
    let cfg = match user_config_path.as_ref() {
        Some(path) if matches!(args.command, Some(Command::InitConfig)) => {
            config::load_config(path, true)?
        }
        Some(path) => config::load_config(path, false)?,
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true)?,
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg, user_config_path)?;
    tracing::debug!(server = %run.server, verbose = run.verbose, "starting");

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))
}
