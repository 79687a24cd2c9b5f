use crate::cli::args::{CliArgs, Command};

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err("invalid timeout, expected a positive number of seconds".to_string());
        }
    }
    if let Some(page_size) = args.page_size {
        if page_size == 0 {
            return Err("invalid page-size, expected positive integer".to_string());
        }
    }
    if let Some(raw) = args.output_format.as_deref() {
        crate::output::OutputFormat::parse(raw)
            .ok_or_else(|| format!("invalid --output-format '{raw}', expected text or json"))?;
    }

    match args.command.as_ref() {
        Some(Command::Attendance(a)) => {
            if a.date.is_some() && (a.from.is_some() || a.to.is_some()) {
                return Err("use either --date or --from/--to, not both".to_string());
            }
            if a.from.is_some() != a.to.is_some() {
                return Err("--from and --to must be given together".to_string());
            }
            for (flag, value) in [("--date", &a.date), ("--from", &a.from), ("--to", &a.to)] {
                if let Some(raw) = value.as_deref() {
                    crate::utils::parse_date(raw).map_err(|e| format!("invalid {flag}: {e}"))?;
                }
            }
        }
        Some(Command::Users(u)) => {
            if let Some(raw) = u.sort.as_deref() {
                crate::views::SortKey::parse(raw).ok_or_else(|| {
                    format!("invalid --sort '{raw}', expected id, name, email, proxy or salary")
                })?;
            }
            if u.page == Some(0) {
                return Err("invalid page, expected positive integer".to_string());
            }
        }
        _ => {}
    }
    Ok(())
}
