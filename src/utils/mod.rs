use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("date is empty".to_string());
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map_err(|_| format!("invalid date '{trimmed}', expected YYYY-MM-DD"))
}

/// Trimmed value, or `None` when nothing is left.
pub fn optional_trimmed(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
}

/// Human readable form of a server timestamp. Unparseable input is returned as-is.
pub fn format_timestamp(raw: &str) -> String {
    match parse_timestamp(raw) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => raw.to_string(),
    }
}

pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}

pub fn human_bytes(size: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = size as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{size} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

pub fn page_count(len: usize, page_size: usize) -> usize {
    let page_size = page_size.max(1);
    len.div_ceil(page_size).max(1)
}

pub fn clamp_page(page: usize, len: usize, page_size: usize) -> usize {
    page.clamp(1, page_count(len, page_size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_accepts_iso_dates_only() {
        assert!(parse_date("2026-10-19").is_ok());
        assert!(parse_date(" 2026-10-19 ").is_ok());
        assert!(parse_date("19/10/2026").is_err());
        assert!(parse_date("2026-02-30").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn optional_trimmed_drops_blank_values() {
        assert_eq!(optional_trimmed("  "), None);
        assert_eq!(optional_trimmed(" a@b.c "), Some("a@b.c".to_string()));
    }

    #[test]
    fn format_timestamp_handles_server_shapes() {
        assert_eq!(
            format_timestamp("2026-10-19 09:05:00"),
            "2026-10-19 09:05"
        );
        assert_eq!(
            format_timestamp("2026-10-19T09:05:00.123456"),
            "2026-10-19 09:05"
        );
        assert_eq!(format_timestamp("yesterday"), "yesterday");
    }

    #[test]
    fn mime_is_guessed_from_extension() {
        assert_eq!(mime_for_path(Path::new("face.JPG")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("face.png")), "image/png");
        assert_eq!(
            mime_for_path(Path::new("face")),
            "application/octet-stream"
        );
    }

    #[test]
    fn page_count_never_drops_below_one() {
        assert_eq!(page_count(0, 12), 1);
        assert_eq!(page_count(12, 12), 1);
        assert_eq!(page_count(13, 12), 2);
        assert_eq!(clamp_page(0, 13, 12), 1);
        assert_eq!(clamp_page(9, 13, 12), 2);
    }

    #[test]
    fn human_bytes_scales_units() {
        assert_eq!(human_bytes(512), "512 B");
        assert_eq!(human_bytes(2048), "2.0 KiB");
    }
}
