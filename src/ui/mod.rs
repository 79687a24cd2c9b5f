use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::output::OutputFormat;
use crate::toast::{Severity, ToastId, ToastQueue, DEFAULT_TTL};

/// Per-session UI context handed to every view: the toast queue, the toast
/// lifetime and the output settings.
#[derive(Debug)]
pub struct Ui {
    toasts: ToastQueue,
    toast_ttl: Duration,
    format: OutputFormat,
    spinners: bool,
}

impl Default for Ui {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, OutputFormat::Text)
    }
}

impl Ui {
    pub fn new(toast_ttl: Duration, format: OutputFormat) -> Self {
        Self {
            toasts: ToastQueue::new(),
            toast_ttl,
            format,
            spinners: true,
        }
    }

    /// No spinners; used for JSON output and tests.
    pub fn quiet(mut self) -> Self {
        self.spinners = false;
        self
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn toast_ttl(&self) -> Duration {
        self.toast_ttl
    }

    pub fn toast(&mut self, message: impl Into<String>, severity: Severity) -> ToastId {
        let ttl = self.toast_ttl;
        self.toasts.push(message, severity, ttl)
    }

    pub fn toasts(&self) -> &ToastQueue {
        &self.toasts
    }

    pub fn toasts_mut(&mut self) -> &mut ToastQueue {
        &mut self.toasts
    }

    /// Rendered lines for toasts that have not been printed yet. Expired
    /// toasts are dropped first, so a toast that outlived its ttl unseen is
    /// never printed.
    pub fn drain_new_toasts(&mut self) -> Vec<String> {
        self.toasts.expire(Instant::now());
        self.toasts
            .take_unshown()
            .iter()
            .map(|t| t.render())
            .collect()
    }

    pub fn has_toast(&self, severity: Severity, needle: &str) -> bool {
        self.toasts
            .iter()
            .any(|t| t.severity == severity && t.message.contains(needle))
    }

    pub fn spinner(&self, message: &str) -> ProgressBar {
        if !self.spinners {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new_spinner();
        pb.set_draw_target(ProgressDrawTarget::stderr());
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }
}
