use std::collections::VecDeque;
use std::time::{Duration, Instant};

use colored::Colorize;

pub const DEFAULT_TTL: Duration = Duration::from_millis(4000);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "ok",
            Severity::Warning => "warn",
            Severity::Error => "error",
        }
    }
}

pub type ToastId = u64;

#[derive(Clone, Debug)]
pub struct Toast {
    pub id: ToastId,
    pub message: String,
    pub severity: Severity,
    pub created: Instant,
    pub ttl: Duration,
    shown: bool,
}

impl Toast {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created) >= self.ttl
    }

    pub fn render(&self) -> String {
        let tag = format!("[{}]", self.severity.label());
        let tag = match self.severity {
            Severity::Info => tag.cyan(),
            Severity::Success => tag.green(),
            Severity::Warning => tag.yellow(),
            Severity::Error => tag.red().bold(),
        };
        format!("{} {} {}", tag, self.message, format!("(#{})", self.id).dimmed())
    }
}

/// Newest-first list of live notifications.
///
/// Storage is created on the first push. There is no length limit and no
/// dedup; toasts leave the queue when they expire or are dismissed.
#[derive(Debug, Default)]
pub struct ToastQueue {
    toasts: Option<VecDeque<Toast>>,
    next_id: ToastId,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>, severity: Severity, ttl: Duration) -> ToastId {
        self.push_at(message, severity, ttl, Instant::now())
    }

    pub fn push_at(
        &mut self,
        message: impl Into<String>,
        severity: Severity,
        ttl: Duration,
        now: Instant,
    ) -> ToastId {
        self.next_id += 1;
        let id = self.next_id;
        self.toasts.get_or_insert_with(VecDeque::new).push_front(Toast {
            id,
            message: message.into(),
            severity,
            created: now,
            ttl,
            shown: false,
        });
        id
    }

    pub fn dismiss(&mut self, id: ToastId) -> bool {
        let Some(toasts) = self.toasts.as_mut() else {
            return false;
        };
        let before = toasts.len();
        toasts.retain(|t| t.id != id);
        toasts.len() != before
    }

    /// Drops expired toasts and returns how many were removed.
    pub fn expire(&mut self, now: Instant) -> usize {
        let Some(toasts) = self.toasts.as_mut() else {
            return 0;
        };
        let before = toasts.len();
        toasts.retain(|t| !t.is_expired(now));
        before - toasts.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter().flat_map(|t| t.iter())
    }

    pub fn len(&self) -> usize {
        self.toasts.as_ref().map(VecDeque::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_initialized(&self) -> bool {
        self.toasts.is_some()
    }

    /// Toasts not yet printed, oldest first. Marks them as printed.
    pub fn take_unshown(&mut self) -> Vec<Toast> {
        let Some(toasts) = self.toasts.as_mut() else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for t in toasts.iter_mut().rev() {
            if !t.shown {
                t.shown = true;
                out.push(t.clone());
            }
        }
        out
    }
}
