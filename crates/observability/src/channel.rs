//! Per-system diagnostic channel.
//!
//! Each tracked system owns one channel: a `tracing` span that every message
//! of that system is parented to. Messages never influence control flow; the
//! channel only counts what it forwarded.

use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, error, info, info_span, warn, Span};

/// Leveled message sink scoped to one system.
#[derive(Debug)]
pub struct LogChannel {
    name: String,
    span: Span,
    warnings: AtomicU64,
    errors: AtomicU64,
}

impl LogChannel {
    /// Channel for a vehicle: span `vehicle{system_id=..}`.
    pub fn for_system(system_id: u32) -> Self {
        Self::with_span(
            format!("system #{system_id}"),
            info_span!("vehicle", system_id),
        )
    }

    /// Channel with a caller-provided span.
    pub fn with_span(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
            warnings: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    /// Channel that forwards nowhere.
    pub fn disabled(name: impl Into<String>) -> Self {
        Self::with_span(name, Span::none())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn debug(&self, message: impl Display) {
        debug!(parent: &self.span, "{message}");
    }

    pub fn info(&self, message: impl Display) {
        info!(parent: &self.span, "{message}");
    }

    pub fn warn(&self, message: impl Display) {
        self.warnings.fetch_add(1, Ordering::Relaxed);
        warn!(parent: &self.span, "{message}");
    }

    pub fn error(&self, message: impl Display) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        error!(parent: &self.span, "{message}");
    }

    /// Warnings forwarded so far
    pub fn warnings(&self) -> u64 {
        self.warnings.load(Ordering::Relaxed)
    }

    /// Errors forwarded so far
    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Run `f` inside this channel's span.
    pub fn in_scope<R>(&self, f: impl FnOnce() -> R) -> R {
        self.span.in_scope(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_without_subscriber() {
        let channel = LogChannel::for_system(7);
        channel.info("loaded");
        channel.warn("no time reference");
        channel.warn(format_args!("skipped {}", "GPS/lat"));
        channel.error("type mismatch");
        assert_eq!(channel.warnings(), 2);
        assert_eq!(channel.errors(), 1);
        assert_eq!(channel.name(), "system #7");
    }

    #[test]
    fn test_disabled_channel() {
        let channel = LogChannel::disabled("scratch");
        channel.warn("ignored");
        assert_eq!(channel.warnings(), 1);
        assert!(channel.span().is_none());
        assert_eq!(channel.in_scope(|| 3), 3);
    }
}
