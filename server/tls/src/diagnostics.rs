//! Diagnostic reports and the sinks that receive them.
//!
//! A report is produced once per failure, handed to a sink, and forgotten. The
//! sink decides where it ends up: the service log via tracing, or a buffer that
//! tests and the config checker can inspect.

use std::fmt;
use std::sync::{Mutex, MutexGuard};

use sketching::{admin_error, admin_warn, security_critical};

use crate::error::ErrorCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticReport {
    pub severity: Severity,
    pub code: ErrorCode,
    /// The operation that raised the report, eg `SslContextInitializer::init_server`.
    pub origin: &'static str,
    pub message: String,
}

impl DiagnosticReport {
    pub fn new(
        severity: Severity,
        code: ErrorCode,
        origin: &'static str,
        message: impl Into<String>,
    ) -> Self {
        DiagnosticReport {
            severity,
            code,
            origin,
            message: message.into(),
        }
    }
}

impl fmt::Display for DiagnosticReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {}: {}",
            self.severity, self.code, self.origin, self.message
        )
    }
}

/// Receives diagnostic reports. Fire and forget, nothing is returned to the
/// reporter.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, report: DiagnosticReport);
}

/// Writes every report into the service log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, report: DiagnosticReport) {
        let code = report.code.as_u32();
        match report.severity {
            Severity::Critical => security_critical!(
                code,
                origin = report.origin,
                "{}",
                report.message
            ),
            Severity::High => admin_error!(code, origin = report.origin, "{}", report.message),
            Severity::Medium => admin_warn!(code, origin = report.origin, "{}", report.message),
        }
    }
}

/// Keeps every report it is given, in order.
#[derive(Debug, Default)]
pub struct MemorySink {
    reports: Mutex<Vec<DiagnosticReport>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<DiagnosticReport>> {
        // A panic while holding the lock can't leave a Vec half pushed.
        self.reports
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn reports(&self) -> Vec<DiagnosticReport> {
        self.lock().clone()
    }

    pub fn take(&self) -> Vec<DiagnosticReport> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.lock()
            .iter()
            .filter(|report| report.severity == severity)
            .count()
    }
}

impl DiagnosticSink for MemorySink {
    fn report(&self, report: DiagnosticReport) {
        self.lock().push(report);
    }
}

/// Sends each report to two sinks. Used by tools that want the log entry and a
/// summary at the end.
pub struct TeeSink<'a> {
    first: &'a dyn DiagnosticSink,
    second: &'a dyn DiagnosticSink,
}

impl<'a> TeeSink<'a> {
    pub fn new(first: &'a dyn DiagnosticSink, second: &'a dyn DiagnosticSink) -> Self {
        TeeSink { first, second }
    }
}

impl DiagnosticSink for TeeSink<'_> {
    fn report(&self, report: DiagnosticReport) {
        self.first.report(report.clone());
        self.second.report(report);
    }
}
