#![deny(warnings)]
#![warn(unused_extern_crates)]
use std::fmt;
use std::str::FromStr;

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::Deserialize;
use tracing_forest::printer::TestCapturePrinter;
use tracing_forest::tag::NoTag;
use tracing_forest::{ForestLayer, Tag};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::prelude::*;

pub mod macros;
pub mod pipeline;

pub use {tracing, tracing_forest, tracing_subscriber};

pub use pipeline::init_logging;

/// Start up the logging for test mode.
pub fn test_init() {
    let filter = EnvFilter::from_default_env().add_directive(LevelFilter::TRACE.into());

    // start the logging!
    let _ = tracing_subscriber::Registry::default()
        .with(ForestLayer::new(TestCapturePrinter::new(), NoTag).with_filter(filter))
        .try_init();
}

/// Tag events by the `event_tag_id` field that the tagged macros attach.
pub fn event_tagger(event: &tracing::Event) -> Option<Tag> {
    let mut visitor = EventTagVisitor(None);
    event.record(&mut visitor);
    let tag = visitor.0?;

    Some(
        Tag::builder()
            .icon(tag.icon())
            .prefix(tag.prefix())
            .suffix(tag.suffix())
            .build(),
    )
}

struct EventTagVisitor(Option<EventTag>);

impl tracing::field::Visit for EventTagVisitor {
    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        if field.name() == "event_tag_id" {
            self.0 = EventTag::try_from(value).ok();
        }
    }

    fn record_debug(&mut self, _field: &tracing::field::Field, _value: &dyn fmt::Debug) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u64)]
pub enum EventTag {
    AdminDebug,
    AdminError,
    AdminWarn,
    AdminInfo,
    SecurityCritical,
    SecurityDebug,
    SecurityInfo,
    SecurityError,
}

impl EventTag {
    fn prefix(self) -> &'static str {
        match self {
            EventTag::AdminDebug
            | EventTag::AdminError
            | EventTag::AdminWarn
            | EventTag::AdminInfo => "admin",
            EventTag::SecurityCritical
            | EventTag::SecurityDebug
            | EventTag::SecurityInfo
            | EventTag::SecurityError => "security",
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            EventTag::AdminDebug | EventTag::SecurityDebug => "debug",
            EventTag::AdminError | EventTag::SecurityError => "error",
            EventTag::AdminWarn => "warn",
            EventTag::AdminInfo | EventTag::SecurityInfo => "info",
            EventTag::SecurityCritical => "critical",
        }
    }

    fn icon(self) -> char {
        match self {
            EventTag::AdminDebug | EventTag::SecurityDebug => '🐛',
            EventTag::AdminError | EventTag::SecurityError => '🚨',
            EventTag::AdminWarn => '🚧',
            EventTag::AdminInfo | EventTag::SecurityInfo => '💬',
            EventTag::SecurityCritical => '🔐',
        }
    }
}

#[derive(Clone, Copy, Deserialize, Debug, Default, PartialEq, Eq)]
pub enum LogLevel {
    #[default]
    #[serde(rename = "info")]
    Info,
    #[serde(rename = "debug")]
    Debug,
    #[serde(rename = "trace")]
    Trace,
}

impl FromStr for LogLevel {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err("Must be one of info, debug, trace"),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        })
    }
}

impl From<LogLevel> for EnvFilter {
    fn from(value: LogLevel) -> Self {
        EnvFilter::new(value.to_string())
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parse() {
        assert_eq!(LogLevel::from_str("debug"), Ok(LogLevel::Debug));
        assert_eq!(LogLevel::from_str("trace"), Ok(LogLevel::Trace));
        assert!(LogLevel::from_str("loud").is_err());
        assert_eq!(LogLevel::default().to_string(), "info");
    }

    #[test]
    fn test_event_tag_ids_are_stable() {
        let id: u64 = EventTag::SecurityCritical.into();
        assert_eq!(EventTag::try_from(id).ok(), Some(EventTag::SecurityCritical));
        assert_eq!(EventTag::AdminWarn.prefix(), "admin");
        assert_eq!(EventTag::SecurityCritical.suffix(), "critical");
    }
}
