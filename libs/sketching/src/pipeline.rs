use tracing_forest::printer::Printer;
use tracing_forest::ForestLayer;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{prelude::*, EnvFilter, Registry};

/// Install the process wide log pipeline for a binary. Output goes to stderr so
/// that stdout stays free for command results.
pub fn init_logging(log_filter: crate::LogLevel) -> Result<(), String> {
    let logging_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from(log_filter).into())
        .from_env()
        .map_err(|err| format!("Failed to create logging filter: {}", err))?;

    Registry::default()
        .with(
            ForestLayer::new(Printer::new().writer(std::io::stderr), crate::event_tagger)
                .with_filter(logging_filter),
        )
        .try_init()
        .map_err(|err| format!("Failed to start logging pipeline: {}", err))
}
