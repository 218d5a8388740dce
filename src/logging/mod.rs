use crate::logging::format::Formatter;
use std::io::IsTerminal;
use tracing::Level;
use tracing_subscriber::Layer;
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

mod format;

/// Installs the global subscriber: crate events at `level`, everything else
/// at `WARN`.
pub fn registry_logs(level: Level) -> anyhow::Result<()> {
    let use_colors = std::io::stdout().is_terminal();
    let crate_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .event_format(Formatter::new(use_colors))
        .with_filter(filter::filter_fn(move |metadata| {
            metadata.target().starts_with("doorstep") && metadata.level() <= &level
        }));
    let dependency_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .event_format(Formatter::new(use_colors))
        .with_filter(filter::filter_fn(|metadata| {
            !metadata.target().starts_with("doorstep") && metadata.level() <= &Level::WARN
        }));
    tracing_subscriber::registry()
        .with(crate_layer)
        .with(dependency_layer)
        .with(tracing_error::ErrorLayer::default())
        .try_init()?;
    Ok(())
}
