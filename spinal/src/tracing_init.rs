use std::fs::OpenOptions;
use std::path::PathBuf;

use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::prelude::*;

use crate::settings::SpinalSettings;

/// Install the global subscriber. Stdout is never written to: it carries the
/// hook response.
pub fn init_tracing(verbose: bool) {
    // Log path: SPINAL_LOG env var > ~/.spinal/spinal.log > stderr fallback.
    let log_path = std::env::var("SPINAL_LOG")
        .ok()
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .or_else(|| SpinalSettings::settings_dir().map(|d| d.join("spinal.log")));

    let log_file = log_path.and_then(|path| {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok()?;
        }
        OpenOptions::new().create(true).append(true).open(&path).ok()
    });

    let file_level = if verbose { Level::TRACE } else { Level::DEBUG };
    let layer: Box<dyn Layer<_> + Send + Sync> = match log_file {
        Some(file) => tracing_subscriber::fmt::layer()
            .with_writer(file)
            .pretty()
            .with_ansi(false)
            .with_filter(LevelFilter::from_level(file_level))
            .boxed(),
        None => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .with_target(false)
            .with_filter(LevelFilter::from_level(if verbose {
                Level::DEBUG
            } else {
                Level::INFO
            }))
            .boxed(),
    };

    // A second init (tests, embedding) is not an error worth surfacing.
    let _ = tracing_subscriber::registry().with(layer).try_init();
}
