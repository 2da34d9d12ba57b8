//! Logging bring-up: an `EnvFilter` seeded from `--log-level`, plus an
//! optional rolling file appender under the configured datadir.

use std::path::Path;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn init_tracing(level: Level, datadir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let stdout_layer = fmt::layer().with_target(matches!(level, Level::DEBUG | Level::TRACE));

    let (file_layer, guard) = match datadir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "tinymushd.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(non_blocking)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    guard
}
