use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config;
use crate::constants::constants;

/// Install the global subscriber.
///
/// Filter comes from `PODCAT_LOG`, falling back to the built-in default (or `podcat=debug` when `verbose`).
/// Output goes to a daily rolling file in the data directory, or to stderr when there is none. Keep the returned
/// guard alive for the life of the process so buffered lines are flushed.
pub fn init(verbose: bool) -> Option<WorkerGuard> {
  let fallback = if verbose { "podcat=debug".to_string() } else { constants().default_log_filter.clone() };
  let filter = EnvFilter::try_from_env("PODCAT_LOG").unwrap_or_else(|_| EnvFilter::new(fallback));

  if let Some(dir) = config::log_dir()
    && std::fs::create_dir_all(&dir).is_ok()
  {
    let appender = tracing_appender::rolling::daily(dir, &constants().log_file_prefix);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let layer = tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false);
    if tracing_subscriber::registry().with(filter).with(layer).try_init().is_ok() {
      return Some(guard);
    }
    return None;
  }

  let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
  let _ = tracing_subscriber::registry().with(filter).with(layer).try_init();
  None
}
