use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::error::Error;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// One-shot commands log to stderr so stdout stays clean for results.
pub fn init_stderr() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| Error::Logging(err.to_string()))
}

/// Appends plain-text log lines to `path`. Used while the terminal is taken
/// over by the interactive shell.
pub fn init_file(path: &Path) -> Result<(), Error> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|err| Error::Logging(err.to_string()))
}
