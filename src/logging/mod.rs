//! Structured logging through `tracing`, filtered by `RUST_LOG`.


use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, fmt};

use crate::errors::{Error, Result};

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "warn";

/// Install the global subscriber writing to stderr.
pub fn init() -> Result<()> {
    init_with_writer(std::io::stderr)
}

pub fn init_with_writer<W>(writer: W) -> Result<()>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    init_with_filter(filter, writer)
}

pub fn init_with_filter<W>(filter: EnvFilter, writer: W) -> Result<()>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    tracing::subscriber::set_global_default(subscriber(filter, writer))
        .map_err(|e| Error::Logging(e.to_string()))
}

/// A fmt subscriber without touching global state.
pub fn subscriber<W>(filter: EnvFilter, writer: W) -> impl Subscriber + Send + Sync
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(false)
        .finish()
}
