use thiserror::Error;

use crate::transport::TransportError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_yaml::Error),
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// A one-shot command failed; carries the message the matching view shows.
    #[error("{message} ({source})")]
    Request {
        message: &'static str,
        #[source]
        source: TransportError,
    },
    #[error("could not set up logging: {0}")]
    Logging(String),
}
