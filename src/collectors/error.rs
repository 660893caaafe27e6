use crate::collectors::catalog::{QueryName, ServerVersion};
use thiserror::Error;

/// Errors raised by the collection core.
///
/// `Connection` and `Driver` are absorbed by the connection manager and turned
/// into a degraded scrape. Everything else is a code/schema mismatch and is
/// propagated to the caller.
#[derive(Error, Debug)]
pub enum Error {
    #[error("unsupported Informix version {0}, expected one of 11, 12, 14")]
    UnsupportedVersion(i64),

    #[error("query {name} not in catalog for version {version}")]
    UnknownQuery {
        version: ServerVersion,
        name: QueryName,
    },

    #[error("could not connect to {server}: {message}")]
    Connection { server: String, message: String },

    #[error("driver error: {0}")]
    Driver(String),

    #[error("unmapped {kind} code {code}")]
    Mapping { kind: &'static str, code: i64 },

    #[error("no license memory ceiling for version {major} edition {edition:?}")]
    UnknownEdition { major: i64, edition: String },

    #[error("column {column} missing or not numeric in {query} result")]
    Column { query: QueryName, column: &'static str },
}

impl Error {
    /// Driver-level failures are the only ones the connection manager retries.
    #[must_use]
    pub const fn is_driver(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Driver(_))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
