//! Database session ownership and the bounded reconnect state machine.

use crate::collectors::catalog::{self, QueryName, ServerVersion};
use crate::collectors::error::Result;
use crate::collectors::row::Row;
use futures::future::BoxFuture;
use tracing::{debug, error, info, info_span, instrument, warn};
use tracing_futures::Instrument as _;

/// An open database session.
pub trait Session: Send + Sync {
    fn query<'a>(&'a mut self, sql: &'a str) -> BoxFuture<'a, Result<Vec<Row>>>;
}

/// Opens sessions against one server.
pub trait Connector: Send + Sync {
    /// Server name used in logs and errors.
    fn server(&self) -> &str;

    fn connect(&self) -> BoxFuture<'_, Result<Box<dyn Session>>>;
}

enum State {
    Disconnected,
    Connected(Box<dyn Session>),
    /// The live session failed once; the next step is a single reconnect.
    RetryPending,
}

/// Owns the session across scrapes and dispatches catalog queries through it.
pub struct ConnectionManager {
    connector: Box<dyn Connector>,
    state: State,
    version: ServerVersion,
    degraded: bool,
}

impl ConnectionManager {
    #[must_use]
    pub fn new(connector: Box<dyn Connector>, version: ServerVersion) -> Self {
        Self {
            connector,
            state: State::Disconnected,
            version,
            degraded: false,
        }
    }

    #[must_use]
    pub const fn version(&self) -> ServerVersion {
        self.version
    }

    /// Switch catalog dispatch for the remainder of the process.
    pub fn adopt_version(&mut self, version: ServerVersion) {
        if version != self.version {
            warn!(
                configured = %self.version,
                probed = %version,
                "server reports a different major version, switching query catalog"
            );
            self.version = version;
        }
    }

    #[must_use]
    pub const fn is_connected(&self) -> bool {
        matches!(self.state, State::Connected(_))
    }

    /// True once a query in the current scrape could not be served even after
    /// the reconnect.
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub const fn begin_scrape(&mut self) {
        self.degraded = false;
    }

    #[must_use]
    pub fn server(&self) -> &str {
        self.connector.server()
    }

    /// Open a new session, dropping any current one.
    ///
    /// # Errors
    ///
    /// Returns `Error::Connection` and stays disconnected when the server
    /// cannot be reached.
    #[instrument(skip(self), level = "info", err, fields(db.system = "informix", server = %self.connector.server()))]
    pub async fn connect(&mut self) -> Result<()> {
        self.disconnect();
        let session = self.connector.connect().await?;
        info!(server = %self.connector.server(), "connected");
        self.state = State::Connected(session);
        Ok(())
    }

    /// Release the session. Safe to call when already disconnected.
    pub fn disconnect(&mut self) {
        if let State::Connected(session) = std::mem::replace(&mut self.state, State::Disconnected)
        {
            drop(session);
            debug!(server = %self.connector.server(), "disconnected");
        }
    }

    /// Run the catalog query `name` for the active version.
    ///
    /// A driver failure is retried exactly once on a fresh session. If that
    /// also fails the scrape is flagged degraded and an empty row set is
    /// returned; later calls in the same degraded scrape do not reconnect
    /// again.
    ///
    /// # Errors
    ///
    /// Only catalog errors are returned; driver failures are absorbed.
    pub async fn execute(&mut self, name: QueryName) -> Result<Vec<Row>> {
        let sql = catalog::lookup(self.version, name)?;
        let mut retried = false;

        loop {
            match std::mem::replace(&mut self.state, State::Disconnected) {
                State::Connected(mut session) => {
                    let span = info_span!(
                        "db.query",
                        db.system = "informix",
                        db.operation = "SELECT",
                        db.statement = %name,
                        otel.kind = "client"
                    );

                    match session.query(sql).instrument(span).await {
                        Ok(rows) => {
                            self.state = State::Connected(session);
                            return Ok(rows);
                        }
                        Err(e) if !e.is_driver() => {
                            self.state = State::Connected(session);
                            return Err(e);
                        }
                        Err(e) if retried => {
                            error!(query = %name, error = %e, "query failed after reconnect");
                            drop(session);
                            self.degraded = true;
                            return Ok(Vec::new());
                        }
                        Err(e) => {
                            warn!(query = %name, error = %e, "query failed, reconnecting");
                            drop(session);
                            self.state = State::RetryPending;
                        }
                    }
                }
                State::RetryPending => {
                    retried = true;
                    if let Err(e) = self.connect().await {
                        error!(query = %name, error = %e, "reconnect failed");
                        self.degraded = true;
                        return Ok(Vec::new());
                    }
                }
                State::Disconnected => {
                    if retried || self.degraded {
                        self.degraded = true;
                        return Ok(Vec::new());
                    }
                    self.state = State::RetryPending;
                }
            }
        }
    }
}
