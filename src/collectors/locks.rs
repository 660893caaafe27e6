use crate::collectors::catalog::QueryName;
use crate::collectors::error::Result;
use crate::collectors::family::{self, MetricFamily};
use crate::collectors::{Collector, Scrape};
use futures::future::BoxFuture;
use tracing::{debug, instrument};

/// User reported when nobody holds a lock.
pub const DEFAULT_USER: &str = "informix";

/// Locks held per user.
#[derive(Clone, Default)]
pub struct LocksCollector;

impl LocksCollector {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Collector for LocksCollector {
    fn name(&self) -> &'static str {
        "locks"
    }

    #[instrument(skip(self, scrape), level = "info", err, fields(collector = "locks", otel.kind = "internal"))]
    fn collect<'a, 's: 'a>(
        &'a self,
        scrape: &'a mut Scrape<'s>,
    ) -> BoxFuture<'a, Result<Vec<MetricFamily>>> {
        Box::pin(async move {
            let server = scrape.identity.dbhostname();
            let rows = scrape.session.execute(QueryName::LocksPerUser).await?;

            let mut locks = MetricFamily::gauge("locks_user_db", "Locks per user", &["user"]);
            for row in &rows {
                locks.add(
                    [server, row.text("username").as_str()],
                    family::number(row, QueryName::LocksPerUser, "locks")?,
                );
            }

            // empty rows from a lost session are not "no locks"
            if locks.is_empty() && !scrape.session.is_degraded() {
                debug!("no lock holders, reporting zero default");
                locks.add([server, DEFAULT_USER], 0.0);
            }

            Ok(vec![locks])
        })
    }
}
