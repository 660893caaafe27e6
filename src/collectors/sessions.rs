use crate::collectors::catalog::QueryName;
use crate::collectors::error::Result;
use crate::collectors::family::{self, MetricFamily};
use crate::collectors::{Collector, Scrape};
use futures::future::BoxFuture;
use tracing::instrument;

/// Host label for sessions attached over shared memory, which report none.
pub const SHARED_MEMORY_HOST: &str = "SHMEM";

/// Session counts per client host and user.
#[derive(Clone, Default)]
pub struct SessionsCollector;

impl SessionsCollector {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Collector for SessionsCollector {
    fn name(&self) -> &'static str {
        "sessions"
    }

    #[instrument(skip(self, scrape), level = "info", err, fields(collector = "sessions", otel.kind = "internal"))]
    fn collect<'a, 's: 'a>(
        &'a self,
        scrape: &'a mut Scrape<'s>,
    ) -> BoxFuture<'a, Result<Vec<MetricFamily>>> {
        Box::pin(async move {
            let server = scrape.identity.dbhostname();
            let rows = scrape.session.execute(QueryName::Sessions).await?;

            // empty and NULL hosts group apart but share the SHMEM label
            let mut counts: Vec<((String, String), f64)> = Vec::with_capacity(rows.len());
            for row in &rows {
                let mut host = row.text("host");
                if host.is_empty() {
                    host = SHARED_MEMORY_HOST.to_string();
                }
                let key = (host, row.text("user"));
                let count = family::number(row, QueryName::Sessions, "count")?;

                match counts.iter_mut().find(|(k, _)| *k == key) {
                    Some((_, total)) => *total += count,
                    None => counts.push((key, count)),
                }
            }

            let mut sessions =
                MetricFamily::gauge("sessions", "Informix sessions", &["host", "user"]);
            for ((host, user), count) in &counts {
                sessions.add([server, host.as_str(), user.as_str()], *count);
            }

            Ok(vec![sessions])
        })
    }
}
