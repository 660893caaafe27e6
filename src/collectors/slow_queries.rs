use crate::collectors::catalog::QueryName;
use crate::collectors::error::Result;
use crate::collectors::family::{self, MetricFamily};
use crate::collectors::{Collector, Scrape};
use futures::future::BoxFuture;
use tracing::instrument;

/// Network sessions whose last write trails the last read by over a second.
#[derive(Clone, Default)]
pub struct SlowQueriesCollector;

impl SlowQueriesCollector {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Collector for SlowQueriesCollector {
    fn name(&self) -> &'static str {
        "slow_queries"
    }

    #[instrument(skip(self, scrape), level = "info", err, fields(collector = "slow_queries", otel.kind = "internal"))]
    fn collect<'a, 's: 'a>(
        &'a self,
        scrape: &'a mut Scrape<'s>,
    ) -> BoxFuture<'a, Result<Vec<MetricFamily>>> {
        Box::pin(async move {
            let server = scrape.identity.dbhostname();
            let rows = scrape.session.execute(QueryName::SlowQueries).await?;
            family::single(
                MetricFamily::gauge("slowquery", "Informix slow queries", &[]),
                &rows,
                QueryName::SlowQueries,
                "slow_queries",
                server,
            )
        })
    }
}
