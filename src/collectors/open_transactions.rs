use crate::collectors::catalog::QueryName;
use crate::collectors::error::Result;
use crate::collectors::family::{self, MetricFamily};
use crate::collectors::{Collector, Scrape};
use futures::future::BoxFuture;
use tracing::instrument;

#[derive(Clone, Default)]
pub struct OpenTransactionsCollector;

impl OpenTransactionsCollector {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Collector for OpenTransactionsCollector {
    fn name(&self) -> &'static str {
        "open_transactions"
    }

    #[instrument(skip(self, scrape), level = "info", err, fields(collector = "open_transactions", otel.kind = "internal"))]
    fn collect<'a, 's: 'a>(
        &'a self,
        scrape: &'a mut Scrape<'s>,
    ) -> BoxFuture<'a, Result<Vec<MetricFamily>>> {
        Box::pin(async move {
            let server = scrape.identity.dbhostname();
            let rows = scrape.session.execute(QueryName::OpenTransactions).await?;
            family::single(
                MetricFamily::gauge("open_transactions", "Informix transaction info", &[]),
                &rows,
                QueryName::OpenTransactions,
                "open_transactions",
                server,
            )
        })
    }
}
