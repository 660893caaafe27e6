use crate::collectors::catalog::QueryName;
use crate::collectors::error::Result;
use crate::collectors::family::{self, MetricFamily};
use crate::collectors::{Collector, Scrape};
use futures::future::BoxFuture;
use tracing::instrument;

/// Allocated and free bytes per dbspace.
#[derive(Clone, Default)]
pub struct DbspacesCollector;

impl DbspacesCollector {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Collector for DbspacesCollector {
    fn name(&self) -> &'static str {
        "dbspaces"
    }

    #[instrument(skip(self, scrape), level = "info", err, fields(collector = "dbspaces", otel.kind = "internal"))]
    fn collect<'a, 's: 'a>(
        &'a self,
        scrape: &'a mut Scrape<'s>,
    ) -> BoxFuture<'a, Result<Vec<MetricFamily>>> {
        Box::pin(async move {
            let server = scrape.identity.dbhostname();
            let rows = scrape.session.execute(QueryName::DbspaceSizes).await?;

            let mut free = MetricFamily::gauge(
                "dbspaces_free_size",
                "Free space in dbspaces in bytes",
                &["dbspace"],
            );
            let mut size =
                MetricFamily::gauge("dbspaces_size", "Size of dbspaces in bytes", &["dbspace"]);

            for row in &rows {
                let name = row.text("name");
                free.add(
                    [server, name.as_str()],
                    family::number(row, QueryName::DbspaceSizes, "free")?,
                );
                size.add(
                    [server, name.as_str()],
                    family::number(row, QueryName::DbspaceSizes, "size")?,
                );
            }

            Ok(vec![free, size])
        })
    }
}
