use crate::collectors::catalog::QueryName;
use crate::collectors::error::Result;
use crate::collectors::family::{self, MetricFamily};
use crate::collectors::{Collector, Scrape};
use futures::future::BoxFuture;
use tracing::instrument;

/// Number of onconfig parameters changed since startup.
#[derive(Clone, Default)]
pub struct ConfigChangesCollector;

impl ConfigChangesCollector {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Collector for ConfigChangesCollector {
    fn name(&self) -> &'static str {
        "config_changes"
    }

    #[instrument(skip(self, scrape), level = "info", err, fields(collector = "config_changes", otel.kind = "internal"))]
    fn collect<'a, 's: 'a>(
        &'a self,
        scrape: &'a mut Scrape<'s>,
    ) -> BoxFuture<'a, Result<Vec<MetricFamily>>> {
        Box::pin(async move {
            let server = scrape.identity.dbhostname();
            let rows = scrape.session.execute(QueryName::ConfigChanges).await?;
            family::single(
                MetricFamily::gauge(
                    "config_changes",
                    "The number of config changes since startup",
                    &[],
                ),
                &rows,
                QueryName::ConfigChanges,
                "count",
                server,
            )
        })
    }
}
