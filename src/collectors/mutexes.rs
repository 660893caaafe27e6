use crate::collectors::catalog::QueryName;
use crate::collectors::error::Result;
use crate::collectors::family::{self, MetricFamily};
use crate::collectors::{Collector, Scrape};
use futures::future::BoxFuture;
use tracing::instrument;

/// Mutexes currently held.
#[derive(Clone, Default)]
pub struct MutexesCollector;

impl MutexesCollector {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Collector for MutexesCollector {
    fn name(&self) -> &'static str {
        "mutexes"
    }

    #[instrument(skip(self, scrape), level = "info", err, fields(collector = "mutexes", otel.kind = "internal"))]
    fn collect<'a, 's: 'a>(
        &'a self,
        scrape: &'a mut Scrape<'s>,
    ) -> BoxFuture<'a, Result<Vec<MetricFamily>>> {
        Box::pin(async move {
            let server = scrape.identity.dbhostname();
            let rows = scrape.session.execute(QueryName::Mutexes).await?;
            family::single(
                MetricFamily::gauge("mutex", "Informix mutex count", &[]),
                &rows,
                QueryName::Mutexes,
                "mutex_count",
                server,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::fake::{FakeConnector, run};
    use crate::collectors::row::Value;

    #[tokio::test]
    #[allow(clippy::indexing_slicing)]
    async fn test_mutex_count() {
        let fake = FakeConnector::new();
        fake.respond(
            QueryName::Mutexes,
            vec![[("mutex_count", Value::Int(3))].into_iter().collect()],
        );

        let families = run(&MutexesCollector::new(), &fake).await.unwrap_or_default();
        assert_eq!(families.len(), 1);
        assert_eq!(families[0].name(), "node_ifx_mutex");
        assert!((families[0].samples()[0].value - 3.0).abs() < f64::EPSILON);
    }
}
