use crate::collectors::catalog::QueryName;
use crate::collectors::error::Result;
use crate::collectors::family::{self, MetricFamily};
use crate::collectors::{Collector, Scrape};
use futures::future::BoxFuture;
use tracing::instrument;

const COUNTERS: [&str; 15] = [
    "dskreads",
    "pagreads",
    "bufreads",
    "dskwrites",
    "pagwrites",
    "bufwrites",
    "bufwaits",
    "ovbuff",
    "flushes",
    "fgwrites",
    "lruwrites",
    "chunkwrites",
    "lru_time_total",
    "lru_calls",
    "buffer_turnovers",
];

/// Buffer pool activity per page size.
#[derive(Clone, Default)]
pub struct BuffersCollector;

impl BuffersCollector {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Collector for BuffersCollector {
    fn name(&self) -> &'static str {
        "buffers"
    }

    #[instrument(skip(self, scrape), level = "info", err, fields(collector = "buffers", otel.kind = "internal"))]
    fn collect<'a, 's: 'a>(
        &'a self,
        scrape: &'a mut Scrape<'s>,
    ) -> BoxFuture<'a, Result<Vec<MetricFamily>>> {
        Box::pin(async move {
            let server = scrape.identity.dbhostname();
            let rows = scrape.session.execute(QueryName::Buffers).await?;

            let mut counters: Vec<MetricFamily> = COUNTERS
                .iter()
                .map(|key| {
                    MetricFamily::counter(
                        &format!("bufferpool_{key}"),
                        format!("Buffer pool value for {key}"),
                        &["pagesize"],
                    )
                })
                .collect();
            let mut size =
                MetricFamily::gauge("bufferpool_size", "Buffer pool value for size", &["pagesize"]);

            for row in &rows {
                let pagesize = row.text("pagesize");
                for (key, counter) in COUNTERS.into_iter().zip(counters.iter_mut()) {
                    counter.add(
                        [server, pagesize.as_str()],
                        family::number(row, QueryName::Buffers, key)?,
                    );
                }
                size.add(
                    [server, pagesize.as_str()],
                    family::number(row, QueryName::Buffers, "size")?,
                );
            }

            counters.push(size);
            Ok(counters)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::fake::{FakeConnector, run};
    use crate::collectors::row::{Row, Value};

    fn pool(pagesize: i64) -> Row {
        std::iter::once(("pagesize", Value::Int(pagesize)))
            .chain(std::iter::once(("size", Value::Int(pagesize * 1000))))
            .chain(COUNTERS.iter().map(|c| (*c, Value::Int(5))))
            .collect()
    }

    #[tokio::test]
    async fn test_bufferpool_families() {
        let fake = FakeConnector::new();
        fake.respond(QueryName::Buffers, vec![pool(2048), pool(4096)]);

        let families = run(&BuffersCollector::new(), &fake).await.unwrap_or_default();
        assert_eq!(families.len(), COUNTERS.len() + 1);
        assert!(families.iter().all(|f| f.samples().len() == 2));
        assert!(
            families
                .iter()
                .any(|f| f.name() == "node_ifx_bufferpool_dskreads_total")
        );
        assert!(
            families
                .iter()
                .any(|f| f.name() == "node_ifx_bufferpool_size"
                    && f.samples().iter().any(|s| s.labels == ["ol_test", "4096"]))
        );
    }
}
