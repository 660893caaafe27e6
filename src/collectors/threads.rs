use crate::collectors::catalog::QueryName;
use crate::collectors::codes::ThreadState;
use crate::collectors::error::Result;
use crate::collectors::family::{self, MetricFamily};
use crate::collectors::{Collector, Scrape};
use futures::future::BoxFuture;
use tracing::instrument;

/// Thread counts per VP class and state.
#[derive(Clone, Default)]
pub struct ThreadsCollector;

impl ThreadsCollector {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Collector for ThreadsCollector {
    fn name(&self) -> &'static str {
        "threads"
    }

    #[instrument(skip(self, scrape), level = "info", err, fields(collector = "threads", otel.kind = "internal"))]
    fn collect<'a, 's: 'a>(
        &'a self,
        scrape: &'a mut Scrape<'s>,
    ) -> BoxFuture<'a, Result<Vec<MetricFamily>>> {
        Box::pin(async move {
            let server = scrape.identity.dbhostname();
            let rows = scrape.session.execute(QueryName::Threads).await?;

            let mut states = MetricFamily::gauge(
                "thread_state",
                "Thread states of Informix threads",
                &["class", "state"],
            );
            for row in &rows {
                let state =
                    ThreadState::try_from(family::code(row, QueryName::Threads, "threadstate")?)?;
                states.add(
                    [server, row.text("classname").as_str(), state.label()],
                    family::number(row, QueryName::Threads, "count")?,
                );
            }

            Ok(vec![states])
        })
    }
}
