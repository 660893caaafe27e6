use crate::collectors::catalog::QueryName;
use crate::collectors::codes::ServerMode;
use crate::collectors::error::Result;
use crate::collectors::family::{self, MetricFamily};
use crate::collectors::{Collector, Scrape};
use futures::future::BoxFuture;
use tracing::instrument;

/// Uptime and operating mode from `sysshmvals`.
#[derive(Clone, Default)]
pub struct UptimeCollector;

impl UptimeCollector {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Collector for UptimeCollector {
    fn name(&self) -> &'static str {
        "uptime"
    }

    #[instrument(skip(self, scrape), level = "info", err, fields(collector = "uptime", otel.kind = "internal"))]
    fn collect<'a, 's: 'a>(
        &'a self,
        scrape: &'a mut Scrape<'s>,
    ) -> BoxFuture<'a, Result<Vec<MetricFamily>>> {
        Box::pin(async move {
            let server = scrape.identity.dbhostname();
            let rows = scrape.session.execute(QueryName::UptimeMode).await?;
            let Some(row) = rows.first() else {
                return Ok(Vec::new());
            };

            let mut uptime = MetricFamily::gauge("uptime", "Uptime reported by informix", &[]);
            uptime.add(
                [server],
                family::number(row, QueryName::UptimeMode, "online")?,
            );

            let code = family::code(row, QueryName::UptimeMode, "mode")?;
            let mode = ServerMode::try_from(code)?;
            let mut current = MetricFamily::gauge("mode", "Informix current mode", &["mode"]);
            current.add(
                [server, mode.label()],
                family::number(row, QueryName::UptimeMode, "mode")?,
            );

            Ok(vec![uptime, current])
        })
    }
}
