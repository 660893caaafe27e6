use crate::collectors::catalog::QueryName;
use crate::collectors::error::Result;
use crate::collectors::family::{self, MetricFamily};
use crate::collectors::{Collector, Scrape};
use futures::future::BoxFuture;
use std::collections::HashSet;
use tracing::{instrument, warn};

const METRICS: [&str; 8] = [
    "usecs_user",
    "usecs_sys",
    "readyqueue",
    "num_ready",
    "idle",
    "semops",
    "busy_waits",
    "spins",
];

/// CPU and queue counters per virtual processor class.
#[derive(Clone, Default)]
pub struct VpuClassCollector;

impl VpuClassCollector {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Collector for VpuClassCollector {
    fn name(&self) -> &'static str {
        "vpu_class"
    }

    #[instrument(skip(self, scrape), level = "info", err, fields(collector = "vpu_class", otel.kind = "internal"))]
    fn collect<'a, 's: 'a>(
        &'a self,
        scrape: &'a mut Scrape<'s>,
    ) -> BoxFuture<'a, Result<Vec<MetricFamily>>> {
        Box::pin(async move {
            let server = scrape.identity.dbhostname();
            let rows = scrape.session.execute(QueryName::VpuClass).await?;

            let mut seen = HashSet::new();
            let mut families = Vec::with_capacity(rows.len());
            for row in &rows {
                let class = row.text("classname");
                let fragment = family::sanitize(&class);
                if fragment.is_empty() || !seen.insert(fragment.clone()) {
                    warn!(class = %class, "skipping unnamed or duplicate VP class");
                    continue;
                }

                let mut counter = MetricFamily::counter(
                    &format!("vpu_class_{fragment}"),
                    format!("VPU info value for class {}", class.trim()),
                    &["class", "metric"],
                );
                for metric in METRICS {
                    counter.add(
                        [server, class.as_str(), metric],
                        family::number(row, QueryName::VpuClass, metric)?,
                    );
                }
                families.push(counter);
            }

            Ok(families)
        })
    }
}
