use crate::collectors::catalog::QueryName;
use crate::collectors::error::Result;
use crate::collectors::family::{self, MetricFamily};
use crate::collectors::{Collector, Scrape};
use futures::future::BoxFuture;
use std::collections::HashSet;
use tracing::{instrument, warn};

/// `sysprofile` counters, one family per profile name.
#[derive(Clone, Default)]
pub struct SysprofileCollector;

impl SysprofileCollector {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Collector for SysprofileCollector {
    fn name(&self) -> &'static str {
        "sysprofile"
    }

    #[instrument(skip(self, scrape), level = "info", err, fields(collector = "sysprofile", otel.kind = "internal"))]
    fn collect<'a, 's: 'a>(
        &'a self,
        scrape: &'a mut Scrape<'s>,
    ) -> BoxFuture<'a, Result<Vec<MetricFamily>>> {
        Box::pin(async move {
            let server = scrape.identity.dbhostname();
            let rows = scrape.session.execute(QueryName::Sysprofile).await?;

            let mut seen = HashSet::new();
            let mut families = Vec::with_capacity(rows.len());
            for row in &rows {
                let name = row.text("name");
                let fragment = family::sanitize(&name);
                if fragment.is_empty() || !seen.insert(fragment.clone()) {
                    warn!(profile = %name, "skipping unnamed or duplicate sysprofile entry");
                    continue;
                }

                let mut counter = MetricFamily::counter(
                    &format!("sysprofile_{fragment}"),
                    format!("Sysprofile value for {}", name.trim()),
                    &[],
                );
                counter.add([server], family::number(row, QueryName::Sysprofile, "value")?);
                families.push(counter);
            }

            Ok(families)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::fake::{FakeConnector, run};
    use crate::collectors::row::{Row, Value};

    fn profile(name: &str, value: i64) -> Row {
        [("name", Value::from(name)), ("value", Value::Int(value))]
            .into_iter()
            .collect()
    }

    #[tokio::test]
    async fn test_one_family_per_profile_name() {
        let fake = FakeConnector::new();
        fake.respond(
            QueryName::Sysprofile,
            vec![
                profile("dskreads", 10),
                profile("bufreads", 20),
                profile("lockreqs", 5),
            ],
        );

        let families = run(&SysprofileCollector::new(), &fake).await.unwrap_or_default();
        let names: Vec<&str> = families.iter().map(MetricFamily::name).collect();
        assert_eq!(
            names,
            [
                "node_ifx_sysprofile_dskreads_total",
                "node_ifx_sysprofile_bufreads_total",
                "node_ifx_sysprofile_lockreqs_total"
            ]
        );
        assert!(families.iter().all(|f| f.samples().len() == 1));
    }

    #[tokio::test]
    async fn test_names_are_sanitized_and_deduplicated() {
        let fake = FakeConnector::new();
        fake.respond(
            QueryName::Sysprofile,
            vec![profile("ovlock ", 1), profile("ovlock", 2), profile("", 3)],
        );

        let families = run(&SysprofileCollector::new(), &fake).await.unwrap_or_default();
        assert_eq!(families.len(), 1);
        assert!(families
            .iter()
            .all(|f| f.name() == "node_ifx_sysprofile_ovlock_total"));
    }
}
