//! One scrape: connect if needed, resolve identity, run the battery.

use crate::collectors::catalog::{self, ServerVersion};
use crate::collectors::config::CollectorConfig;
use crate::collectors::error::Result;
use crate::collectors::exporter::ScraperCollector;
use crate::collectors::family::MetricFamily;
use crate::collectors::identity::Identity;
use crate::collectors::session::{ConnectionManager, Connector};
use crate::collectors::{Collector, CollectorType, Scrape};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, info_span, instrument, warn};
use tracing_futures::Instrument as _;

#[derive(Clone, Debug, Default)]
pub struct EngineSettings {
    /// Configured major release; corrected by the license probe.
    pub server_version: i64,
    pub dbhostname: Option<String>,
    pub ha_alias: Option<String>,
}

pub struct CollectionEngine {
    session: ConnectionManager,
    identity: Identity,
    collectors: Vec<CollectorType>,
    scraper: Option<Arc<ScraperCollector>>,
}

impl CollectionEngine {
    /// Build an engine running the enabled sub-collections in registry order.
    ///
    /// # Errors
    ///
    /// Fails before any connection attempt on an unsupported version or an
    /// incomplete query catalog.
    pub fn new(
        connector: Box<dyn Connector>,
        settings: EngineSettings,
        config: &CollectorConfig,
    ) -> Result<Self> {
        let version = ServerVersion::try_from(settings.server_version)?;
        catalog::verify()?;

        let collectors: Vec<CollectorType> = config
            .enabled()
            .filter_map(CollectorType::from_name)
            .collect();

        info!(
            version = %version,
            collectors = ?collectors.iter().map(Collector::name).collect::<Vec<_>>(),
            "collection engine ready"
        );

        Ok(Self {
            session: ConnectionManager::new(connector, version),
            identity: Identity::new(settings.dbhostname, settings.ha_alias),
            collectors,
            scraper: None,
        })
    }

    /// Record per sub-collection timings in `scraper`.
    #[must_use]
    pub fn with_scraper(mut self, scraper: Arc<ScraperCollector>) -> Self {
        self.scraper = Some(scraper);
        self
    }

    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    #[must_use]
    pub const fn version(&self) -> ServerVersion {
        self.session.version()
    }

    #[must_use]
    pub const fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Run one scrape.
    ///
    /// Always ends with `node_ifx_execution_time`, negative when the scrape
    /// had no usable connection.
    ///
    /// # Errors
    ///
    /// Mapping errors abort the scrape; connection trouble does not.
    #[instrument(skip(self), level = "info", err, fields(server = %self.session.server()))]
    pub async fn collect(&mut self) -> Result<Vec<MetricFamily>> {
        let start = Instant::now();
        self.session.begin_scrape();

        if !self.session.is_connected()
            && let Err(e) = self.session.connect().await
        {
            warn!(error = %e, "database unreachable, skipping collection");
        }

        let mut families = Vec::new();
        if self.session.is_connected() {
            self.identity.resolve(&mut self.session).await?;

            let mut scrape = Scrape {
                session: &mut self.session,
                identity: &self.identity,
            };

            for collector in &self.collectors {
                let timer = self
                    .scraper
                    .as_ref()
                    .map(|scraper| scraper.start_scrape(collector.name()));
                let span = info_span!("collector.collect", collector = %collector.name(), otel.kind = "internal");

                match collector.collect(&mut scrape).instrument(span).await {
                    Ok(shaped) => {
                        if let Some(timer) = timer {
                            timer.success();
                        }
                        families.extend(shaped.into_iter().filter(|f| !f.is_empty()));
                    }
                    Err(e) => {
                        if let Some(timer) = timer {
                            timer.error();
                        }
                        error!(collector = collector.name(), error = %e, "collection failed");
                        return Err(e);
                    }
                }
            }
        }

        let healthy = self.session.is_connected() && !self.session.is_degraded();
        let elapsed = start.elapsed().as_secs_f64();

        let mut execution = MetricFamily::gauge(
            "execution_time",
            "Time it took to gather statistics",
            &[],
        );
        execution.add(
            [self.identity.dbhostname()],
            if healthy { elapsed } else { -elapsed },
        );
        families.push(execution);

        Ok(families)
    }
}
