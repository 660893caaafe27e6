mod process;
mod scraper;

pub use process::ProcessCollector;
pub use scraper::{ScrapeTimer, ScraperCollector};

use anyhow::Result;
use prometheus::Registry;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Exporter self-monitoring: process resources and scrape bookkeeping.
#[derive(Clone)]
pub struct ExporterCollector {
    process: ProcessCollector,
    scraper: Arc<ScraperCollector>,
}

impl ExporterCollector {
    /// # Errors
    ///
    /// Returns an error if a metric cannot be created.
    pub fn new() -> Result<Self> {
        Ok(Self {
            process: ProcessCollector::new()?,
            scraper: Arc::new(ScraperCollector::new()?),
        })
    }

    #[must_use]
    pub const fn scraper(&self) -> &Arc<ScraperCollector> {
        &self.scraper
    }

    /// # Errors
    ///
    /// Returns an error if any metric fails to register.
    #[instrument(skip(self, registry), level = "info", err, fields(collector = "exporter"))]
    pub fn register_metrics(&self, registry: &Registry) -> Result<()> {
        self.process.register(registry)?;
        self.scraper.register(registry)?;
        debug!("registered exporter metrics");
        Ok(())
    }

    /// Update the values that are sampled rather than pushed.
    pub fn refresh(&self) {
        self.process.refresh();
        self.scraper.increment_scrapes();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_exporter_registers_and_refreshes() {
        let exporter = ExporterCollector::new().unwrap();
        let registry = Registry::new();
        assert!(exporter.register_metrics(&registry).is_ok());

        exporter.refresh();
        let names: Vec<String> = registry
            .gather()
            .iter()
            .map(|m| m.name().to_string())
            .collect();
        assert!(names.contains(&"informix_exporter_scrapes_total".to_string()));
        assert!(names.contains(&"informix_exporter_process_resident_memory_bytes".to_string()));
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_double_registration_fails() {
        let exporter = ExporterCollector::new().unwrap();
        let registry = Registry::new();
        assert!(exporter.register_metrics(&registry).is_ok());
        assert!(exporter.register_metrics(&registry).is_err());
    }
}
