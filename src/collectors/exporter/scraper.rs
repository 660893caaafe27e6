use prometheus::{CounterVec, GaugeVec, HistogramOpts, HistogramVec, IntGauge, Opts, Registry};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Per sub-collection scrape timings and outcomes.
#[derive(Clone)]
pub struct ScraperCollector {
    scrape_duration_seconds: HistogramVec,
    scrape_errors_total: CounterVec,
    last_scrape_timestamp: GaugeVec,
    last_scrape_success: GaugeVec,
    metrics_total: IntGauge,
    scrapes_total: IntGauge,
    scrapes: Arc<AtomicI64>,
}

fn now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

impl ScraperCollector {
    /// # Errors
    ///
    /// Returns an error if a metric cannot be created.
    pub fn new() -> prometheus::Result<Self> {
        Ok(Self {
            scrape_duration_seconds: HistogramVec::new(
                HistogramOpts::new(
                    "informix_exporter_collector_scrape_duration_seconds",
                    "Time spent scraping each collector in seconds",
                )
                .buckets(vec![
                    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
                ]),
                &["collector"],
            )?,
            scrape_errors_total: CounterVec::new(
                Opts::new(
                    "informix_exporter_collector_scrape_errors_total",
                    "Total number of scrape errors per collector",
                ),
                &["collector"],
            )?,
            last_scrape_timestamp: GaugeVec::new(
                Opts::new(
                    "informix_exporter_collector_last_scrape_timestamp_seconds",
                    "Unix timestamp of the last scrape attempt per collector",
                ),
                &["collector"],
            )?,
            last_scrape_success: GaugeVec::new(
                Opts::new(
                    "informix_exporter_collector_last_scrape_success",
                    "Whether the last scrape was successful (1=success, 0=failure)",
                ),
                &["collector"],
            )?,
            metrics_total: IntGauge::with_opts(Opts::new(
                "informix_exporter_metrics_total",
                "Number of database metric families in the last scrape",
            ))?,
            scrapes_total: IntGauge::with_opts(Opts::new(
                "informix_exporter_scrapes_total",
                "Total number of scrapes performed since start",
            ))?,
            scrapes: Arc::new(AtomicI64::new(0)),
        })
    }

    #[must_use]
    pub fn start_scrape(&self, collector: &str) -> ScrapeTimer {
        ScrapeTimer {
            collector: collector.to_string(),
            start: Instant::now(),
            scraper: self.clone(),
            recorded: false,
        }
    }

    pub fn update_metrics_count(&self, count: i64) {
        self.metrics_total.set(count);
    }

    pub fn increment_scrapes(&self) {
        let total = self.scrapes.fetch_add(1, Ordering::Relaxed) + 1;
        self.scrapes_total.set(total);
    }

    fn record(&self, collector: &str, duration: Option<f64>) {
        if let Some(duration) = duration {
            self.scrape_duration_seconds
                .with_label_values(&[collector])
                .observe(duration);
        } else {
            self.scrape_errors_total.with_label_values(&[collector]).inc();
        }

        self.last_scrape_timestamp
            .with_label_values(&[collector])
            .set(now());
        self.last_scrape_success
            .with_label_values(&[collector])
            .set(if duration.is_some() { 1.0 } else { 0.0 });
    }

    /// # Errors
    ///
    /// Returns an error if metric registration fails.
    pub fn register(&self, registry: &Registry) -> prometheus::Result<()> {
        registry.register(Box::new(self.scrape_duration_seconds.clone()))?;
        registry.register(Box::new(self.scrape_errors_total.clone()))?;
        registry.register(Box::new(self.last_scrape_timestamp.clone()))?;
        registry.register(Box::new(self.last_scrape_success.clone()))?;
        registry.register(Box::new(self.metrics_total.clone()))?;
        registry.register(Box::new(self.scrapes_total.clone()))?;
        Ok(())
    }
}

/// Records one sub-collection run. Dropped without an outcome counts as a
/// success.
pub struct ScrapeTimer {
    collector: String,
    start: Instant,
    scraper: ScraperCollector,
    recorded: bool,
}

impl ScrapeTimer {
    pub fn success(mut self) {
        self.finish(true);
    }

    pub fn error(mut self) {
        self.finish(false);
    }

    fn finish(&mut self, ok: bool) {
        if self.recorded {
            return;
        }
        self.recorded = true;
        let duration = ok.then(|| self.start.elapsed().as_secs_f64());
        self.scraper.record(&self.collector, duration);
    }
}

impl Drop for ScrapeTimer {
    fn drop(&mut self) {
        self.finish(true);
    }
}
