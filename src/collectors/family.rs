//! Typed metric families produced by one scrape.

use crate::collectors::catalog::QueryName;
use crate::collectors::error::{Error, Result};
use crate::collectors::row::{Row, Value};
use prometheus::{CounterVec, GaugeVec, Opts, Registry};
use tracing::debug;

/// Prefix of every family exposed for the database.
pub const NAMESPACE: &str = "node_ifx";

/// First label of every family.
pub const SERVER_LABEL: &str = "ifxserver";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
    /// Exposed as a gauge fixed at 1 carrying its payload in labels.
    Info,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    pub labels: Vec<String>,
    pub value: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MetricFamily {
    name: String,
    help: String,
    kind: MetricKind,
    label_names: Vec<String>,
    samples: Vec<Sample>,
}

impl MetricFamily {
    fn build(name: String, help: String, kind: MetricKind, labels: &[&str]) -> Self {
        let label_names = std::iter::once(SERVER_LABEL)
            .chain(labels.iter().copied())
            .map(str::to_string)
            .collect();
        Self {
            name,
            help,
            kind,
            label_names,
            samples: Vec::new(),
        }
    }

    /// `labels` are the extra dimensions after `ifxserver`.
    #[must_use]
    pub fn gauge(name: &str, help: impl Into<String>, labels: &[&str]) -> Self {
        Self::build(
            format!("{NAMESPACE}_{name}"),
            help.into(),
            MetricKind::Gauge,
            labels,
        )
    }

    /// Counter families get the conventional `_total` suffix.
    #[must_use]
    pub fn counter(name: &str, help: impl Into<String>, labels: &[&str]) -> Self {
        Self::build(
            format!("{NAMESPACE}_{name}_total"),
            help.into(),
            MetricKind::Counter,
            labels,
        )
    }

    #[must_use]
    pub fn info(name: &str, help: impl Into<String>, labels: &[&str]) -> Self {
        Self::build(
            format!("{NAMESPACE}_{name}_info"),
            help.into(),
            MetricKind::Info,
            labels,
        )
    }

    /// Add one sample; `labels` start with the server label value.
    pub fn add<I, S>(&mut self, labels: I, value: f64)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        debug_assert_eq!(
            labels.len(),
            self.label_names.len(),
            "label arity mismatch for {}",
            self.name
        );
        self.samples.push(Sample { labels, value });
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn help(&self) -> &str {
        &self.help
    }

    #[must_use]
    pub const fn kind(&self) -> MetricKind {
        self.kind
    }

    #[must_use]
    pub fn label_names(&self) -> &[String] {
        &self.label_names
    }

    #[must_use]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Materialize the family as a prometheus vector in `registry`.
    ///
    /// # Errors
    ///
    /// Returns an error on invalid names, label arity mismatches or a family
    /// name registered twice.
    pub fn register(&self, registry: &Registry) -> prometheus::Result<()> {
        let opts = Opts::new(self.name.clone(), self.help.clone());
        let label_names: Vec<&str> = self.label_names.iter().map(String::as_str).collect();

        match self.kind {
            MetricKind::Counter => {
                let vec = CounterVec::new(opts, &label_names)?;
                for sample in &self.samples {
                    let values: Vec<&str> = sample.labels.iter().map(String::as_str).collect();
                    if sample.value < 0.0 {
                        debug!(family = %self.name, value = sample.value, "negative counter clamped to 0");
                    }
                    vec.get_metric_with_label_values(&values)?
                        .inc_by(sample.value.max(0.0));
                }
                registry.register(Box::new(vec))
            }
            MetricKind::Gauge | MetricKind::Info => {
                let vec = GaugeVec::new(opts, &label_names)?;
                for sample in &self.samples {
                    let values: Vec<&str> = sample.labels.iter().map(String::as_str).collect();
                    vec.get_metric_with_label_values(&values)?
                        .set(sample.value);
                }
                registry.register(Box::new(vec))
            }
        }
    }
}

/// Turn a dynamic discriminator (profile name, VP class) into a valid metric
/// name fragment.
#[must_use]
pub fn sanitize(fragment: &str) -> String {
    fragment
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Numeric column of an aggregate row. NULL aggregates read as 0.
///
/// # Errors
///
/// Returns `Error::Column` when the column is missing or not numeric.
pub fn number(row: &Row, query: QueryName, column: &'static str) -> Result<f64> {
    match row.get(column) {
        Some(Value::Null) => Ok(0.0),
        Some(value) => value.as_f64().ok_or(Error::Column { query, column }),
        None => Err(Error::Column { query, column }),
    }
}

/// Integer code column (mode, thread state).
///
/// # Errors
///
/// Returns `Error::Column` when the column is missing, NULL or not integral.
pub fn code(row: &Row, query: QueryName, column: &'static str) -> Result<i64> {
    row.get(column)
        .and_then(Value::as_i64)
        .ok_or(Error::Column { query, column })
}

/// Single-row aggregate into a one-sample family. No row, no family.
///
/// # Errors
///
/// Returns `Error::Column` when the row lacks `column`.
pub fn single(
    mut family: MetricFamily,
    rows: &[Row],
    query: QueryName,
    column: &'static str,
    server: &str,
) -> Result<Vec<MetricFamily>> {
    let Some(row) = rows.first() else {
        return Ok(Vec::new());
    };
    family.add([server], number(row, query, column)?);
    Ok(vec![family])
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::proto::MetricType;

    #[test]
    fn test_single_row_aggregate() {
        let rows: Vec<Row> = vec![[("count", Value::Int(2))].into_iter().collect()];
        let family = MetricFamily::gauge("config_changes", "help", &[]);

        let shaped = single(family.clone(), &rows, QueryName::ConfigChanges, "count", "srv");
        assert!(matches!(shaped, Ok(ref f) if f.len() == 1 && f.iter().all(|f| f.samples().len() == 1)));

        let shaped = single(family, &[], QueryName::ConfigChanges, "count", "srv");
        assert!(matches!(shaped, Ok(ref f) if f.is_empty()));
    }

    #[test]
    fn test_constructors_prefix_and_server_label() {
        let gauge = MetricFamily::gauge("sessions", "Informix sessions", &["host", "user"]);
        assert_eq!(gauge.name(), "node_ifx_sessions");
        assert_eq!(gauge.label_names(), ["ifxserver", "host", "user"]);
        assert_eq!(gauge.kind(), MetricKind::Gauge);

        let counter = MetricFamily::counter("sysprofile_dskreads", "help", &[]);
        assert_eq!(counter.name(), "node_ifx_sysprofile_dskreads_total");

        let info = MetricFamily::info("version", "Informix version", &["version"]);
        assert_eq!(info.name(), "node_ifx_version_info");
        assert_eq!(info.kind(), MetricKind::Info);
    }

    #[test]
    fn test_add_and_empty() {
        let mut family = MetricFamily::gauge("mutex", "Informix mutex count", &[]);
        assert!(family.is_empty());
        family.add(["ol_informix1410"], 4.0);
        assert!(!family.is_empty());
        assert_eq!(family.samples().len(), 1);
        assert_eq!(family.help(), "Informix mutex count");
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    #[allow(clippy::indexing_slicing)]
    fn test_register_gauge() {
        let mut family = MetricFamily::gauge("dbspaces_size", "Size", &["dbspace"]);
        family.add(["srv", "rootdbs"], 1024.0);
        family.add(["srv", "datadbs"], 2048.0);

        let registry = Registry::new();
        family.register(&registry).unwrap();

        let gathered = registry.gather();
        assert_eq!(gathered.len(), 1);
        assert_eq!(gathered[0].name(), "node_ifx_dbspaces_size");
        assert_eq!(gathered[0].get_field_type(), MetricType::GAUGE);
        assert_eq!(gathered[0].get_metric().len(), 2);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    #[allow(clippy::indexing_slicing)]
    fn test_register_counter() {
        let mut family = MetricFamily::counter("bufferpool_dskreads", "Reads", &["pagesize"]);
        family.add(["srv", "2048"], 17.0);

        let registry = Registry::new();
        family.register(&registry).unwrap();

        let gathered = registry.gather();
        assert_eq!(gathered[0].get_field_type(), MetricType::COUNTER);
    }

    #[test]
    fn test_register_duplicate_name_fails() {
        let mut first = MetricFamily::gauge("mutex", "a", &[]);
        first.add(["srv"], 1.0);
        let second = first.clone();

        let registry = Registry::new();
        assert!(first.register(&registry).is_ok());
        assert!(second.register(&registry).is_err());
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("dskreads"), "dskreads");
        assert_eq!(sanitize(" ovlock "), "ovlock");
        assert_eq!(sanitize("lock-waits.total"), "lock_waits_total");
    }

    #[test]
    fn test_number_and_code() {
        let row: Row = [
            ("count", Value::Int(3)),
            ("total", Value::Null),
            ("name", Value::from("rootdbs")),
        ]
        .into_iter()
        .collect();

        assert!(matches!(number(&row, QueryName::Sessions, "count"), Ok(v) if (v - 3.0).abs() < f64::EPSILON));
        assert!(matches!(number(&row, QueryName::Memory, "total"), Ok(v) if v == 0.0));
        assert!(number(&row, QueryName::Memory, "missing").is_err());
        assert!(number(&row, QueryName::DbspaceSizes, "name").is_err());
        assert!(matches!(code(&row, QueryName::Threads, "count"), Ok(3)));
        assert!(code(&row, QueryName::Threads, "total").is_err());
    }
}
