use crate::collectors::catalog::{QueryName, ServerVersion};
use crate::collectors::error::{Error, Result};
use crate::collectors::family::{self, MetricFamily};
use crate::collectors::{Collector, Scrape};
use futures::future::BoxFuture;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, instrument};

const GIB: f64 = 1_073_741_824.0;

/// Licensed shared memory per (major, edition), in GiB.
const LICENSE_MEMORY: &[(i64, &str, f64)] = &[
    (11, "DE", 1.0),
    (11, "EE", 1.0),
    (11, "IE", 2.0),
    (11, "WE", 1.0),
    (12, "DE", 16.0),
    (12, "EE", 8.0),
    (12, "IE", 2.0),
    (12, "WE", 16.0),
    (14, "DE", 16.0),
    (14, "EE", 8.0),
    (14, "IE", 8.0),
    (14, "WE", 32.0),
];

#[allow(clippy::expect_used)]
static LEADING_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)").expect("valid leading digits regex"));

/// Split a license version such as `12.10.FC5DE` into its major release and
/// the two-letter edition suffix.
#[must_use]
pub fn parse_license_version(version: &str) -> Option<(i64, &str)> {
    let major = LEADING_DIGITS
        .captures(version)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<i64>().ok())?;

    let start = version
        .char_indices()
        .rev()
        .nth(1)
        .map_or(0, |(idx, _)| idx);

    Some((major, version.get(start..).unwrap_or_default()))
}

/// Maximum shared memory the license allows, in bytes.
///
/// A version without a leading major number falls back to 1 GiB.
///
/// # Errors
///
/// Returns `Error::UnknownEdition` for a major/edition pair outside the
/// license table.
pub fn memory_ceiling(version: &str) -> Result<f64> {
    let Some((major, edition)) = parse_license_version(version) else {
        return Ok(GIB);
    };

    LICENSE_MEMORY
        .iter()
        .find(|(m, e, _)| *m == major && *e == edition)
        .map(|(_, _, gib)| gib * GIB)
        .ok_or_else(|| Error::UnknownEdition {
            major,
            edition: edition.to_string(),
        })
}

/// License version, memory ceiling and shared memory in use.
///
/// The license major also corrects the configured catalog version.
#[derive(Clone, Default)]
pub struct VersionCollector;

impl VersionCollector {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Collector for VersionCollector {
    fn name(&self) -> &'static str {
        "version"
    }

    #[instrument(skip(self, scrape), level = "info", err, fields(collector = "version", otel.kind = "internal"))]
    fn collect<'a, 's: 'a>(
        &'a self,
        scrape: &'a mut Scrape<'s>,
    ) -> BoxFuture<'a, Result<Vec<MetricFamily>>> {
        Box::pin(async move {
            let server = scrape.identity.dbhostname();
            let mut families = Vec::new();

            let rows = scrape.session.execute(QueryName::Version).await?;
            if let Some(row) = rows.first() {
                let version = row.text("version");
                debug!(version = %version, "license version");

                let mut info = MetricFamily::info("version", "Informix version", &["version"]);
                info.add([server, version.as_str()], 1.0);
                families.push(info);

                let mut ceiling = MetricFamily::gauge(
                    "max_memory_allowed",
                    "Informix maximum allowed memory",
                    &[],
                );
                ceiling.add([server], memory_ceiling(&version)?);
                families.push(ceiling);

                if let Some((major, _)) = parse_license_version(&version) {
                    scrape.session.adopt_version(ServerVersion::try_from(major)?);
                }
            }

            let rows = scrape.session.execute(QueryName::Memory).await?;
            families.extend(family::single(
                MetricFamily::gauge("memory_used", "Informix memory in use", &[]),
                &rows,
                QueryName::Memory,
                "total_size",
                server,
            )?);

            Ok(families)
        })
    }
}
