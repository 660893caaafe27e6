//! Instance identity labels, resolved once per process.

use crate::collectors::catalog::QueryName;
use crate::collectors::error::Result;
use crate::collectors::session::ConnectionManager;
use tracing::{debug, instrument, warn};

#[derive(Clone, Debug, Default)]
pub struct Identity {
    dbhostname: String,
    ha_alias: String,
    dbhostname_supplied: bool,
    ha_alias_supplied: bool,
    resolved: bool,
}

fn supplied(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Identity {
    /// Externally supplied values are never overwritten by resolution.
    #[must_use]
    pub fn new(dbhostname: Option<String>, ha_alias: Option<String>) -> Self {
        let dbhostname = supplied(dbhostname);
        let ha_alias = supplied(ha_alias);
        Self {
            dbhostname_supplied: dbhostname.is_some(),
            ha_alias_supplied: ha_alias.is_some(),
            resolved: false,
            dbhostname: dbhostname.unwrap_or_default(),
            ha_alias: ha_alias.unwrap_or_default(),
        }
    }

    #[must_use]
    pub fn dbhostname(&self) -> &str {
        &self.dbhostname
    }

    #[must_use]
    pub fn ha_alias(&self) -> &str {
        &self.ha_alias
    }

    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Fill the fields that were not supplied, one query each.
    ///
    /// A field is only taken from a single-row answer. Resolution is retried
    /// on the next scrape when the session degraded meanwhile.
    ///
    /// # Errors
    ///
    /// Propagates catalog errors from the session.
    #[instrument(skip(self, session), level = "debug", err)]
    pub async fn resolve(&mut self, session: &mut ConnectionManager) -> Result<()> {
        if self.resolved {
            return Ok(());
        }

        if !self.ha_alias_supplied
            && let Some(value) = single(session, QueryName::HaAlias, "ha_alias").await?
        {
            self.ha_alias = value;
        }

        if !self.dbhostname_supplied
            && let Some(value) = single(session, QueryName::Hostname, "hostname").await?
        {
            self.dbhostname = value;
        }

        self.resolved = !session.is_degraded();
        debug!(
            dbhostname = %self.dbhostname,
            ha_alias = %self.ha_alias,
            resolved = self.resolved,
            "instance identity"
        );
        Ok(())
    }
}

async fn single(
    session: &mut ConnectionManager,
    name: QueryName,
    column: &str,
) -> Result<Option<String>> {
    let rows = session.execute(name).await?;
    match rows.as_slice() {
        [row] => Ok(Some(row.text(column).trim().to_string())),
        rows => {
            if !session.is_degraded() {
                warn!(query = %name, rows = rows.len(), "expected exactly one row, leaving unset");
            }
            Ok(None)
        }
    }
}
