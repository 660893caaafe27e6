use crate::collectors::identity::Identity;
use crate::collectors::session::ConnectionManager;
use futures::future::BoxFuture;
use std::collections::HashMap;

#[macro_use]
mod register_macro;

pub mod catalog;
pub mod codes;
pub mod config;
pub mod engine;
pub mod error;
pub mod exporter;
pub mod family;
pub mod identity;
pub mod odbc;
pub mod row;
pub mod session;
pub mod util;

#[cfg(test)]
pub(crate) mod fake;

pub use engine::{CollectionEngine, EngineSettings};
pub use error::{Error, Result};
pub use family::MetricFamily;

/// What a sub-collection sees during one scrape.
pub struct Scrape<'s> {
    pub session: &'s mut ConnectionManager,
    pub identity: &'s Identity,
}

pub trait Collector {
    fn name(&self) -> &'static str;

    /// Run the catalog queries of this sub-collection and shape the rows.
    ///
    /// # Errors
    ///
    /// Returns mapping errors only; driver failures are absorbed by the
    /// session and show up as empty row sets.
    fn collect<'a, 's: 'a>(
        &'a self,
        scrape: &'a mut Scrape<'s>,
    ) -> BoxFuture<'a, Result<Vec<MetricFamily>>>;

    fn enabled_by_default(&self) -> bool {
        true
    }
}

// Registration order is scrape order.
register_collectors! {
    uptime => UptimeCollector,
    version => VersionCollector,
    sessions => SessionsCollector,
    config_changes => ConfigChangesCollector,
    dbspaces => DbspacesCollector,
    sysprofile => SysprofileCollector,
    vpu_class => VpuClassCollector,
    open_transactions => OpenTransactionsCollector,
    locks => LocksCollector,
    mutexes => MutexesCollector,
    threads => ThreadsCollector,
    buffers => BuffersCollector,
    slow_queries => SlowQueriesCollector,
    replication => ReplicationCollector,
}
