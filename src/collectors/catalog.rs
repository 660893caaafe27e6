//! Version-keyed SQL catalog for the `sysmaster` database.
//!
//! Every query text is a literal. Releases share one base table and a release
//! only carries an override layer for the statements whose dialect differs.

use crate::collectors::error::{Error, Result};
use std::fmt;

/// Supported Informix major releases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ServerVersion {
    V11,
    V12,
    V14,
}

impl ServerVersion {
    pub const ALL: [Self; 3] = [Self::V11, Self::V12, Self::V14];

    #[must_use]
    pub const fn major(self) -> i64 {
        match self {
            Self::V11 => 11,
            Self::V12 => 12,
            Self::V14 => 14,
        }
    }
}

impl TryFrom<i64> for ServerVersion {
    type Error = Error;

    fn try_from(major: i64) -> Result<Self> {
        match major {
            11 => Ok(Self::V11),
            12 => Ok(Self::V12),
            14 => Ok(Self::V14),
            other => Err(Error::UnsupportedVersion(other)),
        }
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.major())
    }
}

/// Dialect-independent identifier of one catalog statement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueryName {
    UptimeMode,
    Version,
    Memory,
    Sessions,
    ConfigChanges,
    DbspaceSizes,
    Sysprofile,
    VpuClass,
    OpenTransactions,
    LocksPerUser,
    Mutexes,
    Threads,
    Buffers,
    SlowQueries,
    RssRole,
    RssInfo,
    RssTransmitStatus,
    HaAlias,
    Hostname,
}

impl QueryName {
    pub const ALL: [Self; 19] = [
        Self::UptimeMode,
        Self::Version,
        Self::Memory,
        Self::Sessions,
        Self::ConfigChanges,
        Self::DbspaceSizes,
        Self::Sysprofile,
        Self::VpuClass,
        Self::OpenTransactions,
        Self::LocksPerUser,
        Self::Mutexes,
        Self::Threads,
        Self::Buffers,
        Self::SlowQueries,
        Self::RssRole,
        Self::RssInfo,
        Self::RssTransmitStatus,
        Self::HaAlias,
        Self::Hostname,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UptimeMode => "uptime_mode",
            Self::Version => "version",
            Self::Memory => "memory",
            Self::Sessions => "sessions",
            Self::ConfigChanges => "config_changes",
            Self::DbspaceSizes => "dbspace_sizes",
            Self::Sysprofile => "sysprofile",
            Self::VpuClass => "vpu_class",
            Self::OpenTransactions => "open_transactions",
            Self::LocksPerUser => "locks_per_user",
            Self::Mutexes => "mutexes",
            Self::Threads => "threads",
            Self::Buffers => "buffers",
            Self::SlowQueries => "slow_queries",
            Self::RssRole => "rss_role",
            Self::RssInfo => "rss_info",
            Self::RssTransmitStatus => "rss_transmit_status",
            Self::HaAlias => "ha_alias",
            Self::Hostname => "hostname",
        }
    }
}

impl fmt::Display for QueryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const BASE: &[(QueryName, &str)] = &[
    (
        QueryName::UptimeMode,
        "SELECT (sh_curtime-sh_boottime) as online, sh_mode as mode FROM sysshmvals",
    ),
    (
        QueryName::Version,
        "SELECT FIRST 1 TRIM(version) as version FROM syslicenseinfo ORDER BY year,week DESC",
    ),
    (
        QueryName::Memory,
        "SELECT SUM(seg_size) as total_size FROM sysseglst",
    ),
    (
        QueryName::Sessions,
        "SELECT TRIM(username) as user, TRIM(hostname) as host, COUNT(username) as count FROM syssessions GROUP BY 1,2",
    ),
    // The excluded cf_ids legitimately differ from their onconfig value after startup.
    (
        QueryName::ConfigChanges,
        "SELECT count(cf_id) as count FROM syscfgtab WHERE cf_effective != cf_original AND cf_original != '' AND cf_id not in (5,8,11,31,45,47,51,53,54,58,67,79,122,128,129,172,177,182,201,216,234,278,281,288,288,310,311)",
    ),
    (
        QueryName::DbspaceSizes,
        "SELECT TRIM(sysdbspaces.name) as name, SUM(syschunks.chksize*sh_pagesize) as size, SUM(syschunks.nfree*sh_pagesize) as free FROM sysshmvals,syschunks JOIN sysdbspaces ON syschunks.dbsnum = sysdbspaces.dbsnum GROUP BY 1 ORDER BY NAME",
    ),
    (
        QueryName::Sysprofile,
        "SELECT TRIM(name) as name, value FROM sysprofile",
    ),
    (
        QueryName::VpuClass,
        "SELECT TRIM(classname) as classname, SUM(usecs_user) as usecs_user, SUM(usecs_sys) as usecs_sys, SUM(readyqueue) as readyqueue, SUM(num_ready) as num_ready , CAST(COUNT(*) - SUM(num_ready) AS INT) idle, SUM(total_semops) semops, SUM(total_busy_wts) busy_waits, SUM(total_spins) spins FROM sysvplst GROUP BY classname",
    ),
    (
        QueryName::OpenTransactions,
        "SELECT COUNT(*) as open_transactions FROM systrans",
    ),
    (
        QueryName::LocksPerUser,
        "SELECT TRIM(username) as username, SUM(nlocks) as locks FROM sysrstcb GROUP BY 1",
    ),
    (
        QueryName::Mutexes,
        "SELECT COUNT(*) as mutex_count FROM sysmutexes WHERE mtx_holder != 0",
    ),
    (
        QueryName::Threads,
        "SELECT TRIM(classname) as classname, th_state as threadstate, count(th_id) as count FROM systhreads JOIN sysvplst ON systhreads.th_vpid = sysvplst.vpid GROUP BY 1,2",
    ),
    (
        QueryName::Buffers,
        "SELECT SUM(bufsize*nbuffs) as size, SUM(dskreads) as dskreads, SUM(pagreads) as pagreads, SUM(bufreads) as bufreads, SUM(dskwrites) as dskwrites, SUM(pagwrites) as pagwrites, SUM(bufwrites) as bufwrites, SUM(bufwaits) as bufwaits, SUM(ovbuff) as ovbuff, SUM(flushes) as flushes, SUM(fgwrites) as fgwrites, SUM(lruwrites) as lruwrites, SUM(chunkwrites) as chunkwrites, SUM(lru_time_total) as lru_time_total, SUM(lru_calls) as lru_calls, ((pagreads + bufwrites) / nbuffs) as buffer_turnovers, bufsize as pagesize from sysbufpool GROUP BY 16,17",
    ),
    (
        QueryName::SlowQueries,
        "SELECT COUNT(net_last_write) as slow_queries FROM sysnetworkio WHERE net_last_write-net_last_read>1",
    ),
    (QueryName::RssRole, "SELECT server_name FROM syssrcrss"),
    (
        QueryName::RssInfo,
        "SELECT TRIM(name) as name, TRIM(nodetype) as nodetype, TRIM(server_status) as server_status, TRIM(connection_status) as connection_status, delayed_apply as delayed_apply, TRIM(stop_apply) as stop_apply, (((logid_sent*3580)+logpage_sent) - ((logid_acked*3580)+logpage_acked)) as lag FROM syscluster",
    ),
    (
        QueryName::RssTransmitStatus,
        "SELECT TRIM(server_name) as server_name, TRIM(log_transmission_status) as log_transmission_status FROM syssrcrss",
    ),
    (
        QueryName::HaAlias,
        "SELECT TRIM(cf_effective) as ha_alias FROM sysconfig WHERE cf_name = 'HA_ALIAS'",
    ),
    (
        QueryName::Hostname,
        "SELECT TRIM(cf_default) as hostname FROM sysconfig WHERE cf_name = 'DBSERVERNAME'",
    ),
];

const V11: &[(QueryName, &str)] = &[];

const V12: &[(QueryName, &str)] = &[];

const V14: &[(QueryName, &str)] = &[(
    QueryName::Buffers,
    "SELECT SUM(bufsize*nbuffs) AS size, SUM(dskreads) AS dskreads, SUM(pagreads) AS pagreads, SUM(bufreads) AS bufreads, SUM(dskwrites) AS dskwrites, SUM(pagwrites) AS pagwrites, SUM(bufwrites) AS bufwrites, SUM(bufwaits) AS bufwaits, SUM(ovbuff) AS ovbuff, SUM(flushes) AS flushes, SUM(fgwrites) AS fgwrites, SUM(lruwrites) AS lruwrites, SUM(chunkwrites) AS chunkwrites, SUM(lru_time_total) AS lru_time_total, SUM(lru_calls) AS lru_calls, ((pagreads + bufwrites) / nbuffs) AS buffer_turnovers, bufsize AS pagesize from sysbufpool GROUP BY 16,17",
)];

const fn layer(version: ServerVersion) -> &'static [(QueryName, &'static str)] {
    match version {
        ServerVersion::V11 => V11,
        ServerVersion::V12 => V12,
        ServerVersion::V14 => V14,
    }
}

fn find(table: &[(QueryName, &'static str)], name: QueryName) -> Option<&'static str> {
    table
        .iter()
        .find(|(entry, _)| *entry == name)
        .map(|(_, sql)| *sql)
}

/// Resolve the SQL text of `name` for `version`.
///
/// # Errors
///
/// Returns `Error::UnknownQuery` if neither the release layer nor the base
/// table carries the statement.
pub fn lookup(version: ServerVersion, name: QueryName) -> Result<&'static str> {
    find(layer(version), name)
        .or_else(|| find(BASE, name))
        .ok_or(Error::UnknownQuery { version, name })
}

/// Check that every logical query resolves for every supported release.
///
/// # Errors
///
/// Returns the first `Error::UnknownQuery` found.
pub fn verify() -> Result<()> {
    for version in ServerVersion::ALL {
        for name in QueryName::ALL {
            lookup(version, name)?;
        }
    }
    Ok(())
}
