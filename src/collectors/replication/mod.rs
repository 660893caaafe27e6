//! RSS replication topology and lag.
//!
//! `syscluster` can block on a secondary that is lagging or in trouble, so the
//! deeper views are only read when `syssrcrss` shows this server sends logs to
//! at least one secondary.

use crate::collectors::catalog::QueryName;
use crate::collectors::error::Result;
use crate::collectors::family::{self, MetricFamily};
use crate::collectors::row::Row;
use crate::collectors::{Collector, Scrape};
use futures::future::BoxFuture;
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Node type carrying a replication lag.
const RSS_NODE: &str = "RSS";

/// Log transmission status of a healthy link.
const ACTIVE: &str = "Active";

#[derive(Clone, Default)]
pub struct ReplicationCollector;

impl ReplicationCollector {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

/// 1 for an active log transmission, 0 for any other status, -1 when the
/// primary has no transmit record for the node.
fn transmit_status(transmit: &HashMap<String, String>, node: &str) -> f64 {
    match transmit.get(node) {
        Some(status) if status == ACTIVE => 1.0,
        Some(_) => 0.0,
        None => -1.0,
    }
}

fn shape(
    server: &str,
    ha_alias: &str,
    nodes: &[Row],
    transmit_rows: &[Row],
) -> Result<Vec<MetricFamily>> {
    let transmit: HashMap<String, String> = transmit_rows
        .iter()
        .map(|row| {
            (
                row.text("server_name"),
                row.text("log_transmission_status"),
            )
        })
        .filter(|(name, _)| name != ha_alias)
        .collect();

    let mut status = MetricFamily::gauge(
        "rss_connectionstatus",
        "RSS connection status",
        &[
            "node",
            "nodetype",
            "connection_status",
            "server_status",
            "delayed_apply",
            "stop_apply",
        ],
    );
    let mut lag = MetricFamily::gauge(
        "rss_replication_lag",
        "RSS replication lag",
        &["node", "nodetype"],
    );

    for row in nodes {
        let node = row.text("name");
        let nodetype = row.text("nodetype");

        if node != ha_alias {
            status.add(
                [
                    server.to_string(),
                    node.clone(),
                    nodetype.clone(),
                    row.text("connection_status"),
                    row.text("server_status"),
                    row.text("delayed_apply"),
                    row.text("stop_apply"),
                ],
                transmit_status(&transmit, &node),
            );
        }

        if nodetype == RSS_NODE {
            lag.add(
                [server, node.as_str(), nodetype.as_str()],
                family::number(row, QueryName::RssInfo, "lag")?,
            );
        }
    }

    Ok(vec![status, lag])
}

impl Collector for ReplicationCollector {
    fn name(&self) -> &'static str {
        "replication"
    }

    #[instrument(skip(self, scrape), level = "info", err, fields(collector = "replication", otel.kind = "internal"))]
    fn collect<'a, 's: 'a>(
        &'a self,
        scrape: &'a mut Scrape<'s>,
    ) -> BoxFuture<'a, Result<Vec<MetricFamily>>> {
        Box::pin(async move {
            let identity = scrape.identity;

            let role = scrape.session.execute(QueryName::RssRole).await?;
            if role.is_empty() {
                debug!("not an RSS primary, skipping replication views");
                return Ok(Vec::new());
            }

            let nodes = scrape.session.execute(QueryName::RssInfo).await?;
            let transmit = scrape.session.execute(QueryName::RssTransmitStatus).await?;

            shape(identity.dbhostname(), identity.ha_alias(), &nodes, &transmit)
        })
    }
}
