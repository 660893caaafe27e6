//! Scripted in-memory connector for unit tests.

use crate::collectors::catalog::{self, QueryName, ServerVersion};
use crate::collectors::error::{Error, Result};
use crate::collectors::family::MetricFamily;
use crate::collectors::identity::Identity;
use crate::collectors::row::Row;
use crate::collectors::session::{ConnectionManager, Connector, Session};
use crate::collectors::{Collector, Scrape};
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct Script {
    responses: HashMap<QueryName, Vec<Row>>,
    connect_failures: usize,
    query_failures: usize,
    connect_attempts: usize,
    connects: usize,
    queries: Vec<String>,
}

#[derive(Clone, Default)]
pub struct FakeConnector {
    script: Arc<Mutex<Script>>,
}

fn name_of(sql: &str) -> Option<QueryName> {
    QueryName::ALL.into_iter().find(|name| {
        ServerVersion::ALL
            .into_iter()
            .any(|version| catalog::lookup(version, *name).is_ok_and(|s| s == sql))
    })
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        match self.script.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn respond(&self, name: QueryName, rows: Vec<Row>) {
        self.script().responses.insert(name, rows);
    }

    pub fn fail_connects(&self, n: usize) {
        self.script().connect_failures = n;
    }

    pub fn fail_queries(&self, n: usize) {
        self.script().query_failures = n;
    }

    pub fn connects(&self) -> usize {
        self.script().connects
    }

    pub fn connect_attempts(&self) -> usize {
        self.script().connect_attempts
    }

    pub fn queries(&self) -> Vec<String> {
        self.script().queries.clone()
    }
}

impl Connector for FakeConnector {
    fn server(&self) -> &str {
        "ol_fake"
    }

    fn connect(&self) -> BoxFuture<'_, Result<Box<dyn Session>>> {
        Box::pin(async move {
            let mut script = self.script();
            script.connect_attempts += 1;
            if script.connect_failures > 0 {
                script.connect_failures -= 1;
                return Err(Error::Connection {
                    server: "ol_fake".to_string(),
                    message: "connection refused".to_string(),
                });
            }
            script.connects += 1;
            drop(script);
            Ok(Box::new(FakeSession {
                script: Arc::clone(&self.script),
            }) as Box<dyn Session>)
        })
    }
}

struct FakeSession {
    script: Arc<Mutex<Script>>,
}

impl Session for FakeSession {
    fn query<'a>(&'a mut self, sql: &'a str) -> BoxFuture<'a, Result<Vec<Row>>> {
        Box::pin(async move {
            let mut script = match self.script.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            script.queries.push(sql.to_string());
            if script.query_failures > 0 {
                script.query_failures -= 1;
                return Err(Error::Driver("session lost".to_string()));
            }
            Ok(name_of(sql)
                .and_then(|name| script.responses.get(&name).cloned())
                .unwrap_or_default())
        })
    }
}

/// Run one collector on a fresh, connected session as server `ol_test`.
pub async fn run<C: Collector>(collector: &C, fake: &FakeConnector) -> Result<Vec<MetricFamily>> {
    run_as(
        collector,
        fake,
        Identity::new(Some("ol_test".into()), Some("ol_test".into())),
    )
    .await
}

pub async fn run_as<C: Collector>(
    collector: &C,
    fake: &FakeConnector,
    identity: Identity,
) -> Result<Vec<MetricFamily>> {
    let mut session = ConnectionManager::new(Box::new(fake.clone()), ServerVersion::V14);
    session.connect().await?;
    let mut scrape = Scrape {
        session: &mut session,
        identity: &identity,
    };
    collector.collect(&mut scrape).await
}
