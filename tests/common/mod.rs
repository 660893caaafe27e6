#![allow(dead_code)]
#![allow(clippy::expect_used)]

use futures::future::BoxFuture;
use informix_exporter::collectors::{
    CollectionEngine, EngineSettings, Error, Result,
    catalog::{self, QueryName, ServerVersion},
    config::CollectorConfig,
    row::{Row, Value},
    session::{Connector, Session},
};
use std::collections::HashMap;
use std::net::TcpListener;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::sleep;

#[derive(Default)]
struct Script {
    responses: HashMap<QueryName, Vec<Row>>,
    connect_failures: usize,
    query_failures: usize,
    connect_attempts: usize,
    executed: Vec<QueryName>,
}

/// In-memory stand-in for an Informix instance. Answers catalog queries from
/// a per-query script and can be told to drop connections.
#[derive(Clone, Default)]
pub struct ScriptedConnector {
    script: Arc<Mutex<Script>>,
}

fn query_name(sql: &str) -> Option<QueryName> {
    QueryName::ALL.into_iter().find(|name| {
        ServerVersion::ALL
            .into_iter()
            .any(|version| catalog::lookup(version, *name).is_ok_and(|s| s == sql))
    })
}

impl ScriptedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().expect("script lock poisoned")
    }

    pub fn respond(&self, name: QueryName, rows: Vec<Row>) -> &Self {
        self.lock().responses.insert(name, rows);
        self
    }

    pub fn fail_connects(&self, n: usize) {
        self.lock().connect_failures = n;
    }

    pub fn fail_queries(&self, n: usize) {
        self.lock().query_failures = n;
    }

    pub fn connect_attempts(&self) -> usize {
        self.lock().connect_attempts
    }

    pub fn executed(&self) -> Vec<QueryName> {
        self.lock().executed.clone()
    }
}

impl Connector for ScriptedConnector {
    fn server(&self) -> &str {
        "ol_scripted"
    }

    fn connect(&self) -> BoxFuture<'_, Result<Box<dyn Session>>> {
        Box::pin(async move {
            let mut script = self.lock();
            script.connect_attempts += 1;
            if script.connect_failures > 0 {
                script.connect_failures -= 1;
                return Err(Error::Connection {
                    server: "ol_scripted".to_string(),
                    message: "connection refused".to_string(),
                });
            }
            drop(script);

            Ok(Box::new(ScriptedSession {
                script: Arc::clone(&self.script),
            }) as Box<dyn Session>)
        })
    }
}

struct ScriptedSession {
    script: Arc<Mutex<Script>>,
}

impl Session for ScriptedSession {
    fn query<'a>(&'a mut self, sql: &'a str) -> BoxFuture<'a, Result<Vec<Row>>> {
        Box::pin(async move {
            let mut script = self.script.lock().expect("script lock poisoned");
            if script.query_failures > 0 {
                script.query_failures -= 1;
                return Err(Error::Driver("connection reset by peer".to_string()));
            }

            let name = query_name(sql).expect("query outside the catalog");
            script.executed.push(name);
            Ok(script.responses.get(&name).cloned().unwrap_or_default())
        })
    }
}

pub fn row<const N: usize>(columns: [(&str, Value); N]) -> Row {
    columns.into_iter().collect()
}

/// A healthy 12.10 primary with one RSS secondary.
pub fn informix_primary() -> ScriptedConnector {
    let db = ScriptedConnector::new();
    db.respond(
        QueryName::HaAlias,
        vec![row([("ha_alias", Value::from("ol_primary"))])],
    )
    .respond(
        QueryName::Hostname,
        vec![row([("hostname", Value::from("ol_informix1210"))])],
    )
    .respond(
        QueryName::UptimeMode,
        vec![row([("online", Value::Int(86_400)), ("mode", Value::Int(5))])],
    )
    .respond(
        QueryName::Version,
        vec![row([("version", Value::from("12.10.FC5DE"))])],
    )
    .respond(
        QueryName::Memory,
        vec![row([("total_size", Value::Int(1_073_741_824))])],
    )
    .respond(
        QueryName::Sessions,
        vec![
            row([
                ("host", Value::from("")),
                ("user", Value::from("informix")),
                ("count", Value::Int(3)),
            ]),
            row([
                ("host", Value::from("app01")),
                ("user", Value::from("webapp")),
                ("count", Value::Int(12)),
            ]),
        ],
    )
    .respond(
        QueryName::Mutexes,
        vec![row([("mutex_count", Value::Int(4))])],
    )
    .respond(
        QueryName::Threads,
        vec![row([
            ("classname", Value::from("cpu")),
            ("threadstate", Value::Int(5)),
            ("count", Value::Int(2)),
        ])],
    )
    .respond(
        QueryName::RssRole,
        vec![row([("name", Value::from("ol_secondary"))])],
    )
    .respond(
        QueryName::RssInfo,
        vec![row([
            ("name", Value::from("ol_secondary")),
            ("nodetype", Value::from("RSS")),
            ("server_status", Value::from("Active")),
            ("connection_status", Value::from("Connected")),
            ("delayed_apply", Value::Int(0)),
            ("stop_apply", Value::Int(0)),
            ("lag", Value::Int(7)),
        ])],
    )
    .respond(
        QueryName::RssTransmitStatus,
        vec![row([
            ("server_name", Value::from("ol_secondary")),
            ("log_transmission_status", Value::from("Active")),
        ])],
    );
    db
}

pub fn engine(
    db: &ScriptedConnector,
    server_version: i64,
    collectors: &[&str],
) -> Result<CollectionEngine> {
    let collectors: Vec<String> = collectors.iter().map(ToString::to_string).collect();
    CollectionEngine::new(
        Box::new(db.clone()),
        EngineSettings {
            server_version,
            dbhostname: None,
            ha_alias: None,
        },
        &CollectorConfig::new().with_enabled(&collectors),
    )
}

/// Get an available port for testing
pub fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind to ephemeral port")
        .local_addr()
        .expect("Failed to get local address")
        .port()
}

/// Build test URL for HTTP requests
pub fn get_test_url(port: u16) -> String {
    format!("http://127.0.0.1:{port}")
}

/// Wait for server to be ready
pub async fn wait_for_server(port: u16, max_attempts: u32) -> bool {
    for _ in 0..max_attempts {
        if tokio::net::TcpStream::connect(format!("127.0.0.1:{port}"))
            .await
            .is_ok()
        {
            return true;
        }
        sleep(Duration::from_millis(100)).await;
    }
    false
}
