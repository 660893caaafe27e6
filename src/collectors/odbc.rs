//! ODBC driver behind the `Connector`/`Session` seam.
//!
//! ODBC calls block and its handles must stay on the thread that created
//! them, so every session owns a dedicated OS thread holding the environment
//! and the connection. Queries travel to it over a channel and rows come back
//! over a oneshot.

use crate::collectors::error::{Error, Result};
use crate::collectors::row::{Row, Value};
use crate::collectors::session::{Connector, Session};
use crate::collectors::util::ConnectionDescriptor;
use futures::future::BoxFuture;
use odbc_api::{
    Connection, ConnectionOptions, Cursor, DataType, Environment, ResultSetMetadata,
};
use secrecy::{ExposeSecret, SecretString};
use std::sync::mpsc;
use std::thread;
use tokio::sync::oneshot;
use tracing::{debug, error};

struct Request {
    sql: String,
    reply: oneshot::Sender<Result<Vec<Row>>>,
}

pub struct OdbcConnector {
    server: String,
    connection_string: SecretString,
}

impl OdbcConnector {
    #[must_use]
    pub fn new(descriptor: &ConnectionDescriptor, driver: &str) -> Self {
        Self {
            server: descriptor.database.clone(),
            connection_string: descriptor.connection_string(driver),
        }
    }

    fn connection_error(&self, message: impl Into<String>) -> Error {
        Error::Connection {
            server: self.server.clone(),
            message: message.into(),
        }
    }
}

impl Connector for OdbcConnector {
    fn server(&self) -> &str {
        &self.server
    }

    fn connect(&self) -> BoxFuture<'_, Result<Box<dyn Session>>> {
        Box::pin(async move {
            let (requests, inbox) = mpsc::channel::<Request>();
            let (ready, connected) = oneshot::channel();
            let connection_string = self.connection_string.clone();

            thread::Builder::new()
                .name(format!("odbc-{}", self.server))
                .spawn(move || worker(&connection_string, ready, &inbox))
                .map_err(|e| self.connection_error(e.to_string()))?;

            match connected.await {
                Ok(Ok(())) => Ok(Box::new(OdbcSession { requests }) as Box<dyn Session>),
                Ok(Err(message)) => Err(self.connection_error(message)),
                Err(_) => Err(self.connection_error("driver thread exited while connecting")),
            }
        })
    }
}

struct OdbcSession {
    requests: mpsc::Sender<Request>,
}

impl Session for OdbcSession {
    fn query<'a>(&'a mut self, sql: &'a str) -> BoxFuture<'a, Result<Vec<Row>>> {
        Box::pin(async move {
            let (reply, rows) = oneshot::channel();
            self.requests
                .send(Request {
                    sql: sql.to_string(),
                    reply,
                })
                .map_err(|_| Error::Driver("driver thread is gone".to_string()))?;

            rows.await
                .map_err(|_| Error::Driver("driver thread dropped the query".to_string()))?
        })
    }
}

fn worker(
    connection_string: &SecretString,
    ready: oneshot::Sender<std::result::Result<(), String>>,
    inbox: &mpsc::Receiver<Request>,
) {
    let env = match Environment::new() {
        Ok(env) => env,
        Err(e) => {
            let _ = ready.send(Err(e.to_string()));
            return;
        }
    };

    let conn = match env.connect_with_connection_string(
        connection_string.expose_secret(),
        ConnectionOptions::default(),
    ) {
        Ok(conn) => conn,
        Err(e) => {
            let _ = ready.send(Err(e.to_string()));
            return;
        }
    };

    if ready.send(Ok(())).is_err() {
        return;
    }

    // ends when the session drops its sender
    while let Ok(request) = inbox.recv() {
        let result = fetch(&conn, &request.sql).map_err(|e| {
            error!(error = %e, "odbc query failed");
            Error::Driver(e.to_string())
        });
        let _ = request.reply.send(result);
    }
    debug!("odbc session closed");
}

const fn is_numeric(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Integer
            | DataType::SmallInt
            | DataType::BigInt
            | DataType::TinyInt
            | DataType::Decimal { .. }
            | DataType::Numeric { .. }
            | DataType::Float { .. }
            | DataType::Real
            | DataType::Double
    )
}

fn fetch(conn: &Connection<'_>, sql: &str) -> std::result::Result<Vec<Row>, odbc_api::Error> {
    let mut statement = conn.preallocate()?;
    let Some(mut cursor) = statement.execute(sql, ())? else {
        return Ok(Vec::new());
    };

    let names = cursor
        .column_names()?
        .collect::<std::result::Result<Vec<String>, _>>()?;

    let mut columns = Vec::with_capacity(names.len());
    for (index, name) in (1u16..).zip(names) {
        let numeric = is_numeric(&cursor.col_data_type(index)?);
        columns.push((index, name, numeric));
    }

    let mut rows = Vec::new();
    let mut buf = Vec::new();
    while let Some(mut row) = cursor.next_row()? {
        let mut values = Vec::with_capacity(columns.len());
        for (index, name, numeric) in &columns {
            buf.clear();
            let value = if row.get_text(*index, &mut buf)? {
                Value::from_driver(&String::from_utf8_lossy(&buf), *numeric)
            } else {
                Value::Null
            };
            values.push((name.clone(), value));
        }
        rows.push(Row::new(values));
    }

    Ok(rows)
}
