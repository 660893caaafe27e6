pub mod run;

use crate::collectors::util::ConnectionDescriptor;
use std::path::PathBuf;

#[derive(Debug)]
pub enum Action {
    Run {
        port: u16,
        listen: Option<String>,
        descriptor: ConnectionDescriptor,
        dbhostname: Option<String>,
        ha_alias: Option<String>,
        server_version: i64,
        odbc_driver: String,
        informixdir: PathBuf,
        sqlhosts_dir: PathBuf,
        collectors: Vec<String>,
    },
}
