pub mod actions;
pub mod commands;
pub mod dispatch;
pub mod telemetry;

use crate::cli::actions::Action;
use anyhow::Result;
use tracing::Level;

/// Parse the command line into an action and the requested log level.
///
/// # Errors
///
/// Returns an error if the arguments do not describe a runnable exporter.
pub fn start() -> Result<(Action, Level)> {
    let matches = commands::new().get_matches();

    let level = match matches.get_count("verbose") {
        0 => Level::ERROR,
        1 => Level::WARN,
        2 => Level::INFO,
        3 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let action = dispatch::handler(&matches)?;

    Ok((action, level))
}
