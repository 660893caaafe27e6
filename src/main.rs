use anyhow::{Context, Result};
use informix_exporter::cli::{actions, start, telemetry};

fn main() -> Result<()> {
    let (action, level) = start()?;

    // SAFETY: still single threaded, the runtime is built below.
    unsafe { actions::run::prepare_environment(&action) }?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(async {
        telemetry::init(level)?;
        let result = actions::run::handle(action).await;
        telemetry::shutdown();
        result
    })
}
