use crate::collectors::{COLLECTOR_NAMES, Collector, all_factories};
use clap::{Arg, ArgAction, Command};

fn leak(s: String) -> &'static str {
    Box::leak(s.into_boxed_str())
}

/// Add a `--collector.<name>` / `--no-collector.<name>` pair per registered
/// sub-collection. The last of the pair on the command line wins.
pub fn add_collectors_args(cmd: Command) -> Command {
    let factories = all_factories();

    COLLECTOR_NAMES.iter().fold(cmd, |cmd, &name| {
        let enabled = factories
            .get(name)
            .is_some_and(|factory| factory().enabled_by_default());

        let enable = leak(format!("collector.{name}"));
        let disable = leak(format!("no-collector.{name}"));
        let state = if enabled { "enabled" } else { "disabled" };

        cmd.arg(
            Arg::new(enable)
                .long(enable)
                .help(leak(format!(
                    "Collect the {name} metrics [default: {state}]"
                )))
                .action(ArgAction::SetTrue)
                .default_value(if enabled { "true" } else { "false" }),
        )
        .arg(
            Arg::new(disable)
                .long(disable)
                .help(leak(format!("Skip the {name} metrics")))
                .action(ArgAction::SetTrue)
                .overrides_with(enable),
        )
    })
}
