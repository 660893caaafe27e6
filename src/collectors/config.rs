use crate::collectors::COLLECTOR_NAMES;
use std::collections::HashSet;
use tracing::warn;

/// Sub-collections selected for this process, by registry name.
#[derive(Clone, Debug, Default)]
pub struct CollectorConfig {
    enabled: HashSet<&'static str>,
}

impl CollectorConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Select `collectors`; names outside the registry are ignored.
    #[must_use]
    pub fn with_enabled(mut self, collectors: &[String]) -> Self {
        self.enabled = collectors
            .iter()
            .filter_map(|name| {
                let known = COLLECTOR_NAMES.iter().find(|known| **known == name.trim());
                if known.is_none() {
                    warn!(collector = %name, "unknown collector ignored");
                }
                known.copied()
            })
            .collect();
        self
    }

    #[must_use]
    pub fn is_enabled(&self, name: &str) -> bool {
        self.enabled.contains(name)
    }

    /// Enabled names in scrape order.
    pub fn enabled(&self) -> impl Iterator<Item = &'static str> + '_ {
        COLLECTOR_NAMES
            .iter()
            .copied()
            .filter(|name| self.enabled.contains(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_enabled_follows_registry_order() {
        let config = CollectorConfig::new().with_enabled(&names(&["replication", "uptime", "locks"]));

        assert_eq!(
            config.enabled().collect::<Vec<_>>(),
            ["uptime", "locks", "replication"]
        );
        assert!(config.is_enabled("locks"));
        assert!(!config.is_enabled("buffers"));
    }

    #[test]
    fn test_unknown_names_are_ignored() {
        let config = CollectorConfig::new().with_enabled(&names(&["innodb", " mutexes "]));

        assert_eq!(config.enabled().collect::<Vec<_>>(), ["mutexes"]);
        assert!(!config.is_enabled("innodb"));
    }

    #[test]
    fn test_empty_config_enables_nothing() {
        assert_eq!(CollectorConfig::new().enabled().count(), 0);
    }
}
