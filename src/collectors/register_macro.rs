/// Declares every sub-collection module and generates the dispatch enum,
/// the name registry and the factories. Declaration order is scrape order.
macro_rules! register_collectors {
    (
        $(
            $module:ident => $collector_type:ident
        ),* $(,)?
    ) => {
        $(
            pub mod $module;
            pub use $module::$collector_type;
        )*

        #[derive(Clone)]
        pub enum CollectorType {
            $(
                $collector_type($collector_type),
            )*
        }

        impl CollectorType {
            /// Build the sub-collection registered as `name`.
            #[must_use]
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $(
                        stringify!($module) => Some(Self::$collector_type($collector_type::new())),
                    )*
                    _ => None,
                }
            }
        }

        impl Collector for CollectorType {
            fn name(&self) -> &'static str {
                match self {
                    $(
                        Self::$collector_type(c) => c.name(),
                    )*
                }
            }

            fn collect<'a, 's: 'a>(
                &'a self,
                scrape: &'a mut Scrape<'s>,
            ) -> BoxFuture<'a, Result<Vec<MetricFamily>>> {
                match self {
                    $(
                        Self::$collector_type(c) => c.collect(scrape),
                    )*
                }
            }

            fn enabled_by_default(&self) -> bool {
                match self {
                    $(
                        Self::$collector_type(c) => c.enabled_by_default(),
                    )*
                }
            }
        }

        pub fn all_factories() -> HashMap<&'static str, fn() -> CollectorType> {
            HashMap::from([
                $(
                    (
                        stringify!($module),
                        (|| CollectorType::$collector_type($collector_type::new())) as fn() -> CollectorType,
                    ),
                )*
            ])
        }

        pub const COLLECTOR_NAMES: &[&'static str] = &[
            $(stringify!($module),)*
        ];
    };
}

#[cfg(test)]
mod tests {
    use crate::collectors::{COLLECTOR_NAMES, Collector, CollectorType, all_factories};

    #[test]
    fn test_registry_is_consistent() {
        let factories = all_factories();
        assert_eq!(factories.len(), COLLECTOR_NAMES.len());

        for name in COLLECTOR_NAMES {
            let built = factories.get(name).map(|factory| factory().name());
            assert_eq!(built, Some(*name));
        }
    }

    #[test]
    fn test_replication_runs_last() {
        assert_eq!(COLLECTOR_NAMES.first(), Some(&"uptime"));
        assert_eq!(COLLECTOR_NAMES.last(), Some(&"replication"));
        assert_eq!(COLLECTOR_NAMES.len(), 14);
    }

    #[test]
    fn test_from_name() {
        assert_eq!(
            CollectorType::from_name("vpu_class").map(|c| c.name()),
            Some("vpu_class")
        );
        assert!(CollectorType::from_name("innodb").is_none());
    }

    #[test]
    fn test_every_collector_enabled_by_default() {
        for (name, factory) in &all_factories() {
            assert!(factory().enabled_by_default(), "{name} should be on by default");
        }
    }
}
