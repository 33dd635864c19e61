//! Collector registry and report aggregation.
//!
//! The aggregator owns the set of registered collectors, decides from the
//! enabled-flags map which ones run, executes them sequentially in
//! registration order and merges their outcomes into one report. A failing
//! collector becomes an error entry under its own key; it never aborts the
//! run or disturbs the other collectors.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::collector::{Collector, CollectorConfig, CollectorError, CollectorResult};

/// Suffix appended to a collector id to form its report key.
const REPORT_KEY_SUFFIX: &str = "_debug_data";

/// Final report: one `"<id>_debug_data"` entry per active collector, in
/// registration order. Ready for serialization as-is.
pub type AggregateReport = Map<String, Value>;

#[derive(Debug, Error)]
pub enum AggregateError {
    /// A second collector was registered under an existing id.
    #[error("collector '{0}' is already registered")]
    DuplicateCollector(String),
    /// The configuration enables an id no registered collector answers to.
    #[error("collector '{0}' is enabled in the configuration but not registered")]
    UnknownCollector(String),
}

/// Terminal state of one collector's execution.
#[derive(Debug)]
pub enum CollectorOutcome {
    Success(CollectorResult),
    Failure(CollectorError),
}

impl CollectorOutcome {
    /// Report payload: the collector's result, or its error description.
    pub fn into_value(self) -> Value {
        match self {
            CollectorOutcome::Success(result) => Value::Object(result),
            CollectorOutcome::Failure(e) => e.to_description(),
        }
    }
}

/// All collectors known to the process, in registration order.
///
/// Registration order is the report key order, so the registry is assembled
/// once at startup and treated as read-only afterwards.
#[derive(Default)]
pub struct Registry {
    collectors: Vec<Box<dyn Collector>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a collector. Ids are unique; a duplicate is rejected rather
    /// than silently overwriting the earlier registration.
    pub fn register(&mut self, collector: Box<dyn Collector>) -> Result<(), AggregateError> {
        let id = collector.id();
        if self.contains(id) {
            return Err(AggregateError::DuplicateCollector(id.to_string()));
        }
        debug!("registered collector '{}'", id);
        self.collectors.push(collector);
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.collectors.iter().any(|c| c.id() == id)
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.collectors.iter().map(|c| c.id()).collect()
    }
}

/// Runs every enabled collector and assembles the report.
///
/// Enabled ids must all be registered; an unknown id is a configuration
/// error and fails the whole run before any collector executes. Ids absent
/// from `enabled` (or mapped to `false`) are skipped. Per-collector
/// failures are contained: the report carries an `{"error", "type"}` entry
/// for them and the run still succeeds.
pub fn run(
    registry: &Registry,
    enabled: &BTreeMap<String, bool>,
    config: &CollectorConfig,
) -> Result<AggregateReport, AggregateError> {
    for (id, &on) in enabled {
        if on && !registry.contains(id) {
            return Err(AggregateError::UnknownCollector(id.clone()));
        }
    }

    let mut report = AggregateReport::new();
    for collector in &registry.collectors {
        let id = collector.id();
        if !enabled.get(id).copied().unwrap_or(false) {
            debug!("collector '{}' disabled, skipping", id);
            continue;
        }

        info!("running collector '{}'", id);
        let outcome = match collector.collect(config) {
            Ok(result) => CollectorOutcome::Success(result),
            Err(e) => {
                warn!("collector '{}' failed: {}", id, e);
                CollectorOutcome::Failure(e)
            }
        };
        report.insert(format!("{}{}", id, REPORT_KEY_SUFFIX), outcome.into_value());
    }

    info!("aggregated {} collector(s)", report.len());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct StaticCollector {
        id: &'static str,
        answer: &'static str,
    }

    impl Collector for StaticCollector {
        fn id(&self) -> &'static str {
            self.id
        }

        fn collect(&self, _config: &CollectorConfig) -> Result<CollectorResult, CollectorError> {
            let mut result = CollectorResult::new();
            result.insert("answer".into(), self.answer.into());
            Ok(result)
        }
    }

    struct FailingCollector;

    impl Collector for FailingCollector {
        fn id(&self) -> &'static str {
            "broken"
        }

        fn collect(&self, _config: &CollectorConfig) -> Result<CollectorResult, CollectorError> {
            Err(CollectorError::Execution("probe exploded".into()))
        }
    }

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry
            .register(Box::new(StaticCollector { id: "system", answer: "sys" }))
            .unwrap();
        registry
            .register(Box::new(StaticCollector { id: "python", answer: "py" }))
            .unwrap();
        registry.register(Box::new(FailingCollector)).unwrap();
        registry
    }

    fn enabled(pairs: &[(&str, bool)]) -> BTreeMap<String, bool> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn config() -> CollectorConfig {
        CollectorConfig::new("/project")
    }

    #[test]
    fn active_collectors_each_produce_one_entry() {
        let report = run(
            &registry(),
            &enabled(&[("system", true), ("python", true)]),
            &config(),
        )
        .unwrap();

        assert_eq!(report.len(), 2);
        assert_eq!(report["system_debug_data"]["answer"], "sys");
        assert_eq!(report["python_debug_data"]["answer"], "py");
    }

    #[test]
    fn disabled_collector_is_skipped() {
        let report = run(
            &registry(),
            &enabled(&[("system", true), ("python", false)]),
            &config(),
        )
        .unwrap();

        assert_eq!(report.keys().collect::<Vec<_>>(), ["system_debug_data"]);
    }

    #[test]
    fn unlisted_collector_defaults_to_disabled() {
        let report = run(&registry(), &enabled(&[("python", true)]), &config()).unwrap();
        assert_eq!(report.keys().collect::<Vec<_>>(), ["python_debug_data"]);
    }

    #[test]
    fn failure_is_recorded_and_isolated() {
        let report = run(
            &registry(),
            &enabled(&[("system", true), ("broken", true)]),
            &config(),
        )
        .unwrap();

        assert_eq!(report.len(), 2);
        assert_eq!(report["system_debug_data"]["answer"], "sys");
        assert_eq!(
            report["broken_debug_data"],
            json!({"error": "probe exploded", "type": "execution_error"})
        );
    }

    #[test]
    fn no_enabled_collectors_yields_empty_report() {
        let report = run(&registry(), &BTreeMap::new(), &config()).unwrap();
        assert!(report.is_empty());
    }

    #[test]
    fn unknown_enabled_id_is_fatal() {
        let err = run(&registry(), &enabled(&[("rust", true)]), &config()).unwrap_err();
        assert!(matches!(err, AggregateError::UnknownCollector(id) if id == "rust"));
    }

    #[test]
    fn unknown_disabled_id_is_ignored() {
        let report = run(
            &registry(),
            &enabled(&[("rust", false), ("system", true)]),
            &config(),
        )
        .unwrap();
        assert_eq!(report.len(), 1);
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = registry();
        let err = registry
            .register(Box::new(StaticCollector { id: "system", answer: "again" }))
            .unwrap_err();
        assert!(matches!(err, AggregateError::DuplicateCollector(id) if id == "system"));
    }

    #[test]
    fn report_key_order_follows_registration_order() {
        let all = enabled(&[("system", true), ("python", true), ("broken", true)]);
        let first = run(&registry(), &all, &config()).unwrap();
        let second = run(&registry(), &all, &config()).unwrap();

        let keys: Vec<_> = first.keys().collect();
        assert_eq!(
            keys,
            ["system_debug_data", "python_debug_data", "broken_debug_data"]
        );
        assert_eq!(keys, second.keys().collect::<Vec<_>>());
    }
}
