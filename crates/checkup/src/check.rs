//! Checks bound to their tester, and the run that turns one into a result.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::{CheckConfig, parse_duration};
use crate::error::ConfigError;
use crate::result::CheckResult;
use crate::tester::{BoundTester, Service};

/// A validated check, bound to its tester and ready to be scheduled.
#[derive(Debug)]
pub struct Check {
    pub config: CheckConfig,
    pub product: String,
    pub interval: Duration,
    tester: BoundTester,
}

impl Check {
    pub fn init(product: impl Into<String>, config: CheckConfig) -> Result<Self, ConfigError> {
        let interval = parse_duration(&config.interval)?;
        let service: Service = config.service.parse()?;
        let tester = service.bind(&config)?;
        Ok(Self { config, product: product.into(), interval, tester })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Run every configured test once on behalf of `from`.
    pub async fn run(&self, from: &str) -> CheckResult {
        let outcome = self.tester.execute(&self.config.tests).await;
        let result = CheckResult {
            from: from.to_string(),
            host: self.config.host.clone(),
            product: self.product.clone(),
            group: self.config.group.clone(),
            date: Utc::now(),
            error: outcome.error.unwrap_or_default(),
            results: outcome.results,
        };
        debug!(
            "Check {}/{} finished: {} failing test(s){}",
            self.product,
            self.config.name,
            result.failures(),
            if result.error.is_empty() { String::new() } else { format!(", error: {}", result.error) }
        );
        result
    }
}

/// Initialise every check, leaving out the ones whose configuration is rejected.
pub fn init_all(checks: Vec<(String, CheckConfig)>) -> Vec<Arc<Check>> {
    let total = checks.len();
    let ready: Vec<Arc<Check>> = checks
        .into_iter()
        .filter_map(|(product, config)| {
            let name = config.name.clone();
            match Check::init(product.clone(), config) {
                Ok(check) => Some(Arc::new(check)),
                Err(e) => {
                    warn!("Cannot init check {}/{}: {}", product, name, e);
                    None
                }
            }
        })
        .collect();
    info!("Initialised {} of {} checks", ready.len(), total);
    ready
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::config::{Options, TestInfo};

    fn http_check(name: &str, interval: &str, test: &str) -> CheckConfig {
        let mut tests = BTreeMap::new();
        tests.insert(
            test.to_string(),
            TestInfo {
                problem: "Site is down".into(),
                arguments: Options::new().with("status", 200),
                ..Default::default()
            },
        );
        CheckConfig {
            name: name.into(),
            host: "web-1".into(),
            group: "frontend".into(),
            service: "http".into(),
            interval: interval.into(),
            tests,
            options: Options::new().with("Url", "http://127.0.0.1:9/").with("Timeout", "2s"),
        }
    }

    #[test]
    fn test_init_parses_interval_and_service() {
        let check = Check::init("shop", http_check("home", "90s", "http-check-status")).unwrap();
        assert_eq!(check.interval, Duration::from_secs(90));
        assert_eq!(check.product, "shop");
        assert_eq!(check.name(), "home");
    }

    #[test]
    fn test_init_rejects_bad_configuration() {
        let err = Check::init("shop", http_check("home", "0s", "http-check-status")).unwrap_err();
        assert!(matches!(err, ConfigError::Interval { .. }));

        let err = Check::init("shop", http_check("home", "soon", "http-check-status")).unwrap_err();
        assert!(matches!(err, ConfigError::Interval { .. }));

        let mut config = http_check("home", "10s", "http-check-status");
        config.service = "smtp".into();
        assert!(matches!(Check::init("shop", config), Err(ConfigError::UnknownService(_))));

        let err = Check::init("shop", http_check("home", "10s", "http-latency")).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownTest(_)));
    }

    #[test]
    fn test_init_all_skips_failures() {
        let checks = vec![
            ("shop".to_string(), http_check("home", "10s", "http-check-status")),
            ("shop".to_string(), http_check("cart", "10s", "http-latency")),
            ("blog".to_string(), http_check("feed", "30s", "http-check-status")),
        ];
        let ready = init_all(checks);
        let names: Vec<_> = ready.iter().map(|c| c.name()).collect();
        assert_eq!(names, ["home", "feed"]);
    }

    #[tokio::test]
    async fn test_run_records_set_up_failure() {
        let check = Check::init("shop", http_check("home", "10s", "http-check-status")).unwrap();
        let result = check.run("agent-1").await;

        assert_eq!(result.from, "agent-1");
        assert_eq!(result.host, "web-1");
        assert_eq!(result.product, "shop");
        assert_eq!(result.group, "frontend");
        assert!(result.results.is_empty());
        assert!(result.error.starts_with("cannot fire check request"));
    }
}
