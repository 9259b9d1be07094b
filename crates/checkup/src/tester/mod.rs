//! Protocol testers.
//!
//! A tester turns the `Options` and `Tests` of a check into:
//! - one protocol action per run (`set_up`), whose outcome is the fixture
//! - one compiled function per configured test, evaluated against the fixture
//! - cleanup of per-run resources (`tear_down`)
//!
//! Options and test arguments are validated once in `init`, so a run can
//! only fail on the network or database, never on configuration.

pub mod http;
pub mod json;
pub mod sql;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use tracing::error;

pub use http::HttpTester;
pub use json::JsonTester;
pub use sql::{SqlBackend, SqlTester};

use crate::config::{CheckConfig, TestInfo};
use crate::error::{ConfigError, ProbeError};
use crate::result::TestResult;

/// A compiled test, evaluated against the fixture of one run.
pub type TestFn<F> = Box<dyn Fn(&F) -> TestResult + Send + Sync>;

/// The four-operation contract every protocol implements.
#[async_trait::async_trait]
pub trait Tester: Sized + Send + Sync {
    /// Whatever `set_up` fetched, shared by all tests of the run
    type Fixture: Send;

    /// Validate options and compile every configured test.
    fn init(check: &CheckConfig) -> Result<Self, ConfigError>;

    /// Perform the protocol action for one run.
    async fn set_up(&self) -> Result<Self::Fixture, ProbeError>;

    /// Release per-run resources.
    async fn tear_down(&self, fixture: Self::Fixture) -> Result<(), ProbeError>;

    /// The compiled function for a test name.
    fn get(&self, name: &str) -> Option<&TestFn<Self::Fixture>>;
}

/// Known service kinds, selected by a check's `Service` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    Http,
    Json,
    Mysql,
    Libsql,
}

impl Service {
    pub fn name(self) -> &'static str {
        match self {
            Service::Http => "http",
            Service::Json => "json",
            Service::Mysql => "mysql",
            Service::Libsql => "libsql",
        }
    }

    /// Build the tester for `check`.
    pub fn bind(self, check: &CheckConfig) -> Result<BoundTester, ConfigError> {
        Ok(match self {
            Service::Http => BoundTester::Http(HttpTester::init(check)?),
            Service::Json => BoundTester::Json(JsonTester::init(check)?),
            Service::Mysql | Service::Libsql => BoundTester::Sql(SqlTester::init(check)?),
        })
    }
}

impl FromStr for Service {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(Service::Http),
            "json" => Ok(Service::Json),
            "mysql" => Ok(Service::Mysql),
            "libsql" => Ok(Service::Libsql),
            other => Err(ConfigError::UnknownService(other.to_string())),
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A tester bound to one check.
pub enum BoundTester {
    Http(HttpTester),
    Json(JsonTester),
    Sql(SqlTester),
}

impl fmt::Debug for BoundTester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            BoundTester::Http(_) => "Http",
            BoundTester::Json(_) => "Json",
            BoundTester::Sql(_) => "Sql",
        };
        f.debug_tuple("BoundTester").field(&kind).finish()
    }
}

/// What one run produced.
#[derive(Debug, Default)]
pub struct Outcome {
    pub results: Vec<TestResult>,
    pub error: Option<String>,
}

impl BoundTester {
    pub async fn execute(&self, tests: &BTreeMap<String, TestInfo>) -> Outcome {
        match self {
            BoundTester::Http(tester) => execute(tester, tests).await,
            BoundTester::Json(tester) => execute(tester, tests).await,
            BoundTester::Sql(tester) => execute(tester, tests).await,
        }
    }
}

/// Run `set_up`, every test in name order, then `tear_down`.
pub async fn execute<T: Tester>(tester: &T, tests: &BTreeMap<String, TestInfo>) -> Outcome {
    let fixture = match tester.set_up().await {
        Ok(fixture) => fixture,
        Err(e) => return Outcome { results: Vec::new(), error: Some(e.to_string()) },
    };

    let mut results = Vec::with_capacity(tests.len());
    for (name, info) in tests {
        let mut result = match tester.get(name) {
            Some(test) => test(&fixture),
            None => {
                error!("No compiled test function for {}", name);
                TestResult::fail(format!("test {name} was not compiled"))
            }
        };
        result.name = name.clone();
        if !result.passed() {
            result.problem = info.problem.clone();
            result.suggestion = info.suggestion.clone();
        }
        results.push(result);
    }

    let error = tester.tear_down(fixture).await.err().map(|e| e.to_string());
    Outcome { results, error }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;
    use crate::config::Options;

    /// Passes or fails by configuration and records the calls it received.
    struct StubTester {
        fail_set_up: bool,
        fail_tear_down: bool,
        tests: HashMap<String, TestFn<u32>>,
        calls: Mutex<Vec<&'static str>>,
    }

    #[async_trait::async_trait]
    impl Tester for StubTester {
        type Fixture = u32;

        fn init(check: &CheckConfig) -> Result<Self, ConfigError> {
            let mut tests: HashMap<String, TestFn<u32>> = HashMap::new();
            for name in check.tests.keys() {
                let test: TestFn<u32> = match name.as_str() {
                    "pass" => Box::new(|_: &u32| TestResult::pass()),
                    "fail" => Box::new(|n: &u32| TestResult::fail(format!("got {n}"))),
                    other => return Err(ConfigError::UnknownTest(other.to_string())),
                };
                tests.insert(name.clone(), test);
            }
            Ok(Self {
                fail_set_up: check.options.contains("FailSetUp"),
                fail_tear_down: check.options.contains("FailTearDown"),
                tests,
                calls: Mutex::new(Vec::new()),
            })
        }

        async fn set_up(&self) -> Result<u32, ProbeError> {
            self.calls.lock().unwrap().push("set_up");
            if self.fail_set_up {
                return Err(ProbeError::Connect("refused".into()));
            }
            Ok(7)
        }

        async fn tear_down(&self, _fixture: u32) -> Result<(), ProbeError> {
            self.calls.lock().unwrap().push("tear_down");
            if self.fail_tear_down {
                return Err(ProbeError::Close("broken pipe".into()));
            }
            Ok(())
        }

        fn get(&self, name: &str) -> Option<&TestFn<u32>> {
            self.tests.get(name)
        }
    }

    fn check(options: Options) -> CheckConfig {
        let mut tests = BTreeMap::new();
        tests.insert("pass".to_string(), TestInfo { problem: "p1".into(), ..Default::default() });
        tests.insert(
            "fail".to_string(),
            TestInfo { problem: "Broken".into(), suggestion: "Fix it".into(), ..Default::default() },
        );
        CheckConfig {
            name: "stub".into(),
            service: "stub".into(),
            interval: "1s".into(),
            tests,
            options,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_results_follow_name_order_and_copy_problem_on_failure() {
        let config = check(Options::new());
        let tester = StubTester::init(&config).unwrap();
        let outcome = execute(&tester, &config.tests).await;

        assert!(outcome.error.is_none());
        let names: Vec<_> = outcome.results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["fail", "pass"]);

        let failed = &outcome.results[0];
        assert_eq!(failed.status, 500);
        assert_eq!(failed.error, "got 7");
        assert_eq!(failed.problem, "Broken");
        assert_eq!(failed.suggestion, "Fix it");

        let passed = &outcome.results[1];
        assert!(passed.passed());
        assert!(passed.problem.is_empty());

        assert_eq!(*tester.calls.lock().unwrap(), ["set_up", "tear_down"]);
    }

    #[tokio::test]
    async fn test_set_up_failure_short_circuits() {
        let config = check(Options::new().with("FailSetUp", true));
        let tester = StubTester::init(&config).unwrap();
        let outcome = execute(&tester, &config.tests).await;

        assert!(outcome.results.is_empty());
        assert_eq!(outcome.error.as_deref(), Some("cannot open connection: refused"));
        assert_eq!(*tester.calls.lock().unwrap(), ["set_up"]);
    }

    #[tokio::test]
    async fn test_tear_down_error_keeps_results() {
        let config = check(Options::new().with("FailTearDown", true));
        let tester = StubTester::init(&config).unwrap();
        let outcome = execute(&tester, &config.tests).await;

        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.error.as_deref(), Some("cannot close connection: broken pipe"));
    }

    #[test]
    fn test_service_names() {
        for service in [Service::Http, Service::Json, Service::Mysql, Service::Libsql] {
            assert_eq!(service.name().parse::<Service>().unwrap(), service);
        }
        assert!(matches!("ftp".parse::<Service>(), Err(ConfigError::UnknownService(_))));
    }
}
