//! JSON tester: fetch a document over HTTP, then check paths inside it.

use std::collections::HashMap;

use serde_json::Value;

use super::http::HttpRequest;
use super::{TestFn, Tester};
use crate::config::CheckConfig;
use crate::error::{ConfigError, ProbeError};
use crate::jsonpath::JsonPath;
use crate::result::TestResult;

/// Fetches a document over HTTP and checks paths inside it.
pub struct JsonTester {
    request: HttpRequest,
    tests: HashMap<String, TestFn<Value>>,
}

pub(crate) fn json_object_path(path: JsonPath) -> TestFn<Value> {
    Box::new(move |document: &Value| match path.resolve(document) {
        Ok(_) => TestResult::pass(),
        Err(miss) => TestResult::fail(miss.to_string()),
    })
}

#[async_trait::async_trait]
impl Tester for JsonTester {
    type Fixture = Value;

    fn init(check: &CheckConfig) -> Result<Self, ConfigError> {
        let request = HttpRequest::from_options(&check.options)?;
        let mut tests = HashMap::new();
        for (name, info) in &check.tests {
            let test = match name.as_str() {
                "json-object-path" => {
                    let raw = info.arguments.require_str("path").map_err(|e| e.in_test(name))?;
                    let path = JsonPath::parse(raw).map_err(|e| ConfigError::from(e).in_test(name))?;
                    json_object_path(path)
                }
                _ => return Err(ConfigError::UnknownTest(name.clone())),
            };
            tests.insert(name.clone(), test);
        }
        Ok(Self { request, tests })
    }

    async fn set_up(&self) -> Result<Value, ProbeError> {
        let response = self.request.send().await.map_err(|e| ProbeError::Fetch(Box::new(e)))?;
        serde_json::from_slice(&response.body).map_err(ProbeError::Decode)
    }

    async fn tear_down(&self, _document: Value) -> Result<(), ProbeError> {
        Ok(())
    }

    fn get(&self, name: &str) -> Option<&TestFn<Value>> {
        self.tests.get(name)
    }
}
