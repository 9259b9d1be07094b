//! HTTP tester: one request per run, tests on status and body.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::{HOST, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode, redirect};
use tracing::debug;
use url::Url;

use super::{TestFn, Tester};
use crate::config::{CheckConfig, Options};
use crate::error::{ConfigError, ProbeError};
use crate::result::TestResult;

/// Applied when a check sets no `Timeout` option.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A request compiled from check options, fired once per run.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    client: reqwest::Client,
    method: Method,
    url: Url,
    headers: HeaderMap,
}

/// What one request returned.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// Reads `Url`, `Host`, `Method`, `Headers` and `Timeout`.
    pub fn from_options(options: &Options) -> Result<Self, ConfigError> {
        let raw_url = options.require_str("Url")?;
        let mut url = Url::parse(raw_url)
            .map_err(|source| ConfigError::Url { url: raw_url.to_string(), source })?;

        let mut headers = HeaderMap::new();
        for (name, value) in options.string_map("Headers")? {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ConfigError::Header(name.clone()))?;
            let header_value =
                HeaderValue::from_str(&value).map_err(|_| ConfigError::Header(name.clone()))?;
            headers.insert(header_name, header_value);
        }

        // The request goes to `Host`; the authority from `Url` is what the
        // server sees in the Host header.
        if let Some(host) = options.optional_str("Host")? {
            let original = swap_authority(&mut url, host)?;
            let value = HeaderValue::from_str(&original)
                .map_err(|_| ConfigError::HostOverride(host.to_string()))?;
            headers.insert(HOST, value);
        }

        let method = match options.optional_str("Method")? {
            Some(m) => Method::from_bytes(m.to_ascii_uppercase().as_bytes())
                .map_err(|_| ConfigError::Method(m.to_string()))?,
            None => Method::GET,
        };

        let timeout = options.duration("Timeout")?.unwrap_or(DEFAULT_TIMEOUT);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(redirect::Policy::none())
            .build()
            .map_err(ConfigError::Client)?;

        Ok(Self { client, method, url, headers })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub async fn send(&self) -> Result<HttpResponse, ProbeError> {
        debug!("Firing {} {}", self.method, self.url);
        let response = self
            .client
            .request(self.method.clone(), self.url.clone())
            .headers(self.headers.clone())
            .send()
            .await
            .map_err(ProbeError::Request)?;
        let status = response.status();
        let body = response.bytes().await.map_err(ProbeError::Body)?;
        Ok(HttpResponse { status, body: body.to_vec() })
    }
}

/// Point `url` at `host` and return the authority it had before.
fn swap_authority(url: &mut Url, host: &str) -> Result<String, ConfigError> {
    let previous = match (url.host_str(), url.port()) {
        (Some(h), Some(p)) => format!("{h}:{p}"),
        (Some(h), None) => h.to_string(),
        (None, _) => return Err(ConfigError::HostOverride(host.to_string())),
    };

    let target = Url::parse(&format!("{}://{}", url.scheme(), host))
        .map_err(|_| ConfigError::HostOverride(host.to_string()))?;
    url.set_host(target.host_str()).map_err(|_| ConfigError::HostOverride(host.to_string()))?;
    url.set_port(target.port()).map_err(|_| ConfigError::HostOverride(host.to_string()))?;
    Ok(previous)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|window| window == needle)
}

fn status_argument(args: &Options) -> Result<StatusCode, ConfigError> {
    let value = args.require_number("status")?;
    let invalid = || ConfigError::WrongType { field: "status".into(), expected: "an HTTP status code" };
    if value.fract() != 0.0 || !(100.0..=999.0).contains(&value) {
        return Err(invalid());
    }
    StatusCode::from_u16(value as u16).map_err(|_| invalid())
}

pub(crate) fn http_check_status(expected: StatusCode) -> TestFn<HttpResponse> {
    Box::new(move |response: &HttpResponse| {
        if response.status == expected {
            TestResult::pass()
        } else {
            TestResult::fail(format!(
                "HTTP status is '{}' not {}",
                response.status,
                expected.as_u16()
            ))
        }
    })
}

pub(crate) fn http_body_contains(value: String) -> TestFn<HttpResponse> {
    Box::new(move |response: &HttpResponse| {
        if contains(&response.body, value.as_bytes()) {
            TestResult::pass()
        } else {
            TestResult::fail(format!("Body does not contain '{value}'"))
        }
    })
}

pub struct HttpTester {
    request: HttpRequest,
    tests: HashMap<String, TestFn<HttpResponse>>,
}

#[async_trait::async_trait]
impl Tester for HttpTester {
    type Fixture = HttpResponse;

    fn init(check: &CheckConfig) -> Result<Self, ConfigError> {
        let request = HttpRequest::from_options(&check.options)?;
        let mut tests = HashMap::new();
        for (name, info) in &check.tests {
            let args = &info.arguments;
            let test = match name.as_str() {
                "http-check-status" => {
                    http_check_status(status_argument(args).map_err(|e| e.in_test(name))?)
                }
                "http-body-contains" => {
                    let value = args.require_str("value").map_err(|e| e.in_test(name))?;
                    http_body_contains(value.to_string())
                }
                _ => return Err(ConfigError::UnknownTest(name.clone())),
            };
            tests.insert(name.clone(), test);
        }
        Ok(Self { request, tests })
    }

    async fn set_up(&self) -> Result<HttpResponse, ProbeError> {
        self.request.send().await
    }

    async fn tear_down(&self, _response: HttpResponse) -> Result<(), ProbeError> {
        Ok(())
    }

    fn get(&self, name: &str) -> Option<&TestFn<HttpResponse>> {
        self.tests.get(name)
    }
}
