mod common;

use checkup::{Check, CheckConfig};

fn check(json: serde_json::Value) -> Check {
    let config: CheckConfig = serde_json::from_value(json).unwrap();
    Check::init("shop", config).unwrap()
}

#[actix_web::test]
async fn test_http_status_and_body() {
    let addr = common::target();
    let check = check(serde_json::json!({
        "Name": "home",
        "Host": "web-1",
        "Group": "frontend",
        "Service": "http",
        "Interval": "10s",
        "Tests": {
            "http-check-status": {"Arguments": {"status": 200}},
            "http-body-contains": {"Problem": "Not ready", "Suggestion": "Wait",
                                   "Arguments": {"value": "starting"}}
        },
        "Options": {"Url": format!("http://{addr}/health")}
    }));

    let result = check.run("agent-1").await;
    assert!(result.error.is_empty());
    assert_eq!(result.results.len(), 2);

    let body = &result.results[0];
    assert_eq!(body.name, "http-body-contains");
    assert_eq!(body.status, 500);
    assert_eq!(body.error, "Body does not contain 'starting'");
    assert_eq!(body.problem, "Not ready");
    assert_eq!(body.suggestion, "Wait");

    let status = &result.results[1];
    assert_eq!(status.name, "http-check-status");
    assert!(status.passed());
    assert!(status.problem.is_empty());
}

#[actix_web::test]
async fn test_http_status_mismatch() {
    let addr = common::target();
    let check = check(serde_json::json!({
        "Name": "missing",
        "Service": "http",
        "Interval": "10s",
        "Tests": {"http-check-status": {"Arguments": {"status": 200}}},
        "Options": {"Url": format!("http://{addr}/nothing-here")}
    }));

    let result = check.run("agent-1").await;
    assert_eq!(result.results[0].error, "HTTP status is '404 Not Found' not 200");
}

#[actix_web::test]
async fn test_http_host_override() {
    let addr = common::target();
    let check = check(serde_json::json!({
        "Name": "vhost",
        "Service": "http",
        "Interval": "10s",
        "Tests": {"http-check-status": {"Arguments": {"status": 200}}},
        "Options": {"Url": "http://status.example/vhost", "Host": addr.to_string()}
    }));

    let result = check.run("agent-1").await;
    assert!(result.error.is_empty(), "{}", result.error);
    assert!(result.passed());
}

#[actix_web::test]
async fn test_json_object_path() {
    let addr = common::target();
    let check = check(serde_json::json!({
        "Name": "api",
        "Service": "json",
        "Interval": "10s",
        "Tests": {
            "json-object-path": {"Arguments": {"path": "data.nodes.0.id"}}
        },
        "Options": {"Url": format!("http://{addr}/status.json")}
    }));
    assert!(check.run("agent-1").await.passed());

    let missing = self::check(serde_json::json!({
        "Name": "api",
        "Service": "json",
        "Interval": "10s",
        "Tests": {"json-object-path": {"Arguments": {"path": "data.nodes.1.id"}}},
        "Options": {"Url": format!("http://{addr}/status.json")}
    }));
    let result = missing.run("agent-1").await;
    assert_eq!(
        result.results[0].error,
        "JSON object only contains path 'data.nodes', not '...1.id'"
    );
}

#[actix_web::test]
async fn test_json_decode_failure_is_a_run_error() {
    let addr = common::target();
    let check = check(serde_json::json!({
        "Name": "api",
        "Service": "json",
        "Interval": "10s",
        "Tests": {"json-object-path": {"Arguments": {"path": "data"}}},
        "Options": {"Url": format!("http://{addr}/health")}
    }));

    let result = check.run("agent-1").await;
    assert!(result.results.is_empty());
    assert!(result.error.starts_with("cannot unmarshal JSON"));
}
