//! Check request building, response normalization and countdown arithmetic
//! against JSON vectors stored in `test-vectors/`.
//!
//! Bodies are compared as parsed JSON, not raw strings, so field order does
//! not matter.

use chrono::DateTime;
use portfolio_core::{
    response, ApiClient, Countdown, ErrorKind, HttpMethod, HttpResponse, Phase, RecurringDate,
    UreqTransport,
};
use serde_json::Value;

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn parse_headers(value: &Value) -> Vec<(String, String)> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|h| {
            let arr = h.as_array().unwrap();
            (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
        })
        .collect()
}

fn parse_kind(s: &str) -> ErrorKind {
    match s {
        "network" => ErrorKind::NetworkFailure,
        "http" => ErrorKind::HttpStatusFailure,
        "decode" => ErrorKind::DecodeFailure,
        other => panic!("unknown error kind: {other}"),
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[test]
fn request_test_vectors() {
    let raw = include_str!("../../test-vectors/requests.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let c = ApiClient::new(vectors["base_url"].as_str().unwrap(), UreqTransport::new());
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let input = &case["input"];
        let expected = &case["expected_request"];

        let body = Some(&input["body"]).filter(|b| !b.is_null());
        let req = c.build_request(
            parse_method(input["method"].as_str().unwrap()),
            input["endpoint"].as_str().unwrap(),
            body,
            &parse_headers(&input["headers"]),
        );

        assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.url, expected["url"].as_str().unwrap(), "{name}: url");
        assert_eq!(req.headers, parse_headers(&expected["headers"]), "{name}: headers");

        match req.body.as_deref() {
            Some(body) => {
                let sent: Value = serde_json::from_str(body).unwrap();
                assert_eq!(sent, expected["body"], "{name}: body");
            }
            None => assert!(expected["body"].is_null(), "{name}: body should be None"),
        }
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

#[test]
fn normalize_test_vectors() {
    let raw = include_str!("../../test-vectors/normalize.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let sim = &case["response"];
        let resp = HttpResponse::new(
            sim["status"].as_u64().unwrap() as u16,
            sim["body"].as_str().unwrap(),
        );
        let result = response::normalize(&resp);

        if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            assert_eq!(err.kind(), parse_kind(expected_error["kind"].as_str().unwrap()), "{name}: kind");
            assert_eq!(
                err.status(),
                expected_error["status"].as_u64().map(|s| s as u16),
                "{name}: status"
            );
            if let Some(message) = expected_error["message"].as_str() {
                assert_eq!(err.to_string(), message, "{name}: message");
            }
        } else {
            assert_eq!(result.unwrap(), case["expected_result"], "{name}: result");
        }
    }
}

// ---------------------------------------------------------------------------
// Countdown
// ---------------------------------------------------------------------------

#[test]
fn countdown_test_vectors() {
    let raw = include_str!("../../test-vectors/countdown.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let target = RecurringDate::new(
            case["target"][0].as_u64().unwrap() as u32,
            case["target"][1].as_u64().unwrap() as u32,
        )
        .unwrap();
        let now = DateTime::parse_from_rfc3339(case["now"].as_str().unwrap()).unwrap();

        let expected = match &case["expected"] {
            Value::String(s) if s == "today" => Phase::Today,
            other => Phase::Counting(serde_json::from_value::<Countdown>(other.clone()).unwrap()),
        };
        assert_eq!(target.phase(&now), expected, "{name}");
    }
}
