#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use bytes::Bytes;
use chainrouter::{sync_handler, HandlerUnit, Next};
use http::{Method, StatusCode};
use serde_json::{json, Value};

/// Build a transport-level request with optional headers
pub fn request(method: Method, uri: &str, headers: &[(&str, &str)]) -> http::Request<Bytes> {
    let mut builder = http::Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Bytes::new()).unwrap()
}

pub fn json_body(res: &http::Response<Bytes>) -> Value {
    serde_json::from_slice(res.body()).unwrap()
}

/// Shared log of unit tags in execution order
pub type CallLog = Arc<Mutex<Vec<&'static str>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn calls(log: &CallLog) -> Vec<&'static str> {
    log.lock().unwrap().clone()
}

/// Unit that records `tag` and continues
pub fn record(log: &CallLog, tag: &'static str) -> HandlerUnit {
    let log = Arc::clone(log);
    sync_handler(move |_, _| {
        log.lock().unwrap().push(tag);
        Next::Continue
    })
}

/// Unit that records `tag` and answers `{"route": tag, "params": {...}}`
pub fn respond(log: &CallLog, tag: &'static str) -> HandlerUnit {
    let log = Arc::clone(log);
    sync_handler(move |req, res| {
        log.lock().unwrap().push(tag);
        let params: serde_json::Map<String, Value> = req
            .params()
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.clone())))
            .collect();
        res.send(StatusCode::OK, &json!({ "route": tag, "params": params }))
    })
}
