use std::collections::HashMap;

use lambda_http::http::header::{HeaderValue, CONTENT_TYPE};
use lambda_http::http::StatusCode;
use lambda_http::{Body, Request, Response};

pub fn epoch_now() -> u64 {
    epoch_millis() / 1000
}

pub fn epoch_millis() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

pub fn resp_json(status: u16, v: serde_json::Value) -> Response<Body> {
    let mut resp = Response::new(Body::Text(v.to_string()));
    *resp.status_mut() = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    resp
}

pub fn not_found() -> Response<Body> {
    let mut resp = Response::new(Body::Text("Not Found".into()));
    *resp.status_mut() = StatusCode::NOT_FOUND;
    resp
}

/// Query string of the request, decoded. Repeated keys keep the last value.
pub fn query_params(req: &Request) -> HashMap<String, String> {
    let qs = req.uri().query().unwrap_or("");
    url::form_urlencoded::parse(qs.as_bytes())
        .into_owned()
        .collect()
}

pub fn body_bytes(req: &Request) -> Vec<u8> {
    match req.body() {
        Body::Text(s) => s.as_bytes().to_vec(),
        Body::Binary(b) => b.clone(),
        _ => Vec::new(),
    }
}

/// Trims whitespace and any trailing slash so paths can be appended with `/`.
pub fn trim_base(s: &str) -> String {
    s.trim().trim_end_matches('/').to_string()
}
