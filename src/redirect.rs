//! `GET /api/frame/redirect?t=<token>&p=<platform>&c=<creator>`
//!
//! Stateless: the same unexpired token may be redeemed any number of times.

use std::collections::HashMap;

use lambda_http::http::header::{HeaderValue, CACHE_CONTROL, LOCATION};
use lambda_http::{Body, Error, Request, Response};
use serde_json::json;

use crate::config::Settings;
use crate::error::BlinkError;
use crate::platform::{self, PlatformEntry};
use crate::token::RedirectToken;
use crate::util::{query_params, resp_json};

pub const REDIRECT_ROUTE: &str = "/api/frame/redirect";

#[derive(Debug, Default, Clone)]
pub struct RedirectQuery {
    pub token: Option<String>,
    pub platform: Option<String>,
    pub creator: Option<String>,
}

impl RedirectQuery {
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        Self {
            token: params.get("t").cloned(),
            platform: params.get("p").cloned(),
            creator: params.get("c").cloned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub platform: &'static PlatformEntry,
    pub location: String,
}

fn present(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.is_empty())
}

pub fn verify(q: &RedirectQuery, now_millis: u64, ttl_ms: u64) -> Result<Redirect, BlinkError> {
    let (Some(t), Some(p), Some(c)) = (
        present(&q.token),
        present(&q.platform),
        present(&q.creator),
    ) else {
        return Err(BlinkError::missing("t, p and c are required"));
    };

    let issued_at = RedirectToken::from_raw(t).issued_at()?;
    // Tokens stamped in the future are accepted; pre-epoch stamps are just old.
    if i128::from(now_millis) - i128::from(issued_at) > i128::from(ttl_ms) {
        return Err(BlinkError::ExpiredToken);
    }

    let platform = platform::resolve(p);
    Ok(Redirect {
        platform,
        location: platform.creator_url(c),
    })
}

pub fn render(outcome: Result<Redirect, BlinkError>) -> Result<Response<Body>, Error> {
    let redirect = match outcome {
        Ok(r) => r,
        Err(e) => {
            match &e {
                BlinkError::MalformedToken(detail) => tracing::error!("Redirect error: {detail}"),
                other => tracing::info!("redirect rejected: {other}"),
            }
            return Ok(resp_json(e.status(), e.body()));
        }
    };

    let location = match HeaderValue::from_str(&redirect.location) {
        Ok(v) => v,
        Err(e) => {
            tracing::error!("Redirect error: location {:?}: {e}", redirect.location);
            return Ok(resp_json(500, json!({"error": "Internal server error"})));
        }
    };

    Response::builder()
        .status(302)
        .header(LOCATION, location)
        .header("Content-Security-Policy", "frame-ancestors 'none'")
        .header("X-Frame-Options", "DENY")
        .header(CACHE_CONTROL, "no-store")
        .body(Body::Empty)
        .map_err(|e| Error::from(format!("resp: {e}")))
}

pub async fn frame_redirect(
    req: Request,
    settings: &Settings,
    now_millis: u64,
) -> Result<Response<Body>, Error> {
    let query = RedirectQuery::from_params(&query_params(&req));
    render(verify(&query, now_millis, settings.token_ttl_ms))
}
