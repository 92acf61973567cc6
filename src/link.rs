//! Relay-wrapped DEX links.
//!
//! Every link points at the relay's `/dapp/nav1` page with the destination in
//! the `url` query parameter and the generation time in `t`. The display form
//! keeps the destination readable; the actual form percent-encodes it so the
//! destination's own query string survives navigation.

use serde::{Deserialize, Serialize};

use crate::error::BlinkError;

pub const RELAY_PATH: &str = "/dapp/nav1";

/// Destination plus its query parameters, in the order they should appear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRequest {
    base_url: String,
    params: Vec<(String, String)>,
    generated_at: u64,
}

impl LinkRequest {
    /// Fails if any parameter value is empty; the first offending name is reported.
    pub fn new<K, V>(
        base_url: impl Into<String>,
        params: impl IntoIterator<Item = (K, V)>,
        generated_at: u64,
    ) -> Result<Self, BlinkError>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let params: Vec<(String, String)> = params
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        if let Some((name, _)) = params.iter().find(|(_, v)| v.is_empty()) {
            return Err(BlinkError::MissingParameter(name.clone()));
        }
        Ok(Self {
            base_url: base_url.into(),
            params,
            generated_at,
        })
    }

    /// `base?k=v&k2=v2`, or just `base` when there are no parameters.
    pub fn destination(&self) -> String {
        if self.params.is_empty() {
            return self.base_url.clone();
        }
        let query = self
            .params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", self.base_url, query)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedLink {
    #[serde(rename = "display")]
    pub display_url: String,
    #[serde(rename = "actual")]
    pub actual_url: String,
}

#[derive(Debug, Clone)]
pub struct LinkBuilder {
    relay_base: String,
}

impl LinkBuilder {
    pub fn new(relay_base: impl Into<String>) -> Self {
        Self {
            relay_base: relay_base.into(),
        }
    }

    pub fn build(&self, req: &LinkRequest) -> GeneratedLink {
        let dest = req.destination();
        let relay = format!("{}{}", self.relay_base, RELAY_PATH);
        GeneratedLink {
            display_url: format!("{relay}?url={dest}&t={}", req.generated_at),
            actual_url: format!(
                "{relay}?url={}&t={}",
                urlencoding::encode(&dest),
                req.generated_at
            ),
        }
    }
}

/// One-shot form of [`LinkBuilder::build`].
pub fn build<K, V>(
    relay_base: &str,
    base_url: &str,
    params: impl IntoIterator<Item = (K, V)>,
    now_millis: u64,
) -> Result<GeneratedLink, BlinkError>
where
    K: Into<String>,
    V: Into<String>,
{
    let req = LinkRequest::new(base_url, params, now_millis)?;
    Ok(LinkBuilder::new(relay_base).build(&req))
}
