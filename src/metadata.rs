//! Token metadata needed before a 1inch link can be generated.

use std::future::Future;

use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::error::BlinkError;

/// `0x` plus 40 hex characters.
pub const ADDRESS_LEN: usize = 42;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub symbol: String,
    pub decimals: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

pub trait TokenMetadataSource {
    /// `Ok(None)` when the service does not know the token.
    fn fetch(
        &self,
        chain_id: &str,
        address: &str,
    ) -> impl Future<Output = Result<Option<TokenMetadata>, BlinkError>> + Send;
}

#[derive(Clone)]
pub struct HttpMetadataSource {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpMetadataSource {
    pub fn new(client: Client, settings: &Settings) -> Self {
        Self {
            client,
            endpoint: settings.metadata_url.clone(),
            api_key: settings.metadata_api_key.clone(),
        }
    }

    pub fn token_url(&self, chain_id: &str, address: &str) -> String {
        format!(
            "{}/{}/custom/{}",
            self.endpoint,
            urlencoding::encode(chain_id),
            urlencoding::encode(address)
        )
    }
}

impl TokenMetadataSource for HttpMetadataSource {
    async fn fetch(
        &self,
        chain_id: &str,
        address: &str,
    ) -> Result<Option<TokenMetadata>, BlinkError> {
        let mut req = self
            .client
            .get(self.token_url(chain_id, address))
            .header(ACCEPT, "application/json");
        if let Some(key) = &self.api_key {
            req = req.header(AUTHORIZATION, format!("Bearer {key}"));
        }

        let resp = req
            .send()
            .await
            .map_err(|e| BlinkError::MetadataLookup(format!("send: {e}")))?;

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => resp
                .json::<TokenMetadata>()
                .await
                .map(Some)
                .map_err(|e| BlinkError::MetadataLookup(format!("json: {e}"))),
            s => Err(BlinkError::MetadataLookup(format!("status {s}"))),
        }
    }
}

/// Metadata for `address`, or the reason generation has to wait.
///
/// Short addresses are rejected without touching the service.
pub async fn resolve_for_generation<S: TokenMetadataSource>(
    source: &S,
    chain_id: &str,
    address: &str,
) -> Result<TokenMetadata, BlinkError> {
    if address.len() < ADDRESS_LEN {
        return Err(BlinkError::AddressTooShort(address.len()));
    }
    match source.fetch(chain_id, address).await {
        Ok(Some(meta)) => Ok(meta),
        Ok(None) => Err(BlinkError::MetadataUnavailable(address.to_string())),
        Err(e) => {
            tracing::error!(chain_id, address, "token metadata: {e}");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const WETH: &str = "0x4200000000000000000000000000000000000006";

    #[derive(Default)]
    struct FakeSource {
        known: HashMap<(String, String), TokenMetadata>,
        fail: bool,
        calls: AtomicUsize,
    }

    impl TokenMetadataSource for FakeSource {
        async fn fetch(
            &self,
            chain_id: &str,
            address: &str,
        ) -> Result<Option<TokenMetadata>, BlinkError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(BlinkError::MetadataLookup("connection reset".into()));
            }
            Ok(self
                .known
                .get(&(chain_id.to_string(), address.to_string()))
                .cloned())
        }
    }

    fn weth() -> TokenMetadata {
        TokenMetadata {
            symbol: "WETH".into(),
            decimals: 18,
            name: Some("Wrapped Ether".into()),
        }
    }

    #[tokio::test]
    async fn resolves_known_token() {
        let mut src = FakeSource::default();
        src.known.insert(("8453".into(), WETH.into()), weth());
        assert_eq!(resolve_for_generation(&src, "8453", WETH).await.unwrap(), weth());
    }

    #[tokio::test]
    async fn short_address_skips_lookup() {
        let src = FakeSource::default();
        let err = resolve_for_generation(&src, "8453", "0x4200").await.unwrap_err();
        assert_eq!(err, BlinkError::AddressTooShort(6));
        assert_eq!(src.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_token_blocks_generation() {
        let src = FakeSource::default();
        let err = resolve_for_generation(&src, "43114", WETH).await.unwrap_err();
        assert!(matches!(err, BlinkError::MetadataUnavailable(_)));
    }

    #[tokio::test]
    async fn lookup_failure_propagates() {
        let src = FakeSource {
            fail: true,
            ..Default::default()
        };
        let err = resolve_for_generation(&src, "8453", WETH).await.unwrap_err();
        assert_eq!(err.status(), 502);
    }

    #[test]
    fn token_url_layout() {
        let src = HttpMetadataSource::new(Client::new(), &Settings::default());
        assert_eq!(
            src.token_url("8453", WETH),
            format!("https://api.1inch.dev/token/v1.2/8453/custom/{WETH}")
        );
    }

    #[test]
    fn metadata_parses_service_payload() {
        let v: TokenMetadata = serde_json::from_str(
            r#"{"symbol":"USDC","decimals":6,"name":"USD Coin","address":"0x833589fcd6edb6e08f4c7c32d4f71b54bda02913"}"#,
        )
        .unwrap();
        assert_eq!(v.symbol, "USDC");
        assert_eq!(v.decimals, 6);
    }
}
