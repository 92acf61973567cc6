use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;

use crate::error::BlinkError;

// Browsers' atob() accepts input with or without padding and ignores
// non-zero trailing bits.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Frame token: base64 of `"<epochMillis>:<suffix>"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectToken(String);

impl RedirectToken {
    pub fn issue(now_millis: u64, suffix: &str) -> Self {
        Self(STANDARD.encode(format!("{now_millis}:{suffix}")))
    }

    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Epoch millis embedded in the token. Only the first `:` segment is read.
    /// Signed so that stamps before the epoch read as old rather than malformed.
    pub fn issued_at(&self) -> Result<i64, BlinkError> {
        let compact: String = self.0.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        let bytes = LENIENT
            .decode(compact.as_bytes())
            .map_err(|e| BlinkError::MalformedToken(format!("base64: {e}")))?;
        let text = String::from_utf8(bytes)
            .map_err(|e| BlinkError::MalformedToken(format!("utf8: {e}")))?;
        let first = text.split(':').next().unwrap_or_default();
        first
            .parse::<i64>()
            .map_err(|e| BlinkError::MalformedToken(format!("timestamp {first:?}: {e}")))
    }
}

impl std::fmt::Display for RedirectToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
