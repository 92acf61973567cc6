use serde::{Deserialize, Serialize};

use crate::history::{BlinkHistoryRecord, HistoryStats};
use crate::link::GeneratedLink;
use crate::metadata::TokenMetadata;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CreateLinkReq {
    pub chain: String,
    pub output: String,
    #[serde(default)]
    pub input: Option<String>,
    /// Appends the link to this wallet's history when set.
    #[serde(default)]
    pub wallet: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CreateLinkResp {
    #[serde(flatten)]
    pub link: GeneratedLink,
    pub chain: String,
    /// Human-readable chain name, e.g. `Sui`.
    pub name: String,
    pub dex: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<TokenMetadata>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CreateFrameReq {
    pub platform: String,
    pub creator: String,
    #[serde(default)]
    pub wallet: Option<String>,
}

#[derive(Debug, Serialize, Clone)]
pub struct HistoryResp {
    pub records: Vec<BlinkHistoryRecord>,
    pub stats: HistoryStats,
}
