//! Chain and DEX destinations links can be generated for.

use crate::error::BlinkError;
use crate::link::LinkRequest;

pub const ONEINCH_APP: &str = "https://app.1inch.io";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// `base?<input_param>=..&<output_param>=..[&extra..]`
    Query {
        base_url: &'static str,
        input_param: &'static str,
        output_param: &'static str,
        extra: &'static [(&'static str, &'static str)],
    },
    /// 1inch swap route addressed by path; needs token metadata before generating.
    OneInch { chain_id: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainPreset {
    pub id: &'static str,
    pub name: &'static str,
    pub dex: &'static str,
    pub native_token: &'static str,
    pub destination: Destination,
}

const fn query(
    base_url: &'static str,
    input_param: &'static str,
    output_param: &'static str,
) -> Destination {
    Destination::Query {
        base_url,
        input_param,
        output_param,
        extra: &[],
    }
}

pub const PRESETS: &[ChainPreset] = &[
    ChainPreset {
        id: "aptos",
        name: "Aptos",
        dex: "Cellana Finance",
        native_token: "0x1::aptos_coin::AptosCoin",
        destination: query("https://app.cellana.finance/swap", "inputCurrency", "outputCurrency"),
    },
    ChainPreset {
        id: "sui",
        name: "Sui",
        dex: "Cetus",
        native_token: "0x2::sui::SUI",
        destination: query("https://app.cetus.zone/swap", "from", "to"),
    },
    ChainPreset {
        id: "solana",
        name: "Solana",
        dex: "Raydium",
        native_token: "sol",
        destination: query("https://raydium.io/swap", "inputMint", "outputMint"),
    },
    ChainPreset {
        id: "unichain",
        name: "Unichain",
        dex: "Uniswap",
        native_token: "ETH",
        destination: Destination::Query {
            base_url: "https://app.uniswap.org/#/swap",
            input_param: "inputCurrency",
            output_param: "outputCurrency",
            extra: &[("exactField", "input"), ("exactAmount", "10"), ("use", "v1")],
        },
    },
    ChainPreset {
        id: "agoric",
        name: "Agoric",
        dex: "Crescent",
        native_token: "bld",
        destination: query("https://app.crescent.network/orderbook", "from", "to"),
    },
    ChainPreset {
        id: "muses",
        name: "Zeus Network",
        dex: "Zeus Muses",
        native_token: "ZEUS",
        destination: query("https://muses.apollobyzeus.app", "inputCurrency", "outputCurrency"),
    },
    ChainPreset {
        id: "guardian",
        name: "Zeus Network",
        dex: "Zeus Guardian",
        native_token: "ZEUS",
        destination: query("https://app.zeusguardian.io", "inputCurrency", "outputCurrency"),
    },
    ChainPreset {
        id: "base",
        name: "Base",
        dex: "1inch",
        native_token: "ETH",
        destination: Destination::OneInch { chain_id: "8453" },
    },
    ChainPreset {
        id: "avalanche",
        name: "Avalanche",
        dex: "1inch",
        native_token: "AVAX",
        destination: Destination::OneInch { chain_id: "43114" },
    },
];

pub fn find(id: &str) -> Result<&'static ChainPreset, BlinkError> {
    PRESETS
        .iter()
        .find(|p| p.id == id)
        .ok_or_else(|| BlinkError::UnknownPreset(id.to_string()))
}

impl ChainPreset {
    /// Chain id for the metadata lookup, if this destination needs one.
    pub fn metadata_chain(&self) -> Option<&'static str> {
        match self.destination {
            Destination::OneInch { chain_id } => Some(chain_id),
            Destination::Query { .. } => None,
        }
    }

    /// Request for swapping `input` (native token when absent) into `output`.
    pub fn request(
        &self,
        input: Option<&str>,
        output: &str,
        now_millis: u64,
    ) -> Result<LinkRequest, BlinkError> {
        if output.is_empty() {
            return Err(BlinkError::missing("output"));
        }
        let input = input.filter(|s| !s.is_empty()).unwrap_or(self.native_token);

        match self.destination {
            Destination::Query {
                base_url,
                input_param,
                output_param,
                extra,
            } => {
                let params = [(input_param, input), (output_param, output)]
                    .into_iter()
                    .chain(extra.iter().copied());
                LinkRequest::new(base_url, params, now_millis)
            }
            Destination::OneInch { chain_id } => {
                let route = format!(
                    "{ONEINCH_APP}/#/{chain_id}/simple/swap/{chain_id}:{input}/{chain_id}:{output}"
                );
                LinkRequest::new::<&str, &str>(route, [], now_millis)
            }
        }
    }
}
