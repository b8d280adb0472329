// Chain registry: network names accepted by the Etherscan V2 `chainid` parameter.

use crate::error::{Result, TokenflowError};

pub const DEFAULT_CHAIN: &str = "Polygon Mainnet";

/// JPYC (JPY Coin) on Polygon.
pub const DEFAULT_JPYC_POLYGON: &str = "0xe7c3d8c9a439fede00d2600032d5db0be71c3c29";

pub const CHAINS: &[(&str, u64)] = &[
    ("Polygon Mainnet", 137),
    ("Polygon Amoy (testnet)", 80002),
    ("Ethereum Mainnet", 1),
    ("Ethereum Sepolia (testnet)", 11155111),
    ("Gnosis Mainnet", 100),
    ("Gnosis Chiado (testnet)", 10200),
    ("Avalanche C-Chain Mainnet", 43114),
    ("Avalanche Fuji (testnet)", 43113),
    ("Astar Mainnet", 592),
];

/// Resolve a chain by registry name (case-insensitive) or by numeric id.
pub fn resolve_chain(name_or_id: &str) -> Result<u64> {
    let wanted = name_or_id.trim();
    if let Some((_, id)) = CHAINS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(wanted))
    {
        return Ok(*id);
    }
    if let Ok(id) = wanted.parse::<u64>() {
        if CHAINS.iter().any(|(_, known)| *known == id) {
            return Ok(id);
        }
    }
    Err(TokenflowError::invalid_input(format!(
        "Unknown chain '{}'. Known chains: {}",
        name_or_id,
        CHAINS
            .iter()
            .map(|(name, id)| format!("{} ({})", name, id))
            .collect::<Vec<_>>()
            .join(", ")
    )))
}

pub fn chain_name(chain_id: u64) -> &'static str {
    CHAINS
        .iter()
        .find(|(_, id)| *id == chain_id)
        .map(|(name, _)| *name)
        .unwrap_or("Unknown")
}
