//! Records of the explorer. Chain quantities stay decimal strings end to end, timestamps are
//! milliseconds since the Unix epoch.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    #[schema(example = 100)]
    pub number: u64,
    pub hash: String,
    pub parent_hash: String,
    pub timestamp: u64,
    pub gas_used: String,
    pub gas_limit: String,
    pub difficulty: String,
    pub total_difficulty: String,
    pub size: u64,
    pub transaction_count: u32,
    pub miner: String,
    pub reward: String,
    #[serde(default)]
    pub extra_data: Option<String>,
    pub nonce: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub hash: String,
    pub block_number: u64,
    pub block_hash: String,
    pub transaction_index: u32,
    pub from: String,
    #[serde(default)]
    pub to: Option<String>,
    pub value: String,
    pub gas: String,
    pub gas_price: String,
    #[serde(default)]
    pub gas_used: Option<String>,
    #[serde(default)]
    pub status: Option<u8>,
    pub timestamp: u64,
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default)]
    pub contract_address: Option<String>,
    #[serde(default)]
    pub cumulative_gas_used: Option<String>,
    #[serde(default)]
    pub effective_gas_price: Option<String>,
}

impl Transaction {
    pub fn touches(&self, address: &str) -> bool {
        self.from == address || self.to.as_deref() == Some(address)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub address: String,
    pub balance: String,
    pub transaction_count: u64,
    pub first_seen: u64,
    pub last_seen: u64,
    pub is_contract: bool,
    #[serde(default)]
    pub contract_name: Option<String>,
    #[serde(default)]
    pub contract_source: Option<String>,
    #[serde(default)]
    pub contract_abi: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum TokenType {
    #[serde(rename = "ERC20")]
    Erc20,
    #[serde(rename = "ERC721")]
    Erc721,
    #[serde(rename = "ERC1155")]
    Erc1155,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Erc20 => "ERC20",
            TokenType::Erc721 => "ERC721",
            TokenType::Erc1155 => "ERC1155",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ERC20" => Ok(TokenType::Erc20),
            "ERC721" => Ok(TokenType::Erc721),
            "ERC1155" => Ok(TokenType::Erc1155),
            _ => Err(format!("Invalid token type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub address: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: String,
    #[serde(default)]
    pub contract_address: Option<String>,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    pub holders: u64,
    pub transfers: u64,
    pub verified: bool,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenTransfer {
    pub transaction_hash: String,
    pub block_number: u64,
    pub timestamp: u64,
    pub from: String,
    pub to: String,
    pub token_address: String,
    pub value: String,
    #[serde(default)]
    pub token_id: Option<String>,
    pub log_index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStat {
    pub timestamp: u64,
    pub block_number: u64,
    pub hash_rate: String,
    pub difficulty: String,
    pub gas_price: String,
    pub pending_transactions: u64,
    pub active_addresses: u64,
    pub total_transactions: u64,
    #[serde(default)]
    pub market_cap: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
}

/// Per-block throughput point of the volume series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VolumePoint {
    pub timestamp: u64,
    pub transaction_count: u32,
    pub gas_used: String,
}

impl From<&Block> for VolumePoint {
    fn from(block: &Block) -> Self {
        VolumePoint { timestamp: block.timestamp, transaction_count: block.transaction_count, gas_used: block.gas_used.clone() }
    }
}
