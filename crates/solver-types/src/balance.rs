//! Balance snapshot types.
//!
//! Balance discovery reports, per solver token, the configured thresholds and
//! the live on-chain balance. The fee service turns these into deficit entries
//! that the quote allocators rank.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::serde_helpers::u256_serde;
use crate::NormalizedToken;

/// Token standard of a solver target contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractType {
	Erc20,
	Erc721,
	Erc1155,
}

/// Thresholds configured for one solver token.
///
/// `min_balance` and `target_balance` are whole token units (decimals 0).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
	pub address: Address,
	pub chain_id: u64,
	pub contract_type: ContractType,
	pub min_balance: u64,
	pub target_balance: u64,
}

/// Live on-chain balance of a token held by the solver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBalance {
	pub address: Address,
	pub decimals: u8,
	#[serde(with = "u256_serde")]
	pub balance: U256,
}

/// Balance discovery result for one solver token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenFetchAnalysis {
	pub config: TokenConfig,
	pub token: TokenBalance,
	pub chain_id: u64,
}

/// A token analysis extended with its normalized distance from target.
///
/// `delta.balance` is negative when the solver holds less than the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeficitDescending {
	#[serde(flatten)]
	pub analysis: TokenFetchAnalysis,
	pub delta: NormalizedToken,
}
