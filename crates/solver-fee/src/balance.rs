//! Balance discovery.
//!
//! The fee service never talks to a chain directly. It asks a
//! [`BalanceProvider`] for the solver's token balances and pairs them with the
//! thresholds configured for each solver target.

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use solver_config::ConfigService;
use solver_types::serde_helpers::u256_serde;
use solver_types::{TokenBalance, TokenFetchAnalysis};
use std::sync::Arc;
use tracing::warn;

use crate::FeeError;

/// Source of the solver's on-chain token balances.
#[async_trait]
pub trait BalanceProvider: Send + Sync {
	/// Returns the balances of `tokens` on `chain_id`, in request order.
	///
	/// Tokens the provider knows nothing about are left out of the result.
	async fn fetch_token_balances(
		&self,
		chain_id: u64,
		tokens: &[Address],
	) -> Result<Vec<TokenBalance>, FeeError>;

	/// Native balance of the solver wallet on `chain_id`, if known.
	async fn fetch_native_balance(&self, chain_id: u64) -> Result<Option<U256>, FeeError>;
}

/// One entry of a balance snapshot file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceEntry {
	pub chain_id: u64,
	pub address: Address,
	pub decimals: u8,
	#[serde(with = "u256_serde")]
	pub balance: U256,
}

/// Native balance of the solver wallet on one chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NativeBalanceEntry {
	pub chain_id: u64,
	#[serde(with = "u256_serde")]
	pub balance: U256,
}

/// A static set of balances, as loaded from disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BalanceSnapshot {
	#[serde(default)]
	pub balances: Vec<BalanceEntry>,
	#[serde(default)]
	pub native: Vec<NativeBalanceEntry>,
}

/// Balance provider backed by an in-process map.
#[derive(Debug, Default)]
pub struct MemoryBalanceProvider {
	balances: DashMap<(u64, Address), TokenBalance>,
	native: DashMap<u64, U256>,
}

impl MemoryBalanceProvider {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_snapshot(snapshot: BalanceSnapshot) -> Self {
		let provider = Self::new();
		for entry in snapshot.balances {
			provider.set_balance(entry.chain_id, entry.address, entry.decimals, entry.balance);
		}
		for entry in snapshot.native {
			provider.set_native_balance(entry.chain_id, entry.balance);
		}
		provider
	}

	/// Inserts or replaces the balance of one token.
	pub fn set_balance(&self, chain_id: u64, address: Address, decimals: u8, balance: U256) {
		self.balances.insert(
			(chain_id, address),
			TokenBalance {
				address,
				decimals,
				balance,
			},
		);
	}

	pub fn set_native_balance(&self, chain_id: u64, balance: U256) {
		self.native.insert(chain_id, balance);
	}
}

#[async_trait]
impl BalanceProvider for MemoryBalanceProvider {
	async fn fetch_token_balances(
		&self,
		chain_id: u64,
		tokens: &[Address],
	) -> Result<Vec<TokenBalance>, FeeError> {
		Ok(tokens
			.iter()
			.filter_map(|token| {
				self.balances
					.get(&(chain_id, *token))
					.map(|entry| entry.value().clone())
			})
			.collect())
	}

	async fn fetch_native_balance(&self, chain_id: u64) -> Result<Option<U256>, FeeError> {
		Ok(self.native.get(&chain_id).map(|entry| *entry.value()))
	}
}

/// Pairs configured solver tokens with their live balances.
#[derive(Clone)]
pub struct BalanceService {
	provider: Arc<dyn BalanceProvider>,
	config: ConfigService,
}

impl BalanceService {
	pub fn new(provider: Arc<dyn BalanceProvider>, config: ConfigService) -> Self {
		Self { provider, config }
	}

	pub async fn fetch_token_balances(
		&self,
		chain_id: u64,
		tokens: &[Address],
	) -> Result<Vec<TokenBalance>, FeeError> {
		self.provider.fetch_token_balances(chain_id, tokens).await
	}

	pub async fn fetch_native_balance(&self, chain_id: u64) -> Result<Option<U256>, FeeError> {
		self.provider.fetch_native_balance(chain_id).await
	}

	/// Balance analysis of every ERC-20 target of the solver on `chain_id`.
	pub async fn fetch_token_data(&self, chain_id: u64) -> Result<Vec<TokenFetchAnalysis>, FeeError> {
		let configs = self.config.inbox_tokens(chain_id);
		let addresses: Vec<Address> = configs.iter().map(|c| c.address).collect();
		let balances = self.provider.fetch_token_balances(chain_id, &addresses).await?;

		let mut analyses = Vec::with_capacity(configs.len());
		for config in configs {
			match balances.iter().find(|b| b.address == config.address) {
				Some(token) => analyses.push(TokenFetchAnalysis {
					token: token.clone(),
					config,
					chain_id,
				}),
				None => {
					warn!(chain_id, token = %config.address, "No balance reported for solver token");
				},
			}
		}
		Ok(analyses)
	}
}
