//! # Configuration Types
//!
//! Configuration structures for the quote engine.
//!
//! This module defines the configuration schema for the whole service: the
//! per-chain solver definitions, the intent sources the solver listens to,
//! the fee policy (defaults, per-creator whitelist and per-route overrides)
//! and the operational settings of the quoting pipeline.

use alloy_primitives::{Address, U256};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::serde_helpers::{
	deserialize_chain_id_map, option_u256_serde, serialize_chain_id_map, u256_serde,
};
use crate::{ContractType, IntentExecutionType};

/// Main quote engine configuration structure.
///
/// This is the root configuration object loaded from disk by the config crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteEngineConfig {
	/// Service identification, logging and network settings
	pub service: ServiceSettings,
	/// Intent level defaults: fee, balance checks, gas overhead
	pub intent: IntentConfig,
	/// Quote request handling
	#[serde(default)]
	pub quotes: QuotesConfig,
	/// Parameters of the fulfillment time estimate
	pub fulfillment_estimate: FulfillmentEstimateConfig,
	/// Storage backend for quote records
	#[serde(default)]
	pub storage: StorageConfig,
	/// Solver definitions keyed by chain id
	#[serde(
		deserialize_with = "deserialize_chain_id_map",
		serialize_with = "serialize_chain_id_map"
	)]
	pub solvers: HashMap<u64, Solver>,
	/// Intent sources the solver accepts intents from
	#[serde(default)]
	pub intent_sources: Vec<IntentSource>,
	/// Partial fee configs per intent creator, keyed `default` or by source chain id
	#[serde(default)]
	pub whitelist: WhitelistFeeRecord,
	/// Exact per-route fee overrides
	#[serde(default)]
	pub route_fee_overrides: Vec<RouteFeeOverride>,
}

/// Core service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSettings {
	/// Name of this service instance
	pub name: String,
	/// Logging level for the service
	#[serde(default = "default_log_level")]
	pub log_level: String,
	/// HTTP API server port
	#[serde(default = "default_http_port")]
	pub http_port: u16,
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_http_port() -> u16 {
	3000
}

/// Intent level defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentConfig {
	/// Fee applied when the destination solver has no fee of its own
	pub default_fee: FeeConfig,
	/// Skips the solver liquidity check on destination calls
	#[serde(default)]
	pub skip_balance_check: bool,
	/// Gas overhead reported when the source solver has no usable override
	#[serde(default)]
	pub default_gas_overhead: Option<u64>,
	/// Accepts intents that move native value
	#[serde(default = "default_true")]
	pub native_enabled: bool,
	/// Minimum time a prover needs before an intent may expire
	#[serde(default)]
	pub proofs: ProofsConfig,
}

/// Minimum proof windows, in seconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofsConfig {
	/// Window for provers without an entry of their own
	#[serde(default)]
	pub default_duration_seconds: u64,
	/// Window per prover contract
	#[serde(default)]
	pub provers: HashMap<Address, u64>,
}

impl ProofsConfig {
	pub fn minimum_duration(&self, prover: Address) -> u64 {
		self.provers
			.get(&prover)
			.copied()
			.unwrap_or(self.default_duration_seconds)
	}
}

fn default_true() -> bool {
	true
}

/// Quote request handling.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuotesConfig {
	/// Execution types this deployment serves
	#[serde(default)]
	pub intent_execution_types: Vec<IntentExecutionType>,
}

/// Parameters of the fulfillment time estimate, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FulfillmentEstimateConfig {
	pub execution_padding_seconds: Decimal,
	pub block_time_percentile: Decimal,
	pub default_block_time: Decimal,
}

/// Storage backend selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
	#[serde(default)]
	pub backend: StorageBackend,
	/// Base directory for the file backend
	#[serde(default)]
	pub path: Option<String>,
	/// How long quote records are kept, forever when unset
	#[serde(default)]
	pub record_ttl_seconds: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
	#[default]
	Memory,
	File,
}

/// A solver deployment on one chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solver {
	/// Inbox contract that executes fulfillments
	pub inbox_address: Address,
	/// Contracts the solver is willing to call, keyed by address
	#[serde(default)]
	pub targets: HashMap<Address, TargetContract>,
	/// Human readable network name
	pub network: String,
	/// Fee charged for routes ending on this chain
	#[serde(default)]
	pub fee: Option<FeeConfig>,
	pub chain_id: u64,
	/// Average block time in seconds
	#[serde(default)]
	pub average_block_time: Option<Decimal>,
	/// Gas overhead override, negative values are rejected at quote time
	#[serde(default)]
	pub gas_overhead: Option<i64>,
	/// Most native currency, in wei, the solver accepts holding on this chain
	#[serde(default, with = "option_u256_serde")]
	pub native_max: Option<U256>,
}

/// A target contract with the thresholds the solver keeps for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetContract {
	pub contract_type: ContractType,
	/// Function selectors the solver accepts, as names such as `transfer`
	#[serde(default)]
	pub selectors: Vec<String>,
	/// Whole token units the solver must keep
	pub min_balance: u64,
	/// Whole token units the solver aims to hold
	pub target_balance: u64,
	/// Whole token units the solver accepts holding at most
	#[serde(default)]
	pub max_balance: Option<u64>,
	/// Tokens sharing a tag are treated as the same asset across chains
	#[serde(default)]
	pub non_swap_groups: Vec<String>,
}

/// A chain the solver accepts intents from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentSource {
	pub network: String,
	pub chain_id: u64,
	pub source_address: Address,
	pub inbox: Address,
	/// Tokens accepted as rewards (source) or route tokens (destination)
	#[serde(default)]
	pub tokens: Vec<Address>,
	/// Provers accepted for intents originating here
	#[serde(default)]
	pub provers: Vec<Address>,
}

/// Fee algorithm selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeAlgorithm {
	Linear,
	Quadratic,
}

impl std::fmt::Display for FeeAlgorithm {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			FeeAlgorithm::Linear => write!(f, "linear"),
			FeeAlgorithm::Quadratic => write!(f, "quadratic"),
		}
	}
}

/// A complete fee policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeConfig {
	pub algorithm: FeeAlgorithm,
	/// Largest fill the policy accepts
	pub limit: FeeLimit,
	pub constants: FeeConstants,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeLimit {
	/// Token limit in base-6 units
	#[serde(with = "u256_serde")]
	pub token_base6: U256,
	/// Native limit in wei
	#[serde(with = "u256_serde")]
	pub native_base18: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeConstants {
	pub token: FeeTierConstants,
	/// Token constants for routes that do not swap assets
	#[serde(default)]
	pub non_swap_token: Option<FeeTierConstants>,
	pub native: FeeTierConstants,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeTierConstants {
	#[serde(with = "u256_serde")]
	pub base_fee: U256,
	pub tranche: FeeTranche,
}

/// Per-unit pricing: every started `unit_size` costs `unit_fee`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeTranche {
	#[serde(with = "u256_serde")]
	pub unit_fee: U256,
	#[serde(with = "u256_serde")]
	pub unit_size: U256,
}

/// Partial fee configs per creator. Inner keys are `default` or a chain id.
pub type WhitelistFeeRecord = HashMap<Address, HashMap<String, serde_json::Value>>;

/// A fee override for one exact (source token, destination token) route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteFeeOverride {
	pub source_chain_id: u64,
	pub destination_chain_id: u64,
	pub source_token: Address,
	pub destination_token: Address,
	/// Partial fee config merged over the resolved fee
	pub fee: serde_json::Value,
}

impl QuoteEngineConfig {
	/// Returns the solver deployed on `chain_id`.
	pub fn solver(&self, chain_id: u64) -> Option<&Solver> {
		self.solvers.get(&chain_id)
	}

	/// Returns the first intent source on `chain_id`.
	pub fn intent_source(&self, chain_id: u64) -> Option<&IntentSource> {
		self.intent_sources.iter().find(|s| s.chain_id == chain_id)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::address;

	const SAMPLE: &str = r#"
[service]
name = "quote-engine"

[intent]
skip_balance_check = false
default_gas_overhead = 145000

[intent.default_fee]
algorithm = "linear"
limit = { token_base6 = "1000000000", native_base18 = "1000000000000000000" }

[intent.default_fee.constants.token]
base_fee = 20000
tranche = { unit_fee = 15000, unit_size = 100000000 }

[intent.default_fee.constants.native]
base_fee = "1000"
tranche = { unit_fee = "1000", unit_size = "1000000000000000000" }

[intent.proofs]
default_duration_seconds = 3600
provers = { "0x0000000000000000000000000000000000000030" = 7200 }

[quotes]
intent_execution_types = ["SELF_PUBLISH", "GASLESS"]

[fulfillment_estimate]
execution_padding_seconds = "0.1"
block_time_percentile = "0.5"
default_block_time = "15"

[solvers.10]
inbox_address = "0x0000000000000000000000000000000000000010"
network = "optimism"
chain_id = 10
average_block_time = "2"
gas_overhead = -5
native_max = "1000000000000000000"

[solvers.10.targets."0x0b2c639c533813f4aa9d7837caf62653d097ff85"]
contract_type = "erc20"
selectors = ["transfer"]
min_balance = 100
target_balance = 1000
max_balance = 5000
non_swap_groups = ["usdc"]

[[intent_sources]]
network = "optimism"
chain_id = 10
source_address = "0x0000000000000000000000000000000000000020"
inbox = "0x0000000000000000000000000000000000000010"
tokens = ["0x0b2c639c533813f4aa9d7837caf62653d097ff85"]
provers = ["0x0000000000000000000000000000000000000030"]

[whitelist."0x00000000000000000000000000000000000000aa".default]
limit = { token_base6 = "5" }
"#;

	#[test]
	fn test_parse_sample_config() {
		let config: QuoteEngineConfig = toml::from_str(SAMPLE).unwrap();

		assert_eq!(config.service.log_level, "info");
		assert_eq!(config.service.http_port, 3000);
		assert_eq!(config.intent.default_gas_overhead, Some(145_000));
		assert!(config.intent.native_enabled);
		assert_eq!(config.intent.default_fee.algorithm, FeeAlgorithm::Linear);
		assert_eq!(
			config.intent.default_fee.constants.token.tranche.unit_size,
			U256::from(100_000_000u64)
		);
		assert_eq!(
			config.quotes.intent_execution_types,
			vec![IntentExecutionType::SelfPublish, IntentExecutionType::Gasless]
		);
		assert_eq!(config.storage.backend, StorageBackend::Memory);

		let solver = config.solver(10).unwrap();
		assert_eq!(solver.gas_overhead, Some(-5));
		assert_eq!(solver.average_block_time, Some(Decimal::from(2)));
		assert_eq!(solver.targets.len(), 1);
		let target = solver.targets.values().next().unwrap();
		assert_eq!(target.contract_type, ContractType::Erc20);
		assert_eq!(target.non_swap_groups, vec!["usdc".to_string()]);
		assert_eq!(target.max_balance, Some(5000));
		assert_eq!(
			solver.native_max,
			Some(U256::from(1_000_000_000_000_000_000u64))
		);

		let proofs = &config.intent.proofs;
		assert_eq!(proofs.minimum_duration(Address::repeat_byte(0x01)), 3600);
		assert_eq!(
			proofs.minimum_duration(address!("0000000000000000000000000000000000000030")),
			7200
		);

		assert_eq!(config.intent_source(10).unwrap().provers.len(), 1);
		assert!(config.intent_source(1).is_none());
		assert_eq!(config.whitelist.len(), 1);
	}
}
