//! Read-only lookups over a loaded configuration.

use alloy_primitives::Address;
use solver_types::{
	ContractType, FulfillmentEstimateConfig, IntentConfig, IntentSource, QuoteEngineConfig,
	QuotesConfig, RouteFeeOverride, Solver, TokenConfig, WhitelistFeeRecord,
};
use std::sync::Arc;

/// Shared handle to the configuration used by every service.
#[derive(Debug, Clone)]
pub struct ConfigService {
	config: Arc<QuoteEngineConfig>,
}

impl ConfigService {
	pub fn new(config: QuoteEngineConfig) -> Self {
		Self {
			config: Arc::new(config),
		}
	}

	pub fn config(&self) -> &QuoteEngineConfig {
		&self.config
	}

	pub fn get_solver(&self, chain_id: u64) -> Option<&Solver> {
		self.config.solver(chain_id)
	}

	pub fn get_intent_source(&self, chain_id: u64) -> Option<&IntentSource> {
		self.config.intent_source(chain_id)
	}

	/// Every intent source configured on `chain_id`.
	pub fn intent_sources_for(&self, chain_id: u64) -> impl Iterator<Item = &IntentSource> {
		self.config
			.intent_sources
			.iter()
			.filter(move |source| source.chain_id == chain_id)
	}

	pub fn intent_configs(&self) -> &IntentConfig {
		&self.config.intent
	}

	pub fn whitelist(&self) -> &WhitelistFeeRecord {
		&self.config.whitelist
	}

	pub fn route_fee_overrides(&self) -> &[RouteFeeOverride] {
		&self.config.route_fee_overrides
	}

	pub fn quotes_config(&self) -> &QuotesConfig {
		&self.config.quotes
	}

	pub fn fulfillment_estimate_config(&self) -> &FulfillmentEstimateConfig {
		&self.config.fulfillment_estimate
	}

	/// Chain ids with a configured solver, ascending.
	pub fn supported_chains(&self) -> Vec<u64> {
		let mut chains: Vec<u64> = self.config.solvers.keys().copied().collect();
		chains.sort_unstable();
		chains
	}

	/// ERC-20 targets of the solver on `chain_id`, as token configs sorted by address.
	pub fn inbox_tokens(&self, chain_id: u64) -> Vec<TokenConfig> {
		let Some(solver) = self.get_solver(chain_id) else {
			return Vec::new();
		};

		let mut tokens: Vec<TokenConfig> = solver
			.targets
			.iter()
			.filter(|(_, target)| target.contract_type == ContractType::Erc20)
			.map(|(address, target)| TokenConfig {
				address: *address,
				chain_id,
				contract_type: target.contract_type,
				min_balance: target.min_balance,
				target_balance: target.target_balance,
			})
			.collect();
		tokens.sort_by_key(|token| token.address);
		tokens
	}

	/// Returns true if `prover` is accepted by any intent source on `chain_id`.
	pub fn is_supported_prover(&self, chain_id: u64, prover: Address) -> bool {
		self.intent_sources_for(chain_id)
			.any(|source| source.provers.contains(&prover))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::tests::SAMPLE_CONFIG;
	use crate::{ConfigFormat, ConfigLoader};

	fn service() -> ConfigService {
		ConfigService::new(
			ConfigLoader::new()
				.parse(SAMPLE_CONFIG, ConfigFormat::Toml)
				.unwrap(),
		)
	}

	#[test]
	fn test_lookups() {
		let service = service();
		let chains = service.supported_chains();
		assert!(chains.windows(2).all(|w| w[0] < w[1]));

		for chain_id in chains {
			let solver = service.get_solver(chain_id).unwrap();
			assert_eq!(solver.chain_id, chain_id);

			let tokens = service.inbox_tokens(chain_id);
			assert!(tokens.windows(2).all(|w| w[0].address < w[1].address));
			assert!(tokens.iter().all(|t| t.chain_id == chain_id));
		}

		assert!(service.get_solver(424_242).is_none());
		assert!(service.inbox_tokens(424_242).is_empty());
	}

	#[test]
	fn test_supported_prover() {
		let service = service();
		let source = service.config().intent_sources[0].clone();
		let prover = source.provers[0];

		assert!(service.is_supported_prover(source.chain_id, prover));
		assert!(!service.is_supported_prover(source.chain_id, Address::repeat_byte(0xee)));
		assert!(!service.is_supported_prover(424_242, prover));
	}
}
