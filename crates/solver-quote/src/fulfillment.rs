use rust_decimal::Decimal;
use solver_config::ConfigService;
use solver_types::QuoteIntent;
use tracing::warn;

/// Estimates how long the solver takes to fulfill an intent.
#[derive(Debug, Clone)]
pub struct FulfillmentEstimateService {
	config: ConfigService,
}

impl FulfillmentEstimateService {
	pub fn new(config: ConfigService) -> Self {
		Self { config }
	}

	/// `block_time * block_time_percentile + execution_padding_seconds`, where
	/// `block_time` is the destination solver's average block time.
	pub fn get_estimated_fulfill_time_sec(&self, intent: &QuoteIntent) -> Decimal {
		let estimate = self.config.fulfillment_estimate_config();
		let destination = intent.route.destination;

		let block_time = match self
			.config
			.get_solver(destination)
			.and_then(|solver| solver.average_block_time)
		{
			Some(block_time) => block_time,
			None => {
				warn!(
					chain_id = destination,
					default_block_time = %estimate.default_block_time,
					"No average block time for destination chain, using default"
				);
				estimate.default_block_time
			},
		};

		block_time * estimate.block_time_percentile + estimate.execution_padding_seconds
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use solver_config::{ConfigFormat, ConfigLoader};
	use std::str::FromStr;

	fn service() -> FulfillmentEstimateService {
		let config = ConfigLoader::new()
			.parse(include_str!("../../../config/example.toml"), ConfigFormat::Toml)
			.unwrap();
		FulfillmentEstimateService::new(ConfigService::new(config))
	}

	fn intent_to(destination: u64) -> QuoteIntent {
		serde_json::from_value(serde_json::json!({
			"quoteId": "estimate",
			"route": {
				"source": 10,
				"destination": destination,
				"inbox": "0x0000000000000000000000000000000000008453",
				"tokens": [],
				"calls": []
			},
			"reward": {
				"creator": "0x0000000000000000000000000000000000000001",
				"prover": "0x0000000000000000000000000000000000003000",
				"deadline": 0,
				"nativeValue": "0",
				"tokens": []
			},
			"intentExecutionTypes": ["SELF_PUBLISH"]
		}))
		.unwrap()
	}

	#[test]
	fn test_uses_destination_block_time() {
		// 2s blocks * 0.5 + 0.1
		assert_eq!(
			service().get_estimated_fulfill_time_sec(&intent_to(8453)),
			Decimal::from_str("1.1").unwrap()
		);
	}

	#[test]
	fn test_unknown_chain_uses_default_block_time() {
		// 15s default * 0.5 + 0.1
		assert_eq!(
			service().get_estimated_fulfill_time_sec(&intent_to(42161)),
			Decimal::from_str("7.6").unwrap()
		);
	}
}
