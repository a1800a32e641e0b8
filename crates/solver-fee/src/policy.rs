//! Fee policy resolution.
//!
//! The fee charged for an intent starts from the destination solver's fee (or
//! the intent default), is refined by the creator's whitelist entry and finally
//! by an exact route override. Partial configs are deep-merged over the base,
//! right-most taking precedence.

use alloy_primitives::Address;
use serde_json::Value;
use solver_config::ConfigService;
use solver_types::erc20::{self, Erc20Transfer, TRANSFER_SELECTOR_NAME};
use solver_types::{
	Call, ContractType, FeeConfig, QuoteIntent, QuoteRoute, RouteFeeOverride, Solver,
	TargetContract,
};
use tracing::debug;

use crate::FeeError;

pub const ETH_MAINNET: u64 = 1;
pub const ETH_SEPOLIA: u64 = 11_155_111;

/// Chains and tokens that identify a route for fee classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTuple {
	pub src_chain_id: u64,
	pub dst_chain_id: u64,
	pub src_tokens: Vec<Address>,
	pub dst_token: Address,
}

/// A call resolved against the solver's target configuration.
#[derive(Debug, Clone)]
pub struct TransactionTargetData<'a> {
	pub target: &'a TargetContract,
	pub selector: &'static str,
	/// Decoded arguments, when the call data is a well-formed transfer
	pub transfer: Option<Erc20Transfer>,
}

impl TransactionTargetData<'_> {
	pub fn is_erc20_transfer(&self) -> bool {
		self.target.contract_type == ContractType::Erc20 && self.selector == TRANSFER_SELECTOR_NAME
	}
}

/// Resolves a function call against the solver targets. Returns `None` when
/// the target is unknown or the selector is not enabled for it.
pub fn get_transaction_target_data<'a>(
	solver: &'a Solver,
	call: &Call,
) -> Option<TransactionTargetData<'a>> {
	let target = solver.targets.get(&call.target)?;
	let selector = erc20::selector_name(&call.data)?;
	if !target.selectors.iter().any(|s| s == selector) {
		return None;
	}

	Some(TransactionTargetData {
		target,
		selector,
		transfer: erc20::decode_transfer(&call.data),
	})
}

/// The chain whose solver prices a route. Routes touching Ethereum L1 are
/// priced by the L1 solver.
pub fn ask_route_destination_chain(route: &QuoteRoute) -> u64 {
	if route.destination == ETH_MAINNET || route.source == ETH_MAINNET {
		ETH_MAINNET
	} else if route.destination == ETH_SEPOLIA || route.source == ETH_SEPOLIA {
		ETH_SEPOLIA
	} else {
		route.destination
	}
}

/// Recursively merges `patch` into `base`. Objects merge key by key, any
/// other value replaces the base, and nulls are ignored.
pub fn deep_merge(base: &mut Value, patch: &Value) {
	match (base, patch) {
		(_, Value::Null) => {},
		(Value::Object(base), Value::Object(patch)) => {
			for (key, value) in patch {
				match base.get_mut(key) {
					Some(existing) => deep_merge(existing, value),
					None if !value.is_null() => {
						base.insert(key.clone(), value.clone());
					},
					None => {},
				}
			}
		},
		(base, patch) => *base = patch.clone(),
	}
}

/// Merges partial fee configs over `base`, left to right.
pub fn merge_fee_config(base: &FeeConfig, patches: &[&Value]) -> Result<FeeConfig, FeeError> {
	let mut merged =
		serde_json::to_value(base).map_err(|e| FeeError::InvalidFeeConfig(e.to_string()))?;
	for patch in patches {
		deep_merge(&mut merged, patch);
	}
	serde_json::from_value(merged).map_err(|e| FeeError::InvalidFeeConfig(e.to_string()))
}

/// Resolves fee policy questions against the configuration.
#[derive(Debug, Clone)]
pub struct FeePolicy {
	config: ConfigService,
}

impl FeePolicy {
	pub fn new(config: ConfigService) -> Self {
		Self { config }
	}

	/// The solver that prices `route`.
	pub fn ask_route_destination_solver(&self, route: &QuoteRoute) -> Result<&Solver, FeeError> {
		let chain_id = ask_route_destination_chain(route);
		self.config
			.get_solver(chain_id)
			.ok_or(FeeError::NoSolverForDestination(chain_id))
	}

	/// The pricing solver's fee, or the intent default when it has none.
	pub fn route_destination_solver_fee(&self, route: &QuoteRoute) -> Result<FeeConfig, FeeError> {
		let solver = self.ask_route_destination_solver(route)?;
		Ok(solver
			.fee
			.clone()
			.unwrap_or_else(|| self.config.intent_configs().default_fee.clone()))
	}

	/// Fee config for `intent` after whitelist and route override merges.
	pub fn get_fee_config(&self, intent: &QuoteIntent) -> Result<FeeConfig, FeeError> {
		let mut fee_config = self.route_destination_solver_fee(&intent.route)?;
		let mut fee_source = "solver";

		if let Some(special) = self.config.whitelist().get(&intent.reward.creator) {
			let chain_key = intent.route.source.to_string();
			let patches: Vec<&Value> = [special.get("default"), special.get(&chain_key)]
				.into_iter()
				.flatten()
				.collect();
			fee_config = merge_fee_config(&fee_config, &patches)?;
			fee_source = "whitelist";
		}

		let Some(tuple) = self.extract_route_tuple(intent) else {
			debug!(quote_id = %intent.quote_id, "No route tuple found for intent");
			return Ok(fee_config);
		};

		if let Some(route_override) = self.find_route_override(&tuple) {
			fee_config = merge_fee_config(&fee_config, &[&route_override.fee])?;
			fee_source = "override";
		}

		debug!(
			quote_id = %intent.quote_id,
			fee_source,
			src_chain_id = tuple.src_chain_id,
			dst_chain_id = tuple.dst_chain_id,
			dst_token = %tuple.dst_token,
			non_swap = self.is_non_swap_route(&tuple),
			"Resolved fee config"
		);

		Ok(fee_config)
	}

	/// Extracts the route tuple used for override and non-swap classification.
	///
	/// The destination token is the first route token, else the first ERC-20
	/// transfer target among the calls, else the zero address for native-only
	/// routes.
	pub fn extract_route_tuple(&self, intent: &QuoteIntent) -> Option<RouteTuple> {
		let mut dst_token = intent.route.tokens.first().map(|t| t.token);

		if dst_token.is_none() {
			if let Ok(solver) = self.ask_route_destination_solver(&intent.route) {
				dst_token = intent
					.function_calls()
					.into_iter()
					.find(|call| {
						get_transaction_target_data(solver, call)
							.is_some_and(|ttd| ttd.is_erc20_transfer())
					})
					.map(|call| call.target);
			}
		}

		if dst_token.is_none() && !intent.native_calls().is_empty() {
			dst_token = Some(Address::ZERO);
		}

		let src_tokens: Vec<Address> = if !intent.reward.tokens.is_empty() {
			intent.reward.tokens.iter().map(|t| t.token).collect()
		} else if !intent.reward.native_value.is_zero() {
			vec![Address::ZERO]
		} else {
			Vec::new()
		};

		Some(RouteTuple {
			src_chain_id: intent.route.source,
			dst_chain_id: intent.route.destination,
			src_tokens,
			dst_token: dst_token?,
		})
	}

	/// True if a source token and the destination token share a non-swap tag.
	pub fn is_non_swap_route(&self, tuple: &RouteTuple) -> bool {
		let (Some(src_solver), Some(dst_solver)) = (
			self.config.get_solver(tuple.src_chain_id),
			self.config.get_solver(tuple.dst_chain_id),
		) else {
			return false;
		};

		let Some(dst_tags) = dst_solver
			.targets
			.get(&tuple.dst_token)
			.map(|t| &t.non_swap_groups)
			.filter(|tags| !tags.is_empty())
		else {
			return false;
		};

		tuple.src_tokens.iter().any(|src| {
			src_solver
				.targets
				.get(src)
				.is_some_and(|t| t.non_swap_groups.iter().any(|tag| dst_tags.contains(tag)))
		})
	}

	/// Finds the override matching the route exactly.
	pub fn find_route_override(&self, tuple: &RouteTuple) -> Option<&RouteFeeOverride> {
		let overrides = self.config.route_fee_overrides();
		tuple.src_tokens.iter().find_map(|src| {
			overrides.iter().find(|o| {
				o.source_chain_id == tuple.src_chain_id
					&& o.destination_chain_id == tuple.dst_chain_id
					&& o.source_token == *src
					&& o.destination_token == tuple.dst_token
			})
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_deep_merge() {
		let mut base = json!({
			"algorithm": "linear",
			"constants": {"token": {"base_fee": "20000", "tranche": {"unit_fee": "15000", "unit_size": "100"}}}
		});
		deep_merge(
			&mut base,
			&json!({"constants": {"token": {"tranche": {"unit_fee": "1"}}}, "extra": null}),
		);

		assert_eq!(base["constants"]["token"]["base_fee"], "20000");
		assert_eq!(base["constants"]["token"]["tranche"]["unit_fee"], "1");
		assert_eq!(base["constants"]["token"]["tranche"]["unit_size"], "100");
		assert!(base.get("extra").is_none());
	}

	#[test]
	fn test_deep_merge_skips_nested_nulls() {
		let mut base = json!({"constants": {"token": {"base_fee": "20000"}}});
		deep_merge(
			&mut base,
			&json!({"constants": {"native": null, "token": {"base_fee": null}}}),
		);

		assert_eq!(base, json!({"constants": {"token": {"base_fee": "20000"}}}));
	}

	#[test]
	fn test_ask_route_destination_chain() {
		let route = |source, destination| QuoteRoute {
			source,
			destination,
			inbox: Address::ZERO,
			tokens: vec![],
			calls: vec![],
		};

		assert_eq!(ask_route_destination_chain(&route(10, 8453)), 8453);
		assert_eq!(ask_route_destination_chain(&route(1, 8453)), ETH_MAINNET);
		assert_eq!(ask_route_destination_chain(&route(10, 1)), ETH_MAINNET);
		assert_eq!(ask_route_destination_chain(&route(ETH_SEPOLIA, 84532)), ETH_SEPOLIA);
		assert_eq!(ask_route_destination_chain(&route(1, ETH_SEPOLIA)), ETH_MAINNET);
	}
}
