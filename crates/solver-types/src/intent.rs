//! Intent types for the quote engine.
//!
//! An intent pairs a route (what the solver must do on the destination chain)
//! with a reward (what the solver is paid on the source chain). Quote requests
//! carry the intent plus the execution types the requester is willing to use.

use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::serde_helpers::u256_serde;
use crate::IntentExecutionType;

/// A token address paired with a raw on-chain amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAmount {
	pub token: Address,
	#[serde(with = "u256_serde")]
	pub amount: U256,
}

impl TokenAmount {
	pub fn new(token: Address, amount: U256) -> Self {
		Self { token, amount }
	}
}

/// A call the solver executes on the destination chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
	/// Contract (or recipient, for native transfers) the call targets.
	pub target: Address,
	/// ABI encoded calldata, empty for plain native transfers.
	#[serde(default)]
	pub data: Bytes,
	/// Native value sent along with the call.
	#[serde(with = "u256_serde", default)]
	pub value: U256,
}

impl Call {
	/// Returns true if the call carries calldata.
	pub fn is_function_call(&self) -> bool {
		!self.data.is_empty()
	}

	/// Returns true if the call is a bare native transfer.
	pub fn is_native_transfer(&self) -> bool {
		self.data.is_empty() && self.value > U256::ZERO
	}
}

/// Destination side of an intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRoute {
	/// Source chain id, where the reward is locked.
	pub source: u64,
	/// Destination chain id, where the calls execute.
	pub destination: u64,
	/// Inbox contract on the destination chain.
	pub inbox: Address,
	/// Tokens the solver must provide on the destination chain.
	#[serde(default)]
	pub tokens: Vec<TokenAmount>,
	/// Calls the solver must execute on the destination chain.
	#[serde(default)]
	pub calls: Vec<Call>,
}

/// Source side of an intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteReward {
	pub creator: Address,
	pub prover: Address,
	/// Unix timestamp after which the reward can be reclaimed by the creator.
	pub deadline: u64,
	#[serde(with = "u256_serde", default)]
	pub native_value: U256,
	#[serde(default)]
	pub tokens: Vec<TokenAmount>,
}

/// A quote request for a single intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteIntent {
	/// Caller supplied identifier, used as the storage key for the quote.
	pub quote_id: String,
	pub route: QuoteRoute,
	pub reward: QuoteReward,
	/// Execution types the requester accepts, in order of preference.
	#[serde(default)]
	pub intent_execution_types: Vec<IntentExecutionType>,
}

impl QuoteIntent {
	/// Calls that carry calldata (token transfers and other contract calls).
	pub fn function_calls(&self) -> Vec<&Call> {
		self.route
			.calls
			.iter()
			.filter(|call| call.is_function_call())
			.collect()
	}

	/// Calls that only move native currency.
	pub fn native_calls(&self) -> Vec<&Call> {
		self.route
			.calls
			.iter()
			.filter(|call| call.is_native_transfer())
			.collect()
	}

	/// Distinct targets of the function calls, in call order.
	pub fn function_targets(&self) -> Vec<Address> {
		let mut targets: Vec<Address> = Vec::new();
		for call in self.function_calls() {
			if !targets.contains(&call.target) {
				targets.push(call.target);
			}
		}
		targets
	}

	/// Returns true if the intent moves native currency on either side.
	pub fn is_native_intent(&self) -> bool {
		!self.native_calls().is_empty() || self.reward.native_value > U256::ZERO
	}

	/// Sum of the native value carried by every route call.
	pub fn route_native_value(&self) -> U256 {
		self.route
			.calls
			.iter()
			.fold(U256::ZERO, |acc, call| acc.saturating_add(call.value))
	}
}
