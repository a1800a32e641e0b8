//! Quote snapshot and output types.

use alloy_primitives::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::serde_helpers::u256_serde;
use crate::{
	Call, DeficitDescending, IntentExecutionType, NormalizedCall, NormalizedToken, QuoteIntent,
	Solver, TokenAmount,
};

/// Per-intent snapshot consumed by the allocators.
///
/// Allocators take the snapshot by value and mutate their own copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculateTokens {
	/// Destination chain solver
	pub solver: Solver,
	/// Normalized reward tokens accepted on the source chain
	pub rewards: Vec<NormalizedToken>,
	/// Normalized route tokens accepted on the destination chain
	pub tokens: Vec<NormalizedToken>,
	/// Normalized destination calls, native calls last
	pub calls: Vec<NormalizedCall>,
	/// Source chain solver tokens, most deficient first
	pub src_deficit_descending: Vec<DeficitDescending>,
	/// Destination chain solver tokens, most deficient first
	pub dest_deficit_descending: Vec<DeficitDescending>,
}

/// One priced quote for a single execution type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteDataEntry {
	pub intent_execution_type: IntentExecutionType,
	pub route_tokens: Vec<TokenAmount>,
	pub route_calls: Vec<Call>,
	pub reward_tokens: Vec<TokenAmount>,
	#[serde(with = "u256_serde")]
	pub reward_native: U256,
	/// Unix seconds, as a decimal string
	pub expiry_time: String,
	pub estimated_fulfill_time_sec: Decimal,
	pub gas_overhead: u64,
}

/// Every entry produced for one quote request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteData {
	pub quote_entries: Vec<QuoteDataEntry>,
}

/// Outcome recorded against a stored quote intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "status", content = "detail")]
pub enum QuoteReceipt {
	Quoted(QuoteDataEntry),
	Failed(String),
}

/// A quote intent as persisted, one record per execution type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteIntentRecord {
	/// Storage identifier of this record
	pub id: String,
	pub intent_execution_type: IntentExecutionType,
	pub intent: QuoteIntent,
	/// Unix seconds at creation
	pub created_at: i64,
	#[serde(default)]
	pub receipt: Option<QuoteReceipt>,
}
