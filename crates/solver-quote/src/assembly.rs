//! Quote assembly: expiry, gas overhead and the final quote entry.

use alloy_primitives::U256;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use solver_types::{Call, IntentExecutionType, QuoteDataEntry, Solver, TokenAmount};
use tracing::{error, warn};

use crate::QuoteError;

/// How long a quote stays valid, in seconds.
pub const QUOTE_EXPIRY_SECS: i64 = 5 * 60;

/// Expiry of a quote issued at `now`, as unix seconds.
pub fn quote_expiry(now: DateTime<Utc>) -> String {
	(now + Duration::seconds(QUOTE_EXPIRY_SECS)).timestamp().to_string()
}

/// Checks a solver gas overhead override.
pub fn validate_gas_overhead(gas_overhead: i64) -> Result<u64, QuoteError> {
	u64::try_from(gas_overhead)
		.map_err(|_| QuoteError::InvalidGasOverheadConfiguration(gas_overhead))
}

/// Gas overhead for an intent whose source chain is served by
/// `source_solver`.
///
/// A missing default is fatal even when the solver carries a valid override.
pub fn resolve_gas_overhead(
	source_solver: Option<&Solver>,
	default_gas_overhead: Option<u64>,
) -> Result<u64, QuoteError> {
	let Some(default) = default_gas_overhead else {
		error!("Default gas overhead is undefined");
		return Err(QuoteError::DefaultGasOverheadUndefined);
	};

	match source_solver.and_then(|solver| solver.gas_overhead) {
		None => Ok(default),
		Some(configured) => match validate_gas_overhead(configured) {
			Ok(gas_overhead) => Ok(gas_overhead),
			Err(err) => {
				warn!(
					error = %err,
					"Invalid negative gasOverhead: {}, using default gas overhead",
					configured
				);
				Ok(default)
			},
		},
	}
}

/// Per-quote terms shared by every allocation direction.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteTerms {
	pub expiry_time: String,
	pub estimated_fulfill_time_sec: Decimal,
	pub gas_overhead: u64,
}

/// Allocation output to be priced into a quote entry.
#[derive(Debug, Clone)]
pub struct QuoteAllocation {
	pub route_tokens: Vec<TokenAmount>,
	pub route_calls: Vec<Call>,
	pub reward_tokens: Vec<TokenAmount>,
	pub reward_native: U256,
}

impl QuoteTerms {
	pub fn into_entry(
		self,
		intent_execution_type: IntentExecutionType,
		allocation: QuoteAllocation,
	) -> QuoteDataEntry {
		QuoteDataEntry {
			intent_execution_type,
			route_tokens: allocation.route_tokens,
			route_calls: allocation.route_calls,
			reward_tokens: allocation.reward_tokens,
			reward_native: allocation.reward_native,
			expiry_time: self.expiry_time,
			estimated_fulfill_time_sec: self.estimated_fulfill_time_sec,
			gas_overhead: self.gas_overhead,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::fixtures::snapshot;
	use chrono::TimeZone;

	fn solver_with(gas_overhead: Option<i64>) -> Solver {
		let mut solver = snapshot().solver;
		solver.gas_overhead = gas_overhead;
		solver
	}

	#[test]
	fn test_expiry_is_five_minutes_out() {
		let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
		assert_eq!(quote_expiry(now), "1700000300");
	}

	#[test]
	fn test_solver_override_wins() {
		let solver = solver_with(Some(150_000));
		assert_eq!(resolve_gas_overhead(Some(&solver), Some(145_000)).unwrap(), 150_000);

		let solver = solver_with(Some(0));
		assert_eq!(resolve_gas_overhead(Some(&solver), Some(145_000)).unwrap(), 0);
	}

	#[test]
	fn test_missing_override_uses_default() {
		let solver = solver_with(None);
		assert_eq!(resolve_gas_overhead(Some(&solver), Some(145_000)).unwrap(), 145_000);
		assert_eq!(resolve_gas_overhead(None, Some(145_000)).unwrap(), 145_000);
	}

	#[test]
	fn test_negative_override_falls_back() {
		assert!(matches!(
			validate_gas_overhead(-1),
			Err(QuoteError::InvalidGasOverheadConfiguration(-1))
		));

		let solver = solver_with(Some(-1));
		assert_eq!(resolve_gas_overhead(Some(&solver), Some(145_000)).unwrap(), 145_000);
	}

	#[test]
	fn test_undefined_default_is_fatal() {
		let solver = solver_with(Some(150_000));
		assert!(matches!(
			resolve_gas_overhead(Some(&solver), None),
			Err(QuoteError::DefaultGasOverheadUndefined)
		));
	}
}
