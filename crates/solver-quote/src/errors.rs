// solver-quote/src/errors.rs

use alloy_primitives::Address;
use solver_fee::FeeError;
use solver_storage::StorageError;
use solver_types::{IntentExecutionType, NormalizedTotal};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuoteError {
	#[error("Insufficient balance: ask ({ask}) exceeds reward ({reward})")]
	InsufficientBalance {
		ask: NormalizedTotal,
		reward: NormalizedTotal,
	},

	#[error("Internal quote error: {0}")]
	InternalQuoteError(FeeError),

	#[error("Invalid gas overhead configuration: {0}")]
	InvalidGasOverheadConfiguration(i64),

	#[error("Default gas overhead is undefined")]
	DefaultGasOverheadUndefined,

	#[error("No solver for destination chain {0}")]
	SolverUnsupported(u64),

	#[error("Infeasible quote: {0}")]
	InfeasibleQuote(FeeError),

	#[error("Invalid quote intent, failed checks: {0}")]
	InvalidQuoteIntent(String),

	#[error("Unsupported execution type {0}")]
	UnsupportedExecutionType(IntentExecutionType),

	#[error("None of the requested execution types is served")]
	NoExecutionTypes,

	#[error("Amount for token {0} does not fit in 256 bits")]
	AmountOutOfRange(Address),

	#[error("Storage error: {0}")]
	Storage(#[from] StorageError),
}

impl QuoteError {
	/// Stable identifier used in API responses and quote receipts.
	pub fn name(&self) -> &'static str {
		match self {
			QuoteError::InsufficientBalance { .. } => "InsufficientBalance",
			QuoteError::InternalQuoteError(_) => "InternalQuoteError",
			QuoteError::InvalidGasOverheadConfiguration(_) => "InvalidGasOverheadConfiguration",
			QuoteError::DefaultGasOverheadUndefined => "DefaultGasOverheadUndefined",
			QuoteError::SolverUnsupported(_) => "SolverUnsupported",
			QuoteError::InfeasibleQuote(_) => "InfeasibleQuote",
			QuoteError::InvalidQuoteIntent(_) => "InvalidQuoteIntent",
			QuoteError::UnsupportedExecutionType(_) => "UnsupportedExecutionType",
			QuoteError::NoExecutionTypes => "NoExecutionTypes",
			QuoteError::AmountOutOfRange(_) => "AmountOutOfRange",
			QuoteError::Storage(_) => "Storage",
		}
	}

	/// True for errors caused by the request rather than the service.
	pub fn is_client_error(&self) -> bool {
		matches!(
			self,
			QuoteError::InsufficientBalance { .. }
				| QuoteError::SolverUnsupported(_)
				| QuoteError::InfeasibleQuote(_)
				| QuoteError::InvalidQuoteIntent(_)
				| QuoteError::UnsupportedExecutionType(_)
				| QuoteError::NoExecutionTypes
		)
	}
}
