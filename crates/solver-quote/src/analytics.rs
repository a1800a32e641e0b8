//! Quote lifecycle analytics.
//!
//! The quote service reports each stage of a request to an optional sink.
//! Tracking is synchronous and infallible: a sink can never change the
//! outcome of a quote.

use solver_types::IntentExecutionType;
use std::time::Duration;
use tracing::{info, warn};

/// A stage reached while serving a quote request.
#[derive(Debug, Clone, PartialEq)]
pub enum QuoteEvent {
	Requested {
		reverse: bool,
	},
	Stored {
		records: usize,
	},
	Rejected {
		execution_type: IntentExecutionType,
		reason: String,
	},
	Generated {
		execution_type: IntentExecutionType,
	},
	GenerationFailed {
		execution_type: IntentExecutionType,
		error: String,
	},
	Completed {
		entries: usize,
		errors: usize,
		elapsed: Duration,
	},
}

/// Receiver of quote lifecycle events.
pub trait AnalyticsSink: Send + Sync {
	fn track(&self, quote_id: &str, event: QuoteEvent);
}

/// Sink that writes events to the log.
#[derive(Debug, Default, Clone)]
pub struct TracingAnalytics;

impl AnalyticsSink for TracingAnalytics {
	fn track(&self, quote_id: &str, event: QuoteEvent) {
		match event {
			QuoteEvent::Requested { reverse } => {
				info!(quote_id, reverse, "Quote requested");
			},
			QuoteEvent::Stored { records } => {
				info!(quote_id, records, "Quote intent stored");
			},
			QuoteEvent::Rejected {
				execution_type,
				reason,
			} => {
				warn!(quote_id, %execution_type, %reason, "Quote intent rejected");
			},
			QuoteEvent::Generated { execution_type } => {
				info!(quote_id, %execution_type, "Quote generated");
			},
			QuoteEvent::GenerationFailed {
				execution_type,
				error,
			} => {
				warn!(quote_id, %execution_type, %error, "Quote generation failed");
			},
			QuoteEvent::Completed {
				entries,
				errors,
				elapsed,
			} => {
				info!(
					quote_id,
					entries,
					errors,
					elapsed_ms = elapsed.as_millis() as u64,
					"Quote request completed"
				);
			},
		}
	}
}
