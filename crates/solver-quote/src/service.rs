//! Quote service: request handling around the allocators.
//!
//! A request is stored as one record per execution type that is both
//! requested and served by this deployment. Each record is validated and
//! quoted independently and its outcome is written back as a receipt.

use chrono::Utc;
use solver_config::ConfigService;
use solver_fee::FeeService;
use solver_types::{IntentExecutionType, QuoteData, QuoteDataEntry, QuoteIntent, QuoteReceipt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::analytics::{AnalyticsSink, QuoteEvent};
use crate::assembly::{quote_expiry, resolve_gas_overhead, QuoteAllocation, QuoteTerms};
use crate::forward::allocate_forward;
use crate::fulfillment::FulfillmentEstimateService;
use crate::repository::QuoteRepository;
use crate::reverse::allocate_reverse;
use crate::validation::{TxValidation, ValidationService};
use crate::QuoteError;

/// Direction of a quote request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuoteDirection {
	/// The destination calls are fixed; price the reward.
	Forward,
	/// The reward is fixed; size the destination transfers.
	Reverse,
}

impl QuoteDirection {
	fn tx_validation(self) -> TxValidation {
		match self {
			QuoteDirection::Forward => TxValidation::AnyCall,
			QuoteDirection::Reverse => TxValidation::TransferOnly,
		}
	}
}

/// Result of a quote request with at least one priced entry.
#[derive(Debug)]
pub struct QuoteOutcome {
	pub quote_data: QuoteData,
	/// Execution types that could not be quoted
	pub failures: Vec<(IntentExecutionType, QuoteError)>,
}

#[derive(Clone)]
pub struct QuoteService {
	config: ConfigService,
	fee: FeeService,
	validation: ValidationService,
	fulfillment: FulfillmentEstimateService,
	repository: QuoteRepository,
	analytics: Option<Arc<dyn AnalyticsSink>>,
}

impl QuoteService {
	pub fn new(config: ConfigService, fee: FeeService, repository: QuoteRepository) -> Self {
		Self {
			validation: ValidationService::new(config.clone(), fee.clone()),
			fulfillment: FulfillmentEstimateService::new(config.clone()),
			config,
			fee,
			repository,
			analytics: None,
		}
	}

	pub fn with_analytics(mut self, analytics: Arc<dyn AnalyticsSink>) -> Self {
		self.analytics = Some(analytics);
		self
	}

	pub fn repository(&self) -> &QuoteRepository {
		&self.repository
	}

	/// Prices the reward the solver asks for to execute the intent's route.
	pub async fn get_quote(&self, intent: &QuoteIntent) -> Result<QuoteOutcome, QuoteError> {
		self.quote(intent, QuoteDirection::Forward).await
	}

	/// Sizes the destination transfers the intent's reward can pay for.
	pub async fn get_reverse_quote(
		&self,
		intent: &QuoteIntent,
	) -> Result<QuoteOutcome, QuoteError> {
		self.quote(intent, QuoteDirection::Reverse).await
	}

	#[instrument(skip_all, fields(quote_id = %intent.quote_id, direction = ?direction))]
	async fn quote(
		&self,
		intent: &QuoteIntent,
		direction: QuoteDirection,
	) -> Result<QuoteOutcome, QuoteError> {
		let started = Instant::now();
		self.track(
			&intent.quote_id,
			QuoteEvent::Requested {
				reverse: direction == QuoteDirection::Reverse,
			},
		);

		let supported = &self.config.quotes_config().intent_execution_types;
		let mut records = self
			.repository
			.store_quote_intents(intent, supported)
			.await?;
		if records.is_empty() {
			warn!(requested = ?intent.intent_execution_types, "No requested execution type is served");
			return Err(QuoteError::NoExecutionTypes);
		}
		self.track(
			&intent.quote_id,
			QuoteEvent::Stored {
				records: records.len(),
			},
		);

		let mut entries = Vec::new();
		let mut failures = Vec::new();

		for record in records.iter_mut() {
			let execution_type = record.intent_execution_type;

			let result = match self.validate(&record.intent, direction).await {
				Ok(()) => {
					let generated = self
						.generate(&record.intent, execution_type, direction)
						.await;
					if let Err(err) = &generated {
						self.track(
							&intent.quote_id,
							QuoteEvent::GenerationFailed {
								execution_type,
								error: err.to_string(),
							},
						);
					}
					generated
				},
				Err(err) => {
					self.track(
						&intent.quote_id,
						QuoteEvent::Rejected {
							execution_type,
							reason: err.to_string(),
						},
					);
					Err(err)
				},
			};

			match result {
				Ok(entry) => {
					self.repository
						.update_receipt(record, QuoteReceipt::Quoted(entry.clone()))
						.await?;
					self.track(&intent.quote_id, QuoteEvent::Generated { execution_type });
					entries.push(entry);
				},
				Err(err) => {
					self.repository
						.update_receipt(record, QuoteReceipt::Failed(err.to_string()))
						.await?;
					failures.push((execution_type, err));
				},
			}
		}

		self.track(
			&intent.quote_id,
			QuoteEvent::Completed {
				entries: entries.len(),
				errors: failures.len(),
				elapsed: started.elapsed(),
			},
		);

		if entries.is_empty() {
			let (_, err) = failures
				.into_iter()
				.next()
				.ok_or(QuoteError::NoExecutionTypes)?;
			return Err(err);
		}

		info!(entries = entries.len(), failures = failures.len(), "Quote ready");
		Ok(QuoteOutcome {
			quote_data: QuoteData {
				quote_entries: entries,
			},
			failures,
		})
	}

	/// Checks that the intent can be served in `direction`.
	async fn validate(
		&self,
		intent: &QuoteIntent,
		direction: QuoteDirection,
	) -> Result<(), QuoteError> {
		let destination = intent.route.destination;
		let solver = self.config.get_solver(destination).ok_or_else(|| {
			warn!(chain_id = destination, "No solver for destination chain");
			QuoteError::SolverUnsupported(destination)
		})?;

		let checks = self
			.validation
			.assert_validations(intent, solver, direction.tx_validation())
			.await;
		if !checks.is_valid() {
			let failed = checks.failed().join(", ");
			warn!(%failed, "Quote intent failed validation");
			return Err(QuoteError::InvalidQuoteIntent(failed));
		}

		let feasible = match direction {
			QuoteDirection::Forward => self.fee.is_route_feasible(intent).await,
			QuoteDirection::Reverse => self.fee.is_reward_feasible(intent).await,
		};
		feasible.map_err(|err| {
			warn!(error = %err, "Quote is infeasible");
			QuoteError::InfeasibleQuote(err)
		})
	}

	async fn generate(
		&self,
		intent: &QuoteIntent,
		execution_type: IntentExecutionType,
		direction: QuoteDirection,
	) -> Result<QuoteDataEntry, QuoteError> {
		match execution_type {
			IntentExecutionType::SelfPublish | IntentExecutionType::Gasless => match direction {
				QuoteDirection::Forward => self.generate_quote(intent, execution_type).await,
				QuoteDirection::Reverse => {
					self.generate_reverse_quote(intent, execution_type).await
				},
			},
			IntentExecutionType::CrowdLiquidity => {
				Err(QuoteError::UnsupportedExecutionType(execution_type))
			},
		}
	}

	/// Forward quote: the route stays as requested and the reward is drawn
	/// from the offered tokens.
	pub async fn generate_quote(
		&self,
		intent: &QuoteIntent,
		execution_type: IntentExecutionType,
	) -> Result<QuoteDataEntry, QuoteError> {
		let (calculated, total_fill, total_rewards) = tokio::try_join!(
			self.fee.calculate_tokens(intent),
			self.fee.get_total_fill(intent),
			self.fee.get_total_rewards(intent)
		)
		.map_err(QuoteError::InternalQuoteError)?;

		let total_ask = self
			.fee
			.get_ask(&total_fill, intent)
			.map_err(QuoteError::InternalQuoteError)?;

		let allocation = allocate_forward(calculated, &total_ask, &total_rewards)?;
		let terms = self.quote_terms(intent)?;

		Ok(terms.into_entry(
			execution_type,
			QuoteAllocation {
				route_tokens: intent.route.tokens.clone(),
				route_calls: intent.route.calls.clone(),
				reward_tokens: allocation.reward_tokens,
				reward_native: allocation.reward_native,
			},
		))
	}

	/// Reverse quote: the reward stays as offered and the route is rebuilt
	/// from what it can fund after the fee.
	pub async fn generate_reverse_quote(
		&self,
		intent: &QuoteIntent,
		execution_type: IntentExecutionType,
	) -> Result<QuoteDataEntry, QuoteError> {
		let (calculated, total_rewards) = tokio::try_join!(
			self.fee.calculate_tokens(intent),
			self.fee.get_total_rewards(intent)
		)
		.map_err(QuoteError::InternalQuoteError)?;

		let fee = self
			.fee
			.get_fee(&total_rewards, intent)
			.map_err(QuoteError::InternalQuoteError)?;

		let allocation = allocate_reverse(calculated, &fee, &total_rewards)?;
		let terms = self.quote_terms(intent)?;

		Ok(terms.into_entry(
			execution_type,
			QuoteAllocation {
				route_tokens: allocation.route_tokens,
				route_calls: allocation.route_calls,
				reward_tokens: intent.reward.tokens.clone(),
				reward_native: allocation.reward_native,
			},
		))
	}

	fn quote_terms(&self, intent: &QuoteIntent) -> Result<QuoteTerms, QuoteError> {
		let gas_overhead = resolve_gas_overhead(
			self.config.get_solver(intent.route.source),
			self.config.intent_configs().default_gas_overhead,
		)?;

		Ok(QuoteTerms {
			expiry_time: quote_expiry(Utc::now()),
			estimated_fulfill_time_sec: self.fulfillment.get_estimated_fulfill_time_sec(intent),
			gas_overhead,
		})
	}

	fn track(&self, quote_id: &str, event: QuoteEvent) {
		if let Some(analytics) = &self.analytics {
			analytics.track(quote_id, event);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::fixtures::{
		fee_service_with, quote_config, transfer_intent, usdc, RECIPIENT, USDC_BASE, USDC_OP,
		USDT_OP,
	};
	use alloy_primitives::U256;
	use rust_decimal::Decimal;
	use solver_storage::implementations::memory::MemoryStorage;
	use solver_storage::StorageService;
	use solver_types::erc20::decode_transfer;
	use solver_types::{QuoteEngineConfig, TokenAmount};
	use std::str::FromStr;
	use std::sync::Mutex;

	#[derive(Default)]
	struct RecordingSink(Mutex<Vec<QuoteEvent>>);

	impl AnalyticsSink for RecordingSink {
		fn track(&self, _quote_id: &str, event: QuoteEvent) {
			self.0.lock().unwrap().push(event);
		}
	}

	fn service_with(config: QuoteEngineConfig) -> QuoteService {
		let config = ConfigService::new(config);
		let repository =
			QuoteRepository::new(Arc::new(StorageService::new(Box::new(MemoryStorage::new()))));
		QuoteService::new(config.clone(), fee_service_with(config), repository)
	}

	fn service() -> QuoteService {
		service_with(quote_config())
	}

	#[tokio::test]
	async fn test_forward_quote_draws_from_deficit_token() {
		let intent = transfer_intent(USDC_OP, usdc(11), usdc(10));
		let outcome = service().get_quote(&intent).await.unwrap();

		let entry = &outcome.quote_data.quote_entries[0];
		assert_eq!(entry.intent_execution_type, IntentExecutionType::SelfPublish);
		// 10 USDC plus the non-swap fee of 0.01 + 0.005
		assert_eq!(
			entry.reward_tokens,
			vec![TokenAmount::new(USDC_OP, U256::from(10_015_000u64))]
		);
		assert_eq!(entry.reward_native, U256::ZERO);
		assert_eq!(entry.route_tokens, intent.route.tokens);
		assert_eq!(entry.route_calls, intent.route.calls);
		assert_eq!(entry.gas_overhead, 150_000);
		assert_eq!(
			entry.estimated_fulfill_time_sec,
			Decimal::from_str("1.1").unwrap()
		);
		let expiry: i64 = entry.expiry_time.parse().unwrap();
		assert!(expiry > Utc::now().timestamp());
		assert!(outcome.failures.is_empty());
	}

	#[tokio::test]
	async fn test_forward_quote_with_route_override() {
		let intent = transfer_intent(USDT_OP, usdc(11), usdc(10));
		let outcome = service().get_quote(&intent).await.unwrap();

		// base fee 0.03 from the override plus one 0.015 tranche
		assert_eq!(
			outcome.quote_data.quote_entries[0].reward_tokens,
			vec![TokenAmount::new(USDT_OP, U256::from(10_045_000u64))]
		);
	}

	#[tokio::test]
	async fn test_one_entry_per_served_execution_type() {
		let mut intent = transfer_intent(USDC_OP, usdc(11), usdc(10));
		intent.intent_execution_types = vec![
			IntentExecutionType::Gasless,
			IntentExecutionType::CrowdLiquidity,
			IntentExecutionType::SelfPublish,
		];

		let outcome = service().get_quote(&intent).await.unwrap();
		let types: Vec<_> = outcome
			.quote_data
			.quote_entries
			.iter()
			.map(|e| e.intent_execution_type)
			.collect();
		assert_eq!(
			types,
			vec![IntentExecutionType::Gasless, IntentExecutionType::SelfPublish]
		);
	}

	#[tokio::test]
	async fn test_crowd_liquidity_is_reported_as_failure() {
		let mut config = quote_config();
		config
			.quotes
			.intent_execution_types
			.push(IntentExecutionType::CrowdLiquidity);
		let mut intent = transfer_intent(USDC_OP, usdc(11), usdc(10));
		intent.intent_execution_types =
			vec![IntentExecutionType::SelfPublish, IntentExecutionType::CrowdLiquidity];

		let outcome = service_with(config).get_quote(&intent).await.unwrap();
		assert_eq!(outcome.quote_data.quote_entries.len(), 1);
		assert_eq!(outcome.failures.len(), 1);
		assert!(matches!(
			outcome.failures[0],
			(
				IntentExecutionType::CrowdLiquidity,
				QuoteError::UnsupportedExecutionType(IntentExecutionType::CrowdLiquidity)
			)
		));
	}

	#[tokio::test]
	async fn test_unserved_execution_types() {
		let mut intent = transfer_intent(USDC_OP, usdc(11), usdc(10));
		intent.intent_execution_types = vec![IntentExecutionType::CrowdLiquidity];

		let err = service().get_quote(&intent).await.unwrap_err();
		assert!(matches!(err, QuoteError::NoExecutionTypes));
	}

	#[tokio::test]
	async fn test_reward_below_ask_is_infeasible_and_recorded() {
		let service = service();
		let intent = transfer_intent(USDC_OP, usdc(10), usdc(10));

		let err = service.get_quote(&intent).await.unwrap_err();
		assert!(matches!(err, QuoteError::InfeasibleQuote(_)));

		let records = service
			.repository()
			.fetch_by_quote_id(&intent.quote_id)
			.await
			.unwrap();
		assert_eq!(records.len(), 1);
		assert!(matches!(records[0].receipt, Some(QuoteReceipt::Failed(_))));
	}

	#[tokio::test]
	async fn test_unknown_destination_is_unsupported() {
		let mut intent = transfer_intent(USDC_OP, usdc(11), usdc(10));
		intent.route.destination = 42161;

		let err = service().get_quote(&intent).await.unwrap_err();
		assert!(matches!(err, QuoteError::SolverUnsupported(42161)));
	}

	#[tokio::test]
	async fn test_failed_validation_names_checks() {
		let mut intent = transfer_intent(USDC_OP, usdc(11), usdc(10));
		intent.reward.deadline = 1;

		match service().get_quote(&intent).await.unwrap_err() {
			QuoteError::InvalidQuoteIntent(failed) => assert_eq!(failed, "validExpirationTime"),
			other => panic!("unexpected error: {other}"),
		}
	}

	#[tokio::test]
	async fn test_undefined_default_gas_overhead_fails_quote() {
		let mut config = quote_config();
		config.intent.default_gas_overhead = None;
		let intent = transfer_intent(USDC_OP, usdc(11), usdc(10));

		let err = service_with(config).get_quote(&intent).await.unwrap_err();
		assert!(matches!(err, QuoteError::DefaultGasOverheadUndefined));
	}

	#[tokio::test]
	async fn test_insufficient_reward_reported_before_gas_overhead() {
		let mut config = quote_config();
		config.intent.default_gas_overhead = None;
		let service = service_with(config);

		let short = transfer_intent(USDC_OP, usdc(10), usdc(10));
		let err = service
			.generate_quote(&short, IntentExecutionType::SelfPublish)
			.await
			.unwrap_err();
		assert!(matches!(err, QuoteError::InsufficientBalance { .. }));

		let below_fee = transfer_intent(USDC_OP, U256::from(1_000u64), usdc(10));
		let err = service
			.generate_reverse_quote(&below_fee, IntentExecutionType::SelfPublish)
			.await
			.unwrap_err();
		assert!(matches!(err, QuoteError::InsufficientBalance { .. }));
	}

	#[tokio::test]
	async fn test_negative_gas_overhead_uses_default() {
		let mut config = quote_config();
		config.solvers.get_mut(&10).unwrap().gas_overhead = Some(-5);
		let intent = transfer_intent(USDC_OP, usdc(11), usdc(10));

		let outcome = service_with(config).get_quote(&intent).await.unwrap();
		assert_eq!(outcome.quote_data.quote_entries[0].gas_overhead, 145_000);
	}

	#[tokio::test]
	async fn test_reverse_quote_funds_transfer_after_fee() {
		let service = service();
		let intent = transfer_intent(USDC_OP, usdc(100), usdc(100));
		let outcome = service.get_reverse_quote(&intent).await.unwrap();

		let entry = &outcome.quote_data.quote_entries[0];
		// 100 USDC less the non-swap fee of 0.01 + 0.005
		let funded = U256::from(99_985_000u64);
		assert_eq!(entry.route_tokens, vec![TokenAmount::new(USDC_BASE, funded)]);
		assert_eq!(entry.reward_tokens, intent.reward.tokens);
		assert_eq!(entry.reward_native, U256::ZERO);

		let call = &entry.route_calls[0];
		assert_eq!(call.target, USDC_BASE);
		let transfer = decode_transfer(&call.data).unwrap();
		assert_eq!(transfer.recipient, RECIPIENT);
		assert_eq!(transfer.amount, funded);

		let records = service
			.repository()
			.fetch_by_quote_id(&intent.quote_id)
			.await
			.unwrap();
		assert_eq!(records[0].receipt, Some(QuoteReceipt::Quoted(entry.clone())));
	}

	#[tokio::test]
	async fn test_analytics_follow_each_stage() {
		let sink = Arc::new(RecordingSink::default());
		let service = service().with_analytics(sink.clone());
		let mut intent = transfer_intent(USDC_OP, usdc(11), usdc(10));
		intent.intent_execution_types =
			vec![IntentExecutionType::SelfPublish, IntentExecutionType::Gasless];

		service.get_quote(&intent).await.unwrap();

		let events = sink.0.lock().unwrap();
		assert_eq!(events[0], QuoteEvent::Requested { reverse: false });
		assert_eq!(events[1], QuoteEvent::Stored { records: 2 });
		assert_eq!(
			events[2],
			QuoteEvent::Generated {
				execution_type: IntentExecutionType::SelfPublish
			}
		);
		assert!(matches!(
			events.last(),
			Some(QuoteEvent::Completed {
				entries: 2,
				errors: 0,
				..
			})
		));
	}
}
