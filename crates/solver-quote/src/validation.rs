//! Intent validation checks run before a quote is generated.

use alloy_primitives::U256;
use chrono::Utc;
use solver_config::ConfigService;
use solver_fee::policy::{get_transaction_target_data, TransactionTargetData};
use solver_fee::{is_greater_equal, FeeError, FeeService};
use solver_types::{u256_to_biguint, NormalizedTotal, QuoteIntent, Solver};
use tracing::{debug, error};

/// Which destination function calls a quote direction accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxValidation {
	/// Any call on a configured target with an enabled selector
	AnyCall,
	/// Only ERC-20 transfers
	TransferOnly,
}

impl TxValidation {
	pub fn accepts(&self, ttd: &TransactionTargetData<'_>) -> bool {
		match self {
			TxValidation::AnyCall => true,
			TxValidation::TransferOnly => ttd.is_erc20_transfer(),
		}
	}
}

/// Outcome of every validation check for one intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationChecks {
	pub supported_prover: bool,
	pub supported_native: bool,
	pub supported_targets: bool,
	pub supported_transaction: bool,
	pub valid_transfer_limit: bool,
	pub valid_source_max: bool,
	pub valid_expiration_time: bool,
	pub valid_destination: bool,
	pub fulfill_on_different_chain: bool,
}

impl ValidationChecks {
	/// Names of the checks that failed, in declaration order.
	pub fn failed(&self) -> Vec<&'static str> {
		[
			("supportedProver", self.supported_prover),
			("supportedNative", self.supported_native),
			("supportedTargets", self.supported_targets),
			("supportedTransaction", self.supported_transaction),
			("validTransferLimit", self.valid_transfer_limit),
			("validSourceMax", self.valid_source_max),
			("validExpirationTime", self.valid_expiration_time),
			("validDestination", self.valid_destination),
			("fulfillOnDifferentChain", self.fulfill_on_different_chain),
		]
		.into_iter()
		.filter(|(_, passed)| !passed)
		.map(|(name, _)| name)
		.collect()
	}

	pub fn is_valid(&self) -> bool {
		self.failed().is_empty()
	}
}

#[derive(Clone)]
pub struct ValidationService {
	config: ConfigService,
	fee: FeeService,
}

impl ValidationService {
	pub fn new(config: ConfigService, fee: FeeService) -> Self {
		Self { config, fee }
	}

	/// Runs every check against `intent`, using the destination `solver`.
	pub async fn assert_validations(
		&self,
		intent: &QuoteIntent,
		solver: &Solver,
		tx_validation: TxValidation,
	) -> ValidationChecks {
		let checks = ValidationChecks {
			supported_prover: self.supported_prover(intent),
			supported_native: self.supported_native(intent),
			supported_targets: self.supported_targets(intent, solver),
			supported_transaction: self.supported_transaction(intent, solver, tx_validation),
			valid_transfer_limit: self.valid_transfer_limit(intent).await,
			valid_source_max: self.valid_source_max(intent).await,
			valid_expiration_time: self.valid_expiration_time(intent),
			valid_destination: self.valid_destination(intent),
			fulfill_on_different_chain: self.fulfill_on_different_chain(intent),
		};

		debug!(quote_id = %intent.quote_id, ?checks, "Validation checks");
		checks
	}

	/// The reward prover is accepted by an intent source on the source chain.
	pub fn supported_prover(&self, intent: &QuoteIntent) -> bool {
		self.config
			.is_supported_prover(intent.route.source, intent.reward.prover)
	}

	/// Native value is only accepted when native intents are enabled.
	pub fn supported_native(&self, intent: &QuoteIntent) -> bool {
		self.config.intent_configs().native_enabled || !intent.is_native_intent()
	}

	/// Every function call targets a contract the solver is configured for.
	pub fn supported_targets(&self, intent: &QuoteIntent, solver: &Solver) -> bool {
		let supported = intent
			.function_targets()
			.iter()
			.all(|target| solver.targets.contains_key(target));
		if !supported {
			debug!(quote_id = %intent.quote_id, "Targets not supported for intent");
		}
		supported
	}

	/// The route has calls, and every function call resolves to an enabled
	/// selector the quote direction accepts.
	pub fn supported_transaction(
		&self,
		intent: &QuoteIntent,
		solver: &Solver,
		tx_validation: TxValidation,
	) -> bool {
		if intent.route.calls.is_empty() {
			debug!(quote_id = %intent.quote_id, "Route has no calls");
			return false;
		}

		intent.function_calls().into_iter().all(|call| {
			get_transaction_target_data(solver, call).is_some_and(|ttd| tx_validation.accepts(&ttd))
		})
	}

	/// The total fill stays within the fee config's transfer limit.
	pub async fn valid_transfer_limit(&self, intent: &QuoteIntent) -> bool {
		let total_fill = match self.fee.get_total_fill(intent).await {
			Ok(total_fill) => total_fill,
			Err(err) => {
				error!(quote_id = %intent.quote_id, error = %err, "Error getting total fill");
				return false;
			},
		};

		let limit = match self.fee.get_fee_config(intent) {
			Ok(fee_config) => fee_config.limit,
			Err(err) => {
				error!(quote_id = %intent.quote_id, error = %err, "Error resolving fee config");
				return false;
			},
		};
		let limit = NormalizedTotal::new(
			u256_to_biguint(limit.token_base6),
			u256_to_biguint(limit.native_base18),
		);

		debug!(
			quote_id = %intent.quote_id,
			total_fill = %total_fill,
			limit = %limit,
			"Transfer limit check"
		);
		is_greater_equal(&limit, &total_fill)
	}

	/// Receiving the reward keeps the solver's source chain balances within
	/// their configured maximums.
	pub async fn valid_source_max(&self, intent: &QuoteIntent) -> bool {
		let Some(solver) = self.config.get_solver(intent.route.source) else {
			debug!(
				quote_id = %intent.quote_id,
				source = intent.route.source,
				"No solver found for source chain"
			);
			return false;
		};

		let within = match self.source_token_max(intent, solver).await {
			Ok(true) => self.source_native_max(intent, solver).await,
			other => other,
		};
		within.unwrap_or_else(|err| {
			error!(quote_id = %intent.quote_id, error = %err, "Error validating max balance");
			false
		})
	}

	async fn source_token_max(
		&self,
		intent: &QuoteIntent,
		solver: &Solver,
	) -> Result<bool, FeeError> {
		for reward in &intent.reward.tokens {
			let Some(max_balance) = solver
				.targets
				.get(&reward.token)
				.and_then(|target| target.max_balance)
			else {
				continue;
			};

			let balances = self
				.fee
				.balances()
				.fetch_token_balances(intent.route.source, &[reward.token])
				.await?;
			let token = balances.into_iter().next().ok_or(FeeError::FailedToFetchTarget {
				chain_id: intent.route.source,
				target: reward.token,
			})?;

			let max = U256::from(max_balance)
				.checked_mul(U256::from(10u64).pow(U256::from(token.decimals)))
				.unwrap_or(U256::MAX);
			let projected = token.balance.saturating_add(reward.amount);
			if projected > max {
				debug!(
					quote_id = %intent.quote_id,
					token = %reward.token,
					current = %token.balance,
					projected = %projected,
					max = %max,
					"Reward would exceed max balance"
				);
				return Ok(false);
			}
		}
		Ok(true)
	}

	async fn source_native_max(
		&self,
		intent: &QuoteIntent,
		solver: &Solver,
	) -> Result<bool, FeeError> {
		let Some(native_max) = solver.native_max else {
			return Ok(true);
		};
		if !intent.is_native_intent() {
			return Ok(true);
		}

		let current = self
			.fee
			.balances()
			.fetch_native_balance(intent.route.source)
			.await?
			.unwrap_or_default();
		let received = intent
			.reward
			.native_value
			.saturating_add(intent.route_native_value());
		let projected = current.saturating_add(received);
		if projected > native_max {
			debug!(
				quote_id = %intent.quote_id,
				current = %current,
				projected = %projected,
				native_max = %native_max,
				"Native reward would exceed native max"
			);
			return Ok(false);
		}
		Ok(true)
	}

	/// The reward deadline leaves the prover its minimum proof window.
	pub fn valid_expiration_time(&self, intent: &QuoteIntent) -> bool {
		let now = u64::try_from(Utc::now().timestamp()).unwrap_or_default();
		let window = self
			.config
			.intent_configs()
			.proofs
			.minimum_duration(intent.reward.prover);
		intent.reward.deadline > now.saturating_add(window)
	}

	pub fn valid_destination(&self, intent: &QuoteIntent) -> bool {
		self.config.get_solver(intent.route.destination).is_some()
	}

	pub fn fulfill_on_different_chain(&self, intent: &QuoteIntent) -> bool {
		intent.route.source != intent.route.destination
	}
}
