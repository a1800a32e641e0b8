//! Fee service: normalization of an intent's amounts, fee and ask
//! computation, feasibility checks and the deficit snapshot used by the
//! quote allocators.

use alloy_primitives::Address;
use num_bigint::{BigInt, BigUint};
use num_traits::Zero;
use solver_config::ConfigService;
use solver_types::{
	u256_to_bigint, u256_to_biguint, CalculateTokens, Decimals, DeficitDescending, FeeAlgorithm,
	FeeConfig, FeeTierConstants, IntentSource, NormalizedCall, NormalizedToken, NormalizedTotal,
	QuoteIntent, TokenBalance, TokenFetchAnalysis, TokenMeta, BASE_DECIMALS,
};
use std::collections::HashSet;
use tracing::{debug, error, info};

use crate::balance::BalanceService;
use crate::math;
use crate::normalize::{
	convert_normalize, is_greater_equal, is_insufficient, non_negative, normalize_balance,
	normalize_sum, DecimalBalance,
};
use crate::policy::{get_transaction_target_data, FeePolicy};
use crate::FeeError;

/// Prices intents against the solver's configuration and balances.
#[derive(Clone)]
pub struct FeeService {
	config: ConfigService,
	policy: FeePolicy,
	balances: BalanceService,
}

impl FeeService {
	pub fn new(config: ConfigService, balances: BalanceService) -> Self {
		Self {
			policy: FeePolicy::new(config.clone()),
			config,
			balances,
		}
	}

	pub fn policy(&self) -> &FeePolicy {
		&self.policy
	}

	pub fn balances(&self) -> &BalanceService {
		&self.balances
	}

	/// Fee config resolved for `intent`.
	pub fn get_fee_config(&self, intent: &QuoteIntent) -> Result<FeeConfig, FeeError> {
		self.policy.get_fee_config(intent)
	}

	/// Fee for `total` under the fee config resolved for `intent`.
	pub fn get_fee(
		&self,
		total: &NormalizedTotal,
		intent: &QuoteIntent,
	) -> Result<NormalizedTotal, FeeError> {
		let fee_config = self.policy.get_fee_config(intent)?;
		let is_non_swap = self
			.policy
			.extract_route_tuple(intent)
			.is_some_and(|tuple| self.policy.is_non_swap_route(&tuple));

		let fee = match fee_config.algorithm {
			FeeAlgorithm::Linear => {
				let constants = &fee_config.constants;
				let token_tier = if is_non_swap {
					constants.non_swap_token.as_ref().unwrap_or(&constants.token)
				} else {
					&constants.token
				};
				NormalizedTotal {
					token: linear_fee(&total.token, token_tier),
					native: linear_fee(&total.native, &constants.native),
				}
			},
			algorithm => {
				return Err(FeeError::InvalidSolverAlgorithm {
					chain_id: intent.route.destination,
					algorithm,
				})
			},
		};

		debug!(
			quote_id = %intent.quote_id,
			is_non_swap,
			fee = %fee,
			"Fee calculation"
		);
		Ok(fee)
	}

	/// Total fill plus its fee.
	pub fn get_ask(
		&self,
		total_fill: &NormalizedTotal,
		intent: &QuoteIntent,
	) -> Result<NormalizedTotal, FeeError> {
		let fee = self.get_fee(total_fill, intent)?;
		Ok(normalize_sum(&fee, total_fill))
	}

	/// Checks that the solver can and wants to fill the route: a single
	/// call, no duplicated reward tokens, and rewards covering the ask.
	pub async fn is_route_feasible(&self, intent: &QuoteIntent) -> Result<(), FeeError> {
		if intent.route.calls.len() != 1 {
			return Err(FeeError::MultiFulfillRoute);
		}

		let mut seen = HashSet::new();
		if !intent.reward.tokens.iter().all(|t| seen.insert(t.token)) {
			return Err(FeeError::DuplicatedRewardToken);
		}

		let total_fill = self.get_total_fill(intent).await?;
		let total_rewards = self.get_total_rewards(intent).await?;
		let ask = self.get_ask(&total_fill, intent)?;

		if is_insufficient(&ask, &total_rewards) {
			return Err(FeeError::RouteIsInfeasible {
				ask,
				reward: total_rewards,
			});
		}
		Ok(())
	}

	/// Checks that the rewards at least cover the fee charged on them.
	pub async fn is_reward_feasible(&self, intent: &QuoteIntent) -> Result<(), FeeError> {
		let total_rewards = self.get_total_rewards(intent).await?;
		let fee = self.get_fee(&total_rewards, intent)?;

		if !is_greater_equal(&total_rewards, &fee) {
			return Err(FeeError::RewardIsInfeasible {
				fee,
				reward: total_rewards,
			});
		}
		Ok(())
	}

	/// Sum of the normalized destination calls.
	pub async fn get_total_fill(&self, intent: &QuoteIntent) -> Result<NormalizedTotal, FeeError> {
		let calls = self.get_calls_normalized(intent).await?;
		Ok(calls
			.iter()
			.fold(NormalizedTotal::zero(), |mut acc, call| {
				acc.token += non_negative(&call.token.balance);
				acc.native += u256_to_biguint(call.native);
				acc
			}))
	}

	/// Sum of the normalized accepted rewards, plus the native reward.
	pub async fn get_total_rewards(
		&self,
		intent: &QuoteIntent,
	) -> Result<NormalizedTotal, FeeError> {
		let rewards = self.get_rewards_normalized(intent).await?;
		let token = rewards
			.iter()
			.fold(BigUint::zero(), |acc, reward| acc + non_negative(&reward.balance));
		Ok(NormalizedTotal {
			token,
			native: u256_to_biguint(intent.reward.native_value),
		})
	}

	/// Builds the per-intent snapshot consumed by the quote allocators.
	pub async fn calculate_tokens(&self, intent: &QuoteIntent) -> Result<CalculateTokens, FeeError> {
		let src_chain_id = intent.route.source;
		let dst_chain_id = intent.route.destination;

		let source = self.config.get_intent_source(src_chain_id);
		let destination = self.config.get_intent_source(dst_chain_id);
		let solver = self.config.get_solver(dst_chain_id);

		let (source, destination, solver) = match (source, destination, solver) {
			(Some(source), Some(destination), Some(solver)) => (source, destination, solver),
			(source, destination, _) => {
				let err = if source.is_none() {
					FeeError::NoIntentSourceForSource(src_chain_id)
				} else if destination.is_none() {
					FeeError::NoIntentSourceForDestination(dst_chain_id)
				} else {
					FeeError::NoSolverForDestination(dst_chain_id)
				};
				error!(quote_id = %intent.quote_id, error = %err, "Cannot calculate tokens");
				return Err(err);
			},
		};

		let (src_data, dst_data, rewards, tokens, calls) = futures::try_join!(
			self.balances.fetch_token_data(src_chain_id),
			self.balances.fetch_token_data(dst_chain_id),
			self.get_rewards_normalized(intent),
			self.get_tokens_normalized(intent),
			self.get_calls_normalized(intent),
		)?;

		Ok(CalculateTokens {
			solver: solver.clone(),
			rewards,
			tokens,
			calls,
			src_deficit_descending: self.deficit_descending(src_data, source),
			dest_deficit_descending: self.deficit_descending(dst_data, destination),
		})
	}

	/// Deficit entries for the tokens `source` accepts, most deficient first.
	fn deficit_descending(
		&self,
		data: Vec<TokenFetchAnalysis>,
		source: &IntentSource,
	) -> Vec<DeficitDescending> {
		let mut deficits: Vec<DeficitDescending> = data
			.into_iter()
			.filter(|analysis| source.tokens.contains(&analysis.token.address))
			.map(|analysis| DeficitDescending {
				delta: self.calculate_delta(&analysis),
				analysis,
			})
			.collect();
		deficits.sort_by(|a, b| math::compare(&a.delta.balance, &b.delta.balance));
		deficits
	}

	/// Normalized reward tokens accepted on the source chain.
	pub async fn get_rewards_normalized(
		&self,
		intent: &QuoteIntent,
	) -> Result<Vec<NormalizedToken>, FeeError> {
		let chain_id = intent.route.source;
		let source = self
			.config
			.get_intent_source(chain_id)
			.ok_or(FeeError::NoIntentSourceForSource(chain_id))?;

		let accepted: Vec<Address> = intent
			.reward
			.tokens
			.iter()
			.filter(|reward| source.tokens.contains(&reward.token))
			.map(|reward| reward.token)
			.collect();

		if accepted.is_empty() && intent.is_native_intent() {
			return Ok(Vec::new());
		}

		let balances = self.balances.fetch_token_balances(chain_id, &accepted).await?;
		if balances.is_empty() {
			return Err(FeeError::FetchingRewardTokensFailed(chain_id));
		}

		balances
			.iter()
			.map(|tb| {
				let reward = intent
					.reward
					.tokens
					.iter()
					.find(|reward| reward.token == tb.address)
					.ok_or(FeeError::RewardTokenNotFound(tb.address))?;
				Ok(convert_normalize(
					&u256_to_bigint(reward.amount),
					meta(chain_id, tb),
				))
			})
			.collect()
	}

	/// Normalized route tokens accepted on the destination chain.
	pub async fn get_tokens_normalized(
		&self,
		intent: &QuoteIntent,
	) -> Result<Vec<NormalizedToken>, FeeError> {
		let chain_id = intent.route.destination;
		let destination = self
			.config
			.get_intent_source(chain_id)
			.ok_or(FeeError::NoIntentSourceForDestination(chain_id))?;

		let accepted: Vec<Address> = intent
			.route
			.tokens
			.iter()
			.filter(|token| destination.tokens.contains(&token.token))
			.map(|token| token.token)
			.collect();

		if accepted.is_empty() && intent.is_native_intent() {
			return Ok(Vec::new());
		}

		let balances = self.balances.fetch_token_balances(chain_id, &accepted).await?;
		if balances.is_empty() {
			return Err(FeeError::FetchingRouteTokensFailed(chain_id));
		}

		balances
			.iter()
			.map(|tb| {
				let token = intent
					.route
					.tokens
					.iter()
					.find(|token| token.token == tb.address)
					.ok_or(FeeError::RouteTokenNotFound(tb.address))?;
				Ok(convert_normalize(
					&u256_to_bigint(token.amount),
					meta(chain_id, tb),
				))
			})
			.collect()
	}

	/// Normalized destination calls. Function calls must be ERC-20 transfers
	/// on a solver target the solver can afford; native calls follow with a
	/// zero token balance.
	pub async fn get_calls_normalized(
		&self,
		intent: &QuoteIntent,
	) -> Result<Vec<NormalizedCall>, FeeError> {
		let dst_chain_id = intent.route.destination;
		let solver = self
			.config
			.get_solver(dst_chain_id)
			.ok_or(FeeError::NoSolverForDestination(dst_chain_id))?;
		let chain_id = solver.chain_id;

		let targets = intent.function_targets();
		if targets.is_empty() && intent.is_native_intent() {
			return Ok(self.normalized_native_calls(intent, chain_id));
		}

		let balances = self.balances.fetch_token_balances(chain_id, &targets).await?;
		if balances.is_empty() {
			return Err(FeeError::FetchingCallTokensFailed(chain_id));
		}

		let skip_balance_check = self.config.intent_configs().skip_balance_check;
		let mut calls = Vec::new();

		for call in intent.function_calls() {
			let ttd = get_transaction_target_data(solver, call)
				.filter(|ttd| ttd.is_erc20_transfer())
				.ok_or_else(|| {
					let err = FeeError::NonErc20TargetInCalls(call.target);
					error!(quote_id = %intent.quote_id, target = %call.target, error = %err, "Unsupported call");
					err
				})?;

			let (config, balance) = solver
				.targets
				.get(&call.target)
				.zip(balances.iter().find(|b| b.address == call.target))
				.ok_or(FeeError::FailedToFetchTarget {
					chain_id,
					target: call.target,
				})?;

			let transfer = ttd
				.transfer
				.ok_or(FeeError::InvalidFunctionData(call.target))?;

			let min_balance = normalize_balance(
				DecimalBalance::new(config.min_balance, 0),
				balance.decimals,
			)
			.balance;
			let available = u256_to_bigint(balance.balance) - &min_balance;

			if !skip_balance_check && u256_to_bigint(transfer.amount) > available {
				let err = FeeError::SolverLacksLiquidity {
					chain_id,
					target: call.target,
					requested: transfer.amount,
					balance: balance.balance,
					min_balance,
				};
				error!(quote_id = %intent.quote_id, error = %err, "Solver lacks liquidity");
				return Err(err);
			}

			calls.push(NormalizedCall {
				token: convert_normalize(&u256_to_bigint(transfer.amount), meta(chain_id, balance)),
				recipient: transfer.recipient,
				native: call.value,
			});
		}

		calls.extend(self.normalized_native_calls(intent, chain_id));
		Ok(calls)
	}

	fn normalized_native_calls(&self, intent: &QuoteIntent, chain_id: u64) -> Vec<NormalizedCall> {
		intent
			.native_calls()
			.into_iter()
			.map(|call| NormalizedCall {
				token: NormalizedToken {
					balance: BigInt::zero(),
					chain_id,
					address: Address::ZERO,
					decimals: Decimals {
						original: 0,
						current: BASE_DECIMALS,
					},
				},
				recipient: call.target,
				native: call.value,
			})
			.collect()
	}

	/// Normalized distance of the solver's balance from its target.
	pub fn calculate_delta(&self, analysis: &TokenFetchAnalysis) -> NormalizedToken {
		let target = normalize_balance(
			DecimalBalance::new(analysis.config.target_balance, 0),
			analysis.token.decimals,
		)
		.balance;
		let delta = u256_to_bigint(analysis.token.balance) - target;
		convert_normalize(
			&delta,
			TokenMeta {
				chain_id: analysis.chain_id,
				address: analysis.config.address,
				decimals: analysis.token.decimals,
			},
		)
	}

	/// `min_balance` expressed in the token's on-chain precision.
	pub fn get_normalized_min_balance(&self, analysis: &TokenFetchAnalysis) -> BigInt {
		normalize_balance(
			DecimalBalance::new(analysis.config.min_balance, 0),
			analysis.token.decimals,
		)
		.balance
	}

	/// Balance analysis of every solver token on `chain_id`.
	pub async fn fetch_token_data(&self, chain_id: u64) -> Result<Vec<TokenFetchAnalysis>, FeeError> {
		let data = self.balances.fetch_token_data(chain_id).await?;
		info!(chain_id, tokens = data.len(), "Fetched solver token data");
		Ok(data)
	}
}

fn meta(chain_id: u64, balance: &TokenBalance) -> TokenMeta {
	TokenMeta {
		chain_id,
		address: balance.address,
		decimals: balance.decimals,
	}
}

/// `base_fee + ceil(amount / unit_size) * unit_fee`, or zero for a zero amount.
fn linear_fee(amount: &BigUint, tier: &FeeTierConstants) -> BigUint {
	if amount.is_zero() {
		return BigUint::zero();
	}
	let unit_size = u256_to_biguint(tier.tranche.unit_size);
	if unit_size.is_zero() {
		return u256_to_biguint(tier.base_fee);
	}
	let mut units = amount / &unit_size;
	if !(amount % &unit_size).is_zero() {
		units += 1u32;
	}
	u256_to_biguint(tier.base_fee) + units * u256_to_biguint(tier.tranche.unit_fee)
}
