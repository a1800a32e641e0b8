//! Forward allocation: which reward tokens to request, and how much of each.
//!
//! The solver must be paid `total_ask` on the source chain. The allocator
//! draws that amount from the offered reward tokens in two passes over the
//! source-chain deficit list:
//!
//! 1. Tokens the solver holds below target are drawn first, each up to its
//!    deficit, so fulfilling the intent also rebalances the solver.
//! 2. Whatever is still missing is drawn from the neediest tokens first,
//!    regardless of sign, concentrating the reward in few tokens.

use alloy_primitives::{Address, U256};
use num_bigint::BigInt;
use num_traits::{Signed, Zero};
use solver_fee::math;
use solver_fee::{
	convert_normalize, deconvert_normalize, deconvert_normalize_ceil, is_insufficient,
	normalize::non_negative,
};
use solver_types::{
	bigint_to_u256, biguint_to_u256, CalculateTokens, DeficitDescending, NormalizedToken,
	NormalizedTotal, TokenAmount,
};
use tracing::debug;

use crate::QuoteError;

/// Reward side of a forward quote.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardAllocation {
	/// Requested reward amounts in on-chain precision, in allocation order
	pub reward_tokens: Vec<TokenAmount>,
	pub reward_native: U256,
}

/// Allocates `total_ask` over the offered rewards of `calculated`.
///
/// Fails with [`QuoteError::InsufficientBalance`] when the rewards cannot
/// cover the ask in either dimension. No partial allocation is returned.
pub fn allocate_forward(
	calculated: CalculateTokens,
	total_ask: &NormalizedTotal,
	total_rewards: &NormalizedTotal,
) -> Result<ForwardAllocation, QuoteError> {
	if is_insufficient(total_ask, total_rewards) {
		return Err(QuoteError::InsufficientBalance {
			ask: total_ask.clone(),
			reward: total_rewards.clone(),
		});
	}

	let CalculateTokens {
		mut rewards,
		src_deficit_descending: mut deficits,
		..
	} = calculated;

	let ask = BigInt::from(total_ask.token.clone());
	let mut filled = BigInt::zero();
	let mut requested = RequestedRewards::default();

	sort_most_deficient_first(&mut deficits);

	// Pass 1: replenish tokens below target
	for deficit in deficits.iter_mut() {
		if filled >= ask {
			break;
		}
		if !deficit.delta.balance.is_negative() {
			continue;
		}
		let Some(reward) = find_reward(&mut rewards, deficit.delta.address) else {
			continue;
		};

		let shortfall = math::abs(&deficit.delta.balance);
		let left = &ask - &filled;
		let amount = math::min(&math::min(&shortfall, &reward.balance), &left);
		take(deficit, reward, amount, &mut filled, &mut requested)?;
	}

	sort_most_deficient_first(&mut deficits);

	// Pass 2: fill the remainder from the neediest tokens
	for deficit in deficits.iter_mut() {
		if filled >= ask {
			break;
		}
		let Some(reward) = find_reward(&mut rewards, deficit.delta.address) else {
			continue;
		};

		let left = &ask - &filled;
		let amount = math::min(&left, &reward.balance);
		take(deficit, reward, amount, &mut filled, &mut requested)?;
	}

	if filled < ask {
		return Err(QuoteError::InsufficientBalance {
			ask: total_ask.clone(),
			reward: NormalizedTotal::new(non_negative(&filled), total_rewards.native.clone()),
		});
	}

	let reward_native =
		biguint_to_u256(&total_ask.native).ok_or(QuoteError::AmountOutOfRange(Address::ZERO))?;

	Ok(ForwardAllocation {
		reward_tokens: requested.into_tokens(),
		reward_native,
	})
}

/// Most deficient (most negative delta) first. Stable, so equal deltas keep
/// the snapshot order.
fn sort_most_deficient_first(deficits: &mut [DeficitDescending]) {
	deficits.sort_by(|a, b| math::compare(&a.delta.balance, &b.delta.balance));
}

fn find_reward(rewards: &mut [NormalizedToken], address: Address) -> Option<&mut NormalizedToken> {
	rewards.iter_mut().find(|reward| reward.address == address)
}

/// Moves `amount` from `reward` into the request, closing the deficit by the
/// same amount. Non-positive amounts are ignored.
///
/// The on-chain amount is rounded up to a whole unit of the reward token, and
/// the rounded amount is what gets charged, capped at what the reward offers.
fn take(
	deficit: &mut DeficitDescending,
	reward: &mut NormalizedToken,
	amount: BigInt,
	filled: &mut BigInt,
	requested: &mut RequestedRewards,
) -> Result<(), QuoteError> {
	if !amount.is_positive() {
		return Ok(());
	}

	let meta = reward.meta();
	let mut onchain = deconvert_normalize_ceil(&amount, meta).balance;
	let mut charged = convert_normalize(&onchain, meta).balance;
	if charged > reward.balance {
		onchain = deconvert_normalize(&reward.balance, meta).balance;
		charged = convert_normalize(&onchain, meta).balance;
	}
	if !charged.is_positive() {
		return Ok(());
	}

	deficit.delta.balance += &charged;
	reward.balance -= &charged;
	*filled += &charged;

	let onchain = bigint_to_u256(&onchain).ok_or(QuoteError::AmountOutOfRange(reward.address))?;

	debug!(
		token = %reward.address,
		normalized = %charged,
		amount = %onchain,
		delta = %deficit.delta.balance,
		"Allocated reward"
	);

	requested.add(reward.address, onchain)
}

/// Requested amounts keyed by token, in first-allocation order.
#[derive(Debug, Default)]
struct RequestedRewards(Vec<TokenAmount>);

impl RequestedRewards {
	fn add(&mut self, token: Address, amount: U256) -> Result<(), QuoteError> {
		match self.0.iter_mut().find(|entry| entry.token == token) {
			Some(entry) => {
				entry.amount = entry
					.amount
					.checked_add(amount)
					.ok_or(QuoteError::AmountOutOfRange(token))?;
			},
			None => self.0.push(TokenAmount::new(token, amount)),
		}
		Ok(())
	}

	fn into_tokens(self) -> Vec<TokenAmount> {
		self.0
	}
}
