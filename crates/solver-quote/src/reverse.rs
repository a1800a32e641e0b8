//! Reverse allocation: which destination transfers the reward can fund.
//!
//! Here the reward is fixed and the solver pays out on the destination chain.
//! After the fee is taken, the remainder funds the requested destination
//! transfers, tokens the solver holds most surplus of first. Running out of
//! reward before every transfer is funded is a valid outcome.

use alloy_primitives::{Address, U256};
use num_bigint::BigInt;
use num_traits::Signed;
use solver_fee::math;
use solver_fee::{deconvert_normalize, is_insufficient};
use solver_types::erc20::encode_transfer;
use solver_types::{
	bigint_to_u256, biguint_to_u256, CalculateTokens, Call, NormalizedTotal, TokenAmount,
};
use tracing::debug;

use crate::QuoteError;

/// Destination side of a reverse quote.
#[derive(Debug, Clone, PartialEq)]
pub struct ReverseAllocation {
	pub route_tokens: Vec<TokenAmount>,
	pub route_calls: Vec<Call>,
	/// Native reward left after the native fee
	pub reward_native: U256,
}

/// Spends `total_rewards - fee` on the destination transfers of `calculated`.
pub fn allocate_reverse(
	calculated: CalculateTokens,
	fee: &NormalizedTotal,
	total_rewards: &NormalizedTotal,
) -> Result<ReverseAllocation, QuoteError> {
	if is_insufficient(fee, total_rewards) {
		return Err(QuoteError::InsufficientBalance {
			ask: fee.clone(),
			reward: total_rewards.clone(),
		});
	}

	let CalculateTokens {
		tokens,
		calls,
		dest_deficit_descending: mut deficits,
		..
	} = calculated;

	let mut remaining = BigInt::from(total_rewards.token.clone()) - BigInt::from(fee.token.clone());
	let mut route_tokens = Vec::new();
	let mut route_calls = Vec::new();

	// Largest surplus first
	deficits.sort_by(|a, b| math::compare(&b.delta.balance, &a.delta.balance));

	for deficit in &deficits {
		if !remaining.is_positive() {
			break;
		}

		let address = deficit.delta.address;
		let token = tokens.iter().find(|token| token.address == address);
		let call = calls.iter().find(|call| call.token.address == address);
		let (Some(token), Some(call)) = (token, call) else {
			continue;
		};

		let amount = math::min(&call.token.balance, &remaining);
		if !amount.is_positive() {
			continue;
		}

		let onchain = deconvert_normalize(&amount, call.token.meta()).balance;
		let onchain = bigint_to_u256(&onchain).ok_or(QuoteError::AmountOutOfRange(address))?;

		debug!(
			token = %address,
			recipient = %call.recipient,
			normalized = %amount,
			amount = %onchain,
			delta = %deficit.delta.balance,
			"Funded destination transfer"
		);

		route_tokens.push(TokenAmount::new(token.address, onchain));
		route_calls.push(Call {
			target: call.token.address,
			data: encode_transfer(call.recipient, onchain),
			value: onchain,
		});
		remaining -= amount;
	}

	let native = &total_rewards.native - &fee.native;
	let reward_native =
		biguint_to_u256(&native).ok_or(QuoteError::AmountOutOfRange(Address::ZERO))?;

	Ok(ReverseAllocation {
		route_tokens,
		route_calls,
		reward_native,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::fixtures::{addr, call, deficit, normalized, snapshot, total};
	use solver_types::erc20::decode_transfer;

	fn route_amounts(allocation: &ReverseAllocation) -> Vec<(Address, u64)> {
		allocation
			.route_tokens
			.iter()
			.map(|t| (t.token, t.amount.to::<u64>()))
			.collect()
	}

	#[test]
	fn test_surplus_token_is_funded_first() {
		let (x, y, recipient) = (addr(0x0a), addr(0x0b), addr(0xbb));
		let mut calculated = snapshot();
		calculated.tokens = vec![normalized(x, 300, 6), normalized(y, 900, 6)];
		calculated.calls = vec![call(x, recipient, 300), call(y, recipient, 900)];
		calculated.dest_deficit_descending = vec![deficit(x, 10), deficit(y, 80)];

		let allocation = allocate_reverse(calculated, &total(100, 0), &total(1000, 0)).unwrap();

		assert_eq!(route_amounts(&allocation), vec![(y, 900)]);
		assert_eq!(allocation.route_calls.len(), 1);
	}

	#[test]
	fn test_partial_funding_consumes_remainder() {
		let (x, y, recipient) = (addr(0x0a), addr(0x0b), addr(0xbb));
		let mut calculated = snapshot();
		calculated.tokens = vec![normalized(x, 300, 6), normalized(y, 700, 6)];
		calculated.calls = vec![call(x, recipient, 300), call(y, recipient, 700)];
		calculated.dest_deficit_descending = vec![deficit(x, 10), deficit(y, 80)];

		let allocation = allocate_reverse(calculated, &total(100, 0), &total(1000, 0)).unwrap();

		let funded = route_amounts(&allocation);
		assert_eq!(funded, vec![(y, 700), (x, 200)]);
		let sum: u64 = funded.iter().map(|(_, amount)| amount).sum();
		assert_eq!(sum + 100, 1000);
	}

	#[test]
	fn test_full_coverage_leaves_reward_unspent() {
		let (x, recipient) = (addr(0x0a), addr(0xbb));
		let mut calculated = snapshot();
		calculated.tokens = vec![normalized(x, 400, 6)];
		calculated.calls = vec![call(x, recipient, 400)];
		calculated.dest_deficit_descending = vec![deficit(x, -10)];

		let allocation = allocate_reverse(calculated, &total(100, 0), &total(1000, 0)).unwrap();
		assert_eq!(route_amounts(&allocation), vec![(x, 400)]);
	}

	#[test]
	fn test_transfer_call_is_built_for_recipient() {
		let (x, recipient) = (addr(0x0a), addr(0xbb));
		let mut calculated = snapshot();
		calculated.tokens = vec![normalized(x, 300, 6)];
		calculated.calls = vec![call(x, recipient, 300)];
		calculated.dest_deficit_descending = vec![deficit(x, 0)];

		let allocation = allocate_reverse(calculated, &total(10, 5), &total(1000, 25)).unwrap();

		let built = &allocation.route_calls[0];
		assert_eq!(built.target, x);
		assert_eq!(built.value, U256::from(300));
		let transfer = decode_transfer(&built.data).unwrap();
		assert_eq!(transfer.recipient, recipient);
		assert_eq!(transfer.amount, U256::from(300));
		assert_eq!(allocation.reward_native, U256::from(20));
	}

	#[test]
	fn test_tokens_without_deficit_entry_are_skipped() {
		let (x, y, recipient) = (addr(0x0a), addr(0x0b), addr(0xbb));
		let mut calculated = snapshot();
		calculated.tokens = vec![normalized(x, 300, 6), normalized(y, 300, 6)];
		calculated.calls = vec![call(x, recipient, 300), call(y, recipient, 300)];
		calculated.dest_deficit_descending = vec![deficit(y, 5)];

		let allocation = allocate_reverse(calculated, &total(0, 0), &total(1000, 0)).unwrap();
		assert_eq!(route_amounts(&allocation), vec![(y, 300)]);
	}

	#[test]
	fn test_fee_above_reward_is_insufficient() {
		let mut calculated = snapshot();
		calculated.dest_deficit_descending = vec![deficit(addr(0x0a), 0)];

		let err = allocate_reverse(calculated.clone(), &total(101, 0), &total(100, 0)).unwrap_err();
		assert!(matches!(err, QuoteError::InsufficientBalance { .. }));

		let err = allocate_reverse(calculated, &total(0, 2), &total(100, 1)).unwrap_err();
		assert!(matches!(err, QuoteError::InsufficientBalance { .. }));
	}
}
