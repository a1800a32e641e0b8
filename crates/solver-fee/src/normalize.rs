//! Normalization and comparison primitives.
//!
//! Every amount that takes part in a sum or comparison goes through
//! [`normalize_balance`] to the same target precision first. Scaling up is
//! exact; scaling down truncates toward zero.

use num_bigint::{BigInt, BigUint};
use num_traits::Signed;
use solver_types::{Decimals, NormalizedToken, NormalizedTotal, TokenMeta, BASE_DECIMALS};

use crate::math::pow10;

/// An integer amount tagged with its decimal precision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecimalBalance {
	pub balance: BigInt,
	pub decimal: u8,
}

impl DecimalBalance {
	pub fn new(balance: impl Into<BigInt>, decimal: u8) -> Self {
		Self {
			balance: balance.into(),
			decimal,
		}
	}
}

/// Rescales `value` to `target` decimals.
pub fn normalize_balance(value: DecimalBalance, target: u8) -> DecimalBalance {
	let balance = match value.decimal.cmp(&target) {
		std::cmp::Ordering::Equal => value.balance,
		std::cmp::Ordering::Less => value.balance * pow10(u32::from(target - value.decimal)),
		// BigInt division truncates toward zero
		std::cmp::Ordering::Greater => value.balance / pow10(u32::from(value.decimal - target)),
	};
	DecimalBalance {
		balance,
		decimal: target,
	}
}

/// Element-wise sum of two totals.
pub fn normalize_sum(a: &NormalizedTotal, b: &NormalizedTotal) -> NormalizedTotal {
	NormalizedTotal {
		token: &a.token + &b.token,
		native: &a.native + &b.native,
	}
}

/// True when `reward` fails to cover `ask` in either dimension.
pub fn is_insufficient(ask: &NormalizedTotal, reward: &NormalizedTotal) -> bool {
	reward.token < ask.token || reward.native < ask.native
}

/// True when `a` covers `b` in both dimensions.
pub fn is_greater_equal(a: &NormalizedTotal, b: &NormalizedTotal) -> bool {
	a.token >= b.token && a.native >= b.native
}

/// Human readable rendering of a total, for logs.
pub fn format_normalized_total(total: &NormalizedTotal) -> String {
	total.to_string()
}

/// Converts an on-chain amount of `token` into the normalized domain.
pub fn convert_normalize(value: &BigInt, token: TokenMeta) -> NormalizedToken {
	let normalized = normalize_balance(
		DecimalBalance {
			balance: value.clone(),
			decimal: token.decimals,
		},
		BASE_DECIMALS,
	);
	NormalizedToken {
		balance: normalized.balance,
		chain_id: token.chain_id,
		address: token.address,
		decimals: Decimals {
			original: token.decimals,
			current: BASE_DECIMALS,
		},
	}
}

/// Converts a normalized amount back to the on-chain precision of `token`.
pub fn deconvert_normalize(value: &BigInt, token: TokenMeta) -> NormalizedToken {
	let denormalized = normalize_balance(
		DecimalBalance {
			balance: value.clone(),
			decimal: BASE_DECIMALS,
		},
		token.decimals,
	);
	NormalizedToken {
		balance: denormalized.balance,
		chain_id: token.chain_id,
		address: token.address,
		decimals: Decimals {
			original: token.decimals,
			current: token.decimals,
		},
	}
}

/// Like [`deconvert_normalize`], but rounds up to the next whole on-chain
/// unit instead of truncating. Used where an amount must never come out
/// short, such as a requested reward.
pub fn deconvert_normalize_ceil(value: &BigInt, token: TokenMeta) -> NormalizedToken {
	let mut result = deconvert_normalize(value, token);
	if token.decimals < BASE_DECIMALS {
		let factor = pow10(u32::from(BASE_DECIMALS - token.decimals));
		if (value % &factor).is_positive() {
			result.balance += 1;
		}
	}
	result
}

/// Magnitude of a normalized balance, clamped at zero for negative input.
pub fn non_negative(value: &BigInt) -> BigUint {
	value.to_biguint().unwrap_or_default()
}
