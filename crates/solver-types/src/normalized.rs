//! Normalized token amounts.
//!
//! Tokens on different chains use different decimal precisions. Before any
//! sum or comparison, amounts are rescaled to `BASE_DECIMALS` so that one unit
//! means the same thing across every token the solver handles. Native value is
//! tracked separately and never merged with the token dimension.

use alloy_primitives::{Address, U256};
use num_bigint::{BigInt, BigUint, Sign};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::serde_helpers::{bigint_serde, biguint_serde, u256_serde};

/// Working precision of every normalized token amount.
pub const BASE_DECIMALS: u8 = 6;

/// Decimal precision of a normalized value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decimals {
	/// The token's on-chain precision.
	pub original: u8,
	/// The precision `balance` is currently expressed in.
	pub current: u8,
}

/// Identity of a token used when converting amounts in and out of the
/// normalized domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenMeta {
	pub chain_id: u64,
	pub address: Address,
	pub decimals: u8,
}

/// A token amount rescaled to the working precision.
///
/// `balance` is only ever negative inside a deficit entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedToken {
	#[serde(with = "bigint_serde")]
	pub balance: BigInt,
	pub chain_id: u64,
	pub address: Address,
	pub decimals: Decimals,
}

impl NormalizedToken {
	/// Token metadata at the on-chain precision.
	pub fn meta(&self) -> TokenMeta {
		TokenMeta {
			chain_id: self.chain_id,
			address: self.address,
			decimals: self.decimals.original,
		}
	}
}

/// A destination call with its token amount normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedCall {
	#[serde(flatten)]
	pub token: NormalizedToken,
	/// Receiver of the transferred tokens or native value.
	pub recipient: Address,
	/// Native value attached to the call, in wei.
	#[serde(with = "u256_serde")]
	pub native: U256,
}

/// Dual-asset aggregate: a normalized token amount and a native amount.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedTotal {
	#[serde(with = "biguint_serde")]
	pub token: BigUint,
	#[serde(with = "biguint_serde")]
	pub native: BigUint,
}

impl NormalizedTotal {
	pub fn new(token: BigUint, native: BigUint) -> Self {
		Self { token, native }
	}

	pub fn zero() -> Self {
		Self::default()
	}
}

impl fmt::Display for NormalizedTotal {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "token: {}, native: {}", self.token, self.native)
	}
}

/// Converts an on-chain `U256` into an unsigned big integer.
pub fn u256_to_biguint(value: U256) -> BigUint {
	BigUint::from_bytes_be(&value.to_be_bytes::<32>())
}

/// Converts an on-chain `U256` into a signed big integer.
pub fn u256_to_bigint(value: U256) -> BigInt {
	BigInt::from_biguint(Sign::Plus, u256_to_biguint(value))
}

/// Converts an unsigned big integer back into a `U256`, if it fits.
pub fn biguint_to_u256(value: &BigUint) -> Option<U256> {
	U256::try_from_be_slice(&value.to_bytes_be())
}

/// Converts a non-negative big integer back into a `U256`, if it fits.
pub fn bigint_to_u256(value: &BigInt) -> Option<U256> {
	value.to_biguint().as_ref().and_then(biguint_to_u256)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_u256_bigint_conversions() {
		let value = U256::from(10).pow(U256::from(30)) + U256::from(7);
		let big = u256_to_bigint(value);
		assert_eq!(big.to_string(), "1000000000000000000000000000007");
		assert_eq!(bigint_to_u256(&big), Some(value));
		assert_eq!(bigint_to_u256(&BigInt::from(-1)), None);
		assert_eq!(biguint_to_u256(&u256_to_biguint(U256::MAX)), Some(U256::MAX));

		let too_big = u256_to_biguint(U256::MAX) + 1u32;
		assert_eq!(biguint_to_u256(&too_big), None);
	}

	#[test]
	fn test_total_display() {
		let total = NormalizedTotal::new(BigUint::from(1_500_000u64), BigUint::from(3u8));
		assert_eq!(total.to_string(), "token: 1500000, native: 3");
		assert_eq!(NormalizedTotal::zero(), NormalizedTotal::default());
	}

	#[test]
	fn test_normalized_call_serializes_flat() {
		let call = NormalizedCall {
			token: NormalizedToken {
				balance: BigInt::from(-5),
				chain_id: 10,
				address: Address::ZERO,
				decimals: Decimals {
					original: 18,
					current: BASE_DECIMALS,
				},
			},
			recipient: Address::ZERO,
			native: U256::from(9),
		};
		let json = serde_json::to_value(&call).unwrap();
		assert_eq!(json["balance"], "-5");
		assert_eq!(json["chain_id"], 10);
		assert_eq!(json["native"], "9");
		assert_eq!(json["decimals"]["original"], 18);
	}
}
