//! Integer helpers over arbitrary-precision signed values.

use num_bigint::BigInt;
use num_traits::Signed;
use std::cmp::Ordering;

pub fn min(a: &BigInt, b: &BigInt) -> BigInt {
	if a <= b {
		a.clone()
	} else {
		b.clone()
	}
}

pub fn max(a: &BigInt, b: &BigInt) -> BigInt {
	if a >= b {
		a.clone()
	} else {
		b.clone()
	}
}

pub fn abs(a: &BigInt) -> BigInt {
	a.abs()
}

/// Three-way comparison, usable directly as a sort key.
pub fn compare(a: &BigInt, b: &BigInt) -> Ordering {
	a.cmp(b)
}

/// `10^exp` as a big integer.
pub fn pow10(exp: u32) -> BigInt {
	num_traits::pow(BigInt::from(10u8), exp as usize)
}
