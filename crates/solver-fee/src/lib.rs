//! Fee and normalization services for the quote engine.
//!
//! This crate turns an intent's heterogeneous token amounts into comparable
//! normalized totals, prices them with the configured fee policy and builds
//! the per-intent deficit snapshot the quote allocators consume.

mod error;

pub mod balance;
pub mod math;
pub mod normalize;
pub mod policy;
pub mod service;

pub use balance::{
	BalanceProvider, BalanceService, BalanceSnapshot, MemoryBalanceProvider, NativeBalanceEntry,
};
pub use error::FeeError;
pub use normalize::{
	convert_normalize, deconvert_normalize, deconvert_normalize_ceil, format_normalized_total,
	is_greater_equal, is_insufficient, normalize_balance, normalize_sum, DecimalBalance,
};
pub use policy::{FeePolicy, RouteTuple};
pub use service::FeeService;
