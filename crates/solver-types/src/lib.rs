//! Shared types for the intent quote engine.
//!
//! This crate defines the data model exchanged between the fee service, the
//! quote engine and the service binary: intents and their route/reward halves,
//! normalized token amounts, balance snapshots, configuration shapes and the
//! quote records produced for a request.

pub mod balance;
pub mod configs;
pub mod erc20;
pub mod execution;
pub mod intent;
pub mod normalized;
pub mod quote;
pub mod serde_helpers;

pub use balance::*;
pub use configs::*;
pub use execution::*;
pub use intent::*;
pub use normalized::*;
pub use quote::*;
