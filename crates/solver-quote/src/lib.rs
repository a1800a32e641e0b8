//! Quote generation for cross-chain intents.
//!
//! The [`QuoteService`] drives a quote request end to end: it stores the
//! intent, validates it, builds the normalized snapshot through the fee
//! service and hands that snapshot to one of two pure allocators.
//!
//! - [`forward::allocate_forward`] decides which reward tokens the solver
//!   asks for, preferring tokens it is short on.
//! - [`reverse::allocate_reverse`] decides which destination transfers the
//!   offered reward can fund, preferring tokens the solver holds in surplus.
//!
//! Allocators never touch the network or storage. They take the snapshot by
//! value and return either a complete allocation or an error.

pub mod analytics;
pub mod assembly;
pub mod errors;
pub mod forward;
pub mod fulfillment;
pub mod repository;
pub mod reverse;
pub mod service;
pub mod validation;

pub use analytics::{AnalyticsSink, QuoteEvent, TracingAnalytics};
pub use errors::QuoteError;
pub use forward::{allocate_forward, ForwardAllocation};
pub use fulfillment::FulfillmentEstimateService;
pub use repository::QuoteRepository;
pub use reverse::{allocate_reverse, ReverseAllocation};
pub use service::{QuoteOutcome, QuoteService};
pub use validation::{TxValidation, ValidationChecks, ValidationService};
