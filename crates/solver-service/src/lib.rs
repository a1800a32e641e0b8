//! Service entry points for the quote engine.
//!
//! - `api`: HTTP endpoints for forward and reverse quotes
//! - `service`: builds the quote service and its collaborators from config

pub mod api;
pub mod service;
