//! # Atlas Provider Library
//!
//! Reconciles MongoDB Atlas alert configurations and search indexes with a
//! declarative attribute store: compound state ids, flatten/expand
//! projections between remote objects and declarative records, the remote
//! client, and the resource adapters tying them together.

pub mod adapters;
pub mod attributes;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod normalization;
pub mod state_id;
pub mod telemetry;

pub use error::{ProviderError, Result};
