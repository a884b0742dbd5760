//! VittaCash client library
//!
//! A two-tier response cache ([`cache::HybridCache`]) in front of the
//! VittaCash expense API ([`client::ExpenseApi`]).

pub mod cache;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;

pub use error::{Error, Result};
