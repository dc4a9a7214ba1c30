//! Collaborator contracts for market data and account balances.

pub mod provider;

pub use provider::{AccountSource, DataError, MarketData};
