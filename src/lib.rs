//! Gas-price ordering race simulator.
//!
//! Provides an ERC20-style token ledger, a priority mempool, and a block miner
//! for reproducing transaction-ordering races deterministically in one process.

pub mod core;
pub mod ledger;
pub mod node;
pub mod types;
pub mod utils;
