//! Core chain data structures and block production.
//!
//! This module contains the moving parts of the simulator:
//! - `Transaction`: immutable ledger call with priority metadata
//! - `Receipt`: a mined transaction paired with its outcome
//! - `Block`: immutable container of receipts with cryptographic linking
//! - `Chain`: deterministic ordering, sequential application, and history

pub mod block;
pub mod chain;
pub mod receipt;
pub mod transaction;
