//! Core type definitions for simulator primitives.
//!
//! This module provides the fundamental types used throughout the simulator:
//! - `Address`: fixed-size 20-byte account identifiers
//! - `Hash`: fixed-size 32-byte SHA3-256 hashes
//!
//! Both are `Copy` and sized for frequent passing in ordering and lookup paths.

pub mod address;
pub mod hash;
