//! Shared utilities.

pub mod test_utils;
