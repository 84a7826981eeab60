//! Test fixtures shared across the simulator's test modules.
