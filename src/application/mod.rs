//! Application layer containing the settlement orchestration.
//!
//! `SettlementEngine` is the only writer of escrow status, sale credits and
//! the order's escrow mirror. Each call runs one optimistic transaction:
//! read versioned snapshots, validate, submit a single guarded commit.

pub mod engine;
