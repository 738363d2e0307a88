//! Domain logic for the shadow-token platform.
//!
//! Everything in this crate is pure: no database handles, no HTTP types,
//! no clocks other than timestamps passed in by callers. The token state
//! machine, risk rules, and geo math are all unit-testable here without
//! any infrastructure.

pub mod activity;
pub mod alert;
pub mod error;
pub mod fingerprint;
pub mod geo;
pub mod hashing;
pub mod identity;
pub mod region;
pub mod risk;
pub mod token;
pub mod types;
