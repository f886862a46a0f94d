//! Courtline Testing Infrastructure
//!
//! Shared fixtures for engine tests: a scripted oracle, an event feed
//! builder, deterministic addresses, invariant checks over a store and
//! proptest strategies.
//!
//! ```toml
//! [dev-dependencies]
//! courtline-testkit = { workspace = true }
//! ```

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod feed;
pub mod fixtures;
pub mod invariants;
pub mod logging;
pub mod oracle;
pub mod strategies;

pub use feed::{meta_at, FeedBuilder, BLOCK_INTERVAL, GENESIS_TIME};
pub use fixtures::{arbitrable, creator, juror, STANDARD_TREE};
pub use invariants::{assert_consistent, violations};
pub use logging::init_test_tracing;
pub use oracle::ScriptedOracle;
pub use strategies::{arb_stake_op, arb_stake_ops, stake_feed, StakeOp};
