//! The worker binary's composition root and queue-consumption loop, split
//! out of `main.rs` so it can be exercised from integration tests.

pub mod di;
pub mod worker;
