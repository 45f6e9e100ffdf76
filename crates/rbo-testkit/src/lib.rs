//! rbo-testkit
//!
//! In-memory [`rbo_returns::ReturnStore`] with fault injection, plus seed
//! fixtures. Scenario tests under `tests/` drive the engine end to end
//! without Postgres.

mod fixtures;
mod memory_store;

pub use fixtures::{pending_return, product, seed_basic, staff, BasicFixture};
pub use memory_store::{Faults, MemoryState, MemoryStore};
