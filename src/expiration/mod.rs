//! TTL bookkeeping for short codes
//!
//! The index records when each expiring mapping dies; the sweeper walks it
//! on a timer so mappings nobody resolves again still get reclaimed.

pub mod index;
pub mod sweeper;

pub use index::ExpirationIndex;
pub use sweeper::{spawn_sweeper, sweep_all, Sweep, SweeperHandle};
