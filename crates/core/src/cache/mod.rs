//! Priority-ordered working set of tickets.
//!
//! Entries are ordered by a single score (see [`score`]) so a technician
//! scan is an ascending range read.

mod memory;
mod redis;
mod score;
mod traits;

pub use self::redis::RedisPriorityCache;
pub use memory::InMemoryPriorityCache;
pub use score::{score, PRIORITY_STRIDE};
pub use traits::{CacheError, PriorityCache};
