//! Content-addressed stylesheet cache
//!
//! Builds are cached on disk keyed by a digest of the resolved
//! `org/repo/sha`. A commit never changes, so an entry is valid forever
//! once its artifact exists.
//!
//! # Coordination Model
//!
//! - The entry directory is the lock: creating it claims the build
//! - No in-memory lock is shared, so several server processes may use
//!   the same root
//! - A failed build removes its entry and the next request retries
//! - A ready entry is retired (rebuild, clear) only after its builder has
//!   settled, under a per-key `<key>.retire` lock directory
//!
//! # Cache States
//!
//! | State | On disk | Description |
//! |-------|---------|-------------|
//! | Unclaimed | nothing | No entry, next request builds |
//! | Building | directory, no `build.css` | Claimed, others poll |
//! | Ready | `build.css` present | Served as-is |
//! | Settled | `build.css`, no `.building` | Ready and safe to retire |

pub mod coordinator;
pub mod key;
pub mod store;

pub use coordinator::{BuildCoordinator, PollPolicy};
pub use key::CacheKey;
pub use store::{
    format_bytes, CacheEntry, CacheState, CacheStore, ClaimOutcome, ComponentDescriptor,
    EntryInfo,
};
