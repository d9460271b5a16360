//! Offline-capable fetch cache
//!
//! Every outbound request goes through the `CacheRouter`, which decides per
//! request class whether to answer from the network, the cache, or both.
//! Cached responses live in named generations on disk; bumping the
//! generation name forces a clean rebuild.
//!
//! # Request Classes
//!
//! | Class | Policy | Populates cache |
//! |-------|--------|-----------------|
//! | Remote data | network only | never |
//! | Pinned asset | cache first | on miss |
//! | Network first | network, cache when offline | on 2xx |
//! | Fallback | cache first | never |
//!
//! # Generation States
//!
//! | State | Description |
//! |-------|-------------|
//! | Building | Install in progress or crashed, rebuilt on next start |
//! | Complete | Fully precached, reused across runs |

pub mod policy;
pub mod router;
pub mod storage;

pub use policy::{RequestClass, RouteTable};
pub use router::{CacheRouter, Lifecycle, RouterSettings};
pub use storage::{cache_key, CacheStorage, GenerationInfo, GenerationState};
