//! A thin re-export of `parking_lot::Mutex` under the name the rest of the
//! workspace expects (`util::sync::Mutex`), matching how synchronous,
//! non-`.await`-holding critical sections (e.g. a NACK generator's sliding
//! window) are guarded elsewhere in the ecosystem.

pub use parking_lot::{Mutex, MutexGuard};
