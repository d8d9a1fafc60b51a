//! Filesystem operations: the Lock Guard and the terminal State Mover.

mod lock;
mod mover;

pub use lock::{
    LOCK_ATTEMPTS, LOCK_RETRY_DELAY, LockPolicy, Probe, acquire_then_release, probe, try_lock_once,
};
pub use mover::{Terminal, relocate, unique_destination};
