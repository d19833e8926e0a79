//! Frame synchronization.
//!
//! Finds where in the video a known run of velocity readings occurs, both
//! to locate liftoff and to regain lock after recognition has failed.

mod predicate;
mod search;

pub use predicate::{MatchPredicate, SequenceMatcher};
pub use search::{Lock, SyncConfig, SyncError, SyncSearch};
