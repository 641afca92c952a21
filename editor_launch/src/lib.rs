//! Shard Launch - Single-instance coordination.
//!
//! The first Shard process to start becomes the primary and owns every
//! editor window. Later launches append their file requests to a queue
//! file that the primary polls, then exit without opening a window.

pub mod coordinator;
pub mod error;
pub mod marker;
pub mod queue;

pub use coordinator::{
    InstanceHost, LaunchConfig, LaunchCoordinator, LaunchRole, PollOutcome, RunOutcome,
};
pub use error::LaunchError;
pub use marker::RunningMarker;
pub use queue::{QueueEntry, QueueFile};
