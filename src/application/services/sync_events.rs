use serde::{Deserialize, Serialize};

/// Events broadcast by the request queue. The cache layer subscribes to
/// these instead of being called directly, keeping the two services free of
/// a mutual import.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SyncEvent {
    /// One drain pass finished, whatever its outcome.
    DrainPassCompleted {
        replayed: u32,
        failed: u32,
        remaining: u32,
    },
    /// The queue fully emptied: cached server state is now behind the
    /// backend and should be refetched.
    QueueDrained { replayed: u32 },
}
