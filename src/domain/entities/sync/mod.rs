pub mod cache_snapshot;
pub mod connectivity;
pub mod mutation;
pub mod queued_request;

pub use cache_snapshot::{CacheSnapshot, CachedQueryEntry};
pub use connectivity::ConnectivityState;
pub use mutation::{MutationOutcome, RequestDescriptor};
pub use queued_request::{QueuedRequest, QueuedRequestDraft};
