pub mod sync;

pub use sync::{
    CacheSnapshot, CachedQueryEntry, ConnectivityState, MutationOutcome, QueuedRequest,
    QueuedRequestDraft, RequestDescriptor,
};
