pub mod cache_service;
pub mod connectivity_service;
pub mod mutation_service;
pub mod queue_service;
pub mod sync_events;

pub use cache_service::{CacheLookup, CacheSource, QueryCacheService};
pub use connectivity_service::ConnectivityService;
pub use mutation_service::MutationService;
pub use queue_service::{DrainReport, RequestQueueService};
pub use sync_events::SyncEvent;
