pub mod sync;

pub use sync::{HttpMethod, NetworkType, QueryKey, RequestId, RequestPayload, ResourcePath};
