pub mod http_method;
pub mod network_type;
pub mod query_key;
pub mod request_id;
pub mod request_payload;
pub mod resource_path;

pub use http_method::HttpMethod;
pub use network_type::NetworkType;
pub use query_key::QueryKey;
pub use request_id::RequestId;
pub use request_payload::RequestPayload;
pub use resource_path::ResourcePath;
