pub mod error;
pub mod reachability;
pub mod rest_backend;
pub mod token_provider;

pub use error::TransportError;
pub use reachability::HttpReachabilityProbe;
pub use rest_backend::RestBackend;
pub use token_provider::SharedTokenProvider;
