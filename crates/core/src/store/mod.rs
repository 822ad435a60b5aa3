pub mod traits;

// Store implementations
pub mod http;
pub mod local;
pub mod marker;
pub mod timeout;
