pub mod client;
pub mod request;
pub mod response;
pub mod types;

// Re-export commonly used types for convenient access
pub use client::HttpSuite;
pub use request::HttpRequest;
pub use response::HttpExchange;
pub use types::{Method, Status};
