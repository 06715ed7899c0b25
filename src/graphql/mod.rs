pub mod client;
pub mod request;
pub mod response;
pub mod types;

pub use client::GraphQLSuite;
pub use request::GraphQLRequest;
pub use response::GraphQLExchange;
pub use types::{GraphQLError, GraphQLResponse, Location};
