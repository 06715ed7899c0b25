pub mod client;
pub mod codec;
pub mod request;
pub mod response;

pub use client::GrpcSuite;
pub use codec::RawCodec;
pub use request::GrpcRequest;
pub use response::GrpcExchange;
pub use tonic::Code;
