use std::collections::{BTreeMap, HashMap};
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::body::Body;
use tonic::codegen::{BoxFuture, Service, http};
use tonic::server::{Grpc, NamedService, UnaryService};
use tonic::{Request, Response, Status};
use tonic_prost::ProstCodec;

/// testpb.TestService 的消息定义
pub mod pb {
    use std::collections::HashMap;

    #[derive(Clone, PartialEq, prost::Message)]
    pub struct GetUserRequest {
        #[prost(string, tag = "1")]
        pub id: String,
    }

    #[derive(Clone, PartialEq, prost::Message)]
    pub struct GetUserResponse {
        #[prost(string, tag = "1")]
        pub id: String,
        #[prost(string, tag = "2")]
        pub name: String,
        #[prost(string, tag = "3")]
        pub email: String,
    }

    #[derive(Clone, PartialEq, prost::Message)]
    pub struct CreateUserRequest {
        #[prost(string, tag = "1")]
        pub name: String,
        #[prost(string, tag = "2")]
        pub email: String,
    }

    #[derive(Clone, PartialEq, prost::Message)]
    pub struct CreateUserResponse {
        #[prost(string, tag = "1")]
        pub id: String,
        #[prost(string, tag = "2")]
        pub name: String,
        #[prost(string, tag = "3")]
        pub email: String,
    }

    #[derive(Clone, PartialEq, prost::Message)]
    pub struct EchoRequest {
        #[prost(string, tag = "1")]
        pub message: String,
    }

    #[derive(Clone, PartialEq, prost::Message)]
    pub struct EchoResponse {
        #[prost(string, tag = "1")]
        pub message: String,
        #[prost(map = "string, string", tag = "2")]
        pub metadata: HashMap<String, String>,
    }

    #[derive(Clone, PartialEq, prost::Message)]
    pub struct SlowRequest {
        #[prost(uint64, tag = "1")]
        pub delay_ms: u64,
    }
}

#[derive(Clone)]
pub struct TestService {
    users: Arc<Mutex<BTreeMap<String, pb::GetUserResponse>>>,
}

impl Default for TestService {
    fn default() -> Self {
        let mut users = BTreeMap::new();
        for (id, name, email) in [
            ("1", "Alice", "alice@example.com"),
            ("2", "Bob", "bob@example.com"),
        ] {
            users.insert(
                id.to_string(),
                pb::GetUserResponse {
                    id: id.to_string(),
                    name: name.to_string(),
                    email: email.to_string(),
                },
            );
        }
        Self {
            users: Arc::new(Mutex::new(users)),
        }
    }
}

impl TestService {
    fn get_user(&self, request: pb::GetUserRequest) -> Result<Response<pb::GetUserResponse>, Status> {
        if request.id.is_empty() {
            return Err(Status::invalid_argument("id is required"));
        }

        let users = self.users.lock().unwrap();
        users
            .get(&request.id)
            .cloned()
            .map(Response::new)
            .ok_or_else(|| Status::not_found(format!("user {} not found", request.id)))
    }

    fn create_user(
        &self,
        request: pb::CreateUserRequest,
    ) -> Result<Response<pb::CreateUserResponse>, Status> {
        if request.name.is_empty() {
            return Err(Status::invalid_argument("name is required"));
        }

        let mut users = self.users.lock().unwrap();
        let id = (users.len() + 1).to_string();
        users.insert(
            id.clone(),
            pb::GetUserResponse {
                id: id.clone(),
                name: request.name.clone(),
                email: request.email.clone(),
            },
        );

        Ok(Response::new(pb::CreateUserResponse {
            id,
            name: request.name,
            email: request.email,
        }))
    }
}

fn echo(request: Request<pb::EchoRequest>) -> Result<Response<pb::EchoResponse>, Status> {
    let metadata: HashMap<String, String> = request
        .metadata()
        .clone()
        .into_headers()
        .iter()
        .filter(|(name, _)| name.as_str().starts_with("x-") || name.as_str() == "authorization")
        .filter_map(|(name, value)| Some((name.to_string(), value.to_str().ok()?.to_string())))
        .collect();

    let mut response = Response::new(pb::EchoResponse {
        message: request.into_inner().message,
        metadata,
    });
    response
        .metadata_mut()
        .insert("x-echo-server", "testpb".parse().unwrap());
    Ok(response)
}

struct GetUser(TestService);

impl UnaryService<pb::GetUserRequest> for GetUser {
    type Response = pb::GetUserResponse;
    type Future = BoxFuture<Response<Self::Response>, Status>;

    fn call(&mut self, request: Request<pb::GetUserRequest>) -> Self::Future {
        let service = self.0.clone();
        Box::pin(async move { service.get_user(request.into_inner()) })
    }
}

struct CreateUser(TestService);

impl UnaryService<pb::CreateUserRequest> for CreateUser {
    type Response = pb::CreateUserResponse;
    type Future = BoxFuture<Response<Self::Response>, Status>;

    fn call(&mut self, request: Request<pb::CreateUserRequest>) -> Self::Future {
        let service = self.0.clone();
        Box::pin(async move { service.create_user(request.into_inner()) })
    }
}

struct Echo;

impl UnaryService<pb::EchoRequest> for Echo {
    type Response = pb::EchoResponse;
    type Future = BoxFuture<Response<Self::Response>, Status>;

    fn call(&mut self, request: Request<pb::EchoRequest>) -> Self::Future {
        Box::pin(async move { echo(request) })
    }
}

struct Slow;

impl UnaryService<pb::SlowRequest> for Slow {
    type Response = pb::EchoResponse;
    type Future = BoxFuture<Response<Self::Response>, Status>;

    fn call(&mut self, request: Request<pb::SlowRequest>) -> Self::Future {
        Box::pin(async move {
            let delay = Duration::from_millis(request.into_inner().delay_ms);
            tokio::time::sleep(delay).await;
            Ok(Response::new(pb::EchoResponse {
                message: "done".to_string(),
                metadata: HashMap::new(),
            }))
        })
    }
}

impl NamedService for TestService {
    const NAME: &'static str = "testpb.TestService";
}

impl Service<http::Request<Body>> for TestService {
    type Response = http::Response<Body>;
    type Error = Infallible;
    type Future = BoxFuture<Self::Response, Self::Error>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: http::Request<Body>) -> Self::Future {
        let service = self.clone();
        match req.uri().path() {
            "/testpb.TestService/GetUser" => Box::pin(async move {
                let mut grpc = Grpc::new(ProstCodec::default());
                Ok(grpc.unary(GetUser(service), req).await)
            }),
            "/testpb.TestService/CreateUser" => Box::pin(async move {
                let mut grpc = Grpc::new(ProstCodec::default());
                Ok(grpc.unary(CreateUser(service), req).await)
            }),
            "/testpb.TestService/Echo" => Box::pin(async move {
                let mut grpc = Grpc::new(ProstCodec::default());
                Ok(grpc.unary(Echo, req).await)
            }),
            "/testpb.TestService/Slow" => Box::pin(async move {
                let mut grpc = Grpc::new(ProstCodec::default());
                Ok(grpc.unary(Slow, req).await)
            }),
            _ => Box::pin(async move {
                let mut response = http::Response::new(Body::default());
                let headers = response.headers_mut();
                headers.insert(
                    Status::GRPC_STATUS,
                    (tonic::Code::Unimplemented as i32).into(),
                );
                headers.insert(
                    http::header::CONTENT_TYPE,
                    tonic::metadata::GRPC_CONTENT_TYPE,
                );
                Ok(response)
            }),
        }
    }
}

/// 在随机端口上启动测试服务，返回 `127.0.0.1:port`
pub async fn start_test_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        tonic::transport::Server::builder()
            .add_service(TestService::default())
            .serve_with_incoming(TcpListenerStream::new(listener))
            .await
            .unwrap();
    });

    addr.to_string()
}
