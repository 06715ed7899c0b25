use std::time::Duration;

use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

fn user(id: &str) -> Option<Value> {
    match id {
        "1" => Some(json!({"id": "1", "name": "Alice", "email": "alice@example.com"})),
        "2" => Some(json!({"id": "2", "name": "Bob", "email": "bob@example.com"})),
        _ => None,
    }
}

/// 按 query 文本分派的简易 GraphQL 服务
pub struct GraphQLResponder;

impl Respond for GraphQLResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let envelope: Value = match serde_json::from_slice(&request.body) {
            Ok(envelope) => envelope,
            Err(_) => {
                return ResponseTemplate::new(400)
                    .set_body_json(json!({"errors": [{"message": "invalid request body"}]}));
            }
        };
        let query = envelope["query"].as_str().unwrap_or_default();
        let variables = &envelope["variables"];

        let body = if query.contains("echo") {
            let authorization = request
                .headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            json!({"data": {"echo": {
                "message": variables["message"],
                "authorization": authorization,
            }}})
        } else if query.contains("createUser") {
            let input = &variables["input"];
            json!({"data": {"createUser": {
                "id": "3",
                "name": input["name"],
                "email": input["email"],
            }}})
        } else if query.contains("user(") {
            let id = variables["id"].as_str().unwrap_or_default();
            match user(id) {
                Some(user) => json!({"data": {"user": user}}),
                None => json!({
                    "data": {"user": null},
                    "errors": [{
                        "message": "user not found",
                        "locations": [{"line": 1, "column": 19}],
                        "path": ["user"]
                    }]
                }),
            }
        } else if query.contains("users") {
            json!({"data": {"users": [user("1"), user("2")]}})
        } else if query.contains("error") {
            json!({
                "data": null,
                "errors": [
                    {"message": "Something went wrong"},
                    {"message": "Another error", "extensions": {"code": "INTERNAL"}}
                ]
            })
        } else {
            json!({"errors": [{"message": "unknown query"}]})
        };

        ResponseTemplate::new(200).set_body_json(body)
    }
}

/// `/graphql` 正常服务，`/broken` 返回非 GraphQL 响应，`/slow` 延迟 500ms
pub async fn start_graphql_server() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(GraphQLResponder)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/slow"))
        .respond_with(DelayedResponder(GraphQLResponder))
        .mount(&server)
        .await;

    server
}

pub struct DelayedResponder(GraphQLResponder);

impl Respond for DelayedResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        self.0
            .respond(request)
            .set_delay(Duration::from_millis(500))
    }
}
