/// 路径查找错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("Path {path:?} not found at {segment:?}")]
    NotFound { path: String, segment: String },

    #[error("Cannot navigate path {path:?}: unexpected {kind} at {segment:?}")]
    NotTraversable {
        path: String,
        segment: String,
        kind: &'static str,
    },
}

/// JSON 值的类型名，用于错误信息
pub fn kind_of(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
