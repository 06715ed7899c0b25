use serde::Serialize;
use serde_json::Value;

use crate::Result;

/// 请求体或期望值
///
/// `Raw` 原样发送（或在比较前先按 JSON 解码），`Json` 在发送时序列化。
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Raw(String),
    Json(Value),
}

impl Payload {
    /// 将任意可序列化的值转换为结构化 payload
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(Payload::Json(serde_json::to_value(value)?))
    }

    /// 线上格式的字节
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        match self {
            Payload::Raw(text) => Ok(text.as_bytes().to_vec()),
            Payload::Json(value) => Ok(serde_json::to_vec(value)?),
        }
    }

    /// 解码为 JSON 树，字符串会经过一次解析
    pub fn decode(&self) -> Result<Value> {
        match self {
            Payload::Raw(text) => Ok(serde_json::from_str(text)?),
            Payload::Json(value) => Ok(value.clone()),
        }
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Raw(text.to_string())
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Raw(text)
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Json(value)
    }
}

impl From<&Value> for Payload {
    fn from(value: &Value) -> Self {
        Payload::Json(value.clone())
    }
}
