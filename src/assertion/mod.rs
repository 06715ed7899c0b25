/// 断言模块 - 三种协议共用的比较与失败处理
mod evaluator;
mod extractor;
mod json;
mod types;

pub use evaluator::{Exchange, decode_expected, ensure_eq, ensure_json};
pub use extractor::lookup_path;
pub use json::json_eq;
pub use types::{PathError, kind_of};
