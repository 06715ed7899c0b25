use serde_json::Value;

use crate::assertion::types::{PathError, kind_of};

/// 按点号分隔的路径在 JSON 树中查找值
///
/// 对象按 key 查找，数组接受数字下标；中间节点缺失或不可遍历时立即返回错误，
/// 不会返回空值。
pub fn lookup_path<'a>(root: &'a Value, path: &str) -> Result<&'a Value, PathError> {
    let not_found = |segment: &str| PathError::NotFound {
        path: path.to_string(),
        segment: segment.to_string(),
    };

    let mut current = root;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment).ok_or_else(|| not_found(segment))?,
            Value::Array(items) => segment
                .parse::<usize>()
                .ok()
                .and_then(|index| items.get(index))
                .ok_or_else(|| not_found(segment))?,
            other => {
                return Err(PathError::NotTraversable {
                    path: path.to_string(),
                    segment: segment.to_string(),
                    kind: kind_of(other),
                });
            }
        };
    }

    Ok(current)
}
