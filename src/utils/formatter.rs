use std::fmt::Display;

use anyhow::Result;
use serde_json::Value;

/// 诊断输出中 body 的最大字节数
pub const MAX_BODY_LEN: usize = 1024;

/// 失败时的诊断报告
///
/// 只在断言失败时生成，内容只给人看，不做机器解析。
#[derive(Debug, Clone)]
pub struct Report {
    lines: Vec<String>,
}

impl Report {
    pub fn new(protocol: &str) -> Self {
        Self {
            lines: vec![format!("=== {} Request Failed ===", protocol)],
        }
    }

    pub fn line(mut self, text: impl Into<String>) -> Self {
        self.lines.push(text.into());
        self
    }

    /// 对齐的 "Label:   value" 行
    pub fn field(mut self, label: &str, value: impl Display) -> Self {
        self.lines.push(label_line(label, value));
        self
    }

    pub fn blank(mut self) -> Self {
        self.lines.push(String::new());
        self
    }

    /// Header 列表，为空时省略整个段落
    pub fn headers<K, V, I>(mut self, title: &str, headers: I) -> Self
    where
        K: Display,
        V: Display,
        I: IntoIterator<Item = (K, V)>,
    {
        let entries: Vec<String> = headers
            .into_iter()
            .map(|(key, value)| format!("  {}: {}", key, value))
            .collect();

        if !entries.is_empty() {
            self.lines.push(format!("{}:", title));
            self.lines.extend(entries);
        }
        self
    }

    /// Body 内容，超过 [`MAX_BODY_LEN`] 时截断
    pub fn body(mut self, title: &str, body: &[u8]) -> Self {
        if body.is_empty() {
            return self;
        }

        let text = String::from_utf8_lossy(body);
        self.lines.push(format!("{}:", title));
        for line in truncate(&text, MAX_BODY_LEN).lines() {
            self.lines.push(format!("  {}", line));
        }
        self
    }

    /// 追加断言名称和 Expected / Actual，生成最终文本
    pub fn mismatch(self, assertion: &str, expected: impl Display, actual: impl Display) -> String {
        let mut report = self
            .blank()
            .line(format!("{}:", assertion))
            .field("Expected", expected)
            .field("Actual", actual);
        report.lines.insert(0, String::new());
        report.lines.push(String::new());
        report.lines.join("\n")
    }
}

fn label_line(label: &str, value: impl Display) -> String {
    format!("{:<9} {}", format!("{}:", label), value)
}

/// 按字节截断并附加标记，保证落在字符边界上
pub fn truncate(text: &str, max_len: usize) -> String {
    if text.len() <= max_len {
        return text.to_string();
    }

    let mut end = max_len;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated, {} bytes total)", &text[..end], text.len())
}

/// 单行截断，用于 query 文本这类摘要字段
pub fn shorten(text: &str, max_len: usize) -> String {
    if text.len() <= max_len {
        return text.to_string();
    }

    let mut end = max_len;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

pub fn pretty_json(value: &Value) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}

/// 格式化失败时退回紧凑输出
pub fn display_json(value: &Value) -> String {
    pretty_json(value).unwrap_or_else(|_| value.to_string())
}
