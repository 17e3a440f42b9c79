//! 结构化数据渲染
//!
//! 把任意 JSON 值递归渲染成带类型样式标签的 HTML 片段：
//! 对象/数组逐项缩进（每层两个空格），字符串叶子先转义再加引号，
//! 数字、布尔和 null 各自带样式类。

use super::escape::escape_html;
use serde_json::Value;
use std::fmt::Write;

pub const CLASS_KEY: &str = "json-key";
pub const CLASS_STRING: &str = "json-string";
pub const CLASS_NUMBER: &str = "json-number";
pub const CLASS_BOOLEAN: &str = "json-boolean";
pub const CLASS_NULL: &str = "json-null";

/// 与渲染结果配套的样式表
pub const STYLESHEET: &str = ".json-key { color: #0066cc; font-weight: bold; }
.json-string { color: #008000; }
.json-number { color: #ff0000; }
.json-boolean { color: #aa00aa; }
.json-null { color: #888888; }
.json-view { font-family: monospace; white-space: pre; }";

const INDENT_UNIT: &str = "  ";
const LINE_BREAK: &str = "<br>";

/// 渲染一个 JSON 值
///
/// `depth` 是当前嵌套深度，决定闭合括号前的缩进。顶层调用传 0。
pub fn render(value: &Value, depth: usize) -> String {
    let mut out = String::new();
    write_value(&mut out, value, depth);
    out
}

/// 渲染为完整片段（样式表 + 容器）
pub fn render_document(value: &Value) -> String {
    format!(
        "<style>\n{}\n</style>\n<div class=\"json-view\">{}</div>",
        STYLESHEET,
        render(value, 0)
    )
}

fn write_value(out: &mut String, value: &Value, depth: usize) {
    match value {
        Value::Object(map) => {
            let entries = map.iter().map(|(k, v)| (Some(k.as_str()), v));
            write_container(out, ('{', '}'), entries, map.len(), depth);
        }
        Value::Array(items) => {
            let entries = items.iter().map(|v| (None, v));
            write_container(out, ('[', ']'), entries, items.len(), depth);
        }
        Value::String(s) => {
            let _ = write!(out, "<span class=\"{}\">\"{}\"</span>", CLASS_STRING, escape_html(s));
        }
        Value::Number(n) => {
            let _ = write!(out, "<span class=\"{}\">{}</span>", CLASS_NUMBER, n);
        }
        Value::Bool(b) => {
            let _ = write!(out, "<span class=\"{}\">{}</span>", CLASS_BOOLEAN, b);
        }
        Value::Null => {
            let _ = write!(out, "<span class=\"{}\">null</span>", CLASS_NULL);
        }
    }
}

fn write_container<'a>(
    out: &mut String,
    (open, close): (char, char),
    entries: impl Iterator<Item = (Option<&'a str>, &'a Value)>,
    len: usize,
    depth: usize,
) {
    out.push(open);
    if len == 0 {
        out.push(close);
        return;
    }
    out.push_str(LINE_BREAK);

    let indent = INDENT_UNIT.repeat(depth);
    for (index, (key, value)) in entries.enumerate() {
        out.push_str(&indent);
        out.push_str(INDENT_UNIT);
        if let Some(key) = key {
            let _ = write!(out, "<span class=\"{}\">\"{}\": </span>", CLASS_KEY, escape_html(key));
        }
        write_value(out, value, depth + 1);
        if index + 1 < len {
            out.push(',');
        }
        out.push_str(LINE_BREAK);
    }

    out.push_str(&indent);
    out.push(close);
}
