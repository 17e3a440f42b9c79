//! 展示层转换
//!
//! - `escape` - HTML 转义
//! - `json_markup` - 结构化数据的递归渲染
//! - `match_report` - 匹配结果的文本输出

pub mod escape;
pub mod json_markup;
pub mod match_report;

pub use escape::escape_html;
pub use json_markup::{render, render_document};
