//! 文件内容服务 - 业务能力层
//!
//! 只负责"读取单个文件内容"能力

use crate::clients::ApiClient;
use crate::error::{AppError, AppResult};
use crate::models::{is_structured_filename, Stage};
use crate::render::json_markup;
use serde_json::Value;
use tracing::{debug, warn};

/// 文件内容
#[derive(Debug, Clone, PartialEq)]
pub enum FileContent {
    /// 原始文本
    Raw(String),
    /// 结构化数据及其渲染结果
    Structured { value: Value, markup: String },
}

impl FileContent {
    pub fn is_structured(&self) -> bool {
        matches!(self, FileContent::Structured { .. })
    }

    /// 终端输出用的纯文本
    pub fn to_plain_text(&self) -> String {
        match self {
            FileContent::Raw(text) => text.clone(),
            FileContent::Structured { value, .. } => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
        }
    }
}

/// 文件内容服务
///
/// 职责：
/// - 按 (阶段, 文件ID) 读取内容
/// - 只有最终清洗阶段且文件名为结构化格式时才尝试解析
/// - 解析失败降级为原始文本，不视为错误
#[derive(Clone)]
pub struct ContentService {
    client: ApiClient,
}

impl ContentService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// 读取文件内容
    ///
    /// # 参数
    /// - `stage`: 文件所处阶段
    /// - `file_id`: 文件ID
    /// - `filename`: 文件名（用于判断是否为结构化格式）
    pub async fn get_file_content(
        &self,
        stage: Stage,
        file_id: i64,
        filename: &str,
    ) -> AppResult<FileContent> {
        let endpoint = format!("/files/{}/{}/content", stage.token(), file_id);
        let body = self
            .client
            .get_text(&endpoint)
            .await
            .map_err(|source| AppError::ContentFetch {
                stage,
                file_id,
                source,
            })?;

        debug!("读取文件内容: {} #{} ({} 字节)", stage, file_id, body.len());
        Ok(interpret_content(stage, filename, body))
    }
}

/// 根据阶段和文件名决定内容的展示方式
pub fn interpret_content(stage: Stage, filename: &str, body: String) -> FileContent {
    if !(stage.is_final() && is_structured_filename(filename)) {
        return FileContent::Raw(body);
    }

    match serde_json::from_str::<Value>(&body) {
        Ok(value) => {
            let markup = json_markup::render(&value, 0);
            FileContent::Structured { value, markup }
        }
        Err(e) => {
            warn!("⚠️ {} 解析失败，按原始文本显示: {}", filename, e);
            FileContent::Raw(body)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_original_stage_never_parses() {
        let content = interpret_content(Stage::Original, "config.json", r#"{"a": 1}"#.to_string());
        assert_eq!(content, FileContent::Raw(r#"{"a": 1}"#.to_string()));

        let content = interpret_content(Stage::Cleaned1, "config.json", r#"{"a": 1}"#.to_string());
        assert!(!content.is_structured());
    }

    #[test]
    fn test_final_stage_json_is_rendered() {
        let content = interpret_content(Stage::Cleaned2, "config.json", r#"{"a": 1}"#.to_string());
        match content {
            FileContent::Structured { value, markup } => {
                assert_eq!(value["a"], 1);
                assert!(markup.contains("json-number"));
            }
            other => panic!("expected structured content, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_failure_degrades_to_raw() {
        let content = interpret_content(Stage::Cleaned2, "config.json", "not json {".to_string());
        assert_eq!(content, FileContent::Raw("not json {".to_string()));
    }

    #[test]
    fn test_final_stage_plain_file_stays_raw() {
        let content = interpret_content(Stage::Cleaned2, "config.txt", "{}".to_string());
        assert_eq!(content.to_plain_text(), "{}");
        assert!(!content.is_structured());
    }
}
