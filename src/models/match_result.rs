use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// 单条关键词命中
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    /// 行号（从 1 开始）
    pub line: usize,
    /// 命中的关键词
    pub keyword: String,
    /// 该行的原始内容（展示前必须转义）
    pub content: String,
}

/// 匹配结果的结构化数据
///
/// `matches` 保持服务端返回的章节顺序。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MatchData {
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub matches: IndexMap<String, Vec<Match>>,
    /// 服务端无法解析结果时返回的错误说明
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MatchData {
    /// 所有章节的命中总数
    pub fn total_matches(&self) -> usize {
        self.matches.values().map(Vec::len).sum()
    }
}

/// 一个文件针对一个关键词组的匹配结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub batch_id: Option<i64>,
    pub file_id: i64,
    pub keyword_set_id: i64,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub match_data: MatchData,
}

/// 关键词匹配请求体
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KeywordMatchRequest {
    pub batch_id: i64,
    pub keyword_set_id: i64,
}
