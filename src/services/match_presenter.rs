//! 匹配结果展示服务
//!
//! 取出某个文件的匹配结果，按章节分组，内容转义后供展示

use crate::error::{AppError, AppResult};
use crate::models::{MatchData, MatchResult};
use crate::render::escape_html;
use crate::services::KeywordService;
use chrono::NaiveDateTime;
use tracing::{debug, warn};

/// 章节中的一条命中
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchLine {
    pub line: usize,
    pub keyword: String,
    /// 已转义，可直接放入标记
    pub content: String,
    /// 未转义的原文，仅用于纯文本输出
    pub raw_content: String,
}

/// 一个章节
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionView {
    pub name: String,
    pub entries: Vec<MatchLine>,
}

/// 单个文件的匹配报告
#[derive(Debug, Clone, PartialEq)]
pub struct MatchReport {
    pub batch_id: i64,
    pub file_id: i64,
    pub keyword_set_id: i64,
    /// 获取关键词组失败时为 None
    pub keyword_set_name: Option<String>,
    pub vendor: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    pub sections: Vec<SectionView>,
    /// 服务端记录的解析错误
    pub error: Option<String>,
}

impl MatchReport {
    pub fn total_matches(&self) -> usize {
        self.sections.iter().map(|s| s.entries.len()).sum()
    }

    pub fn vendor_or_unknown(&self) -> &str {
        self.vendor.as_deref().unwrap_or("未知")
    }
}

/// 匹配结果展示服务
#[derive(Clone)]
pub struct MatchPresenter {
    keywords: KeywordService,
}

impl MatchPresenter {
    pub fn new(keywords: KeywordService) -> Self {
        Self { keywords }
    }

    /// 获取文件的最新匹配结果（任意关键词组）
    pub async fn get_matches_for_file(&self, batch_id: i64, file_id: i64) -> AppResult<MatchReport> {
        self.get_matches_for_file_and_set(batch_id, file_id, None).await
    }

    /// 获取文件针对指定关键词组的最新匹配结果
    pub async fn get_matches_for_file_and_set(
        &self,
        batch_id: i64,
        file_id: i64,
        keyword_set_id: Option<i64>,
    ) -> AppResult<MatchReport> {
        let results = self.keywords.list_match_results(batch_id).await?;
        debug!("批次 {} 共有 {} 条匹配结果", batch_id, results.len());

        let result = select_latest(&results, file_id, keyword_set_id)
            .ok_or(AppError::NoMatches { batch_id, file_id })?;

        // 关键词组名称只用于展示，获取失败时退化为显示 ID
        let keyword_set_name = match self.keywords.get_keyword_set(result.keyword_set_id).await {
            Ok(set) => Some(set.name),
            Err(e) => {
                warn!("⚠️ 获取关键词组 {} 信息失败: {}", result.keyword_set_id, e);
                None
            }
        };

        Ok(build_report(batch_id, result, keyword_set_name))
    }
}

/// 选出文件最新的一条结果
///
/// 按 `created_at` 取最新，时间相同再按 `id` 取较大者；仍相同时保留接口返回顺序中靠前的一条。
pub fn select_latest(
    results: &[MatchResult],
    file_id: i64,
    keyword_set_id: Option<i64>,
) -> Option<&MatchResult> {
    let mut best: Option<&MatchResult> = None;
    for candidate in results
        .iter()
        .filter(|r| r.file_id == file_id)
        .filter(|r| keyword_set_id.map_or(true, |id| r.keyword_set_id == id))
    {
        let newer = match best {
            None => true,
            Some(current) => (candidate.created_at, candidate.id) > (current.created_at, current.id),
        };
        if newer {
            best = Some(candidate);
        }
    }
    best
}

/// 按章节分组，保持章节顺序和章节内顺序
pub fn group_sections(data: &MatchData) -> Vec<SectionView> {
    data.matches
        .iter()
        .map(|(name, matches)| SectionView {
            name: name.clone(),
            entries: matches
                .iter()
                .map(|m| MatchLine {
                    line: m.line,
                    keyword: m.keyword.clone(),
                    content: escape_html(&m.content),
                    raw_content: m.content.clone(),
                })
                .collect(),
        })
        .collect()
}

pub fn build_report(
    batch_id: i64,
    result: &MatchResult,
    keyword_set_name: Option<String>,
) -> MatchReport {
    MatchReport {
        batch_id,
        file_id: result.file_id,
        keyword_set_id: result.keyword_set_id,
        keyword_set_name,
        vendor: result.match_data.vendor.clone(),
        created_at: result.created_at,
        sections: group_sections(&result.match_data),
        error: result.match_data.error.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result(id: i64, file_id: i64, set_id: i64, created_at: &str) -> MatchResult {
        serde_json::from_value(json!({
            "id": id,
            "file_id": file_id,
            "keyword_set_id": set_id,
            "created_at": created_at,
            "match_data": {"vendor": null, "matches": {}}
        }))
        .unwrap()
    }

    #[test]
    fn test_select_latest_prefers_newest_created_at() {
        let results = vec![
            result(1, 101, 3, "2024-01-01T00:00:00"),
            result(2, 101, 3, "2024-03-01T00:00:00"),
            result(3, 102, 3, "2024-05-01T00:00:00"),
            result(4, 101, 3, "2024-02-01T00:00:00"),
        ];
        assert_eq!(select_latest(&results, 101, None).unwrap().id, Some(2));
        assert_eq!(select_latest(&results, 102, Some(3)).unwrap().id, Some(3));
        assert!(select_latest(&results, 103, None).is_none());
        assert!(select_latest(&results, 101, Some(9)).is_none());
    }

    #[test]
    fn test_select_latest_breaks_time_ties_by_id() {
        let results = vec![
            result(7, 101, 3, "2024-01-01T00:00:00"),
            result(9, 101, 4, "2024-01-01T00:00:00"),
        ];
        assert_eq!(select_latest(&results, 101, None).unwrap().id, Some(9));
        assert_eq!(select_latest(&results, 101, Some(3)).unwrap().id, Some(7));
    }

    #[test]
    fn test_group_sections_escapes_content_in_order() {
        let data: MatchData = serde_json::from_value(json!({
            "vendor": "h3c",
            "matches": {
                "snmp": [
                    {"line": 3, "keyword": "community", "content": "snmp community <public>"},
                    {"line": 1, "keyword": "snmp", "content": "snmp-agent"}
                ],
                "aaa": [{"line": 2, "keyword": "password", "content": "password 'x' & y"}]
            }
        }))
        .unwrap();

        let sections = group_sections(&data);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].name, "snmp");
        assert_eq!(sections[0].entries[0].line, 3);
        assert_eq!(sections[0].entries[0].content, "snmp community &lt;public&gt;");
        assert_eq!(sections[0].entries[1].line, 1);
        assert_eq!(sections[1].entries[0].content, "password &#039;x&#039; &amp; y");
        assert_eq!(sections[1].entries[0].raw_content, "password 'x' & y");
    }

    #[test]
    fn test_build_report_defaults_vendor() {
        let r = result(1, 101, 3, "2024-01-01T00:00:00");
        let report = build_report(7, &r, None);
        assert_eq!(report.vendor_or_unknown(), "未知");
        assert_eq!(report.total_matches(), 0);
        assert_eq!(report.batch_id, 7);
    }
}
