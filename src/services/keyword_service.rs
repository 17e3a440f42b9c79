//! 关键词服务 - 业务能力层
//!
//! 负责关键词组的读取/创建，以及对批次触发关键词匹配

use crate::clients::ApiClient;
use crate::error::{AppError, AppResult};
use crate::models::{KeywordMatchRequest, KeywordSet, KeywordSetCreate, MatchResult};
use crate::services::BatchService;
use serde_json::Value;
use tracing::{debug, info, warn};

/// 一次关键词匹配的结果汇总
#[derive(Debug, Clone)]
pub struct MatchRun {
    pub batch_id: i64,
    pub keyword_set_id: i64,
    /// 发起请求时批次中的二次清洗文件数
    pub files_checked: usize,
    /// 服务端返回的新结果（每个文件一条）
    pub results: Vec<MatchResult>,
}

/// 关键词服务
///
/// 职责：
/// - 关键词组列表、详情、创建
/// - 发起匹配前检查：批次有二次清洗文件、存在关键词组、所选关键词组存在
/// - 读取批次的全部匹配结果
#[derive(Clone)]
pub struct KeywordService {
    client: ApiClient,
    batches: BatchService,
}

impl KeywordService {
    pub fn new(client: ApiClient, batches: BatchService) -> Self {
        Self { client, batches }
    }

    /// 获取所有关键词组
    pub async fn list_keyword_sets(&self) -> AppResult<Vec<KeywordSet>> {
        self.client
            .get_json("/keywords/sets")
            .await
            .map_err(AppError::Fetch)
    }

    /// 获取单个关键词组
    pub async fn get_keyword_set(&self, keyword_set_id: i64) -> AppResult<KeywordSet> {
        self.client
            .get_json(&format!("/keywords/sets/{}", keyword_set_id))
            .await
            .map_err(AppError::Fetch)
    }

    /// 创建关键词组
    pub async fn create_keyword_set(&self, request: &KeywordSetCreate) -> AppResult<KeywordSet> {
        let created: KeywordSet = self
            .client
            .post_json("/keywords/sets", request)
            .await
            .map_err(AppError::Fetch)?;

        info!(
            "✓ 关键词组已创建: #{} {} ({} 个关键词)",
            created.id,
            created.name,
            created.keywords.len()
        );
        Ok(created)
    }

    /// 对批次的所有二次清洗文件执行关键词匹配
    ///
    /// 前置条件在发起匹配请求之前检查。本方法不修改本地批次状态，
    /// 调用方需要重新获取批次列表。
    pub async fn run_keyword_match(&self, batch_id: i64, keyword_set_id: i64) -> AppResult<MatchRun> {
        let batch = self.batches.get_batch(batch_id).await?;
        let files_checked = batch.cleaned_files_2.len();
        if files_checked == 0 {
            return Err(AppError::EmptyBatch { batch_id });
        }

        let sets = self.list_keyword_sets().await?;
        if sets.is_empty() {
            return Err(AppError::NoKeywordSets);
        }
        if !sets.iter().any(|s| s.id == keyword_set_id) {
            return Err(AppError::UnknownKeywordSet { keyword_set_id });
        }

        info!(
            "🔍 批次 {} 开始关键词检查 (关键词组 {}, {} 个文件)...",
            batch_id, keyword_set_id, files_checked
        );

        let request = KeywordMatchRequest {
            batch_id,
            keyword_set_id,
        };
        let ack: Value = self
            .client
            .post_json("/keywords/match", &request)
            .await
            .map_err(|source| AppError::KeywordMatch {
                batch_id,
                keyword_set_id,
                source,
            })?;

        let results = parse_match_ack(ack);
        if results.len() < files_checked {
            warn!(
                "⚠️ 批次 {} 有 {} 个文件，但只生成了 {} 条匹配结果",
                batch_id,
                files_checked,
                results.len()
            );
        }
        info!("✓ 批次 {} 关键词检查完成: {} 条结果", batch_id, results.len());

        Ok(MatchRun {
            batch_id,
            keyword_set_id,
            files_checked,
            results,
        })
    }

    /// 获取批次的全部匹配结果
    pub async fn list_match_results(&self, batch_id: i64) -> AppResult<Vec<MatchResult>> {
        self.client
            .get_json(&format!("/keywords/match/batch/{}", batch_id))
            .await
            .map_err(AppError::Fetch)
    }
}

/// 解析匹配接口的应答
///
/// 应答只作确认用：无法识别的内容按"没有返回结果"处理。
fn parse_match_ack(ack: Value) -> Vec<MatchResult> {
    match ack {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match serde_json::from_value(item) {
                Ok(result) => Some(result),
                Err(e) => {
                    debug!("跳过无法解析的匹配结果: {}", e);
                    None
                }
            })
            .collect(),
        other => {
            debug!("匹配接口返回非列表应答: {}", other);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_match_ack() {
        let ack = json!([
            {"file_id": 101, "keyword_set_id": 3, "match_data": {"matches": {}}},
            {"unexpected": true},
            {"file_id": 102, "keyword_set_id": 3}
        ]);
        let results = parse_match_ack(ack);
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].file_id, 102);

        assert!(parse_match_ack(json!({"status": "ok"})).is_empty());
    }
}
