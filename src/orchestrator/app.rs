//! 应用入口 - 编排层
//!
//! `App` 持有配置和全部服务，为命令行的每个命令提供一个方法。
//! 只读命令直接返回 `AppResult`；会改变批次状态的命令（二次清洗、关键词检查）
//! 通过 [`Dispatcher`] 执行，结果以提示列表的形式返回。

use crate::clients::ApiClient;
use crate::config::Config;
use crate::error::{AppError, AppResult, PreconditionError};
use crate::models::{Batch, KeywordSet, KeywordSetCreate, MatchData, Stage};
use crate::orchestrator::Dispatcher;
use crate::services::{
    BatchService, CleaningService, ContentService, FileContent, KeywordMatcher, KeywordService,
    MatchPresenter, MatchReport,
};
use crate::utils::logging;
use crate::workflow::{BatchFlow, Completion, Notice, NoticeLevel};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// 首页数据
#[derive(Debug, Clone)]
pub struct Overview {
    pub batches: Vec<Batch>,
    pub keyword_sets: Vec<KeywordSet>,
}

/// 一次状态变更操作的结果
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    pub notices: Vec<Notice>,
    /// 操作结束后批次的流程状态
    pub flow: Option<BatchFlow>,
}

impl ActionOutcome {
    /// 是否出现警告或错误
    pub fn has_failures(&self) -> bool {
        self.notices.iter().any(|n| n.level != NoticeLevel::Info)
    }
}

/// 应用主结构
pub struct App {
    config: Config,
    batches: BatchService,
    content: ContentService,
    keywords: KeywordService,
    presenter: MatchPresenter,
    dispatcher: Dispatcher,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> AppResult<Self> {
        logging::log_startup(&config);

        let client = ApiClient::new(&config)?;
        let batches = BatchService::new(client.clone());
        let cleaning = CleaningService::new(client.clone());
        let content = ContentService::new(client.clone());
        let keywords = KeywordService::new(client, batches.clone());
        let presenter = MatchPresenter::new(keywords.clone());
        let dispatcher = Dispatcher::new(
            batches.clone(),
            cleaning,
            keywords.clone(),
            content.clone(),
        );

        Ok(Self {
            config,
            batches,
            content,
            keywords,
            presenter,
            dispatcher,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 同时获取批次列表和关键词组
    pub async fn overview(&self) -> AppResult<Overview> {
        let (batches, keyword_sets) = futures::try_join!(
            self.batches.list_batches(),
            self.keywords.list_keyword_sets()
        )?;
        info!(
            "✓ 获取到 {} 个批次, {} 个关键词组",
            batches.len(),
            keyword_sets.len()
        );
        Ok(Overview {
            batches,
            keyword_sets,
        })
    }

    pub async fn batch(&self, batch_id: i64) -> AppResult<Batch> {
        self.batches.get_batch(batch_id).await
    }

    /// 读取批次中某个文件的内容
    pub async fn file_content(
        &self,
        batch_id: i64,
        stage: Stage,
        file_id: i64,
    ) -> AppResult<FileContent> {
        let batch = self.batches.get_batch(batch_id).await?;
        let filename = match batch.find_file(stage, file_id) {
            Some(file) => file.filename.clone(),
            None => {
                warn!(
                    "⚠️ 批次 {} 的{}中没有文件 #{}，按原始文本读取",
                    batch_id,
                    stage.label(),
                    file_id
                );
                String::new()
            }
        };
        self.content.get_file_content(stage, file_id, &filename).await
    }

    pub async fn keyword_sets(&self) -> AppResult<Vec<KeywordSet>> {
        self.keywords.list_keyword_sets().await
    }

    pub async fn keyword_set(&self, keyword_set_id: i64) -> AppResult<KeywordSet> {
        self.keywords.get_keyword_set(keyword_set_id).await
    }

    pub async fn create_keyword_set(&self, request: &KeywordSetCreate) -> AppResult<KeywordSet> {
        self.keywords.create_keyword_set(request).await
    }

    pub async fn upload(
        &self,
        paths: &[PathBuf],
        description: Option<&str>,
        keyword_set_id: Option<i64>,
    ) -> AppResult<Batch> {
        let keyword_set_id = keyword_set_id.or(self.config.default_keyword_set_id);
        self.batches
            .upload_files(paths, description, keyword_set_id)
            .await
    }

    /// 对批次执行二次清洗
    pub async fn run_second_cleaning(&mut self, batch_id: i64) -> ActionOutcome {
        if self.load_batch_state(batch_id).await {
            self.dispatcher.request_second_cleaning(batch_id).await;
        }
        self.outcome(batch_id)
    }

    /// 对批次执行关键词检查
    ///
    /// 关键词组依次取：显式指定、配置中的默认值、第一个可用的关键词组。
    pub async fn run_keyword_match(
        &mut self,
        batch_id: i64,
        keyword_set_id: Option<i64>,
    ) -> ActionOutcome {
        // 关键词组读取失败时只提示读取错误，不当作"没有关键词组"
        if self.load_batch_state(batch_id).await && self.dispatcher.refresh_keyword_sets().await {
            let keyword_set_id = keyword_set_id
                .or(self.config.default_keyword_set_id)
                .or_else(|| self.dispatcher.state().keyword_sets.first().map(|s| s.id))
                .unwrap_or_default();
            self.dispatcher
                .request_keyword_match(batch_id, keyword_set_id)
                .await;
        }
        self.outcome(batch_id)
    }

    /// 文件的最新匹配结果
    pub async fn file_matches(
        &self,
        batch_id: i64,
        file_id: i64,
        keyword_set_id: Option<i64>,
    ) -> AppResult<MatchReport> {
        self.presenter
            .get_matches_for_file_and_set(batch_id, file_id, keyword_set_id)
            .await
    }

    /// 在本地对二次清洗后的 JSON 文件做关键词预览
    ///
    /// 有 `keywords` 时直接使用；否则读取关键词组（显式指定或配置中的默认值）。
    pub async fn scan_local_file(
        &self,
        path: &Path,
        keyword_set_id: Option<i64>,
        keywords: Vec<String>,
    ) -> AppResult<MatchData> {
        let keywords = if keywords.is_empty() {
            match keyword_set_id.or(self.config.default_keyword_set_id) {
                Some(id) => self.keywords.get_keyword_set(id).await?.keywords,
                None => Vec::new(),
            }
        } else {
            keywords
        };
        scan_file(path, keywords).await
    }

    /// 刷新批次列表，确认批次存在
    async fn load_batch_state(&mut self, batch_id: i64) -> bool {
        if self.dispatcher.refresh_batches().await != Completion::Applied {
            return false;
        }
        if self.dispatcher.state().batch(batch_id).is_none() {
            self.dispatcher_notice(Notice::warning(format!("批次 {} 不存在", batch_id)));
            return false;
        }
        true
    }

    fn dispatcher_notice(&mut self, notice: Notice) {
        warn!("⚠️ {}", notice.message);
        self.dispatcher.push_notice(notice);
    }

    fn outcome(&mut self, batch_id: i64) -> ActionOutcome {
        ActionOutcome {
            notices: self.dispatcher.take_notices(),
            flow: self.dispatcher.state().flow(batch_id).cloned(),
        }
    }
}

/// 读取本地文件并执行关键词扫描
pub async fn scan_file(path: &Path, keywords: Vec<String>) -> AppResult<MatchData> {
    let matcher = KeywordMatcher::new(keywords);
    if matcher.is_empty() {
        return Err(PreconditionError::EmptyKeywordSet.into());
    }

    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
    let value: Value = serde_json::from_str(&text)
        .map_err(|e| AppError::file_read_failed(path.display().to_string(), e.into()))?;

    let data = matcher.search_config_data(&value);
    info!(
        "🔍 {} 扫描完成: {} 个章节, {} 处匹配",
        path.display(),
        data.matches.len(),
        data.total_matches()
    );
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_scan_file_finds_whole_words() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"vendor": "huawei", "interface": "telnet enable\ntelnetd off"}}"#
        )
        .unwrap();

        let data = scan_file(file.path(), vec!["Telnet".to_string()])
            .await
            .unwrap();
        assert_eq!(data.vendor.as_deref(), Some("huawei"));
        let hits = &data.matches["interface"];
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].line, 1);
        assert_eq!(hits[0].keyword, "Telnet");
    }

    #[tokio::test]
    async fn test_scan_file_rejects_empty_keywords_and_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = scan_file(file.path(), vec!["  ".to_string()]).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Precondition(PreconditionError::EmptyKeywordSet)
        ));

        let err = scan_file(file.path(), vec!["x".to_string()]).await.unwrap_err();
        assert!(matches!(err, AppError::File { .. }));
    }
}
