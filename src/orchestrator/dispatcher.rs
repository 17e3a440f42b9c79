//! 事件调度器 - 编排层
//!
//! 把用户操作转换为 [`FlowEvent`]，交给 [`reduce`] 计算新状态，
//! 再执行返回的副作用，并把副作用的结果作为新事件送回，直到队列清空。
//!
//! 调度器不向上传播错误：所有失败都转成 [`Notice`] 存入状态。

use crate::error::AppResult;
use crate::models::Stage;
use crate::orchestrator::AppState;
use crate::services::{BatchService, CleaningService, ContentService, FileContent, KeywordService};
use crate::workflow::{reduce, BatchFlow, Completion, Effect, FlowEvent, Notice, Ticket};
use std::collections::VecDeque;
use tracing::{debug, info, warn};

pub struct Dispatcher {
    batches: BatchService,
    cleaning: CleaningService,
    keywords: KeywordService,
    content: ContentService,
    state: AppState,
}

impl Dispatcher {
    pub fn new(
        batches: BatchService,
        cleaning: CleaningService,
        keywords: KeywordService,
        content: ContentService,
    ) -> Self {
        Self {
            batches,
            cleaning,
            keywords,
            content,
            state: AppState::new(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn push_notice(&mut self, notice: Notice) {
        self.state.notices.push(notice);
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.state.take_notices()
    }

    /// 处理一个事件及其引发的全部后续事件
    pub async fn dispatch(&mut self, batch_id: i64, event: FlowEvent) {
        let mut queue = VecDeque::from([(batch_id, event)]);

        while let Some((id, event)) = queue.pop_front() {
            let flow = self
                .state
                .flows
                .get(&id)
                .cloned()
                .unwrap_or_else(|| BatchFlow::new(id));
            debug!("批次 {} 处理事件: {:?}", id, event);
            let (next, effects) = reduce(&flow, event);
            self.state.flows.insert(id, next);

            for effect in effects {
                if let Some(follow_up) = self.run_effect(effect).await {
                    queue.push_back(follow_up);
                }
            }
        }
    }

    async fn run_effect(&mut self, effect: Effect) -> Option<(i64, FlowEvent)> {
        match effect {
            Effect::RunSecondCleaning { batch_id } => {
                info!("🧹 批次 {} 开始二次清洗", batch_id);
                let event = match self.cleaning.run_second_cleaning_by_id(batch_id).await {
                    Ok(batch) => FlowEvent::CleanSucceeded {
                        cleaned_2: batch.cleaned_files_2.len(),
                    },
                    Err(e) => FlowEvent::CleanFailed {
                        reason: e.to_string(),
                    },
                };
                Some((batch_id, event))
            }
            Effect::RunKeywordMatch {
                batch_id,
                keyword_set_id,
            } => {
                let event = match self
                    .keywords
                    .run_keyword_match(batch_id, keyword_set_id)
                    .await
                {
                    Ok(run) => FlowEvent::MatchSucceeded {
                        results: run.results.len(),
                    },
                    Err(e) => FlowEvent::MatchFailed {
                        reason: e.to_string(),
                    },
                };
                Some((batch_id, event))
            }
            Effect::RefreshBatches => {
                self.refresh_batches().await;
                None
            }
            Effect::Notify(notice) => {
                self.state.notices.push(notice);
                None
            }
        }
    }

    /// 重新获取批次列表
    pub async fn refresh_batches(&mut self) -> Completion {
        let ticket = self.state.begin_batch_refresh();
        let result = self.batches.list_batches().await;
        self.state.finish_batch_refresh(ticket, result)
    }

    /// 重新获取关键词组列表，失败时保留之前的列表并返回 `false`
    pub async fn refresh_keyword_sets(&mut self) -> bool {
        match self.keywords.list_keyword_sets().await {
            Ok(sets) => {
                self.state.keyword_sets = sets;
                true
            }
            Err(e) => {
                warn!("⚠️ 获取关键词组失败: {}", e);
                self.state.notices.push(Notice::from_error(&e));
                false
            }
        }
    }

    /// 用户请求二次清洗
    pub async fn request_second_cleaning(&mut self, batch_id: i64) {
        self.dispatch(batch_id, FlowEvent::CleanRequested).await;
    }

    /// 用户请求关键词检查（按当前已加载的关键词组判断是否可用）
    pub async fn request_keyword_match(&mut self, batch_id: i64, keyword_set_id: i64) {
        let keyword_sets_available = self.state.keyword_sets.len();
        self.dispatch(
            batch_id,
            FlowEvent::MatchRequested {
                keyword_set_id,
                keyword_sets_available,
            },
        )
        .await;
    }

    /// 匹配失败后重试
    pub async fn retry(&mut self, batch_id: i64) {
        self.dispatch(batch_id, FlowEvent::Retry).await;
    }

    /// 打开文件内容视图
    pub async fn open_content(&mut self, stage: Stage, file_id: i64, filename: &str) -> Completion {
        let pending = self.begin_content(stage, file_id, filename);
        let fetched = pending.fetch().await;
        self.finish_content(fetched)
    }

    /// 开始读取文件内容，返回的请求可以在调度器之外等待
    pub fn begin_content(&mut self, stage: Stage, file_id: i64, filename: &str) -> PendingContent {
        PendingContent {
            ticket: self.state.content_view.begin(),
            content: self.content.clone(),
            stage,
            file_id,
            filename: filename.to_string(),
        }
    }

    /// 读取完成：失败时清空视图并提示，不继续显示上一个文件
    pub fn finish_content(&mut self, fetched: FetchedContent) -> Completion {
        let FetchedContent { ticket, result } = fetched;
        let failure = result.as_ref().err().map(Notice::from_error);

        let completion = self.state.content_view.complete(ticket, result);
        match (completion, failure) {
            (Completion::FailedKeptPrevious, Some(notice)) => {
                self.state.content_view.clear();
                self.state.notices.push(notice);
            }
            (Completion::Superseded, _) => {
                debug!("丢弃已关闭视图的文件内容 (代次 {})", ticket.generation());
            }
            _ => {}
        }
        completion
    }

    /// 关闭文件内容视图，在途的读取结果将被丢弃
    pub fn close_content(&mut self) {
        self.state.content_view.dismiss();
    }
}

/// 在途的文件内容读取
pub struct PendingContent {
    ticket: Ticket,
    content: ContentService,
    stage: Stage,
    file_id: i64,
    filename: String,
}

impl PendingContent {
    pub async fn fetch(self) -> FetchedContent {
        let result = self
            .content
            .get_file_content(self.stage, self.file_id, &self.filename)
            .await;
        FetchedContent {
            ticket: self.ticket,
            result,
        }
    }
}

/// 已返回、尚未写入视图的文件内容
pub struct FetchedContent {
    ticket: Ticket,
    result: AppResult<FileContent>,
}
