//! 编排层持有的界面状态

use crate::error::AppResult;
use crate::models::{Batch, KeywordSet};
use crate::services::FileContent;
use crate::workflow::{reduce, BatchFlow, Completion, FlowEvent, LatestOnly, Notice, Ticket};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// 应用状态
#[derive(Debug, Default)]
pub struct AppState {
    /// 批次列表（只展示最新一次刷新的结果）
    pub batches: LatestOnly<Vec<Batch>>,
    /// 每个已持久化批次的流程状态
    pub flows: BTreeMap<i64, BatchFlow>,
    pub keyword_sets: Vec<KeywordSet>,
    /// 尚未展示的提示
    pub notices: Vec<Notice>,
    /// 当前打开的文件内容
    pub content_view: LatestOnly<FileContent>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前列表中的批次
    pub fn batch(&self, batch_id: i64) -> Option<&Batch> {
        self.batches
            .current()
            .and_then(|list| list.iter().find(|b| b.id == Some(batch_id)))
    }

    pub fn flow(&self, batch_id: i64) -> Option<&BatchFlow> {
        self.flows.get(&batch_id)
    }

    pub fn begin_batch_refresh(&mut self) -> Ticket {
        self.batches.begin()
    }

    /// 刷新完成：生效时同步每个批次的流程状态，失败时保留原列表并提示
    pub fn finish_batch_refresh(
        &mut self,
        ticket: Ticket,
        result: AppResult<Vec<Batch>>,
    ) -> Completion {
        let completion = self.batches.complete(ticket, result);
        match completion {
            Completion::Applied => self.observe_current_batches(),
            Completion::FailedKeptPrevious => {
                let reason = self.batches.last_error().unwrap_or_default().to_string();
                warn!("⚠️ 刷新批次列表失败，保留之前的列表: {}", reason);
                self.notices
                    .push(Notice::warning(format!("刷新批次列表失败: {}", reason)));
            }
            Completion::Superseded => {
                debug!("丢弃过期的批次列表响应 (代次 {})", ticket.generation());
            }
        }
        completion
    }

    fn observe_current_batches(&mut self) {
        let Some(batches) = self.batches.current() else {
            return;
        };

        for batch in batches {
            // 没有服务端ID的批次只展示，不参与任何操作
            let Some(id) = batch.id else {
                continue;
            };
            let flow = self
                .flows
                .get(&id)
                .cloned()
                .unwrap_or_else(|| BatchFlow::new(id));
            let (next, _) = reduce(&flow, FlowEvent::observed(batch));
            self.flows.insert(id, next);
        }
    }

    /// 取出所有待展示的提示
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}
