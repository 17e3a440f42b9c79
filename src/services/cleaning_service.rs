//! 二次清洗服务 - 业务能力层
//!
//! 只负责"触发二次清洗"能力，清洗算法本身在后端

use crate::clients::ApiClient;
use crate::error::{AppError, AppResult, PreconditionError};
use crate::models::Batch;
use tracing::info;

/// 二次清洗服务
#[derive(Clone)]
pub struct CleaningService {
    client: ApiClient,
}

impl CleaningService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// 检查批次是否满足二次清洗的前置条件
    ///
    /// 需要已持久化、有初次清洗文件、且尚无二次清洗文件。
    pub fn check_preconditions(batch: &Batch) -> Result<i64, PreconditionError> {
        let batch_id = batch.persisted_id()?;
        if batch.cleaned_files_1.is_empty() {
            return Err(PreconditionError::Stage1Missing { batch_id });
        }
        if !batch.cleaned_files_2.is_empty() {
            return Err(PreconditionError::Stage2AlreadyPresent { batch_id });
        }
        Ok(batch_id)
    }

    /// 对批次执行二次清洗
    ///
    /// 要么整体失败，要么返回的批次已包含完整的二次清洗结果。
    pub async fn run_second_cleaning(&self, batch: &Batch) -> AppResult<Batch> {
        let batch_id = Self::check_preconditions(batch)?;
        self.run_second_cleaning_by_id(batch_id).await
    }

    /// 按 ID 执行二次清洗（前置条件由调用方保证）
    pub async fn run_second_cleaning_by_id(&self, batch_id: i64) -> AppResult<Batch> {
        info!("🧹 批次 {} 开始二次清洗...", batch_id);

        let updated: Batch = self
            .client
            .post_empty(&format!("/batches/{}/clean2", batch_id))
            .await
            .map_err(|source| AppError::Cleaning { batch_id, source })?;

        if updated.cleaned_files_2.is_empty() {
            return Err(AppError::CleaningIncomplete { batch_id });
        }

        info!(
            "✓ 批次 {} 二次清洗完成，生成 {} 个文件",
            batch_id,
            updated.cleaned_files_2.len()
        );
        Ok(updated)
    }
}
