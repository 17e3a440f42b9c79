//! 批次仓库服务 - 业务能力层
//!
//! 只负责"读取/上传批次"能力，不关心流程

use crate::clients::ApiClient;
use crate::error::{AppError, AppResult, PreconditionError};
use crate::models::{sort_newest_first, Batch};
use reqwest::multipart::{Form, Part};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// 批次仓库服务
///
/// 职责：
/// - 读取批次列表和单个批次，缺失的文件集合规范化为空
/// - 批次列表按 ID 降序返回
/// - 上传原始文件创建新批次
#[derive(Clone)]
pub struct BatchService {
    client: ApiClient,
}

impl BatchService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// 获取所有批次（最新的在前）
    pub async fn list_batches(&self) -> AppResult<Vec<Batch>> {
        let mut batches: Vec<Batch> = self
            .client
            .get_json("/batches")
            .await
            .map_err(AppError::Fetch)?;

        for batch in batches.iter().filter(|b| !b.is_consistent()) {
            warn!(
                "批次 {:?} 数据不一致: 有 {} 个二次清洗文件但没有初次清洗文件",
                batch.id,
                batch.cleaned_files_2.len()
            );
        }

        let unpersisted = batches.iter().filter(|b| b.id.is_none()).count();
        if unpersisted > 0 {
            warn!("⚠️ {} 个批次缺少服务端ID，仅用于展示", unpersisted);
        }

        sort_newest_first(&mut batches);
        debug!("获取到 {} 个批次", batches.len());
        Ok(batches)
    }

    /// 获取单个批次
    pub async fn get_batch(&self, batch_id: i64) -> AppResult<Batch> {
        self.client
            .get_json(&format!("/batches/{}", batch_id))
            .await
            .map_err(AppError::Fetch)
    }

    /// 上传文件，创建新批次
    ///
    /// # 参数
    /// - `paths`: 本地文件路径
    /// - `description`: 批次描述（可选）
    /// - `keyword_set_id`: 上传时关联的关键词组（可选）
    pub async fn upload_files(
        &self,
        paths: &[PathBuf],
        description: Option<&str>,
        keyword_set_id: Option<i64>,
    ) -> AppResult<Batch> {
        if paths.is_empty() {
            return Err(PreconditionError::NoFilesSelected.into());
        }

        let mut form = Form::new();
        for path in paths {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
            let filename = path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_else(|| "upload.txt".to_string());
            debug!("添加上传文件: {} ({} 字节)", filename, bytes.len());
            form = form.part("files", Part::bytes(bytes).file_name(filename));
        }
        if let Some(description) = description.map(str::trim).filter(|d| !d.is_empty()) {
            form = form.text("description", description.to_string());
        }
        if let Some(id) = keyword_set_id {
            form = form.text("keyword_set_id", id.to_string());
        }

        let batch: Batch = self
            .client
            .post_multipart("/files/upload", form)
            .await
            .map_err(AppError::Fetch)?;

        info!(
            "✓ 上传完成: 批次 {:?}，共 {} 个文件",
            batch.id,
            batch.original_files.len()
        );
        Ok(batch)
    }
}
