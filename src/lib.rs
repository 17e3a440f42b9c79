//! # Batch Keyword Check
//!
//! 上传批次的清洗流程与关键词检查客户端
//!
//! ## 架构设计
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 唯一持有 HTTP 连接的模块，只暴露 get / post 能力
//! - `ApiClient` - 统一的状态码检查和错误详情提取
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `BatchService` - 批次列表、单个批次、上传
//! - `ContentService` - 按阶段读取文件内容
//! - `CleaningService` - 二次清洗
//! - `KeywordService` - 关键词组与关键词匹配
//! - `MatchPresenter` - 单个文件的匹配结果报告
//! - `KeywordMatcher` - 本地关键词扫描
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 单个批次的状态机（纯函数 `reduce`）
//! - `LatestOnly` - 只保留最新请求结果的视图数据
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/dispatcher` - 执行副作用并回送事件
//! - `orchestrator/app` - 命令入口
//!
//! ### 其他
//! - `render/` - JSON 高亮标记、匹配报告
//! - `models/` - 批次、关键词组、匹配结果

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod render;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::ApiClient;
pub use config::Config;
pub use error::{ApiError, AppError, AppResult, PreconditionError};
pub use models::{Batch, FileEntry, KeywordSet, MatchData, MatchResult, Stage};
pub use orchestrator::{App, Dispatcher};
pub use workflow::{BatchFlow, FlowEvent, LatestOnly, MatchState};
