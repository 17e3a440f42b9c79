//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 创建 HTTP 客户端和全部服务
//! - 为每个命令提供一个方法
//!
//! ### `dispatcher` - 事件调度器
//! - 执行 `workflow::reduce` 返回的副作用（二次清洗、关键词检查、刷新列表、提示）
//! - 把副作用的结果作为事件送回，直到没有新的副作用
//!
//! ### `state` - 应用状态
//! - 批次列表和文件内容视图（只保留最新请求的结果）
//! - 每个批次的流程状态、关键词组、待展示的提示
//!
//! ## 层次关系
//!
//! ```text
//! app (命令)
//!     ↓
//! dispatcher (事件 → reduce → 副作用)
//!     ↓
//! workflow::BatchFlow (单个批次的状态机)
//!     ↓
//! services (能力层：batch / cleaning / content / keyword / presenter)
//!     ↓
//! clients::ApiClient (HTTP)
//! ```

pub mod app;
pub mod dispatcher;
pub mod state;

pub use app::{scan_file, ActionOutcome, App, Overview};
pub use dispatcher::{Dispatcher, FetchedContent, PendingContent};
pub use state::AppState;
