use crate::models::Stage;
use thiserror::Error;

/// 应用程序错误类型
///
/// 每个变体对应一类用户可见的失败。网络/解析错误在编排层被捕获并转换为提示信息，
/// 不会作为未处理的错误向上传播。
#[derive(Debug, Error)]
pub enum AppError {
    /// 读取接口返回非成功状态（列表、单个批次、关键词组、匹配结果）
    #[error("获取数据失败: {0}")]
    Fetch(#[source] ApiError),

    /// 文件内容读取失败
    #[error("获取文件内容失败 ({stage} #{file_id}): {source}")]
    ContentFetch {
        stage: Stage,
        file_id: i64,
        #[source]
        source: ApiError,
    },

    /// 二次清洗请求失败，可由用户重试
    #[error("二次清洗失败 (批次 {batch_id}): {source}")]
    Cleaning {
        batch_id: i64,
        #[source]
        source: ApiError,
    },

    /// 二次清洗返回成功但批次中没有二次清洗文件
    #[error("二次清洗未产生完整结果 (批次 {batch_id})")]
    CleaningIncomplete { batch_id: i64 },

    /// 关键词匹配请求失败
    #[error("关键词检查失败 (批次 {batch_id}, 关键词组 {keyword_set_id}): {source}")]
    KeywordMatch {
        batch_id: i64,
        keyword_set_id: i64,
        #[source]
        source: ApiError,
    },

    /// 批次没有二次清洗文件
    #[error("批次 {batch_id} 没有二次清洗文件，请先执行二次清洗")]
    EmptyBatch { batch_id: i64 },

    /// 不存在任何关键词组
    #[error("没有可用的关键词组，请先创建关键词组")]
    NoKeywordSets,

    /// 选择的关键词组不存在
    #[error("关键词组 {keyword_set_id} 不存在")]
    UnknownKeywordSet { keyword_set_id: i64 },

    /// 文件没有匹配结果（表示"不存在"，不是故障）
    #[error("没有找到文件 {file_id} 的关键词匹配结果 (批次 {batch_id})")]
    NoMatches { batch_id: i64, file_id: i64 },

    /// 发起请求前检查出的前置条件错误
    #[error("{0}")]
    Precondition(#[from] PreconditionError),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 本地文件读写错误
    #[error("文件错误 ({path}): {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// HTTP 传输层错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// 网络请求失败
    #[error("请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// 接口返回非成功状态码
    #[error("接口返回错误状态 ({endpoint}): HTTP {status}{}", detail_suffix(.detail))]
    BadStatus {
        endpoint: String,
        status: u16,
        detail: Option<String>,
    },

    /// JSON 解析失败
    #[error("JSON解析失败 ({endpoint}): {source}")]
    JsonParseFailed {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(d) => format!(" - {}", d),
        None => String::new(),
    }
}

/// 前置条件错误（用户可修正）
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PreconditionError {
    /// 批次缺少服务端分配的 ID
    #[error("批次尚未持久化（缺少服务端分配的ID），无法执行该操作")]
    UnpersistedBatch,

    /// 批次没有初次清洗文件
    #[error("批次 {batch_id} 没有初次清洗文件，无法执行二次清洗")]
    Stage1Missing { batch_id: i64 },

    /// 批次已经有二次清洗文件
    #[error("批次 {batch_id} 已完成二次清洗")]
    Stage2AlreadyPresent { batch_id: i64 },

    /// 关键词组过滤后为空
    #[error("关键词组不能为空")]
    EmptyKeywordSet,

    /// 关键词组名称为空
    #[error("关键词组名称不能为空")]
    EmptyKeywordSetName,

    /// 上传时没有选择文件
    #[error("请选择要上传的文件")]
    NoFilesSelected,

    /// 操作正在进行中
    #[error("批次 {batch_id} 已有进行中的{action}")]
    AlreadyRunning { batch_id: i64, action: &'static str },

    /// 上一次匹配失败，需先重试
    #[error("批次 {batch_id} 上一次关键词检查失败，请先重试")]
    RetryRequired { batch_id: i64 },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// 构建 HTTP 客户端失败
    #[error("无法创建HTTP客户端: {0}")]
    HttpClient(#[source] reqwest::Error),
}

impl AppError {
    /// 创建本地文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File {
            path: path.into(),
            source,
        }
    }

    /// 用户可以通过修改输入或先执行前置步骤来解决
    pub fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            AppError::EmptyBatch { .. }
                | AppError::NoKeywordSets
                | AppError::UnknownKeywordSet { .. }
                | AppError::Precondition(_)
        )
    }

    /// 表示"没有数据"而不是故障
    pub fn is_absence(&self) -> bool {
        matches!(self, AppError::NoMatches { .. })
    }

    /// 底层的 HTTP 状态码（如果有）
    pub fn http_status(&self) -> Option<u16> {
        let api = match self {
            AppError::Fetch(e) => e,
            AppError::ContentFetch { source, .. }
            | AppError::Cleaning { source, .. }
            | AppError::KeywordMatch { source, .. } => source,
            _ => return None,
        };
        match api {
            ApiError::BadStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_status_display_includes_detail() {
        let err = ApiError::BadStatus {
            endpoint: "/batches/3".to_string(),
            status: 404,
            detail: Some("Batch not found".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "接口返回错误状态 (/batches/3): HTTP 404 - Batch not found"
        );
    }

    #[test]
    fn test_classification() {
        assert!(AppError::NoKeywordSets.is_user_correctable());
        assert!(AppError::EmptyBatch { batch_id: 1 }.is_user_correctable());
        assert!(AppError::from(PreconditionError::UnpersistedBatch).is_user_correctable());

        let none = AppError::NoMatches {
            batch_id: 1,
            file_id: 2,
        };
        assert!(none.is_absence());
        assert!(!none.is_user_correctable());

        let fetch = AppError::Fetch(ApiError::BadStatus {
            endpoint: "/batches".to_string(),
            status: 500,
            detail: None,
        });
        assert_eq!(fetch.http_status(), Some(500));
        assert!(!fetch.is_absence());
    }
}
