use crate::error::ConfigError;
use serde::Deserialize;
use std::path::Path;

/// 程序配置
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 后端接口根地址（所有路由挂载在其下）
    pub api_base_url: String,
    /// 单个请求超时（秒）
    pub request_timeout_secs: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 未显式指定时使用的关键词组
    pub default_keyword_set_id: Option<i64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000/api".to_string(),
            request_timeout_secs: 120,
            verbose_logging: false,
            default_keyword_set_id: None,
        }
    }
}

impl Config {
    /// 从环境变量加载，未设置或无法解析的变量使用默认值
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 读取 TOML 配置文件，再用环境变量覆盖
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        Ok(base.with_env_overrides())
    }

    /// 只读取 TOML 配置文件
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })
    }

    fn with_env_overrides(self) -> Self {
        Self {
            api_base_url: std::env::var("KWCHECK_API_BASE_URL").unwrap_or(self.api_base_url),
            request_timeout_secs: std::env::var("KWCHECK_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.request_timeout_secs),
            verbose_logging: std::env::var("KWCHECK_VERBOSE").ok().and_then(|v| v.parse().ok()).unwrap_or(self.verbose_logging),
            default_keyword_set_id: std::env::var("KWCHECK_KEYWORD_SET").ok().and_then(|v| v.parse().ok()).or(self.default_keyword_set_id),
        }
    }

    /// 去掉结尾斜杠的接口根地址
    pub fn base_url(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }
}
