use crate::error::PreconditionError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 关键词组
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordSet {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

impl std::fmt::Display for KeywordSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "#{} {} (关键词数量: {})",
            self.id,
            self.name,
            self.keywords.len()
        )
    }
}

/// 创建关键词组的请求体
///
/// 只能通过 [`KeywordSetCreate::new`] 或 [`KeywordSetCreate::from_lines`] 构造，
/// 保证关键词已去除首尾空白且不含空项。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordSetCreate {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    keywords: Vec<String>,
}

impl KeywordSetCreate {
    /// 创建请求，过滤空白关键词
    pub fn new<I, S>(
        name: impl Into<String>,
        description: Option<String>,
        keywords: I,
    ) -> Result<Self, PreconditionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(PreconditionError::EmptyKeywordSetName);
        }

        let keywords: Vec<String> = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        if keywords.is_empty() {
            return Err(PreconditionError::EmptyKeywordSet);
        }

        let description = description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        Ok(Self {
            name,
            description,
            keywords,
        })
    }

    /// 从按行分隔的文本创建（每行一个关键词）
    pub fn from_lines(
        name: impl Into<String>,
        description: Option<String>,
        text: &str,
    ) -> Result<Self, PreconditionError> {
        Self::new(name, description, text.lines())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}
