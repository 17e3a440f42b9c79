use std::str::FromStr;

/// 文件所处的处理阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// 原始上传文件
    Original,
    /// 初次清洗
    Cleaned1,
    /// 二次清洗（最终阶段）
    Cleaned2,
}

impl Stage {
    /// 所有阶段，按流水线顺序
    pub const ALL: [Stage; 3] = [Stage::Original, Stage::Cleaned1, Stage::Cleaned2];

    /// 接口路径中使用的阶段标识
    pub fn token(self) -> &'static str {
        match self {
            Stage::Original => "original",
            Stage::Cleaned1 => "cleaned1",
            Stage::Cleaned2 => "cleaned2",
        }
    }

    /// 显示名称
    pub fn label(self) -> &'static str {
        match self {
            Stage::Original => "原始文件",
            Stage::Cleaned1 => "初次清洗",
            Stage::Cleaned2 => "二次清洗",
        }
    }

    /// 是否为最终清洗阶段
    pub fn is_final(self) -> bool {
        self == Stage::Cleaned2
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "original" => Ok(Stage::Original),
            "cleaned1" => Ok(Stage::Cleaned1),
            "cleaned2" => Ok(Stage::Cleaned2),
            other => Err(format!(
                "未知的阶段 '{}'，可选值: original, cleaned1, cleaned2",
                other
            )),
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.token())
    }
}
