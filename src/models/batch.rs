use super::Stage;
use crate::error::PreconditionError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Reverse;
use std::path::Path;

/// 扩展名为结构化数据格式的文件
const STRUCTURED_EXTENSIONS: &[&str] = &["json"];

/// 批次中的单个文件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    pub id: i64,
    pub filename: String,
    /// 所属批次（仅关联）
    #[serde(default)]
    pub batch_id: Option<i64>,
    /// 上一阶段文件的 ID
    #[serde(default, alias = "original_file_id", alias = "cleaned_file_1_id")]
    pub source_file_id: Option<i64>,
    #[serde(default)]
    pub upload_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub cleaned_time: Option<NaiveDateTime>,
}

impl FileEntry {
    /// 文件名是否表示结构化数据
    pub fn is_structured(&self) -> bool {
        is_structured_filename(&self.filename)
    }

    /// 该阶段的处理时间
    pub fn processed_at(&self) -> Option<NaiveDateTime> {
        self.cleaned_time.or(self.upload_time)
    }
}

/// 判断文件名扩展名是否为结构化数据格式（忽略大小写）
pub fn is_structured_filename(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            STRUCTURED_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// 上传批次
///
/// 三个文件集合在反序列化时做防御性规范化：字段缺失或为 null 时视为空列表。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    /// 服务端分配的 ID，缺失表示尚未持久化
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub timestamp: Option<NaiveDateTime>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub original_files: Vec<FileEntry>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub cleaned_files_1: Vec<FileEntry>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub cleaned_files_2: Vec<FileEntry>,
}

impl Batch {
    /// 获取持久化 ID，未持久化的批次不能参与任何需要 ID 的操作
    pub fn persisted_id(&self) -> Result<i64, PreconditionError> {
        self.id.ok_or(PreconditionError::UnpersistedBatch)
    }

    /// 某个阶段的文件集合
    pub fn files(&self, stage: Stage) -> &[FileEntry] {
        match stage {
            Stage::Original => &self.original_files,
            Stage::Cleaned1 => &self.cleaned_files_1,
            Stage::Cleaned2 => &self.cleaned_files_2,
        }
    }

    /// 在某个阶段中查找文件
    pub fn find_file(&self, stage: Stage, file_id: i64) -> Option<&FileEntry> {
        self.files(stage).iter().find(|f| f.id == file_id)
    }

    /// 二次清洗非空时初次清洗必须非空
    pub fn is_consistent(&self) -> bool {
        self.cleaned_files_2.is_empty() || !self.cleaned_files_1.is_empty()
    }

    /// 界面上可执行的操作
    pub fn actions(&self) -> BatchActions {
        let persisted = self.id.is_some();
        BatchActions {
            run_second_cleaning: persisted
                && !self.cleaned_files_1.is_empty()
                && self.cleaned_files_2.is_empty(),
            run_keyword_match: persisted && !self.cleaned_files_2.is_empty(),
            view_matches: persisted && !self.cleaned_files_2.is_empty(),
        }
    }

    /// 描述，缺失时返回占位文本
    pub fn description_or_default(&self) -> &str {
        self.description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or("无描述")
    }
}

/// 批次可执行的操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchActions {
    /// 执行二次清洗
    pub run_second_cleaning: bool,
    /// 执行关键词检查
    pub run_keyword_match: bool,
    /// 查看关键词匹配结果
    pub view_matches: bool,
}

/// 按 ID 降序排序（最新的在前）
///
/// 未持久化的批次排在最后，保持相对顺序。
pub fn sort_newest_first(batches: &mut [Batch]) {
    batches.sort_by_key(|b| Reverse(b.id.map(|id| (1u8, id)).unwrap_or((0, 0))));
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn batch(id: Option<i64>, c1: usize, c2: usize) -> Batch {
        let files = |n: usize, base: i64| {
            (0..n)
                .map(|i| FileEntry {
                    id: base + i as i64,
                    filename: format!("f{}.json", i),
                    batch_id: id,
                    source_file_id: None,
                    upload_time: None,
                    cleaned_time: None,
                })
                .collect::<Vec<_>>()
        };
        Batch {
            id,
            timestamp: None,
            description: None,
            original_files: files(c1.max(1), 1),
            cleaned_files_1: files(c1, 100),
            cleaned_files_2: files(c2, 200),
        }
    }

    #[test]
    fn test_missing_and_null_collections_become_empty() {
        let b: Batch = serde_json::from_value(json!({
            "id": 5,
            "timestamp": "2024-03-01T10:20:30.123456",
            "original_files": [{"id": 1, "filename": "a.txt", "batch_id": 5}],
            "cleaned_files_1": null
        }))
        .unwrap();

        assert_eq!(b.id, Some(5));
        assert_eq!(b.original_files.len(), 1);
        assert!(b.cleaned_files_1.is_empty());
        assert!(b.cleaned_files_2.is_empty());
        assert!(b.timestamp.is_some());
    }

    #[test]
    fn test_source_file_id_aliases() {
        let f: FileEntry = serde_json::from_value(json!({
            "id": 9, "filename": "x.json", "batch_id": 1, "cleaned_file_1_id": 4,
            "cleaned_time": "2024-03-01T10:20:30"
        }))
        .unwrap();
        assert_eq!(f.source_file_id, Some(4));
        assert!(f.processed_at().is_some());
    }

    #[test]
    fn test_sort_is_total_and_order_independent() {
        let ids = [Some(3), Some(10), None, Some(7), Some(1)];
        let mut forward: Vec<Batch> = ids.iter().map(|id| batch(*id, 0, 0)).collect();
        let mut backward: Vec<Batch> = ids.iter().rev().map(|id| batch(*id, 0, 0)).collect();

        sort_newest_first(&mut forward);
        sort_newest_first(&mut backward);

        let order = |v: &[Batch]| v.iter().map(|b| b.id).collect::<Vec<_>>();
        assert_eq!(order(&forward), vec![Some(10), Some(7), Some(3), Some(1), None]);
        assert_eq!(order(&forward), order(&backward));
    }

    #[test]
    fn test_actions_follow_stage_state() {
        let fresh = batch(Some(1), 1, 0);
        assert!(fresh.actions().run_second_cleaning);
        assert!(!fresh.actions().run_keyword_match);

        let cleaned = batch(Some(1), 1, 1);
        assert!(!cleaned.actions().run_second_cleaning);
        assert!(cleaned.actions().run_keyword_match);

        let no_stage1 = batch(Some(1), 0, 0);
        assert_eq!(no_stage1.actions(), BatchActions::default());

        let unpersisted = batch(None, 1, 0);
        assert_eq!(unpersisted.actions(), BatchActions::default());
        assert_eq!(
            unpersisted.persisted_id(),
            Err(PreconditionError::UnpersistedBatch)
        );
    }

    #[test]
    fn test_consistency() {
        assert!(batch(Some(1), 1, 1).is_consistent());
        assert!(batch(Some(1), 0, 0).is_consistent());
        assert!(!batch(Some(1), 0, 2).is_consistent());
    }

    #[test]
    fn test_structured_filename() {
        assert!(is_structured_filename("router.json"));
        assert!(is_structured_filename("ROUTER.JSON"));
        assert!(!is_structured_filename("router.txt"));
        assert!(!is_structured_filename("json"));
    }
}
