//! 本地关键词扫描 - 业务能力层
//!
//! 与后端相同的匹配规则，用于在本地预览二次清洗后的 JSON 文件：
//! - 忽略大小写，必须是完整单词（前后字符不能是字母、数字或下划线）
//! - 顶层每个键（`vendor` 除外）是一个章节
//! - 字符串按行切分，数组每个非空元素一行，对象格式化后按行切分

use crate::models::{Match, MatchData};
use indexmap::IndexMap;
use regex::{Regex, RegexBuilder};
use serde_json::Value;
use std::cmp::Reverse;

const VENDOR_KEY: &str = "vendor";
const UNKNOWN_VENDOR: &str = "unknown";

/// 关键词匹配器
pub struct KeywordMatcher {
    /// (原始关键词, 忽略大小写的模式)
    patterns: Vec<(String, Regex)>,
}

impl KeywordMatcher {
    /// 构建匹配器
    ///
    /// 空白关键词被忽略；只有大小写不同的关键词合并为一个，保留最后出现的写法。
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut by_lower: IndexMap<String, String> = IndexMap::new();
        for keyword in keywords {
            let keyword = keyword.as_ref();
            if keyword.trim().is_empty() {
                continue;
            }
            by_lower.insert(keyword.to_lowercase(), keyword.to_string());
        }

        let patterns = by_lower
            .into_values()
            .filter_map(|original| {
                RegexBuilder::new(&regex::escape(&original))
                    .case_insensitive(true)
                    .build()
                    .ok()
                    .map(|re| (original, re))
            })
            .collect();

        Self { patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// 在多行文本中查找关键词，行号从 1 开始
    pub fn search_in_lines<'a>(&self, lines: impl IntoIterator<Item = &'a str>) -> Vec<Match> {
        let mut matches = Vec::new();
        for (index, line) in lines.into_iter().enumerate() {
            let mut hits: Vec<(usize, usize, &str)> = Vec::new();
            for (keyword, pattern) in &self.patterns {
                for (start, end) in find_overlapping(pattern, line) {
                    if is_full_word(line, start, end) {
                        hits.push((start, end, keyword.as_str()));
                    }
                }
            }
            // 按命中结束位置排序，结束位置相同时较长的在前
            hits.sort_by_key(|&(start, end, _)| (end, Reverse(end - start)));

            matches.extend(hits.into_iter().map(|(_, _, keyword)| Match {
                line: index + 1,
                keyword: keyword.to_string(),
                content: line.trim().to_string(),
            }));
        }
        matches
    }

    /// 扫描二次清洗后的配置数据
    pub fn search_config_data(&self, config_data: &Value) -> MatchData {
        // 缺少 vendor 时为 "unknown"；显式的 null 保持为空
        let vendor = match config_data.get(VENDOR_KEY) {
            None => Some(UNKNOWN_VENDOR.to_string()),
            Some(Value::Null) => None,
            Some(Value::String(v)) => Some(v.clone()),
            Some(other) => Some(other.to_string()),
        };

        let mut sections = IndexMap::new();
        if let Value::Object(map) = config_data {
            for (section, value) in map {
                if section == VENDOR_KEY {
                    continue;
                }
                let Some(text) = section_text(value) else {
                    continue;
                };
                let section_matches = self.search_in_lines(text.lines());
                if !section_matches.is_empty() {
                    sections.insert(section.clone(), section_matches);
                }
            }
        }

        MatchData {
            vendor,
            matches: sections,
            error: None,
        }
    }
}

/// 把一个章节的值转换为待扫描的文本，标量值不参与扫描
fn section_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.trim().to_string(),
                    other => other.to_string().trim().to_string(),
                })
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        Value::Object(_) => serde_json::to_string_pretty(value).ok(),
        _ => None,
    }
}

/// 查找所有（可重叠的）命中位置
fn find_overlapping(pattern: &Regex, line: &str) -> Vec<(usize, usize)> {
    let mut found = Vec::new();
    let mut from = 0;
    while from <= line.len() {
        let Some(m) = pattern.find_at(line, from) else {
            break;
        };
        if m.start() == m.end() {
            break;
        }
        found.push((m.start(), m.end()));
        // 从下一个字符边界继续
        from = m.start() + line[m.start()..].chars().next().map_or(1, char::len_utf8);
    }
    found
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

fn is_full_word(line: &str, start: usize, end: usize) -> bool {
    let start_ok = line[..start].chars().next_back().map_or(true, |c| !is_word_char(c));
    let end_ok = line[end..].chars().next().map_or(true, |c| !is_word_char(c));
    start_ok && end_ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_whole_word_case_insensitive() {
        let matcher = KeywordMatcher::new(["SNMP", "pass"]);
        let hits = matcher.search_in_lines(["  snmp-agent community", "password 123", "my_snmp", "Pass"]);

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].line, 1);
        assert_eq!(hits[0].keyword, "SNMP");
        assert_eq!(hits[0].content, "snmp-agent community");
        assert_eq!(hits[1].line, 4);
        assert_eq!(hits[1].keyword, "pass");
    }

    #[test]
    fn test_hits_ordered_by_position_within_line() {
        let matcher = KeywordMatcher::new(["ssh", "telnet"]);
        let hits = matcher.search_in_lines(["telnet then ssh then telnet"]);
        let keywords: Vec<&str> = hits.iter().map(|m| m.keyword.as_str()).collect();
        assert_eq!(keywords, vec!["telnet", "ssh", "telnet"]);
    }

    #[test]
    fn test_case_variants_are_merged() {
        let matcher = KeywordMatcher::new(["ssh", "", "SSH", "  "]);
        let hits = matcher.search_in_lines(["ssh server"]);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].keyword, "SSH");
    }

    #[test]
    fn test_overlapping_occurrences() {
        let matcher = KeywordMatcher::new(["a-a"]);
        let hits = matcher.search_in_lines(["a-a-a"]);
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_search_config_data_sections() {
        let matcher = KeywordMatcher::new(["password", "ntp"]);
        let data = json!({
            "vendor": "huawei",
            "users": "local-user admin\n password cipher xxx",
            "services": ["  ntp server 1.1.1.1 ", "", "dns"],
            "nested": {"auth": "password"},
            "count": 3,
            "empty": "nothing here"
        });

        let result = matcher.search_config_data(&data);
        assert_eq!(result.vendor.as_deref(), Some("huawei"));

        let names: Vec<&str> = result.matches.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["users", "services", "nested"]);

        let users = &result.matches["users"];
        assert_eq!(users[0].line, 2);
        assert_eq!(users[0].content, "password cipher xxx");

        let services = &result.matches["services"];
        assert_eq!(services[0].line, 1);
        assert_eq!(services[0].content, "ntp server 1.1.1.1");

        // 对象按两空格缩进格式化，第二行是 "auth" 键
        assert_eq!(result.matches["nested"][0].line, 2);
    }

    #[test]
    fn test_missing_vendor_is_unknown() {
        let matcher = KeywordMatcher::new(["x"]);
        let result = matcher.search_config_data(&json!({"a": "y"}));
        assert_eq!(result.vendor.as_deref(), Some("unknown"));
        assert!(result.matches.is_empty());
    }

    #[test]
    fn test_explicit_null_vendor_stays_null() {
        let matcher = KeywordMatcher::new(["x"]);
        let result = matcher.search_config_data(&json!({"vendor": null, "a": "x"}));
        assert_eq!(result.vendor, None);
        assert_eq!(result.matches["a"].len(), 1);
    }
}
