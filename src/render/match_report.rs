//! 匹配报告输出
//!
//! `to_text` 用于终端，`to_markup` 生成 HTML 片段（章节名和关键词在此处转义，内容已在分组时转义）。

use super::escape_html;
use crate::services::MatchReport;
use std::fmt::Write;

const NO_MATCHES: &str = "没有找到匹配的关键词";

fn keyword_set_label(report: &MatchReport) -> String {
    match &report.keyword_set_name {
        Some(name) => format!("{} (#{})", name, report.keyword_set_id),
        None => format!("#{}", report.keyword_set_id),
    }
}

fn created_at_label(report: &MatchReport) -> String {
    report
        .created_at
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "未知".to_string())
}

/// 纯文本报告
pub fn to_text(report: &MatchReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "文件 #{} | 关键词组: {} | 匹配时间: {} | 设备厂商: {}",
        report.file_id,
        keyword_set_label(report),
        created_at_label(report),
        report.vendor_or_unknown()
    );
    if let Some(error) = &report.error {
        let _ = writeln!(out, "⚠️ {}", error);
    }

    if report.sections.is_empty() {
        let _ = writeln!(out, "{}", NO_MATCHES);
        return out;
    }

    for section in &report.sections {
        let _ = writeln!(out, "\n[{}] ({} 处)", section.name, section.entries.len());
        for entry in &section.entries {
            let _ = writeln!(
                out,
                "  第 {:>4} 行 | {:<16} | {}",
                entry.line, entry.keyword, entry.raw_content
            );
        }
    }
    out
}

/// HTML 报告
pub fn to_markup(report: &MatchReport) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "<div class=\"match-header\">匹配时间: {} | 设备厂商: {} | 关键词组: {}</div>",
        escape_html(&created_at_label(report)),
        escape_html(report.vendor_or_unknown()),
        escape_html(&keyword_set_label(report))
    );

    if report.sections.is_empty() {
        let _ = write!(out, "<p class=\"match-empty\">{}</p>", NO_MATCHES);
        return out;
    }

    for section in &report.sections {
        let _ = write!(
            out,
            "<section class=\"match-section\"><h4>{}</h4><ul>",
            escape_html(&section.name)
        );
        for entry in &section.entries {
            let _ = write!(
                out,
                "<li><span class=\"match-line\">第 {} 行</span> <span class=\"match-keyword\">{}</span> <code>{}</code></li>",
                entry.line,
                escape_html(&entry.keyword),
                entry.content
            );
        }
        out.push_str("</ul></section>");
    }
    out
}
