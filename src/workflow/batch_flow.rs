//! 批次处理流程 - 流程层
//!
//! 每个批次一个状态机：
//!
//! ```text
//! NoStage2 ──(二次清洗完成)──> ReadyToMatch ──(请求匹配)──> Matching
//!                                   ^                         │
//!                                   │                  成功 / 失败
//!                                 Retry                       v
//!                              MatchFailed <──────── Matched / MatchFailed
//! ```
//!
//! `reduce` 是纯函数：(状态, 事件) -> (新状态, 副作用)。副作用由编排层执行，
//! 执行结果再作为事件送回。

use crate::error::{AppError, PreconditionError};
use crate::models::Batch;

/// 关键词匹配状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchState {
    /// 还没有二次清洗文件
    NoStage2,
    /// 可以执行关键词检查
    ReadyToMatch,
    /// 匹配请求在途
    Matching { keyword_set_id: i64 },
    /// 已有匹配结果
    Matched { keyword_set_id: i64 },
    /// 匹配失败，需要重试
    MatchFailed { reason: String },
}

/// 单个批次的流程状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFlow {
    pub batch_id: i64,
    /// 初次清洗文件数
    pub cleaned_1: usize,
    /// 二次清洗文件数
    pub cleaned_2: usize,
    /// 二次清洗请求在途
    pub cleaning: bool,
    pub matching: MatchState,
}

impl BatchFlow {
    pub fn new(batch_id: i64) -> Self {
        Self {
            batch_id,
            cleaned_1: 0,
            cleaned_2: 0,
            cleaning: false,
            matching: MatchState::NoStage2,
        }
    }

    /// 从已持久化的批次构建初始状态
    pub fn from_batch(batch: &Batch) -> Option<Self> {
        let batch_id = batch.id?;
        let (flow, _) = reduce(&Self::new(batch_id), FlowEvent::observed(batch));
        Some(flow)
    }

    /// 是否提供"执行二次清洗"操作
    pub fn can_run_second_cleaning(&self) -> bool {
        !self.cleaning && self.cleaned_1 > 0 && self.cleaned_2 == 0
    }

    /// 是否提供"执行关键词检查"操作
    pub fn can_run_keyword_match(&self) -> bool {
        matches!(
            self.matching,
            MatchState::ReadyToMatch | MatchState::Matched { .. }
        )
    }
}

/// 流程事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowEvent {
    /// 获取到最新的批次数据
    BatchObserved { cleaned_1: usize, cleaned_2: usize },
    /// 用户请求二次清洗
    CleanRequested,
    CleanSucceeded { cleaned_2: usize },
    CleanFailed { reason: String },
    /// 用户选择关键词组并请求匹配
    MatchRequested {
        keyword_set_id: i64,
        keyword_sets_available: usize,
    },
    MatchSucceeded { results: usize },
    MatchFailed { reason: String },
    /// 匹配失败后重新进入可匹配状态
    Retry,
}

impl FlowEvent {
    pub fn observed(batch: &Batch) -> Self {
        FlowEvent::BatchObserved {
            cleaned_1: batch.cleaned_files_1.len(),
            cleaned_2: batch.cleaned_files_2.len(),
        }
    }
}

/// 提示级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// 用户可见的提示
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    /// 根据错误类别选择级别
    pub fn from_error(err: &AppError) -> Self {
        if err.is_user_correctable() || err.is_absence() {
            Self::warning(err.to_string())
        } else {
            Self::error(err.to_string())
        }
    }
}

/// 副作用（由编排层执行）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    RunSecondCleaning { batch_id: i64 },
    RunKeywordMatch { batch_id: i64, keyword_set_id: i64 },
    RefreshBatches,
    Notify(Notice),
}

fn reject(flow: &BatchFlow, err: impl Into<AppError>) -> (BatchFlow, Vec<Effect>) {
    let err = err.into();
    (flow.clone(), vec![Effect::Notify(Notice::from_error(&err))])
}

/// 状态转移
pub fn reduce(flow: &BatchFlow, event: FlowEvent) -> (BatchFlow, Vec<Effect>) {
    let batch_id = flow.batch_id;
    let mut next = flow.clone();

    match event {
        FlowEvent::BatchObserved {
            cleaned_1,
            cleaned_2,
        } => {
            next.cleaned_1 = cleaned_1;
            next.cleaned_2 = cleaned_2;
            next.matching = match (&flow.matching, cleaned_2) {
                (MatchState::Matching { .. }, _) => flow.matching.clone(),
                (_, 0) => MatchState::NoStage2,
                (MatchState::NoStage2, _) => MatchState::ReadyToMatch,
                (other, _) => other.clone(),
            };
            (next, Vec::new())
        }

        FlowEvent::CleanRequested => {
            if flow.cleaning {
                return reject(
                    flow,
                    PreconditionError::AlreadyRunning {
                        batch_id,
                        action: "二次清洗",
                    },
                );
            }
            if flow.cleaned_1 == 0 {
                return reject(flow, PreconditionError::Stage1Missing { batch_id });
            }
            if flow.cleaned_2 > 0 {
                return reject(flow, PreconditionError::Stage2AlreadyPresent { batch_id });
            }
            next.cleaning = true;
            (next, vec![Effect::RunSecondCleaning { batch_id }])
        }

        FlowEvent::CleanSucceeded { cleaned_2 } => {
            next.cleaning = false;
            next.cleaned_2 = cleaned_2;
            if cleaned_2 > 0 && next.matching == MatchState::NoStage2 {
                next.matching = MatchState::ReadyToMatch;
            }
            (
                next,
                vec![
                    Effect::Notify(Notice::info(format!("批次 {} 二次清洗已完成", batch_id))),
                    Effect::RefreshBatches,
                ],
            )
        }

        FlowEvent::CleanFailed { reason } => {
            next.cleaning = false;
            (next, vec![Effect::Notify(Notice::error(reason))])
        }

        FlowEvent::MatchRequested {
            keyword_set_id,
            keyword_sets_available,
        } => match &flow.matching {
            MatchState::NoStage2 => reject(flow, AppError::EmptyBatch { batch_id }),
            MatchState::Matching { .. } => reject(
                flow,
                PreconditionError::AlreadyRunning {
                    batch_id,
                    action: "关键词检查",
                },
            ),
            MatchState::MatchFailed { .. } => {
                reject(flow, PreconditionError::RetryRequired { batch_id })
            }
            MatchState::ReadyToMatch | MatchState::Matched { .. } => {
                if keyword_sets_available == 0 {
                    return reject(flow, AppError::NoKeywordSets);
                }
                next.matching = MatchState::Matching { keyword_set_id };
                (
                    next,
                    vec![Effect::RunKeywordMatch {
                        batch_id,
                        keyword_set_id,
                    }],
                )
            }
        },

        FlowEvent::MatchSucceeded { results } => match flow.matching {
            MatchState::Matching { keyword_set_id } => {
                next.matching = MatchState::Matched { keyword_set_id };
                (
                    next,
                    vec![
                        Effect::Notify(Notice::info(format!(
                            "批次 {} 关键词检查已完成 ({} 条结果)",
                            batch_id, results
                        ))),
                        Effect::RefreshBatches,
                    ],
                )
            }
            _ => (next, Vec::new()),
        },

        FlowEvent::MatchFailed { reason } => match flow.matching {
            MatchState::Matching { .. } => {
                next.matching = MatchState::MatchFailed {
                    reason: reason.clone(),
                };
                (next, vec![Effect::Notify(Notice::error(reason))])
            }
            _ => (next, Vec::new()),
        },

        FlowEvent::Retry => {
            if let MatchState::MatchFailed { .. } = flow.matching {
                next.matching = if flow.cleaned_2 > 0 {
                    MatchState::ReadyToMatch
                } else {
                    MatchState::NoStage2
                };
            }
            (next, Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observed(cleaned_1: usize, cleaned_2: usize) -> BatchFlow {
        reduce(
            &BatchFlow::new(7),
            FlowEvent::BatchObserved {
                cleaned_1,
                cleaned_2,
            },
        )
        .0
    }

    fn notices(effects: &[Effect]) -> Vec<&Notice> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Notify(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_stage2_cleaning_offered_then_withdrawn() {
        let flow = observed(1, 0);
        assert!(flow.can_run_second_cleaning());
        assert_eq!(flow.matching, MatchState::NoStage2);

        let (flow, effects) = reduce(&flow, FlowEvent::CleanRequested);
        assert!(flow.cleaning);
        assert!(!flow.can_run_second_cleaning());
        assert_eq!(effects, vec![Effect::RunSecondCleaning { batch_id: 7 }]);

        let (flow, effects) = reduce(&flow, FlowEvent::CleanSucceeded { cleaned_2: 1 });
        assert!(!flow.cleaning);
        assert!(!flow.can_run_second_cleaning());
        assert_eq!(flow.matching, MatchState::ReadyToMatch);
        assert!(effects.contains(&Effect::RefreshBatches));
    }

    #[test]
    fn test_clean_rejected_without_stage1_or_when_done() {
        let (flow, effects) = reduce(&observed(0, 0), FlowEvent::CleanRequested);
        assert!(!flow.cleaning);
        assert_eq!(notices(&effects)[0].level, NoticeLevel::Warning);

        let (flow, effects) = reduce(&observed(1, 1), FlowEvent::CleanRequested);
        assert!(!flow.cleaning);
        assert!(!effects.iter().any(|e| matches!(e, Effect::RunSecondCleaning { .. })));
    }

    #[test]
    fn test_clean_failure_is_retryable() {
        let (flow, _) = reduce(&observed(1, 0), FlowEvent::CleanRequested);
        let (flow, effects) = reduce(
            &flow,
            FlowEvent::CleanFailed {
                reason: "HTTP 500".to_string(),
            },
        );
        assert_eq!(notices(&effects)[0].level, NoticeLevel::Error);
        assert!(flow.can_run_second_cleaning());
    }

    #[test]
    fn test_match_rejected_on_empty_stage2_and_no_sets() {
        let (flow, effects) = reduce(
            &observed(1, 0),
            FlowEvent::MatchRequested {
                keyword_set_id: 3,
                keyword_sets_available: 2,
            },
        );
        assert_eq!(flow.matching, MatchState::NoStage2);
        assert!(notices(&effects)[0].message.contains("没有二次清洗文件"));

        let (flow, effects) = reduce(
            &observed(1, 2),
            FlowEvent::MatchRequested {
                keyword_set_id: 3,
                keyword_sets_available: 0,
            },
        );
        assert_eq!(flow.matching, MatchState::ReadyToMatch);
        assert!(notices(&effects)[0].message.contains("没有可用的关键词组"));
    }

    #[test]
    fn test_match_lifecycle() {
        let flow = observed(1, 2);
        let (flow, effects) = reduce(
            &flow,
            FlowEvent::MatchRequested {
                keyword_set_id: 3,
                keyword_sets_available: 1,
            },
        );
        assert_eq!(flow.matching, MatchState::Matching { keyword_set_id: 3 });
        assert_eq!(
            effects,
            vec![Effect::RunKeywordMatch {
                batch_id: 7,
                keyword_set_id: 3
            }]
        );

        // 刷新不会打断在途的匹配
        let (flow, _) = reduce(&flow, FlowEvent::BatchObserved { cleaned_1: 1, cleaned_2: 2 });
        assert_eq!(flow.matching, MatchState::Matching { keyword_set_id: 3 });

        let (flow, effects) = reduce(&flow, FlowEvent::MatchSucceeded { results: 2 });
        assert_eq!(flow.matching, MatchState::Matched { keyword_set_id: 3 });
        assert!(effects.contains(&Effect::RefreshBatches));
        assert!(flow.can_run_keyword_match());
    }

    #[test]
    fn test_failed_match_requires_retry() {
        let (flow, _) = reduce(
            &observed(1, 2),
            FlowEvent::MatchRequested {
                keyword_set_id: 3,
                keyword_sets_available: 1,
            },
        );
        let (flow, _) = reduce(
            &flow,
            FlowEvent::MatchFailed {
                reason: "HTTP 400".to_string(),
            },
        );
        assert!(matches!(flow.matching, MatchState::MatchFailed { .. }));

        let request = FlowEvent::MatchRequested {
            keyword_set_id: 3,
            keyword_sets_available: 1,
        };
        let (blocked, effects) = reduce(&flow, request.clone());
        assert!(matches!(blocked.matching, MatchState::MatchFailed { .. }));
        assert!(!effects.iter().any(|e| matches!(e, Effect::RunKeywordMatch { .. })));

        let (flow, _) = reduce(&flow, FlowEvent::Retry);
        assert_eq!(flow.matching, MatchState::ReadyToMatch);
        let (flow, _) = reduce(&flow, request);
        assert_eq!(flow.matching, MatchState::Matching { keyword_set_id: 3 });
    }

    #[test]
    fn test_stray_completions_are_ignored() {
        let flow = observed(1, 2);
        let (after, effects) = reduce(&flow, FlowEvent::MatchSucceeded { results: 1 });
        assert_eq!(after, flow);
        assert!(effects.is_empty());
    }
}
