//! 请求代次守卫
//!
//! 同一份视图数据可能有多个请求同时在途（例如操作后的刷新和更早的刷新）。
//! 每个请求开始时领取一个单调递增的代次，结果只在没有更新代次已经落定时才生效。

use std::fmt::Display;

/// 请求代次
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    pub fn generation(self) -> u64 {
        self.0
    }
}

/// 一次完成的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// 结果已生效
    Applied,
    /// 已有更新的请求落定，或视图已关闭，结果被丢弃
    Superseded,
    /// 请求失败，保留之前的数据
    FailedKeptPrevious,
}

/// 只保留最新请求结果的视图数据
#[derive(Debug, Clone)]
pub struct LatestOnly<T> {
    issued: u64,
    settled: u64,
    dismissed_through: u64,
    value: Option<T>,
    last_error: Option<String>,
}

impl<T> Default for LatestOnly<T> {
    fn default() -> Self {
        Self {
            issued: 0,
            settled: 0,
            dismissed_through: 0,
            value: None,
            last_error: None,
        }
    }
}

impl<T> LatestOnly<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 开始一个新请求
    pub fn begin(&mut self) -> Ticket {
        self.issued += 1;
        Ticket(self.issued)
    }

    /// 请求完成
    pub fn complete<E: Display>(&mut self, ticket: Ticket, result: Result<T, E>) -> Completion {
        if ticket.0 <= self.dismissed_through || ticket.0 < self.settled {
            return Completion::Superseded;
        }
        self.settled = ticket.0;

        match result {
            Ok(value) => {
                self.value = Some(value);
                self.last_error = None;
                Completion::Applied
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                Completion::FailedKeptPrevious
            }
        }
    }

    /// 关闭视图：清空数据，在途请求的结果不再展示（请求本身不取消）
    pub fn dismiss(&mut self) {
        self.dismissed_through = self.issued;
        self.value = None;
        self.last_error = None;
    }

    /// 清空当前数据，在途请求不受影响
    pub fn clear(&mut self) {
        self.value = None;
    }

    /// 当前展示的数据
    pub fn current(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// 最近一次失败的说明（成功后清除）
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// 最新的请求是否仍在途
    pub fn is_pending(&self) -> bool {
        self.issued > self.settled && self.issued > self.dismissed_through
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newer_response_wins_when_older_arrives_late() {
        let mut list: LatestOnly<&str> = LatestOnly::new();
        let stale = list.begin();
        let fresh = list.begin();

        assert_eq!(list.complete::<String>(fresh, Ok("fresh")), Completion::Applied);
        assert_eq!(list.complete::<String>(stale, Ok("stale")), Completion::Superseded);
        assert_eq!(list.current(), Some(&"fresh"));
        assert!(!list.is_pending());
    }

    #[test]
    fn test_older_response_applies_until_newer_settles() {
        let mut list: LatestOnly<u32> = LatestOnly::new();
        let first = list.begin();
        let second = list.begin();

        assert_eq!(list.complete::<String>(first, Ok(1)), Completion::Applied);
        assert!(list.is_pending());
        assert_eq!(list.complete::<String>(second, Ok(2)), Completion::Applied);
        assert_eq!(list.current(), Some(&2));
    }

    #[test]
    fn test_failure_keeps_previous_value() {
        let mut list: LatestOnly<Vec<u32>> = LatestOnly::new();
        let ok = list.begin();
        list.complete::<String>(ok, Ok(vec![1, 2]));

        let failing = list.begin();
        assert_eq!(
            list.complete(failing, Err("HTTP 500")),
            Completion::FailedKeptPrevious
        );
        assert_eq!(list.current(), Some(&vec![1, 2]));
        assert_eq!(list.last_error(), Some("HTTP 500"));

        let retry = list.begin();
        list.complete::<String>(retry, Ok(vec![3]));
        assert_eq!(list.last_error(), None);
    }

    #[test]
    fn test_clear_keeps_newer_requests_alive() {
        let mut view: LatestOnly<&str> = LatestOnly::new();
        let first = view.begin();
        view.complete::<String>(first, Ok("a"));

        let failing = view.begin();
        let newer = view.begin();
        view.complete(failing, Err("HTTP 404"));
        view.clear();
        assert!(view.current().is_none());
        assert_eq!(view.last_error(), Some("HTTP 404"));

        assert_eq!(view.complete::<String>(newer, Ok("c")), Completion::Applied);
        assert_eq!(view.current(), Some(&"c"));
    }

    #[test]
    fn test_dismiss_discards_in_flight_results() {
        let mut view: LatestOnly<String> = LatestOnly::new();
        let in_flight = view.begin();
        view.dismiss();

        assert!(!view.is_pending());
        assert_eq!(
            view.complete::<String>(in_flight, Ok("late".to_string())),
            Completion::Superseded
        );
        assert!(view.current().is_none());

        let reopened = view.begin();
        assert_eq!(
            view.complete::<String>(reopened, Ok("shown".to_string())),
            Completion::Applied
        );
    }
}
