pub mod batch_flow;
pub mod latest;

pub use batch_flow::{reduce, BatchFlow, Effect, FlowEvent, MatchState, Notice, NoticeLevel};
pub use latest::{Completion, LatestOnly, Ticket};
