pub mod batch;
pub mod keyword;
pub mod match_result;
pub mod stage;

pub use batch::{is_structured_filename, sort_newest_first, Batch, BatchActions, FileEntry};
pub use keyword::{KeywordSet, KeywordSetCreate};
pub use match_result::{KeywordMatchRequest, Match, MatchData, MatchResult};
pub use stage::Stage;
