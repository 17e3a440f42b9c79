pub mod batch_service;
pub mod cleaning_service;
pub mod content_service;
pub mod keyword_matcher;
pub mod keyword_service;
pub mod match_presenter;

pub use batch_service::BatchService;
pub use cleaning_service::CleaningService;
pub use content_service::{ContentService, FileContent};
pub use keyword_matcher::KeywordMatcher;
pub use keyword_service::{KeywordService, MatchRun};
pub use match_presenter::{MatchLine, MatchPresenter, MatchReport, SectionView};
