pub mod history_service;
pub mod markdown_service;
pub mod metadata_service;

pub use history_service::{GitHistory, HistoryProvider};
pub use markdown_service::MarkdownService;
pub use metadata_service::Meta;
