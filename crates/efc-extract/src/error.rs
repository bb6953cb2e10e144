use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("Page {url} has no text content to extract from")]
    EmptyPage { url: String },
}
