//! One best-effort extractor per target field.
//!
//! Extractors are independent of each other; each is an ordered cascade of
//! pure strategy functions that stops at the first non-empty result.
pub mod company;
pub mod description;
pub mod meta;
pub mod title;
