//! External collaborators
//!
//! Receipt extraction and ingredient-name matching are delegated to
//! OpenAI-compatible services behind traits, so the purchase intake flow is
//! testable without network access.

pub mod extraction;
pub mod matching;

pub use extraction::{OpenAiExtractor, ReceiptExtractor};
pub use matching::{MatchOutcome, NameMatcher, OpenAiMatcher};
