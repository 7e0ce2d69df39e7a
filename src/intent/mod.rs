//! Intent — utterance classification.
//!
//! Submodules:
//! - `matchers`: ordered pattern recognizers and the `IntentMatchers` set
//! - `time_parser`: Vietnamese time phrases → hour/minute, next-day rollover
//! - `types`: `Intent` and `ParsedTime`

pub mod matchers;
pub mod time_parser;
pub mod types;

pub use matchers::{IntentMatchers, MatcherKind};
pub use time_parser::{next_occurrence, TimeExpressionParser};
pub use types::{Intent, ParsedTime};
