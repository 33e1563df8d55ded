//! Field parsers for raw display text
//!
//! Forum listings render scores and post ages as human-oriented text
//! ("2.3k", "5 minutes ago"). These parsers turn that text into typed values
//! and never fail: unrecognized input degrades to a default or to `None`.

mod age;
mod score;

pub use age::{parse_age, parse_age_now};
pub use score::parse_score;
