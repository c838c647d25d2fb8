//! Turns free-form LLM completions into structured records.
//!
//! Every parser here is total: malformed completions degrade to best-effort
//! extraction or a fixed fallback record, never to an error.

pub mod context;
pub mod idea;
pub mod model;
pub mod suggestion;

pub use context::{parse_startup_context, StartupContext};
pub use idea::parse_idea_list;
pub use model::{StartupIdea, SuggestionResult};
pub use suggestion::parse_suggestion;
