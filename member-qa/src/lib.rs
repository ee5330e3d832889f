//! Member Q&A: dataset loading, name extraction, context selection, prompt
//! composition and answer caching around a completion backend.

pub mod cache;
pub mod cfg;
pub mod engine;
pub mod error;
pub mod filter;
pub mod names;
pub mod prompt;
pub mod store;

pub use cache::{AnswerCache, Clock, SystemClock};
pub use cfg::QaConfig;
pub use engine::QaEngine;
pub use error::{ConfigError, QaError, StoreError};
pub use filter::{ContextBundle, FilterOptions};
pub use store::{DatasetStats, MessageRecord, MessageSource, MessageStore};
