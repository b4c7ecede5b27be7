//! Provides all of MagicVoca's core functionality.

pub mod categories;
pub mod quiz;
pub mod storage;
pub mod study_log;
pub mod usage;

pub use categories::{CategoryRegistry, CategorySpec};
pub use quiz::{quiz_options, sample_options, AnswerField};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StoreError, StoreResult};
pub use study_log::StudyLog;
pub use usage::{UsageError, UsageLimiter};
