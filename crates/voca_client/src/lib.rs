//! Talks to the MagicVoca database and the services around it.

pub mod admin;
pub mod category;
pub mod comments;
pub mod config;
pub mod database;
pub mod mnemonic;
pub mod repository;

pub use self::{
    admin::{Admin, SearchField},
    category::{category_filter, CategoryFilter, Notice},
    comments::{CommentError, Comments},
    config::{Config, ConfigError},
    database::{Database, DbError, DbResult, MemoryDatabase, Query, RestDatabase},
    mnemonic::{GeminiGenerator, MnemonicError, MnemonicGenerator, Mnemonics},
    repository::{LoadPhase, MoreWords, WordRepository, BATCH_SIZE, PAGE_SIZE},
};
