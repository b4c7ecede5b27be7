//! Loads the words of a category: one page right away, the rest in the background.
//!
//! [`WordRepository::load`] fetches the first [`PAGE_SIZE`] words and, if the category has more,
//! spawns a task that fetches everything after them in [`BATCH_SIZE`] batches into a shared
//! buffer. [`WordRepository::load_more`] then exposes the buffered words a page at a time without
//! touching the database.
//!
//! Every load bumps a generation counter. The background task carries the generation it was
//! started for and only commits its results if the buffer still belongs to that generation, so a
//! task that outlives its load can never leak words into a newer one. Superseded tasks are also
//! aborted.

use crate::{
    category::{category_filter, Notice, ResolveError, ResolvedCategory},
    database::{fetch, Database, DbError, DbResult, Query},
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use voca::CategoryRegistry;
use voca_api::response as res;
use voca_core::{category_key, Word};

/// Words loaded by [`WordRepository::load`] and handed out by each [`WordRepository::load_more`].
pub const PAGE_SIZE: usize = 50;
/// Words fetched per request by the background task.
pub const BATCH_SIZE: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Idle,
    FirstPageLoading,
    BackgroundLoading,
    Complete,
    Failed,
}

/// The outcome of [`WordRepository::load_more`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoreWords {
    /// This many words were appended.
    Appended(usize),
    /// The background fetch has not finished, nothing was appended.
    Pending,
    /// Every word of the category is already visible.
    Exhausted,
}

#[derive(Debug, Default)]
struct BackgroundBuffer {
    generation: u64,
    words: Vec<Word>,
    complete: bool,
}

impl BackgroundBuffer {
    fn reset(&mut self, generation: u64) {
        self.generation = generation;
        self.words.clear();
        self.complete = false;
    }

    /// Stores `words` if the buffer still belongs to `generation`.
    fn commit(&mut self, generation: u64, words: Vec<Word>) -> bool {
        if generation != self.generation {
            return false;
        }
        self.words = words;
        self.complete = true;
        true
    }
}

fn lock(buffer: &Mutex<BackgroundBuffer>) -> MutexGuard<'_, BackgroundBuffer> {
    buffer.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Fetches `limit` words starting at `offset`, ordered by id.
pub(crate) async fn fetch_words(
    db: &dyn Database,
    query: &Query,
    joined_tag: Option<&str>,
    offset: usize,
    limit: usize,
) -> DbResult<Vec<Word>> {
    let query = query
        .clone()
        .order("id", true)
        .range(offset, offset + limit - 1);
    let rows = fetch::<res::WordRow>(db, &query).await?;
    Ok(rows
        .into_iter()
        .map(|row| row.into_word(joined_tag))
        .collect())
}

/// Fetches every word from `offset` on in [`BATCH_SIZE`] batches.
///
/// Stops at the first failed batch, returning what was fetched so far along with the error.
pub(crate) async fn fetch_remaining(
    db: &dyn Database,
    query: &Query,
    joined_tag: Option<&str>,
    mut offset: usize,
) -> (Vec<Word>, Option<DbError>) {
    let mut words = Vec::new();
    loop {
        match fetch_words(db, query, joined_tag, offset, BATCH_SIZE).await {
            Ok(batch) => {
                let fetched = batch.len();
                tracing::debug!("Fetched {fetched} words at offset {offset}");
                words.extend(batch);
                offset += fetched;
                if fetched < BATCH_SIZE {
                    return (words, None);
                }
            }
            Err(err) => return (words, Some(err)),
        }
    }
}

pub struct WordRepository {
    db: Arc<dyn Database>,
    registry: CategoryRegistry,
    category: Option<String>,
    words: Vec<Word>,
    phase: LoadPhase,
    has_more: bool,
    error: Option<String>,
    notice: Option<Notice>,
    expected_total: usize,
    /// Buffered words already moved into `words`.
    cursor: usize,
    generation: u64,
    background: Arc<Mutex<BackgroundBuffer>>,
    task: Option<JoinHandle<()>>,
}

impl WordRepository {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self::with_registry(db, CategoryRegistry::standard())
    }

    pub fn with_registry(db: Arc<dyn Database>, registry: CategoryRegistry) -> Self {
        Self {
            db,
            registry,
            category: None,
            words: Vec::new(),
            phase: LoadPhase::Idle,
            has_more: false,
            error: None,
            notice: None,
            expected_total: 0,
            cursor: 0,
            generation: 0,
            background: Arc::new(Mutex::new(BackgroundBuffer::default())),
            task: None,
        }
    }

    /// Replaces the visible words with the first page of `category`, or of every word if `None`.
    ///
    /// Any background fetch of an earlier load is cancelled. Must be called within a tokio
    /// runtime.
    pub async fn load(&mut self, category: Option<&str>) {
        self.generation += 1;
        if let Some(task) = self.task.take() {
            task.abort();
        }
        lock(&self.background).reset(self.generation);
        self.category = category.map(category_key).filter(|key| !key.is_empty());
        self.words.clear();
        self.has_more = false;
        self.error = None;
        self.notice = None;
        self.expected_total = 0;
        self.cursor = 0;
        self.phase = LoadPhase::FirstPageLoading;

        let label = self.category.as_deref().unwrap_or("all words").to_string();
        tracing::info!("Loading {label}");

        let filter = category_filter(&self.registry, self.category.as_deref());
        let resolved = match filter.resolve(&*self.db).await {
            Ok(resolved) => resolved,
            Err(ResolveError::Notice(notice)) => {
                tracing::info!("Nothing to load for {label}: {notice}");
                self.finish(notice);
                return;
            }
            Err(ResolveError::Database(err)) => {
                self.fail(err);
                return;
            }
        };

        let total = match self.db.count(&resolved.count).await {
            Ok(total) => Some(total as usize),
            Err(err) => {
                tracing::warn!("Failed to count {label}, falling back to the first page: {err}");
                None
            }
        };
        if total == Some(0) {
            self.finish(Notice::Empty);
            return;
        }

        let first = match fetch_words(
            &*self.db,
            &resolved.words,
            resolved.joined_tag.as_deref(),
            0,
            PAGE_SIZE,
        )
        .await
        {
            Ok(first) => first,
            Err(err) => {
                self.fail(err);
                return;
            }
        };

        self.expected_total = total.unwrap_or(first.len());
        self.has_more = self.expected_total > PAGE_SIZE && first.len() == PAGE_SIZE;
        tracing::info!(
            "Loaded {} of {} words for {label}",
            first.len(),
            self.expected_total
        );
        self.words = first;

        if self.has_more {
            self.phase = LoadPhase::BackgroundLoading;
            self.spawn_background(resolved, label);
        } else {
            lock(&self.background).commit(self.generation, Vec::new());
            self.phase = LoadPhase::Complete;
        }
    }

    fn spawn_background(&mut self, resolved: ResolvedCategory, label: String) {
        let db = Arc::clone(&self.db);
        let buffer = Arc::clone(&self.background);
        let generation = self.generation;
        self.task = Some(tokio::spawn(async move {
            let (words, err) = fetch_remaining(
                &*db,
                &resolved.words,
                resolved.joined_tag.as_deref(),
                PAGE_SIZE,
            )
            .await;
            if let Some(err) = err {
                tracing::error!(
                    "Background loading of {label} stopped after {} words: {err}",
                    words.len()
                );
            }
            let fetched = words.len();
            if lock(&buffer).commit(generation, words) {
                tracing::info!("Buffered {fetched} more words for {label}");
            } else {
                tracing::debug!("Discarding {fetched} words of a superseded load of {label}");
            }
        }));
    }

    fn finish(&mut self, notice: Notice) {
        lock(&self.background).commit(self.generation, Vec::new());
        self.notice = Some(notice);
        self.phase = LoadPhase::Complete;
    }

    fn fail(&mut self, err: DbError) {
        tracing::error!("Failed to load words: {err}");
        self.error = Some(err.to_string());
        self.phase = LoadPhase::Failed;
    }

    /// Appends the next page of buffered words.
    pub fn load_more(&mut self) -> MoreWords {
        if !self.has_more {
            return MoreWords::Exhausted;
        }
        let buffer = lock(&self.background);
        if buffer.generation != self.generation || !buffer.complete {
            return MoreWords::Pending;
        }
        let next = buffer
            .words
            .iter()
            .skip(self.cursor)
            .take(PAGE_SIZE)
            .cloned()
            .collect::<Vec<_>>();
        let buffered = buffer.words.len();
        drop(buffer);

        self.cursor += next.len();
        if self.cursor >= buffered {
            self.has_more = false;
        }
        if next.is_empty() {
            return MoreWords::Exhausted;
        }
        let appended = next.len();
        self.words.extend(next);
        tracing::debug!("Appended {appended} words, {} visible", self.words.len());
        MoreWords::Appended(appended)
    }

    /// Waits until the background fetch of the current load has finished.
    pub async fn wait_for_background(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                if !err.is_cancelled() {
                    tracing::error!("Background loading task failed: {err}");
                }
            }
        }
    }

    /// The normalised key of the current category, `None` when showing every word.
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// The visible words, ordered by id.
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn phase(&self) -> LoadPhase {
        if self.phase == LoadPhase::BackgroundLoading && self.background_ready() {
            LoadPhase::Complete
        } else {
            self.phase
        }
    }

    /// True while the first page is loading.
    pub fn loading(&self) -> bool {
        self.phase == LoadPhase::FirstPageLoading
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// What the user should be shown instead of words, if anything.
    pub fn message(&self) -> Option<String> {
        self.error
            .clone()
            .or_else(|| self.notice.as_ref().map(Notice::to_string))
    }

    /// The word count reported by the database, or the first page size if counting failed.
    pub fn expected_total(&self) -> usize {
        self.expected_total
    }

    /// Visible words plus buffered words not yet appended.
    pub fn total_words(&self) -> usize {
        let buffer = lock(&self.background);
        if buffer.generation == self.generation && buffer.complete {
            self.words.len() + buffer.words.len().saturating_sub(self.cursor)
        } else {
            self.words.len()
        }
    }

    fn background_ready(&self) -> bool {
        let buffer = lock(&self.background);
        buffer.generation == self.generation && buffer.complete
    }
}

impl Drop for WordRepository {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
