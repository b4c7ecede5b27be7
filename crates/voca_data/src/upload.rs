//! Batched uploads into the database.

use thiserror::Error;
use voca_api::{request as req, response as res, tables};
use voca_client::database::{fetch_one, insert_rows, Database, DbError, Query};

/// Words inserted per request, each batch followed by its `word_categories` rows.
pub const WORD_BATCH_SIZE: usize = 100;
pub const HANJA_BATCH_SIZE: usize = 1000;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("The {0} category does not exist")]
    CategoryNotFound(String),
    #[error(transparent)]
    Database(#[from] DbError),
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct UploadReport {
    /// Words inserted together with their category rows.
    pub inserted: usize,
    /// One-based numbers of the batches that failed.
    pub failed_batches: Vec<usize>,
}

/// Looks up the id of the category called `name`.
pub async fn category_id(db: &dyn Database, name: &str) -> Result<i32, UploadError> {
    let query = Query::table(tables::CATEGORIES)
        .select(&["id", "name"])
        .eq("name", name);
    match fetch_one::<res::Category>(db, &query).await? {
        Some(category) => Ok(category.id),
        None => Err(UploadError::CategoryNotFound(name.to_string())),
    }
}

/// Inserts `words` and links each one to the category called `category`.
///
/// A failed batch is logged and skipped, the remaining batches are still uploaded.
pub async fn upload_words(
    db: &dyn Database,
    category: &str,
    words: &[req::NewWord<'_>],
) -> Result<UploadReport, UploadError> {
    let category_id = category_id(db, category).await?;
    tracing::info!("{category} category id: {category_id}");

    let mut report = UploadReport::default();
    for (i, batch) in words.chunks(WORD_BATCH_SIZE).enumerate() {
        let number = i + 1;
        let inserted: Vec<res::Id> = match insert_rows(db, tables::WORDS, batch, &["id"]).await {
            Ok(inserted) => inserted,
            Err(err) => {
                tracing::error!("Failed to insert batch {number}: {err}");
                report.failed_batches.push(number);
                continue;
            }
        };

        let relations = inserted
            .iter()
            .map(|word| req::NewWordCategory {
                word_id: word.id,
                category_id,
            })
            .collect::<Vec<_>>();
        let linked: Result<Vec<res::Id>, _> =
            insert_rows(db, tables::WORD_CATEGORIES, &relations, &[]).await;
        match linked {
            Ok(_) => {
                report.inserted += inserted.len();
                tracing::info!(
                    "Inserted batch {number}: {} words (total {})",
                    inserted.len(),
                    report.inserted
                );
            }
            Err(err) => {
                tracing::error!("Failed to link batch {number} to {category}: {err}");
                report.failed_batches.push(number);
            }
        }
    }

    tracing::info!("Inserted {} {category} words", report.inserted);
    Ok(report)
}

/// Inserts `rows` into `hanja_characters`, stopping at the first failed batch.
pub async fn upload_hanja(
    db: &dyn Database,
    rows: &[req::NewHanjaCharacter<'_>],
) -> Result<usize, DbError> {
    let batches = rows.len().div_ceil(HANJA_BATCH_SIZE);
    let mut uploaded = 0;
    for (i, batch) in rows.chunks(HANJA_BATCH_SIZE).enumerate() {
        tracing::info!(
            "Uploading batch {}/{batches} ({} records)",
            i + 1,
            batch.len()
        );
        let _: Vec<res::Id> = insert_rows(db, tables::HANJA_CHARACTERS, batch, &[]).await?;
        uploaded += batch.len();
        tracing::info!("Uploaded {uploaded}/{} records", rows.len());
    }
    Ok(uploaded)
}
