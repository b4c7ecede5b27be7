//! Summaries of the join-backed categories.

use voca_api::{response as res, tables, WORD_COLUMNS};
use voca_client::database::{fetch, fetch_one, Database, DbResult, Query};
use voca_core::Word;

/// Every category with the number of words linked to it, in id order.
pub async fn category_counts(db: &dyn Database) -> DbResult<Vec<(String, u64)>> {
    let categories = Query::table(tables::CATEGORIES)
        .select(&["id", "name"])
        .order("id", true);
    let mut counts = Vec::new();
    for category in fetch::<res::Category>(db, &categories).await? {
        let linked = Query::table(tables::WORD_CATEGORIES).eq("category_id", category.id);
        let count = db.count(&linked).await?;
        counts.push((category.name, count));
    }
    Ok(counts)
}

/// Up to `limit` words linked to the category called `name`.
pub async fn sample_category(db: &dyn Database, name: &str, limit: usize) -> DbResult<Vec<Word>> {
    let category = Query::table(tables::CATEGORIES)
        .select(&["id", "name"])
        .eq("name", name);
    let Some(category) = fetch_one::<res::Category>(db, &category).await? else {
        tracing::warn!("The {name} category does not exist");
        return Ok(Vec::new());
    };

    let links = Query::table(tables::WORD_CATEGORIES)
        .select(&["word_id", "category_id"])
        .eq("category_id", category.id)
        .order("word_id", true)
        .limit(limit);
    let ids = fetch::<res::WordCategory>(db, &links)
        .await?
        .into_iter()
        .map(|link| link.word_id)
        .collect::<Vec<_>>();
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let words = Query::table(tables::WORDS)
        .select(WORD_COLUMNS)
        .in_("id", ids)
        .order("id", true);
    let words = fetch::<res::WordRow>(db, &words).await?;
    Ok(words
        .into_iter()
        .map(|row| row.into_word(Some(&category.name)))
        .collect())
}
