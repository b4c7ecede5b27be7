use eyre::Context;
use voca_client::RestDatabase;
use voca_data::{thai, upload};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt::init();
    dotenvy::from_filename(".env.local").ok();
    dotenvy::dotenv().ok();

    let url = std::env::var("SUPABASE_URL").wrap_err("Missing SUPABASE_URL")?;
    let key = std::env::var("SUPABASE_SERVICE_ROLE_KEY")
        .wrap_err("Missing SUPABASE_SERVICE_ROLE_KEY")?;
    let db = RestDatabase::new(&url, &key);

    let args = std::env::args().collect::<Vec<_>>();
    let path = args.get(1).map(String::as_str).unwrap_or("thaiword_db.csv");
    tracing::info!("Reading {path}");
    let html = std::fs::read_to_string(path).wrap_err("Failed to read input")?;
    let words = thai::parse_rows(&html);
    tracing::info!("Parsed {} phrases", words.len());
    for word in words.iter().take(3) {
        tracing::info!("  {} / {} / {}", word.korean, word.thai, word.pronunciation);
    }

    let rows = words
        .iter()
        .map(thai::ThaiWord::to_new_word)
        .collect::<Vec<_>>();
    let report = upload::upload_words(&db, "THAI", &rows)
        .await
        .wrap_err("Failed to upload phrases")?;
    if !report.failed_batches.is_empty() {
        tracing::warn!("Failed batches: {:?}", report.failed_batches);
    }
    tracing::info!("Uploaded {}/{} phrases", report.inserted, rows.len());
    Ok(())
}
