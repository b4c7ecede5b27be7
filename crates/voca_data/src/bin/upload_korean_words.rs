use eyre::Context;
use voca_client::RestDatabase;
use voca_data::{korean_csv, upload};

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
    let path = args.get(1).map(String::as_str).unwrap_or("koreanword_clean.csv");
    tracing::info!("Reading {path}");
    let contents = std::fs::read_to_string(path).wrap_err("Failed to read input")?;
    let words = korean_csv::parse_words(&contents);
    tracing::info!("Parsed {} words", words.len());

    let rows = words
        .iter()
        .map(korean_csv::KoreanWord::to_new_word)
        .collect::<Vec<_>>();
    let report = upload::upload_words(&db, "KOREAN", &rows)
        .await
        .wrap_err("Failed to upload words")?;
    if !report.failed_batches.is_empty() {
        tracing::warn!("Failed batches: {:?}", report.failed_batches);
    }
    tracing::info!("Uploaded {}/{} words", report.inserted, rows.len());
    Ok(())
}
