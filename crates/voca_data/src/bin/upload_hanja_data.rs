use eyre::Context;
use voca_client::RestDatabase;
use voca_data::{hanja, upload};

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
    let path = args.get(1).map(String::as_str).unwrap_or("hanja_final.csv");
    tracing::info!("Reading {path}");
    let contents = std::fs::read_to_string(path).wrap_err("Failed to read input")?;
    let records = hanja::parse_records(&contents).wrap_err("Failed to parse records")?;
    tracing::info!("Parsed {} records", records.len());

    let rows = records
        .iter()
        .map(hanja::HanjaRecord::to_row)
        .collect::<Vec<_>>();
    for (level, count) in hanja::level_statistics(rows.iter().map(|row| &*row.level)) {
        tracing::info!("  {level}: {count}");
    }

    let uploaded = upload::upload_hanja(&db, &rows)
        .await
        .wrap_err("Failed to upload records")?;
    tracing::info!("Uploaded {uploaded} records");
    Ok(())
}
