use eyre::Context;
use voca_client::Config;
use voca_data::report;

const SAMPLE_SIZE: usize = 5;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt::init();
    dotenvy::from_filename(".env.local").ok();
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    let db = config.admin_database();

    let counts = report::category_counts(&db)
        .await
        .wrap_err("Failed to count categories")?;
    for (name, count) in &counts {
        tracing::info!("{name}: {count} words");
        let sample = report::sample_category(&db, name, SAMPLE_SIZE)
            .await
            .wrap_err_with(|| format!("Failed to sample {name}"))?;
        for word in sample {
            tracing::info!("  {} / {}", word.english, word.korean);
        }
    }
    Ok(())
}
