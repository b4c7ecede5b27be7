use eyre::Context;
use voca_data::korean_csv;

fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt::init();

    let args = std::env::args().collect::<Vec<_>>();
    let input = args.get(1).map(String::as_str).unwrap_or("koreanword.csv");
    let output = args.get(2).map(String::as_str).unwrap_or("koreanword_clean.csv");

    tracing::info!("Reading {input}");
    let contents = std::fs::read_to_string(input).wrap_err("Failed to read input")?;
    let fixed = korean_csv::fix_csv(&contents);

    std::fs::write(output, &fixed.contents).wrap_err("Failed to write output")?;
    tracing::info!("Wrote {} rows to {output}", fixed.rows);
    tracing::info!("Fixed {} phrases", fixed.fixes.len());
    for (before, after) in &fixed.fixes {
        tracing::info!("  {before} -> {after}");
    }
    for line in fixed.contents.lines().take(15) {
        tracing::info!("  {line}");
    }
    Ok(())
}
