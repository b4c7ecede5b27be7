use eyre::Context;
use voca_data::hanja;

fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt::init();

    let args = std::env::args().collect::<Vec<_>>();
    let input = args.get(1).map(String::as_str).unwrap_or("hanja_nobracket.csv");
    let output = args.get(2).map(String::as_str).unwrap_or("hanja_final.csv");

    tracing::info!("Reading {input}");
    let contents = std::fs::read_to_string(input).wrap_err("Failed to read input")?;
    let formatted = hanja::format_rows(&contents);
    std::fs::write(output, &formatted).wrap_err("Failed to write output")?;
    tracing::info!("Wrote {} rows to {output}", formatted.lines().count().saturating_sub(1));
    Ok(())
}
