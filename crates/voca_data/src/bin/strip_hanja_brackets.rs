use eyre::Context;
use voca_data::hanja;

fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt::init();

    let args = std::env::args().collect::<Vec<_>>();
    let input = args.get(1).map(String::as_str).unwrap_or("hanja.csv");
    let output = args.get(2).map(String::as_str).unwrap_or("hanja_nobracket.csv");

    tracing::info!("Reading {input}");
    let contents = std::fs::read_to_string(input).wrap_err("Failed to read input")?;
    let stripped = hanja::strip_brackets(&contents);
    std::fs::write(output, stripped).wrap_err("Failed to write output")?;
    tracing::info!("Wrote {output}");
    Ok(())
}
