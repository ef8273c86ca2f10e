//! Compile and package a local HDL file without any AI involvement.
//!
//! Usage: cargo run --example package_local -- path/to/design.vhdl

use hdlgen::{AppConfig, HdlPipeline};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("usage: package_local <FILE>"))?;
    let source = std::fs::read_to_string(&path)?;
    let name = std::path::Path::new(&path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("circuit")
        .to_string();

    let pipeline = HdlPipeline::new(AppConfig::default());
    let outcome = pipeline.process_source(&source, &name).await?;

    println!(
        "{} ({}) compiled: {}",
        outcome.parsed.entity_name,
        outcome.parsed.language,
        if outcome.compilation.success { "yes" } else { "no" }
    );
    if let Some(error) = &outcome.compilation.error_message {
        println!("{error}");
    }
    println!("archive: {}", outcome.export.archive_path.display());
    Ok(())
}
