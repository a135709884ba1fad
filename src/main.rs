use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use dermcard::{ModelCardPipeline, config::Config, prepare_export, telemetry::init_tracing};
use tracing::{info, warn};

/// Generate a dermatology model card from public sources.
#[derive(Debug, Parser)]
#[command(name = "dermcard", version)]
struct Cli {
    /// Model to search for, e.g. "DermNet-X".
    model_name: String,

    /// Product or documentation page to read as an extra source.
    #[arg(long)]
    website: Option<String>,

    /// Directory the card is written to.
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Print the card to stdout instead of writing a file.
    #[arg(long)]
    print: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;
    init_tracing(config.log_format());

    let pipeline = ModelCardPipeline::from_config(&config)?;
    let card = pipeline
        .generate_model_card(&cli.model_name, cli.website.as_deref())
        .await;

    if !card.real_data_found {
        warn!(model = %card.model_name, "no source returned usable data");
    }
    info!(
        hti1_compliant = card.compliance.hti1_compliant,
        ocr_compliant = card.compliance.ocr_compliant,
        issues = card.compliance.issues.len(),
        "compliance assessed"
    );

    let exported = prepare_export(
        &card.model_name,
        &card.rendered_document,
        card.generated_at.date_naive(),
    )?;

    if cli.print {
        println!("{}", exported.content);
        return Ok(());
    }

    let path = cli.output_dir.join(&exported.filename);
    tokio::fs::write(&path, &exported.content)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "model card written");
    Ok(())
}
