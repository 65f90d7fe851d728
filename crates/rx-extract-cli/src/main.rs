use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rx_extract_core::{normalize_response, write_record, PrescriptionRecord, DEFAULT_OUTPUT_FILE};
use rx_extract_llm::imaging::is_accepted_extension;
use rx_extract_llm::{
    build_system_instruction, EncodedImage, GeminiClient, GeminiConfig, PrescriptionError,
    PrescriptionParser,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "rx-extract")]
#[command(about = "Extract structured details from prescription images")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a prescription image to the generation service and save the record
    Extract {
        /// Prescription image (png, jpg or jpeg)
        image: PathBuf,
        /// Where to write the JSON record
        #[arg(long, short, default_value = DEFAULT_OUTPUT_FILE)]
        output: PathBuf,
        /// Also save the raw service response here
        #[arg(long)]
        raw_output: Option<PathBuf>,
        /// Override the configured model
        #[arg(long)]
        model: Option<String>,
        /// Override the configured request timeout
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Normalize a saved raw service response without calling the service
    Normalize {
        /// File holding the raw response text
        raw: PathBuf,
        /// Where to write the JSON record
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Print the instruction sent to the generation service
    Prompt,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rx_extract=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            image,
            output,
            raw_output,
            model,
            timeout_secs,
        } => run_extract(&image, &output, raw_output.as_deref(), model, timeout_secs),
        Commands::Normalize { raw, output } => run_normalize(&raw, output.as_deref()),
        Commands::Prompt => {
            println!("{}", build_system_instruction());
            Ok(())
        }
    }
}

fn run_extract(
    image: &Path,
    output: &Path,
    raw_output: Option<&Path>,
    model: Option<String>,
    timeout_secs: Option<u64>,
) -> Result<()> {
    if !is_accepted_extension(image) {
        bail!(
            "{} is not a supported image type (expected png, jpg or jpeg)",
            image.display()
        );
    }

    let mut config = GeminiConfig::from_env().context("Loading generation service configuration")?;
    if let Some(model) = model {
        config = config.with_model(model);
    }
    if let Some(timeout_secs) = timeout_secs {
        config = config.with_timeout_secs(timeout_secs);
    }
    tracing::debug!(?config, "Using generation service configuration");

    let client = GeminiClient::new(config).context("Creating generation service client")?;
    let parser = PrescriptionParser::new(Arc::new(client));

    let encoded = EncodedImage::from_path(image)
        .with_context(|| format!("Loading image {}", image.display()))?;

    let raw = parser.extract(&encoded).map_err(user_facing)?;
    if let Some(path) = raw_output {
        fs::write(path, &raw.text)
            .with_context(|| format!("Writing raw response to {}", path.display()))?;
    }

    let record = parser.normalize(&raw).map_err(user_facing)?;
    emit(&record, Some(output))
}

fn run_normalize(raw: &Path, output: Option<&Path>) -> Result<()> {
    let text = fs::read_to_string(raw)
        .with_context(|| format!("Reading raw response from {}", raw.display()))?;
    let record = normalize_response(&text)
        .map_err(PrescriptionError::from)
        .map_err(user_facing)?;
    emit(&record, output)
}

/// Write the record (when a path is given) and echo it to stdout.
fn emit(record: &PrescriptionRecord, output: Option<&Path>) -> Result<()> {
    let json = match output {
        Some(path) => write_record(record, path)
            .with_context(|| format!("Writing record to {}", path.display()))?,
        None => rx_extract_core::to_pretty_json(record).context("Serializing record")?,
    };

    let missing = record.missing_fields();
    if !missing.is_empty() {
        tracing::info!(fields = ?missing, "Fields left blank by the service");
    }

    println!("{json}");
    Ok(())
}

fn user_facing(e: PrescriptionError) -> anyhow::Error {
    let message = e.user_message();
    anyhow::Error::new(e).context(message)
}
