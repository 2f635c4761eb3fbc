//! lotplan: look up Lot/Plan identifiers and export the parcels as KML or a
//! zipped shapefile.
//!
//! Reads one identifier per line from `--input` (or stdin), runs a single
//! search against the resolver and prints the results table.
//!
//! Config from env vars (or `.env`):
//!   LOTPLAN_RESOLVER_URL: search endpoint (overridden by --resolver)
//!   LOTPLAN_TIMEOUT_SECS: request timeout

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use lotplan_core::{
    config, kml, KmlExporter, ParcelStyle, PipelineConfig, SearchOutcome, SearchPipeline,
    ShapefileExporter,
};

#[derive(Parser, Debug)]
#[command(
    name = "lotplan",
    about = "Resolve Lot/Plan identifiers to parcels and export KML or shapefiles"
)]
struct Cli {
    /// File with one Lot/Plan per line (stdin when omitted)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Resolver search endpoint
    #[arg(long, env = "LOTPLAN_RESOLVER_URL")]
    resolver: Option<String>,

    /// Write the matched parcels to this KML file
    #[arg(long)]
    kml: Option<PathBuf>,

    /// Write the matched parcels to this zipped shapefile
    #[arg(long)]
    shapefile: Option<PathBuf>,

    /// Folder name inside the KML document
    #[arg(long, default_value = kml::DEFAULT_FOLDER_NAME)]
    folder: String,

    /// Fill colour (#rrggbb)
    #[arg(long, default_value = lotplan_core::style::DEFAULT_FILL)]
    fill: String,

    /// Fill opacity, 0.0 - 1.0
    #[arg(long, default_value_t = lotplan_core::style::DEFAULT_FILL_OPACITY)]
    fill_opacity: f64,

    /// Outline colour (#rrggbb)
    #[arg(long, default_value = lotplan_core::style::DEFAULT_OUTLINE)]
    outline: String,

    /// Outline width in pixels
    #[arg(long, default_value_t = lotplan_core::style::DEFAULT_OUTLINE_WIDTH)]
    outline_width: f64,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lotplan_core=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let mut pipeline_config = PipelineConfig::from_env()?;
    if let Some(url) = &cli.resolver {
        pipeline_config.resolver_url = config::parse_url("--resolver", url)?;
    }

    let text = read_input(cli.input.as_ref())?;
    let resolver = pipeline_config
        .http_resolver()
        .context("Failed to create HTTP client")?;
    let pipeline = SearchPipeline::new(Arc::new(resolver));

    match pipeline.search(&text).await {
        Ok(SearchOutcome::NoInput) => {
            eprintln!("No Lot/Plan identifiers given");
            return Ok(ExitCode::SUCCESS);
        }
        Ok(_) => {}
        Err(e) => {
            tracing::error!(error = %e, "Search failed");
            eprintln!("No results: {e}");
            return Ok(ExitCode::FAILURE);
        }
    }

    let rows = pipeline.table_rows();
    if rows.is_empty() {
        println!("No parcels found");
    } else {
        println!("{:>4}  {:<24}  {}", "id", "lot", "plan");
        for row in &rows {
            println!("{:>4}  {:<24}  {}", row.id, row.lot, row.plan);
        }
    }

    if let Some(path) = &cli.kml {
        let style = ParcelStyle {
            fill_hex: cli.fill.clone(),
            fill_opacity: cli.fill_opacity,
            outline_hex: cli.outline.clone(),
            outline_width: cli.outline_width,
        };
        let exporter = KmlExporter::new(cli.folder.clone(), style);
        let document = pipeline.export_kml(&exporter)?;
        std::fs::write(path, document)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        eprintln!("Wrote {}", path.display());
    }

    if let Some(path) = &cli.shapefile {
        let base_name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let archive = pipeline.export_shapefile(&ShapefileExporter::new(base_name))?;
        std::fs::write(path, archive)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        eprintln!("Wrote {}", path.display());
    }

    Ok(ExitCode::SUCCESS)
}

fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}
