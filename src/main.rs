use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use sheet_cleaner::config::{Config, DEFAULT_CONFIG_PATH};
use sheet_cleaner::export;
use sheet_cleaner::logging;
use sheet_cleaner::pipeline::{CleanReport, CleaningPipeline};
use sheet_cleaner::source::{FileSource, SheetSource, SourceRequest};

#[derive(Parser)]
#[command(name = "sheet_cleaner")]
#[command(about = "Clean messy spreadsheet data in one step")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a sheet, clean it, and write the result as CSV
    Clean {
        /// Local .csv or .json export to clean
        #[arg(long, conflicts_with_all = ["sheet_url", "sheet_name", "demo"])]
        input: Option<PathBuf>,
        /// Google Sheets URL
        #[arg(long)]
        sheet_url: Option<String>,
        /// Worksheet name within the spreadsheet (e.g. Sheet1)
        #[arg(long)]
        sheet_name: Option<String>,
        /// Use the demo sheet from the config instead
        #[arg(long, conflicts_with_all = ["sheet_url", "sheet_name"])]
        demo: bool,
        /// Where to write the cleaned CSV
        #[arg(short, long, default_value = "cleaned_data.csv")]
        output: PathBuf,
        /// Rows to show in the preview
        #[arg(long, default_value = "10")]
        preview: usize,
        /// Also write the run report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Show a local export's columns and inferred types without cleaning it
    Preview {
        #[arg(long)]
        input: PathBuf,
        #[arg(short = 'n', long, default_value = "10")]
        rows: usize,
    },
}

fn print_report(report: &CleanReport) {
    println!("\n📊 Cleaning report ({}):", report.run_id);
    println!("   Rows in:  {}", report.rows_in);
    println!("   Rows out: {}", report.rows_out);
    for stage in &report.stages {
        println!(
            "   {:<8} dropped {:>5} rows, changed {:>5} cells",
            stage.stage.as_str(),
            stage.rows_dropped,
            stage.cells_changed
        );
    }
    if !report.unfilled_columns.is_empty() {
        println!(
            "\n⚠️  No values to impute from in: {}",
            report.unfilled_columns.join(", ")
        );
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Clean {
            input,
            sheet_url,
            sheet_name,
            demo,
            output,
            preview,
            report,
        } => {
            let request = SourceRequest {
                input,
                sheet_url,
                sheet_name,
                demo,
            };
            let source = request.resolve(&config)?;
            info!("Fetching {}", source.describe());
            let raw = source.fetch().await?;

            let outcome = CleaningPipeline::with_options(config.pipeline).run(raw)?;

            println!("✅ Cleaned Successfully! Preview below:\n");
            print!("{}", export::preview(&outcome.table, preview));
            print_report(&outcome.report);

            export::write_csv(&outcome.table, &output)?;
            println!("\n💾 Wrote {}", output.display());

            if let Some(path) = report {
                let json = serde_json::to_string_pretty(&outcome.report)?;
                std::fs::write(&path, json)
                    .with_context(|| format!("writing report to {}", path.display()))?;
                println!("📝 Wrote report {}", path.display());
            }
        }
        Commands::Preview { input, rows } => {
            let table = FileSource::new(input).fetch().await?;
            println!("{} rows, {} columns", table.len(), table.columns().len());
            for column in table.columns() {
                println!("   {:<24} {}", column.name, column.kind);
            }
            println!();
            print!("{}", export::preview(&table, rows));
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Run failed: {:#}", e);
            println!("❌ Something went wrong: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
