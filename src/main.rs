// Entry point and command-line flow.
//
// `serve` starts the browser UI. `analyze` runs the same pipeline once over
// files on disk, prints the counters and a preview, and writes the export.
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use revenue_risk::output::{self, EXPORT_FILE_NAME};
use revenue_risk::reports::{run_analysis, AnalysisInput, Upload};
use revenue_risk::util::format_int;
use revenue_risk::web::run_server;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "revenue-risk")]
#[command(about = "Flag invoices at risk of revenue leakage")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the upload-and-analyze page
    Serve {
        /// Server bind address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Server port
        #[arg(long, default_value_t = 8501)]
        port: u16,
    },
    /// Analyze three files once and write the scored export
    Analyze {
        /// AR aging spreadsheet (.xlsx, .xls, .ods or .csv)
        #[arg(long, value_name = "FILE")]
        ar: PathBuf,

        /// Billing spreadsheet
        #[arg(long, value_name = "FILE")]
        billing: PathBuf,

        /// Contract spreadsheet
        #[arg(long, value_name = "FILE")]
        contract: PathBuf,

        /// Output file; a .csv extension writes CSV, anything else a workbook
        #[arg(long, value_name = "FILE", default_value = EXPORT_FILE_NAME)]
        output: PathBuf,

        /// Also write the risk counters as JSON
        #[arg(long, value_name = "FILE")]
        summary: Option<PathBuf>,

        /// Rows to preview on the console
        #[arg(long, default_value_t = 5)]
        preview: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Serve { host, port } => {
            let addr = format!("{}:{}", host, port);
            println!("Revenue risk agent running at http://{}", addr);
            run_server(&addr).await
        }
        Commands::Analyze {
            ar,
            billing,
            contract,
            output: out_path,
            summary,
            preview,
        } => {
            let input = AnalysisInput {
                ar_aging: read_upload(&ar)?,
                billing: read_upload(&billing)?,
                contract: read_upload(&contract)?,
            };
            handle_analyze(input, &out_path, summary.as_deref(), preview)
        }
    }
}

fn read_upload(path: &Path) -> Result<Upload> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(Upload { name, bytes })
}

fn handle_analyze(
    input: AnalysisInput,
    out_path: &Path,
    summary: Option<&Path>,
    preview: usize,
) -> Result<()> {
    let result = run_analysis(&input).context("Error processing files")?;

    println!("Risk Analysis Completed Successfully\n");
    output::print_summary(&result.summary);
    output::preview_table_rows(&result.table, preview);

    let is_csv = out_path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);
    let written = if is_csv {
        output::write_csv(out_path, &result.table)
    } else {
        output::write_xlsx(out_path, &result.table)
    };
    written.with_context(|| format!("Failed to write {}", out_path.display()))?;
    println!(
        "({} invoices exported to {})",
        format_int(result.summary.total),
        out_path.display()
    );

    if let Some(path) = summary {
        output::write_json(path, &result.summary)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("(Summary written to {})", path.display());
    }
    Ok(())
}
