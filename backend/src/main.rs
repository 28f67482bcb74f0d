//! Salesload CLI - import branch sales files for the business dashboard
//!
//! ```bash
//! salesload serve                       # Start HTTP server (port 3000)
//! salesload convert sales.xlsx          # Convert a file to dashboard JSON
//! salesload validate data.json          # Data-quality checks on a model
//! salesload template                    # Write the blank Excel template
//! ```

use clap::{Parser, Subcommand};
use salesload::{
    convert_file, export, validate_value, DashboardConfig, IngestReport,
};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "salesload")]
#[command(about = "Import branch sales and orders into the business dashboard", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a JSON, Excel or CSV file into dashboard JSON
    Convert {
        /// Input file (.json, .xlsx, .xls or .csv)
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run the data-quality checks on a dashboard JSON file
    Validate {
        /// Input JSON file
        input: PathBuf,
    },

    /// Write the blank Excel import template
    Template {
        /// Output file (default: <brand>-template.xlsx)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: SALESLOAD_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let config = DashboardConfig::from_env();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert { input, output } => cmd_convert(&input, output.as_deref(), &config),
        Commands::Validate { input } => cmd_validate(&input),
        Commands::Template { output } => cmd_template(output.as_deref(), &config),
        Commands::Serve { port } => cmd_serve(port, config).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_convert(
    input: &Path,
    output: Option<&Path>,
    config: &DashboardConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let (model, report) = convert_file(input, config)?;
    print_report(&report);

    let json = export::export_json(&model)?;
    write_output(&json, output)?;
    Ok(())
}

fn print_report(report: &IngestReport) {
    eprintln!("\n📊 {} ({})", report.file_name, report.kind);
    if report.rows_read > 0 {
        eprintln!("   Rows:     {}", report.rows_read);
        eprintln!("   Applied:  {}", report.applied);
        eprintln!("   Skipped:  {}", report.skipped.len());
    }
    eprintln!("   Branches: {}", report.branches.join(", "));
    if !report.shape_warnings.is_empty() {
        eprintln!("   ⚠️  {} schema warning(s)", report.shape_warnings.len());
    }
    if !report.issues.is_empty() {
        eprintln!("   ⚠️  {} data-quality issue(s)", report.issues.len());
    }
}

fn cmd_validate(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("✔️  Validating: {}", input.display());

    let content = fs::read_to_string(input)?;
    let model: Value = serde_json::from_str(&content)?;
    let issues = validate_value(&model);

    if issues.is_empty() {
        eprintln!("✅ No issues found");
        return Ok(());
    }

    for issue in issues.iter().take(20) {
        eprintln!("   - {}", issue);
    }
    if issues.len() > 20 {
        eprintln!("   ... +{} more", issues.len() - 20);
    }
    eprintln!("\n📊 {} issue(s)", issues.len());
    std::process::exit(1);
}

fn cmd_template(
    output: Option<&Path>,
    config: &DashboardConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = export::template_file(config)?;
    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&file.file_name));

    export::save(&file, &path)?;
    eprintln!("💾 Template written to: {}", path.display());
    Ok(())
}

async fn cmd_serve(
    port: Option<u16>,
    mut config: DashboardConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(port) = port {
        config.port = port;
    }
    salesload::server::start_server(config).await?;
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
