//! apiport CLI
//!
//! Command-line interface for importing API collections from Postman,
//! Insomnia, OpenAPI and cURL, and exporting them again.

use anyhow::{Context, Result};
use apiport_common::{get_supported_formats, Collection, ExportFormat, ImportWarning};
use apiport_exporter::export_collection;
use apiport_parser::{detect, ImportData, ImportResult, Importer};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "apiport")]
#[command(version, about = "Import and convert API collections", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect the format of a file
    Detect {
        /// Path to the input file
        file: PathBuf,
    },

    /// Import a file and summarize the result
    #[command(after_help = "EXAMPLES:\n  \
        # Auto-detect and summarize\n  \
        apiport import collection.json\n\n  \
        # Force the format and save the canonical JSON\n  \
        apiport import requests.txt --format curl --output imported.json")]
    Import {
        /// Path to the input file
        file: PathBuf,

        /// Input format (auto-detected if not specified)
        #[arg(short, long)]
        format: Option<InputFormat>,

        /// Write the imported collection as canonical JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip the undefined/unused variable checks
        #[arg(long)]
        no_validate: bool,
    },

    /// Convert a canonical collection JSON into another format
    #[command(after_help = "EXAMPLES:\n  \
        # Print curl commands\n  \
        apiport export imported.json --to curl\n\n  \
        # Write an OpenAPI document\n  \
        apiport export imported.json --to openapi --output openapi.json")]
    Export {
        /// Path to a canonical collection JSON
        file: PathBuf,

        /// Target format
        #[arg(short, long)]
        to: OutputFormat,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List importable formats
    Formats,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum InputFormat {
    /// Postman collection or environment
    Postman,
    /// Insomnia v4 export
    Insomnia,
    /// OpenAPI 3.x / Swagger 2.0 (JSON)
    Openapi,
    /// One or more curl commands
    Curl,
    /// HTTP Archive
    Har,
}

impl InputFormat {
    fn id(self) -> &'static str {
        match self {
            InputFormat::Postman => "postman",
            InputFormat::Insomnia => "insomnia",
            InputFormat::Openapi => "openapi",
            InputFormat::Curl => "curl",
            InputFormat::Har => "har",
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Canonical apiport JSON
    Native,
    /// Postman collection v2.1
    Postman,
    /// OpenAPI 3.0.3
    Openapi,
    /// curl commands
    Curl,
}

impl From<OutputFormat> for ExportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Native => ExportFormat::Native,
            OutputFormat::Postman => ExportFormat::Postman,
            OutputFormat::Openapi => ExportFormat::OpenApi,
            OutputFormat::Curl => ExportFormat::Curl,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Detect { file } => detect_command(&file)?,
        Commands::Import {
            file,
            format,
            output,
            no_validate,
        } => import_command(&file, format, output.as_deref(), !no_validate, cli.verbose)?,
        Commands::Export { file, to, output } => {
            export_command(&file, to.into(), output.as_deref())?
        }
        Commands::Formats => formats_command(),
    }

    Ok(())
}

/// Log to stderr so exported text on stdout stays clean
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn read_input(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn detect_command(path: &Path) -> Result<()> {
    let text = read_input(path)?;
    let format = detect(&text);
    println!(
        "{} {}: {}",
        "→".cyan(),
        path.display(),
        format.to_string().yellow()
    );
    Ok(())
}

fn import_command(
    path: &Path,
    format: Option<InputFormat>,
    output: Option<&Path>,
    validate: bool,
    verbose: bool,
) -> Result<()> {
    println!("{} Importing: {}", "→".cyan(), path.display());
    let text = read_input(path)?;

    let mut importer = Importer::new().with_variable_validation(validate);
    match format {
        Some(format) => importer = importer.with_format_hint(format.id()),
        None => println!(
            "{} Auto-detected format: {}",
            "→".cyan(),
            detect(&text).to_string().yellow()
        ),
    }

    let result = importer
        .import(&text)
        .with_context(|| format!("Failed to import {}", path.display()))?;

    println!("\n{}", "✓ Import successful!".green().bold());
    print_summary(&result, verbose);

    if let Some(output) = output {
        let json = match &result.data {
            ImportData::Collection(collection) => serde_json::to_string_pretty(collection)?,
            ImportData::Collections(collections) => serde_json::to_string_pretty(collections)?,
            ImportData::Environment(environment) => serde_json::to_string_pretty(environment)?,
        };
        fs::write(output, json)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        println!("\n{} Wrote {}", "✓".green(), output.display());
    }

    Ok(())
}

fn print_summary(result: &ImportResult, verbose: bool) {
    if let ImportData::Environment(environment) = &result.data {
        println!("\n{}", "Environment:".bold());
        println!("  Name: {}", environment.name.yellow());
        println!("  Variables: {}", environment.variables.len());
    }

    for collection in result.collections() {
        println!("\n{}", "Collection:".bold());
        println!("  Name: {}", collection.name.yellow());
        println!("  Folders: {}", collection.folder_count());
        println!("  Requests: {}", collection.request_count());
        println!("  Variables: {}", collection.variables.len());
        if verbose {
            print_requests(collection);
        }
    }

    if !result.environments.is_empty() {
        println!("\n{}", "Environments:".bold());
        for environment in &result.environments {
            println!(
                "  • {} ({} variables)",
                environment.name.cyan(),
                environment.variables.len()
            );
        }
    }

    print_warnings(&result.warnings, verbose);
}

fn print_requests(collection: &Collection) {
    println!("\n{}", "Requests:".bold());
    for request in collection.all_requests() {
        println!(
            "  • {} {} {}",
            request.method.cyan(),
            request.name,
            request.url.dimmed()
        );
    }
}

/// Counts per kind; every message under `--verbose`
fn print_warnings(warnings: &[ImportWarning], verbose: bool) {
    if warnings.is_empty() {
        return;
    }

    println!("\n{} {} warning(s)", "⚠".yellow(), warnings.len());
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for warning in warnings {
        *counts.entry(warning.kind.to_string()).or_default() += 1;
    }
    for (kind, count) in &counts {
        println!("  {}: {}", kind, count);
    }

    if verbose {
        println!();
        for warning in warnings {
            println!("  {} {}", "•".yellow(), warning);
        }
    }
}

fn export_command(path: &Path, format: ExportFormat, output: Option<&Path>) -> Result<()> {
    let text = read_input(path)?;
    let collection: Collection = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a canonical collection JSON", path.display()))?;

    let exported = export_collection(&collection, format)
        .with_context(|| format!("Failed to export as {}", format))?;

    match output {
        Some(output) => {
            fs::write(output, &exported)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            eprintln!(
                "{} Exported '{}' as {} to {}",
                "✓".green(),
                collection.name,
                format,
                output.display()
            );
        }
        None => println!("{}", exported),
    }
    Ok(())
}

fn formats_command() {
    println!("{}", "Supported formats:".bold());
    for info in get_supported_formats() {
        let status = if info.supported {
            "✓".green()
        } else {
            "✗".red()
        };
        println!(
            "  {} {:<10} {} ({})",
            status,
            info.id.cyan(),
            info.description,
            info.extensions.join(", ")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_input_format_ids_parse() {
        for format in InputFormat::value_variants() {
            assert!(format.id().parse::<apiport_common::SourceFormat>().is_ok());
        }
    }

    #[test]
    fn test_import_flags() {
        let cli = Cli::parse_from([
            "apiport",
            "import",
            "in.json",
            "--format",
            "curl",
            "--no-validate",
            "-o",
            "out.json",
        ]);
        match cli.command {
            Commands::Import {
                format,
                no_validate,
                output,
                ..
            } => {
                assert!(matches!(format, Some(InputFormat::Curl)));
                assert!(no_validate);
                assert_eq!(output, Some(PathBuf::from("out.json")));
            }
            _ => panic!("expected import"),
        }
    }
}
