//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod backends;
mod convert;
mod extract;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use pdfparse::Settings;

#[derive(Parser)]
#[command(name = "pdfparse")]
#[command(about = "Convert HTML to PDF and extract text from PDFs using installed engines")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an HTML file (or string) to PDF
    Convert(ConvertArgs),

    /// Extract text from a PDF
    Extract {
        /// PDF file to read
        pdf: PathBuf,
        /// Backend name or comma-separated fallback chain
        #[arg(short, long)]
        backend: Option<String>,
        /// First page to extract (1-indexed)
        #[arg(long)]
        start: Option<u32>,
        /// Last page to extract (clamped to the page count)
        #[arg(long)]
        end: Option<u32>,
        /// Print each page under its own header
        #[arg(long)]
        by_page: bool,
        /// Keep the engine's raw whitespace
        #[arg(long)]
        no_clean: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Write the text to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Search a PDF for a literal string
    Search {
        /// PDF file to search
        pdf: PathBuf,
        /// Text to look for
        query: String,
        /// Match case exactly
        #[arg(long)]
        case_sensitive: bool,
        /// Backend name or comma-separated fallback chain
        #[arg(short, long)]
        backend: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show normalized document metadata
    Metadata {
        /// PDF file to inspect
        pdf: PathBuf,
        /// Backend name or comma-separated fallback chain
        #[arg(short, long)]
        backend: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show which backends are installed
    Backends,
}

#[derive(Args)]
pub struct ConvertArgs {
    /// HTML file to convert (or literal HTML with --string)
    input: String,
    /// Where to write the PDF
    output: PathBuf,
    /// Treat INPUT as HTML markup rather than a path
    #[arg(long)]
    string: bool,
    /// Backend name or comma-separated fallback chain
    #[arg(short, long)]
    backend: Option<String>,
    /// Extra stylesheet to apply
    #[arg(long)]
    css: Option<PathBuf>,
    /// Page size: A3, A4, A5, Letter, Legal, or WIDTHxHEIGHT in points
    #[arg(long)]
    page_size: Option<String>,
    #[arg(long)]
    margin_top: Option<String>,
    #[arg(long)]
    margin_right: Option<String>,
    #[arg(long)]
    margin_bottom: Option<String>,
    #[arg(long)]
    margin_left: Option<String>,
    /// Base URL for resolving relative links and assets
    #[arg(long)]
    base_url: Option<String>,
    /// Per-backend timeout in seconds (0 = no limit)
    #[arg(long)]
    timeout: Option<u64>,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Convert(args) => convert::cmd_convert(&settings, args),
        Commands::Extract {
            pdf,
            backend,
            start,
            end,
            by_page,
            no_clean,
            json,
            output,
        } => extract::cmd_extract(
            &settings,
            &pdf,
            extract::ExtractFlags {
                backend,
                start,
                end,
                by_page,
                no_clean,
                json,
                output,
            },
        ),
        Commands::Search {
            pdf,
            query,
            case_sensitive,
            backend,
            json,
        } => extract::cmd_search(
            &settings,
            &pdf,
            &query,
            case_sensitive,
            backend.as_deref(),
            json,
        ),
        Commands::Metadata { pdf, backend, json } => {
            extract::cmd_metadata(&settings, &pdf, backend.as_deref(), json)
        }
        Commands::Backends => backends::cmd_backends(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_convert() {
        let cli = Cli::try_parse_from([
            "pdfparse",
            "convert",
            "<p>hi</p>",
            "out.pdf",
            "--string",
            "--backend",
            "chromium,builtin",
            "--margin-top",
            "1in",
        ])
        .unwrap();
        match cli.command {
            Commands::Convert(args) => {
                assert!(args.string);
                assert_eq!(args.backend.as_deref(), Some("chromium,builtin"));
                assert_eq!(args.margin_top.as_deref(), Some("1in"));
            }
            _ => panic!("expected convert"),
        }
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["pdfparse", "backends", "-v", "--config", "x.toml"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
    }
}
