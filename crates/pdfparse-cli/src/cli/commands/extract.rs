//! Text extraction, search and metadata commands.

use std::path::{Path, PathBuf};

use console::style;

use pdfparse::{Direction, ExtractionOptions, Extractor, PageRange, PdfSource, Settings};

use crate::cli::helpers::parse_backends;

/// Flags for the `extract` command.
pub struct ExtractFlags {
    pub backend: Option<String>,
    pub start: Option<u32>,
    pub end: Option<u32>,
    pub by_page: bool,
    pub no_clean: bool,
    pub json: bool,
    pub output: Option<PathBuf>,
}

fn options(settings: &Settings, backend: Option<&str>) -> anyhow::Result<ExtractionOptions> {
    let mut options = settings.extraction_options()?;
    if let Some(selection) = parse_backends(backend, Direction::PdfToText)? {
        options.backend = selection;
    }
    Ok(options)
}

/// Extract text from a PDF.
pub fn cmd_extract(settings: &Settings, pdf: &Path, flags: ExtractFlags) -> anyhow::Result<()> {
    let mut options = options(settings, flags.backend.as_deref())?;
    if flags.no_clean {
        options.clean_text = false;
    }
    if flags.start.is_some() || flags.end.is_some() {
        options.page_range = Some(PageRange::new(flags.start.unwrap_or(1), flags.end));
    }

    let result = Extractor::new().extract_text(&PdfSource::path(pdf), &options)?;
    tracing::info!(
        "extracted {} of {} pages with {}",
        result.pages.len(),
        result.page_count,
        result.backend
    );

    let rendered = if flags.json {
        serde_json::to_string_pretty(&result)?
    } else if flags.by_page {
        result
            .pages
            .iter()
            .map(|p| format!("--- Page {} ---\n{}", p.page, p.text))
            .collect::<Vec<_>>()
            .join("\n\n")
    } else {
        result.full_text.clone()
    };

    match &flags.output {
        Some(path) => {
            std::fs::write(path, rendered.as_bytes())?;
            println!(
                "{} Wrote {} pages to {} using {}",
                style("✓").green(),
                result.pages.len(),
                path.display(),
                style(result.backend).cyan()
            );
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

/// Search a PDF for a literal string.
pub fn cmd_search(
    settings: &Settings,
    pdf: &Path,
    query: &str,
    case_sensitive: bool,
    backend: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let mut options = options(settings, backend)?;
    if case_sensitive {
        options.case_sensitive = true;
    }

    let matches = Extractor::new().search(&PdfSource::path(pdf), query, &options)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&matches)?);
        return Ok(());
    }

    if matches.is_empty() {
        println!("{} No matches for '{}'", style("!").yellow(), query);
        return Ok(());
    }
    for m in &matches {
        println!(
            "  {} {}{}{}",
            style(format!("p{}:{}", m.page, m.offset)).dim(),
            m.before.replace('\n', " "),
            style(&m.matched).bold().yellow(),
            m.after.replace('\n', " ")
        );
    }
    println!("\n{} {} matches", style("→").green(), matches.len());
    Ok(())
}

/// Show normalized document metadata.
pub fn cmd_metadata(
    settings: &Settings,
    pdf: &Path,
    backend: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let options = options(settings, backend)?;
    let metadata = Extractor::new().get_metadata(&PdfSource::path(pdf), &options)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&metadata)?);
        return Ok(());
    }

    println!("\n{}", style(pdf.display()).bold());
    println!("{}", "-".repeat(50));
    for (key, value) in &metadata {
        println!("  {:<18} {}", key, value);
    }
    Ok(())
}
