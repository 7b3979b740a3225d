//! HTML to PDF conversion command.

use console::style;

use pdfparse::{Converter, Direction, HtmlSource, PageSize, Settings};

use super::ConvertArgs;
use crate::cli::helpers::{parse_backends, timeout_from_flag};

/// Convert HTML to a PDF file.
pub fn cmd_convert(settings: &Settings, args: ConvertArgs) -> anyhow::Result<()> {
    let mut options = settings.conversion_options()?;

    if let Some(selection) = parse_backends(args.backend.as_deref(), Direction::HtmlToPdf)? {
        options.backend = selection;
    }
    if let Some(size) = &args.page_size {
        options.page_size = PageSize::from_str(size)
            .ok_or_else(|| anyhow::anyhow!("unknown page size '{}'", size))?;
    }
    for (flag, side) in [
        (args.margin_top, &mut options.margins.top),
        (args.margin_right, &mut options.margins.right),
        (args.margin_bottom, &mut options.margins.bottom),
        (args.margin_left, &mut options.margins.left),
    ] {
        if let Some(value) = flag {
            *side = value;
        }
    }
    if let Some(path) = &args.css {
        let css = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read {}: {}", path.display(), e))?;
        options.extra_css = Some(css);
    }
    if args.base_url.is_some() {
        options.base_url = args.base_url;
    }
    if let Some(secs) = args.timeout {
        options.timeout = timeout_from_flag(secs);
    }

    let source = if args.string {
        HtmlSource::text(args.input)
    } else {
        HtmlSource::file(args.input)
    };

    let result = Converter::new().convert_to_file(&source, &args.output, &options)?;

    for failure in &result.failed_attempts {
        eprintln!("  {} {}", style("✗").red(), style(failure).dim());
    }
    for warning in &result.warnings {
        eprintln!("  {} {}", style("!").yellow(), warning);
    }
    println!(
        "{} Wrote {} using {}",
        style("✓").green(),
        args.output.display(),
        style(result.backend).cyan()
    );
    Ok(())
}
