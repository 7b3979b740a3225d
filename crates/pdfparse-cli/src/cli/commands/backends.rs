//! Backend availability check command.

use console::style;

use pdfparse::probe::install_hint;
use pdfparse::{Availability, Direction};

/// Print which backends are installed, grouped by direction.
pub fn cmd_backends() -> anyhow::Result<()> {
    let availability = Availability::detect();

    println!("\n{}", style("Backend Status").bold());
    println!("{}", "-".repeat(50));

    for (direction, title) in [
        (Direction::HtmlToPdf, "HTML to PDF:"),
        (Direction::PdfToText, "PDF to text:"),
    ] {
        println!("\n{}", style(title).cyan());
        for &id in direction.default_order() {
            match availability.status(id) {
                Some(status) if status.available => {
                    println!(
                        "  {:<15} {}  {}",
                        id.as_str(),
                        style("✓ available").green(),
                        style(&status.detail).dim()
                    );
                }
                status => {
                    let reason = status.map(|s| s.detail.as_str()).unwrap_or("not probed");
                    println!(
                        "  {:<15} {}  {}",
                        id.as_str(),
                        style("✗ not available").red(),
                        style(reason).dim()
                    );
                    println!("                  {}", style(install_hint(id)).dim());
                }
            }
        }

        match availability.available_for(direction).first() {
            Some(first) => println!("  {} default: {}", style("→").green(), first),
            None => println!(
                "  {} no {} backend available",
                style("!").yellow(),
                direction.as_str()
            ),
        }
    }

    println!();
    Ok(())
}
