//! pdfparse - HTML to PDF conversion and PDF text extraction.
//!
//! Drives whichever rendering and extraction engines are installed, falling
//! back through them in preference order.

mod cli;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    let default_filter = if cli::is_verbose() {
        "pdfparse=info"
    } else {
        "pdfparse=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(err) = cli::run().await {
        eprintln!("{}", cli::describe_error(&err));
        std::process::exit(1);
    }
}
