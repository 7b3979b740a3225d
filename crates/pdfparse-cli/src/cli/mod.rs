//! Command-line interface for pdfparse.

mod commands;
pub mod helpers;

pub use commands::{is_verbose, run};
pub use helpers::describe_error;
