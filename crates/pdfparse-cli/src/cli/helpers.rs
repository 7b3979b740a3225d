//! Shared helper functions for CLI commands.

use std::time::Duration;

use pdfparse::{BackendEntry, BackendSelection, ConfigError, ConversionError, Direction, ExtractionError};

/// Format an error for stderr, tagging library errors with their kind.
pub fn describe_error(err: &anyhow::Error) -> String {
    if let Some(e) = err.downcast_ref::<ConversionError>() {
        return format!("error[{}]: {}", e.kind(), e);
    }
    if let Some(e) = err.downcast_ref::<ExtractionError>() {
        return format!("error[{}]: {}", e.kind(), e);
    }
    if let Some(e) = err.downcast_ref::<ConfigError>() {
        return format!("error[Config]: {}", e);
    }
    format!("error: {:#}", err)
}

/// Parse a `--backend` value (one name or a comma-separated chain).
pub fn parse_backends(
    value: Option<&str>,
    direction: Direction,
) -> Result<Option<BackendSelection>, ConfigError> {
    match value.and_then(BackendEntry::from_list) {
        Some(entry) => entry.selection(direction).map(Some),
        None => Ok(None),
    }
}

/// `--timeout` seconds; 0 disables the limit.
pub fn timeout_from_flag(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdfparse::BackendId;

    #[test]
    fn test_parse_backends() {
        assert_eq!(parse_backends(None, Direction::PdfToText).unwrap(), None);
        assert_eq!(
            parse_backends(Some("mupdf"), Direction::PdfToText).unwrap(),
            Some(BackendSelection::Single(BackendId::Mutool))
        );
        assert_eq!(
            parse_backends(Some("chromium, builtin"), Direction::HtmlToPdf).unwrap(),
            Some(BackendSelection::Chain(vec![
                BackendId::Chromium,
                BackendId::Builtin
            ]))
        );
        assert!(parse_backends(Some("nonsense"), Direction::HtmlToPdf).is_err());
    }

    #[test]
    fn test_describe_error_tags_kind() {
        let err = anyhow::Error::from(ExtractionError::InvalidQuery);
        assert!(describe_error(&err).starts_with("error[InvalidQuery]: "));
        let err = anyhow::anyhow!("plain failure");
        assert_eq!(describe_error(&err), "error: plain failure");
    }

    #[test]
    fn test_timeout_from_flag() {
        assert_eq!(timeout_from_flag(0), None);
        assert_eq!(timeout_from_flag(5), Some(Duration::from_secs(5)));
    }
}
