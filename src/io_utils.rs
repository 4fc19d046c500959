use std::fmt;
use std::io;
use std::path::Path;

use crate::CisoError;

#[derive(Debug)]
pub struct CliError {
    pub msg: String,
    pub code: i32,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.msg.fmt(f)
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Suggestion shown next to an I/O error of the given kind.
pub fn io_suggestion(err: &io::Error) -> &'static str {
    use io::ErrorKind::*;
    match err.kind() {
        NotFound => "Check that the file exists and the path is correct.",
        PermissionDenied => "Check permissions or run as a different user.",
        UnexpectedEof => "File appears truncated or corrupted.",
        WriteZero => "Disk may be full. Free up space and try again.",
        Other if err.raw_os_error() == Some(28) => "Disk may be full. Free up space and try again.",
        _ => "Check permissions or free up disk space.",
    }
}

/// Format a user friendly I/O error message with suggestions.
pub fn format_io_error(operation: &str, path: &Path, err: &io::Error) -> String {
    format!(
        "Error {} '{}': {}. {}",
        operation,
        path.display(),
        err,
        io_suggestion(err)
    )
}

/// Convert an I/O error into a CLI error with context.
pub fn io_cli_error(operation: &str, path: &Path, err: io::Error) -> CliError {
    CliError {
        msg: format_io_error(operation, path, &err),
        code: 1,
        source: Some(Box::new(err)),
    }
}

/// Simple CLI error from string.
pub fn simple_cli_error(msg: &str) -> CliError {
    CliError {
        msg: msg.to_string(),
        code: 1,
        source: None,
    }
}

/// Convert a conversion error into a CLI error with a hint, keeping the
/// exit status of the error kind.
pub fn ciso_cli_error(input: &Path, err: CisoError) -> CliError {
    CliError {
        msg: format!("Converting '{}': {}", input.display(), cli_hint(&err)),
        code: err.exit_code(),
        source: Some(Box::new(err)),
    }
}

/// Return an actionable hint for a conversion error.
pub fn cli_hint(err: &CisoError) -> String {
    match err {
        CisoError::LayoutDetection(msg) => {
            format!("Could not detect ISO type ({msg}). Expected a Redump or raw XDVDFS Xbox image.")
        }
        CisoError::CodecInit(msg) => format!("CompressionContext creation failed ({msg})."),
        CisoError::Io { source, .. } => format!("{err}. {}", io_suggestion(source)),
        CisoError::Block { source, .. } | CisoError::Volume { source, .. } => {
            format!("{err}. {} Output volumes are incomplete.", io_suggestion(source))
        }
        CisoError::Format(msg) => format!("{msg}. The image cannot be stored as CISO."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hint_keeps_exit_code() {
        let e = ciso_cli_error(Path::new("a.iso"), CisoError::CodecInit("zero".into()));
        assert_eq!(e.code, 2);
        assert!(e.msg.contains("CompressionContext creation failed"));
    }

    #[test]
    fn volume_failure_mentions_incomplete_output() {
        let err = CisoError::Volume {
            volume: 2,
            source: io::Error::new(io::ErrorKind::WriteZero, "full"),
        };
        let msg = cli_hint(&err);
        assert!(msg.contains("volume 2"));
        assert!(msg.contains("Disk may be full"));
    }
}
