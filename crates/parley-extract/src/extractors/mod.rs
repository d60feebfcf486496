//! Content extractors, one per content family.

pub mod audio;
pub mod document;
pub mod image;
pub mod pdf;
pub mod text;
pub mod video;

pub use audio::AudioExtractor;
pub use document::DocumentExtractor;
pub use image::ImageExtractor;
pub use pdf::PdfExtractor;
pub use text::TextExtractor;
pub use video::VideoExtractor;

use once_cell::sync::Lazy;
use regex::Regex;
use tokio::process::Command;

use parley_core::Result;

static NEWLINE_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("valid newline regex"));

/// Normalize extracted text for downstream context assembly.
///
/// `\r\n` becomes `\n`, runs of three or more newlines collapse to exactly
/// two, and leading/trailing whitespace is trimmed. Applied identically by
/// every text-bearing strategy, and idempotent: cleaning cleaned text is a
/// no-op.
pub fn normalize_text(input: &str) -> String {
    let unix = input.replace("\r\n", "\n");
    let collapsed = NEWLINE_RUNS.replace_all(&unix, "\n\n");
    collapsed.trim().to_string()
}

/// Run an external command with a timeout, returning stdout as a string.
pub(crate) async fn run_cmd_with_timeout(cmd: &mut Command, timeout_secs: u64) -> Result<String> {
    let output = tokio::time::timeout(std::time::Duration::from_secs(timeout_secs), cmd.output())
        .await
        .map_err(|_| {
            parley_core::Error::Timeout(format!(
                "External command timed out after {}s",
                timeout_secs
            ))
        })?
        .map_err(|e| {
            parley_core::Error::Extraction(format!("Failed to execute command: {}", e))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(parley_core::Error::Extraction(format!(
            "Command failed (exit {}): {}",
            output.status,
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_crlf() {
        assert_eq!(normalize_text("a\r\nb"), "a\nb");
    }

    #[test]
    fn test_normalize_collapses_newline_runs() {
        assert_eq!(normalize_text("Hello\n\n\nWorld"), "Hello\n\nWorld");
        assert_eq!(normalize_text("a\n\n\n\n\n\nb"), "a\n\nb");
        // Exactly two newlines are preserved
        assert_eq!(normalize_text("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn test_normalize_mixed_crlf_runs() {
        assert_eq!(normalize_text("Hello\r\n\r\n\r\nWorld"), "Hello\n\nWorld");
    }

    #[test]
    fn test_normalize_trims() {
        assert_eq!(normalize_text("  \n content \n  "), "content");
    }

    #[test]
    fn test_normalize_idempotent() {
        let inputs = [
            "Hello\r\n\r\n\r\nWorld",
            "  padded  ",
            "a\n\n\nb\n\n\n\nc",
            "already\n\nclean",
        ];
        for input in inputs {
            let once = normalize_text(input);
            let twice = normalize_text(&once);
            assert_eq!(once, twice, "normalize not idempotent for {:?}", input);
        }
    }
}
