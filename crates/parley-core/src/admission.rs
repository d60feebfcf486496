//! Upload admission control at the transport boundary.
//!
//! This allow-list is deliberately coarser than the extraction pipeline's
//! dispatch table: it is the conservative, user-facing filter applied
//! before any row or blob exists. A type admitted here but unhandled at
//! dispatch falls through to the pipeline's generic "unsupported" failure.

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Exact MIME types admitted at upload, beyond the `image/*` and `text/*`
/// prefixes.
static ADMITTED_TYPES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "application/pdf",
        "application/msword",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "application/json",
        "audio/mpeg",
        "audio/mp3",
        "audio/wav",
        "audio/x-wav",
        "audio/mp4",
        "audio/ogg",
        "video/mp4",
        "video/quicktime",
        "video/x-msvideo",
        "video/x-matroska",
    ]
    .into_iter()
    .collect()
});

/// Whether a declared MIME type passes the upload admission filter.
pub fn is_admitted_type(content_type: &str) -> bool {
    let mime = content_type.to_lowercase();
    mime.starts_with("image/") || mime.starts_with("text/") || ADMITTED_TYPES.contains(mime.as_str())
}

/// Sanitize an uploaded filename for on-disk storage.
///
/// Strips path components, replaces control and reserved characters, and
/// bounds the length while preserving the extension.
pub fn sanitize_filename(filename: &str) -> String {
    // Remove path components
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);

    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let sanitized = sanitized.trim();
    if sanitized.is_empty() {
        return "unnamed_file".to_string();
    }

    // Truncate if too long (preserve extension)
    if sanitized.len() > 255 {
        if let Some(dot_pos) = sanitized.rfind('.') {
            let ext = &sanitized[dot_pos..];
            let name = &sanitized[..255 - ext.len()];
            return format!("{}{}", name, ext);
        }
        return sanitized[..255].to_string();
    }

    sanitized.to_string()
}

/// Detect the actual content type from magic bytes, falling back to the
/// declared type. Text formats have no magic bytes, so a declared `text/*`
/// type is trusted as-is.
pub fn detect_content_type(data: &[u8], claimed: &str) -> String {
    if let Some(kind) = infer::get(data) {
        return kind.mime_type().to_string();
    }
    claimed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExtractionStrategy;

    #[test]
    fn test_admitted_prefixes() {
        assert!(is_admitted_type("image/png"));
        assert!(is_admitted_type("image/webp"));
        assert!(is_admitted_type("text/plain"));
        assert!(is_admitted_type("text/csv"));
    }

    #[test]
    fn test_admitted_fixed_list() {
        assert!(is_admitted_type("application/pdf"));
        assert!(is_admitted_type("application/msword"));
        assert!(is_admitted_type(
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        ));
        assert!(is_admitted_type("audio/mpeg"));
        assert!(is_admitted_type("video/mp4"));
    }

    #[test]
    fn test_rejected_types() {
        assert!(!is_admitted_type("application/x-msdownload"));
        assert!(!is_admitted_type("application/octet-stream"));
        assert!(!is_admitted_type("application/zip"));
    }

    #[test]
    fn test_admitted_types_all_classify() {
        // Drift guard: everything on the fixed admission list must map to
        // some extraction strategy, so an admitted upload can never hit the
        // dispatch table's unsupported branch purely by MIME type.
        for mime in ADMITTED_TYPES.iter() {
            assert!(
                ExtractionStrategy::classify(mime, "file").is_some(),
                "admitted type {} does not classify",
                mime
            );
        }
    }

    #[test]
    fn test_sanitize_strips_paths() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\temp\\report.pdf"), "report.pdf");
    }

    #[test]
    fn test_sanitize_replaces_reserved() {
        assert_eq!(sanitize_filename("a<b>c.txt"), "a_b_c.txt");
        assert_eq!(sanitize_filename("we\u{0}ird.md"), "we_ird.md");
    }

    #[test]
    fn test_sanitize_empty() {
        assert_eq!(sanitize_filename(""), "unnamed_file");
        assert_eq!(sanitize_filename("   "), "unnamed_file");
    }

    #[test]
    fn test_sanitize_preserves_extension_on_truncate() {
        let long = format!("{}.pdf", "a".repeat(300));
        let sanitized = sanitize_filename(&long);
        assert!(sanitized.len() <= 255);
        assert!(sanitized.ends_with(".pdf"));
    }

    #[test]
    fn test_detect_content_type_magic_bytes() {
        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(detect_content_type(&png, "text/plain"), "image/png");
    }

    #[test]
    fn test_detect_content_type_fallback() {
        assert_eq!(
            detect_content_type(b"hello world", "text/plain"),
            "text/plain"
        );
    }
}
