//! Text extractor — plain and lightly-structured text files.

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use parley_core::{
    file_extension, ContentExtractor, ContentMetadata, ExtractionOutcome, ExtractionStrategy,
    JsonShape, Result, TextStructure,
};

use super::normalize_text;

/// Extractor for plain text files (txt, md, json, csv and any `text/*`).
///
/// Decodes bytes as UTF-8 (with lossy conversion for invalid sequences),
/// normalizes whitespace, and records a shallow structural summary for
/// JSON and CSV files. A JSON file that fails to parse is treated as plain
/// text rather than failed.
pub struct TextExtractor;

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

/// Shallow shape of a JSON document: top-level type, key sets, array length.
fn json_shape(text: &str) -> Option<JsonShape> {
    match serde_json::from_str::<JsonValue>(text).ok()? {
        JsonValue::Object(map) => Some(JsonShape::Object {
            keys: map.keys().cloned().collect(),
        }),
        JsonValue::Array(arr) => Some(JsonShape::Array {
            length: arr.len(),
            element_keys: arr
                .first()
                .and_then(|v| v.as_object())
                .map(|m| m.keys().cloned().collect())
                .unwrap_or_default(),
        }),
        other => Some(JsonShape::Scalar {
            value_type: json_type_name(&other).to_string(),
        }),
    }
}

#[async_trait]
impl ContentExtractor for TextExtractor {
    fn strategy(&self) -> ExtractionStrategy {
        ExtractionStrategy::Text
    }

    async fn extract(
        &self,
        data: &[u8],
        filename: &str,
        _mime_type: &str,
    ) -> Result<ExtractionOutcome> {
        let raw = String::from_utf8_lossy(data);
        let text = normalize_text(&raw);

        let structure = match file_extension(filename).as_deref() {
            // Parse failure is silently ignored; the content stays plain text
            Some("json") => json_shape(&text).map(TextStructure::Json),
            // Line count, not a real CSV parse
            Some("csv") => Some(TextStructure::Csv {
                row_count: text.lines().count(),
            }),
            _ => None,
        };

        let metadata = ContentMetadata::Text {
            char_count: text.len(),
            line_count: text.lines().count(),
            structure,
        };

        Ok(ExtractionOutcome::completed(text, metadata))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true) // No external dependencies
    }

    fn name(&self) -> &str {
        "text"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::AttachmentStatus;

    #[tokio::test]
    async fn test_plain_text_is_cleaned() {
        let extractor = TextExtractor;
        let result = extractor
            .extract(b"Hello\r\n\r\n\r\nWorld", "notes.txt", "text/plain")
            .await
            .unwrap();

        assert_eq!(result.status, AttachmentStatus::Completed);
        assert_eq!(result.extracted_content, "Hello\n\nWorld");
        match result.metadata {
            Some(ContentMetadata::Text {
                line_count,
                structure,
                ..
            }) => {
                assert_eq!(line_count, 3);
                assert!(structure.is_none());
            }
            other => panic!("unexpected metadata: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_json_object_shape() {
        let extractor = TextExtractor;
        let result = extractor
            .extract(
                br#"{"name": "acme", "tier": 2}"#,
                "client.json",
                "application/json",
            )
            .await
            .unwrap();

        match result.metadata {
            Some(ContentMetadata::Text {
                structure: Some(TextStructure::Json(JsonShape::Object { keys })),
                ..
            }) => {
                assert_eq!(keys, vec!["name".to_string(), "tier".to_string()]);
            }
            other => panic!("unexpected metadata: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_json_array_shape() {
        let extractor = TextExtractor;
        let result = extractor
            .extract(
                br#"[{"id": 1, "amount": 10}, {"id": 2, "amount": 20}]"#,
                "invoices.json",
                "application/json",
            )
            .await
            .unwrap();

        match result.metadata {
            Some(ContentMetadata::Text {
                structure: Some(TextStructure::Json(JsonShape::Array {
                    length,
                    element_keys,
                })),
                ..
            }) => {
                assert_eq!(length, 2);
                assert_eq!(element_keys, vec!["amount".to_string(), "id".to_string()]);
            }
            other => panic!("unexpected metadata: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_json_completes_as_plain_text() {
        let extractor = TextExtractor;
        let result = extractor
            .extract(b"{not valid json", "broken.json", "application/json")
            .await
            .unwrap();

        assert_eq!(result.status, AttachmentStatus::Completed);
        assert_eq!(result.extracted_content, "{not valid json");
        match result.metadata {
            Some(ContentMetadata::Text { structure, .. }) => assert!(structure.is_none()),
            other => panic!("unexpected metadata: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_csv_row_count() {
        let extractor = TextExtractor;
        let result = extractor
            .extract(b"name,mrr\nacme,1200\nglobex,900", "clients.csv", "text/csv")
            .await
            .unwrap();

        match result.metadata {
            Some(ContentMetadata::Text {
                structure: Some(TextStructure::Csv { row_count }),
                ..
            }) => assert_eq!(row_count, 3),
            other => panic!("unexpected metadata: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_lossy() {
        let extractor = TextExtractor;
        let data: &[u8] = &[0xFF, 0xFE, b'h', b'i'];
        let result = extractor.extract(data, "binary.txt", "text/plain").await.unwrap();

        assert!(result.extracted_content.contains("hi"));
        assert!(result.extracted_content.contains('\u{FFFD}'));
    }
}
