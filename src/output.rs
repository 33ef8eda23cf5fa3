//! Conversion results handed from the dispatcher to the response writer.

use serde::Serialize;

/// A re-serialised binary document plus the headers it should be sent with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryPayload {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub filename: &'static str,
}

impl BinaryPayload {
    /// `Content-Disposition` header value offering the payload as a download.
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }
}

/// Outcome of exactly one format handler.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionResult {
    /// Raw bytes (PDF round-trip).
    Binary(BinaryPayload),
    /// A JSON value (DOCX text, XLSX rows).
    Structured(serde_json::Value),
}

impl ConversionResult {
    /// Wrap any serialisable value as a structured payload.
    pub fn structured<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(ConversionResult::Structured)
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, ConversionResult::Binary(_))
    }

    /// MIME type of the body this result produces.
    pub fn content_type(&self) -> &'static str {
        match self {
            ConversionResult::Binary(p) => p.content_type,
            ConversionResult::Structured(_) => "application/json",
        }
    }
}

/// Body of a DOCX conversion.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_disposition_quotes_filename() {
        let p = BinaryPayload {
            bytes: vec![],
            content_type: "application/pdf",
            filename: "converted.pdf",
        };
        assert_eq!(
            p.content_disposition(),
            "attachment; filename=\"converted.pdf\""
        );
    }

    #[test]
    fn structured_text_shape() {
        let r = ConversionResult::structured(&ExtractedText {
            text: "Hello World".into(),
        })
        .unwrap();
        assert_eq!(r, ConversionResult::Structured(serde_json::json!({ "text": "Hello World" })));
        assert_eq!(r.content_type(), "application/json");
        assert!(!r.is_binary());
    }
}
