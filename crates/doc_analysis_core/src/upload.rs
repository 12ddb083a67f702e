//! crates/doc_analysis_core/src/upload.rs
//!
//! Upload validation and placeholder content extraction.

use crate::ports::{ContentExtractor, PortError, PortResult};
use crate::templates::SAMPLE_PARAGRAPHS;
use async_trait::async_trait;
use rand::seq::SliceRandom;
use tracing::debug;

/// The largest upload accepted, in bytes (10 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// The document formats an upload may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptedFormat {
    Pdf,
    Docx,
    PlainText,
}

impl AcceptedFormat {
    pub const ALL: [AcceptedFormat; 3] = [
        AcceptedFormat::Pdf,
        AcceptedFormat::Docx,
        AcceptedFormat::PlainText,
    ];

    pub fn mime_type(self) -> &'static str {
        match self {
            AcceptedFormat::Pdf => "application/pdf",
            AcceptedFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            AcceptedFormat::PlainText => "text/plain",
        }
    }

    /// The file extension a picker should offer for this format.
    pub fn extension(self) -> &'static str {
        match self {
            AcceptedFormat::Pdf => ".pdf",
            AcceptedFormat::Docx => ".docx",
            AcceptedFormat::PlainText => ".txt",
        }
    }

    pub fn from_mime_type(mime: &str) -> Option<Self> {
        AcceptedFormat::ALL
            .into_iter()
            .find(|format| format.mime_type() == mime)
    }
}

/// Anything that can describe a candidate upload: a browser file, a
/// multipart part, or a plain descriptor in tests.
pub trait FileSource: Send + Sync {
    fn file_name(&self) -> &str;
    /// The MIME type declared by the client. Never sniffed from the bytes.
    fn declared_type(&self) -> &str;
    fn byte_size(&self) -> u64;
}

/// A plain description of a candidate upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
}

impl FileDescriptor {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size,
        }
    }
}

impl FileSource for FileDescriptor {
    fn file_name(&self) -> &str {
        &self.name
    }

    fn declared_type(&self) -> &str {
        &self.mime_type
    }

    fn byte_size(&self) -> u64 {
        self.size
    }
}

/// Why an upload was refused. The messages are shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please upload a PDF, DOCX, or TXT file.")]
    UnsupportedType(String),
    #[error("File size must be less than 10MB.")]
    TooLarge(u64),
}

/// Checks the declared type against the allow-list, then the size ceiling.
pub fn validate(file: &dyn FileSource) -> Result<AcceptedFormat, ValidationError> {
    let format = AcceptedFormat::from_mime_type(file.declared_type())
        .ok_or_else(|| ValidationError::UnsupportedType(file.declared_type().to_string()))?;

    if file.byte_size() > MAX_UPLOAD_BYTES {
        return Err(ValidationError::TooLarge(file.byte_size()));
    }

    Ok(format)
}

//=========================================================================================
// `ContentExtractor` Implementation
//=========================================================================================

/// Stands in for real parsing by handing out one of the sample paragraphs,
/// chosen uniformly at random.
#[derive(Debug, Clone, Default)]
pub struct SampleContentExtractor;

impl SampleContentExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ContentExtractor for SampleContentExtractor {
    async fn extract(&self, file_name: &str) -> PortResult<String> {
        let paragraph = SAMPLE_PARAGRAPHS
            .choose(&mut rand::thread_rng())
            .ok_or_else(|| PortError::Unexpected("Sample paragraph pool is empty".to_string()))?;
        debug!("Substituting sample content for '{}'", file_name);
        Ok(paragraph.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_all_allowed_types() {
        for format in AcceptedFormat::ALL {
            let file = FileDescriptor::new("doc", format.mime_type(), 1024);
            assert_eq!(validate(&file), Ok(format));
        }
    }

    #[test]
    fn test_rejects_disallowed_type() {
        let file = FileDescriptor::new("image.png", "image/png", 10);
        let err = validate(&file).unwrap_err();
        assert_eq!(err, ValidationError::UnsupportedType("image/png".to_string()));
        assert_eq!(err.to_string(), "Please upload a PDF, DOCX, or TXT file.");
    }

    #[test]
    fn test_extension_alone_is_not_enough() {
        let file = FileDescriptor::new("notes.txt", "application/octet-stream", 10);
        assert!(matches!(
            validate(&file),
            Err(ValidationError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_size_ceiling_is_inclusive() {
        let at_limit = FileDescriptor::new("a.pdf", "application/pdf", MAX_UPLOAD_BYTES);
        assert!(validate(&at_limit).is_ok());

        let over = FileDescriptor::new("a.pdf", "application/pdf", MAX_UPLOAD_BYTES + 1);
        let err = validate(&over).unwrap_err();
        assert_eq!(err, ValidationError::TooLarge(10_485_761));
        assert_eq!(err.to_string(), "File size must be less than 10MB.");
    }

    #[test]
    fn test_format_metadata() {
        assert_eq!(AcceptedFormat::Docx.extension(), ".docx");
        assert_eq!(
            AcceptedFormat::from_mime_type("text/plain"),
            Some(AcceptedFormat::PlainText)
        );
        assert_eq!(AcceptedFormat::from_mime_type("text/html"), None);
    }

    #[tokio::test]
    async fn test_sample_extractor_draws_from_pool() {
        let extractor = SampleContentExtractor::new();
        for _ in 0..10 {
            let content = extractor.extract("report.pdf").await.unwrap();
            assert!(SAMPLE_PARAGRAPHS.contains(&content.as_str()));
        }
    }
}
