//! Error types for the pdf-topics library.
//!
//! Three error types mirror the three ways a user action can go wrong:
//!
//! * [`PdfTopicsError`] — the action could not complete (unreadable upload,
//!   provider not configured, model call failed). Returned as `Err` from the
//!   session operations; the session itself stays usable.
//!
//! * [`RangeError`] — the page-range text did not parse or fell outside the
//!   document. Never returned on its own from the fail-soft path: it travels
//!   inside [`crate::range::RangeSelection`] next to the substituted
//!   full-document range.
//!
//! * [`GenerateError`] — a single model call failed. Wrapped into
//!   [`PdfTopicsError::Generation`] by the session.

use crate::progress::RequestKind;
use std::path::PathBuf;
use thiserror::Error;

/// All action-level errors returned by the pdf-topics library.
#[derive(Debug, Error)]
pub enum PdfTopicsError {
    // ── Upload errors ─────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'")]
    PermissionDenied { path: PathBuf },

    /// HTTP download failed.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    /// The upload was read, but it is not a PDF.
    #[error("Upload is not a PDF (first bytes: {magic:?})")]
    NotAPdf { magic: Vec<u8> },

    /// The transient upload file could not be created or written.
    #[error("Failed to store upload: {source}")]
    UploadFailed {
        #[source]
        source: std::io::Error,
    },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// pdfium could not parse the document.
    #[error("PDF is corrupt or unsupported: {detail}")]
    CorruptPdf { detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired,

    /// A password was provided but it is wrong.
    #[error("Wrong password for encrypted PDF")]
    WrongPassword,

    /// The document parsed but has no pages to select from.
    #[error("PDF has no pages")]
    EmptyDocument,

    /// Text extraction failed for a page.
    #[error("Text extraction failed for page {page}: {detail}")]
    ExtractionFailed { page: usize, detail: String },

    /// Preview rendering failed for a page.
    #[error("Preview rendering failed for page {page}: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// Preview requested for a session that has no backing file.
    #[error("No PDF file backs this session; previews are unavailable")]
    NoPreviewSource,

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Install pdfium system-wide or set PDFIUM_LIB_PATH=/path/to/libpdfium."
    )]
    PdfiumBindingFailed(String),

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// A model call failed.
    #[error("{kind} request failed: {source}")]
    Generation {
        kind: RequestKind,
        #[source]
        source: GenerateError,
    },

    /// A topic index did not name an entry of the current topic list.
    #[error("No topic #{index} (the current list has {len} topics)")]
    UnknownTopic { index: usize, len: usize },

    /// Summary requested before any topics were extracted.
    #[error("No topics yet; run topic extraction first")]
    NoTopics,

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Which part of the user-facing error taxonomy an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The uploaded file could not be stored or read as a PDF.
    Upload,
    /// The page-range text was rejected.
    Range,
    /// A model call failed.
    Llm,
    /// Anything else (configuration, output files, internal).
    Other,
}

impl PdfTopicsError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::FileNotFound { .. }
            | Self::PermissionDenied { .. }
            | Self::DownloadFailed { .. }
            | Self::DownloadTimeout { .. }
            | Self::NotAPdf { .. }
            | Self::UploadFailed { .. }
            | Self::CorruptPdf { .. }
            | Self::PasswordRequired
            | Self::WrongPassword
            | Self::EmptyDocument
            | Self::ExtractionFailed { .. }
            | Self::PdfiumBindingFailed(_) => ErrorCategory::Upload,
            Self::ProviderNotConfigured { .. } | Self::Generation { .. } => ErrorCategory::Llm,
            Self::UnknownTopic { .. } | Self::NoTopics => ErrorCategory::Llm,
            Self::RenderFailed { .. }
            | Self::NoPreviewSource
            | Self::OutputWriteFailed { .. }
            | Self::InvalidConfig(_)
            | Self::Internal(_) => ErrorCategory::Other,
        }
    }

    /// Follow-up advice to print under the error message, if any.
    pub fn user_hint(&self) -> Option<&'static str> {
        match self.category() {
            ErrorCategory::Upload if !matches!(self, Self::PdfiumBindingFailed(_)) => Some(
                "The PDF file might be corrupted or in an unsupported format. Please try another file.",
            ),
            _ => None,
        }
    }
}

/// A page-range string that could not be turned into a valid interval.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("page range is empty")]
    Empty,

    #[error("'{token}' is not a page number")]
    InvalidNumber { token: String },

    #[error("'{input}' is not of the form <start>-<end>")]
    Malformed { input: String },

    #[error("range {start}-{end} is reversed; start must be <= end")]
    Reversed { start: usize, end: usize },

    #[error("page {page} is out of range (document has {total} pages)")]
    OutOfBounds { page: usize, total: usize },
}

/// Failure of a single model call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    /// Transport-level failure or a non-retryable API error.
    #[error("network error: {0}")]
    Network(String),

    /// HTTP 429 / quota exhausted.
    #[error("quota or rate limit exceeded: {0}")]
    Quota(String),

    /// The call succeeded but the response carried no usable text.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The call exceeded the configured API timeout.
    #[error("timed out after {secs}s")]
    Timeout { secs: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_errors_carry_try_another_file_hint() {
        let e = PdfTopicsError::CorruptPdf {
            detail: "bad xref".into(),
        };
        assert_eq!(e.category(), ErrorCategory::Upload);
        assert!(e.user_hint().unwrap().contains("try another file"));
    }

    #[test]
    fn pdfium_binding_failure_has_no_file_hint() {
        let e = PdfTopicsError::PdfiumBindingFailed("missing".into());
        assert_eq!(e.category(), ErrorCategory::Upload);
        assert!(e.user_hint().is_none());
    }

    #[test]
    fn generation_error_display() {
        let e = PdfTopicsError::Generation {
            kind: RequestKind::Summary,
            source: GenerateError::Quota("429".into()),
        };
        assert_eq!(e.category(), ErrorCategory::Llm);
        let msg = e.to_string();
        assert!(msg.contains("summary"), "got: {msg}");
        assert!(msg.contains("quota"), "got: {msg}");
    }

    #[test]
    fn range_error_display() {
        let e = RangeError::OutOfBounds { page: 12, total: 10 };
        assert!(e.to_string().contains("12"));
        assert!(e.to_string().contains("10 pages"));
    }
}
