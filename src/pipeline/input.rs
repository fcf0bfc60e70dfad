//! Upload handling: turn a path, URL, or byte buffer into a transient file.
//!
//! Every document a session works on lives in exactly one
//! [`TransientUpload`], a `tempfile::NamedTempFile` owned by the session.
//! The file is removed when the upload is dropped, so it disappears whether
//! the session ends normally, an action fails, or opening the document
//! fails half-way. Local files are copied rather than used in place so the
//! session never holds a path it does not own.

use crate::error::PdfTopicsError;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// The uploaded PDF, stored in a file that is deleted on drop.
#[derive(Debug)]
pub struct TransientUpload {
    file: NamedTempFile,
    len: usize,
}

impl TransientUpload {
    /// Path of the transient file. Valid until the upload is dropped.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Size of the stored upload in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Delete the file now, reporting any error instead of ignoring it.
    pub fn close(self) -> Result<(), PdfTopicsError> {
        self.file
            .close()
            .map_err(|source| PdfTopicsError::UploadFailed { source })
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Store `bytes` as a transient upload and check that they look like a PDF.
///
/// On a failed check the file is removed before the error is returned.
pub fn stage_upload(bytes: &[u8], dir: Option<&Path>) -> Result<TransientUpload, PdfTopicsError> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("pdftopics-").suffix(".pdf");
    let mut file = match dir {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    }
    .map_err(|source| PdfTopicsError::UploadFailed { source })?;

    file.write_all(bytes)
        .and_then(|_| file.flush())
        .map_err(|source| PdfTopicsError::UploadFailed { source })?;

    let upload = TransientUpload {
        file,
        len: bytes.len(),
    };
    check_pdf_magic(bytes)?;

    debug!(
        "Staged {} byte upload at {}",
        upload.len,
        upload.path().display()
    );
    Ok(upload)
}

/// Reject buffers that do not start with the `%PDF` signature.
pub fn check_pdf_magic(bytes: &[u8]) -> Result<(), PdfTopicsError> {
    if bytes.starts_with(b"%PDF") {
        Ok(())
    } else {
        Err(PdfTopicsError::NotAPdf {
            magic: bytes.iter().take(4).copied().collect(),
        })
    }
}

/// Resolve a local path or URL into a transient upload.
pub async fn resolve_input(
    input: &str,
    upload_dir: Option<&Path>,
    download_timeout_secs: u64,
) -> Result<TransientUpload, PdfTopicsError> {
    let bytes = if is_url(input) {
        download_url(input, download_timeout_secs).await?
    } else {
        read_local(input).await?
    };
    stage_upload(&bytes, upload_dir)
}

async fn read_local(path_str: &str) -> Result<Vec<u8>, PdfTopicsError> {
    let path = PathBuf::from(path_str);
    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            debug!("Read {} bytes from {}", bytes.len(), path.display());
            Ok(bytes)
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(PdfTopicsError::PermissionDenied { path })
        }
        Err(_) => Err(PdfTopicsError::FileNotFound { path }),
    }
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<Vec<u8>, PdfTopicsError> {
    info!("Downloading PDF from: {}", url);

    let failed = |reason: String| PdfTopicsError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let classify = |e: reqwest::Error| {
        if e.is_timeout() {
            PdfTopicsError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    };

    let response = client.get(url).send().await.map_err(classify)?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let bytes = response.bytes().await.map_err(classify)?;
    info!("Downloaded {} bytes", bytes.len());
    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dir_is_empty(dir: &Path) -> bool {
        std::fs::read_dir(dir).unwrap().next().is_none()
    }

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn magic_check() {
        assert!(check_pdf_magic(b"%PDF-1.7\n...").is_ok());
        let err = check_pdf_magic(b"PK\x03\x04rest").unwrap_err();
        assert!(matches!(err, PdfTopicsError::NotAPdf { ref magic } if magic == b"PK\x03\x04"));
        assert!(check_pdf_magic(b"").is_err());
    }

    #[test]
    fn upload_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let upload = stage_upload(b"%PDF-1.4 body", Some(dir.path())).unwrap();
        let path = upload.path().to_path_buf();
        assert!(path.exists());
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4 body");
        assert_eq!(upload.len(), 13);

        drop(upload);
        assert!(!path.exists());
        assert!(dir_is_empty(dir.path()));
    }

    #[test]
    fn upload_is_removed_on_close() {
        let dir = tempfile::tempdir().unwrap();
        let upload = stage_upload(b"%PDF-1.4", Some(dir.path())).unwrap();
        let path = upload.path().to_path_buf();
        upload.close().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn rejected_upload_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let err = stage_upload(b"hello world", Some(dir.path())).unwrap_err();
        assert!(matches!(err, PdfTopicsError::NotAPdf { .. }));
        assert!(dir_is_empty(dir.path()));
    }

    #[tokio::test]
    async fn missing_local_file() {
        let err = resolve_input("/no/such/file.pdf", None, 5).await.unwrap_err();
        assert!(matches!(err, PdfTopicsError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn local_file_is_copied() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in.pdf");
        std::fs::write(&src, b"%PDF-1.5 local").unwrap();

        let upload = resolve_input(src.to_str().unwrap(), None, 5).await.unwrap();
        assert_ne!(upload.path(), src.as_path());
        assert_eq!(std::fs::read(upload.path()).unwrap(), b"%PDF-1.5 local");

        drop(upload);
        assert!(src.exists(), "the caller's file must not be touched");
    }
}
