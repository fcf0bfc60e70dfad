//! Page text extraction via pdfium.
//!
//! The rest of the crate only sees the [`PageSource`] capability: a page
//! count and the text of a 1-indexed page. [`PdfPages`] reads text lazily:
//! [`PageSource::prefetch`] loads the pages of a range that are not cached
//! yet, on a blocking thread, because `pdfium-render` keeps thread-local
//! state and must not run on the async executor. Opening a session therefore
//! only reads metadata, however long the document is.

use crate::error::PdfTopicsError;
use crate::output::DocumentMetadata;
use crate::progress::ProgressCallback;
use crate::range::PageRange;
use futures::future::BoxFuture;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// Anything that can hand out the extracted text of a document's pages.
pub trait PageSource: Send + Sync {
    /// Total number of pages.
    fn page_count(&self) -> usize;

    /// Extracted text of a 1-indexed page.
    fn extract_text(&self, page_num: usize) -> Result<String, PdfTopicsError>;

    /// Make the pages of `range` available to [`PageSource::extract_text`].
    ///
    /// Sources that hold all their text in memory need not override this.
    fn prefetch<'a>(&'a self, range: PageRange) -> BoxFuture<'a, Result<(), PdfTopicsError>> {
        let _ = range;
        Box::pin(async { Ok(()) })
    }
}

/// Page texts held in memory, in page order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedDocument {
    pages: Vec<String>,
}

impl ExtractedDocument {
    /// Wrap already-extracted page texts; `pages[0]` is page 1.
    pub fn from_pages(pages: Vec<String>) -> Self {
        Self { pages }
    }
}

impl PageSource for ExtractedDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn extract_text(&self, page_num: usize) -> Result<String, PdfTopicsError> {
        page_num
            .checked_sub(1)
            .and_then(|idx| self.pages.get(idx))
            .cloned()
            .ok_or_else(|| PdfTopicsError::ExtractionFailed {
                page: page_num,
                detail: format!("document has {} pages", self.pages.len()),
            })
    }
}

/// Bind to pdfium: `PDFIUM_LIB_PATH` if set, else the system library.
pub(crate) fn bind_pdfium() -> Result<Pdfium, PdfTopicsError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(path) if !path.is_empty() => {
            debug!("Binding pdfium from {}", path);
            Pdfium::bind_to_library(path)
        }
        _ => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| PdfTopicsError::PdfiumBindingFailed(format!("{:?}", e)))?;
    Ok(Pdfium::new(bindings))
}

/// Open a PDF, mapping pdfium's load error to a user-facing one.
pub(crate) fn open_pdf<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, PdfTopicsError> {
    pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                PdfTopicsError::WrongPassword
            } else {
                PdfTopicsError::PasswordRequired
            }
        } else {
            PdfTopicsError::CorruptPdf { detail: err_str }
        }
    })
}

/// pdfium's 0-based index for a 1-indexed page number, if it has one.
pub(crate) fn pdfium_index(page_num: usize) -> Option<u16> {
    page_num
        .checked_sub(1)
        .and_then(|idx| u16::try_from(idx).ok())
}

/// Text of a PDF on disk, read page by page on first use and then cached.
pub struct PdfPages {
    path: PathBuf,
    password: Option<String>,
    cache: Mutex<Vec<Option<String>>>,
    progress: Option<ProgressCallback>,
}

impl PdfPages {
    fn new(
        path: PathBuf,
        password: Option<String>,
        page_count: usize,
        progress: Option<ProgressCallback>,
    ) -> Self {
        Self {
            path,
            password,
            cache: Mutex::new(vec![None; page_count]),
            progress,
        }
    }

    fn lock_cache(&self) -> Result<MutexGuard<'_, Vec<Option<String>>>, PdfTopicsError> {
        self.cache
            .lock()
            .map_err(|_| PdfTopicsError::Internal("page cache lock poisoned".to_string()))
    }

    /// Pages of `range` whose text has not been read yet.
    fn missing(&self, range: PageRange) -> Result<Vec<usize>, PdfTopicsError> {
        let cache = self.lock_cache()?;
        Ok(range
            .pages()
            .filter(|&n| matches!(cache.get(n - 1), Some(None)))
            .collect())
    }
}

impl PageSource for PdfPages {
    fn page_count(&self) -> usize {
        self.lock_cache().map(|c| c.len()).unwrap_or(0)
    }

    fn extract_text(&self, page_num: usize) -> Result<String, PdfTopicsError> {
        let cache = self.lock_cache()?;
        match page_num.checked_sub(1).and_then(|idx| cache.get(idx)) {
            Some(Some(text)) => Ok(text.clone()),
            Some(None) => Err(PdfTopicsError::ExtractionFailed {
                page: page_num,
                detail: "page text has not been loaded".to_string(),
            }),
            None => Err(PdfTopicsError::ExtractionFailed {
                page: page_num,
                detail: format!("document has {} pages", cache.len()),
            }),
        }
    }

    fn prefetch<'a>(&'a self, range: PageRange) -> BoxFuture<'a, Result<(), PdfTopicsError>> {
        Box::pin(async move {
            let missing = self.missing(range)?;
            if missing.is_empty() {
                return Ok(());
            }

            let path = self.path.clone();
            let pwd = self.password.clone();
            let progress = self.progress.clone();
            let texts = tokio::task::spawn_blocking(move || {
                read_pages_blocking(&path, pwd.as_deref(), &missing, progress)
            })
            .await
            .map_err(|e| PdfTopicsError::Internal(format!("Extraction task panicked: {}", e)))??;

            let mut cache = self.lock_cache()?;
            for (page_num, text) in texts {
                if let Some(slot) = cache.get_mut(page_num - 1) {
                    *slot = Some(text);
                }
            }
            Ok(())
        })
    }
}

/// Open a PDF and read its metadata; page text is left for [`PdfPages`].
pub async fn open_document(
    pdf_path: &Path,
    password: Option<&str>,
    progress: Option<ProgressCallback>,
) -> Result<(DocumentMetadata, PdfPages), PdfTopicsError> {
    let metadata = extract_metadata(pdf_path, password).await?;
    info!("PDF loaded: {} pages", metadata.page_count);
    let pages = PdfPages::new(
        pdf_path.to_path_buf(),
        password.map(str::to_string),
        metadata.page_count,
        progress,
    );
    Ok((metadata, pages))
}

fn read_pages_blocking(
    pdf_path: &Path,
    password: Option<&str>,
    page_nums: &[usize],
    progress: Option<ProgressCallback>,
) -> Result<Vec<(usize, String)>, PdfTopicsError> {
    let pdfium = bind_pdfium()?;
    let document = open_pdf(&pdfium, pdf_path, password)?;
    let pages = document.pages();
    let batch = page_nums.len();

    if let Some(ref cb) = progress {
        cb.on_extraction_start(batch);
    }

    let mut texts = Vec::with_capacity(batch);
    for &page_num in page_nums {
        let failed = |detail: String| PdfTopicsError::ExtractionFailed {
            page: page_num,
            detail,
        };
        let index = pdfium_index(page_num)
            .ok_or_else(|| failed("page number outside pdfium's index range".to_string()))?;
        let text = pages
            .get(index)
            .map_err(|e| failed(format!("{:?}", e)))?
            .text()
            .map_err(|e| failed(format!("{:?}", e)))?
            .all();
        debug!("Page {}: {} bytes of text", page_num, text.len());
        if let Some(ref cb) = progress {
            cb.on_page_extracted(page_num, batch, text.len());
        }
        texts.push((page_num, text));
    }

    Ok(texts)
}

/// Extract document metadata without reading page text.
pub async fn extract_metadata(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentMetadata, PdfTopicsError> {
    let path = pdf_path.to_path_buf();
    let pwd = password.map(str::to_string);

    tokio::task::spawn_blocking(move || {
        let pdfium = bind_pdfium()?;
        let document = open_pdf(&pdfium, &path, pwd.as_deref())?;
        Ok(read_metadata(&document))
    })
    .await
    .map_err(|e| PdfTopicsError::Internal(format!("Metadata task panicked: {}", e)))?
}

fn read_metadata(document: &PdfDocument<'_>) -> DocumentMetadata {
    let metadata = document.metadata();

    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata.get(tag).and_then(|t| {
            let v = t.value().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        })
    };

    DocumentMetadata {
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        subject: get_meta(PdfDocumentMetadataTagType::Subject),
        creator: get_meta(PdfDocumentMetadataTagType::Creator),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
        creation_date: get_meta(PdfDocumentMetadataTagType::CreationDate),
        modification_date: get_meta(PdfDocumentMetadataTagType::ModificationDate),
        page_count: document.pages().len() as usize,
        pdf_version: format!("{:?}", document.version()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_pages_are_one_indexed() {
        let doc = ExtractedDocument::from_pages(vec!["one".into(), "two".into()]);
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.extract_text(1).unwrap(), "one");
        assert_eq!(doc.extract_text(2).unwrap(), "two");
    }

    #[test]
    fn out_of_range_page_is_an_error() {
        let doc = ExtractedDocument::from_pages(vec!["only".into()]);
        assert!(matches!(
            doc.extract_text(0),
            Err(PdfTopicsError::ExtractionFailed { page: 0, .. })
        ));
        assert!(matches!(
            doc.extract_text(2),
            Err(PdfTopicsError::ExtractionFailed { page: 2, .. })
        ));
    }

    #[test]
    fn pdfium_index_is_zero_based_u16() {
        assert_eq!(pdfium_index(1), Some(0));
        assert_eq!(pdfium_index(900), Some(899));
        assert_eq!(pdfium_index(0), None);
        assert_eq!(pdfium_index(70_000), None);
    }

    fn unread_pages(count: usize) -> PdfPages {
        PdfPages::new(PathBuf::from("/nonexistent.pdf"), None, count, None)
    }

    #[test]
    fn lazy_pages_start_unread() {
        let pages = unread_pages(900);
        assert_eq!(pages.page_count(), 900);
        assert!(matches!(
            pages.extract_text(900),
            Err(PdfTopicsError::ExtractionFailed { page: 900, .. })
        ));
        let range = PageRange::new(899, 900, 900).unwrap();
        assert_eq!(pages.missing(range).unwrap(), vec![899, 900]);
    }

    #[test]
    fn cached_pages_are_not_read_again() {
        let pages = unread_pages(3);
        pages.lock_cache().unwrap()[1] = Some("two".into());

        assert_eq!(pages.extract_text(2).unwrap(), "two");
        let all = PageRange::full(3);
        assert_eq!(pages.missing(all).unwrap(), vec![1, 3]);

        // Nothing missing means no pdfium access, so this succeeds without a file.
        let only_cached = PageRange::new(2, 2, 3).unwrap();
        tokio_test::block_on(pages.prefetch(only_cached)).unwrap();
    }

    #[tokio::test]
    async fn in_memory_prefetch_is_a_no_op() {
        let doc = ExtractedDocument::from_pages(vec!["a".into()]);
        doc.prefetch(PageRange::full(1)).await.unwrap();
        assert_eq!(doc.extract_text(1).unwrap(), "a");
    }
}
