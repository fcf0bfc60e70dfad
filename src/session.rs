//! One interactive session over one uploaded PDF.
//!
//! A [`Session`] owns everything a user works with: the transient upload,
//! the extracted page text, the current page range, the last topic list and
//! the last summary. Nothing is shared between sessions and nothing outlives
//! one; dropping the session deletes the upload.
//!
//! Every action reports its own failure and leaves the session usable: a bad
//! range falls back to the whole document, a failed model call leaves the
//! previous topics in place.

use crate::config::SessionConfig;
use crate::error::{PdfTopicsError, RangeError};
use crate::output::{DocumentMetadata, PagePreview, Summary, TopicList};
use crate::pipeline::aggregate::aggregate_text;
use crate::pipeline::extract::{self, PageSource};
use crate::pipeline::input::{self, TransientUpload};
use crate::pipeline::llm::{self, TextGenerator};
use crate::pipeline::render;
use crate::range::{select_page_range, PageRange, RangeSelection};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// State of one user's work on one document.
pub struct Session {
    config: SessionConfig,
    upload: Option<TransientUpload>,
    metadata: DocumentMetadata,
    document: Box<dyn PageSource>,
    range: PageRange,
    generator: Option<Arc<dyn TextGenerator>>,
    topics: Option<TopicList>,
    last_summary: Option<Summary>,
}

impl Session {
    /// Open a local PDF or an HTTP/HTTPS URL.
    pub async fn open(input: &str, config: SessionConfig) -> Result<Self, PdfTopicsError> {
        info!("Opening {}", input);
        let upload = input::resolve_input(
            input,
            config.upload_dir.as_deref(),
            config.download_timeout_secs,
        )
        .await?;
        Self::from_upload(upload, config).await
    }

    /// Open a PDF held in memory.
    pub async fn open_bytes(bytes: &[u8], config: SessionConfig) -> Result<Self, PdfTopicsError> {
        let upload = input::stage_upload(bytes, config.upload_dir.as_deref())?;
        Self::from_upload(upload, config).await
    }

    /// Start a session over text that has already been extracted.
    ///
    /// Such a session has no file behind it, so [`Session::preview`] is
    /// unavailable.
    pub fn from_document(
        document: impl PageSource + 'static,
        config: SessionConfig,
    ) -> Result<Self, PdfTopicsError> {
        let metadata = DocumentMetadata {
            page_count: document.page_count(),
            ..Default::default()
        };
        Self::assemble(None, metadata, Box::new(document), config)
    }

    async fn from_upload(
        upload: TransientUpload,
        config: SessionConfig,
    ) -> Result<Self, PdfTopicsError> {
        // On error `upload` is dropped here, which deletes the file.
        let (metadata, document) = extract::open_document(
            upload.path(),
            config.password.as_deref(),
            config.progress_callback.clone(),
        )
        .await?;
        Self::assemble(Some(upload), metadata, Box::new(document), config)
    }

    fn assemble(
        upload: Option<TransientUpload>,
        metadata: DocumentMetadata,
        document: Box<dyn PageSource>,
        config: SessionConfig,
    ) -> Result<Self, PdfTopicsError> {
        let total = document.page_count();
        if total == 0 {
            return Err(PdfTopicsError::EmptyDocument);
        }
        info!("Session ready: {} pages", total);
        Ok(Self {
            config,
            upload,
            metadata,
            document,
            range: PageRange::full(total),
            generator: None,
            topics: None,
            last_summary: None,
        })
    }

    pub fn total_pages(&self) -> usize {
        self.document.page_count()
    }

    pub fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The page range currently in effect.
    pub fn range(&self) -> PageRange {
        self.range
    }

    /// Topics from the last successful extraction.
    pub fn topics(&self) -> Option<&TopicList> {
        self.topics.as_ref()
    }

    /// The most recent summary, for copying.
    pub fn last_summary(&self) -> Option<&Summary> {
        self.last_summary.as_ref()
    }

    /// Path of the transient upload, if the session has one.
    pub fn upload_path(&self) -> Option<&Path> {
        self.upload.as_ref().map(TransientUpload::path)
    }

    /// Parse typed range text and make the result current.
    ///
    /// Never fails: rejected input selects the whole document and the
    /// returned selection carries the reason.
    pub fn select_range(&mut self, input: &str) -> RangeSelection {
        let selection = select_page_range(input, self.total_pages());
        if let Some(ref e) = selection.error {
            warn!("Invalid page range {:?}: {}. Using default.", input, e);
        }
        self.range = selection.range;
        selection
    }

    /// Set the range from two page numbers, as a slider would.
    ///
    /// Invalid bounds are rejected and the current range is kept.
    pub fn set_range(&mut self, start: usize, end: usize) -> Result<PageRange, RangeError> {
        let range = PageRange::new(start, end, self.total_pages())?;
        self.range = range;
        Ok(range)
    }

    /// Text of the current range, newline-joined in page order.
    ///
    /// Pages are read from the PDF the first time a range includes them.
    pub async fn aggregated_text(&self) -> Result<String, PdfTopicsError> {
        self.document.prefetch(self.range).await?;
        aggregate_text(self.document.as_ref(), self.range)
    }

    fn generator(&mut self) -> Result<Arc<dyn TextGenerator>, PdfTopicsError> {
        if let Some(ref generator) = self.generator {
            return Ok(Arc::clone(generator));
        }
        let generator = llm::resolve_generator(&self.config)?;
        self.generator = Some(Arc::clone(&generator));
        Ok(generator)
    }

    /// Ask the model which topics the current range discusses.
    ///
    /// The stored topic list is replaced only when the call succeeds.
    pub async fn extract_topics(&mut self) -> Result<&TopicList, PdfTopicsError> {
        let generator = self.generator()?;
        let text = self.aggregated_text().await?;
        let topics = llm::request_topics(generator.as_ref(), &text, &self.config).await?;
        info!("Extracted {} topics from pages {}", topics.len(), self.range);
        Ok(&*self.topics.insert(topics))
    }

    /// Summarise `topic` over the current range. Always asks the model.
    pub async fn summarize(&mut self, topic: &str) -> Result<&Summary, PdfTopicsError> {
        let generator = self.generator()?;
        let text = self.aggregated_text().await?;
        let summary = llm::request_summary(generator.as_ref(), topic, &text, &self.config).await?;
        Ok(&*self.last_summary.insert(Summary {
            topic: topic.to_string(),
            range: self.range,
            text: summary,
        }))
    }

    /// Summarise the topic at a 0-based position of the current topic list.
    pub async fn summarize_index(&mut self, index: usize) -> Result<&Summary, PdfTopicsError> {
        let topics = self.topics.as_ref().ok_or(PdfTopicsError::NoTopics)?;
        let topic = topics
            .get(index)
            .ok_or(PdfTopicsError::UnknownTopic {
                index,
                len: topics.len(),
            })?
            .to_string();
        self.summarize(&topic).await
    }

    /// Render the current range to PNG files in `out_dir`.
    pub async fn preview(&self, out_dir: &Path) -> Result<Vec<PagePreview>, PdfTopicsError> {
        let upload = self.upload.as_ref().ok_or(PdfTopicsError::NoPreviewSource)?;
        render::render_previews(
            upload.path(),
            self.config.password.as_deref(),
            self.range,
            out_dir,
            self.config.preview_max_pixels,
        )
        .await
    }

    /// End the session now and delete the transient upload.
    pub fn close(mut self) -> Result<(), PdfTopicsError> {
        match self.upload.take() {
            Some(upload) => upload.close(),
            None => Ok(()),
        }
    }
}

/// Read a PDF's metadata without starting a session or touching a model.
pub async fn inspect(input: &str, config: &SessionConfig) -> Result<DocumentMetadata, PdfTopicsError> {
    let upload = input::resolve_input(
        input,
        config.upload_dir.as_deref(),
        config.download_timeout_secs,
    )
    .await?;
    extract::extract_metadata(upload.path(), config.password.as_deref()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerateError;
    use crate::pipeline::extract::ExtractedDocument;
    use crate::pipeline::mock::{MockGenerator, MockResponse};
    use crate::prompts::summary_prompt;

    fn session_with(pages: usize, mock: Arc<MockGenerator>) -> Session {
        let doc = ExtractedDocument::from_pages((1..=pages).map(|n| format!("p{n}")).collect());
        let config = SessionConfig::builder().generator(mock).build().unwrap();
        Session::from_document(doc, config).unwrap()
    }

    #[test]
    fn starts_with_full_range() {
        let s = session_with(10, Arc::new(MockGenerator::with_text("x")));
        assert_eq!(s.range(), PageRange::full(10));
        assert!(s.topics().is_none());
        assert!(s.upload_path().is_none());
    }

    #[test]
    fn empty_document_is_rejected() {
        let err = Session::from_document(ExtractedDocument::default(), SessionConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, PdfTopicsError::EmptyDocument));
    }

    #[test]
    fn set_range_keeps_previous_on_error() {
        let mut s = session_with(5, Arc::new(MockGenerator::with_text("x")));
        s.set_range(2, 3).unwrap();
        assert!(s.set_range(4, 9).is_err());
        assert_eq!(s.range(), PageRange::new(2, 3, 5).unwrap());
    }

    #[tokio::test]
    async fn failed_extraction_keeps_previous_topics() {
        let mock = Arc::new(MockGenerator::with_sequence(vec![
            MockResponse::Text("One\nTwo".into()),
            MockResponse::Error(GenerateError::Network("down".into())),
        ]));
        let mut s = session_with(3, mock);

        assert_eq!(s.extract_topics().await.unwrap().len(), 2);
        assert!(s.extract_topics().await.is_err());
        assert_eq!(s.topics().unwrap().get(1), Some("Two"));
    }

    #[tokio::test]
    async fn summarize_index_uses_topic_text() {
        let mock = Arc::new(MockGenerator::with_sequence(vec![
            MockResponse::Text("Alpha\nBeta".into()),
            MockResponse::Text("About beta.".into()),
        ]));
        let mut s = session_with(2, Arc::clone(&mock));

        s.extract_topics().await.unwrap();
        let summary = s.summarize_index(1).await.unwrap();
        assert_eq!(summary.topic, "Beta");
        assert_eq!(summary.text, "About beta.");
        assert_eq!(mock.prompts()[1], summary_prompt("Beta", "p1\np2"));
    }

    #[tokio::test]
    async fn summarize_index_without_topics() {
        let mut s = session_with(2, Arc::new(MockGenerator::with_text("x")));
        assert!(matches!(
            s.summarize_index(0).await,
            Err(PdfTopicsError::NoTopics)
        ));
    }

    #[tokio::test]
    async fn preview_needs_a_file() {
        let s = session_with(2, Arc::new(MockGenerator::with_text("x")));
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            s.preview(dir.path()).await,
            Err(PdfTopicsError::NoPreviewSource)
        ));
    }
}
