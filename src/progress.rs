//! Progress-callback trait for session events.
//!
//! Inject an [`Arc<dyn SessionProgressCallback>`] via
//! [`crate::config::SessionConfigBuilder::progress_callback`] to be told when
//! pages are extracted and when model calls start and finish. The CLI uses
//! it to drive a spinner; other hosts can forward events wherever they like.
//!
//! # Example
//!
//! ```rust
//! use pdf_topics::{RequestKind, SessionConfig, SessionProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     requests: AtomicUsize,
//! }
//!
//! impl SessionProgressCallback for CountingCallback {
//!     fn on_request_start(&self, kind: RequestKind) {
//!         self.requests.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{kind} request sent");
//!     }
//! }
//!
//! let config = SessionConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { requests: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// The two kinds of model request a session makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Topics,
    Summary,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestKind::Topics => f.write_str("topic extraction"),
            RequestKind::Summary => f.write_str("summary"),
        }
    }
}

/// Called by a [`crate::session::Session`] as it works.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Text extraction runs on a blocking thread, so the
/// trait must be `Send + Sync`.
pub trait SessionProgressCallback: Send + Sync {
    /// Called before a batch of page text is read. Pages are read the first
    /// time a selected range needs them, so there can be several batches.
    fn on_extraction_start(&self, batch_len: usize) {
        let _ = batch_len;
    }

    /// Called after each page's text has been extracted.
    ///
    /// # Arguments
    /// * `page_num`  — 1-indexed page number
    /// * `batch_len` — pages in the current batch
    /// * `chars`     — byte length of the extracted text
    fn on_page_extracted(&self, page_num: usize, batch_len: usize, chars: usize) {
        let _ = (page_num, batch_len, chars);
    }

    /// Called just before a prompt is sent to the model.
    fn on_request_start(&self, kind: RequestKind) {
        let _ = kind;
    }

    /// Called when the model answered; `chars` is the response length.
    fn on_request_complete(&self, kind: RequestKind, chars: usize) {
        let _ = (kind, chars);
    }

    /// Called when the model call failed.
    fn on_request_error(&self, kind: RequestKind, error: &str) {
        let _ = (kind, error);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl SessionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::SessionConfig`].
pub type ProgressCallback = Arc<dyn SessionProgressCallback>;
