//! # pdf-topics
//!
//! Pick a page range from a PDF, let a large language model list the topics
//! those pages discuss, and ask for an educational summary of any topic.
//!
//! ## Flow
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Upload     copy path / URL / bytes into a transient file
//!  ├─ 2. Extract    page count via pdfium; page text read when first selected
//!  ├─ 3. Range      "3-7", "1,4,9" (collapsed to 1-9) or "all"
//!  ├─ 4. Aggregate  selected pages' text, newline-joined
//!  ├─ 5. Topics     one prompt → one topic per response line
//!  ├─ 6. Summary    one prompt per requested topic, never cached
//!  └─ 7. Preview    PNG per selected page
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_topics::{Session, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from GEMINI_API_KEY / OPENAI_API_KEY / …
//!     let mut session = Session::open("lecture.pdf", SessionConfig::default()).await?;
//!
//!     let selection = session.select_range("3-7");
//!     if let Some(err) = selection.error {
//!         eprintln!("{err}; using pages {}", selection.range);
//!     }
//!
//!     let topics = session.extract_topics().await?.clone();
//!     for topic in topics.iter() {
//!         println!("- {topic}");
//!     }
//!
//!     let summary = session.summarize_index(0).await?;
//!     println!("{}", summary.text);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdftopics` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! pdfium is loaded at runtime: from `PDFIUM_LIB_PATH` when set, otherwise
//! from the system library path.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod clipboard;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod range;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{SessionConfig, SessionConfigBuilder};
pub use error::{ErrorCategory, GenerateError, PdfTopicsError, RangeError};
pub use output::{DocumentMetadata, PagePreview, Summary, TopicList};
pub use pipeline::extract::{ExtractedDocument, PageSource, PdfPages};
pub use pipeline::llm::{ProviderGenerator, TextGenerator};
pub use progress::{NoopProgressCallback, ProgressCallback, RequestKind, SessionProgressCallback};
pub use range::{parse_page_range, select_page_range, PageRange, RangeSelection};
pub use session::{inspect, Session};
