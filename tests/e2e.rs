//! End-to-end tests against real PDFs and a live LLM.
//!
//! Gated behind `E2E_ENABLED` and the presence of `./test_cases/*.pdf`, so
//! they never run in CI by accident. They need pdfium on the library path
//! (or `PDFIUM_LIB_PATH`) and an API key such as `GEMINI_API_KEY`.
//!
//! Run with:
//!   E2E_ENABLED=1 cargo test --test e2e -- --nocapture

use pdf_topics::{inspect, Session, SessionConfig};
use std::path::PathBuf;

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

/// Skip this test if E2E_ENABLED is not set *or* no PDF file at `path`.
macro_rules! e2e_skip_unless_ready {
    ($path:expr) => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let p: PathBuf = $path;
        if !p.exists() {
            println!("SKIP: test file not found: {}", p.display());
            return;
        }
        p
    }};
}

fn path_str(p: &PathBuf) -> String {
    p.to_string_lossy().into_owned()
}

#[tokio::test]
async fn test_inspect_sample() {
    let pdf = e2e_skip_unless_ready!(test_cases_dir().join("sample.pdf"));
    let meta = inspect(&path_str(&pdf), &SessionConfig::default())
        .await
        .expect("inspect failed");
    println!("{meta:#?}");
    assert!(meta.page_count > 0);
    assert!(!meta.pdf_version.is_empty());
}

#[tokio::test]
async fn test_topics_and_summary_first_page() {
    let pdf = e2e_skip_unless_ready!(test_cases_dir().join("sample.pdf"));
    let upload_dir = tempfile::tempdir().unwrap();
    let config = SessionConfig::builder()
        .upload_dir(upload_dir.path())
        .api_timeout_secs(120)
        .build()
        .unwrap();

    let mut session = Session::open(&path_str(&pdf), config)
        .await
        .expect("open failed");
    assert!(session.upload_path().is_some());

    session.select_range("1");
    let text = session.aggregated_text().await.unwrap();
    assert!(!text.trim().is_empty(), "page 1 has no text layer");

    let topics = session.extract_topics().await.expect("topics failed").clone();
    println!("topics: {:#?}", topics);
    assert!(!topics.is_empty());

    let first = topics
        .iter()
        .find(|t| !t.trim().is_empty())
        .expect("no non-empty topic")
        .to_string();
    let summary = session.summarize(&first).await.expect("summary failed");
    println!("summary of {first:?}:\n{}", summary.text);
    assert!(!summary.text.trim().is_empty());

    session.close().unwrap();
    assert_eq!(std::fs::read_dir(upload_dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_preview_renders_selected_pages() {
    let pdf = e2e_skip_unless_ready!(test_cases_dir().join("sample.pdf"));
    let out = tempfile::tempdir().unwrap();
    let mut session = Session::open(&path_str(&pdf), SessionConfig::default())
        .await
        .expect("open failed");

    let last = session.total_pages().min(2);
    session.set_range(1, last).unwrap();
    let previews = session.preview(out.path()).await.expect("render failed");
    assert_eq!(previews.len(), last);
    for p in &previews {
        assert!(p.path.exists());
        assert!(p.width > 0 && p.height > 0);
    }
}
