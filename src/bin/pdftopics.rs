//! CLI binary for pdf-topics.
//!
//! A thin shim over the library crate: maps flags to `SessionConfig`, runs
//! one session either once (topics, optional summary) or as an interactive
//! prompt loop, and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf_topics::clipboard::copy_to_terminal;
use pdf_topics::{
    inspect, PdfTopicsError, ProgressCallback, RequestKind, Session, SessionConfig,
    SessionProgressCallback, TopicList,
};
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Shows a bar while pages are extracted and a spinner while the model is
/// thinking. Each user action blocks until the model answers, so at most
/// one indicator is alive at a time.
struct CliProgressCallback {
    active: Mutex<Option<ProgressBar>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            active: Mutex::new(None),
        })
    }

    fn replace(&self, bar: Option<ProgressBar>) {
        if let Ok(mut slot) = self.active.lock() {
            if let Some(old) = slot.take() {
                old.finish_and_clear();
            }
            *slot = bar;
        }
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(slot) = self.active.lock() {
            if let Some(ref bar) = *slot {
                f(bar);
            }
        }
    }
}

impl SessionProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self, batch_len: usize) {
        let bar = ProgressBar::new(batch_len as u64);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} pages",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS),
        );
        bar.set_prefix("Reading");
        bar.enable_steady_tick(Duration::from_millis(80));
        self.replace(Some(bar));
    }

    fn on_page_extracted(&self, _page_num: usize, batch_len: usize, _chars: usize) {
        let mut done = false;
        self.with_bar(|bar| {
            bar.inc(1);
            done = bar.position() >= batch_len as u64;
        });
        if done {
            self.replace(None);
        }
    }

    fn on_request_start(&self, kind: RequestKind) {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_message(match kind {
            RequestKind::Topics => "Extracting topics…",
            RequestKind::Summary => "Generating summary…",
        });
        bar.enable_steady_tick(Duration::from_millis(80));
        self.replace(Some(bar));
    }

    fn on_request_complete(&self, _kind: RequestKind, _chars: usize) {
        self.replace(None);
    }

    fn on_request_error(&self, _kind: RequestKind, _error: &str) {
        self.replace(None);
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # List the topics of a whole document
  pdftopics lecture.pdf

  # Only pages 3 to 7, then summarise the second topic
  pdftopics lecture.pdf --pages 3-7 --topic-index 2

  # Summarise a named topic and copy it to the clipboard
  pdftopics lecture.pdf --pages 10-12 --topic "Krebs cycle" --copy

  # Render the selected pages as PNG previews
  pdftopics lecture.pdf --pages 1,4 --preview previews/

  # Work interactively
  pdftopics lecture.pdf --interactive

PAGE RANGES:
  3-7        pages 3 to 7
  1,4,9      collapsed to the span 1-9
  all        the whole document
  An invalid range prints a warning and selects the whole document.

INTERACTIVE COMMANDS:
  range <text>        select pages (same syntax as --pages)
  slide <a> <b>       select pages a..=b; invalid bounds keep the current range
  topics              extract topics from the selected pages
  summary <n|topic>   summarise topic number n, or a topic given as text
  copy                copy the last summary to the clipboard
  preview <dir>       render the selected pages into <dir>
  info                show document metadata and the current range
  text                print the selected pages' text
  help                show this list
  quit                end the session (the temporary copy is deleted)

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY / GOOGLE_API_KEY   Google Gemini API key (default model gemini-1.5-flash)
  OPENAI_API_KEY                    OpenAI API key (default model gpt-4.1-nano)
  PDFTOPICS_PROVIDER                Override provider (gemini, openai, anthropic, ollama)
  PDFTOPICS_MODEL                   Override model ID
  PDFIUM_LIB_PATH                   Path to libpdfium; otherwise the system library is used
  A .env file in the working directory is loaded first.
"#;

/// Find the topics a PDF discusses and summarise them with an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "pdftopics",
    version,
    about = "Find the topics a PDF discusses and summarise them with an LLM",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Page range: 3-7, 1,4,9 (collapsed to 1-9), or all.
    #[arg(long, env = "PDFTOPICS_PAGES")]
    pages: Option<String>,

    /// Summarise this topic.
    #[arg(long, conflicts_with = "topic_index")]
    topic: Option<String>,

    /// Summarise the n-th extracted topic (1-based).
    #[arg(long)]
    topic_index: Option<usize>,

    /// Render the selected pages as PNG files into this directory.
    #[arg(long)]
    preview: Option<PathBuf>,

    /// Copy the summary to the clipboard (OSC 52).
    #[arg(long)]
    copy: bool,

    /// Start an interactive session.
    #[arg(short, long)]
    interactive: bool,

    /// LLM model ID (e.g. gemini-1.5-flash, gpt-4.1-nano).
    #[arg(long, env = "PDFTOPICS_MODEL")]
    model: Option<String>,

    /// LLM provider: gemini, openai, anthropic, ollama, azure.
    #[arg(long, env = "PDFTOPICS_PROVIDER")]
    provider: Option<String>,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDFTOPICS_PASSWORD")]
    password: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "PDFTOPICS_TEMPERATURE", default_value_t = 0.3)]
    temperature: f32,

    /// Max LLM output tokens per request.
    #[arg(long, env = "PDFTOPICS_MAX_TOKENS", default_value_t = 2048)]
    max_tokens: usize,

    /// Per-request LLM timeout in seconds (default: wait indefinitely).
    #[arg(long, env = "PDFTOPICS_API_TIMEOUT")]
    api_timeout: Option<u64>,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDFTOPICS_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Directory for the temporary copy of the PDF (default: system temp dir).
    #[arg(long, env = "PDFTOPICS_UPLOAD_DIR")]
    upload_dir: Option<PathBuf>,

    /// Longest edge of preview images in pixels.
    #[arg(long, env = "PDFTOPICS_PREVIEW_PIXELS", default_value_t = 1200)]
    preview_pixels: u32,

    /// Print results as JSON.
    #[arg(long)]
    json: bool,

    /// Print PDF metadata only; no LLM call.
    #[arg(long)]
    inspect_only: bool,

    /// Disable progress indicators.
    #[arg(long, env = "PDFTOPICS_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFTOPICS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except results and errors.
    #[arg(short, long, env = "PDFTOPICS_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Progress indicators replace INFO-level library logs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && io::stderr().is_terminal();
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn SessionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let meta = inspect(&cli.input, &config)
            .await
            .map_err(report)
            .context("Failed to inspect PDF")?;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialise metadata")?
            );
        } else {
            println!("File:         {}", cli.input);
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            if let Some(ref s) = meta.subject {
                println!("Subject:      {}", s);
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
        }
        return Ok(());
    }

    // ── Open the session ─────────────────────────────────────────────────
    let mut session = Session::open(&cli.input, config)
        .await
        .map_err(report)
        .context("Failed to open PDF")?;

    if !cli.quiet && !cli.json {
        eprintln!(
            "{} {}  {}",
            green("✔"),
            bold(&cli.input),
            dim(&format!("{} pages", session.total_pages()))
        );
    }

    if let Some(ref pages) = cli.pages {
        apply_range(&mut session, pages, cli.quiet);
    }

    let result = if cli.interactive {
        run_interactive(&mut session).await
    } else {
        run_once(&mut session, &cli).await
    };

    // Explicit close so a failure to delete the temporary copy is reported.
    finish(result, session.close())
}

/// Combine the outcome of the session's actions with that of closing it.
/// The action's own error takes precedence; a close failure is then only
/// printed.
fn finish(result: Result<()>, closed: Result<(), PdfTopicsError>) -> Result<()> {
    match (result, closed) {
        (Err(action), Err(close)) => {
            print_error(&close);
            Err(action)
        }
        (Ok(()), Err(close)) => Err(close).context("Failed to remove temporary upload"),
        (result, Ok(())) => result,
    }
}

/// Map CLI args to `SessionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<SessionConfig> {
    let mut builder = SessionConfig::builder()
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .download_timeout_secs(cli.download_timeout)
        .preview_max_pixels(cli.preview_pixels);

    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref password) = cli.password {
        builder = builder.password(password);
    }
    if let Some(ref dir) = cli.upload_dir {
        builder = builder.upload_dir(dir);
    }
    if let Some(secs) = cli.api_timeout {
        builder = builder.api_timeout_secs(secs);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Print a library error with its hint, then hand it back for `?`.
fn report(e: PdfTopicsError) -> PdfTopicsError {
    print_error(&e);
    e
}

fn print_error(e: &PdfTopicsError) {
    eprintln!("{} {}", red("✘"), red(&e.to_string()));
    if let Some(hint) = e.user_hint() {
        eprintln!("  {}", dim(hint));
    }
}

fn apply_range(session: &mut Session, text: &str, quiet: bool) {
    let selection = session.select_range(text);
    if let Some(ref e) = selection.error {
        eprintln!(
            "{} Invalid page range ({}). Using default {}.",
            yellow("⚠"),
            e,
            selection.range
        );
    } else if !quiet {
        eprintln!("{} pages {}", dim("▸"), selection.range);
    }
}

fn print_topics(topics: &TopicList) {
    println!("{}", bold("Main Topics Discussed:"));
    for (i, topic) in topics.iter().enumerate() {
        println!("  {:>2}. {}", i + 1, topic);
    }
}

fn copy_summary(session: &Session) -> Result<()> {
    let summary = session
        .last_summary()
        .context("No summary to copy yet")?;
    if copy_to_terminal(&summary.text).context("Failed to write clipboard sequence")? {
        eprintln!("{} Summary copied to clipboard", green("✔"));
    } else {
        eprintln!(
            "{} No terminal attached; summary not copied to clipboard",
            yellow("⚠")
        );
    }
    Ok(())
}

// ── One-shot mode ────────────────────────────────────────────────────────────

async fn run_once(session: &mut Session, cli: &Cli) -> Result<()> {
    let topics = if cli.topic.is_none() {
        Some(
            session
                .extract_topics()
                .await
                .map_err(report)
                .context("Topic extraction failed")?
                .clone(),
        )
    } else {
        None
    };

    let summary = match (&cli.topic, cli.topic_index) {
        (Some(topic), _) => Some(
            session
                .summarize(topic)
                .await
                .map_err(report)
                .context("Summary generation failed")?
                .clone(),
        ),
        (None, Some(n)) => Some(
            session
                .summarize_index(n.checked_sub(1).context("--topic-index starts at 1")?)
                .await
                .map_err(report)
                .context("Summary generation failed")?
                .clone(),
        ),
        (None, None) => None,
    };

    let previews = match cli.preview {
        Some(ref dir) => session
            .preview(dir)
            .await
            .map_err(report)
            .context("Preview rendering failed")?,
        None => Vec::new(),
    };

    if cli.json {
        let out = serde_json::json!({
            "input": cli.input,
            "total_pages": session.total_pages(),
            "range": session.range(),
            "topics": topics,
            "summary": summary,
            "previews": previews,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&out).context("Failed to serialise output")?
        );
    } else {
        if let Some(ref topics) = topics {
            print_topics(topics);
        }
        if let Some(ref summary) = summary {
            if topics.is_some() {
                println!();
            }
            println!("{}", bold(&format!("Summary: {}", summary.topic)));
            println!("{}", summary.text.trim_end());
        }
        if !previews.is_empty() && !cli.quiet {
            eprintln!(
                "{} {} preview pages written to {}",
                green("✔"),
                previews.len(),
                previews[0]
                    .path
                    .parent()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default()
            );
        }
    }

    if cli.copy {
        copy_summary(session)?;
    }
    Ok(())
}

// ── Interactive mode ─────────────────────────────────────────────────────────

async fn run_interactive(session: &mut Session) -> Result<()> {
    eprintln!(
        "{}",
        dim("Type `help` for commands, `quit` to end the session.")
    );
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        eprint!("{} ", bold(&format!("[{}]>", session.range())));
        io::stderr().flush().ok();

        let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
            break;
        };
        let line = line.trim();
        let (cmd, arg) = match line.split_once(char::is_whitespace) {
            Some((c, a)) => (c, a.trim()),
            None => (line, ""),
        };

        match cmd {
            "" => {}
            "quit" | "exit" | "q" => break,
            "help" | "?" => eprintln!("{}", interactive_help()),
            "range" => apply_range(session, arg, false),
            "slide" => slide(session, arg),
            "topics" => match session.extract_topics().await {
                Ok(topics) => print_topics(topics),
                Err(e) => print_error(&e),
            },
            "summary" => summary_command(session, arg).await,
            "copy" => {
                if let Err(e) = copy_summary(session) {
                    eprintln!("{} {:#}", red("✘"), e);
                }
            }
            "preview" => {
                if arg.is_empty() {
                    eprintln!("{} usage: preview <dir>", yellow("⚠"));
                    continue;
                }
                match session.preview(Path::new(arg)).await {
                    Ok(previews) => eprintln!(
                        "{} {} preview pages written to {}",
                        green("✔"),
                        previews.len(),
                        arg
                    ),
                    Err(e) => print_error(&e),
                }
            }
            "info" => {
                let meta = session.metadata();
                println!("Pages:    {}", session.total_pages());
                println!("Selected: {}", session.range());
                if let Some(ref t) = meta.title {
                    println!("Title:    {}", t);
                }
                if let Some(ref a) = meta.author {
                    println!("Author:   {}", a);
                }
            }
            "text" => match session.aggregated_text().await {
                Ok(text) => println!("{text}"),
                Err(e) => print_error(&e),
            },
            other => eprintln!("{} unknown command '{}'; try `help`", yellow("⚠"), other),
        }
    }
    Ok(())
}

fn interactive_help() -> &'static str {
    AFTER_HELP
        .split("INTERACTIVE COMMANDS:\n")
        .nth(1)
        .and_then(|rest| rest.split("\n\n").next())
        .unwrap_or("")
}

fn slide(session: &mut Session, arg: &str) {
    let bounds: Vec<Option<usize>> = arg.split_whitespace().map(|t| t.parse().ok()).collect();
    match bounds.as_slice() {
        [Some(start), Some(end)] => match session.set_range(*start, *end) {
            Ok(range) => eprintln!("{} pages {}", dim("▸"), range),
            Err(e) => eprintln!(
                "{} {}; keeping pages {}",
                yellow("⚠"),
                e,
                session.range()
            ),
        },
        _ => eprintln!("{} usage: slide <start> <end>", yellow("⚠")),
    }
}

async fn summary_command(session: &mut Session, arg: &str) {
    if arg.is_empty() {
        eprintln!("{} usage: summary <n|topic>", yellow("⚠"));
        return;
    }
    let result = match arg.parse::<usize>() {
        Ok(0) => {
            eprintln!("{} topics are numbered from 1", yellow("⚠"));
            return;
        }
        Ok(n) => session.summarize_index(n - 1).await,
        Err(_) => session.summarize(arg).await,
    };
    match result {
        Ok(summary) => {
            println!("{}", bold(&format!("Summary: {}", summary.topic)));
            println!("{}", summary.text.trim_end());
            eprintln!("{}", dim("(`copy` puts it on the clipboard)"));
        }
        Err(e) => print_error(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close_failure() -> Result<(), PdfTopicsError> {
        Err(PdfTopicsError::UploadFailed {
            source: io::Error::new(io::ErrorKind::Other, "busy"),
        })
    }

    #[test]
    fn action_error_survives_close_failure() {
        let action = Err(anyhow::anyhow!("Topic extraction failed"));
        let err = finish(action, close_failure()).unwrap_err();
        assert_eq!(err.to_string(), "Topic extraction failed");
    }

    #[test]
    fn close_failure_reported_after_success() {
        let err = finish(Ok(()), close_failure()).unwrap_err();
        assert_eq!(err.to_string(), "Failed to remove temporary upload");
    }

    #[test]
    fn clean_close_keeps_result() {
        assert!(finish(Ok(()), Ok(())).is_ok());
        assert!(finish(Err(anyhow::anyhow!("x")), Ok(())).is_err());
    }

    #[test]
    fn cli_parses_copy_with_json() {
        let cli = Cli::try_parse_from(["pdftopics", "doc.pdf", "--json", "--copy", "--topic", "A"])
            .unwrap();
        assert!(cli.json && cli.copy);
        assert_eq!(cli.topic.as_deref(), Some("A"));
    }
}
