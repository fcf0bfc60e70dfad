//! Pipeline stages behind a session.
//!
//! Each submodule does one job and is usable on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ aggregate ──▶ llm
//! (upload)  (pdfium)    (range text)  (topics / summary)
//!              │
//!              └──▶ render (previews)
//! ```
//!
//! 1. [`input`]     — store the upload in a transient file, check it is a PDF
//! 2. [`extract`]   — page count, metadata and page text via pdfium
//! 3. [`aggregate`] — join the selected pages' text
//! 4. [`llm`]       — prompt the model; the only stage with model I/O
//! 5. [`render`]    — PNG previews of the selected pages
//!
//! [`mock`] provides a scripted generator for tests.

pub mod aggregate;
pub mod extract;
pub mod input;
pub mod llm;
pub mod mock;
pub mod render;
