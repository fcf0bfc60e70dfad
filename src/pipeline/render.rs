//! Page previews: rasterise the selected pages to PNG files via pdfium.
//!
//! Runs inside `spawn_blocking`; see [`crate::pipeline::extract`] for why.
//! The longest edge of each image is capped at `preview_max_pixels`
//! regardless of the page's physical size, so a poster-sized page does not
//! produce a poster-sized bitmap.

use crate::error::PdfTopicsError;
use crate::output::PagePreview;
use crate::pipeline::extract::{bind_pdfium, open_pdf, pdfium_index};
use crate::range::PageRange;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name used for a page's preview image.
pub fn preview_file_name(page_num: usize) -> String {
    format!("page-{page_num:03}.png")
}

/// pdfium's 0-based index for a 1-indexed page number.
fn page_index(page_num: usize) -> Result<u16, PdfTopicsError> {
    pdfium_index(page_num).ok_or_else(|| PdfTopicsError::RenderFailed {
        page: page_num,
        detail: "page number outside pdfium's index range".to_string(),
    })
}

/// Render every page of `range` into `out_dir`, creating it if needed.
pub async fn render_previews(
    pdf_path: &Path,
    password: Option<&str>,
    range: PageRange,
    out_dir: &Path,
    max_pixels: u32,
) -> Result<Vec<PagePreview>, PdfTopicsError> {
    let path = pdf_path.to_path_buf();
    let pwd = password.map(str::to_string);
    let out = out_dir.to_path_buf();

    tokio::task::spawn_blocking(move || {
        render_previews_blocking(&path, pwd.as_deref(), range, &out, max_pixels)
    })
    .await
    .map_err(|e| PdfTopicsError::Internal(format!("Render task panicked: {}", e)))?
}

fn render_previews_blocking(
    pdf_path: &Path,
    password: Option<&str>,
    range: PageRange,
    out_dir: &Path,
    max_pixels: u32,
) -> Result<Vec<PagePreview>, PdfTopicsError> {
    std::fs::create_dir_all(out_dir).map_err(|e| PdfTopicsError::OutputWriteFailed {
        path: out_dir.to_path_buf(),
        source: e,
    })?;

    let pdfium = bind_pdfium()?;
    let document = open_pdf(&pdfium, pdf_path, password)?;

    let render_config = PdfRenderConfig::new()
        .set_target_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let pages = document.pages();
    let mut previews = Vec::with_capacity(range.len());

    for page_num in range.pages() {
        let page = pages
            .get(page_index(page_num)?)
            .map_err(|e| PdfTopicsError::RenderFailed {
                page: page_num,
                detail: format!("{:?}", e),
            })?;

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| PdfTopicsError::RenderFailed {
                page: page_num,
                detail: format!("{:?}", e),
            })?;
        let rendered = bitmap.as_image();

        let target: PathBuf = out_dir.join(preview_file_name(page_num));
        rendered
            .save_with_format(&target, image::ImageFormat::Png)
            .map_err(|e| PdfTopicsError::RenderFailed {
                page: page_num,
                detail: e.to_string(),
            })?;

        debug!(
            "Rendered page {} → {}x{} px at {}",
            page_num,
            rendered.width(),
            rendered.height(),
            target.display()
        );

        previews.push(PagePreview {
            page_num,
            path: target,
            width: rendered.width(),
            height: rendered.height(),
        });
    }

    info!("Rendered {} preview pages into {}", previews.len(), out_dir.display());
    Ok(previews)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_names_sort_in_page_order() {
        assert_eq!(preview_file_name(7), "page-007.png");
        assert!(preview_file_name(9) < preview_file_name(10));
        assert_eq!(preview_file_name(1234), "page-1234.png");
    }

    #[test]
    fn page_index_is_zero_based() {
        assert_eq!(page_index(1).unwrap(), 0);
        assert_eq!(page_index(900).unwrap(), 899);
        assert_eq!(page_index(65_536).unwrap(), u16::MAX);
    }

    #[test]
    fn page_index_rejects_unaddressable_pages() {
        assert!(matches!(
            page_index(0),
            Err(PdfTopicsError::RenderFailed { page: 0, .. })
        ));
        assert!(matches!(
            page_index(70_000),
            Err(PdfTopicsError::RenderFailed { page: 70_000, .. })
        ));
    }
}
