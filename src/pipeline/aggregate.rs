//! Joins the text of the selected pages into one prompt-ready string.

use crate::error::PdfTopicsError;
use crate::pipeline::extract::PageSource;
use crate::range::PageRange;

/// Concatenate the text of every page in `range`, in ascending page order,
/// separated by a single `'\n'`. Page text is passed through untouched.
pub fn aggregate_text(source: &dyn PageSource, range: PageRange) -> Result<String, PdfTopicsError> {
    let texts = range
        .pages()
        .map(|page_num| source.extract_text(page_num))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(texts.join("\n"))
}
