//! Page-range selection.
//!
//! Users type ranges as `3-15`, as a comma list such as `1,3,5`, or as
//! `all`. A comma list is collapsed to the span between its smallest and
//! largest page: `2,5` selects pages 2 through 5, not just pages 2 and 5.
//! The collapse is long-standing behaviour and is kept as is, although a
//! true page subset was probably what the list syntax meant.
//!
//! [`parse_page_range`] is strict and returns the reason a string was
//! rejected. [`select_page_range`] is the fail-soft form used by the
//! session: on any error it substitutes the full document and keeps the
//! error so it can be shown to the user.

use crate::error::RangeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An inclusive, 1-indexed page interval within a document.
///
/// Always satisfies `1 <= start <= end <= total_pages` for the document it
/// was built against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRange {
    start: usize,
    end: usize,
}

impl PageRange {
    /// Build a range, checking it against the document's page count.
    pub fn new(start: usize, end: usize, total_pages: usize) -> Result<Self, RangeError> {
        if start > end {
            return Err(RangeError::Reversed { start, end });
        }
        for page in [start, end] {
            if page < 1 || page > total_pages {
                return Err(RangeError::OutOfBounds {
                    page,
                    total: total_pages,
                });
            }
        }
        Ok(Self { start, end })
    }

    /// The whole document, `1..=total_pages`.
    ///
    /// Documents always have at least one page by the time a session exists;
    /// a zero count is treated as one.
    pub fn full(total_pages: usize) -> Self {
        Self {
            start: 1,
            end: total_pages.max(1),
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of pages covered.
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    /// Always false; a range covers at least one page.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, page_num: usize) -> bool {
        (self.start..=self.end).contains(&page_num)
    }

    /// 1-indexed page numbers in ascending order.
    pub fn pages(&self) -> impl Iterator<Item = usize> {
        self.start..=self.end
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Outcome of a fail-soft range selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSelection {
    /// The range in effect: the parsed one, or the full document.
    pub range: PageRange,
    /// Why the input was rejected, when it was.
    pub error: Option<RangeError>,
}

impl RangeSelection {
    /// True when the input was rejected and the full document substituted.
    pub fn fell_back(&self) -> bool {
        self.error.is_some()
    }
}

/// Parse a page-range string against a document with `total_pages` pages.
///
/// Accepts `a-b`, `p1,p2,...` (collapsed to min..=max), a single page `p`,
/// or `all`. Whitespace around tokens is ignored.
pub fn parse_page_range(input: &str, total_pages: usize) -> Result<PageRange, RangeError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(RangeError::Empty);
    }

    if s.eq_ignore_ascii_case("all") {
        return Ok(PageRange::full(total_pages));
    }

    let (start, end) = if s.contains('-') {
        let parts: Vec<&str> = s.split('-').collect();
        if parts.len() != 2 {
            return Err(RangeError::Malformed {
                input: s.to_string(),
            });
        }
        (parse_page(parts[0])?, parse_page(parts[1])?)
    } else {
        let pages = s
            .split(',')
            .map(parse_page)
            .collect::<Result<Vec<_>, _>>()?;
        // split always yields at least one token, and each one parsed.
        let min = pages.iter().copied().min().unwrap_or(1);
        let max = pages.iter().copied().max().unwrap_or(min);
        (min, max)
    };

    PageRange::new(start, end, total_pages)
}

/// Parse a range, falling back to the whole document on any error.
pub fn select_page_range(input: &str, total_pages: usize) -> RangeSelection {
    match parse_page_range(input, total_pages) {
        Ok(range) => RangeSelection { range, error: None },
        Err(error) => RangeSelection {
            range: PageRange::full(total_pages),
            error: Some(error),
        },
    }
}

fn parse_page(token: &str) -> Result<usize, RangeError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(RangeError::InvalidNumber {
            token: token.to_string(),
        });
    }
    token.parse::<usize>().map_err(|_| RangeError::InvalidNumber {
        token: token.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: usize, end: usize) -> PageRange {
        PageRange { start, end }
    }

    #[test]
    fn hyphen_range_within_bounds() {
        assert_eq!(parse_page_range("1-10", 10), Ok(range(1, 10)));
        assert_eq!(parse_page_range("3-7", 10), Ok(range(3, 7)));
        assert_eq!(parse_page_range(" 4 - 4 ", 10), Ok(range(4, 4)));
    }

    #[test]
    fn comma_list_collapses_to_span() {
        assert_eq!(parse_page_range("3,1,5", 10), Ok(range(1, 5)));
        assert_eq!(parse_page_range("2,5", 10), Ok(range(2, 5)));
        assert_eq!(parse_page_range("2, 9 ,4", 10), Ok(range(2, 9)));
    }

    #[test]
    fn single_page() {
        assert_eq!(parse_page_range("6", 10), Ok(range(6, 6)));
    }

    #[test]
    fn all_keyword() {
        assert_eq!(parse_page_range("ALL", 7), Ok(range(1, 7)));
    }

    #[test]
    fn malformed_inputs_are_rejected() {
        assert_eq!(parse_page_range("", 10), Err(RangeError::Empty));
        assert_eq!(parse_page_range("   ", 10), Err(RangeError::Empty));
        assert!(matches!(
            parse_page_range("abc", 10),
            Err(RangeError::InvalidNumber { .. })
        ));
        assert!(matches!(
            parse_page_range("5-", 10),
            Err(RangeError::InvalidNumber { .. })
        ));
        assert!(matches!(
            parse_page_range("x-y", 10),
            Err(RangeError::InvalidNumber { .. })
        ));
        assert!(matches!(
            parse_page_range("1-2-3", 10),
            Err(RangeError::Malformed { .. })
        ));
        assert!(matches!(
            parse_page_range("1,,3", 10),
            Err(RangeError::InvalidNumber { .. })
        ));
        assert!(matches!(
            parse_page_range("-3", 10),
            Err(RangeError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn reversed_range_is_rejected() {
        assert_eq!(
            parse_page_range("5-2", 10),
            Err(RangeError::Reversed { start: 5, end: 2 })
        );
    }

    #[test]
    fn out_of_bounds_is_rejected() {
        assert_eq!(
            parse_page_range("0-3", 10),
            Err(RangeError::OutOfBounds { page: 0, total: 10 })
        );
        assert_eq!(
            parse_page_range("8-12", 10),
            Err(RangeError::OutOfBounds { page: 12, total: 10 })
        );
        assert_eq!(
            parse_page_range("1,11", 10),
            Err(RangeError::OutOfBounds { page: 11, total: 10 })
        );
    }

    #[test]
    fn select_falls_back_to_full_document() {
        for input in ["abc", "", "5-", "x-y", "20-30"] {
            let sel = select_page_range(input, 10);
            assert_eq!(sel.range, range(1, 10), "input {input:?}");
            assert!(sel.fell_back(), "input {input:?}");
        }
    }

    #[test]
    fn select_keeps_valid_range() {
        let sel = select_page_range("2-4", 5);
        assert_eq!(sel.range, range(2, 4));
        assert!(sel.error.is_none());
    }

    #[test]
    fn range_accessors() {
        let r = PageRange::new(2, 4, 5).unwrap();
        assert_eq!(r.len(), 3);
        assert!(r.contains(3));
        assert!(!r.contains(5));
        assert_eq!(r.pages().collect::<Vec<_>>(), vec![2, 3, 4]);
        assert_eq!(r.to_string(), "2-4");
    }

    #[test]
    fn full_range_of_empty_document_is_one_page() {
        assert_eq!(PageRange::full(0), range(1, 1));
    }
}
