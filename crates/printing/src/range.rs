//! Page range selection and the pagination cursor.
//! 列印頁面範圍的解析與頁碼游標。

use std::fmt;
use std::str::FromStr;

use log::warn;
use thiserror::Error;

/// Pages requested for a print job, as chosen in the print settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageRange {
    /// Only the page the user is currently viewing.
    Current,
    #[default]
    All,
    /// Inclusive, 1-based span.
    Range { start: u32, end: u32 },
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageRange::Current => f.write_str("current"),
            PageRange::All => f.write_str("all"),
            PageRange::Range { start, end } if start == end => write!(f, "{start}"),
            PageRange::Range { start, end } => write!(f, "{start}-{end}"),
        }
    }
}

/// Raised when a numeric range such as `2-x` cannot be parsed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("malformed page range '{0}'")]
pub struct ParseRangeError(pub String);

impl FromStr for PageRange {
    type Err = ParseRangeError;

    /// Accepts `current`, `all`, `N` and `N-M`. Unknown words select every page.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case("current") {
            return Ok(PageRange::Current);
        }
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(PageRange::All);
        }
        if !trimmed.starts_with(|ch: char| ch.is_ascii_digit()) {
            warn!("unrecognised page range '{trimmed}', printing all pages");
            return Ok(PageRange::All);
        }

        let (start, end) = trimmed.split_once('-').unwrap_or((trimmed, trimmed));
        let parse = |value: &str| {
            value
                .trim()
                .parse::<u32>()
                .map_err(|_| ParseRangeError(input.to_string()))
        };
        Ok(PageRange::Range {
            start: parse(start)?,
            end: parse(end)?,
        })
    }
}

/// Errors raised while validating a page range against the image count.
/// 依圖片數量驗證頁面範圍時的錯誤。
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RangeError {
    #[error("page range {start}-{end} is outside 1-{page_count}")]
    InvalidBounds {
        start: u32,
        end: u32,
        page_count: u32,
    },
}

/// Cursor over the pages of one job. `current` stays within `from..=to` while rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    pub current: u32,
    pub from: u32,
    pub to: u32,
}

impl PaginationState {
    /// Every page of a document with `page_count` pages. Empty when `page_count` is 0.
    pub const fn all(page_count: u32) -> Self {
        Self {
            current: 1,
            from: 1,
            to: page_count,
        }
    }

    pub const fn has_next(&self) -> bool {
        has_next(self.current, self.to)
    }

    pub const fn advance(self) -> Self {
        Self {
            current: advance(self.current),
            ..self
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.to < self.from
    }

    pub const fn page_count(&self) -> u32 {
        if self.is_empty() {
            0
        } else {
            self.to - self.from + 1
        }
    }

    /// Pages left to render, including `current`.
    pub const fn remaining(&self) -> u32 {
        if self.current > self.to {
            0
        } else {
            self.to - self.current + 1
        }
    }

    pub const fn contains(&self, page: u32) -> bool {
        self.from <= page && page <= self.to
    }
}

/// Derives the pagination state for a new job.
///
/// `current` is the page the host was showing before the job started; it is used
/// as-is for [`PageRange::Current`]. Explicit ranges must satisfy
/// `1 <= start <= end <= page_count`.
pub fn resolve(
    range: PageRange,
    page_count: u32,
    current: u32,
) -> Result<PaginationState, RangeError> {
    match range {
        PageRange::Current => Ok(PaginationState {
            current,
            from: current,
            to: current,
        }),
        PageRange::All => Ok(PaginationState::all(page_count)),
        PageRange::Range { start, end } => {
            if start >= 1 && start <= end && end <= page_count {
                Ok(PaginationState {
                    current: start,
                    from: start,
                    to: end,
                })
            } else {
                Err(RangeError::InvalidBounds {
                    start,
                    end,
                    page_count,
                })
            }
        }
    }
}

/// True when another page follows `current` in a job ending at `to`.
pub const fn has_next(current: u32, to: u32) -> bool {
    match current.checked_add(1) {
        Some(next) => next <= to,
        None => false,
    }
}

pub const fn advance(current: u32) -> u32 {
    current.saturating_add(1)
}
