//! Page-number pagination primitives for throttled upstream collections.
//!
//! Upstream collections are walked one page at a time using `page[number]`
//! and `page[size]` query parameters. [`PageSize`] clamps caller input to the
//! range the upstream serves, [`PageNumber`] is one-based, and
//! [`PageRequest`] serialises to the query pairs expected on the wire.
//!
//! # Examples
//!
//! ```
//! use pagination::{PageRequest, PageSize};
//!
//! let first = PageRequest::first(PageSize::clamped(250));
//! assert_eq!(first.size().get(), 100);
//! assert_eq!(first.number().get(), 1);
//!
//! let second = first.next().map(|request| request.number().get());
//! assert_eq!(second, Some(2));
//! ```

use std::fmt;
use std::num::NonZeroU32;

use serde::Serialize;
use thiserror::Error;

/// Page size used when the caller asks for a non-positive size.
pub const DEFAULT_PAGE_SIZE: u32 = 30;

/// Largest page size the upstream serves.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Number of items requested per page, always within `1..=MAX_PAGE_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PageSize(u32);

impl PageSize {
    /// Clamp a requested page size.
    ///
    /// Non-positive values map to [`DEFAULT_PAGE_SIZE`]; values above
    /// [`MAX_PAGE_SIZE`] are capped.
    #[must_use]
    pub fn clamped(requested: i64) -> Self {
        if requested <= 0 {
            return Self(DEFAULT_PAGE_SIZE);
        }
        let size =
            u32::try_from(requested).map_or(MAX_PAGE_SIZE, |value| value.min(MAX_PAGE_SIZE));
        Self(size)
    }

    /// Return the raw size.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self(DEFAULT_PAGE_SIZE)
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors raised when constructing pagination values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PageNumberError {
    /// Page numbers are one-based.
    #[error("page numbers start at 1")]
    Zero,
}

/// One-based page number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PageNumber(NonZeroU32);

impl PageNumber {
    /// The first page of any collection.
    pub const FIRST: Self = Self(NonZeroU32::MIN);

    /// Build a page number, rejecting zero.
    ///
    /// # Errors
    ///
    /// Returns [`PageNumberError::Zero`] when `value` is zero.
    pub const fn new(value: u32) -> Result<Self, PageNumberError> {
        match NonZeroU32::new(value) {
            Some(number) => Ok(Self(number)),
            None => Err(PageNumberError::Zero),
        }
    }

    /// Return the raw page number.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }

    /// Return the following page, or `None` on overflow.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(number) => Some(Self(number)),
            None => None,
        }
    }
}

impl fmt::Display for PageNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Request for one page of an upstream collection.
///
/// Serialises to `page[number]` and `page[size]` so it can be handed straight
/// to an HTTP client as query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PageRequest {
    #[serde(rename = "page[number]")]
    number: PageNumber,
    #[serde(rename = "page[size]")]
    size: PageSize,
}

impl PageRequest {
    /// Build a request for an explicit page.
    #[must_use]
    pub const fn new(number: PageNumber, size: PageSize) -> Self {
        Self { number, size }
    }

    /// Build a request for the first page.
    #[must_use]
    pub const fn first(size: PageSize) -> Self {
        Self::new(PageNumber::FIRST, size)
    }

    /// Page number being requested.
    #[must_use]
    pub const fn number(self) -> PageNumber {
        self.number
    }

    /// Page size being requested.
    #[must_use]
    pub const fn size(self) -> PageSize {
        self.size
    }

    /// Request for the following page with the same size.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self.number.next() {
            Some(number) => Some(Self::new(number, self.size)),
            None => None,
        }
    }
}
