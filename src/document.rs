//! Document renderer seam, page navigation and render sequencing
//!
//! Page rasterization is asynchronous and may finish out of order when the
//! user flips pages quickly. Every request carries a monotonic token and
//! only the newest request's result is ever applied.

use std::future::Future;
use std::pin::Pin;

use crate::error::{DocumentError, ViewerError};

/// Future returned by [`DocumentRenderer::open`]
pub type OpenFuture = Pin<Box<dyn Future<Output = Result<DocumentInfo, DocumentError>> + Send>>;

/// Future returned by [`DocumentRenderer::render_page`]
pub type RenderFuture = Pin<Box<dyn Future<Output = Result<RasterImage, DocumentError>> + Send>>;

/// Opens a document and rasterizes its pages
pub trait DocumentRenderer: Send + Sync {
    fn open(&self) -> OpenFuture;

    /// Rasterize `page` (1-based) at the given pixel size
    fn render_page(&self, page: u32, width: u32, height: u32) -> RenderFuture;
}

/// Facts about an opened document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentInfo {
    pub page_count: u32,
}

/// A rasterized page, RGBA8 row-major
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    pub page: u32,
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Sequence number of a page render request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RenderToken(u64);

impl RenderToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Issues render tokens and tells stale ones apart
#[derive(Debug, Default, Clone)]
pub struct RenderSequencer {
    latest: u64,
}

impl RenderSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token for a new request; supersedes all earlier ones
    pub fn issue(&mut self) -> RenderToken {
        self.latest += 1;
        RenderToken(self.latest)
    }

    pub fn is_latest(&self, token: RenderToken) -> bool {
        token.0 == self.latest
    }
}

/// Current page within `[1, page_count]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageNavigator {
    page_count: u32,
    current: u32,
}

impl PageNavigator {
    /// Navigator on page 1; an empty document is treated as one page
    pub fn new(info: DocumentInfo) -> Self {
        Self {
            page_count: info.page_count.max(1),
            current: 1,
        }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Jump to `page`, rejecting anything outside the document
    pub fn go_to(&mut self, page: u32) -> Result<u32, ViewerError> {
        if page == 0 || page > self.page_count {
            return Err(ViewerError::InvalidPage {
                page,
                page_count: self.page_count,
            });
        }
        self.current = page;
        Ok(page)
    }

    /// Advance one page; `None` on the last page
    pub fn next(&mut self) -> Option<u32> {
        if self.current < self.page_count {
            self.current += 1;
            Some(self.current)
        } else {
            None
        }
    }

    /// Go back one page; `None` on the first page
    pub fn prev(&mut self) -> Option<u32> {
        if self.current > 1 {
            self.current -= 1;
            Some(self.current)
        } else {
            None
        }
    }
}
