//! Server-or-client pagination.
//!
//! The listing endpoint paginates for some filter combinations and returns
//! the whole result set for others. [`ServiceListing`] stores whichever
//! arrived and [`ServiceListing::displayed`] hands out the visible page either
//! way.

use serde::{Deserialize, Serialize};

use crate::api::{ListingMeta, Service, ServicesResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageState {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_count: u64,
    pub is_server_paginated: bool,
}

impl Default for PageState {
    fn default() -> Self {
        Self::empty(1)
    }
}

impl PageState {
    /// Zero results: still one (empty) page.
    pub const fn empty(current_page: u32) -> Self {
        Self {
            current_page,
            total_pages: 1,
            total_count: 0,
            is_server_paginated: false,
        }
    }

    pub fn from_meta(meta: &ListingMeta, requested_page: u32) -> Self {
        let current_page = if meta.current_page == 0 {
            requested_page
        } else {
            meta.current_page
        };
        Self {
            current_page: current_page.max(1),
            total_pages: meta.last_page.max(1),
            total_count: meta.total,
            is_server_paginated: true,
        }
    }

    pub fn client_side(total_count: usize, page_size: u32, current_page: u32) -> Self {
        Self {
            current_page: current_page.max(1),
            total_pages: total_pages(total_count, page_size),
            total_count: total_count as u64,
            is_server_paginated: false,
        }
    }

    pub const fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub const fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }
}

/// `ceil(count / page_size)`, at least 1.
pub fn total_pages(count: usize, page_size: u32) -> u32 {
    let size = page_size.max(1) as usize;
    let pages = count.div_ceil(size);
    u32::try_from(pages).unwrap_or(u32::MAX).max(1)
}

/// Half-open window `[(page-1)*size, page*size)` clipped to `items`.
pub fn page_slice<T>(items: &[T], page: u32, page_size: u32) -> &[T] {
    let size = page_size.max(1) as usize;
    let start = (page.max(1) as usize - 1).saturating_mul(size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(size).min(items.len());
    &items[start..end]
}

/// The last committed services result.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServiceListing {
    items: Vec<Service>,
    page: PageState,
}

impl ServiceListing {
    pub fn from_response(response: ServicesResponse, requested_page: u32, page_size: u32) -> Self {
        let page = match &response.meta {
            Some(meta) => PageState::from_meta(meta, requested_page),
            None => PageState::client_side(response.items.len(), page_size, requested_page),
        };
        Self {
            items: response.items,
            page,
        }
    }

    pub fn empty(requested_page: u32) -> Self {
        Self {
            items: Vec::new(),
            page: PageState::empty(requested_page),
        }
    }

    pub const fn page_state(&self) -> &PageState {
        &self.page
    }

    /// Keeps a client-side listing in step with a pure page change.
    pub fn set_current_page(&mut self, page: u32) {
        if !self.page.is_server_paginated {
            self.page.current_page = page.max(1);
        }
    }

    /// Items for the page being shown. Server pages are shown verbatim.
    pub fn displayed(&self, page_size: u32) -> &[Service] {
        if self.page.is_server_paginated {
            &self.items
        } else {
            page_slice(&self.items, self.page.current_page, page_size)
        }
    }

    pub fn stored_len(&self) -> usize {
        self.items.len()
    }
}
