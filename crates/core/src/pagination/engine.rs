use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use super::PageConfig;
use crate::filter::{FilterClause, FilterCompiler, FilterSpec};
use crate::metrics;
use crate::ticket::{ServiceKind, Ticket, TicketStore};

/// Which tickets a paginated view covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketScope {
    All,
    /// Restrict to one workflow (technical service, internal repair,
    /// warranty).
    Service(ServiceKind),
}

/// A page request as it arrives from a caller. Out-of-range values are
/// coerced, never rejected.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    /// 1-indexed page number; clamped into the valid range.
    pub page: i64,
    /// Rows per page; falls back to the configured default and is
    /// clamped to the configured maximum.
    pub per_page: Option<u32>,
}

impl PageRequest {
    pub fn page(page: i64) -> Self {
        Self {
            page,
            per_page: None,
        }
    }
}

/// One bounded page of tickets plus pagination metadata.
#[derive(Debug, Clone, Serialize)]
pub struct PageResult {
    pub items: Vec<Ticket>,
    pub total: u64,
    pub pages: u32,
    /// Clamped into `[1, max(pages, 1)]`.
    pub page: u32,
    pub per_page: u32,
    pub has_prev: bool,
    pub has_next: bool,
}

impl PageResult {
    pub fn prev_page(&self) -> Option<u32> {
        self.has_prev.then(|| self.page - 1)
    }

    pub fn next_page(&self) -> Option<u32> {
        self.has_next.then(|| self.page + 1)
    }

    fn empty(per_page: u32) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            pages: 0,
            page: 1,
            per_page,
            has_prev: false,
            has_next: false,
        }
    }
}

/// Produces bounded, clamped pages ordered by latest activity.
///
/// Stateless and reentrant; a store failure is logged and converted
/// into an empty page so the read path never turns into a caller-facing
/// crash.
pub struct PaginationEngine {
    store: Arc<dyn TicketStore>,
    compiler: FilterCompiler,
    config: PageConfig,
}

impl PaginationEngine {
    pub fn new(store: Arc<dyn TicketStore>, compiler: FilterCompiler, config: PageConfig) -> Self {
        Self {
            store,
            compiler,
            config,
        }
    }

    /// Return one page of tickets in `scope` matching `filters`.
    pub fn paginate(
        &self,
        scope: TicketScope,
        request: PageRequest,
        filters: &FilterSpec,
    ) -> PageResult {
        let per_page = request
            .per_page
            .unwrap_or(self.config.page_size)
            .clamp(1, self.config.max_page_size);

        let mut clauses = Vec::new();
        if let TicketScope::Service(kind) = scope {
            clauses.push(FilterClause::Service(kind));
        }
        clauses.extend(self.compiler.compile(filters));

        match self.run(&clauses, request.page, per_page) {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "pagination degraded to empty page");
                metrics::READS_DEGRADED
                    .with_label_values(&["pagination"])
                    .inc();
                PageResult::empty(per_page)
            }
        }
    }

    fn run(
        &self,
        clauses: &[FilterClause],
        requested_page: i64,
        per_page: u32,
    ) -> Result<PageResult, crate::ticket::StoreError> {
        let total = self.store.count(clauses)?;
        let pages = total.div_ceil(per_page as u64) as u32;
        let page = requested_page.clamp(1, pages.max(1) as i64) as u32;
        let offset = (page as u64 - 1) * per_page as u64;

        let items = if total == 0 {
            Vec::new()
        } else {
            self.store.fetch(clauses, Some(per_page as u64), offset)?
        };

        Ok(PageResult {
            items,
            total,
            pages,
            page,
            per_page,
            has_prev: page > 1,
            has_next: page < pages,
        })
    }
}
