//! Cursor pagination over `QueryScheduledRunAll`.
//!
//! The pager owns the `{prefix, reversed}` filter and the continuation token. Every filter
//! change starts a new epoch; pages fetched under an older epoch are dropped on arrival.
//! Callers that fetch off-task use [`ScheduledRunPager::begin_fetch`] +
//! [`FetchTicket::fetch`] + [`ScheduledRunPager::apply`]; single-owner callers use
//! [`ScheduledRunPager::load_more`].

use std::collections::HashSet;
use std::sync::Arc;

use dys_bridge::{QUERY_SCHEDULED_RUN_ALL, RemoteBridge};
use dys_types::{Page, ScheduledRun};
use serde_json::{Value, json};

use crate::error::{SchedulerError, SchedulerResult};

/// Fixed page size sent as `pagination.limit`.
pub const PAGE_LIMIT: u32 = 15;

/// Listing filter: key prefix plus ordering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageFilter {
    /// Index prefix; the dashboard defaults it to the connected account address.
    pub prefix: String,
    /// Descending by index when true.
    pub reversed: bool,
}

impl PageFilter {
    /// Filter on `prefix` with the given ordering.
    pub fn new(prefix: impl Into<String>, reversed: bool) -> Self {
        Self {
            prefix: prefix.into(),
            reversed,
        }
    }
}

/// How the `reversed` toggle maps onto `pagination.reverse`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReverseConvention {
    /// `pagination.reverse = reversed`.
    #[default]
    Direct,
    /// `pagination.reverse = !reversed`.
    Negated,
}

impl ReverseConvention {
    /// Value sent as `pagination.reverse` for the given toggle.
    #[must_use]
    pub fn request_flag(self, reversed: bool) -> bool {
        match self {
            Self::Direct => reversed,
            Self::Negated => !reversed,
        }
    }

    /// Parse a settings value (`direct` / `negated`).
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "direct" => Some(Self::Direct),
            "negated" | "negate" | "inverted" => Some(Self::Negated),
            _ => None,
        }
    }
}

/// Dispatch payload for one page request.
#[must_use]
pub fn page_request(
    filter: &PageFilter,
    cursor: Option<&str>,
    convention: ReverseConvention,
) -> Value {
    json!({
        "query": {
            "index": filter.prefix,
            "pagination.key": cursor.unwrap_or_default(),
            "pagination.reverse": convention.request_flag(filter.reversed),
            "pagination.limit": PAGE_LIMIT.to_string(),
        }
    })
}

/// Fetch a single page.
///
/// # Errors
/// Returns [`SchedulerError::TransientFetch`] on transport failure or an undecodable page,
/// and the classified remote error otherwise.
pub async fn fetch_page(
    bridge: &dyn RemoteBridge,
    filter: &PageFilter,
    cursor: Option<&str>,
    convention: ReverseConvention,
) -> SchedulerResult<Page> {
    let payload = page_request(filter, cursor, convention);
    let raw = bridge.dispatch(QUERY_SCHEDULED_RUN_ALL, payload).await?;
    serde_json::from_value(raw)
        .map_err(|e| SchedulerError::TransientFetch(format!("decode scheduled_run page: {e}")))
}

/// A fetch started under a given filter epoch.
#[derive(Debug, Clone)]
pub struct FetchTicket {
    epoch: u64,
    filter: PageFilter,
    cursor: Option<String>,
    convention: ReverseConvention,
}

impl FetchTicket {
    /// Continuation token sent with this fetch; `None` for the first page.
    #[must_use]
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    /// Run the fetch described by this ticket.
    ///
    /// # Errors
    /// See [`fetch_page`].
    pub async fn fetch(&self, bridge: &dyn RemoteBridge) -> SchedulerResult<Page> {
        fetch_page(bridge, &self.filter, self.cursor.as_deref(), self.convention).await
    }
}

/// Accumulated pages for the current filter.
pub struct ScheduledRunPager {
    bridge: Arc<dyn RemoteBridge>,
    convention: ReverseConvention,
    filter: PageFilter,
    epoch: u64,
    runs: Vec<ScheduledRun>,
    seen: HashSet<String>,
    next_key: Option<String>,
    pages_loaded: usize,
    total: Option<String>,
}

impl ScheduledRunPager {
    /// Empty pager; nothing is fetched until the first [`Self::load_more`].
    pub fn new(
        bridge: Arc<dyn RemoteBridge>,
        convention: ReverseConvention,
        filter: PageFilter,
    ) -> Self {
        Self {
            bridge,
            convention,
            filter,
            epoch: 0,
            runs: Vec::new(),
            seen: HashSet::new(),
            next_key: None,
            pages_loaded: 0,
            total: None,
        }
    }

    #[must_use]
    pub fn filter(&self) -> &PageFilter {
        &self.filter
    }

    #[must_use]
    pub fn convention(&self) -> ReverseConvention {
        self.convention
    }

    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Runs accumulated so far, in server order, deduplicated by index.
    #[must_use]
    pub fn runs(&self) -> &[ScheduledRun] {
        &self.runs
    }

    #[must_use]
    pub fn pages_loaded(&self) -> usize {
        self.pages_loaded
    }

    /// `pagination.total` from the last page, when the server reported one.
    #[must_use]
    pub fn total(&self) -> Option<&str> {
        self.total.as_deref()
    }

    /// True until the first page arrives, then iff the last page carried a `next_key`.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.pages_loaded == 0 || self.next_key.is_some()
    }

    /// Replace the filter. Any change discards accumulated pages and starts a new epoch.
    /// Returns whether the filter changed.
    pub fn set_filter(&mut self, filter: PageFilter) -> bool {
        if filter == self.filter {
            return false;
        }
        tracing::debug!(
            event = "dys.pager.filter_changed",
            prefix = %filter.prefix,
            reversed = filter.reversed,
            previous_epoch = self.epoch,
            "pagination filter changed; resetting cursor"
        );
        self.filter = filter;
        self.reset();
        true
    }

    pub fn set_prefix(&mut self, prefix: impl Into<String>) -> bool {
        let filter = PageFilter::new(prefix, self.filter.reversed);
        self.set_filter(filter)
    }

    pub fn set_reversed(&mut self, reversed: bool) -> bool {
        let filter = PageFilter::new(self.filter.prefix.clone(), reversed);
        self.set_filter(filter)
    }

    pub fn toggle_reversed(&mut self) {
        self.set_reversed(!self.filter.reversed);
    }

    /// Drop accumulated pages and restart from an empty cursor under a new epoch.
    pub fn reset(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
        self.runs.clear();
        self.seen.clear();
        self.next_key = None;
        self.pages_loaded = 0;
        self.total = None;
    }

    /// Ticket for the next page, or `None` when the listing is exhausted.
    #[must_use]
    pub fn begin_fetch(&self) -> Option<FetchTicket> {
        if !self.has_more() {
            return None;
        }
        Some(FetchTicket {
            epoch: self.epoch,
            filter: self.filter.clone(),
            cursor: self.next_key.clone(),
            convention: self.convention,
        })
    }

    /// Merge a fetched page. Pages from a stale epoch, or for a cursor that is no longer
    /// the current one, are discarded and `false` is returned.
    pub fn apply(&mut self, ticket: &FetchTicket, page: Page) -> bool {
        if ticket.epoch != self.epoch || ticket.cursor != self.next_key {
            tracing::debug!(
                event = "dys.pager.stale_page_dropped",
                ticket_epoch = ticket.epoch,
                current_epoch = self.epoch,
                "discarding page fetched under an outdated filter or cursor"
            );
            return false;
        }
        let next_key = page.next_cursor().map(str::to_string);
        let mut duplicates = 0_usize;
        for run in page.scheduled_run {
            if self.seen.insert(run.index.clone()) {
                self.runs.push(run);
            } else {
                duplicates += 1;
            }
        }
        if duplicates > 0 {
            tracing::warn!(
                event = "dys.pager.duplicate_runs",
                duplicates,
                "page repeated already listed indices; duplicates dropped"
            );
        }
        if !page.pagination.total.is_empty() {
            self.total = Some(page.pagination.total);
        }
        self.next_key = next_key;
        self.pages_loaded += 1;
        true
    }

    /// Fetch and merge the next page.
    ///
    /// Returns `Ok(false)` when nothing was fetched: listing exhausted or the chain API is
    /// not configured.
    ///
    /// # Errors
    /// See [`fetch_page`].
    pub async fn load_more(&mut self) -> SchedulerResult<bool> {
        if !self.bridge.api_available() {
            tracing::debug!(
                event = "dys.pager.api_unavailable",
                "chain API endpoint not configured; skipping fetch"
            );
            return Ok(false);
        }
        let Some(ticket) = self.begin_fetch() else {
            return Ok(false);
        };
        let page = ticket.fetch(self.bridge.as_ref()).await?;
        Ok(self.apply(&ticket, page))
    }

    /// Invalidate and refetch as many pages as were loaded before (at least one).
    ///
    /// # Errors
    /// See [`fetch_page`].
    pub async fn refresh(&mut self) -> SchedulerResult<()> {
        let target_pages = self.pages_loaded.max(1);
        self.reset();
        while self.pages_loaded < target_pages && self.has_more() {
            if !self.load_more().await? {
                break;
            }
        }
        tracing::debug!(
            event = "dys.pager.refreshed",
            pages = self.pages_loaded,
            runs = self.runs.len(),
            "scheduled run listing refreshed"
        );
        Ok(())
    }
}
