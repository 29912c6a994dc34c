//! Page navigation: tracks the current page, re-requests it from the
//! source on navigation, and routes checkbox toggles and quota commands
//! through the selection store it owns.

use indicatif::ProgressBar;

use crate::catalog::{Artwork, CatalogError, Page, PageSource};
use crate::quota::{self, QuotaError, QuotaOutcome, QuotaRequest};
use crate::selection::{SelectionStore, StoreError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Loading,
}

pub struct Session<S> {
    source: S,
    store: SelectionStore,
    state: SessionState,
    current_page: u32,
    displayed: Option<Page>,
    page_ceiling: u32,
    fetch_rate: u32,
}

impl<S: PageSource> Session<S> {
    pub fn new(source: S, store: SelectionStore) -> Self {
        Self {
            source,
            store,
            state: SessionState::Idle,
            current_page: 1,
            displayed: None,
            page_ceiling: quota::DEFAULT_PAGE_CEILING,
            fetch_rate: quota::DEFAULT_FETCH_RATE,
        }
    }

    pub fn with_quota_limits(mut self, page_ceiling: u32, fetch_rate: u32) -> Self {
        self.page_ceiling = page_ceiling;
        self.fetch_rate = fetch_rate;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn displayed(&self) -> Option<&Page> {
        self.displayed.as_ref()
    }

    pub fn store(&self) -> &SelectionStore {
        &self.store
    }

    /// Fetch and display a page. Navigation never mutates the selection;
    /// a failed fetch leaves the previously displayed page untouched.
    pub async fn navigate(&mut self, page: u32) -> Result<&Page, CatalogError> {
        self.state = SessionState::Loading;
        let fetched = self.source.fetch_page(page).await;
        self.state = SessionState::Idle;
        let fetched = fetched?;
        self.current_page = page;
        Ok(self.displayed.insert(fetched))
    }

    /// Apply the checked subset of the displayed page to the selection.
    /// Ids not on the displayed page are ignored. Returns the records of
    /// the page that are checked after reconciliation.
    pub fn toggle_selection(&mut self, checked_ids: &[i64]) -> Result<Vec<Artwork>, StoreError> {
        let displayed: Vec<Artwork> = match self.displayed.as_ref() {
            Some(page) => page.records.clone(),
            None => Vec::new(),
        };
        let checked: Vec<Artwork> = displayed
            .iter()
            .filter(|r| checked_ids.contains(&r.id))
            .cloned()
            .collect();
        self.store.reconcile(&displayed, &checked)?;
        Ok(self.store.visible_selection(&displayed))
    }

    /// Select `count` not-yet-selected records by walking pages from page 1,
    /// regardless of the navigation cursor. `&mut self` serializes the run
    /// against every other store access.
    pub async fn select_quota(
        &mut self,
        pb: ProgressBar,
        count: u64,
    ) -> Result<QuotaOutcome, QuotaError> {
        let request = QuotaRequest {
            count,
            page_ceiling: self.page_ceiling,
            fetch_rate: self.fetch_rate,
        };
        quota::fill_quota(pb, &self.source, &mut self.store, request).await
    }

    /// Checkbox state for the displayed page.
    pub fn visible_selection(&self) -> Vec<Artwork> {
        match self.displayed.as_ref() {
            Some(page) => self.store.visible_selection(&page.records),
            None => Vec::new(),
        }
    }
}
