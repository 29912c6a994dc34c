use std::path::PathBuf;

use indicatif::ProgressBar;
use thiserror::Error;

use crate::catalog::{self, Artwork, CatalogClient, CatalogError, Page};
use crate::quota::{self, QuotaError, QuotaOutcome};
use crate::selection::{SelectionStore, StoreError};
use crate::session::Session;

#[derive(Clone, Debug)]
pub struct Options {
    pub api_url: String,
    /// `None` keeps the selection in memory only (no state file).
    pub state_file: Option<PathBuf>,
    pub timeout_seconds: u64,
    pub fetch_rate: u32,
    pub page_ceiling: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            api_url: catalog::DEFAULT_API_URL.to_string(),
            state_file: None,
            timeout_seconds: 10,
            fetch_rate: quota::DEFAULT_FETCH_RATE,
            page_ceiling: quota::DEFAULT_PAGE_CEILING,
        }
    }
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("invalid catalog URL: {url}")]
    InvalidUrl { url: String },

    #[error("invalid page_ceiling 0, expected positive integer")]
    InvalidPageCeiling,

    #[error("invalid fetch_rate 0, expected positive pages per second")]
    InvalidFetchRate,

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Quota(#[from] QuotaError),
}

/// What one navigation or toggle produced, ready for rendering.
#[derive(Clone, Debug)]
pub struct PageView {
    pub page: Page,
    /// Selection members visible on this page (drives checkbox marks).
    pub checked: Vec<Artwork>,
    /// Size of the whole cross-page selection.
    pub selected_count: usize,
}

pub struct Runner {
    session: Session<CatalogClient>,
}

impl Runner {
    /// Validate options, build the HTTP client, and restore the selection
    /// from its state file.
    pub fn new(options: Options) -> Result<Self, RunnerError> {
        let store = match options.state_file.as_ref() {
            Some(path) => SelectionStore::restore(path)?,
            None => SelectionStore::in_memory(),
        };
        Self::with_store(options, store)
    }

    /// Same wiring with a caller-provided store. Used to continue with an
    /// empty selection after `restore` reported a corrupt state file.
    pub fn with_store(options: Options, store: SelectionStore) -> Result<Self, RunnerError> {
        if reqwest::Url::parse(&options.api_url).is_err() {
            return Err(RunnerError::InvalidUrl {
                url: options.api_url,
            });
        }
        if options.page_ceiling == 0 {
            return Err(RunnerError::InvalidPageCeiling);
        }
        if options.fetch_rate == 0 {
            return Err(RunnerError::InvalidFetchRate);
        }

        let client = CatalogClient::new(options.api_url.as_str(), options.timeout_seconds)?;
        let session = Session::new(client, store)
            .with_quota_limits(options.page_ceiling, options.fetch_rate);
        Ok(Self { session })
    }

    /// Navigate to a page and describe it for rendering.
    pub async fn view(&mut self, page: u32) -> Result<PageView, RunnerError> {
        let fetched = self.session.navigate(page).await?.clone();
        Ok(self.page_view(fetched))
    }

    /// Navigate to a page, then apply checkbox changes relative to what is
    /// already checked there: `check` ids are added, `uncheck` ids removed,
    /// and the result is reconciled against the displayed page.
    pub async fn toggle(
        &mut self,
        page: u32,
        check: &[i64],
        uncheck: &[i64],
    ) -> Result<PageView, RunnerError> {
        let fetched = self.session.navigate(page).await?.clone();

        let mut checked_ids: Vec<i64> = self
            .session
            .visible_selection()
            .iter()
            .map(|r| r.id)
            .collect();
        for id in check {
            if !checked_ids.contains(id) {
                checked_ids.push(*id);
            }
        }
        checked_ids.retain(|id| !uncheck.contains(id));

        self.session.toggle_selection(&checked_ids)?;
        Ok(self.page_view(fetched))
    }

    /// Fulfill a selection quota. The walk starts at page 1 regardless of
    /// the last viewed page.
    pub async fn pick(&mut self, count: u64, pb: ProgressBar) -> Result<QuotaOutcome, RunnerError> {
        Ok(self.session.select_quota(pb, count).await?)
    }

    /// The whole selection in join order.
    pub fn selection(&self) -> &[Artwork] {
        self.session.store().items()
    }

    fn page_view(&self, page: Page) -> PageView {
        PageView {
            checked: self.session.visible_selection(),
            selected_count: self.session.store().len(),
            page,
        }
    }
}
