//! Quota fulfillment: walk catalog pages in order, merging records the
//! selection does not hold yet, until the requested count is met, the
//! source is exhausted, or the page ceiling trips.

use std::num::NonZeroU32;

use colored::Colorize;
use governor::{Quota, RateLimiter};
use indicatif::ProgressBar;
use thiserror::Error;

use crate::catalog::{CatalogError, PageSource};
use crate::selection::{SelectionStore, StoreError};

/// Hard ceiling on pages walked by one run, against a source that keeps
/// returning full pages without ever satisfying the quota.
pub const DEFAULT_PAGE_CEILING: u32 = 1000;

/// Pages fetched per second during a walk.
pub const DEFAULT_FETCH_RATE: u32 = 10;

#[derive(Clone, Copy, Debug)]
pub struct QuotaRequest {
    pub count: u64,
    pub page_ceiling: u32,
    pub fetch_rate: u32,
}

impl QuotaRequest {
    pub fn new(count: u64) -> Self {
        Self {
            count,
            page_ceiling: DEFAULT_PAGE_CEILING,
            fetch_rate: DEFAULT_FETCH_RATE,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuotaOutcome {
    pub requested: u64,
    pub collected: u64,
    /// True once the source yielded no further usable data before the
    /// quota was met.
    pub exhausted: bool,
}

#[derive(Debug, Error)]
pub enum QuotaError {
    #[error("invalid quota request: count must be a positive integer")]
    InvalidRequest,

    #[error("quota run aborted after collecting {collected} of {requested}: {source}")]
    Aborted {
        collected: u64,
        requested: u64,
        #[source]
        source: CatalogError,
    },

    #[error("failed to persist selection after quota run: {source}")]
    Store {
        #[from]
        source: StoreError,
    },
}

// Walk state for one run. Created when the command is issued, dropped when
// the walk terminates. The cursor is independent of the navigation cursor.
#[derive(Debug)]
struct QuotaOperation {
    requested: u64,
    collected: u64,
    cursor: u32,
    exhausted: bool,
}

/// Fetches are strictly sequential: each page completes (or fails) before
/// the next is issued, because exhaustion and the ceiling check depend on
/// the prior result. Existing selections are skipped, never removed or
/// reordered. The store is persisted exactly once after the walk ends, so
/// completed pages survive a mid-run transport failure.
pub async fn fill_quota<S: PageSource + ?Sized>(
    pb: ProgressBar,
    source: &S,
    store: &mut SelectionStore,
    request: QuotaRequest,
) -> Result<QuotaOutcome, QuotaError> {
    if request.count == 0 {
        return Err(QuotaError::InvalidRequest);
    }

    let rate = NonZeroU32::new(request.fetch_rate).unwrap_or(NonZeroU32::MIN);
    let lim = RateLimiter::direct(Quota::per_second(rate));

    let mut op = QuotaOperation {
        requested: request.count,
        collected: 0,
        cursor: 1,
        exhausted: false,
    };
    let mut abort: Option<CatalogError> = None;

    while op.collected < op.requested && !op.exhausted && op.cursor <= request.page_ceiling {
        lim.until_ready().await;
        pb.set_message(format!("fetching page {}", op.cursor));

        let page = match source.fetch_page(op.cursor).await {
            Ok(page) => page,
            Err(e @ CatalogError::MalformedResponse { .. }) => {
                pb.println(format!("{} {}", "[WRN]".bold().yellow(), e));
                op.exhausted = true;
                break;
            }
            Err(e) => {
                abort = Some(e);
                break;
            }
        };

        if page.records.is_empty() {
            op.exhausted = true;
            break;
        }

        for record in page.records.iter() {
            if store.merge(record) {
                op.collected += 1;
                pb.inc(1);
                if op.collected == op.requested {
                    break;
                }
            }
        }

        // a short page is the final page; a run satisfied on it is not exhausted
        if op.collected < op.requested && page.is_short() {
            op.exhausted = true;
            break;
        }

        op.cursor += 1;
    }

    // one write for the whole walk; at most the aborted page's partial
    // contribution can be lost
    store.persist()?;

    match abort {
        Some(source) => Err(QuotaError::Aborted {
            collected: op.collected,
            requested: op.requested,
            source,
        }),
        None => Ok(QuotaOutcome {
            requested: op.requested,
            collected: op.collected,
            exhausted: op.exhausted,
        }),
    }
}
