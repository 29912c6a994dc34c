use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use indicatif::ProgressBar;

use crate::catalog::{Artwork, CatalogError, Page, PageSource, PAGE_SIZE};
use crate::quota::{self, QuotaError, QuotaOutcome, QuotaRequest};
use crate::selection::{SelectionStore, StoreError};
use crate::session::{Session, SessionState};

fn artwork(id: i64) -> Artwork {
    Artwork {
        id,
        title: Some(format!("work {id}")),
        place_of_origin: None,
        artist_display: None,
        inscriptions: None,
        date_start: None,
        date_end: None,
    }
}

fn batch(start_id: i64, len: usize) -> Vec<Artwork> {
    (start_id..start_id + len as i64).map(artwork).collect()
}

fn ids_of(records: &[Artwork]) -> Vec<i64> {
    records.iter().map(|r| r.id).collect()
}

enum Scripted {
    Records(Vec<Artwork>),
    Malformed,
    Fail,
}

struct ScriptedSource {
    pages: Vec<Scripted>,
    total: u64,
    fetches: AtomicU32,
    // served for pages beyond the script; None means an empty page
    overflow: Option<Vec<Artwork>>,
}

impl ScriptedSource {
    fn new(pages: Vec<Scripted>, total: u64) -> Self {
        Self {
            pages,
            total,
            fetches: AtomicU32::new(0),
            overflow: None,
        }
    }

    fn looping(records: Vec<Artwork>, total: u64) -> Self {
        Self {
            pages: Vec::new(),
            total,
            fetches: AtomicU32::new(0),
            overflow: Some(records),
        }
    }

    fn fetches(&self) -> u32 {
        self.fetches.load(Ordering::SeqCst)
    }
}

// a request-builder error stands in for a transport failure; no network
fn transport_error(page: u32) -> CatalogError {
    let source = reqwest::Client::new().get("not a url").build().unwrap_err();
    CatalogError::Request { page, source }
}

#[async_trait]
impl PageSource for ScriptedSource {
    async fn fetch_page(&self, page: u32) -> Result<Page, CatalogError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        match self.pages.get((page - 1) as usize) {
            Some(Scripted::Records(records)) => Ok(Page {
                number: page,
                records: records.clone(),
                total: self.total,
            }),
            Some(Scripted::Malformed) => Err(CatalogError::MalformedResponse {
                page,
                reason: "data field is not an array".to_string(),
            }),
            Some(Scripted::Fail) => Err(transport_error(page)),
            None => Ok(Page {
                number: page,
                records: self.overflow.clone().unwrap_or_default(),
                total: self.total,
            }),
        }
    }
}

#[tokio::test]
async fn selection_survives_page_navigation() {
    let source = ScriptedSource::new(
        vec![
            Scripted::Records(batch(1, PAGE_SIZE)),
            Scripted::Records(batch(100, PAGE_SIZE)),
        ],
        24,
    );
    let mut session = Session::new(source, SelectionStore::in_memory());

    session.navigate(1).await.unwrap();
    session.toggle_selection(&[1, 2, 3]).unwrap();
    assert_eq!(session.store().len(), 3);

    session.navigate(2).await.unwrap();
    assert_eq!(session.state(), SessionState::Idle);
    assert_eq!(session.store().len(), 3);
    assert!(session.visible_selection().is_empty());

    session.navigate(1).await.unwrap();
    assert_eq!(ids_of(&session.visible_selection()), vec![1, 2, 3]);
}

#[tokio::test]
async fn quota_spans_pages_and_reports_success() {
    let source = ScriptedSource::new(
        vec![
            Scripted::Records(batch(1, PAGE_SIZE)),
            Scripted::Records(batch(13, PAGE_SIZE)),
        ],
        130023,
    );
    let mut store = SelectionStore::in_memory();

    let outcome = quota::fill_quota(
        ProgressBar::hidden(),
        &source,
        &mut store,
        QuotaRequest::new(20),
    )
    .await
    .unwrap();

    assert_eq!(
        outcome,
        QuotaOutcome {
            requested: 20,
            collected: 20,
            exhausted: false,
        }
    );
    assert_eq!(ids_of(store.items()), (1..=20).collect::<Vec<i64>>());
    assert_eq!(source.fetches(), 2);
}

#[tokio::test]
async fn quota_reports_exhaustion_when_source_runs_dry() {
    let source = ScriptedSource::new(
        vec![
            Scripted::Records(batch(1, PAGE_SIZE)),
            Scripted::Records(batch(13, PAGE_SIZE)),
            Scripted::Records(batch(25, 6)),
        ],
        30,
    );
    let mut store = SelectionStore::in_memory();

    let outcome = quota::fill_quota(
        ProgressBar::hidden(),
        &source,
        &mut store,
        QuotaRequest::new(50),
    )
    .await
    .unwrap();

    assert_eq!(
        outcome,
        QuotaOutcome {
            requested: 50,
            collected: 30,
            exhausted: true,
        }
    );
    assert_eq!(store.len(), 30);
    assert_eq!(source.fetches(), 3);
}

#[tokio::test]
async fn quota_is_additive_and_skips_existing_members() {
    let source = ScriptedSource::new(vec![Scripted::Records(batch(1, PAGE_SIZE))], 12);
    let mut store = SelectionStore::in_memory();
    store.merge_all(&batch(1, 3)).unwrap();

    let outcome = quota::fill_quota(
        ProgressBar::hidden(),
        &source,
        &mut store,
        QuotaRequest::new(4),
    )
    .await
    .unwrap();

    assert_eq!(outcome.collected, 4);
    assert!(!outcome.exhausted);
    // existing members keep their place; new ones append in page order
    assert_eq!(ids_of(store.items()), vec![1, 2, 3, 4, 5, 6, 7]);
}

#[tokio::test]
async fn zero_quota_is_rejected_before_any_fetch() {
    let source = ScriptedSource::new(Vec::new(), 0);
    let mut store = SelectionStore::in_memory();

    let err = quota::fill_quota(
        ProgressBar::hidden(),
        &source,
        &mut store,
        QuotaRequest::new(0),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, QuotaError::InvalidRequest));
    assert_eq!(source.fetches(), 0);
    assert!(store.is_empty());
}

#[tokio::test]
async fn page_ceiling_bounds_a_runaway_walk() {
    // a source that keeps returning the same full page of already selected
    // records would otherwise loop forever
    let records = batch(1, PAGE_SIZE);
    let source = ScriptedSource::looping(records.clone(), 130023);
    let mut store = SelectionStore::in_memory();
    store.merge_all(&records).unwrap();

    let request = QuotaRequest {
        count: 5,
        page_ceiling: 4,
        fetch_rate: 1000,
    };
    let outcome = quota::fill_quota(ProgressBar::hidden(), &source, &mut store, request)
        .await
        .unwrap();

    assert_eq!(outcome.collected, 0);
    assert!(!outcome.exhausted);
    assert_eq!(source.fetches(), 4);
}

#[tokio::test]
async fn quota_treats_malformed_page_as_exhaustion() {
    let source = ScriptedSource::new(
        vec![Scripted::Records(batch(1, PAGE_SIZE)), Scripted::Malformed],
        130023,
    );
    let mut store = SelectionStore::in_memory();

    let outcome = quota::fill_quota(
        ProgressBar::hidden(),
        &source,
        &mut store,
        QuotaRequest::new(20),
    )
    .await
    .unwrap();

    assert_eq!(
        outcome,
        QuotaOutcome {
            requested: 20,
            collected: 12,
            exhausted: true,
        }
    );
}

#[tokio::test]
async fn transport_abort_persists_completed_pages() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("selection.json");
    let source = ScriptedSource::new(
        vec![Scripted::Records(batch(1, PAGE_SIZE)), Scripted::Fail],
        130023,
    );
    let mut store = SelectionStore::restore(&path).unwrap();

    let err = quota::fill_quota(
        ProgressBar::hidden(),
        &source,
        &mut store,
        QuotaRequest::new(20),
    )
    .await
    .unwrap_err();

    match err {
        QuotaError::Aborted {
            collected,
            requested,
            ..
        } => {
            assert_eq!(collected, 12);
            assert_eq!(requested, 20);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let reloaded = SelectionStore::restore(&path).unwrap();
    assert_eq!(reloaded.len(), 12);
}

#[tokio::test]
async fn malformed_page_keeps_previous_page_displayed() {
    let source = ScriptedSource::new(
        vec![Scripted::Records(batch(1, PAGE_SIZE)), Scripted::Malformed],
        24,
    );
    let mut session = Session::new(source, SelectionStore::in_memory());

    session.navigate(1).await.unwrap();
    session.toggle_selection(&[1]).unwrap();

    let err = session.navigate(2).await.unwrap_err();
    assert!(matches!(err, CatalogError::MalformedResponse { .. }));
    assert_eq!(session.state(), SessionState::Idle);
    assert_eq!(session.current_page(), 1);
    let displayed = session.displayed().unwrap();
    assert_eq!(displayed.number, 1);
    assert_eq!(displayed.records.len(), PAGE_SIZE);
    assert_eq!(session.store().len(), 1);
}

#[tokio::test]
async fn toggle_ignores_ids_not_on_the_displayed_page() {
    let source = ScriptedSource::new(vec![Scripted::Records(batch(1, PAGE_SIZE))], 12);
    let mut session = Session::new(source, SelectionStore::in_memory());

    session.navigate(1).await.unwrap();
    session.toggle_selection(&[1, 999]).unwrap();
    assert_eq!(ids_of(session.store().items()), vec![1]);
}

#[tokio::test]
async fn toggles_write_through_to_the_state_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("selection.json");
    let source = ScriptedSource::new(vec![Scripted::Records(batch(1, PAGE_SIZE))], 12);
    let mut session = Session::new(source, SelectionStore::restore(&path).unwrap());

    session.navigate(1).await.unwrap();
    session.toggle_selection(&[2, 3]).unwrap();
    assert_eq!(SelectionStore::restore(&path).unwrap().len(), 2);

    // unchecking 3 is written out as well
    session.toggle_selection(&[2]).unwrap();
    assert_eq!(ids_of(SelectionStore::restore(&path).unwrap().items()), vec![2]);
}

#[test]
fn selection_round_trips_through_state_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("selection.json");

    let mut store = SelectionStore::restore(&path).unwrap();
    assert!(store.is_empty());
    store.merge_all(&batch(1, 5)).unwrap();

    let reloaded = SelectionStore::restore(&path).unwrap();
    assert_eq!(ids_of(reloaded.items()), ids_of(store.items()));
}

#[test]
fn corrupt_state_file_is_reported_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("selection.json");
    std::fs::write(&path, "not json at all").unwrap();

    let err = SelectionStore::restore(&path).unwrap_err();
    assert!(matches!(err, StoreError::Corrupt { .. }));

    // recovery path: start empty at the same file, next persist overwrites
    let mut store = SelectionStore::empty_at(&path);
    store.merge_all(&batch(1, 2)).unwrap();
    assert_eq!(SelectionStore::restore(&path).unwrap().len(), 2);
}

#[test]
fn config_file_parses_and_aliases_rate() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yml");
    std::fs::write(
        &path,
        "api_url: https://example.com/api/artworks\nrate: 5\npage_ceiling: 40\nno_color: true\n",
    )
    .unwrap();

    let cfg = crate::config::load_config(&path, false).unwrap();
    assert_eq!(cfg.api_url.as_deref(), Some("https://example.com/api/artworks"));
    assert_eq!(cfg.fetch_rate, Some(5));
    assert_eq!(cfg.page_ceiling, Some(40));
    assert_eq!(cfg.no_color, Some(true));

    let missing = dir.path().join("absent.yml");
    assert!(crate::config::load_config(&missing, true).is_ok());
    assert!(crate::config::load_config(&missing, false).is_err());
}
