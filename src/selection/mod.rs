//! The durable, cross-page selection set. The store is the single writer:
//! navigation toggles and quota fulfillment both mutate through it, and each
//! public operation leaves the in-memory set fully updated before returning.

use std::collections::HashSet;
use std::path::PathBuf;

use thiserror::Error;

use crate::catalog::Artwork;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access selection state '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode selection state: {source}")]
    Serialize {
        #[source]
        source: serde_json::Error,
    },

    #[error("selection state '{path}' is corrupt: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Default)]
pub struct SelectionStore {
    items: Vec<Artwork>,
    ids: HashSet<i64>,
    state_path: Option<PathBuf>,
}

impl SelectionStore {
    /// A store with no backing file; `persist` becomes a no-op.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// An empty store bound to a state file it has not read. Used to recover
    /// from a corrupt file: the next persist overwrites it.
    pub fn empty_at(path: impl Into<PathBuf>) -> Self {
        Self {
            state_path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Load the selection set from its state file. A missing file is an
    /// empty set; unreadable JSON is reported as `Corrupt`.
    pub fn restore(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::empty_at(path));
            }
            Err(e) => {
                return Err(StoreError::Io {
                    path: path.display().to_string(),
                    source: e,
                })
            }
        };
        let items: Vec<Artwork> =
            serde_json::from_str(&contents).map_err(|e| StoreError::Corrupt {
                path: path.display().to_string(),
                source: e,
            })?;

        // Duplicate ids in a hand-edited file collapse to first occurrence.
        let mut ids = HashSet::with_capacity(items.len());
        let mut deduped = Vec::with_capacity(items.len());
        for item in items {
            if ids.insert(item.id) {
                deduped.push(item);
            }
        }
        Ok(Self {
            items: deduped,
            ids,
            state_path: Some(path),
        })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.ids.contains(&id)
    }

    /// Members in join order.
    pub fn items(&self) -> &[Artwork] {
        &self.items
    }

    /// Replace the set with (existing members not on `displayed`) ∪ `checked`.
    /// Retained members keep their join order; newly checked records append
    /// in page order. Selections belonging to other pages are untouched.
    /// Write-through: persists before returning.
    pub fn reconcile(&mut self, displayed: &[Artwork], checked: &[Artwork]) -> Result<(), StoreError> {
        let displayed_ids: HashSet<i64> = displayed.iter().map(|r| r.id).collect();
        let checked_ids: HashSet<i64> = checked.iter().map(|r| r.id).collect();

        let mut next: Vec<Artwork> = Vec::with_capacity(self.items.len() + checked.len());
        let mut next_ids: HashSet<i64> = HashSet::with_capacity(self.items.len() + checked.len());
        for item in self.items.drain(..) {
            if !displayed_ids.contains(&item.id) || checked_ids.contains(&item.id) {
                next_ids.insert(item.id);
                next.push(item);
            }
        }
        for record in checked {
            if next_ids.insert(record.id) {
                next.push(record.clone());
            }
        }

        self.items = next;
        self.ids = next_ids;
        self.persist()
    }

    /// Add one record unless its id is already a member. Never overwrites
    /// existing entry content. Does not persist on its own; the quota walk
    /// batches one persist per run.
    pub fn merge(&mut self, record: &Artwork) -> bool {
        if self.ids.insert(record.id) {
            self.items.push(record.clone());
            return true;
        }
        false
    }

    /// Add a batch of records, skipping ids already present, then persist.
    /// Returns how many were added.
    pub fn merge_all(&mut self, records: &[Artwork]) -> Result<usize, StoreError> {
        let mut added = 0;
        for record in records {
            if self.merge(record) {
                added += 1;
            }
        }
        self.persist()?;
        Ok(added)
    }

    /// The members whose ids appear on `displayed`, for driving per-page
    /// checkbox state. Never yields an id absent from the page.
    pub fn visible_selection(&self, displayed: &[Artwork]) -> Vec<Artwork> {
        let displayed_ids: HashSet<i64> = displayed.iter().map(|r| r.id).collect();
        self.items
            .iter()
            .filter(|r| displayed_ids.contains(&r.id))
            .cloned()
            .collect()
    }

    /// Write the full set to the state file as an ordered JSON array.
    pub fn persist(&self) -> Result<(), StoreError> {
        let path = match self.state_path.as_ref() {
            Some(path) => path,
            None => return Ok(()),
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Io {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        let contents = serde_json::to_string_pretty(&self.items)
            .map_err(|e| StoreError::Serialize { source: e })?;
        std::fs::write(path, contents).map_err(|e| StoreError::Io {
            path: path.display().to_string(),
            source: e,
        })
    }
}
