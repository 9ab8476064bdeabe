use std::collections::{BTreeMap, VecDeque};
use std::io::ErrorKind;
use std::path::Path;

use inputlab_core::{TestKind, TestRecord};
use tracing::{debug, info};

use crate::error::{LabError, Result};

/// The last few results of every test kind, persisted as JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordStore {
    capacity: usize,
    records: BTreeMap<TestKind, VecDeque<TestRecord>>,
}

impl RecordStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            records: BTreeMap::new(),
        }
    }

    /// Loads a store; a missing file is an empty store.
    pub fn load(path: impl AsRef<Path>, capacity: usize) -> Result<Self> {
        let path = path.as_ref();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no record history yet");
                return Ok(Self::new(capacity));
            }
            Err(e) => return Err(LabError::io(path, e)),
        };
        let records: BTreeMap<TestKind, VecDeque<TestRecord>> =
            serde_json::from_str(&text).map_err(|e| LabError::json(path, e))?;

        let mut store = Self::new(capacity);
        for record in records.into_values().flatten() {
            store.push(record);
        }
        info!(path = %path.display(), records = store.len(), "record history loaded");
        Ok(store)
    }

    /// Writes through a temporary file so a crash never leaves half a store behind.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let tmp = path.with_extension("json.tmp");
        let text = serde_json::to_string_pretty(&self.records)
            .map_err(|e| LabError::json(path, e))?;
        std::fs::write(&tmp, text).map_err(|e| LabError::io(&tmp, e))?;
        std::fs::rename(&tmp, path).map_err(|e| LabError::io(path, e))?;
        info!(path = %path.display(), records = self.len(), "record history saved");
        Ok(())
    }

    pub fn push(&mut self, record: TestRecord) {
        let list = self.records.entry(record.kind()).or_default();
        list.push_back(record);
        while list.len() > self.capacity {
            list.pop_front();
        }
    }

    /// Oldest first.
    pub fn recent(&self, kind: TestKind) -> impl Iterator<Item = &TestRecord> {
        self.records.get(&kind).into_iter().flatten()
    }

    pub fn latest(&self, kind: TestKind) -> Option<&TestRecord> {
        self.records.get(&kind).and_then(|l| l.back())
    }

    pub fn len(&self) -> usize {
        self.records.values().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
