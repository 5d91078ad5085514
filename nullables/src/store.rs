//! Nullable store — thread-safe in-memory versioned table for testing.

use ehr_store::{AgreementRecord, AgreementStore, StoreError, TransitionStore, VersionChange};
use ehr_types::{AgreementId, StateAndRef, StateRef, TransitionId};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

/// Where an agreement's history currently ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Head {
    Live(u64),
    Retired(u64),
}

impl Head {
    fn version(self) -> u64 {
        match self {
            Head::Live(v) | Head::Retired(v) => v,
        }
    }
}

#[derive(Default)]
struct Table {
    rows: BTreeMap<(AgreementId, u64), AgreementRecord>,
    heads: HashMap<AgreementId, Head>,
}

impl Table {
    fn retire(&mut self, reference: &StateRef, by: TransitionId) {
        if let Some(row) = self.rows.get_mut(&(reference.id, reference.version)) {
            row.consumed_by = Some(by);
        }
        self.heads.insert(reference.id, Head::Retired(reference.version));
    }

    fn insert(&mut self, version: &StateAndRef, change: &VersionChange) {
        let reference = version.reference;
        self.rows.insert(
            (reference.id, reference.version),
            AgreementRecord {
                version: version.clone(),
                produced_by: change.transition,
                consumed_by: None,
                recorded_at: change.recorded_at,
            },
        );
        self.heads.insert(reference.id, Head::Live(reference.version));
    }

    fn apply(&mut self, change: &VersionChange) {
        if let Some(consumed) = &change.consumed {
            self.retire(consumed, change.transition);
        }
        if let Some(produced) = &change.produced {
            self.insert(produced, change);
        }
    }
}

/// An in-memory agreement table and transition log.
/// Thread-safe for use with tokio's multi-threaded runtime.
pub struct NullStore {
    table: Mutex<Table>,
    transitions: Mutex<HashMap<TransitionId, Vec<u8>>>,
}

impl NullStore {
    pub fn new() -> Self {
        Self {
            table: Mutex::new(Table::default()),
            transitions: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for NullStore {
    fn default() -> Self {
        Self::new()
    }
}

fn conflict(what: impl std::fmt::Display) -> StoreError {
    StoreError::Conflict(what.to_string())
}

impl AgreementStore for NullStore {
    fn commit(&self, change: &VersionChange) -> Result<(), StoreError> {
        let mut table = self.table.lock().unwrap();
        match (&change.consumed, &change.produced) {
            (Some(consumed), produced) => {
                if table.heads.get(&consumed.id) != Some(&Head::Live(consumed.version)) {
                    return Err(conflict(format!("{consumed} is not current")));
                }
                if let Some(produced) = produced {
                    if produced.reference != consumed.next() {
                        return Err(conflict(format!(
                            "{} does not succeed {consumed}",
                            produced.reference
                        )));
                    }
                }
            }
            (None, Some(produced)) => {
                if table.heads.contains_key(&produced.reference.id) {
                    return Err(conflict(format!("{} already exists", produced.reference.id)));
                }
            }
            (None, None) => return Err(conflict("change neither consumes nor produces")),
        }
        table.apply(change);
        Ok(())
    }

    fn record(&self, change: &VersionChange) -> Result<(), StoreError> {
        let mut table = self.table.lock().unwrap();
        let (id, version, retires) = match (&change.produced, &change.consumed) {
            (Some(produced), _) => (produced.reference.id, produced.reference.version, false),
            (None, Some(consumed)) => (consumed.id, consumed.version, true),
            (None, None) => return Err(conflict("change neither consumes nor produces")),
        };
        let moves_forward = match table.heads.get(&id).copied() {
            None => true,
            Some(Head::Live(held)) if retires => held <= version,
            Some(head) => head.version() < version,
        };
        if !moves_forward {
            return Err(conflict(format!("{id}@v{version} is behind the held version")));
        }
        if let Some(Head::Live(held)) = table.heads.get(&id).copied() {
            let consumed_here = change.consumed.map(|c| c.version) == Some(held);
            if !consumed_here {
                table.retire(&StateRef::new(id, held), change.transition);
            }
        }
        table.apply(change);
        Ok(())
    }

    fn current(&self, id: &AgreementId) -> Result<StateAndRef, StoreError> {
        let table = self.table.lock().unwrap();
        match table.heads.get(id) {
            Some(Head::Live(version)) => table
                .rows
                .get(&(*id, *version))
                .map(|row| row.version.clone())
                .ok_or_else(|| StoreError::NotFound(format!("{id}@v{version}"))),
            _ => Err(StoreError::NotFound(id.to_string())),
        }
    }

    fn get_version(&self, reference: &StateRef) -> Result<AgreementRecord, StoreError> {
        self.table
            .lock()
            .unwrap()
            .rows
            .get(&(reference.id, reference.version))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(reference.to_string()))
    }

    fn history(&self, id: &AgreementId) -> Result<Vec<AgreementRecord>, StoreError> {
        let table = self.table.lock().unwrap();
        let records: Vec<AgreementRecord> = table
            .rows
            .range((*id, 0)..=(*id, u64::MAX))
            .map(|(_, row)| row.clone())
            .collect();
        if records.is_empty() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(records)
    }

    fn list_current(&self) -> Result<Vec<StateAndRef>, StoreError> {
        Ok(self
            .table
            .lock()
            .unwrap()
            .rows
            .values()
            .filter(|row| row.is_current())
            .map(|row| row.version.clone())
            .collect())
    }

    fn current_count(&self) -> Result<u64, StoreError> {
        Ok(self
            .table
            .lock()
            .unwrap()
            .heads
            .values()
            .filter(|head| matches!(head, Head::Live(_)))
            .count() as u64)
    }
}

impl TransitionStore for NullStore {
    fn put_transition(&self, id: &TransitionId, bytes: &[u8]) -> Result<(), StoreError> {
        let mut transitions = self.transitions.lock().unwrap();
        if transitions.contains_key(id) {
            return Err(StoreError::Duplicate(id.to_string()));
        }
        transitions.insert(*id, bytes.to_vec());
        Ok(())
    }

    fn remove_transition(&self, id: &TransitionId) -> Result<(), StoreError> {
        self.transitions
            .lock()
            .unwrap()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn get_transition(&self, id: &TransitionId) -> Result<Vec<u8>, StoreError> {
        self.transitions
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn exists(&self, id: &TransitionId) -> Result<bool, StoreError> {
        Ok(self.transitions.lock().unwrap().contains_key(id))
    }

    fn transition_count(&self) -> Result<u64, StoreError> {
        Ok(self.transitions.lock().unwrap().len() as u64)
    }
}
