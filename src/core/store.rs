use chrono::{DateTime, Utc};
use hashbrown::HashMap;

use crate::{
    persist::{QsoStore, StoreError, StoreResult},
    qso::{QsoRecord, StoredQso},
    types::{LogId, QsoId},
};

use super::{
    dupe::{DupeKey, is_within_window},
    indices::{VecIndex, remove_from_vec_index},
};

/// Volatile [`QsoStore`] indexed by duplicate key and by log.
#[derive(Debug, Default)]
pub struct MemoryQsoStore {
    records: HashMap<QsoId, StoredQso>,
    order: Vec<QsoId>,
    by_key: VecIndex<DupeKey>,
    by_log: VecIndex<LogId>,
    next_qso_id: QsoId,
}

impl MemoryQsoStore {
    /// Empty store; ids start at 1.
    pub fn new() -> Self {
        Self {
            next_qso_id: 1,
            ..Self::default()
        }
    }

    /// Live records across all logs.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no records are held.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Live ids in insertion order across all logs.
    pub fn ordered_ids(&self) -> &[QsoId] {
        &self.order
    }

    fn find_duplicate(
        &self,
        key: &DupeKey,
        ts: DateTime<Utc>,
        exclude: Option<QsoId>,
    ) -> Option<QsoId> {
        self.by_key
            .get(key)
            .into_iter()
            .flat_map(|ids| ids.iter())
            .filter(|id| Some(**id) != exclude)
            .filter_map(|id| self.records.get(id))
            .find(|rec| is_within_window(rec.qso.timestamp, ts))
            .map(|rec| rec.id)
    }
}

impl QsoStore for MemoryQsoStore {
    fn create(&mut self, log_id: LogId, qso: QsoRecord) -> StoreResult<StoredQso> {
        let key = DupeKey::of(log_id, &qso);
        if let Some(existing) = self.find_duplicate(&key, qso.timestamp, None) {
            return Err(StoreError::DuplicateQso { existing });
        }

        let id = self.next_qso_id;
        self.next_qso_id += 1;

        self.by_key.entry(key).or_default().push(id);
        self.by_log.entry(log_id).or_default().push(id);
        self.order.push(id);

        let stored = StoredQso { id, log_id, qso };
        self.records.insert(id, stored.clone());
        Ok(stored)
    }

    fn update(&mut self, id: QsoId, qso: QsoRecord) -> StoreResult<StoredQso> {
        let current = self.records.get(&id).ok_or(StoreError::MissingQso(id))?;
        let log_id = current.log_id;
        let old_key = DupeKey::of(log_id, &current.qso);
        let new_key = DupeKey::of(log_id, &qso);

        if let Some(existing) = self.find_duplicate(&new_key, qso.timestamp, Some(id)) {
            return Err(StoreError::DuplicateQso { existing });
        }

        if old_key != new_key {
            if let Some(ids) = self.by_key.get_mut(&old_key) {
                remove_from_vec_index(ids, id);
            }
            self.by_key.entry(new_key).or_default().push(id);
        }

        let stored = StoredQso { id, log_id, qso };
        self.records.insert(id, stored.clone());
        Ok(stored)
    }

    fn get(&self, id: QsoId) -> StoreResult<Option<StoredQso>> {
        Ok(self.records.get(&id).cloned())
    }

    fn delete(&mut self, id: QsoId) -> StoreResult<()> {
        let rec = self.records.remove(&id).ok_or(StoreError::MissingQso(id))?;
        if let Some(ids) = self.by_key.get_mut(&DupeKey::of(rec.log_id, &rec.qso)) {
            remove_from_vec_index(ids, id);
        }
        if let Some(ids) = self.by_log.get_mut(&rec.log_id) {
            remove_from_vec_index(ids, id);
        }
        remove_from_vec_index(&mut self.order, id);
        Ok(())
    }

    fn list_log(&self, log_id: LogId) -> StoreResult<Vec<StoredQso>> {
        Ok(self
            .by_log
            .get(&log_id)
            .into_iter()
            .flat_map(|ids| ids.iter())
            .filter_map(|id| self.records.get(id).cloned())
            .collect())
    }
}
