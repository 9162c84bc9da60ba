//! Ranking storage
//!
//! `MemoryStore` keeps rows sorted in leaderboard order on every insert.
//! `LocalRankingStore` wraps one and writes it through to key/value storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::StoreError;
use super::entry::RankingEntry;
use crate::persistence::{self, KeyValueStore};

/// Append-only ranking storage
pub trait RankingStore {
    /// Insert a validated row, assigning its id
    fn append(&mut self, name: &str, score: u32, now: DateTime<Utc>) -> Result<RankingEntry, StoreError>;
    /// Best `limit` rows in leaderboard order
    fn top(&self, limit: usize) -> Result<Vec<RankingEntry>, StoreError>;
    fn is_empty(&self) -> Result<bool, StoreError>;
}

/// In-memory rows, always sorted
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryStore {
    entries: Vec<RankingEntry>,
    next_id: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    fn insert_sorted(&mut self, entry: RankingEntry) {
        let pos = self
            .entries
            .partition_point(|e| e.rank_cmp(&entry).is_lt());
        self.entries.insert(pos, entry);
    }
}

impl RankingStore for MemoryStore {
    fn append(&mut self, name: &str, score: u32, now: DateTime<Utc>) -> Result<RankingEntry, StoreError> {
        let entry = RankingEntry {
            id: self.next_id.max(1),
            name: name.to_string(),
            score,
            created_at: now,
        };
        self.next_id = entry.id + 1;
        self.insert_sorted(entry.clone());
        Ok(entry)
    }

    fn top(&self, limit: usize) -> Result<Vec<RankingEntry>, StoreError> {
        Ok(self.entries.iter().take(limit).cloned().collect())
    }

    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.entries.is_empty())
    }
}

/// A memory store written through to key/value storage after every append
pub struct LocalRankingStore<K: KeyValueStore> {
    inner: MemoryStore,
    backend: K,
}

impl<K: KeyValueStore> LocalRankingStore<K> {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "bike_dash_rankings";

    /// Open the store, starting empty when nothing valid is persisted
    pub fn open(backend: K) -> Self {
        let inner = persistence::load_json::<MemoryStore>(&backend, Self::STORAGE_KEY)
            .map(|mut store| {
                // Re-establish the order in case the document was edited by hand
                store.entries.sort_by(RankingEntry::rank_cmp);
                let max_id = store.entries.iter().map(|e| e.id).max().unwrap_or(0);
                store.next_id = store.next_id.max(max_id + 1);
                store
            })
            .unwrap_or_else(MemoryStore::new);
        log::info!("Opened local rankings ({} entries)", inner.len());
        Self { inner, backend }
    }

    /// Open the store, adding the demo rows to an empty board
    pub fn open_seeded(backend: K, now: DateTime<Utc>) -> Self {
        let mut store = Self::open(backend);
        if let Err(e) = seed_demo_rows(&mut store, now) {
            log::warn!("Could not seed local rankings: {}", e);
        }
        store
    }

    pub fn backend(&self) -> &K {
        &self.backend
    }
}

impl<K: KeyValueStore> RankingStore for LocalRankingStore<K> {
    fn append(&mut self, name: &str, score: u32, now: DateTime<Utc>) -> Result<RankingEntry, StoreError> {
        let mut next = self.inner.clone();
        let entry = next.append(name, score, now)?;
        // Only commit in memory once the write succeeded
        persistence::save_json(&mut self.backend, Self::STORAGE_KEY, &next)?;
        self.inner = next;
        Ok(entry)
    }

    fn top(&self, limit: usize) -> Result<Vec<RankingEntry>, StoreError> {
        self.inner.top(limit)
    }

    fn is_empty(&self) -> Result<bool, StoreError> {
        self.inner.is_empty()
    }
}

/// Demo rows inserted into an empty board
pub const DEMO_ROWS: [(&str, u32); 3] = [("Jugador Demo", 100), ("Test Player", 85), ("Ejemplo", 75)];

/// Insert the demo rows if the store is empty. Returns how many were added.
pub fn seed_demo_rows<S: RankingStore>(store: &mut S, now: DateTime<Utc>) -> Result<usize, StoreError> {
    if !store.is_empty()? {
        return Ok(0);
    }
    for (name, score) in DEMO_ROWS {
        store.append(name, score, now)?;
    }
    log::info!("Seeded {} demo rankings", DEMO_ROWS.len());
    Ok(DEMO_ROWS.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{MemoryStorage, PersistError};
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_memory_store_orders_on_insert() {
        let mut store = MemoryStore::new();
        store.append("low", 10, t0()).unwrap();
        store.append("high", 90, t0()).unwrap();
        store.append("mid", 50, t0()).unwrap();
        let names: Vec<_> = store.top(10).unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, ["high", "mid", "low"]);
        assert_eq!(store.top(2).unwrap().len(), 2);
    }

    #[test]
    fn test_ids_are_sequential() {
        let mut store = MemoryStore::new();
        let a = store.append("a", 1, t0()).unwrap();
        let b = store.append("b", 1, t0()).unwrap();
        assert_eq!((a.id, b.id), (1, 2));
    }

    #[test]
    fn test_equal_scores_earlier_first() {
        let mut store = MemoryStore::new();
        store.append("late", 50, t0() + Duration::seconds(5)).unwrap();
        store.append("early", 50, t0()).unwrap();
        let top = store.top(10).unwrap();
        assert_eq!(top[0].name, "early");
        assert_eq!(top[1].name, "late");
    }

    #[test]
    fn test_seed_only_when_empty() {
        let mut store = MemoryStore::new();
        assert_eq!(seed_demo_rows(&mut store, t0()).unwrap(), 3);
        assert_eq!(seed_demo_rows(&mut store, t0()).unwrap(), 0);
        let top = store.top(10).unwrap();
        assert_eq!(top[0].name, "Jugador Demo");
        assert_eq!(top[2].score, 75);
    }

    #[test]
    fn test_local_store_persists() {
        let mut store = LocalRankingStore::open(MemoryStorage::new());
        store.append("Ana", 42, t0()).unwrap();
        store.append("Bo", 7, t0()).unwrap();

        let backend = store.backend().clone();
        let mut reopened = LocalRankingStore::open(backend);
        let top = reopened.top(10).unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].name, "Ana");

        // Ids continue after the persisted ones
        let next = reopened.append("Cy", 1, t0()).unwrap();
        assert_eq!(next.id, 3);
    }

    #[test]
    fn test_open_seeded_keeps_existing_rows() {
        let backend: Box<dyn KeyValueStore> = Box::new(MemoryStorage::new());
        let mut store = LocalRankingStore::open_seeded(backend, t0());
        assert_eq!(store.top(10).unwrap().len(), DEMO_ROWS.len());
        store.append("Ana", 120, t0()).unwrap();

        let persisted = store.backend().get(LocalRankingStore::<MemoryStorage>::STORAGE_KEY);
        let mut backend = MemoryStorage::new();
        backend
            .set(LocalRankingStore::<MemoryStorage>::STORAGE_KEY, &persisted.unwrap())
            .unwrap();
        let reopened = LocalRankingStore::open_seeded(backend, t0());
        let top = reopened.top(10).unwrap();
        assert_eq!(top.len(), DEMO_ROWS.len() + 1);
        assert_eq!(top[0].name, "Ana");
    }

    #[test]
    fn test_open_seeded_on_read_only_backend_stays_empty() {
        let store = LocalRankingStore::open_seeded(ReadOnly, t0());
        assert!(store.is_empty().unwrap());
    }

    struct ReadOnly;

    impl KeyValueStore for ReadOnly {
        fn get(&self, _key: &str) -> Option<String> {
            None
        }

        fn set(&mut self, key: &str, _value: &str) -> Result<(), PersistError> {
            Err(PersistError::Write(key.to_string()))
        }

        fn remove(&mut self, _key: &str) {}
    }

    #[test]
    fn test_failed_write_leaves_store_unchanged() {
        let mut store = LocalRankingStore::open(ReadOnly);
        assert!(store.append("Ana", 42, t0()).is_err());
        assert!(store.is_empty().unwrap());
    }
}
