//! In-process directory.
//!
//! Serves records seeded from configuration (`directory.kind = "static"`) and
//! backs the test suite. Filter semantics match the MongoDB implementation.

use dashmap::DashMap;
use futures_util::future::{self, BoxFuture, FutureExt};
use std::sync::Arc;

use super::{BackendRecord, Directory, DirectoryError, Filter};

/// A concurrent map of record id to record.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    records: Arc<DashMap<String, BackendRecord>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = BackendRecord>) -> Self {
        let directory = Self::new();
        for record in records {
            directory.upsert(record);
        }
        directory
    }

    /// Inserts or replaces the record with the same id.
    pub fn upsert(&self, record: BackendRecord) {
        self.records.insert(record.id.clone(), record);
    }

    pub fn remove(&self, id: &str) -> Option<BackendRecord> {
        self.records.remove(id).map(|(_, record)| record)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the matching record with the smallest id.
    pub fn lookup(&self, filter: &Filter) -> Option<BackendRecord> {
        self.records
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .min_by(|a, b| a.key().cmp(b.key()))
            .map(|entry| entry.value().clone())
    }
}

impl Directory for InMemoryDirectory {
    fn find_one(
        &self,
        filter: &Filter,
    ) -> BoxFuture<'static, Result<Option<BackendRecord>, DirectoryError>> {
        future::ready(Ok(self.lookup(filter))).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::fields;

    #[tokio::test]
    async fn test_find_one_by_substring() {
        let directory = InMemoryDirectory::from_records([
            BackendRecord::new("aabbccddeeff", "ipsec-l2tp", "10.0.5.9:443"),
            BackendRecord::new("001122334455", "ipsec-l2tp", "10.0.5.10:443"),
        ]);

        let filter = Filter::new()
            .contains(fields::ID, "ccdd")
            .contains(fields::TUNNEL_TYPE, "ipsec");
        let record = directory.find_one(&filter).await.unwrap().unwrap();
        assert_eq!(record.address(), Some("10.0.5.9:443"));
    }

    #[tokio::test]
    async fn test_multiple_matches_pick_smallest_id() {
        let directory = InMemoryDirectory::from_records([
            BackendRecord::new("aabbccddeeff02", "ipsec", "10.0.0.2:443"),
            BackendRecord::new("aabbccddeeff01", "ipsec", "10.0.0.1:443"),
        ]);

        let filter = Filter::new().contains(fields::ID, "aabbccddeeff");
        let record = directory.find_one(&filter).await.unwrap().unwrap();
        assert_eq!(record.id, "aabbccddeeff01");
    }

    #[tokio::test]
    async fn test_no_match() {
        let directory = InMemoryDirectory::new();
        let filter = Filter::new().exact(fields::ID, "deadbeef0001");
        assert!(directory.find_one(&filter).await.unwrap().is_none());
    }

    #[test]
    fn test_upsert_replaces() {
        let directory = InMemoryDirectory::new();
        directory.upsert(BackendRecord::new("a", "ipsec", "10.0.0.1:443"));
        directory.upsert(BackendRecord::new("a", "ipsec", "10.0.0.2:443"));
        assert_eq!(directory.len(), 1);

        let removed = directory.remove("a").unwrap();
        assert_eq!(removed.address(), Some("10.0.0.2:443"));
        assert!(directory.is_empty());
    }
}
