//! In-memory registry backed by a sharded map.
//!
//! Conditional writes go through the map's entry API, so a precondition
//! check and the write it guards happen under the same shard lock.

use crate::registry::{
    Document, PageRequest, Paging, Record, RecordKey, RecordQuery, Registry, WritePrecondition,
    WriteResult,
};
use async_trait::async_trait;
use catalogue_core::{Error, Result};
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

pub struct MemoryRegistry {
    rows: DashMap<RecordKey, Record>,
    next_version: AtomicU64,
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self {
            rows: DashMap::new(),
            next_version: AtomicU64::new(1),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn bump(&self) -> u64 {
        self.next_version.fetch_add(1, Ordering::SeqCst)
    }

    fn record(&self, resource_type: &str, document: Document) -> Record {
        Record {
            resource_type: resource_type.to_string(),
            version: self.bump(),
            updated_at: Utc::now(),
            document,
        }
    }

    fn matching(&self, query: &RecordQuery) -> Vec<Record> {
        let mut found: Vec<Record> = self
            .rows
            .iter()
            .filter(|r| query.matches(r.value()))
            .map(|r| r.value().clone())
            .collect();
        found.sort_by(|a, b| a.key().cmp(&b.key()));
        found
    }
}

#[async_trait]
impl Registry for MemoryRegistry {
    async fn add_resource(&self, resource_type: &str, document: Document) -> Result<WriteResult> {
        let key = document.key(resource_type);
        match self.rows.entry(key.clone()) {
            Entry::Occupied(existing) => Ok(WriteResult::PreconditionFailed {
                current_version: Some(existing.get().version),
            }),
            Entry::Vacant(slot) => {
                let record = self.record(resource_type, document);
                let version = record.version;
                slot.insert(record);
                debug!("registry add {} v{}", key, version);
                Ok(WriteResult::Success { version })
            }
        }
    }

    async fn update_resource(
        &self,
        resource_type: &str,
        document: Document,
        precondition: WritePrecondition,
    ) -> Result<WriteResult> {
        let key = document.key(resource_type);
        match self.rows.entry(key.clone()) {
            Entry::Vacant(_) => Err(Error::not_found(resource_type, &key.id)),
            Entry::Occupied(mut existing) => {
                let current = existing.get().version;
                let allowed = match precondition {
                    WritePrecondition::None => true,
                    WritePrecondition::MatchesVersion(v) => v == current,
                    WritePrecondition::DoesNotExist => false,
                };
                if !allowed {
                    return Ok(WriteResult::PreconditionFailed {
                        current_version: Some(current),
                    });
                }
                let record = self.record(resource_type, document);
                let version = record.version;
                existing.insert(record);
                debug!("registry update {} v{} -> v{}", key, current, version);
                Ok(WriteResult::Success { version })
            }
        }
    }

    async fn delete_resource(&self, key: &RecordKey) -> Result<bool> {
        let removed = self.rows.remove(key).is_some();
        debug!("registry delete {} removed={}", key, removed);
        Ok(removed)
    }

    async fn change_resource_type(&self, key: &RecordKey, new_type: &str) -> Result<Record> {
        let new_key = key.with_type(new_type);
        // At most one shard guard is held at any point. The target is claimed
        // before the source is released, so the row is never absent.
        let old = self
            .rows
            .get(key)
            .map(|r| r.value().clone())
            .ok_or_else(|| Error::not_found(&key.resource_type, &key.id))?;

        let record = match self.rows.entry(new_key.clone()) {
            Entry::Occupied(_) => {
                return Err(Error::already_exists(new_type, &key.id, &key.catalogue_id));
            }
            Entry::Vacant(slot) => {
                let record = self.record(new_type, old.document.clone());
                slot.insert(record.clone());
                record
            }
        };

        let released = self
            .rows
            .remove_if(key, |_, current| current.version == old.version)
            .is_some();
        if !released {
            self.rows.remove(&new_key);
            return Err(Error::conflict(&key.resource_type, &key.id));
        }
        debug!("registry retype {} -> {}", key, new_key);
        Ok(record)
    }

    async fn search_exact(&self, key: &RecordKey) -> Result<Option<Record>> {
        Ok(self.rows.get(key).map(|r| r.value().clone()))
    }

    async fn search_query(&self, query: &RecordQuery) -> Result<Vec<Record>> {
        Ok(self.matching(query))
    }

    async fn get_all(&self, query: &RecordQuery, page: PageRequest) -> Result<Paging<Record>> {
        Ok(Paging::slice(self.matching(query), page, |r| r))
    }
}
