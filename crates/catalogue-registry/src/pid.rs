//! PID issuer contract. Registration is idempotent and never fatal to callers.

use async_trait::async_trait;
use catalogue_core::Result;
use dashmap::DashMap;
use serde::Serialize;

/// What the issuer records against a PID.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PidMetadata {
    pub kind: String,
    pub catalogue_id: String,
    pub original_id: String,
    pub public_id: String,
}

#[async_trait]
pub trait PidIssuer: Send + Sync {
    async fn register(&self, pid: &str, metadata: &PidMetadata) -> Result<()>;
}

/// Keeps registrations in memory; re-registering a PID overwrites it.
#[derive(Default)]
pub struct RecordingPidIssuer {
    registered: DashMap<String, PidMetadata>,
}

impl RecordingPidIssuer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, pid: &str) -> Option<PidMetadata> {
        self.registered.get(pid).map(|m| m.clone())
    }

    pub fn len(&self) -> usize {
        self.registered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }
}

#[async_trait]
impl PidIssuer for RecordingPidIssuer {
    async fn register(&self, pid: &str, metadata: &PidMetadata) -> Result<()> {
        self.registered.insert(pid.to_string(), metadata.clone());
        Ok(())
    }
}
