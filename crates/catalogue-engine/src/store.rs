//! Typed access to bundle rows.
//!
//! Bundles are serialized before any registry call so an encoding failure
//! aborts the operation with nothing written.

use crate::context::EngineContext;
use crate::descriptor::KindDescriptor;
use catalogue_core::{CatalogueResource, Error, ResourceBundle, Result};
use catalogue_registry::{Document, Record, RecordKey, WritePrecondition, WriteResult};
use std::marker::PhantomData;
use tracing::debug;

/// A decoded bundle together with the row version it was read at.
#[derive(Clone, Debug)]
pub struct Versioned<R> {
    pub bundle: ResourceBundle<R>,
    pub version: u64,
}

pub fn to_document<R: CatalogueResource>(bundle: &ResourceBundle<R>) -> Result<Document> {
    let id = bundle.payload.id().to_string();
    let original_id = if bundle.identifiers.original_id.is_empty() {
        id.clone()
    } else {
        bundle.identifiers.original_id.clone()
    };
    Ok(Document {
        catalogue_id: bundle.payload.catalogue_id().to_string(),
        published: bundle.metadata.published,
        status: bundle.status.clone(),
        active: bundle.active,
        payload: serde_json::to_value(bundle)?,
        original_id,
        id,
    })
}

pub fn from_record<R: CatalogueResource>(record: Record) -> Result<Versioned<R>> {
    Ok(Versioned {
        bundle: serde_json::from_value(record.document.payload)?,
        version: record.version,
    })
}

/// Map a write outcome to the engine's error taxonomy.
pub(crate) fn expect_written(result: WriteResult, on_conflict: impl FnOnce() -> Error) -> Result<u64> {
    match result {
        WriteResult::Success { version } => Ok(version),
        WriteResult::PreconditionFailed { .. } => Err(on_conflict()),
    }
}

/// Non-draft, non-public rows of one kind: the kind's standard path.
pub struct SourceStore<R> {
    ctx: EngineContext,
    descriptor: KindDescriptor,
    _marker: PhantomData<fn() -> R>,
}

impl<R: CatalogueResource> SourceStore<R> {
    pub fn new(ctx: EngineContext) -> Result<Self> {
        let descriptor = ctx.descriptor(R::KIND)?;
        Ok(Self { ctx, descriptor, _marker: PhantomData })
    }

    pub fn key(&self, id: &str) -> RecordKey {
        RecordKey::new(self.descriptor.standard_type(), self.ctx.local_catalogue(), id, false)
    }

    pub async fn find(&self, id: &str) -> Result<Option<Versioned<R>>> {
        let key = self.key(id);
        let record = self.ctx.call("source lookup", self.ctx.registry.search_exact(&key)).await?;
        record.map(from_record).transpose()
    }

    pub async fn get(&self, id: &str) -> Result<Versioned<R>> {
        self.find(id)
            .await?
            .ok_or_else(|| Error::not_found(self.descriptor.name(), id))
    }

    pub async fn add(&self, bundle: &ResourceBundle<R>) -> Result<u64> {
        let document = to_document(bundle)?;
        let id = document.id.clone();
        let result = self
            .ctx
            .call(
                "source add",
                self.ctx.registry.add_resource(&self.descriptor.standard_type(), document),
            )
            .await?;
        let version = expect_written(result, || {
            Error::already_exists(self.descriptor.name(), &id, self.ctx.local_catalogue())
        })?;
        debug!("{} {} stored v{}", self.descriptor.name(), id, version);
        Ok(version)
    }

    /// Replace the row, guarded by `expected` when given.
    pub async fn update(&self, bundle: &ResourceBundle<R>, expected: Option<u64>) -> Result<u64> {
        self.write(to_document(bundle)?, expected).await
    }

    /// Write an already encoded bundle.
    pub async fn write(&self, document: Document, expected: Option<u64>) -> Result<u64> {
        let id = document.id.clone();
        let precondition = expected.map_or(WritePrecondition::None, WritePrecondition::MatchesVersion);
        let result = self
            .ctx
            .call(
                "source update",
                self.ctx
                    .registry
                    .update_resource(&self.descriptor.standard_type(), document, precondition),
            )
            .await?;
        let version = expect_written(result, || Error::conflict(self.descriptor.name(), &id))?;
        debug!("{} {} updated v{}", self.descriptor.name(), id, version);
        Ok(version)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let removed = self
            .ctx
            .call("source delete", self.ctx.registry.delete_resource(&self.key(id)))
            .await?;
        if removed {
            Ok(())
        } else {
            Err(Error::not_found(self.descriptor.name(), id))
        }
    }
}
