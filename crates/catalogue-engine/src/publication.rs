//! Publication engine, generic over the resource kind.
//!
//! Maintains the public mirror of a source bundle: resolves the public id
//! with the kind's strategy, rewrites cross-references against the current
//! approved-catalogue snapshot, writes with a precondition and emits
//! `<kind>.create|update|delete`.
//!
//! PIDs are minted deterministically from `(catalogue, kind, source id)`,
//! so two racing first publications compute the same key and the
//! conditional insert lets exactly one through.

use crate::context::EngineContext;
use crate::descriptor::KindDescriptor;
use crate::merge::merge_public;
use crate::store::{expect_written, from_record, to_document, Versioned};
use catalogue_core::{
    AlternativeIdentifier, CatalogueResource, ChangeAction, ChangeEvent, Error, IdStrategy,
    Principal, Qualifier, ResourceBundle, Result,
};
use catalogue_registry::{
    PageRequest, Paging, PidMetadata, Record, RecordKey, RecordQuery, WritePrecondition,
};
use std::marker::PhantomData;
use tracing::{debug, info, warn};

/// Alternative-identifier type recorded on PID-addressed mirrors.
pub const PID_IDENTIFIER_TYPE: &str = "PID";

/// Filter for public listings. Only published rows are ever returned.
#[derive(Clone, Debug, Default)]
pub struct PublicFilter {
    pub catalogue_id: Option<String>,
    pub status: Option<String>,
    pub active: Option<bool>,
    /// Only mirrors whose source this principal administers.
    pub owned_by: Option<Principal>,
}

pub struct PublicationEngine<R> {
    ctx: EngineContext,
    descriptor: KindDescriptor,
    _marker: PhantomData<fn() -> R>,
}

impl<R: CatalogueResource> PublicationEngine<R> {
    pub fn new(ctx: EngineContext) -> Result<Self> {
        let descriptor = ctx.descriptor(R::KIND)?;
        Ok(Self { ctx, descriptor, _marker: PhantomData })
    }

    pub fn descriptor(&self) -> &KindDescriptor {
        &self.descriptor
    }

    fn public_key(&self, public_id: &str, catalogue_id: &str) -> RecordKey {
        RecordKey::new(self.descriptor.public_type(), catalogue_id, public_id, true)
    }

    fn catalogue_of(&self, source: &ResourceBundle<R>) -> String {
        match source.payload.catalogue_id() {
            "" => self.ctx.local_catalogue().to_string(),
            c => c.to_string(),
        }
    }

    async fn qualifier(&self, catalogue_id: &str) -> Result<Qualifier> {
        let approved = self.ctx.catalogues.approved().await?;
        Ok(Qualifier::new(catalogue_id, approved))
    }

    fn mint_pid(&self, catalogue_id: &str, source_id: &str) -> String {
        let name = format!("{}/{}/{}", catalogue_id, self.descriptor.name(), source_id);
        let suffix = uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_URL, name.as_bytes()).simple();
        format!("{}/{}.{}", self.ctx.config.pid.prefix, self.descriptor.id_prefix, suffix)
    }

    /// Public id of `source` under the kind's strategy.
    pub async fn resolve_public_id(&self, source: &ResourceBundle<R>, q: &Qualifier) -> Result<String> {
        let source_id = source.payload.id();
        if source_id.trim().is_empty() {
            return Err(Error::InvalidInput(format!("{} source has no id", R::KIND)));
        }
        match self.descriptor.strategy {
            IdStrategy::Prefix => Ok(q.one(source_id)),
            IdStrategy::Pid => {
                if let Some(pid) = source.identifiers.pid.as_deref().filter(|p| !p.is_empty()) {
                    return Ok(pid.to_string());
                }
                let query = RecordQuery::of_type(self.descriptor.public_type())
                    .catalogue(q.catalogue_id())
                    .published(true)
                    .original_id(source_id);
                let existing = self.ctx.call("public lookup", self.ctx.registry.search_query(&query)).await?;
                Ok(match existing.into_iter().next() {
                    Some(record) => record.document.id,
                    None => self.mint_pid(q.catalogue_id(), source_id),
                })
            }
        }
    }

    fn build_public(&self, source: &ResourceBundle<R>, public_id: &str, q: &Qualifier) -> ResourceBundle<R> {
        let mut public = source.clone();
        public.payload.set_id(public_id.to_string());
        public.payload.rewrite_references(q);
        public.identifiers.original_id = source.payload.id().to_string();
        if self.descriptor.strategy == IdStrategy::Pid {
            public.identifiers.pid = Some(public_id.to_string());
            let mut alternative = public.payload.alternative_identifiers().to_vec();
            if !alternative.iter().any(|a| a.id_type == PID_IDENTIFIER_TYPE) {
                alternative.push(AlternativeIdentifier::new(PID_IDENTIFIER_TYPE, public_id));
                public.payload.set_alternative_identifiers(alternative);
            }
        }
        public.metadata.published = true;
        public.draft = false;
        public
    }

    fn check_source(&self, source: &ResourceBundle<R>) -> Result<()> {
        if source.draft {
            return Err(Error::InvalidInput(format!(
                "{} {} is a draft and cannot be published",
                R::KIND,
                source.payload.id()
            )));
        }
        if source.metadata.published {
            return Err(Error::InvalidInput(format!(
                "{} {} is already a public bundle",
                R::KIND,
                source.payload.id()
            )));
        }
        Ok(())
    }

    async fn register_pid(&self, public: &ResourceBundle<R>) {
        let Some(pid) = public.identifiers.pid.as_deref() else { return };
        let metadata = PidMetadata {
            kind: self.descriptor.name().to_string(),
            catalogue_id: public.payload.catalogue_id().to_string(),
            original_id: public.identifiers.original_id.clone(),
            public_id: public.payload.id().to_string(),
        };
        match self.ctx.call("pid registration", self.ctx.pids.register(pid, &metadata)).await {
            Ok(()) => debug!("registered pid {}", pid),
            Err(e) => warn!("pid registration for {} failed: {}", pid, e),
        }
    }

    /// Create the public mirror. A second publish of the same source fails
    /// with `AlreadyExists`; use `republish` to refresh a mirror.
    pub async fn publish(&self, source: &ResourceBundle<R>) -> Result<ResourceBundle<R>> {
        self.check_source(source)?;
        let catalogue_id = self.catalogue_of(source);
        let q = self.qualifier(&catalogue_id).await?;
        let public_id = self.resolve_public_id(source, &q).await?;

        let public = self.build_public(source, &public_id, &q);
        let document = to_document(&public)?;
        let payload = document.payload.clone();

        let result = self
            .ctx
            .call(
                "public add",
                self.ctx.registry.add_resource(&self.descriptor.public_type(), document),
            )
            .await?;
        expect_written(result, || {
            Error::already_exists(self.descriptor.name(), &public_id, &catalogue_id)
        })?;

        if self.descriptor.pid_registration {
            self.register_pid(&public).await;
        }
        info!("{} {} published as {}", self.descriptor.name(), source.payload.id(), public_id);
        self.ctx
            .emit(ChangeEvent::new(R::KIND, ChangeAction::Create, payload))
            .await;
        Ok(public)
    }

    /// Refresh an existing mirror from its source.
    pub async fn republish(&self, source: &ResourceBundle<R>) -> Result<ResourceBundle<R>> {
        self.check_source(source)?;
        let catalogue_id = self.catalogue_of(source);
        let q = self.qualifier(&catalogue_id).await?;
        let public_id = self.resolve_public_id(source, &q).await?;
        let key = self.public_key(&public_id, &catalogue_id);

        let record = self
            .ctx
            .call("public lookup", self.ctx.registry.search_exact(&key))
            .await?
            .ok_or_else(|| Error::not_found(self.descriptor.name(), &public_id))?;
        let Versioned { bundle: existing, version } = from_record::<R>(record)?;

        let incoming = self.build_public(source, &public_id, &q);
        let mut merged = merge_public(&existing, incoming);
        merged.payload.rewrite_references(&q);

        let document = to_document(&merged)?;
        let payload = document.payload.clone();
        let result = self
            .ctx
            .call(
                "public update",
                self.ctx.registry.update_resource(
                    &self.descriptor.public_type(),
                    document,
                    WritePrecondition::MatchesVersion(version),
                ),
            )
            .await?;
        expect_written(result, || Error::conflict(self.descriptor.name(), &public_id))?;

        info!("{} {} republished", self.descriptor.name(), public_id);
        self.ctx
            .emit(ChangeEvent::new(R::KIND, ChangeAction::Update, payload))
            .await;
        Ok(merged)
    }

    /// Remove the mirror of `source`. An absent mirror is not an error.
    pub async fn retract(&self, source: &ResourceBundle<R>) -> Result<()> {
        let catalogue_id = self.catalogue_of(source);
        let q = self.qualifier(&catalogue_id).await?;
        let public_id = self.resolve_public_id(source, &q).await?;
        let key = self.public_key(&public_id, &catalogue_id);

        let Some(record) = self
            .ctx
            .call("public lookup", self.ctx.registry.search_exact(&key))
            .await?
        else {
            debug!("{} {} has no mirror to retract", self.descriptor.name(), public_id);
            return Ok(());
        };

        let removed = self
            .ctx
            .call("public delete", self.ctx.registry.delete_resource(&key))
            .await?;
        if removed {
            info!("{} {} retracted", self.descriptor.name(), public_id);
            self.ctx
                .emit(ChangeEvent::new(R::KIND, ChangeAction::Delete, record.document.payload))
                .await;
        }
        Ok(())
    }

    pub async fn get(&self, public_id: &str, catalogue_id: &str) -> Result<ResourceBundle<R>> {
        let key = self.public_key(public_id, catalogue_id);
        let record = self
            .ctx
            .call("public lookup", self.ctx.registry.search_exact(&key))
            .await?
            .ok_or_else(|| Error::not_found(self.descriptor.name(), public_id))?;
        Ok(from_record::<R>(record)?.bundle)
    }

    /// Keep the records whose source the actor administers. Both the row
    /// and the decoded bundle must be published.
    async fn owned_by(&self, actor: &Principal, records: Vec<Record>) -> Result<Vec<Record>> {
        let checks = records.into_iter().map(|record| async move {
            if !record.document.published {
                return Ok::<_, Error>(None);
            }
            let admin = self
                .ctx
                .call(
                    "admin check",
                    self.ctx.identity.is_resource_admin(
                        actor,
                        &record.document.original_id,
                        &record.document.catalogue_id,
                    ),
                )
                .await?;
            Ok(admin.then_some(record))
        });
        let owned = futures::future::try_join_all(checks).await?;
        Ok(owned.into_iter().flatten().collect())
    }

    /// Published mirrors, paged, with facets.
    pub async fn get_all(&self, filter: &PublicFilter, page: PageRequest) -> Result<Paging<ResourceBundle<R>>> {
        let mut query = RecordQuery::of_type(self.descriptor.public_type()).published(true);
        query.catalogue_id = filter.catalogue_id.clone();
        query.status = filter.status.clone();
        query.active = filter.active;

        let paging = match &filter.owned_by {
            None => self.ctx.call("public listing", self.ctx.registry.get_all(&query, page)).await?,
            Some(actor) => {
                let records = self.ctx.call("public listing", self.ctx.registry.search_query(&query)).await?;
                Paging::slice(self.owned_by(actor, records).await?, page, |r| r)
            }
        };

        let Paging { total, from, to, results, facets } = paging;
        let results = results
            .into_iter()
            .map(|r| from_record::<R>(r).map(|v| v.bundle))
            .collect::<Result<Vec<_>>>()?;
        Ok(Paging { total, from, to, results, facets })
    }

    /// Published mirrors whose source the actor administers.
    pub async fn get_my(&self, actor: Option<&Principal>) -> Result<Vec<ResourceBundle<R>>> {
        let actor = actor.ok_or_else(|| {
            Error::Unauthenticated(format!("listing own public {} requires a principal", R::KIND))
        })?;
        let query = RecordQuery::of_type(self.descriptor.public_type()).published(true);
        let records = self.ctx.call("public listing", self.ctx.registry.search_query(&query)).await?;
        self.owned_by(actor, records)
            .await?
            .into_iter()
            .map(|r| from_record::<R>(r).map(|v| v.bundle))
            .filter(|b| b.as_ref().map(|b| b.metadata.published).unwrap_or(true))
            .collect()
    }
}
