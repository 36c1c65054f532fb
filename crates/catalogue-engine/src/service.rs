//! Per-kind facade tying drafts, the standard source path and the public
//! mirror together.

use crate::context::EngineContext;
use crate::descriptor::KindDescriptor;
use crate::draft::DraftEngine;
use crate::publication::PublicationEngine;
use crate::store::{SourceStore, Versioned};
use crate::validate::{RuleValidator, Validator};
use catalogue_core::{
    status, CatalogueResource, Error, LoggingAction, LoggingType, Metadata, Principal,
    ResourceBundle, Result,
};
use std::sync::Arc;
use tracing::{debug, info};

/// A source bundle and, when one exists, its public mirror.
#[derive(Clone, Debug)]
pub struct Outcome<R> {
    pub source: ResourceBundle<R>,
    pub mirror: Option<ResourceBundle<R>>,
}

pub struct ResourceService<R> {
    ctx: EngineContext,
    descriptor: KindDescriptor,
    drafts: Option<DraftEngine<R>>,
    publication: PublicationEngine<R>,
    sources: SourceStore<R>,
    validator: Arc<dyn Validator<R>>,
}

impl<R: CatalogueResource> ResourceService<R> {
    pub fn new(ctx: EngineContext) -> Result<Self> {
        let descriptor = ctx.descriptor(R::KIND)?;
        let drafts = if descriptor.supports_drafts {
            Some(DraftEngine::new(ctx.clone())?)
        } else {
            None
        };
        Ok(Self {
            publication: PublicationEngine::new(ctx.clone())?,
            sources: SourceStore::new(ctx.clone())?,
            validator: Arc::new(RuleValidator),
            drafts,
            descriptor,
            ctx,
        })
    }

    pub fn with_validator(mut self, validator: Arc<dyn Validator<R>>) -> Self {
        self.drafts = self.drafts.map(|d| d.with_validator(validator.clone()));
        self.validator = validator;
        self
    }

    pub fn descriptor(&self) -> &KindDescriptor {
        &self.descriptor
    }

    pub fn drafts(&self) -> Result<&DraftEngine<R>> {
        self.drafts
            .as_ref()
            .ok_or_else(|| Error::InvalidInput(format!("{} has no draft workflow", R::KIND)))
    }

    pub fn publication(&self) -> &PublicationEngine<R> {
        &self.publication
    }

    pub fn sources(&self) -> &SourceStore<R> {
        &self.sources
    }

    async fn mirror_if_active(&self, source: &ResourceBundle<R>) -> Result<Option<ResourceBundle<R>>> {
        if source.active {
            Ok(Some(self.publication.publish(source).await?))
        } else {
            debug!("{} {} is inactive, not published", self.descriptor.name(), source.payload.id());
            Ok(None)
        }
    }

    /// Register a source directly, without a draft. Approved and active on
    /// arrival, then published.
    pub async fn add(&self, mut payload: R, actor: &Principal) -> Result<Outcome<R>> {
        if payload.id().trim().is_empty() {
            payload.set_id(format!("{}-{}", self.descriptor.id_prefix, uuid::Uuid::new_v4().simple()));
        }
        payload.set_catalogue_id(self.ctx.local_catalogue().to_string());

        let mut source = ResourceBundle::new(payload);
        source.identifiers.original_id = source.payload.id().to_string();
        source.metadata = Metadata::created_by(actor);
        source.log(actor, LoggingType::Onboard, LoggingAction::Registered);
        source.status = status::APPROVED_RESOURCE.into();
        source.active = true;
        source.draft = false;

        self.validator.validate(&source)?;
        self.sources.add(&source).await?;
        info!("{} {} registered by {}", self.descriptor.name(), source.payload.id(), actor.email);

        let mirror = self.mirror_if_active(&source).await?;
        Ok(Outcome { source, mirror })
    }

    /// Promote a draft, publishing it when the approval rule left it active.
    pub async fn promote(&self, draft: ResourceBundle<R>, actor: &Principal) -> Result<Outcome<R>> {
        let source = self.drafts()?.transform_to_non_draft(draft, actor).await?;
        let mirror = self.mirror_if_active(&source).await?;
        Ok(Outcome { source, mirror })
    }

    /// Persist a new revision of a source and refresh its mirror. A source
    /// with no mirror yet is published if it is active.
    pub async fn update(&self, bundle: ResourceBundle<R>, actor: &Principal) -> Result<Outcome<R>> {
        let id = bundle.payload.id().to_string();
        let Versioned { bundle: stored, version } = self.sources.get(&id).await?;

        let mut source = bundle;
        source.payload.set_id(id.clone());
        source.payload.set_catalogue_id(self.ctx.local_catalogue().to_string());
        source.identifiers = stored.identifiers;
        source.metadata = stored.metadata;
        source.logging_info = stored.logging_info;
        // Approval state only moves through promotion, never through an update.
        source.status = stored.status;
        source.active = stored.active;
        source.template_status = stored.template_status;
        source.draft = false;
        source.metadata.published = false;
        source.metadata.touch(actor);
        source.log(actor, LoggingType::Update, LoggingAction::Updated);

        self.validator.validate(&source)?;
        self.sources.update(&source, Some(version)).await?;
        info!("{} {} updated by {}", self.descriptor.name(), id, actor.email);

        let mirror = match self.publication.republish(&source).await {
            Ok(mirror) => Some(mirror),
            Err(e) if e.is_not_found() => self.mirror_if_active(&source).await?,
            Err(e) => return Err(e),
        };
        Ok(Outcome { source, mirror })
    }

    /// Delete a source row and retract its mirror.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let stored = self.sources.get(id).await?.bundle;
        self.sources.delete(id).await?;
        self.publication.retract(&stored).await?;
        info!("{} {} deleted", self.descriptor.name(), id);
        Ok(())
    }
}
