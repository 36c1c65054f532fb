//! Draft lifecycle engine, generic over the resource kind.
//!
//! Drafts live under the kind's draft type in the local catalogue with
//! `draft=true, active=false`. Promotion validates, applies the kind's
//! approval rule, retypes the row to the standard type and hands the
//! bundle to the standard update path.

use crate::context::EngineContext;
use crate::descriptor::{ApprovalRule, KindDescriptor};
use crate::store::{expect_written, from_record, to_document, SourceStore, Versioned};
use crate::validate::{RuleValidator, Validator};
use catalogue_core::{
    status, CatalogueResource, Error, LoggingAction, LoggingType, Metadata, Principal,
    ResourceBundle, Result,
};
use catalogue_registry::{RecordKey, RecordQuery, WritePrecondition};
use std::sync::Arc;
use tracing::{info, warn};

pub struct DraftEngine<R> {
    ctx: EngineContext,
    descriptor: KindDescriptor,
    validator: Arc<dyn Validator<R>>,
    standard: SourceStore<R>,
}

impl<R: CatalogueResource> DraftEngine<R> {
    pub fn new(ctx: EngineContext) -> Result<Self> {
        let descriptor = ctx.descriptor(R::KIND)?;
        if !descriptor.supports_drafts {
            return Err(Error::InvalidInput(format!("{} has no draft workflow", R::KIND)));
        }
        Ok(Self {
            standard: SourceStore::new(ctx.clone())?,
            validator: Arc::new(RuleValidator),
            descriptor,
            ctx,
        })
    }

    /// Replace the default rule validator.
    pub fn with_validator(mut self, validator: Arc<dyn Validator<R>>) -> Self {
        self.validator = validator;
        self
    }

    fn draft_key(&self, id: &str) -> RecordKey {
        RecordKey::new(self.descriptor.draft_type(), self.ctx.local_catalogue(), id, false)
    }

    fn generate_id(&self) -> String {
        format!("{}-{}", self.descriptor.id_prefix, uuid::Uuid::new_v4().simple())
    }

    async fn load(&self, id: &str) -> Result<Versioned<R>> {
        let key = self.draft_key(id);
        let record = self
            .ctx
            .call("draft lookup", self.ctx.registry.search_exact(&key))
            .await?
            .ok_or_else(|| Error::not_found(self.descriptor.draft_type(), id))?;
        from_record(record)
    }

    /// Store a new draft. No validation happens here.
    pub async fn add(&self, mut payload: R, actor: &Principal) -> Result<ResourceBundle<R>> {
        let id = self.generate_id();
        payload.set_id(id.clone());
        payload.set_catalogue_id(self.ctx.local_catalogue().to_string());

        let mut bundle = ResourceBundle::new(payload);
        bundle.identifiers.original_id = id.clone();
        bundle.metadata = Metadata::created_by(actor);
        bundle.log(actor, LoggingType::Draft, LoggingAction::Created);
        bundle.draft = true;
        bundle.active = false;

        let document = to_document(&bundle)?;
        let result = self
            .ctx
            .call(
                "draft add",
                self.ctx.registry.add_resource(&self.descriptor.draft_type(), document),
            )
            .await?;
        expect_written(result, || {
            Error::already_exists(self.descriptor.draft_type(), &id, self.ctx.local_catalogue())
        })?;

        info!("{} draft {} created by {}", self.descriptor.name(), id, actor.email);
        Ok(bundle)
    }

    pub async fn get(&self, id: &str) -> Result<ResourceBundle<R>> {
        Ok(self.load(id).await?.bundle)
    }

    /// Replace the payload of an existing draft.
    pub async fn update(&self, bundle: ResourceBundle<R>, actor: &Principal) -> Result<ResourceBundle<R>> {
        let id = bundle.payload.id().to_string();
        let Versioned { bundle: mut stored, version } = self.load(&id).await?;

        stored.payload = bundle.payload;
        stored.payload.set_id(id.clone());
        // A draft never moves catalogue, whatever the payload says.
        stored.payload.set_catalogue_id(self.ctx.local_catalogue().to_string());
        stored.metadata.touch(actor);
        stored.draft = true;
        stored.active = false;

        let document = to_document(&stored)?;
        let result = self
            .ctx
            .call(
                "draft update",
                self.ctx.registry.update_resource(
                    &self.descriptor.draft_type(),
                    document,
                    WritePrecondition::MatchesVersion(version),
                ),
            )
            .await?;
        expect_written(result, || Error::conflict(self.descriptor.draft_type(), &id))?;

        info!("{} draft {} updated by {}", self.descriptor.name(), id, actor.email);
        Ok(stored)
    }

    pub async fn delete(&self, bundle: &ResourceBundle<R>) -> Result<()> {
        let id = bundle.payload.id();
        let removed = self
            .ctx
            .call("draft delete", self.ctx.registry.delete_resource(&self.draft_key(id)))
            .await?;
        if !removed {
            return Err(Error::not_found(self.descriptor.draft_type(), id));
        }
        info!("{} draft {} deleted", self.descriptor.name(), id);
        Ok(())
    }

    /// Promote a draft to the kind's standard type.
    pub async fn transform_to_non_draft(
        &self,
        bundle: ResourceBundle<R>,
        actor: &Principal,
    ) -> Result<ResourceBundle<R>> {
        let id = bundle.payload.id().to_string();
        let draft_key = self.draft_key(&id);
        let stored = self.load(&id).await?.bundle;

        let mut bundle = bundle;
        bundle.payload.set_catalogue_id(self.ctx.local_catalogue().to_string());
        bundle.identifiers = stored.identifiers;
        bundle.metadata = stored.metadata;
        bundle.logging_info = stored.logging_info;

        // Nothing has been written yet, so a rejection leaves the draft as it was.
        self.validator.validate(&bundle)?;

        bundle.log(actor, LoggingType::Onboard, LoggingAction::Registered);
        self.apply_approval_rule(&mut bundle, actor).await?;
        bundle.draft = false;
        bundle.metadata.touch(actor);
        let document = to_document(&bundle)?;

        let moved = self
            .ctx
            .call(
                "draft retype",
                self.ctx
                    .registry
                    .change_resource_type(&draft_key, &self.descriptor.standard_type()),
            )
            .await?;

        if let Err(e) = self.standard.write(document, Some(moved.version)).await {
            warn!("{} {} promotion failed after retype: {} - restoring draft", self.descriptor.name(), id, e);
            let standard_key = draft_key.with_type(self.descriptor.standard_type());
            if let Err(restore) = self
                .ctx
                .call(
                    "draft restore",
                    self.ctx
                        .registry
                        .change_resource_type(&standard_key, &self.descriptor.draft_type()),
                )
                .await
            {
                warn!("{} {} could not be restored to draft: {}", self.descriptor.name(), id, restore);
            }
            return Err(e);
        }

        info!(
            "{} {} promoted by {}: status={} active={}",
            self.descriptor.name(),
            id,
            actor.email,
            bundle.status,
            bundle.active
        );
        Ok(bundle)
    }

    async fn apply_approval_rule(&self, bundle: &mut ResourceBundle<R>, actor: &Principal) -> Result<()> {
        match self.descriptor.approval {
            ApprovalRule::ProviderOnboarding => {
                bundle.status = status::PENDING_PROVIDER.into();
                bundle.active = false;
                bundle.template_status = Some(status::NO_TEMPLATE_STATUS.into());
            }
            ApprovalRule::ProviderTemplate => {
                let template = match bundle.payload.owning_provider() {
                    Some(provider) => {
                        self.ctx
                            .call(
                                "provider template lookup",
                                self.ctx.providers.template_status(provider, self.ctx.local_catalogue()),
                            )
                            .await?
                    }
                    None => None,
                };
                if template.as_deref() == Some(status::APPROVED_TEMPLATE) {
                    bundle.status = status::APPROVED_RESOURCE.into();
                    bundle.active = true;
                    bundle.log(actor, LoggingType::Onboard, LoggingAction::Approved);
                } else {
                    bundle.status = status::PENDING_RESOURCE.into();
                    bundle.active = false;
                }
            }
        }
        Ok(())
    }

    /// Drafts in the local catalogue the actor administers.
    pub async fn get_my(&self, actor: Option<&Principal>) -> Result<Vec<ResourceBundle<R>>> {
        let actor = actor.ok_or_else(|| {
            Error::Unauthenticated(format!("listing own {} drafts requires a principal", R::KIND))
        })?;
        let query = RecordQuery::of_type(self.descriptor.draft_type())
            .catalogue(self.ctx.local_catalogue())
            .published(false);
        let records = self.ctx.call("draft listing", self.ctx.registry.search_query(&query)).await?;

        let checks = records.into_iter().map(|record| async move {
            let id = record.document.id.clone();
            let admin = self
                .ctx
                .call(
                    "admin check",
                    self.ctx.identity.is_resource_admin(actor, &id, self.ctx.local_catalogue()),
                )
                .await?;
            Ok::<_, Error>(if admin { Some(from_record::<R>(record)?.bundle) } else { None })
        });
        let owned = futures::future::try_join_all(checks).await?;
        Ok(owned.into_iter().flatten().collect())
    }
}
