//! catalogue: inspect resource kinds, resolve public ids and dry-run the
//! draft → publication flow against in-memory collaborators.
//!
//! Usage:
//!   catalogue kinds
//!   catalogue resolve-id svc-42 --catalogue eosc --approved eosc,other
//!   catalogue default-config > catalogue.toml
//!   catalogue simulate --kind service --payload service.json

use catalogue_core::{
    resolve_public_id, resolve_public_id_set, ApprovedCatalogues,
    Catalogue, CatalogueResource, ConfigurationTemplateInstance, Datasource, Helpdesk,
    InteroperabilityRecord, Monitoring, Principal, Provider, ResourceBundle, ResourceInteroperabilityRecord,
    ResourceKind, Service, TrainingResource, CATALOGUE_TYPE,
};
use catalogue_engine::{EngineConfig, EngineContext, ResourceService, SourceStore};
use catalogue_registry::{catalogue_document, BroadcastBus, MemoryRegistry, RecordingPidIssuer, Registry};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "catalogue",
    about = "Federated catalogue draft and publication engine",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file (TOML). Default: ~/.catalogue/catalogue.toml
    #[arg(long, global = true)]
    config: Option<String>,

    /// Write logs to a file (in addition to stderr)
    #[arg(long, global = true)]
    log_file: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List resource kinds with their id strategy and draft support
    Kinds,
    /// Resolve local ids to public ids
    ResolveId {
        /// Local ids; more than one resolves as a set
        #[arg(required = true)]
        ids: Vec<String>,
        /// Owning catalogue (default: the configured local catalogue)
        #[arg(long)]
        catalogue: Option<String>,
        /// Approved catalogue ids, comma separated
        #[arg(long, value_delimiter = ',')]
        approved: Vec<String>,
    },
    /// Dump default config as TOML
    DefaultConfig,
    /// Run add → promote → publish for one payload and print the results
    Simulate {
        #[arg(long)]
        kind: ResourceKind,
        /// JSON file holding the resource payload
        #[arg(long)]
        payload: PathBuf,
        /// Acting user's email
        #[arg(long, default_value = "operator@example.org")]
        actor: String,
        /// Seed a provider with an approved template so promotion activates
        #[arg(long)]
        approved_provider: Option<String>,
        /// Extra approved catalogues to seed besides the local one
        #[arg(long, value_delimiter = ',')]
        catalogues: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(cli.json_logs, cli.log_file.as_deref());

    let config_path = cli
        .config
        .as_deref()
        .map(expand_tilde)
        .unwrap_or_else(default_config_path);

    match cli.command {
        Commands::DefaultConfig => {
            println!("{}", EngineConfig::default().to_toml());
        }
        Commands::Kinds => {
            let config = EngineConfig::load(&config_path);
            let table = catalogue_engine::DescriptorTable::from_config(&config)?;
            println!("{:<36} {:<8} {:<6} {:<7} {}", "KIND", "STRATEGY", "PID", "DRAFTS", "ID PREFIX");
            for d in table.iter() {
                println!(
                    "{:<36} {:<8} {:<6} {:<7} {}",
                    d.name(),
                    d.strategy.to_string(),
                    d.pid_registration,
                    d.supports_drafts,
                    d.id_prefix
                );
            }
        }
        Commands::ResolveId { ids, catalogue, approved } => {
            let config = EngineConfig::load(&config_path);
            let catalogue = catalogue.unwrap_or_else(|| config.local_catalogue().to_string());
            let approved = ApprovedCatalogues::new(approved);
            if let [id] = ids.as_slice() {
                println!("{}", resolve_public_id(id, &catalogue, &approved));
            } else {
                for id in resolve_public_id_set(&ids, &catalogue, &approved) {
                    println!("{}", id);
                }
            }
        }
        Commands::Simulate {
            kind,
            payload,
            actor,
            approved_provider,
            catalogues,
        } => {
            let config = EngineConfig::load(&config_path);
            let raw = std::fs::read_to_string(&payload)
                .map_err(|e| anyhow::anyhow!("cannot read {}: {}", payload.display(), e))?;
            let actor = Principal::new(actor, "catalogue operator");
            let run = Simulation::start(config, &catalogues).await?;
            if let Some(provider) = approved_provider {
                run.seed_approved_provider(&provider, &actor).await?;
            }

            let result = match kind {
                ResourceKind::Provider => run.execute::<Provider>(&raw, &actor).await,
                ResourceKind::Service => run.execute::<Service>(&raw, &actor).await,
                ResourceKind::Datasource => run.execute::<Datasource>(&raw, &actor).await,
                ResourceKind::TrainingResource => run.execute::<TrainingResource>(&raw, &actor).await,
                ResourceKind::InteroperabilityRecord => {
                    run.execute::<InteroperabilityRecord>(&raw, &actor).await
                }
                ResourceKind::ResourceInteroperabilityRecord => {
                    run.execute::<ResourceInteroperabilityRecord>(&raw, &actor).await
                }
                ResourceKind::Monitoring => run.execute::<Monitoring>(&raw, &actor).await,
                ResourceKind::Helpdesk => run.execute::<Helpdesk>(&raw, &actor).await,
                ResourceKind::ConfigurationTemplateInstance => {
                    run.execute::<ConfigurationTemplateInstance>(&raw, &actor).await
                }
            };
            run.finish().await;
            result?;
        }
    }

    Ok(())
}

/// In-memory wiring for one `simulate` run.
struct Simulation {
    ctx: EngineContext,
    events: tokio::sync::broadcast::Receiver<catalogue_core::ChangeEvent>,
    cancel: CancellationToken,
    listener: tokio::task::JoinHandle<()>,
}

impl Simulation {
    async fn start(config: EngineConfig, extra_catalogues: &[String]) -> anyhow::Result<Self> {
        let registry: Arc<dyn Registry> = Arc::new(MemoryRegistry::new());
        let local = config.local_catalogue().to_string();
        for id in std::iter::once(&local).chain(extra_catalogues) {
            registry
                .add_resource(CATALOGUE_TYPE, catalogue_document(&Catalogue::approved(id.clone()))?)
                .await?;
        }

        let bus = Arc::new(BroadcastBus::default());
        let events = bus.subscribe();
        let ctx = EngineContext::builder(config, registry)
            .events(bus.clone())
            .pids(Arc::new(RecordingPidIssuer::new()))
            .build()?;

        let cancel = CancellationToken::new();
        let listener = ctx
            .catalogues
            .clone()
            .spawn_invalidation_listener(bus.subscribe(), cancel.clone());
        Ok(Self { ctx, events, cancel, listener })
    }

    async fn seed_approved_provider(&self, provider_id: &str, actor: &Principal) -> anyhow::Result<()> {
        let mut bundle = ResourceBundle::new(Provider {
            id: provider_id.to_string(),
            name: provider_id.to_string(),
            catalogue_id: self.ctx.local_catalogue().to_string(),
            ..Default::default()
        });
        bundle.identifiers.original_id = provider_id.to_string();
        bundle.metadata = catalogue_core::Metadata::created_by(actor);
        bundle.status = catalogue_core::status::APPROVED_RESOURCE.into();
        bundle.active = true;
        bundle.template_status = Some(catalogue_core::status::APPROVED_TEMPLATE.into());
        SourceStore::<Provider>::new(self.ctx.clone())?.add(&bundle).await?;
        tracing::info!("seeded provider {} with an approved template", provider_id);
        Ok(())
    }

    async fn execute<R: CatalogueResource>(&self, raw: &str, actor: &Principal) -> anyhow::Result<()> {
        let payload: R = serde_json::from_str(raw)?;
        let service = ResourceService::<R>::new(self.ctx.clone())?;
        let outcome = match service.drafts() {
            Ok(drafts) => {
                let draft = drafts.add(payload, actor).await?;
                println!("draft:\n{}", serde_json::to_string_pretty(&draft)?);
                service.promote(draft, actor).await?
            }
            Err(_) => service.add(payload, actor).await?,
        };

        println!("source:\n{}", serde_json::to_string_pretty(&outcome.source)?);
        match &outcome.mirror {
            Some(mirror) => println!("mirror:\n{}", serde_json::to_string_pretty(mirror)?),
            None => println!("mirror: none (source is {})", outcome.source.status),
        }
        Ok(())
    }

    async fn finish(mut self) {
        while let Ok(event) = self.events.try_recv() {
            println!("event {} at {}", event.topic, event.occurred_at.to_rfc3339());
        }
        self.cancel.cancel();
        if let Err(e) = self.listener.await {
            tracing::warn!("catalogue cache listener ended abnormally: {}", e);
        }
    }
}

fn init_logging(json: bool, log_file: Option<&str>) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "catalogue=info".into());

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let path = expand_tilde(path);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            let name = path
                .file_name()
                .map(|n| n.to_os_string())
                .unwrap_or_else(|| "catalogue.log".into());
            let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);
    if json {
        registry.with(fmt::layer().json().with_writer(std::io::stderr)).init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
    guard
}

fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".catalogue/catalogue.toml"))
        .unwrap_or_else(|| PathBuf::from("catalogue.toml"))
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
