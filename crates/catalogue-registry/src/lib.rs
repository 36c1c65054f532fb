//! Catalogue Registry - collaborator contracts and in-memory implementations
//!
//! The engines only talk to these traits. Each collaborator lives in its own
//! module next to an in-memory implementation used by tests and the CLI.

pub mod events;
pub mod identity;
pub mod memory;
pub mod pid;
pub mod registry;

pub use events::{BroadcastBus, EventBus, NullBus};
pub use identity::{AdminDirectory, IdentityService};
pub use memory::MemoryRegistry;
pub use pid::{PidIssuer, PidMetadata, RecordingPidIssuer};
pub use registry::{
    catalogue_document, facets, Document, Facet, FacetValue, PageRequest, Paging, Record, RecordKey,
    RecordQuery, Registry, WritePrecondition, WriteResult,
};
