//! Catalogue Core - bundle types, resource payloads, identifier resolution, errors

pub mod error;
pub mod identifier;
pub mod protocol;
pub mod resources;
pub mod types;

pub use error::{Error, Result};
pub use identifier::{resolve_public_id, resolve_public_id_set, ApprovedCatalogues, IdStrategy, Qualifier};
pub use protocol::*;
pub use resources::*;
pub use types::*;
