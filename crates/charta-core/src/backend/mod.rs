//! Persistence collaborator: the trait boundary between the engine and the
//! backend service, plus the transport error taxonomy.

pub mod trait_def;
pub mod types;

pub use trait_def::PersistenceBackend;
pub use types::{
    LoadedVisit, SaveDetailRequest, SavePlanRequest, TransportError, TransportKind,
};
