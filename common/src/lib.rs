// common/src/lib.rs
// Shared domain model, URL canonicalisation and error taxonomy for the link
// tracker. Used by both the tracker and chat services.

pub mod error;
pub mod model;
pub mod url;

pub use error::DomainError;
pub use model::{
    Chat, CachedLinkList, Link, LinkUpdate, ProviderItem, ProviderSnapshot, TrackStep,
    UserSession,
};
pub use url::{canonicalize, ResourceKind};
