//! Client identity and registration for Rendezvous.
//!
//! 1. **Identity**: issuing a server-assigned id per connection
//!    ([`IdentityIssuer`], [`UuidIssuer`])
//! 2. **Registry**: the shared map from id to [`ClientRecord`]
//!    ([`Registry`] trait, [`ClientRegistry`])
//!
//! ```text
//! Matching (above)   ← scans the registry for same-mode partners
//!     ↕
//! Registry (this crate)
//!     ↕
//! Protocol (below)   ← provides ClientId, GameMode
//! ```

mod error;
mod identity;
mod record;
mod registry;

pub use error::RegistryError;
pub use identity::{IdentityIssuer, UuidIssuer};
pub use record::ClientRecord;
pub use registry::{ClientRegistry, Registry};
