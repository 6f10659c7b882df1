//! Record router/validator layer.
//!
//! # Responsibility
//! - Turn identifier-addressed CRUD requests into storage primitives.
//! - Own payload validation and change notification.
//!
//! # Invariants
//! - Identifiers are parsed once into `ResourceId`; downstream code only
//!   switches on the variant.
//! - The matcher and observer registry are owned per provider; there is no
//!   process-wide routing state.

mod notify;
mod record_provider;
mod uri;
mod validation;

pub use notify::{ChangeNotifier, ChangeObserver, SubscriptionHandle};
pub use record_provider::{
    Identifier, ProviderError, ProviderResult, RecordCursor, RecordProvider,
};
pub use uri::{ResourceId, UriMatcher};
