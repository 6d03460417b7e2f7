//! Action pipeline for Actuator.
//!
//! Parses web-action payloads, dispatches them to pluggable handlers,
//! records results, and publishes the outcomes. Also hosts the
//! notification processor that delivers those outcomes.

pub mod auth;
pub mod catalog;
pub mod claims;
pub mod error;
pub mod handler;
pub mod notifier;
pub mod ntfy;
pub mod orchestrator;
pub mod persist;
pub mod services;
pub mod types;

pub use auth::Authenticator;
pub use catalog::{Course, CourseCatalog};
pub use claims::{ClaimsVerifier, IdentityClaims, JwksVerifier};
pub use error::ActionError;
pub use handler::{ActionHandler, HandlerRegistry};
pub use notifier::NotificationProcessor;
pub use ntfy::NtfyClient;
pub use orchestrator::{WebActionProcessor, OUTCOME_ORIGINATOR};
pub use persist::BestEffortStore;
pub use services::Services;
pub use types::{ActionPayload, AuthConfig, AuthType};
