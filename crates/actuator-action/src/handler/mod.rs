//! Action handler registry and trait definition.
//!
//! Defines the `ActionHandler` async trait and the registry that maps each
//! action type to exactly one implementation.

pub mod notification;
pub mod reservations;
pub mod weather;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use actuator_core::types::ActionType;

use crate::error::ActionError;
use crate::types::ActionPayload;

pub use notification::NotificationHandler;
pub use reservations::{
    BookTeeTimeHandler, FetchReservationsHandler, ReservationClient, SearchTeeTimesHandler,
};
pub use weather::WeatherHandler;

/// A side-effecting action. Returns one human-readable outcome per
/// notification-worthy result; an empty vector is a valid success.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    fn action_type(&self) -> ActionType;

    async fn execute(
        &self,
        cancel: &CancellationToken,
        arguments: &Map<String, Value>,
        payload: &ActionPayload,
    ) -> Result<Vec<String>, ActionError>;
}

/// Handlers keyed by action type. Built mutably at startup, then shared
/// read-only behind an `Arc`.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<ActionType, Arc<dyn ActionHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under its declared action type. A second handler
    /// for the same type is rejected and the first stays active.
    pub fn register(&mut self, handler: Arc<dyn ActionHandler>) -> Result<(), ActionError> {
        let action = handler.action_type();
        if self.handlers.contains_key(&action) {
            return Err(ActionError::DuplicateHandler(action));
        }
        tracing::debug!(action = %action, "Registered action handler");
        self.handlers.insert(action, handler);
        Ok(())
    }

    pub fn get_handler(&self, action: ActionType) -> Result<Arc<dyn ActionHandler>, ActionError> {
        self.handlers
            .get(&action)
            .cloned()
            .ok_or(ActionError::NoHandler(action))
    }

    /// Registered action types in declaration order. Diagnostics only.
    pub fn list_handlers(&self) -> Vec<ActionType> {
        ActionType::ALL
            .into_iter()
            .filter(|a| self.handlers.contains_key(a))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.list_handlers())
            .finish()
    }
}
