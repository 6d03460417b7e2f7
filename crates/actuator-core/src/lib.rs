//! Actuator core: shared types, the message lifecycle, configuration, and
//! logging setup used by every other crate in the workspace.

pub mod config;
pub mod error;
pub mod logging;
pub mod message;
pub mod result;
pub mod types;

pub use config::ActuatorConfig;
pub use error::{ActuatorError, Result};
pub use message::Message;
pub use result::ActionResult;
pub use types::*;
