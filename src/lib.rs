//! Typed configuration engine for the photofeed gallery widget.

pub mod codec;
pub mod error;
pub mod host;
pub mod prefs;
pub mod schema;
pub mod store;
pub mod theme;
pub mod validate;
pub mod value;

pub use error::{Error, ErrorKind, Fault, Result};
pub use store::{Completion, ConfigStore, InitTicket, LifecycleState};
pub use value::Value;
