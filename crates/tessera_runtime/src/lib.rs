//! # TESSERA Runtime
//!
//! Collaborators that component implementations lean on:
//! - [`ConfigStore`] - persisted, sectioned settings
//! - [`Stopwatch`] - elapsed-time queries
//! - [`timer`] - one-shot and repeating callbacks on background threads
//! - [`Signal`] - typed publish/subscribe between components
//!
//! Nothing here depends on the entity core; values flow into components
//! through their constructors.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod signal;
pub mod stopwatch;
pub mod timer;

pub use config::{ConfigStore, LoadStatus};
pub use error::{RuntimeError, RuntimeResult};
pub use signal::{Connection, ConnectionId, ScopedConnection, Signal};
pub use stopwatch::Stopwatch;
pub use timer::{Rounds, TimerHandle};
