//! Executing command queues against backends.
//!
//! A backend implements [`Handler`]; an [`Executor`] walks a queue and
//! hands every command to it, expanding and descending into `use`
//! references along the way. Backends keep their transform and style
//! state in an [`ExecState`], which enforces the stack discipline all of
//! them share.

mod contract;
mod executor;
mod registry;
mod resources;
mod settings;
mod stacks;

pub use contract::{dispatch, Handler};
pub use executor::{execute, execute_blocking, Executor, HandlerContext};
pub use registry::HandlerRegistry;
pub use resources::{Fetch, FetchError, FileFetcher, Image, LocalFuture, Offline, ResourceCache};
pub use settings::{ConfigError, Settings};
pub use stacks::{ExecState, StyleChanges, StyleStack, TransformStack};
