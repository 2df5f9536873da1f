//! Commands and command queues.
//!
//! A drawing is an ordered [`CommandQueue`] of [`Command`]s. Queues are
//! built once and executed any number of times against interchangeable
//! backends. Commands are:
//! - Closed: one variant per kind, each with a typed argument record
//! - Lazy where asked: any scalar may be a [`Value::Deferred`] thunk
//! - Capable: kinds with geometry implement [`Element`] (hit tests,
//!   dragging, handles, expansion)
//!
//! # Example
//! ```ignore
//! use command::{CircleArgs, CommandQueue, GroupArgs, StyleArgs};
//!
//! let mut queue = CommandQueue::new();
//! queue
//!     .begin(GroupArgs::translate(10.0, 0.0))
//!     .circle(CircleArgs::new(0.0, 0.0, 5.0).with_style(StyleArgs::new().fill("red")))
//!     .end();
//! ```

mod args;
mod command;
mod element;
mod queue;
mod registry;
mod style;
mod symbols;
mod value;

pub use args::*;
pub use command::{Command, Custom, CustomElement};
pub use element::{Capabilities, Element, PointAt};
pub use queue::{CommandQueue, QueueId};
pub use registry::{KindConstructor, KindRegistry};
pub use style::{Shadow, Style, StyleArgs, StyleKey, StyleValue, STYLE_SIGIL};
pub use symbols::{Symbol, SymbolTable};
pub use value::Value;
