//! The stock backends: [`Canvas`] renders onto a [`Surface`], [`Picker`]
//! hit-tests a point and [`Serializer`] writes a JSON [`Document`] that
//! [`parse`] reads back.

mod canvas;
mod parse;
mod picker;
mod serializer;
mod surface;

pub use canvas::{Canvas, CanvasTarget};
pub use parse::{parse, Diagnostic, ParseError, Parsed};
pub use picker::{Hit, HitKind, Pick, PickTarget, Picker};
pub use serializer::{serialize, Document, Entry, SerializeTarget, Serializer, MAIN};
pub use surface::{RecordingSurface, Surface, SurfaceCall, SvgSurface};

use std::rc::Rc;

use handler::HandlerRegistry;

/// A registry adopting [`CanvasTarget`], [`PickTarget`] and
/// [`SerializeTarget`], in that order.
pub fn default_registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry
        .register_type::<CanvasTarget>("canvas", |target, context| {
            Box::new(Canvas::new(Rc::clone(&target.0), context))
        })
        .register_type::<PickTarget>("picker", |target, context| {
            Box::new(Picker::new(Rc::clone(&target.0), context))
        })
        .register_type::<SerializeTarget>("serializer", |target, context| {
            Box::new(Serializer::new(Rc::clone(&target.0), Rc::clone(&context.symbols)))
        });
    registry
}
