//! What a backend implements to execute queues.

use command::{
    ArcArgs, ArcToArgs, CircleArgs, Command, CommandQueue, CurveArgs, Custom, EllipseArgs,
    GroupArgs, ImageArgs, LineArgs, PaintArgs, PointArgs, PolylineArgs, RectArgs, SplineArgs,
    StyleArgs, TextArgs, UseArgs, ViewArgs,
};
use log::trace;

use crate::Image;

/// A backend able to execute command queues.
///
/// Every per-kind method returns whether the kind was handled. The
/// defaults handle nothing, so a backend implements only the kinds it
/// supports and the rest are skipped.
///
/// Handlers are not reentrant: one execution at a time per instance.
#[allow(unused_variables)]
pub trait Handler {
    /// Prepares for an execution of `queue`, resetting all stacks.
    /// Returning false aborts the execution.
    fn init(&mut self, queue: &CommandQueue, style: Option<&StyleArgs>) -> bool;

    /// Whether `command` should be replaced by its expansion, when it
    /// has one. Backends that handle a kind natively return false.
    fn wants_expansion(&self, command: &Command) -> bool {
        true
    }

    /// Whether per-element styles should be applied around elements.
    fn wraps_element_style(&self) -> bool {
        true
    }

    /// Whether `image` needs the fetched resource.
    fn fetches_images(&self) -> bool {
        false
    }

    /// Index path of the command about to be dispatched: its index in
    /// the executed queue, followed by indices in nested queues.
    fn locate(&mut self, path: &[usize]) {}

    /// Called once after the last command.
    fn finish(&mut self) {}

    fn clear(&mut self) -> bool {
        false
    }

    fn view(&mut self, args: &ViewArgs) -> bool {
        false
    }

    fn begin_group(&mut self, args: &GroupArgs) -> bool {
        false
    }

    fn end_group(&mut self) -> bool {
        false
    }

    fn style(&mut self, args: &StyleArgs) -> bool {
        false
    }

    fn circle(&mut self, args: &CircleArgs) -> bool {
        false
    }

    fn ellipse(&mut self, args: &EllipseArgs) -> bool {
        false
    }

    fn arc(&mut self, args: &ArcArgs) -> bool {
        false
    }

    fn rect(&mut self, args: &RectArgs) -> bool {
        false
    }

    fn line(&mut self, args: &LineArgs) -> bool {
        false
    }

    fn polyline(&mut self, args: &PolylineArgs) -> bool {
        false
    }

    fn spline(&mut self, args: &SplineArgs) -> bool {
        false
    }

    fn text(&mut self, args: &TextArgs) -> bool {
        false
    }

    fn image(&mut self, args: &ImageArgs, image: Option<&Image>) -> bool {
        false
    }

    fn moveto(&mut self, args: &PointArgs) -> bool {
        false
    }

    fn lineto(&mut self, args: &PointArgs) -> bool {
        false
    }

    fn curveto(&mut self, args: &CurveArgs) -> bool {
        false
    }

    fn arcto(&mut self, args: &ArcToArgs) -> bool {
        false
    }

    fn closepath(&mut self) -> bool {
        false
    }

    fn stroke(&mut self, args: &PaintArgs) -> bool {
        false
    }

    fn fill(&mut self, args: &PaintArgs) -> bool {
        false
    }

    /// A `use` the handler records itself. When this returns false the
    /// executor descends into the referenced queue instead.
    fn use_group(&mut self, args: &UseArgs) -> bool {
        false
    }

    fn custom(&mut self, custom: &Custom) -> bool {
        false
    }
}

/// Hands `command` to the matching handler method. Returns false when
/// the handler does not support the kind.
pub fn dispatch(handler: &mut dyn Handler, command: &Command, image: Option<&Image>) -> bool {
    let handled = match command {
        Command::Clear => handler.clear(),
        Command::View(args) => handler.view(args),
        Command::BeginGroup(args) => handler.begin_group(args),
        Command::EndGroup => handler.end_group(),
        Command::Style(args) => handler.style(args),
        Command::Circle(args) => handler.circle(args),
        Command::Ellipse(args) => handler.ellipse(args),
        Command::Arc(args) => handler.arc(args),
        Command::Rect(args) => handler.rect(args),
        Command::Line(args) => handler.line(args),
        Command::Polyline(args) => handler.polyline(args),
        Command::Spline(args) => handler.spline(args),
        Command::Text(args) => handler.text(args),
        Command::Image(args) => handler.image(args, image),
        Command::MoveTo(args) => handler.moveto(args),
        Command::LineTo(args) => handler.lineto(args),
        Command::CurveTo(args) => handler.curveto(args),
        Command::ArcTo(args) => handler.arcto(args),
        Command::ClosePath => handler.closepath(),
        Command::Stroke(args) => handler.stroke(args),
        Command::Fill(args) => handler.fill(args),
        Command::Use(args) => handler.use_group(args),
        Command::Custom(custom) => handler.custom(custom),
    };
    if handled {
        trace!("{}: handled", command.kind());
    } else {
        trace!("{}: not supported, skipped", command.kind());
    }
    handled
}
