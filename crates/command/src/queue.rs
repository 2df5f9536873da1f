use std::fmt;
use std::rc::Rc;

use log::{debug, warn};

use crate::{
    ArcArgs, ArcToArgs, CircleArgs, Command, Custom, CurveArgs, CustomElement, EllipseArgs,
    GroupArgs, ImageArgs, LineArgs, PaintArgs, PointArgs, PolylineArgs, RectArgs, SplineArgs,
    StyleArgs, SymbolTable, TextArgs, UseArgs, ViewArgs,
};

/// Identity of a queue. Clones of a queue share it.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueueId(uuid::Uuid);

impl QueueId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for QueueId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QueueId({})", &self.0.to_string()[..8])
    }
}

impl fmt::Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// An ordered, append-only list of commands.
///
/// Commands are only ever added at the end or truncated with
/// [`CommandQueue::del`]. Two invariants are kept at append time:
/// every `end` closes an earlier `begin`, and a `use` never makes the
/// queue reachable from itself.
#[derive(Clone, Debug, Default)]
pub struct CommandQueue {
    id: QueueId,
    commands: Vec<Command>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(id: QueueId) -> Self {
        Self {
            id,
            commands: Vec::new(),
        }
    }

    pub fn id(&self) -> QueueId {
        self.id
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Command> {
        self.commands.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Command> {
        self.commands.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Command> {
        self.commands.get_mut(index)
    }

    /// Appends `command` unless it would break a queue invariant.
    /// Returns whether it was appended.
    pub fn try_append(&mut self, command: Command) -> bool {
        match &command {
            Command::EndGroup if !self.has_open_group() => {
                warn!("queue {}: rejected end without matching begin", self.id);
                return false;
            }
            Command::Use(args) if args.queue.id() == self.id => {
                warn!("queue {}: rejected use of itself", self.id);
                return false;
            }
            Command::Use(args) if args.queue.uses(self.id) => {
                warn!(
                    "queue {}: rejected use of {}, which would form a cycle",
                    self.id,
                    args.queue.id()
                );
                return false;
            }
            _ => {}
        }
        self.commands.push(command);
        true
    }

    pub fn append(&mut self, command: Command) -> &mut Self {
        self.try_append(command);
        self
    }

    /// Truncates the queue to its first `n` commands.
    pub fn del(&mut self, n: usize) -> &mut Self {
        self.commands.truncate(n);
        self
    }

    /// Whether a backward scan finds a `begin` not yet closed.
    pub fn has_open_group(&self) -> bool {
        let mut depth = 0usize;
        for command in self.commands.iter().rev() {
            match command {
                Command::EndGroup => depth += 1,
                Command::BeginGroup(_) if depth == 0 => return true,
                Command::BeginGroup(_) => depth -= 1,
                _ => {}
            }
        }
        false
    }

    /// Whether this queue reaches `id` through its `use` commands.
    pub fn uses(&self, id: QueueId) -> bool {
        self.commands.iter().any(|command| match command {
            Command::Use(args) => args.queue.id() == id || args.queue.uses(id),
            _ => false,
        })
    }

    pub fn use_queue(&mut self, queue: Rc<CommandQueue>) -> &mut Self {
        self.append(Command::Use(UseArgs::new(queue)))
    }

    /// Appends a `use` of the queue registered under `name`. Unknown
    /// names and names bound to styles are skipped.
    pub fn use_symbol(&mut self, symbols: &SymbolTable, name: &str) -> &mut Self {
        self.use_symbol_styled(symbols, name, StyleArgs::new())
    }

    pub fn use_symbol_styled(
        &mut self,
        symbols: &SymbolTable,
        name: &str,
        style: StyleArgs,
    ) -> &mut Self {
        match symbols.queue(name) {
            Some(queue) => {
                debug!("queue {}: use of symbol {:?}", self.id, name);
                self.append(Command::Use(UseArgs::named(name, queue).with_style(style)))
            }
            None => {
                warn!("queue {}: no queue named {:?}, use skipped", self.id, name);
                self
            }
        }
    }

    pub fn clear(&mut self) -> &mut Self {
        self.append(Command::Clear)
    }

    pub fn view(&mut self, args: ViewArgs) -> &mut Self {
        self.append(Command::View(args))
    }

    pub fn begin(&mut self, args: GroupArgs) -> &mut Self {
        self.append(Command::BeginGroup(args))
    }

    pub fn end(&mut self) -> &mut Self {
        self.append(Command::EndGroup)
    }

    pub fn style(&mut self, args: StyleArgs) -> &mut Self {
        self.append(Command::Style(args))
    }

    pub fn circle(&mut self, args: CircleArgs) -> &mut Self {
        self.append(Command::Circle(args))
    }

    pub fn ellipse(&mut self, args: EllipseArgs) -> &mut Self {
        self.append(Command::Ellipse(args))
    }

    pub fn arc(&mut self, args: ArcArgs) -> &mut Self {
        self.append(Command::Arc(args))
    }

    pub fn rect(&mut self, args: RectArgs) -> &mut Self {
        self.append(Command::Rect(args))
    }

    pub fn line(&mut self, args: LineArgs) -> &mut Self {
        self.append(Command::Line(args))
    }

    pub fn polyline(&mut self, args: PolylineArgs) -> &mut Self {
        self.append(Command::Polyline(args))
    }

    pub fn spline(&mut self, args: SplineArgs) -> &mut Self {
        self.append(Command::Spline(args))
    }

    pub fn text(&mut self, args: TextArgs) -> &mut Self {
        self.append(Command::Text(args))
    }

    pub fn image(&mut self, args: ImageArgs) -> &mut Self {
        self.append(Command::Image(args))
    }

    pub fn move_to(&mut self, args: PointArgs) -> &mut Self {
        self.append(Command::MoveTo(args))
    }

    pub fn line_to(&mut self, args: PointArgs) -> &mut Self {
        self.append(Command::LineTo(args))
    }

    pub fn curve_to(&mut self, args: CurveArgs) -> &mut Self {
        self.append(Command::CurveTo(args))
    }

    pub fn arc_to(&mut self, args: ArcToArgs) -> &mut Self {
        self.append(Command::ArcTo(args))
    }

    pub fn close_path(&mut self) -> &mut Self {
        self.append(Command::ClosePath)
    }

    pub fn stroke(&mut self, args: PaintArgs) -> &mut Self {
        self.append(Command::Stroke(args))
    }

    pub fn fill(&mut self, args: PaintArgs) -> &mut Self {
        self.append(Command::Fill(args))
    }

    pub fn custom(&mut self, element: impl CustomElement + 'static) -> &mut Self {
        self.append(Command::Custom(Custom::new(element)))
    }
}

impl<'a> IntoIterator for &'a CommandQueue {
    type Item = &'a Command;
    type IntoIter = std::slice::Iter<'a, Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(queue: &CommandQueue) -> Vec<&str> {
        queue.iter().map(Command::kind).collect()
    }

    #[test]
    fn test_unmatched_end_is_rejected() {
        let mut queue = CommandQueue::new();
        assert!(!queue.try_append(Command::EndGroup));

        queue.begin(GroupArgs::new()).end().end();
        assert_eq!(kinds(&queue), ["begin", "end"]);
    }

    #[test]
    fn test_nested_groups_close_in_order() {
        let mut queue = CommandQueue::new();
        queue
            .begin(GroupArgs::new())
            .begin(GroupArgs::new())
            .end()
            .end()
            .end();
        assert_eq!(kinds(&queue), ["begin", "begin", "end", "end"]);
        assert!(!queue.has_open_group());
    }

    #[test]
    fn test_del_truncates() {
        let mut queue = CommandQueue::new();
        queue
            .circle(CircleArgs::new(0.0, 0.0, 1.0))
            .line(LineArgs::new(0.0, 0.0, 1.0, 1.0))
            .rect(RectArgs::new(0.0, 0.0, 1.0, 1.0));
        queue.del(1);
        assert_eq!(kinds(&queue), ["circle"]);
        queue.del(5);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_self_use_is_skipped() {
        let mut queue = CommandQueue::new();
        let snapshot = Rc::new(queue.clone());
        queue.use_queue(snapshot);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_cyclic_use_is_skipped() {
        let mut a = CommandQueue::new();
        let mut b = CommandQueue::new();
        let a_snapshot = Rc::new(a.clone());
        b.use_queue(a_snapshot);
        let b = Rc::new(b);
        a.use_queue(Rc::clone(&b));
        assert!(a.is_empty());
        assert!(b.uses(a.id()));
    }

    #[test]
    fn test_use_symbol() {
        let symbols = SymbolTable::new();
        let mut part = CommandQueue::new();
        part.circle(CircleArgs::new(0.0, 0.0, 2.0));
        symbols.define_queue("dot", part);

        let mut queue = CommandQueue::new();
        queue.use_symbol(&symbols, "dot").use_symbol(&symbols, "missing");
        assert_eq!(kinds(&queue), ["use"]);
        match queue.get(0) {
            Some(Command::Use(args)) => assert_eq!(args.name.as_deref(), Some("dot")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
