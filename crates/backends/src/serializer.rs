//! Serializing backend: writes queues into a JSON [`Document`].

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use command::{
    ArcArgs, ArcToArgs, CircleArgs, Command, CommandQueue, CurveArgs, Custom, EllipseArgs,
    GroupArgs, ImageArgs, LineArgs, PaintArgs, PointArgs, PolylineArgs, QueueId, RectArgs,
    SplineArgs, StyleArgs, SymbolTable, TextArgs, UseArgs, ViewArgs,
};
use handler::{dispatch, Executor, Handler, Image, ResourceCache};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Name of the group execution starts from.
pub const MAIN: &str = "main";

/// One serialized command: kind `c` and arguments `a`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub c: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a: Option<serde_json::Value>,
}

/// Named groups of entries. `main` is the entry point; the other
/// groups are the targets of `use` commands.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    pub groups: BTreeMap<String, Vec<Entry>>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn main(&self) -> Option<&[Entry]> {
        self.group(MAIN)
    }

    pub fn group(&self, name: &str) -> Option<&[Entry]> {
        self.groups.get(name).map(Vec::as_slice)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Target type the serializer adopts.
#[derive(Clone, Debug, Default)]
pub struct SerializeTarget(pub Rc<RefCell<Document>>);

pub struct Serializer {
    doc: Rc<RefCell<Document>>,
    symbols: Rc<SymbolTable>,
    /// Which queue each written group holds.
    owners: Rc<RefCell<HashMap<String, QueueId>>>,
    group: String,
    entries: Vec<Entry>,
}

impl Serializer {
    pub fn new(doc: Rc<RefCell<Document>>, symbols: Rc<SymbolTable>) -> Self {
        Self {
            doc,
            symbols,
            owners: Rc::default(),
            group: MAIN.to_string(),
            entries: Vec::new(),
        }
    }

    fn child(&self, group: &str) -> Self {
        Self {
            doc: Rc::clone(&self.doc),
            symbols: Rc::clone(&self.symbols),
            owners: Rc::clone(&self.owners),
            group: group.to_string(),
            entries: Vec::new(),
        }
    }

    fn push(&mut self, kind: &str, args: Option<serde_json::Value>) -> bool {
        self.entries.push(Entry {
            c: kind.to_string(),
            a: args,
        });
        true
    }

    fn record<A: Serialize>(&mut self, kind: &str, args: &A) -> bool {
        match serde_json::to_value(args) {
            Ok(serde_json::Value::Object(map)) if map.is_empty() => self.push(kind, None),
            Ok(value) => self.push(kind, Some(value)),
            Err(err) => {
                warn!("serializer: {} not serializable: {}", kind, err);
                false
            }
        }
    }

    /// Name under which a used queue is written: the name it was used
    /// by, else its symbol name, else one derived from its identity.
    /// `main` and names already holding another queue fall back to the
    /// identity name.
    fn group_name(&self, args: &UseArgs) -> String {
        let id = args.queue.id();
        let fallback = format!("_{}", id);
        let Some(name) = args.name.clone().or_else(|| self.symbols.name_of(id)) else {
            return fallback;
        };
        let taken = self
            .owners
            .borrow()
            .get(&name)
            .is_some_and(|owner| *owner != id);
        if name == MAIN || taken {
            debug!("serializer: group name {:?} unavailable, using {:?}", name, fallback);
            return fallback;
        }
        name
    }

    fn write_group(&self, name: &str, queue: &CommandQueue) {
        if self.owners.borrow().contains_key(name) {
            return;
        }
        debug!("serializer: writing group {:?}", name);
        self.owners.borrow_mut().insert(name.to_string(), queue.id());
        let mut child = self.child(name);
        for command in queue.iter() {
            dispatch(&mut child, command, None);
        }
        child.finish();
    }
}

impl Handler for Serializer {
    fn init(&mut self, _queue: &CommandQueue, _style: Option<&StyleArgs>) -> bool {
        self.entries.clear();
        true
    }

    /// Commands are written as authored.
    fn wants_expansion(&self, _command: &Command) -> bool {
        false
    }

    fn wraps_element_style(&self) -> bool {
        false
    }

    fn finish(&mut self) {
        let entries = std::mem::take(&mut self.entries);
        self.doc
            .borrow_mut()
            .groups
            .insert(self.group.clone(), entries);
    }

    fn clear(&mut self) -> bool {
        self.push("clear", None)
    }

    fn view(&mut self, args: &ViewArgs) -> bool {
        self.record("view", args)
    }

    fn begin_group(&mut self, args: &GroupArgs) -> bool {
        self.record("begin", args)
    }

    fn end_group(&mut self) -> bool {
        self.push("end", None)
    }

    fn style(&mut self, args: &StyleArgs) -> bool {
        self.record("style", args)
    }

    fn circle(&mut self, args: &CircleArgs) -> bool {
        self.record("circle", args)
    }

    fn ellipse(&mut self, args: &EllipseArgs) -> bool {
        self.record("ellipse", args)
    }

    fn arc(&mut self, args: &ArcArgs) -> bool {
        self.record("arc", args)
    }

    fn rect(&mut self, args: &RectArgs) -> bool {
        self.record("rect", args)
    }

    fn line(&mut self, args: &LineArgs) -> bool {
        self.record("line", args)
    }

    fn polyline(&mut self, args: &PolylineArgs) -> bool {
        self.record("polyline", args)
    }

    fn spline(&mut self, args: &SplineArgs) -> bool {
        self.record("spline", args)
    }

    fn text(&mut self, args: &TextArgs) -> bool {
        self.record("text", args)
    }

    fn image(&mut self, args: &ImageArgs, _image: Option<&Image>) -> bool {
        self.record("image", args)
    }

    fn moveto(&mut self, args: &PointArgs) -> bool {
        self.record("moveto", args)
    }

    fn lineto(&mut self, args: &PointArgs) -> bool {
        self.record("lineto", args)
    }

    fn curveto(&mut self, args: &CurveArgs) -> bool {
        self.record("curveto", args)
    }

    fn arcto(&mut self, args: &ArcToArgs) -> bool {
        self.record("arcto", args)
    }

    fn closepath(&mut self) -> bool {
        self.push("closepath", None)
    }

    fn stroke(&mut self, args: &PaintArgs) -> bool {
        self.record("stroke", args)
    }

    fn fill(&mut self, args: &PaintArgs) -> bool {
        self.record("fill", args)
    }

    fn use_group(&mut self, args: &UseArgs) -> bool {
        let name = self.group_name(args);
        self.write_group(&name, &args.queue);
        let mut named = args.clone();
        named.name = Some(name);
        self.record("use", &named)
    }

    fn custom(&mut self, custom: &Custom) -> bool {
        let args = custom.args();
        let args = (!args.is_null()).then_some(args);
        self.push(custom.kind(), args)
    }
}

/// Serializes `queue` and every queue it uses.
pub fn serialize(queue: &CommandQueue, symbols: Rc<SymbolTable>) -> Document {
    let doc = Rc::new(RefCell::new(Document::new()));
    let mut serializer = Serializer::new(Rc::clone(&doc), symbols);
    Executor::new(&mut serializer, Rc::new(ResourceCache::offline()), usize::MAX)
        .run_blocking(queue, None);
    doc.take()
}
