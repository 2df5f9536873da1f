//! Named queues and style values.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::{CommandQueue, QueueId, StyleValue};

#[derive(Clone, Debug)]
pub enum Symbol {
    Queue(Rc<CommandQueue>),
    Style(StyleValue),
}

/// Name lookup for `use` targets and `@name` style references.
///
/// Names are case-sensitive. Tables are passed explicitly to queues and
/// handlers; [`SymbolTable::global`] exists for application code that
/// wants one shared table per thread.
#[derive(Default)]
pub struct SymbolTable {
    entries: RefCell<HashMap<String, Symbol>>,
}

thread_local! {
    static GLOBAL: Rc<SymbolTable> = Rc::new(SymbolTable::new());
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global() -> Rc<SymbolTable> {
        GLOBAL.with(Rc::clone)
    }

    /// Registers `queue` under `name`, replacing any previous entry.
    pub fn define_queue(&self, name: impl Into<String>, queue: CommandQueue) -> Rc<CommandQueue> {
        let queue = Rc::new(queue);
        self.define_shared(name, Rc::clone(&queue));
        queue
    }

    pub fn define_shared(&self, name: impl Into<String>, queue: Rc<CommandQueue>) {
        self.entries
            .borrow_mut()
            .insert(name.into(), Symbol::Queue(queue));
    }

    pub fn define_style(&self, name: impl Into<String>, value: impl Into<StyleValue>) {
        self.entries
            .borrow_mut()
            .insert(name.into(), Symbol::Style(value.into()));
    }

    pub fn get(&self, name: &str) -> Option<Symbol> {
        self.entries.borrow().get(name).cloned()
    }

    pub fn queue(&self, name: &str) -> Option<Rc<CommandQueue>> {
        match self.entries.borrow().get(name) {
            Some(Symbol::Queue(queue)) => Some(Rc::clone(queue)),
            _ => None,
        }
    }

    pub fn style(&self, name: &str) -> Option<StyleValue> {
        match self.entries.borrow().get(name) {
            Some(Symbol::Style(value)) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.borrow().contains_key(name)
    }

    pub fn remove(&self, name: &str) -> Option<Symbol> {
        self.entries.borrow_mut().remove(name)
    }

    /// Name a queue is registered under, if any.
    pub fn name_of(&self, id: QueueId) -> Option<String> {
        self.entries
            .borrow()
            .iter()
            .find_map(|(name, symbol)| match symbol {
                Symbol::Queue(queue) if queue.id() == id => Some(name.clone()),
                _ => None,
            })
    }

    /// All names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.borrow().keys().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymbolTable")
            .field("names", &self.names())
            .finish()
    }
}
