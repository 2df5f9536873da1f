//! Transform and style stacks shared by every backend.
//!
//! Both stacks always hold at least one level. A handler owns one
//! [`ExecState`] and resets it from `init`.

use std::rc::Rc;

use command::{GroupArgs, Style, StyleArgs, StyleKey, StyleValue, SymbolTable, ViewArgs};
use geometry::Matrix;
use log::{debug, warn};
use smallvec::{smallvec, SmallVec};

/// Style properties a backend has to (re)apply.
pub type StyleChanges = SmallVec<[(StyleKey, StyleValue); 4]>;

#[derive(Clone, Debug)]
pub struct TransformStack {
    stack: SmallVec<[Matrix; 8]>,
}

impl Default for TransformStack {
    fn default() -> Self {
        Self {
            stack: smallvec![Matrix::IDENTITY],
        }
    }
}

impl TransformStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current local-to-device transform.
    pub fn top(&self) -> Matrix {
        self.stack.last().copied().unwrap_or(Matrix::IDENTITY)
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Pushes `top * local` and returns it.
    pub fn push(&mut self, local: &Matrix) -> Matrix {
        let composed = self.top().compose(local);
        self.stack.push(composed);
        composed
    }

    /// Pops one level. The base level is never popped.
    pub fn pop(&mut self) -> bool {
        if self.stack.len() <= 1 {
            warn!("transform stack: pop at base level ignored");
            return false;
        }
        self.stack.pop();
        true
    }

    /// Replaces the current level.
    pub fn set_top(&mut self, matrix: Matrix) {
        if let Some(top) = self.stack.last_mut() {
            *top = matrix;
        }
    }

    pub fn reset(&mut self) {
        self.stack.clear();
        self.stack.push(Matrix::IDENTITY);
    }
}

#[derive(Clone, Debug)]
pub struct StyleStack {
    stack: Vec<Style>,
}

impl Default for StyleStack {
    fn default() -> Self {
        Self {
            stack: vec![Style::default()],
        }
    }
}

impl StyleStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn top(&self) -> &Style {
        &self.stack[self.stack.len() - 1]
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Resolves authored values against the symbol table and the
    /// current top. `@name` becomes the style symbol `name` if one is
    /// defined, else the current value of property `name`. References
    /// that resolve to neither are dropped.
    pub fn resolve(&self, args: &StyleArgs, symbols: &SymbolTable) -> StyleChanges {
        let top = self.top();
        let mut resolved = StyleChanges::new();
        for (key, value) in args.iter() {
            let value = value.get();
            let Some(name) = value.symbol_name() else {
                resolved.push((key, value));
                continue;
            };
            let target = symbols
                .style(name)
                .or_else(|| name.parse::<StyleKey>().ok().map(|k| top.get(k).clone()));
            match target {
                Some(target) if target.symbol_name().is_none() => resolved.push((key, target)),
                Some(target) => warn!("{}: reference {:?} resolves to {:?}, ignored", key, name, target),
                None => warn!("{}: unresolved style reference {:?}", key, name),
            }
        }
        resolved
    }

    /// Opens a level with `args` applied. Only properties whose value
    /// actually changes are returned.
    pub fn push(&mut self, args: &StyleArgs, symbols: &SymbolTable) -> StyleChanges {
        let changes = self.changed(args, symbols);
        let mut next = self.top().clone();
        for (key, value) in &changes {
            next.set(*key, value.clone());
        }
        self.stack.push(next);
        changes
    }

    /// Closes a level. Returns every property that differs between the
    /// discarded level and the one restored.
    pub fn pop(&mut self) -> StyleChanges {
        if self.stack.len() <= 1 {
            warn!("style stack: pop at base level ignored");
            return StyleChanges::new();
        }
        let discarded = self.stack.pop().unwrap_or_default();
        discarded.diff(self.top()).into_iter().collect()
    }

    /// Applies `args` to the current level without opening a new one.
    pub fn set(&mut self, args: &StyleArgs, symbols: &SymbolTable) -> StyleChanges {
        let changes = self.changed(args, symbols);
        if let Some(top) = self.stack.last_mut() {
            for (key, value) in &changes {
                top.set(*key, value.clone());
            }
        }
        changes
    }

    /// Back to a single default level with `base` applied. Returns the
    /// complete resulting style.
    pub fn reset(&mut self, base: &StyleArgs, symbols: &SymbolTable) -> StyleChanges {
        self.stack.clear();
        self.stack.push(Style::default());
        self.set(base, symbols);
        self.top()
            .iter()
            .map(|(key, value)| (key, value.clone()))
            .collect()
    }

    fn changed(&self, args: &StyleArgs, symbols: &SymbolTable) -> StyleChanges {
        let top = self.top();
        let mut changes = self.resolve(args, symbols);
        changes.retain(|(key, value)| top.get(*key) != value);
        changes
    }
}

/// Execution state of one handler: transforms, styles and the symbol
/// table `@` references resolve against.
#[derive(Clone, Debug)]
pub struct ExecState {
    pub transforms: TransformStack,
    pub styles: StyleStack,
    symbols: Rc<SymbolTable>,
}

impl ExecState {
    pub fn new(symbols: Rc<SymbolTable>) -> Self {
        Self {
            transforms: TransformStack::new(),
            styles: StyleStack::new(),
            symbols,
        }
    }

    pub fn symbols(&self) -> &Rc<SymbolTable> {
        &self.symbols
    }

    pub fn transform(&self) -> Matrix {
        self.transforms.top()
    }

    pub fn style(&self) -> &Style {
        self.styles.top()
    }

    /// Resets both stacks to one level, with `base` overridden by
    /// `extra` as the starting style.
    pub fn reset(&mut self, base: &StyleArgs, extra: Option<&StyleArgs>) -> StyleChanges {
        self.transforms.reset();
        let start = match extra {
            Some(extra) => base.merged(extra),
            None => base.clone(),
        };
        self.styles.reset(&start, &self.symbols)
    }

    pub fn begin_group(&mut self, args: &GroupArgs) -> StyleChanges {
        let matrix = self.transforms.push(&args.local_matrix());
        let changes = self.styles.push(&args.style, &self.symbols);
        debug!(
            "begin group: depth {}, {} style changes, transform {:?}",
            self.transforms.depth(),
            changes.len(),
            matrix.to_array()
        );
        changes
    }

    pub fn end_group(&mut self) -> StyleChanges {
        self.transforms.pop();
        let changes = self.styles.pop();
        debug!(
            "end group: depth {}, {} style changes",
            self.transforms.depth(),
            changes.len()
        );
        changes
    }

    pub fn set_style(&mut self, args: &StyleArgs) -> StyleChanges {
        self.styles.set(args, &self.symbols)
    }

    pub fn apply_view(&mut self, args: &ViewArgs, height: f64) {
        self.transforms.set_top(args.matrix(height));
    }
}
