//! Constructors for custom command kinds, keyed by kind name.

use std::collections::HashMap;

use log::debug;

use crate::{Custom, CustomElement};

/// Builds a custom element from its interchange arguments. Returns
/// `None` when the arguments do not fit the kind.
pub type KindConstructor = fn(&serde_json::Value) -> Option<Box<dyn CustomElement>>;

#[derive(Default)]
pub struct KindRegistry {
    kinds: HashMap<String, KindConstructor>,
}

impl KindRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: impl Into<String>, constructor: KindConstructor) -> &mut Self {
        let kind = kind.into();
        debug!("registered custom kind {:?}", kind);
        self.kinds.insert(kind, constructor);
        self
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.kinds.contains_key(kind)
    }

    pub fn construct(&self, kind: &str, args: &serde_json::Value) -> Option<Custom> {
        let constructor = self.kinds.get(kind)?;
        constructor(args).map(Custom::from_box)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(String::as_str)
    }
}
