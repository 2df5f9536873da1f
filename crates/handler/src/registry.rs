//! Probe-and-adopt binding of opaque targets to handlers.

use std::any::Any;

use log::debug;

use crate::{Handler, HandlerContext};

type Probe = Box<dyn Fn(&dyn Any) -> bool>;
type Construct = Box<dyn Fn(&dyn Any, &HandlerContext) -> Option<Box<dyn Handler>>>;

/// An ordered list of `(probe, construct)` pairs. The first probe that
/// accepts a target decides which handler is built for it.
#[derive(Default)]
pub struct HandlerRegistry {
    entries: Vec<(&'static str, Probe, Construct)>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: &'static str,
        probe: impl Fn(&dyn Any) -> bool + 'static,
        construct: impl Fn(&dyn Any, &HandlerContext) -> Option<Box<dyn Handler>> + 'static,
    ) -> &mut Self {
        self.entries.push((name, Box::new(probe), Box::new(construct)));
        self
    }

    /// Registers a handler for targets of type `T`.
    pub fn register_type<T: Any>(
        &mut self,
        name: &'static str,
        construct: impl Fn(&T, &HandlerContext) -> Box<dyn Handler> + 'static,
    ) -> &mut Self {
        self.register(
            name,
            |target| target.is::<T>(),
            move |target, context| {
                target
                    .downcast_ref::<T>()
                    .map(|target| construct(target, context))
            },
        )
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn adopt(&self, target: &dyn Any, context: &HandlerContext) -> Option<Box<dyn Handler>> {
        let (name, _, construct) = self.entries.iter().find(|(_, probe, _)| probe(target))?;
        debug!("target adopted by {} handler", name);
        construct(target, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Settings;
    use command::{CommandQueue, StyleArgs, SymbolTable};
    use std::rc::Rc;

    struct Named(&'static str);

    impl Handler for Named {
        fn init(&mut self, _queue: &CommandQueue, _style: Option<&StyleArgs>) -> bool {
            !self.0.is_empty()
        }
    }

    fn context() -> HandlerContext {
        HandlerContext::new(Rc::new(SymbolTable::new()), Settings::default())
    }

    #[test]
    fn test_first_matching_probe_wins() {
        let mut registry = HandlerRegistry::new();
        registry
            .register_type::<u32>("small", |_, _| Box::new(Named("small")))
            .register("any-number", |t| t.is::<u32>() || t.is::<u64>(), |_, _| {
                Some(Box::new(Named("")) as Box<dyn Handler>)
            });

        let queue = CommandQueue::new();
        let mut small = registry.adopt(&7u32, &context()).unwrap();
        assert!(small.init(&queue, None));
        let mut wide = registry.adopt(&7u64, &context()).unwrap();
        assert!(!wide.init(&queue, None));
        assert!(registry.adopt(&"text", &context()).is_none());
    }
}
