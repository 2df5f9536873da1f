//! The dispatch algorithm: depth-first, strictly in queue order.

use std::any::Any;
use std::rc::Rc;

use command::{Command, CommandQueue, GroupArgs, StyleArgs};
use log::{debug, trace, warn};

use crate::resources::LocalFuture;
use crate::{dispatch, Handler, HandlerRegistry, ResourceCache};

/// Runs queues against one handler.
///
/// Expansions are recomputed on every run, since they may read live
/// state. The only suspension point is fetching an image; while it is
/// pending the run does not advance to the next command.
pub struct Executor<'h> {
    handler: &'h mut dyn Handler,
    resources: Rc<ResourceCache>,
    max_depth: usize,
    path: Vec<usize>,
}

impl<'h> Executor<'h> {
    pub fn new(handler: &'h mut dyn Handler, resources: Rc<ResourceCache>, max_depth: usize) -> Self {
        Self {
            handler,
            resources,
            max_depth,
            path: Vec::new(),
        }
    }

    /// Initializes the handler and executes `queue`. Returns false if
    /// the handler declined in `init`.
    pub async fn run(&mut self, queue: &CommandQueue, style: Option<&StyleArgs>) -> bool {
        if !self.handler.init(queue, style) {
            debug!("queue {}: handler declined init", queue.id());
            return false;
        }
        self.path.clear();
        self.exe(queue, 0).await;
        self.handler.finish();
        true
    }

    pub fn run_blocking(&mut self, queue: &CommandQueue, style: Option<&StyleArgs>) -> bool {
        smol::block_on(self.run(queue, style))
    }

    fn exe<'a>(&'a mut self, queue: &'a CommandQueue, depth: usize) -> LocalFuture<'a, ()> {
        Box::pin(async move {
            if depth > self.max_depth {
                warn!(
                    "queue {}: nesting deeper than {}, skipped",
                    queue.id(),
                    self.max_depth
                );
                return;
            }
            for (index, command) in queue.iter().enumerate() {
                self.path.push(index);
                self.step(command, depth).await;
                self.path.pop();
            }
        })
    }

    async fn step(&mut self, command: &Command, depth: usize) {
        if self.handler.wants_expansion(command) {
            if let Some(expanded) = command.expand() {
                trace!("{}: expanded into {} commands", command.kind(), expanded.len());
                self.exe(&expanded, depth + 1).await;
                return;
            }
        }

        if let Command::Use(args) = command {
            if self.handler.use_group(args) {
                return;
            }
            let styled = !args.style.is_empty();
            if styled {
                self.handler
                    .begin_group(&GroupArgs::styled(args.style.clone()));
            }
            let queue = Rc::clone(&args.queue);
            self.exe(&queue, depth + 1).await;
            if styled {
                self.handler.end_group();
            }
            return;
        }

        let image = match command {
            Command::Image(args) if self.handler.fetches_images() => {
                Some(self.resources.load(&args.uri).await)
            }
            _ => None,
        };

        self.handler.locate(&self.path);
        let element_style = if self.handler.wraps_element_style() {
            command.element_style()
        } else {
            None
        };
        if let Some(style) = element_style {
            self.handler.begin_group(&GroupArgs::styled(style.clone()));
        }
        dispatch(&mut *self.handler, command, image.as_deref());
        if element_style.is_some() {
            self.handler.end_group();
        }
    }
}

/// Everything a handler may need from its environment.
#[derive(Clone, Debug)]
pub struct HandlerContext {
    pub symbols: Rc<command::SymbolTable>,
    pub settings: crate::Settings,
    pub resources: Rc<ResourceCache>,
}

impl HandlerContext {
    pub fn new(symbols: Rc<command::SymbolTable>, settings: crate::Settings) -> Self {
        let resources = Rc::new(ResourceCache::new(
            crate::FileFetcher,
            settings.placeholder,
        ));
        Self {
            symbols,
            settings,
            resources,
        }
    }
}

/// Adopts a handler for `target` and executes `queue` with it. Without
/// a matching handler nothing happens and false is returned.
pub async fn execute(
    registry: &HandlerRegistry,
    target: &dyn Any,
    queue: &CommandQueue,
    context: &HandlerContext,
) -> bool {
    let Some(mut handler) = registry.adopt(target, context) else {
        debug!("queue {}: no handler for target", queue.id());
        return false;
    };
    let mut executor = Executor::new(
        handler.as_mut(),
        Rc::clone(&context.resources),
        context.settings.max_depth,
    );
    executor.run(queue, None).await
}

pub fn execute_blocking(
    registry: &HandlerRegistry,
    target: &dyn Any,
    queue: &CommandQueue,
    context: &HandlerContext,
) -> bool {
    smol::block_on(execute(registry, target, queue, context))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Fetch, FetchError, Image};
    use command::{
        CircleArgs, Custom, CustomElement, Element, ImageArgs, LineArgs, PaintArgs, SplineArgs,
        StyleKey, SymbolTable,
    };
    use command::Capabilities;
    use std::cell::RefCell;

    /// Records the kinds it receives; supports only a few.
    #[derive(Default)]
    struct Recorder {
        log: Vec<String>,
        paths: Vec<Vec<usize>>,
        declines: bool,
        finished: bool,
    }

    impl Handler for Recorder {
        fn init(&mut self, _queue: &CommandQueue, style: Option<&StyleArgs>) -> bool {
            self.log.clear();
            if let Some(style) = style {
                self.log.push(format!("init+{}", style.len()));
            }
            !self.declines
        }

        fn fetches_images(&self) -> bool {
            true
        }

        fn locate(&mut self, path: &[usize]) {
            self.paths.push(path.to_vec());
        }

        fn finish(&mut self) {
            self.finished = true;
        }

        fn begin_group(&mut self, args: &GroupArgs) -> bool {
            self.log.push(format!("begin{}", args.style.len()));
            true
        }

        fn end_group(&mut self) -> bool {
            self.log.push("end".into());
            true
        }

        fn circle(&mut self, args: &CircleArgs) -> bool {
            self.log.push(format!("circle{}", args.r.get()));
            true
        }

        fn moveto(&mut self, _args: &command::PointArgs) -> bool {
            self.log.push("moveto".into());
            true
        }

        fn curveto(&mut self, _args: &command::CurveArgs) -> bool {
            self.log.push("curveto".into());
            true
        }

        fn stroke(&mut self, _args: &PaintArgs) -> bool {
            self.log.push("stroke".into());
            true
        }

        fn image(&mut self, _args: &ImageArgs, image: Option<&Image>) -> bool {
            let placeholder = image.map(|i| i.placeholder);
            self.log.push(format!("image{:?}", placeholder));
            true
        }
    }

    fn run(handler: &mut Recorder, queue: &CommandQueue) -> bool {
        Executor::new(handler, Rc::new(ResourceCache::offline()), 8).run_blocking(queue, None)
    }

    #[test]
    fn test_unsupported_kinds_are_skipped() {
        let mut queue = CommandQueue::new();
        queue
            .circle(CircleArgs::new(0.0, 0.0, 1.0))
            .line(LineArgs::new(0.0, 0.0, 1.0, 1.0))
            .circle(CircleArgs::new(0.0, 0.0, 2.0));
        let mut recorder = Recorder::default();
        assert!(run(&mut recorder, &queue));
        assert_eq!(recorder.log, ["circle1", "circle2"]);
        assert!(recorder.finished);
    }

    #[test]
    fn test_declined_init_runs_nothing() {
        let mut queue = CommandQueue::new();
        queue.circle(CircleArgs::new(0.0, 0.0, 1.0));
        let mut recorder = Recorder {
            declines: true,
            ..Default::default()
        };
        assert!(!run(&mut recorder, &queue));
        assert!(recorder.log.is_empty());
        assert!(!recorder.finished);
    }

    #[test]
    fn test_expansion_is_substituted_in_place() {
        let mut queue = CommandQueue::new();
        queue
            .circle(CircleArgs::new(0.0, 0.0, 1.0))
            .spline(SplineArgs::new(vec![[0.0, 0.0], [5.0, 5.0], [10.0, 0.0]]))
            .circle(CircleArgs::new(0.0, 0.0, 2.0));
        let mut recorder = Recorder::default();
        run(&mut recorder, &queue);
        assert_eq!(
            recorder.log,
            ["circle1", "begin0", "moveto", "curveto", "curveto", "stroke", "end", "circle2"]
        );
    }

    #[test]
    fn test_use_descends_with_style_and_paths() {
        let mut part = CommandQueue::new();
        part.circle(CircleArgs::new(0.0, 0.0, 3.0));
        let part = Rc::new(part);

        let mut queue = CommandQueue::new();
        queue.circle(CircleArgs::new(0.0, 0.0, 1.0));
        queue.append(Command::Use(
            command::UseArgs::new(part).with_style(StyleArgs::new().fill("red")),
        ));
        let mut recorder = Recorder::default();
        run(&mut recorder, &queue);
        assert_eq!(recorder.log, ["circle1", "begin1", "circle3", "end"]);
        assert_eq!(recorder.paths, [vec![0], vec![1, 0]]);
    }

    #[test]
    fn test_element_style_wraps_element() {
        let mut queue = CommandQueue::new();
        queue.circle(
            CircleArgs::new(0.0, 0.0, 1.0)
                .with_style(StyleArgs::new().fill("red").set(StyleKey::LineWidth, 2.0)),
        );
        let mut recorder = Recorder::default();
        run(&mut recorder, &queue);
        assert_eq!(recorder.log, ["begin2", "circle1", "end"]);
    }

    #[test]
    fn test_deferred_arguments_resolve_per_run() {
        let radius = Rc::new(RefCell::new(1.0));
        let tracked = Rc::clone(&radius);
        let mut args = CircleArgs::new(0.0, 0.0, 0.0);
        args.r = command::Value::deferred(move || *tracked.borrow());
        let mut queue = CommandQueue::new();
        queue.circle(args);

        let mut recorder = Recorder::default();
        run(&mut recorder, &queue);
        *radius.borrow_mut() = 5.0;
        run(&mut recorder, &queue);
        assert_eq!(recorder.log, ["circle5"]);
    }

    #[derive(Clone)]
    struct Nest;

    impl Element for Nest {
        fn capabilities(&self) -> Capabilities {
            Capabilities::EXPAND
        }

        fn expand(&self) -> Option<CommandQueue> {
            let mut queue = CommandQueue::new();
            queue.custom(Nest);
            Some(queue)
        }
    }

    impl CustomElement for Nest {
        fn kind(&self) -> &str {
            "nest"
        }

        fn args(&self) -> serde_json::Value {
            serde_json::Value::Null
        }

        fn clone_box(&self) -> Box<dyn CustomElement> {
            Box::new(Nest)
        }

        fn as_element(&self) -> &dyn Element {
            self
        }

        fn as_element_mut(&mut self) -> &mut dyn Element {
            self
        }
    }

    #[test]
    fn test_runaway_expansion_stops_at_max_depth() {
        let mut queue = CommandQueue::new();
        queue.append(Command::Custom(Custom::new(Nest)));
        queue.circle(CircleArgs::new(0.0, 0.0, 1.0));
        let mut recorder = Recorder::default();
        assert!(run(&mut recorder, &queue));
        assert_eq!(recorder.log, ["circle1"]);
    }

    struct Failing;

    impl Fetch for Failing {
        fn fetch<'a>(
            &'a self,
            uri: &'a str,
        ) -> LocalFuture<'a, Result<Vec<u8>, FetchError>> {
            Box::pin(async move {
                Err(FetchError::Offline {
                    uri: uri.to_string(),
                })
            })
        }
    }

    #[test]
    fn test_failed_image_gets_placeholder() {
        let mut queue = CommandQueue::new();
        queue.image(ImageArgs::new("nowhere.png", 0.0, 0.0));
        let resources = Rc::new(ResourceCache::new(Failing, [4.0, 4.0]));
        let mut recorder = Recorder::default();
        Executor::new(&mut recorder, Rc::clone(&resources), 8).run_blocking(&queue, None);
        assert_eq!(recorder.log, ["imageSome(true)"]);
        assert_eq!(resources.len(), 1);
    }

    #[test]
    fn test_execute_without_handler_is_noop() {
        let registry = HandlerRegistry::new();
        let context = HandlerContext::new(Rc::new(SymbolTable::new()), crate::Settings::default());
        let queue = CommandQueue::new();
        assert!(!execute_blocking(&registry, &(), &queue, &context));
    }
}
