//! Pointer-driven selection of the elements in a queue.
//!
//! Each top-level command carries an [`ElementState`]. Events are hit
//! tested with the [`Picker`](backends::Picker); when several elements
//! are under the pointer the one drawn last wins.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use backends::{Hit, Pick, Picker};
use bitflags::bitflags;
use command::CommandQueue;
use geometry::DVec2;
use handler::{Executor, HandlerContext};
use log::{debug, trace};

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ElementState: u8 {
        const NONE = 0;
        const OVER = 1 << 0;
        const DRAG = 1 << 1;
        const EDIT = 1 << 2;
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PointerKind {
    Move,
    Down,
    Up,
    Click,
}

/// A pointer event in device space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub at: DVec2,
    pub delta: DVec2,
}

impl PointerEvent {
    pub fn moved(at: DVec2, delta: DVec2) -> Self {
        Self {
            kind: PointerKind::Move,
            at,
            delta,
        }
    }

    pub fn down(at: DVec2) -> Self {
        Self {
            kind: PointerKind::Down,
            at,
            delta: DVec2::ZERO,
        }
    }

    pub fn up(at: DVec2) -> Self {
        Self {
            kind: PointerKind::Up,
            at,
            delta: DVec2::ZERO,
        }
    }

    pub fn click(at: DVec2) -> Self {
        Self {
            kind: PointerKind::Click,
            at,
            delta: DVec2::ZERO,
        }
    }
}

pub struct Selection {
    context: HandlerContext,
    states: HashMap<usize, ElementState>,
    over: Option<Hit>,
    dragging: Option<Hit>,
}

impl Selection {
    pub fn new(context: HandlerContext) -> Self {
        Self {
            context,
            states: HashMap::new(),
            over: None,
            dragging: None,
        }
    }

    /// State of the top-level command at `index`.
    pub fn state(&self, index: usize) -> ElementState {
        self.states.get(&index).copied().unwrap_or(ElementState::NONE)
    }

    pub fn over(&self) -> Option<usize> {
        self.over.as_ref().and_then(|hit| hit.path.first().copied())
    }

    pub fn dragging(&self) -> Option<usize> {
        self.dragging.as_ref().and_then(|hit| hit.path.first().copied())
    }

    /// Indices in EDIT state, ascending.
    pub fn editing(&self) -> Vec<usize> {
        let mut editing: Vec<usize> = self
            .states
            .iter()
            .filter(|(_, state)| state.contains(ElementState::EDIT))
            .map(|(index, _)| *index)
            .collect();
        editing.sort_unstable();
        editing
    }

    /// Feeds one event. Returns whether anything changed, i.e. whether
    /// the queue should be redrawn.
    pub fn handle(&mut self, queue: &mut CommandQueue, event: PointerEvent) -> bool {
        trace!("selection: {:?}", event);
        match event.kind {
            PointerKind::Move => self.on_move(queue, event),
            PointerKind::Down => self.on_down(),
            PointerKind::Up => self.on_up(queue, event.at),
            PointerKind::Click => self.on_click(),
        }
    }

    fn topmost(&self, queue: &CommandQueue, at: DVec2) -> Option<Hit> {
        let pick = Rc::new(RefCell::new(Pick::new(at, self.context.settings.hit_eps)));
        let mut picker = Picker::new(Rc::clone(&pick), &self.context);
        Executor::new(
            &mut picker,
            Rc::clone(&self.context.resources),
            self.context.settings.max_depth,
        )
        .run_blocking(queue, None);
        let hit = pick.borrow_mut().hits.pop();
        hit
    }

    fn update(&mut self, index: usize, f: impl FnOnce(&mut ElementState)) {
        let state = self.states.entry(index).or_default();
        f(state);
        if state.is_empty() {
            self.states.remove(&index);
        }
    }

    fn hover(&mut self, hit: Option<Hit>) -> bool {
        let next = hit.as_ref().and_then(|hit| hit.path.first().copied());
        if next == self.over() {
            self.over = hit;
            return false;
        }
        if let Some(previous) = self.over() {
            self.update(previous, |state| state.remove(ElementState::OVER));
        }
        if let Some(index) = next {
            self.update(index, |state| state.insert(ElementState::OVER));
        }
        debug!("selection: over {:?}", next);
        self.over = hit;
        true
    }

    fn on_move(&mut self, queue: &mut CommandQueue, event: PointerEvent) -> bool {
        if let Some(hit) = &self.dragging {
            let Some(index) = hit.path.first().copied() else {
                return false;
            };
            let delta = match hit.transform.inverse() {
                Some(inverse) => inverse.apply_vector(event.delta),
                None => return false,
            };
            return queue
                .get_mut(index)
                .is_some_and(|command| command.drag(delta));
        }
        let hit = self.topmost(queue, event.at);
        self.hover(hit)
    }

    fn on_down(&mut self) -> bool {
        let Some(hit) = self.over.clone() else {
            return false;
        };
        let Some(index) = hit.path.first().copied() else {
            return false;
        };
        self.update(index, |state| state.insert(ElementState::DRAG));
        debug!("selection: drag {}", index);
        self.dragging = Some(hit);
        true
    }

    fn on_up(&mut self, queue: &CommandQueue, at: DVec2) -> bool {
        let Some(hit) = self.dragging.take() else {
            return false;
        };
        if let Some(index) = hit.path.first().copied() {
            self.update(index, |state| state.remove(ElementState::DRAG));
        }
        let over = self.topmost(queue, at);
        self.hover(over);
        true
    }

    fn on_click(&mut self) -> bool {
        match self.over() {
            Some(index) => {
                self.update(index, |state| state.toggle(ElementState::EDIT));
                true
            }
            None => {
                let editing = self.editing();
                for index in &editing {
                    self.update(*index, |state| state.remove(ElementState::EDIT));
                }
                !editing.is_empty()
            }
        }
    }
}
