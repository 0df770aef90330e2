//! Priority-ordered per-frame callbacks shared across pipelines.
//!
//! A [`CallbackRegistry`] is an explicit object: create one per host tree and
//! hand clones to every component that should dispatch into it. Clones share
//! the same entry list.
//!
//! Entries are kept sorted by ascending priority; equal priorities keep their
//! subscription order. [`CallbackRegistry::dispatch_all`] iterates a copy of the
//! list taken when dispatch starts, so callbacks may subscribe or unsubscribe
//! freely and the change lands on the next dispatch.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::frame::FrameState;
use crate::handle::Snapshot;
use crate::types::PipelineProperties;

/// Per-frame callback. Identity is the `Rc` allocation: unsubscribe with a
/// clone of the same `Rc` that was subscribed.
pub type PipelineCallback<S> = Rc<dyn Fn(&PipelineProperties, &FrameState<'_, S>)>;

/// Handle whose properties are snapshotted for a callback.
pub type CallbackOwner = Rc<RefCell<dyn Snapshot>>;

struct CallbackEntry<S> {
    callback: PipelineCallback<S>,
    priority: i32,
    owner: CallbackOwner,
}

impl<S> Clone for CallbackEntry<S> {
    fn clone(&self) -> Self {
        Self {
            callback: Rc::clone(&self.callback),
            priority: self.priority,
            owner: Rc::clone(&self.owner),
        }
    }
}

pub struct CallbackRegistry<S> {
    entries: Rc<RefCell<Vec<CallbackEntry<S>>>>,
}

impl<S> Clone for CallbackRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            entries: Rc::clone(&self.entries),
        }
    }
}

impl<S> Default for CallbackRegistry<S> {
    fn default() -> Self {
        Self {
            entries: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl<S> fmt::Debug for CallbackRegistry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let priorities: Vec<i32> = self
            .entries
            .borrow()
            .iter()
            .map(|entry| entry.priority)
            .collect();
        f.debug_struct("CallbackRegistry")
            .field("priorities", &priorities)
            .finish()
    }
}

impl<S> CallbackRegistry<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry. Subscribing the same callback twice yields two
    /// entries that both fire.
    pub fn subscribe(&self, callback: PipelineCallback<S>, priority: i32, owner: CallbackOwner) {
        let mut entries = self.entries.borrow_mut();
        entries.push(CallbackEntry {
            callback,
            priority,
            owner,
        });
        // `sort_by_key` is stable, which keeps equal priorities in subscribe order.
        entries.sort_by_key(|entry| entry.priority);
        trace!(priority, total = entries.len(), "subscribed pipeline callback");
    }

    /// Removes every entry registered with this exact callback. Unknown
    /// callbacks are ignored.
    pub fn unsubscribe(&self, callback: &PipelineCallback<S>) {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|entry| !Rc::ptr_eq(&entry.callback, callback));
        trace!(
            removed = before - entries.len(),
            total = entries.len(),
            "unsubscribed pipeline callback"
        );
    }

    /// Points entries owned by `old` at `new`, keeping their order.
    pub fn rebind_owner(&self, old: &CallbackOwner, new: &CallbackOwner) {
        for entry in self.entries.borrow_mut().iter_mut() {
            if Rc::ptr_eq(&entry.owner, old) {
                entry.owner = Rc::clone(new);
            }
        }
    }

    /// Removes every entry owned by `owner`, returning how many were dropped.
    pub fn unsubscribe_owner(&self, owner: &CallbackOwner) -> usize {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|entry| !Rc::ptr_eq(&entry.owner, owner));
        let removed = before - entries.len();
        trace!(removed, total = entries.len(), "dropped callbacks of owner");
        removed
    }

    /// Invokes every subscribed callback once, in priority order, with a fresh
    /// snapshot of its owner.
    pub fn dispatch_all(&self, state: &FrameState<'_, S>) {
        self.dispatch_where(state, |_| true);
    }

    /// Like [`Self::dispatch_all`], restricted to entries owned by `owner`.
    ///
    /// Each mounted pipeline dispatches its own entries this way, so a registry
    /// shared by several pipelines still fires every callback once per frame.
    pub fn dispatch_owned(&self, owner: &CallbackOwner, state: &FrameState<'_, S>) {
        self.dispatch_where(state, |entry| Rc::ptr_eq(&entry.owner, owner));
    }

    fn dispatch_where(
        &self,
        state: &FrameState<'_, S>,
        selected: impl Fn(&CallbackEntry<S>) -> bool,
    ) {
        let entries: Vec<CallbackEntry<S>> = self
            .entries
            .borrow()
            .iter()
            .filter(|entry| selected(entry))
            .cloned()
            .collect();
        for entry in &entries {
            let properties = entry.owner.borrow().snapshot();
            (entry.callback)(&properties, state);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}
