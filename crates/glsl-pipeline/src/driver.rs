//! Per-frame rendering and host-side frame ordering.
//!
//! [`FrameDriver`] is what one mounted pipeline does on every tick: render in
//! its configured mode, then dispatch the callback registry. [`FrameLoop`] is
//! the host side, ticking any number of [`FrameTask`]s by ascending priority.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{Context, Result};
use tracing::{trace, warn};

use crate::frame::FrameState;
use crate::handle::{Pipeline, SharedPipeline};
use crate::registry::{CallbackOwner, CallbackRegistry};
use crate::types::RenderMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameDriver {
    mode: RenderMode,
    auto_render: bool,
    priority: i32,
}

impl FrameDriver {
    pub fn new(mode: RenderMode, auto_render: bool, priority: i32) -> Self {
        Self {
            mode,
            auto_render,
            priority,
        }
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn auto_render(&self) -> bool {
        self.auto_render
    }

    pub fn set_auto_render(&mut self, enabled: bool) {
        self.auto_render = enabled;
    }

    /// Ordering relative to other frame tasks; unrelated to callback priorities.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn set_priority(&mut self, priority: i32) {
        self.priority = priority;
    }

    /// Renders (when auto-render is on) and then dispatches the callbacks owned
    /// by `pipeline`.
    ///
    /// Callbacks run even if the render failed; the render error is returned
    /// afterwards.
    pub fn tick<P: Pipeline>(
        &self,
        pipeline: &SharedPipeline<P>,
        registry: &CallbackRegistry<P::Scene>,
        state: &FrameState<'_, P::Scene>,
    ) -> Result<()> {
        let rendered = if self.auto_render {
            let mut handle = pipeline.borrow_mut();
            match self.mode {
                RenderMode::Scene => handle.render_scene(state.scene, state.camera),
                RenderMode::Main => handle.render_main(),
            }
        } else {
            Ok(())
        };

        if let Err(err) = &rendered {
            warn!(mode = %self.mode, error = %err, "pipeline render failed");
        }

        let owner: CallbackOwner = pipeline.clone();
        registry.dispatch_owned(&owner, state);

        rendered.with_context(|| format!("failed to render pipeline in {} mode", self.mode))
    }
}

/// Work the host runs once per frame.
pub trait FrameTask<S> {
    fn on_frame(&mut self, state: &FrameState<'_, S>) -> Result<()>;
}

/// Identifier returned by [`FrameLoop::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

struct ScheduledTask<S> {
    id: TaskId,
    priority: i32,
    task: Rc<RefCell<dyn FrameTask<S>>>,
}

/// Host frame loop ticking tasks by ascending priority.
pub struct FrameLoop<S> {
    tasks: Vec<ScheduledTask<S>>,
    next_id: u64,
}

impl<S> Default for FrameLoop<S> {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            next_id: 0,
        }
    }
}

impl<S> FrameLoop<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, priority: i32, task: Rc<RefCell<dyn FrameTask<S>>>) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.tasks.push(ScheduledTask { id, priority, task });
        self.tasks.sort_by_key(|scheduled| scheduled.priority);
        id
    }

    /// Returns false when the id is unknown.
    pub fn remove(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|scheduled| scheduled.id != id);
        self.tasks.len() != before
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Ticks every task once. Failures are logged and the remaining tasks
    /// still run; the number of failed tasks is returned.
    pub fn advance(&mut self, state: &FrameState<'_, S>) -> usize {
        let mut failures = 0;
        for scheduled in &self.tasks {
            trace!(task = scheduled.id.0, priority = scheduled.priority, "frame task");
            if let Err(err) = scheduled.task.borrow_mut().on_frame(state) {
                failures += 1;
                warn!(
                    task = scheduled.id.0,
                    priority = scheduled.priority,
                    error = %format!("{err:#}"),
                    "frame task failed"
                );
            }
        }
        failures
    }
}
