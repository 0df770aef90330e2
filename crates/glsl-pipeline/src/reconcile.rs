//! Reuse-or-rebuild decisions for pipeline handles.
//!
//! [`Reconciler::resolve`] is re-run whenever the caller's inputs may have
//! changed. It is memoized on the referential identity of the five inputs that
//! can alter a handle: renderer, uniforms, options, fragment source and vertex
//! source. Identity means `Rc` allocation, not value equality, so callers that
//! want a reload hand over a new `Rc`.
//!
//! When the memo misses, a live handle of the right type sitting in the
//! [`HandleSlot`] is reused and patched in place; anything else (empty slot,
//! foreign type, disposed handle, handle of another renderer) leads to a fresh
//! [`Pipeline::create`]. Either way `load` runs afterwards so shader reloads
//! follow source identity, not handle identity. [`Reconciler::rebuild`] skips
//! the reuse step entirely.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::handle::{Pipeline, SharedPipeline, SharedRenderer};
use crate::types::MaterialOptions;
use crate::uniforms::Uniforms;

/// Output reference through which the resolved handle is forwarded.
///
/// Clones share the slot, so whoever holds one always sees the handle the
/// reconciler resolved last. The slot is untyped; readers downcast.
#[derive(Clone, Default)]
pub struct HandleSlot {
    inner: Rc<RefCell<Option<Rc<dyn Any>>>>,
}

impl fmt::Debug for HandleSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleSlot")
            .field("occupied", &!self.is_empty())
            .finish()
    }
}

impl HandleSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the handle if the slot holds a pipeline of type `P`.
    pub fn get<P: Pipeline>(&self) -> Option<SharedPipeline<P>> {
        let current = self.inner.borrow().clone()?;
        current.downcast::<RefCell<P>>().ok()
    }

    pub fn set<P: Pipeline>(&self, pipeline: &SharedPipeline<P>) {
        let erased: Rc<dyn Any> = pipeline.clone();
        *self.inner.borrow_mut() = Some(erased);
    }

    /// Stores an arbitrary value, e.g. a handle of a different pipeline type.
    pub fn set_any(&self, value: Rc<dyn Any>) {
        *self.inner.borrow_mut() = Some(value);
    }

    pub fn clear(&self) {
        self.inner.borrow_mut().take();
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_none()
    }
}

/// Inputs for one reconciliation.
pub struct ReconcileInputs<'a, R> {
    pub renderer: &'a SharedRenderer<R>,
    pub uniforms: Option<&'a Rc<Uniforms>>,
    pub options: Option<&'a Rc<MaterialOptions>>,
    pub fragment_shader: &'a Rc<str>,
    pub vertex_shader: Option<&'a Rc<str>>,
}

struct ReconcileKey<R> {
    renderer: SharedRenderer<R>,
    uniforms: Option<Rc<Uniforms>>,
    options: Option<Rc<MaterialOptions>>,
    fragment_shader: Rc<str>,
    vertex_shader: Option<Rc<str>>,
}

impl<R> ReconcileKey<R> {
    fn capture(inputs: &ReconcileInputs<'_, R>) -> Self {
        Self {
            renderer: Rc::clone(inputs.renderer),
            uniforms: inputs.uniforms.cloned(),
            options: inputs.options.cloned(),
            fragment_shader: Rc::clone(inputs.fragment_shader),
            vertex_shader: inputs.vertex_shader.cloned(),
        }
    }

    fn matches(&self, inputs: &ReconcileInputs<'_, R>) -> bool {
        Rc::ptr_eq(&self.renderer, inputs.renderer)
            && same_rc(self.uniforms.as_ref(), inputs.uniforms)
            && same_rc(self.options.as_ref(), inputs.options)
            && Rc::ptr_eq(&self.fragment_shader, inputs.fragment_shader)
            && same_rc(self.vertex_shader.as_ref(), inputs.vertex_shader)
    }
}

fn same_rc<T: ?Sized>(cached: Option<&Rc<T>>, requested: Option<&Rc<T>>) -> bool {
    match (cached, requested) {
        (None, None) => true,
        (Some(a), Some(b)) => Rc::ptr_eq(a, b),
        _ => false,
    }
}

pub struct Reconciler<P: Pipeline> {
    slot: HandleSlot,
    memo: Option<(ReconcileKey<P::Renderer>, SharedPipeline<P>)>,
}

impl<P: Pipeline> Reconciler<P> {
    pub fn new(slot: HandleSlot) -> Self {
        Self { slot, memo: None }
    }

    pub fn slot(&self) -> &HandleSlot {
        &self.slot
    }

    /// The handle from the last successful resolve, if still memoized.
    pub fn current(&self) -> Option<SharedPipeline<P>> {
        self.memo.as_ref().map(|(_, pipeline)| Rc::clone(pipeline))
    }

    /// Drops the memo so the next resolve runs the full procedure.
    pub fn invalidate(&mut self) {
        self.memo = None;
    }

    pub fn resolve(&mut self, inputs: ReconcileInputs<'_, P::Renderer>) -> Result<SharedPipeline<P>> {
        if let Some((key, pipeline)) = &self.memo {
            if key.matches(&inputs) {
                return Ok(Rc::clone(pipeline));
            }
        }

        let reusable = self.reusable(inputs.renderer);

        let pipeline = match reusable {
            Some(existing) => {
                {
                    let mut handle = existing.borrow_mut();
                    if let Some(uniforms) = inputs.uniforms {
                        handle.set_uniforms(Uniforms::clone(uniforms));
                    }
                    if let Some(options) = inputs.options {
                        handle.set_options(MaterialOptions::clone(options));
                    }
                }
                debug!("reusing pipeline handle from slot");
                existing
            }
            None => Self::construct(&inputs)?,
        };
        self.install(pipeline, &inputs)
    }

    /// Constructs a fresh handle regardless of the memo or the slot contents.
    ///
    /// On failure neither the slot nor the memo is touched, so the previously
    /// resolved handle stays current.
    pub fn rebuild(&mut self, inputs: ReconcileInputs<'_, P::Renderer>) -> Result<SharedPipeline<P>> {
        let pipeline = Self::construct(&inputs)?;
        self.install(pipeline, &inputs)
    }

    fn construct(inputs: &ReconcileInputs<'_, P::Renderer>) -> Result<SharedPipeline<P>> {
        let created = P::create(
            inputs.renderer,
            inputs.uniforms.map(|uniforms| Uniforms::clone(uniforms)),
            inputs.options.map(|options| MaterialOptions::clone(options)),
        )
        .context("failed to construct pipeline")?;
        info!("constructed pipeline handle");
        Ok(Rc::new(RefCell::new(created)))
    }

    fn install(
        &mut self,
        pipeline: SharedPipeline<P>,
        inputs: &ReconcileInputs<'_, P::Renderer>,
    ) -> Result<SharedPipeline<P>> {
        pipeline
            .borrow_mut()
            .load(inputs.fragment_shader, inputs.vertex_shader.map(|src| &**src))
            .context("failed to load shader sources into pipeline")?;

        self.slot.set(&pipeline);
        self.memo = Some((ReconcileKey::capture(inputs), Rc::clone(&pipeline)));
        Ok(pipeline)
    }

    fn reusable(&self, renderer: &SharedRenderer<P::Renderer>) -> Option<SharedPipeline<P>> {
        if self.slot.is_empty() {
            return None;
        }
        match self.slot.get::<P>() {
            Some(existing) if existing.borrow().is_disposed() => {
                debug!("slot holds a disposed pipeline; constructing a fresh one");
                None
            }
            // A handle is bound to the renderer it was created with.
            Some(existing) if !Rc::ptr_eq(existing.borrow().renderer(), renderer) => {
                debug!("slot holds a pipeline of another renderer; constructing a fresh one");
                None
            }
            Some(existing) => Some(existing),
            None => {
                debug!("slot holds a different pipeline type; constructing a fresh one");
                None
            }
        }
    }
}
