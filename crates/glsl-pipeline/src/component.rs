//! One mounted pipeline: reconciliation, per-frame driving, resize wiring and
//! callback subscription behind a single object.
//!
//! Lifecycle:
//!
//! ```text
//!   mount(props) ──▶ resolve handle ──▶ select material ──▶ install resize
//!        │
//!   update(props) ── mode/resize changed ──▶ rebuild ──▶ teardown old + mount resize
//!        │        └─ sources/uniforms/options changed ──▶ resolve again
//!        │
//!   frame(state) ──▶ render (scene|main) ──▶ dispatch own callbacks
//!        │
//!   unmount() ──▶ drop callbacks ──▶ remove listener ──▶ dispose handle
//! ```

use std::rc::Rc;

use anyhow::Result;
use tracing::{debug, info};

use crate::camera::SceneCamera;
use crate::config::PipelineConfig;
use crate::driver::{FrameDriver, FrameTask};
use crate::frame::FrameState;
use crate::handle::{Pipeline, SharedPipeline, SharedRenderer};
use crate::reconcile::{HandleSlot, ReconcileInputs, Reconciler};
use crate::registry::{CallbackOwner, CallbackRegistry, PipelineCallback};
use crate::resize::{ResizeCoordinator, Viewport};
use crate::types::{Branch, MaterialOptions, RenderMode};
use crate::uniforms::Uniforms;

/// Inputs a host supplies when mounting or updating a pipeline.
///
/// Shader sources, uniforms and options are reference counted: reconciliation
/// compares them by allocation, so hand over a new `Rc` to request a reload.
#[derive(Debug, Clone)]
pub struct PipelineProps {
    pub mode: RenderMode,
    pub uniforms: Option<Rc<Uniforms>>,
    pub options: Option<Rc<MaterialOptions>>,
    pub fragment_shader: Rc<str>,
    pub vertex_shader: Option<Rc<str>>,
    pub branch: Option<Branch>,
    pub resize: bool,
    pub auto_render: bool,
    pub render_priority: i32,
}

impl PipelineProps {
    pub fn new(fragment_shader: impl Into<Rc<str>>) -> Self {
        Self {
            mode: RenderMode::default(),
            uniforms: None,
            options: None,
            fragment_shader: fragment_shader.into(),
            vertex_shader: None,
            branch: None,
            resize: true,
            auto_render: true,
            render_priority: 0,
        }
    }

    pub fn with_mode(mut self, mode: RenderMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_uniforms(mut self, uniforms: Uniforms) -> Self {
        self.uniforms = Some(Rc::new(uniforms));
        self
    }

    pub fn with_options(mut self, options: MaterialOptions) -> Self {
        self.options = Some(Rc::new(options));
        self
    }

    pub fn with_vertex_shader(mut self, vertex_shader: impl Into<Rc<str>>) -> Self {
        self.vertex_shader = Some(vertex_shader.into());
        self
    }

    pub fn with_branch(mut self, branch: impl Into<Branch>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn with_resize(mut self, resize: bool) -> Self {
        self.resize = resize;
        self
    }

    pub fn with_auto_render(mut self, auto_render: bool) -> Self {
        self.auto_render = auto_render;
        self
    }

    pub fn with_render_priority(mut self, priority: i32) -> Self {
        self.render_priority = priority;
        self
    }

    fn reconcile_inputs<'a, R>(
        &'a self,
        renderer: &'a SharedRenderer<R>,
    ) -> ReconcileInputs<'a, R> {
        ReconcileInputs {
            renderer,
            uniforms: self.uniforms.as_ref(),
            options: self.options.as_ref(),
            fragment_shader: &self.fragment_shader,
            vertex_shader: self.vertex_shader.as_ref(),
        }
    }
}

impl From<PipelineConfig> for PipelineProps {
    fn from(config: PipelineConfig) -> Self {
        Self {
            mode: config.mode,
            uniforms: config.uniforms.map(Rc::new),
            options: config.options.map(Rc::new),
            fragment_shader: Rc::from(config.fragment_shader),
            vertex_shader: config.vertex_shader.map(Rc::from),
            branch: config.branch,
            resize: config.resize,
            auto_render: config.auto_render,
            render_priority: config.render_priority,
        }
    }
}

pub struct GlslPipelineComponent<P: Pipeline> {
    props: PipelineProps,
    renderer: SharedRenderer<P::Renderer>,
    registry: CallbackRegistry<P::Scene>,
    reconciler: Reconciler<P>,
    driver: FrameDriver,
    resize: ResizeCoordinator,
    pipeline: SharedPipeline<P>,
    material: P::Material,
    mounted: bool,
}

impl<P: Pipeline> GlslPipelineComponent<P> {
    /// Resolves a handle (reusing a live one from `slot` when possible), picks
    /// the material and wires resize handling.
    pub fn mount<V: Viewport + ?Sized>(
        props: PipelineProps,
        renderer: SharedRenderer<P::Renderer>,
        registry: CallbackRegistry<P::Scene>,
        slot: HandleSlot,
        viewport: &mut V,
        camera: &mut SceneCamera,
    ) -> Result<Self> {
        let mut reconciler = Reconciler::new(slot);
        let pipeline = reconciler.resolve(props.reconcile_inputs(&renderer))?;
        let material = select_material(&pipeline, props.branch.as_ref());
        let driver = FrameDriver::new(props.mode, props.auto_render, props.render_priority);
        let mut resize = ResizeCoordinator::new(props.mode, props.resize);
        resize.mount(viewport, &renderer, &pipeline, camera);
        info!(mode = %props.mode, resize = props.resize, "mounted glsl pipeline");

        Ok(Self {
            props,
            renderer,
            registry,
            reconciler,
            driver,
            resize,
            pipeline,
            material,
            mounted: true,
        })
    }

    /// Applies new props.
    ///
    /// A change of mode or of the resize flag is a full reconfiguration: a
    /// fresh handle is constructed, then the current one is torn down. Otherwise
    /// the reconciler decides; a different handle instance replaces (and
    /// disposes) the old one, while the same instance stays live.
    ///
    /// On error the component keeps its previous handle, listener and props.
    pub fn update<V: Viewport + ?Sized>(
        &mut self,
        props: PipelineProps,
        viewport: &mut V,
        camera: &mut SceneCamera,
    ) -> Result<()> {
        anyhow::ensure!(self.mounted, "cannot update an unmounted pipeline");

        if props.mode != self.props.mode || props.resize != self.props.resize {
            debug!(
                from = %self.props.mode,
                to = %props.mode,
                resize = props.resize,
                "reconfiguring pipeline"
            );
            let pipeline = self
                .reconciler
                .rebuild(props.reconcile_inputs(&self.renderer))?;
            self.resize.detach(viewport);
            self.replace_pipeline(pipeline);
            self.resize = ResizeCoordinator::new(props.mode, props.resize);
            self.resize
                .mount(viewport, &self.renderer, &self.pipeline, camera);
        } else {
            let pipeline = self
                .reconciler
                .resolve(props.reconcile_inputs(&self.renderer))?;
            if !Rc::ptr_eq(&pipeline, &self.pipeline) {
                self.replace_pipeline(pipeline);
                let size = viewport.size();
                let ratio = viewport.pixel_ratio();
                if self.resize.is_listening() {
                    self.resize
                        .apply(size, ratio, &self.renderer, &self.pipeline, camera);
                }
            }
        }

        self.material = select_material(&self.pipeline, props.branch.as_ref());
        self.driver = FrameDriver::new(props.mode, props.auto_render, props.render_priority);
        self.props = props;
        Ok(())
    }

    /// Disposes the current handle (unless already disposed) and moves its
    /// callbacks to `pipeline`.
    fn replace_pipeline(&mut self, pipeline: SharedPipeline<P>) {
        if !self.pipeline.borrow().is_disposed() {
            self.pipeline.borrow_mut().dispose();
        }
        let old: CallbackOwner = self.pipeline.clone();
        let new: CallbackOwner = pipeline.clone();
        self.registry.rebind_owner(&old, &new);
        self.pipeline = pipeline;
    }

    /// Registers a per-frame callback owned by this component's handle.
    ///
    /// While a frame task runs, the host loop holds the component mutably
    /// borrowed. Callbacks that (un)subscribe from inside a frame go through a
    /// clone of [`Self::registry`] and [`Self::owner`] instead.
    pub fn subscribe(&self, callback: PipelineCallback<P::Scene>, priority: i32) {
        self.registry.subscribe(callback, priority, self.owner());
    }

    /// The current handle as a registry owner.
    pub fn owner(&self) -> CallbackOwner {
        self.pipeline.clone()
    }

    pub fn unsubscribe(&self, callback: &PipelineCallback<P::Scene>) {
        self.registry.unsubscribe(callback);
    }

    /// Runs one frame: render in the configured mode, then dispatch callbacks.
    pub fn frame(&mut self, state: &FrameState<'_, P::Scene>) -> Result<()> {
        if !self.mounted {
            return Ok(());
        }
        self.driver.tick(&self.pipeline, &self.registry, state)
    }

    /// Forwards a viewport resize signal.
    pub fn handle_resize<V: Viewport + ?Sized>(&self, viewport: &V, camera: &mut SceneCamera) {
        self.resize
            .on_resize(viewport, &self.renderer, &self.pipeline, camera);
    }

    /// Drops this handle's callbacks, removes the resize listener (if any) and
    /// disposes the handle. Calling it twice is harmless.
    pub fn unmount<V: Viewport + ?Sized>(&mut self, viewport: &mut V) {
        if !self.mounted {
            return;
        }
        self.registry.unsubscribe_owner(&self.owner());
        self.resize.teardown(viewport, &self.pipeline);
        self.reconciler.invalidate();
        self.mounted = false;
        info!("unmounted glsl pipeline");
    }

    pub fn pipeline(&self) -> SharedPipeline<P> {
        Rc::clone(&self.pipeline)
    }

    pub fn renderer(&self) -> &SharedRenderer<P::Renderer> {
        &self.renderer
    }

    pub fn material(&self) -> &P::Material {
        &self.material
    }

    pub fn props(&self) -> &PipelineProps {
        &self.props
    }

    pub fn registry(&self) -> &CallbackRegistry<P::Scene> {
        &self.registry
    }

    pub fn render_priority(&self) -> i32 {
        self.driver.priority()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }
}

impl<P: Pipeline> FrameTask<P::Scene> for GlslPipelineComponent<P> {
    fn on_frame(&mut self, state: &FrameState<'_, P::Scene>) -> Result<()> {
        self.frame(state)
    }
}

fn select_material<P: Pipeline>(pipeline: &SharedPipeline<P>, branch: Option<&Branch>) -> P::Material {
    match branch {
        Some(branch) => pipeline.borrow_mut().branch_material(branch),
        None => pipeline.borrow().material(),
    }
}
