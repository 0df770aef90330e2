//! Contracts for the rendering collaborators this crate drives.
//!
//! The concrete pipeline (buffers, double buffers, render targets, shader
//! compilation) lives behind [`Pipeline`]; the drawing surface lives behind
//! [`Renderer`]. Everything in this crate talks to them through these traits and
//! treats their failures as opaque `anyhow` errors.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;

use crate::camera::SceneCamera;
use crate::types::{Branch, MaterialOptions, PipelineProperties};
use crate::uniforms::Uniforms;

/// Shared, mutable access to a pipeline handle.
pub type SharedPipeline<P> = Rc<RefCell<P>>;

/// Shared, mutable access to a renderer.
pub type SharedRenderer<R> = Rc<RefCell<R>>;

/// Drawing surface owned by the host.
pub trait Renderer {
    fn set_pixel_ratio(&mut self, ratio: f32);
    fn set_size(&mut self, width: u32, height: u32);
}

/// One configured multi-pass shader pipeline.
pub trait Pipeline: 'static {
    type Renderer: Renderer + 'static;
    /// Scene graph root handed to [`Pipeline::render_scene`].
    type Scene: 'static;
    /// Material the host attaches to geometry in scene mode.
    type Material: Clone;

    /// Builds a fresh handle. The uniforms and options are taken as-is; nothing
    /// is overwritten afterwards.
    fn create(
        renderer: &SharedRenderer<Self::Renderer>,
        uniforms: Option<Uniforms>,
        options: Option<MaterialOptions>,
    ) -> Result<Self>
    where
        Self: Sized;

    /// The renderer this handle was created with.
    fn renderer(&self) -> &SharedRenderer<Self::Renderer>;

    fn uniforms(&self) -> &Uniforms;
    /// Replaces the whole uniform map.
    fn set_uniforms(&mut self, uniforms: Uniforms);
    fn options(&self) -> &MaterialOptions;
    fn set_options(&mut self, options: MaterialOptions);

    /// (Re)loads shader sources and rebuilds whatever depends on them.
    fn load(&mut self, fragment: &str, vertex: Option<&str>) -> Result<()>;

    fn render_main(&mut self) -> Result<()>;
    fn render_scene(&mut self, scene: &Self::Scene, camera: &SceneCamera) -> Result<()>;

    fn set_size(&mut self, width: u32, height: u32);

    /// Releases GPU resources. A disposed handle is never reused.
    fn dispose(&mut self);
    fn is_disposed(&self) -> bool;

    fn material(&self) -> Self::Material;
    fn branch_material(&mut self, branch: &Branch) -> Self::Material;

    fn properties(&self) -> PipelineProperties;
}

/// Object-safe view used by the callback registry to snapshot an owner.
pub trait Snapshot {
    fn snapshot(&self) -> PipelineProperties;
}

impl<P: Pipeline> Snapshot for P {
    fn snapshot(&self) -> PipelineProperties {
        self.properties()
    }
}
