//! Viewport resize propagation.
//!
//! The coordinator pushes viewport changes to the renderer, the pipeline and,
//! in scene mode, a perspective camera. Main mode leaves cameras alone: the
//! full-screen quad reads its resolution from `u_resolution`.

use tracing::debug;

use crate::camera::SceneCamera;
use crate::frame::Size;
use crate::handle::{Pipeline, Renderer, SharedPipeline, SharedRenderer};
use crate::types::RenderMode;

/// Token for an installed resize listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Host window or canvas whose size drives the pipeline.
pub trait Viewport {
    fn size(&self) -> Size;
    /// Physical pixels per logical pixel.
    fn pixel_ratio(&self) -> f32;
    fn add_resize_listener(&mut self) -> ListenerId;
    fn remove_resize_listener(&mut self, id: ListenerId);
}

#[derive(Debug)]
pub struct ResizeCoordinator {
    mode: RenderMode,
    enabled: bool,
    listener: Option<ListenerId>,
}

impl ResizeCoordinator {
    pub fn new(mode: RenderMode, enabled: bool) -> Self {
        Self {
            mode,
            enabled,
            listener: None,
        }
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_listening(&self) -> bool {
        self.listener.is_some()
    }

    /// Installs the listener and applies the current size once, when enabled.
    pub fn mount<P, V>(
        &mut self,
        viewport: &mut V,
        renderer: &SharedRenderer<P::Renderer>,
        pipeline: &SharedPipeline<P>,
        camera: &mut SceneCamera,
    ) where
        P: Pipeline,
        V: Viewport + ?Sized,
    {
        if !self.enabled || self.listener.is_some() {
            return;
        }
        let id = viewport.add_resize_listener();
        debug!(listener = id.0, mode = %self.mode, "installed resize listener");
        self.listener = Some(id);
        self.apply(
            viewport.size(),
            viewport.pixel_ratio(),
            renderer,
            pipeline,
            camera,
        );
    }

    /// Handles a resize signal. Ignored unless a listener is installed.
    pub fn on_resize<P, V>(
        &self,
        viewport: &V,
        renderer: &SharedRenderer<P::Renderer>,
        pipeline: &SharedPipeline<P>,
        camera: &mut SceneCamera,
    ) where
        P: Pipeline,
        V: Viewport + ?Sized,
    {
        if self.listener.is_none() {
            return;
        }
        self.apply(
            viewport.size(),
            viewport.pixel_ratio(),
            renderer,
            pipeline,
            camera,
        );
    }

    /// Pushes `size` through renderer, pipeline and (scene mode) camera.
    pub fn apply<P: Pipeline>(
        &self,
        size: Size,
        pixel_ratio: f32,
        renderer: &SharedRenderer<P::Renderer>,
        pipeline: &SharedPipeline<P>,
        camera: &mut SceneCamera,
    ) {
        {
            let mut renderer = renderer.borrow_mut();
            renderer.set_pixel_ratio(pixel_ratio);
            renderer.set_size(size.width, size.height);
        }
        pipeline.borrow_mut().set_size(size.width, size.height);

        if self.mode == RenderMode::Scene {
            if let Some(perspective) = camera.as_perspective_mut() {
                perspective.aspect = size.aspect();
                perspective.update_projection_matrix();
            }
        }
        debug!(
            width = size.width,
            height = size.height,
            pixel_ratio,
            "applied viewport size"
        );
    }

    /// Removes the listener if one was installed and disposes the pipeline.
    pub fn teardown<P, V>(&mut self, viewport: &mut V, pipeline: &SharedPipeline<P>)
    where
        P: Pipeline,
        V: Viewport + ?Sized,
    {
        self.detach(viewport);
        pipeline.borrow_mut().dispose();
    }

    /// Removes the listener without touching the pipeline.
    pub(crate) fn detach<V: Viewport + ?Sized>(&mut self, viewport: &mut V) {
        if let Some(id) = self.listener.take() {
            viewport.remove_resize_listener(id);
            debug!(listener = id.0, "removed resize listener");
        }
    }
}
